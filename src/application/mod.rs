pub mod builders;
pub mod renderer;
pub mod resolver;
pub mod services;
pub mod signer;
