pub mod assembler;
pub mod request_builder;
