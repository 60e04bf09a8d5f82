pub mod alias;
pub mod entities;
pub mod errors;
pub mod history;
pub mod settings;
pub mod value_objects;
