pub mod cipher;
pub mod token;
pub mod validate;
