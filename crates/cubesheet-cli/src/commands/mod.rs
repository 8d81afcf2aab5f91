pub mod config;
pub mod input;
pub mod parse;
pub mod process;
pub mod validate;
