pub mod annotation;
pub mod chemistry;
pub mod combination;
pub mod config;
pub mod digest;
pub mod errors;
pub mod io;
pub mod modification;
pub mod sample;
