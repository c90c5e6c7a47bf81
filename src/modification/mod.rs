pub mod applier;
pub mod model;
pub mod parser;
