pub mod annotator;
pub mod assembler;
pub mod model;
