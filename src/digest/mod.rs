pub mod digester;
pub mod enzyme;
