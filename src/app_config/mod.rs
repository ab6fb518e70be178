pub mod dinapoli;
pub mod env;
pub mod log;
