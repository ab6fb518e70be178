pub mod indicator;
pub mod services;
pub mod strategy;
pub mod task;
pub mod utils;
