pub mod config;
pub mod estimate;
pub mod models;
pub mod transform;
