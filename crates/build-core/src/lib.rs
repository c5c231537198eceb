pub mod configs;
pub mod error;
pub mod formatters;
pub mod models;
pub mod workload;
