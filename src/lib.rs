pub mod baseline;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod loader;
pub mod model;
pub mod output;
pub mod period;
