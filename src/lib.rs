pub mod agent;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod monitoring;
pub mod pricing;
pub mod state;
pub mod utils;
