pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod tracker;

pub use config::Config;
pub use errors::GymlogError;
pub use tracker::Tracker;
