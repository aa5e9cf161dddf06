pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod report;
pub mod snapshot;
