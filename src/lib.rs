pub mod config;
pub mod core;
pub mod domain;
pub mod mcp;
pub mod utils;

pub use crate::config::{AppConfig, CliConfig};
pub use crate::core::{
    client::ExpressClient, comparison::PriceComparisonEngine, tracking::TrackingService,
};
pub use crate::utils::error::{ErrorKind, ExpressError, Result};
