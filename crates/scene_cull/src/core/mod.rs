//! # Core Module
//!
//! Shared configuration types used by the traversal and by host
//! applications.

pub mod config;

pub use config::{
    ApplicationConfig,
    CullSettings,
    DepthSortMode,
    LoggingConfig,
    TraversalMode,
    Config,
    ConfigError,
};
