//! Configuration management for stratus.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::autoscale::ViewExtent;
use crate::error::{Result, StratusError};

/// Command-line arguments for stratus
#[derive(Parser, Debug)]
#[command(name = "stratus")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host address to bind to
    #[arg(short = 'H', long, env = "STRATUS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "STRATUS_PORT", default_value = "8000")]
    pub port: u16,

    /// Base URL of the time-metadata service
    #[arg(long, env = "STRATUS_METADATA_URL")]
    pub metadata_url: Option<String>,

    /// Base URL of the WMS imagery service
    #[arg(long, env = "STRATUS_IMAGERY_URL")]
    pub imagery_url: Option<String>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "STRATUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STRATUS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upstream service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of the time-metadata service
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Base URL of the WMS imagery service
    #[serde(default = "default_imagery_url")]
    pub imagery_url: String,
}

/// Autoscale behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoscaleConfig {
    /// Bounding box substituted for degenerate (zero-width) view extents
    #[serde(default = "default_fallback_extent")]
    pub fallback_extent: ViewExtent,
}

/// Colorbar label formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorbarConfig {
    /// Decimal places used when no per-variable override is registered
    #[serde(default = "default_precision")]
    pub default_precision: usize,

    /// Per-variable decimal-place overrides, keyed by variable id
    #[serde(default)]
    pub precision: HashMap<String, usize>,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream services
    #[serde(default)]
    pub services: ServicesConfig,

    /// Autoscale behavior
    #[serde(default)]
    pub autoscale: AutoscaleConfig,

    /// Colorbar formatting
    #[serde(default)]
    pub colorbar: ColorbarConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        let args = Args::parse();
        Self::from_args(args)
    }

    /// Build the configuration from parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        config.server.host = args.host;
        config.server.port = args.port;
        if let Some(metadata_url) = args.metadata_url {
            config.services.metadata_url = metadata_url;
        }
        if let Some(imagery_url) = args.imagery_url {
            config.services.imagery_url = imagery_url;
        }
        config.log_level = args.log_level;

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.server = other.server;
        self.services = other.services;
        self.autoscale = other.autoscale;
        self.colorbar = other.colorbar;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(StratusError::Config {
                message: "Server host cannot be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(StratusError::Config {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.services.metadata_url.is_empty() || self.services.imagery_url.is_empty() {
            return Err(StratusError::Config {
                message: "Upstream service URLs cannot be empty".to_string(),
            });
        }

        // A degenerate fallback box would defeat its purpose.
        let extent = &self.autoscale.fallback_extent;
        if extent.west >= extent.east || extent.south >= extent.north {
            return Err(StratusError::Config {
                message: format!(
                    "Fallback extent must have west < east and south < north, got {}",
                    extent.bbox_string()
                ),
            });
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(StratusError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            services: ServicesConfig::default(),
            autoscale: AutoscaleConfig::default(),
            colorbar: ColorbarConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            imagery_url: default_imagery_url(),
        }
    }
}

impl Default for AutoscaleConfig {
    fn default() -> Self {
        Self {
            fallback_extent: default_fallback_extent(),
        }
    }
}

impl Default for ColorbarConfig {
    fn default() -> Self {
        Self {
            default_precision: default_precision(),
            precision: HashMap::new(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_metadata_url() -> String {
    "http://127.0.0.1:8100/api".to_string()
}

fn default_imagery_url() -> String {
    "http://127.0.0.1:8080/ncwms".to_string()
}

fn default_fallback_extent() -> ViewExtent {
    // Continental box over western North America
    ViewExtent {
        west: -141.0,
        south: 41.0,
        east: -52.0,
        north: 84.0,
    }
}

fn default_precision() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}
