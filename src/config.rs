use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::validation::InputValidator;

/// Time format of the `booking.first_slot` / `booking.last_slot` keys
pub const SLOT_TIME_FORMAT: &str = "%H:%M:%S";

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub booking: BookingConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: String,
    pub demo_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    pub first_slot: String,
    pub last_slot: String,
    pub slot_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub default_format: String,
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: String::new(),
                timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            storage: StorageConfig {
                path: ".medidash".to_string(),
                demo_fallback: true,
            },
            booking: BookingConfig {
                first_slot: "09:00:00".to_string(),
                last_slot: "17:00:00".to_string(),
                slot_minutes: 30,
            },
            export: ExportConfig {
                default_format: "csv".to_string(),
                output_directory: "./output".to_string(),
            },
        }
    }
}

impl BookingConfig {
    /// First and last bookable slot as times of day
    pub fn slot_bounds(&self) -> Result<(NaiveTime, NaiveTime)> {
        let first = NaiveTime::parse_from_str(&self.first_slot, SLOT_TIME_FORMAT)
            .with_context(|| format!("Invalid first_slot: {}", self.first_slot))?;
        let last = NaiveTime::parse_from_str(&self.last_slot, SLOT_TIME_FORMAT)
            .with_context(|| format!("Invalid last_slot: {}", self.last_slot))?;
        Ok((first, last))
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` after the standard files when given
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let mut builder = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("medidash").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // MEDIDASH__BACKEND__URL and friends
            .add_source(Environment::with_prefix("MEDIDASH").separator("__").try_parsing(true))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let mut app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.backend.url = app_config.get_backend_url();
        app_config.backend.anon_key = app_config.get_anon_key();

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        InputValidator::validate_backend_url(&self.backend.url)?;
        if self.backend.timeout_secs == 0 {
            return Err(anyhow::anyhow!("timeout_secs must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        if self.storage.path.trim().is_empty() {
            return Err(anyhow::anyhow!("storage path must not be empty"));
        }

        let (first, last) = self.booking.slot_bounds()?;
        if first > last {
            return Err(anyhow::anyhow!(
                "first_slot {} is after last_slot {}",
                self.booking.first_slot,
                self.booking.last_slot
            ));
        }
        if self.booking.slot_minutes == 0 || self.booking.slot_minutes > 24 * 60 {
            return Err(anyhow::anyhow!("slot_minutes must be between 1 and 1440"));
        }

        let valid_formats = ["txt", "csv", "json"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.export.default_format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Get backend URL from environment or config
    pub fn get_backend_url(&self) -> String {
        std::env::var("SUPABASE_URL").unwrap_or_else(|_| self.backend.url.clone())
    }

    /// Get the public API key from environment or config
    pub fn get_anon_key(&self) -> String {
        std::env::var("SUPABASE_ANON_KEY").unwrap_or_else(|_| self.backend.anon_key.clone())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Effective configuration as YAML, with the API key masked
    pub fn to_yaml(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.backend.anon_key.is_empty() {
            shown.backend.anon_key = "********".to_string();
        }
        serde_yaml::to_string(&shown).context("Failed to render configuration")
    }
}
