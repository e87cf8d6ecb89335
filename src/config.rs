//! Configuration management module
//!
//! Loads and validates environment-based configuration.
//! Designed to be production-ready and easily extensible.

use serde::Deserialize;
use std::env;
use thiserror::Error;

use crate::zones::Containment;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid value for environment variable {0}")]
    ParseError(&'static str),

    #[error("{0}")]
    InvalidContainment(String),

    #[error("SIMULATION_TICK_MS must be greater than 0")]
    ZeroTickInterval,
}

/// Server configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Dispatch engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// Catalog file (TOML/JSON/YAML); the built-in demo city when unset
    pub catalog_path: Option<String>,
    pub containment: Containment,
    /// Sample a congestion factor for committed ETAs instead of free-flow
    pub traffic_simulation: bool,
}

/// Fleet simulator settings
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    pub enabled: bool,
    /// Interval in milliseconds between simulation ticks
    pub tick_ms: u64,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub dispatch: DispatchSettings,
    pub simulation: SimulationSettings,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "SERVER_PORT", 8080)?;
        let traffic_simulation = parse_or(&lookup, "TRAFFIC_SIMULATION", false)?;
        let simulation_enabled = parse_or(&lookup, "SIMULATION_ENABLED", true)?;
        let tick_ms = parse_or(&lookup, "SIMULATION_TICK_MS", 5000)?;
        if tick_ms == 0 {
            return Err(SettingsError::ZeroTickInterval);
        }

        let containment = match lookup("ZONE_CONTAINMENT") {
            Some(value) => value.parse().map_err(SettingsError::InvalidContainment)?,
            None => Containment::default(),
        };

        Ok(Self {
            server: ServerSettings {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
                port,
            },
            dispatch: DispatchSettings {
                catalog_path: lookup("CATALOG_PATH").filter(|p| !p.trim().is_empty()),
                containment,
                traffic_simulation,
            },
            simulation: SimulationSettings {
                enabled: simulation_enabled,
                tick_ms,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| SettingsError::ParseError(key)),
        None => Ok(default),
    }
}
