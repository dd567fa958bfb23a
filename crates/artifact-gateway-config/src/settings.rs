// crates/artifact-gateway-config/src/settings.rs
// ============================================================================
// Module: Gateway Settings
// Description: Process configuration resolved from the environment.
// Purpose: Provide defaulted repository, base path, and bind settings.
// Dependencies: std::env
// ============================================================================

//! ## Overview
//! The gateway is configured through three environment variables, each with a
//! stable default: `REPO_PATH` locates the registry repository, `BASE_PATH`
//! prefixes every registered route, and `GATEWAY_ADDR` is the bind address.
//! A bare `:port` address binds all interfaces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::path::PathBuf;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the repository directory.
pub const REPO_PATH_ENV: &str = "REPO_PATH";
/// Environment variable naming the route base path.
pub const BASE_PATH_ENV: &str = "BASE_PATH";
/// Environment variable naming the bind address.
pub const GATEWAY_ADDR_ENV: &str = "GATEWAY_ADDR";

/// Default repository directory.
pub const DEFAULT_REPO_PATH: &str = "./repo";
/// Default route base path.
pub const DEFAULT_BASE_PATH: &str = "/v1";
/// Default bind address.
pub const DEFAULT_GATEWAY_ADDR: &str = ":8787";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Resolved gateway process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Repository directory holding `api/`, `flows/`, and `data/`.
    pub repo_path: PathBuf,
    /// Base path joined in front of every endpoint route.
    pub base_path: String,
    /// Listen address; a bare `:port` means all interfaces.
    pub listen_addr: String,
}

impl GatewaySettings {
    /// Resolves settings from the environment with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            repo_path: PathBuf::from(env_or(REPO_PATH_ENV, DEFAULT_REPO_PATH)),
            base_path: env_or(BASE_PATH_ENV, DEFAULT_BASE_PATH),
            listen_addr: env_or(GATEWAY_ADDR_ENV, DEFAULT_GATEWAY_ADDR),
        }
    }

    /// Returns the listen address as a bindable `host:port` string.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        }
    }

    /// Returns the registry index path under the repository.
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.repo_path.join("api").join("index.json")
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from(DEFAULT_REPO_PATH),
            base_path: DEFAULT_BASE_PATH.to_string(),
            listen_addr: DEFAULT_GATEWAY_ADDR.to_string(),
        }
    }
}

/// Reads an environment variable, falling back on empty or missing values.
fn env_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
