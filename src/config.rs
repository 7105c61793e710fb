// SPF Safe Shell - Configuration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Loaded exactly once at startup, then shared read-only.
// Nothing here can widen the catalogue: policies are compiled Rust.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on a single invocation, whatever the config says.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Upper bound on concurrently running calls, whatever the config says.
pub const MAX_IN_FLIGHT: usize = 64;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Seconds a command may run before it is killed.
    pub timeout_secs: u64,
    /// How the transport orders tools/call requests.
    pub ordering: Ordering,
    /// Calls allowed to run at once in concurrent ordering.
    pub max_in_flight: usize,
    /// Working directory for every command. Defaults to the gateway's own.
    pub working_dir: Option<PathBuf>,
    /// Append-only audit trail of every call. Disabled when unset.
    pub audit_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    /// Strict arrival order, one subprocess at a time.
    Serial,
    /// One thread per call; responses correlated by request id.
    Concurrent,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            ordering: Ordering::Serial,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            working_dir: None,
            audit_log: None,
        }
    }
}

impl GateConfig {
    /// Load config from JSON file, falling back to defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            log::warn!("Config not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save config to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Per-invocation wait, clamped to 1..=MAX_TIMEOUT_SECS.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.clamp(1, MAX_TIMEOUT_SECS))
    }

    /// Concurrent call limit, clamped to 1..=MAX_IN_FLIGHT.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.clamp(1, MAX_IN_FLIGHT)
    }
}

// ============================================================================
// TESTS
// ============================================================================
