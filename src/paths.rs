// SPF Safe Shell - Path Resolution
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Single source of truth for on-disk locations.
// Resolved once and cached via OnceLock.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static GATE_HOME_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Environment override for the gateway home directory.
pub const HOME_ENV: &str = "SPF_SAFE_SHELL_HOME";

/// User home directory from $HOME (or %USERPROFILE% on Windows).
pub fn user_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Gateway home: holds config.json and the audit log.
///
/// Resolution order:
///   1. SPF_SAFE_SHELL_HOME environment variable
///   2. $HOME/.spf-safe-shell
///   3. ./.spf-safe-shell
pub fn gate_home() -> &'static Path {
    GATE_HOME_CACHE.get_or_init(|| {
        if let Some(root) = std::env::var_os(HOME_ENV) {
            return PathBuf::from(root);
        }
        match user_home() {
            Some(home) => home.join(".spf-safe-shell"),
            None => PathBuf::from(".spf-safe-shell"),
        }
    })
}

/// Default gateway config file.
pub fn config_file() -> PathBuf {
    gate_home().join("config.json")
}

/// MCP client config edited by `install` / `uninstall` when no path is given.
/// macOS: ~/Library/Application Support/Claude/claude_desktop_config.json
/// Windows: %APPDATA%\Claude\claude_desktop_config.json
/// Others: ~/.config/Claude/claude_desktop_config.json
pub fn default_client_config() -> PathBuf {
    const FILE: &str = "claude_desktop_config.json";
    if cfg!(target_os = "windows") {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("Claude").join(FILE);
        }
    }
    let home = user_home().unwrap_or_else(|| PathBuf::from("."));
    if cfg!(target_os = "macos") {
        home.join("Library/Application Support/Claude").join(FILE)
    } else {
        home.join(".config/Claude").join(FILE)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_in_gate_home() {
        assert_eq!(config_file().parent(), Some(gate_home()));
        assert!(config_file().ends_with("config.json"));
    }

    #[test]
    fn client_config_file_name() {
        assert!(default_client_config().ends_with("claude_desktop_config.json"));
    }
}
