// SPF Safe Shell - Client Registration
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Adds or removes this gateway in an MCP client config file
// ({"mcpServers": {name: {command, args}}}). Unrelated entries and keys
// are preserved. A .bak copy is written before any change.

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Default server entry name.
pub const DEFAULT_NAME: &str = "spf-safe-shell";

/// Entry names of general-purpose shell servers this gateway replaces.
pub const SHELL_SERVERS: &[&str] = &[
    "shell",
    "bash",
    "terminal",
    "desktop-commander",
    "mcp-shell",
    "shell-server",
    "mcp-server-shell",
    "server-shell",
];

/// What an install or uninstall changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub added: bool,
    pub replaced: bool,
    pub removed: Vec<String>,
    pub backup: Option<PathBuf>,
}

fn read_config(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read client config {:?}", path))?;
    if content.trim().is_empty() {
        return Ok(json!({}));
    }
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Client config {:?} is not valid JSON", path))?;
    if !value.is_object() {
        bail!("Client config {:?} must be a JSON object", path);
    }
    Ok(value)
}

fn backup(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    let bak = PathBuf::from(name);
    std::fs::copy(path, &bak).with_context(|| format!("Failed to back up {:?}", path))?;
    Ok(Some(bak))
}

fn write_config(path: &Path, config: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content + "\n").with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

fn servers_mut(config: &mut Value) -> Result<&mut Map<String, Value>> {
    let root = config
        .as_object_mut()
        .context("Client config must be a JSON object")?;
    let servers = root.entry("mcpServers").or_insert_with(|| json!({}));
    servers.as_object_mut().context("'mcpServers' must be a JSON object")
}

/// Register `exe serve` under `name`, optionally removing known shell servers.
pub fn install(path: &Path, name: &str, exe: &Path, remove_shell_servers: bool) -> Result<SetupReport> {
    let mut config = read_config(path)?;
    let mut report = SetupReport::default();

    {
        let servers = servers_mut(&mut config)?;
        let entry = json!({
            "command": exe.to_string_lossy(),
            "args": ["serve"],
        });
        report.replaced = servers.insert(name.to_string(), entry).is_some();
        report.added = !report.replaced;

        if remove_shell_servers {
            for shell in SHELL_SERVERS.iter().filter(|s| **s != name) {
                if servers.remove(*shell).is_some() {
                    report.removed.push(shell.to_string());
                }
            }
        }
    }

    report.backup = backup(path)?;
    write_config(path, &config)?;
    log::info!("Registered '{}' in {:?}", name, path);
    for removed in &report.removed {
        log::info!("Removed shell server '{}'", removed);
    }
    Ok(report)
}

/// Remove our entry only. Missing file or entry is not an error.
pub fn uninstall(path: &Path, name: &str) -> Result<SetupReport> {
    let mut report = SetupReport::default();
    if !path.exists() {
        log::warn!("Client config {:?} not found, nothing to remove", path);
        return Ok(report);
    }

    let mut config = read_config(path)?;
    let removed = match config.get_mut("mcpServers").and_then(Value::as_object_mut) {
        Some(servers) => servers.remove(name).is_some(),
        None => false,
    };
    if !removed {
        log::warn!("'{}' not registered in {:?}", name, path);
        return Ok(report);
    }

    report.removed.push(name.to_string());
    report.backup = backup(path)?;
    write_config(path, &config)?;
    log::info!("Removed '{}' from {:?}", name, path);
    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn install_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Claude/claude_desktop_config.json");
        let report = install(&path, DEFAULT_NAME, Path::new("/usr/local/bin/spf-safe-shell"), false).unwrap();
        assert!(report.added);
        assert!(report.backup.is_none());

        let config = read(&path);
        assert_eq!(config["mcpServers"][DEFAULT_NAME]["command"], "/usr/local/bin/spf-safe-shell");
        assert_eq!(config["mcpServers"][DEFAULT_NAME]["args"], json!(["serve"]));
    }

    #[test]
    fn install_preserves_unrelated_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"theme":"dark","mcpServers":{"github":{"command":"gh-mcp"},"shell":{"command":"sh-mcp"}}}"#,
        )
        .unwrap();

        let report = install(&path, DEFAULT_NAME, Path::new("spf-safe-shell"), false).unwrap();
        assert!(report.removed.is_empty());
        assert!(report.backup.is_some());

        let config = read(&path);
        assert_eq!(config["theme"], "dark");
        assert_eq!(config["mcpServers"]["github"]["command"], "gh-mcp");
        assert_eq!(config["mcpServers"]["shell"]["command"], "sh-mcp");
        assert!(config["mcpServers"][DEFAULT_NAME].is_object());
    }

    #[test]
    fn install_can_remove_shell_servers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"mcpServers":{"github":{},"shell":{},"desktop-commander":{}}}"#,
        )
        .unwrap();

        let report = install(&path, DEFAULT_NAME, Path::new("spf-safe-shell"), true).unwrap();
        assert_eq!(report.removed, vec!["shell".to_string(), "desktop-commander".to_string()]);

        let servers = read(&path)["mcpServers"].as_object().unwrap().clone();
        assert!(servers.contains_key("github"));
        assert!(servers.contains_key(DEFAULT_NAME));
        assert!(!servers.contains_key("shell"));
        assert!(!servers.contains_key("desktop-commander"));
    }

    #[test]
    fn reinstall_replaces_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        install(&path, DEFAULT_NAME, Path::new("/old/spf-safe-shell"), false).unwrap();
        let report = install(&path, DEFAULT_NAME, Path::new("/new/spf-safe-shell"), false).unwrap();
        assert!(report.replaced);
        assert_eq!(read(&path)["mcpServers"][DEFAULT_NAME]["command"], "/new/spf-safe-shell");
    }

    #[test]
    fn uninstall_removes_only_ours() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"mcpServers":{"github":{"command":"gh-mcp"}}}"#).unwrap();
        install(&path, DEFAULT_NAME, Path::new("spf-safe-shell"), false).unwrap();

        let report = uninstall(&path, DEFAULT_NAME).unwrap();
        assert_eq!(report.removed, vec![DEFAULT_NAME.to_string()]);

        let servers = read(&path)["mcpServers"].as_object().unwrap().clone();
        assert_eq!(servers.len(), 1);
        assert!(servers.contains_key("github"));
    }

    #[test]
    fn uninstall_missing_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(uninstall(&path, DEFAULT_NAME).unwrap(), SetupReport::default());
        assert!(!path.exists());

        std::fs::write(&path, r#"{"mcpServers":{}}"#).unwrap();
        assert!(uninstall(&path, DEFAULT_NAME).unwrap().removed.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error_and_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ broken").unwrap();
        assert!(install(&path, DEFAULT_NAME, Path::new("x"), false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
    }
}
