// SPF Safe Shell - Audit Trail
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Append-only, one line per call. Successful calls record the size and
// SHA256 of exactly what was relayed to the caller.
// Audit failures are logged and swallowed; they never fail a request.

use crate::error::GateError;
use crate::executor::ExecutionResult;
use chrono::Local;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Longest argument summary written per line.
const MAX_ARGS_LEN: usize = 300;

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the outcome of one call.
    pub fn record(&self, operation: &str, args: &[String], outcome: &Result<ExecutionResult, GateError>) {
        let line = format_entry(operation, args, outcome);
        if let Err(e) = self.append(&line) {
            log::warn!("audit log {:?} not writable: {}", self.path, e);
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
        // single write so concurrent calls never interleave within a line
        f.write_all(format!("[{}] {}\n", ts, line).as_bytes())
    }
}

/// SHA256 hash as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn summarize_args(args: &[String]) -> String {
    let joined = serde_json::to_string(args).unwrap_or_default();
    if joined.len() > MAX_ARGS_LEN {
        let cut: String = joined.chars().take(MAX_ARGS_LEN).collect();
        format!("{}…", cut)
    } else {
        joined
    }
}

fn format_entry(operation: &str, args: &[String], outcome: &Result<ExecutionResult, GateError>) -> String {
    let args = summarize_args(args);
    match outcome {
        Ok(result) => format!(
            "OK {} {} | exit=0 bytes={} sha256={}",
            operation,
            args,
            result.stdout.len(),
            sha256_hex(result.stdout.as_bytes())
        ),
        Err(e) if e.is_refusal() => format!("DENY {} {} | {} | {}", operation, args, e.kind(), e),
        Err(e) => format!("FAIL {} {} | {} | {}", operation, args, e.kind(), single_line(&e.to_string())),
    }
}

fn single_line(text: &str) -> String {
    let flat: String = text.lines().collect::<Vec<_>>().join(" / ");
    flat.chars().take(MAX_ARGS_LEN).collect()
}

// ============================================================================
// TESTS
// ============================================================================
