// SPF Safe Shell - Library Root
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// All modules exported here for use by the binary and tests.

pub mod paths;
pub mod config;
pub mod error;
pub mod audit;
pub mod setup;

// ============================================================================
// GATEWAY CORE - registry -> dispatcher -> executor
// ============================================================================

/// Rule shapes and the validation they perform
pub mod policy;

/// The closed set of operations and their policies
pub mod catalogue;

/// Lookup, validation and result classification
pub mod dispatch;

/// Subprocess lifecycle: no shell, bounded wait, guaranteed reap
pub mod executor;

/// JSON-RPC stdio transport
pub mod mcp;
