// SPF Safe Shell - MCP Server (JSON-RPC 2.0 over stdio)
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// One JSON object per line in, one per line out. Logs go to stderr only.
// Exposes every catalogue operation as an MCP tool taking {args: [string]}.
// No request can take the loop down: every failure becomes a response.

use crate::catalogue::Operation;
use crate::config::{Ordering, DEFAULT_MAX_IN_FLIGHT};
use crate::dispatch::Dispatcher;
use crate::error::{GateError, PARSE_ERROR};
use crate::executor::{CancelToken, Runner};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "spf-safe-shell";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// ENVELOPES
// ============================================================================

/// JSON-RPC response
fn response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// JSON-RPC error response
fn error_response(id: &Value, error: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
}

/// Write one message followed by a newline, under the output lock.
fn send<W: Write>(out: &Mutex<W>, msg: &Value) {
    let text = msg.to_string();
    let mut out = match out.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let _ = out.write_all(text.as_bytes());
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

/// MCP tool definition helper
fn tool_def(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required,
        }
    })
}

/// One tool per operation, in catalogue order.
fn tool_definitions() -> Vec<Value> {
    Operation::ALL
        .iter()
        .map(|op| {
            tool_def(
                op.name(),
                op.description(),
                json!({
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Arguments passed to the command, one token per element. No shell is involved."
                    }
                }),
                vec![],
            )
        })
        .collect()
}

fn has_id(msg: &Value) -> bool {
    msg.get("id").map(|id| !id.is_null()).unwrap_or(false)
}

/// Map key for a request id; ids may be numbers or strings.
fn id_key(id: &Value) -> String {
    id.to_string()
}

/// `{name, arguments: {args: [...]}}` -> (name, args). Missing args means none.
fn parse_call(params: &Value) -> Result<(String, Vec<String>), GateError> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| GateError::MalformedRequest("tools/call requires a string 'name'".into()))?;

    let args = match params.get("arguments").and_then(|a| a.get("args")) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| GateError::MalformedRequest("'args' must contain only strings".into()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(GateError::MalformedRequest("'args' must be an array of strings".into())),
    };
    Ok((name.to_string(), args))
}

// ============================================================================
// CALL SLOTS
// ============================================================================

/// Counting gate: at most `limit` calls hold a slot at once.
struct Slots {
    limit: usize,
    used: Mutex<usize>,
    freed: Condvar,
}

struct Slot<'a> {
    slots: &'a Slots,
}

impl Slots {
    fn new(limit: usize) -> Self {
        Self { limit: limit.max(1), used: Mutex::new(0), freed: Condvar::new() }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        match self.used.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Blocks until a slot is free.
    fn acquire(&self) -> Slot<'_> {
        let mut used = self.lock();
        while *used >= self.limit {
            used = match self.freed.wait(used) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        *used += 1;
        Slot { slots: self }
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut used = self.slots.lock();
        *used = used.saturating_sub(1);
        self.slots.freed.notify_one();
    }
}

// ============================================================================
// SERVER
// ============================================================================

pub struct Server<R: Runner> {
    dispatcher: Dispatcher<R>,
    ordering: Ordering,
    /// Cancellation tokens of calls still running, keyed by request id.
    in_flight: Mutex<HashMap<String, CancelToken>>,
    slots: Slots,
}

impl<R: Runner> Server<R> {
    pub fn new(dispatcher: Dispatcher<R>, ordering: Ordering) -> Self {
        Self {
            dispatcher,
            ordering,
            in_flight: Mutex::new(HashMap::new()),
            slots: Slots::new(DEFAULT_MAX_IN_FLIGHT),
        }
    }

    /// Cap on calls running at once in concurrent ordering. The reader
    /// waits for a free slot before starting the next call.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.slots = Slots::new(limit);
        self
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<String, CancelToken>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Handle one raw line synchronously. None when nothing must be sent.
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(msg) => self.handle_message(&msg, &CancelToken::new()),
            Err(e) => {
                log::warn!("JSON parse error: {}", e);
                Some(parse_error(&e))
            }
        }
    }

    /// Handle one decoded message. None when nothing must be sent.
    pub fn handle_message(&self, msg: &Value, cancel: &CancelToken) -> Option<Value> {
        let method = msg.get("method").and_then(Value::as_str).unwrap_or("");
        let id = msg.get("id").cloned().unwrap_or(Value::Null);
        let params = msg.get("params").cloned().unwrap_or(Value::Null);

        log::debug!("Received: {}", if method.is_empty() { "<none>" } else { method });

        match method {
            "initialize" => {
                let operations: Vec<Value> = Operation::ALL
                    .iter()
                    .map(|op| json!({ "name": op.name(), "description": op.description() }))
                    .collect();
                Some(response(&id, json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": SERVER_VERSION,
                    },
                    "operations": operations,
                })))
            }

            "notifications/initialized" => None,

            "notifications/cancelled" => {
                self.cancel(&params);
                None
            }

            "tools/list" => Some(response(&id, json!({ "tools": tool_definitions() }))),

            "operations/list" => {
                let names: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
                Some(response(&id, json!(names)))
            }

            "tools/call" => {
                if !has_id(msg) {
                    log::warn!("tools/call without id ignored");
                    return None;
                }
                Some(self.call(&id, &params, cancel))
            }

            "ping" => Some(response(&id, json!({}))),

            _ => {
                // Liveness probes and unknown methods get a bare ack
                if has_id(msg) {
                    Some(response(&id, json!({})))
                } else {
                    None
                }
            }
        }
    }

    fn call(&self, id: &Value, params: &Value, cancel: &CancelToken) -> Value {
        let outcome = parse_call(params)
            .and_then(|(name, args)| self.dispatcher.dispatch_cancellable(&name, &args, cancel));
        match outcome {
            Ok(result) => response(id, json!({
                "content": [{ "type": "text", "text": result.stdout }],
                "isError": false,
            })),
            Err(e) => error_response(id, e.to_rpc_error()),
        }
    }

    fn cancel(&self, params: &Value) {
        let request_id = match params.get("requestId") {
            Some(id) if !id.is_null() => id,
            _ => return,
        };
        match self.in_flight().get(&id_key(request_id)) {
            Some(token) => {
                log::info!("cancelling request {}", request_id);
                token.cancel();
            }
            None => log::debug!("cancel for unknown or finished request {}", request_id),
        }
    }

    /// Main loop: read until EOF, answering each message.
    pub fn serve<I: BufRead, W: Write + Send>(&self, input: I, output: W) {
        log::info!(
            "Starting {} v{} ({:?}, {} in flight max)",
            SERVER_NAME,
            SERVER_VERSION,
            self.ordering,
            self.slots.limit
        );
        let out = Mutex::new(output);

        thread::scope(|scope| {
            for line in input.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        log::error!("stdin read error: {}", e);
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let msg: Value = match serde_json::from_str(line) {
                    Ok(v) => v,
                    Err(e) => {
                        log::warn!("JSON parse error: {}", e);
                        send(&out, &parse_error(&e));
                        continue;
                    }
                };

                let is_call = msg.get("method").and_then(Value::as_str) == Some("tools/call");
                if self.ordering == Ordering::Concurrent && is_call && has_id(&msg) {
                    let key = id_key(&msg["id"]);
                    if self.in_flight().contains_key(&key) {
                        log::warn!("request id {} already in flight, refused", key);
                        let err = GateError::MalformedRequest(format!("request id {} is already in flight", key));
                        send(&out, &error_response(&msg["id"], err.to_rpc_error()));
                        continue;
                    }
                    let slot = self.slots.acquire();
                    let token = CancelToken::new();
                    // registered before spawning so a cancel on the next line finds it
                    self.in_flight().insert(key.clone(), token.clone());
                    let out = &out;
                    scope.spawn(move || {
                        let _slot = slot;
                        let reply = self.handle_message(&msg, &token);
                        self.in_flight().remove(&key);
                        if let Some(reply) = reply {
                            send(out, &reply);
                        }
                    });
                    continue;
                }

                if let Some(reply) = self.handle_message(&msg, &CancelToken::new()) {
                    send(&out, &reply);
                }
            }
        });
        log::info!("stdin closed, shutting down");
    }

    /// Serve on the process's own stdin/stdout.
    pub fn run(&self) {
        let stdin = io::stdin();
        self.serve(stdin.lock(), io::stdout());
    }
}

fn parse_error(e: &serde_json::Error) -> Value {
    error_response(&Value::Null, json!({
        "code": PARSE_ERROR,
        "message": format!("parse error: {}", e),
        "data": { "kind": "malformed_request" },
    }))
}

// ============================================================================
// TESTS
// ============================================================================
