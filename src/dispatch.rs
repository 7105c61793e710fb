// SPF Safe Shell - Operation Dispatcher
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Pipeline:
// 1. Resolve the operation name (unknown -> UnknownOperation)
// 2. Validate arguments against its policy (refused -> PolicyViolation)
// 3. Apply the argument filter and leading args
// 4. Hand the invocation to the runner
// 5. Non-zero exit -> ExecutionFailure, otherwise the result
//
// Steps 1-3 never touch a process. No retries: failures are answers.

use crate::audit::AuditLog;
use crate::catalogue::Operation;
use crate::error::{GateError, Result};
use crate::executor::{CancelToken, ExecutionResult, Runner};
use crate::policy::Invocation;

/// Stateless between calls; safe to share across threads.
pub struct Dispatcher<R: Runner> {
    runner: R,
    audit: Option<AuditLog>,
}

impl<R: Runner> Dispatcher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner, audit: None }
    }

    pub fn with_audit(mut self, audit: Option<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Policy verdict without execution.
    pub fn check(&self, name: &str, args: &[String]) -> Result<Invocation> {
        let op = Operation::from_name(name).ok_or_else(|| GateError::UnknownOperation(name.to_string()))?;
        op.policy().resolve(args).map_err(|v| GateError::PolicyViolation {
            operation: op.name().to_string(),
            token: v.token,
            reason: v.reason,
        })
    }

    pub fn dispatch(&self, name: &str, args: &[String]) -> Result<ExecutionResult> {
        self.dispatch_cancellable(name, args, &CancelToken::new())
    }

    pub fn dispatch_cancellable(&self, name: &str, args: &[String], cancel: &CancelToken) -> Result<ExecutionResult> {
        let outcome = self.execute(name, args, cancel);
        match &outcome {
            Ok(_) => log::info!("OK {}", name),
            Err(e) if e.is_refusal() => log::warn!("BLOCKED {} | {}", name, e),
            Err(e) => log::info!("FAIL {} | {}", name, e.kind()),
        }
        if let Some(audit) = &self.audit {
            audit.record(name, args, &outcome);
        }
        outcome
    }

    fn execute(&self, name: &str, args: &[String], cancel: &CancelToken) -> Result<ExecutionResult> {
        let invocation = self.check(name, args)?;
        log::debug!("{} -> {} {:?}", name, invocation.program, invocation.args);

        let result = self.runner.run(&invocation, cancel)?;
        if !result.success() {
            return Err(GateError::ExecutionFailure {
                command: invocation.program,
                status: result.exit_status,
                stderr: result.stderr.trim_end().to_string(),
            });
        }
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================
