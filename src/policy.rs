// SPF Safe Shell - Argument Policies
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// Validation rules applied to caller-supplied argument vectors.
// Pure data + pure functions. No I/O, no process spawning.
//
// Every rule is default-deny: a token passes only when it is recognised
// as safe. Rejections name the offending token so the caller can retry.

use serde::Serialize;

// ============================================================================
// TOKENS
// ============================================================================

/// Flag-shaped: starts with `-` and is not a lone `-` (stdin operand).
pub fn is_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// `--name=value` -> `--name`. Anything else is returned unchanged.
fn long_name(token: &str) -> &str {
    if token.starts_with("--") {
        token.split('=').next().unwrap_or(token)
    } else {
        token
    }
}

/// Letters of a single-dash cluster (`-la` -> `la`), stopping at `=`.
/// None for `--long` tokens and non-flags.
fn short_letters(token: &str) -> Option<&str> {
    if !is_flag(token) || token.starts_with("--") {
        return None;
    }
    let letters = &token[1..];
    Some(letters.split('=').next().unwrap_or(letters))
}

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub token: String,
    pub reason: String,
}

impl Violation {
    fn new(token: &str, reason: impl Into<String>) -> Self {
        Self { token: token.to_string(), reason: reason.into() }
    }
}

/// Named, immutable set of forbidden tokens. Shared between descriptors
/// by reference; nothing can add to it at runtime.
#[derive(Debug)]
pub struct TokenSet {
    pub name: &'static str,
    pub tokens: &'static [&'static str],
}

/// Whether a denylist looks inside combined short flags (`-ni`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clusters {
    /// Whole-token matching only.
    Literal,
    /// Also reject `-Xyz` when `-X`, `-y` or `-z` is in the set.
    Expand,
}

impl TokenSet {
    fn contains(&self, token: &str) -> bool {
        self.tokens.contains(&token)
    }

    /// Long entry that `--name[=value]` abbreviates. Needs at least `--x`.
    fn abbreviated(&self, token: &str) -> Option<&'static str> {
        if !token.starts_with("--") {
            return None;
        }
        let name = long_name(token);
        if name.len() < 3 {
            return None;
        }
        self.tokens
            .iter()
            .copied()
            .find(|entry| entry.starts_with("--") && entry.starts_with(name))
    }

    /// The forbidden entry this token hits, if any.
    pub fn hit(&self, token: &str, clusters: Clusters) -> Option<String> {
        if self.contains(token) || (token.contains('=') && self.contains(long_name(token))) {
            return Some(long_name(token).to_string());
        }
        // getopt_long and git parse-options both accept unique prefixes:
        // `--in-pl` is `--in-place`, `--open=sh` is `--open-files-in-pager=sh`
        if let Some(entry) = self.abbreviated(token) {
            return Some(entry.to_string());
        }
        if clusters == Clusters::Expand {
            if let Some(letters) = short_letters(token) {
                for c in letters.chars() {
                    let single = format!("-{}", c);
                    if self.contains(&single) {
                        return Some(single);
                    }
                }
            }
        }
        None
    }
}

// ============================================================================
// RULE SHAPES
// ============================================================================

/// Every flag-shaped token must be in the set. Operands pass unchecked.
#[derive(Debug)]
pub struct FlagAllowlist {
    pub flags: &'static [&'static str],
}

impl FlagAllowlist {
    fn has(&self, flag: &str) -> bool {
        self.flags.contains(&flag)
    }

    /// Token accepted as a whole, as `--name=value`, or as a cluster whose
    /// every letter is itself an allowed `-X`.
    pub fn permits(&self, token: &str) -> bool {
        if self.has(token) {
            return true;
        }
        if token.starts_with("--") {
            return token.contains('=') && self.has(long_name(token));
        }
        match token.get(1..) {
            Some(letters) if !letters.is_empty() => {
                letters.chars().all(|c| self.has(&format!("-{}", c)))
            }
            _ => false,
        }
    }

    pub fn check(&self, args: &[String]) -> Result<(), Violation> {
        for token in args.iter().filter(|a| is_flag(a)) {
            if !self.permits(token) {
                return Err(Violation::new(token, "flag not in allowlist"));
            }
        }
        Ok(())
    }
}

/// Any token hitting any of the sets is refused, wherever it appears.
#[derive(Debug)]
pub struct Denylist {
    pub sets: &'static [&'static TokenSet],
    pub clusters: Clusters,
}

impl Denylist {
    pub fn check(&self, args: &[String]) -> Result<(), Violation> {
        for token in args {
            for set in self.sets {
                if let Some(entry) = set.hit(token, self.clusters) {
                    return Err(Violation::new(
                        token,
                        format!("'{}' is forbidden ({})", entry, set.name),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// First argument must be an enumerated sub-command; the rest pass a denylist.
#[derive(Debug)]
pub struct SubcommandGate {
    pub subcommands: &'static [&'static str],
    pub deny: Denylist,
}

impl SubcommandGate {
    pub fn check(&self, args: &[String]) -> Result<(), Violation> {
        let first = match args.first() {
            Some(f) => f,
            None => return Err(Violation::new("", "a read-only sub-command is required")),
        };
        if !self.subcommands.contains(&first.as_str()) {
            return Err(Violation::new(first, "sub-command not in read-only set"));
        }
        self.deny.check(&args[1..])
    }
}

/// Archive listing: a listing flag must be present, all flags allowlisted,
/// and the first token must be flag-shaped so no bare mode string
/// (`tar xf`) can slip through as an operand.
#[derive(Debug)]
pub struct ListingGate {
    pub listing: &'static [&'static str],
    pub flags: FlagAllowlist,
    /// Listing flag must be the first argument rather than anywhere.
    pub leading: bool,
}

impl ListingGate {
    fn lists(&self, token: &str) -> bool {
        if self.listing.contains(&token) || self.listing.contains(&long_name(token)) {
            return true;
        }
        short_letters(token)
            .map(|letters| letters.chars().any(|c| self.listing.contains(&format!("-{}", c).as_str())))
            .unwrap_or(false)
    }

    pub fn check(&self, args: &[String]) -> Result<(), Violation> {
        let first = match args.first() {
            Some(f) => f,
            None => return Err(Violation::new("", "listing flag required")),
        };
        if !is_flag(first) {
            return Err(Violation::new(first, "first argument must be a listing flag"));
        }
        self.flags.check(args)?;

        let listed = if self.leading {
            self.lists(first)
        } else {
            args.iter().any(|a| self.lists(a))
        };
        if !listed {
            let token = if self.leading { first.as_str() } else { "" };
            return Err(Violation::new(
                token,
                format!("listing flag required (one of {})", self.listing.join(", ")),
            ));
        }
        Ok(())
    }
}

/// First argument selects one of an enumerated set of commands and is
/// consumed; remaining flags are allowlisted.
#[derive(Debug)]
pub struct VariantGate {
    pub variants: &'static [(&'static str, &'static str)],
    pub flags: FlagAllowlist,
}

impl VariantGate {
    pub fn select<'a>(&self, args: &'a [String]) -> Result<(&'static str, &'a [String]), Violation> {
        let first = match args.first() {
            Some(f) => f,
            None => return Err(Violation::new("", "a variant selector is required")),
        };
        let command = self
            .variants
            .iter()
            .find(|(key, _)| *key == first.as_str())
            .map(|(_, cmd)| *cmd)
            .ok_or_else(|| Violation::new(first, "unknown variant"))?;
        let rest = &args[1..];
        self.flags.check(rest)?;
        Ok((command, rest))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.variants.iter().map(|(k, _)| *k).collect()
    }
}

/// Validation rule of one operation.
#[derive(Debug)]
pub enum Rule {
    Allow(FlagAllowlist),
    Deny(Denylist),
    Subcommand(SubcommandGate),
    Listing(ListingGate),
    Variant(VariantGate),
}

// ============================================================================
// FILTER
// ============================================================================

/// Drops tokens equal to one of the prefixes or of the form `prefix=...`.
#[derive(Debug)]
pub struct ArgumentFilter {
    pub drop: &'static [&'static str],
}

impl ArgumentFilter {
    pub fn apply(&self, args: Vec<String>) -> Vec<String> {
        args.into_iter()
            .filter(|a| !self.drop.contains(&long_name(a)))
            .collect()
    }
}

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Policy descriptor of one operation.
#[derive(Debug)]
pub struct Policy {
    /// Executable to run. A variant rule selects from its own set instead.
    pub command: &'static str,
    /// Fixed arguments placed before the caller's. Never request-derived.
    pub leading_args: &'static [&'static str],
    /// Fixed environment overrides for the child.
    pub env: &'static [(&'static str, &'static str)],
    pub rule: Rule,
    pub filter: Option<ArgumentFilter>,
}

/// Fully validated command line, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Policy {
    /// Validate, filter and assemble the command line. Pure.
    pub fn resolve(&self, args: &[String]) -> Result<Invocation, Violation> {
        let (program, caller_args) = match &self.rule {
            Rule::Allow(allow) => {
                allow.check(args)?;
                (self.command, args)
            }
            Rule::Deny(deny) => {
                deny.check(args)?;
                (self.command, args)
            }
            Rule::Subcommand(gate) => {
                gate.check(args)?;
                (self.command, args)
            }
            Rule::Listing(gate) => {
                gate.check(args)?;
                (self.command, args)
            }
            Rule::Variant(gate) => gate.select(args)?,
        };

        let mut caller_args = caller_args.to_vec();
        if let Some(filter) = &self.filter {
            caller_args = filter.apply(caller_args);
        }

        let mut full: Vec<String> = self.leading_args.iter().map(|s| s.to_string()).collect();
        full.extend(caller_args);
        let env = self.env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Ok(Invocation { program: program.to_string(), args: full, env })
    }
}

// ============================================================================
// TESTS
// ============================================================================
