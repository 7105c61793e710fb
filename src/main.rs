// SPF Safe Shell - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and MCP stdio server. Read-only system inspection behind fixed policies.
// Usage:
//   spf-safe-shell serve                          # Run MCP server (stdio)
//   spf-safe-shell list                           # Show the operation catalogue
//   spf-safe-shell check <op> [args...]           # Policy verdict, no execution
//   spf-safe-shell call <op> [args...]            # One-shot dispatch
//   spf-safe-shell init-config [--force]          # Write default config file
//   spf-safe-shell install [--remove-shell-servers]
//   spf-safe-shell uninstall

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use spf_safe_shell::{
    audit::AuditLog,
    catalogue::Operation,
    config::GateConfig,
    dispatch::Dispatcher,
    executor::SystemRunner,
    mcp::Server,
    paths, setup,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spf-safe-shell")]
#[command(author = "Joseph Stone")]
#[command(version)]
#[command(about = "SPF Safe Shell - policy-enforcing gateway for read-only system inspection")]
struct Cli {
    /// Gateway config file (JSON)
    #[arg(long, global = true, default_value_os_t = paths::config_file())]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server (stdio JSON-RPC)
    Serve,

    /// List operations with descriptions
    List,

    /// Dry-run policy check; prints the resolved command line or the refusal
    Check {
        /// Operation name (list-directory, git-query, ...)
        operation: String,

        /// Arguments exactly as a client would send them
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run one operation and print its output
    Call {
        /// Operation name
        operation: String,

        /// Arguments passed through policy to the command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Write a config file with default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Register this gateway in an MCP client config
    Install {
        /// Client config file (defaults to the desktop client's)
        #[arg(long)]
        client_config: Option<PathBuf>,

        /// Server entry name
        #[arg(long, default_value = setup::DEFAULT_NAME)]
        name: String,

        /// Also remove general-purpose shell servers from the client
        #[arg(long)]
        remove_shell_servers: bool,
    },

    /// Remove this gateway from an MCP client config
    Uninstall {
        /// Client config file (defaults to the desktop client's)
        #[arg(long)]
        client_config: Option<PathBuf>,

        /// Server entry name
        #[arg(long, default_value = setup::DEFAULT_NAME)]
        name: String,
    },
}

fn dispatcher(config: &GateConfig) -> Dispatcher<SystemRunner> {
    let runner = SystemRunner::new(config.timeout()).with_working_dir(config.working_dir.clone());
    let audit = config.audit_log.as_deref().map(AuditLog::new);
    Dispatcher::new(runner).with_audit(audit)
}

fn main() -> Result<()> {
    // Initialize logging (safe if already init). stderr only: stdout is the protocol.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let cli = Cli::parse();

    // Runs before loading so a malformed file can be replaced
    if let Commands::InitConfig { force } = cli.command {
        if cli.config.exists() && !force {
            println!("Config already exists at {:?} (use --force to overwrite)", cli.config);
        } else {
            GateConfig::default()
                .save(&cli.config)
                .with_context(|| format!("Failed to write config to {:?}", cli.config))?;
            println!("Wrote default config to {:?}", cli.config);
        }
        return Ok(());
    }

    // Loaded once; never reloaded while serving
    let config = GateConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    match cli.command {
        Commands::Serve => {
            log::info!("Config: {:?}", cli.config);
            log::info!("Timeout: {:?} | Ordering: {:?}", config.timeout(), config.ordering);
            if let Some(dir) = &config.working_dir {
                log::info!("Working dir: {:?}", dir);
            }
            let server = Server::new(dispatcher(&config), config.ordering)
                .with_max_in_flight(config.max_in_flight());
            server.run();
        }

        Commands::List => {
            for op in Operation::ALL {
                println!("{:<18} {}", op.name(), op.description());
            }
        }

        Commands::Check { operation, args } => {
            match dispatcher(&config).check(&operation, &args) {
                Ok(invocation) => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "allowed": true,
                        "program": invocation.program,
                        "args": invocation.args,
                        "env": invocation.env,
                    }))?);
                }
                Err(e) => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "allowed": false,
                        "error": e.to_rpc_error(),
                    }))?);
                    std::process::exit(1);
                }
            }
        }

        Commands::Call { operation, args } => {
            match dispatcher(&config).dispatch(&operation, &args) {
                Ok(result) => print!("{}", result.stdout),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Install { client_config, name, remove_shell_servers } => {
            let path = client_config.unwrap_or_else(paths::default_client_config);
            let exe = std::env::current_exe().context("Failed to resolve own executable path")?;
            let report = setup::install(&path, &name, &exe, remove_shell_servers)?;

            println!("{} '{}' in {:?}", if report.replaced { "Updated" } else { "Registered" }, name, path);
            for removed in &report.removed {
                println!("  removed shell server '{}'", removed);
            }
            if let Some(bak) = &report.backup {
                println!("  backup: {:?}", bak);
            }
            println!("Restart the client to pick up the change.");
        }

        Commands::Uninstall { client_config, name } => {
            let path = client_config.unwrap_or_else(paths::default_client_config);
            let report = setup::uninstall(&path, &name)?;
            if report.removed.is_empty() {
                println!("'{}' was not registered in {:?}", name, path);
            } else {
                println!("Removed '{}' from {:?}", name, path);
            }
        }

        // handled before the config is loaded
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
