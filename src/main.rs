//! egress-policy: Egress allowlist decisions for a forward proxy
//!
//! This is the main entry point for the egress-policy binary. It parses CLI
//! arguments, opens the audit sink, validates the mode, loads the policy,
//! and runs the selected subcommand.
//!
//! # I/O Architecture
//!
//! - **Audit records**: stdout by default (or `--audit-log`), one JSON line
//!   per event, flushed immediately
//! - **Debug logging**: stderr via `tracing`, silent unless `-v` or `RUST_LOG`
//! - **Bridge verdicts**: stdout, which is why `bridge` requires `--audit-log`
//!
//! Any fatal configuration error is recorded on the audit stream first and
//! then turned into a non-zero exit here.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use egress_policy::{
    cli::{Cli, Commands},
    policy::ServiceCatalog,
    proxy::{Enforcer, FlowEvent, parse_mode},
    telemetry::{AuditRecorder, FileSink},
};
use tracing::{debug, warn};

/// Exit code for `check` when at least one target is blocked.
const EXIT_BLOCKED: u8 = 2;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;

    debug!("Parsed CLI arguments: {:?}", cli);

    if matches!(cli.command, Commands::Bridge) && cli.audit_log.is_none() {
        bail!("The bridge command requires --audit-log (stdout carries verdicts)");
    }

    let recorder = match cli.audit_log {
        Some(ref path) => {
            AuditRecorder::new(FileSink::append(path).context("Failed to open audit log")?)
        }
        None => AuditRecorder::stdout(),
    };

    let mode = parse_mode(&cli.mode, &recorder).context("Invalid configuration")?;
    let settings = cli.settings(mode);

    debug!("Resolved settings: {:?}", settings);

    let enforcer = Enforcer::start(&settings, &ServiceCatalog::builtin(), recorder)
        .context("Failed to start policy engine")?;

    match cli.command {
        Commands::Validate => Ok(ExitCode::SUCCESS),
        Commands::Check { ref targets } => check(&enforcer, targets),
        Commands::Bridge => bridge(&enforcer),
    }
}

/// Evaluate each target as a CONNECT request.
fn check(enforcer: &Enforcer, targets: &[String]) -> Result<ExitCode> {
    let mut blocked = 0usize;

    for target in targets {
        let Some((host, port)) = Cli::parse_target(target) else {
            bail!("Invalid target '{}': expected HOST, HOST:PORT or [IPV6]:PORT", target);
        };

        let verdict = enforcer
            .on_connect(&host, port)
            .context("Failed to write audit record")?;
        if verdict.is_block() {
            blocked += 1;
        }
    }

    debug!("{} of {} targets blocked", blocked, targets.len());

    if blocked > 0 {
        Ok(ExitCode::from(EXIT_BLOCKED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Serve flow events from stdin until EOF.
///
/// Malformed lines are recorded as an `info` diagnostic and get an
/// `invalid` reply so the runtime never waits on a verdict that will not come.
fn bridge(enforcer: &Enforcer) -> Result<ExitCode> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read flow event")?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<FlowEvent>(&line) {
            Ok(event) => {
                let verdict = enforcer
                    .handle(&event)
                    .context("Failed to write audit record")?;
                serde_json::to_string(&verdict)?
            }
            Err(e) => {
                warn!("Malformed flow event: {}", e);
                enforcer
                    .recorder()
                    .record_info(format!("Malformed flow event: {e}"))
                    .context("Failed to write audit record")?;
                serde_json::json!({ "verdict": "invalid", "error": e.to_string() }).to_string()
            }
        };

        writeln!(stdout, "{}", reply).context("Failed to write verdict")?;
        stdout.flush().context("Failed to write verdict")?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize the tracing subscriber for debug/development logging.
///
/// This is separate from the audit stream. Debug logs go to stderr.
///
/// # Verbosity Levels
/// - 0 (default): Only warnings and errors
/// - 1 (-v): Info level
/// - 2 (-vv): Debug level
/// - 3+ (-vvv): Trace level
fn init_tracing(verbose: u8) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
