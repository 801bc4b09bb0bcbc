//! tap-run CLI
//!
//! Run shell commands as TAP checks. Each command is one result; its stdout
//! and stderr become diagnostics under the result line.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitCode, Stdio};

use anyhow::Context;
use clap::Parser;
use tap_reporter::{Capture, Output, RunConfig, Runner};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tap-run")]
#[command(version)]
#[command(about = "Run shell commands as checks and report them as TAP")]
struct Cli {
    /// Commands to run, one check each
    #[arg(required = true)]
    commands: Vec<String>,

    /// Check names, in command order [default: the command text]
    #[arg(short = 'n', long = "name")]
    names: Vec<String>,

    /// Declare the plan up front instead of the implicit `1..0`
    #[arg(long)]
    plan: bool,

    /// Write TAP to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Start the stream with `TAP version 14`
    #[arg(long = "tap-version")]
    tap_version: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let output = match cli.output {
        Some(ref path) => Output::file(path)
            .with_context(|| format!("cannot open TAP output {}", path.display()))?,
        None => Output::stdout(),
    };

    let runner = Runner::new(RunConfig {
        output,
        version_header: cli.tap_version,
    });

    let success = runner
        .try_run(|t| {
            if cli.plan {
                t.plan(cli.commands.len());
            }
            for (i, command) in cli.commands.iter().enumerate() {
                let name = cli.names.get(i).unwrap_or(command);
                t.check_captured(|out| run_shell(command, out), name);
            }
        })
        .context("writing TAP output")?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run `command` through the platform shell, writing its output to `out`.
/// Returns whether it exited successfully.
fn run_shell(command: &str, out: &mut Capture) -> bool {
    #[cfg(windows)]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    };
    #[cfg(not(windows))]
    let mut cmd = {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    debug!(command, "running check");
    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) => {
            let _ = writeln!(out, "failed to execute '{}': {}", command, e);
            return false;
        }
    };

    let _ = out.write_all(&output.stdout);
    let _ = out.write_all(&output.stderr);
    if !output.status.success() {
        let _ = match output.status.code() {
            Some(code) => writeln!(out, "exit code {}", code),
            None => writeln!(out, "terminated by signal"),
        };
    }
    output.status.success()
}
