// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `wavedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wavedag",
    version,
    about = "Schedule and simulate stage plans with delayed and cyclic dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the plan file (TOML).
    ///
    /// Default: `Wavedag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Wavedag.toml")]
    pub plan: String,

    /// Parse + validate, print the plan analysis, but don't simulate.
    #[arg(long)]
    pub dry_run: bool,

    /// Stop the simulation after this many ticks.
    #[arg(long, value_name = "N", default_value_t = 1000)]
    pub max_ticks: u32,

    /// Calendar days the simulated clock advances per tick.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub tick_days: u32,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WAVEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::parse_from(["wavedag"]);
        assert_eq!(args.plan, "Wavedag.toml");
        assert_eq!(args.max_ticks, 1000);
        assert_eq!(args.tick_days, 1);
        assert!(!args.dry_run);
        assert!(args.log_level.is_none());
    }

    #[test]
    fn flags() {
        let args = CliArgs::parse_from([
            "wavedag",
            "--plan",
            "plans/nightly.toml",
            "--dry-run",
            "--tick-days",
            "7",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.plan, "plans/nightly.toml");
        assert!(args.dry_run);
        assert_eq!(args.tick_days, 7);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
