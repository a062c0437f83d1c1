//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::{BackoffKind, OutputKind};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Lunarsensor - ambient light feed exporter
#[derive(Parser, Debug)]
#[command(
    name = "lunarsensor",
    author,
    version,
    about = "Lunarsensor ambient light feed exporter",
    long_about = "Streams readings from a lunarsensor event feed.\n\n\
                  Connects to the feed with bounded retries, decodes each event \n\
                  block and prints readings or exposes them as a Prometheus gauge. \n\
                  Any stream failure restarts the whole pipeline."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LUNARSENSOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LUNARSENSOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exporter until interrupted
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply without one
    #[arg(short, long, env = "LUNARSENSOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the feed URL
    #[arg(long, env = "LUNARSENSOR_URL")]
    pub url: Option<String>,

    /// Override the number of connect attempts per pipeline generation
    #[arg(long, env = "LUNARSENSOR_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Override the base retry delay (e.g. 500ms, 30s, 1m)
    #[arg(long, value_parser = parse_duration, env = "LUNARSENSOR_DELAY")]
    pub delay: Option<Duration>,

    /// Override the retry delay growth
    #[arg(long, value_enum, env = "LUNARSENSOR_BACKOFF")]
    pub backoff: Option<BackoffArg>,

    /// Override the output sink
    #[arg(long, value_enum, env = "LUNARSENSOR_OUTPUT")]
    pub output: Option<OutputArg>,

    /// Prometheus listen address; selects the gauge output unless --output is given
    #[arg(long, env = "LUNARSENSOR_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the exported gauge name
    #[arg(long, env = "LUNARSENSOR_GAUGE_NAME")]
    pub gauge_name: Option<String>,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "lunarsensor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Retry delay growth
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffArg {
    Constant,
    Linear,
    Exponential,
}

impl From<BackoffArg> for BackoffKind {
    fn from(arg: BackoffArg) -> Self {
        match arg {
            BackoffArg::Constant => Self::Constant,
            BackoffArg::Linear => Self::Linear,
            BackoffArg::Exponential => Self::Exponential,
        }
    }
}

/// Output sink
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputArg {
    /// `<unix-ms> <value>` lines on stdout
    Console,
    /// Prometheus gauge on --listen
    Gauge,
}

impl From<OutputArg> for OutputKind {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Console => Self::Console,
            OutputArg::Gauge => Self::Gauge,
        }
    }
}

/// Parse a duration such as `500ms`, `30s`, `1m`, `1h` or `1m30s`
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let unit_start = rest
            .find(|c: char| !is_number(c))
            .ok_or_else(|| format!("missing unit in duration '{input}'"))?;
        let (number, tail) = rest.split_at(unit_start);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number in duration '{input}'"))?;

        let unit_end = tail.find(is_number).unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let nanos_per_unit = match unit {
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(format!("unknown unit '{unit}' in duration '{input}'")),
        };

        let nanos = (value * nanos_per_unit).round();
        if !nanos.is_finite() || nanos > u64::MAX as f64 {
            return Err(format!("duration '{input}' out of range"));
        }
        total = total
            .checked_add(Duration::from_nanos(nanos as u64))
            .ok_or_else(|| format!("duration '{input}' out of range"))?;
        rest = next;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("60").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "lunarsensor",
            "run",
            "--url",
            "http://10.0.0.7/events",
            "--max-retries",
            "3",
            "--delay",
            "2s",
            "--backoff",
            "exponential",
            "--listen",
            "127.0.0.1:9100",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.url.as_deref(), Some("http://10.0.0.7/events"));
        assert_eq!(args.max_retries, Some(3));
        assert_eq!(args.delay, Some(Duration::from_secs(2)));
        assert_eq!(args.backoff, Some(BackoffArg::Exponential));
        assert_eq!(args.listen, Some("127.0.0.1:9100".parse().unwrap()));
        assert_eq!(args.output, None);
    }
}
