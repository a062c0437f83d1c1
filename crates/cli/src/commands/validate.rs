//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ExporterConfig, OutputKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    url: String,
    max_retries: u32,
    delay_ms: u64,
    backoff: String,
    sink: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    url: config.feed.url.clone(),
                    max_retries: config.retry.max_retries,
                    delay_ms: config.retry.delay_ms,
                    backoff: format!("{:?}", config.retry.backoff),
                    sink: format!("{:?}", config.output.sink),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ExporterConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.retry.delay_ms == 0 {
        warnings.push("retry.delay_ms is 0 - reconnects will hammer the feed".to_string());
    }

    if config.retry.max_retries == 1 {
        warnings.push(
            "retry.max_retries is 1 - a single failed connect stops the exporter".to_string(),
        );
    }

    if config.output.sink == OutputKind::Console && config.output.listen.is_some() {
        warnings.push(
            "output.listen is set but sink is console - only internal metrics are exported"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Feed: {}", summary.url);
            println!("  Attempts: {}", summary.max_retries);
            println!("  Delay: {} ms ({})", summary.delay_ms, summary.backoff);
            println!("  Sink: {}", summary.sink);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
