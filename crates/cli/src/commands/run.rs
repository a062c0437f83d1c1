//! `run` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ExporterConfig, OutputKind};
use dispatcher::{Dispatcher, DispatcherConfig, OutputSink};
use ingestion::{HttpFeedSource, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_exporter(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;

    info!(
        url = %config.feed.url,
        max_retries = config.retry.max_retries,
        delay_ms = config.retry.delay_ms,
        backoff = ?config.retry.backoff,
        sink = ?config.output.sink,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        println!("{}", effective_config(&config)?);
        return Ok(());
    }

    if let Some(addr) = config.output.listen {
        observability::init_metrics_exporter(addr)?;
    }

    let source = HttpFeedSource::new(&config.feed.url)
        .with_context(|| format!("Failed to create feed client for {}", config.feed.url))?;
    let dispatcher = Dispatcher::new(
        Arc::new(source),
        RetryPolicy::from(&config.retry),
        OutputSink::from_config(&config.output),
        DispatcherConfig::from(&config.channels),
    );

    // Setup graceful shutdown handler
    let shutdown = CancellationToken::new();
    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            warn!("Received shutdown signal, stopping exporter...");
            shutdown.cancel();
        }
    });

    info!("Starting exporter...");
    let result = dispatcher.run(shutdown).await;
    signal_task.abort();

    let stats = result.context("Exporter stopped")?;
    info!(
        received = stats.messages_received,
        forwarded = stats.readings_forwarded,
        filtered = stats.messages_filtered,
        sink_errors = stats.sink_errors,
        restarts = stats.restarts,
        stale = stats.stale_discarded,
        values = %stats.values.summary(),
        "Lunarsensor exporter finished"
    );
    Ok(())
}

/// Load the config file (if any), then apply CLI overrides and validate
pub(crate) fn build_config(args: &RunArgs) -> Result<ExporterConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => ExporterConfig::default(),
    };

    // Apply CLI overrides
    if let Some(ref url) = args.url {
        config.feed.url = url.clone();
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(delay) = args.delay {
        config.retry.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    }
    if let Some(backoff) = args.backoff {
        config.retry.backoff = backoff.into();
    }
    if let Some(listen) = args.listen {
        config.output.listen = Some(listen);
        config.output.sink = OutputKind::Gauge;
    }
    if let Some(output) = args.output {
        config.output.sink = output.into();
    }
    if let Some(ref gauge_name) = args.gauge_name {
        config.output.gauge_name = gauge_name.clone();
    }

    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Effective configuration (file plus overrides) as TOML, for dry-run mode
fn effective_config(config: &ExporterConfig) -> Result<String> {
    ConfigLoader::to_toml(config).context("Failed to render effective configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{BackoffArg, OutputArg};
    use contracts::BackoffKind;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_defaults_without_config_file() {
        let config = build_config(&RunArgs::default()).unwrap();
        assert_eq!(config, ExporterConfig::default());
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[feed]\nurl = \"http://file.local/events\"\n\n[retry]\nmax_retries = 9"
        )
        .unwrap();

        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            url: Some("http://cli.local/events".to_string()),
            delay: Some(Duration::from_secs(2)),
            backoff: Some(BackoffArg::Constant),
            ..Default::default()
        };
        let config = build_config(&args).unwrap();

        assert_eq!(config.feed.url, "http://cli.local/events");
        assert_eq!(config.retry.max_retries, 9);
        assert_eq!(config.retry.delay_ms, 2000);
        assert_eq!(config.retry.backoff, BackoffKind::Constant);
    }

    #[test]
    fn test_listen_selects_gauge_unless_output_given() {
        let listen = Some("127.0.0.1:9100".parse().unwrap());

        let args = RunArgs {
            listen,
            ..Default::default()
        };
        assert_eq!(build_config(&args).unwrap().output.sink, OutputKind::Gauge);

        let args = RunArgs {
            listen,
            output: Some(OutputArg::Console),
            ..Default::default()
        };
        assert_eq!(build_config(&args).unwrap().output.sink, OutputKind::Console);
    }

    #[test]
    fn test_effective_config_reloads() {
        let args = RunArgs {
            url: Some("http://cli.local/events".to_string()),
            backoff: Some(BackoffArg::Exponential),
            listen: Some("127.0.0.1:9100".parse().unwrap()),
            ..Default::default()
        };
        let config = build_config(&args).unwrap();

        let rendered = effective_config(&config).unwrap();
        assert!(rendered.contains("http://cli.local/events"));

        let reloaded =
            ConfigLoader::load_from_str(&rendered, config_loader::ConfigFormat::Toml).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = RunArgs {
            max_retries: Some(0),
            ..Default::default()
        };
        assert!(build_config(&args).is_err());

        let args = RunArgs {
            output: Some(OutputArg::Gauge),
            ..Default::default()
        };
        assert!(build_config(&args).is_err());
    }
}
