//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，输出到 stderr)
//! - Prometheus 指标导出 (gauge 输出也经由此端点暴露)
//! - 连接/解码/分发指标记录
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_metrics_exporter, init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, "info")?;
//! init_metrics_exporter("0.0.0.0:9100".parse()?)?;
//! observability::record_block_decoded();
//! ```

pub mod metrics;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_block_decoded, record_connect_attempt, record_decode_error, record_message_filtered,
    record_pipeline_restart, record_reading_forwarded, RunningStats, StatsSummary,
};

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 初始化 Tracing
///
/// 日志写入 stderr，stdout 留给 console 输出。
pub fn init_tracing(log_format: LogFormat, default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = match log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// 安装 Prometheus recorder 并在 `addr` 上暴露 `/metrics`
///
/// 需在 Tokio runtime 内调用；gauge 输出与内部指标共用此端点。
pub fn init_metrics_exporter(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(listen = %addr, "Prometheus metrics endpoint initialized");
    Ok(())
}
