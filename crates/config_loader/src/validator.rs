//! 配置校验模块
//!
//! 校验规则：
//! - feed.url 是合法的 http/https URL
//! - retry.max_retries >= 1
//! - channel 容量 >= 1
//! - gauge 输出必须配置 listen 地址
//! - gauge 名称符合 Prometheus 命名规则

use contracts::{ContractError, ExporterConfig, OutputKind};
use url::Url;

/// 校验 ExporterConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &ExporterConfig) -> Result<(), ContractError> {
    validate_feed(config)?;
    validate_retry(config)?;
    validate_channels(config)?;
    validate_output(config)?;
    Ok(())
}

/// 校验 feed URL
fn validate_feed(config: &ExporterConfig) -> Result<(), ContractError> {
    let url = Url::parse(&config.feed.url).map_err(|e| {
        ContractError::config_validation(
            "feed.url",
            format!("invalid url '{}': {e}", config.feed.url),
        )
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ContractError::config_validation(
            "feed.url",
            format!("unsupported scheme '{scheme}', expected http or https"),
        )),
    }
}

/// 校验重试策略
fn validate_retry(config: &ExporterConfig) -> Result<(), ContractError> {
    if config.retry.max_retries == 0 {
        return Err(ContractError::config_validation(
            "retry.max_retries",
            "max_retries must be >= 1",
        ));
    }
    Ok(())
}

/// 校验通道容量
fn validate_channels(config: &ExporterConfig) -> Result<(), ContractError> {
    let channels = &config.channels;

    if channels.message_capacity == 0 {
        return Err(ContractError::config_validation(
            "channels.message_capacity",
            "message_capacity must be >= 1",
        ));
    }

    // 至少容纳一个待处理错误，生产者不会因慢消费者阻塞
    if channels.error_capacity == 0 {
        return Err(ContractError::config_validation(
            "channels.error_capacity",
            "error_capacity must be >= 1",
        ));
    }

    Ok(())
}

/// 校验输出配置
fn validate_output(config: &ExporterConfig) -> Result<(), ContractError> {
    let output = &config.output;

    if output.sink == OutputKind::Gauge && output.listen.is_none() {
        return Err(ContractError::config_validation(
            "output.listen",
            "gauge output requires a listen address",
        ));
    }

    if !is_valid_metric_name(&output.gauge_name) {
        return Err(ContractError::config_validation(
            "output.gauge_name",
            format!("'{}' is not a valid metric name", output.gauge_name),
        ));
    }

    Ok(())
}

/// Prometheus 指标名: `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&ExporterConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = ExporterConfig::default();
        config.feed.url = "not a url".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("feed.url"), "got: {err}");
    }

    #[test]
    fn test_unsupported_scheme() {
        let mut config = ExporterConfig::default();
        config.feed.url = "ftp://lunarsensor.local/events".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("unsupported scheme 'ftp'"), "got: {err}");
    }

    #[test]
    fn test_zero_retries() {
        let mut config = ExporterConfig::default();
        config.retry.max_retries = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_retries must be >= 1"), "got: {err}");
    }

    #[test]
    fn test_zero_error_capacity() {
        let mut config = ExporterConfig::default();
        config.channels.error_capacity = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("error_capacity"), "got: {err}");
    }

    #[test]
    fn test_gauge_requires_listen() {
        let mut config = ExporterConfig::default();
        config.output.sink = OutputKind::Gauge;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("requires a listen address"), "got: {err}");

        config.output.listen = Some("127.0.0.1:9100".parse().unwrap());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_metric_names() {
        assert!(is_valid_metric_name("lunarsensor_value"));
        assert!(is_valid_metric_name("ns:lux"));
        assert!(!is_valid_metric_name("9lux"));
        assert!(!is_valid_metric_name("ambient-light"));
        assert!(!is_valid_metric_name(""));
    }
}
