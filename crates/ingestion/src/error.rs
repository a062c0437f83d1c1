//! Ingestion 错误类型

use thiserror::Error;

/// Block 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    /// 结构化文本无法解析
    #[error("malformed block: {0}")]
    Syntax(#[from] serde_yaml::Error),

    /// value 字段既不是数字也不是 "NaN"
    #[error("invalid reading value '{text}'")]
    InvalidValue {
        /// 原始文本
        text: String,
    },
}

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 单次连接失败
    #[error("failed to get stream from {endpoint}: {message}")]
    Connect {
        /// 目标地址
        endpoint: String,
        /// 错误消息
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 重试次数耗尽，进程级致命错误
    #[error("giving up on {endpoint} after {attempts} connect attempts: {last}")]
    ConnectExhausted {
        /// 目标地址
        endpoint: String,
        /// 已尝试次数
        attempts: u32,
        /// 最后一次失败
        last: Box<IngestionError>,
    },

    /// 底层读取失败
    #[error("failed to read line: {0}")]
    Read(#[from] std::io::Error),

    /// 流正常结束
    #[error("failed to read line: end of stream")]
    EndOfStream,

    /// Block 解码失败
    #[error("failed to process block: {0}")]
    Decode(#[from] DecodeError),

    /// 下游通道已关闭
    #[error("dispatcher channel closed")]
    ChannelClosed,
}

impl IngestionError {
    /// Create a single-attempt connect error
    pub fn connect(
        endpoint: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let source = source.into();
        Self::Connect {
            endpoint: endpoint.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Only an exhausted connect budget ends the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectExhausted { .. })
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
