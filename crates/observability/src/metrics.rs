//! 运行指标模块
//!
//! 通过 `metrics` facade 记录连接、解码、分发相关指标。
//! 未安装 recorder 时所有调用均为 no-op。

use metrics::{counter, gauge};

/// 记录一次连接尝试
pub fn record_connect_attempt(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "lunarsensor_connect_attempts_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录成功解码的 block
pub fn record_block_decoded() {
    counter!("lunarsensor_blocks_decoded_total").increment(1);
}

/// 记录解码失败
pub fn record_decode_error() {
    counter!("lunarsensor_decode_errors_total").increment(1);
}

/// 记录管道重启 (新的 generation)
pub fn record_pipeline_restart(generation: u64) {
    counter!("lunarsensor_pipeline_restarts_total").increment(1);
    gauge!("lunarsensor_pipeline_generation").set(generation as f64);
}

/// 记录转发到 sink 的读数
pub fn record_reading_forwarded(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "lunarsensor_readings_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录被过滤的消息
pub fn record_message_filtered(event: &str) {
    counter!(
        "lunarsensor_messages_filtered_total",
        "event" => event.to_string()
    )
    .increment(1);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }

    /// 摘要
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
