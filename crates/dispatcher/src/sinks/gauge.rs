//! GaugeSink - exposes the latest reading as a Prometheus gauge
//!
//! 数值通过 `metrics` facade 写入；HTTP 暴露由 observability 安装的
//! Prometheus exporter 负责。

use contracts::{ContractError, Reading, ReadingSink};
use metrics::gauge;
use tracing::{instrument, trace};

/// Sink that sets a named gauge to the latest value
pub struct GaugeSink {
    gauge_name: String,
}

impl GaugeSink {
    /// Create a new GaugeSink for `gauge_name`
    pub fn new(gauge_name: impl Into<String>) -> Self {
        Self {
            gauge_name: gauge_name.into(),
        }
    }

    /// Set the gauge on the currently installed recorder
    pub fn publish(&self, reading: &Reading) {
        gauge!(self.gauge_name.clone()).set(reading.value);
        trace!(
            gauge = %self.gauge_name,
            value = reading.value,
            timestamp_ms = reading.timestamp_ms,
            "Gauge updated"
        );
    }
}

impl ReadingSink for GaugeSink {
    fn name(&self) -> &str {
        &self.gauge_name
    }

    #[instrument(
        name = "gauge_sink_record",
        skip(self, reading),
        fields(gauge = %self.gauge_name)
    )]
    async fn record(&mut self, reading: Reading) -> Result<(), ContractError> {
        self.publish(&reading);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use std::sync::{Arc, Mutex};

    /// Captures every gauge `set` as (name, value)
    #[derive(Default)]
    struct GaugeCapture {
        sets: Arc<Mutex<Vec<(String, f64)>>>,
    }

    struct CapturedGauge {
        name: String,
        sets: Arc<Mutex<Vec<(String, f64)>>>,
    }

    impl GaugeFn for CapturedGauge {
        fn increment(&self, _value: f64) {}

        fn decrement(&self, _value: f64) {}

        fn set(&self, value: f64) {
            self.sets.lock().unwrap().push((self.name.clone(), value));
        }
    }

    impl Recorder for GaugeCapture {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::from_arc(Arc::new(CapturedGauge {
                name: key.name().to_string(),
                sets: self.sets.clone(),
            }))
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_publish_sets_named_gauge() {
        let recorder = GaugeCapture::default();
        let sink = GaugeSink::new("lunarsensor_value");

        metrics::with_local_recorder(&recorder, || {
            sink.publish(&Reading::new(1, 0.5));
            sink.publish(&Reading::new(2, 0.0));
        });

        let sets = recorder.sets.lock().unwrap().clone();
        assert_eq!(
            sets,
            vec![
                ("lunarsensor_value".to_string(), 0.5),
                ("lunarsensor_value".to_string(), 0.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_record_without_recorder_is_ok() {
        let mut sink = GaugeSink::new("ambient_light");
        assert!(sink.record(Reading::new(1, 1.25)).await.is_ok());
        assert_eq!(sink.name(), "ambient_light");
    }
}
