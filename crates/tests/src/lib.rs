//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - HTTP e2e 测试（wiremock 模拟 lunarsensor 事件流）

#[cfg(test)]
mod contract_tests {
    use contracts::{Message, EVENT_PING, EVENT_STATE, STATE_NO_READING};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_reading_filter_snapshot() {
        let mut message = Message {
            event: EVENT_STATE.to_string(),
            ..Default::default()
        };
        message.data.state = "1".to_string();
        assert!(message.has_reading());

        message.data.state = STATE_NO_READING.to_string();
        assert!(!message.has_reading());

        message.event = EVENT_PING.to_string();
        message.data.state = "1".to_string();
        assert!(!message.has_reading());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::{ConsoleSink, Dispatcher, DispatcherConfig, DispatcherError};
    use ingestion::{Backoff, BlockReader, HttpFeedSource, IngestionError, RetryPolicy};
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = "retry: 30000\n\
id: 5098007\n\
event: ping\n\
data:\n\
\n\
event: state\n\
data: {\"id\":\"sensor-ambient_light_tsl2591\",\"state\":\"1\",\"value\":0.839524}\n\
\n\
event: state\n\
data: {\"id\":\"sensor-ambient_light_tsl2561\",\"state\":\"nan lx\",\"value\":NaN}\n\
\n\
event: state\n\
data: {\"id\":\"sensor-ambient_light_tsl2591\",\"state\":\"1\",\"value\":\"NaN\"}\n\
\n";

    /// Writer shared with the test after the sink is moved into the dispatcher
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn feed_server(times: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(FEED),
            )
            .up_to_n_times(times)
            .mount(&server)
            .await;
        server
    }

    /// End-to-end test: HTTP feed -> BlockReader -> Dispatcher -> ConsoleSink
    ///
    /// 验证完整的数据流：
    /// 1. 每次连接读取完整事件流，流结束后整条管道重连
    /// 2. ping 与 "nan lx" 状态被过滤，"NaN" 值按 0 输出
    /// 3. 服务端不再响应后重试耗尽，Dispatcher 返回致命错误
    #[tokio::test]
    async fn test_e2e_http_pipeline() {
        let server = feed_server(2).await;

        let config = ConfigLoader::load_from_str(
            &format!(
                "[feed]\nurl = \"{}/events\"\n\n[retry]\nmax_retries = 1\ndelay_ms = 0\n",
                server.uri()
            ),
            ConfigFormat::Toml,
        )
        .unwrap();

        let buffer = SharedBuffer::default();
        let dispatcher = Dispatcher::new(
            Arc::new(HttpFeedSource::new(&config.feed.url).unwrap()),
            RetryPolicy::from(&config.retry),
            ConsoleSink::new("console", buffer.clone()),
            DispatcherConfig::from(&config.channels),
        );

        let err = dispatcher.run(CancellationToken::new()).await.unwrap_err();

        // Third connect gets a 404 once the mock is used up.
        match err {
            DispatcherError::Fatal(IngestionError::ConnectExhausted { attempts, .. }) => {
                assert_eq!(attempts, 1)
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let values: Vec<String> = buffer
            .lines()
            .iter()
            .map(|line| {
                let (timestamp, value) = line.split_once(' ').unwrap();
                assert!(timestamp.parse::<i64>().unwrap() > 0);
                value.to_string()
            })
            .collect();
        assert_eq!(values, ["0.839524", "0.000000", "0.839524", "0.000000"]);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_e2e_block_reader_over_http() {
        let server = feed_server(1).await;
        let source = HttpFeedSource::new(format!("{}/events", server.uri())).unwrap();
        let policy = RetryPolicy::new(1, Backoff::Constant(Duration::ZERO));

        let stream = match policy.connect(&source).await {
            Ok(stream) => stream,
            Err(e) => panic!("connect failed: {e}"),
        };
        let mut reader = BlockReader::new(stream);

        let ping = reader.next_message().await.unwrap();
        assert_eq!(ping.event, "ping");
        assert_eq!(ping.id, 5098007);
        assert_eq!(ping.retry, 30000);

        let state = reader.next_message().await.unwrap();
        assert_eq!(state.data.id, "sensor-ambient_light_tsl2591");
        assert!((state.data.value - 0.83952397108078).abs() < 1e-12);

        let no_reading = reader.next_message().await.unwrap();
        assert_eq!(no_reading.data.state, "nan lx");
        assert_eq!(no_reading.data.value, 0.0);

        let sentinel = reader.next_message().await.unwrap();
        assert_eq!(sentinel.data.value, 0.0);

        assert!(matches!(
            reader.next_message().await,
            Err(IngestionError::EndOfStream)
        ));
    }

    #[tokio::test]
    async fn test_e2e_unreachable_feed_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let buffer = SharedBuffer::default();
        let dispatcher = Dispatcher::new(
            Arc::new(HttpFeedSource::new(format!("{}/events", server.uri())).unwrap()),
            RetryPolicy::new(3, Backoff::Linear(Duration::from_millis(10))),
            ConsoleSink::new("console", buffer.clone()),
            DispatcherConfig::default(),
        );

        let err = dispatcher.run(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(
            err,
            DispatcherError::Fatal(IngestionError::ConnectExhausted { attempts: 3, .. })
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
        assert!(buffer.lines().is_empty());
    }
}
