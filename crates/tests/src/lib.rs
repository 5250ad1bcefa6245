//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> dispatcher -> backend -> sink 端到端测试
//! - 隔离性（慢 backend、panic backend）回归

#[cfg(test)]
mod contract_tests {
    use contracts::{NativeLevel, Severity};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_severity_snapshot() {
        let table: Vec<_> = Severity::ALL
            .iter()
            .map(|s| (s.label(), s.glyph(), s.native_level()))
            .collect();
        assert_eq!(
            table,
            vec![
                ("info", "👋", NativeLevel::Info),
                ("analytic", "📈", NativeLevel::Notice),
                ("warning", "⚠️", NativeLevel::Fault),
                ("severe", "🚨", NativeLevel::Error),
            ]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use async_trait::async_trait;
    use contracts::{
        params, Backend, Event, Severity, UserIdentity, UserProperties, Value,
    };
    use dispatcher::{
        ConsoleBackend, ConsoleConfig, Dispatcher, LogSink, LogWriter, MemoryWriter, RecordedCall,
        RecordingBackend,
    };
    use std::io;
    use std::time::{Duration, Instant};

    /// Two recording backends see the same calls with the same arguments
    #[tokio::test]
    async fn test_scenario_two_backends() {
        let first = RecordingBackend::new("first");
        let second = RecordingBackend::new("second");
        let recordings = [first.recording(), second.recording()];

        let dispatcher = Dispatcher::builder()
            .backend(first)
            .backend(second)
            .build()
            .unwrap();

        dispatcher.report_event_with(
            "Test Event",
            Some(params! { "key" => "value" }),
            Severity::Info,
        );
        dispatcher.delete_user_profile();
        dispatcher.shutdown().await;

        for recording in &recordings {
            let calls = recording.calls();
            assert_eq!(calls.len(), 2);
            match &calls[0] {
                RecordedCall::Event(event) => {
                    assert_eq!(event.name(), "Test Event");
                    assert_eq!(event.severity(), Severity::Info);
                    assert_eq!(
                        event.parameters().unwrap()["key"],
                        Value::from("value")
                    );
                }
                other => panic!("unexpected call {other:?}"),
            }
            assert_eq!(calls[1], RecordedCall::DeleteProfile);
        }
    }

    /// Dispatcher -> ConsoleBackend -> LogSink -> MemoryWriter
    #[tokio::test]
    async fn test_console_output_end_to_end() {
        let memory = MemoryWriter::new();
        let console = ConsoleBackend::with_sink(
            "console",
            ConsoleConfig::default(),
            LogSink::spawn(memory.clone()),
        );

        let dispatcher = Dispatcher::builder().backend(console).build().unwrap();

        dispatcher.report_event(
            Event::new("Purchase")
                .with_parameter("sku", "A1")
                .with_parameter("price", 9.99),
        );
        dispatcher.report_screen_view(Event::new("Checkout").with_severity(Severity::Info));
        dispatcher.identify_user("user123", Some("John Doe".into()), None);
        dispatcher.set_user_properties(UserProperties::high_priority(
            params! { "plan" => "pro" },
        ));
        dispatcher.delete_user_profile();
        dispatcher.report_event_with("Crash", None, Severity::Severe);

        // Worker flushes the backend, which flushes its sink
        dispatcher.shutdown().await;

        assert_eq!(
            memory.text(),
            "📈 Purchase\n  (key: \"price\", value: 9.99)\n  (key: \"sku\", value: A1)\n\
             👋 Checkout\n\
             📈 Identify User\n  userId: user123\n  name: John Doe\n  email: nil\n\
             📈 Add User Properties (isHighPriority: true)\n  (key: \"plan\", value: pro)\n\
             📈 Delete User Profile\n\
             🚨 Crash"
        );
        let severities: Vec<_> = memory.lines().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Analytic,
                Severity::Info,
                Severity::Info,
                Severity::Info,
                Severity::Info,
                Severity::Severe
            ]
        );
    }

    /// Every console line of a burst reaches the sink, even with nothing
    /// yielding between calls
    #[tokio::test]
    async fn test_console_burst_is_not_lost() {
        let memory = MemoryWriter::new();
        let console = ConsoleBackend::with_sink(
            "console",
            ConsoleConfig::quiet(),
            LogSink::spawn(memory.clone()),
        );
        let dispatcher = Dispatcher::builder().backend(console).build().unwrap();

        for i in 0..1500 {
            dispatcher.report_event(format!("e{i}"));
        }
        let report = dispatcher.shutdown().await;

        assert_eq!(report[0].1.dropped_count, 0);
        let messages = memory.messages();
        assert_eq!(messages.len(), 1500);
        assert_eq!(messages[0], "📈 e0");
        assert_eq!(messages[1499], "📈 e1499");
    }

    /// Terminal that takes 100ms per line
    struct StalledTerminal(MemoryWriter);

    impl LogWriter for StalledTerminal {
        fn kind(&self) -> &'static str {
            "stalled"
        }

        fn write_line(&mut self, severity: Severity, message: &str) -> io::Result<()> {
            std::thread::sleep(Duration::from_millis(100));
            self.0.write_line(severity, message)
        }
    }

    #[tokio::test]
    async fn test_stalled_console_leaves_host_responsive() {
        let stalled = MemoryWriter::new();
        let fast = MemoryWriter::new();
        let dispatcher = Dispatcher::builder()
            .backend(ConsoleBackend::with_sink(
                "slow",
                ConsoleConfig::default(),
                LogSink::spawn(StalledTerminal(stalled.clone())),
            ))
            .backend(ConsoleBackend::with_sink(
                "fast",
                ConsoleConfig::default(),
                LogSink::spawn(fast.clone()),
            ))
            .build()
            .unwrap();

        for i in 0..10 {
            dispatcher.report_event(format!("e{i}"));
        }

        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(300));
        // The fast console is not held back by the stalled one
        tokio::time::timeout(Duration::from_secs(1), async {
            while fast.messages().len() < 10 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(stalled.messages().len() < 10);

        dispatcher.shutdown().await;
        assert_eq!(stalled.messages().len(), 10);
    }

    /// Backend that panics on every event
    struct ExplodingBackend;

    #[async_trait]
    impl Backend for ExplodingBackend {
        fn name(&self) -> &str {
            "exploding"
        }

        async fn report_event(&mut self, event: &Event) {
            panic!("cannot handle {}", event.name());
        }

        async fn report_screen_view(&mut self, _event: &Event) {}

        async fn identify_user(&mut self, _user: &UserIdentity) {}

        async fn set_user_properties(&mut self, _properties: &UserProperties) {}

        async fn delete_user_profile(&mut self) {}
    }

    #[tokio::test]
    async fn test_panicking_backend_is_isolated() {
        let healthy = RecordingBackend::new("healthy");
        let recording = healthy.recording();

        let dispatcher = Dispatcher::builder()
            .backend(ExplodingBackend)
            .backend(healthy)
            .build()
            .unwrap();

        dispatcher.report_event("One");
        dispatcher.report_event("Two");
        dispatcher.delete_user_profile();

        let report = dispatcher.shutdown().await;
        assert_eq!(report[0].0, "exploding");
        assert_eq!(report[0].1.panic_count, 2);
        assert_eq!(report[0].1.delivered_count, 1);
        assert_eq!(report[1].1.panic_count, 0);
        assert_eq!(recording.event_names(), vec!["One", "Two"]);
        assert_eq!(recording.calls().last(), Some(&RecordedCall::DeleteProfile));
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::create_dispatcher;

    const CONFIG: &str = r#"
[[backends]]
name = "console"
backend_type = "console"

[backends.params]
print_parameters = false

[[backends]]
name = "system"
backend_type = "console"
queue_capacity = 16

[backends.params]
sink = "system_log"
"#;

    #[tokio::test]
    async fn test_config_to_dispatcher() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let dispatcher = create_dispatcher(&blueprint).unwrap();
        assert_eq!(dispatcher.backend_names(), vec!["console", "system"]);
        assert_eq!(blueprint.backends[0].queue_capacity, None);

        dispatcher.report_event("Launched");
        dispatcher.identify_user("u1", None, None);

        let report = dispatcher.shutdown().await;
        for (_, snapshot) in &report {
            assert_eq!(snapshot.delivered_count, 2);
            assert_eq!(snapshot.dropped_count, 0);
            assert_eq!(snapshot.latency_ms.count, 2);
        }
    }

    #[test]
    fn test_empty_config_needs_no_runtime() {
        let blueprint = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        let dispatcher = create_dispatcher(&blueprint).unwrap();
        assert!(dispatcher.is_empty());
        dispatcher.report_event("ignored");
    }

    #[test]
    fn test_invalid_config_rejected_before_dispatch() {
        let err = ConfigLoader::load_from_str(
            r#"
[[backends]]
name = ""
backend_type = "console"
"#,
            ConfigFormat::Toml,
        )
        .unwrap_err();
        assert!(err.to_string().contains("backends[0].name"));
    }
}
