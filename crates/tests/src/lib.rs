//! # Integration Tests
//!
//! Cross-crate scenario tests.
//!
//! Covers:
//! - Contract snapshots
//! - Dispatcher scenarios driven tick by tick
//! - Config -> dispatcher -> driver end to end

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        let _ = contracts::TickOutcome::Reconciled(contracts::ExecutionOutcome::Completed);
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use dispatcher::{
        Action, Dispatcher, ExecutionOutcome, Message, PublishOutcome, TickOutcome,
    };
    use tokio::sync::Notify;
    use tokio::time::{sleep, timeout};

    /// Nullary action parked on `gate`; counts how often it was started
    fn parked(gate: &Arc<Notify>, starts: &Arc<AtomicUsize>) -> Action<String> {
        let gate = Arc::clone(gate);
        let starts = Arc::clone(starts);
        Action::nullary(move || {
            starts.fetch_add(1, Ordering::SeqCst);
            let gate = Arc::clone(&gate);
            async move {
                gate.notified().await;
            }
        })
    }

    async fn finish(dispatcher: &Dispatcher<String>, gate: &Notify, topic: &str) {
        gate.notify_one();
        timeout(Duration::from_secs(1), async {
            while dispatcher.is_running(topic) {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("action did not finish");
    }

    /// Scenario A: drop while busy, skip while running, reconcile after finish
    #[tokio::test]
    async fn test_scenario_a_busy_lifecycle() {
        let dispatcher = Dispatcher::new();
        let gate = Arc::new(Notify::new());
        let starts = Arc::new(AtomicUsize::new(0));
        dispatcher.register("t1", parked(&gate, &starts)).unwrap();

        dispatcher.publish(Message::new("t1"));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);

        let before = dispatcher.pending();
        assert_eq!(
            dispatcher.publish(Message::new("t1")),
            PublishOutcome::DroppedBusy
        );
        assert_eq!(dispatcher.pending(), before);

        for _ in 0..5 {
            assert_eq!(dispatcher.tick(), TickOutcome::Skipped);
        }

        finish(&dispatcher, &gate, "t1").await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(
            dispatcher.tick(),
            TickOutcome::Reconciled(ExecutionOutcome::Completed)
        );
        assert_eq!(dispatcher.pending(), None);
        assert!(!dispatcher.is_busy());
    }

    /// Scenario B: unknown topic stays pending, busy never set
    #[tokio::test]
    async fn test_scenario_b_unknown_topic() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        dispatcher.register_nullary("t1", || async {}).unwrap();

        dispatcher.publish(Message::new("unknown"));
        assert_eq!(dispatcher.tick(), TickOutcome::UnknownTopic);
        assert_eq!(dispatcher.pending(), Some(Message::new("unknown")));
        assert!(!dispatcher.is_busy());

        assert_eq!(
            dispatcher.publish(Message::with_value("other", "v".to_string())),
            PublishOutcome::Replaced
        );
        assert_eq!(
            dispatcher.pending(),
            Some(Message::with_value("other", "v".to_string()))
        );
    }

    /// Scenario C: unary action receives the message value
    #[tokio::test]
    async fn test_scenario_c_unary_value() {
        let dispatcher = Dispatcher::new();
        let received = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&received);
        dispatcher
            .register_unary("t2", move |value: Option<String>| {
                let slot = Arc::clone(&slot);
                async move {
                    *slot.lock().unwrap() = value;
                }
            })
            .unwrap();

        dispatcher.publish(Message::with_value("t2", "X".to_string()));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);

        timeout(Duration::from_secs(1), async {
            while received.lock().unwrap().is_none() {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("unary action not invoked");
        assert_eq!(received.lock().unwrap().as_deref(), Some("X"));
    }

    /// Scenario D: a second full cycle behaves like the first
    #[tokio::test]
    async fn test_scenario_d_repeated_cycles() {
        let dispatcher = Dispatcher::new();
        let gate = Arc::new(Notify::new());
        let starts = Arc::new(AtomicUsize::new(0));
        dispatcher.register("t1", parked(&gate, &starts)).unwrap();

        for cycle in 1..=2 {
            assert_eq!(
                dispatcher.publish(Message::new("t1")),
                PublishOutcome::Accepted
            );
            assert_eq!(dispatcher.tick(), TickOutcome::Started);
            assert!(dispatcher.is_busy());
            finish(&dispatcher, &gate, "t1").await;
            assert_eq!(
                dispatcher.tick(),
                TickOutcome::Reconciled(ExecutionOutcome::Completed)
            );
            assert!(!dispatcher.is_busy());
            assert_eq!(starts.load(Ordering::SeqCst), cycle);
        }
    }

    /// At most one message is ever pending, whatever the publish sequence
    #[test]
    fn test_single_pending_slot() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        for i in 0..10 {
            let outcome = dispatcher.publish(Message::with_value("t", i.to_string()));
            assert!(outcome.is_stored());
        }
        assert_eq!(
            dispatcher.pending(),
            Some(Message::with_value("t", "9".to_string()))
        );
        let snap = dispatcher.metrics().snapshot();
        assert_eq!(snap.accepted_count, 1);
        assert_eq!(snap.replaced_count, 9);
    }

    /// Nullary vs unary dispatch
    #[tokio::test]
    async fn test_arity_dispatch() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&calls);
        dispatcher
            .register_nullary("zero", move || {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push("zero".to_string());
                }
            })
            .unwrap();
        let log = Arc::clone(&calls);
        dispatcher
            .register_unary("one", move |value: Option<String>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock()
                        .unwrap()
                        .push(format!("one:{}", value.unwrap_or_default()));
                }
            })
            .unwrap();

        for (topic, value) in [("zero", "ignored"), ("one", "payload")] {
            dispatcher.publish(Message::with_value(topic, value.to_string()));
            assert_eq!(dispatcher.tick(), TickOutcome::Started);
            timeout(Duration::from_secs(1), async {
                while dispatcher.is_running(topic) {
                    sleep(Duration::from_millis(1)).await;
                }
            })
            .await
            .unwrap();
            assert!(matches!(dispatcher.tick(), TickOutcome::Reconciled(_)));
        }

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["zero".to_string(), "one:payload".to_string()]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::{Dispatcher, Message, TickDriver};
    use tokio::time::sleep;

    const CONFIG: &str = r#"
[dispatcher]
tick_interval_ms = 100

[[handlers]]
topic = "job"
kind = "counter"
steps = 3
step_interval_ms = 100
"#;

    /// Config -> Dispatcher -> TickDriver, with a publish dropped mid-run
    #[tokio::test(start_paused = true)]
    async fn test_e2e_driver_from_config() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let dispatcher: Arc<Dispatcher<String>> = Arc::new(Dispatcher::new());

        let handler = &blueprint.handlers[0];
        let steps = handler.steps;
        let step = handler.step_interval();
        dispatcher
            .register_nullary(handler.topic.clone(), move || async move {
                for _ in 0..steps {
                    sleep(step).await;
                }
            })
            .unwrap();

        let driver = TickDriver::spawn(
            Arc::clone(&dispatcher),
            blueprint.dispatcher.tick_interval(),
        )
        .unwrap();

        // t=0 accepted, started at t=100, runs 300ms
        assert!(dispatcher.publish(Message::new("job")).is_stored());
        sleep(Duration::from_millis(250)).await;
        assert!(dispatcher.is_running("job"));
        assert!(!dispatcher.publish(Message::new("job")).is_stored());

        // finishes at t=400, reconciled on the t=500 tick
        sleep(Duration::from_millis(300)).await;
        assert!(!dispatcher.is_busy());
        assert!(!dispatcher.has_pending());

        let ticks = driver.shutdown().await.unwrap();
        assert_eq!(ticks, 5);

        let snap = dispatcher.metrics().snapshot();
        assert_eq!(snap.started_count, 1);
        assert_eq!(snap.reconciled_count, 1);
        assert_eq!(snap.dropped_count, 1);
    }
}
