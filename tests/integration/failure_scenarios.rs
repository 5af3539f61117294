//! Integration tests for failure handling
//!
//! An unreachable controller, a failing notifier, or a stopped collector must
//! degrade the output without taking the monitor down.

use std::time::Duration;

use heating_monitor::{
    config::{NotifierConfig, Webhook},
    cycle::ConnectionOutcome,
    register::ModbusRegisterClient,
    runtime::Monitor,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::helpers::*;

fn consecutive_failures(outcome: &ConnectionOutcome) -> u32 {
    match outcome {
        ConnectionOutcome::Failed {
            consecutive_failures,
            ..
        } => *consecutive_failures,
        other => panic!("expected a failed connection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_controller() {
    let config = test_config(
        closed_port(),
        360,
        json!([{ "name": "supply", "display": "Supply", "address": 5 }]),
    );
    let client = ModbusRegisterClient::new(&config.controller);
    let monitor = Monitor::start(&config, client).await.unwrap();

    let first = monitor.collector.poll_now().await.unwrap();
    assert!(!first.connected());
    assert!(first.readings.is_empty());

    let second = monitor.collector.poll_now().await.unwrap();
    assert!(
        consecutive_failures(&second.connection) > consecutive_failures(&first.connection)
    );

    let snapshot = monitor.read_model.channel("supply").await.unwrap();
    assert_eq!(snapshot.count, 0);

    let text = monitor.read_model.generate_report("Heating report").await;
    assert!(text.contains("Supply: data unavailable"));

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failing_webhook_does_not_stop_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let controller = FakeController::default();
    controller.set_float(5, 20.0);
    let addr = controller.spawn().await;

    let mut config = test_config(
        addr.port(),
        1,
        json!([{
            "name": "supply",
            "address": 5,
            "alert": { "trip": 25.0, "reset": 30.0 },
        }]),
    );
    config.notifier = Some(NotifierConfig::Webhook(Webhook {
        url: format!("{}/hook", server.uri()),
    }));

    let monitor = Monitor::start(&config, ModbusRegisterClient::new(&config.controller))
        .await
        .unwrap();

    // window of one trips on the first cycle; the webhook rejects the alarm
    tokio::time::timeout(Duration::from_secs(2), async {
        while server.received_requests().await.unwrap_or_default().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("alarm was never sent");

    controller.set_float(5, 60.0);
    let report = monitor.collector.poll_now().await.unwrap();
    assert_eq!(report.successful_reads(), 1);

    let snapshot = monitor.read_model.channel("supply").await.unwrap();
    assert_eq!(snapshot.last_value(), Some(60.0));

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_poll_after_shutdown_fails() {
    let controller = FakeController::default();
    controller.set_float(5, 50.0);
    let addr = controller.spawn().await;

    let config = test_config(addr.port(), 360, json!([{ "name": "supply", "address": 5 }]));
    let monitor = Monitor::start(&config, ModbusRegisterClient::new(&config.controller))
        .await
        .unwrap();

    let collector = monitor.collector.clone();
    let alerts = monitor.alerts.clone();
    monitor.shutdown().await.unwrap();

    assert!(collector.poll_now().await.is_err());
    assert_eq!(alerts.is_muted().await, None);
}
