//! Notifier payloads as they leave the monitor

use std::time::Duration;

use heating_monitor::{
    config::{Discord, NotifierConfig, Webhook},
    register::ModbusRegisterClient,
    runtime::Monitor,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::helpers::*;

async fn mock_endpoint() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    server
}

async fn wait_for_bodies(server: &MockServer, count: usize) -> Vec<Value> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let requests = server.received_requests().await.unwrap_or_default();
            if requests.len() >= count {
                return requests
                    .iter()
                    .map(|r| serde_json::from_slice(&r.body).unwrap())
                    .collect();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("notifications did not arrive")
}

fn low_supply_config(port: u16) -> heating_monitor::config::Config {
    test_config(
        port,
        1,
        json!([{
            "name": "supply",
            "display": "Supply",
            "address": 5,
            "alert": { "trip": 25.0, "reset": 30.0 },
        }]),
    )
}

#[tokio::test]
async fn test_webhook_receives_alarm() {
    let server = mock_endpoint().await;
    let controller = FakeController::default();
    controller.set_float(5, 20.0);
    let addr = controller.spawn().await;

    let mut config = low_supply_config(addr.port());
    config.notifier = Some(NotifierConfig::Webhook(Webhook {
        url: format!("{}/hook", server.uri()),
    }));

    let monitor = Monitor::start(&config, ModbusRegisterClient::new(&config.controller))
        .await
        .unwrap();

    let bodies = wait_for_bodies(&server, 1).await;
    assert_eq!(bodies[0]["kind"], "alarm");
    assert_eq!(bodies[0]["title"], "Supply below 25 °C");
    assert!(
        bodies[0]["message"]
            .as_str()
            .unwrap()
            .contains("1h average dropped to 20.0 °C")
    );

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_muted_alarm_is_not_sent() {
    let server = mock_endpoint().await;
    let controller = FakeController::default();
    controller.set_float(5, 40.0);
    let addr = controller.spawn().await;

    let mut config = low_supply_config(addr.port());
    config.notifier = Some(NotifierConfig::Webhook(Webhook {
        url: format!("{}/hook", server.uri()),
    }));

    let monitor = Monitor::start(&config, ModbusRegisterClient::new(&config.controller))
        .await
        .unwrap();
    // let the startup cycle land before the value drops
    tokio::time::timeout(Duration::from_secs(2), async {
        while monitor.read_model.channel("supply").await.unwrap().count == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    monitor.alerts.mute_alerts(3600).await;
    assert_eq!(monitor.alerts.is_muted().await, Some(true));

    controller.set_float(5, 20.0);
    let report = monitor.collector.poll_now().await.unwrap();
    assert_eq!(report.transitions.len(), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.received_requests().await.unwrap().is_empty());

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_discord_receives_report() {
    let server = mock_endpoint().await;
    let controller = FakeController::default();
    controller.set_float(5, 54.3);
    let addr = controller.spawn().await;

    let mut config = test_config(
        addr.port(),
        360,
        json!([{ "name": "supply", "display": "Supply", "address": 5 }]),
    );
    config.reports.times = vec![chrono::NaiveTime::from_hms_opt(6, 0, 0).unwrap()];
    config.notifier = Some(NotifierConfig::Discord(Discord {
        url: format!("{}/hook", server.uri()),
        user_id: Some("1234".to_string()),
    }));

    let monitor = Monitor::start(&config, ModbusRegisterClient::new(&config.controller))
        .await
        .unwrap();
    monitor.collector.poll_now().await.unwrap();

    monitor.reporters[0].report_now().await.unwrap();

    let bodies = wait_for_bodies(&server, 1).await;
    let embed = &bodies[0]["embeds"][0];
    assert!(embed["title"].as_str().unwrap().ends_with("Heating report"));
    assert!(embed["description"].as_str().unwrap().contains("Supply: 54.3 °C"));
    // reports never mention the user
    assert!(bodies[0].get("content").is_none());

    monitor.shutdown().await.unwrap();
}
