//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Channel and report endpoints serve the current aggregates
//! - Control endpoints reach the collector and alert actors
//! - Authentication middleware guards every route

use std::{net::SocketAddr, time::Duration};

use heating_monitor::{config::ApiSettings, register::ModbusRegisterClient, runtime::Monitor};
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::helpers::*;

const TOKEN: &str = "test-token";

async fn spawn_monitor(controller: &FakeController) -> (Monitor, SocketAddr) {
    let addr = controller.spawn().await;
    let mut config = test_config(
        addr.port(),
        3,
        json!([
            {
                "name": "supply",
                "display": "Supply",
                "address": 5,
                "alert": { "trip": 25.0, "reset": 30.0 },
            },
            { "name": "air", "display": "Air", "address": 7 },
        ]),
    );
    config.api = Some(ApiSettings {
        bind: "127.0.0.1:0".parse().unwrap(),
        token: Some(TOKEN.to_string()),
        enable_cors: true,
    });

    let monitor = Monitor::start(&config, ModbusRegisterClient::new(&config.controller))
        .await
        .unwrap();
    let api_addr = monitor.api_addr().unwrap();
    (monitor, api_addr)
}

fn get(addr: SocketAddr, route: &str) -> reqwest::RequestBuilder {
    reqwest::Client::new()
        .get(format!("http://{addr}{route}"))
        .bearer_auth(TOKEN)
}

fn post(addr: SocketAddr, route: &str) -> reqwest::RequestBuilder {
    reqwest::Client::new()
        .post(format!("http://{addr}{route}"))
        .bearer_auth(TOKEN)
}

fn controller() -> FakeController {
    let controller = FakeController::default();
    controller.set_float(5, 54.3);
    controller.set_float(7, 21.0);
    controller
}

#[tokio::test]
async fn test_health_reports_controller_up() {
    let controller = controller();
    let (monitor, addr) = spawn_monitor(&controller).await;

    post(addr, "/api/v1/poll").send().await.unwrap();

    // the status tracker consumes cycle events asynchronously
    let body = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let body: Value = get(addr, "/api/v1/health")
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if body["controller"] == "up" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("controller never reported up");

    assert_eq!(body["status"], "ok");
    assert_eq!(body["consecutive_failures"], 0);
    assert!(body["last_success"].is_string());

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_list_channels() {
    let controller = controller();
    let (monitor, addr) = spawn_monitor(&controller).await;
    post(addr, "/api/v1/poll").send().await.unwrap();

    let response = get(addr, "/api/v1/channels").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["channels"][0]["name"], "supply");
    assert_eq!(body["channels"][0]["capacity"], 3);
    assert_eq!(body["channels"][0]["alert_state"], "normal");
    // alerting is off for air
    assert!(body["channels"][1].get("alert_state").is_none());

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_get_channel() {
    let controller = controller();
    let (monitor, addr) = spawn_monitor(&controller).await;
    post(addr, "/api/v1/poll").send().await.unwrap();

    let body: Value = get(addr, "/api/v1/channels/air")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["display_name"], "Air");
    assert_eq!(body["last_value"], 21.0);
    assert!(body["count"].as_u64().unwrap() >= 1);

    let missing = get(addr, "/api/v1/channels/return").send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_report_is_plain_text() {
    let controller = controller();
    let (monitor, addr) = spawn_monitor(&controller).await;
    post(addr, "/api/v1/poll").send().await.unwrap();

    let response = get(addr, "/api/v1/report").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let text = response.text().await.unwrap();
    assert!(text.starts_with("Heating report\n"));
    assert!(text.contains("Supply: 54.3 °C"));

    let titled = get(addr, "/api/v1/report?title=Boiler%20house")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(titled.starts_with("Boiler house\n"));

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_trigger_poll() {
    let controller = controller();
    controller.remove(7);
    let (monitor, addr) = spawn_monitor(&controller).await;

    let response = post(addr, "/api/v1/poll").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["connected"], true);
    assert_eq!(body["successful_reads"], 1);
    assert_eq!(body["failed_reads"], 1);
    assert_eq!(body["errors"][0]["channel"], "air");

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mute_and_unmute() {
    let controller = controller();
    let (monitor, addr) = spawn_monitor(&controller).await;

    let body: Value = post(addr, "/api/v1/alerts/mute")
        .json(&json!({ "duration_secs": 600 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["muted"], true);

    let rejected = post(addr, "/api/v1/alerts/mute")
        .json(&json!({ "duration_secs": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let rejected = post(addr, "/api/v1/alerts/mute")
        .json(&json!({ "duration_secs": u64::MAX }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    // the alert actor is still there to answer
    let body: Value = post(addr, "/api/v1/alerts/mute")
        .json(&json!({ "duration_secs": 60 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["muted"], true);

    let body: Value = post(addr, "/api/v1/alerts/unmute")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["muted"], false);

    monitor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let controller = controller();
    let (monitor, addr) = spawn_monitor(&controller).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/channels"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/api/v1/channels"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    monitor.shutdown().await.unwrap();
}
