//! ModbusRegisterClient against an in-process controller

use assert_matches::assert_matches;
use heating_monitor::register::{
    ModbusRegisterClient, ReadError, RegisterAddress, RegisterClient,
};

use crate::helpers::*;

fn client_for(port: u16) -> ModbusRegisterClient {
    let config = test_config(port, 3, serde_json::json!([]));
    ModbusRegisterClient::new(&config.controller)
}

const SUPPLY: RegisterAddress = RegisterAddress {
    unit_id: 247,
    address: 5,
};

#[tokio::test]
async fn test_reads_pi_from_controller() {
    let controller = FakeController::default();
    controller.set_float(5, std::f32::consts::PI);
    let addr = controller.spawn().await;

    let mut client = client_for(addr.port());
    client.connect().await.unwrap();
    assert!(client.is_connected());

    let sample = client.read_pair(SUPPLY).await.unwrap();
    assert!((sample.value - 3.14159).abs() < 1e-5);

    client.close().await;
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_exception_response_is_protocol_error() {
    let controller = FakeController::default();
    let addr = controller.spawn().await;

    let mut client = client_for(addr.port());
    client.connect().await.unwrap();

    let result = client
        .read_pair(RegisterAddress {
            unit_id: 247,
            address: 100,
        })
        .await;

    assert_matches!(result, Err(ReadError::Protocol(_)));
    // the session survives a protocol exception
    assert!(client.is_connected());

    client.close().await;
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let controller = FakeController::default();
    controller.set_float(5, 54.3);
    let addr = controller.spawn().await;

    let mut client = client_for(addr.port());
    client.connect().await.unwrap();
    client.connect().await.unwrap();

    assert_eq!(client.read_pair(SUPPLY).await.unwrap().value, 54.3);
    assert_eq!(controller.connections(), 1);

    client.close().await;
}

#[tokio::test]
async fn test_close_twice_then_reconnect() {
    let controller = FakeController::default();
    controller.set_float(5, 21.0);
    let addr = controller.spawn().await;

    let mut client = client_for(addr.port());
    client.connect().await.unwrap();
    client.close().await;
    client.close().await;

    assert_matches!(
        client.read_pair(SUPPLY).await,
        Err(ReadError::Transport(_))
    );

    client.connect().await.unwrap();
    assert_eq!(client.read_pair(SUPPLY).await.unwrap().value, 21.0);
    client.close().await;
}

#[tokio::test]
async fn test_connect_to_nothing_fails() {
    let mut client = client_for(closed_port());
    assert!(client.connect().await.is_err());
    assert!(!client.is_connected());
}
