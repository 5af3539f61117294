//! Helper functions for integration tests

use std::{
    collections::HashMap,
    future,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use heating_monitor::{
    config::Config,
    notify::{Notification, Notifier, NotifyError},
};
use tokio::net::TcpListener;
use tokio_modbus::{
    prelude::*,
    server::tcp::{Server, accept_tcp_connection},
};

/// Registers as the controller stores them: high word first
pub fn float_registers(value: f32) -> [u16; 2] {
    let bits = value.to_bits();
    [(bits >> 16) as u16, bits as u16]
}

/// In-process Modbus TCP controller serving holding registers
#[derive(Clone, Default)]
pub struct FakeController {
    registers: Arc<Mutex<HashMap<u16, u16>>>,
    connections: Arc<AtomicUsize>,
}

impl FakeController {
    pub fn set_float(&self, address: u16, value: f32) {
        let [high, low] = float_registers(value);
        let mut registers = self.registers.lock().unwrap();
        registers.insert(address, high);
        registers.insert(address + 1, low);
    }

    pub fn remove(&self, address: u16) {
        let mut registers = self.registers.lock().unwrap();
        registers.remove(&address);
        registers.remove(&(address + 1));
    }

    /// Number of TCP sessions accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::new(listener);

        let controller = self.clone();
        let new_service = move |_socket_addr| {
            controller.connections.fetch_add(1, Ordering::SeqCst);
            Ok(Some(RegisterService {
                registers: controller.registers.clone(),
            }))
        };
        let on_connected = move |stream, socket_addr| {
            let new_service = new_service.clone();
            async move { accept_tcp_connection(stream, socket_addr, new_service) }
        };
        let on_process_error = |err| {
            eprintln!("fake controller error: {err}");
        };

        tokio::spawn(async move {
            let _ = server.serve(&on_connected, on_process_error).await;
        });

        addr
    }
}

struct RegisterService {
    registers: Arc<Mutex<HashMap<u16, u16>>>,
}

impl tokio_modbus::server::Service for RegisterService {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    fn call(&self, req: Self::Request) -> Self::Future {
        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => {
                let registers = self.registers.lock().unwrap();
                (0..cnt)
                    .map(|i| {
                        registers
                            .get(&(addr + i))
                            .copied()
                            .ok_or(ExceptionCode::IllegalDataAddress)
                    })
                    .collect::<Result<Vec<u16>, _>>()
                    .map(Response::ReadHoldingRegisters)
            }
            _ => Err(ExceptionCode::IllegalFunction),
        };
        future::ready(res)
    }
}

/// A port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Config for a controller on localhost with a short window
pub fn test_config(port: u16, window: usize, channels: serde_json::Value) -> Config {
    serde_json::from_value(serde_json::json!({
        "controller": {
            "host": "127.0.0.1",
            "port": port,
            "unit_id": 247,
            "connect_timeout": 1,
            "request_timeout": 1,
        },
        "channels": channels,
        // long enough that only explicit polls run after the first tick
        "interval": 3600,
        "window": window,
    }))
    .unwrap()
}

/// Notifier that keeps everything it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
