//! Shared utilities for integration testing.

use std::time::Duration;

use tokio::net::TcpListener;

use admission_guard::config::GuardConfig;
use admission_guard::http::HttpServer;
use admission_guard::lifecycle::Shutdown;

/// Default config bound to the given address. Tests tighten individual
/// sections before starting the server.
pub fn test_config(bind_address: &str) -> GuardConfig {
    let mut config = GuardConfig::default();
    config.listener.bind_address = bind_address.to_string();
    config
}

/// Start a guard server on the config's bind address and wait until it
/// accepts connections. Returns the shutdown handle; trigger it at the end
/// of the test.
pub async fn start_guard(config: GuardConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

/// Non-pooled client so each test sees fresh connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
