//! HTTP Client Pool for maintaining persistent connections.
//!
//! Every simulation turn is a fresh streaming request to the same endpoint, so the
//! pool keeps one configured `reqwest::Client` per base URL and hands out clones
//! (which share the underlying connection pool). This avoids a DNS lookup and TLS
//! handshake for each of the three turns a user decision triggers.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global cache of HTTP clients indexed by base URL.
    static ref CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> = Mutex::new(HashMap::new());
}

/// Creates or retrieves a shared HTTP client for the given base URL.
///
/// The client is configured with:
/// - Up to 10 idle connections per host, kept for 90 seconds
/// - TCP keepalive every 60 seconds
/// - A 30-second connect timeout
///
/// No total request timeout is set: streamed turns legitimately run for as long as
/// the model keeps generating.
pub fn get_or_create_client(base_url: &str) -> Result<reqwest::Client, reqwest::Error> {
    let mut pool = CLIENT_POOL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(client) = pool.get(base_url) {
        return Ok(client.clone());
    }

    let client = create_pooled_client()?;
    log::debug!("http_client_pool: created client for {}", base_url);
    pool.insert(base_url.to_string(), client.clone());
    Ok(client)
}

fn create_pooled_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .build()
}
