#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use slm_client::client::cache::StoreTtlCache;
use slm_client::client::storage::MemoryStore;
use slm_client::client::transport::HttpClient;
use slm_client::client::LicenseClient;
use slm_client::clock::ManualClock;
use slm_client::config::ClientConfig;
use slm_client::errors::{LicenseError, LicenseResult};

pub const PLUGIN_ID: &str = "my_plugin";
pub const PLUGIN_NAME: &str = "My Plugin";
pub const SECRET: &str = "s3cret";
pub const DOMAIN: &str = "shop.example";

/// Scripted license server. Clones share responses and the call log.
#[derive(Clone, Default)]
pub struct StubHttp {
    state: Arc<Mutex<StubState>>,
}

#[derive(Default)]
struct StubState {
    responses: HashMap<String, Value>,
    calls: Vec<HashMap<String, String>>,
}

impl StubHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `action` with `body` from now on.
    pub fn respond(&self, action: &str, body: Value) {
        self.state
            .lock()
            .unwrap()
            .responses
            .insert(action.to_string(), body);
    }

    /// Make `action` fail at the transport level from now on.
    pub fn fail(&self, action: &str) {
        self.state.lock().unwrap().responses.remove(action);
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn calls_for(&self, action: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.get("slm_action").map(String::as_str) == Some(action))
            .count()
    }

    pub fn last_call(&self) -> Option<HashMap<String, String>> {
        self.state.lock().unwrap().calls.last().cloned()
    }
}

#[async_trait]
impl HttpClient for StubHttp {
    async fn get_json(&self, _url: &str, query: &[(String, String)]) -> LicenseResult<Value> {
        let params: HashMap<String, String> = query.iter().cloned().collect();
        let action = params.get("slm_action").cloned().unwrap_or_default();

        let mut state = self.state.lock().unwrap();
        state.calls.push(params);
        state
            .responses
            .get(&action)
            .cloned()
            .ok_or_else(|| LicenseError::NetworkError(format!("stub: {action} unreachable")))
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(PLUGIN_ID, PLUGIN_NAME, "https://licenses.example/", SECRET)
}

/// Noon, so a fresh demo of N days reports exactly N days left.
pub fn noon() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

/// Build a client over shared collaborators. Building a second client over
/// the same store, clock and stub simulates a later request in the host.
pub fn client(store: &MemoryStore, clock: &ManualClock, http: &StubHttp) -> LicenseClient {
    let cache = StoreTtlCache::with_clock(store.clone(), Arc::new(clock.clone()));
    LicenseClient::from_parts(config(), store.clone(), cache, http.clone())
        .with_clock(Arc::new(clock.clone()))
}

pub struct Harness {
    pub client: LicenseClient,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub http: StubHttp,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let clock = noon();
        let http = StubHttp::new();
        let client = client(&store, &clock, &http);
        Self {
            client,
            store,
            clock,
            http,
        }
    }

    /// A fresh client sharing this harness's store, clock and server.
    pub fn next_request(&self) -> LicenseClient {
        client(&self.store, &self.clock, &self.http)
    }
}

pub fn key_key() -> String {
    format!("{PLUGIN_ID}_license_key")
}

pub fn data_key() -> String {
    format!("{PLUGIN_ID}_license_data")
}

pub fn demo_key() -> String {
    format!("{PLUGIN_ID}_demo_start")
}

pub fn active_check(product_ref: &str) -> Value {
    serde_json::json!({
        "result": "success",
        "status": "active",
        "product_ref": product_ref,
        "message": "License key details retrieved."
    })
}
