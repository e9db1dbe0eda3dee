//! The license client: demo countdown, key activation and cached checks.

use crate::client::cache::{StoreTtlCache, TtlCache, LICENSE_DATA_TTL_HOURS};
use crate::client::demo::{format_start, parse_start, DemoState};
use crate::client::responses::{LicenseData, SlmAction, SlmResponse};
use crate::client::storage::{FileStore, KeyValueStore};
use crate::client::transport::{HttpClient, ReqwestHttpClient};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::errors::LicenseResult;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;

/// Package identifier reported while the demo period is running.
pub const DEMO_PACKAGE: &str = "demo";

/// `tracing` target for everything this client logs.
pub const LOG_TARGET: &str = "slm_client";

const LOG_PREFIX: &str = "[slm]";

/// Query parameter carrying the shared secret. Never logged.
const SECRET_PARAM: &str = "secret_key";

/// Client for a Software License Manager server.
///
/// Entitlement comes from either an active license (verified remotely and
/// cached for 24 hours) or a running demo period. Every public operation
/// degrades failures to "not entitled" instead of returning errors; the
/// failure is logged at debug level under [`LOG_TARGET`].
pub struct LicenseClient {
    config: ClientConfig,
    store: Box<dyn KeyValueStore>,
    cache: Box<dyn TtlCache>,
    http: Box<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    demo: Option<DemoState>,
    license_key: Option<String>,
    /// Last successful check and the instant it goes stale.
    license_data: Option<(LicenseData, DateTime<Utc>)>,
}

impl LicenseClient {
    /// Create a client with the default collaborators: a [`FileStore`] in
    /// `config.data_dir` (or the platform data directory), a TTL cache on
    /// top of that store, and a `reqwest` transport.
    pub fn new(config: ClientConfig) -> LicenseResult<Self> {
        config.validate()?;

        let store = match &config.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::in_data_dir()?,
        };
        let cache = StoreTtlCache::new(store.clone());
        let http = ReqwestHttpClient::from_config(&config)?;

        Ok(Self::from_parts(config, store, cache, http))
    }

    /// Create a client from explicit collaborators. The clock defaults to
    /// [`SystemClock`]; see [`LicenseClient::with_clock`].
    pub fn from_parts(
        config: ClientConfig,
        store: impl KeyValueStore + 'static,
        cache: impl TtlCache + 'static,
        http: impl HttpClient + 'static,
    ) -> Self {
        Self {
            config,
            store: Box::new(store),
            cache: Box::new(cache),
            http: Box::new(http),
            clock: Arc::new(SystemClock),
            demo: None,
            license_key: None,
            license_data: None,
        }
    }

    /// Replace the clock used for demo arithmetic and for expiring the
    /// in-memory check result. The cache judges expiry with its own clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // === Demo ===

    /// Enable a demo period of `period_days` full days.
    ///
    /// The start date is read from storage, or set to today and persisted
    /// when none exists. Later calls only change the period length, never
    /// the start date. A period of 0 disables demo mode.
    ///
    /// When the stored start date cannot be read or parsed the demo is
    /// treated as already over and nothing is written.
    pub async fn set_demo_period(&mut self, period_days: u32) -> &mut Self {
        if period_days == 0 {
            self.demo = None;
            return self;
        }

        let today = self.clock.now().date_naive();
        self.demo = Some(match self.stored_demo_start(today).await {
            Some(start) => DemoState::new(period_days, start),
            None => DemoState::expired(today),
        });
        self
    }

    /// Persisted demo anchor, writing `today` when none exists yet. `None`
    /// when the store holds something that cannot be trusted.
    async fn stored_demo_start(&self, today: NaiveDate) -> Option<NaiveDate> {
        let key = self.config.demo_start_key();

        match self.store.get(&key).await {
            Ok(Some(raw)) => {
                let start = parse_start(&raw);
                if start.is_none() {
                    tracing::debug!(target: LOG_TARGET, value = %raw, "{LOG_PREFIX} unreadable demo start date, demo unavailable");
                }
                start
            }
            Ok(None) => {
                if let Err(e) = self.store.set(&key, &format_start(today)).await {
                    tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to persist demo start date");
                }
                Some(today)
            }
            Err(e) => {
                tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to read demo start date, demo unavailable");
                None
            }
        }
    }

    /// True while demo mode is enabled and has days left.
    pub fn is_demo(&self) -> bool {
        self.demo.is_some() && self.demo_days_left() > 0
    }

    /// Whole days left in the demo period; 0 when demo mode is off.
    pub fn demo_days_left(&self) -> i64 {
        self.demo
            .map(|demo| demo.days_left(self.clock.now()))
            .unwrap_or(0)
    }

    /// Anchor date of the demo period, when demo mode is enabled.
    pub fn demo_start(&self) -> Option<NaiveDate> {
        self.demo.map(|demo| demo.start)
    }

    // === License key ===

    /// The installed license key, or an empty string when none is stored.
    pub async fn license_key(&mut self) -> String {
        if let Some(key) = &self.license_key {
            return key.clone();
        }

        match self.store.get(&self.config.license_key_key()).await {
            Ok(key) => {
                let key = key.unwrap_or_default();
                self.license_key = Some(key.clone());
                key
            }
            Err(e) => {
                // Not remembered, so the next call reads the store again.
                tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to load license key");
                String::new()
            }
        }
    }

    /// Set and persist the license key without contacting the server.
    pub async fn set_license_key(&mut self, key: &str) -> &mut Self {
        self.license_key = Some(key.to_string());
        if let Err(e) = self.store.set(&self.config.license_key_key(), key).await {
            tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to persist license key");
        }
        self
    }

    /// Activate `key` for `registered_domain`. The key is stored only when
    /// the server reports success.
    pub async fn activate(&mut self, key: &str, registered_domain: &str) -> bool {
        let args = [
            ("license_key", key.to_string()),
            ("registered_domain", registered_domain.to_string()),
            ("item_reference", self.config.plugin_name.clone()),
        ];

        match self.query(SlmAction::Activate, &args).await {
            Some(resp) if resp.is_success() => {
                self.set_license_key(key).await;
                true
            }
            _ => false,
        }
    }

    /// Deactivate the installed key for `registered_domain`.
    ///
    /// Without a key this is a successful no-op. When the server cannot be
    /// reached nothing changes and `false` is returned. Any decoded answer,
    /// including a failure result, clears the stored key and the cached
    /// license data.
    pub async fn deactivate(&mut self, registered_domain: &str) -> bool {
        let key = self.license_key().await;
        if key.is_empty() {
            return true;
        }

        let args = [
            ("license_key", key),
            ("registered_domain", registered_domain.to_string()),
            ("item_reference", self.config.plugin_name.clone()),
        ];

        let resp = match self.query(SlmAction::Deactivate, &args).await {
            Some(resp) => resp,
            None => return false,
        };
        if !resp.is_success() {
            tracing::debug!(
                target: LOG_TARGET,
                server_message = ?resp.message,
                "{LOG_PREFIX} server refused deactivation, clearing local state anyway"
            );
        }

        self.license_key = None;
        if let Err(e) = self.store.delete(&self.config.license_key_key()).await {
            tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to delete license key");
        }

        self.license_data = None;
        if let Err(e) = self.cache.delete(&self.config.license_data_key()).await {
            tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to drop cached license data");
        }

        true
    }

    // === License data ===

    /// Result of the last successful check: from memory, then the cache,
    /// then a fresh `slm_check`.
    ///
    /// The in-memory copy goes stale together with the cached one, so a
    /// long-lived client re-checks once per TTL window.
    pub async fn license_data(&mut self) -> Option<&LicenseData> {
        let now = self.clock.now();
        if matches!(&self.license_data, Some((_, expires_at)) if now >= *expires_at) {
            self.license_data = None;
        }

        if self.license_data.is_none() {
            match self.load_cached_data().await {
                Some(memo) => self.license_data = Some(memo),
                None => {
                    self.check_license().await;
                }
            }
        }
        self.license_data.as_ref().map(|(data, _)| data)
    }

    async fn load_cached_data(&self) -> Option<(LicenseData, DateTime<Utc>)> {
        let entry = match self.cache.get(&self.config.license_data_key()).await {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to read cached license data");
                return None;
            }
        };

        match serde_json::from_str(&entry.value) {
            Ok(data) => Some((data, entry.expires_at)),
            Err(e) => {
                tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} ignoring malformed cached license data");
                None
            }
        }
    }

    /// Re-check the license with the server even if a cached result exists.
    ///
    /// A failed re-check keeps the previous result.
    pub async fn refresh(&mut self) -> bool {
        self.check_license().await
    }

    /// Run `slm_check` for the installed key. On success the result is kept
    /// in memory and cached for 24 hours; on failure existing data is left
    /// alone. Returns whether the license is active.
    async fn check_license(&mut self) -> bool {
        let key = self.license_key().await;
        if key.is_empty() {
            return false;
        }

        let data = match self
            .query(SlmAction::Check, &[("license_key", key)])
            .await
        {
            Some(resp) if resp.is_success() => resp,
            _ => return false,
        };

        let ttl = Duration::hours(LICENSE_DATA_TTL_HOURS);
        match serde_json::to_string(&data) {
            Ok(raw) => {
                if let Err(e) = self
                    .cache
                    .set(&self.config.license_data_key(), &raw, ttl)
                    .await
                {
                    tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to cache license data");
                }
            }
            Err(e) => {
                tracing::debug!(target: LOG_TARGET, error = %e, "{LOG_PREFIX} failed to encode license data");
            }
        }

        let active = data.is_active();
        self.license_data = Some((data, self.clock.now() + ttl));
        active
    }

    // === Entitlement ===

    /// Product reference of the active license, [`DEMO_PACKAGE`] while the
    /// demo runs, otherwise `None`.
    pub async fn package(&mut self) -> Option<String> {
        if let Some(data) = self.license_data().await {
            if data.is_active() {
                return Some(data.product_ref.clone());
            }
        }
        if self.is_demo() {
            return Some(DEMO_PACKAGE.to_string());
        }
        None
    }

    /// True when an active license exists or the demo is running.
    pub async fn is_active(&mut self) -> bool {
        let licensed = self
            .license_data()
            .await
            .map(LicenseData::is_active)
            .unwrap_or(false);
        licensed || self.is_demo()
    }

    // === Transport ===

    /// Send `action` with `args` plus the action name and secret. Returns
    /// `None` on any transport or decoding failure.
    async fn query(&self, action: SlmAction, args: &[(&str, String)]) -> Option<SlmResponse> {
        let mut params: Vec<(String, String)> = Vec::with_capacity(args.len() + 2);
        params.push(("slm_action".to_string(), action.as_str().to_string()));
        params.push((SECRET_PARAM.to_string(), self.config.secret_key.clone()));
        params.extend(args.iter().map(|(k, v)| (k.to_string(), v.clone())));

        let decoded = self
            .http
            .get_json(&self.config.server_url, &params)
            .await
            .and_then(|body| serde_json::from_value::<SlmResponse>(body).map_err(Into::into));

        tracing::debug!(
            target: LOG_TARGET,
            action = %action,
            args = ?loggable_params(&params),
            result = ?decoded,
            "{LOG_PREFIX} query"
        );

        decoded.ok()
    }
}

/// Query parameters with the secret removed.
fn loggable_params(params: &[(String, String)]) -> Vec<(&str, &str)> {
    params
        .iter()
        .filter(|(k, _)| k != SECRET_PARAM)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}
