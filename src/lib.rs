//! SLM client - license checks for plugins sold through a Software License
//! Manager server.
//!
//! A [`LicenseClient`](client::license::LicenseClient) answers one question
//! for the host: is the user entitled to the product right now? Entitlement
//! comes from either
//!
//! - a license key activated against the server and re-checked at most once
//!   every 24 hours (the result is cached), or
//! - a demo period anchored to a start date persisted on first use.
//!
//! # Example
//!
//! ```no_run
//! use slm_client::client::license::LicenseClient;
//! use slm_client::config::ClientConfig;
//!
//! # async fn run() -> slm_client::errors::LicenseResult<()> {
//! let config = ClientConfig::new("my_plugin", "My Plugin", "https://shop.example/", "secret");
//! let mut client = LicenseClient::new(config)?;
//! client.set_demo_period(14).await;
//!
//! if client.is_active().await {
//!     println!("package: {:?}", client.package().await);
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod errors;

pub mod client {
    pub mod cache;
    pub mod demo;
    pub mod license;
    pub mod responses;
    pub mod storage;
    pub mod transport;

    pub use license::{LicenseClient, DEMO_PACKAGE};
}
