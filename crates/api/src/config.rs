//! Application configuration loaded from environment variables.

use checkout::{PricingPolicy, WebhookAuthenticity};
use domain::Money;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string; in-memory stores when unset
/// - `SHIPPING_FLAT_CENTS` — flat shipping charge (default: `1500`)
/// - `FREE_SHIPPING_OVER_CENTS` — free-shipping threshold (default: `10000`)
/// - `EFI_API_BASE` — PIX provider base URL (default: `"https://api.efi.example"`)
/// - `EFI_API_KEY` — PIX provider key; mock intents when unset
/// - `EFI_WEBHOOK_SECRET` — webhook shared secret; verification disabled when unset
/// - `ADMIN_EMAIL` — recipient of order confirmations (default: `"admin@example.com"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub shipping_flat_cents: i64,
    pub free_shipping_over_cents: i64,
    pub efi_api_base: String,
    pub efi_api_key: Option<String>,
    pub efi_webhook_secret: Option<String>,
    pub admin_email: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            shipping_flat_cents: env_i64("SHIPPING_FLAT_CENTS", 1500),
            free_shipping_over_cents: env_i64("FREE_SHIPPING_OVER_CENTS", 10_000),
            efi_api_base: std::env::var("EFI_API_BASE")
                .unwrap_or_else(|_| "https://api.efi.example".to_string()),
            efi_api_key: std::env::var("EFI_API_KEY").ok(),
            efi_webhook_secret: std::env::var("EFI_WEBHOOK_SECRET").ok(),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the pricing policy for checkout.
    pub fn pricing(&self) -> PricingPolicy {
        PricingPolicy {
            shipping_flat: Money::from_cents(self.shipping_flat_cents),
            free_shipping_over: Money::from_cents(self.free_shipping_over_cents),
        }
    }

    /// Returns the webhook authenticity scheme.
    ///
    /// Verification is an explicit opt-in; without a configured secret
    /// every notification is accepted.
    pub fn authenticity(&self) -> WebhookAuthenticity {
        match &self.efi_webhook_secret {
            Some(secret) => WebhookAuthenticity::SharedSecret(secret.clone()),
            None => WebhookAuthenticity::Disabled,
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            shipping_flat_cents: 1500,
            free_shipping_over_cents: 10_000,
            efi_api_base: "https://api.efi.example".to_string(),
            efi_api_key: None,
            efi_webhook_secret: None,
            admin_email: "admin@example.com".to_string(),
        }
    }
}
