//! # Storefront Configuration
//!
//! Configuration of the remote cart connection and the cart layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TONNENTEXT_STORE_DOMAIN=tonnentext.myshopify.com                   │
//! │     TONNENTEXT_STOREFRONT_TOKEN=...                                    │
//! │     TONNENTEXT_ORDER_WEBHOOK_URL=https://.../process-order              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/configurator/storefront.toml (Linux)                     │
//! │     ~/Library/Application Support/de.tonnentext.configurator/ (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     API version 2024-01, poll every 2 s, no credentials                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [storefront]
//! store_domain = "tonnentext.myshopify.com"
//! access_token = "shpat_..."
//! api_version = "2024-01"
//! variant_id = "44812345678901"
//!
//! [cart]
//! poll_interval_secs = 2
//! storage_key = "shopify_cart_id"
//!
//! [order]
//! webhook_url = "https://orders.tonnentext.de/api/shopify/process-order"
//! api_key = "..."
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{CartError, CartResult};

// =============================================================================
// Storefront Settings
// =============================================================================

/// Connection settings of the Storefront API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontSettings {
    /// Shop domain without scheme (e.g. "tonnentext.myshopify.com").
    #[serde(default)]
    pub store_domain: String,

    /// Public Storefront access token.
    #[serde(default)]
    pub access_token: String,

    /// Storefront API version segment of the endpoint.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Product variant every label line is added as.
    /// Either a numeric id or a full `gid://` id.
    #[serde(default)]
    pub variant_id: String,
}

fn default_api_version() -> String {
    "2024-01".to_string()
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        StorefrontSettings {
            store_domain: String::new(),
            access_token: String::new(),
            api_version: default_api_version(),
            variant_id: String::new(),
        }
    }
}

// =============================================================================
// Cart Settings
// =============================================================================

/// Behavior of the local cart layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSettings {
    /// Interval between snapshot polls (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Key the cart handle is persisted under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_poll_interval() -> u64 {
    2
}

fn default_storage_key() -> String {
    "shopify_cart_id".to_string()
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            poll_interval_secs: default_poll_interval(),
            storage_key: default_storage_key(),
        }
    }
}

// =============================================================================
// Order Settings
// =============================================================================

/// Production backend receiving submitted orders.
///
/// Order submission is off while `webhook_url` is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderSettings {
    #[serde(default)]
    pub webhook_url: String,

    /// Sent as `X-Shopify-API-Key` when set.
    #[serde(default)]
    pub api_key: String,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete remote cart configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub storefront: StorefrontSettings,

    #[serde(default)]
    pub cart: CartSettings,

    #[serde(default)]
    pub order: OrderSettings,
}

impl StorefrontConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CartResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storefront config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load storefront config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CartResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CartError::Configuration("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Storefront config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// Empty credentials are valid (offline mode); malformed ones are not.
    pub fn validate(&self) -> CartResult<()> {
        let domain = &self.storefront.store_domain;
        if domain.contains("://") || domain.contains('/') {
            return Err(CartError::Configuration(format!(
                "store_domain must be a bare host name, got: {}",
                domain
            )));
        }

        if !is_api_version(&self.storefront.api_version) {
            return Err(CartError::Configuration(format!(
                "api_version must look like YYYY-MM, got: {}",
                self.storefront.api_version
            )));
        }

        if self.cart.poll_interval_secs == 0 {
            return Err(CartError::Configuration(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }

        if self.cart.storage_key.trim().is_empty() {
            return Err(CartError::Configuration("storage_key must not be empty".into()));
        }

        if self.is_configured() {
            self.endpoint()?;
        }

        self.order_webhook()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(domain) = lookup("TONNENTEXT_STORE_DOMAIN") {
            debug!(domain = %domain, "Overriding store domain from environment");
            self.storefront.store_domain = domain;
        }

        if let Some(token) = lookup("TONNENTEXT_STOREFRONT_TOKEN") {
            self.storefront.access_token = token;
        }

        if let Some(version) = lookup("TONNENTEXT_API_VERSION") {
            self.storefront.api_version = version;
        }

        if let Some(variant) = lookup("TONNENTEXT_VARIANT_ID") {
            debug!(variant = %variant, "Overriding variant id from environment");
            self.storefront.variant_id = variant;
        }

        if let Some(url) = lookup("TONNENTEXT_ORDER_WEBHOOK_URL") {
            debug!(url = %url, "Overriding order webhook from environment");
            self.order.webhook_url = url;
        }

        if let Some(key) = lookup("TONNENTEXT_ORDER_API_KEY") {
            self.order.api_key = key;
        }

        if let Some(secs) = lookup("TONNENTEXT_POLL_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.cart.poll_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid poll interval in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// True when every value a remote call needs is present.
    pub fn is_configured(&self) -> bool {
        !self.storefront.store_domain.trim().is_empty()
            && !self.storefront.access_token.trim().is_empty()
            && !self.storefront.variant_id.trim().is_empty()
    }

    /// GraphQL endpoint, `https://{domain}/api/{version}/graphql.json`.
    pub fn endpoint(&self) -> CartResult<Url> {
        let raw = format!(
            "https://{}/api/{}/graphql.json",
            self.storefront.store_domain.trim(),
            self.storefront.api_version
        );
        Ok(Url::parse(&raw)?)
    }

    /// Global id of the label product variant.
    pub fn merchandise_id(&self) -> String {
        let variant = self.storefront.variant_id.trim();
        if variant.starts_with("gid://") {
            variant.to_string()
        } else {
            format!("gid://shopify/ProductVariant/{}", variant)
        }
    }

    /// True when orders can be submitted.
    pub fn is_order_configured(&self) -> bool {
        !self.order.webhook_url.trim().is_empty()
    }

    /// Order webhook, `None` while unset. Only http(s) URLs are accepted.
    pub fn order_webhook(&self) -> CartResult<Option<Url>> {
        if !self.is_order_configured() {
            return Ok(None);
        }
        let url = Url::parse(self.order.webhook_url.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(Some(url)),
            other => Err(CartError::Configuration(format!(
                "order webhook must be http(s), got scheme: {}",
                other
            ))),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.cart.poll_interval_secs)
    }

    pub fn storage_key(&self) -> &str {
        &self.cart.storage_key
    }
}

/// Platform directories of the configurator.
pub(crate) fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("de", "tonnentext", "configurator")
}

fn is_api_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn configured() -> StorefrontConfig {
        let mut config = StorefrontConfig::default();
        config.storefront.store_domain = "tonnentext.myshopify.com".into();
        config.storefront.access_token = "token".into();
        config.storefront.variant_id = "4711".into();
        config
    }

    #[test]
    fn test_default_config() {
        let config = StorefrontConfig::default();
        assert_eq!(config.storefront.api_version, "2024-01");
        assert_eq!(config.cart.poll_interval_secs, 2);
        assert_eq!(config.storage_key(), "shopify_cart_id");
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_and_merchandise_id() {
        let config = configured();
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://tonnentext.myshopify.com/api/2024-01/graphql.json"
        );
        assert_eq!(config.merchandise_id(), "gid://shopify/ProductVariant/4711");

        let mut config = configured();
        config.storefront.variant_id = "gid://shopify/ProductVariant/99".into();
        assert_eq!(config.merchandise_id(), "gid://shopify/ProductVariant/99");
    }

    #[test]
    fn test_config_validation() {
        let mut config = configured();
        assert!(config.validate().is_ok());

        config.storefront.store_domain = "https://tonnentext.myshopify.com".into();
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = configured();
        config.storefront.api_version = "latest".into();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.cart.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_order_webhook() {
        let mut config = StorefrontConfig::default();
        assert!(!config.is_order_configured());
        assert_eq!(config.order_webhook().unwrap(), None);

        config.order.webhook_url = "https://orders.example.com/api/shopify/process-order".into();
        assert!(config.is_order_configured());
        assert_eq!(
            config.order_webhook().unwrap().unwrap().path(),
            "/api/shopify/process-order"
        );
        assert!(config.validate().is_ok());

        // relative paths only work inside a browser
        config.order.webhook_url = "/api/shopify/process-order".into();
        assert!(config.validate().unwrap_err().is_config_error());

        config.order.webhook_url = "ftp://orders.example.com/drop".into();
        assert!(config.order_webhook().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TONNENTEXT_STORE_DOMAIN", "shop.example.com"),
            ("TONNENTEXT_STOREFRONT_TOKEN", "abc"),
            ("TONNENTEXT_VARIANT_ID", "12"),
            ("TONNENTEXT_ORDER_WEBHOOK_URL", "https://orders.example.com/hook"),
            ("TONNENTEXT_ORDER_API_KEY", "secret"),
            ("TONNENTEXT_POLL_INTERVAL_SECS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = StorefrontConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert!(config.is_configured());
        assert_eq!(config.storefront.store_domain, "shop.example.com");
        assert!(config.is_order_configured());
        assert_eq!(config.order.api_key, "secret");
        // invalid values keep the previous setting
        assert_eq!(config.cart.poll_interval_secs, 2);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = configured();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[storefront]"));
        assert!(toml_str.contains("[cart]"));

        let parsed: StorefrontConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StorefrontConfig = toml::from_str(
            r#"
            [storefront]
            store_domain = "tonnentext.myshopify.com"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.storefront.api_version, "2024-01");
        assert_eq!(parsed.cart, CartSettings::default());
        assert_eq!(parsed.order, OrderSettings::default());
    }
}
