//! Environment resolution and per-environment endpoint tables.

use crate::Environment;

/// Checkout entry points for a merchant storefront.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct CheckoutUrls {
    /// Checkout URL for Shopify merchants.
    pub shopify: String,
    /// Checkout URL for custom (non-Shopify) merchants.
    pub custom: String,
}

/// Endpoints and namespaces for one [`Environment`].
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EnvironmentConfig {
    /// Base URL of the KwikPass REST API, with a trailing slash.
    pub base_url: String,
    /// Snowplow-compatible collector endpoint for analytics events.
    pub collector_url: String,
    /// Vendor namespace used in `iglu:` schema URIs.
    pub schema_vendor: String,
    /// Checkout entry points.
    pub checkout_urls: CheckoutUrls,
}

impl Environment {
    /// Returns the endpoint table for this environment.
    #[must_use]
    pub fn config(&self) -> EnvironmentConfig {
        match self {
            Self::Sandbox => EnvironmentConfig {
                base_url: "https://api-gw-v4.dev.gokwik.io/sandbox/kp/api/v1/"
                    .to_string(),
                collector_url: "https://sp-kf-collector.dev.gokwik.io/".to_string(),
                schema_vendor: "in.gokwik.kwikpass".to_string(),
                checkout_urls: CheckoutUrls {
                    shopify: "https://sandbox.pdp.gokwik.co/app/appmaker-kwik-checkout.html?storeInfo="
                        .to_string(),
                    custom: "https://sandbox.pdp.gokwik.co/v4/auto.html".to_string(),
                },
            },
            Self::Production => EnvironmentConfig {
                base_url: "https://gkx.gokwik.co/kp/api/v1/".to_string(),
                collector_url: "https://sp-kf-collector-prod.gokwik.io".to_string(),
                schema_vendor: "co.gokwik".to_string(),
                checkout_urls: CheckoutUrls {
                    shopify: "https://pdp.gokwik.co/app/appmaker-kwik-checkout.html?storeInfo="
                        .to_string(),
                    custom: "https://pdp.gokwik.co/v4/auto.html".to_string(),
                },
            },
        }
    }

    /// Resolves an environment from its configured name.
    ///
    /// Matches `"sandbox"` case-insensitively; any other name, including
    /// unrecognized ones, resolves to [`Environment::Production`]. The
    /// production fallback mirrors the behavior merchant integrations have
    /// always relied on, at the cost of silently masking typos.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("sandbox") {
            Self::Sandbox
        } else {
            Self::Production
        }
    }
}

/// Resolves an [`Environment`] from its configured name.
///
/// See [`Environment::from_name`] for the matching rules.
#[uniffi::export]
#[must_use]
pub fn resolve_environment(name: String) -> Environment {
    Environment::from_name(&name)
}

/// Returns the endpoint table for `environment`.
#[uniffi::export]
#[must_use]
pub fn environment_config(environment: Environment) -> EnvironmentConfig {
    environment.config()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("sandbox", Environment::Sandbox; "lowercase")]
    #[test_case("SANDBOX", Environment::Sandbox; "uppercase")]
    #[test_case("Sandbox", Environment::Sandbox; "capitalized")]
    #[test_case(" sandbox ", Environment::Sandbox; "surrounding whitespace")]
    #[test_case("production", Environment::Production; "production name")]
    #[test_case("staging", Environment::Production; "unrecognized names fall back to production")]
    #[test_case("", Environment::Production; "empty name")]
    fn test_environment_resolution(name: &str, expected: Environment) {
        assert_eq!(Environment::from_name(name), expected);
    }

    #[test]
    fn test_environment_display_round_trip() {
        use std::str::FromStr;

        assert_eq!(Environment::Sandbox.to_string(), "sandbox");
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(
            Environment::from_str("sandbox").unwrap(),
            Environment::Sandbox
        );
    }

    #[test]
    fn test_config_tables() {
        let sandbox = Environment::Sandbox.config();
        assert_eq!(
            sandbox.base_url,
            "https://api-gw-v4.dev.gokwik.io/sandbox/kp/api/v1/"
        );
        assert_eq!(sandbox.schema_vendor, "in.gokwik.kwikpass");

        let production = Environment::Production.config();
        assert_eq!(production.base_url, "https://gkx.gokwik.co/kp/api/v1/");
        assert_eq!(production.schema_vendor, "co.gokwik");
        assert!(production.checkout_urls.shopify.starts_with("https://pdp."));
    }
}
