//! Well-known cache key names.
//!
//! The names are part of the on-device storage contract and must not change
//! between releases; existing installs carry values under them.

pub const GK_ACCESS_TOKEN: &str = "gk-access-token";
pub const CHECKOUT_ACCESS_TOKEN: &str = "checkout-access-token";
pub const GK_AUTH_TOKEN: &str = "gk-auth-token";
pub const GK_KP_TOKEN: &str = "gk-kp-token";
pub const GK_REQUEST_ID: &str = "gk-request-id";
pub const KP_REQUEST_ID: &str = "kp-request-id";

pub const GK_ENVIRONMENT: &str = "gk-environment";
pub const GK_MERCHANT_ID: &str = "gk-merchant-id";
pub const GK_MERCHANT_URL: &str = "gk-merchant-url";
pub const GK_MERCHANT_TYPE: &str = "gk-merchant-type";
pub const GK_MERCHANT_CONFIG: &str = "gk-merchant-config";

pub const GK_VERIFIED_USER: &str = "gk-verified-user";
pub const GK_USER_PHONE: &str = "gk-user-phone";

pub const IS_SNOWPLOW_TRACKING_ENABLED: &str = "is-snowplow-tracking-enabled";
pub const SNOWPLOW_USER_ID: &str = "gkSnowplowUserId";
pub const SNOWPLOW_USER_ID_TIMESTAMP: &str = "gkSnowplowUserIdTimestamp";

pub const GK_NOTIFICATION_TOKEN: &str = "gk-notification-token";
pub const GK_NOTIFICATION_ENABLED: &str = "gk-notification-enabled";

pub const GK_DEVICE_INFO: &str = "gk-device-info";
pub const GK_DEVICE_MODEL: &str = "gk-device-model";
pub const GK_APP_DOMAIN: &str = "gk-app-domain";
pub const GK_OPERATING_SYSTEM: &str = "gk-operating-system";
pub const GK_DEVICE_ID: &str = "gk-device-id";
pub const GK_DEVICE_UNIQUE_ID: &str = "gk-device-unique-id";
pub const GK_SCREEN_RESOLUTION: &str = "gk-screen-resolution";
pub const GK_CARRIER_INFO: &str = "gk-carrier-info";
pub const GK_BATTERY_STATUS: &str = "gk-battery-status";
pub const GK_LANGUAGE: &str = "gk-language";
pub const GK_TIME_ZONE: &str = "gk-time-zone";
pub const GK_APP_VERSION: &str = "gk-app-version";
pub const GK_APP_VERSION_CODE: &str = "gk-app-version-code";
pub const GK_GOOGLE_AD_ID: &str = "gk-google-ad-id";
