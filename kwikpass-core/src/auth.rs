//! Auth session lifecycle: initialization, OTP login, Shopify multipass
//! exchange and session teardown.
//!
//! [`AuthSessionManager`] owns the login flow end to end. All state lives in
//! the [`KeyValueStore`] so a process restart resumes the session from
//! durable storage.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::types::{CreateUserRequest, MerchantConfig, MultipassRequest, VerifyEmailRequest};
use crate::api::ApiClient;
use crate::store::{keys, DeviceInfoProvider, KeyValueStore};
use crate::{Environment, KwikPassError};

/// The identity established by a completed verification flow.
///
/// Fields fill in incrementally as the flow progresses; merges never erase
/// a previously established field (see [`AuthSessionManager::verify_otp`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifiedUser {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub shopify_customer_id: Option<String>,
    pub multipass_token: Option<String>,
    pub state: Option<String>,
}

/// Profile details collected when a new account has to be created.
#[derive(Debug, Clone, uniffi::Record)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub dob: String,
    pub gender: String,
}

/// Merchant storefront platform, as reported by the merchant configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MerchantPlatform {
    Shopify,
    Custom,
}

impl MerchantPlatform {
    fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("shopify") {
            Self::Shopify
        } else {
            Self::Custom
        }
    }
}

/// Account state reported by the verification endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum UserState {
    Enabled,
    Disabled,
}

impl UserState {
    fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("disabled") {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }
}

/// Drives the login flow against the KwikPass API for one merchant.
#[derive(uniffi::Object)]
pub struct AuthSessionManager {
    store: Arc<KeyValueStore>,
    api: ApiClient,
    device_info: Arc<dyn DeviceInfoProvider>,
    merchant_id: String,
    environment: Environment,
    snowplow_enabled: bool,
}

#[uniffi::export(async_runtime = "tokio")]
impl AuthSessionManager {
    #[uniffi::constructor]
    #[must_use]
    pub fn new(
        store: Arc<KeyValueStore>,
        merchant_id: String,
        environment: Environment,
        snowplow_enabled: bool,
        device_info: Arc<dyn DeviceInfoProvider>,
    ) -> Self {
        let api = ApiClient::new(environment, merchant_id.clone(), store.clone());
        Self {
            store,
            api,
            device_info,
            merchant_id,
            environment,
            snowplow_enabled,
        }
    }

    /// Establishes the session context for this merchant.
    ///
    /// Persists the environment and merchant identifiers, refreshes the
    /// browser auth tokens, fetches the merchant configuration and snapshots
    /// device metadata. Must complete before any other operation is called.
    pub async fn initialize(&self) -> Result<(), KwikPassError> {
        self.store
            .set_ref(keys::GK_ENVIRONMENT, &self.environment.to_string());
        self.store.set_ref(keys::GK_MERCHANT_ID, &self.merchant_id);
        self.store.set_ref(
            keys::IS_SNOWPLOW_TRACKING_ENABLED,
            &self.snowplow_enabled.to_string(),
        );

        self.refresh_browser_auth().await;

        let config = self.api.merchant_config().await?;
        self.persist_merchant_config(&config)?;

        self.snapshot_device_info()?;
        log::info!("session initialized for merchant {}", self.merchant_id);
        Ok(())
    }

    /// Requests an OTP for the given phone number.
    pub async fn send_otp(
        &self,
        phone: String,
        notifications_enabled: bool,
    ) -> Result<(), KwikPassError> {
        if phone.trim().is_empty() {
            return Err(KwikPassError::Validation {
                field: "phone".to_string(),
                message: "Phone number is required".to_string(),
            });
        }
        self.store.set_ref(
            keys::GK_NOTIFICATION_ENABLED,
            &notifications_enabled.to_string(),
        );
        self.store.set_ref(keys::GK_USER_PHONE, &phone);

        self.refresh_browser_auth().await;
        let sent = self.api.send_otp(&phone).await?;
        log::debug!("otp requested: {:?}", sent.status);
        Ok(())
    }

    /// Verifies the OTP and completes the login when possible.
    ///
    /// On Shopify merchants a known email triggers the multipass exchange
    /// immediately; an account in the `DISABLED` state is exchanged with
    /// that state so the backend can re-activate it. A verified phone with
    /// no known email is returned as a partial identity and the host app
    /// collects the email via [`Self::create_user`] or [`Self::verify_email`].
    pub async fn verify_otp(
        &self,
        phone: String,
        code: String,
    ) -> Result<VerifiedUser, KwikPassError> {
        let otp: u32 = code.trim().parse().map_err(|_| KwikPassError::Validation {
            field: "otp".to_string(),
            message: "Enter a valid OTP".to_string(),
        })?;

        let data = self.api.verify_otp(&phone, otp).await?;
        if let Some(token) = &data.token {
            self.store.set_ref(keys::GK_ACCESS_TOKEN, token);
        }
        if let Some(core_token) = &data.core_token {
            self.store.set_ref(keys::CHECKOUT_ACCESS_TOKEN, core_token);
        }
        if let Some(kp_token) = &data.kp_token {
            self.store.set_ref(keys::GK_KP_TOKEN, kp_token);
        }

        match self.merchant_platform() {
            MerchantPlatform::Shopify => {
                let state = data.state.clone().unwrap_or_default();
                if UserState::from_name(&state) == UserState::Disabled {
                    let email = data.email.clone().unwrap_or_default();
                    let id = data.shopify_customer_id.clone().unwrap_or_default();
                    return self
                        .multipass_exchange(&phone, &email, &id, &state, None)
                        .await;
                }
                if let Some(email) = data.email.clone().filter(|e| !e.is_empty()) {
                    let id = data.shopify_customer_id.clone().unwrap_or_default();
                    return self
                        .multipass_exchange(&phone, &email, &id, &state, None)
                        .await;
                }
                // Phone verified but no account email yet.
                self.merge_verified_user(VerifiedUser {
                    phone: Some(phone),
                    email: None,
                    shopify_customer_id: data.shopify_customer_id,
                    multipass_token: None,
                    state: data.state,
                })
            }
            MerchantPlatform::Custom => {
                let identity = self.api.validate_user_token().await?.merchant_response;
                let login = self.api.login().await?;
                let email = login
                    .merchant_response
                    .and_then(|r| r.email)
                    .or(identity.email);
                self.merge_verified_user(VerifiedUser {
                    phone: Some(phone),
                    email,
                    shopify_customer_id: None,
                    multipass_token: None,
                    state: None,
                })
            }
        }
    }

    /// Creates an account for a phone-verified user and completes the login.
    pub async fn create_user(&self, profile: UserProfile) -> Result<VerifiedUser, KwikPassError> {
        if profile.email.trim().is_empty() {
            return Err(KwikPassError::Validation {
                field: "email".to_string(),
                message: "Email is required".to_string(),
            });
        }

        let request = CreateUserRequest {
            email: profile.email.clone(),
            name: profile.name,
            dob: profile.dob,
            gender: profile.gender,
        };
        let data = self.api.create_user(&request).await?;
        let account = data.merchant_response.account_create;
        if let Some(errors) = account.account_errors.filter(|e| !e.is_empty()) {
            return Err(KwikPassError::Api {
                message: errors.join("; "),
                status: None,
                request_id: None,
            });
        }

        self.merge_verified_user(VerifiedUser {
            phone: self.store.get_ref(keys::GK_USER_PHONE),
            email: account.user.and_then(|u| u.email).or(Some(profile.email)),
            shopify_customer_id: None,
            multipass_token: None,
            state: None,
        })
    }

    /// Exchanges a Shopify identity for a multipass token.
    ///
    /// Used when the host app already knows the customer's email (e.g. from
    /// a previous session) and wants to log in without the email OTP step.
    pub async fn exchange_multipass_token(
        &self,
        phone: String,
        email: String,
        shopify_customer_id: String,
        state: String,
    ) -> Result<VerifiedUser, KwikPassError> {
        self.multipass_exchange(&phone, &email, &shopify_customer_id, &state, Some(true))
            .await
    }

    /// Sends an OTP to the given email address (Shopify email verification).
    pub async fn send_email_otp(&self, email: String) -> Result<(), KwikPassError> {
        if email.trim().is_empty() {
            return Err(KwikPassError::Validation {
                field: "email".to_string(),
                message: "Email is required".to_string(),
            });
        }
        self.api.send_email_otp(&email).await?;
        Ok(())
    }

    /// Verifies an email OTP and completes the Shopify login.
    pub async fn verify_email(
        &self,
        email: String,
        code: String,
    ) -> Result<VerifiedUser, KwikPassError> {
        if code.trim().is_empty() {
            return Err(KwikPassError::Validation {
                field: "otp".to_string(),
                message: "OTP is required".to_string(),
            });
        }

        let redirect_url = self
            .store
            .get_ref(keys::GK_MERCHANT_URL)
            .unwrap_or_default();
        let data = self
            .api
            .verify_email(&VerifyEmailRequest {
                email: email.clone(),
                otp: code,
                redirect_url,
                is_marketing_event_subscribed: self.marketing_subscribed(),
            })
            .await?;

        self.merge_verified_user(VerifiedUser {
            phone: self.store.get_ref(keys::GK_USER_PHONE),
            email: data.email.or(Some(email)),
            shopify_customer_id: data.shopify_customer_id,
            multipass_token: data.multipass_token,
            state: data.state,
        })
    }

    /// Runs the merchant-platform login for non-Shopify storefronts and
    /// merges the returned identity.
    pub async fn login(&self) -> Result<VerifiedUser, KwikPassError> {
        let login = self.api.login().await?;
        self.merge_verified_user(VerifiedUser {
            phone: self.store.get_ref(keys::GK_USER_PHONE),
            email: login.merchant_response.and_then(|r| r.email),
            shopify_customer_id: None,
            multipass_token: None,
            state: None,
        })
    }

    /// Re-validates the stored token and returns the refreshed identity.
    pub async fn validate_user_token(&self) -> Result<VerifiedUser, KwikPassError> {
        let identity = self.api.validate_user_token().await?.merchant_response;
        self.merge_verified_user(VerifiedUser {
            phone: self.store.get_ref(keys::GK_USER_PHONE),
            email: identity.email,
            shopify_customer_id: None,
            multipass_token: None,
            state: None,
        })
    }

    /// Tears down the session: every token, identity and request id is
    /// removed from both cache layers. Merchant and device entries survive.
    pub fn clear_session(&self) {
        for key in [
            keys::GK_ACCESS_TOKEN,
            keys::CHECKOUT_ACCESS_TOKEN,
            keys::GK_AUTH_TOKEN,
            keys::GK_KP_TOKEN,
            keys::GK_REQUEST_ID,
            keys::KP_REQUEST_ID,
            keys::GK_VERIFIED_USER,
            keys::GK_USER_PHONE,
        ] {
            self.store.remove_ref(key);
        }
        log::info!("session cleared");
    }

    /// Returns the currently verified user, if a login completed.
    #[must_use]
    pub fn verified_user(&self) -> Option<VerifiedUser> {
        let raw = self.store.get_ref(keys::GK_VERIFIED_USER)?;
        serde_json::from_str(&raw).ok()
    }
}

impl AuthSessionManager {
    #[cfg(test)]
    pub(crate) fn with_base_url(
        base_url: String,
        store: Arc<KeyValueStore>,
        merchant_id: String,
        device_info: Arc<dyn DeviceInfoProvider>,
    ) -> Self {
        let api = ApiClient::with_base_url(base_url, merchant_id.clone(), store.clone());
        Self {
            store,
            api,
            device_info,
            merchant_id,
            environment: Environment::Sandbox,
            snowplow_enabled: true,
        }
    }

    /// Fetches fresh browser auth tokens and stores them for the session
    /// headers. Failures are logged and tolerated; the endpoints that need
    /// the tokens will fail with a clearer error of their own.
    async fn refresh_browser_auth(&self) {
        match self.api.browser_auth().await {
            Ok(data) => {
                if let Some(request_id) = &data.request_id {
                    self.store.set_ref(keys::GK_REQUEST_ID, request_id);
                    self.store.set_ref(keys::KP_REQUEST_ID, request_id);
                }
                if let Some(token) = &data.token {
                    self.store.set_ref(keys::GK_AUTH_TOKEN, token);
                }
            }
            Err(e) => log::warn!("browser auth refresh failed: {e}"),
        }
    }

    fn persist_merchant_config(&self, config: &MerchantConfig) -> Result<(), KwikPassError> {
        self.store
            .set_ref(keys::GK_MERCHANT_TYPE, &config.platform.to_lowercase());
        self.store
            .set_ref(keys::GK_MERCHANT_URL, &host_name(&config.host));
        let raw = serde_json::to_string(config)
            .map_err(|e| KwikPassError::Serialization(e.to_string()))?;
        self.store.set_ref(keys::GK_MERCHANT_CONFIG, &raw);
        Ok(())
    }

    fn snapshot_device_info(&self) -> Result<(), KwikPassError> {
        let info: HashMap<String, String> = self.device_info.device_info();
        for (key, value) in &info {
            self.store.set_ref(key, value);
        }
        let raw = serde_json::to_string(&info)
            .map_err(|e| KwikPassError::Serialization(e.to_string()))?;
        self.store.set_ref(keys::GK_DEVICE_INFO, &raw);
        Ok(())
    }

    /// Marketing consent follows the notification preference captured when
    /// the OTP was requested.
    fn marketing_subscribed(&self) -> bool {
        self.store
            .get_ref(keys::GK_NOTIFICATION_ENABLED)
            .is_some_and(|v| v == "true")
    }

    fn merchant_platform(&self) -> MerchantPlatform {
        self.store
            .get_ref(keys::GK_MERCHANT_TYPE)
            .map_or(MerchantPlatform::Custom, |t| {
                MerchantPlatform::from_name(&t)
            })
    }

    async fn multipass_exchange(
        &self,
        phone: &str,
        email: &str,
        shopify_customer_id: &str,
        state: &str,
        skip_email_otp: Option<bool>,
    ) -> Result<VerifiedUser, KwikPassError> {
        let data = self
            .api
            .multipass(&MultipassRequest {
                id: shopify_customer_id.to_string(),
                email: email.to_string(),
                is_marketing_event_subscribed: self.marketing_subscribed(),
                state: state.to_string(),
                skip_email_otp,
            })
            .await?;

        self.merge_verified_user(VerifiedUser {
            phone: Some(phone.to_string()),
            email: data.email.or_else(|| Some(email.to_string())),
            shopify_customer_id: data
                .shopify_customer_id
                .or_else(|| Some(shopify_customer_id.to_string())),
            multipass_token: data.multipass_token,
            state: data.state,
        })
    }

    /// Merges `update` into the stored identity, persists it and returns
    /// the merged result.
    fn merge_verified_user(&self, update: VerifiedUser) -> Result<VerifiedUser, KwikPassError> {
        let existing = self.verified_user().unwrap_or_default();
        let user = merged(update, existing);
        let raw = serde_json::to_string(&user)
            .map_err(|e| KwikPassError::Serialization(e.to_string()))?;
        self.store.set_ref(keys::GK_VERIFIED_USER, &raw);
        Ok(user)
    }
}

/// Field-wise merge: `update` wins where set, `existing` fills the gaps.
fn merged(update: VerifiedUser, existing: VerifiedUser) -> VerifiedUser {
    VerifiedUser {
        phone: update.phone.or(existing.phone),
        email: update.email.or(existing.email),
        shopify_customer_id: update.shopify_customer_id.or(existing.shopify_customer_id),
        multipass_token: update.multipass_token.or(existing.multipass_token),
        state: update.state.or(existing.state),
    }
}

/// Strips the scheme and a leading `www.` from a merchant host.
fn host_name(host: &str) -> String {
    let host = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    host.trim_start_matches("www.")
        .trim_end_matches('/')
        .to_string()
}
