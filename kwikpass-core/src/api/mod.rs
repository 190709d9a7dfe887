//! HTTP client for the KwikPass REST API.
//!
//! Thin wrapper over `reqwest` that attaches the session headers sourced
//! from the [`KeyValueStore`] on every request and maps transport, status
//! and decoding failures onto [`KwikPassError`]. Requests are issued once;
//! retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{keys, KeyValueStore};
use crate::{Environment, KwikPassError};

pub mod types;

use types::{
    BrowserAuthData, CreateUserData, CreateUserRequest, EmailOtpRequest, Envelope, LoginData,
    MerchantConfig, MultipassData, MultipassRequest, OtpSentData, SendOtpRequest,
    ValidateUserTokenData, VerifyCodeData, VerifyEmailRequest, VerifyOtpRequest,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_AUTH_PATH: &str = "auth/browser";
const SEND_OTP_PATH: &str = "auth/otp/send";
const VERIFY_OTP_PATH: &str = "auth/otp/verify";
const VALIDATE_TOKEN_PATH: &str = "auth/validate-token";
const LOGIN_PATH: &str = "customer/custom/login";
const CREATE_USER_PATH: &str = "customer/custom/create-user";
const MULTIPASS_PATH: &str = "shopify/multipass";
const EMAIL_OTP_SEND_PATH: &str = "shopify/email-otp/send";
const EMAIL_OTP_VERIFY_PATH: &str = "shopify/email-otp/verify";

pub(crate) struct ApiClient {
    base_url: String,
    merchant_id: String,
    store: Arc<KeyValueStore>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(environment: Environment, merchant_id: String, store: Arc<KeyValueStore>) -> Self {
        Self::with_base_url(environment.config().base_url, merchant_id, store)
    }

    pub fn with_base_url(
        base_url: String,
        merchant_id: String,
        store: Arc<KeyValueStore>,
    ) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{base_url}/")
        };
        Self {
            base_url,
            merchant_id,
            store,
            client: reqwest::Client::new(),
        }
    }

    pub async fn browser_auth(&self) -> Result<BrowserAuthData, KwikPassError> {
        self.get(BROWSER_AUTH_PATH).await
    }

    pub async fn merchant_config(&self) -> Result<MerchantConfig, KwikPassError> {
        let path = format!("configurations/{}", self.merchant_id);
        self.get(&path).await
    }

    pub async fn send_otp(&self, phone: &str) -> Result<OtpSentData, KwikPassError> {
        self.post(
            SEND_OTP_PATH,
            &SendOtpRequest {
                phone: phone.to_string(),
            },
        )
        .await
    }

    pub async fn verify_otp(&self, phone: &str, otp: u32) -> Result<VerifyCodeData, KwikPassError> {
        self.post(
            VERIFY_OTP_PATH,
            &VerifyOtpRequest {
                phone: phone.to_string(),
                otp,
            },
        )
        .await
    }

    pub async fn validate_user_token(&self) -> Result<ValidateUserTokenData, KwikPassError> {
        self.get(VALIDATE_TOKEN_PATH).await
    }

    pub async fn login(&self) -> Result<LoginData, KwikPassError> {
        self.get(LOGIN_PATH).await
    }

    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
    ) -> Result<CreateUserData, KwikPassError> {
        self.post(CREATE_USER_PATH, request).await
    }

    pub async fn multipass(
        &self,
        request: &MultipassRequest,
    ) -> Result<MultipassData, KwikPassError> {
        self.post(MULTIPASS_PATH, request).await
    }

    pub async fn send_email_otp(&self, email: &str) -> Result<OtpSentData, KwikPassError> {
        self.post(
            EMAIL_OTP_SEND_PATH,
            &EmailOtpRequest {
                email: email.to_string(),
            },
        )
        .await
    }

    pub async fn verify_email(
        &self,
        request: &VerifyEmailRequest,
    ) -> Result<MultipassData, KwikPassError> {
        self.post(EMAIL_OTP_VERIFY_PATH, request).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, KwikPassError> {
        let url = self.url(path);
        let response = self
            .client
            .get(url)
            .headers(self.headers())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, KwikPassError> {
        let url = self.url(path);
        let response = self
            .client
            .post(url)
            .headers(self.headers())
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::handle(response).await
    }

    fn url(&self, path: &str) -> String {
        let url = format!("{}{path}", self.base_url);
        #[cfg(not(test))]
        assert!(url.starts_with("https"), "only https endpoints are allowed");
        url
    }

    /// Session headers for the current request, sourced from the store so a
    /// token refreshed mid-session takes effect on the next call.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("kwikpass-core/", env!("CARGO_PKG_VERSION"))),
        );
        if let Ok(value) = HeaderValue::from_str(&self.merchant_id) {
            headers.insert("gk-merchant-id", value);
        }

        let mut insert = |name: &'static str, key: &str| {
            if let Some(value) = self.store.get_ref(key) {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    headers.insert(name, value);
                }
            }
        };
        insert("gk-access-token", keys::GK_ACCESS_TOKEN);
        insert("checkout-access-token", keys::CHECKOUT_ACCESS_TOKEN);
        insert("gk-request-id", keys::GK_REQUEST_ID);
        insert("kp-request-id", keys::KP_REQUEST_ID);

        if let Some(token) = self.store.get_ref(keys::GK_AUTH_TOKEN) {
            if let Ok(value) = HeaderValue::from_str(&token) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    async fn handle<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, KwikPassError> {
        let status = response.status();
        let request_id = response
            .headers()
            .get("request-id")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(KwikPassError::Api {
                message: error_message(&body, status.as_u16()),
                status: Some(status.as_u16()),
                request_id,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            KwikPassError::Serialization(format!(
                "failed to parse response ({e}): {}",
                &body.chars().take(20).collect::<String>()
            ))
        })?;
        Ok(envelope.data)
    }
}

/// Pulls a human-readable reason out of an error body.
fn error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.pointer("/data/error"))
                .and_then(|e| e.as_str().map(ToString::to_string))
        })
        .unwrap_or_else(|| format!("unexpected error with status {status}"))
}
