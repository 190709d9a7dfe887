//! Wire types for the KwikPass REST API.
//!
//! All payloads are camelCase JSON wrapped in a `data` envelope.

use serde::{Deserialize, Serialize};

/// Standard success envelope around every response payload.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Response of `GET auth/browser`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserAuthData {
    pub request_id: Option<String>,
    pub token: Option<String>,
}

/// Merchant configuration returned by `GET configurations/{merchant_id}`.
///
/// Only the fields the SDK acts on are typed; the rest of the document is
/// kept verbatim so the host app can read merchant-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantConfig {
    pub platform: String,
    pub host: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtpSentData {
    pub message: Option<String>,
    pub status: Option<String>,
}

/// Response of `POST auth/otp/verify`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyCodeData {
    pub token: Option<String>,
    pub core_token: Option<String>,
    pub kp_token: Option<String>,
    pub state: Option<String>,
    pub email: Option<String>,
    pub shopify_customer_id: Option<String>,
}

/// Identity block returned by the merchant-platform endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MerchantIdentity {
    pub email: Option<String>,
    pub csrf_token: Option<String>,
    pub id: Option<String>,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginData {
    pub merchant_response: Option<MerchantIdentity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateUserTokenData {
    pub merchant_response: MerchantIdentity,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserData {
    pub merchant_response: CreateUserMerchantResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserMerchantResponse {
    pub account_create: AccountCreate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountCreate {
    pub user: Option<AccountUser>,
    pub account_errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountUser {
    pub id: Option<String>,
    pub email: Option<String>,
}

/// Response of the Shopify multipass and email verification endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MultipassData {
    pub multipass_token: Option<String>,
    pub shopify_customer_id: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
    pub account_activation_url: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub dob: String,
    pub gender: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipassRequest {
    pub id: String,
    pub email: String,
    pub is_marketing_event_subscribed: bool,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_email_otp: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailOtpRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub otp: String,
    pub redirect_url: String,
    pub is_marketing_event_subscribed: bool,
}
