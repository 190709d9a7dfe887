//! Core crate for the KwikPass mobile login SDK.
//!
//! The crate owns the pieces of the login flow that are independent of any
//! UI framework: the OTP verification state machine ([`verify`]), the
//! layered session cache over host-app storage ([`store`]), environment
//! configuration ([`config`]), the auth session orchestration over the
//! KwikPass REST API ([`auth`]) and the Snowplow-compatible analytics
//! context pipeline ([`snowplow`]).
//!
//! Host applications provide the platform collaborators as foreign trait
//! implementations: [`store::DurableStore`], [`store::DeviceInfoProvider`],
//! [`snowplow::EventSink`] and [`logger::Logger`].
use strum::{Display, EnumString};

/// The environment a merchant integration runs against.
///
/// Selects the API base URL, the analytics collector and the schema vendor
/// namespace. See [`config::EnvironmentConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, uniffi::Enum)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

pub mod config;
pub use config::{
    environment_config, resolve_environment, CheckoutUrls, EnvironmentConfig,
};

mod error;
pub use error::*;

pub mod api;
pub mod auth;
pub mod logger;
pub mod snowplow;
pub mod store;
pub mod verify;

uniffi::setup_scaffolding!("kwikpass_core");
