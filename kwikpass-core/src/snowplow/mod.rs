//! Snowplow-compatible analytics event assembly.
//!
//! [`EventTracker`] turns storefront activity into fully-assembled events:
//! it builds the self-describing contexts (user, device, product, cart) from
//! the session cache, attaches them to the event and hands the result to the
//! host's [`EventSink`], which owns the actual Snowplow tracker instance and
//! the network delivery.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::store::{keys, KeyValueStore};
use crate::{Environment, KwikPassError};

mod context;

pub use context::{EventContext, ScalarValue};
use context::{normalize_phone, parse_flat_blob, schema_uri, trim_cart_id};

const USER_SCHEMA: &str = "user/jsonschema/1-0-0";
const DEVICE_SCHEMA: &str = "user_device/jsonschema/1-0-0";
const PRODUCT_SCHEMA: &str = "product/jsonschema/1-1-0";
const CART_SCHEMA: &str = "cart/jsonschema/1-0-0";
const STRUCTURED_SCHEMA: &str = "structured/jsonschema/1-0-0";

/// Inputs for a product page event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct ProductEventArgs {
    pub product_id: String,
    pub page_url: String,
    pub variant_id: Option<String>,
    pub img_url: Option<String>,
    pub name: Option<String>,
    pub price: Option<String>,
    pub handle: Option<String>,
}

/// Inputs for a collection listing event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct CollectionsEventArgs {
    pub collection_id: String,
    pub name: String,
    pub cart_id: Option<String>,
    pub image_url: Option<String>,
    pub handle: Option<String>,
}

/// Category/action/label payload of a structured event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct StructuredProps {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
    pub property: Option<String>,
    pub value: Option<i64>,
}

/// A fully-assembled self-describing event, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SelfDescribingEvent {
    pub event_id: String,
    pub schema: String,
    pub payload: HashMap<String, ScalarValue>,
    pub contexts: Vec<EventContext>,
}

/// A fully-assembled page view event, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PageViewEvent {
    pub event_id: String,
    pub url: String,
    pub title: Option<String>,
    pub contexts: Vec<EventContext>,
}

/// Delivers assembled events through the host's Snowplow tracker.
#[uniffi::export(with_foreign)]
pub trait EventSink: Send + Sync {
    fn track_self_describing(&self, event: SelfDescribingEvent) -> Result<(), KwikPassError>;

    fn track_page_view(&self, event: PageViewEvent) -> Result<(), KwikPassError>;
}

/// Assembles analytics events from the session cache and dispatches them.
#[derive(uniffi::Object)]
pub struct EventTracker {
    store: Arc<KeyValueStore>,
    sink: Arc<dyn EventSink>,
}

#[uniffi::export]
impl EventTracker {
    #[uniffi::constructor]
    #[must_use]
    pub fn new(store: Arc<KeyValueStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Tracks a product page view with the product, user and device
    /// contexts attached.
    pub fn track_product_event(&self, args: ProductEventArgs) {
        let mut contexts = vec![self.build_product_context(&args)];
        contexts.extend(self.shared_contexts());

        self.dispatch_page_view(PageViewEvent {
            event_id: Uuid::new_v4().to_string(),
            url: args.page_url,
            title: args.name,
            contexts,
        });
    }

    /// Tracks a cart page view with the cart, user and device contexts
    /// attached. The page URL is composed from the stored merchant host.
    pub fn track_cart_event(&self, cart_id: String) {
        let mut contexts = vec![self.build_cart_context(&cart_id)];
        contexts.extend(self.shared_contexts());

        self.dispatch_page_view(PageViewEvent {
            event_id: Uuid::new_v4().to_string(),
            url: format!("https://{}/cart", self.merchant_url()),
            title: None,
            contexts,
        });
    }

    /// Tracks a collection listing view as a page view on the collection
    /// URL, with the collection described in a product-schema context.
    pub fn track_collections_event(&self, args: CollectionsEventArgs) {
        let mut contexts = Vec::new();
        if let Some(cart_id) = &args.cart_id {
            contexts.push(self.build_cart_context(cart_id));
        }
        contexts.push(self.build_collection_context(&args));
        contexts.extend(self.shared_contexts());

        let handle = args.handle.unwrap_or_default();
        self.dispatch_page_view(PageViewEvent {
            event_id: Uuid::new_v4().to_string(),
            url: format!("https://{}/collections/{handle}", self.merchant_url()),
            title: Some(args.name),
            contexts,
        });
    }

    /// Tracks a caller-defined structured event.
    pub fn track_structured_event(&self, props: StructuredProps) {
        let mut payload = HashMap::from([
            ("category".to_string(), ScalarValue::Text(props.category)),
            ("action".to_string(), ScalarValue::Text(props.action)),
        ]);
        if let Some(label) = props.label {
            payload.insert("label".to_string(), ScalarValue::Text(label));
        }
        if let Some(property) = props.property {
            payload.insert("property".to_string(), ScalarValue::Text(property));
        }
        if let Some(value) = props.value {
            payload.insert("value".to_string(), ScalarValue::Integer(value));
        }

        self.dispatch_self_describing(SelfDescribingEvent {
            event_id: Uuid::new_v4().to_string(),
            schema: self.schema(STRUCTURED_SCHEMA),
            payload,
            contexts: self.shared_contexts(),
        });
    }

    /// Tracks a free-form event.
    ///
    /// Entries keyed `value` or `value_1` through `value_5` that parse as
    /// integers are carried as integer fields, matching the collector
    /// schema; everything else stays a string.
    pub fn track_custom_event(&self, properties: HashMap<String, String>) {
        let payload = properties
            .into_iter()
            .map(|(key, value)| {
                let scalar = if is_integer_field(&key) {
                    value
                        .parse::<i64>()
                        .map_or(ScalarValue::Text(value), ScalarValue::Integer)
                } else {
                    ScalarValue::Text(value)
                };
                (key, scalar)
            })
            .collect();

        self.dispatch_self_describing(SelfDescribingEvent {
            event_id: Uuid::new_v4().to_string(),
            schema: self.schema(STRUCTURED_SCHEMA),
            payload,
            contexts: self.shared_contexts(),
        });
    }
}

impl EventTracker {
    /// Vendor namespace for schema URIs, resolved from the stored
    /// environment.
    fn schema(&self, path: &str) -> String {
        let environment = self
            .store
            .get_ref(keys::GK_ENVIRONMENT)
            .unwrap_or_else(|| "sandbox".to_string());
        let vendor = Environment::from_name(&environment).config().schema_vendor;
        schema_uri(&vendor, path)
    }

    fn merchant_url(&self) -> String {
        self.store
            .get_ref(keys::GK_MERCHANT_URL)
            .unwrap_or_default()
    }

    fn tracking_enabled(&self) -> bool {
        self.store
            .get_ref(keys::IS_SNOWPLOW_TRACKING_ENABLED)
            .is_some_and(|v| v == "true")
    }

    fn dispatch_self_describing(&self, event: SelfDescribingEvent) {
        if !self.tracking_enabled() {
            log::debug!("tracking disabled, dropping event {}", event.schema);
            return;
        }
        if let Err(e) = self.sink.track_self_describing(event) {
            log::warn!("event sink rejected self-describing event: {e}");
        }
    }

    fn dispatch_page_view(&self, event: PageViewEvent) {
        if !self.tracking_enabled() {
            log::debug!("tracking disabled, dropping page view {}", event.url);
            return;
        }
        if let Err(e) = self.sink.track_page_view(event) {
            log::warn!("event sink rejected page view: {e}");
        }
    }

    fn shared_contexts(&self) -> Vec<EventContext> {
        let mut contexts = vec![self.build_device_context()];
        if let Some(user) = self.build_user_context() {
            contexts.push(user);
        }
        contexts
    }

    /// Device context from the stored device snapshot. Entries missing from
    /// the snapshot are sent as empty strings; the schema requires the keys.
    pub(crate) fn build_device_context(&self) -> EventContext {
        let snapshot = self
            .store
            .get_ref(keys::GK_DEVICE_INFO)
            .map(|raw| parse_flat_blob(&raw))
            .unwrap_or_default();
        let entry = |key: &str| snapshot.get(key).cloned().unwrap_or_default();

        let payload = HashMap::from([
            (
                "device_id".to_string(),
                ScalarValue::Text(entry(keys::GK_DEVICE_UNIQUE_ID)),
            ),
            (
                "android_ad_id".to_string(),
                ScalarValue::Text(entry(keys::GK_GOOGLE_AD_ID)),
            ),
            ("ios_ad_id".to_string(), ScalarValue::Text(String::new())),
            (
                "fcm_token".to_string(),
                ScalarValue::Text(
                    self.store
                        .get_ref(keys::GK_NOTIFICATION_TOKEN)
                        .unwrap_or_default(),
                ),
            ),
            (
                "app_domain".to_string(),
                ScalarValue::Text(entry(keys::GK_APP_DOMAIN)),
            ),
            (
                "device_type".to_string(),
                ScalarValue::Text("android".to_string()),
            ),
            (
                "app_version".to_string(),
                ScalarValue::Text(entry(keys::GK_APP_VERSION)),
            ),
        ]);

        EventContext {
            schema: self.schema(DEVICE_SCHEMA),
            payload,
        }
    }

    /// User context, or `None` when neither a phone nor an email is known.
    pub(crate) fn build_user_context(&self) -> Option<EventContext> {
        let phone = self
            .store
            .get_ref(keys::GK_USER_PHONE)
            .map(|p| normalize_phone(&p))
            .unwrap_or_default();
        let email = self
            .store
            .get_ref(keys::GK_VERIFIED_USER)
            .and_then(|raw| serde_json::from_str::<crate::auth::VerifiedUser>(&raw).ok())
            .and_then(|user| user.email)
            .unwrap_or_default();

        if phone.is_empty() && email.is_empty() {
            return None;
        }
        Some(EventContext {
            schema: self.schema(USER_SCHEMA),
            payload: HashMap::from([
                ("phone".to_string(), ScalarValue::Text(phone)),
                ("email".to_string(), ScalarValue::Text(email)),
            ]),
        })
    }

    pub(crate) fn build_product_context(&self, args: &ProductEventArgs) -> EventContext {
        let text = |value: &Option<String>| {
            ScalarValue::Text(value.clone().unwrap_or_default())
        };
        EventContext {
            schema: self.schema(PRODUCT_SCHEMA),
            payload: HashMap::from([
                (
                    "product_id".to_string(),
                    ScalarValue::Text(args.product_id.clone()),
                ),
                (
                    "img_url".to_string(),
                    text(&args.img_url),
                ),
                ("variant_id".to_string(), text(&args.variant_id)),
                ("product_name".to_string(), text(&args.name)),
                ("product_price".to_string(), text(&args.price)),
                ("product_handle".to_string(), text(&args.handle)),
                (
                    "type".to_string(),
                    ScalarValue::Text("product".to_string()),
                ),
            ]),
        }
    }

    pub(crate) fn build_collection_context(&self, args: &CollectionsEventArgs) -> EventContext {
        let text = |value: &Option<String>| {
            ScalarValue::Text(value.clone().unwrap_or_default())
        };
        EventContext {
            schema: self.schema(PRODUCT_SCHEMA),
            payload: HashMap::from([
                (
                    "product_id".to_string(),
                    ScalarValue::Text(args.collection_id.clone()),
                ),
                (
                    "product_name".to_string(),
                    ScalarValue::Text(args.name.clone()),
                ),
                ("img_url".to_string(), text(&args.image_url)),
                ("product_handle".to_string(), text(&args.handle)),
                (
                    "type".to_string(),
                    ScalarValue::Text("collection".to_string()),
                ),
            ]),
        }
    }

    pub(crate) fn build_cart_context(&self, cart_id: &str) -> EventContext {
        let token = trim_cart_id(cart_id);
        EventContext {
            schema: self.schema(CART_SCHEMA),
            payload: HashMap::from([
                ("id".to_string(), ScalarValue::Text(token.clone())),
                ("token".to_string(), ScalarValue::Text(token)),
            ]),
        }
    }
}

/// Whether a custom-event key carries an integer per the collector schema.
fn is_integer_field(key: &str) -> bool {
    if key == "value" {
        return true;
    }
    key.strip_prefix("value_")
        .is_some_and(|n| matches!(n, "1" | "2" | "3" | "4" | "5"))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::test_support::InMemoryDurableStore;

    #[derive(Default)]
    struct RecordingSink {
        self_describing: Mutex<Vec<SelfDescribingEvent>>,
        page_views: Mutex<Vec<PageViewEvent>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl EventSink for RecordingSink {
        fn track_self_describing(
            &self,
            event: SelfDescribingEvent,
        ) -> Result<(), KwikPassError> {
            if self.fail {
                return Err(KwikPassError::Network("collector offline".to_string()));
            }
            self.self_describing.lock().unwrap().push(event);
            Ok(())
        }

        fn track_page_view(&self, event: PageViewEvent) -> Result<(), KwikPassError> {
            if self.fail {
                return Err(KwikPassError::Network("collector offline".to_string()));
            }
            self.page_views.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn tracker_with(sink: RecordingSink) -> (EventTracker, Arc<KeyValueStore>, Arc<RecordingSink>) {
        let store = Arc::new(KeyValueStore::new(Arc::new(
            InMemoryDurableStore::default(),
        )));
        store.set_ref(keys::IS_SNOWPLOW_TRACKING_ENABLED, "true");
        let sink = Arc::new(sink);
        let tracker = EventTracker::new(store.clone(), sink.clone());
        (tracker, store, sink)
    }

    fn product_args() -> ProductEventArgs {
        ProductEventArgs {
            product_id: "p1".to_string(),
            page_url: "https://acme.example/products/widget".to_string(),
            variant_id: Some("v1".to_string()),
            img_url: None,
            name: Some("Widget".to_string()),
            price: Some("499".to_string()),
            handle: Some("widget".to_string()),
        }
    }

    #[test]
    fn test_product_event_is_a_page_view_with_contexts() {
        let (tracker, store, sink) = tracker_with(RecordingSink::default());
        store.set_ref(keys::GK_USER_PHONE, "+91 9876543210");

        tracker.track_product_event(product_args());

        let events = sink.page_views.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.url, "https://acme.example/products/widget");
        assert_eq!(event.title.as_deref(), Some("Widget"));

        let product = event
            .contexts
            .iter()
            .find(|c| c.schema.ends_with("product/jsonschema/1-1-0"))
            .unwrap();
        assert!(product.schema.starts_with("iglu:in.gokwik.kwikpass/"));
        assert_eq!(
            product.payload.get("type"),
            Some(&ScalarValue::Text("product".to_string()))
        );

        let user = event
            .contexts
            .iter()
            .find(|c| c.schema.ends_with("user/jsonschema/1-0-0"))
            .unwrap();
        assert_eq!(
            user.payload.get("phone"),
            Some(&ScalarValue::Text("9876543210".to_string()))
        );
    }

    #[test]
    fn test_user_context_is_omitted_when_identity_is_unknown() {
        let (tracker, store, sink) = tracker_with(RecordingSink::default());
        store.set_ref(keys::GK_MERCHANT_URL, "acme.example");

        tracker.track_cart_event("gid://shopify/Cart/abc".to_string());

        let events = sink.page_views.lock().unwrap();
        let event = &events[0];
        assert_eq!(event.url, "https://acme.example/cart");
        assert!(!event
            .contexts
            .iter()
            .any(|c| c.schema.ends_with("user/jsonschema/1-0-0")));

        let cart = event
            .contexts
            .iter()
            .find(|c| c.schema.ends_with("cart/jsonschema/1-0-0"))
            .unwrap();
        assert_eq!(
            cart.payload.get("id"),
            Some(&ScalarValue::Text("abc".to_string()))
        );
    }

    #[test]
    fn test_collections_event_composes_collection_url() {
        let (tracker, store, sink) = tracker_with(RecordingSink::default());
        store.set_ref(keys::GK_MERCHANT_URL, "acme.example");

        tracker.track_collections_event(CollectionsEventArgs {
            collection_id: "c1".to_string(),
            name: "Summer".to_string(),
            cart_id: Some("gid://shopify/Cart/abc".to_string()),
            image_url: None,
            handle: Some("summer".to_string()),
        });

        let events = sink.page_views.lock().unwrap();
        let event = &events[0];
        assert_eq!(event.url, "https://acme.example/collections/summer");
        assert_eq!(event.title.as_deref(), Some("Summer"));

        let collection = event
            .contexts
            .iter()
            .find(|c| {
                c.payload.get("type")
                    == Some(&ScalarValue::Text("collection".to_string()))
            })
            .unwrap();
        assert_eq!(
            collection.payload.get("product_id"),
            Some(&ScalarValue::Text("c1".to_string()))
        );
        assert!(event
            .contexts
            .iter()
            .any(|c| c.schema.ends_with("cart/jsonschema/1-0-0")));
    }

    #[test]
    fn test_device_context_reads_either_snapshot_shape() {
        let (tracker, store, _sink) = tracker_with(RecordingSink::default());

        store.set_ref(
            keys::GK_DEVICE_INFO,
            r#"{"gk-device-unique-id":"dev-1","gk-app-version":"1.4.2"}"#,
        );
        let context = tracker.build_device_context();
        assert_eq!(
            context.payload.get("device_id"),
            Some(&ScalarValue::Text("dev-1".to_string()))
        );

        store.set_ref(
            keys::GK_DEVICE_INFO,
            "{gk-device-unique-id=dev-2, gk-app-version=1.4.3}",
        );
        store.clear_volatile_cache();
        let context = tracker.build_device_context();
        assert_eq!(
            context.payload.get("device_id"),
            Some(&ScalarValue::Text("dev-2".to_string()))
        );
        assert_eq!(
            context.payload.get("app_version"),
            Some(&ScalarValue::Text("1.4.3".to_string()))
        );
        assert_eq!(
            context.payload.get("device_type"),
            Some(&ScalarValue::Text("android".to_string()))
        );
    }

    #[test]
    fn test_custom_event_integer_coercion() {
        let (tracker, _store, sink) = tracker_with(RecordingSink::default());

        tracker.track_custom_event(HashMap::from([
            ("value".to_string(), "42".to_string()),
            ("value_2".to_string(), "7".to_string()),
            ("value_2_extra".to_string(), "7".to_string()),
            ("label".to_string(), "99".to_string()),
            ("value_1".to_string(), "not a number".to_string()),
        ]));

        let events = sink.self_describing.lock().unwrap();
        let payload = &events[0].payload;
        assert_eq!(payload.get("value"), Some(&ScalarValue::Integer(42)));
        assert_eq!(payload.get("value_2"), Some(&ScalarValue::Integer(7)));
        assert_eq!(
            payload.get("value_2_extra"),
            Some(&ScalarValue::Text("7".to_string()))
        );
        assert_eq!(
            payload.get("label"),
            Some(&ScalarValue::Text("99".to_string()))
        );
        assert_eq!(
            payload.get("value_1"),
            Some(&ScalarValue::Text("not a number".to_string()))
        );
    }

    #[test]
    fn test_disabled_tracking_drops_events_but_contexts_still_build() {
        let (tracker, store, sink) = tracker_with(RecordingSink::default());
        store.set_ref(keys::IS_SNOWPLOW_TRACKING_ENABLED, "false");

        tracker.track_product_event(product_args());
        tracker.track_structured_event(StructuredProps {
            category: "login".to_string(),
            action: "otp_sent".to_string(),
            label: None,
            property: None,
            value: None,
        });

        assert!(sink.page_views.lock().unwrap().is_empty());
        assert!(sink.self_describing.lock().unwrap().is_empty());
        // Context assembly works regardless of the delivery switch.
        assert!(!tracker.build_device_context().payload.is_empty());
    }

    #[test]
    fn test_production_vendor_namespace() {
        let (tracker, store, sink) = tracker_with(RecordingSink::default());
        store.set_ref(keys::GK_ENVIRONMENT, "production");

        tracker.track_structured_event(StructuredProps {
            category: "login".to_string(),
            action: "otp_sent".to_string(),
            label: None,
            property: None,
            value: Some(1),
        });

        let events = sink.self_describing.lock().unwrap();
        assert!(events[0].schema.starts_with("iglu:co.gokwik/"));
        assert_eq!(
            events[0].payload.get("value"),
            Some(&ScalarValue::Integer(1))
        );
    }

    #[test]
    fn test_failing_sink_is_tolerated() {
        let (tracker, _store, _sink) = tracker_with(RecordingSink::failing());

        // Must not panic or propagate.
        tracker.track_cart_event("abc".to_string());
        tracker.track_product_event(product_args());
    }
}
