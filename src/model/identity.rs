// Stable identifiers for events the feed published without a UID.
use crate::model::item::EventRecord;

pub const DEFAULT_UID_NAMESPACE: &str = "forex-factory-high-impact";

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    namespace: String,
}

impl IdentityResolver {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The event's UID if it carries one, otherwise `<blake3 hex>@<namespace>` over
    /// summary, canonical start time and location concatenated without separators.
    ///
    /// Events lacking all three fields share one identifier.
    pub fn resolve(&self, event: &EventRecord) -> String {
        if let Some(uid) = &event.uid {
            return uid.clone();
        }

        let mut source = String::new();
        source.push_str(event.summary.as_deref().unwrap_or(""));
        if let Some(start) = &event.start_time {
            source.push_str(&start.to_string());
        }
        source.push_str(event.location.as_deref().unwrap_or(""));

        let digest = blake3::hash(source.as_bytes()).to_hex();
        format!("{}@{}", digest, self.namespace)
    }

    /// Populate a missing UID. An existing UID is never replaced.
    pub fn assign(&self, event: &mut EventRecord) -> String {
        if event.uid.is_none() {
            event.uid = Some(self.resolve(event));
        }
        event.uid.clone().unwrap_or_default()
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_UID_NAMESPACE)
    }
}
