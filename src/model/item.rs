// File: ./src/model/item.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use strum::Display;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawProperty {
    pub key: String,
    pub value: String,
    pub params: Vec<(String, String)>,
}

// --- DATE TYPES ---

/// Start time exactly as the feed stated it. No zone conversion happens here.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum EventTime {
    Date(NaiveDate),
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    Zoned { local: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Value and parameters for writing the property back as DTSTART.
    pub fn to_ics_value(&self) -> (String, Vec<(String, String)>) {
        match self {
            EventTime::Date(d) => (
                d.format("%Y%m%d").to_string(),
                vec![("VALUE".to_string(), "DATE".to_string())],
            ),
            EventTime::Utc(dt) => (dt.format("%Y%m%dT%H%M%SZ").to_string(), Vec::new()),
            EventTime::Floating(dt) => (dt.format("%Y%m%dT%H%M%S").to_string(), Vec::new()),
            EventTime::Zoned { local, tzid } => (
                local.format("%Y%m%dT%H%M%S").to_string(),
                vec![("TZID".to_string(), tzid.clone())],
            ),
        }
    }
}

/// Canonical rendering. Feeds into event identity, so the format must stay fixed.
impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::Utc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::Floating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::Zoned { local, tzid } => {
                write!(f, "{}[{}]", local.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}

// --- EVENTS ---

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EventRecord {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<EventTime>,
    pub location: Option<String>,
    pub uid: Option<String>,
    /// Properties without a dedicated field (DTEND, URL, DTSTAMP, X-...), written back verbatim.
    pub extra: Vec<RawProperty>,
}

impl EventRecord {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: Some(summary.to_string()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_start(mut self, start: EventTime) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_uid(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self
    }

    /// Lower-cased "summary description" text the classifier matches against.
    pub fn match_text(&self) -> String {
        let mut text = String::new();
        if let Some(s) = &self.summary {
            text.push_str(s);
            text.push(' ');
        }
        if let Some(d) = &self.description {
            text.push_str(d);
            text.push(' ');
        }
        text.to_lowercase()
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("No title")
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Verdict {
    RedFolder,
    VipKeyword,
    Plain,
}

impl Verdict {
    pub fn is_included(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// Records from one fetched window, in fetch order.
#[derive(Debug, Clone, Default)]
pub struct WindowBatch {
    pub label: String,
    pub events: Vec<EventRecord>,
}

impl WindowBatch {
    pub fn new(label: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            label: label.into(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
