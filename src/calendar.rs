// Output calendar assembly.
use crate::model::EventRecord;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRODID: &str = "-//forex-factory-enhanced//EN";
pub const DEFAULT_CALENDAR_NAME: &str = "Enhanced Economic Events (3-Week Outlook)";
pub const DEFAULT_TIMEZONE: &str = "America/Toronto";

fn default_prodid() -> String {
    DEFAULT_PRODID.to_string()
}
fn default_name() -> String {
    DEFAULT_CALENDAR_NAME.to_string()
}
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_calscale() -> String {
    "GREGORIAN".to_string()
}
fn default_method() -> String {
    "PUBLISH".to_string()
}

/// Fixed header values of the published calendar. VERSION is always 2.0.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CalendarMeta {
    #[serde(default = "default_prodid")]
    pub prodid: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_calscale")]
    pub calscale: String,
    #[serde(default = "default_method")]
    pub method: String,
}

impl Default for CalendarMeta {
    fn default() -> Self {
        Self {
            prodid: default_prodid(),
            name: default_name(),
            timezone: default_timezone(),
            calscale: default_calscale(),
            method: default_method(),
        }
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[derive(Debug, Clone, Default)]
pub struct CalendarEmitter {
    meta: CalendarMeta,
}

impl CalendarEmitter {
    pub fn new(meta: CalendarMeta) -> Self {
        Self { meta }
    }

    pub fn meta(&self) -> &CalendarMeta {
        &self.meta
    }

    pub fn to_ics_string(&self, events: &[EventRecord]) -> String {
        let mut output = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
        output.push_str(&format!("PRODID:{}\r\n", self.meta.prodid));
        output.push_str(&format!("CALSCALE:{}\r\n", self.meta.calscale));
        output.push_str(&format!("METHOD:{}\r\n", self.meta.method));
        output.push_str(&format!("X-WR-CALNAME:{}\r\n", escape_text(&self.meta.name)));
        output.push_str(&format!("X-WR-TIMEZONE:{}\r\n", self.meta.timezone));

        for event in events {
            output.push_str(&event.to_vevent());
            output.push_str("\r\n");
        }

        output.push_str("END:VCALENDAR\r\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_window;

    #[test]
    fn header_carries_metadata() {
        let ics = CalendarEmitter::default().to_ics_string(&[]);
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.contains("PRODID:-//forex-factory-enhanced//EN"));
        assert!(ics.contains("CALSCALE:GREGORIAN"));
        assert!(ics.contains("METHOD:PUBLISH"));
        assert!(ics.contains("X-WR-CALNAME:Enhanced Economic Events (3-Week Outlook)"));
        assert!(ics.contains("X-WR-TIMEZONE:America/Toronto"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn name_is_escaped() {
        let meta = CalendarMeta {
            name: "Red, VIP".to_string(),
            ..Default::default()
        };
        let ics = CalendarEmitter::new(meta).to_ics_string(&[]);
        assert!(ics.contains("X-WR-CALNAME:Red\\, VIP"));
    }

    #[test]
    fn output_parses_back() {
        let events = vec![
            EventRecord::new("GDP Release").with_uid("one"),
            EventRecord::new("FOMC Minutes").with_uid("two"),
        ];
        let ics = CalendarEmitter::default().to_ics_string(&events);
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);

        let batch = parse_window("output", &ics).unwrap();
        let uids: Vec<_> = batch.events.iter().filter_map(|e| e.uid.clone()).collect();
        assert_eq!(uids, vec!["one".to_string(), "two".to_string()]);
    }
}
