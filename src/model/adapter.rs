// File: src/model/adapter.rs
// Conversion between iCalendar text and `EventRecord`.
use crate::error::{FeedError, FeedResult};
use crate::model::item::{EventRecord, EventTime, RawProperty, WindowBatch};
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use icalendar::{Calendar, CalendarComponent, Component, Event, Property};
use std::collections::HashSet;

const HANDLED_KEYS: &[&str] = &["UID", "SUMMARY", "DESCRIPTION", "LOCATION", "DTSTART"];

// Comma-separated list values. icalendar would escape the separators.
const LIST_KEYS: &[&str] = &["CATEGORIES", "RESOURCES", "EXDATE", "RDATE"];

fn to_raw(prop: &Property) -> RawProperty {
    let mut params = Vec::new();
    for (k, param) in prop.params().iter() {
        params.push((k.clone(), param.value().to_string()));
    }
    if !params.is_empty() {
        params.sort_unstable();
    }

    RawProperty {
        key: prop.key().to_string(),
        value: prop.value().to_string(),
        params,
    }
}

/// `KEY;PARAM=VALUE:value` with the value written exactly as stored.
fn raw_line(raw: &RawProperty) -> String {
    let mut line = raw.key.clone();
    for (k, v) in &raw.params {
        if v.contains([',', ';', ':']) {
            line.push_str(&format!(";{}=\"{}\"", k, v));
        } else {
            line.push_str(&format!(";{}={}", k, v));
        }
    }
    line.push(':');
    line.push_str(&raw.value);
    line
}

fn param<'a>(raw: &'a RawProperty, name: &str) -> Option<&'a str> {
    raw.params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Parse a DTSTART value without interpreting its zone.
fn parse_start(raw: &RawProperty) -> Option<EventTime> {
    let val = raw.value.trim();
    let is_date = param(raw, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"));

    if is_date || val.len() == 8 {
        return NaiveDate::parse_from_str(val, "%Y%m%d")
            .ok()
            .map(EventTime::Date);
    }

    if let Some(stripped) = val.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S")
            .ok()
            .map(|d| EventTime::Utc(Utc.from_utc_datetime(&d)));
    }

    let local = NaiveDateTime::parse_from_str(val, "%Y%m%dT%H%M%S").ok()?;
    match param(raw, "TZID") {
        Some(tzid) => Some(EventTime::Zoned {
            local,
            tzid: tzid.to_string(),
        }),
        None => Some(EventTime::Floating(local)),
    }
}

impl EventRecord {
    pub fn from_event(event: &Event) -> Self {
        let mut record = EventRecord::default();

        let mut all: Vec<RawProperty> = event.properties().values().map(to_raw).collect();
        for props in event.multi_properties().values() {
            all.extend(props.iter().map(to_raw));
        }

        for raw in all {
            let key = raw.key.to_uppercase();
            if !HANDLED_KEYS.contains(&key.as_str()) {
                record.extra.push(raw);
                continue;
            }
            match key.as_str() {
                "UID" => record.uid = Some(raw.value),
                "SUMMARY" => record.summary = Some(raw.value),
                "DESCRIPTION" => record.description = Some(raw.value),
                "LOCATION" => record.location = Some(raw.value),
                "DTSTART" => match parse_start(&raw) {
                    Some(t) => record.start_time = Some(t),
                    // Keep what we cannot read so it still reaches the output.
                    None => record.extra.push(raw),
                },
                _ => {}
            }
        }

        record
    }

    /// Render as a single `BEGIN:VEVENT` ... `END:VEVENT` block.
    pub fn to_vevent(&self) -> String {
        let mut event = Event::new();
        event.timestamp(Utc::now());

        if let Some(uid) = &self.uid {
            event.uid(uid);
        }
        if let Some(summary) = &self.summary {
            event.summary(summary);
        }
        if let Some(description) = &self.description {
            event.description(description);
        }
        if let Some(location) = &self.location {
            event.add_property("LOCATION", location);
        }
        if let Some(start) = &self.start_time {
            let (value, params) = start.to_ics_value();
            let mut prop = Property::new("DTSTART", &value);
            for (k, v) in &params {
                prop.add_parameter(k, v);
            }
            event.append_property(prop);
        }

        // Repeated keys go to the multi-property list so none is overwritten.
        let mut seen = HashSet::new();
        let mut list_lines = Vec::new();
        for raw in &self.extra {
            if LIST_KEYS.contains(&raw.key.to_uppercase().as_str()) {
                list_lines.push(raw_line(raw));
                continue;
            }
            let mut prop = Property::new(&raw.key, &raw.value);
            for (k, v) in &raw.params {
                prop.add_parameter(k, v);
            }
            if seen.insert(raw.key.to_uppercase()) {
                event.append_property(prop);
            } else {
                event.append_multi_property(prop);
            }
        }

        let mut ics = event.to_string();
        if !list_lines.is_empty()
            && let Some(idx) = ics.rfind("END:VEVENT")
        {
            let (start, end) = ics.split_at(idx);
            let mut buffer = String::with_capacity(ics.len() + 64 * list_lines.len());
            buffer.push_str(start);
            for line in &list_lines {
                buffer.push_str(line);
                buffer.push_str("\r\n");
            }
            buffer.push_str(end);
            ics = buffer;
        }

        ics.trim_end().to_string()
    }
}

/// Parse one window's text into its VEVENT records, in document order.
pub fn parse_window(label: &str, raw_ics: &str) -> FeedResult<WindowBatch> {
    if !raw_ics.contains("BEGIN:VCALENDAR") {
        return Err(FeedError::parse(label, "no VCALENDAR found"));
    }
    let calendar: Calendar = raw_ics
        .parse()
        .map_err(|e| FeedError::parse(label, format!("{}", e)))?;

    let events = calendar
        .components
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(e) => Some(EventRecord::from_event(e)),
            _ => None,
        })
        .collect();

    Ok(WindowBatch::new(label, events))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:ev-1\r\n\
SUMMARY:GDP Release\r\n\
DESCRIPTION:Impact: High\r\n\
LOCATION:USD\r\n\
DTSTART:20240105T133000Z\r\n\
DTEND:20240105T133000Z\r\n\
URL:https://example.com/gdp\r\n\
CATEGORIES:Forex,USD\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Bank Holiday\r\n\
DTSTART;VALUE=DATE:20240101\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Speech\r\n\
DTSTART;TZID=America/Toronto:20240102T090000\r\n\
END:VEVENT\r\n\
BEGIN:VTODO\r\n\
UID:todo-1\r\n\
SUMMARY:Not an event\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_events_only() {
        let batch = parse_window("w1", WINDOW).unwrap();
        assert_eq!(batch.label, "w1");
        assert_eq!(batch.len(), 3);

        let gdp = &batch.events[0];
        assert_eq!(gdp.uid.as_deref(), Some("ev-1"));
        assert_eq!(gdp.summary.as_deref(), Some("GDP Release"));
        assert_eq!(gdp.location.as_deref(), Some("USD"));
        assert_eq!(
            gdp.start_time.as_ref().map(|t| t.to_string()).as_deref(),
            Some("2024-01-05T13:30:00Z")
        );
        assert!(gdp.extra.iter().any(|p| p.key.eq_ignore_ascii_case("URL")));
        assert!(gdp.extra.iter().any(|p| p.key.eq_ignore_ascii_case("DTEND")));
    }

    #[test]
    fn keeps_date_and_zone_as_stated() {
        let batch = parse_window("w1", WINDOW).unwrap();
        assert_eq!(
            batch.events[1].start_time,
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
        match &batch.events[2].start_time {
            Some(EventTime::Zoned { tzid, local }) => {
                assert_eq!(tzid, "America/Toronto");
                assert_eq!(local.to_string(), "2024-01-02 09:00:00");
            }
            other => panic!("expected zoned start, got {:?}", other),
        }
        assert!(batch.events[1].uid.is_none());
    }

    #[test]
    fn rejects_non_calendar_text() {
        let err = parse_window("broken", "<html>404</html>").unwrap_err();
        assert!(matches!(err, FeedError::Parse { .. }));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn vevent_block_carries_fields() {
        let batch = parse_window("w1", WINDOW).unwrap();
        let block = batch.events[0].to_vevent();
        assert!(block.starts_with("BEGIN:VEVENT"));
        assert!(block.ends_with("END:VEVENT"));
        assert!(block.contains("UID:ev-1"));
        assert!(block.contains("SUMMARY:GDP Release"));
        assert!(block.contains("DTSTART:20240105T133000Z"));
        assert!(block.contains("URL:https://example.com/gdp"));

        assert!(block.contains("CATEGORIES:Forex,USD\r\n"));
        assert!(!block.contains("Forex\\,USD"));

        let zoned = batch.events[2].to_vevent();
        assert!(zoned.contains("America/Toronto"));
        assert!(zoned.contains("20240102T090000"));
    }

    #[test]
    fn list_values_survive_a_round_trip() {
        let batch = parse_window("w1", WINDOW).unwrap();
        let categories = |e: &EventRecord| -> Vec<String> {
            e.extra
                .iter()
                .filter(|p| p.key.eq_ignore_ascii_case("CATEGORIES"))
                .map(|p| p.value.clone())
                .collect()
        };
        assert_eq!(categories(&batch.events[0]), vec!["Forex,USD".to_string()]);

        let ics = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\n{}\r\nEND:VCALENDAR\r\n",
            batch.events[0].to_vevent()
        );
        let again = parse_window("again", &ics).unwrap();
        assert_eq!(categories(&again.events[0]), vec!["Forex,USD".to_string()]);
    }

    #[test]
    fn raw_line_quotes_params_with_separators() {
        let raw = RawProperty {
            key: "RESOURCES".to_string(),
            value: "Room A,Projector".to_string(),
            params: vec![("ALTREP".to_string(), "cid:a,b".to_string())],
        };
        assert_eq!(
            raw_line(&raw),
            "RESOURCES;ALTREP=\"cid:a,b\":Room A,Projector"
        );
    }
}
