// Aggregation across overlapping windows parsed from iCalendar text.
use ffcal::aggregate::{Aggregator, Counters};
use ffcal::model::{Classifier, IdentityResolver, WindowBatch, parse_window};
use std::collections::HashSet;

fn vevent(uid: Option<&str>, summary: &str, description: &str, dtstart: &str) -> String {
    let mut out = String::from("BEGIN:VEVENT\r\n");
    if let Some(uid) = uid {
        out.push_str(&format!("UID:{}\r\n", uid));
    }
    out.push_str(&format!("SUMMARY:{}\r\n", summary));
    out.push_str(&format!("DESCRIPTION:{}\r\n", description));
    out.push_str(&format!("DTSTART:{}\r\n", dtstart));
    out.push_str("LOCATION:USD\r\n");
    out.push_str("END:VEVENT\r\n");
    out
}

fn calendar(events: &[String]) -> String {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n");
    for e in events {
        out.push_str(e);
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

fn sample_week() -> String {
    calendar(&[
        vevent(
            Some("gdp-1"),
            "High Impact GDP Release",
            "Impact: High",
            "20240108T133000Z",
        ),
        vevent(
            Some("emp-1"),
            "Low Impact Employment Data",
            "Impact: Low",
            "20240109T133000Z",
        ),
        vevent(
            Some("cpi-1"),
            "Red Folder Inflation Report",
            "Consumer prices",
            "20240110T133000Z",
        ),
        vevent(
            Some("trade-1"),
            "Medium Impact Trade Balance",
            "Impact: Medium",
            "20240111T133000Z",
        ),
    ])
}

fn run(windows: Vec<WindowBatch>) -> ffcal::aggregate::AggregateResult {
    let classifier = Classifier::default();
    let resolver = IdentityResolver::default();
    Aggregator::new(&classifier, &resolver).run(windows)
}

#[test]
fn test_sample_week_keeps_high_impact_only() {
    let week = parse_window("this week", &sample_week()).unwrap();
    let result = run(vec![week]);

    let summaries: Vec<_> = result.events.iter().map(|e| e.title()).collect();
    assert_eq!(
        summaries,
        vec!["High Impact GDP Release", "Red Folder Inflation Report"]
    );
    assert_eq!(result.counters.total_seen, 4);
    assert_eq!(result.counters.included, 2);
    assert_eq!(result.counters.red_folder, 2);
}

#[test]
fn test_identical_event_in_two_windows_is_kept_once() {
    let shared = vevent(None, "FOMC Statement", "Impact: High", "20240110T190000Z");
    let w1 = parse_window("this week", &calendar(&[shared.clone()])).unwrap();
    let w2 = parse_window("next week", &calendar(&[shared])).unwrap();

    let result = run(vec![w1, w2]);
    assert_eq!(result.events.len(), 1);
    assert_eq!(result.counters.total_seen, 2);
    assert_eq!(result.counters.included, 1);
    assert_eq!(result.counters.duplicates, 1);
    assert!(
        result.events[0]
            .uid
            .as_deref()
            .unwrap()
            .ends_with("@forex-factory-high-impact")
    );
}

#[test]
fn test_native_uid_duplicates_keep_first_copy() {
    let w1 = parse_window(
        "this week",
        &calendar(&[vevent(Some("x"), "CPI", "Impact: High", "20240110T133000Z")]),
    )
    .unwrap();
    let w2 = parse_window(
        "next week",
        &calendar(&[vevent(
            Some("x"),
            "CPI (revised)",
            "Impact: High",
            "20240110T140000Z",
        )]),
    )
    .unwrap();

    let result = run(vec![w1, w2]);
    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].title(), "CPI");
}

#[test]
fn test_plain_window_only_moves_total() {
    let week = parse_window("this week", &sample_week()).unwrap();
    let before = run(vec![week.clone()]);

    let plain = parse_window(
        "noise",
        &calendar(&[
            vevent(None, "Housing Starts", "Impact: Low", "20240112T133000Z"),
            vevent(None, "Retail Sales", "Impact: Medium", "20240112T133000Z"),
        ]),
    )
    .unwrap();
    let after = run(vec![week, plain]);

    let titles = |r: &ffcal::aggregate::AggregateResult| -> Vec<String> {
        r.events.iter().map(|e| e.title().to_string()).collect()
    };
    assert_eq!(titles(&before), titles(&after));
    assert_eq!(
        after.counters,
        Counters {
            total_seen: before.counters.total_seen + 2,
            ..before.counters
        }
    );
}

#[test]
fn test_output_identifiers_are_distinct() {
    let events: Vec<String> = (0..20)
        .map(|i| {
            vevent(
                None,
                &format!("Speech {}", i % 7),
                "Impact: High",
                &format!("202401{:02}T120000Z", 10 + i % 5),
            )
        })
        .collect();
    let w1 = parse_window("a", &calendar(&events)).unwrap();
    let w2 = parse_window("b", &calendar(&events)).unwrap();
    let result = run(vec![w1, w2]);

    let uids: HashSet<_> = result.uids().collect();
    assert_eq!(uids.len(), result.events.len());
    assert_eq!(result.counters.total_seen, 40);
    assert_eq!(result.counters.included + result.counters.duplicates, 40);
}

#[test]
fn test_first_seen_order_across_windows() {
    let w1 = parse_window(
        "this week",
        &calendar(&[vevent(None, "Friday NFP", "Impact: High", "20240112T133000Z")]),
    )
    .unwrap();
    let w2 = parse_window(
        "next week",
        &calendar(&[vevent(None, "Monday Trump Speech", "", "20240108T090000Z")]),
    )
    .unwrap();

    let result = run(vec![w1, w2]);
    let titles: Vec<_> = result.events.iter().map(|e| e.title()).collect();
    assert_eq!(titles, vec!["Friday NFP", "Monday Trump Speech"]);
    assert_eq!(result.counters.red_folder, 1);
    assert_eq!(result.counters.vip_keyword, 1);
}
