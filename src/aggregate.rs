// Merges overlapping calendar windows into one filtered, deduplicated list.
//
// Windows are walked in the order given and events in window order. The first
// occurrence of an identifier wins; later copies are dropped, not merged.
use crate::model::{Classifier, EventRecord, IdentityResolver, Verdict, WindowBatch};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total_seen: usize,
    pub included: usize,
    pub red_folder: usize,
    pub vip_keyword: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub events: Vec<EventRecord>,
    pub counters: Counters,
    pub windows: usize,
}

impl AggregateResult {
    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| e.uid.as_deref())
    }
}

pub struct Aggregator<'a> {
    classifier: &'a Classifier,
    resolver: &'a IdentityResolver,
    seen: HashSet<String>,
    result: AggregateResult,
}

impl<'a> Aggregator<'a> {
    pub fn new(classifier: &'a Classifier, resolver: &'a IdentityResolver) -> Self {
        Self {
            classifier,
            resolver,
            seen: HashSet::new(),
            result: AggregateResult::default(),
        }
    }

    /// Consume all windows and return the aggregate.
    pub fn run(mut self, windows: Vec<WindowBatch>) -> AggregateResult {
        for window in windows {
            self.push_window(window);
        }
        let c = &self.result.counters;
        log::info!(
            "Filtered {} events from {} total events across {} windows",
            c.included,
            c.total_seen,
            self.result.windows
        );
        log::info!("  - {} red folder (high impact) events", c.red_folder);
        log::info!("  - {} VIP keyword events", c.vip_keyword);
        if c.duplicates > 0 {
            log::debug!("  - {} duplicates dropped", c.duplicates);
        }
        self.result
    }

    pub fn push_window(&mut self, window: WindowBatch) {
        log::debug!("Aggregating window '{}' ({} events)", window.label, window.len());
        self.result.windows += 1;
        for event in window.events {
            self.push_event(event);
        }
    }

    /// Returns the verdict and whether the event was kept.
    ///
    /// Takes ownership: a dropped duplicate, along with any UID assigned to it,
    /// is discarded and not handed back to the caller.
    pub fn push_event(&mut self, mut event: EventRecord) -> (Verdict, bool) {
        self.result.counters.total_seen += 1;

        let verdict = self.classifier.classify(&event);
        if !verdict.is_included() {
            return (verdict, false);
        }

        let uid = self.resolver.assign(&mut event);
        if !self.seen.insert(uid) {
            self.result.counters.duplicates += 1;
            return (verdict, false);
        }

        let counters = &mut self.result.counters;
        counters.included += 1;
        match verdict {
            Verdict::RedFolder => counters.red_folder += 1,
            Verdict::VipKeyword => counters.vip_keyword += 1,
            Verdict::Plain => {}
        }
        self.result.events.push(event);
        (verdict, true)
    }
}
