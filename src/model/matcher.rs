// Rule-based classification of calendar events.
//
// Two tiers are evaluated against the lower-cased "summary description" text:
//
//   red folder   -> explicit high-impact markers, always included
//   vip keyword  -> named people/organisations, included according to `VipPolicy`
//
// A third tier (medium impact) only matters under `VipPolicy::MediumImpactOnly`,
// where a VIP keyword counts only if the event is also marked medium impact.

use crate::error::FeedError;
use crate::model::item::{EventRecord, Verdict};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

pub const RED_FOLDER_PATTERNS: &[&str] = &[
    r"impact:\s*high",
    r"high\s*impact",
    r"red\s*folder",
    r"red\s*impact",
    r"\bred\b",
];

pub const MEDIUM_IMPACT_PATTERNS: &[&str] = &[
    r"impact:\s*medium",
    r"medium\s*impact",
    r"yellow\s*folder",
    r"orange\s*folder",
    r"\byellow\b",
    r"\borange\b",
];

pub const VIP_KEYWORD_PATTERNS: &[&str] = &[
    r"\btrump\b",
    r"\bfomc\b",
    r"\bopec\b",
    r"president\s+lagarde",
    r"lagarde\b",
    r"gov\s+bailey",
    r"governor\s+bailey",
    r"\bbailey\b",
];

/// Which events a VIP keyword is allowed to pull in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VipPolicy {
    /// Any VIP keyword match is included, whatever the stated impact.
    #[default]
    Always,
    /// VIP keywords only count when the event is explicitly medium impact.
    MediumImpactOnly,
}

/// Ordered list of compiled patterns. The first pattern that matches wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    patterns: Vec<Regex>,
}

impl RuleSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Source of the first pattern matching `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|re| re.is_match(text))
            .map(|re| re.as_str())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Which pattern of each tier fired for a piece of text, and the verdict that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub red_folder: Option<String>,
    pub medium_impact: Option<String>,
    pub vip_keyword: Option<String>,
    pub verdict: Verdict,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |m: &Option<String>| match m {
            Some(p) => format!("matched {}", p),
            None => "no match".to_string(),
        };
        writeln!(f, "red folder:    {}", show(&self.red_folder))?;
        writeln!(f, "medium impact: {}", show(&self.medium_impact))?;
        writeln!(f, "vip keyword:   {}", show(&self.vip_keyword))?;
        write!(f, "verdict:       {}", self.verdict)
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    red_folder: RuleSet,
    medium_impact: RuleSet,
    vip_keywords: RuleSet,
    policy: VipPolicy,
}

impl Classifier {
    pub fn new(
        red_folder: RuleSet,
        medium_impact: RuleSet,
        vip_keywords: RuleSet,
        policy: VipPolicy,
    ) -> Self {
        Self {
            red_folder,
            medium_impact,
            vip_keywords,
            policy,
        }
    }

    /// Compile the three tiers from pattern sources.
    pub fn from_patterns<S: AsRef<str>>(
        red_folder: &[S],
        medium_impact: &[S],
        vip_keywords: &[S],
        policy: VipPolicy,
    ) -> Result<Self, FeedError> {
        let compile = |tier: &str, patterns: &[S]| {
            RuleSet::new(patterns).map_err(|e| FeedError::Config(format!("{} pattern: {}", tier, e)))
        };
        Ok(Self::new(
            compile("red folder", red_folder)?,
            compile("medium impact", medium_impact)?,
            compile("vip keyword", vip_keywords)?,
            policy,
        ))
    }

    pub fn policy(&self) -> VipPolicy {
        self.policy
    }

    pub fn classify(&self, event: &EventRecord) -> Verdict {
        let text = event.match_text();
        let verdict = self.classify_lowered(&text);
        if verdict == Verdict::VipKeyword {
            log::debug!(
                "VIP keyword event: {} (keyword: {})",
                event.title(),
                self.vip_keywords.first_match(&text).unwrap_or("?")
            );
        }
        verdict
    }

    /// Classify free text. Matching is case-insensitive.
    pub fn classify_text(&self, text: &str) -> Verdict {
        self.classify_lowered(&text.to_lowercase())
    }

    fn classify_lowered(&self, text: &str) -> Verdict {
        if self.red_folder.is_match(text) {
            return Verdict::RedFolder;
        }
        if self.vip_counts(text) {
            return Verdict::VipKeyword;
        }
        Verdict::Plain
    }

    fn vip_counts(&self, text: &str) -> bool {
        match self.policy {
            VipPolicy::Always => self.vip_keywords.is_match(text),
            VipPolicy::MediumImpactOnly => {
                self.medium_impact.is_match(text) && self.vip_keywords.is_match(text)
            }
        }
    }

    pub fn explain(&self, text: &str) -> Explanation {
        let text = text.to_lowercase();
        Explanation {
            red_folder: self.red_folder.first_match(&text).map(str::to_string),
            medium_impact: self.medium_impact.first_match(&text).map(str::to_string),
            vip_keyword: self.vip_keywords.first_match(&text).map(str::to_string),
            verdict: self.classify_lowered(&text),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_policy(VipPolicy::default())
    }
}

impl Classifier {
    /// Built-in rule sets with the given policy.
    pub fn with_policy(policy: VipPolicy) -> Self {
        Self::from_patterns(
            RED_FOLDER_PATTERNS,
            MEDIUM_IMPACT_PATTERNS,
            VIP_KEYWORD_PATTERNS,
            policy,
        )
        .expect("built-in rule sets should compile - this is a bug")
    }
}
