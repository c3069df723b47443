// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::calendar::{CalendarEmitter, CalendarMeta};
use crate::context::AppContext;
use crate::error::FeedResult;
use crate::model::identity::DEFAULT_UID_NAMESPACE;
use crate::model::matcher::{MEDIUM_IMPACT_PATTERNS, RED_FOLDER_PATTERNS, VIP_KEYWORD_PATTERNS};
use crate::model::{Classifier, IdentityResolver, VipPolicy};
use crate::storage::LocalStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const FEED_BASE_URL: &str = "https://nfs.faireconomy.media/ff_calendar_";

fn to_strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("enhanced_economic_calendar.ics")
}
fn default_uid_namespace() -> String {
    DEFAULT_UID_NAMESPACE.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_weeks() -> usize {
    3
}
fn default_windows() -> Vec<String> {
    vec![
        format!("{}thisweek.ics", FEED_BASE_URL),
        format!("{}nextweek.ics", FEED_BASE_URL),
        format!("{}week3.ics", FEED_BASE_URL),
        format!("{}week2.ics", FEED_BASE_URL),
        "https://www.forexfactory.com/calendar.ics".to_string(),
    ]
}
fn default_red_folder() -> Vec<String> {
    to_strings(RED_FOLDER_PATTERNS)
}
fn default_medium_impact() -> Vec<String> {
    to_strings(MEDIUM_IMPACT_PATTERNS)
}
fn default_vip_keywords() -> Vec<String> {
    to_strings(VIP_KEYWORD_PATTERNS)
}

/// Pattern sources for each classification tier. Matched against lower-cased text.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    #[serde(default = "default_red_folder")]
    pub red_folder: Vec<String>,
    #[serde(default = "default_medium_impact")]
    pub medium_impact: Vec<String>,
    #[serde(default = "default_vip_keywords")]
    pub vip_keywords: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            red_folder: default_red_folder(),
            medium_impact: default_medium_impact(),
            vip_keywords: default_vip_keywords(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_uid_namespace")]
    pub uid_namespace: String,
    #[serde(default)]
    pub vip_policy: VipPolicy,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many entries of `windows` to fetch. The first is always fetched.
    #[serde(default = "default_weeks")]
    pub weeks: usize,
    /// Feed URLs in fetch order. The first is the primary window.
    #[serde(default = "default_windows")]
    pub windows: Vec<String>,

    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub calendar: CalendarMeta,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            uid_namespace: default_uid_namespace(),
            vip_policy: VipPolicy::default(),
            timeout_secs: default_timeout_secs(),
            weeks: default_weeks(),
            windows: default_windows(),
            rules: RulesConfig::default(),
            calendar: CalendarMeta::default(),
        }
    }
}

impl Config {
    /// Load from the context's config file. A missing file yields the defaults.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<PathBuf> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(path)
    }

    /// URLs actually fetched, primary first.
    pub fn window_urls(&self) -> Vec<String> {
        self.windows
            .iter()
            .take(self.weeks.max(1))
            .cloned()
            .collect()
    }

    pub fn classifier(&self) -> FeedResult<Classifier> {
        Classifier::from_patterns(
            self.rules.red_folder.as_slice(),
            self.rules.medium_impact.as_slice(),
            self.rules.vip_keywords.as_slice(),
            self.vip_policy,
        )
    }

    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(self.uid_namespace.clone())
    }

    pub fn emitter(&self) -> CalendarEmitter {
        CalendarEmitter::new(self.calendar.clone())
    }
}
