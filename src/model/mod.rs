// File: ./src/model/mod.rs
pub mod adapter;
pub mod identity;
pub mod item;
pub mod matcher;

pub use adapter::parse_window;
pub use identity::IdentityResolver;
pub use item::{EventRecord, EventTime, RawProperty, Verdict, WindowBatch};
pub use matcher::{Classifier, Explanation, RuleSet, VipPolicy};
