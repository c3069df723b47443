// Crate root library declaration and module exports.
pub mod aggregate;
pub mod calendar;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod storage;
