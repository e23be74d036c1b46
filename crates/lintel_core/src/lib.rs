//! # lintel_core
//!
//! Core checking engine for Lintel.
//!
//! This crate provides:
//! - The `FileChecker`, which turns a token stream into physical-line,
//!   logical-line and tree plugin invocations
//! - The `Manager`, which fans checks out across a worker pool or runs them
//!   serially
//! - The `DecisionEngine` and `SuppressionEvaluator`, which decide whether a
//!   finding is reported
//! - `Statistics` and the prefix-indexed `Notifier`
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lintel_core::{Manager, RunOptions, StyleGuideManager};
//! use lintel_tokens::BasicFrontEnd;
//!
//! let options = Arc::new(RunOptions::new().filenames(vec!["src".to_string()]));
//! let mut manager = Manager::new(Arc::clone(&options), &plugins, Arc::new(BasicFrontEnd::new()));
//! let mut guides = StyleGuideManager::new(&options, &plugins, Vec::new())?;
//!
//! manager.start()?;
//! manager.run()?;
//! let (found, reported) = manager.report(&mut guides);
//! ```

mod checker;
mod config;
mod decision;
pub mod discovery;
mod error;
mod interrupt;
mod manager;
mod processor;
mod statistics;
mod style_guide;
mod suppression;
mod trie;
mod violation;

pub use checker::{CheckResult, FileChecker, FileReport, FileStatistics};
pub use config::{CONFIG_FILES, JobsArgument, JobsValue, LintelConfig, RunOptions};
pub use decision::{Decision, DecisionEngine, Ignored, Membership, Selected};
pub use error::LintelError;
pub use interrupt::Interrupt;
pub use manager::{Manager, RunStatistics, Spawner, ThreadSpawner, is_resource_exhaustion};
pub use processor::{FileProcessor, Mapping, expand_indent, find_offset, mutate_string};
pub use statistics::{Statistic, Statistics};
pub use style_guide::{ResultSink, StyleGuide, StyleGuideManager};
pub use suppression::{BlockRange, SuppressionEvaluator, is_file_suppressed};
pub use trie::{Listener, Notifier, Trie, TrieNode};
pub use violation::Violation;
