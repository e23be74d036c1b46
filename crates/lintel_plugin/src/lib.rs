//! # lintel_plugin
//!
//! Check plugin contract for Lintel.
//!
//! This crate provides:
//! - The `Check` trait implemented by every check
//! - `CheckArgs`, the per-invocation argument set built from a plugin's
//!   declared parameters
//! - `Plugin` and `PluginSet`, the explicit, immutable plugin registry
//!   passed to the checker manager
//!
//! ## Architecture
//!
//! Each plugin declares the parameters it wants by name. At load time the
//! declaration is turned into a capability tag (`PluginKind`) that decides
//! how the file checker invokes it:
//!
//! - **Tree**: once per file with the parsed syntax tree
//! - **LogicalLine**: once per reconstructed statement
//! - **PhysicalLine**: once per source line
//!
//! ## Example
//!
//! ```rust,ignore
//! use lintel_plugin::{CheckOutput, Plugin, PluginSet, check_fn};
//!
//! let plugin = Plugin::builder(
//!     "W191",
//!     check_fn(|args| {
//!         let line = args.physical_line().unwrap_or_default();
//!         Ok(line
//!             .find('\t')
//!             .map(|offset| vec![CheckOutput::at_offset(offset, "W191 indentation contains tabs")])
//!             .unwrap_or_default())
//!     }),
//! )
//! .parameters(["physical_line"])
//! .build()?;
//!
//! let plugins = PluginSet::new(vec![plugin])?;
//! ```

mod check;
mod error;
mod parameter;
mod plugin;

pub use check::{ArgumentSource, Check, CheckArgs, CheckOutput, CheckerState, Location, check_fn};
pub use error::PluginError;
pub use parameter::Parameter;
pub use plugin::{Checkers, Plugin, PluginBuilder, PluginKind, PluginSet};
