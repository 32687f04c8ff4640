// src/lib.rs

//! Declarative, data-driven construction of external process invocations.
//!
//! A command is described once as a small template: an ordered list of
//! arguments, where each argument mixes literal text with positional and
//! named placeholders. Concrete values are bound later, and resolution
//! produces an [`ExecutionContext`] ready to hand to the process boundary.
//!
//! ```
//! use invoker::{CommandSpec, CommandTemplate};
//!
//! let spec = CommandSpec::from_json_str(r#"[{"t": "make"}, {"p": 0}]"#)?;
//! let mut template = CommandTemplate::from_spec(&spec)?;
//! template.add_argument("all").current_path("/tmp");
//!
//! let context = template.context()?;
//! assert_eq!(context.arguments, ["make", "all"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod constants;
pub mod core;
pub mod models;
pub mod system;

pub use crate::core::maker::{CommandMaker, Maker, ToolSet};
pub use crate::core::resolver::{ResolveError, Resolver};
pub use crate::core::template::{CommandTemplate, Reference, TemplateError, Token};
pub use crate::models::{CommandSpec, ResolverConfig, ToolsConfig};
pub use crate::system::fetcher::{CopyFetcher, CurlFetcher, FetchError, Fetcher, WgetFetcher};
pub use crate::system::process::{ExecutionContext, ProcessError, ProcessRunner, SystemProcess};

use thiserror::Error;

/// Any failure surfaced by this crate. Each component keeps its own error
/// enum; this aggregate exists for entry points that cross component
/// boundaries (template execution, facades, config loading).
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, Error>;
