//! Compiles typed Shortcut search filters into the backend's flat query grammar.

pub mod catalog;
pub mod compiler;
pub mod encode;
pub mod params;
pub mod resolver;

mod error;

pub use catalog::{Catalog, FilterField, ValueKind};
pub use compiler::{CompiledQuery, Compiler};
pub use error::{Error, Result};
pub use params::{DateBound, DateExpr, DateParseError, FieldValue, QueryParams, UserRef};
pub use resolver::{BoxFuture, Identity, ResolveError, UserResolver};
pub use tokio_util::sync::CancellationToken;
