//! cxxrepl Core
//!
//! Incremental evaluation on top of full-program recompilation: source
//! accumulation, the compile-and-run toolchain boundary, output diffing,
//! and the session that ties them together.

pub mod error;
pub mod reduce;
pub mod runner;
pub mod session;
pub mod source;

pub use error::{BuildError, Stage};
pub use reduce::{reduce, Delta};
pub use runner::{ProcessToolchain, Toolchain, DEFAULT_COMPILER};
pub use session::Session;
pub use source::{render, LineKind, SourceState};
