//! dotconf-core: `.env` loading with chained reference resolution
//!
//! This crate loads `KEY=VALUE` sources and expands `${name}` placeholders on
//! lookup, following references across keys and, optionally, across the
//! process environment. Cyclic references are always errors; unresolved
//! references are errors in strict mode and empty strings otherwise.
//!
//! # Example
//!
//! ```rust
//! use dotconf_core::DotenvConfig;
//!
//! let env = r#"
//! HOST=localhost
//! PORT=5432
//! DATABASE_URL=postgres://${HOST}:${PORT}/app
//! "#;
//!
//! let dotenv = DotenvConfig::new()
//!     .with_include_system_variables(false)
//!     .load_str(env)
//!     .unwrap();
//! assert_eq!(
//!     dotenv.get("DATABASE_URL").unwrap().as_deref(),
//!     Some("postgres://localhost:5432/app")
//! );
//! ```

pub mod error;
pub mod loader;
pub mod parser;
pub mod path;
pub mod resolution;
pub mod system;

mod config;
mod dotenv;

pub use config::DotenvConfig;
pub use dotenv::{resolve_environment, Dotenv};
pub use error::{Error, ErrorKind, Result};
pub use parser::RawEntries;
pub use resolution::ResolveOptions;
pub use system::{ProcessEnvironment, VariableSource};
