//! Load configuration for `.env` sources
//!
//! [`DotenvConfig`] is an immutable value describing where to find a source
//! and which lookup policy to apply. Each `with_*` call returns an updated
//! copy; `load()` reads, parses and wraps the source in a [`Dotenv`].

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::dotenv::Dotenv;
use crate::error::Result;
use crate::loader;
use crate::parser;
use crate::resolution::ResolveOptions;

const DEFAULT_LOCATION: &str = ".";
const DEFAULT_FILENAME: &str = ".env";

// Process-wide default, created on first use and never modified
static GLOBAL_CONFIG: OnceLock<DotenvConfig> = OnceLock::new();

/// Where to load a `.env` source from and how to resolve it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DotenvConfig {
    location: String,
    filename: String,
    strict_mode: bool,
    include_system_variables: bool,
    replace_system_variables: bool,
}

impl Default for DotenvConfig {
    fn default() -> Self {
        let options = ResolveOptions::default();
        Self {
            location: DEFAULT_LOCATION.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            strict_mode: options.strict_mode,
            include_system_variables: options.include_system_variables,
            replace_system_variables: options.replace_system_variables,
        }
    }
}

impl DotenvConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared default configuration
    pub fn global() -> &'static DotenvConfig {
        GLOBAL_CONFIG.get_or_init(DotenvConfig::default)
    }

    /// Set the directory (path or `file:` URI) containing the source
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the source file name
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set whether unresolved references are errors
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    /// Set whether system variables are consulted
    pub fn with_include_system_variables(mut self, include: bool) -> Self {
        self.include_system_variables = include;
        self
    }

    /// Set whether system variables win over source entries
    pub fn with_replace_system_variables(mut self, replace: bool) -> Self {
        self.replace_system_variables = replace;
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    pub fn include_system_variables(&self) -> bool {
        self.include_system_variables
    }

    pub fn replace_system_variables(&self) -> bool {
        self.replace_system_variables
    }

    /// The lookup policy part of this configuration
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            strict_mode: self.strict_mode,
            include_system_variables: self.include_system_variables,
            replace_system_variables: self.replace_system_variables,
        }
    }

    /// Read and parse the configured source
    pub fn load(&self) -> Result<Dotenv> {
        let text = loader::read_source(&self.location, &self.filename)?;
        let raw = parser::parse_with_source(&text, &self.filename)?;
        log::debug!(
            "Loaded {} entries from {} in {}",
            raw.len(),
            self.filename,
            self.location
        );
        Ok(Dotenv::new(raw, self.resolve_options()))
    }

    /// Parse `text` as the source, without touching the file system
    pub fn load_str(&self, text: &str) -> Result<Dotenv> {
        let raw = parser::parse_with_source(text, &self.filename)?;
        Ok(Dotenv::new(raw, self.resolve_options()))
    }
}

impl fmt::Display for DotenvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DotenvConfig(location='{}', filename='{}', strictMode={}, includeSystemVariables={}, replaceSystemVariables={})",
            self.location,
            self.filename,
            self.strict_mode,
            self.include_system_variables,
            self.replace_system_variables
        )
    }
}
