//! Error types for dotconf
//!
//! Errors are structured: a kind carrying the exact user-facing message,
//! plus optional source location, help text and underlying cause.

use std::fmt;

/// Result type alias for dotconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dotconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// The source could not be read
    #[error("Could not find {filename} within location {location} on the file system")]
    Loading { filename: String, location: String },
    /// The source text is not valid `KEY=VALUE` content
    #[error("{message}")]
    Parse { message: String },
    /// Expanding a value re-entered a name already on the resolution path
    #[error("Cyclic references found, path: {path}")]
    CyclicReference { path: String },
    /// A placeholder names a property that exists nowhere (strict mode only)
    #[error("Cannot resolve reference with name '{name}', path: {path}")]
    UnresolvedReference { name: String, path: String },
    /// `get_required` was asked for a property that does not exist
    #[error("Cannot find property: '{name}'")]
    MissingProperty { name: String },
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create a loading error for a source that could not be read
    pub fn loading(
        filename: impl Into<String>,
        location: impl Into<String>,
        cause: impl fmt::Display,
    ) -> Self {
        Self {
            cause: Some(cause.to_string()),
            help: Some("Check the location and filename, or create the file".into()),
            ..Self::from_kind(ErrorKind::Loading {
                filename: filename.into(),
                location: location.into(),
            })
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Parse {
            message: message.into(),
        })
    }

    /// Create a cyclic reference error from an already rendered path
    pub fn cyclic_reference(path: impl Into<String>) -> Self {
        Self {
            help: Some("Break the cycle by removing one of the references".into()),
            ..Self::from_kind(ErrorKind::CyclicReference { path: path.into() })
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved_reference(name: impl Into<String>, path: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            help: Some(format!(
                "Define '{}' in the file or environment, or disable strict mode",
                name
            )),
            ..Self::from_kind(ErrorKind::UnresolvedReference {
                name,
                path: path.into(),
            })
        }
    }

    /// Create a missing property error
    pub fn missing_property(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            help: Some(format!("Check that '{}' exists in the configuration", name)),
            ..Self::from_kind(ErrorKind::MissingProperty { name })
        }
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Actionable help message, if any
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Underlying cause, if any
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.kind, ErrorKind::Loading { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self.kind, ErrorKind::Parse { .. })
    }

    pub fn is_cyclic_reference(&self) -> bool {
        matches!(self.kind, ErrorKind::CyclicReference { .. })
    }

    pub fn is_unresolved_reference(&self) -> bool {
        matches!(self.kind, ErrorKind::UnresolvedReference { .. })
    }

    pub fn is_missing_property(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingProperty { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the kind message; callers assert on this text
        write!(f, "{}", self.kind)?;

        if let Some(loc) = &self.source_location {
            write!(f, " ({}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
            }
            write!(f, ")")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
