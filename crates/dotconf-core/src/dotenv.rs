//! Resolved environment
//!
//! [`Dotenv`] is the queryable result of a load: the raw entries, the lookup
//! policy and the system variable source. Values are expanded per lookup and
//! never cached, so every call sees the same immutable inputs.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::DotenvConfig;
use crate::error::{Error, Result};
use crate::parser::RawEntries;
use crate::path::ResolutionPath;
use crate::resolution::{Resolution, ResolveOptions};
use crate::system::{ProcessEnvironment, VariableSource};

/// A loaded `.env` source with lazy reference expansion
#[derive(Clone)]
pub struct Dotenv {
    /// The raw (unexpanded) entries
    raw: Arc<RawEntries>,
    /// Lookup policy
    options: ResolveOptions,
    /// System variables consulted when enabled by `options`
    system: Arc<dyn VariableSource>,
}

/// Build a resolved environment over the process environment
pub fn resolve_environment(raw: RawEntries, options: ResolveOptions) -> Dotenv {
    Dotenv::new(raw, options)
}

impl Dotenv {
    /// Start from the default configuration
    ///
    /// ```no_run
    /// use dotconf_core::Dotenv;
    ///
    /// let dotenv = Dotenv::configure().with_strict_mode(true).load()?;
    /// let url = dotenv.get_required("DATABASE_URL")?;
    /// # Ok::<(), dotconf_core::Error>(())
    /// ```
    pub fn configure() -> DotenvConfig {
        DotenvConfig::global().clone()
    }

    /// Create an environment that consults the process environment
    pub fn new(raw: RawEntries, options: ResolveOptions) -> Self {
        Self::with_system_variables(raw, options, ProcessEnvironment)
    }

    /// Create an environment with a custom system variable source
    pub fn with_system_variables(
        raw: RawEntries,
        options: ResolveOptions,
        system: impl VariableSource + 'static,
    ) -> Self {
        Self {
            raw: Arc::new(raw),
            options,
            system: Arc::new(system),
        }
    }

    fn resolution(&self) -> Resolution<'_> {
        Resolution::new(&self.raw, &*self.system, self.options)
    }

    /// Get the expanded value of `name`
    ///
    /// A name that exists nowhere yields `Ok(None)` in every mode. Cyclic
    /// references, and unresolved references in strict mode, met while
    /// expanding an existing value are errors.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let value = self.resolution().resolve(name, &ResolutionPath::root())?;
        Ok(value.map(|v| v.into_owned()))
    }

    /// Get the expanded value of `name`, or the expanded `default`
    ///
    /// The default is expanded with a fresh path, so it may reference other
    /// properties. In strict mode an unresolvable reference in the default
    /// is an error, as it is for stored values. With no default a missing
    /// name is `Ok(None)`, as for [`Dotenv::get`].
    pub fn get_or(&self, name: &str, default: Option<&str>) -> Result<Option<String>> {
        let resolution = self.resolution();
        let root = ResolutionPath::root();

        if let Some(value) = resolution.resolve(name, &root)? {
            return Ok(Some(value.into_owned()));
        }
        match default {
            Some(text) => Ok(Some(resolution.expand(text.into(), &root)?.into_owned())),
            None => Ok(None),
        }
    }

    /// Get the expanded value of `name`, failing if it exists nowhere
    pub fn get_required(&self, name: &str) -> Result<String> {
        self.get(name)?.ok_or_else(|| Error::missing_property(name))
    }

    /// The lookup policy of this environment
    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Whether `name` can be found in the entries or enabled system variables
    pub fn contains_key(&self, name: &str) -> bool {
        self.resolution().lookup(name).is_some()
    }

    /// The unexpanded value of `name` as written in the source
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }

    /// Names of the source entries, in source order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.raw.keys().map(String::as_str)
    }

    /// Number of source entries
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Expand every source entry, in source order
    ///
    /// Each entry is resolved independently; the first error stops the walk.
    pub fn resolve_all(&self) -> Result<IndexMap<String, String>> {
        let resolution = self.resolution();
        let root = ResolutionPath::root();
        let mut resolved = IndexMap::with_capacity(self.raw.len());

        for name in self.raw.keys() {
            if let Some(value) = resolution.resolve(name, &root)? {
                resolved.insert(name.clone(), value.into_owned());
            }
        }

        Ok(resolved)
    }
}

impl fmt::Debug for Dotenv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values are left out; they often hold secrets
        f.debug_struct("Dotenv")
            .field("keys", &self.raw.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
