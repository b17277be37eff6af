//! Reference resolution engine
//!
//! Expands `${name}` placeholders in raw values on demand:
//! - each placeholder is looked up (system variables first when enabled and
//!   allowed to win, then the raw entries) and expanded in turn, using an
//!   explicit stack of partially expanded values rather than recursion
//! - a name that re-enters the current [`ResolutionPath`] is a cyclic
//!   reference, reported where the cycle closes
//! - a placeholder naming nothing fails in strict mode and expands to the
//!   empty string otherwise
//!
//! The engine only borrows its inputs. No state survives a call, so a single
//! environment can be queried from many threads at once.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::parser::RawEntries;
use crate::path::ResolutionPath;
use crate::system::VariableSource;

const REF_PREFIX: &str = "${";
const REF_SUFFIX: char = '}';

/// Lookup policy applied while resolving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolveOptions {
    /// Fail on placeholders that cannot be resolved instead of expanding them
    /// to the empty string
    pub strict_mode: bool,
    /// Consult system variables during lookup
    pub include_system_variables: bool,
    /// Let system variables win over raw entries with the same name
    pub replace_system_variables: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_system_variables: true,
            replace_system_variables: false,
        }
    }
}

/// Resolution over borrowed raw entries and a system variable source
pub struct Resolution<'s> {
    raw: &'s RawEntries,
    system: &'s dyn VariableSource,
    options: ResolveOptions,
}

impl<'s> Resolution<'s> {
    pub fn new(
        raw: &'s RawEntries,
        system: &'s dyn VariableSource,
        options: ResolveOptions,
    ) -> Self {
        Self {
            raw,
            system,
            options,
        }
    }

    /// Resolve `name` reached through `path`
    ///
    /// Returns `Ok(None)` when the name exists neither in the raw entries
    /// nor, if enabled, in the system variables. Deciding whether that is an
    /// error is up to the caller.
    pub fn resolve(&self, name: &str, path: &ResolutionPath) -> Result<Option<Cow<'s, str>>> {
        // Checked before lookup so the cycle is reported where it closes
        if path.contains(name) {
            return Err(Error::cyclic_reference(path.render_with(name)));
        }

        let Some(literal) = self.lookup(name) else {
            return Ok(None);
        };
        if !literal.contains(REF_PREFIX) {
            return Ok(Some(literal));
        }

        let mut inner = path.child(name);
        self.expand_text(&literal, &mut inner)
            .map(|value| Some(Cow::Owned(value)))
    }

    /// Find the unexpanded literal for `name`
    pub fn lookup(&self, name: &str) -> Option<Cow<'s, str>> {
        let options = &self.options;
        if options.include_system_variables
            && (options.replace_system_variables || !self.raw.contains_key(name))
        {
            if let Some(value) = self.system.variable(name) {
                log::trace!("Using system variable for '{}'", name);
                return Some(Cow::Owned(value));
            }
        }

        self.raw.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }

    /// Replace every placeholder in `literal`, left to right
    ///
    /// `path` is the chain owning `literal`; unresolved names are reported
    /// as `path -> name`. A `${` without a closing `}` is kept as text.
    pub fn expand<'v>(&self, literal: Cow<'v, str>, path: &ResolutionPath) -> Result<Cow<'v, str>> {
        if !literal.contains(REF_PREFIX) {
            return Ok(literal);
        }

        let mut path = path.clone();
        self.expand_text(&literal, &mut path).map(Cow::Owned)
    }

    /// Expand `literal` owned by `path` without recursing
    ///
    /// Each value under expansion is a [`Frame`]; descending into a
    /// placeholder suspends the current frame and pushes its name on `path`,
    /// finishing a frame pops the name and splices the result into its
    /// parent. Chain depth is bounded by heap, not by the thread stack.
    fn expand_text<'a>(&'a self, literal: &'a str, path: &mut ResolutionPath) -> Result<String> {
        let mut current = Frame::new(Cow::Borrowed(literal));
        let mut suspended: Vec<Frame<'a>> = Vec::new();

        loop {
            let Some(reference) = current.next_reference() else {
                let value = current.finish();
                match suspended.pop() {
                    Some(parent) => {
                        path.pop();
                        current = parent;
                        current.output.push_str(&value);
                        continue;
                    }
                    None => return Ok(value),
                }
            };

            if path.contains(&reference) {
                return Err(Error::cyclic_reference(path.render_with(&reference)));
            }

            match self.lookup(&reference) {
                Some(value) if !value.contains(REF_PREFIX) => current.output.push_str(&value),
                Some(value) => {
                    path.push(reference);
                    suspended.push(std::mem::replace(&mut current, Frame::new(value)));
                }
                None if self.options.strict_mode => {
                    return Err(Error::unresolved_reference(
                        &reference,
                        path.render_with(&reference),
                    ));
                }
                None => {
                    log::debug!(
                        "Reference '{}' not found, path: {}; substituting empty string",
                        reference,
                        path.render_with(&reference)
                    );
                }
            }
        }
    }
}

/// A value part way through expansion
struct Frame<'a> {
    literal: Cow<'a, str>,
    /// Byte offset of the first unscanned character
    pos: usize,
    output: String,
}

impl<'a> Frame<'a> {
    fn new(literal: Cow<'a, str>) -> Self {
        let output = String::with_capacity(literal.len());
        Self {
            literal,
            pos: 0,
            output,
        }
    }

    /// Copy text up to the next placeholder and return its name
    fn next_reference(&mut self) -> Option<String> {
        let rest = &self.literal[self.pos..];
        let start = rest.find(REF_PREFIX)?;
        let body = start + REF_PREFIX.len();
        let end = body + rest[body..].find(REF_SUFFIX)?;

        self.output.push_str(&rest[..start]);
        let reference = rest[body..end].to_string();
        self.pos += end + REF_SUFFIX.len_utf8();
        Some(reference)
    }

    /// The expanded value, with any unscanned tail kept as text
    fn finish(mut self) -> String {
        self.output.push_str(&self.literal[self.pos..]);
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw(pairs: &[(&str, &str)]) -> RawEntries {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn no_system() -> HashMap<String, String> {
        HashMap::new()
    }

    fn lenient() -> ResolveOptions {
        ResolveOptions {
            strict_mode: false,
            include_system_variables: false,
            replace_system_variables: false,
        }
    }

    fn strict() -> ResolveOptions {
        ResolveOptions {
            strict_mode: true,
            ..lenient()
        }
    }

    fn resolve_top(
        entries: &RawEntries,
        system: &HashMap<String, String>,
        options: ResolveOptions,
        name: &str,
    ) -> Result<Option<String>> {
        Resolution::new(entries, system, options)
            .resolve(name, &ResolutionPath::root())
            .map(|value| value.map(Cow::into_owned))
    }

    #[test]
    fn test_literal_value_is_borrowed() {
        let entries = raw(&[("test_key", "test_val")]);
        let system = no_system();
        let resolution = Resolution::new(&entries, &system, lenient());

        let value = resolution
            .resolve("test_key", &ResolutionPath::root())
            .unwrap()
            .unwrap();
        assert!(matches!(value, Cow::Borrowed("test_val")));
    }

    #[test]
    fn test_missing_top_level_is_none() {
        let entries = raw(&[]);
        let system = no_system();

        assert_eq!(resolve_top(&entries, &system, strict(), "missing").unwrap(), None);
    }

    #[test]
    fn test_chained_references() {
        let entries = raw(&[("a", "${b}-a"), ("b", "${c}-b"), ("c", "c")]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, lenient(), "a").unwrap(),
            Some("c-b-a".into())
        );
    }

    #[test]
    fn test_multiple_placeholders_concatenate_in_order() {
        let entries = raw(&[
            ("l", "Lorem"),
            ("i", "ipsum"),
            ("d", "dolor"),
            ("lorem", "${l} ${i} ${d}${d}!"),
        ]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, strict(), "lorem").unwrap(),
            Some("Lorem ipsum dolordolor!".into())
        );
    }

    #[test]
    fn test_same_reference_twice_is_not_a_cycle() {
        let entries = raw(&[("a", "${b}${b}"), ("b", "${c}"), ("c", "x")]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, strict(), "a").unwrap(),
            Some("xx".into())
        );
    }

    #[test]
    fn test_cycle_reported_where_it_closes() {
        let entries = raw(&[("a", "${b}"), ("b", "${c}"), ("c", "${a}")]);
        let system = no_system();

        let err = resolve_top(&entries, &system, lenient(), "a").unwrap_err();
        assert!(err.is_cyclic_reference());
        assert_eq!(
            err.to_string(),
            "Cyclic references found, path: a -> b -> c -> a"
        );
    }

    #[test]
    fn test_cycle_entered_midway() {
        let entries = raw(&[("start", "${a}"), ("a", "${b}"), ("b", "${a}")]);
        let system = no_system();

        let err = resolve_top(&entries, &system, lenient(), "start").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cyclic references found, path: start -> a -> b -> a"
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let entries = raw(&[("x", "${x}")]);
        let system = no_system();

        let err = resolve_top(&entries, &system, lenient(), "x").unwrap_err();
        assert_eq!(err.to_string(), "Cyclic references found, path: x -> x");
    }

    fn chain(depth: usize, last: &str) -> RawEntries {
        let mut entries: RawEntries = (0..depth)
            .map(|i| (format!("k{}", i), format!("${{k{}}}", i + 1)))
            .collect();
        entries.insert(format!("k{}", depth), last.to_string());
        entries
    }

    #[test]
    fn test_deep_chain_does_not_exhaust_stack() {
        let entries = chain(10_000, "end");
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, strict(), "k0").unwrap(),
            Some("end".into())
        );
    }

    #[test]
    fn test_deep_cycle_reports_full_path() {
        let entries = chain(10_000, "${k0}");
        let system = no_system();

        let err = resolve_top(&entries, &system, lenient(), "k0").unwrap_err();
        let message = err.to_string();
        assert!(err.is_cyclic_reference());
        assert!(message.starts_with("Cyclic references found, path: k0 -> k1 -> k2 -> "));
        assert!(message.ends_with(" -> k9999 -> k10000 -> k0"));
    }

    #[test]
    fn test_deep_chain_unresolved_in_strict_mode() {
        let entries = chain(5_000, "${gone}");
        let system = no_system();

        let err = resolve_top(&entries, &system, strict(), "k0").unwrap_err();
        assert!(err.is_unresolved_reference());
        assert!(err.to_string().ends_with(" -> k4999 -> k5000 -> gone"));
    }

    #[test]
    fn test_sibling_placeholders_after_nested_value() {
        // The path is restored once a nested value is finished
        let entries = raw(&[
            ("a", "${b}+${c}"),
            ("b", "${d}"),
            ("c", "${d}"),
            ("d", "${e}!"),
            ("e", "x"),
        ]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, strict(), "a").unwrap(),
            Some("x!+x!".into())
        );
    }

    #[test]
    fn test_strict_unresolved_reference() {
        let entries = raw(&[("d", "${e}"), ("e", "${f}")]);
        let system = no_system();

        let err = resolve_top(&entries, &system, strict(), "d").unwrap_err();
        assert!(err.is_unresolved_reference());
        assert_eq!(
            err.to_string(),
            "Cannot resolve reference with name 'f', path: d -> e -> f"
        );
    }

    #[test]
    fn test_lenient_unresolved_reference_is_empty() {
        let entries = raw(&[("d", "${e}"), ("e", "${f}"), ("g", "pre-${f}-post")]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, lenient(), "d").unwrap(),
            Some(String::new())
        );
        assert_eq!(
            resolve_top(&entries, &system, lenient(), "g").unwrap(),
            Some("pre--post".into())
        );
    }

    #[test]
    fn test_empty_placeholder() {
        let entries = raw(&[("a", "x${}y")]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, lenient(), "a").unwrap(),
            Some("xy".into())
        );
        let err = resolve_top(&entries, &system, strict(), "a").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot resolve reference with name '', path: a -> "
        );

        let with_empty_key = raw(&[("a", "x${}y"), ("", "-")]);
        assert_eq!(
            resolve_top(&with_empty_key, &system, strict(), "a").unwrap(),
            Some("x-y".into())
        );
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        let entries = raw(&[("b", "B"), ("a", "${b} and ${c")]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, strict(), "a").unwrap(),
            Some("B and ${c".into())
        );
    }

    #[test]
    fn test_dollar_without_brace_is_literal() {
        let entries = raw(&[("price", "$5 {not a ref}")]);
        let system = no_system();

        assert_eq!(
            resolve_top(&entries, &system, strict(), "price").unwrap(),
            Some("$5 {not a ref}".into())
        );
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let entries = raw(&[("a", "${b}/${c}"), ("b", "1"), ("c", "${b}2")]);
        let system = no_system();

        let first = resolve_top(&entries, &system, strict(), "a").unwrap();
        let second = resolve_top(&entries, &system, strict(), "a").unwrap();
        assert_eq!(first, Some("1/12".into()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_system_variables_ignored_when_excluded() {
        let entries = raw(&[("a", "${HOME_DIR}")]);
        let mut system = HashMap::new();
        system.insert("HOME_DIR".to_string(), "/home/me".to_string());

        assert_eq!(
            resolve_top(&entries, &system, lenient(), "a").unwrap(),
            Some(String::new())
        );
        assert_eq!(
            resolve_top(&entries, &system, lenient(), "HOME_DIR").unwrap(),
            None
        );
    }

    #[test]
    fn test_system_variables_fill_gaps() {
        let entries = raw(&[("a", "${HOME_DIR}/app"), ("SHARED", "from_file")]);
        let mut system = HashMap::new();
        system.insert("HOME_DIR".to_string(), "/home/me".to_string());
        system.insert("SHARED".to_string(), "from_system".to_string());
        let options = ResolveOptions {
            include_system_variables: true,
            ..strict()
        };

        assert_eq!(
            resolve_top(&entries, &system, options, "a").unwrap(),
            Some("/home/me/app".into())
        );
        assert_eq!(
            resolve_top(&entries, &system, options, "SHARED").unwrap(),
            Some("from_file".into())
        );
    }

    #[test]
    fn test_system_variables_replace_raw_entries() {
        let entries = raw(&[("a", "${SHARED}"), ("SHARED", "from_file")]);
        let mut system = HashMap::new();
        system.insert("SHARED".to_string(), "from_system".to_string());
        let options = ResolveOptions {
            include_system_variables: true,
            replace_system_variables: true,
            ..strict()
        };

        assert_eq!(
            resolve_top(&entries, &system, options, "SHARED").unwrap(),
            Some("from_system".into())
        );
        assert_eq!(
            resolve_top(&entries, &system, options, "a").unwrap(),
            Some("from_system".into())
        );
    }

    #[test]
    fn test_replace_without_include_has_no_effect() {
        let entries = raw(&[("SHARED", "from_file")]);
        let mut system = HashMap::new();
        system.insert("SHARED".to_string(), "from_system".to_string());
        let options = ResolveOptions {
            replace_system_variables: true,
            ..strict()
        };

        assert_eq!(
            resolve_top(&entries, &system, options, "SHARED").unwrap(),
            Some("from_file".into())
        );
    }

    #[test]
    fn test_system_values_are_expanded() {
        let entries = raw(&[("base", "/srv")]);
        let mut system = HashMap::new();
        system.insert("APP_DIR".to_string(), "${base}/app".to_string());
        let options = ResolveOptions {
            include_system_variables: true,
            ..strict()
        };

        assert_eq!(
            resolve_top(&entries, &system, options, "APP_DIR").unwrap(),
            Some("/srv/app".into())
        );
    }

    #[test]
    fn test_expand_text_with_fresh_path() {
        let entries = raw(&[("test_key", "test_val")]);
        let system = no_system();
        let resolution = Resolution::new(&entries, &system, strict());

        let value = resolution
            .expand(Cow::Borrowed("[${test_key}]"), &ResolutionPath::root())
            .unwrap();
        assert_eq!(value, "[test_val]");

        let err = resolution
            .expand(Cow::Borrowed("${nope}"), &ResolutionPath::root())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot resolve reference with name 'nope', path: nope"
        );
    }
}
