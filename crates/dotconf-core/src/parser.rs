//! Line parser for `.env` sources
//!
//! Splits raw text into an ordered map of property name to raw value:
//! - `KEY=VALUE`, `KEY: VALUE` or `KEY VALUE` lines
//! - blank lines and `#` / `!` comments are skipped
//! - a trailing backslash continues the value on the next line
//! - matching surrounding quotes are removed from values
//! - backslash escapes (`\t`, `\n`, `\r`, `\f`, `\uXXXX`, `\X`) are decoded
//!   in keys and values
//!
//! `${...}` placeholders are left untouched; they are expanded at lookup time.

use std::borrow::Cow;
use std::str::Chars;

use indexmap::IndexMap;

use crate::error::{Error, Result, SourceLocation};

/// Raw (unexpanded) entries in source order
pub type RawEntries = IndexMap<String, String>;

/// Parse `.env` text
pub fn parse(input: &str) -> Result<RawEntries> {
    parse_with_source(input, "<input>")
}

/// Parse `.env` text, naming `source` in error locations
pub fn parse_with_source(input: &str, source: &str) -> Result<RawEntries> {
    let mut entries = RawEntries::new();
    let mut lines = input.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start();
        if is_skipped(trimmed) {
            continue;
        }

        let mut logical = trimmed.to_string();
        while is_continued(&logical) {
            logical.pop(); // backslash
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let located = |err: Error| {
            err.with_source_location(SourceLocation {
                file: source.to_string(),
                line: Some(index + 1),
            })
        };

        let (key, value) = split_entry(&logical);
        if key.is_empty() {
            return Err(located(Error::parse("Property name must not be empty"))
                .with_help("Lines must have the form KEY=VALUE"));
        }
        let key = unescape(key).map_err(located)?;
        let value = unescape(unquote(value)).map_err(located)?;

        // Repeated keys keep their first position but take the last value
        entries.insert(key.into_owned(), value.into_owned());
    }

    Ok(entries)
}

/// Blank and comment lines
fn is_skipped(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with('!')
}

/// A line continues when it ends with an odd number of backslashes
fn is_continued(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

/// Separator-free whitespace that ends a key
fn is_key_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000C}')
}

/// Split a logical line into raw key and raw value
///
/// The key ends at the first unescaped `=`, `:` or whitespace. Whitespace
/// around the separator is skipped, and a whitespace-ended key may still be
/// followed by one `=` or `:`.
fn split_entry(line: &str) -> (&str, &str) {
    let mut chars = line.char_indices();
    let mut key_end = line.len();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '=' | ':' => {
                key_end = pos;
                break;
            }
            c if is_key_space(c) => {
                key_end = pos;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start_matches(is_key_space);
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest).trim_start();
    (&line[..key_end], trim_value(rest))
}

/// Trim trailing whitespace, keeping one escaped whitespace character
fn trim_value(value: &str) -> &str {
    let trimmed = value.trim_end();
    if !is_continued(trimmed) {
        return trimmed;
    }
    let escaped = value[trimmed.len()..].chars().next().map_or(0, char::len_utf8);
    &value[..trimmed.len() + escaped]
}

/// Strip one pair of matching surrounding quotes
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Decode backslash escapes; any other escaped character stands for itself
fn unescape(text: &str) -> Result<Cow<'_, str>> {
    if !text.contains('\\') {
        return Ok(Cow::Borrowed(text));
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => out.push(unicode_escape(&mut chars)?),
            Some(other) => out.push(other),
            // A lone trailing backslash is dropped
            None => {}
        }
    }

    Ok(Cow::Owned(out))
}

/// Decode the digits of a `\uXXXX` escape, joining UTF-16 surrogate pairs
fn unicode_escape(chars: &mut Chars<'_>) -> Result<char> {
    let high = code_unit(chars)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(u32::from(high)).ok_or_else(|| malformed_unicode(high));
    }

    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(malformed_unicode(high));
    }
    let low = code_unit(chars)?;
    char::decode_utf16([high, low])
        .next()
        .and_then(|decoded| decoded.ok())
        .ok_or_else(|| malformed_unicode(low))
}

fn code_unit(chars: &mut Chars<'_>) -> Result<u16> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::parse(format!("Malformed \\uXXXX escape: \\u{}", digits))
            .with_help("Unicode escapes need exactly four hex digits"));
    }
    u16::from_str_radix(&digits, 16)
        .map_err(|e| Error::parse(format!("Malformed \\uXXXX escape: {}", e)))
}

fn malformed_unicode(unit: u16) -> Error {
    Error::parse(format!("Invalid unicode escape: \\u{:04X}", unit))
        .with_help("Surrogates must come in high/low \\uXXXX pairs")
}
