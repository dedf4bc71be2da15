//! Reader and writer for `.properties` sidecar documents.
//!
//! The format is the line-oriented `key=value` text used by Java's
//! `java.util.Properties`: ISO-8859-1 bytes, `#`/`!` comments, `=`, `:` or
//! whitespace separators, backslash line continuations, and `\uXXXX`
//! escapes for everything outside printable ASCII. Records written by older
//! deployments of the service are in this format, so both directions follow
//! it exactly.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::Utc;
use thiserror::Error;

/// Errors raised while parsing a properties document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertiesError {
    /// A `\u` escape not followed by four hex digits.
    #[error("malformed \\uxxxx encoding in line {0:?}")]
    MalformedUnicodeEscape(String),
}

/// An ordered set of string properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any existing value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert into a key-ordered map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.entries.into_iter().collect()
    }

    /// Parse a document from raw ISO-8859-1 bytes.
    pub fn from_latin1(bytes: &[u8]) -> Result<Self, PropertiesError> {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Self::parse(&text)
    }

    /// Parse a document whose bytes have already been decoded to characters.
    pub fn parse(input: &str) -> Result<Self, PropertiesError> {
        let mut props = Self::new();
        for line in logical_lines(input) {
            let (key, value) = split_key_value(&line);
            let malformed = || PropertiesError::MalformedUnicodeEscape(line.clone());
            let key = unescape(key).ok_or_else(malformed)?;
            let value = unescape(value).ok_or_else(malformed)?;
            props.set(key, value);
        }
        Ok(props)
    }

    /// Write the document: an optional comment line, a timestamp comment,
    /// then one `key=value` line per property.
    ///
    /// The output is pure ASCII and therefore also valid ISO-8859-1.
    pub fn store<W: Write>(&self, mut writer: W, comments: Option<&str>) -> io::Result<()> {
        if let Some(comments) = comments {
            write_comments(&mut writer, comments)?;
        }
        writeln!(writer, "#{}", Utc::now().format("%a %b %d %H:%M:%S UTC %Y"))?;
        for (key, value) in &self.entries {
            writeln!(writer, "{}={}", escape(key, true), escape(value, false))?;
        }
        writer.flush()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// Split input on `\n`, `\r\n` or a lone `\r`.
fn natural_lines(input: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&input[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&input[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < input.len() {
        lines.push(&input[start..]);
    }
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Join continuation lines and drop blank and comment lines.
fn logical_lines(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines = natural_lines(input).into_iter();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }
        out.push(logical);
    }
    out
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut has_separator = false;
    let mut preceding_backslash = false;

    for (i, c) in line.char_indices() {
        if !preceding_backslash && (c == '=' || c == ':') {
            key_end = i;
            value_start = i + 1;
            has_separator = true;
            break;
        }
        if !preceding_backslash && is_blank(c) {
            key_end = i;
            value_start = i + 1;
            break;
        }
        preceding_backslash = c == '\\' && !preceding_backslash;
    }

    let rest = &line[value_start..];
    let mut skip = 0;
    for (i, c) in rest.char_indices() {
        if is_blank(c) {
            skip = i + 1;
            continue;
        }
        if !has_separator && (c == '=' || c == ':') {
            has_separator = true;
            skip = i + 1;
            continue;
        }
        break;
    }

    (&line[..key_end], &rest[skip..])
}

/// Resolve backslash escapes. Returns `None` on a malformed `\u` escape.
fn unescape(raw: &str) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'u' => {
                let mut value: u16 = 0;
                for _ in 0..4 {
                    let digit = chars.next()?.to_digit(16)?;
                    value = (value << 4) | digit as u16;
                }
                units.push(value);
            }
            't' => units.push('\t' as u16),
            'r' => units.push('\r' as u16),
            'n' => units.push('\n' as u16),
            'f' => units.push(0x0c),
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
            }
        }
    }

    Some(String::from_utf16_lossy(&units))
}

/// Escape a key (`escape_space = true`) or value for output.
fn escape(s: &str, escape_space: bool) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for (i, unit) in s.encode_utf16().enumerate() {
        match unit {
            0x5c => out.push_str("\\\\"),
            0x20 if i == 0 || escape_space => out.push_str("\\ "),
            0x09 => out.push_str("\\t"),
            0x0a => out.push_str("\\n"),
            0x0d => out.push_str("\\r"),
            0x0c => out.push_str("\\f"),
            0x3d | 0x3a | 0x23 | 0x21 => {
                out.push('\\');
                out.push(unit as u8 as char);
            }
            0x20..=0x7e => out.push(unit as u8 as char),
            _ => out.push_str(&format!("\\u{unit:04X}")),
        }
    }
    out
}

fn write_comments<W: Write>(writer: &mut W, comments: &str) -> io::Result<()> {
    for line in natural_lines(comments) {
        let mut escaped = String::with_capacity(line.len());
        for unit in line.encode_utf16() {
            if (0x20..=0x7e).contains(&unit) {
                escaped.push(unit as u8 as char);
            } else {
                escaped.push_str(&format!("\\u{unit:04X}"));
            }
        }
        writeln!(writer, "#{escaped}")?;
    }
    Ok(())
}
