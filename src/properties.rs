//! Property sets and the Java `.properties` text format.
//!
//! The agent reads its configuration through `java.util.Properties`, so the
//! reader and writer here follow that format: `#`/`!` comments, `=`/`:`/
//! whitespace separators, backslash line continuations and `\uXXXX` escapes.
//! Keys are kept sorted so a written set is byte-stable for identical input.
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use thiserror::Error;

/// Namespace every agent property lives under.
pub const GRINDER_PREFIX: &str = "grinder.";
/// Property holding the agent JVM classpath.
pub const CLASSPATH_KEY: &str = "grinder.jvm.classpath";
/// Property holding the agent log directory.
pub const LOG_DIRECTORY_KEY: &str = "grinder.logDirectory";
/// Property holding the script (or comma-separated script list) to run.
pub const SCRIPT_KEY: &str = "grinder.script";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Key/value configuration with unique keys; the last write to a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertySet {
    entries: BTreeMap<String, String>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// Overlay every pair whose key starts with `prefix`; returns how many
    /// pairs were applied.
    pub fn overlay_prefixed<'a, I>(&mut self, prefix: &str, source: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut applied = 0;
        for (key, value) in source.into_iter().filter(|(key, _)| key.starts_with(prefix)) {
            tracing::debug!(key, value, "overlay property");
            self.set(key, value);
            applied += 1;
        }
        applied
    }

    /// Render the set in `.properties` format with a leading comment line.
    pub fn to_properties_string(&self, comment: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(comment) = comment {
            for line in comment.lines() {
                out.push('#');
                out.push_str(line);
                out.push('\n');
            }
        }
        for (key, value) in self.iter() {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parse `.properties` text into a set.
pub fn parse_properties(text: &str) -> Result<PropertySet, ParseError> {
    let mut set = PropertySet::new();
    let mut lines = text.lines().enumerate();
    while let Some((index, raw)) = lines.next() {
        let line = raw.trim_start_matches(is_blank);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let mut logical = line.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }
        let (key, value) = split_key_value(&logical);
        let key = unescape(key).map_err(|message| ParseError {
            line: index + 1,
            message,
        })?;
        let value = unescape(value).map_err(|message| ParseError {
            line: index + 1,
            message,
        })?;
        set.set(key, value);
    }
    Ok(set)
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\x0c')
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|ch| *ch == '\\').count();
    trailing % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '=' || ch == ':' {
            let value = line[idx + 1..].trim_start_matches(is_blank);
            return (&line[..idx], value);
        }
        if is_blank(ch) {
            let rest = line[idx..].trim_start_matches(is_blank);
            let rest = rest
                .strip_prefix('=')
                .or_else(|| rest.strip_prefix(':'))
                .map(|value| value.trim_start_matches(is_blank))
                .unwrap_or(rest);
            return (&line[..idx], rest);
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let unit = read_code_unit(&mut chars)?;
                if (0xD800..0xDC00).contains(&unit) {
                    let low = match (chars.next(), chars.next()) {
                        (Some('\\'), Some('u')) => read_code_unit(&mut chars)?,
                        _ => return Err("unpaired surrogate in \\u escape".to_string()),
                    };
                    let decoded = char::decode_utf16([unit, low])
                        .next()
                        .and_then(|result| result.ok())
                        .ok_or_else(|| "invalid surrogate pair in \\u escape".to_string())?;
                    out.push(decoded);
                } else {
                    let decoded = char::from_u32(u32::from(unit))
                        .ok_or_else(|| format!("invalid \\u{unit:04x} escape"))?;
                    out.push(decoded);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn read_code_unit(chars: &mut std::str::Chars<'_>) -> Result<u16, String> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 {
        return Err("malformed \\uxxxx encoding".to_string());
    }
    u16::from_str_radix(&digits, 16).map_err(|_| format!("malformed \\u{digits} encoding"))
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.chars().enumerate() {
        match ch {
            ' ' if idx == 0 || is_key => out.push_str("\\ "),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ch if (' '..='~').contains(&ch) => out.push(ch),
            ch => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_comments_and_continuations() {
        let text = "# comment\n! bang comment\n\n  grinder.threads = 5\ngrinder.runs:10\ngrinder.processes 2\ngrinder.jvm.arguments=-Xmx64m \\\n    -Dfoo=bar\nempty\n";
        let set = parse_properties(text).expect("parse");
        assert_eq!(set.get("grinder.threads"), Some("5"));
        assert_eq!(set.get("grinder.runs"), Some("10"));
        assert_eq!(set.get("grinder.processes"), Some("2"));
        assert_eq!(set.get("grinder.jvm.arguments"), Some("-Xmx64m -Dfoo=bar"));
        assert_eq!(set.get("empty"), Some(""));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn later_duplicate_keys_win() {
        let set = parse_properties("a=1\na=2\n").expect("parse");
        assert_eq!(set.get("a"), Some("2"));
    }

    #[test]
    fn decodes_escapes() {
        let set = parse_properties("key\\ with\\:colon=tab\\there\\u00e9\n").expect("parse");
        assert_eq!(set.get("key with:colon"), Some("tab\there\u{e9}"));
    }

    #[test]
    fn rejects_malformed_unicode_escape() {
        let err = parse_properties("a=ok\nb=\\u12\n").expect_err("malformed");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn writes_sorted_escaped_output_that_reads_back() {
        let mut set = PropertySet::new();
        set.set("grinder.script", "b.py");
        set.set("grinder.jvm.classpath", "C:/lib/a.jar;C:/lib/b.jar");
        set.set("odd key", " leading\u{e9}#");

        let text = set.to_properties_string(Some("Grinder Agent Properties for b.py"));
        assert_eq!(
            text,
            "#Grinder Agent Properties for b.py\n\
             grinder.jvm.classpath=C\\:/lib/a.jar;C\\:/lib/b.jar\n\
             grinder.script=b.py\n\
             odd\\ key=\\ leading\\u00E9\\#\n"
        );
        assert_eq!(parse_properties(&text).expect("reparse"), set);
    }

    #[test]
    fn overlay_prefixed_ignores_foreign_keys() {
        let mut set = PropertySet::new();
        set.set("grinder.threads", "5");
        let applied = set.overlay_prefixed(
            GRINDER_PREFIX,
            [("grinder.threads", "10"), ("java.home", "/opt/jdk")],
        );
        assert_eq!(applied, 1);
        assert_eq!(set.get("grinder.threads"), Some("10"));
        assert!(!set.contains_key("java.home"));
    }
}
