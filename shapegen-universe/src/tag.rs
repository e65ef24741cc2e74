//! Field metadata tags.
//!
//! A tag is a raw annotation string made of space-separated `key:"value"`
//! pairs, where each value is a comma-separated list: a leading primary value
//! followed by flags, e.g. `json:"name,omitempty" gen:",skip"`.
//!
//! Parsing is best effort. A malformed tag yields the pairs that precede the
//! first syntax error and never fails.

use std::fmt;

/// Raw metadata tag attached to a record field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Wraps a raw tag string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses all well-formed `key:"value"` pairs in order.
    ///
    /// Pairs whose value holds an invalid escape are left out; later pairs
    /// are still returned.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        raw_pairs(&self.0)
            .into_iter()
            .filter_map(|(key, quoted)| Some((key.to_string(), unquote(quoted)?)))
            .collect()
    }

    /// Returns the full value for the first occurrence of `key`, if present.
    ///
    /// Only that value is decoded. A value with an invalid escape counts as
    /// absent.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<String> {
        raw_pairs(&self.0)
            .into_iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, quoted)| unquote(quoted))
    }

    /// Returns true if the tag carries `key`, even with an empty value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns the comma-separated tokens of `key`'s value.
    #[must_use]
    pub fn values(&self, key: &str) -> Vec<String> {
        self.lookup(key)
            .map(|value| value.split(',').map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns the primary (first comma-separated) value for `key`, or an
    /// empty string when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> String {
        self.values(key).into_iter().next().unwrap_or_default()
    }

    /// Returns true if `flag` appears among the values following the primary
    /// value of `key`. Comparison is case-insensitive.
    #[must_use]
    pub fn has_flag(&self, key: &str, flag: &str) -> bool {
        let flag = flag.to_lowercase();
        self.values(key)
            .iter()
            .skip(1)
            .any(|value| value.to_lowercase() == flag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Tag {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Splits a tag into `(key, quoted value)` pairs without decoding values.
///
/// Stops at the first syntax error.
fn raw_pairs(tag: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut rest = tag;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        let bytes = rest.as_bytes();
        let key_len = bytes
            .iter()
            .position(|&b| b <= b' ' || b == b':' || b == b'"' || b == 0x7f)
            .unwrap_or(bytes.len());
        if key_len == 0 || !rest[key_len..].starts_with(":\"") {
            break;
        }
        let key = &rest[..key_len];
        let value = &rest[key_len + 1..];

        // Scan to the closing quote, stepping over escaped characters.
        let value_bytes = value.as_bytes();
        let mut i = 1;
        while i < value_bytes.len() && value_bytes[i] != b'"' {
            if value_bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= value_bytes.len() {
            break;
        }

        pairs.push((key, &value[..=i]));
        rest = &value[i + 1..];
    }

    pairs
}

/// Decodes a complete double-quoted string.
///
/// Supports `\a \b \f \n \r \t \v \\ \"`, octal `\NNN`, `\xNN`,
/// `\uNNNN` and `\UNNNNNNNN`. Returns `None` on any other escape, on a raw
/// newline, or if the decoded bytes are not UTF-8.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                'a' => out.push(0x07),
                'b' => out.push(0x08),
                'f' => out.push(0x0c),
                'n' => out.push(b'\n'),
                'r' => out.push(b'\r'),
                't' => out.push(b'\t'),
                'v' => out.push(0x0b),
                '\\' => out.push(b'\\'),
                '"' => out.push(b'"'),
                'x' => out.push(u8::try_from(hex_digits(&mut chars, 2)?).ok()?),
                'u' => push_char(&mut out, char::from_u32(hex_digits(&mut chars, 4)?)?),
                'U' => push_char(&mut out, char::from_u32(hex_digits(&mut chars, 8)?)?),
                first @ '0'..='7' => {
                    let mut value = first.to_digit(8)?;
                    for _ in 0..2 {
                        value = value * 8 + chars.next()?.to_digit(8)?;
                    }
                    out.push(u8::try_from(value).ok()?);
                }
                _ => return None,
            },
            '"' | '\n' => return None,
            _ => push_char(&mut out, c),
        }
    }

    String::from_utf8(out).ok()
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut value = 0;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries() {
        let tag = Tag::new(r#"json:"name,omitempty"  gen:",skip" db:"""#);
        assert_eq!(
            tag.entries(),
            vec![
                ("json".to_string(), "name,omitempty".to_string()),
                ("gen".to_string(), ",skip".to_string()),
                ("db".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_has_and_get() {
        let tag = Tag::new(r#"json:"name,omitempty" db:"""#);
        assert!(tag.has("json"));
        assert!(tag.has("db"));
        assert!(!tag.has("xml"));
        assert_eq!(tag.get("json"), "name");
        assert_eq!(tag.get("db"), "");
        assert_eq!(tag.get("xml"), "");
    }

    #[test]
    fn test_has_flag_case_insensitive() {
        let tag = Tag::new(r#"gen:"-,Skip,readonly""#);
        assert!(tag.has_flag("gen", "skip"));
        assert!(tag.has_flag("gen", "READONLY"));
        assert!(!tag.has_flag("gen", "-"));
        assert!(!tag.has_flag("json", "skip"));
    }

    #[test]
    fn test_primary_value_is_not_a_flag() {
        let tag = Tag::new(r#"gen:"skip""#);
        assert!(!tag.has_flag("gen", "skip"));
        assert_eq!(tag.values("gen"), vec!["skip".to_string()]);
    }

    #[test]
    fn test_escaped_quotes() {
        let tag = Tag::new(r#"doc:"say \"hi\"" json:"x""#);
        assert_eq!(tag.lookup("doc").as_deref(), Some(r#"say "hi""#));
        assert_eq!(tag.get("json"), "x");
    }

    #[test]
    fn test_escape_in_other_key_keeps_later_pairs() {
        let tag = Tag::new(r#"doc:"caf\u00e9" gen:",skip""#);
        assert!(tag.has_flag("gen", "skip"));
        assert_eq!(tag.lookup("doc").as_deref(), Some("caf\u{e9}"));
    }

    #[test]
    fn test_invalid_escape_hides_only_its_key() {
        let tag = Tag::new(r#"doc:"bad \q escape" gen:",skip""#);
        assert!(!tag.has("doc"));
        assert!(tag.has_flag("gen", "skip"));
        assert_eq!(tag.entries(), vec![("gen".to_string(), ",skip".to_string())]);
    }

    #[test]
    fn test_escape_forms() {
        let tag = Tag::new(r#"a:"\x41\101\U0001F600" b:"\a\b\f\v\t" c:"\xff""#);
        assert_eq!(tag.get("a"), "AA\u{1F600}");
        assert_eq!(tag.get("b"), "\u{7}\u{8}\u{c}\u{b}\t");
        // A lone high byte is not UTF-8.
        assert!(!tag.has("c"));
    }

    #[test]
    fn test_malformed_tags_yield_prefix() {
        assert!(Tag::new("").entries().is_empty());
        assert!(Tag::new("not a tag").entries().is_empty());
        assert!(Tag::new(r#"json:"unterminated"#).entries().is_empty());

        let tag = Tag::new(r#"json:"ok" broken db:"x""#);
        assert_eq!(tag.entries().len(), 1);
        assert!(!tag.has("db"));
    }

    #[test]
    fn test_display_is_raw() {
        let raw = r#"json:"name""#;
        assert_eq!(Tag::from(raw).to_string(), raw);
    }
}
