//! Placeholder grammar and matcher
//!
//! A token has the shape
//!
//! ```text
//! {{ name }}
//! {{ name: param }}
//! {{ name | modifier | ?modifier }}
//! {{ name: param | modifier }}
//! ```
//!
//! The name is a run of ASCII word characters. The parameter runs up to the
//! first `|` or `}` and is trimmed. The modifier chain runs up to the closing
//! braces; each entry is trimmed and may carry a leading `?` marking it as
//! optional. Text that does not fit the grammar is never a token and is
//! passed through untouched.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

const TOKEN_PATTERN: &str =
    r"\{\{\s*([0-9A-Za-z_]+)(?:\s*:\s*([^}|]+))?(?:\s*\|\s*([^}]+))?\s*\}\}";

static EMBEDDED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex"));

static WHOLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\A{}\z", TOKEN_PATTERN)).expect("token pattern is a valid regex")
});

/// A matched placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The full matched text, braces included
    pub raw: &'a str,
    /// Macro name
    pub name: &'a str,
    /// Trimmed parameter, if a `:` section was present
    pub parameter: Option<&'a str>,
    /// Trimmed modifier chain, if a `|` section was present
    pub modifiers: Option<&'a str>,
    /// Byte offset of the token start in the scanned text
    pub start: usize,
    /// Byte offset just past the token end
    pub end: usize,
}

impl<'a> Token<'a> {
    fn from_captures(captures: &Captures<'a>) -> Option<Self> {
        let whole = captures.get(0)?;
        Some(Self {
            raw: whole.as_str(),
            name: captures.get(1)?.as_str(),
            parameter: captures.get(2).map(|m| m.as_str().trim()),
            modifiers: captures.get(3).map(|m| m.as_str().trim()),
            start: whole.start(),
            end: whole.end(),
        })
    }

    /// Returns the steps of the modifier chain, in application order
    pub fn modifier_steps(self) -> impl Iterator<Item = ModifierStep<'a>> {
        self.modifiers
            .into_iter()
            .flat_map(|chain| chain.split('|'))
            .map(ModifierStep::parse)
    }
}

/// One entry of a modifier chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierStep<'a> {
    /// Modifier name with the optional marker removed
    pub name: &'a str,
    /// True if the entry was prefixed with `?`
    pub optional: bool,
}

impl<'a> ModifierStep<'a> {
    /// Parses a single chain entry such as ` ?base64 `
    pub fn parse(entry: &'a str) -> Self {
        let entry = entry.trim();
        Self {
            name: entry.trim_start_matches('?'),
            optional: entry.starts_with('?'),
        }
    }
}

/// Matches the text only if it consists of exactly one token
pub fn match_whole(text: &str) -> Option<Token<'_>> {
    WHOLE_TOKEN
        .captures(text)
        .and_then(|captures| Token::from_captures(&captures))
}

/// Iterates over every non-overlapping token, left to right
pub fn scan(text: &str) -> impl Iterator<Item = Token<'_>> + '_ {
    EMBEDDED_TOKEN
        .captures_iter(text)
        .filter_map(|captures| Token::from_captures(&captures))
}

/// Replaces every token with the text produced by `render`
///
/// Text between tokens is copied unchanged. When the text holds no token the
/// input is returned borrowed.
pub fn substitute<'t, F>(text: &'t str, mut render: F) -> Cow<'t, str>
where
    F: FnMut(&Token<'_>) -> String,
{
    EMBEDDED_TOKEN.replace_all(text, |captures: &Captures<'_>| {
        Token::from_captures(captures)
            .map(|token| render(&token))
            .unwrap_or_else(|| captures[0].to_string())
    })
}

/// Returns true if the text contains at least one token
pub fn contains_token(text: &str) -> bool {
    EMBEDDED_TOKEN.is_match(text)
}
