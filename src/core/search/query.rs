//! Query text preparation per match mode.
//!
//! The simple modes (all, any, phrase) reduce the text to plain
//! words so that stray syntax characters never reach the parser.
//! Boolean and extended modes pass the text through after a light
//! preprocessing step:
//! - Curly braces are escaped: `{id}` -> `\{id\}`
//! - Multi-colon identifiers are quoted: `pkg:scope:name` -> `"pkg:scope:name"`
//! - Boolean shorthands are translated: `&` -> `AND`, `|` -> `OR`, `!` -> `-`
//!
//! Extended mode additionally validates `field:` prefixes against the
//! fields declared for the index.

use crate::core::error::{BridgeError, Result};
use crate::core::search::options::MatchMode;
use once_cell::sync::Lazy;
use regex::Regex;

/// A run of word characters
pub(crate) static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

static MULTI_COLON_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+:\w+:\w+").unwrap());

// Pattern to detect potential field prefixes (word:nonspace)
// We'll do additional validation in code to avoid look-behind
static FIELD_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+):([^\s:])").unwrap());

const OPERATORS: [&str; 3] = ["AND", "OR", "NOT"];

/// Query text ready for the backend parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedQuery {
    /// Match every document
    MatchAll,
    /// Parse `text`; `conjunction` makes bare terms required
    Parse { text: String, conjunction: bool },
}

/// Lowercased search terms of a query, without boolean operators.
///
/// Also used to find the words to highlight in excerpts.
pub fn query_terms(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| !OPERATORS.contains(w))
        .map(str::to_lowercase)
        .collect()
}

/// Prepare query text for the given match mode.
///
/// `fields` lists the full-text fields of the searched index; it is
/// only consulted in extended mode.
pub fn prepare_query(text: &str, mode: MatchMode, fields: &[String]) -> Result<PreparedQuery> {
    let trimmed = text.trim();
    if trimmed.is_empty() || mode == MatchMode::FullScan {
        return Ok(PreparedQuery::MatchAll);
    }

    let parse = |text: String, conjunction: bool| Ok(PreparedQuery::Parse { text, conjunction });

    match mode {
        MatchMode::All | MatchMode::Any | MatchMode::Phrase => {
            let terms = query_terms(trimmed);
            if terms.is_empty() {
                return Err(BridgeError::InvalidQuery(format!(
                    "Query '{trimmed}' has no searchable terms"
                )));
            }
            match mode {
                MatchMode::All => parse(terms.join(" "), true),
                MatchMode::Phrase if terms.len() > 1 => {
                    parse(format!("\"{}\"", terms.join(" ")), true)
                }
                _ => parse(terms.join(" "), mode == MatchMode::Phrase),
            }
        }
        MatchMode::Boolean => parse(preprocess_query(&translate_boolean(trimmed)), false),
        MatchMode::Extended => {
            validate_query_fields(trimmed, fields)?;
            parse(preprocess_query(trimmed), false)
        }
        MatchMode::FullScan => Ok(PreparedQuery::MatchAll),
    }
}

/// Translate `&`, `|` and `!` shorthands into parser operators
fn translate_boolean(query: &str) -> String {
    query
        .replace('&', " AND ")
        .replace('|', " OR ")
        .replace('!', "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Preprocess pass-through query text for parser compatibility.
///
/// Already-quoted strings only get their braces escaped.
pub fn preprocess_query(query: &str) -> String {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return trimmed.to_string();
    }

    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() > 1 {
        let inner = &trimmed[1..trimmed.len() - 1];
        let escaped = escape_braces(inner);
        return format!("\"{escaped}\"");
    }

    // Quote to prevent field prefix interpretation
    if MULTI_COLON_PATTERN.is_match(trimmed) {
        let escaped = escape_braces(trimmed);
        return format!("\"{escaped}\"");
    }

    escape_braces(trimmed)
}

fn escape_braces(s: &str) -> String {
    s.replace('{', "\\{").replace('}', "\\}")
}

/// Escape every query syntax character.
///
/// Escaped characters: : { } [ ] ( ) @ " \ + - ! ^ ~ *
pub fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for ch in s.chars() {
        match ch {
            ':' | '{' | '}' | '[' | ']' | '(' | ')' | '@' | '"' | '\\' | '+' | '-' | '!' | '^'
            | '~' | '*' => {
                result.push('\\');
                result.push(ch);
            }
            _ => result.push(ch),
        }
    }
    result
}

/// Validate that all field prefixes in a query name declared fields.
///
/// Returns [`BridgeError::InvalidQueryField`] with the valid fields and,
/// when one is close enough, a suggestion.
pub fn validate_query_fields(query: &str, fields: &[String]) -> Result<()> {
    let trimmed = query.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Ok(());
    }

    for cap in FIELD_PREFIX_PATTERN.captures_iter(query) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let field = name.as_str();

        // Only a prefix at the start or after whitespace is a field prefix
        if whole.start() > 0 {
            let prev_char = query[..whole.start()].chars().next_back().unwrap_or(' ');
            if !prev_char.is_whitespace() && prev_char != '(' {
                continue;
            }
        }

        if fields.iter().any(|f| f == field) {
            continue;
        }

        if matches!(field, "http" | "https" | "ftp" | "mailto") {
            continue;
        }

        return Err(BridgeError::InvalidQueryField {
            field: field.to_string(),
            message: format!("Valid fields: {}", fields.join(", ")),
            valid_fields: fields.to_vec(),
            suggestion: suggest_field(field, fields),
        });
    }

    Ok(())
}

/// Suggest a declared field for a mistyped one
fn suggest_field(field: &str, fields: &[String]) -> Option<String> {
    let lower = field.to_lowercase();
    fields
        .iter()
        .find(|f| f.to_lowercase() == lower)
        .or_else(|| {
            fields.iter().find(|f| {
                let f = f.to_lowercase();
                f.starts_with(&lower) || lower.starts_with(&f)
            })
        })
        .cloned()
}
