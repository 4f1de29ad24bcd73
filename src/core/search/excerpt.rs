//! Excerpt (snippet) generation.
//!
//! Highlights query terms in arbitrary documents and keeps a few
//! words of context around each hit. Works on char boundaries only,
//! so multi-byte text never panics.

use crate::core::search::query::{query_terms, WORD_PATTERN};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Excerpt formatting options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptOptions {
    #[serde(default = "default_before_match")]
    pub before_match: String,

    #[serde(default = "default_after_match")]
    pub after_match: String,

    #[serde(default = "default_chunk_separator")]
    pub chunk_separator: String,

    /// Maximum excerpt length in characters (markup excluded)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Words of context kept around each hit
    #[serde(default = "default_around")]
    pub around: usize,

    /// Remove HTML tags before highlighting
    #[serde(default)]
    pub strip_html: bool,
}

fn default_before_match() -> String {
    "<b>".to_string()
}

fn default_after_match() -> String {
    "</b>".to_string()
}

fn default_chunk_separator() -> String {
    " ... ".to_string()
}

fn default_limit() -> usize {
    256
}

fn default_around() -> usize {
    5
}

impl Default for ExcerptOptions {
    fn default() -> Self {
        Self {
            before_match: default_before_match(),
            after_match: default_after_match(),
            chunk_separator: default_chunk_separator(),
            limit: default_limit(),
            around: default_around(),
            strip_html: false,
        }
    }
}

/// Remove HTML tags
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").into_owned()
}

/// Build one excerpt per document for the given query
pub fn build_excerpts(docs: &[String], query: &str, options: &ExcerptOptions) -> Vec<String> {
    let terms: HashSet<String> = query_terms(query).into_iter().collect();
    docs.iter()
        .map(|doc| build_excerpt(doc, &terms, options))
        .collect()
}

fn build_excerpt(doc: &str, terms: &HashSet<String>, options: &ExcerptOptions) -> String {
    let text = if options.strip_html {
        strip_tags(doc)
    } else {
        doc.to_string()
    };

    let words: Vec<(usize, usize)> = WORD_PATTERN
        .find_iter(&text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let is_hit =
        |&(start, end): &(usize, usize)| terms.contains(&text[start..end].to_lowercase());

    let hits: Vec<usize> = (0..words.len()).filter(|&i| is_hit(&words[i])).collect();
    if hits.is_empty() || options.limit == 0 {
        return truncate_chars(&text, options.limit);
    }

    // Merge overlapping context windows around hits
    let mut windows: Vec<(usize, usize)> = Vec::new();
    for &hit in &hits {
        let lo = hit.saturating_sub(options.around);
        let hi = (hit + options.around).min(words.len() - 1);
        match windows.last_mut() {
            Some(last) if lo <= last.1 + 1 => last.1 = last.1.max(hi),
            _ => windows.push((lo, hi)),
        }
    }

    let span_len = |lo: usize, hi: usize| text[words[lo].0..words[hi].1].chars().count();

    // The first window always shows, trimmed toward its first hit
    if let Some(first) = windows.first_mut() {
        let anchor = hits[0];
        while first.0 < first.1 && span_len(first.0, first.1) > options.limit {
            if anchor - first.0 > first.1 - anchor {
                first.0 += 1;
            } else {
                first.1 -= 1;
            }
        }
    }

    let mut passages = Vec::new();
    let mut used = 0;
    for (lo, hi) in windows {
        let plain_len = span_len(lo, hi);
        if !passages.is_empty() && used + plain_len > options.limit {
            break;
        }

        if plain_len > options.limit {
            // A lone hit longer than the limit
            let word = &text[words[lo].0..words[lo].1];
            passages.push(format!(
                "{}{}{}",
                options.before_match,
                truncate_chars(word, options.limit),
                options.after_match
            ));
            break;
        }
        used += plain_len;

        let mut passage = String::new();
        let mut cursor = words[lo].0;
        for word in &words[lo..=hi] {
            passage.push_str(&text[cursor..word.0]);
            if is_hit(word) {
                passage.push_str(&options.before_match);
                passage.push_str(&text[word.0..word.1]);
                passage.push_str(&options.after_match);
            } else {
                passage.push_str(&text[word.0..word.1]);
            }
            cursor = word.1;
        }
        passages.push(passage);
    }

    passages.join(&options.chunk_separator)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
