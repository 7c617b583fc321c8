//! Text canonicalization for phrase matching
//!
//! Two strengths are provided. Loose normalization keeps word boundaries and
//! is used for likely-exact matching; tight normalization keeps only letters
//! and digits and is the fuzzy fallback. Both record, for every output char,
//! the char offset in the source text that produced it, so matches found in
//! normalized space map back onto the original run text.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalized text plus its mapping back to source char offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    text: String,
    source: Vec<usize>,
}

impl NormalizedText {
    fn from_pairs(pairs: Vec<(char, usize)>) -> Self {
        let mut text = String::with_capacity(pairs.len());
        let mut source = Vec::with_capacity(pairs.len());
        for (c, offset) in pairs {
            text.push(c);
            source.push(offset);
        }
        Self { text, source }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Source offset of the normalized char at `index`.
    pub fn source_offset(&self, index: usize) -> Option<usize> {
        self.source.get(index).copied()
    }

    /// Maps the normalized char range `[start, end)` back to a source range.
    ///
    /// The source end is one past the source char that produced the last
    /// normalized char, clamped to `source_len`.
    pub fn source_range(&self, start: usize, end: usize, source_len: usize) -> Option<(usize, usize)> {
        if start >= end {
            return None;
        }
        let first = self.source_offset(start)?;
        let last = self.source_offset(end.min(self.len()).checked_sub(1)?)?;
        let source_end = (last + 1).min(source_len);
        (first < source_end).then_some((first, source_end))
    }

    /// Char index of the first occurrence of `needle` at or after char `from`.
    pub fn find_from(&self, needle: &str, from: usize) -> Option<usize> {
        if needle.is_empty() || from >= self.len() {
            return None;
        }
        let byte_from = self
            .text
            .char_indices()
            .nth(from)
            .map(|(byte, _)| byte)?;
        let byte_hit = self.text[byte_from..].find(needle)? + byte_from;
        Some(from + self.text[byte_from..byte_hit].chars().count())
    }

    pub fn find(&self, needle: &str) -> Option<usize> {
        self.find_from(needle, 0)
    }
}

pub fn normalize_loose(text: &str) -> String {
    loose_mapped(text).into_string()
}

pub fn normalize_tight(text: &str) -> String {
    tight_mapped(text).into_string()
}

/// Loose normalization with source mapping.
///
/// Steps, in order: strip zero-width chars, unify quotes and dashes, split
/// lower→upper case boundaries, collapse whitespace, re-space punctuation,
/// trim, lowercase.
pub fn loose_mapped(text: &str) -> NormalizedText {
    let pairs: Vec<(char, usize)> = text
        .chars()
        .enumerate()
        .filter(|(_, c)| !is_zero_width(*c))
        .map(|(offset, c)| (unify_punctuation(c), offset))
        .collect();

    let pairs = split_case_boundaries(pairs);
    let pairs = collapse_whitespace(pairs);
    let pairs = respace_punctuation(pairs);
    let pairs = trim_spaces(pairs);

    let lowered = pairs
        .into_iter()
        .flat_map(|(c, offset)| c.to_lowercase().map(move |lower| (lower, offset)))
        .collect();

    NormalizedText::from_pairs(lowered)
}

/// Tight normalization with source mapping.
///
/// Each source char contributes zero or more tight chars: lowercased,
/// decomposed with combining marks dropped, letters and digits only.
pub fn tight_mapped(text: &str) -> NormalizedText {
    let pairs = text
        .chars()
        .enumerate()
        .flat_map(|(offset, c)| fold_tight(c).map(move |folded| (folded, offset)))
        .collect();

    NormalizedText::from_pairs(pairs)
}

fn fold_tight(c: char) -> impl Iterator<Item = char> {
    c.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && c.is_alphanumeric())
}

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
    )
}

fn unify_punctuation(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
        '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
        _ => c,
    }
}

fn is_spaced_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | ';' | ':' | '!' | '?')
}

fn split_case_boundaries(pairs: Vec<(char, usize)>) -> Vec<(char, usize)> {
    let mut out = Vec::with_capacity(pairs.len() + pairs.len() / 8);
    let mut prev_lower = false;
    for (c, offset) in pairs {
        if prev_lower && c.is_uppercase() {
            out.push((' ', offset));
        }
        prev_lower = c.is_lowercase();
        out.push((c, offset));
    }
    out
}

fn collapse_whitespace(pairs: Vec<(char, usize)>) -> Vec<(char, usize)> {
    let mut out: Vec<(char, usize)> = Vec::with_capacity(pairs.len());
    for (c, offset) in pairs {
        if c.is_whitespace() {
            if !matches!(out.last(), Some((' ', _))) {
                out.push((' ', offset));
            }
        } else {
            out.push((c, offset));
        }
    }
    out
}

fn respace_punctuation(pairs: Vec<(char, usize)>) -> Vec<(char, usize)> {
    let mut out: Vec<(char, usize)> = Vec::with_capacity(pairs.len());
    let mut iter = pairs.into_iter().peekable();

    while let Some((c, offset)) = iter.next() {
        if !is_spaced_punctuation(c) {
            out.push((c, offset));
            continue;
        }

        while matches!(out.last(), Some((' ', _))) {
            out.pop();
        }
        out.push((c, offset));

        if let Some((next, _)) = iter.peek() {
            if *next != ' ' && !is_spaced_punctuation(*next) {
                out.push((' ', offset));
            }
        }
    }
    out
}

fn trim_spaces(mut pairs: Vec<(char, usize)>) -> Vec<(char, usize)> {
    while matches!(pairs.last(), Some((' ', _))) {
        pairs.pop();
    }
    let leading = pairs.iter().take_while(|(c, _)| *c == ' ').count();
    pairs.drain(..leading);
    pairs
}

/// Substring by char offsets, clamped to the text.
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    if end <= start {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}
