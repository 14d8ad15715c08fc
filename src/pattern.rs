//! Module `pattern` implement the wildcard pattern parser.

use crate::utf8;

/// One maximal `%`-free run of a pattern. May contain `_`, which
/// counts as one character.
#[derive(Clone, Debug, PartialEq)]
pub struct Part {
    pub bytes: Vec<u8>,
    pub n_chars: usize,
}

/// Parsed pattern: the `%`-separated parts and the two boundary flags.
///
/// Consecutive `%` collapse into one. `""` parses to no parts with
/// both flags false, `"%"` to no parts with both flags true. Parsing
/// is total.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub parts: Vec<Part>,
    pub starts_percent: bool,
    pub ends_percent: bool,
}

pub fn parse(pattern: &[u8]) -> Pattern {
    // splitting on the raw byte is utf8-safe, 0x25 never occurs as a
    // continuation byte.
    let starts_percent = pattern.first() == Some(&b'%');
    let ends_percent = pattern.last() == Some(&b'%');
    let mut parts = Vec::new();
    for run in pattern.split(|b| *b == b'%') {
        if !run.is_empty() {
            parts.push(Part { bytes: run.to_vec(), n_chars: utf8::char_count(run) });
        }
    }
    Pattern { parts, starts_percent, ends_percent }
}

/// Census of a pure-wildcard pattern, `Some((underscores, any_percent))`
/// when the pattern contains nothing but `%` and `_`.
pub fn wildcard_only(pattern: &[u8]) -> Option<(usize, bool)> {
    let (mut underscores, mut any_percent) = (0, false);
    for b in pattern.iter() {
        match b {
            b'_' => underscores += 1,
            b'%' => any_percent = true,
            _ => return None,
        }
    }
    Some((underscores, any_percent))
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod pattern_test;
