//! Module `matcher` implement single-column evaluation of one wildcard
//! pattern against a [ColumnIndex].
//!
//! The pattern shape selects among fast paths, anchored and
//! end-anchored matches, a substring scan and the recursive windowed
//! match. Evaluation never fails: a missing bitmap entry short
//! circuits to an empty result.

use std::{
    cmp,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    column::{Case, ColumnIndex, Half},
    db::Bitmap,
    pattern::{self, Part, Pattern},
    utf8,
};

/// Evaluate `pattern_bytes` against one column in the given case. For
/// the case-insensitive twin the caller lowercases the pattern first;
/// everything below then runs against the case-insensitive half and
/// the lowercased byte cache.
pub fn evaluate<B>(
    col: &ColumnIndex<B>,
    pattern_bytes: &[u8],
    case: Case,
    cancel: Option<&AtomicBool>,
) -> B
where
    B: Bitmap,
{
    let half = col.half(case);

    // fast paths, decided before parsing.
    if pattern_bytes.is_empty() {
        return half.length_eq(0);
    }
    if let Some((underscores, any_percent)) = pattern::wildcard_only(pattern_bytes) {
        return match any_percent {
            true => half.length_ge(underscores),
            false => half.length_eq(underscores),
        };
    }

    let pat = pattern::parse(pattern_bytes);
    match (pat.parts.len(), pat.starts_percent, pat.ends_percent) {
        // no parts is already handled above, every `%`-only pattern is
        // pure wildcard.
        (0, _, _) => half.length_ge(0),
        (1, false, false) => exact(half, &pat.parts[0]),
        (1, false, true) => part_at(half, &pat.parts[0], 0),
        (1, true, false) => part_at_end(half, &pat.parts[0]),
        (1, true, true) => substring(col, case, &pat.parts[0]),
        (2, false, false) => infix(half, &pat.parts[0], &pat.parts[1]),
        _ => windowed(half, &pat, cancel),
    }
}

fn exact<B: Bitmap>(half: &Half<B>, part: &Part) -> B {
    let mut res = part_at(half, part, 0);
    res.and_inplace(&half.length_eq(part.n_chars));
    res
}

fn infix<B: Bitmap>(half: &Half<B>, head: &Part, tail: &Part) -> B {
    let mut res = part_at(half, head, 0);
    if res.is_empty() {
        return res;
    }
    res.and_inplace(&part_at_end(half, tail));
    res.and_inplace(&half.length_ge(head.n_chars + tail.n_chars));
    res
}

// Match `part` with its first character at character position `start`.
// `_` advances the position without touching bitmaps; a concrete
// character intersects all of its per-byte bitmaps at the same
// position. The length floor keeps underscore-only tails honest.
pub(crate) fn part_at<B: Bitmap>(half: &Half<B>, part: &Part, start: usize) -> B {
    let bytes = &part.bytes;
    let mut res: Option<B> = None;
    let mut p = start as i64;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            i += 1;
            p += 1;
            continue;
        }
        let n = cmp::min(utf8::char_len(bytes[i]), bytes.len() - i);
        for j in i..(i + n) {
            let bitmap = match half.pos.get(bytes[j], p as i32) {
                Some(bitmap) => bitmap,
                None => return B::default(),
            };
            res = match res {
                Some(mut res) => {
                    res.and_inplace(bitmap);
                    Some(res)
                }
                None => Some(bitmap.clone()),
            };
        }
        if res.as_ref().map_or(false, |res| res.is_empty()) {
            return B::default();
        }
        i += n;
        p += 1;
    }
    let floor = half.length_ge(start + part.n_chars);
    match res {
        Some(mut res) => {
            res.and_inplace(&floor);
            res
        }
        None => floor,
    }
}

// End-anchored twin of part_at: the k-th character of the part sits at
// negative position k - n, the part's last character at -1.
pub(crate) fn part_at_end<B: Bitmap>(half: &Half<B>, part: &Part) -> B {
    let bytes = &part.bytes;
    let n = part.n_chars as i64;
    let mut res: Option<B> = None;
    let mut k = 0_i64;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' {
            i += 1;
            k += 1;
            continue;
        }
        let m = cmp::min(utf8::char_len(bytes[i]), bytes.len() - i);
        for j in i..(i + m) {
            let bitmap = match half.neg.get(bytes[j], (k - n) as i32) {
                Some(bitmap) => bitmap,
                None => return B::default(),
            };
            res = match res {
                Some(mut res) => {
                    res.and_inplace(bitmap);
                    Some(res)
                }
                None => Some(bitmap.clone()),
            };
        }
        if res.as_ref().map_or(false, |res| res.is_empty()) {
            return B::default();
        }
        i += m;
        k += 1;
    }
    let floor = half.length_ge(part.n_chars);
    match res {
        Some(mut res) => {
            res.and_inplace(&floor);
            res
        }
        None => floor,
    }
}

// `%part%`: bitmap membership alone cannot prove the characters are
// consecutive, candidates are verified against the cached bytes.
fn substring<B: Bitmap>(col: &ColumnIndex<B>, case: Case, part: &Part) -> B {
    let half = col.half(case);
    let first = match part.bytes.iter().copied().find(|b| *b != b'_') {
        Some(byte) => byte,
        None => return half.length_ge(part.n_chars),
    };
    let mut cand = half.presence(first).clone();
    cand.and_inplace(&half.length_ge(part.n_chars));

    let mut res = B::default();
    for row in cand.to_vec() {
        if let Some(hay) = col.cell_bytes(row, case) {
            if contains_part(hay, part) {
                res.add(row);
            }
        }
    }
    res
}

// Slide the part over every character position of the haystack.
fn contains_part(hay: &[u8], part: &Part) -> bool {
    let n_hay = utf8::char_count(hay);
    if n_hay < part.n_chars {
        return false;
    }
    let mut off = 0;
    for _ in 0..=(n_hay - part.n_chars) {
        if matches_at(hay, off, &part.bytes) {
            return true;
        }
        off = cmp::min(off + utf8::char_len(hay[off]), hay.len());
    }
    false
}

// Character-wise equality from byte offset `off`, `_` consumes one
// haystack character.
fn matches_at(hay: &[u8], mut off: usize, pat: &[u8]) -> bool {
    let mut i = 0;
    while i < pat.len() {
        if off >= hay.len() {
            return false;
        }
        let h = cmp::min(utf8::char_len(hay[off]), hay.len() - off);
        if pat[i] == b'_' {
            i += 1;
            off += h;
            continue;
        }
        let p = cmp::min(utf8::char_len(pat[i]), pat.len() - i);
        if p != h || hay[off..off + h] != pat[i..i + p] {
            return false;
        }
        i += p;
        off += h;
    }
    true
}

// Multi-part patterns: place every part left to right at legal
// character positions. Adjacent parts may abut but never overlap; the
// first part is pinned to position 0 unless the pattern starts with
// `%`, the last part is end-anchored unless it ends with `%`.
fn windowed<B: Bitmap>(half: &Half<B>, pat: &Pattern, cancel: Option<&AtomicBool>) -> B {
    let total: usize = pat.parts.iter().map(|part| part.n_chars).sum();
    let mut acc = B::default();
    let mut cand = half.length_ge(total);
    if cand.is_empty() {
        return acc;
    }

    let (first, min_p) = match pat.starts_percent {
        true => (0, 0),
        false => {
            cand.and_inplace(&part_at(half, &pat.parts[0], 0));
            if cand.is_empty() {
                return acc;
            }
            (1, pat.parts[0].n_chars)
        }
    };
    descend(half, pat, first, min_p, &cand, cancel, &mut acc);
    acc
}

fn descend<B: Bitmap>(
    half: &Half<B>,
    pat: &Pattern,
    i: usize,
    min_p: usize,
    cand: &B,
    cancel: Option<&AtomicBool>,
    acc: &mut B,
) {
    if is_canceled(cancel) {
        return;
    }
    if i == pat.parts.len() {
        acc.or_inplace(cand);
        return;
    }
    let part = &pat.parts[i];
    if i == pat.parts.len() - 1 && !pat.ends_percent {
        let mut res = part_at_end(half, part);
        res.and_inplace(cand);
        res.and_inplace(&half.length_ge(min_p + part.n_chars));
        acc.or_inplace(&res);
        return;
    }
    let rem: usize = pat.parts[i + 1..].iter().map(|part| part.n_chars).sum();
    if half.max_length() < part.n_chars + rem {
        return;
    }
    let max_p = half.max_length() - part.n_chars - rem;
    for p in min_p..=max_p {
        if is_canceled(cancel) {
            return;
        }
        let mut res = part_at(half, part, p);
        res.and_inplace(cand);
        if !res.is_empty() {
            descend(half, pat, i + 1, p + part.n_chars, &res, cancel, acc);
        }
    }
}

pub(crate) fn is_canceled(cancel: Option<&AtomicBool>) -> bool {
    cancel.map_or(false, |flag| flag.load(Ordering::Relaxed))
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod matcher_test;
