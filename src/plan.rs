//! Module `plan` implement predicate analysis, ordering and execution
//! for multi-column queries.
//!
//! Each predicate gets a shape census, a selectivity score and a
//! priority tier; predicates then run in `(priority, selectivity,
//! column)` order, intersecting as they go and stopping at the first
//! empty intersection.

use log::debug;

use std::{cmp, cmp::Ordering, sync::atomic::AtomicBool};

use crate::{
    column::Case,
    db::{Bitmap, Predicate},
    index::Index,
    matcher, pattern, Result,
};

/// Shape census of one predicate pattern.
#[derive(Clone, Debug)]
pub struct Profile {
    pub has_percent: bool,
    pub is_exact: bool,
    pub is_prefix: bool,
    pub is_suffix: bool,
    pub is_substring: bool,
    pub partition_count: usize,
    pub percent_count: usize,
    pub underscore_count: usize,
    pub concrete_chars: usize,
    pub anchor_strength: u32,
    pub selectivity: f32,
    pub priority: u32,
}

/// Analyze one pattern. Counts are characters; anchor regions are the
/// pattern ends not covered by `%`, concrete characters there worth 10
/// and underscores 3, clamped to 100.
pub fn analyze(pattern_bytes: &[u8]) -> Profile {
    let pat = pattern::parse(pattern_bytes);

    let underscore_count = pattern_bytes.iter().filter(|b| **b == b'_').count();
    let percent_count = {
        let mut runs = 0;
        let mut inside = false;
        for b in pattern_bytes.iter() {
            match (*b == b'%', inside) {
                (true, false) => {
                    runs += 1;
                    inside = true;
                }
                (false, _) => inside = false,
                (true, true) => (),
            }
        }
        runs
    };
    let has_percent = percent_count > 0;
    let total_chars: usize = pat.parts.iter().map(|part| part.n_chars).sum();
    let concrete_chars = total_chars.saturating_sub(underscore_count);
    let partition_count = pat.parts.len();

    let single = partition_count == 1;
    let is_exact = !has_percent && underscore_count == 0;
    let is_prefix = single && !pat.starts_percent && pat.ends_percent;
    let is_suffix = single && pat.starts_percent && !pat.ends_percent;
    let is_substring = single && pat.starts_percent && pat.ends_percent;

    let anchor_strength = {
        let mut anchor = 0_u32;
        if !pat.starts_percent {
            if let Some(part) = pat.parts.first() {
                anchor += anchor_weight(part);
            }
        }
        // a single both-ways-anchored part counts once, as the prefix.
        if !pat.ends_percent && (pat.parts.len() > 1 || pat.starts_percent) {
            if let Some(part) = pat.parts.last() {
                anchor += anchor_weight(part);
            }
        }
        cmp::min(anchor, 100)
    };

    let selectivity = {
        let mut s = 1.0 / (concrete_chars as f32 + 1.0);
        if is_exact {
            s *= 0.1;
        }
        s -= 0.05 * underscore_count as f32;
        s += 0.15 * partition_count as f32;
        s -= anchor_strength as f32 / 200.0;
        if is_substring {
            s += 0.5;
        }
        s.max(0.01).min(1.0)
    };

    let base: u32 = if is_exact || (!has_percent && underscore_count >= 3) {
        0
    } else if !has_percent && underscore_count > 0 {
        10 + cmp::min(underscore_count as u32, 5)
    } else if anchor_strength >= 30 {
        20 + cmp::min(7, (100 - anchor_strength) / 10)
    } else if anchor_strength > 0 {
        30 + cmp::min(10, (30 - anchor_strength) / 3)
    } else if is_substring {
        50 + cmp::min(10, underscore_count as u32)
    } else if partition_count >= 2 {
        40 + partition_count as u32
    } else {
        35
    };
    let priority = base + (10.0 * selectivity).round() as u32;

    Profile {
        has_percent,
        is_exact,
        is_prefix,
        is_suffix,
        is_substring,
        partition_count,
        percent_count,
        underscore_count,
        concrete_chars,
        anchor_strength,
        selectivity,
        priority,
    }
}

fn anchor_weight(part: &pattern::Part) -> u32 {
    let mut weight = 0;
    for ch in crate::utf8::char_slices(&part.bytes) {
        weight += if ch == b"_" { 3 } else { 10 };
    }
    weight
}

// Evaluate the predicates in planned order, intersecting as we go.
// The running bitmap is tombstone-masked right after the first
// predicate so that NOT-inversion cannot resurrect deleted rows.
pub(crate) fn execute<B>(
    index: &Index<B>,
    preds: &[Predicate],
    cancel: Option<&AtomicBool>,
) -> Result<B>
where
    B: Bitmap,
{
    if preds.is_empty() {
        return err_at!(InvalidInput, msg: "no predicates to execute");
    }
    for pred in preds.iter() {
        if pred.column >= index.n_columns() {
            return err_at!(
                Unsupported, msg: "column {} out of range 0..{}", pred.column, index.n_columns()
            );
        }
    }

    let profiles: Vec<Profile> = preds.iter().map(|pred| analyze(&pred.pattern)).collect();
    let mut order: Vec<usize> = (0..preds.len()).collect();
    order.sort_by(|&a, &b| {
        let (x, y) = (&profiles[a], &profiles[b]);
        x.priority
            .cmp(&y.priority)
            .then(x.selectivity.partial_cmp(&y.selectivity).unwrap_or(Ordering::Equal))
            .then(preds[a].column.cmp(&preds[b].column))
    });
    debug!(target: "biscuit", "plan order {:?} over {} predicates", order, preds.len());

    let mut result: Option<B> = None;
    for &pi in order.iter() {
        if matcher::is_canceled(cancel) {
            return err_at!(Canceled, msg: "query canceled before predicate {}", pi);
        }
        let bitmap = evaluate_one(index, &preds[pi], cancel);
        let running = match result.take() {
            None => {
                // mask tombstones right away, NOT-inversion must not
                // resurrect deleted rows.
                let mut bitmap = bitmap;
                if !index.tombstones().is_empty() {
                    bitmap.andnot_inplace(index.tombstones());
                }
                bitmap
            }
            Some(mut res) => {
                res.and_inplace(&bitmap);
                res
            }
        };
        let empty = running.is_empty();
        result = Some(running);
        if empty {
            break;
        }
    }
    // a cancel raised mid-match leaves a partial bitmap behind, never
    // return it.
    if matcher::is_canceled(cancel) {
        return err_at!(Canceled, msg: "query canceled while matching");
    }
    Ok(result.unwrap_or_default())
}

fn evaluate_one<B>(index: &Index<B>, pred: &Predicate, cancel: Option<&AtomicBool>) -> B
where
    B: Bitmap,
{
    let col = index.column(pred.column);
    let case = match pred.op.is_case_insensitive() {
        true => Case::Insensitive,
        false => Case::Sensitive,
    };
    let mut bitmap = match case {
        Case::Insensitive => {
            let folded = index.fold(&pred.pattern);
            matcher::evaluate(col, &folded, case, cancel)
        }
        Case::Sensitive => matcher::evaluate(col, &pred.pattern, case, cancel),
    };
    if pred.op.is_negated() {
        // the universe is every row holding a value in this column,
        // sql NULL never matches a negated predicate either.
        let mut universe = col.half(case).length_ge(0);
        universe.andnot_inplace(&bitmap);
        bitmap = universe;
    }
    bitmap
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;
