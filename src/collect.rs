//! Module `collect` implement the result pipeline: tombstone masking,
//! materialization, limit truncation and tid ordering.

use log::warn;

use std::{cmp, mem, sync::atomic::AtomicBool, thread};

use crate::{
    db::{Bitmap, QueryOpts, Tid},
    index::Index,
    matcher, Result, PARALLEL_MATERIALIZE_MIN, RADIX_SORT_THRESHOLD,
};

// rows between cancellation checkpoints while collecting tids.
const COLLECT_CHUNK: usize = 4096;
// per-block counting-sort bucket count, larger offsets are skipped.
const OFFSET_BUCKETS: usize = 512;

/// Sort anomaly, reported as a value and logged by the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anomaly {
    OffsetOutOfRange { tid: Tid },
}

pub(crate) fn finalize<B>(
    index: &Index<B>,
    mut result: B,
    opts: &QueryOpts,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Tid>>
where
    B: Bitmap,
{
    if !index.tombstones().is_empty() {
        result.andnot_inplace(index.tombstones());
    }

    let mut tids = materialize(index.tid_table(), &result, cancel)?;

    if let Some(limit) = opts.limit {
        tids.truncate(limit);
    }
    if opts.sorted {
        for anomaly in sort_tids(&mut tids) {
            match anomaly {
                Anomaly::OffsetOutOfRange { tid } => warn!(
                    target: "biscuit",
                    "tid {} offset beyond {} sort buckets, skipped", tid, OFFSET_BUCKETS
                ),
            }
        }
    }
    Ok(tids)
}

fn materialize<B>(table: &[Tid], result: &B, cancel: Option<&AtomicBool>) -> Result<Vec<Tid>>
where
    B: Bitmap,
{
    let rows = result.to_vec();
    if rows.len() >= PARALLEL_MATERIALIZE_MIN {
        return parallel_materialize(table, &rows, cancel);
    }
    let mut out = Vec::with_capacity(rows.len());
    for chunk in rows.chunks(COLLECT_CHUNK) {
        if matcher::is_canceled(cancel) {
            return err_at!(Canceled, msg: "canceled collecting {} tids", rows.len());
        }
        out.extend(chunk.iter().map(|&row| table[row as usize]));
    }
    Ok(out)
}

// Fan the tid lookups out over a small pool. Workers read disjoint
// slices of the collected row-ids and write disjoint slices of the
// output array; the bitmaps are final before the spawn.
fn parallel_materialize(
    table: &[Tid],
    rows: &[u32],
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Tid>> {
    let workers = match rows.len() {
        n if n < 100_000 => 2,
        _ => 4,
    };
    let workers = cmp::max(1, cmp::min(workers, num_cpus::get()));
    let shard = (rows.len() + workers - 1) / workers;

    let mut out = vec![Tid::default(); rows.len()];
    let mut done = true;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        let mut row_rest = rows;
        let mut out_rest: &mut [Tid] = &mut out;
        for _ in 0..workers {
            let n = cmp::min(shard, row_rest.len());
            let (row_slice, rr) = row_rest.split_at(n);
            let (out_slice, or) = out_rest.split_at_mut(n);
            row_rest = rr;
            out_rest = or;
            handles.push(scope.spawn(move || {
                for (c, chunk) in row_slice.chunks(COLLECT_CHUNK).enumerate() {
                    if matcher::is_canceled(cancel) {
                        return false;
                    }
                    for (i, &row) in chunk.iter().enumerate() {
                        out_slice[c * COLLECT_CHUNK + i] = table[row as usize];
                    }
                }
                true
            }));
        }
        for handle in handles {
            done = handle.join().unwrap() && done;
        }
    });
    if done {
        Ok(out)
    } else {
        err_at!(Canceled, msg: "canceled collecting {} tids", rows.len())
    }
}

/// Order tids by `(block, offset)`. Comparison sort up to
/// [RADIX_SORT_THRESHOLD] entries; above that, a dense counting sort
/// or an lsd radix sort on block number, then a per-block counting
/// sort on offset. Offsets beyond the bucket range are dropped and
/// reported, never faulted.
pub(crate) fn sort_tids(tids: &mut Vec<Tid>) -> Vec<Anomaly> {
    if tids.len() <= RADIX_SORT_THRESHOLD {
        tids.sort_unstable();
        return Vec::new();
    }
    let max_block = tids.iter().map(|tid| tid.block).max().unwrap_or(0);
    if (max_block as usize) < 2 * tids.len() {
        counting_by_block(tids, max_block);
    } else {
        radix_by_block(tids, max_block);
    }
    offset_sort(tids)
}

// Dense two-pass counting sort on block number, used when blocks are
// dense relative to the result size.
fn counting_by_block(tids: &mut Vec<Tid>, max_block: u32) {
    let mut counts = vec![0_usize; max_block as usize + 1];
    for tid in tids.iter() {
        counts[tid.block as usize] += 1;
    }
    let mut sum = 0;
    for count in counts.iter_mut() {
        let n = *count;
        *count = sum;
        sum += n;
    }
    let mut out = vec![Tid::default(); tids.len()];
    for &tid in tids.iter() {
        let slot = &mut counts[tid.block as usize];
        out[*slot] = tid;
        *slot += 1;
    }
    *tids = out;
}

// Lsd radix sort on 8-bit digits of the block number. Two passes cover
// blocks below 2^16, wider blocks take the extra passes.
fn radix_by_block(tids: &mut Vec<Tid>, max_block: u32) {
    let passes = {
        let mut n = 2;
        while n < 4 && (max_block >> (8 * n)) != 0 {
            n += 1;
        }
        n
    };
    let mut scratch = vec![Tid::default(); tids.len()];
    for pass in 0..passes {
        let shift = 8 * pass;
        let mut counts = [0_usize; 256];
        for tid in tids.iter() {
            counts[((tid.block >> shift) & 0xFF) as usize] += 1;
        }
        let mut sum = 0;
        for count in counts.iter_mut() {
            let n = *count;
            *count = sum;
            sum += n;
        }
        for &tid in tids.iter() {
            let digit = ((tid.block >> shift) & 0xFF) as usize;
            scratch[counts[digit]] = tid;
            counts[digit] += 1;
        }
        mem::swap(tids, &mut scratch);
    }
}

// Per-block counting sort on offset. Tids are reconstructed from
// (block, bucket), which is lossless because a tid is exactly that
// pair.
fn offset_sort(tids: &mut Vec<Tid>) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let mut out = Vec::with_capacity(tids.len());
    let mut i = 0;
    while i < tids.len() {
        let block = tids[i].block;
        let mut j = i;
        while j < tids.len() && tids[j].block == block {
            j += 1;
        }
        match j - i {
            1 => out.push(tids[i]),
            _ => {
                let mut counts = [0_usize; OFFSET_BUCKETS];
                for tid in tids[i..j].iter() {
                    match (tid.offset as usize) < OFFSET_BUCKETS {
                        true => counts[tid.offset as usize] += 1,
                        false => anomalies.push(Anomaly::OffsetOutOfRange { tid: *tid }),
                    }
                }
                for (offset, &count) in counts.iter().enumerate() {
                    for _ in 0..count {
                        out.push(Tid::new(block, offset as u16));
                    }
                }
            }
        }
        i = j;
    }
    *tids = out;
    anomalies
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod collect_test;
