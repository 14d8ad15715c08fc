use crate::{
    bitmaps::DenseBitmap,
    db::{Bitmap, CaseFold, UnicodeCaseFold},
};

use super::*;

fn indexed(rows: &[(u32, &str)]) -> ColumnIndex<DenseBitmap> {
    let folder = UnicodeCaseFold;
    let mut col: ColumnIndex<DenseBitmap> = ColumnIndex::new();
    for (row, value) in rows.iter() {
        let orig = value.as_bytes().to_vec();
        let lower = folder.lowercase(&orig);
        col.index_value(*row, orig, lower);
    }
    col
}

#[test]
fn test_multibyte_same_position() {
    let col = indexed(&[(1, "café")]);
    let half = col.half(Case::Sensitive);

    // every byte of 'é' sits at character position 3, both ways.
    assert!(half.pos.get(0xC3, 3).unwrap().contains(1));
    assert!(half.pos.get(0xA9, 3).unwrap().contains(1));
    assert!(half.neg.get(0xC3, -1).unwrap().contains(1));
    assert!(half.neg.get(0xA9, -1).unwrap().contains(1));
    assert!(half.pos.get(b'c', 0).unwrap().contains(1));
    assert!(half.neg.get(b'c', -4).unwrap().contains(1));
    assert!(half.pos.get(0xC3, 4).is_none());

    assert!(half.presence(b'c').contains(1));
    assert!(half.presence(0xA9).contains(1));
    assert!(!half.presence(b'z').contains(1));
}

#[test]
fn test_length_bitmaps() {
    let col = indexed(&[(1, "café"), (2, "ab"), (3, "")]);
    let half = col.half(Case::Sensitive);

    assert_eq!(half.max_length(), 4);
    assert_eq!(half.length_eq(0).to_vec(), vec![3]);
    assert_eq!(half.length_eq(2).to_vec(), vec![2]);
    assert_eq!(half.length_eq(4).to_vec(), vec![1]);
    assert!(half.length_eq(5).is_empty());

    assert_eq!(half.length_ge(0).to_vec(), vec![1, 2, 3]);
    assert_eq!(half.length_ge(1).to_vec(), vec![1, 2]);
    assert_eq!(half.length_ge(3).to_vec(), vec![1]);
    assert_eq!(half.length_ge(4).to_vec(), vec![1]);
    // both N and N+1 beyond the longest value.
    assert!(half.length_ge(5).is_empty());
    assert!(half.length_ge(6).is_empty());
}

#[test]
fn test_halves_do_not_share_lengths() {
    // 'İ' lowercases to "i\u{307}", one character becomes two.
    let col = indexed(&[(1, "İ")]);
    assert_eq!(col.half(Case::Sensitive).max_length(), 1);
    assert_eq!(col.half(Case::Insensitive).max_length(), 2);
    assert!(col.half(Case::Sensitive).length_eq(1).contains(1));
    assert!(col.half(Case::Insensitive).length_eq(2).contains(1));
    assert!(col.half(Case::Insensitive).length_eq(1).is_empty());
}

#[test]
fn test_case_insensitive_half() {
    let col = indexed(&[(1, "CAFÉ")]);
    let ci = col.half(Case::Insensitive);

    assert!(ci.pos.get(b'c', 0).unwrap().contains(1));
    assert!(ci.pos.get(0xA9, 3).unwrap().contains(1));
    assert_eq!(col.cell_bytes(1, Case::Sensitive).unwrap(), "CAFÉ".as_bytes());
    assert_eq!(col.cell_bytes(1, Case::Insensitive).unwrap(), "café".as_bytes());
}

#[test]
fn test_load_then_seal_equals_incremental() {
    let rows: Vec<(u32, &str)> = vec![(0, "café"), (1, "ab"), (2, ""), (3, "İstanbul")];
    let incremental = indexed(&rows);

    let folder = UnicodeCaseFold;
    let mut loaded: ColumnIndex<DenseBitmap> = ColumnIndex::new();
    for (row, value) in rows.iter() {
        let orig = value.as_bytes().to_vec();
        let lower = folder.lowercase(&orig);
        loaded.load_value(*row, orig, lower);
    }
    loaded.seal();

    for case in [Case::Sensitive, Case::Insensitive].iter() {
        let (a, b) = (incremental.half(*case), loaded.half(*case));
        assert_eq!(a.max_length(), b.max_length());
        for k in 0..=(a.max_length() + 1) {
            assert_eq!(a.length_eq(k).to_vec(), b.length_eq(k).to_vec(), "len_eq {}", k);
            assert_eq!(a.length_ge(k).to_vec(), b.length_ge(k).to_vec(), "len_ge {}", k);
        }
    }
}

#[test]
fn test_unindex_value() {
    let mut col = indexed(&[(1, "café"), (2, "cafe")]);
    col.unindex_value(1);

    let half = col.half(Case::Sensitive);
    assert!(!half.pos.get(b'c', 0).unwrap().contains(1));
    assert!(half.pos.get(b'c', 0).unwrap().contains(2));
    assert!(half.pos.get(0xC3, 3).map_or(true, |bm| !bm.contains(1)));
    assert!(!half.presence(b'f').contains(1));
    assert!(!half.length_eq(4).contains(1));
    assert!(!half.length_ge(0).contains(1));
    assert!(col.cell_bytes(1, Case::Sensitive).is_none());

    // unindexing a hole is a no-op.
    col.unindex_value(1);
    col.unindex_value(77);
    assert!(col.cell_bytes(2, Case::Sensitive).is_some());
    col.validate_row(2).expect("row 2 intact");
}

#[test]
fn test_bulk_remove() {
    let mut col = indexed(&[(0, "aa"), (1, "ab"), (2, "ba")]);
    let mut batch = DenseBitmap::default();
    batch.add(0);
    batch.add(2);
    col.bulk_remove(&batch, &[0, 2]);

    let half = col.half(Case::Sensitive);
    assert_eq!(half.pos.get(b'a', 0).unwrap().to_vec(), vec![1]);
    assert_eq!(half.presence(b'a').to_vec(), vec![1]);
    assert_eq!(half.length_eq(2).to_vec(), vec![1]);
    assert_eq!(half.length_ge(0).to_vec(), vec![1]);
    assert!(col.cell_bytes(0, Case::Sensitive).is_none());
    assert!(col.cell_bytes(2, Case::Insensitive).is_none());
    col.validate_row(1).expect("row 1 intact");
}

#[test]
fn test_set_null() {
    let mut col: ColumnIndex<DenseBitmap> = ColumnIndex::new();
    col.set_null(3);
    assert!(col.cell_bytes(3, Case::Sensitive).is_none());
    assert!(col.half(Case::Sensitive).length_ge(0).is_empty());
    col.validate_row(3).expect("null row is vacuously valid");
}
