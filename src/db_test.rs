use super::*;

#[test]
fn test_tid_order() {
    let mut tids = vec![
        Tid::new(2, 1),
        Tid::new(0, 40),
        Tid::new(2, 0),
        Tid::new(0, 3),
    ];
    tids.sort();
    let sorted = vec![
        Tid::new(0, 3),
        Tid::new(0, 40),
        Tid::new(2, 0),
        Tid::new(2, 1),
    ];
    assert_eq!(tids, sorted);
    assert_eq!(format!("{}", Tid::new(7, 2)), "(7,2)");
}

#[test]
fn test_operator() {
    assert!(!Operator::Like.is_negated());
    assert!(Operator::NotLike.is_negated());
    assert!(!Operator::Ilike.is_negated());
    assert!(Operator::NotIlike.is_negated());

    assert!(!Operator::Like.is_case_insensitive());
    assert!(!Operator::NotLike.is_case_insensitive());
    assert!(Operator::Ilike.is_case_insensitive());
    assert!(Operator::NotIlike.is_case_insensitive());
}

#[test]
fn test_unicode_case_fold() {
    let folder = UnicodeCaseFold;
    assert_eq!(folder.lowercase(b"Hello"), b"hello".to_vec());
    assert_eq!(folder.lowercase("CAFÉ".as_bytes()), "café".as_bytes().to_vec());
    assert_eq!(folder.lowercase(b""), Vec::<u8>::new());
    // folding can change character counts.
    assert_eq!(folder.lowercase("İ".as_bytes()), "i\u{307}".as_bytes().to_vec());
    // malformed spans fold byte-wise and survive.
    assert_eq!(folder.lowercase(&[b'A', 0xFF, b'B']), vec![b'a', 0xFF, b'b']);
    assert_eq!(folder.lowercase(&[0xC3]), vec![0xC3]);
}

#[test]
fn test_result_sink_vec() {
    let mut sink: Vec<Tid> = vec![];
    sink.accept(vec![Tid::new(1, 1), Tid::new(1, 2)]);
    sink.accept(vec![]);
    sink.accept(vec![Tid::new(2, 1)]);
    assert_eq!(sink, vec![Tid::new(1, 1), Tid::new(1, 2), Tid::new(2, 1)]);
}
