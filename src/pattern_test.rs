use super::*;

#[test]
fn test_parse_boundaries() {
    let pat = parse(b"");
    assert!(pat.parts.is_empty());
    assert!(!pat.starts_percent);
    assert!(!pat.ends_percent);

    let pat = parse(b"%");
    assert!(pat.parts.is_empty());
    assert!(pat.starts_percent);
    assert!(pat.ends_percent);

    let pat = parse(b"%%%");
    assert!(pat.parts.is_empty());
    assert!(pat.starts_percent);
    assert!(pat.ends_percent);
}

#[test]
fn test_parse_parts() {
    let pat = parse(b"abc");
    assert_eq!(pat.parts.len(), 1);
    assert_eq!(pat.parts[0].bytes, b"abc".to_vec());
    assert_eq!(pat.parts[0].n_chars, 3);
    assert!(!pat.starts_percent && !pat.ends_percent);

    let pat = parse(b"a%b");
    assert_eq!(pat.parts.len(), 2);
    assert!(!pat.starts_percent && !pat.ends_percent);

    // consecutive `%` collapse.
    let pat = parse(b"%%a%%%b%%");
    assert_eq!(pat.parts.len(), 2);
    assert_eq!(pat.parts[0].bytes, b"a".to_vec());
    assert_eq!(pat.parts[1].bytes, b"b".to_vec());
    assert!(pat.starts_percent && pat.ends_percent);
}

#[test]
fn test_parse_underscore_is_part_content() {
    let pat = parse(b"_a_%b_");
    assert_eq!(pat.parts.len(), 2);
    assert_eq!(pat.parts[0].bytes, b"_a_".to_vec());
    assert_eq!(pat.parts[0].n_chars, 3);
    assert_eq!(pat.parts[1].bytes, b"b_".to_vec());
    assert_eq!(pat.parts[1].n_chars, 2);
}

#[test]
fn test_parse_multibyte_lengths() {
    let pat = parse("café%日本".as_bytes());
    assert_eq!(pat.parts.len(), 2);
    assert_eq!(pat.parts[0].n_chars, 4);
    assert_eq!(pat.parts[0].bytes.len(), 5);
    assert_eq!(pat.parts[1].n_chars, 2);
    assert_eq!(pat.parts[1].bytes.len(), 6);
}

#[test]
fn test_wildcard_only() {
    assert_eq!(wildcard_only(b""), Some((0, false)));
    assert_eq!(wildcard_only(b"%"), Some((0, true)));
    assert_eq!(wildcard_only(b"___"), Some((3, false)));
    assert_eq!(wildcard_only(b"_%_"), Some((2, true)));
    assert_eq!(wildcard_only(b"a%"), None);
    assert_eq!(wildcard_only(b"_x_"), None);
}
