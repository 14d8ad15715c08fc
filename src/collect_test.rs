use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};

use super::*;

#[test]
fn test_sort_comparison() {
    let seed: u64 = random();
    println!("test_sort_comparison seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut tids: Vec<Tid> = (0..4000)
        .map(|_| Tid::new(rng.gen::<u32>() % 1000, (rng.gen::<u16>() % 2000) as u16))
        .collect();
    let mut expected = tids.clone();
    expected.sort();

    let anomalies = sort_tids(&mut tids);
    // the comparison path drops nothing, offsets beyond the bucket
    // range included.
    assert!(anomalies.is_empty());
    assert_eq!(tids, expected);
}

#[test]
fn test_sort_counting_blocks() {
    let seed: u64 = random();
    println!("test_sort_counting_blocks seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    // dense blocks, max_block far below 2n.
    let mut tids: Vec<Tid> = (0..6000)
        .map(|_| Tid::new(rng.gen::<u32>() % 100, (rng.gen::<u16>() % 512) as u16))
        .collect();
    let mut expected = tids.clone();
    expected.sort();

    let anomalies = sort_tids(&mut tids);
    assert!(anomalies.is_empty());
    assert_eq!(tids, expected);
}

#[test]
fn test_sort_radix_blocks() {
    let seed: u64 = random();
    println!("test_sort_radix_blocks seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    // sparse blocks force the radix path, and past 2^16 the extra
    // passes.
    let mut tids: Vec<Tid> = (0..6000)
        .map(|_| Tid::new(rng.gen::<u32>() % 10_000_000, (rng.gen::<u16>() % 512) as u16))
        .collect();
    let mut expected = tids.clone();
    expected.sort();

    let anomalies = sort_tids(&mut tids);
    assert!(anomalies.is_empty());
    assert_eq!(tids, expected);
}

#[test]
fn test_sort_offset_overflow() {
    let seed: u64 = random();
    println!("test_sort_offset_overflow seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    // one crowded block so every tid goes through offset buckets.
    let mut tids: Vec<Tid> = (0..6000)
        .map(|_| Tid::new(42, (rng.gen::<u16>() % 600) as u16))
        .collect();
    let n_over = tids.iter().filter(|tid| tid.offset >= 512).count();
    assert!(n_over > 0, "seed produced no overflow offsets");

    let anomalies = sort_tids(&mut tids);
    assert_eq!(anomalies.len(), n_over);
    assert_eq!(tids.len(), 6000 - n_over);
    assert!(tids.windows(2).all(|w| w[0] <= w[1]));
    assert!(tids.iter().all(|tid| tid.offset < 512));
    for anomaly in anomalies.iter() {
        let Anomaly::OffsetOutOfRange { tid } = *anomaly;
        assert!(tid.offset >= 512);
    }
}

#[test]
fn test_sort_stability_across_paths() {
    // same input through both block-sort paths gives the same order.
    let seed: u64 = random();
    println!("test_sort_stability_across_paths seed:{}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let tids: Vec<Tid> = (0..8000)
        .map(|_| Tid::new(rng.gen::<u32>() % 3000, (rng.gen::<u16>() % 512) as u16))
        .collect();

    let mut counting = tids.clone();
    counting_by_block(&mut counting, 2999);
    let counting_anoms = offset_sort(&mut counting);

    let mut radix = tids.clone();
    radix_by_block(&mut radix, 2999);
    let radix_anoms = offset_sort(&mut radix);

    assert!(counting_anoms.is_empty() && radix_anoms.is_empty());
    assert_eq!(counting, radix);
}
