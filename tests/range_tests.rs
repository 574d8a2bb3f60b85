use localshare::range::RangeSpec;
use localshare::ShareError;

fn unsatisfiable(header: &str, size: u64) -> bool {
    matches!(
        RangeSpec::parse(Some(header), size),
        Err(ShareError::RangeNotSatisfiable { size: s }) if s == size
    )
}

#[test]
fn test_absent_header_means_whole_file() {
    assert_eq!(RangeSpec::parse(None, 100).unwrap(), None);
}

#[test]
fn test_closed_and_open_ranges() {
    let range = RangeSpec::parse(Some("bytes=10-19"), 100).unwrap().unwrap();
    assert_eq!(range, RangeSpec { start: 10, end: 19 });
    assert_eq!(range.len(), 10);

    // open end runs to the last byte
    let range = RangeSpec::parse(Some("bytes=90-"), 100).unwrap().unwrap();
    assert_eq!(range, RangeSpec { start: 90, end: 99 });

    let range = RangeSpec::parse(Some("bytes=0-0"), 1).unwrap().unwrap();
    assert_eq!(range.len(), 1);
}

#[test]
fn test_out_of_bounds_ranges() {
    assert!(unsatisfiable("bytes=100-", 100));
    assert!(unsatisfiable("bytes=0-100", 100));
    assert!(unsatisfiable("bytes=50-40", 100));
    assert!(unsatisfiable("bytes=20000000-", 10_000_000));

    // nothing is satisfiable in an empty file
    assert!(unsatisfiable("bytes=0-", 0));
    assert!(unsatisfiable("bytes=0-0", 0));
}

#[test]
fn test_rejected_forms() {
    assert!(unsatisfiable("bytes=-500", 1000));
    assert!(unsatisfiable("bytes=0-10,20-30", 1000));
    assert!(unsatisfiable("bytes=abc-", 1000));
    assert!(unsatisfiable("bytes=+1-5", 1000));
    assert!(unsatisfiable("items=0-10", 1000));
    assert!(unsatisfiable("bytes=10", 1000));
    assert!(unsatisfiable("", 1000));
}

#[test]
fn test_content_range_format() {
    let range = RangeSpec::parse(Some("bytes=1000000-1999999"), 10_000_000)
        .unwrap()
        .unwrap();
    assert_eq!(range.content_range(10_000_000), "bytes 1000000-1999999/10000000");
    assert_eq!(range.len(), 1_000_000);
}
