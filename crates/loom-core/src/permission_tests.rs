use super::*;

#[test]
fn same_pattern_and_description_produce_equal_keys() {
    let a = CacheKey::new("/opt/*", "allow write to /opt/foo");
    let b = CacheKey::new("/opt/*", "allow write to /opt/foo");
    assert_eq!(a, b);
}

#[test]
fn same_pattern_different_description_produce_different_keys() {
    let a = CacheKey::new("/opt/*", "allow write to /opt/foo");
    let b = CacheKey::new("/opt/*", "allow write to /opt/bar");
    assert_ne!(a, b);
}

#[test]
fn different_pattern_same_description_produce_different_keys() {
    let a = CacheKey::new("/opt/*", "allow write");
    let b = CacheKey::new("/var/*", "allow write");
    assert_ne!(a, b);
}
