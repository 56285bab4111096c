// Releasing caller wrappers lets the native objects go. Kept alone in its
// own test binary: the drop counter is process-wide.

use seqbind_testpkg::caller;

#[test]
fn collect_s_observes_released_objects() {
    let a = caller::new_s(1.0, 2.0);
    let b = caller::new_s(3.0, 4.0);
    let c = b.clone();
    assert_eq!(caller::collect_s(0, 0), 0);

    drop(a);
    drop(b);
    assert_eq!(caller::collect_s(1, 1), 1, "`c` still holds the second object");

    drop(c);
    assert_eq!(caller::collect_s(1, 1), 1);
}
