use super::*;

#[test]
fn test_intern_deduplicates() {
    let mut interner = Interner::new();
    let a = interner.intern("value");
    let b = interner.intern("value");
    let c = interner.intern("other");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.resolve(c), "other");
}

#[test]
fn test_empty_string_is_none_atom() {
    let mut interner = Interner::new();
    assert!(interner.is_empty());
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(Atom::NONE.is_none());
}

#[test]
fn test_lookup_does_not_intern() {
    let mut interner = Interner::new();
    assert_eq!(interner.lookup("missing"), None);
    let len = interner.len();
    let atom = interner.intern("present");
    assert_eq!(interner.lookup("present"), Some(atom));
    assert_eq!(interner.len(), len + 1);
}

#[test]
fn test_resolve_out_of_bounds_is_empty() {
    let interner = Interner::new();
    assert_eq!(interner.resolve(Atom(999)), "");
}

#[test]
fn test_prelude_atoms_are_stable() {
    let a = Interner::with_prelude();
    let b = Interner::with_prelude();
    assert_eq!(a.lookup("self"), Some(Atom(1)));
    assert_eq!(a.lookup("len"), b.lookup("len"));
    assert!(!a.is_empty());
}
