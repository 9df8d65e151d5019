//! Identity and classification behaviour of a single index file

use cxref_core::model::{Entity, IndexFile, LanguageId, TypeHandle, Usr};

#[test]
fn test_repeated_resolve_returns_same_handle() {
    let mut file = IndexFile::new("/src/shapes.cc", "");
    let usrs = ["c:@S@Shape", "c:@S@Circle", "c:@S@Shape", "c:@S@Square", "c:@S@Circle"];

    let handles: Vec<TypeHandle> = usrs.iter().map(|usr| file.resolve_type(*usr)).collect();

    assert_eq!(handles[0], handles[2]);
    assert_eq!(handles[1], handles[4]);
    assert_eq!(file.types.len(), 3);

    // Exactly one entity per usr, sitting at its handle
    for (usr, handle) in usrs.iter().zip(&handles) {
        let matching: Vec<_> = file.types.iter().filter(|t| t.usr.as_str() == *usr).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id(), *handle);
        assert_eq!(file.lookup_type(*handle).unwrap().usr(), &Usr::from(*usr));
    }
}

#[test]
fn test_handles_allocate_from_zero_per_kind() {
    let mut file = IndexFile::new("/src/a.cc", "");
    let first_func = file.resolve_func("c:@F@a#");
    let first_var = file.resolve_var("c:@a");
    let second_func = file.resolve_func("c:@F@b#");

    assert_eq!(first_func.raw(), 0);
    assert_eq!(first_var.raw(), 0);
    assert_eq!(second_func.raw(), 1);
    assert!(first_func.has_value());
}

#[test]
fn test_id_cache_directions_agree() {
    let mut file = IndexFile::new("/src/a.cc", "");
    for i in 0..20 {
        file.resolve_var(format!("c:@v{}", i % 7));
    }

    assert_eq!(file.vars.len(), 7);
    assert_eq!(file.id_cache.vars.len(), 7);
    for var in &file.vars {
        assert_eq!(file.id_cache.vars.handle(&var.usr), Some(var.id));
        assert_eq!(file.id_cache.vars.usr(var.id), Some(&var.usr));
    }
}

#[test]
fn test_language_is_supremum_of_observations() {
    let sequences: [(&[LanguageId], LanguageId); 5] = [
        (&[], LanguageId::Unknown),
        (&[LanguageId::C], LanguageId::C),
        (&[LanguageId::Cpp, LanguageId::C], LanguageId::Cpp),
        (
            &[LanguageId::C, LanguageId::Unknown, LanguageId::Cpp, LanguageId::C],
            LanguageId::Cpp,
        ),
        (&[LanguageId::Unknown, LanguageId::Unknown], LanguageId::Unknown),
    ];

    for (events, expected) in sequences {
        let mut file = IndexFile::new("/src/a.h", "");
        for event in events {
            file.observe_language(*event);
        }
        assert_eq!(file.language, expected, "events {:?}", events);
    }
}

#[test]
fn test_objc_is_terminal() {
    let mut file = IndexFile::new("/src/view.m", "");
    file.observe_language(LanguageId::Cpp);
    file.observe_language(LanguageId::ObjC);
    file.observe_language(LanguageId::C);
    file.observe_language(LanguageId::Cpp);
    assert_eq!(file.language, LanguageId::ObjC);
}
