//! End-to-end flows through the public cache surface: normalization,
//! policy-driven merging, argument-keyed variants, read functions, and
//! snapshot persistence.

use proptest::prelude::*;

use entgraph_cache::{
    Cache, CacheConfig, FieldObject, FieldPolicy, TypePolicy, WriteObject, WriteValue,
};
use entgraph_types::{Args, EntityKey, Value};

fn args(pairs: &[(&str, Value)]) -> Args {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Normalization and cross-reference updates
// ---------------------------------------------------------------------------

#[test]
fn shared_entity_updates_propagate_through_references() {
    let cache = Cache::new(CacheConfig::new());

    let first = WriteObject::new("Book").field("id", "b1").field(
        "author",
        WriteObject::new("Author").field("id", "a1").field("name", "F. Herbert"),
    );
    cache.write("Book", &first).unwrap();

    let second = WriteObject::new("Book").field("id", "b2").field(
        "author",
        WriteObject::new("Author").field("id", "a1").field("name", "Frank Herbert"),
    );
    cache.write("Book", &second).unwrap();

    // Both books point at the same entity; the rename is visible from both.
    let author = EntityKey::new("Author", "a1");
    for book in ["b1", "b2"] {
        assert_eq!(
            cache.read(&EntityKey::new("Book", book), "author", &Args::new()).unwrap(),
            Some(Value::Ref(author.clone()))
        );
    }
    assert_eq!(
        cache.read(&author, "name", &Args::new()).unwrap(),
        Some(Value::from("Frank Herbert"))
    );
    assert_eq!(cache.len(), 3);
}

#[test]
fn write_returns_every_touched_entity() {
    let cache = Cache::new(CacheConfig::new());
    let obj = WriteObject::new("Book").field("id", "b1").field(
        "author",
        WriteObject::new("Author").field("id", "a1"),
    );
    let touched = cache.write("Book", &obj).unwrap();
    let touched: Vec<EntityKey> = touched.into_iter().collect();
    assert_eq!(
        touched,
        vec![EntityKey::new("Author", "a1"), EntityKey::new("Book", "b1")]
    );
}

// ---------------------------------------------------------------------------
// Inline objects and structural merging
// ---------------------------------------------------------------------------

#[test]
fn default_replacement_drops_unmentioned_inline_fields() {
    let cache = Cache::new(CacheConfig::new());

    let first = WriteObject::new("Book")
        .field("id", "b1")
        .field("author", WriteObject::new("Author").field("name", "Gwen"));
    cache.write("Book", &first).unwrap();

    let second = WriteObject::new("Book")
        .field("id", "b1")
        .field("author", WriteObject::new("Author").field("dateOfBirth", "1819"));
    cache.write("Book", &second).unwrap();

    let stored = cache
        .read(&EntityKey::new("Book", "b1"), "author", &Args::new()).unwrap()
        .unwrap();
    let author = stored.as_object().unwrap();
    assert_eq!(author.get("dateOfBirth"), Some(&Value::from("1819")));
    assert_eq!(author.get("name"), None);
}

#[test]
fn type_level_merge_flag_preserves_inline_fields() {
    let config = CacheConfig::new()
        .type_policy("Author", TypePolicy::new().merge_structural())
        .unwrap();
    let cache = Cache::new(config);

    let first = WriteObject::new("Book")
        .field("id", "b1")
        .field("author", WriteObject::new("Author").field("name", "Gwen"));
    cache.write("Book", &first).unwrap();

    let second = WriteObject::new("Book")
        .field("id", "b1")
        .field("author", WriteObject::new("Author").field("dateOfBirth", "1819"));
    cache.write("Book", &second).unwrap();

    let stored = cache
        .read(&EntityKey::new("Book", "b1"), "author", &Args::new()).unwrap()
        .unwrap();
    let author = stored.as_object().unwrap();
    assert_eq!(author.get("name"), Some(&Value::from("Gwen")));
    assert_eq!(author.get("dateOfBirth"), Some(&Value::from("1819")));
}

#[test]
fn structural_merge_type_mismatch_replaces() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = CacheConfig::new()
        .field_policy("Book", "author", FieldPolicy::new().merge_structural())
        .unwrap();
    let cache = Cache::new(config);

    let first = WriteObject::new("Book")
        .field("id", "b1")
        .field("author", WriteObject::new("Author").field("name", "Gwen"));
    cache.write("Book", &first).unwrap();

    let second = WriteObject::new("Book")
        .field("id", "b1")
        .field("author", WriteObject::new("Editor").field("desk", "N1"));
    cache.write("Book", &second).unwrap();

    // Differently-typed objects do not merge; the write replaces wholesale.
    let stored = cache
        .read(&EntityKey::new("Book", "b1"), "author", &Args::new()).unwrap()
        .unwrap();
    let obj = stored.as_object().unwrap();
    assert_eq!(obj.type_name.as_deref(), Some("Editor"));
    assert_eq!(obj.get("name"), None);
}

#[test]
fn field_level_structural_merge_matches_the_type_level_flag() {
    let by_type = Cache::new(
        CacheConfig::new()
            .type_policy("Author", TypePolicy::new().merge_structural())
            .unwrap(),
    );
    let by_field = Cache::new(
        CacheConfig::new()
            .field_policy("Book", "author", FieldPolicy::new().merge_structural())
            .unwrap(),
    );

    for cache in [&by_type, &by_field] {
        let first = WriteObject::new("Book")
            .field("id", "b1")
            .field("author", WriteObject::new("Author").field("name", "Gwen"));
        cache.write("Book", &first).unwrap();
        let second = WriteObject::new("Book")
            .field("id", "b1")
            .field("author", WriteObject::new("Author").field("dateOfBirth", "1819"));
        cache.write("Book", &second).unwrap();
    }

    assert_eq!(by_type.export().unwrap(), by_field.export().unwrap());
}

// ---------------------------------------------------------------------------
// Argument-keyed variants
// ---------------------------------------------------------------------------

#[test]
fn key_arguments_separate_variants_and_ignore_the_rest() {
    let config = CacheConfig::new()
        .field_policy("Query", "search", FieldPolicy::new().key_args(["q"]))
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("Query").field_with_args(
        "search",
        args(&[("q", Value::from("dune")), ("token", Value::from("t1"))]),
        vec![WriteValue::from("b1")],
    );
    cache.write("Query", &obj).unwrap();

    let root = EntityKey::new("Query", "@root");
    // Same q, different token: same stored variant.
    assert_eq!(
        cache.read(
            &root,
            "search",
            &args(&[("q", Value::from("dune")), ("token", Value::from("t2"))]),
        ).unwrap(),
        Some(Value::List(vec![Value::from("b1")]))
    );
    // Different q: different variant, not yet written.
    assert_eq!(
        cache.read(&root, "search", &args(&[("q", Value::from("arrakis"))])).unwrap(),
        None
    );

    // A later write differing only in a non-key argument lands on the same
    // variant and supersedes it.
    let refreshed = WriteObject::new("Query").field_with_args(
        "search",
        args(&[("q", Value::from("dune")), ("token", Value::from("t3"))]),
        vec![WriteValue::from("b1"), WriteValue::from("b2")],
    );
    cache.write("Query", &refreshed).unwrap();
    assert_eq!(
        cache.read(&root, "search", &args(&[("q", Value::from("dune"))])).unwrap(),
        Some(Value::List(vec![Value::from("b1"), Value::from("b2")]))
    );
}

#[test]
fn paginated_field_accumulates_under_one_key() {
    let config = CacheConfig::new()
        .field_policy(
            "Query",
            "feed",
            FieldPolicy::new()
                .no_key_args()
                .merge_fn(|existing, incoming, helpers| {
                    let offset = helpers
                        .args()
                        .get("offset")
                        .and_then(Value::as_int)
                        .unwrap_or(0) as usize;
                    let mut items: Vec<Value> = existing
                        .and_then(Value::as_list)
                        .map(<[Value]>::to_vec)
                        .unwrap_or_default();
                    if let Some(new) = incoming.as_list() {
                        if items.len() < offset + new.len() {
                            items.resize(offset + new.len(), Value::Null);
                        }
                        for (i, item) in new.iter().enumerate() {
                            items[offset + i] = item.clone();
                        }
                    }
                    Value::List(items)
                })
                .read(|existing, helpers| {
                    let offset = helpers
                        .args()
                        .get("offset")
                        .and_then(Value::as_int)
                        .unwrap_or(0) as usize;
                    let limit = helpers
                        .args()
                        .get("limit")
                        .and_then(Value::as_int)
                        .map(|n| n as usize)
                        .unwrap_or(usize::MAX);
                    let items = existing?.as_list()?;
                    Some(Value::List(
                        items.iter().skip(offset).take(limit).cloned().collect(),
                    ))
                }),
        )
        .unwrap();
    let cache = Cache::new(config);
    let root = EntityKey::new("Query", "@root");

    let page = |offset: i64, items: &[&str]| {
        WriteObject::new("Query").field_with_args(
            "feed",
            args(&[("offset", Value::Int(offset)), ("limit", Value::Int(2))]),
            items.iter().map(|s| WriteValue::from(*s)).collect::<Vec<_>>(),
        )
    };
    cache.write("Query", &page(0, &["a", "b"])).unwrap();
    cache.write("Query", &page(2, &["c", "d"])).unwrap();

    // A window that spans both written pages.
    assert_eq!(
        cache.read(
            &root,
            "feed",
            &args(&[("offset", Value::Int(1)), ("limit", Value::Int(2))]),
        ).unwrap(),
        Some(Value::List(vec![Value::from("b"), Value::from("c")]))
    );
}

// ---------------------------------------------------------------------------
// Read functions and helper surface
// ---------------------------------------------------------------------------

#[test]
fn read_function_filters_dangling_references() {
    let config = CacheConfig::new()
        .field_policy(
            "User",
            "friends",
            FieldPolicy::new().read(|existing, helpers| {
                let items = existing?.as_list()?;
                Some(Value::List(
                    items.iter().filter(|v| helpers.can_read(v)).cloned().collect(),
                ))
            }),
        )
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("User").field("id", "1").field(
        "friends",
        vec![
            WriteValue::from(Value::Ref(EntityKey::new("User", "2"))),
            WriteValue::from(Value::Ref(EntityKey::new("User", "3"))),
        ],
    );
    cache.write("User", &obj).unwrap();
    cache.write("User", &WriteObject::new("User").field("id", "2")).unwrap();

    let key = EntityKey::new("User", "1");
    // User:3 was never written, so its reference is filtered out.
    assert_eq!(
        cache.read(&key, "friends", &Args::new()).unwrap(),
        Some(Value::List(vec![Value::Ref(EntityKey::new("User", "2"))]))
    );

    cache.write("User", &WriteObject::new("User").field("id", "3")).unwrap();
    assert_eq!(
        cache.read(&key, "friends", &Args::new()).unwrap(),
        Some(Value::List(vec![
            Value::Ref(EntityKey::new("User", "2")),
            Value::Ref(EntityKey::new("User", "3")),
        ]))
    );
}

#[test]
fn merge_function_can_persist_entities_it_builds() {
    let config = CacheConfig::new()
        .field_policy(
            "Post",
            "tag",
            FieldPolicy::new().merge_fn(|_, incoming, helpers| {
                let Some(label) = incoming.as_str() else {
                    return incoming.clone();
                };
                let tag = Value::Object(
                    FieldObject::with_type("Tag")
                        .field("id", label)
                        .field("label", label),
                );
                match helpers.to_reference(&tag, true) {
                    Some(key) => Value::Ref(key),
                    None => incoming.clone(),
                }
            }),
        )
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("Post").field("id", "p1").field("tag", "rust");
    cache.write("Post", &obj).unwrap();

    let tag = EntityKey::new("Tag", "rust");
    assert_eq!(
        cache.read(&EntityKey::new("Post", "p1"), "tag", &Args::new()).unwrap(),
        Some(Value::Ref(tag.clone()))
    );
    assert_eq!(cache.read(&tag, "label", &Args::new()).unwrap(), Some(Value::from("rust")));
}

#[test]
fn persisted_objects_cannot_smuggle_reserved_fields() {
    let config = CacheConfig::new()
        .field_policy(
            "Post",
            "tag",
            FieldPolicy::new().merge_fn(|_, incoming, helpers| {
                let Some(label) = incoming.as_str() else {
                    return incoming.clone();
                };
                // A reserved field inside the object must not reach the store.
                let tag = Value::Object(
                    FieldObject::with_type("Tag")
                        .field("id", label)
                        .field("__typename", "Mallory"),
                );
                match helpers.to_reference(&tag, true) {
                    Some(key) => Value::Ref(key),
                    None => incoming.clone(),
                }
            }),
        )
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("Post").field("id", "p1").field("tag", "t1");
    cache.write("Post", &obj).unwrap();

    // Persistence was refused, so the merge function fell back to the raw
    // value and no Tag entity was created, let alone one with a forged type.
    let tag = EntityKey::new("Tag", "t1");
    assert!(!cache.contains(&tag));
    assert_eq!(
        cache.read(&EntityKey::new("Post", "p1"), "tag", &Args::new()).unwrap(),
        Some(Value::from("t1"))
    );

    // The key stays usable for honest writes.
    cache
        .write("Tag", &WriteObject::new("Tag").field("id", "t1").field("label", "rust"))
        .unwrap();
    assert_eq!(
        cache.read(&tag, "label", &Args::new()).unwrap(),
        Some(Value::from("rust"))
    );
}

#[test]
fn scratch_state_survives_across_operations() {
    let config = CacheConfig::new()
        .field_policy(
            "Page",
            "views",
            FieldPolicy::new().read(|_, helpers| {
                let hits = helpers
                    .scratch_get("hits")
                    .and_then(|v| v.as_int())
                    .unwrap_or(0)
                    + 1;
                helpers.scratch_put("hits", Value::Int(hits));
                Some(Value::Int(hits))
            }),
        )
        .unwrap();
    let cache = Cache::new(config);
    cache.write("Page", &WriteObject::new("Page").field("id", "p1")).unwrap();

    let key = EntityKey::new("Page", "p1");
    for expected in 1..=3 {
        assert_eq!(
            cache.read(&key, "views", &Args::new()).unwrap(),
            Some(Value::Int(expected))
        );
    }

    // The area belongs to the (type, field) policy instance, not to any one
    // entity: another Page continues the same counter.
    cache.write("Page", &WriteObject::new("Page").field("id", "p2")).unwrap();
    assert_eq!(
        cache.read(&EntityKey::new("Page", "p2"), "views", &Args::new()).unwrap(),
        Some(Value::Int(4))
    );
}

#[test]
fn read_function_can_walk_the_graph() {
    let config = CacheConfig::new()
        .field_policy(
            "Book",
            "authorName",
            FieldPolicy::new().read(|_, helpers| {
                let author = helpers.read_field("author")?;
                helpers.read_field_from("name", &author)
            }),
        )
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("Book").field("id", "b1").field(
        "author",
        WriteObject::new("Author").field("id", "a1").field("name", "Gwen"),
    );
    cache.write("Book", &obj).unwrap();

    assert_eq!(
        cache.read(&EntityKey::new("Book", "b1"), "authorName", &Args::new()).unwrap(),
        Some(Value::from("Gwen"))
    );
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn declared_key_fields_build_composite_identities() {
    let config = CacheConfig::new()
        .type_policy("Book", TypePolicy::new().key_fields(["isbn", "edition"]))
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("Book")
        .field("isbn", "0-06")
        .field("edition", 2i64)
        .field("title", "Dune");
    cache.write("Book", &obj).unwrap();

    let key = EntityKey::new("Book", r#"{"isbn":"0-06","edition":2}"#);
    assert_eq!(cache.read(&key, "title", &Args::new()).unwrap(), Some(Value::from("Dune")));
}

#[test]
fn never_normalized_types_stay_inside_their_parent() {
    let config = CacheConfig::new()
        .type_policy("Review", TypePolicy::new().never_normalize())
        .unwrap();
    let cache = Cache::new(config);

    let obj = WriteObject::new("Book").field("id", "b1").field(
        "review",
        WriteObject::new("Review").field("id", "r1").field("stars", 5i64),
    );
    cache.write("Book", &obj).unwrap();

    // No Review entity despite the present id.
    assert!(!cache.contains(&EntityKey::new("Review", "r1")));
    let stored = cache
        .read(&EntityKey::new("Book", "b1"), "review", &Args::new()).unwrap()
        .unwrap();
    assert_eq!(stored.as_object().unwrap().get("stars"), Some(&Value::Int(5)));
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[test]
fn snapshot_json_roundtrip_through_a_fresh_cache() {
    let cache = Cache::new(CacheConfig::new());
    let obj = WriteObject::new("Book")
        .field("id", "b1")
        .field("title", "Dune")
        .field(
            "author",
            WriteObject::new("Author").field("id", "a1").field("name", "Frank"),
        );
    cache.write("Book", &obj).unwrap();

    let json = serde_json::to_string(&cache.export().unwrap()).unwrap();
    let snapshot = serde_json::from_str(&json).unwrap();
    let restored = Cache::new(CacheConfig::new());
    restored.import(&snapshot).unwrap();

    assert_eq!(restored.export().unwrap(), cache.export().unwrap());
    assert_eq!(
        restored.read(&EntityKey::new("Book", "b1"), "author", &Args::new()).unwrap(),
        Some(Value::Ref(EntityKey::new("Author", "a1")))
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn writes_are_idempotent(
        id in "[a-z0-9]{1,6}",
        title in "[a-zA-Z ]{1,12}",
    ) {
        let cache = Cache::new(CacheConfig::new());
        let obj = WriteObject::new("Book")
            .field("id", id.as_str())
            .field("title", title.as_str());
        cache.write("Book", &obj).unwrap();
        let once = cache.export().unwrap();
        cache.write("Book", &obj).unwrap();
        prop_assert_eq!(cache.export().unwrap(), once);
    }

    #[test]
    fn distinct_ids_never_collide(
        a in "[a-z]{1,6}",
        b in "[A-Z]{1,6}",
    ) {
        let cache = Cache::new(CacheConfig::new());
        cache
            .write("Book", &WriteObject::new("Book").field("id", a.as_str()).field("n", 1i64))
            .unwrap();
        cache
            .write("Book", &WriteObject::new("Book").field("id", b.as_str()).field("n", 2i64))
            .unwrap();
        prop_assert_eq!(cache.len(), 2);
        prop_assert_eq!(
            cache.read(&EntityKey::new("Book", &a), "n", &Args::new()).unwrap(),
            Some(Value::Int(1))
        );
    }
}
