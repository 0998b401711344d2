//! Identity semantics of the scope cache.

mod common;

use std::sync::Arc;
use std::thread;

use common::{blog_schema, Blog, Post};
use sqlpatch_core::cache::Slot;
use sqlpatch_core::schema::{downcast_arc, Cardinality, Entity};
use sqlpatch_core::{RowKey, ScopeCache};

fn post(post_id: i64, blog_id: i64, title: &str) -> Arc<dyn Entity> {
    Arc::new(Post {
        post_id,
        blog_id,
        title: title.to_string(),
        ..Post::default()
    })
}

fn titles(slot: &Slot) -> Vec<String> {
    slot.entities()
        .iter()
        .filter_map(|e| downcast_arc::<Post>(Arc::clone(e)))
        .map(|p| p.title.clone())
        .collect()
}

#[test]
fn test_same_primary_key_keeps_latest_instance() {
    let sc = ScopeCache::new(blog_schema());
    let key = RowKey::new("posts").with("post_id", 1_i64);

    sc.add_object(post(1, 10, "first"));
    sc.add_object(post(1, 10, "second"));

    let slot = sc.get_object(Cardinality::Singular, &key).unwrap();
    assert_eq!(titles(&slot), vec!["second"]);
}

#[test]
fn test_one_to_many_slots_accumulate() {
    let sc = ScopeCache::new(blog_schema());
    let by_blog = RowKey::new("posts").with("blog_id", 10_i64);

    sc.add_object(post(1, 10, "a"));
    sc.add_object(post(2, 10, "b"));
    sc.add_object(post(3, 11, "c"));

    let slot = sc.get_object(Cardinality::OneToMany, &by_blog).unwrap();
    assert!(slot.one().is_none());
    assert_eq!(titles(&slot), vec!["a", "b"]);

    // The same column values under another cardinality are a separate slot.
    assert!(!sc.has_object(Cardinality::ManyToOne, &by_blog));
    assert!(!sc.has_object(Cardinality::Singular, &by_blog));
}

#[test]
fn test_many_to_one_slot_holds_a_single_entity() {
    let sc = ScopeCache::new(blog_schema());
    let blog: Arc<dyn Entity> = Arc::new(Blog {
        blog_id: 10,
        name: String::from("news"),
        ..Blog::default()
    });
    let key = RowKey::new("blogs").with("blog_id", 10_i64);

    sc.add_object(Arc::clone(&blog));

    let slot = sc.get_object(Cardinality::ManyToOne, &key).unwrap();
    let found = slot.one().unwrap();
    assert!(Arc::ptr_eq(found, &blog));
    assert!(sc.has_object(Cardinality::Singular, &key));
}

#[test]
fn test_remove_clears_every_cardinality() {
    let sc = ScopeCache::new(blog_schema());
    sc.add_object(post(1, 10, "a"));
    assert_eq!(sc.len(), 2);

    sc.remove_object(post(1, 10, "ignored").as_ref());
    assert!(sc.is_empty());
}

#[test]
fn test_concurrent_access() {
    let sc = ScopeCache::new(blog_schema());
    let by_blog = RowKey::new("posts").with("blog_id", 1_i64);

    thread::scope(|s| {
        for worker in 0..4_i64 {
            let sc = &sc;
            s.spawn(move || {
                for i in 0..25_i64 {
                    sc.add_object(post(worker * 100 + i, 1, "t"));
                    let key = RowKey::new("posts").with("blog_id", 1_i64);
                    let _ = sc.has_object(Cardinality::OneToMany, &key);
                }
            });
        }
    });

    let slot = sc.get_object(Cardinality::OneToMany, &by_blog).unwrap();
    assert_eq!(slot.entities().len(), 100);
}
