//! Concurrent reads from `may` coroutines sharing one data source

mod common;

use std::sync::Arc;

use common::{seeded, PostEx};
use driftwood::{params, Attr};

#[test]
fn test_concurrent_queries_from_coroutines() {
    // SQLite statement preparation needs more than the default coroutine stack
    may::config().set_stack_size(0x10000);
    let ds = Arc::new(seeded());

    let handles: Vec<_> = (0..8_i64)
        .map(|i| {
            let ds = Arc::clone(&ds);
            let id = i % 2 + 1;
            may::go!(move || {
                ds.create_query_builder::<PostEx>("p")
                    .and_then(|qb| {
                        qb.left_join_table("category", "c", "p.category_id = c.id")
                            .select("p.id")
                            .add_select_as("c.name", "p_category_name")
                            .filter("p.id = :id", params! { "id" => id })
                            .get_one()
                    })
                    .map(|post| post.map(|p| (p.id, p.category_name)))
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (id, category_name) = handle
            .join()
            .expect("coroutine panicked")
            .unwrap()
            .expect("post exists");

        if i % 2 == 0 {
            assert_eq!(id, Attr::Set(1));
            assert_eq!(category_name, Attr::Set("Category".to_string()));
        } else {
            assert_eq!(id, Attr::Set(2));
            assert!(category_name.is_null());
        }
    }
}

#[test]
fn test_data_source_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<driftwood::DataSource>();
    assert_send_sync::<driftwood::Registry>();
}
