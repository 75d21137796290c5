//! Shared fixtures: a post/category schema on an in-memory SQLite database.

#![allow(dead_code)]

use driftwood::test_helpers::TestDatabase;
use driftwood::{entity, Attr, DataSource, Repository};

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Post in "post" {
        id: i64 { primary_key() },
        title: String,
        description: String,
        rating: i64,
        category_id: i64 { name("category_id") },
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct PostEx in "post" extends Post {
        category_name: String { select(false) },
        description: String { name("category_description"), select(false) },
    } inherits {
        id: i64,
        title: String,
        rating: i64,
        category_id: i64,
    }
}

entity! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Category in "category" {
        id: i64 { generated() },
        name: String,
        description: String,
    }
}

pub const SCHEMA: &str = "
    CREATE TABLE post (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        rating INTEGER NOT NULL,
        category_id INTEGER NOT NULL
    );
    CREATE TABLE category (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL
    );
";

/// Empty database with `Post`, `PostEx` and `Category` registered
pub fn data_source() -> DataSource {
    TestDatabase::new(SCHEMA)
        .and_then(|db| db.with_entity::<Post>())
        .and_then(|db| db.with_entity::<PostEx>())
        .and_then(|db| db.with_entity::<Category>())
        .expect("test database")
        .into_data_source()
}

pub fn post(id: i64, category_id: i64) -> Post {
    Post {
        id: Attr::Set(id),
        title: Attr::Set("Post".to_string()),
        description: Attr::Set("Post description".to_string()),
        rating: Attr::Set(0),
        category_id: Attr::Set(category_id),
    }
}

/// Posts 1 and 2 (in categories 1 and 2) plus category 1 only
pub fn seeded() -> DataSource {
    let ds = data_source();
    {
        let posts: Repository<'_, Post> = ds.repository().expect("post repository");
        posts.save(post(1, 1)).expect("save post 1");
        posts.save(post(2, 2)).expect("save post 2");

        let categories: Repository<'_, Category> = ds.repository().expect("category repository");
        categories
            .save(Category {
                id: Attr::Set(1),
                name: Attr::Set("Category".to_string()),
                description: Attr::Set("Category description".to_string()),
            })
            .expect("save category 1");
    }
    ds
}
