#![allow(dead_code)]

//! Shared entities and database setup for the integration tests.
//!
//! Every test initializes a fresh in-memory SQLite connection under the
//! same global registry, so tests serialize on a lock for the duration of
//! their database work.

use std::sync::{Mutex, MutexGuard};

use loam::{
    BelongsToConfig, BelongsToManyConfig, ConnectionConfig, Entity, EntityConfigurator,
    HasManyConfig, HasOneConfig, Model,
};

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Post {
    pub id: i64,
    pub body: String,
}

impl Entity for Post {
    fn configure(c: &mut EntityConfigurator) {
        c.has_many::<Comment>(HasManyConfig::default())
            .has_one::<HeaderPicture>(HasOneConfig::default())
            .belongs_to_many::<Category>(BelongsToManyConfig {
                intermediate_table: "post_categories".into(),
                ..BelongsToManyConfig::default()
            });
    }
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub body: String,
}

impl Entity for Comment {
    fn configure(c: &mut EntityConfigurator) {
        c.belongs_to::<Post>(BelongsToConfig::default());
    }
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct HeaderPicture {
    pub id: i64,
    pub post_id: i64,
    pub link: String,
}

impl Entity for HeaderPicture {
    fn configure(c: &mut EntityConfigurator) {
        c.belongs_to::<Post>(BelongsToConfig::default());
    }
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Category {
    pub id: i64,
    pub title: String,
}

impl Entity for Category {
    fn configure(_c: &mut EntityConfigurator) {}
}

static LOCK: Mutex<()> = Mutex::new(());

const SCHEMA: &[&str] = &[
    "CREATE TABLE posts (id INTEGER PRIMARY KEY, body TEXT)",
    "CREATE TABLE comments (id INTEGER PRIMARY KEY, post_id INTEGER, body TEXT)",
    "CREATE TABLE header_pictures (id INTEGER PRIMARY KEY, post_id INTEGER, link TEXT)",
    "CREATE TABLE categories (id INTEGER PRIMARY KEY, title TEXT)",
    "CREATE TABLE post_categories (post_id INTEGER, category_id INTEGER)",
];

/// Re-initializes the registry with a fresh in-memory database and holds
/// the registry lock until the guard drops.
pub fn setup() -> MutexGuard<'static, ()> {
    let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    loam::initialize(vec![ConnectionConfig::new("default")
        .driver("sqlite", ":memory:")
        .entity::<Post>()
        .entity::<Comment>()
        .entity::<HeaderPicture>()
        .entity::<Category>()])
    .unwrap();
    let conn = loam::connection("default").unwrap();
    for ddl in SCHEMA {
        conn.execute(ddl, &[]).unwrap();
    }
    guard
}
