mod common;

use common::{Category, Comment, HeaderPicture, Post};
use loam::{LoamError, Raw, Value};

#[test]
fn insert_writes_back_the_generated_id() {
    let _db = common::setup();
    let mut post = Post {
        body: "first".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    assert!(post.id > 0);

    let found: Post = loam::find(post.id).unwrap();
    assert_eq!(found, post);
}

#[test]
fn find_missing_row_is_not_found() {
    let _db = common::setup();
    let err = loam::find::<Post, _>(999).unwrap_err();
    assert!(matches!(err, LoamError::NotFound));
}

#[test]
fn save_inserts_then_updates() {
    let _db = common::setup();
    let mut post = Post {
        body: "draft".into(),
        ..Post::default()
    };
    loam::save(&mut post).unwrap();
    let id = post.id;
    assert!(id > 0);

    post.body = "published".into();
    loam::save(&mut post).unwrap();
    assert_eq!(post.id, id);

    let found: Post = loam::find(id).unwrap();
    assert_eq!(found.body, "published");
}

#[test]
fn fill_refreshes_the_entity_in_place() {
    let _db = common::setup();
    let mut post = Post {
        body: "stale".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();

    loam::query::<Post>()
        .unwrap()
        .set("body", "fresh")
        .where_pk(post.id)
        .unwrap()
        .update()
        .unwrap();
    assert_eq!(post.body, "stale");

    loam::fill(&mut post).unwrap();
    assert_eq!(post.body, "fresh");
}

#[test]
fn update_requires_a_primary_key() {
    let _db = common::setup();
    let post = Post::default();
    assert!(matches!(
        loam::update(&post),
        Err(LoamError::Operation(_))
    ));
}

#[test]
fn delete_removes_the_row() {
    let _db = common::setup();
    let mut post = Post {
        body: "gone soon".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    loam::delete(&post).unwrap();
    assert!(matches!(
        loam::find::<Post, _>(post.id),
        Err(LoamError::NotFound)
    ));
}

#[test]
fn insert_all_writes_every_row() {
    let _db = common::setup();
    let posts = vec![
        Post {
            body: "one".into(),
            ..Post::default()
        },
        Post {
            body: "two".into(),
            ..Post::default()
        },
        Post {
            body: "three".into(),
            ..Post::default()
        },
    ];
    loam::insert_all(&posts).unwrap();
    let all: Vec<Post> = loam::query::<Post>().unwrap().all().unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn has_many_returns_the_children() {
    let _db = common::setup();
    let mut post = Post {
        body: "parent".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    let mut other = Post {
        body: "other".into(),
        ..Post::default()
    };
    loam::insert(&mut other).unwrap();

    loam::insert(&mut Comment {
        post_id: post.id,
        body: "yes".into(),
        ..Comment::default()
    })
    .unwrap();
    loam::insert(&mut Comment {
        post_id: post.id,
        body: "no".into(),
        ..Comment::default()
    })
    .unwrap();
    loam::insert(&mut Comment {
        post_id: other.id,
        body: "elsewhere".into(),
        ..Comment::default()
    })
    .unwrap();

    let comments = loam::has_many::<Comment, _>(&post).unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.post_id == post.id));
}

#[test]
fn has_one_returns_the_single_child() {
    let _db = common::setup();
    let mut post = Post {
        body: "with picture".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    loam::insert(&mut HeaderPicture {
        post_id: post.id,
        link: "https://example.com/p.png".into(),
        ..HeaderPicture::default()
    })
    .unwrap();

    let picture = loam::has_one::<HeaderPicture, _>(&post).unwrap();
    assert_eq!(picture.post_id, post.id);

    let mut bare = Post {
        body: "bare".into(),
        ..Post::default()
    };
    loam::insert(&mut bare).unwrap();
    assert!(matches!(
        loam::has_one::<HeaderPicture, _>(&bare),
        Err(LoamError::NotFound)
    ));
}

#[test]
fn belongs_to_walks_back_to_the_owner() {
    let _db = common::setup();
    let mut post = Post {
        body: "owner".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    let mut comment = Comment {
        post_id: post.id,
        body: "child".into(),
        ..Comment::default()
    };
    loam::insert(&mut comment).unwrap();

    let owner = loam::belongs_to::<Post, _>(&comment).unwrap();
    assert_eq!(owner, post);
}

#[test]
fn belongs_to_many_goes_through_the_join_table() {
    let _db = common::setup();
    let mut post = Post {
        body: "tagged".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    let mut rust = Category {
        title: "rust".into(),
        ..Category::default()
    };
    let mut db = Category {
        title: "databases".into(),
        ..Category::default()
    };
    let mut other = Category {
        title: "unrelated".into(),
        ..Category::default()
    };
    loam::insert(&mut rust).unwrap();
    loam::insert(&mut db).unwrap();
    loam::insert(&mut other).unwrap();

    let conn = loam::connection("default").unwrap();
    conn.execute(
        "INSERT INTO post_categories (post_id, category_id) VALUES (?, ?), (?, ?)",
        &[
            Value::Int(post.id),
            Value::Int(rust.id),
            Value::Int(post.id),
            Value::Int(db.id),
        ],
    )
    .unwrap();

    let mut categories = loam::belongs_to_many::<Category, _>(&post).unwrap();
    categories.sort_by_key(|c| c.id);
    assert_eq!(categories, vec![rust, db]);
}

#[test]
fn add_inserts_children_with_the_owner_key() {
    let _db = common::setup();
    let mut post = Post {
        body: "parent".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();

    let comments = vec![
        Comment {
            body: "first".into(),
            ..Comment::default()
        },
        Comment {
            body: "second".into(),
            // a stale foreign key gets overridden by the owner's
            post_id: 999,
            ..Comment::default()
        },
    ];
    loam::add::<Comment, _>(&post, &comments).unwrap();

    let attached = loam::has_many::<Comment, _>(&post).unwrap();
    assert_eq!(attached.len(), 2);
    assert!(attached.iter().all(|c| c.post_id == post.id));
}

#[test]
fn add_rejects_non_owning_relationships() {
    let _db = common::setup();
    let mut post = Post {
        body: "p".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();
    let categories = vec![Category {
        title: "t".into(),
        ..Category::default()
    }];
    assert!(matches!(
        loam::add::<Category, _>(&post, &categories),
        Err(LoamError::Operation(_))
    ));
}

#[test]
fn raw_query_binds_rows() {
    let _db = common::setup();
    let mut post = Post {
        body: "raw".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();

    let posts: Vec<Post> =
        loam::query_raw(Raw::new("SELECT * FROM posts WHERE body = ?", ["raw"])).unwrap();
    assert_eq!(posts, vec![post]);
}

#[test]
fn raw_exec_reports_affected_rows() {
    let _db = common::setup();
    let mut post = Post {
        body: "before".into(),
        ..Post::default()
    };
    loam::insert(&mut post).unwrap();

    let affected = loam::exec_raw::<Post>(Raw::new(
        "UPDATE posts SET body = ? WHERE id = ?",
        [Value::Text("after".into()), Value::Int(post.id)],
    ))
    .unwrap();
    assert_eq!(affected, 1);
    let found: Post = loam::find(post.id).unwrap();
    assert_eq!(found.body, "after");
}
