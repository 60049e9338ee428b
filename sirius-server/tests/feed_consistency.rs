// End-to-end consistency checks for the feed pipeline against a real
// in-memory database: like counts always match the like rows, comment
// threads resolve display names, and toggles are idempotent round trips.

use chrono::Utc;
use uuid::Uuid;

use sirius_server::db::repositories::{
    AccountRepository, CommentRepository, LikeRepository, PostRepository, ProfileRepository,
};
use sirius_server::db::Database;
use sirius_server::feed::load_feed;
use sirius_server::profile::{display_alias, ProfileResolver};
use sirius_types::{Account, Comment, Post, Profile};

fn test_db() -> Database {
    let db = Database::in_memory().expect("in-memory database");
    db.initialize().expect("schema");
    db
}

fn make_user(db: &Database, full_name: Option<&str>, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    AccountRepository::new(db.pool.clone())
        .create(&Account {
            id,
            email: email.to_string(),
            password_hash: "x".to_string(),
            created_at: Utc::now(),
        })
        .expect("account");
    ProfileRepository::new(db.pool.clone())
        .upsert(&Profile {
            id,
            full_name: full_name.map(String::from),
            career: None,
            email: Some(email.to_string()),
        })
        .expect("profile");
    id
}

fn make_post(db: &Database, author_id: Uuid, content: &str) -> Uuid {
    let id = Uuid::new_v4();
    PostRepository::new(db.pool.clone())
        .create(&Post {
            id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now(),
            likes_count: 0,
            comments_count: 0,
        })
        .expect("post");
    id
}

#[test]
fn test_double_toggle_restores_state_and_count() {
    let db = test_db();
    let author = make_user(&db, Some("Ana Reyes"), "ana@uni.example");
    let viewer = make_user(&db, Some("Luis Soto"), "luis@uni.example");
    let post_id = make_post(&db, author, "first post");

    let likes = LikeRepository::new(db.pool.clone());

    assert!(likes.toggle(&post_id, &viewer).unwrap());
    assert_eq!(likes.count_for_post(&post_id).unwrap(), 1);

    assert!(!likes.toggle(&post_id, &viewer).unwrap());
    assert_eq!(likes.count_for_post(&post_id).unwrap(), 0);
}

#[test]
fn test_duplicate_like_insert_leaves_one_row() {
    let db = test_db();
    let author = make_user(&db, None, "author@uni.example");
    let viewer = make_user(&db, None, "viewer@uni.example");
    let post_id = make_post(&db, author, "race me");

    let likes = LikeRepository::new(db.pool.clone());

    // Both arms of a lost race report success; only one row survives
    likes.insert(&post_id, &viewer).unwrap();
    likes.insert(&post_id, &viewer).unwrap();

    assert_eq!(likes.count_for_post(&post_id).unwrap(), 1);
}

#[test]
fn test_feed_counts_come_from_child_rows_not_counters() {
    let db = test_db();
    let author = make_user(&db, Some("Ana Reyes"), "ana@uni.example");
    let fan = make_user(&db, None, "fan@uni.example");
    let post_id = make_post(&db, author, "popular post");

    LikeRepository::new(db.pool.clone())
        .insert(&post_id, &fan)
        .unwrap();
    CommentRepository::new(db.pool.clone())
        .create(&Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id: fan,
            content: "nice".to_string(),
            created_at: Utc::now(),
        })
        .unwrap();

    // Corrupt the denormalized columns; the feed must not believe them
    let conn = db.connection().unwrap();
    conn.execute(
        "UPDATE posts SET likes_count = 99, comments_count = 42 WHERE id = ?",
        [post_id.to_string()],
    )
    .unwrap();
    drop(conn);

    let feed = load_feed(&db.pool, None).unwrap();
    let entry = feed.iter().find(|p| p.id == post_id).unwrap();
    assert_eq!(entry.likes, 1);
    assert_eq!(entry.comments, 1);
}

#[test]
fn test_feed_is_newest_first_with_viewer_flags() {
    let db = test_db();
    let author = make_user(&db, Some("Ana Reyes"), "ana@uni.example");
    let viewer = make_user(&db, None, "viewer@uni.example");

    let older = Uuid::new_v4();
    PostRepository::new(db.pool.clone())
        .create(&Post {
            id: older,
            author_id: author,
            content: "older".to_string(),
            created_at: Utc::now() - chrono::Duration::hours(2),
            likes_count: 0,
            comments_count: 0,
        })
        .unwrap();
    let newer = make_post(&db, author, "newer");

    LikeRepository::new(db.pool.clone())
        .insert(&older, &viewer)
        .unwrap();

    let feed = load_feed(&db.pool, Some(viewer)).unwrap();
    assert_eq!(feed[0].id, newer);
    assert_eq!(feed[1].id, older);
    assert!(!feed[0].liked_by_me);
    assert!(feed[1].liked_by_me);
    assert_eq!(feed[0].author, "Ana Reyes");
}

#[test]
fn test_comment_hello_appears_first_with_display_name() {
    let db = test_db();
    let author = make_user(&db, Some("Ana Reyes"), "ana@uni.example");
    let commenter = make_user(&db, Some("Luis Soto"), "luis@uni.example");
    let post_id = make_post(&db, author, "say something");

    let comments = CommentRepository::new(db.pool.clone());
    let before = comments.count_for_post(&post_id).unwrap();

    comments
        .create(&Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id: commenter,
            content: "hello".to_string(),
            created_at: Utc::now(),
        })
        .unwrap();

    let thread = comments.recent_for_post(&post_id, 10).unwrap();
    assert_eq!(thread[0].content, "hello");

    let resolver = ProfileResolver::new(db.pool.clone());
    let profiles = resolver.resolve(&[commenter]).unwrap();
    assert_eq!(
        display_alias(profiles.get(&commenter), &commenter),
        "Luis Soto"
    );

    assert_eq!(comments.count_for_post(&post_id).unwrap(), before + 1);
}
