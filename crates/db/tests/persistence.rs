//! Integration tests for the user and portfolio repositories.
//!
//! Exercises the repository layer against a real database:
//! - User creation and case-insensitive email lookup
//! - Unique email constraint
//! - Publishing a portfolio bumps the creator's works counter
//! - Feed ordering and view counting

use assert_matches::assert_matches;
use sqlx::PgPool;
use writetalent_db::models::portfolio::CreatePortfolio;
use writetalent_db::models::user::{default_avatar_url, CreateUser, USER_TYPE_CHILD};
use writetalent_db::repositories::{PortfolioRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(username: &str, email: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        user_type: USER_TYPE_CHILD.to_string(),
        age: Some(11),
        avatar: Some(default_avatar_url(username)),
    }
}

fn new_portfolio(user_id: i64, title: &str) -> CreatePortfolio {
    CreatePortfolio {
        user_id,
        title: title.to_string(),
        theme: "fantasy-adventure".to_string(),
        original_idea: "A dragon who is afraid of the dark".to_string(),
        story: "Once upon a time...".to_string(),
        storybook: Some(serde_json::json!({ "pages": 3 })),
        music_url: None,
        video_url: None,
        originality_score: None,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_find_user_by_email_ignoring_case(pool: PgPool) {
    let created = UserRepo::create(&pool, &new_user("Adam", "Adam@Example.com"))
        .await
        .unwrap();
    assert_eq!(created.works_count, 0);

    let found = UserRepo::find_by_email(&pool, "adam@example.com")
        .await
        .unwrap()
        .expect("user should be found");
    assert_eq!(found.id, created.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_violates_unique_index(pool: PgPool) {
    UserRepo::create(&pool, &new_user("Kitty", "kitty@example.com"))
        .await
        .unwrap();
    let err = UserRepo::create(&pool, &new_user("Kitty2", "KITTY@example.com"))
        .await
        .unwrap_err();

    assert_matches!(err, sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn password_update_reports_missing_user(pool: PgPool) {
    let updated = UserRepo::update_password_by_email(&pool, "nobody@example.com", "hash")
        .await
        .unwrap();
    assert!(!updated);
}

// ---------------------------------------------------------------------------
// Portfolios
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn publishing_increments_works_count(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Tony", "tony@example.com"))
        .await
        .unwrap();

    let portfolio = PortfolioRepo::create_published(&pool, &new_portfolio(user.id, "Night"), 88)
        .await
        .unwrap();
    assert_eq!(portfolio.status, "published");
    assert_eq!(portfolio.originality_score, 88);
    assert!(portfolio.published_at.is_some());

    let user = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(user.works_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn publishing_for_unknown_user_rolls_back(pool: PgPool) {
    let err = PortfolioRepo::create_published(&pool, &new_portfolio(999_999, "Ghost"), 70)
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(_));

    let feed = PortfolioRepo::list_published(&pool).await.unwrap();
    assert!(feed.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn feed_joins_creator_and_counts_views(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("Sissi", "sissi@example.com"))
        .await
        .unwrap();
    let first = PortfolioRepo::create_published(&pool, &new_portfolio(user.id, "First"), 80)
        .await
        .unwrap();
    let second = PortfolioRepo::create_published(&pool, &new_portfolio(user.id, "Second"), 90)
        .await
        .unwrap();

    let feed = PortfolioRepo::list_published(&pool).await.unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].portfolio.id, second.id);
    assert_eq!(feed[0].creator_name.as_deref(), Some("Sissi"));
    assert_eq!(feed[0].creator_age, Some(11));

    PortfolioRepo::increment_views(&pool, first.id).await.unwrap();
    let reloaded = PortfolioRepo::find_published_by_id(&pool, first.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.portfolio.views_count, 1);
}
