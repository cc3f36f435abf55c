use herald_core::AppError;
use herald_core::models::{AUTHOR, Article, Candidate, Language};
use herald_db::ArticleRepository;

use crate::integration::common::setup_test_db;

fn article(title: &str, body: &str, language: Language) -> Article {
    Article::from_candidate(Candidate::new(title, body).unwrap(), language)
}

#[tokio::test]
async fn add_and_find_by_title() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);

    let id = repo
        .add(&article("BTC breaks 10k", "Price rose overnight", Language::English))
        .await
        .unwrap();
    assert!(id > 0);

    let found = repo
        .find_by_title_or_body("BTC breaks 10k", "something else")
        .await
        .unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.author, AUTHOR);
    assert_eq!(found.body, "Price rose overnight");
    assert_eq!(found.language, Language::English);
}

#[tokio::test]
async fn find_matches_on_body_alone() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);

    let id = repo
        .add(&article("标题", "正文内容", Language::Chinese))
        .await
        .unwrap();

    let found = repo.find_by_title_or_body("另一个标题", "正文内容").await.unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.language, Language::Chinese);
}

#[tokio::test]
async fn find_without_match_is_record_not_found() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);

    let err = repo.find_by_title_or_body("nope", "nothing").await.unwrap_err();
    assert!(matches!(err, AppError::RecordNotFound));
}

#[tokio::test]
async fn find_returns_oldest_of_several_matches() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);

    let first = repo
        .add(&article("shared", "one", Language::Chinese))
        .await
        .unwrap();
    repo.add(&article("shared", "two", Language::Chinese))
        .await
        .unwrap();

    let found = repo.find_by_title_or_body("shared", "x").await.unwrap();
    assert_eq!(found.id, first);
}

#[tokio::test]
async fn update_overwrites_fields() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);

    let id = repo
        .add(&article("old title", "old body", Language::Chinese))
        .await
        .unwrap();

    let replacement = Article {
        id,
        created_at: 1_700_000_000,
        ..article("new title", "new body", Language::Chinese)
    };
    repo.update_by_id(&replacement).await.unwrap();

    let found = repo.find_by_title_or_body("new title", "").await.unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.body, "new body");
    assert_eq!(found.created_at, 1_700_000_000);
}

#[tokio::test]
async fn update_unknown_id_is_record_not_found() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);

    let ghost = Article {
        id: 4242,
        ..article("t", "b", Language::Chinese)
    };
    let err = repo.update_by_id(&ghost).await.unwrap_err();
    assert!(matches!(err, AppError::RecordNotFound));
}

#[tokio::test]
async fn health_check_succeeds() {
    let (pool, _container) = setup_test_db().await;
    let repo = ArticleRepository::new(pool);
    repo.health_check().await.unwrap();
}
