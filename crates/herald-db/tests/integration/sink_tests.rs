use herald_core::models::{Article, Candidate, Language};
use herald_core::{IngestOutcome, IngestStats, IngestionSink};
use herald_db::Database;
use tokio::sync::mpsc;

use crate::integration::common::setup_test_db;

fn article(title: &str, body: &str) -> Article {
    Article::from_candidate(Candidate::new(title, body).unwrap(), Language::Chinese)
}

#[tokio::test]
async fn sink_dedups_against_postgres() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);
    let sink = IngestionSink::new(db.article_repo());

    let first = sink.ingest(article("快讯", "第一版")).await.unwrap();
    let IngestOutcome::Inserted(id) = first else {
        panic!("expected insert, got {first:?}");
    };

    let second = sink.ingest(article("快讯", "第二版")).await.unwrap();
    assert_eq!(second, IngestOutcome::Updated(id));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM article")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sink_run_persists_queue_in_order() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);
    let sink = IngestionSink::new(db.article_repo());
    let (tx, rx) = mpsc::channel(4);

    let producer = tokio::spawn(async move {
        for (title, body) in [("a", "1"), ("b", "2"), ("a", "3")] {
            tx.send(article(title, body)).await.unwrap();
        }
    });

    let stats = sink.run(rx).await;
    producer.await.unwrap();

    assert_eq!(
        stats,
        IngestStats {
            inserted: 2,
            updated: 1,
            failed: 0,
        }
    );

    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT title, body FROM article ORDER BY id")
            .fetch_all(db.pool())
            .await
            .unwrap();
    assert_eq!(
        rows,
        vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
    );
}
