use syndica_core::{Article, ArticleStatus, Timestamp};
use tempfile::{TempDir, tempdir};

use crate::{Database, DbError, DbResult, run_metadata};

async fn temp_db() -> DbResult<(TempDir, Database)> {
    let dir = tempdir().expect("Failed to create temp dir");
    let db = Database::open(dir.path().join("db.redb")).await?;

    Ok((dir, db))
}

fn build_test_article(title: &str, url: Option<&str>) -> Article {
    Article {
        title: title.to_string(),
        content: format!("<p>Body of {title}</p>"),
        tags: vec!["jobs".to_string()],
        category: Some("careers".to_string()),
        excerpt: None,
        original_url: url.map(ToString::to_string),
        source: None,
        featured_image: None,
        status: ArticleStatus::Pending,
        created_at: Timestamp::from(1_700_000_000),
        published_at: None,
    }
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn insert_enforces_unique_indexes() -> DbResult<()> {
    let (_dir, db) = temp_db().await?;

    db.insert_article(&build_test_article("First", Some("https://a.example/1")))
        .await?;

    let dup_title = db
        .insert_article(&build_test_article("First", Some("https://a.example/2")))
        .await;
    assert!(matches!(dup_title, Err(DbError::DuplicateTitle { .. })));

    let dup_url = db
        .insert_article(&build_test_article("Second", Some("https://a.example/1")))
        .await;
    assert!(matches!(dup_url, Err(DbError::DuplicateUrl { .. })));

    // Articles without a source URL don't participate in the URL index
    db.insert_article(&build_test_article("Third", None)).await?;
    db.insert_article(&build_test_article("Fourth", None)).await?;

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn candidates_exclude_posted_and_keep_insertion_order() -> DbResult<()> {
    let (_dir, db) = temp_db().await?;

    let id_a = db
        .insert_article(&build_test_article("A", Some("https://a.example/a")))
        .await?;
    let id_b = db
        .insert_article(&build_test_article("B", Some("https://a.example/b")))
        .await?;
    let id_c = db
        .insert_article(&build_test_article("C", Some("https://a.example/c")))
        .await?;

    let now = Timestamp::from(1_700_000_100);
    db.mark_article_status(id_b, ArticleStatus::Posted, now)
        .await?;
    db.mark_article_status(id_c, ArticleStatus::Failed, now)
        .await?;

    let candidates = db.get_candidate_articles().await?;
    let ids: Vec<_> = candidates.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![id_a, id_c]);

    let posted = db.get_article(id_b).await?.expect("Article exists");
    assert_eq!(posted.status, ArticleStatus::Posted);
    assert_eq!(posted.published_at, Some(now));

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn posted_is_terminal() -> DbResult<()> {
    let (_dir, db) = temp_db().await?;

    let id = db
        .insert_article(&build_test_article("A", None))
        .await?;

    let now = Timestamp::from(1_700_000_100);
    db.mark_article_status(id, ArticleStatus::Posted, now)
        .await?;

    let back_to_failed = db.mark_article_status(id, ArticleStatus::Failed, now).await;
    assert!(matches!(
        back_to_failed,
        Err(DbError::StatusTransition { .. })
    ));

    let again_posted = db.mark_article_status(id, ArticleStatus::Posted, now).await;
    assert!(matches!(
        again_posted,
        Err(DbError::StatusTransition { .. })
    ));

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn run_timestamp_roundtrip() -> DbResult<()> {
    let (_dir, db) = temp_db().await?;
    let job = "rssPostLastRun";

    assert_eq!(db.get_run_timestamp(job).await?, None);

    let at = Timestamp::from(1_700_000_200);
    db.write_with(|tx| {
        let mut run_metadata_t = tx.open_table(&run_metadata::TABLE)?;
        Database::set_run_timestamp_tx(&job.to_string(), at, &mut run_metadata_t)
    })
    .await?;

    assert_eq!(db.get_run_timestamp(job).await?, Some(at));

    db.delete_run_timestamp(job).await?;
    assert_eq!(db.get_run_timestamp(job).await?, None);

    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn token_upsert_preserves_created_at() -> DbResult<()> {
    let (_dir, db) = temp_db().await?;

    assert_eq!(db.get_refresh_token("blogger").await?, None);

    let first = Timestamp::from(1_700_000_000);
    db.save_refresh_token("blogger", "tok-1", first).await?;
    assert_eq!(
        db.get_refresh_token("blogger").await?,
        Some("tok-1".to_string())
    );

    let later = Timestamp::from(1_700_000_500);
    db.save_refresh_token("blogger", "tok-2", later).await?;
    assert_eq!(
        db.get_refresh_token("blogger").await?,
        Some("tok-2".to_string())
    );

    let record = db
        .read_with(|tx| {
            let oauth_tokens_t = tx.open_table(&crate::oauth_tokens::TABLE)?;
            Ok(oauth_tokens_t
                .get(&"blogger".to_string())?
                .map(|g| g.value()))
        })
        .await?
        .expect("Token record exists");
    assert_eq!(record.created_at, first);
    assert_eq!(record.updated_at, later);

    Ok(())
}
