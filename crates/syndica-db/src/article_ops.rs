use syndica_core::{Article, ArticleId, ArticleStatus, Timestamp};
use tracing::debug;

use crate::{
    ArticleMissingSnafu, Database, DbResult, DuplicateTitleSnafu, DuplicateUrlSnafu,
    LOG_TARGET, StatusTransitionSnafu, articles, articles_by_title, articles_by_url,
    articles_next_id,
};

impl Database {
    /// Insert a new article, enforcing the unique title/source-URL indexes.
    ///
    /// Ingestion-side entry point; the publication batch never inserts.
    pub async fn insert_article(&self, article: &Article) -> DbResult<ArticleId> {
        self.write_with(|tx| {
            let mut articles_t = tx.open_table(&articles::TABLE)?;
            let mut by_title_t = tx.open_table(&articles_by_title::TABLE)?;
            let mut by_url_t = tx.open_table(&articles_by_url::TABLE)?;
            let mut next_id_t = tx.open_table(&articles_next_id::TABLE)?;

            if by_title_t.get(&article.title)?.is_some() {
                return DuplicateTitleSnafu {
                    title: article.title.clone(),
                }
                .fail();
            }
            if let Some(url) = &article.original_url {
                if by_url_t.get(url)?.is_some() {
                    return DuplicateUrlSnafu { url: url.clone() }.fail();
                }
            }

            let id =
                ArticleId::from(next_id_t.first()?.map(|g| g.1.value()).unwrap_or_default());
            next_id_t.insert(&(), &(id.as_u64() + 1))?;

            articles_t.insert(&id, article)?;
            by_title_t.insert(&article.title, &id)?;
            if let Some(url) = &article.original_url {
                by_url_t.insert(url, &id)?;
            }

            debug!(target: LOG_TARGET, %id, title = %article.title, "Inserted article");
            Ok(id)
        })
        .await
    }

    pub async fn get_article(&self, id: ArticleId) -> DbResult<Option<Article>> {
        self.read_with(|tx| {
            let articles_t = tx.open_table(&articles::TABLE)?;
            Ok(articles_t.get(&id)?.map(|g| g.value()))
        })
        .await
    }

    /// All articles still eligible for (re)submission, i.e. `pending` or
    /// `failed`, in insertion (id) order.
    pub async fn get_candidate_articles(&self) -> DbResult<Vec<(ArticleId, Article)>> {
        self.read_with(|tx| {
            let articles_t = tx.open_table(&articles::TABLE)?;

            let mut candidates = Vec::new();
            for result in articles_t.range::<ArticleId>(..)? {
                let (key, value) = result?;
                let article = value.value();
                if article.status != ArticleStatus::Posted {
                    candidates.push((key.value(), article));
                }
            }

            Ok(candidates)
        })
        .await
    }

    /// Move an article to a new publication status.
    ///
    /// `posted` is terminal; an attempt to move away from it is refused with
    /// [`crate::DbError::StatusTransition`]. Moving to `posted` stamps
    /// `published_at`.
    pub async fn mark_article_status(
        &self,
        id: ArticleId,
        status: ArticleStatus,
        now: Timestamp,
    ) -> DbResult<()> {
        self.write_with(|tx| {
            let mut articles_t = tx.open_table(&articles::TABLE)?;
            Self::mark_article_status_tx(id, status, now, &mut articles_t)
        })
        .await
    }

    pub fn mark_article_status_tx(
        id: ArticleId,
        status: ArticleStatus,
        now: Timestamp,
        articles_t: &mut articles::Table,
    ) -> DbResult<()> {
        let Some(mut article) = articles_t.get(&id)?.map(|g| g.value()) else {
            return ArticleMissingSnafu { id }.fail();
        };

        if !article.status.can_transition_to(status) {
            return StatusTransitionSnafu {
                id,
                from: article.status,
                to: status,
            }
            .fail();
        }

        article.status = status;
        if status == ArticleStatus::Posted {
            article.published_at = Some(now);
        }
        articles_t.insert(&id, &article)?;

        debug!(target: LOG_TARGET, %id, %status, "Updated article status");
        Ok(())
    }
}
