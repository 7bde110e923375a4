use syndica_core::Timestamp;
use tracing::debug;

use crate::{Database, DbResult, LOG_TARGET, OAuthTokenRecord, oauth_tokens, run_metadata};

impl Database {
    pub async fn get_run_timestamp(&self, job: &str) -> DbResult<Option<Timestamp>> {
        let job = job.to_string();
        self.read_with(|tx| {
            let run_metadata_t = tx.open_table(&run_metadata::TABLE)?;
            Self::get_run_timestamp_tx(&job, &run_metadata_t)
        })
        .await
    }

    pub fn get_run_timestamp_tx(
        job: &String,
        run_metadata_t: &impl run_metadata::ReadableTable,
    ) -> DbResult<Option<Timestamp>> {
        Ok(run_metadata_t.get(job)?.map(|g| g.value()))
    }

    pub fn set_run_timestamp_tx(
        job: &String,
        at: Timestamp,
        run_metadata_t: &mut run_metadata::Table,
    ) -> DbResult<()> {
        run_metadata_t.insert(job, &at)?;
        debug!(target: LOG_TARGET, %job, %at, "Recorded run timestamp");
        Ok(())
    }

    /// Forget a job's run history, so the next gate evaluation treats it as
    /// never having run.
    pub async fn delete_run_timestamp(&self, job: &str) -> DbResult<()> {
        let job = job.to_string();
        self.write_with(|tx| {
            let mut run_metadata_t = tx.open_table(&run_metadata::TABLE)?;
            run_metadata_t.remove(&job)?;
            debug!(target: LOG_TARGET, %job, "Deleted run timestamp");
            Ok(())
        })
        .await
    }

    /// Upsert a provider's refresh token, preserving `created_at` across
    /// re-authorizations.
    pub async fn save_refresh_token(
        &self,
        provider: &str,
        refresh_token: &str,
        now: Timestamp,
    ) -> DbResult<()> {
        let provider = provider.to_string();
        let refresh_token = refresh_token.to_string();
        self.write_with(|tx| {
            let mut oauth_tokens_t = tx.open_table(&oauth_tokens::TABLE)?;

            let created_at = oauth_tokens_t
                .get(&provider)?
                .map(|g| g.value().created_at)
                .unwrap_or(now);

            oauth_tokens_t.insert(
                &provider,
                &OAuthTokenRecord {
                    refresh_token,
                    created_at,
                    updated_at: now,
                },
            )?;

            debug!(target: LOG_TARGET, %provider, "Saved refresh token");
            Ok(())
        })
        .await
    }

    pub async fn get_refresh_token(&self, provider: &str) -> DbResult<Option<String>> {
        let provider = provider.to_string();
        self.read_with(|tx| {
            let oauth_tokens_t = tx.open_table(&oauth_tokens::TABLE)?;
            Ok(oauth_tokens_t.get(&provider)?.map(|g| g.value().refresh_token))
        })
        .await
    }
}
