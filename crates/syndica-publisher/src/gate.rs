use std::sync::Arc;

use syndica_core::Timestamp;
use syndica_db::{Database, DbResult, run_metadata};
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

const LOG_TARGET: &str = "syndica::gate";

/// Job name the publication batch records its run history under.
pub const DEFAULT_RUN_JOB: &str = "rssPostLastRun";

/// Time of day (at the gate's configured offset) the batch is allowed to run.
///
/// The external scheduler may fire far more often than once a day; everything
/// outside this minute is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub hour: u8,
    pub minute: u8,
}

impl Default for RunWindow {
    fn default() -> Self {
        Self {
            hour: 23,
            minute: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Run,
    OutsideWindow,
    AlreadyRan { hour: u8 },
}

impl GateDecision {
    pub fn is_run(self) -> bool {
        self == GateDecision::Run
    }
}

/// Decide whether a run is permitted at `now` given the recorded `last_run`.
///
/// Refused outside the window, and refused again within the same calendar day
/// and hour as the recorded last run.
pub fn evaluate(
    now: OffsetDateTime,
    last_run: Option<OffsetDateTime>,
    window: RunWindow,
) -> GateDecision {
    if now.hour() != window.hour || now.minute() != window.minute {
        return GateDecision::OutsideWindow;
    }

    if let Some(last_run) = last_run {
        if last_run.date() == now.date() && last_run.hour() == now.hour() {
            return GateDecision::AlreadyRan { hour: now.hour() };
        }
    }

    GateDecision::Run
}

/// Once-per-window gate over persisted run metadata.
pub struct RunGate {
    db: Arc<Database>,
    job: String,
    window: RunWindow,
    offset: UtcOffset,
}

impl RunGate {
    pub fn new(db: Arc<Database>, job: String, window: RunWindow, offset: UtcOffset) -> Self {
        Self {
            db,
            job,
            window,
            offset,
        }
    }

    /// Evaluate the policy and, when permitted, record `now` as the last run.
    ///
    /// Both happen inside one write transaction, so two racing invocations
    /// cannot both observe the old `last_run` and proceed.
    pub async fn check_and_mark(&self, now: Timestamp) -> DbResult<GateDecision> {
        self.db
            .write_with(|tx| {
                let mut run_metadata_t = tx.open_table(&run_metadata::TABLE)?;

                let last_run = Database::get_run_timestamp_tx(&self.job, &run_metadata_t)?;
                let decision = evaluate(
                    now.to_datetime(self.offset),
                    last_run.map(|ts| ts.to_datetime(self.offset)),
                    self.window,
                );

                if decision.is_run() {
                    Database::set_run_timestamp_tx(&self.job, now, &mut run_metadata_t)?;
                }

                debug!(target: LOG_TARGET, job = %self.job, ?decision, "Gate evaluated");
                Ok(decision)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn refuses_outside_the_window() {
        let window = RunWindow::default();

        assert_eq!(
            evaluate(datetime!(2026-03-10 10:00 UTC), None, window),
            GateDecision::OutsideWindow
        );
        assert_eq!(
            evaluate(datetime!(2026-03-10 23:31 UTC), None, window),
            GateDecision::OutsideWindow
        );
    }

    #[test]
    fn permits_first_run_in_window() {
        assert_eq!(
            evaluate(datetime!(2026-03-10 23:30 UTC), None, RunWindow::default()),
            GateDecision::Run
        );
    }

    #[test]
    fn refuses_same_day_same_hour_rerun() {
        let now = datetime!(2026-03-10 23:30 UTC);
        let last_run = datetime!(2026-03-10 23:30 UTC);

        assert_eq!(
            evaluate(now, Some(last_run), RunWindow::default()),
            GateDecision::AlreadyRan { hour: 23 }
        );
    }

    #[test]
    fn permits_rerun_on_a_later_day() {
        let now = datetime!(2026-03-11 23:30 UTC);
        let last_run = datetime!(2026-03-10 23:30 UTC);

        assert_eq!(
            evaluate(now, Some(last_run), RunWindow::default()),
            GateDecision::Run
        );
    }

    #[test]
    fn permits_rerun_in_a_different_hour() {
        let window = RunWindow {
            hour: 9,
            minute: 0,
        };
        // same day, but the last run was an hour earlier
        let now = datetime!(2026-03-10 09:00 UTC);
        let last_run = datetime!(2026-03-10 08:00 UTC);

        assert_eq!(evaluate(now, Some(last_run), window), GateDecision::Run);
    }
}
