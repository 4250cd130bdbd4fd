//! Sequential replay of the event source through the projector.

use super::router::EventRouter;
use crate::datasource::{DataSourceError, EventSource};
use crate::domain::{EventPosition, LogEvent, ProjectionCursor};
use crate::engine::{Outcome, ProjectionError, Projector};
use crate::store::StoreError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Source(#[from] DataSourceError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts for one `run_to_end` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub dropped: usize,
    pub ignored: usize,
    /// Events from contracts the router does not follow.
    pub unrouted: usize,
    pub last_position: Option<EventPosition>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.applied + self.dropped + self.ignored + self.unrouted
    }
}

/// Applies events one at a time, committing each event's writes together with the cursor so a
/// restart resumes at the first unapplied event.
#[derive(Debug)]
pub struct Runner {
    source: Arc<dyn EventSource>,
    projector: Arc<Projector>,
    router: EventRouter,
    batch_size: usize,
}

impl Runner {
    pub fn new(
        source: Arc<dyn EventSource>,
        projector: Arc<Projector>,
        router: EventRouter,
        batch_size: usize,
    ) -> Self {
        Self {
            source,
            projector,
            router,
            batch_size: batch_size.max(1),
        }
    }

    /// Last fully applied position, if any.
    pub async fn cursor(&self) -> Result<Option<ProjectionCursor>, StoreError> {
        self.projector
            .directory()
            .load::<ProjectionCursor>(ProjectionCursor::ID)
            .await
    }

    /// Drain the source from the persisted cursor.
    ///
    /// # Errors
    /// Stops at the first source or store failure; the cursor stays at the last applied event.
    pub async fn run_to_end(&self) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::default();
        let mut after = self.cursor().await?.map(|c| c.position);
        if let Some(pos) = after {
            info!(cursor = %pos, "Resuming projection");
        }

        loop {
            let batch = self.source.fetch_after(after, self.batch_size).await?;
            if batch.is_empty() {
                break;
            }
            debug!(events = batch.len(), "Fetched event batch");

            for event in &batch {
                let position = event.position();
                // Sources must not redeliver, but never apply anything at or before the cursor
                if after.is_some_and(|cursor| position <= cursor) {
                    continue;
                }
                if let Err(e) = self.apply_and_commit(event, &mut summary).await {
                    self.projector.directory().discard().await;
                    return Err(e);
                }
                after = Some(position);
                summary.last_position = Some(position);
            }
        }

        info!(
            applied = summary.applied,
            dropped = summary.dropped,
            ignored = summary.ignored,
            unrouted = summary.unrouted,
            "Projection caught up"
        );
        Ok(summary)
    }

    /// The event's writes and the cursor land together or not at all.
    async fn apply_and_commit(
        &self,
        event: &LogEvent,
        summary: &mut RunSummary,
    ) -> Result<(), RunnerError> {
        self.apply_one(event, summary).await?;
        self.save_cursor(event).await?;
        self.projector.directory().commit().await?;
        Ok(())
    }

    async fn apply_one(
        &self,
        event: &LogEvent,
        summary: &mut RunSummary,
    ) -> Result<(), RunnerError> {
        if !self.router.accepts(event).await? {
            summary.unrouted += 1;
            return Ok(());
        }
        match self.projector.apply(event).await? {
            Outcome::Applied => summary.applied += 1,
            Outcome::Dropped(_) => summary.dropped += 1,
            Outcome::Ignored => summary.ignored += 1,
        }
        Ok(())
    }

    async fn save_cursor(&self, event: &LogEvent) -> Result<(), StoreError> {
        self.projector
            .directory()
            .save(&ProjectionCursor {
                id: ProjectionCursor::ID.to_string(),
                position: event.position(),
                tx_hash: event.tx_hash.clone(),
                updated_at: chrono::Utc::now().timestamp_millis(),
            })
            .await
    }
}
