//! Latest-request-wins runner
//!
//! Interactive callers fire a new transformation while the previous one is
//! still running (the user keeps typing). Starting a run cancels the one before
//! it, and a superseded run never yields a result.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::orchestrator::TextTransformer;
use super::types::{TextTransformationResult, TransformRequest};
use crate::types::{RecastError, Result};

#[derive(Debug, Default)]
pub struct LatestOnly {
    current: Mutex<Option<(u64, CancellationToken)>>,
    next_id: AtomicU64,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the in-flight run, if any, and hand out the token of a new one
    pub fn begin(&self) -> CancellationToken {
        self.begin_tracked().1
    }

    fn begin_tracked(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace((id, token.clone()));
        if let Some((_, previous)) = previous {
            debug!("Superseding in-flight transformation");
            previous.cancel();
        }
        (id, token)
    }

    /// Forget the token of run `id` unless a newer run replaced it
    fn finish(&self, id: u64) {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if current.as_ref().is_some_and(|(current_id, _)| *current_id == id) {
            current.take();
        }
    }

    /// Whether a run started through this runner is still tracked
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Cancel the in-flight run without starting another
    pub fn cancel(&self) {
        if let Some((_, token)) = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            token.cancel();
        }
    }

    /// Run `request`, returning `None` if a newer run superseded it
    pub async fn run(
        &self,
        transformer: &TextTransformer,
        request: &TransformRequest,
        is_dry_run: bool,
    ) -> Result<Option<TextTransformationResult>> {
        let (id, token) = self.begin_tracked();
        let outcome = transformer
            .execute_cancellable(request, is_dry_run, &token)
            .await;
        self.finish(id);
        match outcome {
            Ok(_) if token.is_cancelled() => Ok(None),
            Ok(result) => Ok(Some(result)),
            Err(RecastError::Cancelled) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
