//! Storyboard generation: segmentation, then one image request per scene.
//!
//! A run has two phases. [`StoryboardOrchestrator::begin`] validates the
//! script, segments it and publishes the initial scenes. The returned
//! [`GenerationRun`] then issues every image request and waits for all of
//! them with [`GenerationRun::finish`]. Callers that do not need the split
//! use [`StoryboardOrchestrator::generate`].
//!
//! Only one run may be in flight; a second `begin` is rejected with
//! [`CoreError::Conflict`] until the first run settles or is dropped.
//! A run abandoned midway (its future or its [`GenerationRun`] dropped)
//! still settles the board: unfinished scenes become `error` and the busy
//! state clears.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::board::{BoardPublisher, Storyboard};
use crate::collaborator::{CollaboratorError, ImageSynthesizer, ScriptSegmenter};
use crate::error::CoreError;
use crate::scene::{Scene, SceneStatus, SceneUpdate};
use crate::types::{RunId, SceneId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Upper bound on image requests in flight at once. `None` issues every
    /// request immediately.
    pub max_concurrent_images: Option<usize>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of a settled run.
///
/// A run that produced scenes always settles successfully, however many
/// individual images failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub run_id: RunId,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Busy flag
// ---------------------------------------------------------------------------

/// Holds the orchestrator's busy flag for the lifetime of one run.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The in-flight run, if any, and the token that cancels it.
type ActiveRun = Arc<Mutex<Option<(RunId, CancellationToken)>>>;

fn clear_active(active: &ActiveRun, run_id: RunId) {
    let mut active = active.lock().unwrap_or_else(PoisonError::into_inner);
    if active.as_ref().is_some_and(|(id, _)| *id == run_id) {
        *active = None;
    }
}

/// Board-level error text for a run whose segmentation did not succeed.
fn script_failure(cause: &CollaboratorError) -> String {
    format!("Failed to process script. {cause}")
}

// ---------------------------------------------------------------------------
// Run lease
// ---------------------------------------------------------------------------

/// Ownership of the orchestrator for one run, from `begin` until the board
/// settles.
///
/// The busy flag and the cancellation slot are released before the settled
/// board is published. A lease dropped without settling settles itself as
/// cancelled.
struct RunLease {
    run_id: RunId,
    board: BoardPublisher,
    active: ActiveRun,
    busy: Option<BusyGuard>,
    segmented: bool,
}

impl RunLease {
    fn settle(&mut self, error: Option<String>) {
        let Some(guard) = self.busy.take() else {
            return;
        };
        clear_active(&self.active, self.run_id);
        drop(guard);

        let reason = CollaboratorError::Cancelled.to_string();
        self.board.modify_run(self.run_id, |board| {
            let mut changed = false;
            for scene in &mut board.scenes {
                if !scene.status.is_terminal() {
                    let scene_id = scene.id;
                    changed |= scene.apply(&SceneUpdate::Failed {
                        scene_id,
                        reason: reason.clone(),
                    });
                }
            }
            if board.busy {
                board.busy = false;
                changed = true;
            }
            if error.is_some() {
                board.error = error;
                changed = true;
            }
            changed
        });
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        if self.busy.is_none() {
            return;
        }
        tracing::warn!(
            run_id = %self.run_id,
            segmented = self.segmented,
            "Storyboard run abandoned before settling"
        );
        let error = (!self.segmented).then(|| script_failure(&CollaboratorError::Cancelled));
        self.settle(error);
    }
}

// ---------------------------------------------------------------------------
// StoryboardOrchestrator
// ---------------------------------------------------------------------------

pub struct StoryboardOrchestrator {
    segmenter: Arc<dyn ScriptSegmenter>,
    synthesizer: Arc<dyn ImageSynthesizer>,
    config: OrchestratorConfig,
    board: BoardPublisher,
    busy: Arc<AtomicBool>,
    active: ActiveRun,
}

impl StoryboardOrchestrator {
    pub fn new(
        segmenter: Arc<dyn ScriptSegmenter>,
        synthesizer: Arc<dyn ImageSynthesizer>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            segmenter,
            synthesizer,
            config,
            board: BoardPublisher::new(),
            busy: Arc::new(AtomicBool::new(false)),
            active: Arc::default(),
        }
    }

    /// Receiver that observes every change to the storyboard.
    pub fn subscribe(&self) -> watch::Receiver<Storyboard> {
        self.board.subscribe()
    }

    pub fn snapshot(&self) -> Storyboard {
        self.board.snapshot()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run the whole pipeline and wait for every image to settle.
    pub async fn generate(&self, script: &str) -> Result<GenerationReport, CoreError> {
        let run = self.begin(script).await?;
        Ok(run.finish().await)
    }

    /// Validate and segment `script`, then publish one scene per
    /// description.
    ///
    /// Fails with [`CoreError::Validation`] for a blank script (no model is
    /// called), [`CoreError::Conflict`] while another run is in flight, and
    /// [`CoreError::Segmentation`] when the segmenter fails; in every error
    /// case no scenes are created.
    pub async fn begin(&self, script: &str) -> Result<GenerationRun, CoreError> {
        if script.trim().is_empty() {
            return Err(CoreError::Validation(
                "script must not be empty".to_string(),
            ));
        }

        let guard = BusyGuard::acquire(&self.busy).ok_or_else(|| {
            CoreError::Conflict("a storyboard generation is already in progress".to_string())
        })?;

        let run_id = RunId::new_v4();
        let cancel = CancellationToken::new();
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((run_id, cancel.clone()));
        self.board.replace(Storyboard::started(run_id));
        let mut lease = RunLease {
            run_id,
            board: self.board.clone(),
            active: Arc::clone(&self.active),
            busy: Some(guard),
            segmented: false,
        };

        tracing::info!(%run_id, script_len = script.len(), "Segmenting script");

        let segmented = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CollaboratorError::Cancelled),
            result = self.segmenter.segment(script) => result,
        };

        let descriptions = match segmented {
            Ok(descriptions) => descriptions,
            Err(e) => {
                tracing::error!(%run_id, error = %e, "Script segmentation failed");
                lease.settle(Some(script_failure(&e)));
                return Err(CoreError::Segmentation(e));
            }
        };

        let initial_status = match self.config.max_concurrent_images {
            Some(_) => SceneStatus::Pending,
            None => SceneStatus::Generating,
        };
        let scenes: Vec<Scene> = descriptions
            .into_iter()
            .map(|d| Scene::new(d.description, initial_status))
            .collect();

        tracing::info!(%run_id, scene_count = scenes.len(), "Script segmented");

        self.board.modify_run(run_id, |board| {
            board.scenes = scenes.clone();
            true
        });
        lease.segmented = true;

        Ok(GenerationRun {
            run_id,
            scenes,
            synthesizer: Arc::clone(&self.synthesizer),
            board: self.board.clone(),
            max_concurrent: self.config.max_concurrent_images,
            cancel,
            lease,
        })
    }

    /// Cancel the in-flight run.
    ///
    /// Returns the cancelled run's id, or `None` when nothing was running.
    pub async fn cancel_current(&self) -> Option<RunId> {
        let (run_id, cancel) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()?;
        tracing::info!(%run_id, "Cancelling storyboard generation");
        cancel.cancel();
        Some(run_id)
    }
}

// ---------------------------------------------------------------------------
// GenerationRun
// ---------------------------------------------------------------------------

/// A segmented run whose images have not been requested yet.
///
/// Holds the orchestrator's busy flag until it is finished or dropped.
/// Dropping it settles every unfinished scene as `error`.
pub struct GenerationRun {
    run_id: RunId,
    scenes: Vec<Scene>,
    synthesizer: Arc<dyn ImageSynthesizer>,
    board: BoardPublisher,
    max_concurrent: Option<usize>,
    cancel: CancellationToken,
    lease: RunLease,
}

impl std::fmt::Debug for GenerationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRun")
            .field("run_id", &self.run_id)
            .field("scenes", &self.scenes)
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl GenerationRun {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Scenes as first published, in segmentation order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Request every image and wait until all of them settled.
    ///
    /// Each scene's outcome is published as soon as it is known. Image
    /// failures are recorded on their scene and never abort siblings.
    pub async fn finish(mut self) -> GenerationReport {
        let run_id = self.run_id;
        let total = self.scenes.len();

        let requests: Vec<_> = self
            .scenes
            .iter()
            .map(|scene| {
                synthesize_scene(
                    run_id,
                    scene.id,
                    &scene.description,
                    self.synthesizer.as_ref(),
                    &self.board,
                    &self.cancel,
                )
            })
            .collect();

        let outcomes: Vec<bool> = match self.max_concurrent {
            None => futures::future::join_all(requests).await,
            Some(limit) => {
                stream::iter(requests)
                    .buffer_unordered(limit.max(1))
                    .collect()
                    .await
            }
        };

        let completed = outcomes.iter().filter(|ok| **ok).count();
        let report = GenerationReport {
            run_id,
            total,
            completed,
            failed: total - completed,
            cancelled: self.cancel.is_cancelled(),
        };

        self.lease.settle(None);

        tracing::info!(
            %run_id,
            total = report.total,
            completed = report.completed,
            failed = report.failed,
            cancelled = report.cancelled,
            "Storyboard generation settled"
        );

        report
    }
}

/// Request one image and publish its outcome. Returns whether it succeeded.
async fn synthesize_scene(
    run_id: RunId,
    scene_id: SceneId,
    description: &str,
    synthesizer: &dyn ImageSynthesizer,
    board: &BoardPublisher,
    cancel: &CancellationToken,
) -> bool {
    board.publish(run_id, &SceneUpdate::Dispatched { scene_id });

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CollaboratorError::Cancelled),
        result = synthesizer.synthesize(description) => result,
    };

    match result {
        Ok(image) => {
            tracing::debug!(%run_id, %scene_id, "Scene image generated");
            board.publish(run_id, &SceneUpdate::Completed { scene_id, image });
            true
        }
        Err(e) => {
            tracing::warn!(%run_id, %scene_id, error = %e, "Scene image generation failed");
            board.publish(
                run_id,
                &SceneUpdate::Failed {
                    scene_id,
                    reason: e.to_string(),
                },
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
