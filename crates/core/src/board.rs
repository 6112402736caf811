//! The published storyboard and its watch channel.
//!
//! [`BoardPublisher`] wraps a `tokio::sync::watch` channel. Every change is
//! applied to the channel's value under its lock, so receivers always see a
//! whole, consistent [`Storyboard`]. Updates that change nothing are not
//! published and do not wake receivers.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::scene::{Scene, SceneStatus, SceneUpdate};
use crate::types::RunId;

// ---------------------------------------------------------------------------
// Storyboard
// ---------------------------------------------------------------------------

/// Snapshot of the most recent generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Storyboard {
    /// Run that produced these scenes; `None` before the first run.
    pub run_id: Option<RunId>,
    /// Scenes in segmentation order.
    pub scenes: Vec<Scene>,
    /// Set while a run is segmenting or waiting on image requests.
    pub busy: bool,
    /// Why the last run failed as a whole (segmentation failure).
    pub error: Option<String>,
}

/// Per-status scene counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SceneCounts {
    pub pending: usize,
    pub generating: usize,
    pub completed: usize,
    pub error: usize,
}

impl Storyboard {
    /// Fresh board for a run that has just started segmenting.
    pub fn started(run_id: RunId) -> Self {
        Self {
            run_id: Some(run_id),
            scenes: Vec::new(),
            busy: true,
            error: None,
        }
    }

    /// Route `update` to the scene it names.
    ///
    /// Returns `true` when a scene changed; unknown ids and transitions the
    /// lifecycle forbids leave the board untouched.
    pub fn apply(&mut self, update: &SceneUpdate) -> bool {
        self.scenes
            .iter_mut()
            .find(|scene| scene.id == update.scene_id())
            .is_some_and(|scene| scene.apply(update))
    }

    /// Every scene is `completed` or `error`.
    pub fn is_settled(&self) -> bool {
        self.scenes.iter().all(|scene| scene.status.is_terminal())
    }

    pub fn counts(&self) -> SceneCounts {
        self.scenes
            .iter()
            .fold(SceneCounts::default(), |mut counts, scene| {
                match scene.status {
                    SceneStatus::Pending => counts.pending += 1,
                    SceneStatus::Generating => counts.generating += 1,
                    SceneStatus::Completed => counts.completed += 1,
                    SceneStatus::Error => counts.error += 1,
                }
                counts
            })
    }
}

// ---------------------------------------------------------------------------
// BoardPublisher
// ---------------------------------------------------------------------------

/// Shared handle to the live storyboard.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct BoardPublisher {
    sender: Arc<watch::Sender<Storyboard>>,
}

impl BoardPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Storyboard::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Storyboard> {
        self.sender.subscribe()
    }

    /// Clone of the current board.
    pub fn snapshot(&self) -> Storyboard {
        self.sender.borrow().clone()
    }

    /// Replace the whole board.
    pub fn replace(&self, board: Storyboard) {
        self.sender.send_replace(board);
    }

    /// Apply a scene update belonging to `run_id`.
    ///
    /// Updates from a run that is no longer on the board are dropped.
    pub fn publish(&self, run_id: RunId, update: &SceneUpdate) -> bool {
        self.sender
            .send_if_modified(|board| board.run_id == Some(run_id) && board.apply(update))
    }

    /// Mutate board-level fields of `run_id`'s board.
    ///
    /// `f` returns whether it changed anything.
    pub fn modify_run(&self, run_id: RunId, f: impl FnOnce(&mut Storyboard) -> bool) -> bool {
        self.sender.send_if_modified(|board| {
            if board.run_id != Some(run_id) {
                return false;
            }
            f(board)
        })
    }
}

impl Default for BoardPublisher {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ImageData;

    fn board_with(statuses: &[SceneStatus]) -> Storyboard {
        let mut board = Storyboard::started(RunId::new_v4());
        board.scenes = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Scene::new(format!("scene {i}"), *status))
            .collect();
        board
    }

    #[test]
    fn started_board_is_busy_and_empty() {
        let run_id = RunId::new_v4();
        let board = Storyboard::started(run_id);
        assert_eq!(board.run_id, Some(run_id));
        assert!(board.busy);
        assert!(board.scenes.is_empty());
        assert!(board.error.is_none());
    }

    #[test]
    fn counts_group_by_status() {
        let board = board_with(&[
            SceneStatus::Generating,
            SceneStatus::Completed,
            SceneStatus::Completed,
            SceneStatus::Error,
        ]);
        assert_eq!(
            board.counts(),
            SceneCounts {
                pending: 0,
                generating: 1,
                completed: 2,
                error: 1,
            }
        );
        assert!(!board.is_settled());
    }

    #[test]
    fn empty_board_is_settled() {
        assert!(Storyboard::default().is_settled());
    }

    #[test]
    fn apply_only_touches_named_scene() {
        let mut board = board_with(&[SceneStatus::Generating, SceneStatus::Generating]);
        let target = board.scenes[1].id;

        assert!(board.apply(&SceneUpdate::Failed {
            scene_id: target,
            reason: "boom".into(),
        }));

        assert_eq!(board.scenes[0].status, SceneStatus::Generating);
        assert_eq!(board.scenes[1].status, SceneStatus::Error);
    }

    #[tokio::test]
    async fn publishing_wakes_receivers() {
        let publisher = BoardPublisher::new();
        let board = board_with(&[SceneStatus::Generating]);
        let run_id = board.run_id.unwrap();
        let scene_id = board.scenes[0].id;
        publisher.replace(board);

        let mut rx = publisher.subscribe();
        rx.mark_unchanged();

        let update = SceneUpdate::Completed {
            scene_id,
            image: ImageData::jpeg_base64("AAAA"),
        };
        assert!(publisher.publish(run_id, &update));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().scenes[0].status, SceneStatus::Completed);
    }

    #[tokio::test]
    async fn republishing_settled_board_is_a_no_op() {
        let publisher = BoardPublisher::new();
        let board = board_with(&[SceneStatus::Generating, SceneStatus::Generating]);
        let run_id = board.run_id.unwrap();
        let updates: Vec<SceneUpdate> = board
            .scenes
            .iter()
            .map(|scene| SceneUpdate::Completed {
                scene_id: scene.id,
                image: ImageData::jpeg_base64("AAAA"),
            })
            .collect();
        publisher.replace(board);

        for update in &updates {
            assert!(publisher.publish(run_id, update));
        }
        let settled = publisher.snapshot();

        let mut rx = publisher.subscribe();
        rx.mark_unchanged();
        for update in &updates {
            assert!(!publisher.publish(run_id, update));
        }

        assert!(!rx.has_changed().unwrap());
        assert_eq!(publisher.snapshot(), settled);
        assert_eq!(settled.scenes.len(), 2);
    }

    #[test]
    fn updates_from_stale_run_are_dropped() {
        let publisher = BoardPublisher::new();
        let board = board_with(&[SceneStatus::Generating]);
        let scene_id = board.scenes[0].id;
        publisher.replace(board);

        let stale = SceneUpdate::Failed {
            scene_id,
            reason: "old run".into(),
        };
        assert!(!publisher.publish(RunId::new_v4(), &stale));
        assert_eq!(publisher.snapshot().scenes[0].status, SceneStatus::Generating);
    }
}
