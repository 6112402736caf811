//! In-process fakes for the collaborator traits.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::collaborator::{
    ChatCollaborator, CollaboratorError, ImageSynthesizer, SceneDescription, ScriptSegmenter,
};
use crate::conversation::ChatHandle;
use crate::scene::ImageData;

// ---------------------------------------------------------------------------
// FakeSegmenter
// ---------------------------------------------------------------------------

pub struct FakeSegmenter {
    answers: Mutex<VecDeque<Result<Vec<String>, CollaboratorError>>>,
    hang: bool,
    calls: AtomicUsize,
}

impl FakeSegmenter {
    pub fn sequence(answers: Vec<Result<Vec<String>, CollaboratorError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::sequence(Vec::new())
        }
    }

    /// Returns the same descriptions on every call.
    pub fn returning(descriptions: &[&str]) -> Self {
        let answer: Vec<String> = descriptions.iter().map(|d| d.to_string()).collect();
        Self::sequence(vec![Ok(answer); 8])
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self::sequence(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptSegmenter for FakeSegmenter {
    async fn segment(&self, _script: &str) -> Result<Vec<SceneDescription>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CollaboratorError::InvalidResponse("no answer left".into())));
        answer.map(|list| list.into_iter().map(SceneDescription::new).collect())
    }
}

// ---------------------------------------------------------------------------
// FakeSynthesizer
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSynthesizer {
    fail_on: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    hang: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeSynthesizer {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_on(descriptions: &[&str]) -> Self {
        Self {
            fail_on: descriptions.iter().map(|d| d.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Never answers; only cancellation settles its requests.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, description: &str, delay: Duration) -> Self {
        self.delays.insert(description.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, description: &str) -> Result<ImageData, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delays.get(description).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on.contains(description) {
            return Err(CollaboratorError::Api {
                status: 500,
                body: format!("could not render '{description}'"),
            });
        }
        Ok(ImageData::jpeg_base64("ZmFrZS1qcGVn"))
    }
}

// ---------------------------------------------------------------------------
// ScriptedChat
// ---------------------------------------------------------------------------

/// Answers with a fixed script and records how much context each call saw.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, CollaboratorError>>>,
    seen_history: Mutex<Vec<usize>>,
    hang_next: AtomicBool,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<String, CollaboratorError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen_history: Mutex::new(Vec::new()),
            hang_next: AtomicBool::new(false),
        }
    }

    /// The first call never answers; later calls follow the script.
    pub fn hanging_first_call(self) -> Self {
        self.hang_next.store(true, Ordering::SeqCst);
        self
    }

    pub fn seen_history_lengths(&self) -> Vec<usize> {
        self.seen_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCollaborator for ScriptedChat {
    async fn reply(&self, handle: &ChatHandle, _message: &str) -> Result<String, CollaboratorError> {
        self.seen_history.lock().unwrap().push(handle.turns().len());
        if self.hang_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CollaboratorError::InvalidResponse("no reply left".into())))
    }
}
