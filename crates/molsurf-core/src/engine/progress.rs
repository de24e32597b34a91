//! Progress events emitted by long-running engine operations.
//!
//! The engine never prints; front ends install a callback on a
//! [`ProgressReporter`] and translate events into progress bars or logs.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A named stage begins, e.g. "Site extraction" or "Pair classification".
    StageStart { name: &'static str },
    StageFinish,

    /// A countable unit of work begins inside the current stage.
    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback.
///
/// Shared by reference across worker threads, hence the `Send + Sync` bound
/// on the callback.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn stage_start(&self, name: &'static str) {
        self.report(Progress::StageStart { name });
    }

    pub fn stage_finish(&self) {
        self.report(Progress::StageFinish);
    }

    pub fn task_start(&self, total_steps: u64) {
        self.report(Progress::TaskStart { total_steps });
    }

    #[inline]
    pub fn task_increment(&self) {
        self.report(Progress::TaskIncrement);
    }

    pub fn task_finish(&self) {
        self.report(Progress::TaskFinish);
    }

    pub fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }
}
