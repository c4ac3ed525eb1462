//! Off-thread scale and keyboard-mapping loading.
//!
//! One worker thread per [`ScaleLoader`] takes requests off a channel and
//! handles them in submission order, so the last request made is the last
//! one published. On success the result goes into the [`SharedTuning`];
//! either way a [`LoadOutcome`] is sent back. The render path only ever
//! sees the swap.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendError, Sender, unbounded};

use crate::error::TuningError;
use crate::kbm::KeyboardMapping;
use crate::scl::{ParseMode, Scale};
use crate::shared::SharedTuning;

/// Completion signal for one load request.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Scale parsed and published.
    ScaleLoaded {
        /// Source file.
        path: PathBuf,
        /// Description line.
        description: String,
        /// Degrees excluding the implicit 1/1.
        degree_count: usize,
    },
    /// Keyboard mapping parsed and published.
    KeyboardMappingLoaded {
        /// Source file.
        path: PathBuf,
        /// Pattern length.
        map_size: usize,
    },
    /// Nothing was published; the previous tuning is still active.
    Failed {
        /// Source file.
        path: PathBuf,
        /// Why.
        error: TuningError,
    },
}

impl LoadOutcome {
    /// File the request named.
    pub fn path(&self) -> &Path {
        match self {
            LoadOutcome::ScaleLoaded { path, .. }
            | LoadOutcome::KeyboardMappingLoaded { path, .. }
            | LoadOutcome::Failed { path, .. } => path,
        }
    }

    /// Whether the tuning changed.
    pub fn is_success(&self) -> bool {
        !matches!(self, LoadOutcome::Failed { .. })
    }

    /// Convert into a `Result`, dropping the success details.
    pub fn into_result(self) -> crate::Result<()> {
        match self {
            LoadOutcome::Failed { error, .. } => Err(error),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
enum Request {
    Scale { path: PathBuf, mode: ParseMode },
    KeyboardMapping { path: PathBuf },
}

impl Request {
    fn into_path(self) -> PathBuf {
        match self {
            Request::Scale { path, .. } | Request::KeyboardMapping { path } => path,
        }
    }

    fn apply(&self, tuning: &SharedTuning) -> crate::Result<LoadOutcome> {
        match self {
            Request::Scale { path, mode } => {
                let scale = Scale::load(path, *mode)?;
                let outcome = LoadOutcome::ScaleLoaded {
                    path: path.clone(),
                    description: scale.description().to_owned(),
                    degree_count: scale.degree_count(),
                };
                tuning.set_scale(scale);
                Ok(outcome)
            }
            Request::KeyboardMapping { path } => {
                let mapping = KeyboardMapping::load(path)?;
                let outcome = LoadOutcome::KeyboardMappingLoaded {
                    path: path.clone(),
                    map_size: mapping.map_size(),
                };
                tuning.set_keyboard_mapping(mapping);
                Ok(outcome)
            }
        }
    }
}

fn run_worker(
    requests: Receiver<Request>,
    tuning: Arc<SharedTuning>,
    outcomes: Sender<LoadOutcome>,
) {
    for request in requests {
        let outcome = match request.apply(&tuning) {
            Ok(outcome) => {
                tracing::info!(path = %outcome.path().display(), "tuning published");
                outcome
            }
            Err(error) => {
                let path = request.into_path();
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "tuning load failed, keeping current"
                );
                LoadOutcome::Failed { path, error }
            }
        };
        // Receiver dropped means nobody is waiting.
        let _ = outcomes.send(outcome);
    }
    tracing::debug!("tuning loader stopped");
}

/// Submits loads and collects their outcomes.
///
/// Requests are handled one at a time, oldest first. Dropping the loader
/// lets the worker finish its queue and exit.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use glottis_tuning::{ParseMode, ScaleLoader, SharedTuning};
///
/// let tuning = Arc::new(SharedTuning::default());
/// let loader = ScaleLoader::new(Arc::clone(&tuning));
/// loader.request("scales/just.scl", ParseMode::Strict);
///
/// if let Some(outcome) = loader.wait(Duration::from_secs(5)) {
///     println!("{} loaded: {}", outcome.path().display(), outcome.is_success());
/// }
/// ```
#[derive(Debug)]
pub struct ScaleLoader {
    tuning: Arc<SharedTuning>,
    /// `None` when the worker could not be started.
    requests: Option<Sender<Request>>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl ScaleLoader {
    /// Loader publishing into `tuning`. Starts the worker thread.
    pub fn new(tuning: Arc<SharedTuning>) -> Self {
        let (tx, rx) = unbounded();
        let (request_tx, request_rx) = unbounded();

        let worker_tuning = Arc::clone(&tuning);
        let worker_tx = tx.clone();
        let spawned = thread::Builder::new()
            .name("glottis-tuning-loader".into())
            .spawn(move || run_worker(request_rx, worker_tuning, worker_tx));

        let requests = match spawned {
            Ok(_) => Some(request_tx),
            Err(error) => {
                tracing::error!(%error, "could not start loader thread");
                None
            }
        };
        Self {
            tuning,
            requests,
            tx,
            rx,
        }
    }

    /// The handle loads are published into.
    pub fn tuning(&self) -> &Arc<SharedTuning> {
        &self.tuning
    }

    /// Load a `.scl` file in the background.
    pub fn request(&self, path: impl Into<PathBuf>, mode: ParseMode) {
        let path = path.into();
        tracing::info!(path = %path.display(), ?mode, "scale load requested");
        self.submit(Request::Scale { path, mode });
    }

    /// Load a `.kbm` file in the background.
    pub fn request_keyboard_mapping(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!(path = %path.display(), "keyboard mapping load requested");
        self.submit(Request::KeyboardMapping { path });
    }

    /// Next outcome, if one is ready.
    pub fn try_recv(&self) -> Option<LoadOutcome> {
        self.rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next outcome.
    pub fn wait(&self, timeout: Duration) -> Option<LoadOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Receiver for callers that select over several channels.
    pub fn outcomes(&self) -> Receiver<LoadOutcome> {
        self.rx.clone()
    }

    fn submit(&self, request: Request) {
        let request = match &self.requests {
            Some(requests) => match requests.send(request) {
                Ok(()) => return,
                Err(SendError(request)) => request,
            },
            None => request,
        };
        let path = request.into_path();
        let error = TuningError::io(&path, io::Error::other("loader thread is not running"));
        let _ = self.tx.send(LoadOutcome::Failed { path, error });
    }
}
