//! The background render pipeline.
//!
//! Pan updates arrive on the UI thread faster than frames can be fetched and
//! rasterized. Each update becomes a [`FrameRequest`] tagged with a fresh
//! generation; a single worker thread renders the newest one and hands the
//! image back through the [`UiDispatcher`]. Older generations are dropped at
//! every stage, and once more on the UI thread right before the loupe is
//! touched, so a slow early job can never overwrite a later one.

use crate::MagnifierError;
use crate::config::{MagnifierConfig, MagnifierStyle};
use crate::dispatch::UiDispatcher;
use crate::geometry::{Point, Size};
use crate::loupe::{Loupe, LoupeState};
use crate::render::{LoupeTarget, draw, prepare};
use async_channel::{Receiver, Sender};
use image::RgbaImage;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use videoview_frame::FrameSourceAdapter;

/// Lock a mutex, recovering the data from a poisoned lock.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Monotonic request counter shared by the UI thread and the worker.
///
/// A job is live only while its generation is the current one.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Start a new generation and return it.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The latest generation.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether `generation` is still the latest.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Lifecycle of the most recent job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Queued, not yet picked up by the worker.
    Requested,
    /// The worker is fetching or rasterizing.
    Rendering,
    /// The image reached the loupe.
    Committed,
    /// Superseded or cancelled before reaching the loupe.
    Cancelled,
    /// Frame fetch or geometry failed; the loupe was hidden.
    Failed,
}

/// Job outcome counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineStats {
    /// Jobs requested.
    pub issued: u64,
    /// Jobs whose image reached the loupe.
    pub committed: u64,
    /// Jobs dropped because a newer one was requested or the drag ended.
    pub cancelled: u64,
    /// Jobs that failed to produce an image.
    pub failed: u64,
}

impl PipelineStats {
    /// Jobs without an outcome yet.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.issued
            .saturating_sub(self.committed + self.cancelled + self.failed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    issued: AtomicU64,
    committed: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            issued: self.issued.load(Ordering::SeqCst),
            committed: self.committed.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// One pan update's worth of work.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// Playback position to magnify.
    pub timestamp_ms: u64,
    /// Pointer position in viewport coordinates.
    pub pointer: Point,
    /// Viewport size in points.
    pub viewport: Size,
    /// Intrinsic (upright) video size in pixels.
    pub video: Size,
    /// Frame access for the current playback session.
    pub frames: Arc<FrameSourceAdapter>,
}

#[derive(Debug)]
struct FrameJob {
    generation: u64,
    request: FrameRequest,
    config: Arc<MagnifierConfig>,
}

#[derive(Debug)]
struct Shared {
    generation: Generation,
    state: Mutex<(u64, JobState)>,
    counters: Counters,
    loupe: Arc<Mutex<Loupe>>,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl Shared {
    fn set_state(&self, generation: u64, state: JobState) {
        let mut current = lock(&self.state);
        if current.0 == generation {
            current.1 = state;
        }
    }

    /// Whether `generation` may continue past `stage`.
    fn checkpoint(&self, generation: u64, stage: &str) -> bool {
        if self.generation.is_current(generation) {
            return true;
        }
        debug!("magnifier job {generation} superseded before {stage}");
        self.counters.cancelled.fetch_add(1, Ordering::SeqCst);
        false
    }

    fn process(self: &Arc<Self>, job: FrameJob) {
        let FrameJob {
            generation,
            request,
            config,
        } = job;

        if !self.checkpoint(generation, "frame fetch") {
            return;
        }
        self.set_state(generation, JobState::Rendering);

        let target = LoupeTarget {
            video: request.video,
            viewport: request.viewport,
            pointer: request.pointer,
        };
        let prepared = request
            .frames
            .get_frame(request.timestamp_ms)
            .map_err(MagnifierError::from)
            .and_then(|raw| prepare(&raw, request.frames.orientation(), &target, &config));
        let (frame, geometry) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                debug!("magnifier job {generation} failed: {error}");
                self.publish_failure(generation);
                return;
            }
        };

        if !self.checkpoint(generation, "rasterize") {
            return;
        }
        let image = draw(&frame, &geometry, &config);

        if !self.checkpoint(generation, "publish") {
            return;
        }
        self.publish(generation, image, request.pointer);
    }

    fn publish(self: &Arc<Self>, generation: u64, image: RgbaImage, pointer: Point) {
        let shared = Arc::clone(self);
        self.dispatcher.dispatch(Box::new(move || {
            // A newer pan may have been issued while this task was queued.
            if !shared.generation.is_current(generation) {
                debug!("dropping stale loupe image from job {generation}");
                shared.counters.cancelled.fetch_add(1, Ordering::SeqCst);
                return;
            }
            lock(&shared.loupe).commit(image, pointer, generation);
            shared.set_state(generation, JobState::Committed);
            shared.counters.committed.fetch_add(1, Ordering::SeqCst);
        }));
    }

    fn publish_failure(self: &Arc<Self>, generation: u64) {
        let shared = Arc::clone(self);
        self.dispatcher.dispatch(Box::new(move || {
            if !shared.generation.is_current(generation) {
                shared.counters.cancelled.fetch_add(1, Ordering::SeqCst);
                return;
            }
            lock(&shared.loupe).hide();
            shared.set_state(generation, JobState::Failed);
            shared.counters.failed.fetch_add(1, Ordering::SeqCst);
        }));
    }
}

fn run_worker(jobs: Receiver<FrameJob>, shared: Arc<Shared>) {
    while let Ok(job) = jobs.recv_blocking() {
        shared.process(job);
    }
    debug!("magnifier worker stopped");
}

/// Renders loupe images off the UI thread, newest request wins.
///
/// All methods are meant to be called from the UI thread. The worker thread
/// is detached: [`shutdown`](Self::shutdown) closes its queue and returns
/// without waiting for an in-flight job, whose result is then discarded.
#[derive(Debug)]
pub struct MagnifierPipeline {
    shared: Arc<Shared>,
    jobs: Sender<FrameJob>,
    queued: Receiver<FrameJob>,
    config: Arc<MagnifierConfig>,
}

impl MagnifierPipeline {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`MagnifierError::Config`] if `config` is out of range and
    /// [`MagnifierError::Worker`] if the thread cannot be spawned.
    pub fn new(config: MagnifierConfig, dispatcher: Arc<dyn UiDispatcher>) -> Result<Self, MagnifierError> {
        config.validate()?;
        // Depth one: a new request displaces the one still waiting.
        let (jobs, queued) = async_channel::bounded(1);
        let shared = Arc::new(Shared {
            generation: Generation::default(),
            state: Mutex::new((0, JobState::Idle)),
            counters: Counters::default(),
            loupe: Arc::new(Mutex::new(Loupe::new(&config))),
            dispatcher,
        });

        let worker_jobs = queued.clone();
        let worker_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("videoview-magnifier".into())
            .spawn(move || run_worker(worker_jobs, worker_shared))?;

        Ok(Self {
            shared,
            jobs,
            queued,
            config: Arc::new(config),
        })
    }

    /// Queue a render for the newest pan position and return its generation.
    ///
    /// Every older job becomes stale.
    pub fn request(&self, request: FrameRequest) -> u64 {
        let generation = self.shared.generation.advance();
        self.shared.counters.issued.fetch_add(1, Ordering::SeqCst);
        *lock(&self.shared.state) = (generation, JobState::Requested);

        let job = FrameJob {
            generation,
            request,
            config: Arc::clone(&self.config),
        };
        match self.jobs.force_send(job) {
            Ok(Some(displaced)) => {
                debug!("magnifier job {} replaced before it started", displaced.generation);
                self.shared.counters.cancelled.fetch_add(1, Ordering::SeqCst);
            }
            Ok(None) => {}
            Err(_) => {
                warn!("magnifier pipeline is shut down, dropping job {generation}");
                self.shared.counters.cancelled.fetch_add(1, Ordering::SeqCst);
                self.shared.set_state(generation, JobState::Cancelled);
            }
        }
        generation
    }

    /// Invalidate every outstanding job and hide the loupe.
    pub fn cancel(&self) {
        self.shared.generation.advance();
        while let Ok(job) = self.queued.try_recv() {
            debug!("magnifier job {} cancelled while queued", job.generation);
            self.shared.counters.cancelled.fetch_add(1, Ordering::SeqCst);
        }
        {
            let mut state = lock(&self.shared.state);
            if matches!(state.1, JobState::Requested | JobState::Rendering) {
                state.1 = JobState::Cancelled;
            }
        }
        lock(&self.shared.loupe).hide();
    }

    /// Cancel outstanding jobs and drop the committed image.
    pub fn clear(&self) {
        self.cancel();
        lock(&self.shared.loupe).clear();
    }

    /// Cancel outstanding jobs and stop the worker once it is idle.
    pub fn shutdown(&self) {
        if self.jobs.is_closed() {
            return;
        }
        self.clear();
        self.jobs.close();
        debug!("magnifier pipeline shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.jobs.is_closed()
    }

    /// Change the center decoration for later renders.
    pub fn set_style(&mut self, style: MagnifierStyle) {
        Arc::make_mut(&mut self.config).style = style;
        lock(&self.shared.loupe).set_style(style);
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MagnifierConfig {
        &self.config
    }

    /// Shared handle to the loupe, for hosts that draw it.
    #[must_use]
    pub fn loupe_handle(&self) -> Arc<Mutex<Loupe>> {
        Arc::clone(&self.shared.loupe)
    }

    /// Snapshot of the loupe.
    #[must_use]
    pub fn loupe(&self) -> LoupeState {
        lock(&self.shared.loupe).snapshot()
    }

    /// State of the most recent job.
    #[must_use]
    pub fn state(&self) -> JobState {
        lock(&self.shared.state).1
    }

    /// Outcome counters.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    /// The latest generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.shared.generation.current()
    }
}

impl Drop for MagnifierPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
