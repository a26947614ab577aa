//! Main application module: detection worker, frame loop and renderer boundary.

use crate::{
    alignment::{MirrorMode, OverlayAligner, OverlayTransform, Viewport},
    catalog::{Catalog, GlassesFrame},
    config::Config,
    diagnostics::DiagnosticsReport,
    error::{Error, Result},
    fit_scoring::{FaceMeasurements, FitScore, FitScorer},
    landmark_source::LandmarkSource,
    smoothing::SmoothingStage,
    tracking_state::{TrackingSnapshot, TrackingState},
};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Whether landmark tracking is feeding the overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingStatus {
    /// Worker is running
    Active,
    /// Source could not be acquired or failed; rendering continues without tracking
    Unavailable(String),
    /// Tracking was never started or has been shut down
    Stopped,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Unavailable(reason) => write!(f, "unavailable ({reason})"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// Closes the source when the worker thread exits, whichever way it exits
struct SourceGuard(Box<dyn LandmarkSource>);

impl Drop for SourceGuard {
    fn drop(&mut self) {
        info!("Releasing landmark source '{}'", self.0.name());
        self.0.close();
    }
}

/// Runs detection on a dedicated thread and publishes into the tracking state
pub struct DetectionWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl DetectionWorker {
    /// Start detecting at roughly `interval` per frame.
    ///
    /// The worker owns `source` and closes it when it stops, fails or is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned
    pub fn spawn(source: Box<dyn LandmarkSource>, state: Arc<TrackingState>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let failure = Arc::new(Mutex::new(None));
        let worker_failure = Arc::clone(&failure);
        let guard = SourceGuard(source);

        info!("Starting detection worker for '{}' every {:?}", guard.0.name(), interval);

        let handle = thread::Builder::new()
            .name("detection".to_string())
            .spawn(move || {
                let mut guard = guard;
                let start = Instant::now();
                loop {
                    let timestamp_ms = start.elapsed().as_secs_f64() * 1000.0;
                    match guard.0.detect(timestamp_ms) {
                        Ok(detection) => {
                            state.publish(detection, timestamp_ms);
                        }
                        Err(e) => {
                            warn!("Landmark detection failed: {e}");
                            *worker_failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());
                            // readers should not keep drawing a face that is no longer tracked
                            state.publish(None, timestamp_ms);
                            break;
                        }
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Detection worker exiting");
            })
            .map_err(|e| Error::Source(format!("Failed to spawn detection thread: {e}")))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            failure,
        })
    }

    /// Whether the worker thread is still detecting
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Error that stopped the worker, if any
    pub fn failure(&self) -> Option<String> {
        self.failure.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Signal the thread and wait for it to release the source
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // a full or closed channel means the thread is already on its way out
            let _ = stop_tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Detection worker panicked");
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the renderer needs for one display refresh
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Sequence number of the tracking snapshot this frame was built from
    pub sequence: u64,
    /// `None` hides the glasses object
    pub transform: Option<OverlayTransform>,
    /// Model of the selected frame
    pub model_path: Option<String>,
    pub fit: Option<FitScore>,
    pub diagnostics: DiagnosticsReport,
    pub mirror: MirrorMode,
    pub status: TrackingStatus,
}

/// Draws the video, the glasses object and the side panels
pub trait Renderer {
    /// # Errors
    ///
    /// Returns an error if the frame cannot be drawn
    fn render(&mut self, frame: &FrameOutput) -> Result<()>;
}

/// Headless renderer that reports each frame through the log
pub struct LogRenderer {
    viewport: Viewport,
    frames: u64,
}

impl LogRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, frames: 0 }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &FrameOutput) -> Result<()> {
        self.frames += 1;
        match (&frame.transform, &frame.model_path) {
            (Some(transform), Some(model)) => {
                let (x, y) = transform.present_anchor(self.viewport, frame.mirror);
                debug!(
                    "[{}] {} at screen ({:.3}, {:.3}) rot=({:.3}, {:.3}, {:.3}) scale={:.3}",
                    frame.sequence,
                    model,
                    x,
                    y,
                    transform.rotation.x,
                    transform.rotation.y,
                    transform.rotation.z,
                    transform.scale
                );
            }
            _ => debug!("[{}] overlay hidden ({})", frame.sequence, frame.status),
        }
        if let Some(fit) = &frame.fit {
            debug!("[{}] fit {} ({}): {}", frame.sequence, fit.score, fit.rating(), fit.notes.join("; "));
        }
        Ok(())
    }
}

/// Ties tracking, smoothing, alignment and fit scoring to a renderer
pub struct OverlayApp {
    state: Arc<TrackingState>,
    worker: Option<DetectionWorker>,
    unavailable: Option<String>,
    catalog: Catalog,
    selected: Option<String>,
    smoothing: SmoothingStage,
    aligner: OverlayAligner,
    scorer: FitScorer,
    fit: Option<FitScore>,
    fit_key: Option<(u64, Viewport)>,
    mirror: MirrorMode,
    viewport: Viewport,
}

impl OverlayApp {
    /// Create the application without tracking; see [`OverlayApp::start_tracking`]
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be turned into pipeline stages
    pub fn new(config: &Config, catalog: Catalog) -> Result<Self> {
        info!("Initializing overlay application with {} frames", catalog.len());

        let smoothing = config.create_smoothing_stage()?;
        info!("Smoothing with {}", smoothing.filter_name());

        let mut app = Self {
            state: Arc::new(TrackingState::new()),
            worker: None,
            unavailable: None,
            catalog,
            selected: None,
            smoothing,
            aligner: OverlayAligner::new(config.tracking.reference_ipd)?,
            scorer: config.create_fit_scorer()?,
            fit: None,
            fit_key: None,
            mirror: config.display.mirror,
            viewport: config.viewport()?,
        };

        if let Some(id) = &config.catalog.default_selection {
            app.select(id)?;
        }

        Ok(app)
    }

    /// Acquire a landmark source and start the detection worker.
    ///
    /// Failures do not abort the application: they leave tracking
    /// [`TrackingStatus::Unavailable`] and the overlay stays hidden.
    pub fn start_tracking<F>(&mut self, open: F, interval: Duration)
    where
        F: FnOnce() -> Result<Box<dyn LandmarkSource>>,
    {
        self.stop_tracking();

        let worker = open().and_then(|source| DetectionWorker::spawn(source, Arc::clone(&self.state), interval));
        match worker {
            Ok(worker) => {
                self.worker = Some(worker);
                self.unavailable = None;
            }
            Err(e) => {
                warn!("Tracking unavailable: {e}");
                self.unavailable = Some(e.to_string());
            }
        }
    }

    /// Stop the detection worker and release the source
    pub fn stop_tracking(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            info!("Tracking stopped");
        }
    }

    pub fn status(&self) -> TrackingStatus {
        if let Some(reason) = &self.unavailable {
            return TrackingStatus::Unavailable(reason.clone());
        }
        match &self.worker {
            Some(worker) => match worker.failure() {
                Some(reason) => TrackingStatus::Unavailable(reason),
                None if worker.is_running() => TrackingStatus::Active,
                None => TrackingStatus::Stopped,
            },
            None => TrackingStatus::Stopped,
        }
    }

    /// Shared tracking state the worker publishes into
    pub fn state(&self) -> &Arc<TrackingState> {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selected(&self) -> Option<&GlassesFrame> {
        self.selected.as_deref().and_then(|id| self.catalog.get(id))
    }

    /// Fit score of the selected frame, if one is selected
    pub fn fit(&self) -> Option<&FitScore> {
        self.fit.as_ref()
    }

    /// Select a frame by identifier, replacing any previous selection.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame has this id; the selection is left unchanged
    pub fn select(&mut self, id: &str) -> Result<&GlassesFrame> {
        self.catalog.resolve(id)?;
        if self.selected.as_deref() != Some(id) {
            info!("Selected glasses '{id}'");
        }
        self.selected = Some(id.to_string());

        let snapshot = self.state.snapshot();
        self.fit = None;
        self.update_fit(&snapshot);

        self.catalog.resolve(id)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.fit = None;
        self.fit_key = None;
    }

    /// Recompute the fit for a new snapshot or viewport; a frame without a face keeps the last score
    fn update_fit(&mut self, snapshot: &TrackingSnapshot) {
        let Some(frame) = self.selected.as_deref().and_then(|id| self.catalog.get(id)) else {
            return;
        };
        let key = (snapshot.sequence, self.viewport);
        if self.fit.is_some() && (self.fit_key == Some(key) || !snapshot.has_face()) {
            return;
        }

        let measurements = snapshot
            .landmarks
            .as_deref()
            .map(|landmarks| FaceMeasurements::from_landmarks(landmarks, self.viewport.aspect()))
            .unwrap_or_default();
        self.fit = Some(self.scorer.score(frame, &measurements));
        self.fit_key = Some(key);
    }

    /// Build the output for one display refresh from the latest snapshot
    pub fn step(&mut self, viewport: Viewport) -> FrameOutput {
        self.viewport = viewport;
        let raw = self.state.snapshot();
        let snapshot = self.smoothing.process(&raw);

        self.update_fit(&snapshot);

        let selected = self.selected.as_deref().and_then(|id| self.catalog.get(id));
        let transform = self.aligner.align(&snapshot, selected, viewport);

        FrameOutput {
            sequence: snapshot.sequence,
            transform,
            model_path: selected.map(|frame| frame.model_path.clone()),
            fit: self.fit.clone(),
            diagnostics: DiagnosticsReport::from_snapshot(&snapshot),
            mirror: self.mirror,
            status: self.status(),
        }
    }

    /// Render `frames` display refreshes, one every `frame_interval`
    ///
    /// # Errors
    ///
    /// Returns an error if the renderer fails
    pub fn run(&mut self, renderer: &mut dyn Renderer, frames: u64, frame_interval: Duration) -> Result<()> {
        info!("Starting render loop for {frames} frames");
        let start_time = Instant::now();

        for frame_count in 0..frames {
            let frame_start = Instant::now();
            let output = self.step(self.viewport);
            renderer.render(&output)?;

            if frame_count % 30 == 0 {
                info!(
                    "Frame {}: tracking {}, {}",
                    frame_count,
                    output.status,
                    if output.diagnostics.has_face() { "face" } else { "no face" }
                );
            }

            if let Some(remaining) = frame_interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        info!(
            "Rendered {} frames in {:.2}s",
            frames,
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Stop tracking and release everything
    pub fn shutdown(&mut self) {
        info!("Application shutting down");
        self.stop_tracking();
    }
}

impl Drop for OverlayApp {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}
