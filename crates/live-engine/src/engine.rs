//! Live inference loop driver.

use std::sync::{Arc, Mutex, MutexGuard};

use posewatch_capture::{FrameSample, LiveFrameSource, PoseEstimator};
use posewatch_classifier::SequenceClassifier;
use posewatch_common::{PosewatchError, PosewatchResult, RunClock};
use posewatch_processing_core::{KeypointNormalizer, NormalizeOutcome};
use posewatch_skeleton_model::RollingWindow;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use crate::alert::AlertEvent;
use crate::config::LiveConfig;
use crate::metrics::{LoopMetrics, MetricsSnapshot};
use crate::state::{LoopState, StateCell};

/// State shared between the handle, the driver and the running cycle.
#[derive(Debug)]
struct Shared {
    state: StateCell,
    metrics: LoopMetrics,
    /// Held while publishing an alert and while stopping, so no alert is
    /// sent once `stop` has returned from setting the state.
    publish: Mutex<()>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: StateCell::new(LoopState::Idle),
            metrics: LoopMetrics::default(),
            publish: Mutex::new(()),
        }
    }

    fn publish_gate(&self) -> MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enter [`LoopState::Stopped`], returning the previous state.
    fn stop(&self) -> LoopState {
        let _gate = self.publish_gate();
        self.state.stop()
    }

    /// Send `event` unless the loop has stopped. `Ok(false)` means the
    /// event was discarded.
    fn publish(
        &self,
        alerts: &mpsc::Sender<AlertEvent>,
        event: AlertEvent,
    ) -> Result<bool, TrySendError<AlertEvent>> {
        let _gate = self.publish_gate();
        if self.state.get() == LoopState::Stopped {
            return Ok(false);
        }
        alerts.try_send(event).map(|()| true)
    }
}

/// A live inference loop that has not been started yet.
pub struct LiveInferenceLoop {
    config: LiveConfig,
    source: Arc<dyn LiveFrameSource>,
    estimator: Arc<dyn PoseEstimator>,
    classifier: Arc<dyn SequenceClassifier>,
    normalizer: KeypointNormalizer,
}

impl LiveInferenceLoop {
    pub fn new(
        config: LiveConfig,
        source: Arc<dyn LiveFrameSource>,
        estimator: Arc<dyn PoseEstimator>,
        classifier: Arc<dyn SequenceClassifier>,
    ) -> Self {
        Self {
            config,
            source,
            estimator,
            classifier,
            normalizer: KeypointNormalizer::with_defaults(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: KeypointNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    /// Probe the source and spawn the polling driver.
    ///
    /// Fails without spawning anything when the configuration is invalid,
    /// the classifier expects a different window length, or the source
    /// cannot be read.
    pub async fn start(self) -> PosewatchResult<LiveHandle> {
        self.config.validate()?;

        let expected = self.classifier.window_len();
        if expected != self.config.window_len {
            return Err(PosewatchError::shape_mismatch(
                format!("{expected} frames per window"),
                format!("{} frames per live window", self.config.window_len),
            ));
        }

        if let Err(e) = self.source.probe().await {
            tracing::error!(source = self.source.id(), error = %e, "Live source unavailable");
            return Err(e);
        }

        let window = RollingWindow::new(self.config.window_len)?;
        let shared = Arc::new(Shared::new());
        let (alert_tx, alert_rx) = mpsc::channel(self.config.alert_capacity);
        let (stop_tx, stop_rx) = oneshot::channel();
        let source_id = self.source.id().to_string();

        tracing::info!(
            source = %source_id,
            tick_ms = self.config.tick_interval.as_millis() as u64,
            window_len = self.config.window_len,
            threshold = self.config.alert_threshold,
            "Starting live inference loop"
        );

        shared.state.transition(LoopState::WarmingUp);
        let cycle = Arc::new(Cycle {
            config: self.config,
            source: self.source,
            estimator: self.estimator,
            classifier: self.classifier,
            normalizer: self.normalizer,
            shared: Arc::clone(&shared),
            alerts: alert_tx,
            clock: RunClock::start(),
        });
        let driver = tokio::spawn(drive(cycle, window, stop_rx));

        Ok(LiveHandle {
            shared,
            source_id,
            stop_tx: Some(stop_tx),
            driver: Some(driver),
            alerts: alert_rx,
        })
    }
}

/// Control handle of a running loop.
///
/// Dropping the handle stops the loop without waiting for the driver.
pub struct LiveHandle {
    shared: Arc<Shared>,
    source_id: String,
    stop_tx: Option<oneshot::Sender<()>>,
    driver: Option<JoinHandle<()>>,
    alerts: mpsc::Receiver<AlertEvent>,
}

impl LiveHandle {
    pub fn state(&self) -> LoopState {
        self.shared.state.get()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Alert stream. Yields `None` once the loop has stopped and every
    /// buffered alert was received.
    pub fn alerts(&mut self) -> &mut mpsc::Receiver<AlertEvent> {
        &mut self.alerts
    }

    /// Stop the loop and wait for the driver to exit.
    ///
    /// The state becomes [`LoopState::Stopped`] before anything else, under
    /// the same lock alerts are published with, so a cycle still in flight
    /// cannot publish its result. Calling this again is a no-op.
    pub async fn stop(&mut self) -> PosewatchResult<()> {
        let previous = self.shared.stop();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };
        driver
            .await
            .map_err(|e| PosewatchError::live(format!("live driver task failed: {e}")))?;

        tracing::info!(
            source = %self.source_id,
            previous = %previous,
            metrics = ?self.metrics(),
            "Live inference loop stopped"
        );
        Ok(())
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.shared.stop();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

/// Everything one sample/estimate/predict cycle needs.
struct Cycle {
    config: LiveConfig,
    source: Arc<dyn LiveFrameSource>,
    estimator: Arc<dyn PoseEstimator>,
    classifier: Arc<dyn SequenceClassifier>,
    normalizer: KeypointNormalizer,
    shared: Arc<Shared>,
    alerts: mpsc::Sender<AlertEvent>,
    clock: RunClock,
}

impl Cycle {
    /// Run one cycle and hand the window back.
    async fn run(self: Arc<Self>, mut window: RollingWindow) -> RollingWindow {
        if let Err(e) = self.step(&mut window).await {
            self.shared.metrics.fail_cycle();
            tracing::warn!(source = self.source.id(), error = %e, "Live cycle failed");
        }
        window
    }

    async fn step(&self, window: &mut RollingWindow) -> PosewatchResult<()> {
        let frame = match self.source.sample().await? {
            FrameSample::Ready(frame) => frame,
            FrameSample::NotReady => {
                self.shared.metrics.not_ready();
                tracing::trace!(source = self.source.id(), "Source not ready");
                return Ok(());
            }
        };

        let detection = self.estimator.estimate(&frame).await?;
        let normalized = self.normalizer.normalize(&detection);
        if let NormalizeOutcome::Malformed(reason) = &normalized.outcome {
            tracing::debug!(frame = frame.index, %reason, "Malformed detection");
        }
        window.push(normalized.frame);
        self.shared.metrics.push_frame();

        if !window.is_ready() {
            self.shared.state.transition(LoopState::WarmingUp);
            return Ok(());
        }
        if !self.shared.state.transition(LoopState::Inferring) {
            return Ok(());
        }

        let probabilities = match self.classifier.predict(&window.snapshot()).await {
            Ok(probabilities) => probabilities,
            Err(e) => {
                self.shared.state.transition(LoopState::Ready);
                return Err(e);
            }
        };

        if !self.shared.state.transition(LoopState::Ready) {
            self.shared.metrics.discard();
            tracing::debug!("Loop stopped during inference, discarding prediction");
            return Ok(());
        }
        self.shared.metrics.predicted();

        let label = self.config.alert_label;
        let probability = probabilities.probability(label);
        tracing::trace!(%label, probability, "Prediction");
        if probability >= self.config.alert_threshold {
            self.emit(AlertEvent {
                at_ns: self.clock.elapsed_ns(),
                wall_time: self.clock.wall_now(),
                label,
                probability,
                probabilities,
                frames_seen: window.frames_seen(),
            });
        }
        Ok(())
    }

    fn emit(&self, event: AlertEvent) {
        match self.shared.publish(&self.alerts, event) {
            Ok(true) => {
                self.shared.metrics.alerted();
                tracing::info!(source = self.source.id(), "Alert threshold crossed");
            }
            Ok(false) => {
                self.shared.metrics.discard();
                tracing::debug!("Loop stopped, discarding alert");
            }
            Err(TrySendError::Full(event)) => {
                tracing::warn!(%event, "Alert channel full, dropping alert");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Alert receiver closed");
            }
        }
    }
}

/// Polling driver. Owns the ticker and at most one in-flight cycle.
async fn drive(cycle: Arc<Cycle>, window: RollingWindow, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(cycle.config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut idle_window = Some(window);
    let mut in_flight: Option<JoinHandle<RollingWindow>> = None;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            joined = join_cycle(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                match joined {
                    Ok(window) => idle_window = Some(window),
                    Err(e) => {
                        cycle.shared.metrics.fail_cycle();
                        tracing::error!(error = %e, "Live cycle task did not complete");
                        match RollingWindow::new(cycle.config.window_len) {
                            Ok(window) => idle_window = Some(window),
                            Err(e) => {
                                tracing::error!(error = %e, "Cannot rebuild rolling window");
                                break;
                            }
                        }
                    }
                }
            }
            _ = ticker.tick() => {
                cycle.shared.metrics.tick();
                match idle_window.take() {
                    Some(window) if in_flight.is_none() => {
                        cycle.shared.metrics.start_cycle();
                        in_flight = Some(tokio::spawn(Arc::clone(&cycle).run(window)));
                    }
                    window => {
                        idle_window = window;
                        cycle.shared.metrics.drop_tick();
                        tracing::trace!("Cycle in flight, dropping tick");
                    }
                }
            }
        }
    }

    cycle.shared.stop();
    if let Some(handle) = in_flight.take() {
        handle.abort();
        if handle.await.is_ok() {
            tracing::debug!("In-flight cycle finished before cancellation");
        }
    }
}

async fn join_cycle(
    in_flight: &mut Option<JoinHandle<RollingWindow>>,
) -> Result<RollingWindow, JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
