//! Live loop behavior under a paused tokio clock.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use posewatch_capture::{Frame, FrameSample, LiveFrameSource, PoseEstimator};
use posewatch_classifier::{
    ClassProbabilities, Evaluation, SequenceClassifier, TrainingConfig, TrainingHistory,
};
use posewatch_common::{PosewatchError, PosewatchResult};
use posewatch_live::{LiveConfig, LiveHandle, LiveInferenceLoop, LoopState};
use posewatch_skeleton_model::{Label, LabeledExample, PoseDetection, SequenceWindow};

struct StubSource {
    available: bool,
    not_ready: u64,
    samples: AtomicU64,
}

impl StubSource {
    fn ready() -> Self {
        Self {
            available: true,
            not_ready: 0,
            samples: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl LiveFrameSource for StubSource {
    async fn probe(&self) -> PosewatchResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(PosewatchError::source_unavailable("stub", "no stream"))
        }
    }

    async fn sample(&self) -> PosewatchResult<FrameSample> {
        let index = self.samples.fetch_add(1, Ordering::SeqCst);
        if index < self.not_ready {
            return Ok(FrameSample::NotReady);
        }
        Ok(FrameSample::Ready(Frame::from_bytes(index, 640, 480, vec![0xff])))
    }

    fn id(&self) -> &str {
        "stub"
    }
}

/// Returns an empty detection, failing on one frame index if asked.
struct StubEstimator {
    fail_on: Option<u64>,
}

#[async_trait]
impl PoseEstimator for StubEstimator {
    async fn estimate(&self, frame: &Frame) -> PosewatchResult<PoseDetection> {
        if self.fail_on == Some(frame.index) {
            return Err(PosewatchError::estimator("stub estimator crashed"));
        }
        Ok(PoseDetection::empty(frame.width, frame.height))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Fixed-output classifier that records call concurrency.
struct StubClassifier {
    window_len: usize,
    latency: Duration,
    output: [f32; 2],
    fail: bool,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl StubClassifier {
    fn new(window_len: usize, latency: Duration, output: [f32; 2]) -> Self {
        Self {
            window_len,
            latency,
            output,
            fail: false,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SequenceClassifier for StubClassifier {
    fn window_len(&self) -> usize {
        self.window_len
    }

    async fn predict(&self, window: &SequenceWindow) -> PosewatchResult<ClassProbabilities> {
        assert_eq!(window.len(), self.window_len);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(PosewatchError::classifier("stub model failed"));
        }
        ClassProbabilities::new(self.output)
    }

    fn fit(
        &mut self,
        _train: &[LabeledExample],
        _validation: &[LabeledExample],
        _config: &TrainingConfig,
    ) -> PosewatchResult<TrainingHistory> {
        Err(PosewatchError::unsupported("stub"))
    }

    fn evaluate(&self, _examples: &[LabeledExample]) -> PosewatchResult<Evaluation> {
        Err(PosewatchError::unsupported("stub"))
    }

    fn save(&self, _path: &std::path::Path) -> PosewatchResult<()> {
        Err(PosewatchError::unsupported("stub"))
    }

    fn load(_path: &std::path::Path) -> PosewatchResult<Self> {
        Err(PosewatchError::unsupported("stub"))
    }
}

fn config(tick_ms: u64, window_len: usize) -> LiveConfig {
    LiveConfig {
        tick_interval: Duration::from_millis(tick_ms),
        window_len,
        alert_threshold: 0.8,
        ..LiveConfig::default()
    }
}

async fn start(
    config: LiveConfig,
    source: StubSource,
    estimator: StubEstimator,
    classifier: Arc<StubClassifier>,
) -> LiveHandle {
    LiveInferenceLoop::new(config, Arc::new(source), Arc::new(estimator), classifier)
        .start()
        .await
        .ok()
        .expect("loop should start")
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_inference_drops_overlapping_ticks() {
    let classifier = Arc::new(StubClassifier::new(
        1,
        Duration::from_millis(120),
        [0.9, 0.1],
    ));
    let mut handle = start(
        config(50, 1),
        StubSource::ready(),
        StubEstimator { fail_on: None },
        classifier.clone(),
    )
    .await;

    sleep_ms(1000).await;
    handle.stop().await.unwrap();

    // Cycles start at 0, 150, 300, ..., 900 ms: each 120 ms inference
    // swallows the next two ticks.
    assert_eq!(classifier.calls(), 7);
    assert_eq!(classifier.max_active.load(Ordering::SeqCst), 1);

    let metrics = handle.metrics();
    assert_eq!(metrics.cycles, 7);
    assert!(metrics.dropped_ticks >= 2 * 7 - 1);
    assert_eq!(metrics.cycles + metrics.dropped_ticks, metrics.ticks);
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_prediction() {
    let classifier = Arc::new(StubClassifier::new(
        1,
        Duration::from_millis(500),
        [0.0, 1.0],
    ));
    let mut handle = start(
        config(100, 1),
        StubSource::ready(),
        StubEstimator { fail_on: None },
        classifier.clone(),
    )
    .await;

    sleep_ms(100).await;
    assert_eq!(handle.state(), LoopState::Inferring);
    assert_eq!(classifier.calls(), 1);

    handle.stop().await.unwrap();
    assert_eq!(handle.state(), LoopState::Stopped);

    let next = tokio::time::timeout(Duration::from_secs(2), handle.alerts().recv()).await;
    assert!(matches!(next, Ok(None) | Err(_)));
    sleep_ms(2000).await;

    assert_eq!(handle.state(), LoopState::Stopped);
    assert_eq!(classifier.calls(), 1);
    let metrics = handle.metrics();
    assert_eq!(metrics.alerts, 0);
    assert_eq!(metrics.predictions, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let classifier = Arc::new(StubClassifier::new(1, Duration::ZERO, [0.9, 0.1]));
    let mut handle = start(
        config(100, 1),
        StubSource::ready(),
        StubEstimator { fail_on: None },
        classifier,
    )
    .await;

    sleep_ms(250).await;
    handle.stop().await.unwrap();
    let ticks = handle.metrics().ticks;
    handle.stop().await.unwrap();

    sleep_ms(1000).await;
    assert_eq!(handle.state(), LoopState::Stopped);
    assert_eq!(handle.metrics().ticks, ticks);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_source_prevents_start() {
    let source = StubSource {
        available: false,
        ..StubSource::ready()
    };
    let classifier = Arc::new(StubClassifier::new(1, Duration::ZERO, [0.5, 0.5]));
    let result = LiveInferenceLoop::new(
        config(100, 1),
        Arc::new(source),
        Arc::new(StubEstimator { fail_on: None }),
        classifier.clone(),
    )
    .start()
    .await;

    assert!(matches!(
        result.err(),
        Some(PosewatchError::SourceUnavailable { .. })
    ));
    sleep_ms(500).await;
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_window_length_must_match_classifier() {
    let classifier = Arc::new(StubClassifier::new(30, Duration::ZERO, [0.5, 0.5]));
    let result = LiveInferenceLoop::new(
        config(100, 5),
        Arc::new(StubSource::ready()),
        Arc::new(StubEstimator { fail_on: None }),
        classifier,
    )
    .start()
    .await;

    assert!(matches!(
        result.err(),
        Some(PosewatchError::ShapeMismatch { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_warm_up_emits_no_prediction() {
    let classifier = Arc::new(StubClassifier::new(3, Duration::ZERO, [0.9, 0.1]));
    let mut handle = start(
        config(100, 3),
        StubSource::ready(),
        StubEstimator { fail_on: None },
        classifier.clone(),
    )
    .await;

    sleep_ms(150).await;
    assert_eq!(handle.state(), LoopState::WarmingUp);
    assert_eq!(handle.metrics().frames, 2);
    assert_eq!(classifier.calls(), 0);

    sleep_ms(400).await;
    assert_eq!(handle.state(), LoopState::Ready);
    let metrics = handle.metrics();
    assert!(metrics.frames >= 5);
    assert_eq!(metrics.predictions, metrics.frames - 2);
    assert_eq!(metrics.alerts, 0);

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_alert_fires_at_threshold() {
    let classifier = Arc::new(StubClassifier::new(2, Duration::ZERO, [0.1, 0.9]));
    let mut handle = start(
        config(100, 2),
        StubSource::ready(),
        StubEstimator { fail_on: None },
        classifier,
    )
    .await;

    let alert = tokio::time::timeout(Duration::from_secs(2), handle.alerts().recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alert.label, Label::Anomalous);
    assert!((alert.probability - 0.9).abs() < 1e-6);
    assert_eq!(alert.probabilities.predicted(), Label::Anomalous);
    assert_eq!(alert.frames_seen, 2);

    handle.stop().await.unwrap();
    assert!(handle.metrics().alerts >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_not_ready_samples_are_skipped() {
    let source = StubSource {
        not_ready: 2,
        ..StubSource::ready()
    };
    let classifier = Arc::new(StubClassifier::new(1, Duration::ZERO, [0.9, 0.1]));
    let mut handle = start(
        config(100, 1),
        source,
        StubEstimator { fail_on: None },
        classifier,
    )
    .await;

    sleep_ms(250).await;
    let metrics = handle.metrics();
    assert_eq!(metrics.not_ready_frames, 2);
    assert_eq!(metrics.frames, 1);
    assert_eq!(metrics.failed_cycles, 0);

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_estimate_does_not_stop_loop() {
    let classifier = Arc::new(StubClassifier::new(1, Duration::ZERO, [0.9, 0.1]));
    let mut handle = start(
        config(100, 1),
        StubSource::ready(),
        StubEstimator { fail_on: Some(1) },
        classifier,
    )
    .await;

    sleep_ms(450).await;
    let metrics = handle.metrics();
    assert_eq!(metrics.cycles, 5);
    assert_eq!(metrics.failed_cycles, 1);
    assert_eq!(metrics.frames, 4);
    assert_eq!(handle.state(), LoopState::Ready);

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_prediction_returns_to_ready() {
    let mut classifier = StubClassifier::new(1, Duration::ZERO, [0.0, 1.0]);
    classifier.fail = true;
    let classifier = Arc::new(classifier);
    let mut handle = start(
        config(100, 1),
        StubSource::ready(),
        StubEstimator { fail_on: None },
        classifier.clone(),
    )
    .await;

    sleep_ms(350).await;
    let metrics = handle.metrics();
    assert_eq!(metrics.failed_cycles, 4);
    assert_eq!(metrics.predictions, 0);
    assert_eq!(metrics.alerts, 0);
    assert_eq!(classifier.calls(), 4);
    assert_eq!(handle.state(), LoopState::Ready);

    handle.stop().await.unwrap();
}
