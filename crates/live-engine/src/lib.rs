//! Posewatch Live Engine
//!
//! Polls a live frame source at a fixed cadence, keeps a rolling window of
//! normalized frames, classifies it, and emits alerts when the configured
//! class crosses a probability threshold.
//!
//! At most one sample/estimate/predict cycle runs at a time. The rolling
//! window is moved into the running cycle and handed back when it finishes;
//! ticks that arrive meanwhile are dropped and counted.

pub mod alert;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod state;

pub use alert::AlertEvent;
pub use config::LiveConfig;
pub use engine::{LiveHandle, LiveInferenceLoop};
pub use metrics::{LoopMetrics, MetricsSnapshot};
pub use state::LoopState;
