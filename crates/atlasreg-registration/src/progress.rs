//! Stage-level progress reporting.
//!
//! Callbacks are notified when a stage starts, completes or fails. The
//! pipeline itself never depends on what a callback does.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::registration::Stage;

/// Something that happened to a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Started(Stage),
    Completed { stage: Stage, elapsed: Duration },
    Failed { stage: Stage, error: String },
}

impl StageEvent {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Started(stage) => *stage,
            Self::Completed { stage, .. } | Self::Failed { stage, .. } => *stage,
        }
    }
}

/// Callback trait for monitoring a registration job.
pub trait StageCallback: Send + Sync {
    /// Called before the stage's program is launched.
    fn on_stage_start(&self, _stage: Stage) {}

    /// Called when the stage's program exited successfully.
    fn on_stage_complete(&self, _stage: Stage, _elapsed: Duration) {}

    /// Called when the stage failed.
    fn on_stage_error(&self, _stage: Stage, _error: &str) {}
}

/// Logs stage transitions through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCallback;

impl StageCallback for TracingCallback {
    fn on_stage_start(&self, stage: Stage) {
        tracing::info!("{} started", stage);
    }

    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        tracing::info!("{} completed in {:.2}s", stage, elapsed.as_secs_f64());
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        tracing::error!("{} failed: {}", stage, error);
    }
}

/// Records every event.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<StageEvent>>>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded history.
    pub fn get_history(&self) -> Vec<StageEvent> {
        self.history.lock().unwrap().clone()
    }

    /// Stages that completed, in completion order.
    pub fn completed_stages(&self) -> Vec<Stage> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                StageEvent::Completed { stage, .. } => Some(*stage),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.history.lock().unwrap().clear();
    }
}

impl StageCallback for HistoryCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.history.lock().unwrap().push(StageEvent::Started(stage));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        self.history
            .lock()
            .unwrap()
            .push(StageEvent::Completed { stage, elapsed });
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        self.history.lock().unwrap().push(StageEvent::Failed {
            stage,
            error: error.to_string(),
        });
    }
}

/// Fans stage events out to registered callbacks.
#[derive(Clone, Default)]
pub struct StageTracker {
    callbacks: Vec<Arc<dyn StageCallback>>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_callback(&mut self, callback: Arc<dyn StageCallback>) {
        self.callbacks.push(callback);
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run `f` as `stage`, reporting start, completion or failure.
    pub fn track<T, E: std::fmt::Display>(
        &self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        for callback in &self.callbacks {
            callback.on_stage_start(stage);
        }

        let start = Instant::now();
        let result = f();

        match &result {
            Ok(_) => {
                let elapsed = start.elapsed();
                for callback in &self.callbacks {
                    callback.on_stage_complete(stage, elapsed);
                }
            }
            Err(e) => {
                let error = e.to_string();
                for callback in &self.callbacks {
                    callback.on_stage_error(stage, &error);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_callback() {
        let callback = HistoryCallback::new();
        callback.on_stage_start(Stage::Affine);
        callback.on_stage_complete(Stage::Affine, Duration::from_millis(5));
        callback.on_stage_start(Stage::Freeform);
        callback.on_stage_error(Stage::Freeform, "exit 1");

        let history = callback.get_history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].stage(), Stage::Freeform);
        assert_eq!(callback.completed_stages(), vec![Stage::Affine]);

        callback.clear();
        assert!(callback.get_history().is_empty());
    }

    #[test]
    fn test_tracker_reports_outcome() {
        let history = Arc::new(HistoryCallback::new());
        let mut tracker = StageTracker::new();
        tracker.add_callback(history.clone());
        tracker.add_callback(Arc::new(TracingCallback));
        assert_eq!(tracker.len(), 2);

        let ok: Result<u8, String> = tracker.track(Stage::Affine, || Ok(1));
        assert_eq!(ok, Ok(1));
        let err: Result<u8, String> = tracker.track(Stage::Freeform, || Err("boom".to_string()));
        assert!(err.is_err());

        let events = history.get_history();
        assert!(matches!(events[1], StageEvent::Completed { stage: Stage::Affine, .. }));
        assert_eq!(
            events[3],
            StageEvent::Failed {
                stage: Stage::Freeform,
                error: "boom".to_string()
            }
        );
    }
}
