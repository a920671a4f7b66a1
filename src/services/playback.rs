//! Client-side playback bookkeeping.
//!
//! A player reports its position to a [`HistorySink`] every few seconds while
//! playing and once more when it stops. Nothing is sent while paused.
//! Saves are best-effort: a failed save is logged and dropped, the next tick
//! simply sends a fresher position.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{
    error::AppResult,
    models::{HistoryEntry, HistoryUpdate},
};

/// How often a playing title reports its position
pub const SAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Past this share of the runtime a title counts as finished
const COMPLETED_PERCENT: f64 = 95.0;

/// Positions before this are not worth remembering
const MIN_SAVED_POSITION_SECS: f64 = 10.0;

/// No resume offered this close to the end
const RESUME_END_MARGIN_SECS: f64 = 5.0;

/// Destination of position saves, usually the API client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, update: HistoryUpdate) -> AppResult<()>;

    async fn remove(&self, content_id: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackPosition {
    /// Seconds from the start
    pub current: f64,
    /// Total length in seconds, 0 while unknown
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Skip,
    Record,
    /// Finished titles leave the history
    Remove,
}

impl PlaybackPosition {
    pub fn new(current: f64, duration: f64) -> Self {
        Self { current, duration }
    }

    pub fn save_action(&self) -> SaveAction {
        if !(self.duration > 0.0) {
            return SaveAction::Skip;
        }

        let progress = self.current / self.duration * 100.0;
        if progress > COMPLETED_PERCENT {
            SaveAction::Remove
        } else if self.current > MIN_SAVED_POSITION_SECS {
            SaveAction::Record
        } else {
            SaveAction::Skip
        }
    }
}

/// Where playback should resume for a stored entry, if anywhere
pub fn resume_point(entry: &HistoryEntry) -> Option<f64> {
    let resumable =
        entry.last_time > 0.0 && entry.last_time < entry.duration - RESUME_END_MARGIN_SECS;
    resumable.then_some(entry.last_time)
}

/// The title being played
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub poster_url: String,
}

impl NowPlaying {
    fn update_at(&self, position: PlaybackPosition) -> HistoryUpdate {
        HistoryUpdate {
            id: self.id.clone(),
            kind: self.kind.clone(),
            title: self.title.clone(),
            poster_url: self.poster_url.clone(),
            last_time: position.current,
            duration: position.duration,
        }
    }
}

/// Applies the save policy to one position report
pub async fn save_position(sink: &dyn HistorySink, playing: &NowPlaying, position: PlaybackPosition) {
    let result = match position.save_action() {
        SaveAction::Skip => return,
        SaveAction::Remove => sink.remove(&playing.id).await,
        SaveAction::Record => sink.record(playing.update_at(position)).await,
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, content_id = %playing.id, "Failed to save watch position");
    }
}

/// Handle to a running position reporter
pub struct ReporterHandle {
    position_tx: watch::Sender<PlaybackPosition>,
    paused_tx: watch::Sender<bool>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ReporterHandle {
    /// Publishes the player's latest position; picked up on the next tick
    pub fn update(&self, position: PlaybackPosition) {
        self.position_tx.send_replace(position);
    }

    /// Suspends periodic saves until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.paused_tx.send_replace(true);
    }

    /// Restarts periodic saves, the first one a full period from now
    pub fn resume(&self) {
        self.paused_tx.send_replace(false);
    }

    /// Stops ticking after one final save of the latest position
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Progress reporter task failed");
        }
    }
}

/// Starts reporting the position of `playing` to `sink` every `period`
pub fn spawn_reporter(
    sink: Arc<dyn HistorySink>,
    playing: NowPlaying,
    period: Duration,
) -> ReporterHandle {
    let (position_tx, position_rx) = watch::channel(PlaybackPosition::default());
    let (paused_tx, paused_rx) = watch::channel(false);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let task = tokio::spawn(report_loop(
        sink,
        playing,
        period,
        position_rx,
        paused_rx,
        shutdown_rx,
    ));

    ReporterHandle {
        position_tx,
        paused_tx,
        shutdown_tx,
        task,
    }
}

async fn report_loop(
    sink: Arc<dyn HistorySink>,
    playing: NowPlaying,
    period: Duration,
    position_rx: watch::Receiver<PlaybackPosition>,
    mut paused_rx: watch::Receiver<bool>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    tracing::debug!(content_id = %playing.id, "Progress reporter started");
    let mut ticker = tokio::time::interval(period);
    // a slow save must not be followed by a burst of catch-up saves
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval fires immediately once; nothing has played yet
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *paused_rx.borrow() {
                    continue;
                }
                let position = *position_rx.borrow();
                save_position(sink.as_ref(), &playing, position).await;
            }
            Ok(()) = paused_rx.changed() => {
                let paused = *paused_rx.borrow_and_update();
                tracing::debug!(content_id = %playing.id, paused, "Playback state changed");
                if !paused {
                    ticker.reset();
                }
            }
            _ = shutdown_rx.recv() => {
                let position = *position_rx.borrow();
                save_position(sink.as_ref(), &playing, position).await;
                break;
            }
        }
    }

    tracing::debug!(content_id = %playing.id, "Progress reporter stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Utc;
    use std::sync::Mutex;

    fn playing() -> NowPlaying {
        NowPlaying {
            id: "603".to_string(),
            kind: "movie".to_string(),
            title: "The Matrix".to_string(),
            poster_url: String::new(),
        }
    }

    fn entry(last_time: f64, duration: f64) -> HistoryEntry {
        HistoryEntry {
            id: "603".to_string(),
            kind: "movie".to_string(),
            title: "The Matrix".to_string(),
            poster_url: String::new(),
            last_time,
            duration,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_action_thresholds() {
        assert_eq!(PlaybackPosition::new(50.0, 0.0).save_action(), SaveAction::Skip);
        assert_eq!(PlaybackPosition::new(50.0, f64::NAN).save_action(), SaveAction::Skip);
        assert_eq!(PlaybackPosition::new(10.0, 100.0).save_action(), SaveAction::Skip);
        assert_eq!(PlaybackPosition::new(11.0, 100.0).save_action(), SaveAction::Record);
        assert_eq!(PlaybackPosition::new(95.0, 100.0).save_action(), SaveAction::Record);
        assert_eq!(PlaybackPosition::new(96.0, 100.0).save_action(), SaveAction::Remove);
    }

    #[test]
    fn test_resume_point() {
        assert_eq!(resume_point(&entry(0.0, 100.0)), None);
        assert_eq!(resume_point(&entry(42.0, 100.0)), Some(42.0));
        assert_eq!(resume_point(&entry(95.0, 100.0)), None);
        assert_eq!(resume_point(&entry(94.5, 100.0)), Some(94.5));
    }

    #[tokio::test]
    async fn test_save_position_dispatch() {
        let mut sink = MockHistorySink::new();
        sink.expect_record()
            .withf(|update| update.id == "603" && update.last_time == 30.0)
            .times(1)
            .returning(|_| Ok(()));
        sink.expect_remove()
            .withf(|id| id == "603")
            .times(1)
            .returning(|_| Ok(()));

        save_position(&sink, &playing(), PlaybackPosition::new(30.0, 100.0)).await;
        save_position(&sink, &playing(), PlaybackPosition::new(99.0, 100.0)).await;
        save_position(&sink, &playing(), PlaybackPosition::new(3.0, 100.0)).await;
    }

    #[tokio::test]
    async fn test_failed_save_is_swallowed() {
        let mut sink = MockHistorySink::new();
        sink.expect_record()
            .returning(|_| Err(AppError::ExternalApi("offline".to_string())));

        save_position(&sink, &playing(), PlaybackPosition::new(30.0, 100.0)).await;
    }

    #[derive(Default)]
    struct RecordingSink {
        recorded: Mutex<Vec<f64>>,
    }

    #[async_trait]
    impl HistorySink for RecordingSink {
        async fn record(&self, update: HistoryUpdate) -> AppResult<()> {
            self.recorded.lock().unwrap().push(update.last_time);
            Ok(())
        }

        async fn remove(&self, _content_id: &str) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reporter_saves_final_position_on_stop() {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_reporter(sink.clone(), playing(), Duration::from_millis(10));

        handle.update(PlaybackPosition::new(20.0, 100.0));
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.update(PlaybackPosition::new(60.0, 100.0));
        handle.stop().await;

        let recorded = sink.recorded.lock().unwrap();
        assert!(!recorded.is_empty());
        assert_eq!(*recorded.last().unwrap(), 60.0);
    }

    #[tokio::test]
    async fn test_reporter_quiet_while_paused() {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_reporter(sink.clone(), playing(), Duration::from_millis(10));

        handle.update(PlaybackPosition::new(20.0, 100.0));
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.pause();
        tokio::time::sleep(Duration::from_millis(15)).await;
        let saves_before_pause = sink.recorded.lock().unwrap().len();
        assert!(saves_before_pause > 0);

        handle.update(PlaybackPosition::new(40.0, 100.0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let recorded = sink.recorded.lock().unwrap();
            assert_eq!(recorded.len(), saves_before_pause);
            assert!(!recorded.contains(&40.0));
        }

        handle.resume();
        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(*sink.recorded.lock().unwrap().last().unwrap(), 40.0);

        handle.stop().await;
    }
}
