use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;

use crate::error::ShredError;

/// Highest percentage reported before the output file is written.
pub const PRE_EXPORT_MAX: u8 = 99;

/// Notifications emitted by a running job.
#[derive(Debug)]
pub enum ShredEvent {
    Progress(u8),
    Freezing,
    Completed(PathBuf),
    Failed(ShredError),
}

/// Receiver side of a job's notifications.
///
/// Calls arrive on the worker thread; implementations must not block for
/// long and should hand the event over to their own context.
pub trait EventSink: Send {
    fn on_progress(&mut self, percent: u8);
    fn on_freezing(&mut self);
    fn on_completed(&mut self, output_path: &Path);
    fn on_failed(&mut self, error: ShredError);
}

/// Forwards events into a channel read by the front end.
pub struct ChannelSink {
    tx: Sender<ShredEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ShredEvent>) -> Self {
        Self { tx }
    }
}

// A disconnected receiver means the front end went away; the job still
// finishes so the output is not left half written.
impl EventSink for ChannelSink {
    fn on_progress(&mut self, percent: u8) {
        let _ = self.tx.send(ShredEvent::Progress(percent));
    }

    fn on_freezing(&mut self) {
        let _ = self.tx.send(ShredEvent::Freezing);
    }

    fn on_completed(&mut self, output_path: &Path) {
        let _ = self.tx.send(ShredEvent::Completed(output_path.to_path_buf()));
    }

    fn on_failed(&mut self, error: ShredError) {
        let _ = self.tx.send(ShredEvent::Failed(error));
    }
}

/// Writes job events to the `log` facade, for callers without a UI.
#[derive(Default)]
pub struct LogSink {
    last_logged: Option<u8>,
}

impl EventSink for LogSink {
    fn on_progress(&mut self, percent: u8) {
        // One line per ten percent is plenty for a log file.
        let bucket = percent / 10;
        if self.last_logged.map_or(true, |b| b != bucket) {
            self.last_logged = Some(bucket);
            log::info!("Shredding: {percent}%");
        }
    }

    fn on_freezing(&mut self) {
        log::info!("Writing output");
    }

    fn on_completed(&mut self, output_path: &Path) {
        log::info!("Shredded file written to {}", output_path.display());
    }

    fn on_failed(&mut self, error: ShredError) {
        log::error!("Shred job failed: {error}");
    }
}

/// Percentage after appending slice `k` of `total`, given `base` already
/// consumed by the slicing and arranging ticks.
pub fn reassembly_percent(base: u8, k: usize, total: usize) -> u8 {
    let base = base.min(PRE_EXPORT_MAX);
    if total == 0 {
        return base;
    }
    let budget = (PRE_EXPORT_MAX - base) as u64;
    let k = k.min(total) as u64;
    base + (budget * k / total as u64) as u8
}

/// Keeps emitted progress monotonic and drops repeats of the same value.
pub struct ProgressTracker<'a> {
    sink: &'a mut dyn EventSink,
    last: Option<u8>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a mut dyn EventSink) -> Self {
        Self { sink, last: None }
    }

    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.sink.on_progress(percent);
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }

    pub fn sink(&mut self) -> &mut dyn EventSink {
        &mut *self.sink
    }
}
