use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::Receiver;
use log::error;

use crate::{
    core::audio::{Codec, FileCodec},
    error::{Result, ShredError},
    io::progress::{ChannelSink, EventSink, ShredEvent},
    pipeline::{JobState, JobStatus, ShredJob},
    types::{ShredOptions, ShredRequest},
};

/// Front-end facing entry point: accepts one job at a time and runs it on a
/// background thread.
pub struct Shredder {
    codec: Arc<dyn Codec>,
    options: ShredOptions,
    active: Option<Arc<JobStatus>>,
}

impl Shredder {
    pub fn new(options: ShredOptions) -> Self {
        let codec = FileCodec::new(options.bitrate_kbps);
        Self::with_codec(Arc::new(codec), options)
    }

    pub fn with_codec(codec: Arc<dyn Codec>, options: ShredOptions) -> Self {
        Self {
            codec,
            options,
            active: None,
        }
    }

    pub fn options(&self) -> &ShredOptions {
        &self.options
    }

    /// True while the last submitted job has not reached Done or Failed.
    pub fn in_progress(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|status| !status.state().is_terminal())
    }

    /// Validate the request and start it on a worker thread.
    ///
    /// Validation failures and a still-running previous job are reported
    /// here; nothing is emitted on the event channel in that case.
    pub fn submit<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        slice_length_ms: u32,
        interlace: bool,
    ) -> Result<JobHandle> {
        if self.in_progress() {
            return Err(ShredError::JobInProgress);
        }
        let request = ShredRequest::new(paths, slice_length_ms, interlace)?;
        self.options.validate()?;

        let job = ShredJob::new(Arc::clone(&self.codec), self.options.clone());
        let status = job.status();
        let (tx, rx) = crossbeam_channel::unbounded::<ShredEvent>();

        let thread = thread::Builder::new()
            .name("shred-worker".into())
            .spawn(move || {
                let mut sink = ChannelSink::new(tx);
                let status = job.status();
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| job.run(&request, &mut sink)));
                if let Err(payload) = outcome {
                    let message = panic_message(payload.as_ref());
                    error!("shred worker panicked: {message}");
                    if status.abandon() {
                        sink.on_failed(ShredError::WorkerPanicked(message));
                    }
                }
            })?;

        self.active = Some(Arc::clone(&status));

        Ok(JobHandle {
            events: rx,
            status,
            thread: Some(thread),
        })
    }
}

/// Observer side of a submitted job.
pub struct JobHandle {
    events: Receiver<ShredEvent>,
    status: Arc<JobStatus>,
    thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Progress and result notifications, closed once the job finished.
    pub fn events(&self) -> &Receiver<ShredEvent> {
        &self.events
    }

    pub fn state(&self) -> JobState {
        self.status.state()
    }

    pub fn in_progress(&self) -> bool {
        self.status.in_progress()
    }

    pub fn cancel(&self) {
        self.status.cancel();
    }

    /// Block until the worker thread exits.
    pub fn join(mut self) -> thread::Result<()> {
        match self.thread.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
