use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    core::{
        arranger::arrange,
        audio::Codec,
        dsp::conform_tracks,
        exporter::{export, output_path},
        reassembler::reassemble,
        slicer::slice_track,
    },
    error::{ErrorKind, Result, ShredError},
    io::progress::{EventSink, ProgressTracker, PRE_EXPORT_MAX},
    types::{ShredOptions, ShredRequest, Track},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Loading,
    Slicing,
    Arranging,
    Reassembling,
    Freezing,
    Exporting,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

/// State shared between a running job and whoever observes it.
#[derive(Debug)]
pub struct JobStatus {
    state: Mutex<JobState>,
    failed_during: Mutex<Option<JobState>>,
    in_progress: AtomicBool,
    cancelled: AtomicBool,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: Mutex::new(JobState::Idle),
            failed_during: Mutex::new(None),
            in_progress: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True from entering Loading until Done or Failed.
    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// The state the job was in when it failed.
    pub fn failed_during(&self) -> Option<JobState> {
        *self.failed_during.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ask the job to stop. Honoured between slices while reassembling and
    /// before the export starts; afterwards the job runs to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Move a job that stopped without finishing into Failed. Returns false
    /// when it already reached Done or Failed.
    pub(crate) fn abandon(&self) -> bool {
        if self.state().is_terminal() {
            return false;
        }
        self.enter(JobState::Failed);
        true
    }

    fn enter(&self, next: JobState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if next == JobState::Failed {
            *self.failed_during.lock().unwrap_or_else(|e| e.into_inner()) = Some(*state);
        }
        debug!("job state {:?} -> {:?}", *state, next);
        *state = next;

        match next {
            JobState::Loading => self.in_progress.store(true, Ordering::Release),
            JobState::Done | JobState::Failed => self.in_progress.store(false, Ordering::Release),
            _ => {}
        }
    }
}

/// Runs one shred request from decoding to the written output file.
///
/// A job is consumed by running it; front ends create a new one per request.
pub struct ShredJob {
    codec: Arc<dyn Codec>,
    options: ShredOptions,
    status: Arc<JobStatus>,
}

impl ShredJob {
    pub fn new(codec: Arc<dyn Codec>, options: ShredOptions) -> Self {
        Self {
            codec,
            options,
            status: Arc::new(JobStatus::default()),
        }
    }

    pub fn status(&self) -> Arc<JobStatus> {
        Arc::clone(&self.status)
    }

    /// Run the job on the calling thread, seeding the shuffle from the
    /// options or from system entropy.
    pub fn run(
        self,
        request: &ShredRequest,
        sink: &mut dyn EventSink,
    ) -> std::result::Result<PathBuf, ErrorKind> {
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(request, sink, &mut rng)
    }

    /// Like [`ShredJob::run`] with an explicit random source.
    ///
    /// Exactly one of `on_completed` / `on_failed` reaches the sink. The
    /// returned error only carries the kind; the full error goes to the sink.
    pub fn run_with_rng<R: Rng + ?Sized>(
        self,
        request: &ShredRequest,
        sink: &mut dyn EventSink,
        rng: &mut R,
    ) -> std::result::Result<PathBuf, ErrorKind> {
        let started = Instant::now();
        info!(
            "Shredding {} file(s), {} ms slices, mode {:?}",
            request.paths().len(),
            request.slice_length_ms(),
            request.mode()
        );

        let outcome = {
            let mut progress = ProgressTracker::new(sink);
            self.execute(request, &mut progress, rng)
        };

        match outcome {
            Ok(path) => {
                self.status.enter(JobState::Done);
                info!(
                    "Wrote {} in {:.1}s",
                    path.display(),
                    started.elapsed().as_secs_f64()
                );
                sink.on_completed(&path);
                Ok(path)
            }
            Err(e) => {
                self.status.enter(JobState::Failed);
                warn!(
                    "Shred job failed during {:?}: {}",
                    self.status.failed_during(),
                    e
                );
                let kind = e.kind();
                sink.on_failed(e);
                Err(kind)
            }
        }
    }

    fn execute<R: Rng + ?Sized>(
        &self,
        request: &ShredRequest,
        progress: &mut ProgressTracker<'_>,
        rng: &mut R,
    ) -> Result<PathBuf> {
        self.status.enter(JobState::Loading);
        progress.report(0);

        let mut tracks = Vec::with_capacity(request.paths().len());
        for path in request.paths() {
            let audio = self
                .codec
                .decode(path)
                .map_err(|source| ShredError::Decode {
                    path: path.clone(),
                    source,
                })?;
            if audio.sample_rate == 0 || audio.channels == 0 {
                return Err(ShredError::Decode {
                    path: path.clone(),
                    source: anyhow::anyhow!(
                        "invalid format: {} Hz, {} channels",
                        audio.sample_rate,
                        audio.channels
                    ),
                });
            }
            debug!(
                "loaded {}: {} ms, {} Hz, {} ch",
                path.display(),
                audio.duration_ms(),
                audio.sample_rate,
                audio.channels
            );
            tracks.push(Track {
                source: path.clone(),
                audio,
            });
        }
        let tracks = conform_tracks(tracks)?;

        self.status.enter(JobState::Slicing);
        let mut ticks = 0usize;
        let mut per_track = Vec::with_capacity(tracks.len());
        for (i, track) in tracks.iter().enumerate() {
            let slices = slice_track(i, &track.audio, request.slice_length_ms());
            if slices.is_empty() {
                return Err(ShredError::EmptyTrack {
                    path: track.source.clone(),
                });
            }
            debug!("{}: {} slices", track.source.display(), slices.len());
            per_track.push(slices);
            ticks += 1;
            progress.report(tick_percent(ticks));
        }

        self.status.enter(JobState::Arranging);
        let plan = arrange(per_track, request.mode(), rng)?;
        if request.interlace() {
            ticks += 1;
            progress.report(tick_percent(ticks));
        }
        debug!("plan holds {} slices", plan.len());

        self.status.enter(JobState::Reassembling);
        let audio = reassemble(
            &tracks,
            &plan,
            tick_percent(ticks),
            progress,
            &self.status.cancelled,
        )?;
        drop(tracks);

        if self.status.is_cancelled() {
            return Err(ShredError::Cancelled);
        }

        self.status.enter(JobState::Freezing);
        progress.sink().on_freezing();
        thread::sleep(Duration::from_millis(self.options.freeze_pause_ms));

        self.status.enter(JobState::Exporting);
        let destination = output_path(&request.paths()[0], &self.options.output_file_name);
        let path = export(self.codec.as_ref(), &audio, &destination)?;
        progress.report(100);

        Ok(path)
    }
}

/// Coarse progress for the per-track ticks, saturating below the export mark.
fn tick_percent(ticks: usize) -> u8 {
    ticks.min(PRE_EXPORT_MAX as usize) as u8
}
