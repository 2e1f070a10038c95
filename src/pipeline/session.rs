use std::{
    fs,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use crossbeam_channel::{Receiver, TrySendError, bounded, never};
use thiserror::Error;

use super::{overlay, provider::LandmarkProvider, source::FrameSource};
use crate::{
    counter::{CounterInfo, RepCounter},
    summary::{SessionSummary, SummaryBuilder},
    types::Frame,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session setup failed: {0:#}")]
    Setup(anyhow::Error),
    #[error("failed to read frame {index}: {cause:#}")]
    FrameRead { index: u64, cause: anyhow::Error },
    #[error("landmark provider failed on frame {index}: {cause:#}")]
    Provider { index: u64, cause: anyhow::Error },
    #[error("failed to write rendered frame {index}: {cause}")]
    Render {
        index: u64,
        cause: image::ImageError,
    },
    #[error("session worker panicked")]
    WorkerPanicked,
}

#[derive(Clone, Debug)]
pub struct SessionUpdate {
    pub index: u64,
    pub captured_at: Instant,
    pub body_found: bool,
    pub info: CounterInfo,
}

/// One stream: a frame source, a landmark provider and the counter they feed.
/// All three are owned for the lifetime of the stream and released when the
/// session is dropped, whichever way the run ends.
pub struct Session<S, P> {
    source: S,
    provider: P,
    counter: Box<dyn RepCounter>,
    render_dir: Option<PathBuf>,
}

impl<S: FrameSource, P: LandmarkProvider> Session<S, P> {
    pub fn new(source: S, provider: P, counter: Box<dyn RepCounter>) -> Self {
        Self {
            source,
            provider,
            counter,
            render_dir: None,
        }
    }

    /// Writes every frame that carries pixels, with overlays, as PNG into `dir`.
    pub fn with_render_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| {
            SessionError::Setup(anyhow::Error::new(err).context(format!(
                "failed to create render directory {}",
                dir.display()
            )))
        })?;
        self.render_dir = Some(dir);
        Ok(self)
    }

    pub fn run<F>(self, on_update: F) -> Result<SessionSummary, SessionError>
    where
        F: FnMut(&SessionUpdate),
    {
        let never = AtomicBool::new(false);
        self.run_until(&never, on_update)
    }

    /// Processes frames until the source is exhausted or `stop` is raised.
    pub fn run_until<F>(mut self, stop: &AtomicBool, mut on_update: F) -> Result<SessionSummary, SessionError>
    where
        F: FnMut(&SessionUpdate),
    {
        let exercise = self.counter.exercise();
        let mut summary = SummaryBuilder::new(exercise);
        let started = Instant::now();
        let mut index = 0u64;
        log::info!("{exercise} session started");

        while !stop.load(Ordering::Relaxed) {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(cause) => return Err(SessionError::FrameRead { index, cause }),
            };
            index = frame.index + 1;

            let update = self.process_frame(frame)?;
            summary.observe(&update.info);
            on_update(&update);
        }

        let summary = summary.finish();
        log::info!(
            "{exercise} session finished: {} reps over {} frames in {:?}",
            summary.reps,
            summary.frames,
            started.elapsed()
        );
        Ok(summary)
    }

    fn process_frame(&mut self, frame: Frame) -> Result<SessionUpdate, SessionError> {
        let landmarks = self
            .provider
            .process(&frame)
            .map_err(|cause| SessionError::Provider {
                index: frame.index,
                cause,
            })?;
        let info = self.counter.process(landmarks.as_ref(), frame.height);
        log::trace!(
            "frame {} ({:?} after capture): {}",
            frame.index,
            frame.timestamp.elapsed(),
            info.display_text()
        );
        let update = SessionUpdate {
            index: frame.index,
            captured_at: frame.timestamp,
            body_found: landmarks.is_some(),
            info,
        };

        if let Some(dir) = &self.render_dir {
            if frame.has_pixels() {
                let Frame {
                    mut rgba,
                    width,
                    height,
                    index,
                    ..
                } = frame;
                overlay::render(&mut rgba, width, height, landmarks.as_ref(), &update.info);
                let path = dir.join(format!("frame_{index:06}.png"));
                image::save_buffer(&path, &rgba, width, height, image::ColorType::Rgba8)
                    .map_err(|cause| SessionError::Render { index, cause })?;
            }
        }

        Ok(update)
    }
}

/// A session running on its own thread. Dropping the handle stops the
/// worker and waits for it.
#[derive(Debug)]
pub struct SessionHandle {
    stop: Arc<AtomicBool>,
    updates: Receiver<SessionUpdate>,
    handle: Option<thread::JoinHandle<Result<SessionSummary, SessionError>>>,
}

impl SessionHandle {
    pub fn updates(&self) -> &Receiver<SessionUpdate> {
        &self.updates
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the worker. Updates still queued are discarded.
    pub fn join(mut self) -> Result<SessionSummary, SessionError> {
        self.updates = never();
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(Err(SessionError::WorkerPanicked)),
            None => Err(SessionError::WorkerPanicked),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // Disconnect first so a worker blocked on a full channel wakes up.
        self.updates = never();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// How a spawned session hands updates to a consumer that falls behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Wait for room in the channel so every frame's update arrives.
    Every,
    /// Drop updates while the channel is full; counting never waits.
    Latest,
}

/// Runs `session` on a worker thread, publishing per-frame updates on a
/// bounded channel. With [`Delivery::Every`] the worker stops once the
/// receiver is gone.
pub fn spawn_session<S, P>(session: Session<S, P>, capacity: usize, delivery: Delivery) -> SessionHandle
where
    S: FrameSource + 'static,
    P: LandmarkProvider + 'static,
{
    let (update_tx, update_rx) = bounded(capacity.max(1));
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        session.run_until(&stop_flag, |update| match delivery {
            Delivery::Every => {
                if update_tx.send(update.clone()).is_err() {
                    log::debug!("update receiver gone, stopping after frame {}", update.index);
                    stop_flag.store(true, Ordering::SeqCst);
                }
            }
            Delivery::Latest => {
                if let Err(TrySendError::Full(update)) = update_tx.try_send(update.clone()) {
                    log::debug!("dropping update for frame {}, consumer is behind", update.index);
                }
            }
        })
    });

    SessionHandle {
        stop,
        updates: update_rx,
        handle: Some(handle),
    }
}
