//! Background thread for decomposition and reconstruction.
//!
//! The caller (typically a UI event loop) sends load and mode-count
//! requests without blocking and polls for results. Each request takes a
//! fresh generation; anything older is skipped or cancelled mid-flight, so
//! overlapping "apply" actions never interleave and only the newest result
//! is delivered.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbImage;

use crate::error::SvdError;
use crate::svd::{
    CancelToken, DecomposedImage, GenerationCounter, PipelineOptions, Reconstruction, SvdEngine,
};

/// Request to decompose a new image.
struct LoadRequest {
    token: CancelToken,
    name: String,
    image: RgbImage,
}

/// Request to reconstruct the current image with a mode count.
struct ReconstructRequest {
    token: CancelToken,
    modes: usize,
}

/// Message sent to the worker thread.
enum ThreadMessage {
    /// Decompose a new image, replacing the current one
    Load(LoadRequest),
    /// Reconstruct the current image
    Reconstruct(ReconstructRequest),
    /// Shutdown the thread
    Shutdown,
}

/// Which kind of request a result answers.
///
/// Loads and reconstructions are numbered by separate counters, so a
/// generation is only unique together with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `request_load`
    Load,
    /// `request_modes`
    Reconstruct,
}

/// Result delivered back to the caller.
#[derive(Debug)]
pub enum WorkerResult {
    /// An image was decomposed and is ready for reconstruction
    Loaded {
        /// Generation of the request that produced this result
        generation: u64,
        /// Name given with the load request
        name: String,
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
        /// Largest valid mode count for this image
        max_modes: usize,
    },
    /// A reconstruction finished
    Reconstructed {
        /// Generation of the request that produced this result
        generation: u64,
        /// The reconstructed image and channels
        reconstruction: Reconstruction,
    },
    /// A request failed
    Error {
        /// Kind of the failed request
        kind: RequestKind,
        /// Generation of the failed request
        generation: u64,
        /// What went wrong
        error: SvdError,
    },
}

/// State owned by the worker thread.
struct WorkerState {
    engine: Box<dyn SvdEngine>,
    options: PipelineOptions,
    current: Option<DecomposedImage>,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerState {
    fn handle_load(&mut self, request: LoadRequest) -> Option<WorkerResult> {
        let generation = request.token.generation();
        if request.token.is_cancelled() {
            log::debug!("Skipping stale load request {} ({})", generation, request.name);
            return None;
        }

        // The old decomposition belongs to a different image; drop it even if
        // this load fails so reconstructions never mix images.
        self.current = None;

        match DecomposedImage::decompose(
            &request.image,
            self.engine.as_ref(),
            self.options,
            &request.token,
        ) {
            // A newer load arrived after the last channel started
            Ok(_) if request.token.is_cancelled() => {
                log::debug!("Dropping superseded load {} ({})", generation, request.name);
                None
            }
            Ok(decomposed) => {
                let result = WorkerResult::Loaded {
                    generation,
                    name: request.name,
                    width: decomposed.width(),
                    height: decomposed.height(),
                    max_modes: decomposed.max_modes(),
                };
                self.current = Some(decomposed);
                Some(result)
            }
            Err(SvdError::Cancelled) => None,
            Err(error) => {
                log::warn!("Failed to decompose {}: {}", request.name, error);
                Some(WorkerResult::Error {
                    kind: RequestKind::Load,
                    generation,
                    error,
                })
            }
        }
    }

    fn handle_reconstruct(&mut self, request: ReconstructRequest) -> Option<WorkerResult> {
        let generation = request.token.generation();
        if request.token.is_cancelled() {
            log::debug!("Skipping stale reconstruct request {}", generation);
            return None;
        }

        let Some(decomposed) = self.current.as_ref() else {
            return Some(WorkerResult::Error {
                kind: RequestKind::Reconstruct,
                generation,
                error: SvdError::NoImageLoaded,
            });
        };

        match decomposed.reconstruct(request.modes, &request.token) {
            // A newer request may have arrived while combining
            Ok(_) if request.token.is_cancelled() => None,
            Ok(reconstruction) => Some(WorkerResult::Reconstructed {
                generation,
                reconstruction,
            }),
            Err(SvdError::Cancelled) => None,
            Err(error) => Some(WorkerResult::Error {
                kind: RequestKind::Reconstruct,
                generation,
                error,
            }),
        }
    }

    /// Worker thread main loop.
    fn run(mut self, request_rx: Receiver<ThreadMessage>, result_tx: Sender<WorkerResult>) {
        loop {
            let result = match request_rx.recv() {
                Ok(ThreadMessage::Load(request)) => self.handle_load(request),
                Ok(ThreadMessage::Reconstruct(request)) => self.handle_reconstruct(request),
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    // Channel closed, exit
                    log::debug!("Request channel closed, reconstruction thread exiting");
                    break;
                }
            };

            let sent = result.is_none_or(|result| result_tx.send(result).is_ok());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if !sent {
                log::warn!("Result channel closed, reconstruction thread exiting");
                break;
            }
        }
    }
}

/// Manages a background thread for SVD decomposition and reconstruction.
pub struct ReconstructionWorker {
    /// Sender for requests to the background thread
    request_tx: Sender<ThreadMessage>,
    /// Receiver for results from the background thread
    result_rx: Receiver<WorkerResult>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    /// Bumped by every load; cancels in-flight decompositions
    load_generations: GenerationCounter,
    /// Bumped by every request; cancels in-flight reconstructions
    mode_generations: GenerationCounter,
    /// Requests sent but not yet processed or skipped
    in_flight: Arc<AtomicUsize>,
}

impl ReconstructionWorker {
    /// Spawn a new worker thread using `engine` for decomposition.
    pub fn spawn(engine: Box<dyn SvdEngine>, options: PipelineOptions) -> Result<Self, SvdError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<WorkerResult>();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let state = WorkerState {
            engine,
            options,
            current: None,
            in_flight: Arc::clone(&in_flight),
        };

        let thread_handle = thread::Builder::new()
            .name("svd-reconstruct".to_string())
            .spawn(move || {
                log::info!("Reconstruction thread started");
                state.run(request_rx, result_tx);
                log::info!("Reconstruction thread exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            load_generations: GenerationCounter::new(),
            mode_generations: GenerationCounter::new(),
            in_flight,
        })
    }

    fn send(&self, message: ThreadMessage) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.request_tx.send(message).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            log::error!("Failed to send request: reconstruction thread is gone");
        }
    }

    /// Request decomposition of a new image.
    ///
    /// Cancels any pending load and any pending reconstruction of the
    /// previous image. Returns the request's generation.
    pub fn request_load(&mut self, name: impl Into<String>, image: RgbImage) -> u64 {
        let token = self.load_generations.next_token();
        // Invalidate reconstructions queued against the previous image.
        let _ = self.mode_generations.next_token();
        let generation = token.generation();
        let name = name.into();
        log::debug!("Sent load request {} for {}", generation, name);
        self.send(ThreadMessage::Load(LoadRequest { token, name, image }));
        generation
    }

    /// Request reconstruction of the current image with `modes` modes.
    ///
    /// Cancels any pending reconstruction. Returns the request's generation.
    pub fn request_modes(&mut self, modes: usize) -> u64 {
        let token = self.mode_generations.next_token();
        let generation = token.generation();
        log::debug!("Sent reconstruct request {} ({} modes)", generation, modes);
        self.send(ThreadMessage::Reconstruct(ReconstructRequest { token, modes }));
        generation
    }

    /// Take one completed result from the queue.
    ///
    /// Returns the oldest result, or None if no results are available.
    /// Non-blocking.
    pub fn take_one_result(&mut self) -> Option<WorkerResult> {
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Reconstruction thread disconnected");
                None
            }
        }
    }

    /// Wait up to `timeout` for the next result.
    pub fn wait_result(&mut self, timeout: Duration) -> Option<WorkerResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Reconstruction thread disconnected");
                None
            }
        }
    }

    /// Whether any request is still queued or running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Generation of the newest reconstruct (or load) request.
    pub fn latest_generation(&self) -> u64 {
        self.mode_generations.current()
    }
}

impl Drop for ReconstructionWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down reconstruction thread");

        // Cancel whatever is running so the join doesn't wait on a stale SVD
        let _ = self.load_generations.next_token();
        let _ = self.mode_generations.next_token();
        let _ = self.request_tx.send(ThreadMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take()
            && let Err(e) = handle.join()
        {
            log::warn!("Reconstruction thread panicked: {:?}", e);
        }
    }
}
