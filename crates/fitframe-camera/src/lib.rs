#![warn(missing_docs)]
//! # fitframe-camera
//!
//! ## Purpose
//! Owns the camera stream lifecycle and the preview-to-frame bridge.
//!
//! ## Responsibilities
//! - Acquire and release the device camera exclusively, once at a time.
//! - Bridge the bound preview stream into single raw frame grabs.
//! - Provide a deterministic synthetic backend for tests and demos.
//!
//! ## Data flow
//! Host opens the camera modal -> [`CameraResourceManager::acquire`] ->
//! [`CaptureSurface::bind_preview`] -> [`CaptureSurface::grab_frame`] yields
//! one [`RawImage`] -> caller releases the camera immediately.
//!
//! ## Ownership and lifetimes
//! The live [`CameraHandle`] is exclusively owned by the manager; it cannot be
//! cloned, so a stream can never be double-released. Dropping the manager
//! releases any live stream.
//!
//! ## Error model
//! Acquisition failures are [`CameraError`] values and are meant to be
//! retained by the caller until the next attempt. Frame-grab failures are
//! [`CaptureError`] values and only abort the single grab.
//!
//! ## Security and privacy notes
//! Frame pixel data is never logged. Only stream identifiers and transition
//! events appear in logs.

use std::sync::Arc;

use fitframe_core::RawImage;
use thiserror::Error;

/// Identifier of one opened camera stream.
pub type StreamId = u64;

/// Opaque token for one live camera stream.
///
/// Deliberately not `Clone`: exactly one handle exists per open stream.
#[derive(Debug)]
pub struct CameraHandle {
    stream_id: StreamId,
}

impl CameraHandle {
    /// Returns the identifier of the underlying stream.
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }
}

/// Device abstraction over platform media capture.
///
/// Production builds wire a platform backend; tests and the demo binary wire
/// [`SyntheticCameraBackend`].
pub trait CameraBackend: Send + Sync {
    /// Requests a new camera stream from the device.
    fn open_stream(&self) -> Result<StreamId, CameraError>;

    /// Closes a previously opened stream. Closing twice is a backend bug.
    fn close_stream(&self, stream: StreamId);

    /// Returns `true` once the stream delivers frames.
    fn stream_ready(&self, stream: StreamId) -> bool;

    /// Grabs one frame from a ready stream.
    fn grab_frame(&self, stream: StreamId) -> Result<RawImage, CameraError>;
}

/// Exclusive owner of the camera resource.
///
/// At most one stream is live at any moment; [`acquire`](Self::acquire)
/// force-releases a leftover stream before opening a new one.
pub struct CameraResourceManager {
    backend: Arc<dyn CameraBackend>,
    handle: Option<CameraHandle>,
}

impl CameraResourceManager {
    /// Creates a manager over the given backend with no live stream.
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            handle: None,
        }
    }

    /// Acquires the camera, releasing any previously live stream first.
    ///
    /// # Errors
    /// Propagates the backend's [`CameraError`]; after a failure no stream is
    /// live.
    pub fn acquire(&mut self) -> Result<(), CameraError> {
        self.release();

        let stream_id = self.backend.open_stream()?;
        log::info!("camera stream {stream_id} acquired");
        self.handle = Some(CameraHandle { stream_id });
        Ok(())
    }

    /// Releases the live stream, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!("camera stream {} released", handle.stream_id);
            self.backend.close_stream(handle.stream_id);
        }
    }

    /// Returns `true` when a live stream exists and delivers frames.
    pub fn is_ready(&self) -> bool {
        match &self.handle {
            Some(handle) => self.backend.stream_ready(handle.stream_id),
            None => false,
        }
    }

    /// Returns the live stream id, if a stream is held.
    pub fn live_stream(&self) -> Option<StreamId> {
        self.handle.as_ref().map(CameraHandle::stream_id)
    }
}

impl Drop for CameraResourceManager {
    fn drop(&mut self) {
        self.release();
    }
}

/// Bridge between a bound preview stream and single-frame grabs.
///
/// Binding records which stream the preview shows; grabbing validates that
/// the binding still names the live stream before touching the backend.
#[derive(Debug, Default)]
pub struct CaptureSurface {
    bound: Option<StreamId>,
}

impl CaptureSurface {
    /// Creates an unbound surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the preview to the manager's live stream.
    ///
    /// # Errors
    /// Returns [`CaptureError::NotReady`] when no live stream exists.
    pub fn bind_preview(&mut self, manager: &CameraResourceManager) -> Result<(), CaptureError> {
        let stream = manager.live_stream().ok_or(CaptureError::NotReady)?;
        self.bound = Some(stream);
        log::debug!("preview bound to camera stream {stream}");
        Ok(())
    }

    /// Grabs one frame from the bound stream.
    ///
    /// # Errors
    /// - [`CaptureError::NotReady`] before binding or before the stream
    ///   delivers frames.
    /// - [`CaptureError::StaleBinding`] when the bound stream is no longer
    ///   the live one.
    /// - [`CaptureError::ZeroAreaFrame`] when the backend yields a frame with
    ///   a zero dimension.
    pub fn grab_frame(&self, manager: &CameraResourceManager) -> Result<RawImage, CaptureError> {
        let bound = self.bound.ok_or(CaptureError::NotReady)?;

        match manager.live_stream() {
            Some(live) if live == bound => {}
            _ => return Err(CaptureError::StaleBinding),
        }

        if !manager.is_ready() {
            return Err(CaptureError::NotReady);
        }

        let frame = manager.backend.grab_frame(bound)?;
        if frame.is_zero_area() {
            return Err(CaptureError::ZeroAreaFrame);
        }

        Ok(frame)
    }
}

/// Camera acquisition and device errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    /// The user or platform denied camera access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// The device failed while opening or reading the stream.
    #[error("camera backend failure: {0}")]
    Backend(String),
}

/// Frame-grab errors local to one capture attempt.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No bound stream, or the stream is not delivering frames yet.
    #[error("capture surface is not ready")]
    NotReady,
    /// The bound stream is no longer the live one.
    #[error("preview binding is stale")]
    StaleBinding,
    /// The backend produced a frame with a zero dimension.
    #[error("captured frame has zero area")]
    ZeroAreaFrame,
    /// Device failure during the grab.
    #[error(transparent)]
    Camera(#[from] CameraError),
}

pub use synthetic::SyntheticCameraBackend;

mod synthetic {
    //! Deterministic in-memory camera backend for tests and demos.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use fitframe_core::{ImageSource, RawImage};

    use super::{CameraBackend, CameraError, StreamId};

    #[derive(Debug)]
    struct SyntheticState {
        scripted_denials: VecDeque<CameraError>,
        next_stream: StreamId,
        live: Option<StreamId>,
        ready: bool,
        frame_size: (u32, u32),
        opened: usize,
        closed: usize,
    }

    /// Scriptable camera backend with deterministic frames and call counters.
    ///
    /// Streams are numbered from 1. Frames are a flat gray fill so grabs are
    /// reproducible across runs.
    pub struct SyntheticCameraBackend {
        state: Mutex<SyntheticState>,
    }

    impl SyntheticCameraBackend {
        /// Creates a backend that grants access and is immediately ready.
        pub fn granting(frame_width: u32, frame_height: u32) -> Self {
            Self {
                state: Mutex::new(SyntheticState {
                    scripted_denials: VecDeque::new(),
                    next_stream: 1,
                    live: None,
                    ready: true,
                    frame_size: (frame_width, frame_height),
                    opened: 0,
                    closed: 0,
                }),
            }
        }

        /// Scripts the next `open_stream` call to fail with `error`.
        pub fn deny_next_open(&self, error: CameraError) {
            self.lock().scripted_denials.push_back(error);
        }

        /// Sets whether the live stream reports frames as available.
        pub fn set_ready(&self, ready: bool) {
            self.lock().ready = ready;
        }

        /// Overrides the dimensions of grabbed frames.
        pub fn set_frame_size(&self, width: u32, height: u32) {
            self.lock().frame_size = (width, height);
        }

        /// Number of streams opened so far.
        pub fn opened_count(&self) -> usize {
            self.lock().opened
        }

        /// Number of streams closed so far.
        pub fn closed_count(&self) -> usize {
            self.lock().closed
        }

        /// Returns `true` while a stream is open and unclosed.
        pub fn has_live_stream(&self) -> bool {
            self.lock().live.is_some()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, SyntheticState> {
            match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }
    }

    impl CameraBackend for SyntheticCameraBackend {
        fn open_stream(&self) -> Result<StreamId, CameraError> {
            let mut state = self.lock();
            if let Some(error) = state.scripted_denials.pop_front() {
                return Err(error);
            }

            let stream = state.next_stream;
            state.next_stream += 1;
            state.live = Some(stream);
            state.opened += 1;
            Ok(stream)
        }

        fn close_stream(&self, stream: StreamId) {
            let mut state = self.lock();
            if state.live == Some(stream) {
                state.live = None;
            }
            state.closed += 1;
        }

        fn stream_ready(&self, stream: StreamId) -> bool {
            let state = self.lock();
            state.live == Some(stream) && state.ready
        }

        fn grab_frame(&self, _stream: StreamId) -> Result<RawImage, CameraError> {
            let (width, height) = self.lock().frame_size;
            let rgba = vec![0x80; (width as usize) * (height as usize) * 4];
            RawImage::new(width, height, rgba, ImageSource::Captured)
                .map_err(|error| CameraError::Backend(error.to_string()))
        }
    }
}
