#![warn(missing_docs)]
//! # fitframe-widget
//!
//! ## Purpose
//! Orchestrates capture, compression, the remote pipeline, and presentation
//! state for the try-on widget.
//!
//! ## Responsibilities
//! - Hold the single authoritative widget state machine.
//! - Sequence camera acquisition, frame grabs, and upload decoding into one
//!   compressed customer image.
//! - Drive the two-phase pipeline and fold completions back into state,
//!   discarding completions that outlived a reset.
//! - Raise host-facing notices and project render-ready views.
//!
//! ## Data flow
//! Host events (modal open/close, upload, camera, submit) -> controller
//! transitions -> pipeline run -> completion folded into [`WidgetPhase`] ->
//! [`WidgetView`] projection + drained [`Notice`]s.
//!
//! ## Ownership and lifetimes
//! The controller exclusively owns the camera manager and the current
//! customer image. Hosts that only need open/close hold a [`WidgetHandle`];
//! the full controller stays with its owner.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`WidgetError`]. Hard pipeline failures
//! revert to `Captured` with the customer image retained; soft fallbacks
//! advance to `Processed` without an image. Nothing here panics.
//!
//! ## Security and privacy notes
//! - The camera stream is released on capture, cancel, modal close,
//!   fullscreen close, product change, and drop.
//! - Customer image bytes never appear in logs or notices.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use fitframe_camera::{
    CameraBackend, CameraResourceManager, CaptureError, CaptureSurface,
};
use fitframe_compress::{CompressError, compress, decode_upload};
use fitframe_core::{CompressedImage, Notice};
use fitframe_pipeline::{RemoteError, TryOnClient, TryOnOutcome, classify_remote_error};
use fitframe_ui::{WidgetView, fit_summary};
use thiserror::Error;

/// Build-time widget version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("FITFRAME_VERSION");

/// Returns the widget version sourced from root `VERSION`.
pub fn widget_version() -> &'static str {
    APP_VERSION
}

/// Checks the runtime camera kill-switch env var.
///
/// Semantics:
/// - Unset => camera enabled.
/// - `0`, `false`, `off` (case-insensitive) => camera disabled.
/// - Any other value => camera enabled.
pub fn camera_enabled_from_env() -> bool {
    match std::env::var("FITFRAME_CAMERA_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Product the widget is currently attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Store identifier of the product.
    pub id: String,
    /// URL of the product image sent to the process phase.
    pub image_url: String,
}

/// Authoritative widget state.
///
/// A produced result always carries the customer image it was computed from,
/// and a result without an image is its own variant rather than a `Processed`
/// state with empty fields.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetPhase {
    /// No customer image held.
    Idle,
    /// A customer image is held and ready to submit.
    Captured {
        /// The compressed customer image.
        customer: CompressedImage,
    },
    /// A try-on run is in flight for the held image.
    Processing {
        /// The compressed customer image the run was started with.
        customer: CompressedImage,
    },
    /// A try-on run finished.
    Processed {
        /// The customer image the outcome belongs to.
        customer: CompressedImage,
        /// What the service produced.
        outcome: TryOnOutcome,
    },
}

impl WidgetPhase {
    /// Returns the held customer image, if any.
    pub fn customer_image(&self) -> Option<&CompressedImage> {
        match self {
            WidgetPhase::Idle => None,
            WidgetPhase::Captured { customer }
            | WidgetPhase::Processing { customer }
            | WidgetPhase::Processed { customer, .. } => Some(customer),
        }
    }
}

/// Token for one in-flight try-on run.
///
/// Carries the epoch observed when the run started; a completion whose epoch
/// no longer matches the controller is silently discarded.
#[derive(Debug)]
pub struct TryOnJob {
    epoch: u64,
    /// Product identifier the run was started for.
    pub product_id: String,
    /// Product image URL for the process phase.
    pub product_image_url: String,
    /// Customer image snapshot for the session phase.
    pub customer: CompressedImage,
}

/// Host navigation seam for the terminal widget actions.
pub trait NavigationHooks {
    /// Navigates the host to the product page.
    fn navigate_to_product(&self, product_id: &str);

    /// Clears the host's current product selection.
    fn unselect_product(&self);
}

/// The widget state machine and orchestration hub.
pub struct WidgetLifecycleController {
    phase: WidgetPhase,
    product: Option<Product>,
    is_fullscreen: bool,
    is_camera_open: bool,
    camera_error: Option<String>,
    camera: CameraResourceManager,
    surface: CaptureSurface,
    epoch: u64,
    notices: Vec<Notice>,
}

impl WidgetLifecycleController {
    /// Creates an idle controller over the given camera backend.
    pub fn new(camera_backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            phase: WidgetPhase::Idle,
            product: None,
            is_fullscreen: false,
            is_camera_open: false,
            camera_error: None,
            camera: CameraResourceManager::new(camera_backend),
            surface: CaptureSurface::new(),
            epoch: 0,
            notices: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> &WidgetPhase {
        &self.phase
    }

    /// Currently attached product, if any.
    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    /// Fullscreen modal flag.
    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    /// Camera modal flag.
    pub fn is_camera_open(&self) -> bool {
        self.is_camera_open
    }

    /// Retained camera error, shown until the next acquisition attempt.
    pub fn camera_error(&self) -> Option<&str> {
        self.camera_error.as_deref()
    }

    /// Removes and returns all pending host notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Attaches the widget to a product, wiping held state on change.
    pub fn set_product(&mut self, id: impl Into<String>, image_url: impl Into<String>) {
        let next = Product {
            id: id.into(),
            image_url: image_url.into(),
        };

        if self.product.as_ref().is_some_and(|current| current.id != next.id) {
            log::info!("product changed, discarding held widget state");
            self.wipe_interest();
            self.close_camera_stream();
        }

        self.product = Some(next);
    }

    /// Opens the fullscreen modal, starting from a clean slate.
    pub fn open_fullscreen(&mut self) {
        self.wipe_interest();
        self.close_camera_stream();
        self.is_fullscreen = true;
    }

    /// Closes the fullscreen modal.
    ///
    /// A composite result survives for the compact preview; everything else,
    /// including an in-flight run and a no-image outcome, is discarded.
    pub fn close_fullscreen(&mut self) {
        let keeps_result = matches!(
            self.phase,
            WidgetPhase::Processed {
                outcome: TryOnOutcome::Composite { .. },
                ..
            }
        );

        if !keeps_result {
            self.wipe_interest();
        }

        self.close_camera_stream();
        self.is_fullscreen = false;
    }

    /// Discards the held image and result. Modal flags are untouched.
    pub fn reset(&mut self) {
        self.wipe_interest();
    }

    /// Adds a customer photo from an uploaded file.
    ///
    /// Replacing an existing photo or result is always permitted; replacing
    /// mid-run is not.
    ///
    /// # Errors
    /// Rejects non-`image/*` MIME types, undecodable bodies, and uploads
    /// while a run is in flight.
    pub fn upload_photo(&mut self, mime: &str, bytes: &[u8]) -> Result<(), WidgetError> {
        if !mime.starts_with("image/") {
            self.notices
                .push(Notice::error("Please choose an image file."));
            return Err(WidgetError::UnsupportedMime(mime.to_string()));
        }
        if matches!(self.phase, WidgetPhase::Processing { .. }) {
            return Err(WidgetError::Busy);
        }

        let raw = decode_upload(bytes)?;
        let customer = compress(&raw)?;
        log::info!(
            "uploaded photo compressed to {} bytes at {}x{}",
            customer.byte_len(),
            customer.width,
            customer.height
        );

        self.phase = WidgetPhase::Captured { customer };
        self.notices.push(Notice::info("Photo added."));
        Ok(())
    }

    /// Opens the camera modal and attempts to acquire the camera.
    ///
    /// An acquisition failure keeps the modal open with a retained error so
    /// the user can retry.
    ///
    /// # Errors
    /// Returns [`WidgetError::CameraDisabled`] when the kill switch is off
    /// and [`WidgetError::Busy`] while a run is in flight.
    pub fn open_camera(&mut self) -> Result<(), WidgetError> {
        if !camera_enabled_from_env() {
            self.notices
                .push(Notice::error("Camera capture is currently disabled."));
            return Err(WidgetError::CameraDisabled);
        }
        if matches!(self.phase, WidgetPhase::Processing { .. }) {
            return Err(WidgetError::Busy);
        }

        self.is_camera_open = true;
        self.attempt_camera_acquisition();
        Ok(())
    }

    /// Retries camera acquisition while the modal is open.
    pub fn retry_camera(&mut self) {
        if !self.is_camera_open {
            return;
        }
        self.attempt_camera_acquisition();
    }

    /// Grabs one frame, compresses it, and makes it the customer image.
    ///
    /// On success the camera is released and the modal closes.
    ///
    /// # Errors
    /// Frame-grab failures leave the modal open for a local retry.
    pub fn capture_photo(&mut self) -> Result<(), WidgetError> {
        if matches!(self.phase, WidgetPhase::Processing { .. }) {
            return Err(WidgetError::Busy);
        }
        if !self.is_camera_open {
            return Err(WidgetError::Capture(CaptureError::NotReady));
        }

        let frame = match self.surface.grab_frame(&self.camera) {
            Ok(frame) => frame,
            Err(error) => {
                self.notices
                    .push(Notice::error("Could not capture a photo. Try again."));
                return Err(error.into());
            }
        };
        let customer = compress(&frame)?;
        log::info!(
            "captured photo compressed to {} bytes at {}x{}",
            customer.byte_len(),
            customer.width,
            customer.height
        );

        self.close_camera_stream();
        self.phase = WidgetPhase::Captured { customer };
        self.notices.push(Notice::info("Photo captured."));
        Ok(())
    }

    /// Closes the camera modal without capturing.
    pub fn close_camera(&mut self) {
        self.close_camera_stream();
    }

    /// Starts a try-on run for the held customer image.
    ///
    /// Without an image or a product this is a no-op that raises a prompt
    /// notice. On success the phase moves to `Processing` and the returned
    /// job must be handed back through [`complete_try_on`].
    ///
    /// [`complete_try_on`]: Self::complete_try_on
    pub fn begin_try_on(&mut self) -> Option<TryOnJob> {
        let Some(product) = self.product.clone() else {
            self.notices
                .push(Notice::warning("Select a product before trying on."));
            return None;
        };

        let customer = match &self.phase {
            WidgetPhase::Captured { customer } | WidgetPhase::Processed { customer, .. } => {
                customer.clone()
            }
            WidgetPhase::Idle => {
                self.notices
                    .push(Notice::warning("Add a photo before trying on."));
                return None;
            }
            WidgetPhase::Processing { .. } => {
                log::debug!("try-on already in flight, ignoring duplicate start");
                return None;
            }
        };

        self.phase = WidgetPhase::Processing {
            customer: customer.clone(),
        };
        log::info!("try-on run started");

        Some(TryOnJob {
            epoch: self.epoch,
            product_id: product.id,
            product_image_url: product.image_url,
            customer,
        })
    }

    /// Folds a finished try-on run back into widget state.
    ///
    /// A completion whose epoch no longer matches the controller, or that
    /// arrives outside `Processing`, is discarded. A hard failure reverts to
    /// `Captured` with the customer image retained; an outcome advances to
    /// `Processed`.
    pub fn complete_try_on(&mut self, job: TryOnJob, result: Result<TryOnOutcome, RemoteError>) {
        if job.epoch != self.epoch {
            log::debug!("discarding try-on completion from a previous widget generation");
            return;
        }

        let customer = match std::mem::replace(&mut self.phase, WidgetPhase::Idle) {
            WidgetPhase::Processing { customer } => customer,
            other => {
                self.phase = other;
                log::debug!("discarding try-on completion outside an in-flight run");
                return;
            }
        };

        match result {
            Ok(outcome) => {
                match &outcome {
                    TryOnOutcome::Composite {
                        fallback_reason: Some(reason),
                        ..
                    } => {
                        log::warn!("try-on delivered a fallback preview: {reason}");
                        self.notices.push(Notice::warning(format!(
                            "Showing a demo preview: {reason}"
                        )));
                    }
                    TryOnOutcome::Composite { .. } => {
                        self.notices.push(Notice::info("Your try-on is ready."));
                    }
                    TryOnOutcome::NoImage { reason, .. } => {
                        log::warn!("try-on finished without an image: {reason}");
                        self.notices.push(Notice::warning(format!(
                            "We could not generate a try-on image: {reason}"
                        )));
                    }
                }
                self.phase = WidgetPhase::Processed { customer, outcome };
            }
            Err(error) => {
                let class = classify_remote_error(&error);
                log::warn!("try-on run failed ({class:?}): {error}");
                self.notices.push(Notice::error(format!(
                    "Try-on failed: {error}. Your photo is still here."
                )));
                self.phase = WidgetPhase::Captured { customer };
            }
        }
    }

    /// Runs the full pipeline synchronously through the given client.
    ///
    /// Convenience for hosts without their own scheduling; equivalent to
    /// [`begin_try_on`](Self::begin_try_on) followed by
    /// [`complete_try_on`](Self::complete_try_on).
    pub fn submit(&mut self, client: &TryOnClient) {
        let Some(job) = self.begin_try_on() else {
            return;
        };
        let result = client.run(&job.product_id, &job.customer, &job.product_image_url);
        self.complete_try_on(job, result);
    }

    /// Closes the widget and navigates the host to the product page.
    pub fn continue_to_product(&mut self, hooks: &dyn NavigationHooks) {
        let Some(product_id) = self.product.as_ref().map(|product| product.id.clone()) else {
            return;
        };
        self.close_fullscreen();
        hooks.navigate_to_product(&product_id);
    }

    /// Discards everything and tells the host to clear its selection.
    pub fn keep_browsing(&mut self, hooks: &dyn NavigationHooks) {
        self.wipe_interest();
        self.close_camera_stream();
        self.is_fullscreen = false;
        hooks.unselect_product();
    }

    /// Builds the render-ready projection of the current state.
    pub fn project_view(&self) -> WidgetView {
        let (headline, result_image_url, summary, is_processing) = match &self.phase {
            WidgetPhase::Idle => ("Add your photo", None, None, false),
            WidgetPhase::Captured { .. } => ("Ready to try on", None, None, false),
            WidgetPhase::Processing { .. } => ("Generating your try-on", None, None, true),
            WidgetPhase::Processed { outcome, .. } => match outcome {
                TryOnOutcome::Composite {
                    image_url,
                    recommendation,
                    ..
                } => (
                    "Your virtual try-on",
                    Some(image_url.clone()),
                    recommendation.as_ref().map(fit_summary),
                    false,
                ),
                TryOnOutcome::NoImage { recommendation, .. } => (
                    "Fit recommendation ready",
                    None,
                    recommendation.as_ref().map(fit_summary),
                    false,
                ),
            },
        };

        WidgetView {
            headline: headline.to_string(),
            has_customer_image: self.phase.customer_image().is_some(),
            result_image_url,
            fit_summary: summary,
            is_processing,
            is_fullscreen: self.is_fullscreen,
            is_camera_open: self.is_camera_open,
            camera_error: self.camera_error.clone(),
            can_submit: self.product.is_some()
                && matches!(
                    self.phase,
                    WidgetPhase::Captured { .. } | WidgetPhase::Processed { .. }
                ),
        }
    }

    /// Rebuilds the idle state and invalidates in-flight completions.
    fn wipe_interest(&mut self) {
        self.phase = WidgetPhase::Idle;
        self.epoch += 1;
    }

    fn close_camera_stream(&mut self) {
        self.camera.release();
        self.is_camera_open = false;
    }

    fn attempt_camera_acquisition(&mut self) {
        self.camera_error = None;
        match self.camera.acquire() {
            Ok(()) => {
                if let Err(error) = self.surface.bind_preview(&self.camera) {
                    self.camera_error = Some(error.to_string());
                }
            }
            Err(error) => {
                log::warn!("camera acquisition failed: {error}");
                self.notices.push(Notice::error("Camera unavailable."));
                self.camera_error = Some(error.to_string());
            }
        }
    }
}

/// Host-facing handle exposing only modal control.
///
/// Navigation shells should not reach the full controller; they get open and
/// close, nothing else.
#[derive(Clone)]
pub struct WidgetHandle {
    inner: Rc<RefCell<WidgetLifecycleController>>,
}

impl WidgetHandle {
    /// Wraps a shared controller.
    pub fn new(inner: Rc<RefCell<WidgetLifecycleController>>) -> Self {
        Self { inner }
    }

    /// Opens the fullscreen widget.
    pub fn open(&self) {
        self.inner.borrow_mut().open_fullscreen();
    }

    /// Closes the fullscreen widget.
    pub fn close(&self) {
        self.inner.borrow_mut().close_fullscreen();
    }
}

/// Widget orchestration error type.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Uploaded file is not an image MIME type.
    #[error("unsupported upload type: {0}")]
    UnsupportedMime(String),
    /// The requested action conflicts with an in-flight run.
    #[error("a try-on run is in flight")]
    Busy,
    /// The camera kill switch is off.
    #[error("camera capture is disabled")]
    CameraDisabled,
    /// Compression subsystem error.
    #[error("compression error: {0}")]
    Compress(#[from] CompressError),
    /// Frame-grab error.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
}
