#![warn(missing_docs)]
//! # fitframe-pipeline
//!
//! ## Purpose
//! Implements the two-phase remote try-on pipeline client.
//!
//! ## Responsibilities
//! - Validate the service endpoint policy (absolute HTTPS URL).
//! - Create a try-on session, then request processing for that session.
//! - Map remote outcomes onto the hard/soft failure split the widget needs.
//! - Classify failures for operator triage and fingerprint customer images.
//!
//! ## Data flow
//! [`TryOnClient::run`] sends the customer image as a JPEG data URI to the
//! session endpoint, then sends the product image URL to the process
//! endpoint, and folds the response into a [`TryOnOutcome`].
//!
//! ## Ownership and lifetimes
//! The client borrows the compressed image for the duration of one run; the
//! transport is shared behind `Arc` so tests can keep a handle for scripting
//! and call inspection.
//!
//! ## Error model
//! Phase one failures are hard: they surface as `Err(RemoteError)` and the
//! caller keeps the customer image for a manual retry. Phase two failures are
//! soft: they fold into [`TryOnOutcome::NoImage`] and the flow still
//! advances. [`classify_remote_error`] is informational only; the client
//! never retries on its own.
//!
//! ## Security and privacy notes
//! Customer image bytes and session identifiers are never logged. The
//! fingerprint sent as the client request id is a digest, not the image.

use std::sync::Arc;

use fitframe_core::{CompressedImage, CoreError, Recommendation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// One created try-on session. Never persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSession {
    /// Service-assigned session identifier. Always non-empty.
    pub id: String,
}

impl RemoteSession {
    /// Wraps a service-assigned identifier.
    ///
    /// # Errors
    /// Returns [`RemoteError::SessionRejected`] when the id is blank, which
    /// the service contract forbids.
    pub fn new(id: String) -> Result<Self, RemoteError> {
        if id.trim().is_empty() {
            return Err(RemoteError::SessionRejected(
                "service returned a blank session id".to_string(),
            ));
        }
        Ok(Self { id })
    }
}

/// Result of one completed pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum TryOnOutcome {
    /// The service produced a composite try-on image.
    Composite {
        /// URL of the rendered composite image.
        image_url: String,
        /// Sanitized fit recommendation, when the service sent one.
        recommendation: Option<Recommendation>,
        /// Set when the service also reported an error; the image is then a
        /// degraded demo preview rather than a full render.
        fallback_reason: Option<String>,
    },
    /// Processing finished without a composite image (soft fallback).
    NoImage {
        /// Sanitized fit recommendation, when the service sent one.
        recommendation: Option<Recommendation>,
        /// Why no image was produced, for the host-facing notice.
        reason: String,
    },
}

/// Failure classification for operator triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A later manual attempt may succeed.
    Retriable,
    /// Retrying the same request will fail again.
    Permanent,
}

/// Request body for session creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    product_id: &'a str,
    customer_image_url: String,
    client_request_id: String,
}

/// Response body for session creation.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    id: String,
}

/// Request body for session processing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    product_image_url: &'a str,
}

/// Response body for session processing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    #[serde(default)]
    try_on_image_url: Option<String>,
    #[serde(default)]
    recommendations: Option<Recommendation>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP transport seam for the pipeline.
///
/// Implementations send a JSON body to a fully resolved URL and return the
/// decoded JSON response. Tests script this trait instead of the network.
pub trait TryOnTransport: Send + Sync {
    /// Sends one POST request with a JSON body.
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, RemoteError>;
}

/// Two-phase try-on pipeline client.
pub struct TryOnClient {
    endpoint: Url,
    transport: Arc<dyn TryOnTransport>,
}

impl TryOnClient {
    /// Creates a client for the given service endpoint.
    ///
    /// # Errors
    /// Returns [`RemoteError::InvalidEndpoint`] unless the endpoint is an
    /// absolute HTTPS URL. Host presence comes with the scheme: the parser
    /// never yields a host-less `https` URL.
    pub fn new(endpoint: &str, transport: Arc<dyn TryOnTransport>) -> Result<Self, RemoteError> {
        let parsed = Url::parse(endpoint)
            .map_err(|error| RemoteError::InvalidEndpoint(error.to_string()))?;

        if parsed.scheme() != "https" {
            return Err(RemoteError::InvalidEndpoint(format!(
                "endpoint scheme must be https, got {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            endpoint: parsed,
            transport,
        })
    }

    /// Runs the full two-phase pipeline for one customer image.
    ///
    /// # Semantics
    /// Session creation failures (transport, malformed body, blank id) are
    /// hard and abort the run. Once a session exists, processing failures
    /// fold into [`TryOnOutcome::NoImage`] and the call still returns `Ok`.
    /// The process phase is never attempted unless session creation succeeded
    /// within the same call.
    ///
    /// # Errors
    /// Returns [`RemoteError`] only for the session-creation phase.
    pub fn run(
        &self,
        product_id: &str,
        customer: &CompressedImage,
        product_image_url: &str,
    ) -> Result<TryOnOutcome, RemoteError> {
        let session = self.create_session(product_id, customer)?;
        log::info!("try-on session created, requesting processing");
        Ok(self.process(&session, product_image_url))
    }

    /// Phase one: creates a try-on session for the customer image.
    ///
    /// # Errors
    /// Any transport or contract violation here is a hard failure.
    pub fn create_session(
        &self,
        product_id: &str,
        customer: &CompressedImage,
    ) -> Result<RemoteSession, RemoteError> {
        let request = SessionRequest {
            product_id,
            customer_image_url: customer.to_data_uri(),
            client_request_id: fingerprint_customer_image(customer),
        };
        let body = serde_json::to_value(&request).map_err(CoreError::from)?;

        let response = self.transport.post_json(&self.session_url(), &body)?;
        let decoded: SessionResponse =
            serde_json::from_value(response).map_err(CoreError::from)?;

        RemoteSession::new(decoded.id)
    }

    /// Phase two: requests processing and folds failures into the outcome.
    pub fn process(&self, session: &RemoteSession, product_image_url: &str) -> TryOnOutcome {
        let request = ProcessRequest { product_image_url };
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(error) => {
                return TryOnOutcome::NoImage {
                    recommendation: None,
                    reason: format!("could not encode process request: {error}"),
                };
            }
        };

        let response = match self.transport.post_json(&self.process_url(session), &body) {
            Ok(response) => response,
            Err(error) => {
                log::warn!("process phase transport failure: {error}");
                return TryOnOutcome::NoImage {
                    recommendation: None,
                    reason: error.to_string(),
                };
            }
        };

        let decoded: ProcessResponse = match serde_json::from_value(response) {
            Ok(decoded) => decoded,
            Err(error) => {
                log::warn!("process phase returned a malformed body: {error}");
                return TryOnOutcome::NoImage {
                    recommendation: None,
                    reason: format!("malformed process response: {error}"),
                };
            }
        };

        let recommendation = sanitize_recommendation(decoded.recommendations);

        // An image always wins: a response carrying both an image and an
        // error is a degraded preview, not a failure.
        match decoded.try_on_image_url {
            Some(image_url) if !image_url.trim().is_empty() => {
                if decoded.error.is_some() {
                    log::warn!("process phase delivered a fallback preview");
                }
                TryOnOutcome::Composite {
                    image_url,
                    recommendation,
                    fallback_reason: decoded.error,
                }
            }
            _ => {
                log::warn!("process phase finished without an image");
                TryOnOutcome::NoImage {
                    recommendation,
                    reason: decoded
                        .error
                        .unwrap_or_else(|| "service finished without a composite image".to_string()),
                }
            }
        }
    }

    fn session_url(&self) -> String {
        format!(
            "{}/try-on-sessions",
            self.endpoint.as_str().trim_end_matches('/')
        )
    }

    fn process_url(&self, session: &RemoteSession) -> String {
        format!("{}/{}/process", self.session_url(), session.id)
    }
}

/// Drops a recommendation whose confidence is outside `[0.0, 1.0]`.
///
/// Clamping would fabricate a confidence the service never reported, so an
/// out-of-range value discards the recommendation entirely.
pub fn sanitize_recommendation(recommendation: Option<Recommendation>) -> Option<Recommendation> {
    match recommendation {
        Some(rec) if !rec.confidence_in_range() => {
            log::warn!(
                "dropping recommendation with out-of-range confidence {}",
                rec.confidence
            );
            None
        }
        other => other,
    }
}

/// Classifies a pipeline failure for triage. Informational only.
pub fn classify_remote_error(error: &RemoteError) -> FailureClass {
    match error {
        RemoteError::Network(_) => FailureClass::Retriable,
        RemoteError::Status { code, .. } if *code == 429 || *code >= 500 => {
            FailureClass::Retriable
        }
        RemoteError::Status { .. }
        | RemoteError::InvalidEndpoint(_)
        | RemoteError::SessionRejected(_)
        | RemoteError::Core(_) => FailureClass::Permanent,
    }
}

/// Computes the stable request fingerprint for a compressed customer image.
///
/// Identical encodings always produce the same hex digest, so the service can
/// de-duplicate session creation for the same payload.
pub fn fingerprint_customer_image(customer: &CompressedImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&customer.jpeg);
    hex::encode(hasher.finalize())
}

/// Pipeline error type.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Endpoint violates the HTTPS-with-host policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// The transport could not reach the service.
    #[error("network failure: {0}")]
    Network(String),
    /// The service answered with a non-success status.
    #[error("service returned status {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Status line or body excerpt.
        message: String,
    },
    /// The service violated the session contract.
    #[error("session rejected: {0}")]
    SessionRejected(String),
    /// Encoding or decoding a wire body failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}
