#![warn(missing_docs)]
//! # fitframe-ui
//!
//! ## Purpose
//! Presentation-side view model for the widget.
//!
//! ## Responsibilities
//! - Project controller state into a render-ready [`WidgetView`].
//! - Summarize a fit recommendation for display.
//!
//! ## Data flow
//! The widget crate builds a [`WidgetView`] from its authoritative state; the
//! host shell renders it. No state flows back through this crate.

use fitframe_core::{FitKind, Recommendation};

/// Render-ready projection of the widget state.
///
/// Built by the controller, consumed by the host shell. Holds no authority;
/// rebuilding it never changes widget behavior.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetView {
    /// Short headline describing the current stage.
    pub headline: String,
    /// `true` when a customer image is held and can be previewed.
    pub has_customer_image: bool,
    /// Composite result image URL, when one was produced.
    pub result_image_url: Option<String>,
    /// Display summary of the fit recommendation, when one exists.
    pub fit_summary: Option<FitSummary>,
    /// `true` while a try-on run is in flight.
    pub is_processing: bool,
    /// Fullscreen modal flag.
    pub is_fullscreen: bool,
    /// Camera modal flag.
    pub is_camera_open: bool,
    /// Retained camera error text, shown until the next camera attempt.
    pub camera_error: Option<String>,
    /// `true` when the try-on action is currently available.
    pub can_submit: bool,
}

/// Display summary of one fit recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitSummary {
    /// Human-readable fit label.
    pub label: String,
    /// Confidence as a rounded whole percentage.
    pub confidence_percent: u8,
    /// Alternative size suggestion, when present.
    pub suggested_size: Option<String>,
    /// Advisory text from the service.
    pub notes: String,
}

/// Summarizes a recommendation for display.
///
/// Confidence is assumed in-range; the pipeline drops out-of-range values
/// before they reach presentation.
pub fn fit_summary(recommendation: &Recommendation) -> FitSummary {
    let label = match recommendation.fit {
        FitKind::Perfect => "Perfect fit",
        FitKind::Loose => "Looser fit",
        FitKind::Tight => "Tighter fit",
    };

    FitSummary {
        label: label.to_string(),
        confidence_percent: (recommendation.confidence * 100.0).round() as u8,
        suggested_size: recommendation.suggested_size.clone(),
        notes: recommendation.notes.clone(),
    }
}
