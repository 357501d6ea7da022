#![warn(missing_docs)]
//! # fitframe-widget binary
//!
//! Demo entry point: drives one full widget flow against the synthetic
//! camera backend and a scripted transport. No network, no hardware.

use std::sync::{Arc, Mutex};

use fitframe_camera::SyntheticCameraBackend;
use fitframe_pipeline::{RemoteError, TryOnClient, TryOnTransport};
use fitframe_widget::{WidgetLifecycleController, camera_enabled_from_env, widget_version};
use serde_json::{Value, json};

/// Transport double that answers both pipeline phases from a canned script.
struct DemoTransport {
    responses: Mutex<Vec<Value>>,
}

impl TryOnTransport for DemoTransport {
    fn post_json(&self, url: &str, _body: &Value) -> Result<Value, RemoteError> {
        log::info!("demo transport answering POST {url}");
        let mut responses = self.responses.lock().map_err(|_| {
            RemoteError::Network("demo transport state poisoned".to_string())
        })?;
        if responses.is_empty() {
            return Err(RemoteError::Network("demo script exhausted".to_string()));
        }
        Ok(responses.remove(0))
    }
}

fn main() {
    env_logger::init();

    println!("fitframe-widget {}", widget_version());
    println!(
        "camera_enabled={} (FITFRAME_CAMERA_ENABLED)",
        camera_enabled_from_env()
    );

    let transport = Arc::new(DemoTransport {
        responses: Mutex::new(vec![
            json!({ "id": "demo-session" }),
            json!({
                "tryOnImageUrl": "https://cdn.example/demo-result.jpg",
                "recommendations": {
                    "fit": "perfect",
                    "confidence": 0.93,
                    "notes": "True to size"
                }
            }),
        ]),
    });

    let client = match TryOnClient::new("https://shop.example/api", transport) {
        Ok(client) => client,
        Err(error) => {
            eprintln!("demo endpoint rejected: {error}");
            std::process::exit(1);
        }
    };

    let backend = Arc::new(SyntheticCameraBackend::granting(640, 480));
    let mut controller = WidgetLifecycleController::new(backend);
    controller.set_product("demo-product", "https://cdn.example/demo-product.jpg");
    controller.open_fullscreen();

    if let Err(error) = controller.open_camera() {
        eprintln!("camera unavailable: {error}");
        std::process::exit(1);
    }
    if let Err(error) = controller.capture_photo() {
        eprintln!("capture failed: {error}");
        std::process::exit(1);
    }

    controller.submit(&client);

    for notice in controller.drain_notices() {
        println!("[{:?}] {}", notice.kind, notice.message);
    }

    let view = controller.project_view();
    println!("headline: {}", view.headline);
    if let Some(url) = view.result_image_url {
        println!("result: {url}");
    }
    if let Some(summary) = view.fit_summary {
        println!(
            "fit: {} ({}% confidence)",
            summary.label, summary.confidence_percent
        );
    }
}
