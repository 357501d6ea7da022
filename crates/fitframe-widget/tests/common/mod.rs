//! Shared fixtures for widget integration tests.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use fitframe_camera::SyntheticCameraBackend;
use fitframe_pipeline::{RemoteError, TryOnClient, TryOnTransport};
use fitframe_widget::WidgetLifecycleController;
use serde_json::{Value, json};

/// Encodes a small deterministic JPEG suitable for `upload_photo`.
#[allow(dead_code)]
pub fn jpeg_upload_bytes() -> Vec<u8> {
    let mut pixels = image::RgbImage::new(32, 24);
    for (x, y, pixel) in pixels.enumerate_pixels_mut() {
        *pixel = image::Rgb([(x * 8) as u8, (y * 10) as u8, 64]);
    }

    let mut out = Cursor::new(Vec::new());
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 90);
    encoder
        .encode_image(&pixels)
        .expect("fixture jpeg should encode");
    out.into_inner()
}

/// Transport double replaying scripted responses and recording call URLs.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, RemoteError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    #[allow(dead_code)]
    pub fn new(responses: Vec<Result<Value, RemoteError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// URLs posted to so far, in call order.
    #[allow(dead_code)]
    pub fn called_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TryOnTransport for ScriptedTransport {
    fn post_json(&self, url: &str, _body: &Value) -> Result<Value, RemoteError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Network("script exhausted".to_string())))
    }
}

/// Builds a client over a scripted transport, returning both.
#[allow(dead_code)]
pub fn scripted_client(
    responses: Vec<Result<Value, RemoteError>>,
) -> (TryOnClient, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new(responses);
    let client = TryOnClient::new("https://shop.example/api", transport.clone())
        .expect("fixture endpoint should be valid");
    (client, transport)
}

/// Builds a controller with a product attached, over a granting camera.
#[allow(dead_code)]
pub fn controller_with_camera() -> (WidgetLifecycleController, Arc<SyntheticCameraBackend>) {
    let backend = Arc::new(SyntheticCameraBackend::granting(320, 240));
    let mut controller = WidgetLifecycleController::new(backend.clone());
    controller.set_product("prod-1", "https://cdn.example/product.jpg");
    (controller, backend)
}

/// Scripted session-creation success.
#[allow(dead_code)]
pub fn session_created() -> Result<Value, RemoteError> {
    Ok(json!({ "id": "sess-1" }))
}

/// Scripted process success with a composite image and recommendation.
#[allow(dead_code)]
pub fn process_composite() -> Result<Value, RemoteError> {
    Ok(json!({
        "tryOnImageUrl": "https://cdn.example/result.jpg",
        "recommendations": {
            "fit": "perfect",
            "confidence": 0.91,
            "notes": "True to size"
        }
    }))
}
