//! Integration tests for fullscreen open/close semantics and navigation.

mod common;

use std::sync::Mutex;

use common::{controller_with_camera, jpeg_upload_bytes, process_composite, session_created, scripted_client};
use fitframe_pipeline::TryOnOutcome;
use fitframe_widget::{NavigationHooks, WidgetPhase};
use serde_json::json;

#[test]
fn open_fullscreen_starts_from_a_clean_slate() {
    let (mut controller, _backend) = controller_with_camera();
    controller
        .upload_photo("image/jpeg", &jpeg_upload_bytes())
        .expect("upload should work");

    controller.open_fullscreen();

    assert!(controller.is_fullscreen());
    assert_eq!(controller.phase(), &WidgetPhase::Idle);
}

#[test]
fn close_with_unsubmitted_photo_discards_it() {
    let (mut controller, _backend) = controller_with_camera();
    controller.open_fullscreen();
    controller
        .upload_photo("image/jpeg", &jpeg_upload_bytes())
        .expect("upload should work");

    controller.close_fullscreen();

    assert!(!controller.is_fullscreen());
    assert_eq!(controller.phase(), &WidgetPhase::Idle);
}

#[test]
fn close_preserves_a_composite_result_for_compact_preview() {
    let (mut controller, _backend) = controller_with_camera();
    controller.open_fullscreen();
    controller
        .upload_photo("image/jpeg", &jpeg_upload_bytes())
        .expect("upload should work");

    let (client, _transport) = scripted_client(vec![session_created(), process_composite()]);
    controller.submit(&client);

    controller.close_fullscreen();

    assert!(!controller.is_fullscreen());
    assert!(matches!(
        controller.phase(),
        WidgetPhase::Processed {
            outcome: TryOnOutcome::Composite { .. },
            ..
        }
    ));
}

#[test]
fn close_does_not_preserve_a_no_image_outcome() {
    let (mut controller, _backend) = controller_with_camera();
    controller.open_fullscreen();
    controller
        .upload_photo("image/jpeg", &jpeg_upload_bytes())
        .expect("upload should work");

    let (client, _transport) = scripted_client(vec![
        session_created(),
        Ok(json!({ "recommendations": { "fit": "perfect", "confidence": 0.9 } })),
    ]);
    controller.submit(&client);
    assert!(matches!(controller.phase(), WidgetPhase::Processed { .. }));

    controller.close_fullscreen();

    assert_eq!(controller.phase(), &WidgetPhase::Idle);
}

#[test]
fn close_during_processing_discards_the_run() {
    let (mut controller, _backend) = controller_with_camera();
    controller.open_fullscreen();
    controller
        .upload_photo("image/jpeg", &jpeg_upload_bytes())
        .expect("upload should work");

    let job = controller.begin_try_on().expect("job should start");
    controller.close_fullscreen();
    assert_eq!(controller.phase(), &WidgetPhase::Idle);

    controller.complete_try_on(
        job,
        Ok(TryOnOutcome::Composite {
            image_url: "https://cdn.example/late.jpg".to_string(),
            recommendation: None,
            fallback_reason: None,
        }),
    );

    assert_eq!(controller.phase(), &WidgetPhase::Idle);
}

#[test]
fn widget_handle_only_drives_the_modal() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let (controller, _backend) = controller_with_camera();
    let shared = Rc::new(RefCell::new(controller));
    let handle = fitframe_widget::WidgetHandle::new(shared.clone());

    handle.open();
    assert!(shared.borrow().is_fullscreen());

    handle.close();
    assert!(!shared.borrow().is_fullscreen());
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl NavigationHooks for RecordingHooks {
    fn navigate_to_product(&self, product_id: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("navigate:{product_id}"));
    }

    fn unselect_product(&self) {
        self.events.lock().unwrap().push("unselect".to_string());
    }
}

#[test]
fn continue_to_product_closes_and_navigates() {
    let (mut controller, _backend) = controller_with_camera();
    controller.open_fullscreen();

    let hooks = RecordingHooks::default();
    controller.continue_to_product(&hooks);

    assert!(!controller.is_fullscreen());
    assert_eq!(
        hooks.events.lock().unwrap().as_slice(),
        ["navigate:prod-1".to_string()]
    );
}

#[test]
fn keep_browsing_wipes_and_unselects() {
    let (mut controller, _backend) = controller_with_camera();
    controller.open_fullscreen();
    controller
        .upload_photo("image/jpeg", &jpeg_upload_bytes())
        .expect("upload should work");

    let hooks = RecordingHooks::default();
    controller.keep_browsing(&hooks);

    assert!(!controller.is_fullscreen());
    assert_eq!(controller.phase(), &WidgetPhase::Idle);
    assert_eq!(
        hooks.events.lock().unwrap().as_slice(),
        ["unselect".to_string()]
    );
}
