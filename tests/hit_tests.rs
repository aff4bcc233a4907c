#![cfg(feature = "hit")]

//! Hardware integration tests.
//!
//! These require a connected RealSense device and are disabled by default;
//! run them with `cargo test --features hit -- --ignored`.

use std::thread;
use std::time::Duration;

use realsense::{
    frame_channel, AcquireOptions, CancelToken, Context, Pipeline, PipelineConfig, RsError,
    StreamKind,
};

#[test]
#[ignore] // Requires hardware
fn enumerate_devices() {
    let context = Context::new().expect("failed to create context");
    let infos = context.device_infos().expect("failed to enumerate devices");
    assert!(!infos.is_empty(), "no realsense devices connected");
    for info in &infos {
        assert!(!info.serial.is_empty());
    }
}

#[test]
#[ignore] // Requires hardware
fn capture_one_bundle() {
    let mut pipeline = Pipeline::create(PipelineConfig::new())
        .expect("failed to create pipeline - ensure a realsense device is connected");
    pipeline
        .enable_stream(StreamKind::Depth, 640, 480, 30)
        .expect("failed to enable depth stream");
    pipeline
        .enable_stream(StreamKind::Color, 640, 480, 30)
        .expect("failed to enable color stream");
    pipeline.start().expect("failed to start pipeline");

    let (tx, rx) = frame_channel(2);
    let cancel = CancelToken::new();
    let worker = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            let result = pipeline.wait_frames(&tx, &AcquireOptions::default(), &cancel);
            (pipeline, result)
        })
    };

    let frame = rx
        .recv_timeout(Duration::from_secs(20))
        .expect("no frame within 20s");
    assert_eq!((frame.width(), frame.height()), (640, 480));
    let expected = 640 * 480 * frame.format().bytes_per_pixel();
    assert_eq!(frame.data().len(), expected);

    cancel.cancel();
    drop(rx);
    let (pipeline, result) = worker.join().expect("acquisition thread panicked");
    result.expect("acquisition loop failed");
    pipeline.close().expect("failed to close pipeline");
}

#[test]
#[ignore] // Requires hardware
fn unknown_serial_is_rejected() {
    let err = Pipeline::create(PipelineConfig::new().with_serial("does-not-exist")).unwrap_err();
    assert_eq!(err, RsError::DeviceNotFound("does-not-exist".to_string()));
}
