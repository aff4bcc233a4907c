//! Stream depth and color, saving the first frame of each kind as PNG.

use std::thread;

use realsense::{
    frame_channel, AcquireOptions, CancelToken, ImageFormat, Pipeline, PipelineConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut pipeline = Pipeline::create(PipelineConfig::new().with_depth().with_color())?;
    pipeline.start()?;

    let (tx, rx) = frame_channel(2);
    let cancel = CancelToken::new();
    let worker = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            let result = pipeline.wait_frames(&tx, &AcquireOptions::default(), &cancel);
            (pipeline, result)
        })
    };

    let mut depth_saved = false;
    let mut color_saved = false;
    while !(depth_saved && color_saved) {
        let frame = rx.recv()?;
        match frame.format() {
            ImageFormat::Gray16 if !depth_saved => {
                frame.to_luma16().expect("depth frame").save("depth.png")?;
                println!("wrote depth.png ({}x{})", frame.width(), frame.height());
                depth_saved = true;
            }
            ImageFormat::Rgb8 if !color_saved => {
                frame.to_rgb8().expect("color frame").save("color.png")?;
                println!("wrote color.png ({}x{})", frame.width(), frame.height());
                color_saved = true;
            }
            _ => {}
        }
    }

    cancel.cancel();
    drop(rx);
    let (pipeline, result) = worker.join().expect("acquisition thread panicked");
    result?;
    pipeline.close()?;
    Ok(())
}
