//! Print static info for every connected device.

use realsense::Context;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let context = Context::new()?;
    let infos = context.device_infos()?;
    if infos.is_empty() {
        println!("no realsense devices found");
        return Ok(());
    }
    for info in infos {
        let firmware = info.firmware_version.as_deref().unwrap_or("unknown");
        println!("{}  {}  (firmware {firmware})", info.serial, info.name);
    }
    Ok(())
}
