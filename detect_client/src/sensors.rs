//! Sensors module.
//!
use rscam::{Camera, Config};
use simple_error::simple_error;

use crate::Error;

/// Frames dropped after starting the camera while exposure settles.
const WARMUP_FRAMES: usize = 5;

const MJPG: &[u8] = b"MJPG";

/// Capture a single MJPG frame from a video device on a Linux machine.
pub fn capture_frame(device_name: &str) -> Result<Vec<u8>, Error> {
    let mut cam = Camera::new(device_name)?;
    let format = MJPG;
    log_supported_formats(&cam);

    log::info!("Using camera {}", device_name);

    let resolution = get_max_resolution(&cam, format)?;
    let frame_rate = get_max_frame_rate(&cam, format, resolution)?;

    cam.start(&Config {
        interval: frame_rate,
        resolution,
        format,
        ..Default::default()
    })?;

    for _ in 0..WARMUP_FRAMES {
        cam.capture()?;
    }
    let frame = cam.capture()?;
    log::debug!(
        "Captured {}x{} frame ({} bytes)",
        resolution.0,
        resolution.1,
        frame.len()
    );

    Ok(frame[..].to_vec())
}

/// Get the maximum supported resolution for the given format.
fn get_max_resolution(cam: &Camera, format: &[u8]) -> Result<(u32, u32), Error> {
    let resolution_info = cam.resolutions(format)?;
    log::debug!("Found resolutions: {:?}", &resolution_info);
    match resolution_info {
        rscam::ResolutionInfo::Discretes(resolutions) => resolutions
            .iter()
            // Highest resolution in terms of number of pixels
            .max_by_key(|res| res.0 * res.1)
            .copied(),
        rscam::ResolutionInfo::Stepwise { max, .. } => Some(max),
    }
    .ok_or_else(|| simple_error!("No resolution found").into())
}

/// Get the maximum supported frame rate for the given format and resolution.
fn get_max_frame_rate(
    cam: &Camera,
    format: &[u8],
    resolution: (u32, u32),
) -> Result<(u32, u32), Error> {
    let interval_info = cam.intervals(format, resolution)?;
    log::debug!("Found frame rates: {:?}", &interval_info);
    match interval_info {
        // Intervals are (numerator, denominator) of seconds per frame
        rscam::IntervalInfo::Discretes(intervals) => intervals
            .iter()
            .max_by_key(|(numerator, denominator)| denominator / numerator.max(&1))
            .copied(),
        rscam::IntervalInfo::Stepwise { min, .. } => Some(min),
    }
    .ok_or_else(|| simple_error!("No frame rate found").into())
}

fn log_supported_formats(cam: &Camera) {
    let formats: Vec<_> = cam.formats().filter_map(|fmt| fmt.ok()).collect();
    log::debug!("Supported formats: {:?}", formats);
}
