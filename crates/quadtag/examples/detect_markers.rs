//! Detect markers in a frame against reference marker images.
//!
//! Usage:
//!   cargo run --example detect_markers -- <frame.png> <ref0.png> [ref1.png ...]
//!
//! Reference images must be square; their order defines marker identities.

use quadtag::{build_dictionary, Detector, DetectorParams, AXIS_POINTS};
use quadtag_core::{gray_from_interleaved, CameraIntrinsics, Distortion, GrayImage};

fn load_gray(path: &str) -> Result<GrayImage, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    Ok(gray_from_interleaved(w, h, 3, img.as_raw()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    quadtag_core::init_with_level(log::LevelFilter::Debug)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("usage: detect_markers <frame> <ref0> [ref1 ...]");
        std::process::exit(2);
    }

    let frame = load_gray(&args[0])?;
    let refs = args[1..]
        .iter()
        .map(|p| load_gray(p))
        .collect::<Result<Vec<_>, _>>()?;

    let dictionary = build_dictionary(&refs, 36)?;
    let detector = Detector::new(dictionary, DetectorParams::default());

    // Nominal intrinsics for a demo overlay: focal = frame width, centered
    // principal point. Replace with calibrated values for real use.
    let intrinsics = CameraIntrinsics::new(
        frame.width as f64,
        frame.width as f64,
        frame.width as f64 / 2.0,
        frame.height as f64 / 2.0,
    );
    let distortion = Distortion::none();

    let results = detector.detect(&frame.view());
    println!("{} marker(s) detected", results.len());

    for r in &results {
        println!(
            "  id {} (hamming {}): corners {:?}",
            r.id,
            r.hamming,
            r.corners.map(|c| (c.x, c.y))
        );
        match detector.project_marker_points(r, &intrinsics, &distortion, &AXIS_POINTS) {
            Ok(axis) => {
                println!(
                    "    axis: O({:.1}, {:.1}) X({:.1}, {:.1}) Y({:.1}, {:.1}) Z({:.1}, {:.1})",
                    axis[0].x,
                    axis[0].y,
                    axis[1].x,
                    axis[1].y,
                    axis[2].x,
                    axis[2].y,
                    axis[3].x,
                    axis[3].y
                );
            }
            Err(err) => println!("    pose failed: {err}"),
        }
    }

    Ok(())
}
