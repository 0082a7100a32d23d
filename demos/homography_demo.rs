//! Fits a homography from a handful of hard-coded correspondences and prints
//! the resulting inlier set. Run with `cargo run --example homography_demo`.

use stereoglue::{estimate, PointMatrix, ProblemType, RansacSettings};

fn main() {
    env_logger::init();

    let source = PointMatrix::from_row_slice(
        5,
        2,
        &[0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0, 50.0, 50.0],
    )
    .expect("valid point matrix");
    let destination = PointMatrix::from_row_slice(
        5,
        2,
        &[5.0, 5.0, 108.0, 2.0, 110.0, 104.0, 3.0, 102.0, 55.0, 53.0],
    )
    .expect("valid point matrix");

    let settings = RansacSettings {
        seed: Some(0),
        ..Default::default()
    };

    match estimate(
        &source,
        &destination,
        None,
        ProblemType::Homography,
        None,
        &settings,
        None,
    ) {
        Ok(outcome) => {
            println!(
                "fitted homography with {} inliers (quality {:.4}) in {} iterations",
                outcome.result.score.inlier_count,
                outcome.result.score.quality,
                outcome.result.iterations,
            );
            println!("{:#?}", outcome.result.model.matrix);
        }
        Err(e) => eprintln!("estimation failed: {e}"),
    }
}
