use image::{ImageBuffer, Luma};
use thermal_tonemap::overlay::sample_to_physical;
use thermal_tonemap::pipeline::{self, ToneMapParams, ToneMapStrategy};
use thermal_tonemap::synthetic::{synthetic_scene, SceneParams};
use thermal_tonemap::tonemap::{
    adaptive_equalize_histogram, equalize_histogram, normalize, normalize_range, simplest_cb,
    Histogram, SampleGrid16, SampleGrid8, TileGrid,
};
use thermal_tonemap::ToneMapError;

fn constant(w: u32, h: u32, v: u16) -> SampleGrid16 {
    ImageBuffer::from_pixel(w, h, Luma([v]))
}

/// Variance of pixel counts over 16 coarse buckets of 16 levels each.
fn bucket_variance(img: &SampleGrid8) -> f64 {
    let hist = Histogram::of_channel(img, 0);
    let buckets: Vec<f64> = hist
        .bins()
        .chunks(16)
        .map(|c| c.iter().map(|&n| n as f64).sum())
        .collect();
    let mean = buckets.iter().sum::<f64>() / buckets.len() as f64;
    buckets.iter().map(|b| (b - mean).powi(2)).sum::<f64>() / buckets.len() as f64
}

#[test]
fn normalize_hits_both_ends_on_thermal_scene() {
    let grid = synthetic_scene(96, 64, &SceneParams::default());
    let out = normalize(&grid);
    assert_eq!(out.pixels().map(|p| p[0]).min(), Some(0));
    assert_eq!(out.pixels().map(|p| p[0]).max(), Some(255));

    let out = normalize_range(&grid, 16, 235);
    assert_eq!(out.pixels().map(|p| p[0]).min(), Some(16));
    assert_eq!(out.pixels().map(|p| p[0]).max(), Some(235));
}

#[test]
fn constant_grid_round_trip() {
    let grid = constant(4, 4, 30_000);

    let flat = normalize(&grid);
    assert_eq!(flat.dimensions(), (4, 4));
    assert!(flat.pixels().all(|p| p[0] == 0));

    let clahe = adaptive_equalize_histogram(&grid, 4.0, TileGrid::new(2, 2).unwrap()).unwrap();
    assert_eq!(clahe.dimensions(), (4, 4));
    let first = clahe.get_pixel(0, 0)[0];
    assert!(clahe.pixels().all(|p| p[0] == first));
}

#[test]
fn equalization_flattens_skewed_histogram() {
    // cubic ramp: most pixels sit in the dark end after normalization
    let grid: SampleGrid16 = ImageBuffer::from_fn(256, 32, |x, _| {
        let t = x as f64 / 255.0;
        Luma([20_000 + (t * t * t * 20_000.0) as u16])
    });
    let normalized = normalize(&grid);
    let equalized = equalize_histogram(&grid);
    assert!(
        bucket_variance(&equalized) < bucket_variance(&normalized),
        "equalized {} vs normalized {}",
        bucket_variance(&equalized),
        bucket_variance(&normalized)
    );
}

#[test]
fn adaptive_rejects_malformed_tile_grids() {
    let grid = synthetic_scene(32, 32, &SceneParams::default());
    for bad in [TileGrid { rows: 0, cols: 8 }, TileGrid { rows: 8, cols: 0 }] {
        let err = adaptive_equalize_histogram(&grid, 4.0, bad).unwrap_err();
        assert!(matches!(err, ToneMapError::InvalidArgument(_)));
    }
    let err = TileGrid::try_from(&[8usize, 8, 8][..]).unwrap_err();
    assert!(matches!(err, ToneMapError::InvalidArgument(_)));
    assert!(adaptive_equalize_histogram(&grid, 4.0, TileGrid::new(1, 1).unwrap()).is_ok());
}

#[test]
fn single_tile_adaptive_is_monotonic_like_global_equalization() {
    let grid: SampleGrid16 = ImageBuffer::from_fn(64, 8, |x, _| Luma([25_000 + x as u16 * 37]));
    let out = adaptive_equalize_histogram(&grid, 1000.0, TileGrid::new(1, 1).unwrap()).unwrap();
    let row: Vec<u8> = (0..64).map(|x| out.get_pixel(x, 0)[0]).collect();
    assert!(row.windows(2).all(|w| w[0] <= w[1]));
    assert!(row[63] > row[0]);
}

#[test]
fn adaptive_spreads_thermal_scene_across_display_range() {
    let grid = synthetic_scene(640, 512, &SceneParams::default());
    let out = adaptive_equalize_histogram(&grid, 4.0, TileGrid::default()).unwrap();
    let min = out.pixels().map(|p| p[0]).min().unwrap();
    let max = out.pixels().map(|p| p[0]).max().unwrap();
    assert!(max - min > 200, "adaptive range {min}..{max}");
}

#[test]
fn adaptive_ramp_is_smooth_across_tiles() {
    let grid: SampleGrid16 = ImageBuffer::from_fn(256, 64, |x, _| Luma([20_000 + x as u16 * 40]));
    let out = adaptive_equalize_histogram(&grid, 4.0, TileGrid::new(2, 2).unwrap()).unwrap();
    for y in [0, 31, 32, 63] {
        let row: Vec<i32> = (0..256).map(|x| out.get_pixel(x, y)[0] as i32).collect();
        assert!((row[128] - row[127]).abs() <= 3, "row {y}: {} -> {}", row[127], row[128]);
        assert!(row.windows(2).all(|w| (w[1] - w[0]).abs() <= 4), "row {y}");
    }
}

#[test]
fn adaptive_rejects_grids_beyond_table_budget() {
    let grid = synthetic_scene(640, 512, &SceneParams::default());
    let err = adaptive_equalize_histogram(&grid, 4.0, TileGrid::new(200, 200).unwrap()).unwrap_err();
    assert!(matches!(err, ToneMapError::InvalidArgument(_)));
    assert!(adaptive_equalize_histogram(&grid, 4.0, TileGrid::new(32, 32).unwrap()).is_ok());
}

#[test]
fn color_balance_zero_percent_is_identity() {
    let display = pipeline::render_frame(
        &synthetic_scene(40, 30, &SceneParams::default()),
        &ToneMapParams::default(),
    )
    .unwrap();
    assert_eq!(simplest_cb(&display, 0.0).unwrap(), display);
}

#[test]
fn temperature_decoding_fixed_points() {
    assert!(sample_to_physical(27_315).abs() < 1e-9);
    assert!((sample_to_physical(37_315) - 100.0).abs() < 1e-9);
}

#[test]
fn cursor_moves_rerender_with_fresh_readings() {
    let grid = synthetic_scene(64, 48, &SceneParams::default());
    let params = ToneMapParams {
        strategy: ToneMapStrategy::Adaptive,
        ..Default::default()
    };
    for &(x, y) in &[(0, 0), (10, 20), (63, 47), (500, 500)] {
        let out = pipeline::render_annotated(&grid, &params, Some((x, y))).unwrap();
        let reading = out.cursor.unwrap();
        assert_eq!(reading.sample, grid.get_pixel(reading.x, reading.y)[0]);
        let spec = out.annotation.unwrap();
        assert_eq!(spec.marker_center, (reading.x as i32, reading.y as i32));
        assert_eq!(spec.label, format!("{:.1} Degree Celsius", reading.celsius));
    }
}
