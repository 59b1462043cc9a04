use image::{ImageBuffer, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::overlay::{physical_to_sample, KELVIN_OFFSET};
use crate::tonemap::SampleGrid16;

/// Parameters for a synthetic thermal frame.
#[derive(Debug, Clone)]
pub struct SceneParams {
    pub ambient_celsius: f64,
    /// Vertical ambient gradient, degrees from top to bottom row.
    pub gradient_celsius: f64,
    pub hotspot_count: usize,
    pub hotspot_peak_celsius: f64,
    /// Sensor noise, in degrees.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            ambient_celsius: 21.0,
            gradient_celsius: 3.0,
            hotspot_count: 4,
            hotspot_peak_celsius: 37.0,
            noise_sigma: 0.05,
            seed: 0x7e57,
        }
    }
}

struct Hotspot {
    cx: f64,
    cy: f64,
    radius: f64,
    rise: f64,
}

/// Render a centikelvin frame: ambient background with a vertical gradient,
/// Gaussian warm blobs and per-pixel sensor noise. Deterministic for a
/// given seed.
pub fn synthetic_scene(width: u32, height: u32, params: &SceneParams) -> SampleGrid16 {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let min_dim = width.min(height).max(1) as f64;

    let hotspots: Vec<Hotspot> = (0..params.hotspot_count)
        .map(|_| Hotspot {
            cx: rng.random_range(0.0..width.max(1) as f64),
            cy: rng.random_range(0.0..height.max(1) as f64),
            radius: rng.random_range(0.04..0.15) * min_dim,
            rise: (params.hotspot_peak_celsius - params.ambient_celsius) * rng.random_range(0.6..1.0),
        })
        .collect();

    let noise = Normal::new(0.0, params.noise_sigma.max(0.0)).ok();
    let rows = height.saturating_sub(1).max(1) as f64;

    ImageBuffer::from_fn(width, height, |x, y| {
        let mut celsius = params.ambient_celsius + params.gradient_celsius * (y as f64 / rows);
        for spot in &hotspots {
            let dx = x as f64 - spot.cx;
            let dy = y as f64 - spot.cy;
            let d2 = (dx * dx + dy * dy) / (spot.radius * spot.radius);
            celsius += spot.rise * (-0.5 * d2).exp();
        }
        if let Some(dist) = &noise {
            celsius += dist.sample(&mut rng);
        }
        Luma([physical_to_sample(celsius.max(-KELVIN_OFFSET))])
    })
}
