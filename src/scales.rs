use crate::colors::{self, Rgb};
use crate::config::DataType;
use crate::matrix::MatrixModel;
use std::collections::HashMap;

/// Ordinal-to-pixel mapping: each key gets a fixed-width slot at
/// `index * band`. Lookups are O(1) via a precomputed key→index map,
/// since the scale is consulted per cell per render.
#[derive(Clone, Debug, Default)]
pub struct BandScale {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    band: f64,
}

impl BandScale {
    pub fn new<I, S>(keys: I, band: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let index = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        Self { keys, index, band }
    }

    pub fn position(&self, key: &str) -> Option<f64> {
        self.index.get(key).map(|&i| i as f64 * self.band)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn band_width(&self) -> f64 {
        self.band
    }

    pub fn domain(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn range_end(&self) -> f64 {
        self.keys.len() as f64 * self.band
    }
}

/// Continuous value-to-color mapping over piecewise-linear stops.
#[derive(Clone, Debug)]
pub struct ColorScale {
    stops: Vec<(f64, Rgb)>,
}

impl ColorScale {
    /// Diverging scale, domain symmetric around zero: `[-max, 0, max]`.
    pub fn diverging(max_abs: f64) -> Self {
        let max_abs = if max_abs > 0.0 { max_abs } else { 1.0 };
        Self {
            stops: vec![
                (-max_abs, colors::BLUE_RED[0]),
                (0.0, colors::BLUE_RED[1]),
                (max_abs, colors::BLUE_RED[2]),
            ],
        }
    }

    /// Sequential scale, domain `[0, max]`.
    pub fn sequential(max: f64) -> Self {
        let max = if max > 0.0 { max } else { 1.0 };
        let last = (colors::STEEL_BLUES.len() - 1) as f64;
        let stops = colors::STEEL_BLUES
            .iter()
            .enumerate()
            .map(|(i, &c)| (max * i as f64 / last, c))
            .collect();
        Self { stops }
    }

    pub fn color(&self, value: f64) -> Rgb {
        colors::ramp(&self.stops, value)
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.stops[0].0, self.stops[self.stops.len() - 1].0)
    }

    pub fn stops(&self) -> &[(f64, Rgb)] {
        &self.stops
    }
}

/// Magnitude-to-radius mapping. Square-root so that bubble *area*, the
/// perceptual channel, is linear in magnitude.
#[derive(Clone, Copy, Debug)]
pub struct RadiusScale {
    max_magnitude: f64,
    max_radius: f64,
}

impl RadiusScale {
    pub fn new(max_magnitude: f64, max_radius: f64) -> Self {
        Self {
            max_magnitude: if max_magnitude > 0.0 { max_magnitude } else { 1.0 },
            max_radius,
        }
    }

    pub fn radius(&self, magnitude: f64) -> f64 {
        let m = magnitude.clamp(0.0, self.max_magnitude);
        (m / self.max_magnitude).sqrt() * self.max_radius
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }
}

/// The full scale set for one view. Rebuilt whenever the model's key lists
/// change; a stale set must never survive a model replacement.
#[derive(Clone, Debug)]
pub struct ScaleSet {
    pub x: BandScale,
    pub y: BandScale,
    pub color: ColorScale,
    pub radius: RadiusScale,
}

impl ScaleSet {
    pub fn build(model: &MatrixModel, data_type: DataType, cell_size: f64) -> Self {
        let color = match data_type {
            DataType::Diverging => {
                let max_abs = model
                    .cells()
                    .iter()
                    .map(|c| c.value.abs())
                    .fold(0.0_f64, f64::max);
                ColorScale::diverging(max_abs)
            }
            DataType::Sequential => {
                let max = model
                    .cells()
                    .iter()
                    .map(|c| c.value)
                    .fold(0.0_f64, f64::max);
                ColorScale::sequential(max)
            }
        };
        let max_magnitude = model
            .cells()
            .iter()
            .map(|c| c.magnitude)
            .fold(0.0_f64, f64::max);
        Self {
            x: BandScale::new(model.columns().iter().cloned(), cell_size),
            y: BandScale::new(model.rows().iter().cloned(), cell_size),
            color,
            radius: RadiusScale::new(max_magnitude, cell_size / 2.0),
        }
    }
}
