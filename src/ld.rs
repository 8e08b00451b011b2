//! Linkage-disequilibrium support: a symmetric r² store, the derived pair
//! list restricted to the visible column window, and the 45°-rotated
//! triangle geometry the LD panel is drawn with.

use crate::colors::{self, Rgb};
use crate::matrix::ColKey;
use std::collections::HashMap;

/// Symmetric r² lookup keyed by unordered variant pair. A missing pair
/// means "no data", not zero; a self pair is implicitly 1.
#[derive(Clone, Debug, Default)]
pub struct LdStore {
    r2: HashMap<(ColKey, ColKey), f64>,
}

impl LdStore {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String, f64)>,
    {
        let mut store = Self::default();
        for (a, b, r2) in pairs {
            store.insert(&a, &b, r2);
        }
        store
    }

    fn key(a: &str, b: &str) -> (ColKey, ColKey) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn insert(&mut self, a: &str, b: &str, r2: f64) {
        self.r2.insert(Self::key(a, b), r2);
    }

    pub fn r2(&self, a: &str, b: &str) -> Option<f64> {
        if a == b {
            return Some(1.0);
        }
        self.r2.get(&Self::key(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.r2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r2.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LdPair {
    pub a: ColKey,
    pub b: ColKey,
    pub r2: f64,
}

/// Rebuilds the pair list for the current window. Always a full recompute,
/// never an incremental patch: the pairs in view change with every brush
/// move. Self pairs are always included; off-diagonal pairs only above the
/// cutoff, and pairs without data are omitted entirely.
pub fn build_pairs(store: &LdStore, visible: &[ColKey], cutoff: f64) -> Vec<LdPair> {
    let mut pairs = vec![];
    for (i, a) in visible.iter().enumerate() {
        for b in visible.iter().skip(i) {
            if a == b {
                pairs.push(LdPair {
                    a: a.clone(),
                    b: b.clone(),
                    r2: 1.0,
                });
            } else if let Some(r2) = store.r2(a, b) {
                if r2 > cutoff {
                    pairs.push(LdPair {
                        a: a.clone(),
                        b: b.clone(),
                        r2,
                    });
                }
            }
        }
    }
    pairs
}

const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Geometry of the triangular LD panel: the pair grid is drawn on a
/// diagonal band of `cell / √2` and rotated -45° so the diagonal runs
/// horizontally under the bubble map columns.
#[derive(Clone, Debug, Default)]
pub struct TrianglePanel {
    index: HashMap<ColKey, usize>,
    cell: f64,
    band: f64,
}

impl TrianglePanel {
    pub fn new(visible: &[ColKey], cell: f64) -> Self {
        Self {
            index: visible
                .iter()
                .enumerate()
                .map(|(i, col)| (col.clone(), i))
                .collect(),
            cell,
            band: cell * FRAC_1_SQRT_2,
        }
    }

    pub fn band(&self) -> f64 {
        self.band
    }

    /// Panel width (== height): one full cell per visible column.
    pub fn panel_size(&self) -> f64 {
        self.index.len() as f64 * self.cell
    }

    fn grid_pos(&self, col: &str) -> Option<f64> {
        self.index.get(col).map(|&i| i as f64 * self.band)
    }

    /// Rotate a grid point by -45° and shift it under the first column.
    fn to_panel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.band / 2.0 + (x + y) * FRAC_1_SQRT_2,
            self.band + (y - x) * FRAC_1_SQRT_2,
        )
    }

    /// The four corners of one pair's diamond, in panel coordinates.
    pub fn diamond(&self, a: &str, b: &str) -> Option<[(f64, f64); 4]> {
        let x = self.grid_pos(a)?;
        let y = self.grid_pos(b)? + self.cell / 4.0;
        Some([
            self.to_panel(x, y),
            self.to_panel(x + self.band, y),
            self.to_panel(x + self.band, y + self.band),
            self.to_panel(x, y + self.band),
        ])
    }

    /// Maps a panel point back to the (column, column) pair under it, for
    /// tooltips. Inverse of the -45° rotation.
    pub fn hit_test<'a>(&self, visible: &'a [ColKey], px: f64, py: f64) -> Option<(&'a ColKey, &'a ColKey)> {
        let vx = px - self.band / 2.0;
        let vy = py - self.band;
        let x = (vx - vy) * FRAC_1_SQRT_2;
        let y = (vx + vy) * FRAC_1_SQRT_2 - self.cell / 4.0;
        if x < 0.0 || y < 0.0 || self.band <= 0.0 {
            return None;
        }
        let i = (x / self.band).floor() as usize;
        let j = (y / self.band).floor() as usize;
        match (visible.get(i), visible.get(j)) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// Grey-ramp legend entries from r² = 0 to 1 in steps of 0.1.
pub fn legend_steps() -> Vec<(f64, Rgb)> {
    (0..=10)
        .map(|i| {
            let r2 = f64::from(i) / 10.0;
            (r2, colors::ld_shade(r2))
        })
        .collect()
}
