//! The overview: the whole matrix compressed into a bounded pixel budget,
//! laid out for a fast non-interactive raster. Cell size shrinks as the
//! column count grows, clamped to a configured range; the overview never
//! shrinks below the viewport but can grow wider once cells hit the
//! minimum size floor.

use crate::colors::Rgb;
use crate::config::{BubbleMapConfig, DataType};
use crate::matrix::{ColKey, MatrixModel, RowKey};
use crate::scales::{BandScale, ColorScale, RadiusScale};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MiniMapDimensions {
    pub cell: f64,
    pub width: f64,
    pub height: f64,
}

pub fn set_dimensions(
    config: &BubbleMapConfig,
    column_count: usize,
    row_count: usize,
) -> MiniMapDimensions {
    let available = config.mini_width;
    let cell = (available / column_count as f64)
        .clamp(config.mini_min_cell, config.mini_max_cell);
    let width = (cell * column_count as f64).max(available);
    let height = (cell * row_count as f64).max(config.mini_min_height);
    MiniMapDimensions { cell, width, height }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MiniCell {
    pub row: RowKey,
    pub col: ColKey,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub fill: Rgb,
    pub muted: bool,
}

#[derive(Clone, Debug)]
pub struct MiniMap {
    dims: MiniMapDimensions,
    x: BandScale,
    y: BandScale,
    cells: Vec<MiniCell>,
}

impl MiniMap {
    pub fn new(model: &MatrixModel, config: &BubbleMapConfig, data_type: DataType) -> Self {
        let mut mini = Self {
            dims: MiniMapDimensions::default(),
            x: BandScale::default(),
            y: BandScale::default(),
            cells: vec![],
        };
        mini.update(model, config, data_type);
        mini
    }

    /// Full re-layout; the mini map carries no interaction state worth
    /// diffing for.
    pub fn update(&mut self, model: &MatrixModel, config: &BubbleMapConfig, data_type: DataType) {
        self.dims = set_dimensions(config, model.columns().len(), model.rows().len());
        self.x = BandScale::new(model.columns().iter().cloned(), self.dims.cell);
        self.y = BandScale::new(model.rows().iter().cloned(), self.dims.cell);

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
        let radius = RadiusScale::new(max_magnitude, self.dims.cell / 2.0);

        let half = self.dims.cell / 2.0;
        self.cells = model
            .cells()
            .iter()
            .filter_map(|cell| {
                let x = self.x.position(&cell.col)?;
                let y = self.y.position(&cell.row)?;
                Some(MiniCell {
                    row: cell.row.clone(),
                    col: cell.col.clone(),
                    x: x + half,
                    y: y + half,
                    radius: radius.radius(cell.magnitude),
                    fill: color.color(cell.value),
                    muted: cell.filtered.any(),
                })
            })
            .collect();
    }

    pub fn dimensions(&self) -> MiniMapDimensions {
        self.dims
    }

    /// The column scale the brush controller translates pixel extents with.
    pub fn x_scale(&self) -> &BandScale {
        &self.x
    }

    pub fn y_scale(&self) -> &BandScale {
        &self.y
    }

    pub fn cells(&self) -> &[MiniCell] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Cell, VariantInfo};
    use std::collections::HashMap;

    fn config(width: f64) -> BubbleMapConfig {
        BubbleMapConfig {
            mini_width: width,
            ..BubbleMapConfig::default()
        }
    }

    #[test]
    fn test_cell_size_clamped_to_max() {
        // Few columns: width/count would exceed the max cell size.
        let dims = set_dimensions(&config(800.0), 10, 5);
        assert_eq!(dims.cell, 5.0);
        assert_eq!(dims.width, 800.0);
    }

    #[test]
    fn test_cell_size_clamped_to_min_and_width_grows() {
        // Many columns: cells hit the floor and the map outgrows the viewport.
        let dims = set_dimensions(&config(800.0), 500, 5);
        assert_eq!(dims.cell, 2.0);
        assert_eq!(dims.width, 1000.0);
    }

    #[test]
    fn test_height_floor() {
        let dims = set_dimensions(&config(800.0), 200, 3);
        assert_eq!(dims.cell, 4.0);
        assert_eq!(dims.height, 40.0);
    }

    #[test]
    fn test_layout_positions() {
        let mut column_meta = HashMap::new();
        for (i, c) in ["v1", "v2"].iter().enumerate() {
            column_meta.insert(
                c.to_string(),
                VariantInfo {
                    position: 100 * (i as i64 + 1),
                    tss_distance: 0,
                    display_id: c.to_string(),
                    rs_id: format!("rs_{c}"),
                },
            );
        }
        let model = MatrixModel::new(
            vec!["Liver".to_string()],
            vec!["v1".to_string(), "v2".to_string()],
            vec![
                Cell::new("Liver", "v1", 0.5, 2.0),
                Cell::new("Liver", "v2", -0.2, 1.0),
            ],
            column_meta,
        )
        .unwrap();
        let mini = MiniMap::new(&model, &config(800.0), DataType::Diverging);
        assert_eq!(mini.dimensions().cell, 5.0);
        assert_eq!(mini.cells().len(), 2);
        assert_eq!(mini.cells()[0].x, 2.5);
        assert_eq!(mini.cells()[1].x, 7.5);
    }
}
