//! The detail view: one mark per cell at full cell size, with row and
//! column labels. Updates are keyed diffs against (row, col) identity so
//! hover state survives a model change, and brush panning is a single
//! translation rather than a re-layout.

use crate::colors::Rgb;
use crate::matrix::{ColKey, MatrixModel, RowKey};
use crate::scales::ScaleSet;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq)]
pub struct Mark {
    pub row: RowKey,
    pub col: ColKey,
    /// Center coordinates in map space, before the pan translation.
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub fill: Rgb,
    /// Set when a numeric filter flags the cell; rendered muted, not removed.
    pub muted: bool,
    /// Set when the cell's column is outside the brush window.
    pub hidden: bool,
    /// Hover/selection state; survives keyed updates.
    pub highlighted: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnLabel {
    pub col: ColKey,
    pub x: f64,
    pub text: String,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowLabel {
    pub row: RowKey,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub added: usize,
    pub removed: usize,
    pub retained: usize,
}

#[derive(Clone, Debug)]
pub struct ZoomMap {
    cell_size: f64,
    label_space: f64,
    marks: Vec<Mark>,
    index: HashMap<(RowKey, ColKey), usize>,
    column_labels: Vec<ColumnLabel>,
    row_labels: Vec<RowLabel>,
    map_height: f64,
    view_width: f64,
    pan_offset: f64,
    use_rs_ids: bool,
}

impl ZoomMap {
    /// First render; subsequent model changes go through `update`.
    pub fn init(model: &MatrixModel, scales: &ScaleSet, label_space: f64) -> Self {
        let mut map = Self {
            cell_size: scales.x.band_width(),
            label_space,
            marks: vec![],
            index: HashMap::new(),
            column_labels: vec![],
            row_labels: vec![],
            map_height: 0.0,
            view_width: scales.x.range_end(),
            pan_offset: 0.0,
            use_rs_ids: false,
        };
        map.update(model, scales);
        map
    }

    /// Keyed diff against (row, col): marks for cells no longer present are
    /// removed, new cells are added, retained marks are repositioned and
    /// recolored in place. A naive full redraw would lose hover state.
    pub fn update(&mut self, model: &MatrixModel, scales: &ScaleSet) -> UpdateStats {
        self.cell_size = scales.x.band_width();
        let half_band = scales.x.band_width() / 2.0;

        let mut stats = UpdateStats::default();
        let mut marks = Vec::with_capacity(model.cells().len());
        let mut index = HashMap::with_capacity(model.cells().len());
        for cell in model.cells() {
            let (Some(x), Some(y)) = (
                scales.x.position(&cell.col),
                scales.y.position(&cell.row),
            ) else {
                // Orphan cells are rejected at model construction; a miss
                // here means the scales are stale for this model.
                continue;
            };
            let key = (cell.row.clone(), cell.col.clone());
            let highlighted = match self.index.get(&key) {
                Some(&i) => {
                    stats.retained += 1;
                    self.marks[i].highlighted
                }
                None => {
                    stats.added += 1;
                    false
                }
            };
            index.insert(key, marks.len());
            marks.push(Mark {
                row: cell.row.clone(),
                col: cell.col.clone(),
                x: x + half_band,
                y: y + half_band,
                radius: scales.radius.radius(cell.magnitude),
                fill: scales.color.color(cell.value),
                muted: cell.filtered.any(),
                hidden: false,
                highlighted,
            });
        }
        stats.removed = self
            .index
            .keys()
            .filter(|key| !index.contains_key(*key))
            .count();
        self.marks = marks;
        self.index = index;

        self.column_labels = model
            .columns()
            .iter()
            .filter_map(|col| {
                let x = scales.x.position(col)?;
                Some(ColumnLabel {
                    col: col.clone(),
                    x: x + half_band,
                    text: self.label_text(model, col),
                    hidden: false,
                })
            })
            .collect();
        self.row_labels = model
            .rows()
            .iter()
            .filter_map(|row| {
                let y = scales.y.position(row)?;
                Some(RowLabel {
                    row: row.clone(),
                    y: y + half_band,
                })
            })
            .collect();

        // Row count can change on every replacement, so the height is
        // recomputed here rather than cached at init.
        self.map_height = scales.y.range_end();
        self.view_width = scales.x.range_end();
        self.pan_offset = 0.0;
        stats
    }

    fn label_text(&self, model: &MatrixModel, col: &str) -> String {
        match model.variant(col) {
            Some(info) if self.use_rs_ids => info.rs_id.clone(),
            Some(info) => info.display_id.clone(),
            None => col.to_string(),
        }
    }

    /// Toggle between truncated variant IDs and rsIDs for column labels.
    pub fn set_label_mode(&mut self, use_rs_ids: bool, model: &MatrixModel) {
        self.use_rs_ids = use_rs_ids;
        for label in &mut self.column_labels {
            label.text = match model.variant(&label.col) {
                Some(info) if use_rs_ids => info.rs_id.clone(),
                Some(info) => info.display_id.clone(),
                None => label.col.clone(),
            };
        }
    }

    /// Hides marks and labels outside the window and translates the whole
    /// mark group so the first visible column aligns to the view origin.
    /// Panning is a transform, not a re-layout.
    pub fn apply_window(&mut self, visible: &[ColKey], scales: &ScaleSet) {
        let visible_set: HashSet<&str> = visible.iter().map(String::as_str).collect();
        for mark in &mut self.marks {
            mark.hidden = !visible_set.contains(mark.col.as_str());
        }
        for label in &mut self.column_labels {
            label.hidden = !visible_set.contains(label.col.as_str());
        }
        self.pan_offset = visible
            .first()
            .and_then(|col| scales.x.position(col))
            .map(|x| -x + scales.x.band_width())
            .unwrap_or(0.0);
    }

    /// Clears the window so the whole matrix is visible again.
    pub fn clear_window(&mut self) {
        for mark in &mut self.marks {
            mark.hidden = false;
        }
        for label in &mut self.column_labels {
            label.hidden = false;
        }
        self.pan_offset = 0.0;
    }

    pub fn set_highlight(&mut self, row: &str, col: &str, highlighted: bool) {
        if let Some(&i) = self.index.get(&(row.to_string(), col.to_string())) {
            self.marks[i].highlighted = highlighted;
        }
    }

    /// Content width a window of `visible_count` columns needs; the caller
    /// widens the viewport when this exceeds it (never clips silently).
    pub fn content_width(&self, visible_count: usize, padding_left: f64) -> f64 {
        visible_count as f64 * self.cell_size + padding_left
    }

    pub fn ensure_view_width(&mut self, width: f64) {
        if width > self.view_width {
            self.view_width = width;
        }
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn column_labels(&self) -> &[ColumnLabel] {
        &self.column_labels
    }

    pub fn row_labels(&self) -> &[RowLabel] {
        &self.row_labels
    }

    pub fn map_height(&self) -> f64 {
        self.map_height
    }

    /// Map height plus the fixed label space.
    pub fn total_height(&self) -> f64 {
        self.map_height + self.label_space
    }

    pub fn view_width(&self) -> f64 {
        self.view_width
    }

    pub fn pan_offset(&self) -> f64 {
        self.pan_offset
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }
}
