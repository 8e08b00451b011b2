//! The brush: a draggable selection window over the mini map's column
//! axis. Translates a pixel extent into a contiguous run of column keys
//! (the zoom view's visible window) and survives column resorts by key
//! identity rather than by index.

use crate::matrix::ColKey;
use crate::scales::BandScale;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub start: f64,
    pub end: f64,
}

impl Extent {
    pub fn new(start: f64, end: f64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BrushState {
    #[default]
    Idle,
    Dragging {
        anchor: f64,
    },
}

#[derive(Clone, Debug)]
pub struct BrushController {
    state: BrushState,
    extent: Extent,
    window: Vec<ColKey>,
    zoom_count: usize,
    total_width: f64,
}

impl BrushController {
    /// Creates the brush with the default leading window: the first
    /// `zoom_count` columns.
    pub fn new(mini_x: &BandScale, zoom_count: usize, total_width: f64) -> Self {
        let mut brush = Self {
            state: BrushState::Idle,
            extent: Extent::new(0.0, 0.0),
            window: vec![],
            zoom_count,
            total_width,
        };
        brush.reset_to_default(mini_x);
        brush
    }

    fn reset_to_default(&mut self, mini_x: &BandScale) {
        let count = self.zoom_count.min(mini_x.len());
        self.window = mini_x.domain()[..count].to_vec();
        self.extent = self.extent_of_window(mini_x);
    }

    fn extent_of_window(&self, mini_x: &BandScale) -> Extent {
        let positions: Vec<f64> = self
            .window
            .iter()
            .filter_map(|col| mini_x.position(col))
            .collect();
        match (
            positions.iter().cloned().reduce(f64::min),
            positions.iter().cloned().reduce(f64::max),
        ) {
            (Some(min), Some(max)) => Extent::new(min, max),
            _ => Extent::new(0.0, 0.0),
        }
    }

    // --- pointer state machine -------------------------------------------

    pub fn pointer_down(&mut self, x: f64) {
        self.state = BrushState::Dragging { anchor: x };
    }

    /// While dragging, each move yields the current pixel extent for the
    /// caller to feed into `brush_event`.
    pub fn pointer_move(&mut self, x: f64) -> Option<Extent> {
        match self.state {
            BrushState::Dragging { anchor } => Some(Extent::new(anchor, x)),
            BrushState::Idle => None,
        }
    }

    /// Ends the drag and yields the final extent. A release at the anchor
    /// point produces a zero-width extent, which `brush_event` turns into
    /// a synthesized window around the click.
    pub fn pointer_up(&mut self, x: f64) -> Option<Extent> {
        match self.state {
            BrushState::Dragging { anchor } => {
                self.state = BrushState::Idle;
                Some(Extent::new(anchor, x))
            }
            BrushState::Idle => None,
        }
    }

    pub fn state(&self) -> BrushState {
        self.state
    }

    // --- window derivation -----------------------------------------------

    /// Converts a pixel extent into the visible column window. A zero-width
    /// extent (a click, not a drag) synthesizes a window of `zoom_count`
    /// bands centered on the click point, clamped to `[0, total_width]` —
    /// a deliberate usability affordance: a single click jumps the zoom
    /// window. The window never exceeds `zoom_count` columns: an extent
    /// covering more keeps the centered run and tightens the extent to it.
    pub fn brush_event(&mut self, extent: Extent, mini_x: &BandScale) -> &[ColKey] {
        let extent = if extent.width() == 0.0 {
            let half = mini_x.band_width() * (self.zoom_count as f64 / 2.0);
            let x = extent.start;
            Extent::new(
                (x - half).max(0.0),
                (x + half).min(self.total_width),
            )
        } else {
            extent
        };
        self.window = mini_x
            .domain()
            .iter()
            .filter(|col| {
                mini_x
                    .position(col)
                    .is_some_and(|x| extent.start <= x && x <= extent.end)
            })
            .cloned()
            .collect();
        if self.window.len() > self.zoom_count {
            let trim = (self.window.len() - self.zoom_count) / 2;
            self.window.drain(..trim);
            self.window.truncate(self.zoom_count);
            self.extent = self.extent_of_window(mini_x);
        } else {
            self.extent = extent;
        }
        &self.window
    }

    /// Called after a model reorder or replacement: keeps the user's
    /// logical selection by key identity, re-deriving the pixel extent
    /// from the surviving keys' new positions. If nothing survives, falls
    /// back to the default leading window.
    pub fn update(&mut self, mini_x: &BandScale, total_width: f64) {
        self.total_width = total_width;
        let mut surviving: Vec<(usize, ColKey)> = self
            .window
            .iter()
            .filter_map(|col| mini_x.index_of(col).map(|i| (i, col.clone())))
            .collect();
        if surviving.is_empty() {
            self.reset_to_default(mini_x);
            return;
        }
        surviving.sort_by_key(|(i, _)| *i);
        self.window = surviving.into_iter().map(|(_, col)| col).collect();
        self.extent = self.extent_of_window(mini_x);
    }

    pub fn window(&self) -> &[ColKey] {
        &self.window
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    /// Width the detail view needs to show the current window.
    pub fn required_viewport_width(&self, zoom_cell: f64, padding_left: f64) -> f64 {
        self.window.len() as f64 * zoom_cell + padding_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("v{i}")).collect()
    }

    #[test]
    fn test_window_contiguity() {
        let scale = BandScale::new(keys(200), 5.0);
        let mut brush = BrushController::new(&scale, 80, 1000.0);
        let window = brush.brush_event(Extent::new(50.0, 120.0), &scale).to_vec();
        // Positions 50..=120 at band 5 are indices 10..=24.
        assert_eq!(window.len(), 15);
        assert_eq!(window.first().unwrap(), "v10");
        assert_eq!(window.last().unwrap(), "v24");
        // No gaps: every index between first and last is present.
        for (offset, col) in window.iter().enumerate() {
            assert_eq!(col, &format!("v{}", 10 + offset));
        }
    }

    #[test]
    fn test_click_synthesizes_centered_window() {
        // zoomCount=80 at 5 px per column: the synthesized extent is 400 px
        // around the click; the derived window is exactly 80 columns with
        // the extent tightened to their positions.
        let scale = BandScale::new(keys(200), 5.0);
        let total = 1000.0;
        let mut brush = BrushController::new(&scale, 80, total);

        let window = brush.brush_event(Extent::new(500.0, 500.0), &scale).to_vec();
        assert_eq!(window.len(), 80);
        assert_eq!(window.first().unwrap(), "v60");
        assert_eq!(window.last().unwrap(), "v139");
        assert_eq!(brush.extent(), Extent::new(300.0, 695.0));

        // Clamped at the left edge.
        brush.brush_event(Extent::new(0.0, 0.0), &scale);
        assert_eq!(brush.extent().start, 0.0);
        assert_eq!(brush.extent().end, 200.0);

        // Clamped at the right edge.
        brush.brush_event(Extent::new(total, total), &scale);
        assert_eq!(brush.extent().start, 800.0);
        assert_eq!(brush.extent().end, 1000.0);
    }

    #[test]
    fn test_wide_extent_clamped_to_zoom_count() {
        let scale = BandScale::new(keys(200), 5.0);
        let mut brush = BrushController::new(&scale, 80, 1000.0);

        // A drag across the whole mini map selects every column; the window
        // keeps the centered run of zoomCount columns.
        let window = brush.brush_event(Extent::new(0.0, 995.0), &scale).to_vec();
        assert_eq!(window.len(), 80);
        assert_eq!(window.first().unwrap(), "v60");
        assert_eq!(window.last().unwrap(), "v139");
        assert_eq!(brush.extent(), Extent::new(300.0, 695.0));
    }

    #[test]
    fn test_pointer_state_machine() {
        let scale = BandScale::new(keys(100), 5.0);
        let mut brush = BrushController::new(&scale, 80, 500.0);

        assert_eq!(brush.pointer_move(10.0), None);
        brush.pointer_down(40.0);
        assert_eq!(
            brush.pointer_move(90.0),
            Some(Extent::new(40.0, 90.0))
        );
        // Dragging leftwards still yields an ordered extent.
        assert_eq!(
            brush.pointer_move(10.0),
            Some(Extent::new(10.0, 40.0))
        );
        let final_extent = brush.pointer_up(90.0).unwrap();
        assert_eq!(final_extent, Extent::new(40.0, 90.0));
        assert_eq!(brush.state(), BrushState::Idle);
        assert_eq!(brush.pointer_up(90.0), None);
    }

    #[test]
    fn test_window_survives_resort_by_key_identity() {
        let scale = BandScale::new(keys(10), 5.0);
        let mut brush = BrushController::new(&scale, 80, 50.0);
        brush.brush_event(Extent::new(10.0, 20.0), &scale);
        let before: Vec<String> = brush.window().to_vec();
        assert_eq!(before, vec!["v2", "v3", "v4"]);

        // Reverse the column order and re-derive by key identity.
        let mut reversed = keys(10);
        reversed.reverse();
        let resorted = BandScale::new(reversed, 5.0);
        brush.update(&resorted, 50.0);

        let mut after: Vec<String> = brush.window().to_vec();
        // Same key set, reordered to the new column order.
        assert_eq!(after, vec!["v4", "v3", "v2"]);
        after.sort();
        let mut sorted_before = before.clone();
        sorted_before.sort();
        assert_eq!(after, sorted_before);
        // Extent tracks the new pixel positions (v4 is now at index 5).
        assert_eq!(brush.extent(), Extent::new(25.0, 35.0));
    }

    #[test]
    fn test_update_falls_back_to_default_window() {
        let scale = BandScale::new(keys(10), 5.0);
        let mut brush = BrushController::new(&scale, 4, 50.0);
        brush.brush_event(Extent::new(10.0, 20.0), &scale);

        // None of the selected keys survive the replacement.
        let other = BandScale::new(["w0", "w1", "w2", "w3", "w4", "w5"], 5.0);
        brush.update(&other, 30.0);
        assert_eq!(brush.window(), &["w0", "w1", "w2", "w3"]);
    }
}
