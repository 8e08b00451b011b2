use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Signed values, color domain symmetric around zero.
    Diverging,
    /// Non-negative values, color domain `[0, max]`.
    Sequential,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleMapConfig {
    /// Fixed per-cell pixel size in the zoom (detail) view.
    pub zoom_cell_size: f64,
    /// Number of columns the zoom view shows at once; also the threshold
    /// above which the mini map and brush are instantiated.
    pub zoom_count: usize,
    pub mini_min_cell: f64,
    pub mini_max_cell: f64,
    pub mini_min_height: f64,
    /// Available pixel width for the mini map viewport.
    pub mini_width: f64,
    pub padding_left: f64,
    pub padding_top: f64,
    /// Vertical space reserved for the rotated column labels.
    pub column_label_space: f64,
    pub ld_cutoff: f64,
    pub data_type: DataType,
    pub color_title: String,
    pub radius_title: String,
    pub ld_title: String,
}

impl Default for BubbleMapConfig {
    fn default() -> Self {
        Self {
            zoom_cell_size: 15.0,
            zoom_count: 80,
            mini_min_cell: 2.0,
            mini_max_cell: 5.0,
            mini_min_height: 40.0,
            mini_width: 800.0,
            padding_left: 280.0,
            padding_top: 60.0,
            column_label_space: 220.0,
            ld_cutoff: 0.1,
            data_type: DataType::Diverging,
            color_title: "Color Range (NES)".to_string(),
            radius_title: "Bubble Size in Zoom ViewPort (-log10(P-value))".to_string(),
            ld_title: "Linkage Disequilibrium".to_string(),
        }
    }
}

impl BubbleMapConfig {
    /// The mini map and its brush only exist when the column count exceeds
    /// what the zoom view can show at once.
    pub fn needs_mini(&self, column_count: usize) -> bool {
        column_count > self.zoom_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_mini_threshold() {
        let config = BubbleMapConfig::default();
        assert!(!config.needs_mini(80));
        assert!(config.needs_mini(81));
    }
}
