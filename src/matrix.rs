use crate::error::EqtlMapError;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub type RowKey = String;
pub type ColKey = String;

/// Which ordering is currently applied to the columns. The TSS/TES site
/// scan is only meaningful while columns follow genomic position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnSort {
    #[default]
    GenomicPosition,
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterDimension {
    PValue,
    EffectSize,
}

/// One flag per filter dimension; a cell renders muted when any flag is
/// set. Relaxing one filter must not clear another's flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterFlags {
    pvalue: bool,
    effect_size: bool,
}

impl FilterFlags {
    pub fn any(&self) -> bool {
        self.pvalue || self.effect_size
    }

    pub fn set(&mut self, dimension: FilterDimension, flagged: bool) {
        match dimension {
            FilterDimension::PValue => self.pvalue = flagged,
            FilterDimension::EffectSize => self.effect_size = flagged,
        }
    }

    pub fn get(&self, dimension: FilterDimension) -> bool {
        match dimension {
            FilterDimension::PValue => self.pvalue,
            FilterDimension::EffectSize => self.effect_size,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub row: RowKey,
    pub col: ColKey,
    /// Signed effect size; drives the bubble color.
    pub value: f64,
    /// -log10(p-value); drives the bubble radius.
    pub magnitude: f64,
    pub filtered: FilterFlags,
}

impl Cell {
    pub fn new(row: &str, col: &str, value: f64, magnitude: f64) -> Self {
        Self {
            row: row.to_string(),
            col: col.to_string(),
            value,
            magnitude,
            filtered: FilterFlags::default(),
        }
    }
}

/// Per-column side-table entry for a variant.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantInfo {
    pub position: i64,
    /// Signed distance to the transcription start site.
    pub tss_distance: i64,
    /// Shortened variant ID for display.
    pub display_id: String,
    pub rs_id: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatrixSummary {
    pub eqtl_count: usize,
    pub passing_count: usize,
    pub tissue_count: usize,
    pub variant_count: usize,
}

/// The tissue × variant eQTL matrix: ordered row keys, ordered column
/// keys, a flat cell list and the variant side-table. Owned exclusively
/// by the controller; views get read-only access per render pass.
#[derive(Clone, Debug, Default)]
pub struct MatrixModel {
    rows: Vec<RowKey>,
    columns: Vec<ColKey>,
    cells: Vec<Cell>,
    column_meta: HashMap<ColKey, VariantInfo>,
}

impl MatrixModel {
    pub fn new(
        rows: Vec<RowKey>,
        columns: Vec<ColKey>,
        cells: Vec<Cell>,
        column_meta: HashMap<ColKey, VariantInfo>,
    ) -> Result<Self, EqtlMapError> {
        let model = Self {
            rows,
            columns,
            cells,
            column_meta,
        };
        model.validate()?;
        Ok(model)
    }

    /// Wholesale replacement, used on tissue-subset changes. The caller is
    /// responsible for triggering the derived-view recompute afterwards.
    pub fn replace(
        &mut self,
        rows: Vec<RowKey>,
        columns: Vec<ColKey>,
        cells: Vec<Cell>,
        column_meta: HashMap<ColKey, VariantInfo>,
    ) -> Result<(), EqtlMapError> {
        *self = Self::new(rows, columns, cells, column_meta)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), EqtlMapError> {
        if self.rows.is_empty() {
            return Err(EqtlMapError::DataIntegrity("no rows (tissues)".to_string()));
        }
        if self.columns.is_empty() {
            return Err(EqtlMapError::DataIntegrity(
                "no columns (variants)".to_string(),
            ));
        }
        if self.cells.is_empty() {
            return Err(EqtlMapError::DataIntegrity("no cells".to_string()));
        }

        let row_set: HashSet<&str> = self.rows.iter().map(String::as_str).collect();
        let col_set: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        if row_set.len() != self.rows.len() {
            return Err(EqtlMapError::DataIntegrity("duplicate row keys".to_string()));
        }
        if col_set.len() != self.columns.len() {
            return Err(EqtlMapError::DataIntegrity(
                "duplicate column keys".to_string(),
            ));
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(self.cells.len());
        for cell in &self.cells {
            if !row_set.contains(cell.row.as_str()) {
                return Err(EqtlMapError::DataIntegrity(format!(
                    "cell references unknown row '{}'",
                    cell.row
                )));
            }
            if !col_set.contains(cell.col.as_str()) {
                return Err(EqtlMapError::DataIntegrity(format!(
                    "cell references unknown column '{}'",
                    cell.col
                )));
            }
            if !seen.insert((cell.row.as_str(), cell.col.as_str())) {
                return Err(EqtlMapError::DataIntegrity(format!(
                    "duplicate cell ({}, {})",
                    cell.row, cell.col
                )));
            }
        }

        for col in &self.columns {
            if !self.column_meta.contains_key(col) {
                return Err(EqtlMapError::DataIntegrity(format!(
                    "column '{col}' has no variant metadata"
                )));
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColKey] {
        &self.columns
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn variant(&self, col: &str) -> Option<&VariantInfo> {
        self.column_meta.get(col)
    }

    pub fn column_meta(&self) -> &HashMap<ColKey, VariantInfo> {
        &self.column_meta
    }

    /// In-place stable sort of the rows. Membership is unchanged; only the
    /// order moves.
    pub fn reorder_rows<F>(&mut self, mut comparator: F)
    where
        F: FnMut(&RowKey, &RowKey) -> Ordering,
    {
        self.rows.sort_by(|a, b| comparator(a, b));
    }

    /// In-place stable sort of the columns. The brush window must be
    /// preserved by key identity afterwards, never by index.
    pub fn reorder_columns<F>(&mut self, mut comparator: F)
    where
        F: FnMut(&ColKey, &ColKey) -> Ordering,
    {
        self.columns.sort_by(|a, b| comparator(a, b));
    }

    /// Flags cells along one filter dimension. Filtering never removes a
    /// cell; it is purely a rendering concern.
    pub fn set_filtered<F>(&mut self, dimension: FilterDimension, predicate: F)
    where
        F: Fn(&Cell) -> bool,
    {
        for cell in &mut self.cells {
            let flagged = predicate(cell);
            cell.filtered.set(dimension, flagged);
        }
    }

    pub fn summary(&self) -> MatrixSummary {
        MatrixSummary {
            eqtl_count: self.cells.len(),
            passing_count: self.cells.iter().filter(|c| !c.filtered.any()).count(),
            tissue_count: self.rows.len(),
            variant_count: self.columns.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(position: i64, tss_distance: i64, id: &str) -> VariantInfo {
        VariantInfo {
            position,
            tss_distance,
            display_id: id.to_string(),
            rs_id: format!("rs_{id}"),
        }
    }

    fn small_model() -> MatrixModel {
        let mut column_meta = HashMap::new();
        column_meta.insert("v1".to_string(), meta(100, -50, "v1"));
        column_meta.insert("v2".to_string(), meta(200, 50, "v2"));
        column_meta.insert("v3".to_string(), meta(300, 150, "v3"));
        MatrixModel::new(
            vec!["Liver".to_string(), "Lung".to_string()],
            vec!["v1".to_string(), "v2".to_string(), "v3".to_string()],
            vec![
                Cell::new("Liver", "v1", 0.5, 2.0),
                Cell::new("Lung", "v2", -0.3, 1.0),
            ],
            column_meta,
        )
        .unwrap()
    }

    #[test]
    fn test_orphan_cell_rejected() {
        let mut column_meta = HashMap::new();
        column_meta.insert("v1".to_string(), meta(100, 0, "v1"));
        let result = MatrixModel::new(
            vec!["Liver".to_string()],
            vec!["v1".to_string()],
            vec![Cell::new("Spleen", "v1", 0.1, 1.0)],
            column_meta,
        );
        assert!(matches!(result, Err(EqtlMapError::DataIntegrity(_))));
    }

    #[test]
    fn test_duplicate_cell_rejected() {
        let mut column_meta = HashMap::new();
        column_meta.insert("v1".to_string(), meta(100, 0, "v1"));
        let result = MatrixModel::new(
            vec!["Liver".to_string()],
            vec!["v1".to_string()],
            vec![
                Cell::new("Liver", "v1", 0.1, 1.0),
                Cell::new("Liver", "v1", 0.2, 2.0),
            ],
            column_meta,
        );
        assert!(matches!(result, Err(EqtlMapError::DataIntegrity(_))));
    }

    #[test]
    fn test_missing_column_meta_rejected() {
        let result = MatrixModel::new(
            vec!["Liver".to_string()],
            vec!["v1".to_string()],
            vec![Cell::new("Liver", "v1", 0.1, 1.0)],
            HashMap::new(),
        );
        assert!(matches!(result, Err(EqtlMapError::DataIntegrity(_))));
    }

    #[test]
    fn test_filter_is_non_destructive() {
        let mut model = small_model();
        let original = model.cells().to_vec();

        model.set_filtered(FilterDimension::PValue, |c| c.magnitude < 1.5);
        assert_eq!(model.cells().len(), original.len());
        assert_eq!(model.summary().passing_count, 1);

        model.set_filtered(FilterDimension::PValue, |_| false);
        assert_eq!(model.summary().passing_count, 2);
        assert_eq!(model.cells(), &original[..]);
    }

    #[test]
    fn test_filter_dimensions_are_independent() {
        let mut model = small_model();
        model.set_filtered(FilterDimension::PValue, |c| c.magnitude < 1.5);
        model.set_filtered(FilterDimension::EffectSize, |c| c.value.abs() < 0.4);

        let lung = model
            .cells()
            .iter()
            .find(|c| c.row == "Lung")
            .unwrap();
        assert!(lung.filtered.get(FilterDimension::PValue));
        assert!(lung.filtered.get(FilterDimension::EffectSize));

        // Relaxing the p-value filter keeps the effect-size flag.
        model.set_filtered(FilterDimension::PValue, |_| false);
        let lung = model
            .cells()
            .iter()
            .find(|c| c.row == "Lung")
            .unwrap();
        assert!(!lung.filtered.get(FilterDimension::PValue));
        assert!(lung.filtered.get(FilterDimension::EffectSize));
        assert!(lung.filtered.any());
    }

    #[test]
    fn test_reorder_preserves_membership() {
        let mut model = small_model();
        model.reorder_columns(|a, b| b.cmp(a));
        assert_eq!(model.columns(), &["v3", "v2", "v1"]);
        assert_eq!(model.cells().len(), 2);

        model.reorder_rows(|a, b| b.cmp(a));
        assert_eq!(model.rows(), &["Lung", "Liver"]);
    }
}
