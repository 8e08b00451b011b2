//! The controller: sole owner of the matrix model, the scale set and every
//! derived view. All mutations funnel through it, and every one ends in the
//! same fixed-order recompute pass, so the views can never drift apart no
//! matter which interaction fired.

use crate::brush::{BrushController, Extent};
use crate::config::BubbleMapConfig;
use crate::error::EqtlMapError;
use crate::ld::{build_pairs, LdPair, LdStore};
use crate::markers::{self, ProximityCell, SiteMarker};
use crate::matrix::{
    Cell, ColKey, ColumnSort, FilterDimension, MatrixModel, MatrixSummary, RowKey,
};
use crate::mini_map::MiniMap;
use crate::parse::{Exon, GeneRecord};
use crate::scales::ScaleSet;
use crate::zoom_map::ZoomMap;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// What caused a recompute pass. The pass itself is identical for every
/// trigger; the trigger is carried for logging and tests only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecomputeTrigger {
    Init,
    TissueSelect,
    Sort,
    DataFilter,
    LdFilter,
    SnpSearch,
}

/// Current numeric filter thresholds. Thresholds persist across model
/// replacements and are re-applied to the new cells.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterSettings {
    /// Cells with -log10(p) at or below this are muted.
    pub min_magnitude: f64,
    /// Cells with |effect size| at or below this are muted.
    pub min_effect_size: f64,
    /// Off-diagonal LD pairs at or below this are not drawn.
    pub ld_cutoff: f64,
}

/// Summary line for a query that produced no eQTL rows at all.
pub fn no_data_summary(gene_id: &str) -> String {
    format!("No eQTL data found for {gene_id}")
}

pub struct EqtlController {
    config: BubbleMapConfig,
    gene: GeneRecord,
    /// Gencode ID of the gene whose async responses are still welcome.
    querying: String,
    /// Untouched all-tissue baseline; tissue re-selection subsets this.
    full_model: MatrixModel,
    model: MatrixModel,
    scales: ScaleSet,
    zoom: ZoomMap,
    mini: Option<MiniMap>,
    brush: Option<BrushController>,
    ld_store: LdStore,
    ld_loaded: bool,
    ld_pairs: Vec<LdPair>,
    exons: Vec<Exon>,
    /// Sample-with-genotype counts per tissue, for the row badges.
    badges: HashMap<RowKey, u64>,
    pinned_snp: Option<ColKey>,
    search_term: String,
    search_matches: Vec<ColKey>,
    site_markers: Vec<SiteMarker>,
    filters: FilterSettings,
    column_sort: ColumnSort,
    summary: MatrixSummary,
}

impl EqtlController {
    pub fn new(gene: GeneRecord, model: MatrixModel, config: BubbleMapConfig) -> Self {
        let scales = ScaleSet::build(&model, config.data_type, config.zoom_cell_size);
        let zoom = ZoomMap::init(&model, &scales, config.column_label_space);
        let querying = gene.gencode_id.clone();
        let filters = FilterSettings {
            ld_cutoff: config.ld_cutoff,
            ..FilterSettings::default()
        };
        let mut controller = Self {
            config,
            gene,
            querying,
            full_model: model.clone(),
            model,
            scales,
            zoom,
            mini: None,
            brush: None,
            ld_store: LdStore::default(),
            ld_loaded: false,
            ld_pairs: vec![],
            exons: vec![],
            badges: HashMap::new(),
            pinned_snp: None,
            search_term: String::new(),
            search_matches: vec![],
            site_markers: vec![],
            filters,
            column_sort: ColumnSort::default(),
            summary: MatrixSummary::default(),
        };
        controller.recompute(RecomputeTrigger::Init);
        controller
    }

    // --- the recompute pass ----------------------------------------------

    /// Re-derives every view from the model, in a fixed order: row sort for
    /// the pinned SNP, scales, summary, mini map, zoom map, brush window,
    /// site markers, search markers, LD pairs. Each step reads only the
    /// model and earlier steps' output, so running the pass twice in a row
    /// is a no-op.
    pub fn recompute(&mut self, _trigger: RecomputeTrigger) {
        self.apply_pinned_row_sort();
        self.scales = ScaleSet::build(
            &self.model,
            self.config.data_type,
            self.config.zoom_cell_size,
        );
        self.summary = self.model.summary();
        self.sync_mini();
        self.zoom.update(&self.model, &self.scales);
        self.sync_brush_window();
        self.site_markers =
            markers::site_markers(&self.model, self.gene.tes(), self.column_sort);
        self.search_matches = markers::search_columns(&self.model, &self.search_term);
        self.rebuild_ld_pairs();
    }

    /// Rows sorted by |effect size| at the pinned SNP, strongest first.
    /// Tissues without a cell at that SNP form an explicit trailing list,
    /// present (and possibly empty) on every sort.
    fn apply_pinned_row_sort(&mut self) {
        let Some(snp) = self.pinned_snp.clone() else {
            return;
        };
        if !self.model.columns().contains(&snp) {
            self.pinned_snp = None;
            return;
        }
        let matched: Vec<RowKey> = self
            .model
            .cells()
            .iter()
            .filter(|cell| cell.col == snp)
            .sorted_by(|a, b| b.value.abs().total_cmp(&a.value.abs()))
            .map(|cell| cell.row.clone())
            .collect();
        let matched_set: HashSet<&str> = matched.iter().map(String::as_str).collect();
        let missed: Vec<RowKey> = self
            .model
            .rows()
            .iter()
            .filter(|row| !matched_set.contains(row.as_str()))
            .cloned()
            .collect();
        let order: HashMap<RowKey, usize> = matched
            .into_iter()
            .chain(missed)
            .enumerate()
            .map(|(i, row)| (row, i))
            .collect();
        self.model.reorder_rows(|a, b| order[a].cmp(&order[b]));
    }

    /// Creates, refreshes or drops the mini map depending on whether the
    /// column count still exceeds the zoom viewport.
    fn sync_mini(&mut self) {
        if !self.config.needs_mini(self.model.columns().len()) {
            self.mini = None;
            self.brush = None;
            return;
        }
        match self.mini.as_mut() {
            Some(mini) => mini.update(&self.model, &self.config, self.config.data_type),
            None => {
                self.mini = Some(MiniMap::new(
                    &self.model,
                    &self.config,
                    self.config.data_type,
                ))
            }
        }
    }

    /// Carries the brush window across the model change (key identity),
    /// then re-derives the contiguous window from its extent and applies it
    /// to the zoom view.
    fn sync_brush_window(&mut self) {
        let Some(mini) = self.mini.as_ref() else {
            self.zoom.clear_window();
            return;
        };
        let total_width = mini.dimensions().width;
        let brush = self.brush.get_or_insert_with(|| {
            BrushController::new(mini.x_scale(), self.config.zoom_count, total_width)
        });
        brush.update(mini.x_scale(), total_width);
        let extent = brush.extent();
        let window = brush.brush_event(extent, mini.x_scale()).to_vec();
        let needed = self.zoom.content_width(window.len(), self.config.padding_left);
        self.zoom.ensure_view_width(needed);
        self.zoom.apply_window(&window, &self.scales);
    }

    fn rebuild_ld_pairs(&mut self) {
        if !self.ld_loaded {
            self.ld_pairs = vec![];
            return;
        }
        let visible = self.visible_columns();
        self.ld_pairs = build_pairs(&self.ld_store, &visible, self.filters.ld_cutoff);
    }

    /// The columns the zoom view currently shows: the brush window when the
    /// mini map exists, every column otherwise.
    pub fn visible_columns(&self) -> Vec<ColKey> {
        match self.brush.as_ref() {
            Some(brush) => brush.window().to_vec(),
            None => self.model.columns().to_vec(),
        }
    }

    // --- tissue selection ------------------------------------------------

    /// Wholesale model replacement restricted to the requested tissues.
    /// Rows keep their baseline order; columns are rebuilt from the cells
    /// that remain, sorted by genomic position again.
    pub fn select_tissues(&mut self, tissues: &[RowKey]) -> Result<(), EqtlMapError> {
        if tissues.is_empty() {
            return Err(EqtlMapError::DataIntegrity(
                "select one or more tissues".to_string(),
            ));
        }
        let requested: HashSet<&str> = tissues.iter().map(String::as_str).collect();
        let rows: Vec<RowKey> = self
            .full_model
            .rows()
            .iter()
            .filter(|row| requested.contains(row.as_str()))
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(EqtlMapError::DataIntegrity(
                "none of the requested tissues exist".to_string(),
            ));
        }
        let cells: Vec<Cell> = self
            .full_model
            .cells()
            .iter()
            .filter(|cell| requested.contains(cell.row.as_str()))
            .cloned()
            .collect();
        let mut columns: Vec<ColKey> = cells.iter().map(|c| c.col.clone()).unique().collect();
        columns.sort_by_key(|col| {
            self.full_model
                .variant(col)
                .map(|info| info.position)
                .unwrap_or(i64::MAX)
        });
        let column_meta = columns
            .iter()
            .filter_map(|col| {
                self.full_model
                    .variant(col)
                    .map(|info| (col.clone(), info.clone()))
            })
            .collect();

        self.model.replace(rows, columns, cells, column_meta)?;
        self.column_sort = ColumnSort::GenomicPosition;
        self.reapply_filters();
        self.recompute(RecomputeTrigger::TissueSelect);
        Ok(())
    }

    // --- sorting ---------------------------------------------------------

    /// Alphabetical row sort; clears any pinned SNP first since the two
    /// orderings would fight.
    pub fn sort_tissues_alphabetically(&mut self) {
        self.pinned_snp = None;
        self.model.reorder_rows(|a, b| a.cmp(b));
        self.recompute(RecomputeTrigger::Sort);
    }

    /// Pins a SNP: rows re-sort by effect strength at that column on this
    /// and every later recompute. Unknown columns are ignored.
    pub fn pin_snp(&mut self, col: &str) -> bool {
        if !self.model.columns().iter().any(|c| c == col) {
            return false;
        }
        self.pinned_snp = Some(col.to_string());
        self.recompute(RecomputeTrigger::Sort);
        true
    }

    pub fn unpin_snp(&mut self) {
        self.pinned_snp = None;
        self.recompute(RecomputeTrigger::Sort);
    }

    pub fn sort_columns_by_position(&mut self) {
        let positions: HashMap<ColKey, i64> = self
            .model
            .column_meta()
            .iter()
            .map(|(col, info)| (col.clone(), info.position))
            .collect();
        self.model
            .reorder_columns(|a, b| positions[a].cmp(&positions[b]));
        self.column_sort = ColumnSort::GenomicPosition;
        self.recompute(RecomputeTrigger::Sort);
    }

    /// Lexicographic column sort. The TSS/TES site markers are suppressed
    /// while this ordering is active; their neighbor scan has no meaning
    /// off the genomic axis.
    pub fn sort_columns_alphabetically(&mut self) {
        self.model.reorder_columns(|a, b| a.cmp(b));
        self.column_sort = ColumnSort::Custom;
        self.recompute(RecomputeTrigger::Sort);
    }

    // --- filters ---------------------------------------------------------

    pub fn set_magnitude_filter(&mut self, min_magnitude: f64) {
        self.filters.min_magnitude = min_magnitude;
        self.reapply_filters();
        self.recompute(RecomputeTrigger::DataFilter);
    }

    pub fn set_effect_size_filter(&mut self, min_effect_size: f64) {
        self.filters.min_effect_size = min_effect_size;
        self.reapply_filters();
        self.recompute(RecomputeTrigger::DataFilter);
    }

    pub fn set_ld_cutoff(&mut self, cutoff: f64) {
        self.filters.ld_cutoff = cutoff;
        self.recompute(RecomputeTrigger::LdFilter);
    }

    fn reapply_filters(&mut self) {
        let min_magnitude = self.filters.min_magnitude;
        self.model
            .set_filtered(FilterDimension::PValue, |cell| {
                cell.magnitude <= min_magnitude
            });
        let min_effect = self.filters.min_effect_size;
        self.model
            .set_filtered(FilterDimension::EffectSize, |cell| {
                cell.value.abs() <= min_effect
            });
    }

    /// Status line for the filter panel, or None while nothing is muted.
    pub fn filter_report(&self) -> Option<String> {
        let flagged = self.summary.eqtl_count - self.summary.passing_count;
        if flagged == 0 {
            return None;
        }
        let percent = 100.0 * self.summary.passing_count as f64 / self.summary.eqtl_count as f64;
        Some(format!(
            "Remaining number of eQTLs: {} ({percent:.2}%)",
            self.summary.passing_count
        ))
    }

    // --- search ----------------------------------------------------------

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.recompute(RecomputeTrigger::SnpSearch);
    }

    // --- labels and highlight --------------------------------------------

    pub fn set_label_mode(&mut self, use_rs_ids: bool) {
        self.zoom.set_label_mode(use_rs_ids, &self.model);
    }

    pub fn set_highlight(&mut self, row: &str, col: &str, highlighted: bool) {
        self.zoom.set_highlight(row, col, highlighted);
    }

    // --- brush interaction -----------------------------------------------

    pub fn brush_pointer_down(&mut self, x: f64) {
        if let Some(brush) = self.brush.as_mut() {
            brush.pointer_down(x);
        }
    }

    pub fn brush_pointer_move(&mut self, x: f64) {
        let extent = self.brush.as_mut().and_then(|brush| brush.pointer_move(x));
        if let Some(extent) = extent {
            self.apply_brush_extent(extent);
        }
    }

    pub fn brush_pointer_up(&mut self, x: f64) {
        let extent = self.brush.as_mut().and_then(|brush| brush.pointer_up(x));
        if let Some(extent) = extent {
            self.apply_brush_extent(extent);
        }
    }

    /// The brush's single synchronization point: derive the window, widen
    /// the zoom viewport if it would not fit, hide and pan, and rebuild
    /// the LD pairs for the new window.
    fn apply_brush_extent(&mut self, extent: Extent) {
        let window = match (self.mini.as_ref(), self.brush.as_mut()) {
            (Some(mini), Some(brush)) => brush.brush_event(extent, mini.x_scale()).to_vec(),
            _ => return,
        };
        let needed = self.zoom.content_width(window.len(), self.config.padding_left);
        self.zoom.ensure_view_width(needed);
        self.zoom.apply_window(&window, &self.scales);
        self.rebuild_ld_pairs();
    }

    // --- async response handlers -----------------------------------------

    /// Accepts an LD response only when it belongs to the gene still being
    /// queried; a stale response (the user has moved on) is discarded.
    /// Returns whether the response was applied.
    pub fn apply_ld_response(&mut self, gencode_id: &str, pairs: Vec<(String, String, f64)>) -> bool {
        if gencode_id != self.querying {
            eprintln!("discarding stale LD response for {gencode_id}");
            return false;
        }
        self.ld_store = LdStore::from_pairs(pairs);
        self.ld_loaded = true;
        self.rebuild_ld_pairs();
        true
    }

    pub fn apply_exon_response(&mut self, gencode_id: &str, exons: Vec<Exon>) -> bool {
        if gencode_id != self.querying {
            eprintln!("discarding stale exon response for {gencode_id}");
            return false;
        }
        self.exons = exons;
        true
    }

    /// Tissue sample counts arrive once per session; repeats are ignored.
    pub fn apply_tissue_response(&mut self, counts: HashMap<RowKey, u64>) {
        if self.badges.is_empty() {
            self.badges = counts;
        }
    }

    // --- derived text and tracks -----------------------------------------

    pub fn summary_text(&self) -> String {
        format!(
            "({}) {}\nGene Location: chromosome {}: {} - {} ({})\n\
             eQTLs: {}, including {} tissues (rows) and {} SNPs (columns)",
            self.gene.gencode_id,
            self.gene.gene_symbol,
            self.gene.chromosome,
            self.gene.start,
            self.gene.end,
            self.gene.strand,
            self.summary.eqtl_count,
            self.summary.tissue_count,
            self.summary.variant_count,
        )
    }

    pub fn proximity_track(&self) -> Vec<ProximityCell> {
        markers::proximity_track(&self.model, &self.exons)
    }

    // --- accessors -------------------------------------------------------

    pub fn gene(&self) -> &GeneRecord {
        &self.gene
    }

    pub fn querying(&self) -> &str {
        &self.querying
    }

    pub fn config(&self) -> &BubbleMapConfig {
        &self.config
    }

    pub fn model(&self) -> &MatrixModel {
        &self.model
    }

    pub fn scales(&self) -> &ScaleSet {
        &self.scales
    }

    pub fn zoom(&self) -> &ZoomMap {
        &self.zoom
    }

    pub fn mini(&self) -> Option<&MiniMap> {
        self.mini.as_ref()
    }

    pub fn brush(&self) -> Option<&BrushController> {
        self.brush.as_ref()
    }

    pub fn ld_pairs(&self) -> &[LdPair] {
        &self.ld_pairs
    }

    pub fn exons(&self) -> &[Exon] {
        &self.exons
    }

    pub fn badges(&self) -> &HashMap<RowKey, u64> {
        &self.badges
    }

    pub fn pinned_snp(&self) -> Option<&ColKey> {
        self.pinned_snp.as_ref()
    }

    pub fn search_matches(&self) -> &[ColKey] {
        &self.search_matches
    }

    pub fn site_markers(&self) -> &[SiteMarker] {
        &self.site_markers
    }

    pub fn filters(&self) -> FilterSettings {
        self.filters
    }

    pub fn column_sort(&self) -> ColumnSort {
        self.column_sort
    }

    pub fn summary(&self) -> MatrixSummary {
        self.summary
    }
}
