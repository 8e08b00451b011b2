//! Derived column decorations: the TSS/TES site markers, the SNP search
//! highlights, and the TSS-proximity shades with exon classification.

use crate::colors::{ramp, Rgb};
use crate::matrix::{ColKey, ColumnSort, MatrixModel};
use crate::parse::Exon;
use regex::Regex;

/// Search terms shorter than this never match (the locator box fires on
/// every keystroke).
const MIN_SEARCH_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteKind {
    Tss,
    Tes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SiteMarker {
    pub kind: SiteKind,
    pub col: ColKey,
}

/// Finds the column where the signed TSS distance changes sign relative
/// to its right neighbor. The scan is only valid while columns are sorted
/// by genomic position; under any other sort it is suppressed rather than
/// run against an ordering its invariant does not hold for. Zero or more
/// than one crossing yields no marker (logged, non-fatal).
pub fn find_tss_site(model: &MatrixModel, sort: ColumnSort) -> Option<ColKey> {
    if sort != ColumnSort::GenomicPosition {
        return None;
    }
    let columns = model.columns();
    let mut sites = vec![];
    for (i, col) in columns.iter().enumerate() {
        // The last column has no right neighbor and is never a site, even
        // at distance zero.
        if i + 1 == columns.len() {
            break;
        }
        let dist = model.variant(col)?.tss_distance;
        if dist == 0 {
            sites.push(col.clone());
            continue;
        }
        let right = model.variant(&columns[i + 1])?.tss_distance;
        // The product is negative only where the distance crosses zero.
        if dist * right < 0 {
            sites.push(col.clone());
        }
    }
    if sites.len() != 1 {
        eprintln!("TSS site not found ({} crossings)", sites.len());
        return None;
    }
    sites.pop()
}

/// Same scan against the transcription end site's genomic position.
pub fn find_tes_site(model: &MatrixModel, tes_position: i64, sort: ColumnSort) -> Option<ColKey> {
    if sort != ColumnSort::GenomicPosition {
        return None;
    }
    let columns = model.columns();
    let mut sites = vec![];
    for (i, col) in columns.iter().enumerate() {
        if i + 1 == columns.len() {
            break;
        }
        let pos = model.variant(col)?.position;
        let right = model.variant(&columns[i + 1])?.position;
        if (pos - tes_position) * (right - tes_position) < 0 {
            sites.push(col.clone());
        }
    }
    if sites.len() != 1 {
        eprintln!("TES site not found ({} crossings)", sites.len());
        return None;
    }
    sites.pop()
}

pub fn site_markers(
    model: &MatrixModel,
    tes_position: i64,
    sort: ColumnSort,
) -> Vec<SiteMarker> {
    let mut markers = vec![];
    if let Some(col) = find_tss_site(model, sort) {
        markers.push(SiteMarker {
            kind: SiteKind::Tss,
            col,
        });
    }
    if let Some(col) = find_tes_site(model, tes_position, sort) {
        markers.push(SiteMarker {
            kind: SiteKind::Tes,
            col,
        });
    }
    markers
}

/// Columns whose variant ID or rsID matches the search term, as a regex.
/// Short terms and invalid patterns match nothing.
pub fn search_columns(model: &MatrixModel, term: &str) -> Vec<ColKey> {
    if term.len() < MIN_SEARCH_LEN {
        return vec![];
    }
    let Ok(re) = Regex::new(term) else {
        return vec![];
    };
    model
        .columns()
        .iter()
        .filter(|col| {
            re.is_match(col)
                || model
                    .variant(col)
                    .is_some_and(|info| re.is_match(&info.rs_id))
        })
        .cloned()
        .collect()
}

/// Grey shade for the TSS-proximity track: black at the site, fading to
/// white beyond ~300 kb.
pub fn tss_proximity_shade(tss_distance: i64) -> Rgb {
    const STOPS: [(f64, Rgb); 7] = [
        (0.0, Rgb::new(0, 0, 0)),
        (500.0, Rgb::new(37, 37, 37)),
        (1_000.0, Rgb::new(82, 82, 82)),
        (10_000.0, Rgb::new(115, 115, 115)),
        (50_000.0, Rgb::new(150, 150, 150)),
        (200_000.0, Rgb::new(240, 240, 240)),
        (300_000.0, Rgb::new(255, 255, 255)),
    ];
    ramp(&STOPS, tss_distance.unsigned_abs() as f64)
}

/// Whether a variant's position falls inside a coding exon of the
/// collapsed gene model. Affects marker styling only.
pub fn overlaps_exon(exons: &[Exon], position: i64) -> bool {
    exons
        .iter()
        .any(|exon| exon.start <= position && position <= exon.end)
}

/// One entry of the 1-D TSS-proximity heat row under the bubble map.
#[derive(Clone, Debug, PartialEq)]
pub struct ProximityCell {
    pub col: ColKey,
    pub shade: Rgb,
    pub in_exon: bool,
}

pub fn proximity_track(model: &MatrixModel, exons: &[Exon]) -> Vec<ProximityCell> {
    model
        .columns()
        .iter()
        .filter_map(|col| {
            let info = model.variant(col)?;
            Some(ProximityCell {
                col: col.clone(),
                shade: tss_proximity_shade(info.tss_distance),
                in_exon: overlaps_exon(exons, info.position),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Cell, VariantInfo};
    use std::collections::HashMap;

    fn model_with_distances(distances: &[(&str, i64)]) -> MatrixModel {
        let column_meta: HashMap<String, VariantInfo> = distances
            .iter()
            .map(|(col, dist)| {
                (
                    col.to_string(),
                    VariantInfo {
                        position: 1000 + dist,
                        tss_distance: *dist,
                        display_id: col.to_string(),
                        rs_id: format!("rs_{col}"),
                    },
                )
            })
            .collect();
        let cells = distances
            .iter()
            .map(|(col, _)| Cell::new("Liver", col, 0.1, 1.0))
            .collect();
        MatrixModel::new(
            vec!["Liver".to_string()],
            distances.iter().map(|(c, _)| c.to_string()).collect(),
            cells,
            column_meta,
        )
        .unwrap()
    }

    #[test]
    fn test_tss_site_single_crossing() {
        let model = model_with_distances(&[("v1", -300), ("v2", -100), ("v3", 200), ("v4", 400)]);
        assert_eq!(
            find_tss_site(&model, ColumnSort::GenomicPosition),
            Some("v2".to_string())
        );
    }

    #[test]
    fn test_tss_site_exact_zero() {
        let model = model_with_distances(&[("v1", -300), ("v2", 0), ("v3", 200)]);
        assert_eq!(
            find_tss_site(&model, ColumnSort::GenomicPosition),
            Some("v2".to_string())
        );
    }

    #[test]
    fn test_tss_site_no_crossing() {
        let model = model_with_distances(&[("v1", 100), ("v2", 200)]);
        assert_eq!(find_tss_site(&model, ColumnSort::GenomicPosition), None);
    }

    #[test]
    fn test_tss_zero_at_last_column_is_not_a_site() {
        // The last column has no right neighbor; a zero distance there does
        // not count as a crossing.
        let model = model_with_distances(&[("v1", -300), ("v2", -100), ("v3", 0)]);
        assert_eq!(find_tss_site(&model, ColumnSort::GenomicPosition), None);
    }

    #[test]
    fn test_site_scan_suppressed_under_custom_sort() {
        let model = model_with_distances(&[("v1", -300), ("v2", -100), ("v3", 200)]);
        assert_eq!(find_tss_site(&model, ColumnSort::Custom), None);
        assert_eq!(find_tes_site(&model, 900, ColumnSort::Custom), None);
    }

    #[test]
    fn test_tes_site_crossing() {
        // Positions are 1000 + distance; TES at 1050 sits between v2 and v3.
        let model = model_with_distances(&[("v1", -300), ("v2", -100), ("v3", 200)]);
        assert_eq!(
            find_tes_site(&model, 1050, ColumnSort::GenomicPosition),
            Some("v2".to_string())
        );
    }

    #[test]
    fn test_search_columns() {
        let model = model_with_distances(&[("chr1_100_A_G", 0), ("chr1_200_C_T", 100)]);
        assert_eq!(search_columns(&model, "chr1_100").len(), 1);
        // Matches against rsIDs as well.
        assert_eq!(search_columns(&model, "rs_chr1").len(), 2);
        // Too short, or an invalid pattern: no matches.
        assert!(search_columns(&model, "chr").is_empty());
        assert!(search_columns(&model, "chr1[").is_empty());
    }

    #[test]
    fn test_proximity_shade_monotone_grey() {
        let near = tss_proximity_shade(0);
        let mid = tss_proximity_shade(-50_000);
        let far = tss_proximity_shade(400_000);
        assert_eq!(near, Rgb::new(0, 0, 0));
        assert_eq!(mid, Rgb::new(150, 150, 150));
        assert_eq!(far, Rgb::new(255, 255, 255));
    }

    #[test]
    fn test_exon_overlap() {
        let exons = vec![Exon { start: 100, end: 200 }, Exon { start: 400, end: 450 }];
        assert!(overlaps_exon(&exons, 150));
        assert!(overlaps_exon(&exons, 400));
        assert!(!overlaps_exon(&exons, 300));
    }
}
