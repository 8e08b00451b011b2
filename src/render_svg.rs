//! Headless SVG export of the full bubble-map scene: mini map with the
//! brush rectangle, the zoom view with its windowed marks and labels, the
//! marker rows, the LD triangle and the legends. One self-contained
//! document per call, no renderer state.

use crate::controller::EqtlController;
use crate::ld::{self, TrianglePanel};
use crate::markers::SiteKind;
use svg::node::element::{Circle, Group, Line, Polygon, Rectangle, Text};
use svg::Document;

const MINI_GAP: f64 = 20.0;
const TRACK_HEIGHT: f64 = 10.0;
const MARKER_RISE: f64 = 14.0;
const LEGEND_HEIGHT: f64 = 70.0;
const LEGEND_SWATCH: f64 = 18.0;
const BADGE_GAP: f64 = 6.0;
const SEARCH_COLOR: &str = "#d66400";
const MUTED_OPACITY: f64 = 0.15;

fn text(content: &str, x: f64, y: f64, size: u32) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("font-family", "sans-serif")
        .set("font-size", size)
        .set("fill", "#374151")
}

pub fn export_bubble_map_svg(controller: &EqtlController) -> String {
    let config = controller.config();
    let zoom = controller.zoom();
    let left = config.padding_left;
    let top = config.padding_top;

    let mini_height = controller
        .mini()
        .map(|mini| mini.dimensions().height + MINI_GAP)
        .unwrap_or(0.0);
    let zoom_top = top + mini_height;
    let ld_top = zoom_top + zoom.total_height() + TRACK_HEIGHT;
    let visible = controller.visible_columns();
    let panel = TrianglePanel::new(&visible, zoom.cell_size());
    let width = (left + zoom.view_width()).max(
        controller
            .mini()
            .map(|mini| left + mini.dimensions().width)
            .unwrap_or(0.0),
    );
    let height = ld_top + panel.panel_size() / 2.0 + LEGEND_HEIGHT;

    let mut doc = Document::new()
        .set("viewBox", (0.0, 0.0, width, height))
        .set("width", width)
        .set("height", height)
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", width)
                .set("height", height)
                .set("fill", "#ffffff"),
        );

    doc = doc.add(text(&controller.summary_text(), left, top - 40.0, 12));
    if let Some(report) = controller.filter_report() {
        doc = doc.add(text(&report, left, top - 24.0, 11));
    }

    if let Some(mini) = controller.mini() {
        doc = doc.add(mini_map_group(controller, mini, left, top));
    }
    doc = doc.add(zoom_group(controller, left, zoom_top));
    doc = doc.add(proximity_group(controller, left, zoom_top));
    doc = doc.add(ld_group(controller, &panel, left, ld_top));
    doc = doc.add(legend_group(controller, left, ld_top + panel.panel_size() / 2.0));

    doc.to_string()
}

fn mini_map_group(
    controller: &EqtlController,
    mini: &crate::mini_map::MiniMap,
    left: f64,
    top: f64,
) -> Group {
    let mut group = Group::new().set("transform", format!("translate({left},{top})"));
    for cell in mini.cells() {
        group = group.add(
            Circle::new()
                .set("cx", cell.x)
                .set("cy", cell.y)
                .set("r", cell.radius)
                .set("fill", cell.fill.hex())
                .set("fill-opacity", if cell.muted { MUTED_OPACITY } else { 1.0 }),
        );
    }
    if let Some(brush) = controller.brush() {
        let extent = brush.extent();
        group = group.add(
            Rectangle::new()
                .set("x", extent.start)
                .set("y", 0)
                .set("width", extent.width().max(mini.x_scale().band_width()))
                .set("height", mini.dimensions().height)
                .set("fill", "#6b7280")
                .set("fill-opacity", 0.25)
                .set("stroke", "#374151"),
        );
    }
    group
}

fn zoom_group(controller: &EqtlController, left: f64, top: f64) -> Group {
    let zoom = controller.zoom();
    let badges = controller.badges();
    let mut group = Group::new().set("transform", format!("translate({left},{top})"));

    let mut marks = Group::new().set(
        "transform",
        format!("translate({},0)", zoom.pan_offset()),
    );
    for mark in zoom.marks().iter().filter(|mark| !mark.hidden) {
        let mut circle = Circle::new()
            .set("cx", mark.x)
            .set("cy", mark.y)
            .set("r", mark.radius)
            .set("fill", mark.fill.hex())
            .set("fill-opacity", if mark.muted { MUTED_OPACITY } else { 1.0 });
        if mark.highlighted {
            circle = circle.set("stroke", "#111315").set("stroke-width", 2);
        }
        marks = marks.add(circle);
    }

    let search: Vec<&str> = controller
        .search_matches()
        .iter()
        .map(String::as_str)
        .collect();
    for label in zoom.column_labels().iter().filter(|label| !label.hidden) {
        let matched = search.contains(&label.col.as_str());
        let mut node = Text::new(label.text.clone())
            .set("x", 0)
            .set("y", 0)
            .set("font-family", "sans-serif")
            .set("font-size", 10)
            .set(
                "transform",
                format!(
                    "translate({},{}) rotate(-90)",
                    label.x,
                    zoom.map_height() + MARKER_RISE + TRACK_HEIGHT
                ),
            )
            .set("text-anchor", "end")
            .set("fill", if matched { SEARCH_COLOR } else { "#374151" });
        if matched {
            node = node.set("font-weight", "bold");
        }
        marks = marks.add(node);
    }

    for marker in controller.site_markers() {
        let Some(x) = controller.scales().x.position(&marker.col) else {
            continue;
        };
        let label = match marker.kind {
            SiteKind::Tss => "TSS",
            SiteKind::Tes => "TES",
        };
        let x = x + controller.zoom().cell_size() / 2.0;
        marks = marks
            .add(
                Line::new()
                    .set("x1", x)
                    .set("y1", -MARKER_RISE)
                    .set("x2", x)
                    .set("y2", zoom.map_height())
                    .set("stroke", "#111315")
                    .set("stroke-dasharray", "3,3"),
            )
            .add(text(label, x, -MARKER_RISE - 2.0, 10).set("text-anchor", "middle"));
    }
    if let Some(pinned) = controller.pinned_snp() {
        if let Some(x) = controller.scales().x.position(pinned) {
            let x = x + zoom.cell_size() / 2.0;
            marks = marks.add(
                text("\u{25BC}", x, -2.0, 10)
                    .set("text-anchor", "middle")
                    .set("fill", SEARCH_COLOR),
            );
        }
    }
    group = group.add(marks);

    // Row labels and badges sit in the fixed left gutter, outside the pan.
    for label in zoom.row_labels() {
        group = group.add(
            text(&label.row, -BADGE_GAP, label.y + 3.0, 11).set("text-anchor", "end"),
        );
        if let Some(count) = badges.get(&label.row) {
            group = group.add(
                text(&format!("({count})"), -left + BADGE_GAP, label.y + 3.0, 9)
                    .set("fill", "#6b7280"),
            );
        }
    }
    group
}

fn proximity_group(controller: &EqtlController, left: f64, zoom_top: f64) -> Group {
    let zoom = controller.zoom();
    let cell = zoom.cell_size();
    let y = zoom.map_height() + 2.0;
    let visible = controller.visible_columns();
    let mut group = Group::new().set(
        "transform",
        format!(
            "translate({},{}) translate({},0)",
            left,
            zoom_top,
            zoom.pan_offset()
        ),
    );
    for entry in controller.proximity_track() {
        if !visible.contains(&entry.col) {
            continue;
        }
        let Some(x) = controller.scales().x.position(&entry.col) else {
            continue;
        };
        let mut rect = Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", cell)
            .set("height", TRACK_HEIGHT)
            .set("fill", entry.shade.hex());
        if entry.in_exon {
            rect = rect.set("stroke", SEARCH_COLOR).set("stroke-width", 1);
        }
        group = group.add(rect);
    }
    group
}

fn ld_group(controller: &EqtlController, panel: &TrianglePanel, left: f64, top: f64) -> Group {
    let mut group = Group::new().set("transform", format!("translate({left},{top})"));
    group = group.add(text(&controller.config().ld_title, 0.0, -6.0, 11));
    for pair in controller.ld_pairs() {
        let Some(corners) = panel.diamond(&pair.a, &pair.b) else {
            continue;
        };
        let points = corners
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        group = group.add(
            Polygon::new()
                .set("points", points)
                .set("fill", crate::colors::ld_shade(pair.r2).hex())
                .set("stroke", "#d1d5db")
                .set("stroke-width", 0.5),
        );
    }
    group
}

fn legend_group(controller: &EqtlController, left: f64, top: f64) -> Group {
    let config = controller.config();
    let scales = controller.scales();
    let mut group = Group::new().set("transform", format!("translate({left},{top})"));

    group = group.add(text(&config.color_title, 0.0, 10.0, 10));
    for (i, (value, color)) in scales.color.stops().iter().enumerate() {
        let x = i as f64 * (LEGEND_SWATCH + 2.0);
        group = group
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", 14.0)
                    .set("width", LEGEND_SWATCH)
                    .set("height", LEGEND_SWATCH)
                    .set("fill", color.hex()),
            )
            .add(
                text(&format!("{value:.1}"), x, 14.0 + LEGEND_SWATCH + 10.0, 8),
            );
    }

    let radius_x = scales.color.stops().len() as f64 * (LEGEND_SWATCH + 2.0) + 40.0;
    group = group.add(text(&config.radius_title, radius_x, 10.0, 10));
    for (i, fraction) in [0.25, 0.5, 0.75, 1.0].iter().enumerate() {
        let magnitude = scales.radius.max_magnitude() * fraction;
        let x = radius_x + i as f64 * (LEGEND_SWATCH + 14.0);
        group = group
            .add(
                Circle::new()
                    .set("cx", x + LEGEND_SWATCH / 2.0)
                    .set("cy", 14.0 + LEGEND_SWATCH / 2.0)
                    .set("r", scales.radius.radius(magnitude))
                    .set("fill", "#9ca3af"),
            )
            .add(text(
                &format!("{magnitude:.1}"),
                x,
                14.0 + LEGEND_SWATCH + 10.0,
                8,
            ));
    }

    let ld_x = radius_x + 4.0 * (LEGEND_SWATCH + 14.0) + 40.0;
    group = group.add(text("r\u{00B2}", ld_x, 10.0, 10));
    for (i, (r2, color)) in ld::legend_steps().iter().enumerate() {
        let x = ld_x + i as f64 * (LEGEND_SWATCH / 1.5);
        group = group
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", 14.0)
                    .set("width", LEGEND_SWATCH / 1.5)
                    .set("height", LEGEND_SWATCH / 1.5)
                    .set("fill", color.hex())
                    .set("stroke", "#d1d5db")
                    .set("stroke-width", 0.3),
            )
            .add(text(&format!("{r2:.1}"), x, 14.0 + LEGEND_SWATCH, 7));
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BubbleMapConfig;
    use crate::parse::{build_model, EqtlRecord, GeneRecord};

    fn record(tissue: &str, variant: &str, pos: i64, p: f64, nes: f64) -> EqtlRecord {
        EqtlRecord {
            tissue_site_detail_id: tissue.to_string(),
            snp_id: format!("rs_{variant}"),
            variant_id: variant.to_string(),
            pos,
            p_value: p,
            nes,
        }
    }

    fn controller(column_count: usize) -> EqtlController {
        let gene = GeneRecord {
            gencode_id: "ENSG0001".to_string(),
            gene_symbol: "TEST1".to_string(),
            chromosome: "1".to_string(),
            start: 1_000,
            end: 2_000,
            strand: "+".to_string(),
            tss: 1_000,
            description: None,
        };
        let records: Vec<EqtlRecord> = (0..column_count)
            .flat_map(|i| {
                vec![
                    record("Liver", &format!("v{i:04}"), 1_000 + i as i64, 0.01, 0.4),
                    record("Lung", &format!("v{i:04}"), 1_000 + i as i64, 0.05, -0.2),
                ]
            })
            .collect();
        let model = build_model(&records, 1_000).unwrap();
        EqtlController::new(gene, model, BubbleMapConfig::default())
    }

    #[test]
    fn test_export_small_map() {
        let controller = controller(10);
        let svg = export_bubble_map_svg(&controller);
        assert!(svg.starts_with("<svg"));
        // 20 zoom circles plus the 4 radius-legend circles; no mini map.
        assert_eq!(svg.matches("<circle").count(), 24);
        assert!(svg.contains("TEST1"));
        assert!(svg.contains("Color Range (NES)"));
    }

    #[test]
    fn test_export_wide_map_has_mini_and_window() {
        let mut controller = controller(200);
        controller.apply_ld_response(
            "ENSG0001",
            vec![("v0000".to_string(), "v0001".to_string(), 0.9)],
        );
        let svg = export_bubble_map_svg(&controller);
        // Mini map cells (400) + visible zoom marks (80 * 2) + legend (4).
        assert_eq!(svg.matches("<circle").count(), 400 + 160 + 4);
        // Brush rectangle and LD diamonds are present.
        assert!(svg.contains("fill-opacity=\"0.25\""));
        assert!(svg.matches("<polygon").count() >= 80);
    }

    #[test]
    fn test_muted_marks_keep_their_circles() {
        let mut controller = controller(10);
        controller.set_magnitude_filter(1.5);
        let svg = export_bubble_map_svg(&controller);
        // -log10(0.05) < 1.5: Lung cells are muted, not dropped.
        assert_eq!(svg.matches("<circle").count(), 24);
        assert_eq!(svg.matches("fill-opacity=\"0.15\"").count(), 10);
    }
}
