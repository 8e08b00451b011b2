//! Boundary parsing of the portal web-service payloads (gene, eQTL,
//! tissue, exon, LD) into the typed in-memory model. Everything here
//! fails fast: a malformed payload is a `DataIntegrity` error, a query
//! with zero eQTL hits is the recoverable `EmptyResult`.

use crate::error::EqtlMapError;
use crate::matrix::{Cell, MatrixModel, VariantInfo};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneRecord {
    pub gencode_id: String,
    pub gene_symbol: String,
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub strand: String,
    #[serde(alias = "transcriptionStartSite")]
    pub tss: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl GeneRecord {
    /// Transcription end site: the strand decides which gene boundary it is.
    pub fn tes(&self) -> i64 {
        if self.strand == "+" {
            self.end
        } else {
            self.start
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqtlRecord {
    pub tissue_site_detail_id: String,
    /// The rsID of the variant.
    pub snp_id: String,
    pub variant_id: String,
    pub pos: i64,
    pub p_value: f64,
    pub nes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exon {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TissueSummaryEntry {
    tissue_site_detail_id: String,
    rna_seq_and_genotype_sample_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct LdEntry {
    snp1: String,
    snp2: String,
    r2: f64,
}

/// Resolves the gene payload for a query that may be a gene symbol or a
/// gencode ID. Several records can come back when the query was a symbol;
/// the exact (case-insensitive) symbol match wins.
pub fn parse_gene(payload: &Value, query: &str) -> Result<GeneRecord, EqtlMapError> {
    let genes = payload
        .get("gene")
        .and_then(Value::as_array)
        .ok_or_else(|| EqtlMapError::DataIntegrity("gene payload has no 'gene' list".to_string()))?;
    let mut records = vec![];
    for entry in genes {
        let record: GeneRecord = serde_json::from_value(entry.clone())?;
        records.push(record);
    }
    match records.len() {
        0 => Err(EqtlMapError::DataIntegrity(format!(
            "query gene not found: {query}"
        ))),
        1 => Ok(records.remove(0)),
        _ => records
            .into_iter()
            .find(|g| g.gene_symbol.eq_ignore_ascii_case(query))
            .ok_or_else(|| {
                EqtlMapError::DataIntegrity(format!(
                    "no exact gene symbol match for: {query}"
                ))
            }),
    }
}

/// Shortens a variant ID (`chr_pos_ref_alt_build`) for display: indels
/// collapse their long allele to `del`/`ins`, equal-length substitutions
/// to `sub`. Single-base variants pass through unchanged.
pub fn truncate_variant_id(id: &str) -> String {
    let mut parts: Vec<&str> = id.split('_').collect();
    if parts.len() < 4 {
        return id.to_string();
    }
    let (ref_len, alt_len) = (parts[2].len(), parts[3].len());
    if ref_len == 1 && alt_len == 1 {
        return id.to_string();
    }
    if ref_len > alt_len {
        parts[2] = "del";
        parts.remove(3);
    } else if alt_len > ref_len {
        parts[3] = "ins";
        parts.remove(2);
    } else {
        parts[3] = "sub";
        parts.remove(2);
    }
    parts.join("_")
}

/// Builds the matrix model from the single-tissue eQTL payload: rows are
/// the unique tissues sorted alphabetically, columns the unique variants
/// sorted by genomic position, one cell per record with the effect size
/// as color value and -log10(p) as magnitude.
pub fn parse_eqtl(payload: &Value, tss: i64) -> Result<MatrixModel, EqtlMapError> {
    let records = payload
        .get("singleTissueEqtl")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            EqtlMapError::DataIntegrity("eQTL payload has no 'singleTissueEqtl' list".to_string())
        })?;
    if records.is_empty() {
        return Err(EqtlMapError::EmptyResult(
            "no eQTL records for this gene".to_string(),
        ));
    }
    let records: Vec<EqtlRecord> = records
        .iter()
        .map(|entry| serde_json::from_value(entry.clone()))
        .collect::<Result<_, _>>()?;
    build_model(&records, tss)
}

pub fn build_model(records: &[EqtlRecord], tss: i64) -> Result<MatrixModel, EqtlMapError> {
    if records.is_empty() {
        return Err(EqtlMapError::EmptyResult(
            "no eQTL records for this gene".to_string(),
        ));
    }

    let mut rows: Vec<String> = vec![];
    let mut columns: Vec<String> = vec![];
    let mut column_meta: HashMap<String, VariantInfo> = HashMap::new();
    let mut cells = Vec::with_capacity(records.len());
    for record in records {
        if !rows.contains(&record.tissue_site_detail_id) {
            rows.push(record.tissue_site_detail_id.clone());
        }
        if !column_meta.contains_key(&record.variant_id) {
            columns.push(record.variant_id.clone());
            column_meta.insert(
                record.variant_id.clone(),
                VariantInfo {
                    position: record.pos,
                    tss_distance: record.pos - tss,
                    display_id: truncate_variant_id(&record.variant_id),
                    rs_id: record.snp_id.clone(),
                },
            );
        }
        // Guard against p = 0 before the log.
        let p = record.p_value.max(f64::MIN_POSITIVE);
        cells.push(Cell::new(
            &record.tissue_site_detail_id,
            &record.variant_id,
            record.nes,
            -p.log10(),
        ));
    }

    rows.sort();
    columns.sort_by_key(|col| column_meta[col].position);

    MatrixModel::new(rows, columns, cells, column_meta)
}

/// Tissue metadata: sample-with-genotype count per tissue, for the badges.
pub fn parse_tissue(payload: &Value) -> Result<HashMap<String, u64>, EqtlMapError> {
    let entries = payload
        .get("tissueSummary")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            EqtlMapError::DataIntegrity("tissue payload has no 'tissueSummary' list".to_string())
        })?;
    let mut counts = HashMap::new();
    for entry in entries {
        let record: TissueSummaryEntry = serde_json::from_value(entry.clone())?;
        counts.insert(
            record.tissue_site_detail_id,
            record.rna_seq_and_genotype_sample_count,
        );
    }
    Ok(counts)
}

pub fn parse_exons(payload: &Value) -> Result<Vec<Exon>, EqtlMapError> {
    let entries = payload.get("exon").and_then(Value::as_array).ok_or_else(|| {
        EqtlMapError::DataIntegrity("exon payload has no 'exon' list".to_string())
    })?;
    entries
        .iter()
        .map(|entry| serde_json::from_value(entry.clone()).map_err(EqtlMapError::from))
        .collect()
}

/// LD pairs; the service encodes each variant as `variantId,rsId`, only
/// the variant ID part keys the store.
pub fn parse_ld(payload: &Value) -> Result<Vec<(String, String, f64)>, EqtlMapError> {
    let entries = payload
        .as_array()
        .or_else(|| payload.get("ld").and_then(Value::as_array))
        .ok_or_else(|| EqtlMapError::DataIntegrity("LD payload is not a list".to_string()))?;
    let mut pairs = vec![];
    for entry in entries {
        let record: LdEntry = serde_json::from_value(entry.clone())?;
        let a = record.snp1.split(',').next().unwrap_or(&record.snp1);
        let b = record.snp2.split(',').next().unwrap_or(&record.snp2);
        pairs.push((a.to_string(), b.to_string(), record.r2));
    }
    Ok(pairs)
}

// Text-level helpers for callers holding raw response bodies.

pub fn gene_from_json_str(text: &str, query: &str) -> Result<GeneRecord> {
    let payload: Value =
        serde_json::from_str(text).map_err(|e| anyhow!("Malformed gene response: {e}"))?;
    Ok(parse_gene(&payload, query)?)
}

pub fn eqtl_model_from_json_str(text: &str, tss: i64) -> Result<MatrixModel> {
    let payload: Value =
        serde_json::from_str(text).map_err(|e| anyhow!("Malformed eQTL response: {e}"))?;
    Ok(parse_eqtl(&payload, tss)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_variant_id() {
        // SNV passes through.
        assert_eq!(
            truncate_variant_id("chr1_100_A_G_b38"),
            "chr1_100_A_G_b38"
        );
        // Deletion: long reference collapses, alt is dropped.
        assert_eq!(
            truncate_variant_id("chr1_100_ATTG_A_b38"),
            "chr1_100_del_b38"
        );
        // Insertion: long alt collapses, reference is dropped.
        assert_eq!(
            truncate_variant_id("chr1_100_A_ATTG_b38"),
            "chr1_100_ins_b38"
        );
        // Equal-length multi-base substitution.
        assert_eq!(
            truncate_variant_id("chr1_100_AT_GC_b38"),
            "chr1_100_sub_b38"
        );
        assert_eq!(truncate_variant_id("weird-id"), "weird-id");
    }

    #[test]
    fn test_parse_gene_exact_symbol_match() {
        let payload = json!({
            "gene": [
                {"gencodeId": "ENSG1", "geneSymbol": "NDRG4L", "chromosome": "16",
                 "start": 100, "end": 200, "strand": "+", "tss": 100},
                {"gencodeId": "ENSG2", "geneSymbol": "NDRG4", "chromosome": "16",
                 "start": 300, "end": 400, "strand": "-", "tss": 400},
            ]
        });
        let gene = parse_gene(&payload, "ndrg4").unwrap();
        assert_eq!(gene.gencode_id, "ENSG2");
        assert_eq!(gene.tes(), 300);
    }

    #[test]
    fn test_parse_gene_not_found() {
        let payload = json!({"gene": []});
        assert!(matches!(
            parse_gene(&payload, "NOPE"),
            Err(EqtlMapError::DataIntegrity(_))
        ));
    }

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

    #[test]
    fn test_build_model_sorting_and_magnitude() {
        let records = vec![
            record("Lung", "v2", 300, 0.01, -0.3),
            record("Liver", "v1", 100, 0.001, 0.5),
            record("Liver", "v2", 300, 0.1, 0.2),
        ];
        let model = build_model(&records, 200).unwrap();
        // Tissues alphabetical, variants by position.
        assert_eq!(model.rows(), &["Liver", "Lung"]);
        assert_eq!(model.columns(), &["v1", "v2"]);
        let v1 = model.variant("v1").unwrap();
        assert_eq!(v1.tss_distance, -100);
        let cell = &model.cells()[1];
        assert!((cell.magnitude - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_eqtl_payload_is_empty_result() {
        let payload = json!({"singleTissueEqtl": []});
        assert!(matches!(
            parse_eqtl(&payload, 0),
            Err(EqtlMapError::EmptyResult(_))
        ));
        // A payload missing the key entirely is a malformed response.
        let payload = json!({"something": []});
        assert!(matches!(
            parse_eqtl(&payload, 0),
            Err(EqtlMapError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_parse_tissue_and_exons() {
        let payload = json!({
            "tissueSummary": [
                {"tissueSiteDetailId": "Liver", "rnaSeqAndGenotypeSampleCount": 153},
            ]
        });
        let counts = parse_tissue(&payload).unwrap();
        assert_eq!(counts["Liver"], 153);

        let payload = json!({"exon": [{"start": 10, "end": 90}]});
        let exons = parse_exons(&payload).unwrap();
        assert_eq!(exons, vec![Exon { start: 10, end: 90 }]);
    }

    #[test]
    fn test_parse_ld_strips_rs_suffix() {
        let payload = json!([
            {"snp1": "v1,rs1", "snp2": "v2,rs2", "r2": 0.73},
        ]);
        let pairs = parse_ld(&payload).unwrap();
        assert_eq!(pairs, vec![("v1".to_string(), "v2".to_string(), 0.73)]);
    }
}
