//! Sweep result export and console formatting

use std::fs;
use std::path::Path;

use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

use super::sweep::SweepResult;
use crate::utils::{BenchmarkError, Result};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write results as CSV, header taken from the field names
///
/// Returns `false` without touching the filesystem when `results` is empty.
pub fn write_results_csv(results: &[SweepResult], path: &Path) -> Result<bool> {
    if results.is_empty() {
        return Ok(false);
    }
    ensure_parent(path)?;

    let export_err = |e: csv::Error| {
        BenchmarkError::Export(format!("Failed to write CSV {}: {}", path.display(), e))
    };
    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;
    for result in results {
        writer.serialize(result).map_err(export_err)?;
    }
    writer.flush()?;
    Ok(true)
}

/// Write results plus a per-variant summary as pretty JSON
pub fn write_results_json(results: &[SweepResult], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let mut variants: Vec<&str> = results.iter().map(|r| r.variant.as_str()).collect();
    variants.dedup();

    let json = serde_json::json!({
        "cells": results.len(),
        "variants": variants.iter().map(|id| {
            let cells: Vec<&SweepResult> = results.iter().filter(|r| r.variant == *id).collect();
            let best = cells
                .iter()
                .map(|r| r.throughput_rows_per_s)
                .fold(0.0_f64, f64::max);
            serde_json::json!({
                "variant": id,
                "variant_name": cells.first().map(|r| r.variant_name.as_str()).unwrap_or_default(),
                "total_seconds": cells.iter().map(|r| r.seconds).sum::<f64>(),
                "best_throughput_rows_per_s": best,
            })
        }).collect::<Vec<_>>(),
        "results": results,
    });

    let text = serde_json::to_string_pretty(&json)
        .map_err(|e| BenchmarkError::Export(format!("Failed to encode JSON: {}", e)))?;
    fs::write(path, text + "\n")?;
    Ok(())
}

/// Format throughput without meaningless decimals
/// Examples: 1,234,567 rows/s, 987,654 rows/s
pub fn format_throughput(throughput: f64) -> String {
    let value = throughput as u64;
    format_count(value)
}

/// Format large numbers with thousands separators
/// Examples: 1,234,567 or 987,654
pub fn format_count(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Render results as a console table
pub fn results_table(results: &[SweepResult]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Variant", "Name", "Size (KB)", "Rows", "Seconds", "Rows/s"].map(String::from));
    for r in results {
        builder.push_record([
            r.variant.to_uppercase(),
            r.variant_name.clone(),
            format_count(r.size_kb),
            format_count(r.rows as u64),
            format!("{:.4}", r.seconds),
            format_throughput(r.throughput_rows_per_s),
        ]);
    }

    builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<SweepResult> {
        vec![
            SweepResult {
                variant: "a".to_string(),
                variant_name: "Row-based CSV".to_string(),
                size_kb: 16,
                rows: 341,
                seconds: 0.5,
                throughput_rows_per_s: 682.0,
            },
            SweepResult {
                variant: "a".to_string(),
                variant_name: "Row-based CSV".to_string(),
                size_kb: 64,
                rows: 1365,
                seconds: 0.25,
                throughput_rows_per_s: 5460.0,
            },
        ]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/sweep_results.csv");
        assert!(write_results_csv(&sample(), &path).unwrap());

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "variant,variant_name,size_kb,rows,seconds,throughput_rows_per_s"
        );
        assert_eq!(lines.next().unwrap(), "a,Row-based CSV,16,341,0.5,682.0");
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_empty_results_create_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/sweep_results.csv");
        assert!(!write_results_csv(&[], &path).unwrap());
        assert!(!path.exists());
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_json_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.json");
        write_results_json(&sample(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["cells"], 2);
        assert_eq!(value["results"][1]["rows"], 1365);
        assert_eq!(value["variants"][0]["variant"], "a");
        assert_eq!(value["variants"][0]["best_throughput_rows_per_s"], 5460.0);
        assert_eq!(value["variants"][0]["total_seconds"], 0.75);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(123), "123");
        assert_eq!(format_count(1234), "1,234");
        assert_eq!(format_count(123456), "123,456");
        assert_eq!(format_count(1000000), "1,000,000");
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_throughput(937821.7051), "937,821");
        assert_eq!(format_throughput(123.456), "123");
    }

    #[test]
    fn test_table_contains_cells() {
        let table = results_table(&sample());
        assert!(table.contains("Row-based CSV"));
        assert!(table.contains("5,460"));
        assert!(table.contains("1,365"));
    }
}
