//! Variant registry
//!
//! Maps a short variant id to its display name, formats and strategy.
//! Ids are stored lowercase and looked up case-insensitively.

use std::collections::BTreeMap;
use std::fmt;

use super::{
    AggregationStrategy, ArrowKernelStrategy, BinaryScanStrategy, DataFusionSqlStrategy,
    IpcColumnarStrategy, JsonLinesStrategy, ParallelColumnarStrategy, RowCsvStrategy,
    StreamingCsvStrategy,
};
use crate::dataset::DatasetFormat;

/// One registered variant
pub struct VariantInfo {
    pub id: String,
    pub name: String,
    pub default_format: DatasetFormat,
    pub allowed_formats: Vec<DatasetFormat>,
    pub strategy: Box<dyn AggregationStrategy>,
}

impl VariantInfo {
    /// Variant whose only format is the strategy's input format
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        strategy: Box<dyn AggregationStrategy>,
    ) -> Self {
        let format = strategy.input_format();
        Self {
            id: id.into().to_lowercase(),
            name: name.into(),
            default_format: format,
            allowed_formats: vec![format],
            strategy,
        }
    }

    /// Whether `format` can be fed to this variant
    pub fn allows(&self, format: DatasetFormat) -> bool {
        self.allowed_formats.contains(&format)
    }
}

impl fmt::Debug for VariantInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("default_format", &self.default_format)
            .field("allowed_formats", &self.allowed_formats)
            .finish_non_exhaustive()
    }
}

/// Ordered map of variant id to variant
#[derive(Debug, Default)]
pub struct VariantRegistry {
    variants: BTreeMap<String, VariantInfo>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the eight built-in variants `a` through `h`
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(VariantInfo::new("a", "Row-based CSV", Box::new(RowCsvStrategy)));
        registry.register(VariantInfo::new("b", "Arrow Vectorized", Box::new(ArrowKernelStrategy)));
        registry.register(VariantInfo::new("c", "Arrow IPC Columnar", Box::new(IpcColumnarStrategy)));
        registry.register(VariantInfo::new(
            "d",
            "Parallel Columnar",
            Box::new(ParallelColumnarStrategy),
        ));
        registry.register(VariantInfo::new("e", "DataFusion SQL", Box::new(DataFusionSqlStrategy)));
        registry.register(VariantInfo::new(
            "f",
            "Semi-Structured JSONL",
            Box::new(JsonLinesStrategy),
        ));
        registry.register(VariantInfo::new(
            "g",
            "Out-of-Core Streaming",
            Box::new(StreamingCsvStrategy::default()),
        ));
        registry.register(VariantInfo::new("h", "Binary Row Scan", Box::new(BinaryScanStrategy)));
        registry
    }

    /// Add or replace a variant, returning the one it replaced
    pub fn register(&mut self, info: VariantInfo) -> Option<VariantInfo> {
        self.variants.insert(info.id.clone(), info)
    }

    /// Look up a variant by id (case-insensitive)
    pub fn get(&self, id: &str) -> Option<&VariantInfo> {
        self.variants.get(&id.to_lowercase())
    }

    /// Registered ids in ascending order
    pub fn ids(&self) -> Vec<String> {
        self.variants.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantInfo> {
        self.variants.values()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
