//! Vector trace generation.
//!
//! Unlike the other exports, traces are kept in memory: one slot per asset,
//! aligned with the collection index, so a trace can be shown or copied
//! later. A slot is `None` when that asset failed to trace.

use super::{ExportError, ExportJob, ExportReport, Services, targets};
use crate::assets::AssetCollection;
use crate::imaging::{Dimensions, Surface};

/// Retained traces, aligned by asset index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceSet {
    traces: Vec<Option<String>>,
}

impl TraceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }

    /// `true` when no asset has a trace.
    pub fn is_empty(&self) -> bool {
        self.traces.iter().all(Option::is_none)
    }

    /// Number of slots (equals the asset count of the generating run).
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.traces.get(index).and_then(|t| t.as_deref())
    }

    /// `(index, svg)` for every asset that traced.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.traces
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_deref().map(|svg| (i, svg)))
    }
}

/// Trace every asset at `target`.
pub fn generate_traces(
    collection: &AssetCollection,
    target: Dimensions,
    surface: &mut Surface,
    services: &Services,
) -> Result<(TraceSet, ExportReport), ExportError> {
    let assets = targets(collection, ExportJob::Traces.policy())?;
    let mut traces = Vec::with_capacity(assets.len());
    let mut report = ExportReport::default();

    for (index, asset) in assets {
        let traced = surface
            .rasterize(asset, target)
            .map_err(|e| e.to_string())
            .and_then(|pixels| services.tracer.trace(pixels).map_err(|e| e.to_string()));
        match traced {
            Ok(svg) => {
                report.produced += 1;
                traces.push(Some(svg));
            }
            Err(reason) => {
                report.skip(index, asset, reason);
                traces.push(None);
            }
        }
    }
    tracing::debug!(traced = report.produced, "traces generated");
    Ok((TraceSet { traces }, report))
}
