//! The conversion session.
//!
//! A [`Workspace`] owns everything one user session accumulates: the loaded
//! assets and their selection, the dimension edit state, the retained vector
//! traces, the chosen output base name and the last status message. Every
//! user action is one method call; exports borrow the external capabilities
//! through [`Services`] for the duration of the call only.
//!
//! Failed operations leave the workspace untouched, status message included.

use crate::assets::{AssetCollection, ImageAsset, LoadSummary, RawFile, SelectionError};
use crate::config::ConverterConfig;
use crate::dimensions::DimensionState;
use crate::export::bundle::export_bundle;
use crate::export::document::export_document;
use crate::export::raster::{export_bitmaps, export_screenshots};
use crate::export::sink::{ClipboardError, ClipboardWriter};
use crate::export::vector::{TraceSet, generate_traces};
use crate::export::{ExportError, ExportJob, ExportReport, Services};
use crate::imaging::{Dimensions, Quality, RasterFormat, Surface};
use crate::naming::base_name_or;

pub const COPIED_MESSAGE: &str = "SVG copied to clipboard!";

pub struct Workspace {
    config: ConverterConfig,
    collection: AssetCollection,
    dimensions: DimensionState,
    surface: Surface,
    traces: TraceSet,
    traces_visible: bool,
    file_name: String,
    message: Option<String>,
}

impl Workspace {
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            collection: AssetCollection::new(),
            dimensions: DimensionState::new(),
            surface: Surface::new(),
            traces: TraceSet::new(),
            traces_visible: false,
            file_name: String::new(),
            message: None,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn collection(&self) -> &AssetCollection {
        &self.collection
    }

    pub fn dimensions(&self) -> &DimensionState {
        &self.dimensions
    }

    pub fn selected(&self) -> Option<&ImageAsset> {
        self.collection.current()
    }

    pub fn traces(&self) -> &TraceSet {
        &self.traces
    }

    pub fn traces_visible(&self) -> bool {
        self.traces_visible
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Status line of the last successful operation.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // ---- selection ----

    /// Replace the collection with whatever decodes from `files`.
    ///
    /// If nothing decodes, the previous collection (and everything derived
    /// from it) is kept.
    pub fn load_files(&mut self, files: Vec<RawFile>, services: &Services) -> LoadSummary {
        let summary = self.collection.load(files, services.backend, services.heic);
        if summary.changed() {
            if let Some(first) = self.collection.current() {
                self.dimensions.select_asset(first);
            }
            self.traces.clear();
            self.traces_visible = false;
        }
        summary
    }

    pub fn select(&mut self, index: usize) -> Result<(), SelectionError> {
        let asset = self.collection.select(index)?;
        self.dimensions.select_asset(asset);
        Ok(())
    }

    /// Advance to the next asset, wrapping. No-op with fewer than two assets.
    pub fn next(&mut self) {
        if self.collection.len() < 2 {
            return;
        }
        if let Some(asset) = self.collection.next() {
            self.dimensions.select_asset(asset);
        }
    }

    /// Clicking the selected preview advances; clicking another selects it.
    pub fn preview_click(&mut self, index: usize) -> Result<(), SelectionError> {
        if self.collection.current_index() == Some(index) {
            self.next();
            Ok(())
        } else {
            self.select(index)
        }
    }

    // ---- dimensions ----

    /// Returns `false` when the input was rejected.
    pub fn edit_width(&mut self, input: &str) -> bool {
        self.dimensions.edit_width(input)
    }

    /// Returns `false` when the input was rejected.
    pub fn edit_height(&mut self, input: &str) -> bool {
        self.dimensions.edit_height(input)
    }

    pub fn set_keep_ratio(&mut self, enabled: bool) {
        self.dimensions.set_keep_ratio(enabled, self.collection.current());
    }

    pub fn apply_preset(&mut self, width: u32, height: u32) {
        self.dimensions.apply_preset(width, height);
    }

    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = name.into();
    }

    // ---- exports ----

    pub fn export_png(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        self.export_raster(RasterFormat::Png, services)
    }

    pub fn export_jpg(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        self.export_raster(RasterFormat::Jpeg, services)
    }

    pub fn export_ico(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        self.export_raster(RasterFormat::Ico, services)
    }

    fn export_raster(
        &mut self,
        format: RasterFormat,
        services: &Services,
    ) -> Result<ExportReport, ExportError> {
        let target = self.target()?;
        let base = base_name_or(&self.file_name, &self.config.file_name);
        let report = export_bitmaps(
            &self.collection,
            target,
            format,
            &base,
            self.quality(),
            &mut self.surface,
            services,
        )?;
        let job = match format {
            RasterFormat::Png => ExportJob::Png,
            RasterFormat::Jpeg => ExportJob::Jpeg,
            RasterFormat::Ico => ExportJob::Ico,
        };
        self.finish(job, &report);
        Ok(report)
    }

    pub fn export_screenshots(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        let report = export_screenshots(
            &self.collection,
            &self.config.screenshots,
            self.quality(),
            &mut self.surface,
            services,
        )?;
        self.finish(ExportJob::Screenshots, &report);
        Ok(report)
    }

    /// Trace every asset at the current target and show the result.
    pub fn generate_traces(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        let target = self.target()?;
        let (traces, report) =
            generate_traces(&self.collection, target, &mut self.surface, services)?;
        self.traces = traces;
        self.traces_visible = true;
        self.finish(ExportJob::Traces, &report);
        Ok(report)
    }

    /// Copy the trace of asset `index`. Returns `false` when it has none.
    pub fn copy_trace(
        &mut self,
        index: usize,
        clipboard: &dyn ClipboardWriter,
    ) -> Result<bool, ClipboardError> {
        let Some(svg) = self.traces.get(index) else {
            return Ok(false);
        };
        clipboard.write_text(svg)?;
        self.message = Some(COPIED_MESSAGE.to_string());
        Ok(true)
    }

    pub fn export_bundle(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        let report = export_bundle(
            &self.collection,
            &self.config.bundle,
            self.quality(),
            &mut self.surface,
            services,
        )?;
        self.finish(ExportJob::Bundle, &report);
        Ok(report)
    }

    pub fn export_document(&mut self, services: &Services) -> Result<ExportReport, ExportError> {
        let base = base_name_or(&self.file_name, &self.config.document.file_name);
        let report = export_document(
            &self.collection,
            &self.config.document,
            &base,
            self.quality(),
            &mut self.surface,
            services,
        )?;
        self.finish(ExportJob::Document, &report);
        Ok(report)
    }

    /// Current target size. Checks for assets first so an empty session
    /// reports `NoAssets` rather than a dimension problem.
    fn target(&self) -> Result<Dimensions, ExportError> {
        if self.collection.is_empty() {
            return Err(ExportError::NoAssets);
        }
        self.dimensions
            .target()
            .ok_or(ExportError::InvalidDimensions)
    }

    fn quality(&self) -> Quality {
        Quality::new(self.config.export.jpeg_quality)
    }

    fn finish(&mut self, job: ExportJob, report: &ExportReport) {
        if report.produced > 0 {
            self.message = Some(job.status_message().to_string());
        }
    }
}
