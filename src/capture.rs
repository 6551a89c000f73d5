// SDS Reader Module
// Owned capture: loaded bytes plus decoded header, and the CSV export path

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::convert::{convert, DEFAULT_WORKERS};
use crate::error::Result;
use crate::header::{ChannelBlock, CaptureDescription};
use crate::render::RowLayout;
use crate::scaling::{ScalingModel, CODES_PER_DIVISION};

/// Settings for a conversion run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvertOptions {
    pub worker_count: usize,
    pub codes_per_division: f64,
    pub layout: RowLayout,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            worker_count: DEFAULT_WORKERS,
            codes_per_division: CODES_PER_DIVISION,
            layout: RowLayout::default(),
        }
    }
}

impl ConvertOptions {
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_codes_per_division(mut self, codes_per_division: f64) -> Self {
        self.codes_per_division = codes_per_division;
        self
    }

    pub fn with_layout(mut self, layout: RowLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// A loaded capture file.
#[derive(Debug)]
pub struct Capture {
    bytes: Vec<u8>,
    description: CaptureDescription,
}

impl Capture {
    /// Decode a capture held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let description = CaptureDescription::decode(&bytes)?;
        Ok(Capture { bytes, description })
    }

    /// Load and decode a capture file.
    pub fn load_file<P: AsRef<Path>>(input_file: P) -> Result<Self> {
        Self::from_bytes(fs::read(input_file)?)
    }

    pub fn description(&self) -> &CaptureDescription {
        &self.description
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn scaling(&self, codes_per_division: f64) -> ScalingModel {
        ScalingModel::build(&self.description, codes_per_division)
    }

    pub fn channel_blocks(&self) -> Result<Vec<ChannelBlock<'_>>> {
        self.description.channel_blocks(&self.bytes)
    }

    /// Size in bytes of the CSV this capture converts to.
    pub fn csv_len(&self, layout: &RowLayout) -> Result<usize> {
        let row_width = layout.row_width(self.description.enabled_channel_count())?;
        Ok(self.description.sample_count as usize * row_width)
    }

    /// Convert the whole capture to CSV in memory.
    pub fn to_csv(&self, options: &ConvertOptions) -> Result<Vec<u8>> {
        let model = self.scaling(options.codes_per_division);
        let blocks = self.channel_blocks()?;
        let mut out = vec![0u8; self.csv_len(&options.layout)?];

        let start = Instant::now();
        convert(&model, &blocks, &options.layout, &mut out, options.worker_count)?;
        info!(
            samples = self.description.sample_count,
            channels = blocks.len(),
            bytes = out.len(),
            elapsed = ?start.elapsed(),
            "CSV data export finished"
        );

        Ok(out)
    }

    /// Convert the capture and write it to `output_file`.
    ///
    /// The file is only created once conversion has succeeded.
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P, options: &ConvertOptions) -> Result<()> {
        let csv = self.to_csv(options)?;

        let start = Instant::now();
        let file = File::create(&output_file)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&csv)?;
        writer.flush()?;
        info!(
            path = %output_file.as_ref().display(),
            elapsed = ?start.elapsed(),
            "CSV data write finished"
        );

        Ok(())
    }
}
