// src/lib.rs
// SDS Reader Library - Public API

//! # SDS Reader
//!
//! A Rust library for converting Siglent SDS1000X-E binary waveform captures
//! (the `.bin` file from the oscilloscope's web UI "Waveform Save") to CSV.
//!
//! ## Features
//!
//! - Decode the fixed binary header: enabled channels, volts/div, vertical
//!   offsets, time/div, sample rate and sample count
//! - Scale raw 8-bit codes to volts and sample indices to seconds
//! - Render fixed-width CSV rows in parallel into one pre-sized buffer
//! - Proper error handling, no partial output on failure
//!
//! ## Row layout
//!
//! The default layout is [`RowLayout::Aligned`]: every field is right-aligned
//! in a fixed width, giving rows of 31, 44, 57 or 70 bytes for one to four
//! channels. A value too wide for its field fails the conversion with
//! [`SdsError::RowRenderOverflow`] rather than being cut short.
//!
//! The original export used 27, 35, 43 and 51 byte rows, which clip the last
//! digits of three and four channel rows. Pick [`RowLayout::Reference`]
//! (`sds2csv convert --layout reference`) to reproduce that output byte for
//! byte.
//!
//! ```
//! use sds_reader::RowLayout;
//!
//! assert_eq!(RowLayout::default().row_width(4).unwrap(), 70);
//! assert_eq!(RowLayout::Reference.row_width(4).unwrap(), 51);
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use sds_reader::{Capture, ConvertOptions};
//!
//! let capture = Capture::load_file("usr_wf_data.bin").expect("Failed to load file");
//!
//! let desc = capture.description();
//! println!("Sample rate: {}", desc.sample_rate);
//! println!("Samples per channel: {}", desc.sample_count);
//!
//! // Export to CSV
//! capture
//!     .write_csv("csv_data.csv", &ConvertOptions::default())
//!     .expect("Failed to write CSV");
//! ```

mod capture;
mod convert;
mod error;
mod header;
mod render;
mod scaling;
mod units;

pub use capture::{Capture, ConvertOptions};
pub use convert::{convert, partition, DEFAULT_WORKERS};
pub use error::{Result, SdsError};
pub use header::{
    decode, CaptureDescription, ChannelBlock, ANALOG_DATA_OFFSET, HEADER_SIZE, MAX_CHANNELS,
};
pub use render::{render_row, RowLayout, REFERENCE_ROW_WIDTHS, TIMESTAMP_PRECISION, VALUE_PRECISION};
pub use scaling::{ScalingModel, CODES_PER_DIVISION, CODE_ZERO, HORIZONTAL_DIVISIONS};
pub use units::{magnitude_prefix, unit_divider, unit_name, Quantity, MAGNITUDE_NONE};
