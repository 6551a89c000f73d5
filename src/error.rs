// SDS Reader Module
// Error types shared by the decoder, renderer and conversion engine

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Input too small: expected at least {required} bytes, got {actual}")]
    InputTooSmall { required: usize, actual: usize },

    #[error("No analog channels enabled in capture")]
    NoChannelsEnabled,

    #[error("Truncated channel data: need {required} bytes, got {actual}")]
    TruncatedChannelData { required: usize, actual: usize },

    #[error("Unsupported channel count: {0} (expected 1 to 4)")]
    ChannelCountUnsupported(usize),

    #[error("Channel index {0} out of range (expected 0 to 3)")]
    ChannelIndexOutOfRange(usize),

    #[error("Row buffer is {actual} bytes, layout requires {expected}")]
    RowWidthMismatch { expected: usize, actual: usize },

    #[error("Value {value} does not fit a {width}-byte field")]
    RowRenderOverflow { value: f64, width: usize },

    #[error("Output buffer is {actual} bytes, conversion requires {expected}")]
    OutputSizeMismatch { expected: usize, actual: usize },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SdsError>;
