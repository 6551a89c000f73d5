// SDS Reader Module
// Fixed-width CSV row rendering

use std::io::{Cursor, Write};

use crate::error::{Result, SdsError};
use crate::header::MAX_CHANNELS;

/// Fractional digits of the timestamp column.
pub const TIMESTAMP_PRECISION: usize = 11;

/// Fractional digits of each channel column.
pub const VALUE_PRECISION: usize = 6;

/// Row widths of the original export, indexed by enabled channel count - 1.
pub const REFERENCE_ROW_WIDTHS: [usize; MAX_CHANNELS] = [27, 35, 43, 51];

// Large enough for any value the instrument can produce at these precisions.
const FIELD_SCRATCH: usize = 64;

/// How rows are laid out in the output buffer.
///
/// Every row of a conversion has the same width, so row `i` always starts at
/// `i * row_width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowLayout {
    /// Each field right-aligned in a fixed width. A value that does not fit
    /// its field fails the row with [`SdsError::RowRenderOverflow`].
    Aligned {
        timestamp_width: usize,
        value_width: usize,
    },
    /// Byte widths of the original export (27/35/43/51). The row text is
    /// left-aligned and clipped to leave room for the line feed, then padded
    /// with spaces. Three and four channel rows lose their last digits.
    Reference,
}

impl Default for RowLayout {
    fn default() -> Self {
        // Sign, decimal point, four integer digits and the fraction.
        RowLayout::Aligned {
            timestamp_width: 2 + 4 + TIMESTAMP_PRECISION,
            value_width: 2 + 4 + VALUE_PRECISION,
        }
    }
}

impl RowLayout {
    /// Byte width of one row for `channels` enabled channels.
    pub fn row_width(&self, channels: usize) -> Result<usize> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(SdsError::ChannelCountUnsupported(channels));
        }

        Ok(match *self {
            RowLayout::Aligned {
                timestamp_width,
                value_width,
            } => timestamp_width + channels * (value_width + 1) + 1,
            RowLayout::Reference => REFERENCE_ROW_WIDTHS[channels - 1],
        })
    }

    /// Render one row into `out`, which must be exactly `row_width` bytes.
    pub fn render_row(&self, out: &mut [u8], timestamp: f64, values: &[f64]) -> Result<()> {
        let expected = self.row_width(values.len())?;
        if out.len() != expected {
            return Err(SdsError::RowWidthMismatch {
                expected,
                actual: out.len(),
            });
        }

        match *self {
            RowLayout::Aligned {
                timestamp_width,
                value_width,
            } => render_aligned(out, timestamp, values, timestamp_width, value_width),
            RowLayout::Reference => {
                render_clipped(out, timestamp, values);
                Ok(())
            }
        }
    }
}

/// Render one row with the default layout.
pub fn render_row(out: &mut [u8], timestamp: f64, values: &[f64]) -> Result<()> {
    RowLayout::default().render_row(out, timestamp, values)
}

/// Format `value` with a leading `-` or space, like C's `% .Nf`.
fn format_signed(scratch: &mut [u8; FIELD_SCRATCH], value: f64, precision: usize) -> Option<usize> {
    let sign = if value.is_sign_negative() { '-' } else { ' ' };
    let mut cursor = Cursor::new(&mut scratch[..]);
    write!(cursor, "{}{:.*}", sign, precision, value.abs()).ok()?;
    Some(cursor.position() as usize)
}

/// Copy a formatted field right-aligned into `dst`.
fn put_aligned(dst: &mut [u8], value: f64, precision: usize) -> Result<()> {
    let mut scratch = [0u8; FIELD_SCRATCH];
    let width = dst.len();
    let overflow = || SdsError::RowRenderOverflow { value, width };

    let len = format_signed(&mut scratch, value, precision).ok_or_else(overflow)?;
    if len > width {
        return Err(overflow());
    }

    let pad = width - len;
    dst[..pad].fill(b' ');
    dst[pad..].copy_from_slice(&scratch[..len]);
    Ok(())
}

fn render_aligned(
    out: &mut [u8],
    timestamp: f64,
    values: &[f64],
    timestamp_width: usize,
    value_width: usize,
) -> Result<()> {
    let (ts_field, mut rest) = out.split_at_mut(timestamp_width);
    put_aligned(ts_field, timestamp, TIMESTAMP_PRECISION)?;

    for &value in values {
        let (field, tail) = std::mem::take(&mut rest).split_at_mut(value_width + 1);
        field[0] = b',';
        put_aligned(&mut field[1..], value, VALUE_PRECISION)?;
        rest = tail;
    }

    rest[0] = b'\n';
    Ok(())
}

fn render_clipped(out: &mut [u8], timestamp: f64, values: &[f64]) {
    let (line, newline) = out.split_at_mut(out.len() - 1);
    let mut scratch = [0u8; FIELD_SCRATCH];
    let mut pos = 0;

    let mut push = |bytes: &[u8], pos: &mut usize| {
        let n = bytes.len().min(line.len() - *pos);
        line[*pos..*pos + n].copy_from_slice(&bytes[..n]);
        *pos += n;
    };

    // An oversized field is clipped like any other text.
    let len = format_signed(&mut scratch, timestamp, TIMESTAMP_PRECISION).unwrap_or(FIELD_SCRATCH);
    push(&scratch[..len], &mut pos);
    for &value in values {
        push(b",", &mut pos);
        let len = format_signed(&mut scratch, value, VALUE_PRECISION).unwrap_or(FIELD_SCRATCH);
        push(&scratch[..len], &mut pos);
    }

    line[pos..].fill(b' ');
    newline[0] = b'\n';
}
