// SDS Reader Module
// Decoder for the SDS1000X-E binary waveform header

use tracing::debug;

use crate::error::{Result, SdsError};
use crate::units::Quantity;

/// Size of the fixed header region. Files shorter than this are rejected.
pub const HEADER_SIZE: usize = 0x800;

/// Start of the first enabled channel's 8-bit sample block.
pub const ANALOG_DATA_OFFSET: usize = 0x800;

/// Number of analog channels the format can describe.
pub const MAX_CHANNELS: usize = 4;

const CHANNEL_ON_OFFSET: usize = 0x00;
const VOLT_DIV_OFFSET: usize = 0x10;
const VERT_OFFSET_OFFSET: usize = 0xb0;
const TIME_DIV_OFFSET: usize = 0x194;
const TIME_DELAY_OFFSET: usize = 0x1bc;
const WAVE_LENGTH_OFFSET: usize = 0x1e4;
const SAMPLE_RATE_OFFSET: usize = 0x1e8;

// A "data with unit" record: f64 value, u32 magnitude, u32 unit, then reserved
// unit words.
const DATA_WITH_UNIT_SIZE: usize = 0x28;
const MAGNITUDE_FIELD: usize = 0x08;
const UNIT_FIELD: usize = 0x0c;

/// Raw 8-bit samples of one enabled channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelBlock<'a> {
    /// Channel index, 0 for CH1.
    pub channel: usize,
    pub samples: &'a [u8],
}

/// Acquisition settings and channel block layout decoded from a capture.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct CaptureDescription {
    pub channel_enabled: [bool; MAX_CHANNELS],
    pub channel_volts_per_division: [Quantity; MAX_CHANNELS],
    /// Decoded for display only. Rendered values do not include it.
    pub channel_vertical_offset: [Quantity; MAX_CHANNELS],
    pub time_per_division: Quantity,
    pub time_delay: Quantity,
    pub sample_rate: Quantity,
    pub sample_count: u32,
    /// Byte offset of each enabled channel's block; `None` when disabled.
    pub channel_data_offset: [Option<usize>; MAX_CHANNELS],
}

impl CaptureDescription {
    /// Decode the header of `raw` and validate that every enabled channel
    /// block lies inside it.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_SIZE {
            return Err(SdsError::InputTooSmall {
                required: HEADER_SIZE,
                actual: raw.len(),
            });
        }

        let mut desc = CaptureDescription::default();

        for ch in 0..MAX_CHANNELS {
            desc.channel_enabled[ch] = read_i32(raw, CHANNEL_ON_OFFSET + 4 * ch)? != 0;
            desc.channel_volts_per_division[ch] =
                read_quantity(raw, VOLT_DIV_OFFSET + DATA_WITH_UNIT_SIZE * ch)?;
            desc.channel_vertical_offset[ch] =
                read_quantity(raw, VERT_OFFSET_OFFSET + DATA_WITH_UNIT_SIZE * ch)?;
        }

        desc.time_per_division = read_quantity(raw, TIME_DIV_OFFSET)?;
        desc.time_delay = read_quantity(raw, TIME_DELAY_OFFSET)?;
        desc.sample_count = read_u32(raw, WAVE_LENGTH_OFFSET)?;
        desc.sample_rate = read_quantity(raw, SAMPLE_RATE_OFFSET)?;

        if desc.enabled_channel_count() == 0 {
            return Err(SdsError::NoChannelsEnabled);
        }

        // Blocks follow each other in channel order; disabled channels take no space.
        let block_len = desc.sample_count as usize;
        let mut cursor = ANALOG_DATA_OFFSET;
        for ch in 0..MAX_CHANNELS {
            if desc.channel_enabled[ch] {
                desc.channel_data_offset[ch] = Some(cursor);
                cursor = cursor
                    .checked_add(block_len)
                    .ok_or_else(|| SdsError::TruncatedChannelData {
                        required: usize::MAX,
                        actual: raw.len(),
                    })?;
            }
        }

        if cursor > raw.len() {
            return Err(SdsError::TruncatedChannelData {
                required: cursor,
                actual: raw.len(),
            });
        }

        debug!(
            channels = desc.enabled_channel_count(),
            samples = desc.sample_count,
            sample_rate = desc.sample_rate.value,
            time_per_division = desc.time_per_division.value,
            "decoded capture header"
        );

        Ok(desc)
    }

    pub fn enabled_channel_count(&self) -> usize {
        self.channel_enabled.iter().filter(|&&on| on).count()
    }

    /// Indices (0-based) of enabled channels in channel order.
    pub fn enabled_channels(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_CHANNELS).filter(move |&ch| self.channel_enabled[ch])
    }

    /// Sample block of every enabled channel, in channel order.
    ///
    /// `raw` must be the buffer this description was decoded from; a shorter
    /// buffer is reported as truncated rather than indexed out of range.
    pub fn channel_blocks<'a>(&self, raw: &'a [u8]) -> Result<Vec<ChannelBlock<'a>>> {
        let len = self.sample_count as usize;
        self.channel_data_offset
            .iter()
            .enumerate()
            .filter_map(|(channel, offset)| offset.map(|start| (channel, start)))
            .map(|(channel, start)| {
                raw.get(start..start + len)
                    .map(|samples| ChannelBlock { channel, samples })
                    .ok_or_else(|| SdsError::TruncatedChannelData {
                        required: start + len,
                        actual: raw.len(),
                    })
            })
            .collect()
    }
}

/// Decode the header of a raw capture buffer.
pub fn decode(raw: &[u8]) -> Result<CaptureDescription> {
    CaptureDescription::decode(raw)
}

fn field<const N: usize>(raw: &[u8], offset: usize) -> Result<[u8; N]> {
    raw.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| SdsError::InputTooSmall {
            required: offset + N,
            actual: raw.len(),
        })
}

fn read_i32(raw: &[u8], offset: usize) -> Result<i32> {
    field(raw, offset).map(i32::from_le_bytes)
}

fn read_u32(raw: &[u8], offset: usize) -> Result<u32> {
    field(raw, offset).map(u32::from_le_bytes)
}

fn read_f64(raw: &[u8], offset: usize) -> Result<f64> {
    field(raw, offset).map(f64::from_le_bytes)
}

fn read_quantity(raw: &[u8], offset: usize) -> Result<Quantity> {
    Ok(Quantity {
        value: read_f64(raw, offset)?,
        magnitude: read_u32(raw, offset + MAGNITUDE_FIELD)?,
        unit: read_u32(raw, offset + UNIT_FIELD)?,
    })
}
