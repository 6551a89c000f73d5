// SDS Reader Module
// Linear code-to-volts and index-to-time mapping for a capture

use crate::header::{CaptureDescription, MAX_CHANNELS};

/// 8-bit code steps spanning one vertical division on the SDS1000X-E.
pub const CODES_PER_DIVISION: f64 = 25.0;

/// Horizontal divisions on screen; the trigger sits at the centre.
pub const HORIZONTAL_DIVISIONS: f64 = 14.0;

/// Mid-scale ADC code, rendered as 0 V.
pub const CODE_ZERO: i32 = 128;

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct ScalingModel {
    /// Volts per code step for each channel.
    pub channel_scale: [f64; MAX_CHANNELS],
    /// Time of the sample before the first one (pre-trigger span).
    pub time_offset: f64,
    /// Seconds between samples.
    pub time_step: f64,
}

impl ScalingModel {
    /// Derive the scaling for a capture. Never fails: a zero sample rate or
    /// divider propagates as `inf`/`NaN`.
    pub fn build(desc: &CaptureDescription, codes_per_division: f64) -> Self {
        let mut channel_scale = [0.0; MAX_CHANNELS];
        for (scale, vdiv) in channel_scale
            .iter_mut()
            .zip(desc.channel_volts_per_division.iter())
        {
            *scale = vdiv.base_value() / codes_per_division;
        }

        // Time/div and sample rate are stored in base units already.
        ScalingModel {
            channel_scale,
            time_offset: -(desc.time_per_division.value * HORIZONTAL_DIVISIONS / 2.0),
            time_step: 1.0 / desc.sample_rate.value,
        }
    }

    /// Timestamp of sample `index`.
    #[inline]
    pub fn timestamp(&self, index: usize) -> f64 {
        self.time_offset + (index + 1) as f64 * self.time_step
    }

    /// Physical value of raw code `code` on channel `channel`.
    ///
    /// The channel's vertical offset is deliberately not applied.
    #[inline]
    pub fn value(&self, channel: usize, code: u8) -> f64 {
        (code as i32 - CODE_ZERO) as f64 * self.channel_scale[channel]
    }
}
