// SDS Reader Module
// Unit and magnitude tables used by the SDS1000X-E "data with unit" records

use std::fmt;

/// Magnitude code of a value stored without SI prefix.
pub const MAGNITUDE_NONE: u32 = 8;

const MAGNITUDE_PREFIXES: [&str; 14] = [
    "y", "z", "a", "f", "p", "n", "u", "m", "", "k", "M", "G", "T", "P",
];

// Same ordering as MAGNITUDE_PREFIXES.
const UNIT_DIVIDERS: [f64; 14] = [
    1.0e24, 1.0e21, 1.0e18, 1.0e15, 1.0e12, 1.0e9, 1.0e6, 1.0e3, 1.0e0, 1.0e-3, 1.0e-6, 1.0e-9,
    1.0e-12, 1.0e-15,
];

const UNIT_NAMES: [&str; 23] = [
    "V", "A", "VV", "AA", "OU", "W", "SQRT_V", "SQRT_A", "INTEGRAL_V", "INTEGRAL_A", "DT_V",
    "DT_A", "DT_DIV", "Hz", "s", "PTS", "NULL", "dB", "dBV", "dBA", "VPP", "VDC", "dBM",
];

/// SI prefix for a magnitude code, or `""` for codes outside the table.
pub fn magnitude_prefix(code: u32) -> &'static str {
    MAGNITUDE_PREFIXES.get(code as usize).copied().unwrap_or("")
}

/// Instrument unit label for a unit code, or `""` for codes outside the table.
pub fn unit_name(code: u32) -> &'static str {
    UNIT_NAMES.get(code as usize).copied().unwrap_or("")
}

/// Divider that converts a prefixed value to its base unit.
///
/// A value of `500` with magnitude `m` (code 7) divides by `1e3` to give `0.5`.
/// Unknown codes return `1.0` so the value passes through unscaled.
pub fn unit_divider(code: u32) -> f64 {
    UNIT_DIVIDERS.get(code as usize).copied().unwrap_or(1.0)
}

/// A numeric header field together with its unit and magnitude codes.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub magnitude: u32,
    pub unit: u32,
}

impl Quantity {
    pub fn new(value: f64, magnitude: u32, unit: u32) -> Self {
        Quantity {
            value,
            magnitude,
            unit,
        }
    }

    /// Value converted to the base unit using the magnitude divider.
    pub fn base_value(&self) -> f64 {
        self.value / unit_divider(self.magnitude)
    }

    /// Unit label with prefix, e.g. `mV`. Empty when both codes are unknown.
    pub fn unit_label(&self) -> String {
        format!("{}{}", magnitude_prefix(self.magnitude), unit_name(self.unit))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} {}", self.value, self.unit_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_prefix() {
        assert_eq!(magnitude_prefix(0), "y");
        assert_eq!(magnitude_prefix(7), "m");
        assert_eq!(magnitude_prefix(MAGNITUDE_NONE), "");
        assert_eq!(magnitude_prefix(9), "k");
        assert_eq!(magnitude_prefix(13), "P");
        assert_eq!(magnitude_prefix(14), "");
        assert_eq!(magnitude_prefix(u32::MAX), "");
    }

    #[test]
    fn test_unit_name() {
        assert_eq!(unit_name(0), "V");
        assert_eq!(unit_name(13), "Hz");
        assert_eq!(unit_name(14), "s");
        assert_eq!(unit_name(22), "dBM");
        assert_eq!(unit_name(23), "");
    }

    #[test]
    fn test_unit_divider_matches_prefix_order() {
        assert_eq!(unit_divider(0), 1.0e24);
        assert_eq!(unit_divider(7), 1.0e3);
        assert_eq!(unit_divider(MAGNITUDE_NONE), 1.0);
        assert_eq!(unit_divider(10), 1.0e-6);
        assert_eq!(unit_divider(13), 1.0e-15);
        assert_eq!(unit_divider(99), 1.0);
    }

    #[test]
    fn test_quantity_display() {
        let vdiv = Quantity::new(500.0, 7, 0);
        assert_eq!(vdiv.to_string(), "500.000000 mV");
        assert_eq!(vdiv.base_value(), 0.5);

        let unknown = Quantity::new(1.5, 42, 99);
        assert_eq!(unknown.unit_label(), "");
        assert_eq!(unknown.base_value(), 1.5);
    }
}
