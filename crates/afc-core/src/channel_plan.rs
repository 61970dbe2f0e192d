//! 6 GHz band plan
//!
//! Global operating classes for the 5925-7125 MHz band and the channel
//! centre/bandwidth arithmetic shared by the solver and the response.
//!
//! ```rust
//! use afc_core::channel_plan::Channel;
//!
//! let ch = Channel::new(131, 5).unwrap();
//! assert_eq!(ch.center_mhz, 5975.0);
//! assert_eq!(ch.bandwidth_mhz, 20.0);
//! ```

use serde::{Deserialize, Serialize};

/// Lower edge of the 6 GHz band in MHz
pub const BAND_START_MHZ: f64 = 5925.0;
/// Upper edge of the 6 GHz band in MHz
pub const BAND_STOP_MHZ: f64 = 7125.0;

/// Closed-open frequency interval in MHz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub low_mhz: f64,
    pub high_mhz: f64,
}

impl FrequencyRange {
    pub fn new(low_mhz: f64, high_mhz: f64) -> Self {
        Self { low_mhz, high_mhz }
    }

    /// Range centred on `center_mhz` with the given width
    pub fn centered(center_mhz: f64, width_mhz: f64) -> Self {
        Self::new(center_mhz - width_mhz / 2.0, center_mhz + width_mhz / 2.0)
    }

    pub fn width_mhz(&self) -> f64 {
        self.high_mhz - self.low_mhz
    }

    pub fn center_mhz(&self) -> f64 {
        0.5 * (self.low_mhz + self.high_mhz)
    }

    pub fn is_valid(&self) -> bool {
        self.low_mhz.is_finite() && self.high_mhz.is_finite() && self.high_mhz > self.low_mhz
    }

    /// Width of the intersection in MHz (0 when disjoint)
    pub fn overlap_mhz(&self, other: &FrequencyRange) -> f64 {
        (self.high_mhz.min(other.high_mhz) - self.low_mhz.max(other.low_mhz)).max(0.0)
    }

    /// Strictly positive overlap
    pub fn overlaps(&self, other: &FrequencyRange) -> bool {
        self.overlap_mhz(other) > 0.0
    }

    /// Smallest range covering both
    pub fn union(&self, other: &FrequencyRange) -> FrequencyRange {
        FrequencyRange::new(self.low_mhz.min(other.low_mhz), self.high_mhz.max(other.high_mhz))
    }

    /// Split into consecutive 1 MHz slices, aligned to integer MHz
    pub fn unit_slices(&self) -> Vec<FrequencyRange> {
        let start = self.low_mhz.floor() as i64;
        let stop = self.high_mhz.ceil() as i64;
        (start..stop)
            .map(|f| FrequencyRange::new(f as f64, (f + 1) as f64))
            .filter(|s| s.overlaps(self))
            .collect()
    }
}

/// A channel of a global operating class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub op_class: u8,
    pub index: u8,
    pub center_mhz: f64,
    pub bandwidth_mhz: f64,
}

impl Channel {
    /// Build a channel if `index` belongs to `op_class`
    pub fn new(op_class: u8, index: u8) -> Option<Self> {
        if !channel_indices(op_class).contains(&index) {
            return None;
        }
        let bandwidth_mhz = channel_width_mhz(op_class)?;
        let center_mhz = if op_class == 136 {
            5935.0
        } else {
            5950.0 + 5.0 * index as f64
        };
        Some(Self {
            op_class,
            index,
            center_mhz,
            bandwidth_mhz,
        })
    }

    pub fn range(&self) -> FrequencyRange {
        FrequencyRange::centered(self.center_mhz, self.bandwidth_mhz)
    }

    /// Every channel of an operating class
    pub fn all_in_class(op_class: u8) -> Vec<Channel> {
        channel_indices(op_class)
            .into_iter()
            .filter_map(|idx| Channel::new(op_class, idx))
            .collect()
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "class {} ch {}", self.op_class, self.index)
    }
}

/// Channel width for a global operating class
pub fn channel_width_mhz(op_class: u8) -> Option<f64> {
    match op_class {
        131 | 136 => Some(20.0),
        132 => Some(40.0),
        133 => Some(80.0),
        134 => Some(160.0),
        137 => Some(320.0),
        _ => None,
    }
}

/// Channel indices defined for a global operating class
pub fn channel_indices(op_class: u8) -> Vec<u8> {
    let (first, step, last) = match op_class {
        131 => (1u8, 4u8, 233u8),
        132 => (3, 8, 227),
        133 => (7, 16, 215),
        134 => (15, 32, 207),
        136 => return vec![2],
        137 => (31, 32, 191),
        _ => return Vec::new(),
    };
    (first..=last).step_by(step as usize).collect()
}
