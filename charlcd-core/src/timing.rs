//! Bus timing parameters
//!
//! All values are in microseconds. Defaults are the HD44780U datasheet
//! minimums rounded up.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::screen::{DISPLAY_COLS, DISPLAY_ROWS};

/// Delays used while talking to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Timing {
    /// Wait before the first write after power-on (datasheet: >40 ms)
    pub power_on_us: u32,
    /// Hold time for each half of the enable pulse
    pub enable_pulse_us: u32,
    /// Settle time after every full byte (command or data)
    pub settle_us: u32,
    /// Extra completion time after Clear Display
    pub clear_us: u32,
    /// Wait after the first 8-bit function set nibble (datasheet: >4.1 ms)
    pub init_first_us: u32,
    /// Wait after the remaining init nibbles (datasheet: >100 us)
    pub init_short_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self::HD44780
    }
}

impl Timing {
    /// Conservative HD44780 timing
    pub const HD44780: Self = Self {
        power_on_us: 50_000,
        enable_pulse_us: 500,
        settle_us: 2_000,
        clear_us: 2_000,
        init_first_us: 4_500,
        init_short_us: 150,
    };

    /// No delays at all (simulated panels and tests)
    pub const ZERO: Self = Self {
        power_on_us: 0,
        enable_pulse_us: 0,
        settle_us: 0,
        clear_us: 0,
        init_first_us: 0,
        init_short_us: 0,
    };

    /// Worst-case time to transmit one byte, in microseconds
    ///
    /// Two nibbles, each with two enable half-pulses, plus the settle time.
    pub const fn byte_time_us(&self) -> u32 {
        4 * self.enable_pulse_us + self.settle_us
    }

    /// Worst-case time to draw one full frame, in microseconds
    ///
    /// Clear Display plus, for each row, a cursor move and every cell.
    pub const fn frame_time_us(&self) -> u32 {
        let bytes = 1 + DISPLAY_ROWS as u32 * (1 + DISPLAY_COLS as u32);
        bytes * self.byte_time_us() + self.clear_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_meet_datasheet_minimums() {
        let t = Timing::default();
        assert!(t.power_on_us >= 40_000);
        assert!(t.init_first_us >= 4_100);
        assert!(t.init_short_us >= 100);
        assert!(t.clear_us >= 1_520);
    }

    #[test]
    fn test_byte_time() {
        assert_eq!(Timing::HD44780.byte_time_us(), 4_000);
        assert_eq!(Timing::ZERO.byte_time_us(), 0);
    }

    #[test]
    fn test_frame_time() {
        // 35 bytes at 4 ms each, plus the clear wait
        assert_eq!(Timing::HD44780.frame_time_us(), 142_000);
        assert_eq!(Timing::ZERO.frame_time_us(), 0);
    }
}
