//! Simulated panel
//!
//! An in-memory HD44780 sitting behind a PCF8574, driven through the same
//! [`I2cBus`] the hardware uses. It decodes enable pulses back into
//! instructions and character writes, so tests and the CLI `--simulate` mode
//! can see exactly what a real panel would show.
//!
//! Clones share state: hand one clone to the display driver and keep another
//! to inspect the panel.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use charlcd_core::hd44780::{cmd, flags, pins};
use charlcd_core::{Line, DISPLAY_COLS};
use charlcd_hal::I2cBus;
use embedded_hal::delay::DelayNs;
use thiserror::Error;

/// DDRAM size in bytes (7-bit address space)
const DDRAM_SIZE: usize = 0x80;

/// Bus errors raised by the simulated panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// Nothing acknowledged the address
    #[error("no acknowledge from {0:#04x}")]
    Nack(u8),
}

#[derive(Debug)]
struct PanelState {
    address: u8,
    failing: bool,
    /// Last PCF8574 output byte
    last: u8,
    eight_bit: bool,
    pending_high: Option<u8>,
    ddram: [u8; DDRAM_SIZE],
    cursor: u8,
    display_on: bool,
    clears: usize,
    writes: Vec<u8>,
    latched: Vec<(u8, bool)>,
    /// Rows whose last visible cell was just written
    drawn: Vec<(Line, [u8; DISPLAY_COLS])>,
}

impl PanelState {
    fn new(address: u8) -> Self {
        Self {
            address,
            failing: false,
            last: 0,
            // Power-on reset leaves the controller in 8-bit mode
            eight_bit: true,
            pending_high: None,
            ddram: [b' '; DDRAM_SIZE],
            cursor: 0,
            display_on: false,
            clears: 0,
            writes: Vec::new(),
            latched: Vec::new(),
            drawn: Vec::new(),
        }
    }

    fn output(&mut self, byte: u8) {
        self.writes.push(byte);
        let falling = self.last & pins::EN != 0 && byte & pins::EN == 0;
        if falling {
            self.latch(self.last >> 4, self.last & pins::RS != 0);
        }
        self.last = byte;
    }

    fn latch(&mut self, nibble: u8, rs: bool) {
        self.latched.push((nibble, rs));

        if self.eight_bit {
            // D0..D3 are not wired; they read as zero
            self.execute(nibble << 4, rs);
            return;
        }

        match self.pending_high.take() {
            Some(high) => self.execute((high << 4) | nibble, rs),
            None => self.pending_high = Some(nibble),
        }
    }

    fn execute(&mut self, value: u8, rs: bool) {
        if rs {
            let cell = self.cursor;
            self.ddram[cell as usize] = value;
            self.cursor = (cell + 1) & 0x7F;

            for line in Line::ALL {
                if cell == line.ddram_offset() + DISPLAY_COLS as u8 - 1 {
                    let row = self.row(line);
                    self.drawn.push((line, row));
                }
            }
            return;
        }

        if value & cmd::SET_DDRAM_ADDR != 0 {
            self.cursor = value & 0x7F;
        } else if value & cmd::SET_CGRAM_ADDR != 0 {
            // Custom glyphs are not modelled
        } else if value & cmd::FUNCTION_SET != 0 {
            self.eight_bit = value & flags::EIGHT_BIT != 0;
            self.pending_high = None;
        } else if value & cmd::CURSOR_SHIFT != 0 {
            // Shifts are not used by the driver
        } else if value & cmd::DISPLAY_CONTROL != 0 {
            self.display_on = value & flags::DISPLAY_ON != 0;
        } else if value & cmd::ENTRY_MODE_SET != 0 {
            // Increment without shift is assumed
        } else if value & cmd::RETURN_HOME != 0 {
            self.cursor = 0;
        } else if value == cmd::CLEAR_DISPLAY {
            self.ddram = [b' '; DDRAM_SIZE];
            self.cursor = 0;
            self.clears += 1;
        }
    }

    fn row(&self, line: Line) -> [u8; DISPLAY_COLS] {
        let start = line.ddram_offset() as usize;
        let mut row = [b' '; DISPLAY_COLS];
        row.copy_from_slice(&self.ddram[start..start + DISPLAY_COLS]);
        row
    }
}

/// Simulated HD44780 panel behind a PCF8574 backpack
#[derive(Debug, Clone)]
pub struct SimulatedPanel {
    state: Arc<Mutex<PanelState>>,
}

impl SimulatedPanel {
    /// Panel answering at `address`
    pub fn new(address: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(PanelState::new(address))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every following write fail (device unplugged)
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Characters currently shown on `line`
    pub fn row(&self, line: Line) -> [u8; DISPLAY_COLS] {
        self.lock().row(line)
    }

    /// `line` as text (non-ASCII shown as `?`)
    pub fn text(&self, line: Line) -> String {
        self.row(line)
            .iter()
            .map(|&b| if b.is_ascii() && !b.is_ascii_control() { b as char } else { '?' })
            .collect()
    }

    /// Check if the controller is in 4-bit interface mode
    pub fn is_four_bit(&self) -> bool {
        !self.lock().eight_bit
    }

    /// Check if Display Control turned the display on
    pub fn is_display_on(&self) -> bool {
        self.lock().display_on
    }

    /// Number of Clear Display instructions executed
    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }

    /// Every byte written to the expander so far
    pub fn writes(&self) -> Vec<u8> {
        self.lock().writes.clone()
    }

    /// Number of bytes written to the expander so far
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Every nibble latched by an enable pulse, with its RS level
    pub fn latched(&self) -> Vec<(u8, bool)> {
        self.lock().latched.clone()
    }

    /// Rows drawn on `line` so far, oldest first
    ///
    /// A row counts as drawn when its last visible cell is written.
    pub fn drawn(&self, line: Line) -> Vec<String> {
        self.lock()
            .drawn
            .iter()
            .filter(|(l, _)| *l == line)
            .map(|(_, row)| String::from_utf8_lossy(row).into_owned())
            .collect()
    }

    /// Forget recorded writes, latches and drawn rows (panel contents are kept)
    pub fn reset_log(&self) {
        let mut state = self.lock();
        state.writes.clear();
        state.latched.clear();
        state.drawn.clear();
    }
}

impl I2cBus for SimulatedPanel {
    type Error = SimError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.lock();
        if state.failing || address != state.address {
            return Err(SimError::Nack(address));
        }
        for &byte in data {
            state.output(byte);
        }
        Ok(())
    }
}

impl fmt::Display for SimulatedPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌{}┐", "─".repeat(DISPLAY_COLS))?;
        for line in Line::ALL {
            writeln!(f, "│{}│", self.text(line))?;
        }
        write!(f, "└{}┘", "─".repeat(DISPLAY_COLS))
    }
}

/// Delay provider that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
