//! HD44780 protocol encoder over a PCF8574 backpack
//!
//! The controller runs in 4-bit mode: every byte goes out as two nibbles on
//! D4..D7, each latched by an enable pulse. The PCF8574 maps its eight GPIOs
//! onto the controller pins as follows:
//!
//! ```text
//! ┌────┬────┬────┬────┬────┬────┬────┬────┐
//! │ P7 │ P6 │ P5 │ P4 │ P3 │ P2 │ P1 │ P0 │
//! │ D7 │ D6 │ D5 │ D4 │ BL │ EN │ RW │ RS │
//! └────┴────┴────┴────┴────┴────┴────┴────┘
//! ```
//!
//! Every step of an enable pulse is one single-byte bus write.

use charlcd_hal::I2cBus;
use embedded_hal::delay::DelayNs;

use crate::screen::{Frame, Line, DISPLAY_COLS};
use crate::timing::Timing;

/// PCF8574 pin masks
pub mod pins {
    /// Register select (0 = instruction, 1 = data)
    pub const RS: u8 = 0x01;
    /// Read/write (0 = write); never set by this driver
    pub const RW: u8 = 0x02;
    /// Enable (latch on falling edge)
    pub const EN: u8 = 0x04;
    /// Backlight transistor
    pub const BACKLIGHT: u8 = 0x08;
    /// D4..D7
    pub const DATA: u8 = 0xF0;
}

/// HD44780 instructions (datasheet table 6)
pub mod cmd {
    pub const CLEAR_DISPLAY: u8 = 0x01;
    pub const RETURN_HOME: u8 = 0x02;
    pub const ENTRY_MODE_SET: u8 = 0x04;
    pub const DISPLAY_CONTROL: u8 = 0x08;
    pub const CURSOR_SHIFT: u8 = 0x10;
    pub const FUNCTION_SET: u8 = 0x20;
    pub const SET_CGRAM_ADDR: u8 = 0x40;
    pub const SET_DDRAM_ADDR: u8 = 0x80;
}

/// Instruction flag bits
pub mod flags {
    // Entry mode set
    pub const ENTRY_INCREMENT: u8 = 0x02;
    pub const ENTRY_SHIFT: u8 = 0x01;

    // Display control
    pub const DISPLAY_ON: u8 = 0x04;
    pub const CURSOR_ON: u8 = 0x02;
    pub const BLINK_ON: u8 = 0x01;

    // Cursor/display shift
    pub const DISPLAY_MOVE: u8 = 0x08;
    pub const MOVE_RIGHT: u8 = 0x04;

    // Function set
    pub const EIGHT_BIT: u8 = 0x10;
    pub const TWO_LINE: u8 = 0x08;
    pub const FONT_5X10: u8 = 0x04;
}

/// Nibble sent three times to force 8-bit mode during init
pub const NIBBLE_8BIT: u8 = 0x3;

/// Nibble that switches the interface to 4-bit mode
pub const NIBBLE_4BIT: u8 = 0x2;

/// Register select for a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Instruction register
    Command,
    /// Data register (character codes)
    Data,
}

impl Mode {
    const fn rs(self) -> u8 {
        match self {
            Mode::Command => 0,
            Mode::Data => pins::RS,
        }
    }
}

/// Function Set instruction
pub const fn function_set(eight_bit: bool, two_line: bool, font_5x10: bool) -> u8 {
    let mut value = cmd::FUNCTION_SET;
    if eight_bit {
        value |= flags::EIGHT_BIT;
    }
    if two_line {
        value |= flags::TWO_LINE;
    }
    if font_5x10 {
        value |= flags::FONT_5X10;
    }
    value
}

/// Display On/Off Control instruction
pub const fn display_control(display: bool, cursor: bool, blink: bool) -> u8 {
    let mut value = cmd::DISPLAY_CONTROL;
    if display {
        value |= flags::DISPLAY_ON;
    }
    if cursor {
        value |= flags::CURSOR_ON;
    }
    if blink {
        value |= flags::BLINK_ON;
    }
    value
}

/// Set DDRAM Address instruction (7-bit address)
pub const fn set_ddram_address(address: u8) -> u8 {
    cmd::SET_DDRAM_ADDR | (address & 0x7F)
}

/// 4-bit, 2-line, 5x8 font
pub const FUNCTION_SET_4BIT_2LINE: u8 = function_set(false, true, false);

/// Display on, cursor off, blink off
pub const DISPLAY_ON_NO_CURSOR: u8 = display_control(true, false, false);

/// PCF8574 status byte carrying `nibble` on D4..D7 with enable low
pub const fn control_byte(nibble: u8, mode: Mode) -> u8 {
    ((nibble << 4) & pins::DATA) | mode.rs() | pins::BACKLIGHT
}

/// The three bus writes that latch one nibble: setup, enable high, enable low
pub const fn nibble_frames(nibble: u8, mode: Mode) -> [u8; 3] {
    let base = control_byte(nibble, mode);
    [base, base | pins::EN, base]
}

/// HD44780 controller behind a PCF8574 backpack
pub struct Hd44780<B, D> {
    bus: B,
    delay: D,
    address: u8,
    timing: Timing,
}

impl<B, D> Hd44780<B, D> {
    /// Create a driver for the backpack at `address`
    ///
    /// Nothing is sent until [`crate::init::InitSequencer`] runs.
    pub fn new(bus: B, delay: D, address: u8, timing: Timing) -> Self {
        Self {
            bus,
            delay,
            address,
            timing,
        }
    }

    /// 7-bit bus address of the backpack
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Timing in use
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Give back the bus and delay provider
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}

impl<B, D> Hd44780<B, D>
where
    B: I2cBus,
    D: DelayNs,
{
    /// Block for `us` microseconds
    pub fn delay_us(&mut self, us: u32) {
        if us > 0 {
            self.delay.delay_us(us);
        }
    }

    /// Write the backlight byte with every control line low
    ///
    /// Nothing is latched; a NACK here means no backpack answers at the
    /// address.
    pub fn probe(&mut self) -> Result<(), B::Error> {
        self.bus.write(self.address, &[pins::BACKLIGHT])
    }

    /// Latch a single nibble (low 4 bits of `nibble`)
    pub fn write_nibble(&mut self, nibble: u8, mode: Mode) -> Result<(), B::Error> {
        let [setup, high, low] = nibble_frames(nibble, mode);
        let pulse = self.timing.enable_pulse_us;

        self.bus.write(self.address, &[setup])?;
        self.bus.write(self.address, &[high])?;
        self.delay_us(pulse);
        self.bus.write(self.address, &[low])?;
        self.delay_us(pulse);
        Ok(())
    }

    /// Send a full byte as two nibbles, high nibble first, then settle
    pub fn send_byte(&mut self, value: u8, mode: Mode) -> Result<(), B::Error> {
        self.write_nibble(value >> 4, mode)?;
        self.write_nibble(value & 0x0F, mode)?;
        let settle = self.timing.settle_us;
        self.delay_us(settle);
        Ok(())
    }

    /// Send an instruction
    pub fn command(&mut self, value: u8) -> Result<(), B::Error> {
        self.send_byte(value, Mode::Command)
    }

    /// Send a character code
    pub fn data(&mut self, value: u8) -> Result<(), B::Error> {
        self.send_byte(value, Mode::Data)
    }

    /// Clear the whole display and wait for the controller to finish
    pub fn clear(&mut self) -> Result<(), B::Error> {
        self.command(cmd::CLEAR_DISPLAY)?;
        let wait = self.timing.clear_us;
        self.delay_us(wait);
        Ok(())
    }

    /// Move the cursor to the first cell of `line`
    pub fn set_cursor(&mut self, line: Line) -> Result<(), B::Error> {
        self.command(line.ddram_address())
    }

    /// Position the cursor on `line` and write one full row of characters
    pub fn write_row(&mut self, line: Line, row: &[u8; DISPLAY_COLS]) -> Result<(), B::Error> {
        self.set_cursor(line)?;
        for &c in row {
            self.data(c)?;
        }
        Ok(())
    }

    /// Push one rendered frame to the panel
    pub fn draw(&mut self, frame: &Frame) -> Result<(), B::Error> {
        if frame.clear {
            self.clear()?;
        }
        for line in Line::ALL {
            self.write_row(line, frame.row(line))?;
        }
        Ok(())
    }
}
