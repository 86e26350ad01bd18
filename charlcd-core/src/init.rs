//! Power-on initialization sequence
//!
//! Follows "Initializing by Instruction" from the HD44780U datasheet. After
//! power-on the controller may be in either interface mode, so it is first
//! forced into 8-bit mode with three bare `0x3` nibbles, then switched to
//! 4-bit mode before any full byte is sent.
//!
//! ```text
//! Detect → EightBit(0) → EightBit(1) → EightBit(2) → FourBit
//!        → FunctionSet → DisplayControl → ClearDisplay → Ready
//! ```
//!
//! Steps never repeat or reorder. A transport error aborts the sequence in
//! the state that failed.

use charlcd_hal::I2cBus;
use embedded_hal::delay::DelayNs;

use crate::hd44780::{
    Hd44780, Mode, DISPLAY_ON_NO_CURSOR, FUNCTION_SET_4BIT_2LINE, NIBBLE_4BIT, NIBBLE_8BIT,
};

/// Number of 8-bit function set nibbles
const EIGHT_BIT_REPEATS: u8 = 3;

/// Initialization states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitState {
    /// Controller state unknown; wait for power-on and probe the backpack
    Detect,
    /// Sending the n-th (0-based) 8-bit function set nibble
    EightBit(u8),
    /// Switching the interface to 4 bits
    FourBit,
    /// 4-bit, 2 lines, 5x8 font
    FunctionSet,
    /// Display on, cursor and blink off
    DisplayControl,
    /// Clear display and home the address counter
    ClearDisplay,
    /// Controller accepts normal commands
    Ready,
}

/// Transport failure during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InitError<E> {
    /// Step that was being executed
    pub state: InitState,
    /// Underlying bus error
    pub error: E,
}

/// Initialization state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitSequencer {
    state: InitState,
}

impl Default for InitSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl InitSequencer {
    /// Start from an unknown controller state
    pub const fn new() -> Self {
        Self {
            state: InitState::Detect,
        }
    }

    /// Current state
    pub fn state(&self) -> InitState {
        self.state
    }

    /// Check if the sequence completed
    pub fn is_ready(&self) -> bool {
        self.state == InitState::Ready
    }

    /// Execute the current step and move to the next state
    ///
    /// On error the state is left unchanged.
    pub fn step<B, D>(&mut self, lcd: &mut Hd44780<B, D>) -> Result<InitState, InitError<B::Error>>
    where
        B: I2cBus,
        D: DelayNs,
    {
        let state = self.state;
        let timing = *lcd.timing();
        let fail = |error| InitError { state, error };

        let next = match state {
            InitState::Detect => {
                lcd.delay_us(timing.power_on_us);
                lcd.probe().map_err(fail)?;
                InitState::EightBit(0)
            }
            InitState::EightBit(n) => {
                lcd.write_nibble(NIBBLE_8BIT, Mode::Command).map_err(fail)?;
                if n == 0 {
                    lcd.delay_us(timing.init_first_us);
                } else {
                    lcd.delay_us(timing.init_short_us);
                }
                if n + 1 < EIGHT_BIT_REPEATS {
                    InitState::EightBit(n + 1)
                } else {
                    InitState::FourBit
                }
            }
            InitState::FourBit => {
                lcd.write_nibble(NIBBLE_4BIT, Mode::Command).map_err(fail)?;
                lcd.delay_us(timing.init_short_us);
                InitState::FunctionSet
            }
            InitState::FunctionSet => {
                lcd.command(FUNCTION_SET_4BIT_2LINE).map_err(fail)?;
                InitState::DisplayControl
            }
            InitState::DisplayControl => {
                lcd.command(DISPLAY_ON_NO_CURSOR).map_err(fail)?;
                InitState::ClearDisplay
            }
            InitState::ClearDisplay => {
                lcd.clear().map_err(fail)?;
                InitState::Ready
            }
            InitState::Ready => InitState::Ready,
        };

        self.state = next;
        Ok(next)
    }

    /// Run the whole sequence from [`InitState::Detect`]
    pub fn run<B, D>(lcd: &mut Hd44780<B, D>) -> Result<(), InitError<B::Error>>
    where
        B: I2cBus,
        D: DelayNs,
    {
        let mut seq = Self::new();
        while !seq.is_ready() {
            seq.step(lcd)?;
        }
        Ok(())
    }
}
