//! Board-agnostic core logic for a 16x2 HD44780 character LCD
//!
//! This crate contains everything that does not depend on a particular bus
//! implementation or threading model:
//!
//! - HD44780 instruction set and PCF8574 pin mapping ([`hd44780`])
//! - Bus timing parameters ([`timing`])
//! - Power-on initialization state machine ([`init`])
//! - Two-line text buffers with scroll state ([`screen`])
//!
//! The render loop and device lifecycle live in `charlcd-driver`.

#![no_std]
#![deny(unsafe_code)]

pub mod hd44780;
pub mod init;
pub mod screen;
pub mod timing;

pub use hd44780::{Hd44780, Mode};
pub use init::{InitError, InitSequencer, InitState};
pub use screen::{
    Frame, InvalidLine, Line, LineBuffer, Screen, ScrollMode, DISPLAY_COLS, DISPLAY_ROWS,
    MAX_TEXT_LEN,
};
pub use timing::Timing;
