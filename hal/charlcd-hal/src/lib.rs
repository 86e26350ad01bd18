//! charlcd Hardware Abstraction Layer
//!
//! This crate defines the transport the HD44780 driver talks through. The
//! driver only ever writes single PCF8574 status bytes, so the trait is a
//! single write method.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  charlcd-driver (render loop, handle)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  charlcd-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │ linux i2c-dev │
//! │  I2c impls    │       │ (feature)     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - I2C write operations

#![cfg_attr(not(feature = "linux"), no_std)]
#![deny(unsafe_code)]

pub mod i2c;
#[cfg(feature = "linux")]
pub mod linux;

// Re-export key items at crate root for convenience
pub use i2c::{EmbeddedHalBus, I2cBus};
