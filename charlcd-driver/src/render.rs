//! Background render loop
//!
//! The only code that touches the bus after [`crate::LcdDisplay::create`]
//! returns. Each tick takes a [`Frame`] snapshot under the screen lock, then
//! pushes it to the panel with the lock released, so callers never wait on
//! bus I/O.
//!
//! Frames are numbered as they are taken; the number of the last frame that
//! reached the panel is published so callers can wait for their update.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use charlcd_core::{Frame, Hd44780, InitSequencer, Screen, ScrollMode};
use charlcd_hal::I2cBus;
use embedded_hal::delay::DelayNs;
use log::{debug, info, trace, warn};

/// State shared between the display handle and the render thread
#[derive(Debug)]
pub(crate) struct Shared {
    screen: Mutex<Screen>,
    /// Cleared by the handle to stop the render loop
    pub(crate) running: AtomicBool,
    /// Controller initialized and last draw succeeded
    pub(crate) ready: AtomicBool,
    /// Frames taken so far; only bumped with the screen locked
    taken: AtomicU64,
    /// Number of the last frame written to the panel
    drawn: Mutex<u64>,
    drawn_changed: Condvar,
}

impl Shared {
    pub(crate) fn new(mode: ScrollMode, ready: bool) -> Self {
        Self {
            screen: Mutex::new(Screen::new(mode)),
            running: AtomicBool::new(true),
            ready: AtomicBool::new(ready),
            taken: AtomicU64::new(0),
            drawn: Mutex::new(0),
            drawn_changed: Condvar::new(),
        }
    }

    /// Lock the screen, recovering from a panicked holder
    pub(crate) fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> (u64, Frame) {
        let mut screen = self.screen();
        let frame = screen.next_frame();
        let number = self.taken.fetch_add(1, Ordering::AcqRel) + 1;
        (number, frame)
    }

    /// Number of the first frame that will include every update made so far
    pub(crate) fn next_frame_number(&self) -> u64 {
        let _screen = self.screen();
        self.taken.load(Ordering::Acquire) + 1
    }

    fn mark_drawn(&self, number: u64) {
        *self.drawn.lock().unwrap_or_else(PoisonError::into_inner) = number;
        self.drawn_changed.notify_all();
    }

    /// Block until frame `number` (or a later one) is on the panel
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub(crate) fn wait_drawn(&self, number: u64, timeout: Duration) -> bool {
        let drawn = self.drawn.lock().unwrap_or_else(PoisonError::into_inner);
        let (drawn, _) = self
            .drawn_changed
            .wait_timeout_while(drawn, timeout, |drawn| *drawn < number)
            .unwrap_or_else(PoisonError::into_inner);
        *drawn >= number
    }
}

/// Render until `running` is cleared, then hand the device back
pub(crate) fn run<B, D>(
    mut lcd: Hd44780<B, D>,
    shared: &Shared,
    wake: Receiver<()>,
    tick: Duration,
) -> Hd44780<B, D>
where
    B: I2cBus,
    B::Error: Debug,
    D: DelayNs,
{
    debug!("render loop started, tick {:?}", tick);

    while shared.running.load(Ordering::Acquire) {
        if !shared.ready.load(Ordering::Acquire) {
            reinitialize(&mut lcd, shared);
        }

        if shared.ready.load(Ordering::Acquire) {
            let (number, frame) = shared.snapshot();
            trace!("frame {}: clear={} {:?}", number, frame.clear, frame.rows);

            match lcd.draw(&frame) {
                Ok(()) => shared.mark_drawn(number),
                Err(e) => {
                    warn!("LCD write failed ({:?}); reinitializing on next tick", e);
                    shared.ready.store(false, Ordering::Release);
                }
            }
        }

        match wake.recv_timeout(tick) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("render loop stopped");
    lcd
}

/// One attempt at bringing an unresponsive controller back
fn reinitialize<B, D>(lcd: &mut Hd44780<B, D>, shared: &Shared)
where
    B: I2cBus,
    B::Error: Debug,
    D: DelayNs,
{
    match InitSequencer::run(lcd) {
        Ok(()) => {
            info!("LCD at {:#04x} initialized", lcd.address());
            // Controller RAM was cleared; redraw both lines from scratch
            shared.screen().invalidate();
            shared.ready.store(true, Ordering::Release);
        }
        Err(e) => {
            debug!("LCD init failed in {:?}: {:?}", e.state, e.error);
        }
    }
}
