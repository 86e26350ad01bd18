//! Display handle
//!
//! Owns the render thread and the shared two-line screen. Any number of
//! threads may call [`LcdDisplay::print`] and [`LcdDisplay::clear`] through a
//! shared reference; updates show up on the panel within one render tick.

use std::fmt::Debug;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use charlcd_core::screen::InvalidLine;
use charlcd_core::{Hd44780, InitSequencer, Line, Screen};
use charlcd_hal::I2cBus;
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::config::DisplayConfig;
use crate::render::{self, Shared};

/// Name of the background render thread
pub const RENDER_THREAD_NAME: &str = "charlcd-render";

/// 16x2 character LCD with a background render loop
///
/// Dropping the handle stops the render thread; use [`LcdDisplay::destroy`]
/// to also get the bus back.
pub struct LcdDisplay<B, D> {
    shared: Arc<Shared>,
    wake: Sender<()>,
    worker: Option<JoinHandle<Hd44780<B, D>>>,
}

impl<B, D> LcdDisplay<B, D>
where
    B: I2cBus + Send + 'static,
    B::Error: Debug,
    D: DelayNs + Send + 'static,
{
    /// Initialize the controller and start the render thread
    ///
    /// Initialization runs on the calling thread. If the backpack does not
    /// answer, the handle is still returned: text updates are kept and the
    /// render loop retries initialization once per tick.
    pub fn create(bus: B, delay: D, config: &DisplayConfig) -> Self {
        let mut lcd = Hd44780::new(bus, delay, config.address, config.timing);

        let ready = match InitSequencer::run(&mut lcd) {
            Ok(()) => {
                info!("LCD at {:#04x} initialized", config.address);
                true
            }
            Err(e) => {
                warn!(
                    "LCD at {:#04x} not responding ({:?} during {:?})",
                    config.address, e.error, e.state
                );
                false
            }
        };

        let shared = Arc::new(Shared::new(config.scroll, ready));
        let (wake, wake_rx) = mpsc::channel();
        let tick = config.tick_interval();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(RENDER_THREAD_NAME.into())
            .spawn(move || render::run(lcd, &worker_shared, wake_rx, tick));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("failed to start render thread: {}", e);
                shared.running.store(false, Ordering::Release);
                None
            }
        };

        Self {
            shared,
            wake,
            worker,
        }
    }
}

impl<B, D> LcdDisplay<B, D> {
    /// Show `text` on line 0 or 1
    ///
    /// Text is truncated to 127 bytes; anything wider than the panel scrolls.
    /// Other line numbers are ignored.
    pub fn print<T: AsRef<[u8]>>(&self, text: T, line: u8) {
        match Line::try_from(line) {
            Ok(line) => self.shared.screen().set_line(line, text.as_ref()),
            Err(InvalidLine(n)) => debug!("ignoring print to line {}", n),
        }
    }

    /// Blank both lines
    pub fn clear(&self) {
        self.shared.screen().clear();
    }

    /// Check if the controller answered its last initialization or draw
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// Check if the render thread is still running
    pub fn is_running(&self) -> bool {
        let alive = self.worker.as_ref().is_some_and(|w| !w.is_finished());
        alive && self.shared.running.load(Ordering::Acquire)
    }

    /// Wait until every `print` and `clear` made so far is on the panel
    ///
    /// Wakes the render loop instead of waiting for its next tick. Returns
    /// `false` if no frame carrying the updates was drawn within `timeout`,
    /// e.g. because the controller is not answering.
    pub fn flush(&self, timeout: Duration) -> bool {
        if !self.is_running() {
            return false;
        }

        let number = self.shared.next_frame_number();
        let _ = self.wake.send(());
        self.shared.wait_drawn(number, timeout)
    }

    /// Copy of the buffered text and scroll state
    pub fn snapshot(&self) -> Screen {
        self.shared.screen().clone()
    }

    /// Stop the render thread and return the bus and delay provider
    ///
    /// Blocks until the render loop has exited; no bus writes happen after
    /// this returns. Returns `None` if the render thread never started or
    /// panicked.
    pub fn destroy(mut self) -> Option<(B, D)> {
        self.stop().map(Hd44780::release)
    }

    fn stop(&mut self) -> Option<Hd44780<B, D>> {
        let worker = self.worker.take()?;

        self.shared.running.store(false, Ordering::Release);
        // Wake the loop out of its tick sleep; it may already be gone
        let _ = self.wake.send(());

        match worker.join() {
            Ok(lcd) => {
                debug!("render thread joined");
                Some(lcd)
            }
            Err(_) => {
                error!("render thread panicked");
                None
            }
        }
    }
}

impl<B, D> Drop for LcdDisplay<B, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{NoopDelay, SimulatedPanel};
    use charlcd_core::Timing;
    use std::sync::atomic::AtomicBool;
    use std::time::Instant;

    fn fast_config() -> DisplayConfig {
        DisplayConfig {
            tick_ms: 5,
            timing: Timing::ZERO,
            ..DisplayConfig::default()
        }
    }

    /// Delay that really sleeps, like a Linux host
    struct SleepDelay;

    impl DelayNs for SleepDelay {
        fn delay_ns(&mut self, ns: u32) {
            thread::sleep(Duration::from_nanos(ns.into()));
        }
    }

    /// Bus that panics once armed
    struct PanickingBus {
        armed: Arc<AtomicBool>,
    }

    impl I2cBus for PanickingBus {
        type Error = ();

        fn write(&mut self, _address: u8, _data: &[u8]) -> Result<(), ()> {
            if self.armed.load(Ordering::Acquire) {
                panic!("bus fault");
            }
            Ok(())
        }
    }

    #[test]
    fn test_invalid_line_is_ignored() {
        let panel = SimulatedPanel::new(0x27);
        let display = LcdDisplay::create(panel, NoopDelay, &fast_config());

        display.print("top", 0);
        display.print("nowhere", 2);
        display.print("also nowhere", 255);

        let screen = display.snapshot();
        assert_eq!(screen.line(Line::Top).text(), b"top");
        assert_eq!(screen.line(Line::Bottom).text(), b"");
        display.destroy();
    }

    #[test]
    fn test_print_accepts_bytes_and_strings() {
        let display = LcdDisplay::create(SimulatedPanel::new(0x27), NoopDelay, &fast_config());

        display.print(String::from("owned"), 0);
        display.print(&b"bytes"[..], 1);

        let screen = display.snapshot();
        assert_eq!(screen.line(Line::Top).text(), b"owned");
        assert_eq!(screen.line(Line::Bottom).text(), b"bytes");
    }

    #[test]
    fn test_destroy_returns_bus() {
        let panel = SimulatedPanel::new(0x27);
        let display = LcdDisplay::create(panel.clone(), NoopDelay, &fast_config());
        assert!(display.is_running());

        let (bus, _) = display.destroy().expect("render thread returns the bus");
        assert_eq!(bus.write_count(), panel.write_count());
    }

    #[test]
    fn test_drop_stops_thread() {
        let panel = SimulatedPanel::new(0x27);
        {
            let display = LcdDisplay::create(panel.clone(), NoopDelay, &fast_config());
            display.print("bye", 0);
            std::thread::sleep(Duration::from_millis(20));
        }

        let count = panel.write_count();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(panel.write_count(), count);
    }

    #[test]
    fn test_flush_waits_for_draw_with_real_timing() {
        let panel = SimulatedPanel::new(0x27);
        let display = LcdDisplay::create(panel.clone(), SleepDelay, &DisplayConfig::default());
        assert!(display.is_ready());

        display.print("hello", 0);
        display.print("world", 1);
        assert!(display.flush(Duration::from_secs(2)));

        assert_eq!(panel.text(Line::Top), "hello           ");
        assert_eq!(panel.text(Line::Bottom), "world           ");
        display.destroy();
    }

    #[test]
    fn test_flush_does_not_wait_for_tick() {
        let config = DisplayConfig {
            tick_ms: 10_000,
            ..fast_config()
        };
        let panel = SimulatedPanel::new(0x27);
        let display = LcdDisplay::create(panel.clone(), NoopDelay, &config);

        let started = Instant::now();
        display.print("now", 0);
        assert!(display.flush(Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(panel.text(Line::Top), "now             ");
        display.destroy();
    }

    #[test]
    fn test_flush_times_out_without_device() {
        let panel = SimulatedPanel::new(0x27);
        panel.set_failing(true);
        let display = LcdDisplay::create(panel, NoopDelay, &fast_config());

        display.print("nobody", 0);
        assert!(!display.flush(Duration::from_millis(50)));
        display.destroy();
    }

    #[test]
    fn test_panicked_render_thread_is_not_running() {
        let armed = Arc::new(AtomicBool::new(false));
        let bus = PanickingBus {
            armed: Arc::clone(&armed),
        };
        let display = LcdDisplay::create(bus, NoopDelay, &fast_config());
        assert!(display.is_running());

        armed.store(true, Ordering::Release);
        let deadline = Instant::now() + Duration::from_secs(2);
        while display.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        assert!(!display.is_running());
        assert!(!display.flush(Duration::from_millis(10)));
        assert!(display.destroy().is_none());
    }
}
