//! charlcd - drive a 16x2 character LCD from the shell
//!
//! Talks to an HD44780 on a PCF8574 I2C backpack through Linux `i2c-dev`,
//! or to an in-memory panel with `--simulate`.
//!
//! # Usage
//!
//! ```bash
//! # Two static lines
//! charlcd show "Living room" "21.4 C  45 %RH"
//!
//! # Let a long line scroll for ten seconds before exiting
//! charlcd show "Now playing" "Some Artist - A Rather Long Track Title" --hold 10
//!
//! # Tail a log onto the display, newest line at the bottom
//! tail -f /var/log/syslog | charlcd stream --interval 2000
//!
//! # Try it without hardware
//! charlcd --simulate show "hello" "world"
//! ```

mod config;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{info, warn};

use charlcd_driver::sim::{NoopDelay, SimulatedPanel};
use charlcd_driver::{DisplayConfig, LcdDisplay};
use charlcd_hal::linux::{self, Delay};

use config::AppConfig;

/// Drive a 16x2 HD44780 character LCD on a PCF8574 I2C backpack
#[derive(Debug, Parser)]
#[command(name = "charlcd")]
#[command(version)]
#[command(about = "Drive a 16x2 character LCD on a PCF8574 I2C backpack")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// I2C bus device, overrides the configured path
    #[arg(long, global = true)]
    bus: Option<PathBuf>,

    /// Backpack address, decimal or 0x-prefixed hex
    #[arg(short, long, global = true, value_parser = parse_address)]
    address: Option<u8>,

    /// Draw on an in-memory panel and print it instead of using hardware
    #[arg(long, global = true)]
    simulate: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show one or two lines of text
    Show {
        /// Text for the top line
        top: String,

        /// Text for the bottom line
        bottom: Option<String>,

        /// Seconds to keep scrolling before exiting
        #[arg(long, value_name = "SECS", default_value_t = 0)]
        hold: u64,
    },

    /// Show stdin line by line, newest at the bottom
    Stream {
        /// Milliseconds each new line stays at the bottom
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        interval: u64,

        /// Seconds to keep the last lines scrolling after end of input
        #[arg(long, value_name = "SECS", default_value_t = 0)]
        hold: u64,
    },
}

fn parse_address(s: &str) -> Result<u8, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("invalid address '{}': {}", s, e))?;

    if value > 0x7F {
        return Err(format!("address {:#04x} is not a 7-bit I2C address", value));
    }
    Ok(value)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(bus) = cli.bus {
        config.bus.path = bus;
    }
    if let Some(address) = cli.address {
        config.display.address = address;
    }
    config.display.validate()?;

    if cli.simulate {
        let panel = SimulatedPanel::new(config.display.address);
        let display = LcdDisplay::create(panel.clone(), NoopDelay, &config.display);
        run(&display, &cli.command, &config.display)?;
        display.destroy();

        println!("{}", panel);
        return Ok(());
    }

    let path = &config.bus.path;
    let bus = linux::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    info!("opened {}", path.display());

    let display = LcdDisplay::create(bus, Delay, &config.display);
    if !display.is_ready() {
        warn!(
            "no LCD at {:#04x} on {}; retrying while running",
            config.display.address,
            path.display()
        );
    }

    run(&display, &cli.command, &config.display)?;
    let ready = display.is_ready();
    display.destroy();

    if !ready {
        bail!(
            "no LCD answered at {:#04x} on {}",
            config.display.address,
            path.display()
        );
    }
    Ok(())
}

/// Longest wait for an update to reach the panel
///
/// The render loop may be halfway through a frame before it draws ours.
fn flush_timeout(config: &DisplayConfig) -> Duration {
    let frame = Duration::from_micros(config.timing.frame_time_us().into());
    config.tick_interval() + 2 * frame
}

/// Wait for the panel to show the latest text
fn flush<B, D>(display: &LcdDisplay<B, D>, timeout: Duration) {
    if !display.flush(timeout) {
        warn!("display did not confirm the update within {:?}", timeout);
    }
}

/// Execute `command` against a running display
fn run<B, D>(display: &LcdDisplay<B, D>, command: &Commands, config: &DisplayConfig) -> Result<()> {
    let timeout = flush_timeout(config);

    match command {
        Commands::Show { top, bottom, hold } => {
            display.print(top, 0);
            display.print(bottom.as_deref().unwrap_or(""), 1);
            flush(display, timeout);
            thread::sleep(Duration::from_secs(*hold));
        }
        Commands::Stream { interval, hold } => {
            let interval = Duration::from_millis(*interval);
            stream(display, io::stdin().lock(), interval, timeout)?;
            thread::sleep(Duration::from_secs(*hold));
        }
    }
    Ok(())
}

/// Scroll `input` up through the two lines, newest line at the bottom
fn stream<B, D, R>(
    display: &LcdDisplay<B, D>,
    input: R,
    interval: Duration,
    timeout: Duration,
) -> Result<()>
where
    R: BufRead,
{
    let mut previous = String::new();

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        display.print(&previous, 0);
        display.print(&line, 1);
        previous = line;

        flush(display, timeout);
        thread::sleep(interval);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use charlcd_driver::{Line, Timing};
    use clap::CommandFactory;
    use std::io::Cursor;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x27"), Ok(0x27));
        assert_eq!(parse_address("0X3F"), Ok(0x3F));
        assert_eq!(parse_address("39"), Ok(39));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("256").is_err());
        assert!(parse_address("lcd").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "charlcd", "show", "hello", "--simulate", "-a", "0x3f", "-vv",
        ])
        .unwrap();

        assert!(cli.simulate);
        assert_eq!(cli.address, Some(0x3F));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Show { top, bottom, hold } => {
                assert_eq!(top, "hello");
                assert_eq!(bottom, None);
                assert_eq!(hold, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_show_is_drawn_before_exit() {
        // Datasheet timing with real sleeps, default 500 ms tick
        let config = DisplayConfig::default();
        let panel = SimulatedPanel::new(config.address);
        let display = LcdDisplay::create(panel.clone(), Delay, &config);

        let command = Commands::Show {
            top: "hello".into(),
            bottom: Some("world".into()),
            hold: 0,
        };
        run(&display, &command, &config).unwrap();
        display.destroy();

        assert_eq!(panel.text(Line::Top), "hello           ");
        assert_eq!(panel.text(Line::Bottom), "world           ");
    }

    #[test]
    fn test_stream_ends_on_last_two_lines() {
        let config = DisplayConfig {
            timing: Timing::ZERO,
            ..DisplayConfig::default()
        };
        let panel = SimulatedPanel::new(config.address);
        let display = LcdDisplay::create(panel.clone(), NoopDelay, &config);

        let input = Cursor::new("one\ntwo\nthree\n");
        stream(&display, input, Duration::ZERO, flush_timeout(&config)).unwrap();
        display.destroy();

        assert_eq!(panel.text(Line::Top), "two             ");
        assert_eq!(panel.text(Line::Bottom), "three           ");
    }

    #[test]
    fn test_flush_timeout_covers_a_frame() {
        let config = DisplayConfig::default();
        let timeout = flush_timeout(&config);
        assert!(timeout > config.tick_interval() + Duration::from_millis(142));
    }
}
