//! Status LED liveness indicator
//!
//! Until the first frame is displayed the LED blinks slowly. The first frame
//! switches it off; afterwards it flashes briefly on every
//! [`ACTIVITY_EVERY`]th frame up to [`ACTIVITY_LIMIT`] frames, then stays dark.

use crate::hal::StatusLed;
use crate::types::{Millis, elapsed_ms};

/// Slow blink half-period while waiting for the first frame.
pub const SLOW_BLINK_INTERVAL_MS: u32 = 500;

/// Activity flash cadence, in displayed frames.
pub const ACTIVITY_EVERY: u32 = 60;

/// No activity flashes after this many displayed frames.
pub const ACTIVITY_LIMIT: u32 = 600;

/// Minimum on-time of an activity flash.
pub const FLASH_MS: u32 = 1;

#[derive(Debug)]
pub struct LivenessIndicator<L> {
    led: L,
    lit: bool,
    first_frame: bool,
    frames: u32,
    last_toggle: Millis,
    flash_started: Option<Millis>,
}

impl<L: StatusLed> LivenessIndicator<L> {
    /// Switch the LED off and start the slow blink timer.
    pub fn new(mut led: L, now: Millis) -> Self {
        led.set(false);
        Self { led, lit: false, first_frame: false, frames: 0, last_toggle: now, flash_started: None }
    }

    /// Blink while waiting for frames and end activity flashes.
    pub fn poll(&mut self, now: Millis) {
        if !self.first_frame {
            if elapsed_ms(now, self.last_toggle) >= SLOW_BLINK_INTERVAL_MS {
                self.last_toggle = now;
                self.set(!self.lit);
            }
            return;
        }

        let flash_over = self.flash_started.is_some_and(|started| elapsed_ms(now, started) >= FLASH_MS);
        if flash_over {
            self.flash_started = None;
            self.set(false);
        }
    }

    /// Record one displayed frame.
    pub fn frame_displayed(&mut self, now: Millis) {
        if !self.first_frame {
            self.first_frame = true;
            self.set(false);
        }

        self.frames = self.frames.saturating_add(1);
        if self.frames <= ACTIVITY_LIMIT && self.frames % ACTIVITY_EVERY == 0 {
            self.flash_started = Some(now);
            self.set(true);
        }
    }

    /// Frames displayed so far, saturating.
    pub fn frames_displayed(&self) -> u32 {
        self.frames
    }

    pub fn led(&self) -> &L {
        &self.led
    }

    fn set(&mut self, on: bool) {
        self.lit = on;
        self.led.set(on);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::memory::MemoryStatusLed;

    fn indicator() -> (LivenessIndicator<MemoryStatusLed>, MemoryStatusLed) {
        let led = MemoryStatusLed::new();
        (LivenessIndicator::new(led.clone(), 0), led)
    }

    #[test]
    fn blinks_slowly_before_first_frame() {
        let (mut indicator, led) = indicator();

        indicator.poll(499);
        assert!(!led.is_on());
        indicator.poll(500);
        assert!(led.is_on());
        indicator.poll(999);
        assert!(led.is_on());
        indicator.poll(1000);
        assert!(!led.is_on());
    }

    #[test]
    fn first_frame_turns_led_off_and_stops_blinking() {
        let (mut indicator, led) = indicator();
        indicator.poll(500);
        assert!(led.is_on());

        indicator.frame_displayed(600);
        assert!(!led.is_on());

        indicator.poll(5000);
        assert!(!led.is_on());
    }

    #[test]
    fn flashes_every_sixtieth_frame() {
        let (mut indicator, led) = indicator();
        for frame in 1..60 {
            indicator.frame_displayed(frame);
        }
        assert!(!led.is_on());

        indicator.frame_displayed(60);
        assert!(led.is_on());
        indicator.poll(60);
        assert!(led.is_on());
        indicator.poll(61);
        assert!(!led.is_on());
    }

    #[test]
    fn goes_silent_after_limit() {
        let (mut indicator, led) = indicator();
        let mut flashes = 0;
        for frame in 1..=1200u32 {
            indicator.frame_displayed(frame);
            if led.is_on() {
                flashes += 1;
            }
            indicator.poll(frame + 1);
        }
        assert_eq!(flashes, 10);
        assert_eq!(indicator.frames_displayed(), 1200);
    }
}
