//! Power-up identification sequence
//!
//! Before any frame is accepted, each run is lit warm white for
//! [`RUN_LIGHT_DURATION_MS`] in turn, separated by [`GAP_BETWEEN_RUNS_MS`] of
//! darkness. An observer sees the device come alive and can spot a miswired or
//! dead run immediately. No transition happens while the output is still
//! transmitting.

use tracing::{debug, info};

use crate::hal::OutputSurface;
use crate::output::OutputDriver;
use crate::types::{Millis, Rgb, elapsed_ms};

/// How long each run stays lit.
pub const RUN_LIGHT_DURATION_MS: u32 = 200;

/// Dark pause between two runs.
pub const GAP_BETWEEN_RUNS_MS: u32 = 50;

/// Color used to identify runs.
pub const IDENTIFICATION_COLOR: Rgb = Rgb::WARM_WHITE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    Idle,
    Lighting,
    Gap,
    /// Absorbing; frame intake may begin
    Complete,
}

/// Time-driven state machine for the identification sequence.
#[derive(Debug, Clone)]
pub struct StartupSequencer {
    state: StartupState,
    run: usize,
    entered_at: Millis,
}

impl StartupSequencer {
    pub fn new(now: Millis) -> Self {
        Self { state: StartupState::Idle, run: 0, entered_at: now }
    }

    /// Advance the sequence if its current step has run its course.
    pub fn poll<S: OutputSurface>(&mut self, now: Millis, output: &mut OutputDriver<S>) {
        if self.state == StartupState::Complete || output.is_busy() {
            return;
        }

        let elapsed = elapsed_ms(now, self.entered_at);
        match self.state {
            StartupState::Idle => {
                output.fill_all_runs(Rgb::BLACK);
                output.fill_run(self.run, IDENTIFICATION_COLOR);
                output.show();
                self.enter(StartupState::Lighting, now);
            }
            StartupState::Lighting if elapsed >= RUN_LIGHT_DURATION_MS => {
                output.fill_run(self.run, Rgb::BLACK);
                output.show();
                self.run += 1;
                if self.run >= output.topology().run_count() {
                    self.state = StartupState::Complete;
                    info!("Startup sequence complete after {} runs", self.run);
                } else {
                    self.enter(StartupState::Gap, now);
                }
            }
            StartupState::Gap if elapsed >= GAP_BETWEEN_RUNS_MS => {
                output.fill_run(self.run, IDENTIFICATION_COLOR);
                output.show();
                self.enter(StartupState::Lighting, now);
            }
            _ => {}
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == StartupState::Complete
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Run currently lit, or about to be.
    pub fn current_run(&self) -> usize {
        self.run
    }

    fn enter(&mut self, state: StartupState, now: Millis) {
        debug!("Startup {:?} -> {:?} on run {}", self.state, state, self.run);
        self.state = state;
        self.entered_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::memory::MemorySurface;
    use crate::types::Topology;

    fn setup(runs: &[u16]) -> (StartupSequencer, OutputDriver<MemorySurface>, MemorySurface) {
        let surface = MemorySurface::new(8, 4);
        let output = OutputDriver::new(surface.clone(), Topology::new(runs).unwrap(), 0).unwrap();
        (StartupSequencer::new(0), output, surface)
    }

    #[test]
    fn lights_each_run_in_turn() {
        let (mut startup, mut output, surface) = setup(&[2, 3]);

        startup.poll(0, &mut output);
        assert_eq!(startup.state(), StartupState::Lighting);
        assert_eq!(surface.strip(0)[..2], [IDENTIFICATION_COLOR; 2]);
        assert_eq!(surface.strip(1), vec![Rgb::BLACK; 4]);

        startup.poll(199, &mut output);
        assert_eq!(startup.state(), StartupState::Lighting);

        startup.poll(200, &mut output);
        assert_eq!(startup.state(), StartupState::Gap);
        assert!(surface.is_dark());

        startup.poll(249, &mut output);
        assert_eq!(startup.state(), StartupState::Gap);

        startup.poll(250, &mut output);
        assert_eq!(startup.state(), StartupState::Lighting);
        assert_eq!(startup.current_run(), 1);
        assert_eq!(surface.strip(1)[..3], [IDENTIFICATION_COLOR; 3]);
        assert_eq!(surface.pixel(1, 3), Some(Rgb::BLACK));

        startup.poll(450, &mut output);
        assert!(startup.is_complete());
        assert!(surface.is_dark());
    }

    #[test]
    fn single_run_completes_without_gap() {
        let (mut startup, mut output, _) = setup(&[1]);
        startup.poll(10, &mut output);
        startup.poll(210, &mut output);
        assert!(startup.is_complete());
    }

    #[test]
    fn waits_while_output_is_busy() {
        let (mut startup, mut output, surface) = setup(&[1]);
        surface.set_busy(true);

        startup.poll(0, &mut output);
        assert_eq!(startup.state(), StartupState::Idle);

        surface.set_busy(false);
        startup.poll(500, &mut output);
        assert_eq!(startup.state(), StartupState::Lighting);

        // The lighting timer starts when the run was actually lit
        startup.poll(650, &mut output);
        assert_eq!(startup.state(), StartupState::Lighting);
        startup.poll(700, &mut output);
        assert!(startup.is_complete());
    }

    #[test]
    fn complete_is_absorbing() {
        let (mut startup, mut output, surface) = setup(&[1]);
        startup.poll(0, &mut output);
        startup.poll(200, &mut output);
        let shows = surface.show_count();

        startup.poll(10_000, &mut output);
        assert!(startup.is_complete());
        assert_eq!(surface.show_count(), shows);
    }
}
