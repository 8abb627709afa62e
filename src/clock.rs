use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{EngineError, Result};
use crate::scripting::writer::{member_call, set_property};

const FALLBACK_TICK_RATE: u32 = 60;

#[derive(Debug)]
struct ClockState {
    time: f64,
    framerate: u32,
    paused: bool,
    frame: u64,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            time: 0.0,
            framerate: 0,
            paused: false,
            frame: 0,
        }
    }
}

/// Shared handle to the global simulation clock.
///
/// `framerate` locks the tick length to a fixed rate; 0 means unlocked,
/// in which case [`Clock::tick`] advances at the fallback rate.
#[derive(Debug, Default)]
pub struct Clock {
    inner: Arc<RwLock<ClockState>>,
}

impl Clone for Clock {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(&self) -> f64 {
        self.inner.read().time
    }

    pub fn set_time(&self, time: f64) -> Result<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(EngineError::validation(format!(
                "clock time {time} must be a non-negative number"
            )));
        }
        self.inner.write().time = time;
        Ok(())
    }

    pub fn framerate(&self) -> u32 {
        self.inner.read().framerate
    }

    pub fn set_framerate(&self, framerate: u32) {
        self.inner.write().framerate = framerate;
    }

    pub fn frame(&self) -> u64 {
        self.inner.read().frame
    }

    pub fn is_paused(&self) -> bool {
        self.inner.read().paused
    }

    pub fn pause(&self) {
        self.inner.write().paused = true;
    }

    pub fn play(&self) {
        self.inner.write().paused = false;
    }

    /// Advances by one frame unless paused.
    pub fn tick(&self) {
        let mut state = self.inner.write();
        if state.paused {
            return;
        }
        state.frame += 1;
        let rate = if state.framerate > 0 {
            state.framerate
        } else {
            FALLBACK_TICK_RATE
        };
        state.time += 1.0 / f64::from(rate);
    }

    /// Script fragment reproducing the clock configuration under `var`.
    pub fn script(&self, var: &str) -> Result<String> {
        let state = self.inner.read();
        let mut script = String::new();
        script.push_str(&set_property(var, "time", state.time)?);
        script.push_str(&set_property(var, "framerate", state.framerate)?);
        if state.paused {
            script.push_str(&member_call(var, "pause", &[])?);
        }
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_reflects_configuration() {
        let clock = Clock::new();
        clock.set_time(2.5).unwrap();
        clock.set_framerate(30);
        assert_eq!(
            clock.script("t").unwrap(),
            "t.time = 2.5\nt.framerate = 30\n"
        );
        clock.pause();
        assert_eq!(
            clock.script("t").unwrap(),
            "t.time = 2.5\nt.framerate = 30\nt.pause()\n"
        );
    }

    #[test]
    fn tick_respects_pause_and_framerate() {
        let clock = Clock::new();
        clock.set_framerate(10);
        clock.tick();
        assert_eq!(clock.frame(), 1);
        assert!((clock.time() - 0.1).abs() < 1e-9);
        clock.pause();
        clock.tick();
        assert_eq!(clock.frame(), 1);
        clock.play();
        clock.tick();
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn negative_time_is_rejected() {
        let clock = Clock::new();
        assert!(clock.set_time(-1.0).is_err());
        assert!(clock.set_time(f64::NAN).is_err());
    }
}
