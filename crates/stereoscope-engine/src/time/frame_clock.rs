/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Driver-supplied timestamp of the tick, in seconds.
    pub timestamp: f64,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots from driver timestamps.
///
/// Ticks are timestamped by whichever source drives the loop (a stereo
/// display or the windowing system), so the clock derives deltas from the
/// supplied values rather than reading a wall clock of its own.
///
/// Delta time is clamped to avoid pathological values when the application
/// is paused by the debugger, minimized, or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    frame_index: u64,
    dt_min: f32,
    dt_max: f32,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    ///
    /// Clamp rationale:
    /// - minimum prevents zero-dt behavior from duplicate timestamps
    /// - maximum prevents simulation explosions after long stalls
    pub fn new() -> Self {
        Self {
            last: None,
            frame_index: 0,
            dt_min: 0.0001,
            dt_max: 0.25,
        }
    }

    /// Creates a clock with custom delta-time clamps, in seconds.
    pub fn with_clamps(dt_min: f32, dt_max: f32) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the clock baseline. The next tick reports the minimum delta.
    ///
    /// Useful after a presentation mode change or when resuming from
    /// suspension.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self, timestamp: f64) -> FrameTime {
        let dt = match self.last {
            Some(last) => ((timestamp - last) as f32).clamp(self.dt_min, self.dt_max),
            None => self.dt_min,
        };
        self.last = Some(timestamp);

        let ft = FrameTime {
            dt,
            timestamp,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
