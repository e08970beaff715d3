use chrono::{DateTime, Duration, Utc};

pub struct FPScalculator {
    frames: u64,
    since: DateTime<Utc>,
}

impl FPScalculator {
    pub fn new() -> Self {
        Self {
            frames: 0,
            since: Utc::now(),
        }
    }

    pub fn count_one_frame(&mut self) {
        self.frames += 1;
    }

    /// Frames per second since the previous call, then starts a new window.
    pub fn fps(&mut self) -> f64 {
        let now = Utc::now();
        let fps = rate(self.frames, now - self.since);
        self.frames = 0;
        self.since = now;
        fps
    }
}

fn rate(frames: u64, elapsed: Duration) -> f64 {
    let millis = elapsed.num_milliseconds();
    if millis <= 0 {
        return 0.0;
    }
    frames as f64 * 1000.0 / millis as f64
}
