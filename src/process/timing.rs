/// Counts frames and reports the average rate once per interval.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    interval: f32,
    elapsed: f32,
    frames: u32,
}

impl FrameTimer {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(f32::EPSILON),
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Records one frame of `dt` seconds. Returns frames per second when the
    /// interval has passed, then starts counting again.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        self.frames += 1;
        if self.elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed;
        self.elapsed = 0.0;
        self.frames = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_interval() {
        let mut timer = FrameTimer::new(3.0);
        let reports: Vec<f32> = (0..300).filter_map(|_| timer.tick(0.025)).collect();
        // 300 frames over 7.5 seconds
        assert_eq!(reports.len(), 2);
        for fps in reports {
            assert!((fps - 40.0).abs() < 0.5, "{}", fps);
        }
    }

    #[test]
    fn long_frame_reports_immediately() {
        let mut timer = FrameTimer::new(1.0);
        assert_eq!(timer.tick(2.0), Some(0.5));
        assert_eq!(timer.tick(0.1), None);
    }
}
