//! Access to the video player.

/// The playing video, as far as the share flow needs it.
pub trait VideoPlayer: Send + Sync {
    /// Current position in seconds, if known.
    fn current_time(&self) -> Option<f64>;

    /// Length of the video in seconds, if known.
    fn duration(&self) -> Option<f64>;

    fn seek(&self, seconds: f64);
}

/// Current position as whole, non-negative seconds.
pub fn capture_time(player: &dyn VideoPlayer) -> Option<u64> {
    player
        .current_time()
        .filter(|t| t.is_finite())
        .map(|t| t.max(0.0).floor() as u64)
}

/// Seek, clamped to `[0, duration]`. Returns the position sought to.
pub fn seek_clamped(player: &dyn VideoPlayer, seconds: f64) -> Option<f64> {
    if !seconds.is_finite() {
        return None;
    }
    let upper = player
        .duration()
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(f64::MAX);
    let target = seconds.clamp(0.0, upper);
    player.seek(target);
    Some(target)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::VideoPlayer;
    use std::sync::Mutex;

    /// A player that only remembers where it was told to go.
    pub struct FakePlayer {
        pub position: Mutex<Option<f64>>,
        pub length: Option<f64>,
    }

    impl FakePlayer {
        pub fn new(position: Option<f64>, length: Option<f64>) -> Self {
            Self {
                position: Mutex::new(position),
                length,
            }
        }

        pub fn position(&self) -> Option<f64> {
            *self.position.lock().unwrap()
        }
    }

    impl VideoPlayer for FakePlayer {
        fn current_time(&self) -> Option<f64> {
            self.position()
        }

        fn duration(&self) -> Option<f64> {
            self.length
        }

        fn seek(&self, seconds: f64) {
            *self.position.lock().unwrap() = Some(seconds);
        }
    }
}
