#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Speed below this (m/s) counts as standing still.
    pub speed_threshold_auto_pause: f64,
    /// Segments with fewer retained points are dropped.
    pub min_points_per_segment: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed_threshold_auto_pause: 0.1,
            min_points_per_segment: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let speed_threshold_auto_pause = std::env::var("TRACKNORM_SPEED_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.speed_threshold_auto_pause);

        let min_points_per_segment = std::env::var("TRACKNORM_MIN_SEGMENT_POINTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_points_per_segment);

        Self {
            speed_threshold_auto_pause,
            min_points_per_segment,
        }
    }
}
