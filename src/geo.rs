use crate::types::point::Point;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters. Callers guard location validity;
/// both points must carry lat/lon.
pub fn distance_meters(a: &Point, b: &Point) -> Option<f64> {
    let (lat1, lon1) = a.location()?;
    let (lat2, lon2) = b.location()?;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    Some(EARTH_RADIUS_M * c)
}

/// Speed in m/s between two samples, 0.0 when it cannot be computed
/// (no previous point, invalid location, missing or non-positive Δt).
pub fn speed_between(point: &Point, previous: Option<&Point>) -> f64 {
    let Some(previous) = previous else {
        return 0.0;
    };
    if !point.is_location_valid() || !previous.is_location_valid() {
        return 0.0;
    }
    let (Some(t1), Some(t0)) = (point.time_ms, previous.time_ms) else {
        return 0.0;
    };
    let elapsed_s = (t1 - t0) as f64 / 1000.0;
    if elapsed_s <= 0.0 {
        return 0.0;
    }
    match distance_meters(point, previous) {
        Some(d) => d / elapsed_s,
        None => 0.0,
    }
}

/// Altitude deltas larger than this are sensor glitches, not climbing.
const DIFF_THRESHOLD: f64 = 5.0;
/// Accumulated same-direction change below this is noise.
const ACCUM_THRESHOLD: f64 = 0.7;

/// Smooths raw altitude samples into committed gain/loss. One instance
/// lives for exactly one file parse; `take` is called per retained point
/// so each point carries the smoothed change since the previous one.
#[derive(Debug, Default)]
pub struct GainLossManager {
    last_altitude: Option<f64>,
    gain_accum: f64,
    loss_accum: f64,
    gain: f64,
    loss: f64,
    total_gain: f64,
    total_loss: f64,
}

impl GainLossManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, altitude: Option<f64>) {
        let Some(altitude) = altitude else { return };
        let Some(last) = self.last_altitude else {
            self.last_altitude = Some(altitude);
            return;
        };

        let diff = altitude - last;
        self.last_altitude = Some(altitude);

        if diff.abs() > DIFF_THRESHOLD {
            // Jump filter: restart around the new baseline without crediting.
            self.gain_accum = 0.0;
            self.loss_accum = 0.0;
            return;
        }

        if diff > 0.0 {
            self.gain_accum += diff;
            self.loss_accum = 0.0;
        } else if diff < 0.0 {
            self.loss_accum += -diff;
            self.gain_accum = 0.0;
        }

        if self.gain_accum > ACCUM_THRESHOLD {
            self.gain += self.gain_accum;
            self.total_gain += self.gain_accum;
            self.gain_accum = 0.0;
        }
        if self.loss_accum > ACCUM_THRESHOLD {
            self.loss += self.loss_accum;
            self.total_loss += self.loss_accum;
            self.loss_accum = 0.0;
        }
    }

    /// Committed gain/loss since the previous call, then zeroed.
    pub fn take(&mut self) -> (Option<f64>, Option<f64>) {
        let out = (
            (self.gain > 0.0).then_some(self.gain),
            (self.loss > 0.0).then_some(self.loss),
        );
        self.gain = 0.0;
        self.loss = 0.0;
        out
    }

    /// Lifetime totals across all `take` calls, for diagnostics.
    pub fn totals(&self) -> (f64, f64) {
        (self.total_gain, self.total_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64, time_ms: Option<i64>) -> Point {
        let mut p = Point::new();
        p.latitude = Some(lat);
        p.longitude = Some(lon);
        p.time_ms = time_ms;
        p
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(52.5200, 13.4050, None);
        let b = point(52.5305, 13.4210, None);
        let ab = distance_meters(&a, &b).unwrap();
        let ba = distance_meters(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 1000.0 && ab < 2500.0);
    }

    #[test]
    fn distance_requires_both_locations() {
        let a = point(52.0, 13.0, None);
        let mut b = Point::new();
        b.latitude = Some(52.0);
        assert!(distance_meters(&a, &b).is_none());
    }

    #[test]
    fn speed_zero_without_previous() {
        let a = point(52.0, 13.0, Some(1_000));
        assert_eq!(speed_between(&a, None), 0.0);
    }

    #[test]
    fn speed_guards_zero_elapsed() {
        let a = point(52.0, 13.0, Some(1_000));
        // Same instant, distinct locations: no division by zero.
        let b = point(52.1, 13.1, Some(1_000));
        assert_eq!(speed_between(&b, Some(&a)), 0.0);
    }

    #[test]
    fn speed_between_two_samples() {
        let a = point(52.5200, 13.4050, Some(0));
        let b = point(52.5209, 13.4050, Some(10_000));
        let v = speed_between(&b, Some(&a));
        // ~100 m in 10 s.
        assert!((v - 10.0).abs() < 0.5, "speed was {v}");
    }

    #[test]
    fn gain_loss_accumulates_steady_climb() {
        let mut mgr = GainLossManager::new();
        // 20 steps of +0.5 m, each below DIFF_THRESHOLD.
        for i in 0..=20 {
            mgr.add(Some(100.0 + i as f64 * 0.5));
        }
        let (gain, loss) = mgr.take();
        let gain = gain.unwrap();
        assert!(loss.is_none());
        // 10 m climbed; at most one sub-threshold accumulator still pending.
        assert!(gain > 10.0 - ACCUM_THRESHOLD && gain <= 10.0 + 1e-9, "gain was {gain}");
    }

    #[test]
    fn gain_loss_ignores_glitch_jumps() {
        let mut mgr = GainLossManager::new();
        mgr.add(Some(100.0));
        mgr.add(Some(180.0)); // teleport
        mgr.add(Some(180.4));
        let (gain, loss) = mgr.take();
        assert!(gain.is_none());
        assert!(loss.is_none());
    }

    #[test]
    fn take_resets_but_totals_persist() {
        let mut mgr = GainLossManager::new();
        mgr.add(Some(100.0));
        mgr.add(Some(102.0));
        let (gain, _) = mgr.take();
        assert!(gain.is_some());
        let (gain, _) = mgr.take();
        assert!(gain.is_none());
        assert!(mgr.totals().0 > 0.0);
    }
}
