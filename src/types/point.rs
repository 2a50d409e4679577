use serde::{Deserialize, Serialize};

/// One GPS/sensor sample. Every field is optional; recording devices
/// drop sensors per point and parsers must tolerate that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Point {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters since the previous retained point.
    pub distance: Option<f64>,
    /// Milliseconds since epoch, in the device's local time zone.
    pub time_ms: Option<i64>,
    /// m/s, as reported by the device when present.
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    /// Smoothed elevation gain since the previous retained point.
    pub gain: Option<f64>,
    /// Smoothed elevation loss since the previous retained point.
    pub loss: Option<f64>,
    pub heart_rate: Option<f64>,
    pub cadence: Option<f64>,
    pub power: Option<f64>,
    pub temperature: Option<f64>,
}

impl Point {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both coordinates present and inside [-90,90] / [-180,180]. Points
    /// failing this are never used for distance or speed computation.
    pub fn is_location_valid(&self) -> bool {
        matches!(
            (self.latitude, self.longitude),
            (Some(lat), Some(lon))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
        )
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        if self.is_location_valid() {
            Some((self.latitude.unwrap_or_default(), self.longitude.unwrap_or_default()))
        } else {
            None
        }
    }
}

/// A contiguous bout of movement, bounded by detected pauses or explicit
/// stop events. Never empty once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    pub points: Vec<Point>,
}

impl Segment {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn first_time_ms(&self) -> Option<i64> {
        self.points.first().and_then(|p| p.time_ms)
    }

    pub fn last_time_ms(&self) -> Option<i64> {
        self.points.last().and_then(|p| p.time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_validity_bounds() {
        let mut p = Point::new();
        assert!(!p.is_location_valid());
        p.latitude = Some(45.0);
        assert!(!p.is_location_valid());
        p.longitude = Some(7.0);
        assert!(p.is_location_valid());
        p.latitude = Some(91.0);
        assert!(!p.is_location_valid());
        p.latitude = Some(-45.0);
        p.longitude = Some(-180.5);
        assert!(!p.is_location_valid());
    }
}
