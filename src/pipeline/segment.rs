use crate::config::Config;
use crate::geo;
use crate::types::point::{Point, Segment};

/// Speed-based pause detection shared by the GPX re-segmentation pass and
/// the FIT streaming parser. Both pipelines feed one statistics engine, so
/// a run of non-moving samples must split segments identically in each.
#[derive(Debug, Clone, Copy)]
pub struct AutoPause {
    pub speed_threshold: f64,
    pub min_points_per_segment: usize,
}

impl AutoPause {
    pub fn from_config(config: &Config) -> Self {
        Self {
            speed_threshold: config.speed_threshold_auto_pause,
            min_points_per_segment: config.min_points_per_segment,
        }
    }

    /// A point moves when its own reported speed, or failing that the
    /// speed computed against the previous seen point, reaches the
    /// threshold. With neither a reported speed nor a baseline there is
    /// no evidence of standing still, so the bout bootstraps as moving.
    pub fn is_moving(&self, point: &Point, previous: Option<&Point>) -> bool {
        if let Some(speed) = point.speed {
            return speed >= self.speed_threshold;
        }
        match previous {
            Some(prev) => geo::speed_between(point, Some(prev)) >= self.speed_threshold,
            None => true,
        }
    }

    /// Splits an ordered point stream at detected pauses. Segments with
    /// fewer than `min_points_per_segment` points are dropped, never
    /// emitted.
    pub fn split(&self, points: Vec<Point>) -> Vec<Segment> {
        let mut builder = SegmentBuilder::new(*self);
        for point in points {
            builder.push(point);
        }
        builder.finish()
    }
}

/// Incremental form of [`AutoPause::split`], used by the FIT parser where
/// points arrive interleaved with stop/start events.
#[derive(Debug)]
pub struct SegmentBuilder {
    auto_pause: AutoPause,
    current: Vec<Point>,
    previous: Option<Point>,
    segments: Vec<Segment>,
}

impl SegmentBuilder {
    pub fn new(auto_pause: AutoPause) -> Self {
        Self {
            auto_pause,
            current: Vec::new(),
            previous: None,
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, point: Point) {
        let moving = self.auto_pause.is_moving(&point, self.previous.as_ref());
        let retain = moving && point.is_location_valid();
        // The speed baseline advances with every located point, retained
        // or not; a paused sample must not freeze the comparison point.
        if point.is_location_valid() {
            self.previous = Some(point.clone());
        }
        if retain {
            self.current.push(point);
        } else {
            self.seal();
        }
    }

    /// Closes the in-progress segment, e.g. on an explicit device stop.
    pub fn seal(&mut self) {
        if self.current.len() >= self.auto_pause.min_points_per_segment {
            self.segments.push(Segment::new(std::mem::take(&mut self.current)));
        } else if !self.current.is_empty() {
            tracing::debug!(
                points = self.current.len(),
                "dropping short segment below minimum"
            );
            self.current.clear();
        }
    }

    pub fn finish(mut self) -> Vec<Segment> {
        self.seal();
        self.segments
    }
}
