use uuid::Uuid;

use crate::geo;
use crate::storage::{Activity, ActivityKind, Stats};
use crate::types::point::{Point, Segment};
use crate::types::record::Record;

/// Flattens a parser-domain record into its storage shape. Pure; the
/// caller decides what to do with the result.
pub fn to_activity(record: &Record) -> Activity {
    let info = record.info();
    let kind = match record {
        Record::Track { .. } => ActivityKind::Track,
        Record::Sets { .. } => ActivityKind::Sets,
        Record::Transition { .. } => ActivityKind::Transition,
        Record::Multi { .. } => ActivityKind::Multi,
    };
    let stats = match record {
        Record::Track { segments, .. } => Some(compute_stats(segments, info.start_time_ms, info.end_time_ms)),
        _ => None,
    };

    Activity {
        uuid: info.uuid.unwrap_or_else(Uuid::new_v4),
        kind,
        name: info.name.clone(),
        description: info.description.clone(),
        category: info.category.clone(),
        sub_category: info.sub_category.clone(),
        start_time_ms: info.start_time_ms,
        end_time_ms: info.end_time_ms,
        recorded_with_id: info.recorded_with.id,
        parent_id: None,
        stats,
    }
}

fn compute_stats(segments: &[Segment], start_ms: Option<i64>, end_ms: Option<i64>) -> Stats {
    let mut min_speed = f64::INFINITY;
    let mut max_speed = f64::NEG_INFINITY;
    let mut speed_sum = 0.0;
    let mut speed_count = 0usize;
    let mut total_gain = 0.0;
    let mut has_gain = false;
    let mut total_loss = 0.0;
    let mut has_loss = false;
    let mut moving_time_ms = 0i64;

    for segment in segments {
        let mut previous: Option<&Point> = None;
        for point in &segment.points {
            let speed = point
                .speed
                .filter(|s| *s > 0.0)
                .unwrap_or_else(|| geo::speed_between(point, previous));
            if speed > 0.0 {
                min_speed = min_speed.min(speed);
                max_speed = max_speed.max(speed);
                speed_sum += speed;
                speed_count += 1;
            }
            if let Some(gain) = point.gain {
                total_gain += gain;
                has_gain = true;
            }
            if let Some(loss) = point.loss {
                total_loss += loss;
                has_loss = true;
            }
            previous = Some(point);
        }
        if let (Some(first), Some(last)) = (segment.first_time_ms(), segment.last_time_ms()) {
            moving_time_ms += (last - first).max(0);
        }
    }

    // Files without per-point gain/loss still carry raw altitude; smooth
    // it here so the totals exist either way.
    if !has_gain && !has_loss {
        let mut smoother = geo::GainLossManager::new();
        for point in segments.iter().flat_map(|s| &s.points) {
            smoother.add(point.altitude);
        }
        let (gain, loss) = smoother.totals();
        if gain > 0.0 {
            total_gain = gain;
            has_gain = true;
        }
        if loss > 0.0 {
            total_loss = loss;
            has_loss = true;
        }
    }

    Stats {
        min_speed: (speed_count > 0).then_some(min_speed),
        avg_speed: (speed_count > 0).then_some(speed_sum / speed_count as f64),
        max_speed: (speed_count > 0).then_some(max_speed),
        total_gain: has_gain.then_some(total_gain),
        total_loss: has_loss.then_some(total_loss),
        moving_time_ms: (moving_time_ms > 0).then_some(moving_time_ms),
        total_time_ms: match (start_ms, end_ms) {
            (Some(start), Some(end)) if end > start => Some(end - start),
            _ => None,
        },
    }
}
