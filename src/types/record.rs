use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::device::RecordedWith;
use crate::types::point::Segment;

/// One discrete exercise unit (strength training or climbing), as opposed
/// to a continuous-movement segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Set {
    pub set_type: Option<String>,
    pub exercise_category: Option<String>,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub weight: Option<f64>,
    pub repetitions: Option<u32>,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub calories: Option<f64>,
    pub temperature: Option<f64>,
    pub difficulty: Option<f64>,
    pub result: Option<u8>,
}

impl Set {
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time_ms, self.end_time_ms) {
            (Some(start), Some(end)) if end > start => Some(end - start),
            _ => None,
        }
    }
}

/// Fields shared by every record variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordInfo {
    pub uuid: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub recorded_with: RecordedWith,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub min_temperature: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub total_calories: Option<f64>,
}

impl RecordInfo {
    /// Running minimum; samples never overwrite a lower value.
    pub fn update_min_temperature(&mut self, sample: Option<f64>) {
        let Some(sample) = sample else { return };
        match self.min_temperature {
            Some(current) if current <= sample => {}
            _ => self.min_temperature = Some(sample),
        }
    }
}

/// The parser's neutral output for one imported file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Record {
    Track {
        info: RecordInfo,
        segments: Vec<Segment>,
    },
    Sets {
        info: RecordInfo,
        sets: Vec<Set>,
    },
    Transition {
        info: RecordInfo,
    },
    Multi {
        info: RecordInfo,
        children: Vec<Record>,
    },
}

impl Record {
    pub fn info(&self) -> &RecordInfo {
        match self {
            Record::Track { info, .. }
            | Record::Sets { info, .. }
            | Record::Transition { info }
            | Record::Multi { info, .. } => info,
        }
    }

    pub fn info_mut(&mut self) -> &mut RecordInfo {
        match self {
            Record::Track { info, .. }
            | Record::Sets { info, .. }
            | Record::Transition { info }
            | Record::Multi { info, .. } => info,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Record::Track { .. } => "track",
            Record::Sets { .. } => "sets",
            Record::Transition { .. } => "transition",
            Record::Multi { .. } => "multi",
        }
    }
}
