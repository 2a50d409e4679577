pub mod mapper;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::point::Segment;
use crate::types::record::Set;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Track,
    Sets,
    Transition,
    Multi,
}

/// Aggregates derived from the point stream at mapping time, stored
/// alongside the activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub min_speed: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub total_gain: Option<f64>,
    pub total_loss: Option<f64>,
    pub moving_time_ms: Option<i64>,
    pub total_time_ms: Option<i64>,
}

/// Storage-domain shape of one imported activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub uuid: Uuid,
    pub kind: ActivityKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub recorded_with_id: u16,
    /// Set when this activity is a child of a multi-sport activity.
    pub parent_id: Option<i64>,
    pub stats: Option<Stats>,
}

/// Persistence collaborator. The import orchestrator assumes each call is
/// atomic and that an existence check directly before an insert needs no
/// surrounding transaction (at-most-one-writer is assumed, not enforced).
pub trait ActivityStore {
    /// Whether an equivalent activity is already persisted.
    fn activity_exists(&self, candidate: &Activity) -> bool;

    /// Insert operations return the new row id, or `None` on failure.
    fn insert_track_activity(&mut self, activity: &Activity, segments: &[Segment]) -> Option<i64>;
    fn insert_set_activity(&mut self, activity: &Activity, sets: &[Set]) -> Option<i64>;
    fn insert_multi_activity(&mut self, activity: &Activity) -> Option<i64>;
}
