use fitparser::profile::MesgNum;
use fitparser::{FitDataRecord, Value};

use crate::config::Config;
use crate::error::ParseError;
use crate::geo::GainLossManager;
use crate::pipeline::segment::{AutoPause, SegmentBuilder};
use crate::types::device::RecordedWith;
use crate::types::point::{Point, Segment};
use crate::types::record::{Record, RecordInfo, Set};

/// Garmin climbing sets arrive under an undocumented message number.
const CLIMB_MESG_NUM: u16 = 312;
/// Seconds between the Unix and FIT epochs (1989-12-31T00:00:00Z).
const FIT_EPOCH_OFFSET_S: i64 = 631_065_600;

/// Sports recorded as a continuous location stream.
const TRACK_SPORTS: &[&str] = &[
    "running",
    "cycling",
    "walking",
    "hiking",
    "e_biking",
    "motorcycling",
    "driving",
    "inline_skating",
    "ice_skating",
];
/// Sports recorded as discrete exercise sets.
const SET_SPORTS: &[&str] = &["training", "rock_climbing"];

pub fn parse(bytes: &[u8], config: &Config) -> Result<Record, ParseError> {
    let data = fitparser::from_bytes(bytes)
        .map_err(|e| ParseError::InvalidFit(format!("failed to decode FIT container: {e}")))?;
    build(lower(&data), config)
}

/// Typed view of the handful of FIT messages this pipeline consumes.
#[derive(Debug, Clone)]
enum Msg {
    FileId {
        file_type: Option<String>,
        manufacturer: Option<String>,
        product: Option<String>,
    },
    Sport {
        sport: Option<String>,
    },
    Record(Point),
    Event {
        event_type: Option<String>,
        time_ms: Option<i64>,
    },
    Session {
        sub_sport: Option<String>,
        total_calories: Option<f64>,
        avg_heart_rate: Option<f64>,
        max_heart_rate: Option<f64>,
        avg_temperature: Option<f64>,
        max_temperature: Option<f64>,
    },
    Set(Set),
}

fn build(msgs: Vec<Msg>, config: &Config) -> Result<Record, ParseError> {
    let mut file_ids = msgs.iter().filter_map(|m| match m {
        Msg::FileId {
            file_type,
            manufacturer,
            product,
        } => Some((file_type.clone(), manufacturer.clone(), product.clone())),
        _ => None,
    });
    let Some((file_type, manufacturer, product)) = file_ids.next() else {
        return Err(ParseError::InvalidFit("missing file_id message".into()));
    };
    if file_ids.next().is_some() {
        return Err(ParseError::InvalidFit("more than one file_id message".into()));
    }
    let Some(file_type) = file_type else {
        return Err(ParseError::InvalidFit("file_id has no type field".into()));
    };
    if file_type != "activity" {
        return Err(ParseError::UnsupportedFitKind(file_type));
    }

    let mut info = RecordInfo {
        recorded_with: match manufacturer {
            Some(mfr) => RecordedWith::from_device(&mfr, product.as_deref()),
            None => RecordedWith::unknown(),
        },
        ..RecordInfo::default()
    };

    let sport = msgs
        .iter()
        .find_map(|m| match m {
            Msg::Sport { sport } => sport.clone(),
            _ => None,
        })
        .ok_or_else(|| ParseError::UnsupportedFitKind("no sport declared".into()))?;
    info.category = Some(sport.clone());

    if TRACK_SPORTS.contains(&sport.as_str()) {
        Ok(parse_track(msgs, info, config))
    } else if SET_SPORTS.contains(&sport.as_str()) {
        Ok(parse_sets(msgs, info))
    } else {
        Err(ParseError::UnsupportedFitKind(sport))
    }
}

/// Streams record/event/session messages into auto-paused segments.
/// Explicit stop_all events seal the in-progress segment; records seen
/// while stopped are discarded until a start event.
fn parse_track(msgs: Vec<Msg>, mut info: RecordInfo, config: &Config) -> Record {
    let mut builder = SegmentBuilder::new(AutoPause::from_config(config));
    let mut gain_loss = GainLossManager::new();
    let mut stopped = false;

    for msg in msgs {
        match msg {
            Msg::Record(mut point) => {
                if stopped {
                    continue;
                }
                gain_loss.add(point.altitude);
                let (gain, loss) = gain_loss.take();
                point.gain = gain;
                point.loss = loss;
                info.update_min_temperature(point.temperature);
                builder.push(point);
            }
            Msg::Event { event_type, .. } => match event_type.as_deref() {
                Some("stop_all") => {
                    stopped = true;
                    builder.seal();
                }
                Some("start") if stopped => stopped = false,
                _ => {}
            },
            Msg::Session {
                total_calories,
                avg_temperature,
                max_temperature,
                sub_sport,
                ..
            } => {
                info.total_calories = total_calories.or(info.total_calories);
                info.avg_temperature = avg_temperature.or(info.avg_temperature);
                info.max_temperature = max_temperature.or(info.max_temperature);
                info.sub_category = sub_sport.or(info.sub_category);
            }
            _ => {}
        }
    }

    let segments = builder.finish();
    info.start_time_ms = segments.first().and_then(Segment::first_time_ms);
    info.end_time_ms = segments.last().and_then(Segment::last_time_ms);
    tracing::debug!(segments = segments.len(), "fit track activity parsed");
    Record::Track { info, segments }
}

/// Decodes strength/climbing sets; there are no location points.
fn parse_sets(msgs: Vec<Msg>, mut info: RecordInfo) -> Record {
    let mut sets = Vec::new();
    for msg in msgs {
        match msg {
            Msg::Set(set) => sets.push(set),
            Msg::Session {
                sub_sport,
                total_calories,
                avg_heart_rate,
                max_heart_rate,
                avg_temperature,
                max_temperature,
            } => {
                info.sub_category = sub_sport.or(info.sub_category);
                info.total_calories = total_calories.or(info.total_calories);
                info.avg_heart_rate = avg_heart_rate.or(info.avg_heart_rate);
                info.max_heart_rate = max_heart_rate.or(info.max_heart_rate);
                info.avg_temperature = avg_temperature.or(info.avg_temperature);
                info.max_temperature = max_temperature.or(info.max_temperature);
            }
            Msg::Event {
                event_type,
                time_ms,
            } => {
                if event_type.as_deref() == Some("stop_all") {
                    info.end_time_ms = time_ms.or(info.end_time_ms);
                }
            }
            _ => {}
        }
    }
    info.start_time_ms = sets.first().and_then(|s| s.start_time_ms);
    tracing::debug!(sets = sets.len(), "fit set activity parsed");
    Record::Sets { info, sets }
}

fn lower(data: &[FitDataRecord]) -> Vec<Msg> {
    data.iter()
        .filter_map(|record| match record.kind() {
            MesgNum::FileId => Some(lower_file_id(record)),
            MesgNum::Sport => Some(lower_sport(record)),
            MesgNum::Record => Some(Msg::Record(lower_record(record))),
            MesgNum::Event => Some(lower_event(record)),
            MesgNum::Session => Some(lower_session(record)),
            MesgNum::Set => Some(Msg::Set(lower_set(record))),
            kind if is_climb(&kind) => Some(Msg::Set(lower_climb(record))),
            _ => None,
        })
        .collect()
}

fn lower_file_id(record: &FitDataRecord) -> Msg {
    let mut file_type = None;
    let mut manufacturer = None;
    let mut product = None;
    for field in record.fields() {
        match field.name() {
            "type" => file_type = text(field.value()),
            "manufacturer" => manufacturer = text(field.value()),
            // Branded units resolve to a named product, generic ones to a
            // bare number.
            "garmin_product" | "favero_product" => product = text(field.value()),
            "product" => {
                if product.is_none() {
                    product = text(field.value())
                        .or_else(|| num(field.value()).map(|v| (v as u64).to_string()));
                }
            }
            _ => {}
        }
    }
    Msg::FileId {
        file_type,
        manufacturer,
        product,
    }
}

fn lower_sport(record: &FitDataRecord) -> Msg {
    let mut sport = None;
    for field in record.fields() {
        if field.name() == "sport" {
            sport = text(field.value());
        }
    }
    Msg::Sport { sport }
}

fn lower_record(record: &FitDataRecord) -> Point {
    let mut point = Point::new();
    let mut altitude = None;
    let mut enhanced_altitude = None;
    let mut speed = None;
    let mut enhanced_speed = None;

    for field in record.fields() {
        let value = field.value();
        match field.name() {
            "position_lat" => point.latitude = num(value).map(semicircles_to_degrees),
            "position_long" => point.longitude = num(value).map(semicircles_to_degrees),
            "timestamp" => point.time_ms = time_ms(value),
            "distance" => point.distance = num(value),
            "altitude" => altitude = num(value),
            "enhanced_altitude" => enhanced_altitude = num(value),
            "speed" => speed = num(value),
            "enhanced_speed" => enhanced_speed = num(value),
            "heart_rate" => point.heart_rate = num(value),
            "cadence" => point.cadence = num(value),
            "power" => point.power = num(value),
            "temperature" => point.temperature = num(value),
            _ => {}
        }
    }

    point.altitude = enhanced_altitude.or(altitude);
    point.speed = enhanced_speed.or(speed);
    point
}

fn lower_event(record: &FitDataRecord) -> Msg {
    let mut event_type = None;
    let mut when = None;
    for field in record.fields() {
        match field.name() {
            "event_type" => event_type = text(field.value()),
            "timestamp" => when = time_ms(field.value()),
            _ => {}
        }
    }
    Msg::Event {
        event_type,
        time_ms: when,
    }
}

fn lower_session(record: &FitDataRecord) -> Msg {
    let mut sub_sport = None;
    let mut total_calories = None;
    let mut avg_heart_rate = None;
    let mut max_heart_rate = None;
    let mut avg_temperature = None;
    let mut max_temperature = None;
    for field in record.fields() {
        let value = field.value();
        match field.name() {
            "sub_sport" => sub_sport = text(value),
            "total_calories" => total_calories = num(value),
            "avg_heart_rate" => avg_heart_rate = num(value),
            "max_heart_rate" => max_heart_rate = num(value),
            "avg_temperature" => avg_temperature = num(value),
            "max_temperature" => max_temperature = num(value),
            _ => {}
        }
    }
    Msg::Session {
        sub_sport,
        total_calories,
        avg_heart_rate,
        max_heart_rate,
        avg_temperature,
        max_temperature,
    }
}

fn lower_set(record: &FitDataRecord) -> Set {
    let mut set = Set::default();
    for field in record.fields() {
        let value = field.value();
        match field.name() {
            "set_type" => set.set_type = text(value),
            "category" => set.exercise_category = first_text(value),
            "start_time" => set.start_time_ms = time_ms(value),
            "timestamp" => set.end_time_ms = time_ms(value),
            "weight" => set.weight = num(value),
            "repetitions" => set.repetitions = num(value).map(|v| v as u32),
            _ => {}
        }
    }
    set
}

/// Messages outside the profile surface as `MesgNum::Value(n)`.
fn is_climb(kind: &MesgNum) -> bool {
    matches!(kind, MesgNum::Value(n) if *n == CLIMB_MESG_NUM)
}

/// The climbing message has no profile entry, so fields come through by
/// definition number only. Layout follows the set message.
fn lower_climb(record: &FitDataRecord) -> Set {
    let mut set = Set {
        set_type: Some("climbing".to_string()),
        ..Set::default()
    };
    for field in record.fields() {
        let value = field.value();
        match field.number() {
            253 => set.end_time_ms = num(value).map(fit_seconds_to_ms),
            0 => set.start_time_ms = num(value).map(fit_seconds_to_ms),
            1 => set.difficulty = num(value),
            2 => set.result = num(value).map(|v| v as u8),
            3 => set.avg_heart_rate = num(value),
            4 => set.temperature = num(value),
            _ => {}
        }
    }
    set
}

fn semicircles_to_degrees(semicircles: f64) -> f64 {
    semicircles * (180.0 / 2_147_483_648.0)
}

fn fit_seconds_to_ms(seconds: f64) -> i64 {
    (seconds as i64 + FIT_EPOCH_OFFSET_S) * 1000
}

fn num(value: &Value) -> Option<f64> {
    match value {
        Value::SInt8(v) => Some(*v as f64),
        Value::UInt8(v) | Value::UInt8z(v) | Value::Byte(v) | Value::Enum(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::UInt16(v) | Value::UInt16z(v) => Some(*v as f64),
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) | Value::UInt32z(v) => Some(*v as f64),
        Value::SInt64(v) => Some(*v as f64),
        Value::UInt64(v) | Value::UInt64z(v) => Some(*v as f64),
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(values) => values.first().and_then(text),
        other => text(other),
    }
}

fn time_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Timestamp(dt) => Some(dt.timestamp_millis()),
        _ => None,
    }
}
