use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config::Config;
use crate::error::ParseError;
use crate::geo;
use crate::pipeline::segment::AutoPause;
use crate::types::device::RecordedWith;
use crate::types::point::{Point, Segment};
use crate::types::record::{Record, RecordInfo};

const OPENTRACKS_SCHEMA_MARKER: &str = "opentracksapp.com";

/// Raw pre-parse output: the document's structure mapped one-to-one into
/// the neutral model, before any strategy refinement.
#[derive(Debug, Default)]
struct RawTrack {
    info: RecordInfo,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Strategy {
    /// Route/course file without temporal data; keeps all points.
    Path,
    Standard,
    /// Standard segmentation over files carrying per-point gain/loss tags.
    OpenTracks,
}

pub fn parse(bytes: &[u8], config: &Config) -> Result<Record, ParseError> {
    let raw = pre_parse(bytes)?;
    let strategy = select_strategy(&raw);
    tracing::debug!(?strategy, segments = raw.segments.len(), "gpx pre-parse done");

    Ok(match strategy {
        Strategy::Path => parse_path(raw),
        Strategy::Standard | Strategy::OpenTracks => parse_standard(raw, config),
    })
}

fn select_strategy(raw: &RawTrack) -> Strategy {
    let has_time = raw
        .segments
        .iter()
        .flat_map(|s| &s.points)
        .any(|p| p.time_ms.is_some());
    if !has_time {
        Strategy::Path
    } else if raw.info.recorded_with.is_opentracks() {
        Strategy::OpenTracks
    } else {
        Strategy::Standard
    }
}

/// Streaming tag-driven walk building one raw track. End tags are
/// interpreted against the current context: inside a trkpt they fill the
/// pending point, at metadata/trk level they fill the record header.
fn pre_parse(bytes: &[u8]) -> Result<RawTrack, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut raw = RawTrack::default();
    let mut segments: Vec<Segment> = Vec::new();
    let mut current_segment: Vec<Point> = Vec::new();
    let mut current_point: Option<Point> = None;
    let mut in_header = false;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e)?;
                text.clear();
                match name.as_str() {
                    "gpx" => {
                        if schema_location(&e)?
                            .is_some_and(|loc| loc.contains(OPENTRACKS_SCHEMA_MARKER))
                        {
                            raw.info.recorded_with = RecordedWith::from_software("OpenTracks");
                        }
                    }
                    "metadata" | "trk" => in_header = true,
                    "trkseg" => {
                        if !current_segment.is_empty() {
                            segments.push(Segment::new(std::mem::take(&mut current_segment)));
                        }
                    }
                    "trkpt" => current_point = Some(point_from_attrs(&e)?),
                    _ => {}
                }
            }
            // Self-closing trkpt carries only its attributes and sees no
            // end event; complete the point immediately.
            Ok(Event::Empty(e)) => {
                if local_name(&e)? == "trkpt" {
                    current_segment.push(point_from_attrs(&e)?);
                }
            }
            Ok(Event::Text(e)) => {
                text = e.unescape().map_err(invalid_gpx)?.into_owned();
            }
            Ok(Event::End(e)) => {
                let name = local_name_end(e.name().as_ref())?;
                if name == "trkpt" {
                    if let Some(done) = current_point.take() {
                        current_segment.push(done);
                    }
                } else if let Some(point) = current_point.as_mut() {
                    match name.as_str() {
                        "ele" => point.altitude = text.parse().ok(),
                        "gain" => point.gain = text.parse().ok(),
                        "loss" => point.loss = text.parse().ok(),
                        "time" => point.time_ms = parse_time(&text),
                        "speed" => point.speed = text.parse().ok(),
                        "hr" => point.heart_rate = text.parse().ok(),
                        "cad" => point.cadence = text.parse().ok(),
                        _ => {}
                    }
                } else if in_header {
                    match name.as_str() {
                        "name" => raw.info.name = Some(text.clone()),
                        "desc" => raw.info.description = Some(text.clone()),
                        "type" => raw.info.category = Some(text.clone()),
                        "trackid" => raw.info.uuid = text.parse().ok(),
                        "metadata" | "trk" => in_header = false,
                        _ => {}
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::InvalidGpx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !current_segment.is_empty() {
        segments.push(Segment::new(current_segment));
    }

    raw.info.start_time_ms = segments.first().and_then(Segment::first_time_ms);
    raw.info.end_time_ms = segments.last().and_then(Segment::last_time_ms);
    raw.segments = segments;
    Ok(raw)
}

/// Filters invalid or timeless points per pre-parsed segment, then splits
/// each at detected pauses. Short runs disappear here, so the header
/// times are recomputed from what actually survived.
fn parse_standard(raw: RawTrack, config: &Config) -> Record {
    let auto_pause = AutoPause::from_config(config);
    let mut segments = Vec::new();
    for segment in raw.segments {
        let filtered: Vec<Point> = segment
            .points
            .into_iter()
            .filter(|p| p.is_location_valid() && p.time_ms.is_some())
            .collect();
        segments.extend(auto_pause.split(filtered));
    }
    let mut info = raw.info;
    info.start_time_ms = segments.first().and_then(Segment::first_time_ms);
    info.end_time_ms = segments.last().and_then(Segment::last_time_ms);
    Record::Track { info, segments }
}

/// No time means no pause detection. Segments pass through untouched;
/// every point gets its haversine delta from the immediate predecessor.
fn parse_path(mut raw: RawTrack) -> Record {
    let mut previous: Option<Point> = None;
    for segment in raw.segments.iter_mut() {
        for point in segment.points.iter_mut() {
            point.distance = match previous.as_ref() {
                None => Some(0.0),
                Some(prev) => geo::distance_meters(point, prev),
            };
            previous = Some(point.clone());
        }
    }
    Record::Track {
        info: raw.info,
        segments: raw.segments,
    }
}

fn point_from_attrs(e: &BytesStart<'_>) -> Result<Point, ParseError> {
    let mut point = Point::new();
    for attr in e.attributes() {
        let attr = attr.map_err(invalid_gpx)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(invalid_gpx)?;
        let value = std::str::from_utf8(&attr.value).map_err(invalid_gpx)?;
        match key {
            "lat" => point.latitude = value.parse().ok(),
            "lon" => point.longitude = value.parse().ok(),
            _ => {}
        }
    }
    Ok(point)
}

fn parse_time(text: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn local_name(e: &BytesStart<'_>) -> Result<String, ParseError> {
    local_name_end(e.name().as_ref())
}

fn local_name_end(name: &[u8]) -> Result<String, ParseError> {
    let name = std::str::from_utf8(name).map_err(invalid_gpx)?;
    Ok(name.rsplit(':').next().unwrap_or(name).to_string())
}

fn schema_location(e: &BytesStart<'_>) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(invalid_gpx)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(invalid_gpx)?;
        if key.rsplit(':').next() == Some("schemaLocation") {
            let value = std::str::from_utf8(&attr.value).map_err(invalid_gpx)?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

fn invalid_gpx(e: impl std::fmt::Display) -> ParseError {
    ParseError::InvalidGpx(e.to_string())
}
