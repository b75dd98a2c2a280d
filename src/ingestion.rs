//! Point-stream ingestion adapters.
//!
//! The core only ever consumes a normalized `(lat, lng, t, d)` point
//! stream; everything upstream of that — format detection, elevation,
//! heart rate, pace — belongs to a producer outside this crate. These
//! adapters project the two point-bearing GPX element types, plus a
//! single decoded FIT sample, into that stream.

use crate::align::Point;
use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

/// One degree of FIT's semicircle position unit, in degrees. FIT stores
/// lat/lng as `i32` semicircles; dividing by this constant yields decimal
/// degrees.
const FIT_SEMICIRCLE_TO_DEGREES: f64 = 11_930_465.0;

/// Stream every `<trkpt>`/`<rtept>` element out of a GPX document into the
/// engine's point shape. `t` is the parsed `<time>` child as UNIX seconds
/// when present, else `0.0`. `d` is the parsed `<cmt>` child, read as
/// kilometers-in-text (the convention some GPX producers use to stash
/// distance-from-start in the comment field) and converted to meters;
/// absent a `<cmt>`, `d` is `0.0` and it's the caller's job to recompute
/// cumulative distance.
pub fn project_gpx(bytes: &[u8]) -> Result<Vec<Point>, quick_xml::Error> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut points = Vec::new();
    let mut in_point = false;
    let mut lat: Option<f64> = None;
    let mut lng: Option<f64> = None;
    let mut capture_target: Option<&'static str> = None;
    let mut time_text = String::new();
    let mut cmt_text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = local_name(e.name().as_ref());
                match tag.as_str() {
                    "trkpt" | "rtept" => {
                        in_point = true;
                        lat = find_attr(e, b"lat");
                        lng = find_attr(e, b"lon");
                        time_text.clear();
                        cmt_text.clear();
                    }
                    "time" if in_point => capture_target = Some("time"),
                    "cmt" if in_point => capture_target = Some("cmt"),
                    _ => {}
                }
            }
            Event::Text(e) => {
                if let Some(target) = capture_target {
                    let text = e.unescape()?;
                    match target {
                        "time" => time_text.push_str(&text),
                        "cmt" => cmt_text.push_str(&text),
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                let tag = local_name(e.name().as_ref());
                match tag.as_str() {
                    "time" | "cmt" => capture_target = None,
                    "trkpt" | "rtept" => {
                        if let (Some(lat), Some(lng)) = (lat, lng) {
                            let t = parse_timestamp(&time_text).unwrap_or(0.0);
                            let d = cmt_text
                                .trim()
                                .parse::<f64>()
                                .map(|km| km * 1000.0)
                                .unwrap_or(0.0);
                            points.push(Point::new(lat, lng, t, d));
                        } else {
                            warn!("skipping point with missing lat/lon");
                        }
                        in_point = false;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(points)
}

fn local_name(qualified: &[u8]) -> String {
    let s = String::from_utf8_lossy(qualified);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

fn find_attr(e: &quick_xml::events::BytesStart, name: &[u8]) -> Option<f64> {
    e.attributes().find_map(|a| {
        a.ok().and_then(|attr| {
            if attr.key.as_ref() == name {
                std::str::from_utf8(&attr.value).ok()?.parse::<f64>().ok()
            } else {
                None
            }
        })
    })
}

/// Parse an ISO-8601 GPX timestamp (`2024-05-01T08:00:00Z`) into UNIX
/// seconds.
fn parse_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(text).ok()?;
    let secs = parsed.timestamp() as f64;
    let subsec = parsed.timestamp_subsec_nanos() as f64 / 1_000_000_000.0;
    Some(secs + subsec)
}

/// Project one decoded FIT `record` message into the engine's point shape.
/// `position_lat`/`position_long` are FIT semicircles, `timestamp` is
/// already UNIX seconds, `distance` is FIT's native millimeters. A full FIT
/// stream decoder isn't part of this crate — callers own decoding and hand
/// in already-parsed fields one record at a time.
pub fn project_fit_point(
    position_lat: i32,
    position_long: i32,
    timestamp: f64,
    distance_mm: f64,
) -> Point {
    Point::new(
        position_lat as f64 / FIT_SEMICIRCLE_TO_DEGREES,
        position_long as f64 / FIT_SEMICIRCLE_TO_DEGREES,
        timestamp,
        distance_mm / 1000.0,
    )
}
