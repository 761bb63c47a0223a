//! Decode boundary between loosely typed activity stream payloads and the
//! typed columns the pipeline consumes.
//!
//! The upstream activity API answers with streams keyed by name
//! (`{"time": {"data": [...]}, "latlng": {"data": [[lat, lng], ...]}}`) or,
//! without `key_by_type`, as a list of `{"type": ..., "data": [...]}` objects.
//! Individual elements stay untrusted until they are decoded here; anything
//! non-numeric becomes `None` and is dealt with by validation.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{TrackError, TrackResult};
use crate::types::RawSample;

pub const TIME_STREAM: &str = "time";
pub const LATLNG_STREAM: &str = "latlng";
pub const VELOCITY_STREAM: &str = "velocity_smooth";
pub const ALTITUDE_STREAM: &str = "altitude";

/// Parallel per-index columns, already decoded into Rust types.
///
/// `time` and `latlng` must have equal length; the optional columns may be
/// shorter or missing entirely.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleColumns {
    pub time: Vec<Option<f64>>,
    pub latlng: Vec<Option<(f64, f64)>>,
    pub velocity: Option<Vec<Option<f64>>>,
    pub altitude: Option<Vec<Option<f64>>>,
}

impl SampleColumns {
    /// Columns from fully populated time offsets and positions.
    pub fn new(time: Vec<f64>, latlng: Vec<(f64, f64)>) -> Self {
        Self {
            time: time.into_iter().map(Some).collect(),
            latlng: latlng.into_iter().map(Some).collect(),
            velocity: None,
            altitude: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec<f64>) -> Self {
        self.velocity = Some(velocity.into_iter().map(Some).collect());
        self
    }

    pub fn with_altitude(mut self, altitude: Vec<f64>) -> Self {
        self.altitude = Some(altitude.into_iter().map(Some).collect());
        self
    }

    /// Number of indices the pipeline will look at.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Fails with `LengthMismatch` when time and position columns disagree.
    pub fn check_lengths(&self) -> TrackResult<()> {
        if self.time.len() != self.latlng.len() {
            return Err(TrackError::LengthMismatch {
                time: self.time.len(),
                latlng: self.latlng.len(),
            });
        }
        Ok(())
    }

    /// Typed record for one index, or `None` when the offset or the position
    /// is missing. No range checks happen here.
    pub fn sample(&self, index: usize) -> Option<RawSample> {
        let offset_secs = (*self.time.get(index)?)?;
        let (latitude, longitude) = (*self.latlng.get(index)?)?;
        Some(RawSample {
            offset_secs,
            latitude,
            longitude,
            velocity: optional_entry(self.velocity.as_deref(), index),
            altitude: optional_entry(self.altitude.as_deref(), index),
        })
    }
}

fn optional_entry(column: Option<&[Option<f64>]>, index: usize) -> Option<f64> {
    column
        .and_then(|values| values.get(index).copied().flatten())
        .filter(|v| !v.is_nan())
}

/// One stream as returned by the activity API.
#[derive(Clone, Debug, Deserialize)]
pub struct ActivityStream {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Keyed(HashMap<String, ActivityStream>),
    Listed(Vec<ActivityStream>),
}

/// Parse a raw JSON payload into streams keyed by name.
pub fn parse_streams(payload: &str) -> TrackResult<HashMap<String, ActivityStream>> {
    let streams = match serde_json::from_str::<StreamPayload>(payload)? {
        StreamPayload::Keyed(map) => map,
        StreamPayload::Listed(list) => list
            .into_iter()
            .filter_map(|stream| stream.kind.clone().map(|kind| (kind, stream)))
            .collect(),
    };
    Ok(streams)
}

/// Build typed columns from keyed streams.
///
/// `time` and `latlng` are required; `velocity_smooth` and `altitude` are
/// optional and simply left out when absent or null.
pub fn columns_from_streams(streams: &HashMap<String, ActivityStream>) -> TrackResult<SampleColumns> {
    let time = required_array(streams, TIME_STREAM)?;
    let latlng = required_array(streams, LATLNG_STREAM)?;

    Ok(SampleColumns {
        time: time.iter().map(decode_number).collect(),
        latlng: latlng.iter().map(decode_latlng).collect(),
        velocity: optional_array(streams, VELOCITY_STREAM)?
            .map(|values| values.iter().map(decode_number).collect()),
        altitude: optional_array(streams, ALTITUDE_STREAM)?
            .map(|values| values.iter().map(decode_number).collect()),
    })
}

/// `parse_streams` followed by `columns_from_streams`.
pub fn columns_from_json(payload: &str) -> TrackResult<SampleColumns> {
    columns_from_streams(&parse_streams(payload)?)
}

fn required_array<'a>(
    streams: &'a HashMap<String, ActivityStream>,
    name: &str,
) -> TrackResult<&'a Vec<Value>> {
    optional_array(streams, name)?.ok_or_else(|| TrackError::MissingStream(name.to_string()))
}

fn optional_array<'a>(
    streams: &'a HashMap<String, ActivityStream>,
    name: &str,
) -> TrackResult<Option<&'a Vec<Value>>> {
    match streams.get(name).and_then(|s| s.data.as_ref()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values)),
        Some(_) => Err(TrackError::MalformedStream(name.to_string())),
    }
}

fn decode_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Exactly two numbers, otherwise nothing.
fn decode_latlng(value: &Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [lat, lng] => Some((lat.as_f64()?, lng.as_f64()?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyed_payload() -> String {
        json!({
            "time": {"type": "time", "data": [0, 1, 2.5, "x"]},
            "latlng": {"type": "latlng", "data": [[10.0, 20.0], [10.1, 20.1, 5.0], null, [10.3, 20.3]]},
            "velocity_smooth": {"type": "velocity_smooth", "data": [1.0, null]},
        })
        .to_string()
    }

    #[test]
    fn test_keyed_payload_decodes_loose_elements() {
        let columns = columns_from_json(&keyed_payload()).unwrap();
        assert_eq!(columns.time, vec![Some(0.0), Some(1.0), Some(2.5), None]);
        assert_eq!(columns.latlng, vec![Some((10.0, 20.0)), None, None, Some((10.3, 20.3))]);
        assert_eq!(columns.velocity, Some(vec![Some(1.0), None]));
        assert_eq!(columns.altitude, None);
    }

    #[test]
    fn test_listed_payload() {
        let payload = json!([
            {"type": "latlng", "data": [[1.0, 2.0]]},
            {"type": "time", "data": [0]},
            {"type": "altitude", "data": [12.5]},
        ])
        .to_string();
        let columns = columns_from_json(&payload).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.altitude, Some(vec![Some(12.5)]));
    }

    #[test]
    fn test_missing_required_stream() {
        let payload = json!({"time": {"data": [0, 1]}}).to_string();
        match columns_from_json(&payload) {
            Err(TrackError::MissingStream(name)) => assert_eq!(name, "latlng"),
            other => panic!("expected MissingStream, got {:?}", other),
        }

        let payload = json!({"time": {"data": null}, "latlng": {"data": []}}).to_string();
        assert!(matches!(
            columns_from_json(&payload),
            Err(TrackError::MissingStream(_))
        ));
    }

    #[test]
    fn test_malformed_stream() {
        let payload = json!({"time": {"data": 5}, "latlng": {"data": []}}).to_string();
        assert!(matches!(
            columns_from_json(&payload),
            Err(TrackError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(columns_from_json("[1, 2"), Err(TrackError::Decode(_))));
    }

    #[test]
    fn test_sample_defaults_and_nan() {
        let mut columns = SampleColumns::new(vec![0.0, 1.0, 2.0], vec![(1.0, 1.0); 3])
            .with_velocity(vec![4.0, f64::NAN]);
        columns.altitude = Some(vec![None, Some(7.0), Some(8.0)]);

        let s0 = columns.sample(0).unwrap();
        assert_eq!(s0.velocity, Some(4.0));
        assert_eq!(s0.altitude, None);

        let s1 = columns.sample(1).unwrap();
        assert_eq!(s1.velocity, None);
        assert_eq!(s1.altitude, Some(7.0));

        // velocity column shorter than time
        let s2 = columns.sample(2).unwrap();
        assert_eq!(s2.velocity, None);
        assert_eq!(s2.altitude, Some(8.0));
    }

    #[test]
    fn test_length_check() {
        let columns = SampleColumns {
            time: vec![Some(0.0), Some(1.0)],
            latlng: vec![Some((1.0, 1.0))],
            ..Default::default()
        };
        assert!(matches!(
            columns.check_lengths(),
            Err(TrackError::LengthMismatch { time: 2, latlng: 1 })
        ));
    }
}
