use crate::error::{Error, Result};
use crate::signal::{Channel, ElectrodeStream};
use log::{info, warn};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const DEFAULT_SAMPLING_RATE: f64 = 250.0;

/// Parse a streaming export: `sampling_rate` plus an `IndefiniteStreaming` list of
/// `{Channel, TimeDomainData}` packets.
///
/// Packets of the same channel are concatenated in file order. Unusable packets are skipped.
pub fn parse_dbs_json(text: &str, default_rate: f64, origin: &str) -> Result<ElectrodeStream> {
    let doc: Value = serde_json::from_str(text).map_err(|err| Error::malformed(origin, err))?;
    let fs = match doc.get("sampling_rate") {
        None | Some(Value::Null) => default_rate,
        Some(value) => value.as_f64().ok_or_else(|| {
            Error::malformed(origin, format!("sampling_rate must be a number, got {value}"))
        })?,
    };
    if !(fs.is_finite() && fs > 0.0) {
        return Err(Error::malformed(
            origin,
            format!("sampling_rate must be positive, got {fs}"),
        ));
    }
    let packets = doc
        .get("IndefiniteStreaming")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::EmptyResult(format!("{origin} has no IndefiniteStreaming list")))?;

    let mut channels: Vec<Channel> = Vec::new();
    for (idx, packet) in packets.iter().enumerate() {
        let (Some(name), Some(data)) = (packet.get("Channel"), packet.get("TimeDomainData"))
        else {
            warn!("{origin}: packet {idx} lacks Channel or TimeDomainData, skipped");
            continue;
        };
        let name = match name {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        };
        let samples: Option<Vec<f64>> = data
            .as_array()
            .filter(|values| !values.is_empty())
            .and_then(|values| values.iter().map(Value::as_f64).collect());
        let Some(samples) = samples else {
            warn!("{origin}: packet {idx} ({name}) has no usable samples, skipped");
            continue;
        };
        match channels.iter_mut().find(|ch| ch.name == name) {
            Some(ch) => ch.data.extend(samples),
            None => channels.push(Channel::new(name, samples)),
        }
    }
    if channels.is_empty() {
        return Err(Error::EmptyResult(format!("{origin} has no usable DBS packets")));
    }

    let shortest = channels.iter().map(|ch| ch.data.len()).min().unwrap_or(0);
    if channels.iter().any(|ch| ch.data.len() != shortest) {
        warn!("{origin}: leads differ in length, truncating all to {shortest} samples");
        for ch in &mut channels {
            ch.data.truncate(shortest);
        }
    }
    info!(
        "{origin}: {} DBS leads, {shortest} samples at {fs} Hz",
        channels.len()
    );
    ElectrodeStream::new(fs, channels)
}

pub fn read_dbs_json(path: &Path, default_rate: f64) -> Result<ElectrodeStream> {
    let text = fs::read_to_string(path)?;
    parse_dbs_json(&text, default_rate, &path.display().to_string())
}
