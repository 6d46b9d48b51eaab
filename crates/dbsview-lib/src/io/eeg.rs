use crate::error::{Error, Result};
use crate::signal::{Channel, ElectrodeStream};
use csv::{ReaderBuilder, Trim};
use edf_reader::file_reader::SyncFileReader;
use edf_reader::sync_reader::SyncEDFReader;
use log::info;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Helper implementing the EDF reader trait for on-disk files.
struct DiskFileReader {
    path: PathBuf,
}

impl DiskFileReader {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SyncFileReader for DiskFileReader {
    fn read(&self, offset: u64, length: u64) -> std::result::Result<Vec<u8>, std::io::Error> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Load every signal of an EDF file as one referential stream.
///
/// All signals must share a sample rate.
pub fn load_edf_stream(path: &Path) -> Result<ElectrodeStream> {
    let origin = path.display().to_string();
    let reader = SyncEDFReader::init_with_file_reader(DiskFileReader::new(path))
        .map_err(|err| Error::malformed(&origin, err))?;
    let header = &reader.edf_header;
    if header.channels.is_empty() || header.block_duration == 0 {
        return Err(Error::EmptyResult(format!("{origin} holds no signals")));
    }
    let rates: Vec<f64> = header
        .channels
        .iter()
        .map(|ch| {
            ch.number_of_samples_in_data_record as f64 * 1000.0 / header.block_duration as f64
        })
        .collect();
    let fs = rates[0];
    if let Some(pos) = rates.iter().position(|&r| r != fs) {
        return Err(Error::malformed(
            &origin,
            format!(
                "signal '{}' is sampled at {} Hz, expected {} Hz",
                header.channels[pos].label.trim(),
                rates[pos],
                fs
            ),
        ));
    }
    let total_duration = header.block_duration * header.number_of_blocks;
    let data = reader
        .read_data_window(0, total_duration)
        .map_err(|err| Error::malformed(&origin, err))?;
    let channels = header
        .channels
        .iter()
        .zip(data)
        .map(|(ch, samples)| {
            Channel::new(
                ch.label.trim(),
                samples.into_iter().map(f64::from).collect(),
            )
        })
        .collect();
    let stream = ElectrodeStream::new(fs, channels)?;
    info!(
        "read {} signals x {} samples from {origin}",
        stream.channel_count(),
        stream.len()
    );
    Ok(stream)
}

/// Parse a referential recording laid out one column per channel, with a header row of
/// labels.
pub fn parse_electrode_csv<R: Read>(source: R, fs: f64, origin: &str) -> Result<ElectrodeStream> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source);
    let labels: Vec<String> = reader
        .headers()
        .map_err(|err| Error::malformed(origin, err))?
        .iter()
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        return Err(Error::EmptyResult(format!("{origin} has no channel columns")));
    }
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| Error::malformed(origin, err))?;
        for (col, field) in record.iter().enumerate() {
            let value = field.parse::<f64>().map_err(|_| {
                Error::malformed(
                    origin,
                    format!("row {}, column '{}': '{field}' is not a number", idx + 2, labels[col]),
                )
            })?;
            columns[col].push(value);
        }
    }
    let channels = labels
        .into_iter()
        .zip(columns)
        .map(|(label, data)| Channel::new(label, data))
        .collect();
    ElectrodeStream::new(fs, channels)
}

pub fn read_electrode_csv(path: &Path, fs: f64) -> Result<ElectrodeStream> {
    let file = File::open(path)?;
    let stream = parse_electrode_csv(file, fs, &path.display().to_string())?;
    info!(
        "read {} channels x {} samples from {}",
        stream.channel_count(),
        stream.len(),
        path.display()
    );
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_columns_become_channels() {
        let text = "E1, VREF\n1.0, 2.0\n3.0, 4.0\n";
        let stream = parse_electrode_csv(text.as_bytes(), 500.0, "inline").unwrap();
        assert_eq!(stream.names().collect::<Vec<_>>(), vec!["E1", "VREF"]);
        assert_eq!(stream.data("VREF"), Some(&[2.0, 4.0][..]));
        assert_eq!(stream.fs(), 500.0);
    }

    #[test]
    fn csv_rejects_text_samples() {
        let text = "A,B\n1.0,x\n";
        let err = parse_electrode_csv(text.as_bytes(), 500.0, "inline").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn csv_rejects_short_rows() {
        let text = "A,B\n1.0,2.0\n3.0\n";
        let err = parse_electrode_csv(text.as_bytes(), 500.0, "inline").unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }

    #[test]
    fn missing_edf_is_reported() {
        let err = load_edf_stream(Path::new("/nonexistent/recording.edf")).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { .. }));
    }
}
