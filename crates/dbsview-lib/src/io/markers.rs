use crate::error::{Error, Result};
use crate::markers::{MarkedInterval, MarkerList};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::info;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const MARKER_HEADER: [&str; 2] = ["Start Time (s)", "End Time (s)"];

pub fn write_markers<W: Write>(sink: W, markers: &MarkerList) -> Result<()> {
    if markers.is_empty() {
        return Err(Error::EmptyResult("no marked events to save".to_string()));
    }
    let mut writer = WriterBuilder::new().from_writer(sink);
    let csv_err = |err: csv::Error| Error::malformed("marked events", err);
    writer.write_record(MARKER_HEADER).map_err(csv_err)?;
    for m in markers.iter() {
        writer
            .write_record([format!("{:.3}", m.start), format!("{:.3}", m.end)])
            .map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Rows with fewer than two fields are skipped; extra fields are ignored.
pub fn parse_markers<R: Read>(source: R, origin: &str) -> Result<MarkerList> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);
    let mut list = MarkerList::default();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| Error::malformed(origin, err))?;
        let (Some(start), Some(end)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let parse = |field: &str| {
            field.parse::<f64>().map_err(|_| {
                Error::malformed(origin, format!("row {}: '{field}' is not a time", idx + 2))
            })
        };
        list.push(MarkedInterval::new(parse(start)?, parse(end)?));
    }
    Ok(list)
}

/// Save the list. Nothing is created when the list is empty.
pub fn save_markers(path: &Path, markers: &MarkerList) -> Result<()> {
    if markers.is_empty() {
        return Err(Error::EmptyResult("no marked events to save".to_string()));
    }
    write_markers(File::create(path)?, markers)?;
    info!("saved {} marked events to {}", markers.len(), path.display());
    Ok(())
}

pub fn load_markers(path: &Path) -> Result<MarkerList> {
    let list = parse_markers(File::open(path)?, &path.display().to_string())?;
    info!("loaded {} marked events from {}", list.len(), path.display());
    Ok(list)
}
