use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dbsview_lib::{
    config::{read_config, ViewerConfig},
    dbs::Hemisphere,
    markers::MarkedInterval,
    montage::{Montage, Region},
    selection::{DbsSelection, EegSelection},
    signal::{Channel, StreamKind},
    view::{ViewFrame, WindowLength},
    Session,
};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dbsview",
    version,
    about = "dbsview: EEG bipolar montage and DBS lead review tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EegGroup {
    All,
    LeftTemporal,
    CentralChain,
    RightTemporal,
}

impl From<EegGroup> for EegSelection {
    fn from(group: EegGroup) -> Self {
        match group {
            EegGroup::All => EegSelection::All,
            EegGroup::LeftTemporal => EegSelection::Region(Region::LeftTemporal),
            EegGroup::CentralChain => EegSelection::Region(Region::CentralChain),
            EegGroup::RightTemporal => EegSelection::Region(Region::RightTemporal),
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DbsGroup {
    Original,
    Montage,
    RightSide,
    LeftSide,
    RightOriginal,
    LeftOriginal,
    RightMontage,
    LeftMontage,
}

impl From<DbsGroup> for DbsSelection {
    fn from(group: DbsGroup) -> Self {
        match group {
            DbsGroup::Original => DbsSelection::Original,
            DbsGroup::Montage => DbsSelection::Montage,
            DbsGroup::RightSide => DbsSelection::Side(Hemisphere::Right),
            DbsGroup::LeftSide => DbsSelection::Side(Hemisphere::Left),
            DbsGroup::RightOriginal => DbsSelection::OriginalOnly(Hemisphere::Right),
            DbsGroup::LeftOriginal => DbsSelection::OriginalOnly(Hemisphere::Left),
            DbsGroup::RightMontage => DbsSelection::MontageOnly(Hemisphere::Right),
            DbsGroup::LeftMontage => DbsSelection::MontageOnly(Hemisphere::Left),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the bipolar montage from a raw referential EEG recording
    Montage {
        /// CSV with one column per raw electrode label
        #[arg(long, conflicts_with = "edf", requires = "fs")]
        input: Option<PathBuf>,
        /// Sample rate of the CSV recording (Hz)
        #[arg(long)]
        fs: Option<f64>,
        #[arg(long)]
        edf: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        z_threshold: Option<f64>,
        #[arg(long)]
        min_bipolar_std: Option<f64>,
    },
    /// Derive ZERO_ONE / ONE_TWO / TWO_THREE channels from a DBS streaming JSON export
    DbsMontage {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compute the display window for EEG and/or DBS after trim, filter and navigation
    View {
        #[arg(long, conflicts_with = "edf", requires = "fs")]
        eeg_csv: Option<PathBuf>,
        #[arg(long)]
        fs: Option<f64>,
        #[arg(long)]
        edf: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = EegGroup::All)]
        eeg_group: EegGroup,
        #[arg(long)]
        dbs_json: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = DbsGroup::Original)]
        dbs_group: DbsGroup,
        /// Hide samples before this index in every loaded recording
        #[arg(long)]
        trim: Option<usize>,
        /// Apply the band-pass filter (band from --lowcut/--highcut or the config)
        #[arg(long)]
        filter: bool,
        #[arg(long)]
        lowcut: Option<f64>,
        #[arg(long)]
        highcut: Option<f64>,
        #[arg(long, default_value_t = 0.0)]
        start_time: f64,
        #[arg(long)]
        window_s: Option<f64>,
        /// Navigate all loaded recordings by this many seconds
        #[arg(long, allow_hyphen_values = true)]
        shift: Option<f64>,
        /// Marked events CSV drawn on both recordings
        #[arg(long)]
        markers: Option<PathBuf>,
        /// Zoom clicks, positive in and negative out
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        zoom_steps: i32,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Edit a marked-events file: load, append, remove the last one, save
    Markers {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(
            long,
            num_args = 2,
            value_names = ["START", "END"],
            action = clap::ArgAction::Append,
            allow_hyphen_values = true
        )]
        add: Vec<f64>,
        #[arg(long)]
        undo: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Montage {
            input,
            fs,
            edf,
            config,
            z_threshold,
            min_bipolar_std,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(z) = z_threshold {
                cfg.montage.z_threshold = z;
            }
            if let Some(min_std) = min_bipolar_std {
                cfg.montage.min_bipolar_std = min_std;
            }
            let eeg = eeg_source(input, fs, edf)?
                .ok_or_else(|| anyhow!("--input or --edf is required"))?;
            cmd_montage(cfg, &eeg)?
        }
        Commands::DbsMontage { input, config } => {
            cmd_dbs_montage(load_config(config.as_deref())?, &input)?
        }
        Commands::View {
            eeg_csv,
            fs,
            edf,
            eeg_group,
            dbs_json,
            dbs_group,
            trim,
            filter,
            lowcut,
            highcut,
            start_time,
            window_s,
            shift,
            markers,
            zoom_steps,
            config,
        } => {
            let cfg = load_config(config.as_deref())?;
            let band = filter.then(|| {
                (
                    lowcut.unwrap_or(cfg.filter.lowcut_hz),
                    highcut.unwrap_or(cfg.filter.highcut_hz),
                )
            });
            let request = ViewRequest {
                eeg: eeg_source(eeg_csv, fs, edf)?,
                eeg_group: eeg_group.into(),
                dbs_json,
                dbs_group: dbs_group.into(),
                trim,
                band,
                start_time,
                window_s,
                shift,
                markers,
                zoom_steps,
            };
            cmd_view(cfg, request)?
        }
        Commands::Markers {
            input,
            add,
            undo,
            out,
        } => cmd_markers(input.as_deref(), &add, undo, out.as_deref())?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => {
            read_config(path).with_context(|| format!("reading config {}", path.display()))
        }
        None => Ok(ViewerConfig::default()),
    }
}

enum EegSource {
    Csv { path: PathBuf, fs: f64 },
    Edf(PathBuf),
}

fn eeg_source(
    csv: Option<PathBuf>,
    fs: Option<f64>,
    edf: Option<PathBuf>,
) -> Result<Option<EegSource>> {
    match (csv, edf) {
        (Some(path), None) => {
            let fs = fs.ok_or_else(|| anyhow!("--fs is required with a CSV recording"))?;
            Ok(Some(EegSource::Csv { path, fs }))
        }
        (None, Some(path)) => Ok(Some(EegSource::Edf(path))),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => bail!("give either a CSV or an EDF recording, not both"),
    }
}

fn load_eeg<'a>(session: &'a mut Session, source: &EegSource) -> Result<&'a Montage> {
    match source {
        EegSource::Csv { path, fs } => session
            .load_eeg_csv(path, *fs)
            .with_context(|| format!("loading EEG {}", path.display())),
        EegSource::Edf(path) => session
            .load_eeg_edf(path)
            .with_context(|| format!("loading EEG {}", path.display())),
    }
}

#[derive(Serialize)]
struct RegionSummary {
    region: &'static str,
    channels: Vec<String>,
}

#[derive(Serialize)]
struct MontageSummary {
    fs: f64,
    samples: usize,
    pairs: Vec<String>,
    regions: Vec<RegionSummary>,
    interpolated: Vec<String>,
    candidate_pairs: usize,
    flat_bipolar_channels: Vec<String>,
    omitted_electrodes: Vec<String>,
}

fn cmd_montage(cfg: ViewerConfig, source: &EegSource) -> Result<()> {
    let mut session = Session::new(cfg);
    let montage = load_eeg(&mut session, source)?;
    let report = montage.report().clone();
    let summary = MontageSummary {
        fs: montage.stream().fs(),
        samples: montage.stream().len(),
        pairs: montage.pairs().iter().map(|p| p.name()).collect(),
        regions: Region::ALL
            .into_iter()
            .map(|region| RegionSummary {
                region: region.label(),
                channels: montage.region_channels(region),
            })
            .collect(),
        interpolated: report.interpolated,
        candidate_pairs: report.candidate_pairs,
        flat_bipolar_channels: report.flat_bipolar_channels,
        omitted_electrodes: report.omitted_electrodes,
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

#[derive(Serialize)]
struct DbsSummary {
    fs: f64,
    samples: usize,
    raw_channels: Vec<String>,
    montage_channels: Vec<Channel>,
}

fn cmd_dbs_montage(cfg: ViewerConfig, input: &Path) -> Result<()> {
    let mut session = Session::new(cfg);
    let recording = session
        .load_dbs_json(input)
        .with_context(|| format!("loading DBS {}", input.display()))?;
    let stream = recording.stream();
    let summary = DbsSummary {
        fs: stream.fs(),
        samples: stream.len(),
        raw_channels: recording.raw_names().to_vec(),
        montage_channels: recording
            .montage_names()
            .iter()
            .filter_map(|name| stream.channel(name).cloned())
            .collect(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

struct ViewRequest {
    eeg: Option<EegSource>,
    eeg_group: EegSelection,
    dbs_json: Option<PathBuf>,
    dbs_group: DbsSelection,
    trim: Option<usize>,
    band: Option<(f64, f64)>,
    start_time: f64,
    window_s: Option<f64>,
    shift: Option<f64>,
    markers: Option<PathBuf>,
    zoom_steps: i32,
}

#[derive(Serialize)]
struct ViewOutput {
    eeg: Option<ViewFrame>,
    dbs: Option<ViewFrame>,
}

fn cmd_view(cfg: ViewerConfig, req: ViewRequest) -> Result<()> {
    if req.eeg.is_none() && req.dbs_json.is_none() {
        bail!("nothing to view: pass --eeg-csv/--edf and/or --dbs-json");
    }
    let mut session = Session::new(cfg);
    if let Some(source) = &req.eeg {
        load_eeg(&mut session, source)?;
    }
    if let Some(path) = &req.dbs_json {
        session
            .load_dbs_json(path)
            .with_context(|| format!("loading DBS {}", path.display()))?;
    }
    if let Some(path) = &req.markers {
        session
            .load_markers(path)
            .with_context(|| format!("loading markers {}", path.display()))?;
    }
    if let Some(seconds) = req.window_s {
        session.set_window_length(WindowLength::new(seconds)?);
    }

    let loaded: Vec<StreamKind> = StreamKind::ALL
        .into_iter()
        .filter(|kind| session.is_loaded(*kind))
        .collect();
    for &kind in &loaded {
        if let Some((lowcut, highcut)) = req.band {
            session.set_filter(kind, true, lowcut, highcut)?;
        }
        if let Some(start) = req.trim {
            session.set_trim(kind, start)?;
        }
        session.set_start_time(kind, req.start_time);
        let zoom = session.zoom(kind).stepped(req.zoom_steps);
        session.set_zoom(kind, zoom);
    }
    if let Some(delta) = req.shift {
        session.shift(delta);
    }
    info!(
        "window {} s, zoom steps {}",
        session.window().seconds(),
        req.zoom_steps
    );

    let output = ViewOutput {
        eeg: match req.eeg {
            Some(_) => Some(session.frame_eeg(req.eeg_group)?),
            None => None,
        },
        dbs: match req.dbs_json {
            Some(_) => Some(session.frame_dbs(req.dbs_group)?),
            None => None,
        },
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn cmd_markers(input: Option<&Path>, add: &[f64], undo: bool, out: Option<&Path>) -> Result<()> {
    let mut session = Session::default();
    if let Some(path) = input {
        session
            .load_markers(path)
            .with_context(|| format!("loading markers {}", path.display()))?;
    }
    for pair in add.chunks_exact(2) {
        session.add_marker(MarkedInterval::new(pair[0], pair[1]));
    }
    if undo && session.undo_marker().is_none() {
        info!("no marked event to remove");
    }
    if let Some(path) = out {
        session
            .save_markers(path)
            .with_context(|| format!("saving markers {}", path.display()))?;
    }
    println!("{}", serde_json::to_string(session.markers())?);
    Ok(())
}
