use hand_guard::{FrameResult, FrameSource, GuardConfig, GuardError, HazardZone, ResultSink};
use image::RgbImage;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File extensions accepted by [`DirectoryFrameSource`]
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("No frames found in {0}")]
    NoFrames(PathBuf),
}

/// Load a configuration file, picking the format from the extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GuardConfig, CliError> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref)?;
    let config: GuardConfig = match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        _ => return Err(CliError::UnsupportedFileFormat),
    };
    config.validate()?;
    Ok(config)
}

/// Save a configuration file, picking the format from the extension
pub fn save_config<P: AsRef<Path>>(config: &GuardConfig, path: P) -> Result<(), CliError> {
    let path_ref = path.as_ref();
    let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::to_string_pretty(config)?,
        Some("json") => serde_json::to_string_pretty(config)?,
        _ => return Err(CliError::UnsupportedFileFormat),
    };
    fs::write(path_ref, content)?;
    Ok(())
}

/// Frames read from the image files of a directory, in file name order
pub struct DirectoryFrameSource {
    paths: std::vec::IntoIter<PathBuf>,
}

impl DirectoryFrameSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, CliError> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();

        if paths.is_empty() {
            return Err(CliError::NoFrames(dir.to_path_buf()));
        }
        paths.sort();
        info!(count = paths.len(), dir = %dir.display(), "frame directory opened");

        Ok(Self {
            paths: paths.into_iter(),
        })
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Option<hand_guard::Result<RgbImage>> {
        let path = self.paths.next()?;
        Some(
            image::open(&path)
                .map(|img| img.to_rgb8())
                .map_err(|err| GuardError::FrameSource(format!("{}: {err}", path.display()))),
        )
    }
}

/// Logs every result as a structured debug event.
///
/// Alert transitions are already reported by the state machine.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn publish(&mut self, result: &FrameResult, _zone: Option<&HazardZone>) -> hand_guard::Result<()> {
        debug!(
            sequence = result.sequence,
            status = %result.status,
            level = %result.level,
            distance = result.distance,
            transitioned = result.transitioned,
            "frame processed"
        );
        Ok(())
    }
}

/// Writes one JSON object per frame
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ResultSink for JsonLinesSink<W> {
    fn publish(&mut self, result: &FrameResult, _zone: Option<&HazardZone>) -> hand_guard::Result<()> {
        serde_json::to_writer(&mut self.writer, result)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Saves a GeoJSON overlay per frame as `frame_<sequence>.geojson`
pub struct GeoJsonOverlaySink {
    dir: PathBuf,
}

impl GeoJsonOverlaySink {
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, CliError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn path_for(&self, sequence: u64) -> PathBuf {
        self.dir.join(format!("frame_{sequence:06}.geojson"))
    }
}

impl ResultSink for GeoJsonOverlaySink {
    fn publish(&mut self, result: &FrameResult, zone: Option<&HazardZone>) -> hand_guard::Result<()> {
        result.save_geojson(zone, self.path_for(result.sequence))
    }
}
