use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_FRAME_ORIGIN, DEFAULT_FRAME_WIDTH, RECOGNISED_EXTENSIONS};
use crate::error::{Result, RotoError};
use crate::frame::{FrameIndex, ImageSignal};

use super::image_io::{decode_signal, encode_signal, format_for_path};

/// How per-frame artifact files are named inside a stage directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    /// File name prefix before the numeric suffix.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Zero-padded width of the numeric suffix.
    #[serde(default = "default_width")]
    pub width: usize,
    /// Extension (and format) of written artifacts.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Index of the first frame in externally produced sequences.
    #[serde(default = "default_origin")]
    pub origin: FrameIndex,
}

fn default_prefix() -> String {
    "frame_".into()
}
fn default_width() -> usize {
    DEFAULT_FRAME_WIDTH
}
fn default_extension() -> String {
    "png".into()
}
fn default_origin() -> FrameIndex {
    DEFAULT_FRAME_ORIGIN
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            width: default_width(),
            extension: default_extension(),
            origin: default_origin(),
        }
    }
}

impl FrameLayout {
    /// Canonical file name for a frame, e.g. `frame_0007.png`.
    pub fn file_name(&self, index: FrameIndex) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            self.extension,
            width = self.width
        )
    }

    /// `printf`-style sequence pattern understood by external tools,
    /// e.g. `frame_%04d.png`.
    pub fn sequence_pattern(&self) -> String {
        format!("{}%0{}d.{}", self.prefix, self.width, self.extension)
    }

    /// Parse the frame index out of a file name, if it belongs to this layout.
    pub fn parse_index(&self, file_name: &str) -> Option<FrameIndex> {
        let rest = file_name.strip_prefix(self.prefix.as_str())?;
        let (digits, ext) = rest.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if ext != self.extension.to_ascii_lowercase()
            && !RECOGNISED_EXTENSIONS.contains(&ext.as_str())
        {
            return None;
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Only the layout's own padding maps back to a file: `frame_1.png`
        // and `frame_00001.png` are not frame 1 of a width-4 layout.
        let index: FrameIndex = digits.parse().ok()?;
        (format!("{index:0width$}", width = self.width) == digits).then_some(index)
    }
}

/// Result of persisting an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOutcome {
    /// A new or changed artifact was committed.
    Written,
    /// The stored artifact already had identical content and was left untouched.
    Unchanged,
}

/// Summary of one stage directory.
#[derive(Clone, Debug, Serialize)]
pub struct StageInventory {
    pub stage: String,
    pub frames: usize,
    pub first: Option<FrameIndex>,
    pub last: Option<FrameIndex>,
    pub sample: Option<PathBuf>,
    pub sample_bytes: u64,
    pub sample_modified: Option<SystemTime>,
}

/// Owns the mapping from (stage, frame index) to artifact files under a root
/// directory: `<root>/<stage>/<prefix><index>.<ext>`.
#[derive(Clone, Debug)]
pub struct FrameStore {
    root: PathBuf,
    layout: FrameLayout,
}

impl FrameStore {
    pub fn new(root: impl Into<PathBuf>, layout: FrameLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn stage_dir(&self, stage: &str) -> PathBuf {
        self.root.join(stage)
    }

    /// Path an artifact is written to.
    pub fn frame_path(&self, stage: &str, index: FrameIndex) -> PathBuf {
        self.stage_dir(stage).join(self.layout.file_name(index))
    }

    /// Find the file holding a frame: the canonical path first, then any
    /// file in the stage directory that `list_frames` would report as `index`.
    fn locate(&self, stage: &str, index: FrameIndex) -> Option<PathBuf> {
        let canonical = self.frame_path(stage, index);
        if canonical.is_file() {
            return Some(canonical);
        }
        std::fs::read_dir(self.stage_dir(stage))
            .ok()?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .find(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|name| self.layout.parse_index(name))
                    == Some(index)
            })
            .map(|e| e.path())
    }

    /// Frame indices present for a stage, ascending. Empty when the stage
    /// directory does not exist or cannot be read.
    pub fn list_frames(&self, stage: &str) -> Vec<FrameIndex> {
        let Ok(entries) = std::fs::read_dir(self.stage_dir(stage)) else {
            return Vec::new();
        };
        let mut indices: Vec<FrameIndex> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|name| self.layout.parse_index(name))
            })
            .collect();
        // Numeric sort: suffixes of differing widths must still order correctly.
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn has_frame(&self, stage: &str, index: FrameIndex) -> bool {
        self.locate(stage, index).is_some()
    }

    pub fn load(&self, stage: &str, index: FrameIndex) -> Result<ImageSignal> {
        let path = self
            .locate(stage, index)
            .ok_or_else(|| RotoError::ArtifactMissing {
                stage: stage.to_string(),
                index,
            })?;
        let bytes = std::fs::read(&path)?;
        if bytes.is_empty() {
            return Err(RotoError::ArtifactUnreadable {
                stage: stage.to_string(),
                index,
                reason: "empty file".into(),
            });
        }
        decode_signal(&bytes).map_err(|e| RotoError::ArtifactUnreadable {
            stage: stage.to_string(),
            index,
            reason: e.to_string(),
        })
    }

    /// Persist an artifact. The file is staged in a temporary sibling and
    /// renamed into place, so readers never observe a partial file. When the
    /// existing artifact already holds the same bytes nothing is touched.
    pub fn store(
        &self,
        stage: &str,
        index: FrameIndex,
        signal: &ImageSignal,
    ) -> Result<StoreOutcome> {
        check_stage_name(stage)?;
        let dir = self.stage_dir(stage);
        std::fs::create_dir_all(&dir)?;

        let path = self.frame_path(stage, index);
        let bytes = encode_signal(signal, format_for_path(&path)?)?;

        if let Ok(existing) = std::fs::read(&path) {
            if existing == bytes {
                debug!(stage, index, "Artifact unchanged");
                return Ok(StoreOutcome::Unchanged);
            }
        }

        let mut tmp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| RotoError::Io(e.error))?;
        Ok(StoreOutcome::Written)
    }

    /// Stage directories under the root, sorted by name.
    pub fn stages(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    pub fn inventory(&self) -> Vec<StageInventory> {
        self.stages()
            .into_iter()
            .map(|stage| {
                let frames = self.list_frames(&stage);
                let sample = frames.first().and_then(|&i| self.locate(&stage, i));
                let meta = sample.as_ref().and_then(|p| std::fs::metadata(p).ok());
                StageInventory {
                    frames: frames.len(),
                    first: frames.first().copied(),
                    last: frames.last().copied(),
                    sample_bytes: meta.as_ref().map(|m| m.len()).unwrap_or(0),
                    sample_modified: meta.and_then(|m| m.modified().ok()),
                    sample,
                    stage,
                }
            })
            .collect()
    }

    /// Delete every artifact of one stage. Other stages are never touched.
    /// Returns the number of files removed.
    pub fn clear_stage(&self, stage: &str) -> Result<usize> {
        check_stage_name(stage)?;
        let dir = self.stage_dir(stage);
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if self.layout.parse_index(name).is_some() {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            } else if is_staging_file(name) {
                // Left behind by a write that never reached its rename.
                debug!(stage, file = name, "Removing stale staging file");
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(removed)
    }
}

const STAGING_PREFIX: &str = ".";
const STAGING_SUFFIX: &str = ".tmp";

fn is_staging_file(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
}

/// Stage names are single path components.
pub fn check_stage_name(stage: &str) -> Result<()> {
    let valid = !stage.is_empty()
        && stage != "."
        && stage != ".."
        && !stage.contains(['/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(RotoError::Config(format!("invalid stage name '{stage}'")))
    }
}
