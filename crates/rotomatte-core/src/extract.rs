use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::{Result, RotoError};
use crate::io::store::check_stage_name;
use crate::io::FrameStore;

/// External collaborator that decodes a video into an indexed image
/// sequence under one stage of a frame store.
pub trait SequenceExtractor {
    /// Returns the number of frames present in `stage` afterwards.
    fn extract(&self, video: &Path, store: &FrameStore, stage: &str) -> Result<usize>;
}

/// What an ffmpeg extraction writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// Decoded frames with codec motion vectors drawn over them.
    MotionVectors,
    /// Plain decoded color frames.
    Frames,
}

/// Runs `ffmpeg` to write one image per frame, named by the store's layout.
#[derive(Clone, Debug)]
pub struct FfmpegExtractor {
    pub program: PathBuf,
    pub extraction: Extraction,
    /// ffmpeg `-q:v` quality for the image encoder.
    pub quality: u8,
}

impl FfmpegExtractor {
    pub fn motion_vectors() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            extraction: Extraction::MotionVectors,
            quality: 2,
        }
    }

    pub fn frames() -> Self {
        Self {
            extraction: Extraction::Frames,
            ..Self::motion_vectors()
        }
    }

    /// Argument list for one extraction into `output_dir`.
    pub fn command_args(
        &self,
        video: &Path,
        store: &FrameStore,
        output_dir: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into()];
        if self.extraction == Extraction::MotionVectors {
            args.push("-flags2".into());
            args.push("+export_mvs".into());
        }
        args.push("-i".into());
        args.push(video.as_os_str().to_owned());
        if self.extraction == Extraction::MotionVectors {
            args.push("-vf".into());
            args.push("codecview=mv=pf+bf+bb".into());
        }
        args.push("-q:v".into());
        args.push(self.quality.to_string().into());
        args.push("-start_number".into());
        args.push(store.layout().origin.to_string().into());
        args.push(
            output_dir
                .join(store.layout().sequence_pattern())
                .into_os_string(),
        );
        args
    }
}

impl SequenceExtractor for FfmpegExtractor {
    fn extract(&self, video: &Path, store: &FrameStore, stage: &str) -> Result<usize> {
        check_stage_name(stage)?;
        let output_dir = store.stage_dir(stage);
        std::fs::create_dir_all(&output_dir)?;
        let args = self.command_args(video, store, &output_dir);
        info!(program = %self.program.display(), stage, "Extracting image sequence");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| {
                RotoError::Collaborator(format!("failed to start {}: {e}", self.program.display()))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.lines().rev().take(5).collect::<Vec<_>>().join(" | ");
            return Err(RotoError::Collaborator(format!(
                "{} exited with {}: {tail}",
                self.program.display(),
                output.status
            )));
        }
        Ok(store.list_frames(stage).len())
    }
}
