use std::collections::HashSet;

use crate::error::{Result, RotoError};
use crate::io::store::check_stage_name;
use crate::refine::ThresholdMethod;

use super::config::{PipelineConfig, StageDefinition, StageKind};

/// Validated mapping from stage name to its upstream stages and transform.
///
/// Built once from a [`PipelineConfig`]; every declared upstream is known to
/// be either an external source or another registered stage.
#[derive(Clone, Debug)]
pub struct StageRegistry {
    sources: Vec<String>,
    stages: Vec<StageDefinition>,
}

impl StageRegistry {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.sources.clone(), config.stages.clone())
    }

    pub fn new(sources: Vec<String>, stages: Vec<StageDefinition>) -> Result<Self> {
        let mut source_names = HashSet::new();
        for source in &sources {
            check_stage_name(source)?;
            source_names.insert(source.as_str());
        }

        let mut stage_names = HashSet::new();
        for stage in &stages {
            check_stage_name(&stage.name)?;
            if source_names.contains(stage.name.as_str()) {
                return Err(RotoError::Config(format!(
                    "stage '{}' would overwrite the external source of the same name",
                    stage.name
                )));
            }
            if !stage_names.insert(stage.name.as_str()) {
                return Err(RotoError::Config(format!(
                    "stage '{}' is declared twice",
                    stage.name
                )));
            }
        }

        for stage in &stages {
            for input in stage.kind.inputs() {
                if input == stage.name {
                    return Err(RotoError::Config(format!(
                        "stage '{}' reads its own output",
                        stage.name
                    )));
                }
                if !source_names.contains(input) && !stage_names.contains(input) {
                    return Err(RotoError::Config(format!(
                        "stage '{}' reads unknown stage '{input}'",
                        stage.name
                    )));
                }
            }
            validate_kind(&stage.name, &stage.kind)?;
        }

        Ok(Self { sources, stages })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn get(&self, name: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn is_source(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s == name)
    }

    /// The named stages, in declared order regardless of the order asked for.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&StageDefinition>> {
        for name in names {
            let name = name.as_ref();
            if self.get(name).is_none() {
                return Err(RotoError::Config(format!("unknown stage '{name}'")));
            }
        }
        Ok(self
            .stages
            .iter()
            .filter(|s| names.iter().any(|n| n.as_ref() == s.name))
            .collect())
    }

    /// Human-readable description of what should have produced `stage`.
    pub fn prerequisite(&self, stage: &str) -> String {
        match self.get(stage) {
            Some(def) => format!("stage '{}' ({})", def.name, def.kind),
            None if self.is_source(stage) => format!("external source '{stage}'"),
            None => format!("'{stage}'"),
        }
    }

    pub fn needs_segmenter(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s.kind, StageKind::Segment { .. }))
    }
}

fn validate_kind(name: &str, kind: &StageKind) -> Result<()> {
    let invalid = |msg: String| Err(RotoError::Config(format!("stage '{name}': {msg}")));
    match kind {
        StageKind::Refine { refine, .. } => {
            if let ThresholdMethod::Adaptive { block_size, .. } = refine.threshold {
                if block_size < 3 || block_size % 2 == 0 {
                    return invalid(format!(
                        "adaptive block size must be odd and >= 3, got {block_size}"
                    ));
                }
            }
            if let Some(ref smoothing) = refine.smoothing {
                if !(smoothing.sigma > 0.0) {
                    return invalid(format!(
                        "smoothing sigma must be positive, got {}",
                        smoothing.sigma
                    ));
                }
            }
        }
        StageKind::EdgeRefine { edges, .. } => {
            edges
                .validate()
                .map_err(|e| RotoError::Config(format!("stage '{name}': {e}")))?;
        }
        StageKind::Background { plate, .. } => {
            if !plate.is_file() {
                return invalid(format!("background plate {} not found", plate.display()));
            }
        }
        StageKind::Overlay { weight, .. } => {
            if !(0.0..=1.0).contains(weight) {
                return invalid(format!("overlay weight must be in [0, 1], got {weight}"));
            }
        }
        StageKind::Segment { segment, .. } => {
            if let Some(t) = segment.confidence_threshold {
                if !(0.0..=1.0).contains(&t) {
                    return invalid(format!("confidence threshold must be in [0, 1], got {t}"));
                }
            }
        }
        StageKind::Cutout { .. } | StageKind::Subtract { .. } => {}
    }
    Ok(())
}
