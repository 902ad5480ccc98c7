use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::{Result, RotoError};
use crate::frame::{ColorFrame, FrameIndex};
use crate::io::image_io::load_color;
use crate::io::FrameStore;
use crate::segment::Segmenter;

use super::config::{ExistingPolicy, PipelineConfig, StageDefinition, StageKind};
use super::registry::StageRegistry;
use super::report::{
    ArtifactOutcome, ProducedFrame, RunReport, SkipReason, SkippedFrame, StageReport, StageStatus,
};
use super::transform::{transform_frame, StageContext};
use super::types::{CancelToken, NoOpReporter, ProgressReporter};

/// Assembles a [`Pipeline`] from configuration plus injected collaborators.
pub struct PipelineBuilder {
    config: PipelineConfig,
    segmenter: Option<Arc<dyn Segmenter>>,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancelToken,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            segmenter: None,
            reporter: Arc::new(NoOpReporter),
            cancel: CancelToken::new(),
        }
    }

    pub fn segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Validate the stage graph and set up the worker pool.
    pub fn build(self) -> Result<Pipeline> {
        let registry = StageRegistry::from_config(&self.config)?;
        if registry.needs_segmenter() && self.segmenter.is_none() {
            return Err(RotoError::Config(
                "a segment stage is configured but no segmenter was supplied".into(),
            ));
        }

        let pool = if self.config.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
                .map_err(|e| RotoError::Config(format!("cannot start worker pool: {e}")))?;
            Some(pool)
        } else {
            None
        };

        Ok(Pipeline {
            store: FrameStore::new(self.config.output_dir.clone(), self.config.layout.clone()),
            existing: self.config.existing,
            registry,
            segmenter: self.segmenter,
            reporter: self.reporter,
            cancel: self.cancel,
            pool,
            stage_locks: Mutex::new(HashMap::new()),
        })
    }
}

/// Runs registered stages over the frame store, in declared order.
pub struct Pipeline {
    registry: StageRegistry,
    store: FrameStore,
    existing: ExistingPolicy,
    segmenter: Option<Arc<dyn Segmenter>>,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancelToken,
    pool: Option<rayon::ThreadPool>,
    stage_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

enum FrameResult {
    Produced(ProducedFrame),
    Skipped(SkippedFrame),
}

impl Pipeline {
    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run every registered stage.
    pub fn run(&self) -> RunReport {
        self.execute(self.registry.stages().iter().collect())
    }

    /// Run a subset of stages, still in declared order.
    pub fn run_stages<S: AsRef<str>>(&self, names: &[S]) -> Result<RunReport> {
        let selected = self.registry.select(names)?;
        Ok(self.execute(selected))
    }

    pub fn run_stage(&self, name: &str) -> Result<RunReport> {
        self.run_stages(&[name])
    }

    fn execute(&self, stages: Vec<&StageDefinition>) -> RunReport {
        let mut run = RunReport::default();
        for def in stages {
            // Each stage finishes all writes before the next lists its upstream.
            let report = self.execute_stage(def);
            run.stages.push(report);
        }
        run.cancelled = self.cancel.is_cancelled();
        run
    }

    fn stage_lock(&self, stage: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .stage_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(stage.to_string()).or_default().clone()
    }

    fn execute_stage(&self, def: &StageDefinition) -> StageReport {
        let lock = self.stage_lock(&def.name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let start = Instant::now();

        let upstream = def.kind.inputs().iter().map(|s| s.to_string()).collect();
        let mut report = StageReport::new(&def.name, &def.kind.to_string(), upstream);
        report.status = StageStatus::Running;

        let primary = def.kind.primary();
        let primary_empty = self.store.list_frames(primary).is_empty();
        // Union of all inputs: a gap in any upstream is reported as a skip.
        let indices: Vec<FrameIndex> = if primary_empty {
            Vec::new()
        } else {
            def.kind
                .inputs()
                .iter()
                .flat_map(|stage| self.store.list_frames(stage))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        report.available = indices.len();
        self.reporter.begin_stage(&def.name, Some(indices.len()));
        info!(
            stage = %def.name,
            kind = %def.kind,
            frames = indices.len(),
            "Running stage"
        );

        if primary_empty {
            let prerequisite = self.registry.prerequisite(primary);
            warn!(
                stage = %def.name,
                upstream = primary,
                "Upstream has no frames; {prerequisite} has probably not run"
            );
            report.note = Some(format!(
                "no frames in '{primary}', likely missing prerequisite {prerequisite}"
            ));
            return self.abort(report, start);
        }

        let plate = match self.load_plate(&def.kind) {
            Ok(plate) => plate,
            Err(e) => {
                error!(stage = %def.name, error = %e, "Cannot load background plate");
                report.note = Some(format!("background plate unreadable: {e}"));
                return self.abort(report, start);
            }
        };

        let ctx = StageContext {
            store: &self.store,
            segmenter: self.segmenter.as_deref(),
            plate: plate.as_ref(),
        };
        let done = AtomicUsize::new(0);
        let process = |index: FrameIndex| {
            let result = self.process_frame(def, index, &ctx);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            self.reporter.advance(n);
            result
        };

        let results: Vec<FrameResult> = if indices.len() >= PARALLEL_FRAME_THRESHOLD {
            let run = || -> Vec<FrameResult> { indices.par_iter().map(|&i| process(i)).collect() };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        } else {
            indices.iter().map(|&i| process(i)).collect()
        };

        for result in results {
            match result {
                FrameResult::Produced(p) => report.produced.push(p),
                FrameResult::Skipped(s) => report.skipped.push(s),
            }
        }
        report.finish();
        report.elapsed_secs = start.elapsed().as_secs_f64();

        info!(
            stage = %def.name,
            produced = report.produced.len(),
            written = report.written(),
            unchanged = report.unchanged(),
            skipped = report.skipped.len(),
            fallbacks = report.fallbacks().len(),
            "Stage finished"
        );
        self.reporter.finish_stage(&report);
        report
    }

    fn abort(&self, mut report: StageReport, start: Instant) -> StageReport {
        report.aborted = true;
        report.finish();
        report.elapsed_secs = start.elapsed().as_secs_f64();
        self.reporter.finish_stage(&report);
        report
    }

    fn load_plate(&self, kind: &StageKind) -> Result<Option<ColorFrame>> {
        match kind {
            StageKind::Background { plate, .. } => Ok(Some(load_color(plate)?)),
            _ => Ok(None),
        }
    }

    fn process_frame(
        &self,
        def: &StageDefinition,
        index: FrameIndex,
        ctx: &StageContext<'_>,
    ) -> FrameResult {
        if self.cancel.is_cancelled() {
            return FrameResult::Skipped(SkippedFrame {
                index,
                reason: SkipReason::Cancelled,
                detail: "run cancelled before the frame started".into(),
            });
        }

        if self.existing == ExistingPolicy::Keep && self.store.has_frame(&def.name, index) {
            debug!(stage = %def.name, index, "Keeping existing artifact");
            return FrameResult::Produced(ProducedFrame {
                index,
                outcome: ArtifactOutcome::Kept,
                fallback: false,
            });
        }

        let result = transform_frame(&def.kind, index, ctx).and_then(|output| {
            let outcome = self.store.store(&def.name, index, &output.signal)?;
            Ok((outcome, output.used_fallback))
        });

        match result {
            Ok((outcome, fallback)) => {
                debug!(stage = %def.name, index, ?outcome, fallback, "Frame done");
                FrameResult::Produced(ProducedFrame {
                    index,
                    outcome: outcome.into(),
                    fallback,
                })
            }
            Err(e) => {
                let reason = e.skip_reason();
                if reason == SkipReason::ShapeIrreconcilable {
                    error!(stage = %def.name, index, error = %e, "Skipping frame");
                } else {
                    warn!(stage = %def.name, index, error = %e, "Skipping frame");
                }
                FrameResult::Skipped(SkippedFrame {
                    index,
                    reason,
                    detail: e.to_string(),
                })
            }
        }
    }
}

/// Build and run a pipeline with no collaborators and no progress reporting.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunReport> {
    let pipeline = PipelineBuilder::new(config.clone()).build()?;
    Ok(pipeline.run())
}
