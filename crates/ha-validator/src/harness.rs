//! Orchestration of one validation run

use crate::config::HarnessConfig;
use crate::report::{CheckerSummary, RunReport, Verdict};
use chrono::Utc;
use ha_blueprint::{BlueprintDocument, BlueprintError};
use ha_bundle::{create_bundle, BundleError};
use ha_check::{invoke, Diagnostic, MarkerTable};
use ha_fixtures::{synthesize, SynthesisError};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a run stopped before a checker verdict
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

impl HarnessError {
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Blueprint(_) => Verdict::MalformedBlueprint,
            Self::Synthesis(_) => Verdict::UnsupportedSelector,
            Self::Bundle(_) => Verdict::BundleAssembly,
        }
    }
}

/// Runs read, synthesize, assemble, check and classify in sequence
#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
    markers: MarkerTable,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            markers: MarkerTable::default(),
        }
    }

    /// Replace the output marker table
    pub fn with_markers(mut self, markers: MarkerTable) -> Self {
        self.markers = markers;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Validate one blueprint file
    ///
    /// Always produces a report. Dropping the returned future kills a
    /// running checker and removes the bundle.
    pub async fn run(&self, blueprint_path: impl AsRef<Path>) -> RunReport {
        let blueprint_path = blueprint_path.as_ref();
        let start = Instant::now();
        let mut report = RunReport::new(blueprint_path.to_path_buf(), Utc::now());

        if let Err(e) = self.execute(blueprint_path, &mut report).await {
            warn!("Run stopped: {}", e);
            report.set_verdict(e.verdict());
            report.diagnostics.push(Diagnostic::error(e.to_string()));
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Validation of {:?} finished: {}",
            blueprint_path, report.verdict
        );
        report
    }

    async fn execute(&self, path: &Path, report: &mut RunReport) -> Result<(), HarnessError> {
        let blueprint = BlueprintDocument::load(path)?;
        report.blueprint_name = Some(blueprint.metadata().name.clone());
        info!(
            "Loaded blueprint '{}' with {} inputs",
            blueprint.metadata().name,
            blueprint.inputs().len()
        );

        let synthesis = synthesize(&blueprint, &self.config.overrides)?;
        report.fixture_count = synthesis.fixtures.len();
        report.inputs = Some(synthesis.assignment.clone());

        let roots = self.config.roots();
        let root = match &self.config.seed {
            Some(seed) => roots.root_for(seed),
            None => roots.next_root(),
        };
        let bundle = create_bundle(
            &root,
            &blueprint,
            &synthesis.assignment,
            &synthesis.fixtures,
        )?;

        if self.config.run_check_config {
            let run = invoke(&self.config.checker, bundle.root(), self.config.timeout).await;
            let outcome = self.markers.classify(&run, bundle.root());

            report.set_verdict(outcome.classification.into());
            report.diagnostics = outcome.diagnostics;
            report.checker = Some(CheckerSummary {
                command: run.command,
                status: outcome.status,
                duration_ms: u64::try_from(run.duration.as_millis()).unwrap_or(u64::MAX),
                output: outcome.output,
            });
        } else {
            debug!("Checker not requested");
            report.set_verdict(Verdict::Prepared);
        }

        if self.config.keep_bundle {
            report.bundle = Some(bundle.retain());
        } else if let Err(e) = bundle.cleanup() {
            // The verdict stands; a leftover temp dir is not a validation result
            warn!("{}", e);
        }
        Ok(())
    }
}
