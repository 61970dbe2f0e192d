//! Evaluation entry points
//!
//! [`evaluate`] runs one request against one configuration and data
//! snapshot. [`AfcEngine`] adds a hot-swappable ruleset registry and
//! cumulative outcome counters on top.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use rayon::prelude::*;

use afc_core::antenna::AntennaResolver;
use afc_core::config::AfcConfig;
use afc_core::error::{AfcError, AfcResult};
use afc_core::observe::{DataQuality, EngineMetrics, EngineMetricsSnapshot};
use afc_core::propagation::PropagationEngine;
use afc_core::terrain::TerrainQuery;

use crate::assembler::{self, AssemblyInput};
use crate::incumbent::{IncumbentResolver, LinkGeometry};
use crate::request::ApRequest;
use crate::response::AvailabilityResponse;
use crate::scan::{HorizontalShape, ScanPointGenerator};
use crate::snapshot::DataSnapshot;
use crate::solver::{self, apply_post_solve, build_units, CouplingCalculator, PowerSolver, ScanOutcome, UnitLimit};

/// Per-call controls
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Abandon remaining scan points after this instant
    pub deadline: Option<Instant>,
    /// Abandon remaining scan points once set
    pub cancel: Option<Arc<AtomicBool>>,
}

impl EvaluateOptions {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn with_cancel(flag: Arc<AtomicBool>) -> Self {
        Self {
            deadline: None,
            cancel: Some(flag),
        }
    }

    fn should_stop(&self) -> bool {
        self.cancel.as_ref().map_or(false, |c| c.load(Ordering::Relaxed))
            || self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

/// Evaluate one request.
///
/// The configuration is validated, then the request is checked against its
/// ruleset, validated and pre-checked before any scan point is generated.
pub fn evaluate(
    request: &ApRequest,
    snapshot: &DataSnapshot,
    config: &AfcConfig,
    options: &EvaluateOptions,
) -> AfcResult<AvailabilityResponse> {
    config.validate()?;
    if request.ruleset_id != config.ruleset_id {
        return Err(AfcError::UnknownRuleset(request.ruleset_id.clone()));
    }
    request.validate()?;
    assembler::precheck(request, &config.assembly)?;

    let quality = DataQuality::new();
    let terrain = TerrainQuery::new(snapshot.terrain.as_ref(), &quality);

    let points = ScanPointGenerator::new(&config.scan, terrain).generate(request)?;
    let units = build_units(
        &request.channels(),
        &request.inquired_frequencies,
        config.regulatory.emission_mask,
    );
    let Some(span) = units.iter().map(|u| u.reach()).reduce(|a, b| a.union(&b)) else {
        return Err(AfcError::InvalidRequest("no evaluable channel or frequency".into()));
    };

    let shape = HorizontalShape::from_location(&request.location)?;
    let radius = config.incumbents.max_link_distance_m + shape.max_radius_m();
    let links = snapshot.incumbents.links_near(&shape.center(), radius, &span);
    let zones = assembler::zones_hit(&points, &snapshot.incumbents.zones_overlapping(&span));

    let antennas = AntennaResolver::new(&config.antenna, &snapshot.antennas, &quality);
    for link in &links {
        antennas.audit(&link.id, &link.receiver.antenna);
    }
    let geometries: Vec<LinkGeometry<'_>> = links.iter().map(|l| LinkGeometry::new(l, terrain)).collect();

    tracing::debug!(
        request_id = %request.request_id,
        scan_points = points.len(),
        units = units.len(),
        links = links.len(),
        zones = zones.len(),
        "evaluating"
    );

    let resolver = IncumbentResolver::new(&config.incumbents, &geometries, &shape);
    let propagation = PropagationEngine::new(&config.propagation, terrain);
    let coupling = CouplingCalculator::new(&config.regulatory, propagation, antennas, request);
    let power = PowerSolver::new(&config.regulatory, &units, coupling);

    let buffered: Vec<Option<AfcResult<ScanOutcome>>> = points
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            if options.should_stop() {
                return None;
            }
            let victims = resolver.resolve(point);
            Some(power.evaluate_point(i, point, &victims).map_err(AfcError::from))
        })
        .collect();

    let total = buffered.len();
    let completed = buffered.iter().filter(|o| o.is_some()).count();
    if completed < total {
        tracing::warn!(request_id = %request.request_id, completed, total, "evaluation cancelled");
        return Err(AfcError::Cancelled { completed, total });
    }
    let outcomes = buffered.into_iter().flatten().collect::<AfcResult<Vec<_>>>()?;

    let reduction = solver::reduce(units.len(), &outcomes);
    let mut decisions = Vec::with_capacity(units.len());
    for (unit, r) in units.iter().zip(&reduction.units) {
        let ceiling = UnitLimit::ceiling(&config.regulatory, unit.bandwidth_mhz());
        let limit = match r.bound {
            Some(b) => ceiling.min(UnitLimit::from_psd(b.psd_dbm_per_mhz, unit.bandwidth_mhz())),
            None => ceiling,
        };
        limit.verify(unit)?;
        decisions.push(apply_post_solve(
            &config.assembly.post_solve_order,
            &config.regulatory,
            unit,
            limit,
            r.inside_volume,
        ));
    }

    let response = assembler::assemble(&AssemblyInput {
        request,
        config,
        units: &units,
        decisions: &decisions,
        reduction: &reduction,
        links: &links,
        zones: &zones,
        scan_points: points.len(),
        data_quality: quality.snapshot(),
    });

    tracing::info!(
        request_id = %request.request_id,
        channels = response.channels.len(),
        frequency_ranges = response.frequencies.len(),
        scan_points = points.len(),
        clean = response.data_quality.is_clean(),
        "request evaluated"
    );
    Ok(response)
}

/// Ruleset registry and counters around [`evaluate`]
pub struct AfcEngine {
    rulesets: RwLock<HashMap<String, Arc<AfcConfig>>>,
    metrics: EngineMetrics,
}

impl Default for AfcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AfcEngine {
    pub fn new() -> Self {
        Self {
            rulesets: RwLock::new(HashMap::new()),
            metrics: EngineMetrics::new(),
        }
    }

    /// Engine with one validated ruleset installed
    pub fn with_config(config: AfcConfig) -> AfcResult<Self> {
        let engine = Self::new();
        engine.install(config)?;
        Ok(engine)
    }

    /// Validate and install (or replace) a ruleset. Requests already
    /// running keep the configuration they started with.
    pub fn install(&self, config: AfcConfig) -> AfcResult<()> {
        config.validate()?;
        let id = config.ruleset_id.clone();
        let mut rulesets = self.rulesets.write().unwrap_or_else(|e| e.into_inner());
        rulesets.insert(id.clone(), Arc::new(config));
        tracing::info!(ruleset = %id, "ruleset installed");
        Ok(())
    }

    pub fn remove(&self, ruleset_id: &str) -> Option<Arc<AfcConfig>> {
        self.rulesets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(ruleset_id)
    }

    pub fn ruleset(&self, ruleset_id: &str) -> Option<Arc<AfcConfig>> {
        self.rulesets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(ruleset_id)
            .cloned()
    }

    pub fn ruleset_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .rulesets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn evaluate(&self, request: &ApRequest, snapshot: &DataSnapshot) -> AfcResult<AvailabilityResponse> {
        self.evaluate_with(request, snapshot, &EvaluateOptions::default())
    }

    pub fn evaluate_with(
        &self,
        request: &ApRequest,
        snapshot: &DataSnapshot,
        options: &EvaluateOptions,
    ) -> AfcResult<AvailabilityResponse> {
        let result = match self.ruleset(&request.ruleset_id) {
            Some(config) => evaluate(request, snapshot, &config, options),
            None => Err(AfcError::UnknownRuleset(request.ruleset_id.clone())),
        };

        match &result {
            Ok(response) => {
                self.metrics.evaluated.inc();
                if let Some(d) = &response.diagnostics {
                    self.metrics.scan_points.inc_by(d.scan_points as u64);
                }
            }
            Err(e) if e.is_cancelled() => self.metrics.cancelled.inc(),
            Err(e) => match e.kind() {
                afc_core::error::ErrorKind::Request => self.metrics.rejected.inc(),
                _ => self.metrics.failed.inc(),
            },
        }
        result
    }

    pub fn metrics(&self) -> EngineMetricsSnapshot {
        self.metrics.snapshot()
    }
}
