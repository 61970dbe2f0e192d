//! # Interference Aggregator / Power Solver
//!
//! For each scan point and victim the closed-form PSD limit
//!
//! ```text
//! PSD = T + N - C - 10·log10(W)
//! ```
//!
//! is solved per unit, where `T` is the I/N threshold, `N` the receiver
//! noise over its band, `C` the net coupling and `W` the mask-weighted
//! overlap of the unit's emission with the receive band. The surviving
//! limit is the minimum over victims, then over scan points, bounded by the
//! regulatory ceiling and passed through the post-solve policy pipeline.
//!
//! Scan points are evaluated independently into [`ScanOutcome`] buffers;
//! [`reduce`] folds them sequentially in scan order.

pub mod coupling;
pub mod power;

pub use coupling::{Coupling, CouplingCalculator};
pub use power::{apply_post_solve, build_units, Unit, UnitDecision, UnitKind, UnitLimit};

use std::collections::BTreeMap;

use afc_core::config::{InsideVolumePolicy, RegulatoryConfig};
use afc_core::error::ComputationError;
use afc_core::link_budget::{interference_to_noise_db, solve_psd_limit};
use afc_core::propagation::ModelTag;

use crate::incumbent::Victim;
use crate::response::VictimPath;
use crate::scan::ScanPoint;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tightest limit on one unit at one scan point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointBound {
    pub psd_dbm_per_mhz: f64,
    pub link_index: usize,
}

/// What one victim looked like from one scan point
#[derive(Debug, Clone, PartialEq)]
pub struct VictimObservation {
    pub link_index: usize,
    pub path: VictimPath,
    pub distance_m: f64,
    pub inside_volume: bool,
    /// I/N at the PSD ceiling over the whole receive band
    pub in_at_ceiling_db: Option<f64>,
    pub model: Option<ModelTag>,
    pub path_loss_db: Option<f64>,
    pub rx_gain_dbi: Option<f64>,
}

/// Buffered result of one scan point
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub point_index: usize,
    /// Per unit; `None` when no victim constrains it
    pub bounds: Vec<Option<PointBound>>,
    /// Per unit; an inside-volume victim overlaps it
    pub inside_volume: Vec<bool>,
    pub observations: Vec<VictimObservation>,
}

/// Solves every unit at one scan point
pub struct PowerSolver<'a> {
    regulatory: &'a RegulatoryConfig,
    units: &'a [Unit],
    coupling: CouplingCalculator<'a>,
}

impl<'a> PowerSolver<'a> {
    pub fn new(
        regulatory: &'a RegulatoryConfig,
        units: &'a [Unit],
        coupling: CouplingCalculator<'a>,
    ) -> Self {
        Self {
            regulatory,
            units,
            coupling,
        }
    }

    pub fn evaluate_point(
        &self,
        point_index: usize,
        point: &ScanPoint,
        victims: &[Victim<'_>],
    ) -> Result<ScanOutcome, ComputationError> {
        let reg = self.regulatory;
        let mut outcome = ScanOutcome {
            point_index,
            bounds: vec![None; self.units.len()],
            inside_volume: vec![false; self.units.len()],
            observations: Vec::with_capacity(victims.len()),
        };

        for victim in victims {
            let link = victim.link();
            let link_index = victim.link_index;
            let band = link.band();

            if victim.inside_volume {
                if reg.inside_volume == InsideVolumePolicy::Ignore {
                    continue;
                }
                for (u, unit) in self.units.iter().enumerate() {
                    if unit.weighted_overlap_mhz(&band) > 0.0 {
                        outcome.inside_volume[u] = true;
                    }
                }
                outcome.observations.push(VictimObservation {
                    link_index,
                    path: victim.path(),
                    distance_m: victim.distance_m,
                    inside_volume: true,
                    in_at_ceiling_db: None,
                    model: None,
                    path_loss_db: None,
                    rx_gain_dbi: None,
                });
                continue;
            }

            let c = self.coupling.coupling(point, victim)?;
            for (u, unit) in self.units.iter().enumerate() {
                let w = unit.weighted_overlap_mhz(&c.band);
                let Some(psd) = solve_psd_limit(reg.in_threshold_db, c.noise_dbm, c.net_coupling_db, w) else {
                    continue;
                };
                if !psd.is_finite() {
                    tracing::error!(link = %link.id, unit = %unit.label(), "non-finite power bound");
                    return Err(ComputationError::NonFiniteBound {
                        incumbent: link.id.clone(),
                        unit: unit.label(),
                    });
                }
                let tighter = match outcome.bounds[u] {
                    Some(b) => psd < b.psd_dbm_per_mhz,
                    None => true,
                };
                if tighter {
                    outcome.bounds[u] = Some(PointBound {
                        psd_dbm_per_mhz: psd,
                        link_index,
                    });
                }
            }

            outcome.observations.push(VictimObservation {
                link_index,
                path: victim.path(),
                distance_m: victim.distance_m,
                inside_volume: false,
                in_at_ceiling_db: Some(interference_to_noise_db(
                    reg.max_psd_dbm_per_mhz,
                    c.noise_dbm,
                    c.net_coupling_db,
                    c.band.width_mhz(),
                )),
                model: Some(c.path_loss.model),
                path_loss_db: Some(c.total_path_loss_db),
                rx_gain_dbi: Some(c.rx_gain_dbi),
            });
        }
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Most restrictive scan point for one unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitReduction {
    pub bound: Option<PointBound>,
    pub scan_point: Option<usize>,
    pub inside_volume: bool,
}

/// Worst case of one victim across all scan points
#[derive(Debug, Clone, PartialEq)]
pub struct VictimSummary {
    pub link_index: usize,
    pub path: VictimPath,
    pub min_distance_m: f64,
    pub worst_in_db: Option<f64>,
    pub inside_volume: bool,
    pub model: Option<ModelTag>,
    pub path_loss_db: Option<f64>,
    pub rx_gain_dbi: Option<f64>,
}

/// Result of folding every [`ScanOutcome`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub units: Vec<UnitReduction>,
    /// Sorted by link, then path
    pub victims: Vec<VictimSummary>,
}

/// Fold outcomes in scan order; ties keep the earlier scan point
pub fn reduce(unit_count: usize, outcomes: &[ScanOutcome]) -> Reduction {
    let mut units = vec![UnitReduction::default(); unit_count];
    let mut victims: BTreeMap<(usize, VictimPath), VictimSummary> = BTreeMap::new();

    for outcome in outcomes {
        for (u, acc) in units.iter_mut().enumerate() {
            acc.inside_volume |= outcome.inside_volume[u];
            if let Some(b) = outcome.bounds[u] {
                let tighter = acc.bound.map_or(true, |cur| b.psd_dbm_per_mhz < cur.psd_dbm_per_mhz);
                if tighter {
                    acc.bound = Some(b);
                    acc.scan_point = Some(outcome.point_index);
                }
            }
        }

        for obs in &outcome.observations {
            let entry = victims
                .entry((obs.link_index, obs.path.clone()))
                .or_insert_with(|| VictimSummary {
                    link_index: obs.link_index,
                    path: obs.path.clone(),
                    min_distance_m: obs.distance_m,
                    worst_in_db: None,
                    inside_volume: false,
                    model: None,
                    path_loss_db: None,
                    rx_gain_dbi: None,
                });
            entry.min_distance_m = entry.min_distance_m.min(obs.distance_m);
            entry.inside_volume |= obs.inside_volume;
            if let Some(i_n) = obs.in_at_ceiling_db {
                if entry.worst_in_db.map_or(true, |w| i_n > w) {
                    entry.worst_in_db = Some(i_n);
                    entry.model = obs.model;
                    entry.path_loss_db = obs.path_loss_db;
                    entry.rx_gain_dbi = obs.rx_gain_dbi;
                }
            }
        }
    }

    Reduction {
        units,
        victims: victims.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(point_index: usize, psd: Option<f64>, inside: bool) -> ScanOutcome {
        ScanOutcome {
            point_index,
            bounds: vec![psd.map(|p| PointBound {
                psd_dbm_per_mhz: p,
                link_index: 0,
            })],
            inside_volume: vec![inside],
            observations: vec![VictimObservation {
                link_index: 0,
                path: VictimPath::Direct,
                distance_m: 1_000.0 + point_index as f64,
                inside_volume: inside,
                in_at_ceiling_db: psd.map(|p| -p),
                model: Some(ModelTag::FreeSpace),
                path_loss_db: Some(100.0),
                rx_gain_dbi: Some(30.0),
            }],
        }
    }

    #[test]
    fn test_reduce_takes_minimum_in_scan_order() {
        let outcomes = vec![
            outcome(0, Some(12.0), false),
            outcome(1, Some(4.0), false),
            outcome(2, Some(4.0), false),
            outcome(3, None, true),
        ];
        let r = reduce(1, &outcomes);
        let u = r.units[0];
        assert_eq!(u.bound.unwrap().psd_dbm_per_mhz, 4.0);
        assert_eq!(u.scan_point, Some(1));
        assert!(u.inside_volume);

        assert_eq!(r.victims.len(), 1);
        let v = &r.victims[0];
        assert_eq!(v.min_distance_m, 1_000.0);
        assert_eq!(v.worst_in_db, Some(-4.0));
        assert!(v.inside_volume);
    }

    #[test]
    fn test_reduce_unconstrained() {
        let r = reduce(1, &[outcome(0, None, false)]);
        assert_eq!(r.units[0], UnitReduction::default());
        assert_eq!(r.victims[0].worst_in_db, None);
    }
}
