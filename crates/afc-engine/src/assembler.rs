//! # Availability Assembler
//!
//! Request-level pre-checks run before any computation:
//!
//! - AP centre outside every ruleset boundary polygon → `OutsideBoundary`
//! - AP centre inside a denied region → `DeniedRegion`
//!
//! After solving, per-unit overrides apply in order: exclusion zones, then
//! the device deny list. Diagnostics for distant incumbents whose worst I/N
//! stays under the visibility threshold are suppressed.

use afc_core::config::{AfcConfig, AssemblyConfig};
use afc_core::error::{AfcError, AfcResult, RejectReason};
use afc_core::observe::DataQualityReport;

use crate::incumbent::{ExclusionZone, FsLink};
use crate::request::ApRequest;
use crate::response::{
    Availability, AvailabilityResponse, ChannelAvailability, Diagnostics, FrequencyAvailability,
    IncumbentDiagnostic, UnavailableReason, UnitConstraint,
};
use crate::scan::ScanPoint;
use crate::solver::{Reduction, Unit, UnitDecision, UnitKind};

/// Boundary and deny-region checks on the declared AP centre
pub fn precheck(request: &ApRequest, assembly: &AssemblyConfig) -> AfcResult<()> {
    let center = request
        .location
        .center()
        .ok_or_else(|| AfcError::InvalidRequest("location has no centre".into()))?;

    if !assembly.boundary.is_empty() && !assembly.boundary.iter().any(|b| b.contains(&center)) {
        return Err(AfcError::rejected(
            RejectReason::OutsideBoundary,
            format!("({:.6}, {:.6}) is outside the ruleset boundary", center.lat_deg, center.lon_deg),
        ));
    }
    if assembly.deny_regions.iter().any(|r| r.contains(&center)) {
        return Err(AfcError::rejected(
            RejectReason::DeniedRegion,
            format!("({:.6}, {:.6}) is inside a denied region", center.lat_deg, center.lon_deg),
        ));
    }
    Ok(())
}

/// Zones containing at least one scan point
pub fn zones_hit<'z>(points: &[ScanPoint], zones: &[&'z ExclusionZone]) -> Vec<&'z ExclusionZone> {
    zones
        .iter()
        .copied()
        .filter(|zone| points.iter().any(|p| zone.contains(p)))
        .collect()
}

/// Everything the assembler needs from one evaluation
pub struct AssemblyInput<'a> {
    pub request: &'a ApRequest,
    pub config: &'a AfcConfig,
    pub units: &'a [Unit],
    pub decisions: &'a [UnitDecision],
    pub reduction: &'a Reduction,
    pub links: &'a [&'a FsLink],
    pub zones: &'a [&'a ExclusionZone],
    pub scan_points: usize,
    pub data_quality: DataQualityReport,
}

/// Final per-unit availability, or `None` for a dropped unit
fn unit_availability(input: &AssemblyInput<'_>, unit: &Unit, decision: UnitDecision) -> Option<Availability> {
    if input.zones.iter().any(|z| z.band.overlaps(&unit.range)) {
        return Some(Availability::Unavailable {
            reason: UnavailableReason::ExclusionZone,
        });
    }
    let device = &input.request.device;
    let denied = input
        .config
        .assembly
        .deny_devices
        .iter()
        .any(|rule| rule.matches_device(&device.serial_number, &device.certification_id) && rule.covers(&unit.range));
    if denied {
        return Some(Availability::Unavailable {
            reason: UnavailableReason::DeniedDevice,
        });
    }

    match decision {
        UnitDecision::Limit(limit) => Some(limit.availability(unit, input.config.regulatory.power_accounting)),
        UnitDecision::Unavailable(reason) => Some(Availability::Unavailable { reason }),
        UnitDecision::Dropped => None,
    }
}

/// Merge adjacent slices with identical availability
pub fn merge_slices(slices: Vec<FrequencyAvailability>) -> Vec<FrequencyAvailability> {
    let mut merged: Vec<FrequencyAvailability> = Vec::with_capacity(slices.len());
    for slice in slices {
        match merged.last_mut() {
            Some(prev) if prev.range.high_mhz == slice.range.low_mhz && prev.availability == slice.availability => {
                prev.range.high_mhz = slice.range.high_mhz;
            }
            _ => merged.push(slice),
        }
    }
    merged
}

fn diagnostics(input: &AssemblyInput<'_>) -> Diagnostics {
    let assembly = &input.config.assembly;
    let mut incumbents = Vec::new();
    let mut suppressed = 0;
    for v in &input.reduction.victims {
        let visible = v.inside_volume
            || v.min_distance_m <= assembly.visibility_exemption_m
            || v.worst_in_db.map_or(false, |i| i >= assembly.visibility_threshold_db);
        if !visible {
            suppressed += 1;
            continue;
        }
        incumbents.push(IncumbentDiagnostic {
            link_id: input.links[v.link_index].id.clone(),
            path: v.path.clone(),
            min_distance_m: v.min_distance_m,
            worst_in_db: v.worst_in_db,
            inside_volume: v.inside_volume,
            model: v.model,
            path_loss_db: v.path_loss_db,
            rx_gain_dbi: v.rx_gain_dbi,
        });
    }

    let constraints = input
        .units
        .iter()
        .zip(&input.reduction.units)
        .map(|(unit, r)| UnitConstraint {
            unit: unit.label(),
            link_id: r.bound.map(|b| input.links[b.link_index].id.clone()),
            scan_point: r.scan_point,
        })
        .collect();

    Diagnostics {
        scan_points: input.scan_points,
        incumbents,
        suppressed_incumbents: suppressed,
        constraints,
    }
}

/// Build the response
pub fn assemble(input: &AssemblyInput<'_>) -> AvailabilityResponse {
    let mut channels = Vec::new();
    let mut slices = Vec::new();

    for (unit, decision) in input.units.iter().zip(input.decisions) {
        let Some(availability) = unit_availability(input, unit, *decision) else {
            continue;
        };
        match unit.kind {
            UnitKind::Channel(ch) => channels.push(ChannelAvailability {
                op_class: ch.op_class,
                channel: ch.index,
                center_mhz: ch.center_mhz,
                bandwidth_mhz: ch.bandwidth_mhz,
                availability,
            }),
            UnitKind::Slice => slices.push(FrequencyAvailability {
                range: unit.range,
                availability,
            }),
        }
    }

    let frequencies = if input.config.assembly.merge_frequency_slices {
        merge_slices(slices)
    } else {
        slices
    };

    AvailabilityResponse {
        request_id: input.request.request_id.clone(),
        ruleset_id: input.request.ruleset_id.clone(),
        channels,
        frequencies,
        data_quality: input.data_quality,
        diagnostics: input.config.assembly.include_diagnostics.then(|| diagnostics(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_request;
    use afc_core::channel_plan::FrequencyRange;
    use afc_core::coordinates::{GeoPoint, GeoPolygon};

    fn square(center: GeoPoint, half_m: f64) -> GeoPolygon {
        GeoPolygon::new(vec![
            center.from_local_offset(-half_m, -half_m),
            center.from_local_offset(half_m, -half_m),
            center.from_local_offset(half_m, half_m),
            center.from_local_offset(-half_m, half_m),
        ])
    }

    #[test]
    fn test_boundary_and_region() {
        let req = sample_request();
        let center = req.location.center().unwrap();

        let mut assembly = AssemblyConfig::default();
        assert!(precheck(&req, &assembly).is_ok());

        assembly.boundary = vec![square(center.offset(100_000.0, 90.0), 10_000.0)];
        let err = precheck(&req, &assembly).unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::OutsideBoundary));

        assembly.boundary = vec![square(center, 10_000.0)];
        assembly.deny_regions = vec![square(center, 500.0)];
        let err = precheck(&req, &assembly).unwrap_err();
        assert_eq!(err.reject_reason(), Some(RejectReason::DeniedRegion));
    }

    #[test]
    fn test_merge_slices() {
        let a = Availability::MaxPsd { dbm_per_mhz: 10.0 };
        let b = Availability::MaxPsd { dbm_per_mhz: 5.0 };
        let slice = |lo: f64, availability| FrequencyAvailability {
            range: FrequencyRange::new(lo, lo + 1.0),
            availability,
        };
        let merged = merge_slices(vec![
            slice(5925.0, a),
            slice(5926.0, a),
            slice(5927.0, b),
            slice(5929.0, b),
        ]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].range, FrequencyRange::new(5925.0, 5927.0));
        assert_eq!(merged[1].range, FrequencyRange::new(5927.0, 5928.0));
    }
}
