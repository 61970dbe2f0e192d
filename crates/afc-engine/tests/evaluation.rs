//! End-to-end evaluation scenarios on flat terrain

mod common;

use std::time::Instant;

use afc_core::channel_plan::{Channel, FrequencyRange};
use afc_core::config::{AfcConfig, DeviceDenyRule, InsideVolumePolicy, LosMode};
use afc_core::coordinates::GeoPolygon;
use afc_core::propagation::free_space_path_loss_db;
use afc_engine::incumbent::{ExclusionZone, PassiveRepeater, RepeaterKind, ZoneGeometry};
use afc_engine::prelude::*;
use afc_engine::response::VictimPath;

use common::*;

fn overlapping_channels(band: &FrequencyRange) -> usize {
    Channel::all_in_class(133)
        .iter()
        .filter(|c| c.range().overlaps(band))
        .count()
}

#[test]
fn test_clear_spectrum_gets_ceiling() {
    let response = evaluate(&request(), &snapshot(vec![], vec![]), &AfcConfig::default(), &EvaluateOptions::default())
        .unwrap();

    assert_eq!(response.channels.len(), Channel::all_in_class(133).len());
    for ch in &response.channels {
        assert_eirp(&ch.availability, 36.0);
    }
    assert_eq!(response.frequencies.len(), 1);
    assert_eq!(response.frequencies[0].range, FrequencyRange::new(6100.0, 6250.0));
    assert_eq!(response.frequencies[0].availability, Availability::MaxPsd { dbm_per_mhz: 23.0 });
    assert!(response.diagnostics.is_none());
}

#[test]
fn test_nearby_link_drops_overlapping_units() {
    let mut config = AfcConfig::default();
    config.propagation.los_mode = LosMode::AlwaysLos;
    let snapshot = snapshot(vec![link_toward_ap("WQ500", 500.0)], vec![]);

    let response = evaluate(&request(), &snapshot, &config, &EvaluateOptions::default()).unwrap();

    let total = Channel::all_in_class(133).len();
    assert_eq!(response.channels.len(), total - overlapping_channels(&LINK_BAND));
    for ch in &response.channels {
        let range = FrequencyRange::centered(ch.center_mhz, ch.bandwidth_mhz);
        assert!(!range.overlaps(&LINK_BAND));
        assert_eirp(&ch.availability, 36.0);
    }

    assert!(response.frequency_at(6175.0).is_none());
    let below = response.frequency_at(6120.0).unwrap();
    assert_eq!(below.range, FrequencyRange::new(6100.0, 6160.0));
    assert_eq!(below.availability.power(), Some(23.0));
    let above = response.frequency_at(6220.0).unwrap();
    assert_eq!(above.range, FrequencyRange::new(6190.0, 6250.0));
}

#[test]
fn test_exclusion_zone_blocks_its_band_only() {
    let zone = ExclusionZone {
        id: "RAS-GB".into(),
        name: "Green Bank".into(),
        band: FrequencyRange::new(6650.0, 6675.2),
        geometry: ZoneGeometry::Sphere {
            center: AP,
            height_amsl_m: 0.0,
            radius_m: 10_000.0,
        },
    };
    let snapshot = snapshot(vec![], vec![zone.clone()]);
    let response = evaluate(&request(), &snapshot, &AfcConfig::default(), &EvaluateOptions::default()).unwrap();

    let mut blocked = 0;
    for ch in &response.channels {
        let range = FrequencyRange::centered(ch.center_mhz, ch.bandwidth_mhz);
        if range.overlaps(&zone.band) {
            blocked += 1;
            assert_eq!(
                ch.availability,
                Availability::Unavailable {
                    reason: UnavailableReason::ExclusionZone
                }
            );
        } else {
            assert_eirp(&ch.availability, 36.0);
        }
    }
    assert_eq!(blocked, overlapping_channels(&zone.band));
    assert!(blocked > 0);

    // inquired slices sit below the zone's band
    assert_eq!(response.frequencies.len(), 1);
    assert!(response.frequencies[0].availability.is_available());
}

#[test]
fn test_receiver_inside_volume_blocks() {
    let mut config = AfcConfig::default();
    config.assembly.include_diagnostics = true;
    let snapshot = snapshot(vec![link_toward_ap("WQ0", 0.0)], vec![]);

    let response = evaluate(&request(), &snapshot, &config, &EvaluateOptions::default()).unwrap();

    for ch in &response.channels {
        let range = FrequencyRange::centered(ch.center_mhz, ch.bandwidth_mhz);
        if range.overlaps(&LINK_BAND) {
            assert_eq!(
                ch.availability,
                Availability::Unavailable {
                    reason: UnavailableReason::InsideVolume
                }
            );
        } else {
            assert_eirp(&ch.availability, 36.0);
        }
    }

    let diagnostics = response.diagnostics.unwrap();
    let direct = diagnostics
        .incumbents
        .iter()
        .find(|d| d.link_id == "WQ0" && d.path == VictimPath::Direct)
        .unwrap();
    assert!(direct.inside_volume);
    assert_eq!(direct.worst_in_db, None);
}

#[test]
fn test_ignore_policy_leaves_ceiling() {
    let mut config = AfcConfig::default();
    config.regulatory.inside_volume = InsideVolumePolicy::Ignore;
    let snapshot = snapshot(vec![link_toward_ap("WQ0", 0.0)], vec![]);

    let response = evaluate(&request(), &snapshot, &config, &EvaluateOptions::default()).unwrap();

    assert!(overlapping_channels(&LINK_BAND) > 0);
    assert_eq!(response.channels.len(), Channel::all_in_class(133).len());
    for ch in &response.channels {
        assert_eirp(&ch.availability, 36.0);
    }
}

fn diagnosed(config: &AfcConfig, links: Vec<FsLink>) -> (Vec<String>, usize) {
    let response = evaluate(&request(), &snapshot(links, vec![]), config, &EvaluateOptions::default()).unwrap();
    let diagnostics = response.diagnostics.unwrap();
    let mut ids: Vec<String> = diagnostics.incumbents.iter().map(|d| d.link_id.clone()).collect();
    ids.dedup();
    (ids, diagnostics.suppressed_incumbents)
}

#[test]
fn test_weak_distant_incumbent_suppressed() {
    let mut config = AfcConfig::default();
    config.assembly.include_diagnostics = true;

    // far beyond the radio horizon, I/N well under -18 dB
    let (ids, suppressed) = diagnosed(&config, vec![link_toward_ap("FAR", 120_000.0), link_toward_ap("NEAR", 3_000.0)]);
    assert_eq!(ids, vec!["NEAR".to_string()]);
    assert_eq!(suppressed, 1);
}

#[test]
fn test_short_range_exemption_keeps_incumbent() {
    let mut config = AfcConfig::default();
    config.assembly.include_diagnostics = true;
    config.assembly.visibility_threshold_db = 100.0;
    config.assembly.visibility_exemption_m = 5_000.0;

    let (ids, suppressed) = diagnosed(&config, vec![link_toward_ap("FAR", 120_000.0), link_toward_ap("NEAR", 3_000.0)]);
    assert_eq!(ids, vec!["NEAR".to_string()]);
    assert_eq!(suppressed, 1);
}

#[test]
fn test_inside_volume_incumbent_always_visible() {
    let mut config = AfcConfig::default();
    config.assembly.include_diagnostics = true;
    config.assembly.visibility_threshold_db = 100.0;
    config.assembly.visibility_exemption_m = 0.0;

    // receiver 20 m from the centre lies inside the 40 x 25 m ellipse
    let (ids, suppressed) = diagnosed(&config, vec![link_toward_ap("INSIDE", 20.0)]);
    assert_eq!(ids, vec!["INSIDE".to_string()]);
    assert_eq!(suppressed, 0);
}

#[test]
fn test_denied_device() {
    let mut config = AfcConfig::default();
    config.assembly.deny_devices.push(DeviceDenyRule {
        serial_number: Some("SN-42".into()),
        certification_id: None,
        frequencies: vec![FrequencyRange::new(6100.0, 6200.0)],
    });
    let response = evaluate(&request(), &snapshot(vec![], vec![]), &config, &EvaluateOptions::default()).unwrap();

    let denied = Availability::Unavailable {
        reason: UnavailableReason::DeniedDevice,
    };
    assert_eq!(response.frequency_at(6150.0).unwrap().availability, denied);
    assert_eq!(response.frequency_at(6210.0).unwrap().availability.power(), Some(23.0));
    for ch in &response.channels {
        let range = FrequencyRange::centered(ch.center_mhz, ch.bandwidth_mhz);
        assert_eq!(ch.availability == denied, range.overlaps(&FrequencyRange::new(6100.0, 6200.0)));
    }
}

#[test]
fn test_outside_boundary_rejected() {
    let mut config = AfcConfig::default();
    let far = AP.offset(100_000.0, 90.0);
    config.assembly.boundary.push(GeoPolygon::new(vec![
        far.offset(1_000.0, 0.0),
        far.offset(1_000.0, 120.0),
        far.offset(1_000.0, 240.0),
    ]));

    let err = evaluate(&request(), &snapshot(vec![], vec![]), &config, &EvaluateOptions::default()).unwrap_err();
    assert!(matches!(err, AfcError::Rejected { .. }));
}

#[test]
fn test_repeater_victim_reported_with_both_segments() {
    let rx = AP.offset(30_000.0, 200.0);
    let repeater = AP.offset(800.0, 90.0);
    let mut link = link_toward_ap("WQ-PR", 0.0);
    link.receiver.location = rx;
    link.transmitter.location = AP.offset(20_000.0, 45.0);
    link.repeaters = vec![PassiveRepeater {
        id: "PR1".into(),
        location: repeater,
        height_agl_m: 25.0,
        kind: RepeaterKind::Reflector {
            width_m: 6.0,
            height_m: 8.0,
        },
    }];

    let mut config = AfcConfig::default();
    config.assembly.include_diagnostics = true;
    let response = evaluate(&request(), &snapshot(vec![link], vec![]), &config, &EvaluateOptions::default()).unwrap();

    let diagnostics = response.diagnostics.unwrap();
    let via = diagnostics
        .incumbents
        .iter()
        .find(|d| {
            d.path
                == VictimPath::Repeater {
                    repeater_id: "PR1".into(),
                }
        })
        .unwrap();
    assert_eq!(via.link_id, "WQ-PR");
    assert!(via.min_distance_m > 700.0 && via.min_distance_m < 850.0);
    assert!(!via.inside_volume);

    let second_hop = free_space_path_loss_db(repeater.distance_to(&rx), LINK_BAND.center_mhz());
    assert!(via.path_loss_db.unwrap() > second_hop + 60.0);
}

#[test]
fn test_expired_deadline_cancels() {
    let err = evaluate(
        &request(),
        &snapshot(vec![], vec![]),
        &AfcConfig::default(),
        &EvaluateOptions::with_deadline(Instant::now()),
    )
    .unwrap_err();
    match err {
        AfcError::Cancelled { completed, total } => {
            assert_eq!(completed, 0);
            assert!(total > 0);
        }
        other => panic!("expected cancellation, got {other}"),
    }
}
