//! Properties that hold for any evaluation

mod common;

use std::collections::HashMap;

use afc_core::config::AfcConfig;
use afc_core::observe::DataQuality;
use afc_core::terrain::TerrainQuery;
use afc_engine::prelude::*;
use afc_engine::scan::ScanPointGenerator;
use approx::assert_relative_eq;
use proptest::prelude::*;

use common::*;

fn run(request: &ApRequest, snapshot: &DataSnapshot, config: &AfcConfig) -> AvailabilityResponse {
    evaluate(request, snapshot, config, &EvaluateOptions::default()).unwrap()
}

fn unmerged(mut config: AfcConfig) -> AfcConfig {
    config.assembly.merge_frequency_slices = false;
    config
}

#[test]
fn test_result_is_minimum_over_single_points() {
    let config = unmerged(config_without_floors());
    let snapshot = snapshot(vec![link_toward_ap("WQ2K", 2_000.0)], vec![]);
    let full_request = request();
    let full = powers(&run(&full_request, &snapshot, &config));

    let quality = DataQuality::new();
    let terrain = TerrainQuery::new(snapshot.terrain.as_ref(), &quality);
    let points = ScanPointGenerator::new(&config.scan, terrain)
        .generate(&full_request)
        .unwrap();
    assert!(points.len() > 1);

    let mut minimum: HashMap<String, f64> = HashMap::new();
    for p in &points {
        let single = request_at(p.geo(), 0.5, 0.5, p.height_agl_m, 0.0);
        for (label, power) in powers(&run(&single, &snapshot, &config)) {
            let power = power.unwrap();
            minimum
                .entry(label)
                .and_modify(|m| *m = m.min(power))
                .or_insert(power);
        }
    }

    assert_eq!(full.len(), minimum.len());
    for (label, power) in full {
        assert_relative_eq!(power.unwrap(), minimum[&label], epsilon = 1e-6);
    }
}

#[test]
fn test_evaluation_is_idempotent() {
    let config = AfcConfig::default();
    let snapshot = snapshot(vec![link_toward_ap("A", 1_500.0), link_toward_ap("B", 9_000.0)], vec![]);
    let first = run(&request(), &snapshot, &config);
    let second = run(&request(), &snapshot, &config);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_near_field_never_lowers_power() {
    let mut with_nf = unmerged(config_without_floors());
    with_nf.antenna.near_field.enabled = true;
    let mut without_nf = with_nf.clone();
    without_nf.antenna.near_field.enabled = false;

    let snapshot = snapshot(vec![link_toward_ap("NF", 60.0)], vec![]);
    let a: HashMap<_, _> = powers(&run(&request(), &snapshot, &with_nf)).into_iter().collect();
    let b = powers(&run(&request(), &snapshot, &without_nf));
    assert_eq!(a.len(), b.len());
    for (label, power) in b {
        assert!(a[&label].unwrap() >= power.unwrap() - 1e-9, "{label}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_power_monotone_in_threshold(low in -20.0f64..5.0, step in 0.0f64..10.0, distance in 300.0f64..20_000.0) {
        let snapshot = snapshot(vec![link_toward_ap("M", distance)], vec![]);
        let mut strict = unmerged(config_without_floors());
        strict.regulatory.in_threshold_db = low;
        let mut relaxed = strict.clone();
        relaxed.regulatory.in_threshold_db = low + step;

        let a = powers(&run(&request(), &snapshot, &strict));
        let b: HashMap<_, _> = powers(&run(&request(), &snapshot, &relaxed)).into_iter().collect();
        prop_assert_eq!(a.len(), b.len());
        for (label, power) in a {
            prop_assert!(b[&label].unwrap() >= power.unwrap() - 1e-9);
        }
    }
}
