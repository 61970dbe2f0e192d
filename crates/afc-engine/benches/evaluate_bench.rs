//! Evaluation Benchmarks
//!
//! Scales the uncertainty ellipse and the incumbent count to show where
//! scan points and victims dominate.
//!
//! Run with: cargo bench -p afc-engine --bench evaluate_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

use afc_core::antenna::{AntennaLibrary, DeviceAntenna, FsAntenna};
use afc_core::config::AfcConfig;
use afc_core::observe::DataQuality;
use afc_core::terrain::{FlatTerrain, Morphology, TerrainQuery};
use afc_engine::incumbent::{FsLink, FsReceiver, FsTransmitter, IncumbentIndex};
use afc_engine::prelude::*;
use afc_engine::request::DeviceDescriptor;
use afc_engine::scan::ScanPointGenerator;

const CENTER: GeoPoint = GeoPoint {
    lat_deg: 40.0,
    lon_deg: -105.0,
};

fn request(semi_major_m: f64) -> ApRequest {
    ApRequest {
        request_id: "bench".into(),
        ruleset_id: AfcConfig::default().ruleset_id,
        device: DeviceDescriptor::default(),
        location: LocationUncertainty::Ellipse {
            center: CENTER,
            semi_major_m,
            semi_minor_m: semi_major_m / 2.0,
            orientation_deg: 20.0,
        },
        height: ApHeight {
            height_m: 6.0,
            vertical_uncertainty_m: 3.0,
            reference: HeightReference::Agl,
        },
        indoor: true,
        antenna: DeviceAntenna::Omni,
        inquired_channels: vec![
            ChannelInquiry {
                op_class: 131,
                channels: None,
            },
            ChannelInquiry {
                op_class: 133,
                channels: None,
            },
        ],
        inquired_frequencies: vec![FrequencyRange::new(5925.0, 6425.0)],
    }
}

/// Links on a ring around the AP, spread over U-NII-5
fn links(count: usize) -> Vec<FsLink> {
    (0..count)
        .map(|i| {
            let bearing = 360.0 * i as f64 / count as f64;
            let rx = CENTER.offset(2_000.0 + 500.0 * i as f64, bearing);
            FsLink {
                id: format!("WQ{:04}", i),
                receiver: FsReceiver {
                    location: rx,
                    height_agl_m: 30.0,
                    antenna: FsAntenna::generic(38.0),
                    feeder_loss_db: None,
                    noise_dbm_per_mhz: None,
                },
                transmitter: FsTransmitter {
                    location: rx.offset(30_000.0, bearing + 90.0),
                    height_agl_m: 40.0,
                },
                center_mhz: 5945.0 + (i % 16) as f64 * 30.0,
                bandwidth_mhz: 30.0,
                repeaters: vec![],
            }
        })
        .collect()
}

fn snapshot(link_count: usize) -> DataSnapshot {
    DataSnapshot::new(
        Arc::new(FlatTerrain::new(1_600.0, Morphology::Suburban)),
        IncumbentIndex::new(links(link_count), vec![]).expect("valid links"),
        AntennaLibrary::new(),
    )
}

// ============================================================================
// Scan Point Generation
// ============================================================================

fn bench_scan_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_points");
    let config = AfcConfig::default();
    let snapshot = snapshot(0);
    let quality = DataQuality::new();
    let terrain = TerrainQuery::new(snapshot.terrain.as_ref(), &quality);
    let generator = ScanPointGenerator::new(&config.scan, terrain);

    for semi_major in [30.0, 100.0, 300.0].iter() {
        let req = request(*semi_major);
        group.bench_with_input(BenchmarkId::new("ellipse", semi_major), &req, |b, req| {
            b.iter(|| generator.generate(black_box(req)))
        });
    }

    group.finish();
}

// ============================================================================
// Full Evaluation
// ============================================================================

fn bench_evaluate_links(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_links");
    group.measurement_time(Duration::from_secs(10));
    let config = AfcConfig::default();
    let req = request(50.0);

    for count in [1usize, 10, 50].iter() {
        let snapshot = snapshot(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("links", count), &snapshot, |b, snapshot| {
            b.iter(|| evaluate(black_box(&req), snapshot, &config, &EvaluateOptions::default()))
        });
    }

    group.finish();
}

fn bench_evaluate_area(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_area");
    group.sample_size(20);
    let config = AfcConfig::default();
    let snapshot = snapshot(10);

    for semi_major in [30.0, 100.0, 200.0].iter() {
        let req = request(*semi_major);
        group.bench_with_input(BenchmarkId::new("semi_major_m", semi_major), &req, |b, req| {
            b.iter(|| evaluate(black_box(req), &snapshot, &config, &EvaluateOptions::default()))
        });
    }

    group.finish();
}

criterion_group!(
    name = scan_benches;
    config = Criterion::default();
    targets = bench_scan_points
);

criterion_group!(
    name = evaluate_benches;
    config = Criterion::default();
    targets = bench_evaluate_links, bench_evaluate_area
);

criterion_main!(scan_benches, evaluate_benches);
