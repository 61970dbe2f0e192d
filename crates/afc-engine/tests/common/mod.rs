//! Shared fixtures for end-to-end evaluation tests

#![allow(dead_code)]

use std::sync::Arc;

use afc_core::antenna::{AntennaLibrary, DeviceAntenna, FsAntenna};
use afc_core::channel_plan::FrequencyRange;
use afc_core::config::AfcConfig;
use afc_core::coordinates::GeoPoint;
use afc_core::terrain::{FlatTerrain, Morphology};

use afc_engine::incumbent::{ExclusionZone, FsLink, FsReceiver, FsTransmitter, IncumbentIndex};
use afc_engine::request::{
    ApHeight, ApRequest, ChannelInquiry, DeviceDescriptor, HeightReference, LocationUncertainty,
};
use afc_engine::response::{Availability, AvailabilityResponse};
use afc_engine::snapshot::DataSnapshot;

pub const AP: GeoPoint = GeoPoint {
    lat_deg: 40.0,
    lon_deg: -105.0,
};

/// Band of every link built by [`link_toward_ap`]
pub const LINK_BAND: FrequencyRange = FrequencyRange {
    low_mhz: 6160.0,
    high_mhz: 6190.0,
};

pub fn request_at(center: GeoPoint, semi_major_m: f64, semi_minor_m: f64, height_m: f64, uncertainty_m: f64) -> ApRequest {
    ApRequest {
        request_id: "it-1".into(),
        ruleset_id: AfcConfig::default().ruleset_id,
        device: DeviceDescriptor {
            serial_number: "SN-42".into(),
            certification_id: "FCC-ABC".into(),
        },
        location: LocationUncertainty::Ellipse {
            center,
            semi_major_m,
            semi_minor_m,
            orientation_deg: 30.0,
        },
        height: ApHeight {
            height_m,
            vertical_uncertainty_m: uncertainty_m,
            reference: HeightReference::Agl,
        },
        indoor: false,
        antenna: DeviceAntenna::Omni,
        inquired_channels: vec![ChannelInquiry {
            op_class: 133,
            channels: None,
        }],
        inquired_frequencies: vec![FrequencyRange::new(6100.0, 6250.0)],
    }
}

/// 40 x 25 m ellipse at [`AP`], 5 m AGL +/- 2 m
pub fn request() -> ApRequest {
    request_at(AP, 40.0, 25.0, 5.0, 2.0)
}

/// Link whose receiver sits `distance_m` south of the AP with its dish
/// pointed north, across the AP, at a transmitter 25 km away
pub fn link_toward_ap(id: &str, distance_m: f64) -> FsLink {
    let rx = AP.offset(distance_m, 180.0);
    FsLink {
        id: id.into(),
        receiver: FsReceiver {
            location: rx,
            height_agl_m: 30.0,
            antenna: FsAntenna::generic(38.0),
            feeder_loss_db: None,
            noise_dbm_per_mhz: None,
        },
        transmitter: FsTransmitter {
            location: rx.offset(25_000.0, 0.0),
            height_agl_m: 30.0,
        },
        center_mhz: LINK_BAND.center_mhz(),
        bandwidth_mhz: LINK_BAND.width_mhz(),
        repeaters: vec![],
    }
}

pub fn snapshot(links: Vec<FsLink>, zones: Vec<ExclusionZone>) -> DataSnapshot {
    DataSnapshot::new(
        Arc::new(FlatTerrain::new(0.0, Morphology::Rural)),
        IncumbentIndex::new(links, zones).unwrap(),
        AntennaLibrary::new(),
    )
}

/// Default configuration with floors low enough that nothing is dropped
pub fn config_without_floors() -> AfcConfig {
    let mut config = AfcConfig::default();
    config.regulatory.min_eirp_dbm = -100.0;
    config.regulatory.min_psd_dbm_per_mhz = -100.0;
    config
}

/// Every reported power keyed by a stable label
pub fn powers(response: &AvailabilityResponse) -> Vec<(String, Option<f64>)> {
    let channels = response
        .channels
        .iter()
        .map(|c| (format!("{}/{}", c.op_class, c.channel), c.availability.power()));
    let frequencies = response
        .frequencies
        .iter()
        .map(|f| (format!("{}-{}", f.range.low_mhz, f.range.high_mhz), f.availability.power()));
    channels.chain(frequencies).collect()
}

/// Channel reported at `dbm` EIRP, to within float round-off
pub fn assert_eirp(availability: &Availability, dbm: f64) {
    match availability {
        Availability::MaxEirp { dbm: v } => approx::assert_relative_eq!(*v, dbm, epsilon = 1e-9),
        other => panic!("expected MaxEirp {dbm}, got {other:?}"),
    }
}
