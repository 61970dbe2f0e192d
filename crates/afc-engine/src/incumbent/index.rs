//! Immutable incumbent index bucketed on a 1° × 1° grid

use std::collections::{BTreeSet, HashMap, HashSet};

use afc_core::channel_plan::FrequencyRange;
use afc_core::coordinates::{meters_per_degree, GeoPoint};

use super::{ExclusionZone, FsLink};
use crate::error::{DataError, DataResult};

type Bucket = (i32, i32);

fn bucket_of(point: &GeoPoint) -> Bucket {
    let lon = (point.lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    (point.lat_deg.floor() as i32, lon.floor() as i32)
}

/// Links and exclusion zones shared read-only by every request
#[derive(Debug, Default)]
pub struct IncumbentIndex {
    links: Vec<FsLink>,
    zones: Vec<ExclusionZone>,
    buckets: HashMap<Bucket, Vec<usize>>,
}

impl IncumbentIndex {
    /// Validate and index. Every receiver and repeater is bucketed so a
    /// link is found from whichever of its entry points is nearest.
    pub fn new(links: Vec<FsLink>, zones: Vec<ExclusionZone>) -> DataResult<Self> {
        let mut seen = HashSet::new();
        for link in &links {
            link.validate()?;
            if !seen.insert(link.id.as_str()) {
                return Err(DataError::DuplicateId {
                    kind: "link",
                    id: link.id.clone(),
                });
            }
        }
        let mut seen = HashSet::new();
        for zone in &zones {
            zone.validate()?;
            if !seen.insert(zone.id.as_str()) {
                return Err(DataError::DuplicateId {
                    kind: "exclusion zone",
                    id: zone.id.clone(),
                });
            }
        }

        let mut buckets: HashMap<Bucket, Vec<usize>> = HashMap::new();
        for (i, link) in links.iter().enumerate() {
            let mut keys: Vec<Bucket> = std::iter::once(&link.receiver.location)
                .chain(link.repeaters.iter().map(|r| &r.location))
                .map(bucket_of)
                .collect();
            keys.sort_unstable();
            keys.dedup();
            for key in keys {
                buckets.entry(key).or_default().push(i);
            }
        }

        tracing::info!(
            links = links.len(),
            zones = zones.len(),
            buckets = buckets.len(),
            "incumbent index built"
        );
        Ok(Self { links, zones, buckets })
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[FsLink] {
        &self.links
    }

    pub fn zones(&self) -> &[ExclusionZone] {
        &self.zones
    }

    pub fn link(&self, id: &str) -> Option<&FsLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Links with an entry point within `radius_m` of `center` whose band
    /// overlaps `span`, in insertion order
    pub fn links_near(&self, center: &GeoPoint, radius_m: f64, span: &FrequencyRange) -> Vec<&FsLink> {
        let (m_lat, _) = meters_per_degree(center.lat_deg);
        let dlat = radius_m / m_lat;
        let lat_lo = (center.lat_deg - dlat).max(-90.0);
        let lat_hi = (center.lat_deg + dlat).min(90.0);
        let poleward = lat_lo.abs().max(lat_hi.abs()).min(89.9);
        let (_, m_lon) = meters_per_degree(poleward);
        let dlon = (radius_m / m_lon).min(180.0);

        let rows = lat_lo.floor() as i32..=lat_hi.floor() as i32;
        let col_lo = (center.lon_deg - dlon).floor() as i32;
        let col_hi = (center.lon_deg + dlon).floor() as i32;

        let mut candidates = BTreeSet::new();
        for row in rows {
            for col in col_lo..=col_hi {
                let wrapped = (col + 180).rem_euclid(360) - 180;
                if let Some(ids) = self.buckets.get(&(row, wrapped)) {
                    candidates.extend(ids.iter().copied());
                }
            }
        }

        candidates
            .into_iter()
            .map(|i| &self.links[i])
            .filter(|link| link.band().overlaps(span))
            .filter(|link| {
                std::iter::once(&link.receiver.location)
                    .chain(link.repeaters.iter().map(|r| &r.location))
                    .any(|p| center.distance_to(p) <= radius_m)
            })
            .collect()
    }

    /// Exclusion zones protecting spectrum that overlaps `span`
    pub fn zones_overlapping(&self, span: &FrequencyRange) -> Vec<&ExclusionZone> {
        self.zones.iter().filter(|z| z.band.overlaps(span)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incumbent::{PassiveRepeater, RepeaterKind, ZoneGeometry};
    use crate::testutil::direct_link;

    fn full_band() -> FrequencyRange {
        FrequencyRange::new(5925.0, 7125.0)
    }

    #[test]
    fn test_links_near_radius_and_band() {
        let origin = GeoPoint::new(40.0, -105.0);
        let index = IncumbentIndex::new(
            vec![
                direct_link("near", origin.offset(10_000.0, 90.0), 6175.0),
                direct_link("far", origin.offset(200_000.0, 90.0), 6175.0),
                direct_link("other-band", origin.offset(5_000.0, 0.0), 6800.0),
            ],
            vec![],
        )
        .unwrap();

        let found = index.links_near(&origin, 130_000.0, &full_band());
        let ids: Vec<&str> = found.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "other-band"]);

        let unii5 = FrequencyRange::new(5925.0, 6425.0);
        let found = index.links_near(&origin, 130_000.0, &unii5);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "near");
    }

    #[test]
    fn test_found_through_repeater() {
        let origin = GeoPoint::new(40.0, -105.0);
        let mut link = direct_link("via-repeater", origin.offset(150_000.0, 0.0), 6175.0);
        link.transmitter.location = origin.offset(170_000.0, 0.0);
        link.repeaters.push(PassiveRepeater {
            id: "PR1".into(),
            location: origin.offset(1_000.0, 0.0),
            height_agl_m: 20.0,
            kind: RepeaterKind::Reflector { width_m: 6.0, height_m: 8.0 },
        });
        let index = IncumbentIndex::new(vec![link], vec![]).unwrap();
        assert_eq!(index.links_near(&origin, 10_000.0, &full_band()).len(), 1);
    }

    #[test]
    fn test_crosses_bucket_edges() {
        let origin = GeoPoint::new(39.999, -105.001);
        let index = IncumbentIndex::new(
            vec![direct_link("ne", GeoPoint::new(40.05, -104.95), 6175.0)],
            vec![],
        )
        .unwrap();
        assert_eq!(index.links_near(&origin, 20_000.0, &full_band()).len(), 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let p = GeoPoint::new(40.0, -105.0);
        let err = IncumbentIndex::new(vec![direct_link("L", p, 6175.0), direct_link("L", p, 6175.0)], vec![])
            .unwrap_err();
        assert!(matches!(err, DataError::DuplicateId { .. }));
    }

    #[test]
    fn test_zones_overlapping() {
        let zone = ExclusionZone {
            id: "RAS".into(),
            name: String::new(),
            band: FrequencyRange::new(6650.0, 6675.2),
            geometry: ZoneGeometry::Sphere {
                center: GeoPoint::new(38.0, -80.0),
                height_amsl_m: 0.0,
                radius_m: 1_000.0,
            },
        };
        let index = IncumbentIndex::new(vec![], vec![zone]).unwrap();
        assert_eq!(index.zones_overlapping(&FrequencyRange::new(6640.0, 6660.0)).len(), 1);
        assert!(index.zones_overlapping(&FrequencyRange::new(5925.0, 6425.0)).is_empty());
        assert!(index.is_empty());
    }
}
