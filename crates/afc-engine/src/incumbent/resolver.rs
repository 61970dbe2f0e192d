//! Victim resolution for one scan point

use afc_core::antenna::repeater::reflector_two_way_gain_db;
use afc_core::antenna::wavelength_m;
use afc_core::config::{IncumbentConfig, RepeaterConvention};
use afc_core::coordinates::{off_axis_angle_deg, LlaPosition};
use afc_core::propagation::{free_space_path_loss_db, PathEndpoint};
use afc_core::terrain::TerrainQuery;

use super::{FsLink, RepeaterKind};
use crate::response::VictimPath;
use crate::scan::{HorizontalShape, ScanPoint};

/// A link's chain resolved to 3-D positions once per request.
///
/// `nodes` holds the transmitter, each repeater in chain order, then the
/// receiver; repeater `k` is `nodes[k + 1]`.
#[derive(Debug, Clone)]
pub struct LinkGeometry<'a> {
    pub link: &'a FsLink,
    pub nodes: Vec<LlaPosition>,
}

impl<'a> LinkGeometry<'a> {
    pub fn new(link: &'a FsLink, terrain: TerrainQuery<'_>) -> Self {
        let place = |p: &afc_core::coordinates::GeoPoint, agl: f64| p.with_alt(terrain.point(p).terrain_m + agl);
        let mut nodes = Vec::with_capacity(link.repeaters.len() + 2);
        nodes.push(place(&link.transmitter.location, link.transmitter.height_agl_m));
        nodes.extend(link.repeaters.iter().map(|r| place(&r.location, r.height_agl_m)));
        nodes.push(place(&link.receiver.location, link.receiver.height_agl_m));
        Self { link, nodes }
    }

    pub fn receiver(&self) -> LlaPosition {
        self.nodes[self.nodes.len() - 1]
    }

    /// Node the receiver dish points at: the last repeater, or the transmitter
    pub fn receiver_boresight(&self) -> LlaPosition {
        self.nodes[self.nodes.len() - 2]
    }

    pub fn repeater(&self, k: usize) -> LlaPosition {
        self.nodes[k + 1]
    }

    /// Half the included angle at repeater `k` between its two hops (deg)
    pub fn half_included_angle_deg(&self, k: usize) -> f64 {
        off_axis_angle_deg(&self.nodes[k + 1], &self.nodes[k], &self.nodes[k + 2]) / 2.0
    }

    /// Gain of repeater `k` for the link's own signal (dB)
    pub fn aligned_gain_db(&self, k: usize) -> f64 {
        match self.link.repeaters[k].kind {
            RepeaterKind::Reflector { width_m, height_m } => reflector_two_way_gain_db(
                width_m,
                height_m,
                wavelength_m(self.link.center_mhz),
                self.half_included_angle_deg(k),
            ),
            RepeaterKind::BackToBack {
                gain_dbi,
                insertion_loss_db,
            } => 2.0 * gain_dbi - insertion_loss_db,
        }
    }

    /// Free-space loss of every hop after repeater `k` down to the receiver (dB)
    pub fn downstream_loss_db(&self, k: usize) -> f64 {
        self.nodes[k + 1..]
            .windows(2)
            .map(|hop| free_space_path_loss_db(hop[0].slant_distance_to(&hop[1]), self.link.center_mhz))
            .sum()
    }

    /// Net effect of the chain after repeater `k`: later repeaters' aligned
    /// gains minus the downstream hop losses (dB)
    pub fn downstream_db(&self, k: usize) -> f64 {
        let gains: f64 = (k + 1..self.link.repeaters.len()).map(|j| self.aligned_gain_db(j)).sum();
        gains - self.downstream_loss_db(k)
    }
}

/// Where interference enters a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimKind {
    Direct,
    Repeater { index: usize },
}

/// One interference entry point seen from one scan point
#[derive(Debug, Clone, Copy)]
pub struct Victim<'a> {
    /// Position of the link in the resolver's candidate list
    pub link_index: usize,
    pub geometry: &'a LinkGeometry<'a>,
    pub kind: VictimKind,
    /// Receive point (AMSL)
    pub entry: LlaPosition,
    pub entry_height_agl_m: f64,
    /// Horizontal distance from the scan point (m)
    pub distance_m: f64,
    /// Receive point inside the AP's own uncertainty volume
    pub inside_volume: bool,
}

impl<'a> Victim<'a> {
    pub fn link(&self) -> &'a FsLink {
        self.geometry.link
    }

    pub fn endpoint(&self) -> PathEndpoint {
        PathEndpoint::new(self.entry.geo(), self.entry_height_agl_m)
    }

    pub fn path(&self) -> VictimPath {
        match self.kind {
            VictimKind::Direct => VictimPath::Direct,
            VictimKind::Repeater { index } => VictimPath::Repeater {
                repeater_id: self.geometry.link.repeaters[index].id.clone(),
            },
        }
    }
}

/// Resolves candidate links into victims per scan point
pub struct IncumbentResolver<'a> {
    config: &'a IncumbentConfig,
    links: &'a [LinkGeometry<'a>],
    shape: &'a HorizontalShape,
}

impl<'a> IncumbentResolver<'a> {
    pub fn new(config: &'a IncumbentConfig, links: &'a [LinkGeometry<'a>], shape: &'a HorizontalShape) -> Self {
        Self { config, links, shape }
    }

    /// Victims within `incumbents.max_link_distance_m` of the point, in
    /// candidate order, direct victim before repeater victim
    pub fn resolve(&self, point: &ScanPoint) -> Vec<Victim<'a>> {
        let here = point.geo();
        let ap = point.lla();
        let max_distance = self.config.max_link_distance_m;
        let mut victims = Vec::new();

        for (link_index, geometry) in self.links.iter().enumerate() {
            let link = geometry.link;

            let rx = geometry.receiver();
            let d = here.distance_to(&rx.geo());
            if d <= max_distance {
                victims.push(Victim {
                    link_index,
                    geometry,
                    kind: VictimKind::Direct,
                    entry: rx,
                    entry_height_agl_m: link.receiver.height_agl_m,
                    distance_m: d,
                    inside_volume: self.inside_volume(&ap, &rx),
                });
            }

            if link.repeaters.is_empty() {
                continue;
            }
            let k = match self.config.repeater_convention {
                RepeaterConvention::LastInChain => link.repeaters.len() - 1,
                RepeaterConvention::NearestToAp => {
                    let mut best = 0;
                    let mut best_d = f64::INFINITY;
                    for (i, r) in link.repeaters.iter().enumerate() {
                        let d = here.distance_to(&r.location);
                        if d < best_d {
                            best = i;
                            best_d = d;
                        }
                    }
                    best
                }
            };
            let entry = geometry.repeater(k);
            let d = here.distance_to(&entry.geo());
            if d <= max_distance {
                victims.push(Victim {
                    link_index,
                    geometry,
                    kind: VictimKind::Repeater { index: k },
                    entry,
                    entry_height_agl_m: link.repeaters[k].height_agl_m,
                    distance_m: d,
                    inside_volume: self.inside_volume(&ap, &entry),
                });
            }
        }
        victims
    }

    fn inside_volume(&self, ap: &LlaPosition, entry: &LlaPosition) -> bool {
        self.shape.contains(&entry.geo()) || ap.slant_distance_to(entry) < self.config.min_separation_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incumbent::PassiveRepeater;
    use crate::request::LocationUncertainty;
    use crate::testutil::{direct_link, scan_point};
    use afc_core::coordinates::GeoPoint;
    use afc_core::observe::DataQuality;
    use afc_core::terrain::{FlatTerrain, Morphology};
    use approx::assert_relative_eq;

    fn reflector(id: &str, location: GeoPoint) -> PassiveRepeater {
        PassiveRepeater {
            id: id.into(),
            location,
            height_agl_m: 20.0,
            kind: RepeaterKind::Reflector { width_m: 6.0, height_m: 8.0 },
        }
    }

    fn shape(center: GeoPoint) -> HorizontalShape {
        HorizontalShape::from_location(&LocationUncertainty::Ellipse {
            center,
            semi_major_m: 50.0,
            semi_minor_m: 50.0,
            orientation_deg: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn test_chain_geometry() {
        let terrain = FlatTerrain::new(100.0, Morphology::Rural);
        let quality = DataQuality::new();
        let query = TerrainQuery::new(&terrain, &quality);

        let rx = GeoPoint::new(40.0, -105.0);
        let mut link = direct_link("L", rx, 6175.0);
        link.transmitter.location = rx.offset(30_000.0, 0.0);
        link.repeaters = vec![reflector("PR1", rx.offset(20_000.0, 10.0)), reflector("PR2", rx.offset(5_000.0, 0.0))];
        let g = LinkGeometry::new(&link, query);

        assert_eq!(g.nodes.len(), 4);
        assert_relative_eq!(g.receiver().alt_m, 100.0 + link.receiver.height_agl_m);
        assert_eq!(g.receiver_boresight(), g.repeater(1));

        let hop = free_space_path_loss_db(g.repeater(1).slant_distance_to(&g.receiver()), 6175.0);
        assert_relative_eq!(g.downstream_loss_db(1), hop, epsilon = 1e-9);
        assert_relative_eq!(g.downstream_db(1), -hop, epsilon = 1e-9);
        assert_relative_eq!(
            g.downstream_db(0),
            g.aligned_gain_db(1) - g.downstream_loss_db(0),
            epsilon = 1e-9
        );
        assert!(g.half_included_angle_deg(1) < 90.0);
    }

    #[test]
    fn test_repeater_conventions() {
        let terrain = FlatTerrain::new(0.0, Morphology::Rural);
        let quality = DataQuality::new();
        let query = TerrainQuery::new(&terrain, &quality);

        let rx = GeoPoint::new(40.0, -105.0);
        let mut link = direct_link("L", rx, 6175.0);
        link.transmitter.location = rx.offset(30_000.0, 0.0);
        link.repeaters = vec![reflector("PR1", rx.offset(20_000.0, 0.0)), reflector("PR2", rx.offset(5_000.0, 0.0))];
        let links = vec![LinkGeometry::new(&link, query)];

        let ap = rx.offset(21_000.0, 0.0);
        let s = shape(ap);
        let point = scan_point(ap, 5.0, 0.0);

        let config = IncumbentConfig::default();
        let victims = IncumbentResolver::new(&config, &links, &s).resolve(&point);
        assert_eq!(victims.len(), 2);
        assert_eq!(victims[0].kind, VictimKind::Direct);
        assert_eq!(victims[1].kind, VictimKind::Repeater { index: 0 });
        assert_eq!(
            victims[1].path(),
            VictimPath::Repeater {
                repeater_id: "PR1".into()
            }
        );

        let last = IncumbentConfig {
            repeater_convention: RepeaterConvention::LastInChain,
            ..IncumbentConfig::default()
        };
        let victims = IncumbentResolver::new(&last, &links, &s).resolve(&point);
        assert_eq!(victims[1].kind, VictimKind::Repeater { index: 1 });
    }

    #[test]
    fn test_distance_cutoff_and_inside_volume() {
        let terrain = FlatTerrain::new(0.0, Morphology::Rural);
        let quality = DataQuality::new();
        let query = TerrainQuery::new(&terrain, &quality);

        let ap = GeoPoint::new(40.0, -105.0);
        let inside = direct_link("inside", ap.offset(20.0, 45.0), 6175.0);
        let far = direct_link("far", ap.offset(140_000.0, 90.0), 6175.0);
        let links = vec![LinkGeometry::new(&inside, query), LinkGeometry::new(&far, query)];
        let s = shape(ap);

        let config = IncumbentConfig::default();
        let victims = IncumbentResolver::new(&config, &links, &s).resolve(&scan_point(ap, 5.0, 0.0));
        assert_eq!(victims.len(), 1);
        assert_eq!(victims[0].link().id, "inside");
        assert!(victims[0].inside_volume);
    }
}
