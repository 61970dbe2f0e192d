//! Horizontal uncertainty shapes in a local east/north frame
//!
//! Shapes are projected once onto a tangent plane at their centre; all
//! containment tests then run in meters.

use afc_core::coordinates::{point_in_ring, GeoPoint};
use afc_core::error::GeometryError;

use crate::request::LocationUncertainty;

#[derive(Debug, Clone, PartialEq)]
enum Outline {
    Ellipse {
        semi_major_m: f64,
        semi_minor_m: f64,
        orientation_deg: f64,
    },
    Polygon(Vec<(f64, f64)>),
}

/// Horizontal shape anchored at a geographic origin
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalShape {
    origin: GeoPoint,
    outline: Outline,
}

impl HorizontalShape {
    /// Project a validated location uncertainty
    pub fn from_location(location: &LocationUncertainty) -> Result<Self, GeometryError> {
        location.validate()?;
        let shape = match location {
            LocationUncertainty::Ellipse {
                center,
                semi_major_m,
                semi_minor_m,
                orientation_deg,
            } => HorizontalShape {
                origin: *center,
                outline: Outline::Ellipse {
                    semi_major_m: *semi_major_m,
                    semi_minor_m: *semi_minor_m,
                    orientation_deg: *orientation_deg,
                },
            },
            LocationUncertainty::LinearPolygon { vertices } => {
                let origin = location.center().ok_or(GeometryError::TooFewVertices(vertices.len()))?;
                HorizontalShape {
                    origin,
                    outline: Outline::Polygon(vertices.iter().map(|v| origin.local_offset_m(v)).collect()),
                }
            }
            LocationUncertainty::RadialPolygon { center, vectors } => HorizontalShape {
                origin: *center,
                outline: Outline::Polygon(
                    vectors
                        .iter()
                        .map(|v| {
                            let az = v.azimuth_deg.to_radians();
                            (v.length_m * az.sin(), v.length_m * az.cos())
                        })
                        .collect(),
                ),
            },
        };
        Ok(shape)
    }

    /// Declared centre (vertex centroid for linear polygons)
    pub fn center(&self) -> GeoPoint {
        self.origin
    }

    /// Whether a local offset `(east, north)` lies inside or on the outline
    pub fn contains_local(&self, east_m: f64, north_m: f64) -> bool {
        match &self.outline {
            Outline::Ellipse {
                semi_major_m,
                semi_minor_m,
                orientation_deg,
            } => {
                let theta = orientation_deg.to_radians();
                let along = east_m * theta.sin() + north_m * theta.cos();
                let across = east_m * theta.cos() - north_m * theta.sin();
                (along / semi_major_m).powi(2) + (across / semi_minor_m).powi(2) <= 1.0 + 1e-9
            }
            Outline::Polygon(ring) => point_in_ring((east_m, north_m), ring),
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        let (east, north) = self.origin.local_offset_m(point);
        self.contains_local(east, north)
    }

    /// Largest distance from the centre to the outline (m)
    pub fn max_radius_m(&self) -> f64 {
        match &self.outline {
            Outline::Ellipse { semi_major_m, .. } => *semi_major_m,
            Outline::Polygon(ring) => ring
                .iter()
                .map(|(e, n)| e.hypot(*n))
                .fold(0.0, f64::max),
        }
    }

    /// Local bounding box `(min_east, max_east, min_north, max_north)`
    pub fn bounds_local(&self) -> (f64, f64, f64, f64) {
        match &self.outline {
            Outline::Ellipse {
                semi_major_m,
                semi_minor_m,
                orientation_deg,
            } => {
                let theta = orientation_deg.to_radians();
                let (a, b) = (*semi_major_m, *semi_minor_m);
                let half_e = ((a * theta.sin()).powi(2) + (b * theta.cos()).powi(2)).sqrt();
                let half_n = ((a * theta.cos()).powi(2) + (b * theta.sin()).powi(2)).sqrt();
                (-half_e, half_e, -half_n, half_n)
            }
            Outline::Polygon(ring) => ring.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
                |(e0, e1, n0, n1), (e, n)| (e0.min(*e), e1.max(*e), n0.min(*n), n1.max(*n)),
            ),
        }
    }

    /// Geographic bounding box `(south_west, north_east)`
    pub fn bounds(&self) -> (GeoPoint, GeoPoint) {
        let (e0, e1, n0, n1) = self.bounds_local();
        let corners = [
            self.origin.from_local_offset(e0, n0),
            self.origin.from_local_offset(e0, n1),
            self.origin.from_local_offset(e1, n0),
            self.origin.from_local_offset(e1, n1),
        ];
        let south = corners.iter().map(|c| c.lat_deg).fold(f64::INFINITY, f64::min);
        let north = corners.iter().map(|c| c.lat_deg).fold(f64::NEG_INFINITY, f64::max);
        let west = corners.iter().map(|c| c.lon_deg).fold(f64::INFINITY, f64::min);
        let east = corners.iter().map(|c| c.lon_deg).fold(f64::NEG_INFINITY, f64::max);
        (GeoPoint::new(south, west), GeoPoint::new(north, east))
    }
}
