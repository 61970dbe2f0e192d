//! Geodesy for link and scan-point geometry
//!
//! Horizontal work (distances, bearings, ellipse and polygon offsets) uses a
//! spherical earth. Anything involving heights (slant ranges, elevation,
//! off-axis angles) goes through earth-centred cartesian coordinates on the
//! WGS-84 ellipsoid.
//!
//! Heights are AMSL. Geoid undulation is ignored; it is well inside the
//! vertical error of the terrain models.

use serde::{Deserialize, Serialize};

// WGS-84
const ELLIPSOID_A_M: f64 = 6_378_137.0;
const ELLIPSOID_INV_F: f64 = 298.257_223_563;

/// Mean radius for great-circle work
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

fn eccentricity_sq() -> f64 {
    let f = 1.0 / ELLIPSOID_INV_F;
    f * (2.0 - f)
}

/// Earth-centred, earth-fixed cartesian position (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcefPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EcefPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn delta(&self, to: &EcefPosition) -> [f64; 3] {
        [to.x - self.x, to.y - self.y, to.z - self.z]
    }

    pub fn distance_to(&self, other: &EcefPosition) -> f64 {
        norm(self.delta(other))
    }

    /// Unit vector toward `other`; zero when the points coincide
    pub fn direction_to(&self, other: &EcefPosition) -> [f64; 3] {
        let v = self.delta(other);
        let len = norm(v);
        if len < 1e-10 {
            [0.0; 3]
        } else {
            v.map(|c| c / len)
        }
    }
}

fn norm(v: [f64; 3]) -> f64 {
    v.iter().map(|c| c * c).sum::<f64>().sqrt()
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Horizontal position (WGS-84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to +90)
    pub lat_deg: f64,
    /// Longitude in degrees (-180 to +180)
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Whether latitude and longitude are finite and in range
    pub fn is_valid(&self) -> bool {
        self.lat_deg.is_finite()
            && self.lon_deg.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lon_deg)
    }

    /// Attach a height (m AMSL)
    pub fn with_alt(&self, alt_m: f64) -> LlaPosition {
        LlaPosition::new(self.lat_deg, self.lon_deg, alt_m)
    }

    /// Great-circle distance in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self.lat_deg, self.lon_deg, other.lat_deg, other.lon_deg)
    }

    /// Initial bearing toward other, degrees clockwise from true north
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        bearing(self.lat_deg, self.lon_deg, other.lat_deg, other.lon_deg)
    }

    /// Point reached after travelling `distance_m` along `bearing_deg`
    pub fn offset(&self, distance_m: f64, bearing_deg: f64) -> GeoPoint {
        offset_by_bearing(self.lat_deg, self.lon_deg, distance_m, bearing_deg)
    }

    /// Interpolate along the great circle; `t` in [0, 1]
    pub fn interpolate(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        let d = self.distance_to(other);
        if d < 1e-6 {
            return *self;
        }
        self.offset(d * t, self.bearing_to(other))
    }

    /// Local tangent-plane offset of `other` from self: (east_m, north_m)
    pub fn local_offset_m(&self, other: &GeoPoint) -> (f64, f64) {
        let (m_per_deg_lat, m_per_deg_lon) = meters_per_degree(self.lat_deg);
        let mut dlon = other.lon_deg - self.lon_deg;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        (
            dlon * m_per_deg_lon,
            (other.lat_deg - self.lat_deg) * m_per_deg_lat,
        )
    }

    /// Inverse of [`GeoPoint::local_offset_m`]
    pub fn from_local_offset(&self, east_m: f64, north_m: f64) -> GeoPoint {
        let (m_per_deg_lat, m_per_deg_lon) = meters_per_degree(self.lat_deg);
        GeoPoint::new(
            self.lat_deg + north_m / m_per_deg_lat,
            self.lon_deg + east_m / m_per_deg_lon,
        )
    }
}

/// Geodetic position with height AMSL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LlaPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// m AMSL
    pub alt_m: f64,
}

impl LlaPosition {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lat_deg, self.lon_deg)
    }

    pub fn to_ecef(&self) -> EcefPosition {
        lla_to_ecef(self)
    }

    pub fn slant_distance_to(&self, other: &LlaPosition) -> f64 {
        self.to_ecef().distance_to(&other.to_ecef())
    }

    /// East, north and up unit vectors of the local tangent plane
    fn enu_basis(&self) -> [[f64; 3]; 3] {
        let (sp, cp) = self.lat_deg.to_radians().sin_cos();
        let (sl, cl) = self.lon_deg.to_radians().sin_cos();
        [
            [-sl, cl, 0.0],
            [-sp * cl, -sp * sl, cp],
            [cp * cl, cp * sl, sp],
        ]
    }
}

/// Direction and distance from one position to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngle {
    /// Degrees above the local horizontal
    pub elevation_deg: f64,
    /// Degrees clockwise from true north, [0, 360)
    pub azimuth_deg: f64,
    pub range_m: f64,
}

pub fn lla_to_ecef(lla: &LlaPosition) -> EcefPosition {
    let e2 = eccentricity_sq();
    let (sp, cp) = lla.lat_deg.to_radians().sin_cos();
    let (sl, cl) = lla.lon_deg.to_radians().sin_cos();
    // prime vertical radius of curvature
    let rn = ELLIPSOID_A_M / (1.0 - e2 * sp * sp).sqrt();
    let horizontal = (rn + lla.alt_m) * cp;
    EcefPosition::new(horizontal * cl, horizontal * sl, (rn * (1.0 - e2) + lla.alt_m) * sp)
}

pub fn look_angle(observer: &LlaPosition, target: &LlaPosition) -> LookAngle {
    let d = observer.to_ecef().delta(&target.to_ecef());
    let [e, n, u] = observer.enu_basis().map(|axis| dot(axis, d));
    LookAngle {
        elevation_deg: u.atan2(e.hypot(n)).to_degrees(),
        azimuth_deg: e.atan2(n).to_degrees().rem_euclid(360.0),
        range_m: norm(d),
    }
}

/// Angle in degrees between the boresight `from -> toward` and the
/// direction `from -> target`
pub fn off_axis_angle_deg(from: &LlaPosition, toward: &LlaPosition, target: &LlaPosition) -> f64 {
    let origin = from.to_ecef();
    let boresight = origin.direction_to(&toward.to_ecef());
    let ray = origin.direction_to(&target.to_ecef());
    dot(boresight, ray).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Great-circle distance in meters (haversine)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing in degrees [0, 360)
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Destination point given start, distance and bearing
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_deg: f64) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();
    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());
    let mut lon2 = lambda2.to_degrees();
    if lon2 > 180.0 {
        lon2 -= 360.0;
    } else if lon2 < -180.0 {
        lon2 += 360.0;
    }
    GeoPoint::new(phi2.to_degrees(), lon2)
}

/// Meters per degree of latitude and longitude at a given latitude
pub fn meters_per_degree(lat_deg: f64) -> (f64, f64) {
    let m_per_deg_lat = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    let m_per_deg_lon = m_per_deg_lat * lat_deg.to_radians().cos().max(1e-9);
    (m_per_deg_lat, m_per_deg_lon)
}

/// Closed polygon of geographic vertices (no repeated closing vertex)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPolygon {
    pub vertices: Vec<GeoPoint>,
}

impl GeoPolygon {
    pub fn new(vertices: Vec<GeoPoint>) -> Self {
        Self { vertices }
    }

    /// Vertex mean, used as the local projection origin
    pub fn centroid(&self) -> Option<GeoPoint> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len() as f64;
        let lat = self.vertices.iter().map(|v| v.lat_deg).sum::<f64>() / n;
        let lon = self.vertices.iter().map(|v| v.lon_deg).sum::<f64>() / n;
        Some(GeoPoint::new(lat, lon))
    }

    /// Vertices projected to (east_m, north_m) around `origin`
    pub fn local_vertices(&self, origin: &GeoPoint) -> Vec<(f64, f64)> {
        self.vertices.iter().map(|v| origin.local_offset_m(v)).collect()
    }

    /// Point-in-polygon (even-odd rule); points on an edge count as inside
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let Some(origin) = self.centroid() else {
            return false;
        };
        if self.vertices.len() < 3 {
            return false;
        }
        let ring = self.local_vertices(&origin);
        point_in_ring(origin.local_offset_m(point), &ring)
    }
}

/// Even-odd containment test in a planar ring; edges count as inside
pub fn point_in_ring(p: (f64, f64), ring: &[(f64, f64)]) -> bool {
    const EDGE_TOL: f64 = 1e-6;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];

        // on-edge check
        let (ex, ey) = (xj - xi, yj - yi);
        let len2 = ex * ex + ey * ey;
        if len2 > 0.0 {
            let t = (((p.0 - xi) * ex + (p.1 - yi) * ey) / len2).clamp(0.0, 1.0);
            let (cx, cy) = (xi + t * ex - p.0, yi + t * ey - p.1);
            if cx * cx + cy * cy <= EDGE_TOL * EDGE_TOL {
                return true;
            }
        }

        if (yi > p.1) != (yj > p.1) {
            let x_cross = xi + (p.1 - yi) / (yj - yi) * (xj - xi);
            if p.0 < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
