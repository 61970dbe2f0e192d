//! AP availability request
//!
//! A request is fully resolved by the intake layer before it reaches the
//! engine and is shared immutably for the whole computation.

use serde::{Deserialize, Serialize};

use afc_core::antenna::DeviceAntenna;
use afc_core::channel_plan::{channel_width_mhz, Channel, FrequencyRange, BAND_START_MHZ, BAND_STOP_MHZ};
use afc_core::coordinates::GeoPoint;
use afc_core::error::{AfcError, AfcResult, GeometryError, RejectReason};

/// Device identity used by the deny list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub serial_number: String,
    pub certification_id: String,
}

/// Reference surface of the declared height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeightReference {
    /// Above ground level
    Agl,
    /// Above mean sea level
    Amsl,
}

/// Declared antenna height with its uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApHeight {
    pub height_m: f64,
    #[serde(default)]
    pub vertical_uncertainty_m: f64,
    pub reference: HeightReference,
}

/// One vector of a radial polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialVector {
    /// Clockwise from true north
    pub azimuth_deg: f64,
    pub length_m: f64,
}

/// Horizontal location uncertainty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationUncertainty {
    Ellipse {
        center: GeoPoint,
        semi_major_m: f64,
        semi_minor_m: f64,
        /// Azimuth of the major axis, clockwise from true north
        #[serde(default)]
        orientation_deg: f64,
    },
    LinearPolygon {
        vertices: Vec<GeoPoint>,
    },
    RadialPolygon {
        center: GeoPoint,
        vectors: Vec<RadialVector>,
    },
}

impl LocationUncertainty {
    /// Declared centre; vertex centroid for linear polygons
    pub fn center(&self) -> Option<GeoPoint> {
        match self {
            LocationUncertainty::Ellipse { center, .. } | LocationUncertainty::RadialPolygon { center, .. } => {
                Some(*center)
            }
            LocationUncertainty::LinearPolygon { vertices } => {
                afc_core::coordinates::GeoPolygon::new(vertices.clone()).centroid()
            }
        }
    }

    /// Structural checks on the horizontal shape
    pub fn validate(&self) -> Result<(), GeometryError> {
        let check_point = |p: &GeoPoint| {
            if p.is_valid() {
                Ok(())
            } else {
                Err(GeometryError::InvalidCoordinate {
                    lat_deg: p.lat_deg,
                    lon_deg: p.lon_deg,
                })
            }
        };
        let check_length = |what: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(GeometryError::InvalidLength { what, value })
            }
        };

        match self {
            LocationUncertainty::Ellipse {
                center,
                semi_major_m,
                semi_minor_m,
                orientation_deg,
            } => {
                check_point(center)?;
                check_length("semi-major axis", *semi_major_m)?;
                check_length("semi-minor axis", *semi_minor_m)?;
                if !orientation_deg.is_finite() {
                    return Err(GeometryError::InvalidLength {
                        what: "orientation",
                        value: *orientation_deg,
                    });
                }
                if semi_minor_m > semi_major_m {
                    return Err(GeometryError::DegenerateEllipse {
                        major_m: *semi_major_m,
                        minor_m: *semi_minor_m,
                    });
                }
            }
            LocationUncertainty::LinearPolygon { vertices } => {
                vertices.iter().try_for_each(check_point)?;
                let mut distinct: Vec<&GeoPoint> = Vec::with_capacity(vertices.len());
                for v in vertices {
                    if !distinct.iter().any(|d| *d == v) {
                        distinct.push(v);
                    }
                }
                if distinct.len() < 3 {
                    return Err(GeometryError::TooFewVertices(distinct.len()));
                }
            }
            LocationUncertainty::RadialPolygon { center, vectors } => {
                check_point(center)?;
                if vectors.len() < 3 {
                    return Err(GeometryError::TooFewVertices(vectors.len()));
                }
                for v in vectors {
                    check_length("radial vector length", v.length_m)?;
                    if !v.azimuth_deg.is_finite() {
                        return Err(GeometryError::InvalidLength {
                            what: "radial vector azimuth",
                            value: v.azimuth_deg,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Channels requested in one global operating class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInquiry {
    pub op_class: u8,
    /// Specific channel indices; all channels of the class when absent
    #[serde(default)]
    pub channels: Option<Vec<u8>>,
}

/// Availability request for one AP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApRequest {
    pub request_id: String,
    pub ruleset_id: String,
    #[serde(default)]
    pub device: DeviceDescriptor,
    pub location: LocationUncertainty,
    pub height: ApHeight,
    #[serde(default)]
    pub indoor: bool,
    #[serde(default)]
    pub antenna: DeviceAntenna,
    #[serde(default)]
    pub inquired_channels: Vec<ChannelInquiry>,
    #[serde(default)]
    pub inquired_frequencies: Vec<FrequencyRange>,
}

impl ApRequest {
    /// Request-level validation; nothing is computed for a request that fails
    pub fn validate(&self) -> AfcResult<()> {
        if self.request_id.trim().is_empty() {
            return Err(AfcError::rejected(RejectReason::MissingField, "request_id is empty"));
        }
        if self.ruleset_id.trim().is_empty() {
            return Err(AfcError::rejected(RejectReason::MissingField, "ruleset_id is empty"));
        }
        if self.inquired_channels.is_empty() && self.inquired_frequencies.is_empty() {
            return Err(AfcError::rejected(
                RejectReason::MissingField,
                "no inquired channels or frequencies",
            ));
        }

        for inquiry in &self.inquired_channels {
            if channel_width_mhz(inquiry.op_class).is_none() {
                return Err(AfcError::rejected(
                    RejectReason::UnsupportedSpectrum,
                    format!("operating class {}", inquiry.op_class),
                ));
            }
            for index in inquiry.channels.iter().flatten() {
                if Channel::new(inquiry.op_class, *index).is_none() {
                    return Err(AfcError::rejected(
                        RejectReason::UnsupportedSpectrum,
                        format!("channel {} in operating class {}", index, inquiry.op_class),
                    ));
                }
            }
        }
        for range in &self.inquired_frequencies {
            if !range.is_valid() || range.low_mhz < BAND_START_MHZ || range.high_mhz > BAND_STOP_MHZ {
                return Err(AfcError::rejected(
                    RejectReason::UnsupportedSpectrum,
                    format!("frequency range {}-{} MHz", range.low_mhz, range.high_mhz),
                ));
            }
        }

        self.location.validate()?;

        let h = &self.height;
        if !h.height_m.is_finite() {
            return Err(AfcError::InvalidRequest(format!("height {} m", h.height_m)));
        }
        if !h.vertical_uncertainty_m.is_finite() || h.vertical_uncertainty_m < 0.0 {
            return Err(GeometryError::NegativeUncertainty(h.vertical_uncertainty_m).into());
        }
        Ok(())
    }

    /// Requested channels in request order, without duplicates
    pub fn channels(&self) -> Vec<Channel> {
        let mut out: Vec<Channel> = Vec::new();
        for inquiry in &self.inquired_channels {
            let channels = match &inquiry.channels {
                Some(indices) => indices
                    .iter()
                    .filter_map(|idx| Channel::new(inquiry.op_class, *idx))
                    .collect(),
                None => Channel::all_in_class(inquiry.op_class),
            };
            for ch in channels {
                if !out.iter().any(|c| c.op_class == ch.op_class && c.index == ch.index) {
                    out.push(ch);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_request;
    use afc_core::error::ErrorKind;

    #[test]
    fn test_valid_request() {
        let req = sample_request();
        assert!(req.validate().is_ok());
        assert_eq!(req.channels().len(), 14);
    }

    #[test]
    fn test_degenerate_ellipse() {
        let mut req = sample_request();
        req.location = LocationUncertainty::Ellipse {
            center: GeoPoint::new(40.0, -105.0),
            semi_major_m: 10.0,
            semi_minor_m: 20.0,
            orientation_deg: 0.0,
        };
        let err = req.validate().unwrap_err();
        assert!(matches!(err, AfcError::Geometry(GeometryError::DegenerateEllipse { .. })));
        assert_eq!(err.kind(), ErrorKind::Request);
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let mut req = sample_request();
        req.inquired_channels = vec![ChannelInquiry {
            op_class: 131,
            channels: Some(vec![2]),
        }];
        assert_eq!(
            req.validate().unwrap_err().reject_reason(),
            Some(RejectReason::UnsupportedSpectrum)
        );
    }

    #[test]
    fn test_missing_inquiries() {
        let mut req = sample_request();
        req.inquired_channels.clear();
        req.inquired_frequencies.clear();
        assert_eq!(req.validate().unwrap_err().reject_reason(), Some(RejectReason::MissingField));
    }

    #[test]
    fn test_polygon_needs_three_distinct_vertices() {
        let p = GeoPoint::new(40.0, -105.0);
        let loc = LocationUncertainty::LinearPolygon {
            vertices: vec![p, p, GeoPoint::new(40.001, -105.0)],
        };
        assert_eq!(loc.validate(), Err(GeometryError::TooFewVertices(2)));
    }

    #[test]
    fn test_channel_dedup() {
        let mut req = sample_request();
        req.inquired_channels = vec![
            ChannelInquiry { op_class: 131, channels: Some(vec![1, 5, 1]) },
            ChannelInquiry { op_class: 131, channels: Some(vec![5]) },
        ];
        let chans = req.channels();
        assert_eq!(chans.len(), 2);
        assert_eq!(chans[0].index, 1);
    }

    #[test]
    fn test_request_json() {
        let json = r#"{
            "request_id": "r",
            "ruleset_id": "US_47_CFR_PART_15_SUBPART_E",
            "location": {"type": "radial_polygon", "center": {"lat_deg": 40.0, "lon_deg": -105.0},
                         "vectors": [{"azimuth_deg": 0, "length_m": 50},
                                     {"azimuth_deg": 120, "length_m": 50},
                                     {"azimuth_deg": 240, "length_m": 50}]},
            "height": {"height_m": 3.0, "reference": "AGL"},
            "inquired_frequencies": [{"low_mhz": 5925.0, "high_mhz": 5935.0}]
        }"#;
        let req: ApRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.antenna, DeviceAntenna::Omni);
        assert!(!req.indoor);
    }
}
