//! Link budget between a scan point and one victim

use afc_core::antenna::repeater::{back_to_back_gain_db, reflector_discrimination_db};
use afc_core::antenna::{wavelength_m, AntennaResolver};
use afc_core::channel_plan::FrequencyRange;
use afc_core::config::RegulatoryConfig;
use afc_core::coordinates::{look_angle, off_axis_angle_deg, LlaPosition};
use afc_core::error::ComputationError;
use afc_core::link_budget::CouplingBudget;
use afc_core::propagation::{building_entry_loss_db, PathLoss, PropagationEngine};

use crate::incumbent::{RepeaterKind, Victim, VictimKind};
use crate::request::ApRequest;
use crate::scan::ScanPoint;

/// Coupling from AP EIRP to one victim receiver input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coupling {
    pub net_coupling_db: f64,
    /// Receiver noise over its full band (dBm)
    pub noise_dbm: f64,
    pub band: FrequencyRange,
    /// AP to entry point
    pub path_loss: PathLoss,
    /// Entry path loss plus every downstream hop (dB)
    pub total_path_loss_db: f64,
    /// Receive gain toward the AP, or the repeater chain's net gain
    pub rx_gain_dbi: f64,
}

/// Computes [`Coupling`] for one request
#[derive(Clone, Copy)]
pub struct CouplingCalculator<'a> {
    regulatory: &'a RegulatoryConfig,
    propagation: PropagationEngine<'a>,
    antennas: AntennaResolver<'a>,
    request: &'a ApRequest,
}

impl<'a> CouplingCalculator<'a> {
    pub fn new(
        regulatory: &'a RegulatoryConfig,
        propagation: PropagationEngine<'a>,
        antennas: AntennaResolver<'a>,
        request: &'a ApRequest,
    ) -> Self {
        Self {
            regulatory,
            propagation,
            antennas,
            request,
        }
    }

    pub fn coupling(&self, point: &ScanPoint, victim: &Victim<'_>) -> Result<Coupling, ComputationError> {
        let link = victim.link();
        let freq = link.center_mhz;
        let ap = point.lla();

        let path_loss = self.propagation.path_loss(&point.endpoint(), &victim.endpoint(), freq);
        if !path_loss.total_db.is_finite() || path_loss.total_db <= 0.0 {
            tracing::error!(link = %link.id, loss_db = path_loss.total_db, "invalid path loss");
            return Err(ComputationError::InvalidPathLoss {
                incumbent: link.id.clone(),
                value_db: path_loss.total_db,
            });
        }

        let toward = look_angle(&ap, &victim.entry);
        let ap_gain = self
            .request
            .antenna
            .relative_gain_toward(toward.azimuth_deg, toward.elevation_deg);

        let mut budget = CouplingBudget::new()
            .path_loss_db(path_loss.total_db)
            .ap_relative_gain_db(ap_gain)
            .feeder_loss_db(
                link.receiver
                    .feeder_loss_db
                    .unwrap_or(self.regulatory.default_feeder_loss_db),
            )
            .polarization_loss_db(self.regulatory.polarization_loss_db)
            .body_loss_db(self.regulatory.body_loss_db(self.request.indoor));
        if self.request.indoor {
            budget = budget.building_loss_db(building_entry_loss_db(
                &self.regulatory.building_loss,
                freq,
                toward.elevation_deg,
            ));
        }

        let (budget, rx_gain_dbi, downstream_loss_db) = match victim.kind {
            VictimKind::Direct => {
                let g = victim.geometry;
                let off_axis = off_axis_angle_deg(&victim.entry, &g.receiver_boresight(), &ap);
                let d = self
                    .antennas
                    .discrimination(&link.receiver.antenna, off_axis, freq, ap.slant_distance_to(&victim.entry));
                let budget = budget
                    .rx_gain_dbi(d.gain_dbi)
                    .near_field_adjustment_db(d.near_field_adjustment_db);
                (budget, d.effective_gain_dbi(), 0.0)
            }
            VictimKind::Repeater { index } => {
                let g = victim.geometry;
                let entry_gain = self.repeater_entry_gain_db(victim, index, &ap);
                let chain_gain = entry_gain + g.downstream_db(index);
                let budget = budget
                    .rx_gain_dbi(link.receiver.antenna.gain_dbi)
                    .repeater_gain_db(chain_gain);
                (budget, chain_gain, g.downstream_loss_db(index))
            }
        };

        let noise_psd = link
            .receiver
            .noise_dbm_per_mhz
            .unwrap_or_else(|| self.regulatory.noise_psd_dbm_per_mhz(freq));

        Ok(Coupling {
            net_coupling_db: budget.net_coupling_db(),
            noise_dbm: noise_psd + 10.0 * link.bandwidth_mhz.log10(),
            band: link.band(),
            path_loss,
            total_path_loss_db: budget.path_loss() + downstream_loss_db,
            rx_gain_dbi,
        })
    }

    /// Gain of the entry repeater toward the AP and on into the next hop
    fn repeater_entry_gain_db(&self, victim: &Victim<'_>, index: usize, ap: &LlaPosition) -> f64 {
        let g = victim.geometry;
        let link = g.link;
        let here = g.repeater(index);
        let upstream = g.nodes[index];
        match link.repeaters[index].kind {
            RepeaterKind::Reflector { width_m, height_m } => {
                let to_upstream = look_angle(&here, &upstream);
                let to_ap = look_angle(&here, ap);
                let mut delta_az = (to_ap.azimuth_deg - to_upstream.azimuth_deg + 540.0).rem_euclid(360.0) - 180.0;
                delta_az = delta_az.clamp(-90.0, 90.0);
                let delta_el = to_ap.elevation_deg - to_upstream.elevation_deg;
                let lambda = wavelength_m(link.center_mhz);
                let half = g.half_included_angle_deg(index);
                g.aligned_gain_db(index)
                    + reflector_discrimination_db(width_m, height_m, lambda, half, delta_az, delta_el)
            }
            RepeaterKind::BackToBack {
                gain_dbi,
                insertion_loss_db,
            } => {
                let off_axis = off_axis_angle_deg(&here, &upstream, ap);
                let (input_gain, _) = self.antennas.broad_gain(gain_dbi, off_axis);
                back_to_back_gain_db(input_gain, gain_dbi, insertion_loss_db)
            }
        }
    }
}
