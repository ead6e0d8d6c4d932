//! Deposition process parameters.
//!
//! Converts the physical configuration (wire and deposition diameters, wire
//! feed rate) into per-segment wire feed lengths, move durations, and the
//! linear feed rates the controller displays. The governing invariant: the
//! volume of wire consumed over a segment equals the volume of material
//! deposited along it.

use crate::geometry::circle_area;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("wire diameter ({wire} mm) must be smaller than the deposition diameter ({deposition} mm)")]
    WireTooWide { wire: f64, deposition: f64 },

    #[error("number of layers must be at least 1")]
    NoLayers,

    #[error("initial pause must not be negative, got {0} s")]
    NegativePause(f64),
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Physical process parameters shared by every pattern.
#[derive(Debug, Clone)]
pub struct Process {
    /// Height above the substrate to rapid to at program start, mm
    pub approach_height: f64,
    /// Time over which to feed down from the approach height, s
    pub approach_duration: f64,
    /// Feedstock wire diameter, mm
    pub wire_diameter: f64,
    /// Estimated diameter of the deposition area under the nozzle, mm
    pub deposition_diameter: f64,
    /// Wire feed rate, mm/s
    pub feed_rate: f64,
    /// Spindle speed, rpm
    pub spindle_speed: u32,
}

/// Wire feed length, duration and displayed feed rate for one segment.
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    /// Wire consumed over the segment, mm
    pub feed_length: f64,
    /// Time to feed that length at the configured rate, s
    pub duration: f64,
    /// Linear feed rate shown on the controller, mm/min
    pub rate: f64,
}

/// Derived areas and rates, and the segment calculator built on them.
#[derive(Debug, Clone)]
pub struct DepositionCalc {
    /// Cross-sectional area of the wire, mm^2
    pub wire_area: f64,
    /// Area of the deposition spot under the nozzle, mm^2
    pub deposition_area: f64,
    /// Width of the track laid down by a traversing move, mm
    pub deposition_diameter: f64,
    /// Wire feed rate, mm/s
    pub feed_rate: f64,
    /// Volumetric rate of wire addition, mm^3/s
    pub volumetric_rate: f64,
}

impl DepositionCalc {
    /// Validate the configuration and derive the rates. Every downstream
    /// formula divides by the wire area or the feed rate, so anything
    /// non-positive is rejected here, before any output exists.
    pub fn new(process: &Process) -> Result<Self, ConfigError> {
        positive("approach height", process.approach_height)?;
        positive("approach duration", process.approach_duration)?;
        let wire = positive("wire diameter", process.wire_diameter)?;
        let deposition = positive("deposition diameter", process.deposition_diameter)?;
        let feed_rate = positive("feed rate", process.feed_rate)?;
        if wire >= deposition {
            return Err(ConfigError::WireTooWide { wire, deposition });
        }
        let wire_area = circle_area(wire);
        Ok(DepositionCalc {
            wire_area,
            deposition_area: circle_area(deposition),
            deposition_diameter: deposition,
            feed_rate,
            volumetric_rate: feed_rate * wire_area,
        })
    }

    /// Wire length and time needed to supply `volume` mm^3 of material.
    fn feed_for_volume(&self, volume: f64) -> (f64, f64) {
        (volume / self.wire_area, volume / self.volumetric_rate)
    }

    /// Kinematics for a lateral move of `travel` mm, laying a track one
    /// layer high and one deposition diameter wide.
    pub fn traverse(&self, travel: f64, layer_height: f64) -> Kinematics {
        let volume = travel * self.deposition_diameter * layer_height;
        let (feed_length, duration) = self.feed_for_volume(volume);
        Kinematics {
            feed_length,
            duration,
            rate: travel / duration * 60.0,
        }
    }

    /// Kinematics for a climb of `rise` mm with the nozzle held over one
    /// spot. There is no XY travel to rate against, so the displayed rate
    /// is taken over the rise.
    pub fn climb(&self, rise: f64) -> Kinematics {
        let volume = self.deposition_area * rise;
        let (feed_length, duration) = self.feed_for_volume(volume);
        Kinematics {
            feed_length,
            duration,
            rate: rise / duration * 60.0,
        }
    }

    /// Time to feed `wire` mm during the escape move. The escape is not
    /// volume-matched; the wire just keeps moving at the configured rate.
    pub fn escape_duration(&self, wire: f64) -> f64 {
        wire / self.feed_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative_close(actual: f64, expected: f64, tol: f64) -> bool {
        (actual - expected).abs() <= tol * expected.abs()
    }

    fn process() -> Process {
        Process {
            approach_height: 20.0,
            approach_duration: 30.0,
            wire_diameter: 0.9,
            deposition_diameter: 3.3,
            feed_rate: 1.0,
            spindle_speed: 24000,
        }
    }

    #[test]
    fn traverse_conserves_volume() {
        let calc = DepositionCalc::new(&process()).unwrap();
        let kin = calc.traverse(10.0, 0.05);
        let volume = 10.0 * 3.3 * 0.05;
        assert!(relative_close(kin.feed_length * calc.wire_area, volume, 1e-9));
    }

    #[test]
    fn climb_conserves_volume() {
        let calc = DepositionCalc::new(&process()).unwrap();
        let kin = calc.climb(0.05);
        let volume = calc.deposition_area * 0.05;
        assert!(relative_close(kin.feed_length * calc.wire_area, volume, 1e-9));
    }

    #[test]
    fn duration_matches_feed_length_over_feed_rate() {
        let mut p = process();
        p.feed_rate = 2.5;
        let calc = DepositionCalc::new(&p).unwrap();
        let kin = calc.traverse(12.0, 0.1);
        assert!(relative_close(kin.duration, kin.feed_length / 2.5, 1e-9));
    }

    #[test]
    fn pillar_climb_numbers() {
        // 10mm pillar, 4mm deposition, 0.9mm wire, 1mm/s:
        // feed length (pi * 2^2 * 10) / (pi * 0.45^2) = 197.53mm over 197.53s
        let mut p = process();
        p.deposition_diameter = 4.0;
        let calc = DepositionCalc::new(&p).unwrap();
        let kin = calc.climb(10.0);
        assert!(relative_close(kin.feed_length, 197.530_864, 1e-3));
        assert!(relative_close(kin.duration, 197.530_864, 1e-3));
        assert!(relative_close(kin.rate, 10.0 / kin.duration * 60.0, 1e-9));
    }

    #[test]
    fn traverse_rate_is_travel_over_duration() {
        let calc = DepositionCalc::new(&process()).unwrap();
        let kin = calc.traverse(10.0, 0.05);
        assert!(relative_close(kin.rate, 10.0 / kin.duration * 60.0, 1e-9));
    }

    #[test]
    fn escape_duration_from_feed_rate() {
        let mut p = process();
        p.feed_rate = 2.0;
        let calc = DepositionCalc::new(&p).unwrap();
        assert!(relative_close(calc.escape_duration(10.0), 5.0, 1e-9));
    }

    #[test]
    fn rejects_non_positive_feed_rate() {
        let mut p = process();
        p.feed_rate = 0.0;
        assert!(matches!(
            DepositionCalc::new(&p),
            Err(ConfigError::NonPositive { name: "feed rate", .. })
        ));
    }

    #[test]
    fn rejects_negative_wire_diameter() {
        let mut p = process();
        p.wire_diameter = -0.9;
        assert!(matches!(
            DepositionCalc::new(&p),
            Err(ConfigError::NonPositive { name: "wire diameter", .. })
        ));
    }

    #[test]
    fn rejects_wire_wider_than_deposition() {
        let mut p = process();
        p.wire_diameter = 3.5;
        assert!(matches!(
            DepositionCalc::new(&p),
            Err(ConfigError::WireTooWide { .. })
        ));
    }
}
