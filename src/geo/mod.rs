use std::cell::RefCell;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::survey::SurveyArea;

/// WGS84 ellipsoid constants.
pub const WGS84_A: f64 = 6378137.0;
pub const WGS84_ECC_SQUARED: f64 = 0.00669438;

const UTM_SCALE: f64 = 0.9996;
const FALSE_EASTING: f64 = 500000.0;
const SOUTHERN_NORTHING_OFFSET: f64 = 10000000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub fn letter(&self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Maps local simulation coordinates onto a configured UTM origin, with
/// optional seeded positional noise so tagging runs are reproducible.
pub struct Georeferencing {
    pub center_easting: f64,
    pub center_northing: f64,
    pub utm_zone: u8,
    pub hemisphere: Hemisphere,
    pub dilution_of_precision: f64,
    noise: f64,
    center: DVec3,
    rng: RefCell<StdRng>,
}

impl Georeferencing {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center_easting: f64,
        center_northing: f64,
        utm_zone: u8,
        hemisphere: Hemisphere,
        dilution_of_precision: f64,
        noise_seed: u64,
        max_noise: f64,
        survey_area: &SurveyArea,
    ) -> Self {
        Self {
            center_easting,
            center_northing,
            utm_zone,
            hemisphere,
            dilution_of_precision,
            noise: max_noise,
            center: survey_area.area_to_cover.center,
            rng: RefCell::new(StdRng::seed_from_u64(noise_seed)),
        }
    }

    /// Coordinate reference system label, e.g. "WGS84 UTM 19S".
    pub fn definition(&self) -> String {
        format!("WGS84 UTM {}{}", self.utm_zone, self.hemisphere.letter())
    }

    /// Translate a local position into UTM meters relative to the configured
    /// origin. Horizontal axes map to easting/northing offsets from the
    /// survey-area center; the vertical coordinate passes through unchanged.
    pub fn map_local_to_utm(&self, position: DVec3) -> UtmCoordinate {
        let noisy = position + self.random_unit_vector() * self.noise;
        UtmCoordinate {
            easting: self.center_easting + (noisy.x - self.center.x),
            northing: self.center_northing + (noisy.z - self.center.z),
            altitude: noisy.y,
        }
    }

    fn random_unit_vector(&self) -> DVec3 {
        let mut rng = self.rng.borrow_mut();
        // Rejection sampling inside the unit cube.
        loop {
            let v = DVec3::new(
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
                rng.random_range(-1.0..=1.0),
            );
            let len_sq = v.length_squared();
            if len_sq > 1e-6 && len_sq <= 1.0 {
                return v / len_sq.sqrt();
            }
        }
    }
}

/// Closed-form inverse Transverse Mercator (Redfearn series) on the WGS84
/// ellipsoid. Sub-meter agreement with reference UTM libraries at
/// mid-latitudes.
pub fn utm_to_lat_lng(
    easting: f64,
    northing: f64,
    utm_zone: u8,
    hemisphere: Hemisphere,
) -> LatLng {
    let a = WGS84_A;
    let ecc_squared = WGS84_ECC_SQUARED;

    let e1 = (1.0 - (1.0 - ecc_squared).sqrt()) / (1.0 + (1.0 - ecc_squared).sqrt());
    let x = easting - FALSE_EASTING;
    let mut y = northing;
    if hemisphere == Hemisphere::South {
        y -= SOUTHERN_NORTHING_OFFSET;
    }

    let long_origin = f64::from(i32::from(utm_zone) - 1) * 6.0 - 180.0 + 3.0;
    let ecc_prime_squared = ecc_squared / (1.0 - ecc_squared);

    // Footprint latitude from the meridional distance.
    let m = y / UTM_SCALE;
    let mu = m
        / (a * (1.0
            - ecc_squared / 4.0
            - 3.0 * ecc_squared * ecc_squared / 64.0
            - 5.0 * ecc_squared.powi(3) / 256.0));

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let n1 = a / (1.0 - ecc_squared * sin_phi1 * sin_phi1).sqrt();
    let t1 = phi1.tan() * phi1.tan();
    let c1 = ecc_prime_squared * cos_phi1 * cos_phi1;
    let r1 = a * (1.0 - ecc_squared) / (1.0 - ecc_squared * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * UTM_SCALE);

    let lat = phi1
        - (n1 * phi1.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ecc_prime_squared)
                    * d.powi(4)
                    / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * ecc_prime_squared
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lng = (d
        - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1
            + 8.0 * ecc_prime_squared
            + 24.0 * t1 * t1)
            * d.powi(5)
            / 120.0)
        / cos_phi1;

    LatLng {
        lat: lat.to_degrees(),
        lng: long_origin + lng.to_degrees(),
    }
}
