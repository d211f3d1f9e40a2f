use serde::{Deserialize, Serialize};

/// Holds parameters for the (SIMP-penalized) von Mises plasticity model with linear isotropic hardening
///
/// The design density ρ̄ of an element (mean of its nodal control values) scales the
/// moduli, the initial yield stress, and the hardening modulus by:
///
/// ```text
/// φ(ρ̄) = ersatz + (1 - ersatz) ρ̄ᵖ      (p = penalty)
/// ```
///
/// The yield function reads:
///
/// ```text
/// f = ‖dev(σ)‖ - √(2/3) (z_ini + hh ᾱ)
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ParamPlasticity {
    /// Young's modulus
    pub young: f64,

    /// Poisson's coefficient
    pub poisson: f64,

    /// Initial yield stress (uniaxial)
    pub z_ini: f64,

    /// Linear isotropic hardening modulus
    pub hh: f64,

    /// SIMP penalty exponent
    pub penalty: f64,

    /// Ersatz (void) material fraction
    pub ersatz: f64,
}

impl ParamPlasticity {
    /// Returns sample parameters of an (effectively) elastic material
    ///
    /// The initial yield stress is so high that the yield surface is never reached.
    pub fn sample_elastic() -> Self {
        ParamPlasticity {
            young: 1000.0,
            poisson: 0.25,
            z_ini: 1e30,
            hh: 0.0,
            penalty: 3.0,
            ersatz: 1e-3,
        }
    }

    /// Returns sample parameters of a von Mises material that yields at moderate strains
    pub fn sample_von_mises() -> Self {
        ParamPlasticity {
            young: 1000.0,
            poisson: 0.3,
            z_ini: 1.0,
            hh: 100.0,
            penalty: 3.0,
            ersatz: 1e-3,
        }
    }

    /// Returns the shear modulus G
    pub fn shear_modulus(&self) -> f64 {
        self.young / (2.0 * (1.0 + self.poisson))
    }

    /// Returns the bulk modulus K
    pub fn bulk_modulus(&self) -> f64 {
        self.young / (3.0 * (1.0 - 2.0 * self.poisson))
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.young <= 0.0 {
            return Some(format!("young = {:?} is incorrect; it must be > 0.0", self.young));
        }
        if self.poisson <= -1.0 || self.poisson >= 0.5 {
            return Some(format!(
                "poisson = {:?} is incorrect; it must be in (-1.0, 0.5)",
                self.poisson
            ));
        }
        if self.z_ini <= 0.0 {
            return Some(format!("z_ini = {:?} is incorrect; it must be > 0.0", self.z_ini));
        }
        if self.hh < 0.0 {
            return Some(format!("hh = {:?} is incorrect; it must be ≥ 0.0", self.hh));
        }
        if self.penalty < 1.0 {
            return Some(format!("penalty = {:?} is incorrect; it must be ≥ 1.0", self.penalty));
        }
        if self.ersatz <= 0.0 || self.ersatz > 1.0 {
            return Some(format!("ersatz = {:?} is incorrect; it must be in (0.0, 1.0]", self.ersatz));
        }
        None // all good
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ParamPlasticity;
    use russell_lab::approx_eq;

    #[test]
    fn derive_methods_work() {
        let p = ParamPlasticity::sample_von_mises();
        let q = p.clone();
        let json = serde_json::to_string(&q).unwrap();
        let r: ParamPlasticity = serde_json::from_str(&json).unwrap();
        assert_eq!(r.young, p.young);
        assert!(format!("{:?}", r).len() > 0);
    }

    #[test]
    fn moduli_work() {
        let p = ParamPlasticity::sample_elastic();
        approx_eq(p.shear_modulus(), 400.0, 1e-13);
        approx_eq(p.bulk_modulus(), 1000.0 / 1.5, 1e-13);
    }

    #[test]
    fn validate_works() {
        let mut p = ParamPlasticity::sample_von_mises();
        assert_eq!(p.validate(), None);
        p.young = 0.0;
        assert_eq!(p.validate(), Some("young = 0.0 is incorrect; it must be > 0.0".to_string()));
        p.young = 1000.0;
        p.poisson = 0.5;
        assert_eq!(
            p.validate(),
            Some("poisson = 0.5 is incorrect; it must be in (-1.0, 0.5)".to_string())
        );
        p.poisson = 0.3;
        p.z_ini = -1.0;
        assert_eq!(p.validate(), Some("z_ini = -1.0 is incorrect; it must be > 0.0".to_string()));
        p.z_ini = 1.0;
        p.hh = -1.0;
        assert_eq!(p.validate(), Some("hh = -1.0 is incorrect; it must be ≥ 0.0".to_string()));
        p.hh = 0.0;
        p.penalty = 0.5;
        assert_eq!(
            p.validate(),
            Some("penalty = 0.5 is incorrect; it must be ≥ 1.0".to_string())
        );
        p.penalty = 3.0;
        p.ersatz = 0.0;
        assert_eq!(
            p.validate(),
            Some("ersatz = 0.0 is incorrect; it must be in (0.0, 1.0]".to_string())
        );
    }
}
