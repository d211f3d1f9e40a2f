use super::J2Plasticity;
use crate::fem::{Criterion, CriterionPartials, ElementArgs};
use crate::StrError;
use num_dual::DualNum;

/// Implements the stored (elastic and hardening) energy
///
/// ```text
/// F_k^e = A [ ½ K tr(εᵉ)² + G ‖dev(εᵉ)‖² + ½ hh ᾱ² ]
/// ```
///
/// By default only the terminal step contributes; use [InternalEnergy::set_all_steps]
/// to sum over the whole history.
pub struct InternalEnergy {
    kernel: J2Plasticity,
    all_steps: bool,
}

/// Implements the plastic dissipation
///
/// ```text
/// F_k^e = A s_k : (εᵖ_k - εᵖ_{k-1})
/// ```
///
/// summed over all steps.
pub struct PlasticWork {
    kernel: J2Plasticity,
}

/// Implements the material volume Σ_e A ρ̄ evaluated at the terminal step
pub struct Volume {
    kernel: J2Plasticity,
}

impl InternalEnergy {
    /// Allocates a new instance
    pub fn new(kernel: &J2Plasticity) -> Self {
        InternalEnergy {
            kernel: *kernel,
            all_steps: false,
        }
    }

    /// Sums the energy over all steps instead of taking the terminal step only
    pub fn set_all_steps(&mut self, flag: bool) -> &mut Self {
        self.all_steps = flag;
        self
    }

    fn energy<D: DualNum<f64> + Copy>(&self, u: &[D], c: &[D], control: &[D], config: &[D]) -> D {
        let geo = self.kernel.geometry(config);
        let mo = self.kernel.moduli(control);
        let st = self.kernel.stress_state(&geo, &mo, u, c);
        let tr = st.eps_e[0] + st.eps_e[1] + st.eps_e[2];
        let mut sd = D::from(0.0);
        for i in 0..4 {
            sd += st.s[i] * st.eps_e[i];
        }
        let alpha = c[0];
        (mo.kk * tr * tr * 0.5 + sd * 0.5 + mo.hh * alpha * alpha * 0.5) * geo.area
    }
}

impl Criterion for InternalEnergy {
    fn element_partials(
        &self,
        partials: &mut CriterionPartials,
        step: usize,
        n_steps: usize,
        args: &ElementArgs,
    ) -> Result<(), StrError> {
        if !self.all_steps && step + 1 != n_steps {
            partials.clear();
            return Ok(());
        }
        partials.autodiff(args, |v| self.energy(&v[0][..], &v[1][..], &v[3][..], &v[4][..]))
    }
}

impl PlasticWork {
    /// Allocates a new instance
    pub fn new(kernel: &J2Plasticity) -> Self {
        PlasticWork { kernel: *kernel }
    }

    fn work<D: DualNum<f64> + Copy>(&self, u: &[D], c: &[D], c_prev: &[D], control: &[D], config: &[D]) -> D {
        let geo = self.kernel.geometry(config);
        let mo = self.kernel.moduli(control);
        let st = self.kernel.stress_state(&geo, &mo, u, c);
        let mut w = D::from(0.0);
        for i in 0..4 {
            w += st.s[i] * (c[2 + i] - c_prev[2 + i]);
        }
        w * geo.area
    }
}

impl Criterion for PlasticWork {
    fn element_partials(
        &self,
        partials: &mut CriterionPartials,
        _step: usize,
        _n_steps: usize,
        args: &ElementArgs,
    ) -> Result<(), StrError> {
        partials.autodiff(args, |v| self.work(&v[0][..], &v[1][..], &v[2][..], &v[3][..], &v[4][..]))
    }
}

impl Volume {
    /// Allocates a new instance
    pub fn new(kernel: &J2Plasticity) -> Self {
        Volume { kernel: *kernel }
    }
}

impl Criterion for Volume {
    fn element_partials(
        &self,
        partials: &mut CriterionPartials,
        step: usize,
        n_steps: usize,
        args: &ElementArgs,
    ) -> Result<(), StrError> {
        if step + 1 != n_steps {
            partials.clear();
            return Ok(());
        }
        partials.autodiff(args, |v| {
            let geo = self.kernel.geometry(&v[4][..]);
            let mo = self.kernel.moduli(&v[3][..]);
            mo.rho * geo.area
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
