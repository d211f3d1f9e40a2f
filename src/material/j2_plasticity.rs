use crate::base::{Formulation, ParamPlasticity, N_LOCAL_J2};
use crate::fem::{forward_jacobians, ElementArgs, ElementKernel, ElementOutput, ElementPartials, ProjectionPartials};
use crate::StrError;
use num_dual::DualNum;
use russell_lab::{mat_copy, Vector};
use russell_tensor::SQRT_2_BY_3;
use std::f64::consts::FRAC_1_SQRT_2;

/// Holds the index of ᾱ (accumulated plastic strain) in the local state
const ALPHA: usize = 0;

/// Holds the index of Δγ (plastic multiplier increment) in the local state
const DGAMMA: usize = 1;

/// Holds the index of the first plastic strain component in the local state
const EP: usize = 2;

/// Holds the geometry of a linear triangle (constant gradients)
pub(crate) struct Tri3Geometry<D> {
    /// Area A
    pub area: D,

    /// Shape function derivatives along x
    pub bb: [D; 3],

    /// Shape function derivatives along y
    pub cc: [D; 3],
}

/// Holds the (SIMP-scaled) material moduli of an element
pub(crate) struct Moduli<D> {
    /// Mean design density ρ̄
    pub rho: D,

    /// Shear modulus G
    pub gg: D,

    /// Bulk modulus K
    pub kk: D,

    /// Initial yield stress
    pub z_ini: D,

    /// Hardening modulus
    pub hh: D,
}

/// Holds the stress state of an element
pub(crate) struct StressState<D> {
    /// Total strain ε (Mandel)
    pub eps: [D; 4],

    /// Elastic strain εᵉ = ε - εᵖ (Mandel)
    pub eps_e: [D; 4],

    /// Deviatoric stress s = 2G dev(εᵉ) (Mandel)
    pub s: [D; 4],

    /// Total stress σ (Mandel)
    pub sigma: [D; 4],
}

/// Implements the element kernel of plane-strain von Mises plasticity with linear isotropic hardening
///
/// The element is a linear triangle (Tri3) with one integration point. The local state holds
/// `[ᾱ, Δγ, εᵖ_xx, εᵖ_yy, εᵖ_zz, √2 εᵖ_xy]` and the local residual H reads:
///
/// ```text
/// elastic:  H = [ᾱ - ᾱₙ,  Δγ,  εᵖ - εᵖₙ]
/// plastic:  H = [ᾱ - ᾱₙ - √(2/3) Δγ,  f / (2G),  εᵖ - εᵖₙ - Δγ s/‖s‖]
/// ```
///
/// The branch is selected by the trial yield function evaluated with the previous local state.
#[derive(Clone, Copy, Debug)]
pub struct J2Plasticity {
    /// Holds the material parameters
    pub param: ParamPlasticity,

    /// Holds the formulation
    pub formulation: Formulation,
}

impl J2Plasticity {
    /// Allocates a new instance
    pub fn new(param: &ParamPlasticity, formulation: Formulation) -> Result<Self, StrError> {
        if param.validate().is_some() {
            return Err("cannot allocate J2Plasticity because param.validate() failed");
        }
        if let Formulation::Stabilized { alpha } = formulation {
            if alpha < 0.0 {
                return Err("the stabilization coefficient alpha must be ≥ 0.0");
            }
        }
        Ok(J2Plasticity {
            param: *param,
            formulation,
        })
    }

    /// Returns the number of DOFs per node
    fn ndof(&self) -> usize {
        self.formulation.dofs().len()
    }

    /// Calculates the area and the shape function derivatives
    pub(crate) fn geometry<D: DualNum<f64> + Copy>(&self, config: &[D]) -> Tri3Geometry<D> {
        let (x0, y0) = (config[0], config[1]);
        let (x1, y1) = (config[2], config[3]);
        let (x2, y2) = (config[4], config[5]);
        let two_area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
        Tri3Geometry {
            area: two_area * 0.5,
            bb: [(y1 - y2) / two_area, (y2 - y0) / two_area, (y0 - y1) / two_area],
            cc: [(x2 - x1) / two_area, (x0 - x2) / two_area, (x1 - x0) / two_area],
        }
    }

    /// Calculates the SIMP-scaled moduli
    pub(crate) fn moduli<D: DualNum<f64> + Copy>(&self, control: &[D]) -> Moduli<D> {
        let p = &self.param;
        let rho = (control[0] + control[1] + control[2]) / 3.0;
        let phi = rho.powf(p.penalty) * (1.0 - p.ersatz) + p.ersatz;
        Moduli {
            rho,
            gg: phi * p.shear_modulus(),
            kk: phi * p.bulk_modulus(),
            z_ini: phi * p.z_ini,
            hh: phi * p.hh,
        }
    }

    /// Calculates the strains and stresses
    pub(crate) fn stress_state<D: DualNum<f64> + Copy>(
        &self,
        geo: &Tri3Geometry<D>,
        mo: &Moduli<D>,
        u: &[D],
        c: &[D],
    ) -> StressState<D> {
        let nd = self.ndof();
        let zero = D::from(0.0);
        let (mut exx, mut eyy, mut gxy) = (zero, zero, zero);
        for a in 0..3 {
            let (ux, uy) = (u[a * nd], u[a * nd + 1]);
            exx += geo.bb[a] * ux;
            eyy += geo.cc[a] * uy;
            gxy += geo.cc[a] * ux + geo.bb[a] * uy;
        }
        let eps = [exx, eyy, zero, gxy * FRAC_1_SQRT_2];
        let mut eps_e = [zero; 4];
        for i in 0..4 {
            eps_e[i] = eps[i] - c[EP + i];
        }
        let tr = eps_e[0] + eps_e[1] + eps_e[2];
        let mean = tr / 3.0;
        let two_g = mo.gg * 2.0;
        let s = [
            (eps_e[0] - mean) * two_g,
            (eps_e[1] - mean) * two_g,
            (eps_e[2] - mean) * two_g,
            eps_e[3] * two_g,
        ];
        let p = match self.formulation {
            Formulation::Displacement => mo.kk * tr,
            Formulation::Stabilized { .. } => (u[2] + u[5] + u[8]) / 3.0,
        };
        StressState {
            eps,
            eps_e,
            s,
            sigma: [p + s[0], p + s[1], p + s[2], s[3]],
        }
    }

    /// Returns the norm of a (Mandel) deviatoric tensor
    fn norm<D: DualNum<f64> + Copy>(s: &[D; 4]) -> D {
        (s[0] * s[0] + s[1] * s[1] + s[2] * s[2] + s[3] * s[3]).sqrt()
    }

    /// Returns the trial yield function, i.e., with the local state of the previous step
    pub(crate) fn trial_yield_function(&self, args: &ElementArgs) -> f64 {
        let geo = self.geometry(args.config.as_data());
        let mo = self.moduli(args.control.as_data());
        let st = self.stress_state(&geo, &mo, args.u.as_data(), args.c_prev.as_data());
        J2Plasticity::norm(&st.s) - SQRT_2_BY_3 * (mo.z_ini + mo.hh * args.c_prev[ALPHA])
    }

    /// Calculates the concatenated residuals [R, H] with generic scalars
    pub(crate) fn residual_vector<D: DualNum<f64> + Copy>(
        &self,
        plastic: bool,
        u: &[D],
        c: &[D],
        c_prev: &[D],
        pi_prev: &[D],
        control: &[D],
        config: &[D],
    ) -> Vec<D> {
        let nd = self.ndof();
        let n_eq = 3 * nd;
        let zero = D::from(0.0);
        let mut res = vec![zero; n_eq + N_LOCAL_J2];
        let geo = self.geometry(config);
        let mo = self.moduli(control);
        let st = self.stress_state(&geo, &mo, u, c);

        // global residual (internal forces)
        let sig = &st.sigma;
        for a in 0..3 {
            res[a * nd] = (geo.bb[a] * sig[0] + geo.cc[a] * sig[3] * FRAC_1_SQRT_2) * geo.area;
            res[a * nd + 1] = (geo.cc[a] * sig[1] + geo.bb[a] * sig[3] * FRAC_1_SQRT_2) * geo.area;
        }

        // pressure equation
        if let Formulation::Stabilized { alpha } = self.formulation {
            let pbar = (u[2] + u[5] + u[8]) / 3.0;
            let tr = st.eps_e[0] + st.eps_e[1] + st.eps_e[2];
            let (mut gx, mut gy) = (zero, zero);
            for a in 0..3 {
                gx += geo.bb[a] * u[a * nd + 2];
                gy += geo.cc[a] * u[a * nd + 2];
            }
            let pix = (pi_prev[0] + pi_prev[2] + pi_prev[4]) / 3.0;
            let piy = (pi_prev[1] + pi_prev[3] + pi_prev[5]) / 3.0;
            let tau = geo.area * alpha / mo.gg; // α h² / (2G) with h² = 2A
            for a in 0..3 {
                let stab = (geo.bb[a] * (gx - pix) + geo.cc[a] * (gy - piy)) * tau;
                res[a * nd + 2] = (pbar / mo.kk - tr) * geo.area / 3.0 + stab * geo.area;
            }
        }

        // local residual
        let hh = &mut res[n_eq..];
        if plastic {
            let norm_s = J2Plasticity::norm(&st.s);
            let f = norm_s - (mo.z_ini + mo.hh * c[ALPHA]) * SQRT_2_BY_3;
            hh[ALPHA] = c[ALPHA] - c_prev[ALPHA] - c[DGAMMA] * SQRT_2_BY_3;
            hh[DGAMMA] = f / (mo.gg * 2.0);
            for i in 0..4 {
                hh[EP + i] = c[EP + i] - c_prev[EP + i] - c[DGAMMA] * st.s[i] / norm_s;
            }
        } else {
            hh[ALPHA] = c[ALPHA] - c_prev[ALPHA];
            hh[DGAMMA] = c[DGAMMA];
            for i in 0..4 {
                hh[EP + i] = c[EP + i] - c_prev[EP + i];
            }
        }
        res
    }

    /// Calculates the projected-field residual P with generic scalars
    ///
    /// ```text
    /// Pₐ = A/3 (πₐ - ∇p)
    /// ```
    pub(crate) fn projection_vector<D: DualNum<f64> + Copy>(&self, u: &[D], pi: &[D], config: &[D]) -> Vec<D> {
        let nd = self.ndof();
        let zero = D::from(0.0);
        let geo = self.geometry(config);
        let (mut gx, mut gy) = (zero, zero);
        for a in 0..3 {
            gx += geo.bb[a] * u[a * nd + 2];
            gy += geo.cc[a] * u[a * nd + 2];
        }
        let mut res = vec![zero; 6];
        for a in 0..3 {
            res[2 * a] = (pi[2 * a] - gx) * geo.area / 3.0;
            res[2 * a + 1] = (pi[2 * a + 1] - gy) * geo.area / 3.0;
        }
        res
    }
}

impl ElementKernel for J2Plasticity {
    fn formulation(&self) -> Formulation {
        self.formulation
    }

    fn n_local(&self) -> usize {
        N_LOCAL_J2
    }

    fn residuals(&self, rr: &mut Vector, hh: &mut Vector, args: &ElementArgs) -> Result<(), StrError> {
        let plastic = self.trial_yield_function(args) > 0.0;
        let res = self.residual_vector(
            plastic,
            args.u.as_data(),
            args.c.as_data(),
            args.c_prev.as_data(),
            args.pi_prev.as_data(),
            args.control.as_data(),
            args.config.as_data(),
        );
        let n_eq = rr.dim();
        if res.len() != n_eq + hh.dim() {
            return Err("residual vectors have incorrect dimensions");
        }
        for i in 0..n_eq {
            rr[i] = res[i];
        }
        for i in 0..hh.dim() {
            hh[i] = res[n_eq + i];
        }
        Ok(())
    }

    fn partials(&self, partials: &mut ElementPartials, args: &ElementArgs) -> Result<(), StrError> {
        let plastic = self.trial_yield_function(args) > 0.0;
        let (values, jacobians) = forward_jacobians(&args.blocks(), |v| {
            self.residual_vector(plastic, &v[0][..], &v[2][..], &v[3][..], &v[4][..], &v[5][..], &v[6][..])
        });
        let n_eq = partials.n_eq();
        let n_local = partials.n_local();
        if values.len() != n_eq + n_local {
            return Err("element partials have incorrect dimensions");
        }
        for i in 0..n_eq {
            partials.rr[i] = values[i];
        }
        for i in 0..n_local {
            partials.hh[i] = values[n_eq + i];
        }
        for (b, dd) in partials.drr_blocks_mut().into_iter().enumerate() {
            let ncol = dd.dims().1;
            for i in 0..n_eq {
                for j in 0..ncol {
                    dd.set(i, j, jacobians[b].get(i, j));
                }
            }
        }
        for (b, dd) in partials.dhh_blocks_mut().into_iter().enumerate() {
            let ncol = dd.dims().1;
            for i in 0..n_local {
                for j in 0..ncol {
                    dd.set(i, j, jacobians[b].get(n_eq + i, j));
                }
            }
        }
        Ok(())
    }

    fn update_local_state(&self, c: &mut Vector, args: &ElementArgs) -> Result<(), StrError> {
        if c.dim() != N_LOCAL_J2 {
            return Err("local state has incorrect dimension");
        }
        for i in 0..N_LOCAL_J2 {
            c[i] = args.c_prev[i];
        }
        c[DGAMMA] = 0.0;
        let f_trial = self.trial_yield_function(args);
        if f_trial <= 0.0 {
            return Ok(());
        }

        // radial return
        let geo = self.geometry(args.config.as_data());
        let mo = self.moduli(args.control.as_data());
        let st = self.stress_state(&geo, &mo, args.u.as_data(), args.c_prev.as_data());
        let norm_s = J2Plasticity::norm(&st.s);
        let dgamma = f_trial / (2.0 * mo.gg + 2.0 * mo.hh / 3.0);
        c[ALPHA] = args.c_prev[ALPHA] + SQRT_2_BY_3 * dgamma;
        c[DGAMMA] = dgamma;
        for i in 0..4 {
            c[EP + i] = args.c_prev[EP + i] + dgamma * st.s[i] / norm_s;
        }
        Ok(())
    }

    fn projection_partials(
        &self,
        partials: &mut ProjectionPartials,
        pi: &Vector,
        args: &ElementArgs,
    ) -> Result<(), StrError> {
        if self.formulation.n_projected() == 0 {
            return Ok(());
        }
        let (values, jacobians) = forward_jacobians(&[&args.u, pi, &args.config], |v| {
            self.projection_vector(&v[0][..], &v[1][..], &v[2][..])
        });
        if values.len() != partials.pp.dim() {
            return Err("projection partials have incorrect dimensions");
        }
        for i in 0..values.len() {
            partials.pp[i] = values[i];
        }
        mat_copy(&mut partials.dpp_du, &jacobians[0])?;
        mat_copy(&mut partials.dpp_dpi, &jacobians[1])?;
        mat_copy(&mut partials.dpp_dconfig, &jacobians[2])?;
        Ok(())
    }

    fn output(&self, args: &ElementArgs) -> Result<ElementOutput, StrError> {
        let geo = self.geometry(args.config.as_data());
        let mo = self.moduli(args.control.as_data());
        let st = self.stress_state(&geo, &mo, args.u.as_data(), args.c.as_data());
        let mut out = ElementOutput::new();
        for i in 0..4 {
            out.stress.vector_mut()[i] = st.sigma[i];
            out.plastic_strain.vector_mut()[i] = args.c[EP + i];
        }
        out.sigma_d = out.stress.invariant_sigma_d();
        out.alpha = args.c[ALPHA];
        out.plastic = args.c[DGAMMA] > 0.0;
        Ok(out)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
