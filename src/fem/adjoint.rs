use super::{BcPrescribedArray, CondensedElement, Criterion, CriterionPartials, ElementPartials, Elements, FemBase};
use super::{LinearSystem, Projection, ProjectionPartials, StateHistory};
use crate::base::{assemble_vector, matrix_times_vector, Config, Essential, GradientKind};
use crate::StrError;
use rayon::prelude::*;
use russell_lab::{vec_copy, vec_norm, vec_update, Norm, Vector};

/// Holds the adjoint quantities of one element at one step
///
/// With the Lagrangian `L = Σₖ (Fₖ + λₖᵀ Rₖ + μₖᵀ Hₖ + γₖᵀ Pₖ)`, the element values are:
///
/// ```text
/// q   = ∂Fₖ/∂c + ∂Fₖ₊₁/∂c_prev + (∂Rₖ₊₁/∂c_prev)ᵀ λₖ₊₁ + (∂Hₖ₊₁/∂c_prev)ᵀ μₖ₊₁
/// rhs = -∂Fₖ/∂u - (∂Rₖ₊₁/∂u_prev)ᵀ λₖ₊₁ - (∂Hₖ₊₁/∂u_prev)ᵀ μₖ₊₁ + (∂H/∂u)ᵀ (∂H/∂c)⁻ᵀ q - (∂Pₖ/∂u)ᵀ γₖ
/// μ   = -(∂H/∂c)⁻ᵀ (q + (∂R/∂c)ᵀ λ)
/// w   = (∂R/∂π_prev)ᵀ λ + (∂H/∂π_prev)ᵀ μ
/// ```
pub struct AdjointLocal {
    /// Holds q (n_local)
    pub q: Vector,

    /// Holds the element right-hand side of the global adjoint system (n_eq)
    pub rhs: Vector,

    /// Holds the global adjoint λ gathered at the element (n_eq)
    pub lambda: Vector,

    /// Holds the local adjoint μ (n_local)
    pub mu: Vector,

    /// Holds the projected-field adjoint γ gathered at the element (n_node × n_projected)
    pub gamma: Vector,

    /// Holds the contribution to the projected-field adjoint of the previous step (n_node × n_projected)
    pub w: Vector,

    /// Holds the element contribution to the total derivative w.r.t. the control field (n_node)
    pub gradient_control: Vector,

    /// Holds the element contribution to the total derivative w.r.t. the configuration (n_node × 2)
    pub gradient_config: Vector,

    /// Auxiliary vector (n_local)
    aux: Vector,
}

/// Computes the total derivative of a criterion by walking the state history backwards
///
/// The recursion starts at the last step (where the adjoints of the following step vanish)
/// and, at each step, solves the transposed condensed system `K_effᵀ λ = rhs` followed by the
/// element-local recovery of μ. The projected-field adjoint γ is computed in closed form
/// using the lumped projection matrix.
pub struct AdjointIntegrator<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Holds the mesh, kernel, and equation numbers
    base: &'a FemBase<'a>,

    /// Holds the prescribed equations (λ vanishes there)
    prescribed: BcPrescribedArray,
}

impl AdjointLocal {
    /// Allocates a new instance
    pub fn new(n_node: usize, n_eq: usize, n_local: usize, n_projected: usize) -> Self {
        AdjointLocal {
            q: Vector::new(n_local),
            rhs: Vector::new(n_eq),
            lambda: Vector::new(n_eq),
            mu: Vector::new(n_local),
            gamma: Vector::new(n_node * n_projected),
            w: Vector::new(n_node * n_projected),
            gradient_control: Vector::new(n_node),
            gradient_config: Vector::new(n_node * 2),
            aux: Vector::new(n_local),
        }
    }

    /// Computes q and the element right-hand side of the global adjoint system
    ///
    /// `next` holds the partials, criterion partials, and adjoint values of the same element at
    /// the following step (None at the last step). `self.gamma` must be set beforehand.
    fn calc_rhs(
        &mut self,
        partials: &ElementPartials,
        condensed: &CondensedElement,
        criterion: &CriterionPartials,
        projection: &ProjectionPartials,
        next: Option<(&ElementPartials, &CriterionPartials, &AdjointLocal)>,
    ) -> Result<(), StrError> {
        // q
        vec_copy(&mut self.q, &criterion.gradient_c)?;
        if let Some((np, nc, na)) = next {
            vec_update(&mut self.q, 1.0, &nc.gradient_cp)?;
            matrix_times_vector(&mut self.q, 1.0, &np.drr_dc_prev, &na.lambda, true)?;
            matrix_times_vector(&mut self.q, 1.0, &np.dhh_dc_prev, &na.mu, true)?;
        }

        // right-hand side
        self.rhs.fill(0.0);
        vec_update(&mut self.rhs, -1.0, &criterion.gradient_u)?;
        if let Some((np, _, na)) = next {
            matrix_times_vector(&mut self.rhs, -1.0, &np.drr_du_prev, &na.lambda, true)?;
            matrix_times_vector(&mut self.rhs, -1.0, &np.dhh_du_prev, &na.mu, true)?;
        }
        self.aux.fill(0.0);
        matrix_times_vector(&mut self.aux, 1.0, &condensed.inv, &self.q, true)?;
        matrix_times_vector(&mut self.rhs, 1.0, &partials.dhh_du, &self.aux, true)?;
        if self.gamma.dim() > 0 {
            matrix_times_vector(&mut self.rhs, -1.0, &projection.dpp_du, &self.gamma, true)?;
        }
        Ok(())
    }

    /// Recovers μ and computes the element contributions to the total derivatives
    ///
    /// `self.lambda` must be gathered beforehand.
    fn calc_mu_and_gradients(
        &mut self,
        partials: &ElementPartials,
        condensed: &CondensedElement,
        criterion: &CriterionPartials,
        projection: &ProjectionPartials,
    ) -> Result<(), StrError> {
        // μ = -(∂H/∂c)⁻ᵀ (q + (∂R/∂c)ᵀ λ)
        vec_copy(&mut self.aux, &self.q)?;
        matrix_times_vector(&mut self.aux, 1.0, &partials.drr_dc, &self.lambda, true)?;
        self.mu.fill(0.0);
        matrix_times_vector(&mut self.mu, -1.0, &condensed.inv, &self.aux, true)?;

        // total derivatives
        vec_copy(&mut self.gradient_control, &criterion.gradient_control)?;
        matrix_times_vector(&mut self.gradient_control, 1.0, &partials.drr_dcontrol, &self.lambda, true)?;
        matrix_times_vector(&mut self.gradient_control, 1.0, &partials.dhh_dcontrol, &self.mu, true)?;
        vec_copy(&mut self.gradient_config, &criterion.gradient_config)?;
        matrix_times_vector(&mut self.gradient_config, 1.0, &partials.drr_dconfig, &self.lambda, true)?;
        matrix_times_vector(&mut self.gradient_config, 1.0, &partials.dhh_dconfig, &self.mu, true)?;

        // projected field
        if self.gamma.dim() > 0 {
            matrix_times_vector(&mut self.gradient_config, 1.0, &projection.dpp_dconfig, &self.gamma, true)?;
            self.w.fill(0.0);
            matrix_times_vector(&mut self.w, 1.0, &partials.drr_dpi, &self.lambda, true)?;
            matrix_times_vector(&mut self.w, 1.0, &partials.dhh_dpi, &self.mu, true)?;
        }
        Ok(())
    }
}

impl<'a> AdjointIntegrator<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config, base: &'a FemBase<'a>, essential: &Essential) -> Result<Self, StrError> {
        if let Some(msg) = config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate AdjointIntegrator because config.validate() failed");
        }
        Ok(AdjointIntegrator {
            config,
            base,
            prescribed: BcPrescribedArray::new(base, essential)?,
        })
    }

    /// Computes the value and the total derivative of a criterion
    ///
    /// # Input
    ///
    /// * `criterion` -- the scalar criterion F = Σₖ Fₖ
    /// * `history` -- the converged states of all steps (from the forward solve)
    /// * `control` -- the control field used by the forward solve
    /// * `config` -- the configuration field used by the forward solve
    /// * `kind` -- selects the field with respect to which the derivative is computed
    ///
    /// # Output
    ///
    /// Returns `(F, dF/dz)` where `z` is the control field (one value per point) or the
    /// configuration field (two values per point).
    pub fn gradient(
        &self,
        criterion: &dyn Criterion,
        history: &StateHistory,
        control: &Vector,
        config: &Vector,
        kind: GradientKind,
    ) -> Result<(f64, Vector), StrError> {
        let base = self.base;
        base.check_fields(control, config)?;
        let n_steps = history.n_steps();
        if n_steps == 0 {
            return Err("state history is empty");
        }
        history.check_dims(base)?;

        // auxiliary data
        let flags = &self.prescribed.flags;
        let has_projection = base.n_projected > 0;
        let tol_singular = if self.config.check_local_tangent {
            Some(self.config.tol_singular)
        } else {
            None
        };
        let zero = base.zero_state();
        let mut cur = Elements::new(base);
        let mut next = Elements::new(base);
        let mut linear_system = LinearSystem::new(base, self.config, &self.prescribed)?;
        let mut projection = Projection::new(base);
        let mut gamma = Vector::new(base.n_projected_total());
        let mut grad_control = Vector::new(base.n_point());
        let mut grad_config = Vector::new(2 * base.n_point());
        let mut value = 0.0;

        if self.config.verbose_adjoint {
            println!("\nPLASTOPT === ADJOINT RECURSION =============================================");
            println!("{:>8} {:>11} {:>11} {:>11}", "step", "‖λ‖∞", "‖μ‖∞", "‖γ‖∞");
        }

        for k in (0..n_steps).rev() {
            let has_next = k + 1 < n_steps;
            let ctx = history.context(k, &zero, control, config)?;

            // partials, condensation, and criterion at step k
            cur.gather_parallel(&ctx);
            cur.calc_partials_parallel()?;
            cur.condense_parallel(tol_singular)?;
            cur.calc_criterion_parallel(criterion, k, n_steps)?;
            value += cur.all.iter().map(|e| e.criterion.value).sum::<f64>();

            // projected-field adjoint γₖ = -D⁻¹ Σₑ wₑ (zero at the last step)
            if has_projection {
                cur.calc_projection_partials_parallel(&history.pi[k])?;
                projection.assemble_diagonal(&cur)?;
                gamma.fill(0.0);
                if has_next {
                    for (cell_id, e) in next.all.iter().enumerate() {
                        let l2g = base.projected_local_to_global(cell_id);
                        for (l, g) in l2g.iter().enumerate() {
                            gamma[*g] += e.adjoint.w[l];
                        }
                    }
                    for g in 0..gamma.dim() {
                        gamma[g] = -gamma[g] / projection.diag[g];
                    }
                }
                for (cell_id, e) in cur.all.iter_mut().enumerate() {
                    base.gather_projected(&mut e.adjoint.gamma, cell_id, &gamma);
                }
            }

            // element right-hand sides
            cur.all
                .par_iter_mut()
                .zip(next.all.par_iter())
                .map(|(e, n)| {
                    let nxt = if has_next {
                        Some((&n.partials, &n.criterion, &n.adjoint))
                    } else {
                        None
                    };
                    e.adjoint
                        .calc_rhs(&e.partials, &e.condensed, &e.criterion, &e.projection, nxt)
                })
                .collect::<Result<(), StrError>>()?;

            // global adjoint system K_effᵀ λ = rhs
            let rhs = &mut linear_system.rr;
            rhs.fill(0.0);
            for (cell_id, e) in cur.all.iter().enumerate() {
                let l2g = &base.equations.local_to_global[cell_id];
                assemble_vector(rhs, &e.adjoint.rhs, l2g, flags);
            }
            cur.assemble_tangents(linear_system.kk.get_coo_mut()?, flags, true)?;
            linear_system.augment_prescribed(&self.prescribed)?;
            linear_system.factorize_and_solve(self.config)?;
            let lambda = &linear_system.mdu;
            if lambda.as_data().iter().any(|v| !v.is_finite()) {
                return Err("found NaN or Inf in the adjoint vector");
            }

            // local adjoints and element contributions to the total derivatives
            cur.all
                .par_iter_mut()
                .enumerate()
                .map(|(cell_id, e)| {
                    let l2g = &base.equations.local_to_global[cell_id];
                    for (l, g) in l2g.iter().enumerate() {
                        e.adjoint.lambda[l] = lambda[*g];
                    }
                    e.adjoint
                        .calc_mu_and_gradients(&e.partials, &e.condensed, &e.criterion, &e.projection)
                })
                .collect::<Result<(), StrError>>()?;

            // accumulate
            let mut norm_mu = 0.0;
            for (cell, e) in base.mesh.cells.iter().zip(cur.all.iter()) {
                for (m, p) in cell.points.iter().enumerate() {
                    grad_control[*p] += e.adjoint.gradient_control[m];
                    grad_config[2 * p] += e.adjoint.gradient_config[2 * m];
                    grad_config[2 * p + 1] += e.adjoint.gradient_config[2 * m + 1];
                }
                norm_mu = f64::max(norm_mu, vec_norm(&e.adjoint.mu, Norm::Max));
            }
            if self.config.verbose_adjoint {
                println!(
                    "{:>8} {:>11.3e} {:>11.3e} {:>11.3e}",
                    k + 1,
                    vec_norm(lambda, Norm::Max),
                    norm_mu,
                    vec_norm(&gamma, Norm::Max)
                );
            }

            // the current step becomes the next step of k - 1
            std::mem::swap(&mut cur, &mut next);
        }

        match kind {
            GradientKind::Control => Ok((value, grad_control)),
            GradientKind::Configuration => Ok((value, grad_config)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
