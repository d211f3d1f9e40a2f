use super::{Elements, FemBase};
use crate::StrError;
use russell_lab::Vector;

/// Computes the projected pressure gradient Π of the stabilized formulation
///
/// The projection residual is linear in Π with a lumped (diagonal) matrix:
///
/// ```text
/// P(Π) = P₀ + D Π = 0   ⇒   Π = -P₀ / D
/// ```
///
/// where `P₀ = P(0)` and `D = diag(∂P/∂Π)`. The diagonal `D` is also needed by the adjoint.
pub struct Projection {
    /// Holds the projected field Π (n_point × n_projected)
    pub pi: Vector,

    /// Holds the assembled diagonal of ∂P/∂Π
    pub diag: Vector,

    /// Holds a zero-valued field to evaluate P₀
    pi_zero: Vector,
}

impl Projection {
    /// Allocates a new instance
    pub fn new(base: &FemBase) -> Self {
        let n = base.n_projected_total();
        Projection {
            pi: Vector::new(n),
            diag: Vector::new(n),
            pi_zero: Vector::new(n),
        }
    }

    /// Solves the projection using the element arguments already gathered at the converged state
    ///
    /// Does nothing for formulations without projected field.
    pub fn solve(&mut self, elements: &mut Elements) -> Result<(), StrError> {
        if self.pi.dim() == 0 {
            return Ok(());
        }
        elements.calc_projection_partials_parallel(&self.pi_zero)?;
        self.assemble_diagonal(elements)?;
        self.pi.fill(0.0);
        for (cell_id, e) in elements.all.iter().enumerate() {
            let l2g = elements.base.projected_local_to_global(cell_id);
            for (l, g) in l2g.iter().enumerate() {
                self.pi[*g] += e.projection.pp[l];
            }
        }
        for g in 0..self.pi.dim() {
            self.pi[g] = -self.pi[g] / self.diag[g];
        }
        Ok(())
    }

    /// Assembles the diagonal of ∂P/∂Π from the element projection partials
    ///
    /// **Note:** The projection partials must be computed first
    pub fn assemble_diagonal(&mut self, elements: &Elements) -> Result<(), StrError> {
        self.diag.fill(0.0);
        for (cell_id, e) in elements.all.iter().enumerate() {
            let l2g = elements.base.projected_local_to_global(cell_id);
            let dd = &e.projection.dpp_dpi;
            for (l, g) in l2g.iter().enumerate() {
                for m in 0..l2g.len() {
                    if m != l && dd.get(l, m) != 0.0 {
                        return Err("the projection matrix must be diagonal");
                    }
                }
                self.diag[*g] += dd.get(l, l);
            }
        }
        if self.diag.as_data().iter().any(|d| !(*d > 0.0)) {
            return Err("the projection matrix has a non-positive diagonal entry");
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Projection;
    use crate::base::{Dof, Formulation, ParamPlasticity, SampleMeshes};
    use crate::fem::{Elements, FemBase, StepContext};
    use crate::material::J2Plasticity;
    use russell_lab::{vec_approx_eq, Vector};

    #[test]
    fn displacement_formulation_is_a_no_op() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::one_tri3();
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let mut elements = Elements::new(&base);
        let mut projection = Projection::new(&base);
        projection.solve(&mut elements).unwrap();
        assert_eq!(projection.pi.dim(), 0);
    }

    #[test]
    fn linear_pressure_gives_constant_gradient() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Stabilized { alpha: 1.0 }).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 2, 2);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let mut elements = Elements::new(&base);

        // p = 2 x + 3 y
        let mut uu = Vector::new(base.n_equation());
        for point in &mesh.points {
            let eq = base.equations.eq(point.id, Dof::P).unwrap();
            uu[eq] = 2.0 * point.coords[0] + 3.0 * point.coords[1];
        }
        let zero = base.zero_state();
        let control = base.uniform_control(1.0);
        let config = base.configuration_field();
        let ctx = StepContext {
            uu: &uu,
            uu_prev: &zero.uu,
            cc: &zero.cc,
            cc_prev: &zero.cc,
            pi_prev: &zero.pi,
            control: &control,
            config: &config,
        };
        elements.gather_parallel(&ctx);

        let mut projection = Projection::new(&base);
        projection.solve(&mut elements).unwrap();
        let correct: Vec<_> = (0..base.n_point()).flat_map(|_| [2.0, 3.0]).collect();
        vec_approx_eq(projection.pi.as_data(), &correct, 1e-13);

        // lumped mass: the diagonal sums up to the area of the domain (twice, one per component)
        let total: f64 = projection.diag.as_data().iter().sum();
        assert!((total - 2.0).abs() < 1e-14);
        // corner point 0 belongs to two cells of area 1/8
        vec_approx_eq(&projection.diag.as_data()[0..2], &[1.0 / 12.0, 1.0 / 12.0], 1e-15);
    }
}
