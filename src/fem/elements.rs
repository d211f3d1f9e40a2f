use super::{AdjointLocal, CondensedElement, Criterion, CriterionPartials, ElementArgs, ElementPartials, FemBase};
use super::{ProjectionPartials, StepContext};
use crate::base::{assemble_matrix, assemble_vector, N_NODE_TRI3};
use crate::StrError;
use rayon::prelude::*;
use russell_lab::Vector;
use russell_sparse::CooMatrix;

/// Holds the work data of one element
pub struct ElementWork {
    /// Holds the element-gathered arguments
    pub args: ElementArgs,

    /// Holds the residuals and partial derivatives
    pub partials: ElementPartials,

    /// Holds the statically condensed quantities
    pub condensed: CondensedElement,

    /// Holds the projected field gathered from the global vector
    pub pi_local: Vector,

    /// Holds the updated local state before it replaces the gathered one
    c_updated: Vector,

    /// Holds the projected-field residual and its partial derivatives
    pub projection: ProjectionPartials,

    /// Holds the partial derivatives of the criterion (adjoint only)
    pub criterion: CriterionPartials,

    /// Holds the element adjoint vectors (adjoint only)
    pub adjoint: AdjointLocal,
}

/// Holds a collection of element work data
pub struct Elements<'a> {
    /// Holds the mesh, kernel, and equation numbers
    pub base: &'a FemBase<'a>,

    /// All elements
    pub all: Vec<ElementWork>,
}

impl ElementWork {
    /// Allocates a new instance
    pub fn new(base: &FemBase) -> Self {
        let n_node = N_NODE_TRI3;
        let ndof = base.ndof();
        let n_eq = n_node * ndof;
        let n_local = base.n_local;
        ElementWork {
            args: base.new_args(),
            partials: ElementPartials::new(n_node, ndof, n_local, base.n_projected),
            condensed: CondensedElement::new(n_eq, n_local),
            pi_local: Vector::new(n_node * base.n_projected),
            c_updated: Vector::new(n_local),
            projection: ProjectionPartials::new(n_node, ndof, base.n_projected),
            criterion: CriterionPartials::new(n_node, ndof, n_local),
            adjoint: AdjointLocal::new(n_node, n_eq, n_local, base.n_projected),
        }
    }
}

impl<'a> Elements<'a> {
    /// Allocates a new instance
    pub fn new(base: &'a FemBase<'a>) -> Self {
        let all = (0..base.n_cell()).map(|_| ElementWork::new(base)).collect();
        Elements { base, all }
    }

    /// Gathers the element arguments from the global fields
    pub fn gather_parallel(&mut self, ctx: &StepContext) {
        let base = self.base;
        self.all
            .par_iter_mut()
            .enumerate()
            .for_each(|(cell_id, e)| base.gather(&mut e.args, cell_id, ctx));
    }

    /// Computes the residuals and the partial derivatives
    pub fn calc_partials_parallel(&mut self) -> Result<(), StrError> {
        let kernel = self.base.kernel;
        self.all
            .par_iter_mut()
            .map(|e| kernel.partials(&mut e.partials, &e.args))
            .collect()
    }

    /// Performs the static condensation
    pub fn condense_parallel(&mut self, tol_singular: Option<f64>) -> Result<(), StrError> {
        self.all
            .par_iter_mut()
            .map(|e| e.condensed.condense(&e.partials, tol_singular))
            .collect()
    }

    /// Updates the local state (stored in the element arguments)
    ///
    /// **Note:** The arguments must be gathered first
    pub fn update_local_state_parallel(&mut self) -> Result<(), StrError> {
        let kernel = self.base.kernel;
        self.all
            .par_iter_mut()
            .map(|e| {
                kernel.update_local_state(&mut e.c_updated, &e.args)?;
                std::mem::swap(&mut e.args.c, &mut e.c_updated);
                Ok(())
            })
            .collect()
    }

    /// Computes the projected-field residuals and their partial derivatives
    ///
    /// **Note:** The arguments must be gathered first
    pub fn calc_projection_partials_parallel(&mut self, pi: &Vector) -> Result<(), StrError> {
        let base = self.base;
        self.all
            .par_iter_mut()
            .enumerate()
            .map(|(cell_id, e)| {
                base.gather_projected(&mut e.pi_local, cell_id, pi);
                base.kernel.projection_partials(&mut e.projection, &e.pi_local, &e.args)
            })
            .collect()
    }

    /// Computes the criterion partial derivatives at a step
    ///
    /// **Note:** The arguments must be gathered first
    pub fn calc_criterion_parallel(&mut self, criterion: &dyn Criterion, step: usize, n_steps: usize) -> Result<(), StrError> {
        self.all
            .par_iter_mut()
            .map(|e| criterion.element_partials(&mut e.criterion, step, n_steps, &e.args))
            .collect()
    }

    /// Copies the element local states into the global vector C
    pub fn scatter_local_state(&self, cc: &mut Vector) {
        for (cell_id, e) in self.all.iter().enumerate() {
            let start = self.base.local_state_start(cell_id);
            for i in 0..e.args.c.dim() {
                cc[start + i] = e.args.c[i];
            }
        }
    }

    /// Assembles the condensed residuals
    ///
    /// **Notes:**
    ///
    /// 1. You must call condense first
    /// 2. The global vector R will be cleared (with zeros) at the beginning
    pub fn assemble_residuals(&self, rr: &mut Vector, prescribed: &[bool]) {
        rr.fill(0.0); // << important
        for (cell_id, e) in self.all.iter().enumerate() {
            let l2g = &self.base.equations.local_to_global[cell_id];
            assemble_vector(rr, &e.condensed.rr_eff, l2g, prescribed);
        }
    }

    /// Assembles the condensed tangents (or their transposes)
    ///
    /// **Notes:**
    ///
    /// 1. You must call condense first
    /// 2. The CooMatrix position in the global matrix K will be reset at the beginning
    pub fn assemble_tangents(&self, kk: &mut CooMatrix, prescribed: &[bool], transposed: bool) -> Result<(), StrError> {
        kk.reset(); // << important
        for (cell_id, e) in self.all.iter().enumerate() {
            let l2g = &self.base.equations.local_to_global[cell_id];
            assemble_matrix(kk, &e.condensed.kk_eff, l2g, prescribed, transposed)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Elements;
    use crate::base::{Formulation, ParamPlasticity, SampleMeshes, N_LOCAL_J2, N_NODE_TRI3};
    use crate::fem::{FemBase, StepContext};
    use crate::material::{J2Plasticity, LinearElastic};
    use russell_lab::{mat_approx_eq, vec_approx_eq, Vector};
    use russell_sparse::{CooMatrix, Sym};

    #[test]
    fn elastic_condensation_matches_reference_stiffness() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 1, 1);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let mut elements = Elements::new(&base);

        // small arbitrary displacements
        let uu = Vector::from(&[0.0, 0.0, 1e-4, -2e-5, 3e-5, 1e-4, -1e-5, 2e-5]);
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
        elements.update_local_state_parallel().unwrap();
        let mut cc = Vector::new(base.n_local_total());
        elements.scatter_local_state(&mut cc);
        assert_eq!(cc.as_data(), &vec![0.0; 12]); // no yielding
        for e in &elements.all {
            assert_eq!(e.args.c.dim(), N_LOCAL_J2);
            assert_eq!(e.c_updated.dim(), N_LOCAL_J2);
            assert_eq!(e.adjoint.gradient_control.dim(), N_NODE_TRI3);
            assert_eq!(e.partials.rr.dim(), N_NODE_TRI3 * base.ndof());
        }

        elements.calc_partials_parallel().unwrap();
        elements.condense_parallel(Some(1e-12)).unwrap();

        let reference = LinearElastic::new(&param).unwrap();
        for (cell_id, e) in elements.all.iter().enumerate() {
            let kk_ref = reference.stiffness(&e.args.config).unwrap();
            mat_approx_eq(&e.condensed.kk_eff, &kk_ref, 1e-9);
            let mut u_local = Vector::new(6);
            for (l, g) in base.equations.local_to_global[cell_id].iter().enumerate() {
                u_local[l] = uu[*g];
            }
            let mut r_ref = Vector::new(6);
            crate::base::matrix_times_vector(&mut r_ref, 1.0, &kk_ref, &u_local, false).unwrap();
            vec_approx_eq(e.condensed.rr_eff.as_data(), r_ref.as_data(), 1e-12);
        }

        // assembly of the transposed tangent equals the transpose of the assembly
        let prescribed = vec![false; 8];
        let mut kk = CooMatrix::new(8, 8, base.equations.nnz_sup, Sym::No).unwrap();
        let mut kk_t = CooMatrix::new(8, 8, base.equations.nnz_sup, Sym::No).unwrap();
        elements.assemble_tangents(&mut kk, &prescribed, false).unwrap();
        elements.assemble_tangents(&mut kk_t, &prescribed, true).unwrap();
        let dense = kk.as_dense();
        let dense_t = kk_t.as_dense();
        for i in 0..8 {
            for j in 0..8 {
                assert_eq!(dense.get(i, j), dense_t.get(j, i));
            }
        }
        let mut rr = Vector::new(8);
        elements.assemble_residuals(&mut rr, &prescribed);
        assert!(rr.as_data().iter().all(|v| v.is_finite()));
    }
}
