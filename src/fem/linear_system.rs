use super::{BcPrescribedArray, FemBase};
use crate::base::Config;
use crate::StrError;
use russell_lab::Vector;
use russell_sparse::{LinSolver, SparseMatrix, Sym};

/// Holds variables to solve the global (condensed) linear system
pub struct LinearSystem<'a> {
    /// Total number of global equations (total number of DOFs)
    pub n_equation: usize,

    /// Holds the supremum of the number of nonzero values (nnz) in the global matrix
    ///
    /// The condensed element matrices have the size of the element DOFs (the local state is
    /// eliminated); thus `nnz ≤ n_prescribed + Σ (ndof_local × ndof_local)`.
    pub nnz_sup: usize,

    /// Holds the residual vector R (or the right-hand side of the adjoint system)
    pub rr: Vector,

    /// Holds the global Jacobian matrix K (or its transpose)
    pub kk: SparseMatrix,

    /// Holds the linear solver
    pub solver: LinSolver<'a>,

    /// Holds the "minus-delta-U" vector (or the adjoint vector λ)
    pub mdu: Vector,
}

impl<'a> LinearSystem<'a> {
    /// Allocates a new instance
    pub fn new(base: &FemBase, config: &Config, prescribed: &BcPrescribedArray) -> Result<Self, StrError> {
        let n_equation = base.n_equation();
        let nnz_sup = prescribed.equations.len() + base.equations.nnz_sup;
        Ok(LinearSystem {
            n_equation,
            nnz_sup,
            rr: Vector::new(n_equation),
            kk: SparseMatrix::new_coo(n_equation, n_equation, nnz_sup, Sym::No)?,
            solver: LinSolver::new(config.lin_sol_genie)?,
            mdu: Vector::new(n_equation),
        })
    }

    /// Puts ones on the diagonal of the prescribed equations
    pub fn augment_prescribed(&mut self, prescribed: &BcPrescribedArray) -> Result<(), StrError> {
        for eq in &prescribed.equations {
            self.kk.put(*eq, *eq, 1.0)?;
        }
        Ok(())
    }

    /// Factorizes the matrix K and solves K mdu = R
    pub fn factorize_and_solve(&mut self, config: &Config) -> Result<(), StrError> {
        self.solver
            .actual
            .factorize(&mut self.kk, Some(config.lin_sol_params))?;
        self.solver
            .actual
            .solve(&mut self.mdu, &self.rr, config.verbose_lin_sys_solve)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::LinearSystem;
    use crate::base::{Config, Dof, Essential, Formulation, ParamPlasticity, SampleMeshes};
    use crate::fem::{BcPrescribedArray, FemBase};
    use crate::material::J2Plasticity;
    use russell_lab::vec_approx_eq;

    #[test]
    fn new_and_solve_work() {
        let mesh = SampleMeshes::one_tri3();
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let config = Config::new();
        let mut essential = Essential::new();
        essential.points(&[0], Dof::Ux, 0.0).points(&[0], Dof::Uy, 0.0);
        let prescribed = BcPrescribedArray::new(&base, &essential).unwrap();
        let mut ls = LinearSystem::new(&base, &config, &prescribed).unwrap();
        assert_eq!(ls.n_equation, 6);
        assert_eq!(ls.nnz_sup, 2 + 36);

        // diagonal system
        ls.kk.get_coo_mut().unwrap().reset();
        ls.augment_prescribed(&prescribed).unwrap();
        for eq in 2..6 {
            ls.kk.put(eq, eq, 2.0).unwrap();
        }
        for eq in 0..6 {
            ls.rr[eq] = eq as f64;
        }
        ls.factorize_and_solve(&config).unwrap();
        vec_approx_eq(ls.mdu.as_data(), &[0.0, 1.0, 1.0, 1.5, 2.0, 2.5], 1e-15);
    }
}
