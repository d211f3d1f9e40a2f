use super::{StepRefinement, CONFIG_MIN_TOL};
use russell_sparse::{Genie, LinSolParams};
use std::fmt;

/// Holds configuration parameters for the forward (state) and backward (adjoint) solvers
pub struct Config {
    /// Number of pseudo-time (load) steps N
    pub n_steps: usize,

    /// Load multiplier ℓ(t) scaling the prescribed values and concentrated loads
    ///
    /// The pseudo-time of step k (starting at 0) is `t = (k + 1) / N`.
    pub load_multiplier: fn(f64) -> f64,

    /// Maximum number of Newton-Raphson iterations per step
    pub n_max_iterations: usize,

    /// Absolute tolerance for the max-norm of the (condensed) residual vector
    pub tol_rr_abs: f64,

    /// Tolerance for the max-norm of the residual relative to the first iteration
    pub tol_rr_rel: f64,

    /// Policy applied when a pseudo-time step fails to converge
    pub refinement: StepRefinement,

    /// Maximum number of refinements when `refinement` is not None
    pub n_max_refinements: usize,

    /// Checks whether the local Jacobian ∂H/∂c is singular (reciprocal condition number < tol_singular)
    pub check_local_tangent: bool,

    /// Tolerance to detect a singular local Jacobian when `check_local_tangent` is true
    pub tol_singular: f64,

    /// Linear solver type
    pub lin_sol_genie: Genie,

    /// Parameters for the sparse solver
    pub lin_sol_params: LinSolParams,

    /// Shows the pseudo-time steps
    pub verbose_timesteps: bool,

    /// Shows the Newton-Raphson iterations
    pub verbose_iterations: bool,

    /// Shows messages of the linear solver
    pub verbose_lin_sys_solve: bool,

    /// Shows the steps of the backward (adjoint) recursion
    pub verbose_adjoint: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            n_steps: 1,
            load_multiplier: |t| t,
            n_max_iterations: 10,
            tol_rr_abs: 1e-10,
            tol_rr_rel: 1e-10,
            refinement: StepRefinement::None,
            n_max_refinements: 3,
            check_local_tangent: false,
            tol_singular: 1e-14,
            lin_sol_genie: Genie::Umfpack,
            lin_sol_params: LinSolParams::new(),
            verbose_timesteps: false,
            verbose_iterations: false,
            verbose_lin_sys_solve: false,
            verbose_adjoint: false,
        }
    }

    /// Sets the number of pseudo-time steps
    pub fn set_n_steps(&mut self, value: usize) -> &mut Self {
        self.n_steps = value;
        self
    }

    /// Sets the load multiplier function ℓ(t)
    pub fn set_load_multiplier(&mut self, f: fn(f64) -> f64) -> &mut Self {
        self.load_multiplier = f;
        self
    }

    /// Sets the maximum number of Newton-Raphson iterations
    pub fn set_n_max_iterations(&mut self, value: usize) -> &mut Self {
        self.n_max_iterations = value;
        self
    }

    /// Sets the absolute and relative tolerances on the residual max-norm
    pub fn set_tolerances(&mut self, tol_rr_abs: f64, tol_rr_rel: f64) -> &mut Self {
        self.tol_rr_abs = tol_rr_abs;
        self.tol_rr_rel = tol_rr_rel;
        self
    }

    /// Sets the step refinement policy and the maximum number of refinements
    pub fn set_refinement(&mut self, policy: StepRefinement, n_max_refinements: usize) -> &mut Self {
        self.refinement = policy;
        self.n_max_refinements = n_max_refinements;
        self
    }

    /// Enables the singularity check of the local Jacobian ∂H/∂c
    pub fn set_check_local_tangent(&mut self, flag: bool) -> &mut Self {
        self.check_local_tangent = flag;
        self
    }

    /// Sets the linear solver type
    pub fn set_lin_sol_genie(&mut self, genie: Genie) -> &mut Self {
        self.lin_sol_genie = genie;
        self
    }

    /// Sets the verbose mode for pseudo-time steps and iterations
    pub fn set_verbose(&mut self, timesteps: bool, iterations: bool) -> &mut Self {
        self.verbose_timesteps = timesteps;
        self.verbose_iterations = iterations;
        self
    }

    /// Sets the verbose mode for the adjoint recursion
    pub fn set_verbose_adjoint(&mut self, flag: bool) -> &mut Self {
        self.verbose_adjoint = flag;
        self
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.n_steps < 1 {
            return Some(format!("n_steps = {} is incorrect; it must be ≥ 1", self.n_steps));
        }
        if self.n_max_iterations < 1 {
            return Some(format!(
                "n_max_iterations = {} is incorrect; it must be ≥ 1",
                self.n_max_iterations
            ));
        }
        if self.tol_rr_abs < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_rr_abs = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rr_abs, CONFIG_MIN_TOL
            ));
        }
        if self.tol_rr_rel < CONFIG_MIN_TOL {
            return Some(format!(
                "tol_rr_rel = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rr_rel, CONFIG_MIN_TOL
            ));
        }
        if self.tol_singular <= 0.0 {
            return Some(format!(
                "tol_singular = {:?} is incorrect; it must be > 0.0",
                self.tol_singular
            ));
        }
        None // all good
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration data\n")?;
        write!(f, "==================\n")?;
        write!(f, "n_steps = {:?}\n", self.n_steps)?;
        write!(f, "n_max_iterations = {:?}\n", self.n_max_iterations)?;
        write!(f, "tol_rr_abs = {:?}\n", self.tol_rr_abs)?;
        write!(f, "tol_rr_rel = {:?}\n", self.tol_rr_rel)?;
        write!(f, "refinement = {:?}\n", self.refinement)?;
        write!(f, "n_max_refinements = {:?}\n", self.n_max_refinements)?;
        write!(f, "check_local_tangent = {:?}\n", self.check_local_tangent)?;
        write!(f, "tol_singular = {:?}\n", self.tol_singular)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::base::StepRefinement;

    #[test]
    fn new_and_setters_work() {
        let mut config = Config::new();
        assert_eq!(config.n_steps, 1);
        assert_eq!((config.load_multiplier)(0.25), 0.25);
        config
            .set_n_steps(4)
            .set_load_multiplier(|t| 2.0 * t)
            .set_n_max_iterations(20)
            .set_tolerances(1e-8, 1e-7)
            .set_refinement(StepRefinement::Double, 2)
            .set_check_local_tangent(true)
            .set_verbose(false, false)
            .set_verbose_adjoint(false);
        assert_eq!(config.n_steps, 4);
        assert_eq!((config.load_multiplier)(0.25), 0.5);
        assert_eq!(config.n_max_iterations, 20);
        assert_eq!(config.refinement, StepRefinement::Double);
        assert_eq!(config.n_max_refinements, 2);
        assert!(config.check_local_tangent);
        assert_eq!(
            format!("{}", config),
            "Configuration data\n\
             ==================\n\
             n_steps = 4\n\
             n_max_iterations = 20\n\
             tol_rr_abs = 1e-8\n\
             tol_rr_rel = 1e-7\n\
             refinement = Double\n\
             n_max_refinements = 2\n\
             check_local_tangent = true\n\
             tol_singular = 1e-14\n"
        );
    }

    #[test]
    fn validate_works() {
        let mut config = Config::new();
        assert_eq!(config.validate(), None);

        config.n_steps = 0;
        assert_eq!(
            config.validate(),
            Some("n_steps = 0 is incorrect; it must be ≥ 1".to_string())
        );
        config.n_steps = 2;

        config.n_max_iterations = 0;
        assert_eq!(
            config.validate(),
            Some("n_max_iterations = 0 is incorrect; it must be ≥ 1".to_string())
        );
        config.n_max_iterations = 10;

        config.tol_rr_abs = 0.0;
        assert_eq!(
            config.validate(),
            Some("tol_rr_abs = 0.0 is incorrect; it must be ≥ 1e-15".to_string())
        );
        config.tol_rr_abs = 1e-10;

        config.tol_rr_rel = 0.0;
        assert_eq!(
            config.validate(),
            Some("tol_rr_rel = 0.0 is incorrect; it must be ≥ 1e-15".to_string())
        );
        config.tol_rr_rel = 1e-10;

        config.tol_singular = 0.0;
        assert_eq!(
            config.validate(),
            Some("tol_singular = 0.0 is incorrect; it must be > 0.0".to_string())
        );
    }
}
