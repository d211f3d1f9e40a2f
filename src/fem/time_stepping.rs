use super::{BcPrescribedArray, ConcentratedLoads, FemBase, NewtonRaphson, NewtonStatus, Projection, StateHistory, StepState};
use crate::base::{Config, Essential, Natural, StepRefinement};
use crate::StrError;
use russell_lab::{vec_copy, Vector};

/// Drives the forward (state) solve across all pseudo-time steps
///
/// Step `k` (0-based) has pseudo-time `t = (k + 1) / N` and load multiplier `ℓ(t)`. Each step
/// starts from the converged state of the previous one and, for the stabilized formulation,
/// ends with the projection of the pressure gradient consumed by the next step.
pub struct TimeStepping<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Holds the mesh, kernel, and equation numbers
    base: &'a FemBase<'a>,

    /// Holds the prescribed values
    prescribed: BcPrescribedArray,

    /// Holds the concentrated loads
    loads: ConcentratedLoads,

    /// Number of steps of the last successful run (accounts for refinements)
    n_steps: usize,
}

impl<'a> TimeStepping<'a> {
    /// Allocates a new instance
    pub fn new(
        config: &'a Config,
        base: &'a FemBase<'a>,
        essential: &Essential,
        natural: &Natural,
    ) -> Result<Self, StrError> {
        if let Some(msg) = config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate TimeStepping because config.validate() failed");
        }
        Ok(TimeStepping {
            config,
            base,
            prescribed: BcPrescribedArray::new(base, essential)?,
            loads: ConcentratedLoads::new(base, natural)?,
            n_steps: config.n_steps,
        })
    }

    /// Returns the number of steps of the last successful run
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Runs the forward solve and records the converged states
    ///
    /// Returns `Ok(true)` if all steps converged (possibly after refinements) and `Ok(false)`
    /// if a step failed to converge and no refinement remains. On failure, `history` holds the
    /// steps converged before the failing one.
    pub fn run(&mut self, history: &mut StateHistory, control: &Vector, config: &Vector) -> Result<bool, StrError> {
        self.base.check_fields(control, config)?;
        let mut n_steps = self.config.n_steps;
        let mut n_refinements = 0;
        loop {
            if self.run_steps(n_steps, history, control, config)? {
                self.n_steps = n_steps;
                return Ok(true);
            }
            match self.config.refinement {
                StepRefinement::None => return Ok(false),
                StepRefinement::Double => {
                    if n_refinements >= self.config.n_max_refinements {
                        return Ok(false);
                    }
                    n_refinements += 1;
                    n_steps *= 2;
                    if self.config.verbose_timesteps {
                        println!("step failed; restarting with {} steps", n_steps);
                    }
                }
            }
        }
    }

    /// Runs all steps once with a fixed number of steps
    fn run_steps(
        &self,
        n_steps: usize,
        history: &mut StateHistory,
        control: &Vector,
        config: &Vector,
    ) -> Result<bool, StrError> {
        let mut newton = NewtonRaphson::new(self.config, self.base, &self.prescribed, &self.loads)?;
        let mut projection = Projection::new(self.base);
        let mut state = StepState::new(self.base);
        history.reset(n_steps);
        newton.convergence.print_header();
        for k in 0..n_steps {
            state.commit()?;
            let t = ((k + 1) as f64) / (n_steps as f64);
            let multiplier = (self.config.load_multiplier)(t);
            self.prescribed.apply(&mut state.uu, multiplier);
            newton.convergence.print_timestep(k, t, multiplier);

            let status = newton.solve(&mut state, multiplier, control, config)?;
            if status != NewtonStatus::Converged {
                newton.convergence.print_footer();
                return Ok(false);
            }

            // the elements hold the arguments gathered at the converged state
            projection.solve(&mut newton.elements)?;
            vec_copy(&mut state.pi, &projection.pi)?;
            history.push(&state.uu, &state.cc, &state.pi);
        }
        newton.convergence.print_footer();
        Ok(true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::TimeStepping;
    use crate::base::{Config, Dof, Essential, Formulation, Natural, ParamPlasticity, SampleMeshes, StepRefinement};
    use crate::fem::{FemBase, StateHistory};
    use crate::material::J2Plasticity;
    use russell_lab::approx_eq;

    fn box_essential(mesh: &gemlab::mesh::Mesh, ux: f64) -> Essential {
        let mut essential = Essential::new();
        essential
            .points(&SampleMeshes::points_at_x(mesh, 0.0), Dof::Ux, 0.0)
            .points(&SampleMeshes::points_at_y(mesh, 0.0), Dof::Uy, 0.0)
            .points(&SampleMeshes::points_at_x(mesh, 1.0), Dof::Ux, ux);
        essential
    }

    #[test]
    fn new_captures_errors() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::one_tri3();
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let mut config = Config::new();
        config.n_steps = 0;
        assert_eq!(
            TimeStepping::new(&config, &base, &Essential::new(), &Natural::new()).err(),
            Some("cannot allocate TimeStepping because config.validate() failed")
        );
        let config = Config::new();
        let mut essential = Essential::new();
        essential.points(&[3], Dof::Ux, 0.0);
        assert_eq!(
            TimeStepping::new(&config, &base, &essential, &Natural::new()).err(),
            Some("cannot initialize prescribed value because PointId is out-of-bounds")
        );
    }

    #[test]
    fn elastic_run_follows_the_load_multiplier() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 1, 1);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let essential = box_essential(&mesh, 1e-3);
        let mut config = Config::new();
        config.set_n_steps(4);
        let mut solver = TimeStepping::new(&config, &base, &essential, &Natural::new()).unwrap();
        let mut history = StateHistory::new();
        let control = base.uniform_control(1.0);
        let coords = base.configuration_field();
        assert!(solver.run(&mut history, &control, &coords).unwrap());
        assert_eq!(solver.n_steps(), 4);
        assert_eq!(history.n_steps(), 4);

        // uniaxial strain along x with free lateral contraction: uy = -ν/(1-ν) εxx y (plane strain)
        let nu = param.poisson;
        let eq_uy3 = base.equations.eq(3, Dof::Uy).unwrap();
        for k in 0..4 {
            let exx = 1e-3 * ((k + 1) as f64) / 4.0;
            approx_eq(history.uu[k][eq_uy3], -nu / (1.0 - nu) * exx, 1e-14);
            assert_eq!(history.pi[k].dim(), 0);
        }
    }

    #[test]
    fn refinement_recovers_from_failed_step() {
        let param = ParamPlasticity::sample_von_mises();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 2, 2);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let essential = box_essential(&mesh, 0.01);
        let control = base.uniform_control(1.0);
        let coords = base.configuration_field();

        // two iterations are not enough for one large plastic step
        let mut config = Config::new();
        config.set_n_max_iterations(2).set_tolerances(1e-12, 1e-12);
        let mut solver = TimeStepping::new(&config, &base, &essential, &Natural::new()).unwrap();
        let mut history = StateHistory::new();
        assert!(!solver.run(&mut history, &control, &coords).unwrap());
        assert_eq!(history.n_steps(), 0);

        // with refinement, the steps become small enough to converge
        config
            .set_n_max_iterations(20)
            .set_tolerances(1e-10, 1e-10)
            .set_n_steps(1)
            .set_refinement(StepRefinement::Double, 3);
        let mut solver = TimeStepping::new(&config, &base, &essential, &Natural::new()).unwrap();
        assert!(solver.run(&mut history, &control, &coords).unwrap());
        assert_eq!(solver.n_steps(), history.n_steps());
        assert!(solver.n_steps() >= 1);
    }
}
