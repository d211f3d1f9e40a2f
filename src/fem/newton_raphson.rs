use super::{BcPrescribedArray, ConcentratedLoads, ControlConvergence, Elements, FemBase, LinearSystem, StepContext};
use crate::base::Config;
use crate::StrError;
use russell_lab::{vec_copy, Vector};

/// Indicates the outcome of the Newton-Raphson iterations of one step
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NewtonStatus {
    /// The iterations have not finished yet
    Iterating,

    /// The residual satisfies the stopping criteria
    Converged,

    /// The maximum number of iterations has been reached
    MaxIterations,

    /// The residual became NaN/Inf or the linear solver failed
    DidNotConverge,
}

/// Holds the global fields of the current and previous steps
pub struct StepState {
    /// Global state U at the current step
    pub uu: Vector,

    /// Local state C at the current step
    pub cc: Vector,

    /// Projected field Π at the current step
    pub pi: Vector,

    /// Global state U at the previous step
    pub uu_prev: Vector,

    /// Local state C at the previous step
    pub cc_prev: Vector,

    /// Projected field Π at the previous step
    pub pi_prev: Vector,
}

/// Implements the Newton-Raphson solver of one pseudo-time step with static condensation
pub struct NewtonRaphson<'a> {
    /// Holds the configuration
    config: &'a Config,

    /// Holds the prescribed values
    prescribed: &'a BcPrescribedArray,

    /// Holds the concentrated loads
    loads: &'a ConcentratedLoads,

    /// Holds the element work data (gathered at the last iterate)
    pub elements: Elements<'a>,

    /// Holds the global linear system
    pub linear_system: LinearSystem<'a>,

    /// Holds the convergence control
    pub convergence: ControlConvergence<'a>,

    /// Holds the status of the last solve
    pub status: NewtonStatus,
}

impl StepState {
    /// Allocates a new instance with zero fields
    pub fn new(base: &FemBase) -> Self {
        let zero = base.zero_state();
        StepState {
            uu_prev: zero.uu.clone(),
            cc_prev: zero.cc.clone(),
            pi_prev: zero.pi.clone(),
            uu: zero.uu,
            cc: zero.cc,
            pi: zero.pi,
        }
    }

    /// Copies the current fields into the previous fields
    pub fn commit(&mut self) -> Result<(), StrError> {
        vec_copy(&mut self.uu_prev, &self.uu)?;
        vec_copy(&mut self.cc_prev, &self.cc)?;
        vec_copy(&mut self.pi_prev, &self.pi)?;
        Ok(())
    }

    /// Returns the context to gather the element arguments
    pub fn context<'b>(&'b self, control: &'b Vector, config: &'b Vector) -> StepContext<'b> {
        StepContext {
            uu: &self.uu,
            uu_prev: &self.uu_prev,
            cc: &self.cc,
            cc_prev: &self.cc_prev,
            pi_prev: &self.pi_prev,
            control,
            config,
        }
    }
}

impl<'a> NewtonRaphson<'a> {
    /// Allocates a new instance
    pub fn new(
        config: &'a Config,
        base: &'a FemBase<'a>,
        prescribed: &'a BcPrescribedArray,
        loads: &'a ConcentratedLoads,
    ) -> Result<Self, StrError> {
        Ok(NewtonRaphson {
            config,
            prescribed,
            loads,
            elements: Elements::new(base),
            linear_system: LinearSystem::new(base, config, prescribed)?,
            convergence: ControlConvergence::new(config),
            status: NewtonStatus::Iterating,
        })
    }

    /// Solves the global and local equations of one step
    ///
    /// On input, `state.uu` holds the trial values (the converged values of the previous step)
    /// with the prescribed values already applied. On output, `state.uu` and `state.cc` hold the
    /// last iterate. The returned status tells whether the iterate is converged.
    ///
    /// An error is returned only for incorrect data (e.g., dimensions) or a singular local
    /// tangent detected by the optional check.
    pub fn solve(
        &mut self,
        state: &mut StepState,
        multiplier: f64,
        control: &Vector,
        config: &Vector,
    ) -> Result<NewtonStatus, StrError> {
        let tol_singular = if self.config.check_local_tangent {
            Some(self.config.tol_singular)
        } else {
            None
        };
        let prescribed = self.prescribed;
        let loads = self.loads;
        let flags = &prescribed.flags;
        let neq = state.uu.dim();

        // local state consistent with the trial global state
        self.convergence.reset();
        self.status = NewtonStatus::Iterating;
        self.update_local_state(state, control, config)?;

        for iteration in 0..=self.config.n_max_iterations {
            // element partials and static condensation
            self.elements.gather_parallel(&state.context(control, config));
            self.elements.calc_partials_parallel()?;
            self.elements.condense_parallel(tol_singular)?;

            // condensed residual
            let rr = &mut self.linear_system.rr;
            self.elements.assemble_residuals(rr, flags);
            loads.add_to_residual(rr, multiplier, flags);

            // check convergence
            if self.convergence.analyze_rr(iteration, rr).is_err() {
                self.status = NewtonStatus::DidNotConverge;
                return Ok(self.status);
            }
            self.convergence.print_iteration();
            if self.convergence.converged() {
                self.convergence.add_converged();
                self.status = NewtonStatus::Converged;
                return Ok(self.status);
            }
            if iteration == self.config.n_max_iterations {
                break;
            }

            // condensed tangent with ones on the diagonal of the prescribed equations
            self.elements
                .assemble_tangents(self.linear_system.kk.get_coo_mut()?, flags, false)?;
            self.linear_system.augment_prescribed(prescribed)?;

            // solve K mdu = R
            if self.linear_system.factorize_and_solve(self.config).is_err() {
                self.status = NewtonStatus::DidNotConverge;
                return Ok(self.status);
            }
            let mdu = &self.linear_system.mdu;
            if self.convergence.analyze_mdu(mdu).is_err() {
                self.status = NewtonStatus::DidNotConverge;
                return Ok(self.status);
            }

            // update U (mdu is zero at the prescribed equations) and C
            for i in 0..neq {
                state.uu[i] -= mdu[i];
            }
            self.update_local_state(state, control, config)?;
        }
        self.status = NewtonStatus::MaxIterations;
        Ok(self.status)
    }

    /// Computes the local state with the closed-form update and stores it in the global vector C
    fn update_local_state(&mut self, state: &mut StepState, control: &Vector, config: &Vector) -> Result<(), StrError> {
        self.elements.gather_parallel(&state.context(control, config));
        self.elements.update_local_state_parallel()?;
        self.elements.scatter_local_state(&mut state.cc);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
