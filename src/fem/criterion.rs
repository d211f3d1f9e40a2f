use super::{forward_jacobians, ElementArgs, FemBase, StateHistory};
use crate::base::N_NODE_TRI3;
use crate::StrError;
use num_dual::Dual64;
use russell_lab::Vector;

/// Holds the element contribution to a criterion at one step and its partial derivatives
///
/// The criterion of the full history is `F = Σ_k Σ_e F_k^e(u_k, c_k, c_{k-1}, control, config)`.
pub struct CriterionPartials {
    /// Value F_k^e
    pub value: f64,

    /// ∂F_k^e/∂u_k (n_eq)
    pub gradient_u: Vector,

    /// ∂F_k^e/∂c_k (n_local)
    pub gradient_c: Vector,

    /// ∂F_k^e/∂c_{k-1} (n_local)
    pub gradient_cp: Vector,

    /// ∂F_k^e/∂control (n_node)
    pub gradient_control: Vector,

    /// ∂F_k^e/∂config (n_node × 2)
    pub gradient_config: Vector,
}

/// Defines a scalar performance criterion (objective or constraint) of the state history
pub trait Criterion: Send + Sync {
    /// Calculates the element contribution and its partial derivatives at a step
    ///
    /// # Input
    ///
    /// * `step` -- index of the pseudo-time step (0-based)
    /// * `n_steps` -- total number of pseudo-time steps
    /// * `args` -- element arguments gathered at `step`
    fn element_partials(
        &self,
        partials: &mut CriterionPartials,
        step: usize,
        n_steps: usize,
        args: &ElementArgs,
    ) -> Result<(), StrError>;
}

impl CriterionPartials {
    /// Allocates a new instance
    pub fn new(n_node: usize, ndof: usize, n_local: usize) -> Self {
        CriterionPartials {
            value: 0.0,
            gradient_u: Vector::new(n_node * ndof),
            gradient_c: Vector::new(n_local),
            gradient_cp: Vector::new(n_local),
            gradient_control: Vector::new(n_node),
            gradient_config: Vector::new(n_node * 2),
        }
    }

    /// Sets the value and all partial derivatives to zero
    pub fn clear(&mut self) {
        self.value = 0.0;
        self.gradient_u.fill(0.0);
        self.gradient_c.fill(0.0);
        self.gradient_cp.fill(0.0);
        self.gradient_control.fill(0.0);
        self.gradient_config.fill(0.0);
    }

    /// Computes the value and the partial derivatives of an element function using automatic differentiation
    ///
    /// The function `f` receives the blocks `[u, c, c_prev, control, config]`.
    pub fn autodiff<F>(&mut self, args: &ElementArgs, f: F) -> Result<(), StrError>
    where
        F: Fn(&[Vec<Dual64>]) -> Dual64,
    {
        let blocks = [&args.u, &args.c, &args.c_prev, &args.control, &args.config];
        let (values, jacobians) = forward_jacobians(&blocks, |v| vec![f(v)]);
        let gradients = [
            &mut self.gradient_u,
            &mut self.gradient_c,
            &mut self.gradient_cp,
            &mut self.gradient_control,
            &mut self.gradient_config,
        ];
        for (b, gradient) in gradients.into_iter().enumerate() {
            if gradient.dim() != blocks[b].dim() {
                return Err("criterion partials have incorrect dimensions");
            }
            for j in 0..gradient.dim() {
                gradient[j] = jacobians[b].get(0, j);
            }
        }
        self.value = values[0];
        Ok(())
    }
}

/// Evaluates a criterion over the whole state history
pub fn evaluate_criterion(
    base: &FemBase,
    criterion: &dyn Criterion,
    history: &StateHistory,
    control: &Vector,
    config: &Vector,
) -> Result<f64, StrError> {
    base.check_fields(control, config)?;
    history.check_dims(base)?;
    let n_steps = history.n_steps();
    let zero = base.zero_state();
    let mut args = base.new_args();
    let mut partials = CriterionPartials::new(N_NODE_TRI3, base.ndof(), base.n_local);
    let mut value = 0.0;
    for k in 0..n_steps {
        let ctx = history.context(k, &zero, control, config)?;
        for cell_id in 0..base.n_cell() {
            base.gather(&mut args, cell_id, &ctx);
            criterion.element_partials(&mut partials, k, n_steps, &args)?;
            value += partials.value;
        }
    }
    Ok(value)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
