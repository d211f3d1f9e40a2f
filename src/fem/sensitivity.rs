use super::{evaluate_criterion, AdjointIntegrator, Criterion, FemBase, StateHistory, TimeStepping};
use crate::base::{Config, Essential, GradientKind, Natural};
use crate::StrError;
use russell_lab::Vector;

/// Couples the forward solve and the adjoint recursion to evaluate a criterion and its gradient
///
/// The criterion (objective or constraint) must be set with [Sensitivity::set_criterion]
/// before calling any evaluation.
pub struct Sensitivity<'a> {
    config: &'a Config,
    base: &'a FemBase<'a>,
    essential: &'a Essential,
    natural: &'a Natural,
    criterion: Option<&'a dyn Criterion>,
}

impl<'a> Sensitivity<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config, base: &'a FemBase<'a>, essential: &'a Essential, natural: &'a Natural) -> Self {
        Sensitivity {
            config,
            base,
            essential,
            natural,
            criterion: None,
        }
    }

    /// Sets the criterion
    pub fn set_criterion(&mut self, criterion: &'a dyn Criterion) -> &mut Self {
        self.criterion = Some(criterion);
        self
    }

    /// Runs the forward solve and returns the state history
    ///
    /// Returns an error if a step does not converge (after the configured refinements).
    pub fn solve_forward(&self, control: &Vector, config: &Vector) -> Result<StateHistory, StrError> {
        let mut solver = TimeStepping::new(self.config, self.base, self.essential, self.natural)?;
        let mut history = StateHistory::new();
        if !solver.run(&mut history, control, config)? {
            return Err("forward solve did not converge");
        }
        Ok(history)
    }

    /// Runs the forward solve and evaluates the criterion
    pub fn value(&self, control: &Vector, config: &Vector) -> Result<f64, StrError> {
        let criterion = self.criterion()?;
        let history = self.solve_forward(control, config)?;
        evaluate_criterion(self.base, criterion, &history, control, config)
    }

    /// Runs the forward solve and the adjoint recursion
    ///
    /// Returns the criterion value, its total derivative, and the state history.
    pub fn value_and_gradient(
        &self,
        control: &Vector,
        config: &Vector,
        kind: GradientKind,
    ) -> Result<(f64, Vector, StateHistory), StrError> {
        let criterion = self.criterion()?;
        let history = self.solve_forward(control, config)?;
        let adjoint = AdjointIntegrator::new(self.config, self.base, self.essential)?;
        let (value, gradient) = adjoint.gradient(criterion, &history, control, config, kind)?;
        Ok((value, gradient, history))
    }

    /// Approximates the directional derivative `dF/dz · s` with the centered 4-point formula
    ///
    /// ```text
    /// (-F(z + 2εs) + 8 F(z + εs) - 8 F(z - εs) + F(z - 2εs)) / (12 ε)
    /// ```
    pub fn directional_finite_difference(
        &self,
        control: &Vector,
        config: &Vector,
        kind: GradientKind,
        direction: &Vector,
        epsilon: f64,
    ) -> Result<f64, StrError> {
        let field = match kind {
            GradientKind::Control => control,
            GradientKind::Configuration => config,
        };
        if direction.dim() != field.dim() {
            return Err("direction vector has incorrect dimension");
        }
        let mut values = [0.0; 4];
        for (i, factor) in [2.0, 1.0, -1.0, -2.0].iter().enumerate() {
            let mut perturbed = field.clone();
            for j in 0..perturbed.dim() {
                perturbed[j] += factor * epsilon * direction[j];
            }
            values[i] = match kind {
                GradientKind::Control => self.value(&perturbed, config)?,
                GradientKind::Configuration => self.value(control, &perturbed)?,
            };
        }
        Ok((-values[0] + 8.0 * values[1] - 8.0 * values[2] + values[3]) / (12.0 * epsilon))
    }

    fn criterion(&self) -> Result<&'a dyn Criterion, StrError> {
        self.criterion
            .ok_or("criterion is not available for gradient computation")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Sensitivity;
    use crate::base::{Config, Dof, Essential, Formulation, GradientKind, Natural, ParamPlasticity, SampleMeshes};
    use crate::fem::FemBase;
    use crate::material::{J2Plasticity, Volume};
    use russell_lab::{approx_eq, Vector};

    #[test]
    fn missing_criterion_is_captured() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::one_tri3();
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let config = Config::new();
        let essential = Essential::new();
        let natural = Natural::new();
        let sensitivity = Sensitivity::new(&config, &base, &essential, &natural);
        let control = base.uniform_control(1.0);
        let coords = base.configuration_field();
        assert_eq!(
            sensitivity
                .value_and_gradient(&control, &coords, GradientKind::Control)
                .err(),
            Some("criterion is not available for gradient computation")
        );
        assert_eq!(
            sensitivity.value(&control, &coords).err(),
            Some("criterion is not available for gradient computation")
        );
    }

    #[test]
    fn non_convergence_is_reported() {
        let param = ParamPlasticity::sample_von_mises();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 1, 1);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let mut config = Config::new();
        config.set_n_max_iterations(1).set_tolerances(1e-15, 1e-15);
        let mut essential = Essential::new();
        essential
            .points(&SampleMeshes::points_at_x(&mesh, 0.0), Dof::Ux, 0.0)
            .points(&SampleMeshes::points_at_y(&mesh, 0.0), Dof::Uy, 0.0)
            .points(&SampleMeshes::points_at_x(&mesh, 1.0), Dof::Ux, 0.05);
        let natural = Natural::new();
        let criterion = Volume::new(&kernel);
        let mut sensitivity = Sensitivity::new(&config, &base, &essential, &natural);
        sensitivity.set_criterion(&criterion);
        let control = base.uniform_control(1.0);
        let coords = base.configuration_field();
        assert_eq!(
            sensitivity
                .value_and_gradient(&control, &coords, GradientKind::Control)
                .err(),
            Some("forward solve did not converge")
        );
    }

    #[test]
    fn directional_finite_difference_works() {
        // the volume is linear in the control field: the formula is exact
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 1, 1);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let config = Config::new();
        let mut essential = Essential::new();
        essential.points(&[0], Dof::Ux, 0.0).points(&[0, 1], Dof::Uy, 0.0);
        let natural = Natural::new();
        let criterion = Volume::new(&kernel);
        let mut sensitivity = Sensitivity::new(&config, &base, &essential, &natural);
        sensitivity.set_criterion(&criterion);
        let control = base.uniform_control(0.5);
        let coords = base.configuration_field();
        let (value, gradient, history) = sensitivity
            .value_and_gradient(&control, &coords, GradientKind::Control)
            .unwrap();
        assert_eq!(history.n_steps(), 1);
        approx_eq(value, 0.5, 1e-15);
        let direction = Vector::from(&[1.0, -1.0, 0.5, 2.0]);
        let fd = sensitivity
            .directional_finite_difference(&control, &coords, GradientKind::Control, &direction, 1e-2)
            .unwrap();
        let dot: f64 = (0..4).map(|i| gradient[i] * direction[i]).sum();
        approx_eq(fd, dot, 1e-12);
        assert_eq!(
            sensitivity
                .directional_finite_difference(&control, &coords, GradientKind::Configuration, &direction, 1e-2)
                .err(),
            Some("direction vector has incorrect dimension")
        );
    }
}
