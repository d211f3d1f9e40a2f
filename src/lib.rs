//! Plastopt -- path-dependent elastoplastic finite elements with discrete adjoint sensitivities
//!
//! This crate computes the history of equilibrium states of an elastoplastic body across a
//! sequence of pseudo-time (load) steps and the exact gradient of scalar criteria with respect
//! to a nodal control (density) field and the nodal configuration (coordinates).
//!
//! The forward solver couples the per-element local state (plastic history variables) to the
//! global equilibrium equation by static condensation (Schur complement) within a Newton-Raphson
//! iteration. The adjoint solver walks the state history backwards solving for the global (λ),
//! local (μ), and projected-field (γ) adjoint vectors of each step.
//!
//! # Example
//!
//! ```no_run
//! use plastopt::prelude::*;
//! use plastopt::StrError;
//!
//! fn main() -> Result<(), StrError> {
//!     // mesh and element kernel
//!     let mesh = SampleMeshes::box2d(1.0, 1.0, 4, 4);
//!     let param = ParamPlasticity::sample_von_mises();
//!     let kernel = J2Plasticity::new(&param, Formulation::Displacement)?;
//!     let base = FemBase::new(&mesh, &kernel)?;
//!
//!     // boundary conditions
//!     let mut essential = Essential::new();
//!     essential
//!         .points(&SampleMeshes::points_at_x(&mesh, 0.0), Dof::Ux, 0.0)
//!         .points(&SampleMeshes::points_at_y(&mesh, 0.0), Dof::Uy, 0.0)
//!         .points(&SampleMeshes::points_at_x(&mesh, 1.0), Dof::Ux, 0.004);
//!     let natural = Natural::new();
//!
//!     // criterion and sensitivity analysis
//!     let mut config = Config::new();
//!     config.set_n_steps(4);
//!     let criterion = InternalEnergy::new(&kernel);
//!     let mut sensitivity = Sensitivity::new(&config, &base, &essential, &natural);
//!     sensitivity.set_criterion(&criterion);
//!     let control = base.uniform_control(1.0);
//!     let coords = base.configuration_field();
//!     let (value, gradient, _) = sensitivity.value_and_gradient(&control, &coords, GradientKind::Control)?;
//!     println!("J = {}\ndJ/dz =\n{}", value, gradient);
//!     Ok(())
//! }
//! ```

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod fem;
pub mod material;
pub mod prelude;
