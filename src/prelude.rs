//! Makes available common structures needed to run a simulation and a sensitivity analysis
//!
//! You may write `use plastopt::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Config, Dof, Essential, Formulation, GradientKind, Natural, ParamPlasticity, Pbc};
pub use crate::base::{SampleMeshes, StepRefinement};
pub use crate::fem::{AdjointIntegrator, Criterion, ElementKernel, FemBase, Sensitivity, StateHistory, TimeStepping};
pub use crate::material::{InternalEnergy, J2Plasticity, PlasticWork, Volume};
