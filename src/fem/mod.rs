//! Implements the finite element method with static condensation and the discrete adjoint

mod adjoint;
mod autodiff;
mod bc_concentrated;
mod bc_prescribed;
mod control_convergence;
mod criterion;
mod element_kernel;
mod elements;
mod fem_base;
mod linear_system;
mod newton_raphson;
mod projection;
mod schur_complement;
mod sensitivity;
mod state_history;
mod time_stepping;
pub use crate::fem::adjoint::*;
pub use crate::fem::autodiff::*;
pub use crate::fem::bc_concentrated::*;
pub use crate::fem::bc_prescribed::*;
pub use crate::fem::control_convergence::*;
pub use crate::fem::criterion::*;
pub use crate::fem::element_kernel::*;
pub use crate::fem::elements::*;
pub use crate::fem::fem_base::*;
pub use crate::fem::linear_system::*;
pub use crate::fem::newton_raphson::*;
pub use crate::fem::projection::*;
pub use crate::fem::schur_complement::*;
pub use crate::fem::sensitivity::*;
pub use crate::fem::state_history::*;
pub use crate::fem::time_stepping::*;
