//! Implements the plasticity kernel, its elastic reference, and the performance criteria

mod criteria;
mod j2_plasticity;
mod linear_elastic;
pub use crate::material::criteria::*;
pub use crate::material::j2_plasticity::*;
pub use crate::material::linear_elastic::*;
