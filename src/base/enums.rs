use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines degrees-of-freedom (DOF) types
///
/// Note: The fixed numbering scheme assists in sorting the DOFs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Dof {
    /// Displacement along the first dimension
    Ux = 0,

    /// Displacement along the second dimension
    Uy = 1,

    /// Pressure-like field of the stabilized mixed formulation
    P = 2,
}

/// Defines natural boundary conditions at points (concentrated loads)
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Pbc {
    /// Concentrated load parallel to x
    Fx,

    /// Concentrated load parallel to y
    Fy,
}

impl Pbc {
    /// Returns the DOF corresponding to the concentrated load
    pub fn dof(&self) -> Dof {
        match self {
            Pbc::Fx => Dof::Ux,
            Pbc::Fy => Dof::Uy,
        }
    }
}

/// Defines the finite element formulation of the solid
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum Formulation {
    /// Pure displacement formulation with DOFs (Ux, Uy) at each node
    Displacement,

    /// Equal-order displacement-pressure formulation with DOFs (Ux, Uy, P) at each node
    ///
    /// The pressure equation is stabilized by the projected pressure gradient computed
    /// at the previous pseudo-time step. The value `alpha` scales the stabilization
    /// parameter `τ = α h² / (2G)`.
    Stabilized { alpha: f64 },
}

impl Formulation {
    /// Returns the DOFs at each node
    pub fn dofs(&self) -> &'static [Dof] {
        match self {
            Formulation::Displacement => &[Dof::Ux, Dof::Uy],
            Formulation::Stabilized { .. } => &[Dof::Ux, Dof::Uy, Dof::P],
        }
    }

    /// Returns the number of projected-field components at each node
    pub fn n_projected(&self) -> usize {
        match self {
            Formulation::Displacement => 0,
            Formulation::Stabilized { .. } => 2,
        }
    }
}

/// Selects the field with respect to which the total derivative is computed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GradientKind {
    /// Design density at each node (one value per point)
    Control,

    /// Nodal coordinates (two values per point)
    Configuration,
}

/// Defines the policy applied when a pseudo-time step fails to converge
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepRefinement {
    /// Reports the failure to the caller
    None,

    /// Doubles the number of pseudo-time steps and restarts the forward solve from scratch
    Double,
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dof::Ux => write!(f, "Ux"),
            Dof::Uy => write!(f, "Uy"),
            Dof::P => write!(f, "P"),
        }
    }
}

impl fmt::Display for Pbc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pbc::Fx => write!(f, "Fx"),
            Pbc::Fy => write!(f, "Fy"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Dof, Formulation, Pbc};

    #[test]
    fn dof_and_pbc_work() {
        assert_eq!(Pbc::Fx.dof(), Dof::Ux);
        assert_eq!(Pbc::Fy.dof(), Dof::Uy);
        assert_eq!(format!("{}", Dof::P), "P");
        assert_eq!(format!("{}", Pbc::Fy), "Fy");
        let mut dofs = vec![Dof::P, Dof::Uy, Dof::Ux];
        dofs.sort();
        assert_eq!(dofs, &[Dof::Ux, Dof::Uy, Dof::P]);
    }

    #[test]
    fn formulation_works() {
        let disp = Formulation::Displacement;
        let stab = Formulation::Stabilized { alpha: 0.5 };
        assert_eq!(disp.dofs(), &[Dof::Ux, Dof::Uy]);
        assert_eq!(stab.dofs(), &[Dof::Ux, Dof::Uy, Dof::P]);
        assert_eq!(disp.n_projected(), 0);
        assert_eq!(stab.n_projected(), 2);
    }
}
