use super::Dof;
use gemlab::mesh::PointId;
use std::collections::HashMap;
use std::fmt;

/// Holds essential boundary conditions (prescribed values)
///
/// The values correspond to the reference load level; during the pseudo-time stepping,
/// the value applied at step k equals `ℓ(t) × value` where ℓ is the load multiplier.
pub struct Essential {
    pub all: HashMap<(PointId, Dof), f64>,
}

impl Essential {
    /// Allocates a new instance
    pub fn new() -> Self {
        Essential { all: HashMap::new() }
    }

    /// Sets essential boundary condition at points
    pub fn points(&mut self, points: &[PointId], dof: Dof, value: f64) -> &mut Self {
        for point_id in points {
            self.all.insert((*point_id, dof), value);
        }
        self
    }

    /// Returns the (sorted) list of prescribed (PointId,DOF) pairs and values
    pub fn sorted(&self) -> Vec<(PointId, Dof, f64)> {
        let mut res: Vec<_> = self.all.iter().map(|((p, d), v)| (*p, *d, *v)).collect();
        res.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        res
    }
}

impl fmt::Display for Essential {
    /// Prints a formatted summary of Boundary Conditions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Essential boundary conditions\n")?;
        write!(f, "=============================\n")?;
        for (point_id, dof, value) in self.sorted() {
            write!(f, "{:?} : {} = {:?}\n", point_id, dof, value)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
