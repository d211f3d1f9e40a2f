use super::Pbc;
use gemlab::mesh::PointId;
use std::fmt;

/// Holds natural boundary conditions (concentrated loads at points)
///
/// As with the essential conditions, the values are scaled by the load multiplier ℓ(t).
pub struct Natural {
    pub concentrated: Vec<(PointId, Pbc, f64)>,
}

impl Natural {
    /// Allocates a new instance
    pub fn new() -> Self {
        Natural {
            concentrated: Vec::new(),
        }
    }

    /// Sets natural boundary condition at points
    pub fn points(&mut self, points: &[PointId], pbc: Pbc, value: f64) -> &mut Self {
        for point_id in points {
            self.concentrated.push((*point_id, pbc, value));
        }
        self
    }
}

impl fmt::Display for Natural {
    /// Prints a formatted summary of Boundary Conditions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concentrated boundary conditions\n")?;
        write!(f, "================================\n")?;
        for (id, pbc, value) in &self.concentrated {
            write!(f, "{:?} : {} = {:?}\n", id, pbc, value)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
