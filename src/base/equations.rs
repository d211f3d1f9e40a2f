use super::Dof;
use crate::StrError;
use gemlab::mesh::{Cell, Mesh, PointId};
use std::fmt;

/// Holds equation numbers (DOF numbers)
///
/// All points carry the same set of DOFs. The numbering is point-major; i.e., the global
/// equation of `(point_id, dof)` is `point_id * ndof + index(dof)`. The local equations
/// of a cell follow the same pattern with the local node index replacing the point id.
///
/// ```text
///                       {Ux → 4}
///                       {Uy → 5}
///                          2
///                         / \
///                        /   \
///                       /     \
///                      /       \
///           {Ux → 0}  0---------1  {Ux → 2}
///           {Uy → 1}               {Uy → 3}
/// ```
pub struct Equations {
    /// Holds the DOFs at each point (the same for all points)
    pub dofs: Vec<Dof>,

    /// Holds the number of points
    pub n_point: usize,

    /// Holds all DOF numbers, organized in a per Cell fashion
    ///
    /// The outer array has length equal to ncell; the inner arrays have length n_node × ndof
    pub local_to_global: Vec<Vec<usize>>,

    /// Holds the total number of global equations
    pub n_equation: usize,

    /// Holds the supremum of the number of nonzero values (nnz) in the global matrix
    ///
    /// This equals Σ (ndof_local × ndof_local) over all cells
    pub nnz_sup: usize,
}

impl Equations {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh, dofs: &[Dof]) -> Result<Self, StrError> {
        if dofs.len() == 0 {
            return Err("the list of DOFs must not be empty");
        }
        let ndof = dofs.len();
        let n_point = mesh.points.len();
        let mut local_to_global = Vec::with_capacity(mesh.cells.len());
        let mut nnz_sup = 0;
        for cell in &mesh.cells {
            let l2g = cell_local_to_global(cell, ndof, n_point)?;
            nnz_sup += l2g.len() * l2g.len();
            local_to_global.push(l2g);
        }
        Ok(Equations {
            dofs: dofs.to_vec(),
            n_point,
            local_to_global,
            n_equation: n_point * ndof,
            nnz_sup,
        })
    }

    /// Returns the number of DOFs per point
    pub fn ndof(&self) -> usize {
        self.dofs.len()
    }

    /// Returns the (global) equation number of a (PointId,DOF) pair
    pub fn eq(&self, point_id: PointId, dof: Dof) -> Result<usize, StrError> {
        if point_id >= self.n_point {
            return Err("cannot find equation number because PointId is out-of-bounds");
        }
        let index = self
            .dofs
            .iter()
            .position(|d| *d == dof)
            .ok_or("cannot find equation number corresponding to (PointId,DOF)")?;
        Ok(point_id * self.dofs.len() + index)
    }
}

/// Computes the local-to-global map of a cell
fn cell_local_to_global(cell: &Cell, ndof: usize, n_point: usize) -> Result<Vec<usize>, StrError> {
    let mut l2g = vec![0; cell.points.len() * ndof];
    for (m, point_id) in cell.points.iter().enumerate() {
        if *point_id >= n_point {
            return Err("cell has a PointId that is out-of-bounds");
        }
        for d in 0..ndof {
            l2g[m * ndof + d] = point_id * ndof + d;
        }
    }
    Ok(l2g)
}

impl fmt::Display for Equations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Points: DOFs and global equation numbers\n")?;
        write!(f, "========================================\n")?;
        let ndof = self.dofs.len();
        for point_id in 0..self.n_point {
            let dof_eqn: Vec<_> = self
                .dofs
                .iter()
                .enumerate()
                .map(|(d, dof)| (*dof, point_id * ndof + d))
                .collect();
            write!(f, "{:?}: {:?}\n", point_id, dof_eqn)?;
        }
        write!(f, "\nCells: Local-to-Global\n")?;
        write!(f, "======================\n")?;
        for cell_id in 0..self.local_to_global.len() {
            write!(f, "{:?}: {:?}\n", cell_id, self.local_to_global[cell_id])?;
        }
        write!(f, "\nInformation\n")?;
        write!(f, "===========\n")?;
        write!(f, "number of equations = {}\n", self.n_equation)?;
        write!(f, "number of non-zeros = {}\n", self.nnz_sup)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
