use super::FemBase;
use crate::base::{Natural, Pbc};
use crate::StrError;
use gemlab::mesh::PointId;
use russell_lab::Vector;

/// Assists in calculating concentrated loads
pub struct ConcentratedLoad {
    /// Point boundary condition
    pub pbc: Pbc,

    /// Reference value (at load multiplier equal to one)
    pub value: f64,

    /// Equation corresponding to the concentrated load
    pub eq: usize,
}

/// Holds a collection of concentrated loads
pub struct ConcentratedLoads {
    /// All values
    pub all: Vec<ConcentratedLoad>,
}

impl ConcentratedLoad {
    /// Allocates new instance
    pub fn new(base: &FemBase, point_id: PointId, pbc: Pbc, value: f64) -> Result<Self, StrError> {
        Ok(ConcentratedLoad {
            pbc,
            value,
            eq: base.equations.eq(point_id, pbc.dof())?,
        })
    }

    /// Adds the concentrated load, scaled by the load multiplier, to the global residual
    ///
    /// Prescribed equations are skipped.
    pub fn add_to_residual(&self, residual: &mut Vector, multiplier: f64, prescribed: &[bool]) {
        if prescribed[self.eq] {
            return;
        }
        // note the negative sign
        residual[self.eq] -= multiplier * self.value;
    }
}

impl ConcentratedLoads {
    /// Allocates new instance
    pub fn new(base: &FemBase, natural: &Natural) -> Result<Self, StrError> {
        let mut all = Vec::with_capacity(natural.concentrated.len() + 1);
        for (point_id, pbc, value) in &natural.concentrated {
            all.push(ConcentratedLoad::new(base, *point_id, *pbc, *value)?);
        }
        Ok(ConcentratedLoads { all })
    }

    /// Adds all concentrated loads to the global residual
    pub fn add_to_residual(&self, residual: &mut Vector, multiplier: f64, prescribed: &[bool]) {
        self.all
            .iter()
            .for_each(|e| e.add_to_residual(residual, multiplier, prescribed));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
