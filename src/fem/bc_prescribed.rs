use super::FemBase;
use crate::base::{Dof, Essential};
use crate::StrError;
use gemlab::mesh::PointId;
use russell_lab::Vector;

/// Assists in calculating a prescribed value boundary condition
///
/// This data structure corresponds to a single Essential (Dirichlet) boundary condition
pub struct BcPrescribed {
    /// Point corresponding to the prescribed value
    pub point_id: PointId,

    /// DOF corresponding to the prescribed value
    pub dof: Dof,

    /// Reference value (at load multiplier equal to one)
    pub value: f64,

    /// Equation corresponding to the prescribed value
    pub eq: usize,
}

/// Implements an array of BcPrescribed
pub struct BcPrescribedArray {
    /// All values
    pub all: Vec<BcPrescribed>,

    /// An array indicating which DOFs (equations) are prescribed
    ///
    /// The length of `flags` is equal to `n_equation`, the total number of DOFs (total number of equations).
    pub flags: Vec<bool>,

    /// Array with only the DOFs numbers of the prescribed equations
    pub equations: Vec<usize>,
}

impl BcPrescribed {
    /// Allocates new instance
    pub fn new(base: &FemBase, point_id: PointId, dof: Dof, value: f64) -> Result<Self, StrError> {
        if point_id >= base.n_point() {
            return Err("cannot initialize prescribed value because PointId is out-of-bounds");
        }
        Ok(BcPrescribed {
            point_id,
            dof,
            value,
            eq: base.equations.eq(point_id, dof)?,
        })
    }

    /// Sets the prescribed value, scaled by the load multiplier, in the solution vector
    pub fn set_value(&self, uu: &mut Vector, multiplier: f64) {
        uu[self.eq] = multiplier * self.value;
    }
}

impl BcPrescribedArray {
    /// Allocates new instance
    pub fn new(base: &FemBase, essential: &Essential) -> Result<Self, StrError> {
        let mut all = Vec::new();
        let mut flags = vec![false; base.n_equation()];
        let mut equations = Vec::new();
        for (point_id, dof, value) in essential.sorted() {
            let bc = BcPrescribed::new(base, point_id, dof, value)?;
            flags[bc.eq] = true;
            equations.push(bc.eq);
            all.push(bc);
        }
        Ok(BcPrescribedArray { all, flags, equations })
    }

    /// Sets all prescribed values in the solution vector
    pub fn apply(&self, uu: &mut Vector, multiplier: f64) {
        self.all.iter().for_each(|e| e.set_value(uu, multiplier));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{BcPrescribed, BcPrescribedArray};
    use crate::base::{Dof, Essential, Formulation, ParamPlasticity, SampleMeshes};
    use crate::fem::FemBase;
    use crate::material::J2Plasticity;
    use russell_lab::Vector;

    #[test]
    fn new_captures_errors() {
        let mesh = SampleMeshes::one_tri3();
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let base = FemBase::new(&mesh, &kernel).unwrap();
        assert_eq!(
            BcPrescribed::new(&base, 123, Dof::Ux, 0.0).err(),
            Some("cannot initialize prescribed value because PointId is out-of-bounds")
        );
        assert_eq!(
            BcPrescribed::new(&base, 0, Dof::P, 0.0).err(),
            Some("cannot find equation number corresponding to (PointId,DOF)")
        );
        let mut essential = Essential::new();
        essential.points(&[100], Dof::Ux, 0.0);
        assert_eq!(
            BcPrescribedArray::new(&base, &essential).err(),
            Some("cannot initialize prescribed value because PointId is out-of-bounds")
        );
    }

    #[test]
    fn apply_works() {
        let mesh = SampleMeshes::one_tri3();
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Stabilized { alpha: 1.0 }).unwrap();
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let mut essential = Essential::new();
        essential
            .points(&[0], Dof::Ux, 0.0)
            .points(&[0], Dof::Uy, 0.0)
            .points(&[1], Dof::Ux, 0.1)
            .points(&[2], Dof::P, -2.0);
        let prescribed = BcPrescribedArray::new(&base, &essential).unwrap();
        assert_eq!(prescribed.equations, &[0, 1, 3, 8]);
        assert_eq!(
            prescribed.flags,
            &[true, true, false, true, false, false, false, false, true]
        );
        let mut uu = Vector::filled(9, 7.0);
        prescribed.apply(&mut uu, 0.5);
        assert_eq!(uu.as_data(), &[0.0, 0.0, 7.0, 0.05, 7.0, 7.0, 7.0, 7.0, -1.0]);
    }
}
