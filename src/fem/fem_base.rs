use super::{ElementArgs, ElementKernel};
use crate::base::{Equations, N_NODE_TRI3};
use crate::StrError;
use gemlab::mesh::Mesh;
use gemlab::shapes::GeoKind;
use russell_lab::Vector;

/// Holds the mesh, the element kernel, and the equation numbers
pub struct FemBase<'a> {
    /// Holds the mesh
    pub mesh: &'a Mesh,

    /// Holds the element kernel (the same for all cells)
    pub kernel: &'a dyn ElementKernel,

    /// Holds the equation numbers
    pub equations: Equations,

    /// Number of local state variables per cell
    pub n_local: usize,

    /// Number of projected-field components per point
    pub n_projected: usize,
}

/// Holds references to the global fields needed to gather the element arguments of one step
pub struct StepContext<'b> {
    pub uu: &'b Vector,
    pub uu_prev: &'b Vector,
    pub cc: &'b Vector,
    pub cc_prev: &'b Vector,
    pub pi_prev: &'b Vector,
    pub control: &'b Vector,
    pub config: &'b Vector,
}

/// Holds the zero-valued state preceding the first step
pub struct ZeroState {
    pub uu: Vector,
    pub cc: Vector,
    pub pi: Vector,
}

impl<'a> FemBase<'a> {
    /// Allocates a new instance
    pub fn new(mesh: &'a Mesh, kernel: &'a dyn ElementKernel) -> Result<Self, StrError> {
        if mesh.ndim != 2 {
            return Err("the mesh must be two-dimensional");
        }
        if mesh.cells.len() == 0 {
            return Err("there are no cells in the mesh");
        }
        for cell in &mesh.cells {
            if cell.kind != GeoKind::Tri3 {
                return Err("only Tri3 cells are supported");
            }
            for p in &cell.points {
                if *p >= mesh.points.len() {
                    return Err("cell has a PointId that is out-of-bounds");
                }
            }
            let x0 = &mesh.points[cell.points[0]].coords;
            let x1 = &mesh.points[cell.points[1]].coords;
            let x2 = &mesh.points[cell.points[2]].coords;
            let two_area = (x1[0] - x0[0]) * (x2[1] - x0[1]) - (x2[0] - x0[0]) * (x1[1] - x0[1]);
            if two_area <= 0.0 {
                return Err("cell has a non-positive area (points must be counterclockwise)");
            }
        }
        let formulation = kernel.formulation();
        let equations = Equations::new(mesh, formulation.dofs())?;
        Ok(FemBase {
            mesh,
            kernel,
            equations,
            n_local: kernel.n_local(),
            n_projected: formulation.n_projected(),
        })
    }

    /// Returns the number of cells
    pub fn n_cell(&self) -> usize {
        self.mesh.cells.len()
    }

    /// Returns the number of points
    pub fn n_point(&self) -> usize {
        self.mesh.points.len()
    }

    /// Returns the number of DOFs per point
    pub fn ndof(&self) -> usize {
        self.equations.ndof()
    }

    /// Returns the dimension of the global state U
    pub fn n_equation(&self) -> usize {
        self.equations.n_equation
    }

    /// Returns the dimension of the (all cells) local state C
    pub fn n_local_total(&self) -> usize {
        self.n_cell() * self.n_local
    }

    /// Returns the dimension of the projected field Π
    pub fn n_projected_total(&self) -> usize {
        self.n_point() * self.n_projected
    }

    /// Returns a control field with the same value at all points
    pub fn uniform_control(&self, value: f64) -> Vector {
        Vector::filled(self.n_point(), value)
    }

    /// Returns the configuration field (flattened coordinates) of the mesh
    pub fn configuration_field(&self) -> Vector {
        let mut xx = Vector::new(2 * self.n_point());
        for point in &self.mesh.points {
            xx[2 * point.id] = point.coords[0];
            xx[2 * point.id + 1] = point.coords[1];
        }
        xx
    }

    /// Returns the zero-valued state preceding the first step
    pub fn zero_state(&self) -> ZeroState {
        ZeroState {
            uu: Vector::new(self.n_equation()),
            cc: Vector::new(self.n_local_total()),
            pi: Vector::new(self.n_projected_total()),
        }
    }

    /// Checks the dimensions of the control and configuration fields
    pub fn check_fields(&self, control: &Vector, config: &Vector) -> Result<(), StrError> {
        if control.dim() != self.n_point() {
            return Err("control field has incorrect dimension");
        }
        if config.dim() != 2 * self.n_point() {
            return Err("configuration field has incorrect dimension");
        }
        Ok(())
    }

    /// Allocates the element arguments
    pub fn new_args(&self) -> ElementArgs {
        ElementArgs::new(N_NODE_TRI3, self.ndof(), self.n_local, self.n_projected)
    }

    /// Returns the first index of the local state of a cell in the global vector C
    pub fn local_state_start(&self, cell_id: usize) -> usize {
        cell_id * self.n_local
    }

    /// Gathers the element arguments of a cell from the global fields
    pub fn gather(&self, args: &mut ElementArgs, cell_id: usize, ctx: &StepContext) {
        let cell = &self.mesh.cells[cell_id];
        let l2g = &self.equations.local_to_global[cell_id];
        for (l, g) in l2g.iter().enumerate() {
            args.u[l] = ctx.uu[*g];
            args.u_prev[l] = ctx.uu_prev[*g];
        }
        let start = self.local_state_start(cell_id);
        for i in 0..self.n_local {
            args.c[i] = ctx.cc[start + i];
            args.c_prev[i] = ctx.cc_prev[start + i];
        }
        let np = self.n_projected;
        for (m, p) in cell.points.iter().enumerate() {
            for d in 0..np {
                args.pi_prev[m * np + d] = ctx.pi_prev[p * np + d];
            }
            args.control[m] = ctx.control[*p];
            args.config[2 * m] = ctx.config[2 * p];
            args.config[2 * m + 1] = ctx.config[2 * p + 1];
        }
    }

    /// Gathers the projected field of a cell
    pub fn gather_projected(&self, pi_local: &mut Vector, cell_id: usize, pi: &Vector) {
        let np = self.n_projected;
        for (m, p) in self.mesh.cells[cell_id].points.iter().enumerate() {
            for d in 0..np {
                pi_local[m * np + d] = pi[p * np + d];
            }
        }
    }

    /// Returns the local-to-global map of the projected field of a cell
    pub fn projected_local_to_global(&self, cell_id: usize) -> Vec<usize> {
        let np = self.n_projected;
        let mut l2g = Vec::with_capacity(N_NODE_TRI3 * np);
        for p in &self.mesh.cells[cell_id].points {
            for d in 0..np {
                l2g.push(p * np + d);
            }
        }
        l2g
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{FemBase, StepContext};
    use crate::base::{Formulation, ParamPlasticity, SampleMeshes};
    use crate::material::J2Plasticity;
    use gemlab::shapes::GeoKind;
    use russell_lab::Vector;

    #[test]
    fn new_captures_errors() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Displacement).unwrap();
        let mut mesh = SampleMeshes::one_tri3();
        mesh.ndim = 3;
        assert_eq!(FemBase::new(&mesh, &kernel).err(), Some("the mesh must be two-dimensional"));
        let mut mesh = SampleMeshes::one_tri3();
        mesh.cells.clear();
        assert_eq!(FemBase::new(&mesh, &kernel).err(), Some("there are no cells in the mesh"));
        let mut mesh = SampleMeshes::one_tri3();
        mesh.cells[0].kind = GeoKind::Tri6;
        assert_eq!(FemBase::new(&mesh, &kernel).err(), Some("only Tri3 cells are supported"));
        let mut mesh = SampleMeshes::one_tri3();
        mesh.cells[0].points = vec![0, 2, 1];
        assert_eq!(
            FemBase::new(&mesh, &kernel).err(),
            Some("cell has a non-positive area (points must be counterclockwise)")
        );
    }

    #[test]
    fn fields_work() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Stabilized { alpha: 1.0 }).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 1, 1);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        assert_eq!(base.n_cell(), 2);
        assert_eq!(base.n_point(), 4);
        assert_eq!(base.n_equation(), 12);
        assert_eq!(base.n_local_total(), 12);
        assert_eq!(base.n_projected_total(), 8);
        let control = base.uniform_control(0.5);
        let config = base.configuration_field();
        assert_eq!(control.as_data(), &[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(config.as_data(), &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(base.check_fields(&control, &config), Ok(()));
        assert_eq!(
            base.check_fields(&Vector::new(3), &config).err(),
            Some("control field has incorrect dimension")
        );
        assert_eq!(
            base.check_fields(&control, &Vector::new(3)).err(),
            Some("configuration field has incorrect dimension")
        );
        assert_eq!(base.projected_local_to_global(1), &[0, 1, 6, 7, 4, 5]);
    }

    #[test]
    fn gather_works() {
        let param = ParamPlasticity::sample_elastic();
        let kernel = J2Plasticity::new(&param, Formulation::Stabilized { alpha: 1.0 }).unwrap();
        let mesh = SampleMeshes::box2d(1.0, 1.0, 1, 1);
        let base = FemBase::new(&mesh, &kernel).unwrap();
        let uu = Vector::linspace(0.0, 11.0, 12).unwrap();
        let uu_prev = Vector::filled(12, -1.0);
        let cc = Vector::linspace(0.0, 11.0, 12).unwrap();
        let cc_prev = Vector::filled(12, -2.0);
        let pi_prev = Vector::linspace(0.0, 7.0, 8).unwrap();
        let control = Vector::from(&[0.1, 0.2, 0.3, 0.4]);
        let config = base.configuration_field();
        let ctx = StepContext {
            uu: &uu,
            uu_prev: &uu_prev,
            cc: &cc,
            cc_prev: &cc_prev,
            pi_prev: &pi_prev,
            control: &control,
            config: &config,
        };
        let mut args = base.new_args();
        // cell 1 has points [0, 3, 2]
        base.gather(&mut args, 1, &ctx);
        assert_eq!(args.u.as_data(), &[0.0, 1.0, 2.0, 9.0, 10.0, 11.0, 6.0, 7.0, 8.0]);
        assert_eq!(args.u_prev.as_data(), &[-1.0; 9]);
        assert_eq!(args.c.as_data(), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_eq!(args.c_prev.as_data(), &[-2.0; 6]);
        assert_eq!(args.pi_prev.as_data(), &[0.0, 1.0, 6.0, 7.0, 4.0, 5.0]);
        assert_eq!(args.control.as_data(), &[0.1, 0.4, 0.3]);
        assert_eq!(args.config.as_data(), &[0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    }
}
