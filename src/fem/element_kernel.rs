use crate::base::Formulation;
use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_tensor::{Mandel, Tensor2};
use serde::{Deserialize, Serialize};

/// Holds the element-gathered arguments of the local residual functions
///
/// The vectors use the local (element) numbering:
///
/// * `u`, `u_prev` -- (n_node × ndof) global state at the current and previous steps
/// * `c`, `c_prev` -- (n_local) local state at the current and previous steps
/// * `pi_prev` -- (n_node × n_projected) projected field of the previous step
/// * `control` -- (n_node) design density at the nodes
/// * `config` -- (n_node × 2) nodal coordinates
pub struct ElementArgs {
    pub u: Vector,
    pub u_prev: Vector,
    pub c: Vector,
    pub c_prev: Vector,
    pub pi_prev: Vector,
    pub control: Vector,
    pub config: Vector,
}

/// Holds the residuals and all partial derivatives of one element
///
/// `R` is the element contribution to the global residual and `H` the local residual.
/// The derivatives w.r.t. the projected field (`drr_dpi`, `dhh_dpi`) refer to the
/// field of the previous step, consumed by the current step only.
pub struct ElementPartials {
    /// Residual R (n_eq)
    pub rr: Vector,

    /// Local residual H (n_local)
    pub hh: Vector,

    pub drr_du: Matrix,
    pub drr_du_prev: Matrix,
    pub drr_dc: Matrix,
    pub drr_dc_prev: Matrix,
    pub drr_dpi: Matrix,
    pub drr_dcontrol: Matrix,
    pub drr_dconfig: Matrix,

    pub dhh_du: Matrix,
    pub dhh_du_prev: Matrix,
    pub dhh_dc: Matrix,
    pub dhh_dc_prev: Matrix,
    pub dhh_dpi: Matrix,
    pub dhh_dcontrol: Matrix,
    pub dhh_dconfig: Matrix,
}

/// Holds the element contribution to the projected-field residual P and its partial derivatives
pub struct ProjectionPartials {
    /// Residual P (n_node × n_projected)
    pub pp: Vector,

    pub dpp_dpi: Matrix,
    pub dpp_du: Matrix,
    pub dpp_dconfig: Matrix,
}

/// Holds diagnostic results of an element (integration point)
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ElementOutput {
    /// Total stress σ
    pub stress: Tensor2,

    /// Plastic strain εᵖ
    pub plastic_strain: Tensor2,

    /// Deviatoric stress invariant (von Mises stress)
    pub sigma_d: f64,

    /// Accumulated plastic strain ᾱ
    pub alpha: f64,

    /// Indicates that the element has yielded in the current step
    pub plastic: bool,
}

/// Defines the contract of an element kernel, i.e., the residuals R and H of one cell
pub trait ElementKernel: Send + Sync {
    /// Returns the formulation (DOFs per node and size of the projected field)
    fn formulation(&self) -> Formulation;

    /// Returns the number of local state variables per element
    fn n_local(&self) -> usize;

    /// Calculates the residuals R and H (values only)
    fn residuals(&self, rr: &mut Vector, hh: &mut Vector, args: &ElementArgs) -> Result<(), StrError>;

    /// Calculates the residuals and all partial derivatives
    fn partials(&self, partials: &mut ElementPartials, args: &ElementArgs) -> Result<(), StrError>;

    /// Calculates the local state c such that H(u, c, ...) = 0
    ///
    /// Uses `args.u`, `args.c_prev`, and the fixed fields; `args.c` is ignored.
    fn update_local_state(&self, c: &mut Vector, args: &ElementArgs) -> Result<(), StrError>;

    /// Calculates the element contribution to the projected-field residual
    ///
    /// Uses `args.u`, `args.config`, and `pi` (the current projected field, gathered).
    fn projection_partials(
        &self,
        partials: &mut ProjectionPartials,
        pi: &Vector,
        args: &ElementArgs,
    ) -> Result<(), StrError>;

    /// Calculates diagnostic results such as stresses
    fn output(&self, args: &ElementArgs) -> Result<ElementOutput, StrError>;
}

impl ElementArgs {
    /// Allocates a new instance
    pub fn new(n_node: usize, ndof: usize, n_local: usize, n_projected: usize) -> Self {
        ElementArgs {
            u: Vector::new(n_node * ndof),
            u_prev: Vector::new(n_node * ndof),
            c: Vector::new(n_local),
            c_prev: Vector::new(n_local),
            pi_prev: Vector::new(n_node * n_projected),
            control: Vector::new(n_node),
            config: Vector::new(n_node * 2),
        }
    }

    /// Returns the blocks of inputs in the order used by ElementPartials
    ///
    /// The order is: u, u_prev, c, c_prev, pi_prev, control, config
    pub fn blocks(&self) -> [&Vector; 7] {
        [
            &self.u,
            &self.u_prev,
            &self.c,
            &self.c_prev,
            &self.pi_prev,
            &self.control,
            &self.config,
        ]
    }
}

impl ElementPartials {
    /// Allocates a new instance
    pub fn new(n_node: usize, ndof: usize, n_local: usize, n_projected: usize) -> Self {
        let neq = n_node * ndof;
        let npi = n_node * n_projected;
        let nx = n_node * 2;
        ElementPartials {
            rr: Vector::new(neq),
            hh: Vector::new(n_local),
            drr_du: Matrix::new(neq, neq),
            drr_du_prev: Matrix::new(neq, neq),
            drr_dc: Matrix::new(neq, n_local),
            drr_dc_prev: Matrix::new(neq, n_local),
            drr_dpi: Matrix::new(neq, npi),
            drr_dcontrol: Matrix::new(neq, n_node),
            drr_dconfig: Matrix::new(neq, nx),
            dhh_du: Matrix::new(n_local, neq),
            dhh_du_prev: Matrix::new(n_local, neq),
            dhh_dc: Matrix::new(n_local, n_local),
            dhh_dc_prev: Matrix::new(n_local, n_local),
            dhh_dpi: Matrix::new(n_local, npi),
            dhh_dcontrol: Matrix::new(n_local, n_node),
            dhh_dconfig: Matrix::new(n_local, nx),
        }
    }

    /// Returns the number of equations (rows of R)
    pub fn n_eq(&self) -> usize {
        self.rr.dim()
    }

    /// Returns the number of local state variables (rows of H)
    pub fn n_local(&self) -> usize {
        self.hh.dim()
    }

    /// Returns the R partials in the order of `ElementArgs::blocks`
    pub fn drr_blocks_mut(&mut self) -> [&mut Matrix; 7] {
        [
            &mut self.drr_du,
            &mut self.drr_du_prev,
            &mut self.drr_dc,
            &mut self.drr_dc_prev,
            &mut self.drr_dpi,
            &mut self.drr_dcontrol,
            &mut self.drr_dconfig,
        ]
    }

    /// Returns the H partials in the order of `ElementArgs::blocks`
    pub fn dhh_blocks_mut(&mut self) -> [&mut Matrix; 7] {
        [
            &mut self.dhh_du,
            &mut self.dhh_du_prev,
            &mut self.dhh_dc,
            &mut self.dhh_dc_prev,
            &mut self.dhh_dpi,
            &mut self.dhh_dcontrol,
            &mut self.dhh_dconfig,
        ]
    }
}

impl ProjectionPartials {
    /// Allocates a new instance
    pub fn new(n_node: usize, ndof: usize, n_projected: usize) -> Self {
        let npi = n_node * n_projected;
        ProjectionPartials {
            pp: Vector::new(npi),
            dpp_dpi: Matrix::new(npi, npi),
            dpp_du: Matrix::new(npi, n_node * ndof),
            dpp_dconfig: Matrix::new(npi, n_node * 2),
        }
    }
}

impl ElementOutput {
    /// Allocates a new instance (plane strain)
    pub fn new() -> Self {
        ElementOutput {
            stress: Tensor2::new(Mandel::Symmetric2D),
            plastic_strain: Tensor2::new(Mandel::Symmetric2D),
            sigma_d: 0.0,
            alpha: 0.0,
            plastic: false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
