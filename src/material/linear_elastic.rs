use crate::base::ParamPlasticity;
use crate::StrError;
use russell_lab::{mat_mat_mul, Matrix, Vector};
use russell_tensor::LinElasticity;
use std::f64::consts::FRAC_1_SQRT_2;

/// Implements the plane-strain linear elastic stiffness of a Tri3 cell
///
/// This is the closed-form reference for the elastic branch of the plasticity kernel
/// (with the design density equal to one).
pub struct LinearElastic {
    pub model: LinElasticity,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new(param: &ParamPlasticity) -> Result<Self, StrError> {
        if param.validate().is_some() {
            return Err("cannot allocate LinearElastic because param.validate() failed");
        }
        Ok(LinearElastic {
            model: LinElasticity::new(param.young, param.poisson, true, false),
        })
    }

    /// Computes the stiffness matrix K = A Bᵀ D B
    ///
    /// `config` holds the coordinates of the three points `[x0, y0, x1, y1, x2, y2]`.
    pub fn stiffness(&self, config: &Vector) -> Result<Matrix, StrError> {
        if config.dim() != 6 {
            return Err("the configuration of a Tri3 cell must have six components");
        }
        let (x0, y0, x1, y1, x2, y2) = (config[0], config[1], config[2], config[3], config[4], config[5]);
        let two_area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
        if two_area <= 0.0 {
            return Err("the area of the Tri3 cell must be positive");
        }
        let bb = [(y1 - y2) / two_area, (y2 - y0) / two_area, (y0 - y1) / two_area];
        let cc = [(x2 - x1) / two_area, (x0 - x2) / two_area, (x1 - x0) / two_area];

        // strain-displacement matrix (Mandel)
        let mut b_mat = Matrix::new(4, 6);
        for a in 0..3 {
            b_mat.set(0, 2 * a, bb[a]);
            b_mat.set(1, 2 * a + 1, cc[a]);
            b_mat.set(3, 2 * a, cc[a] * FRAC_1_SQRT_2);
            b_mat.set(3, 2 * a + 1, bb[a] * FRAC_1_SQRT_2);
        }
        let dd = self.model.get_modulus().matrix();
        let mut db = Matrix::new(4, 6);
        mat_mat_mul(&mut db, 1.0, dd, &b_mat, 0.0)?;
        let area = two_area / 2.0;
        let mut kk = Matrix::new(6, 6);
        for i in 0..6 {
            for j in 0..6 {
                let mut sum = 0.0;
                for m in 0..4 {
                    sum += b_mat.get(m, i) * db.get(m, j);
                }
                kk.set(i, j, area * sum);
            }
        }
        Ok(kk)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
