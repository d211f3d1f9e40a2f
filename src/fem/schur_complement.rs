use super::ElementPartials;
use crate::base::matrix_times_vector;
use crate::StrError;
use russell_lab::{mat_copy, mat_inverse, mat_mat_mul, mat_norm, vec_copy, Matrix, Norm, Vector};

/// Holds the statically condensed (Schur complement) quantities of one element
///
/// The local state is eliminated from the linearized pair (R, H):
///
/// ```text
/// T     = ∂R/∂c (∂H/∂c)⁻¹
/// K_eff = ∂R/∂u - T ∂H/∂u
/// R_eff = R - T H
/// ```
pub struct CondensedElement {
    /// Holds (∂H/∂c)⁻¹
    pub inv: Matrix,

    /// Holds T = ∂R/∂c (∂H/∂c)⁻¹
    pub tt: Matrix,

    /// Holds the condensed tangent K_eff
    pub kk_eff: Matrix,

    /// Holds the condensed residual R_eff
    pub rr_eff: Vector,
}

impl CondensedElement {
    /// Allocates a new instance
    pub fn new(n_eq: usize, n_local: usize) -> Self {
        CondensedElement {
            inv: Matrix::new(n_local, n_local),
            tt: Matrix::new(n_eq, n_local),
            kk_eff: Matrix::new(n_eq, n_eq),
            rr_eff: Vector::new(n_eq),
        }
    }

    /// Performs the static condensation
    ///
    /// If `tol_singular` is given, the reciprocal condition number (∞-norm) of ∂H/∂c is
    /// checked against it and an error is returned when ∂H/∂c is (nearly) singular.
    pub fn condense(&mut self, partials: &ElementPartials, tol_singular: Option<f64>) -> Result<(), StrError> {
        let n_eq = self.rr_eff.dim();
        let n_local = self.inv.dims().0;
        if partials.n_eq() != n_eq || partials.n_local() != n_local {
            return Err("element partials have incorrect dimensions");
        }
        if partials.drr_dc.dims() != (n_eq, n_local) || partials.dhh_du.dims() != (n_local, n_eq) {
            return Err("element partials have incorrect dimensions");
        }
        match tol_singular {
            Some(tol) => {
                if mat_inverse(&mut self.inv, &partials.dhh_dc).is_err() {
                    return Err("local tangent ∂H/∂c is singular");
                }
                let rcond = 1.0 / (mat_norm(&partials.dhh_dc, Norm::Inf) * mat_norm(&self.inv, Norm::Inf));
                if !(rcond >= tol) {
                    return Err("local tangent ∂H/∂c is singular");
                }
            }
            None => {
                mat_inverse(&mut self.inv, &partials.dhh_dc)?;
            }
        }
        mat_mat_mul(&mut self.tt, 1.0, &partials.drr_dc, &self.inv, 0.0)?;
        mat_copy(&mut self.kk_eff, &partials.drr_du)?;
        mat_mat_mul(&mut self.kk_eff, -1.0, &self.tt, &partials.dhh_du, 1.0)?;
        vec_copy(&mut self.rr_eff, &partials.rr)?;
        matrix_times_vector(&mut self.rr_eff, -1.0, &self.tt, &partials.hh, false)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::CondensedElement;
    use crate::fem::ElementPartials;
    use russell_lab::{mat_approx_eq, vec_approx_eq, Matrix};

    fn sample_partials() -> ElementPartials {
        // n_node = 1, ndof = 2, n_local = 2, no projected field
        let mut p = ElementPartials::new(1, 2, 2, 0);
        p.rr[0] = 1.0;
        p.rr[1] = 2.0;
        p.hh[0] = 0.5;
        p.hh[1] = -0.5;
        #[rustfmt::skip]
        let drr_du = Matrix::from(&[
            [10.0, 1.0],
            [ 1.0, 8.0],
        ]);
        #[rustfmt::skip]
        let drr_dc = Matrix::from(&[
            [1.0, 0.0],
            [0.0, 2.0],
        ]);
        #[rustfmt::skip]
        let dhh_du = Matrix::from(&[
            [1.0, 1.0],
            [0.0, 1.0],
        ]);
        // its inverse is [[1, 3], [2, 4]]
        #[rustfmt::skip]
        let dhh_dc = Matrix::from(&[
            [-2.0,  1.5],
            [ 1.0, -0.5],
        ]);
        p.drr_du = drr_du;
        p.drr_dc = drr_dc;
        p.dhh_du = dhh_du;
        p.dhh_dc = dhh_dc;
        p
    }

    #[test]
    fn condense_captures_errors() {
        let p = sample_partials();
        let mut cond = CondensedElement::new(3, 2);
        assert_eq!(
            cond.condense(&p, None).err(),
            Some("element partials have incorrect dimensions")
        );
        let mut p = sample_partials();
        p.dhh_dc = Matrix::from(&[[1.0, 2.0], [2.0, 4.0]]);
        let mut cond = CondensedElement::new(2, 2);
        assert_eq!(cond.condense(&p, Some(1e-12)).err(), Some("local tangent ∂H/∂c is singular"));
    }

    #[test]
    fn condense_works() {
        let p = sample_partials();
        let mut cond = CondensedElement::new(2, 2);
        cond.condense(&p, Some(1e-12)).unwrap();
        mat_approx_eq(&cond.inv, &[[1.0, 3.0], [2.0, 4.0]], 1e-14);
        // T = drr_dc inv = [[1, 3], [4, 8]]
        mat_approx_eq(&cond.tt, &[[1.0, 3.0], [4.0, 8.0]], 1e-14);
        // T dhh_du = [[1, 4], [4, 12]]
        mat_approx_eq(&cond.kk_eff, &[[9.0, -3.0], [-3.0, -4.0]], 1e-14);
        // T H = [-1, -2]
        vec_approx_eq(cond.rr_eff.as_data(), &[2.0, 4.0], 1e-14);
    }
}
