use crate::StrError;
use russell_lab::{mat_vec_mul_update, vec_mat_mul, vec_update, Matrix, Vector};
use russell_sparse::CooMatrix;

/// Assembles local vector into global vector
///
/// # Output
///
/// * `rr_global` -- is the global vector R with length = `n_equation`
///
/// # Input
///
/// * `r_local` -- is the local vector r with length = `n_equation_local`
/// * `local_to_global` -- is an array holding all equation numbers of the cell
/// * `prescribed` -- tells whether a global equation number has prescribed
///   DOF or not. Its length is equal to the total number of DOFs `n_equation`.
///
/// # Panics
///
/// This function will panic if the indices are out-of-bounds
#[inline]
pub fn assemble_vector(rr_global: &mut Vector, r_local: &Vector, local_to_global: &[usize], prescribed: &[bool]) {
    let n_equation_local = r_local.dim();
    for l in 0..n_equation_local {
        let g = local_to_global[l];
        if !prescribed[g] {
            rr_global[g] += r_local[l];
        }
    }
}

/// Assembles local matrix into global matrix
///
/// # Output
///
/// * `kk_global` -- is the global square matrix K with dims = (`n_equation`,`n_equation`)
///
/// # Input
///
/// * `kk_local` -- is the local square matrix K with dims = (`n_equation_local`,`n_equation_local`)
/// * `local_to_global` -- is an array holding all equation numbers of the cell
/// * `prescribed` -- tells whether a global equation number has prescribed
///   DOF or not. Its length is equal to the total number of DOFs `n_equation`.
/// * `transposed` -- assembles the transpose of the local matrix instead
///
/// # Panics
///
/// This function will panic if the indices are out-of-bounds
pub fn assemble_matrix(
    kk_global: &mut CooMatrix,
    kk_local: &Matrix,
    local_to_global: &[usize],
    prescribed: &[bool],
    transposed: bool,
) -> Result<(), StrError> {
    let n_equation_local = kk_local.dims().0;
    for l in 0..n_equation_local {
        let g = local_to_global[l];
        if !prescribed[g] {
            for ll in 0..n_equation_local {
                let gg = local_to_global[ll];
                if !prescribed[gg] {
                    let value = if transposed {
                        kk_local.get(ll, l)
                    } else {
                        kk_local.get(l, ll)
                    };
                    kk_global.put(g, gg, value)?;
                }
            }
        }
    }
    Ok(())
}

/// Performs the update `v += α⋅op(a)⋅u` where `op(a)` is `a` or `aᵀ`
///
/// Returns an error if `v.dim()` differs from the number of rows of `op(a)` or if `u.dim()`
/// differs from the number of columns of `op(a)`.
pub fn matrix_times_vector(v: &mut Vector, alpha: f64, a: &Matrix, u: &Vector, transposed: bool) -> Result<(), StrError> {
    let (nrow, ncol) = a.dims();
    let (m, n) = if transposed { (ncol, nrow) } else { (nrow, ncol) };
    if v.dim() != m || u.dim() != n {
        return Err("matrix and vectors have incompatible dimensions");
    }
    if m == 0 || n == 0 {
        return Ok(());
    }
    if transposed {
        // vᵀ += α uᵀ a
        let mut work = Vector::new(m);
        vec_mat_mul(&mut work, alpha, u, a)?;
        vec_update(v, 1.0, &work)
    } else {
        mat_vec_mul_update(v, alpha, a, u, 1.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{assemble_matrix, assemble_vector, matrix_times_vector};
    use russell_lab::{vec_approx_eq, Matrix, Vector};
    use russell_sparse::{CooMatrix, Sym};

    #[test]
    fn assemble_vector_works() {
        //   {4} 2-----3 {6}
        //       |   / |
        //       | /   |
        //   {0} 0-----1 {2}
        let l2g = [[0, 1, 2, 3, 6, 7], [0, 1, 6, 7, 4, 5]];
        let prescribed = vec![true, true, false, false, false, false, false, false];
        let r0 = Vector::from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let r1 = Vector::from(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        let mut rr = Vector::new(8);
        assemble_vector(&mut rr, &r0, &l2g[0], &prescribed);
        assemble_vector(&mut rr, &r1, &l2g[1], &prescribed);
        vec_approx_eq(rr.as_data(), &[0.0, 0.0, 3.0, 4.0, 50.0, 60.0, 35.0, 46.0], 1e-15);
    }

    #[test]
    fn assemble_matrix_works() {
        let l2g = [0, 2];
        let prescribed = vec![false, true, false];
        #[rustfmt::skip]
        let kk_local = Matrix::from(&[
            [1.0, 2.0],
            [3.0, 4.0],
        ]);
        let mut kk = CooMatrix::new(3, 3, 4, Sym::No).unwrap();
        assemble_matrix(&mut kk, &kk_local, &l2g, &prescribed, false).unwrap();
        let mat = kk.as_dense();
        assert_eq!(mat.get(0, 2), 2.0);
        assert_eq!(mat.get(2, 0), 3.0);
        assert_eq!(mat.get(2, 2), 4.0);
        assert_eq!(mat.get(1, 1), 0.0);

        let mut kk = CooMatrix::new(3, 3, 4, Sym::No).unwrap();
        assemble_matrix(&mut kk, &kk_local, &l2g, &prescribed, true).unwrap();
        let mat = kk.as_dense();
        assert_eq!(mat.get(0, 2), 3.0);
        assert_eq!(mat.get(2, 0), 2.0);
    }

    #[test]
    fn matrix_times_vector_works() {
        #[rustfmt::skip]
        let a = Matrix::from(&[
            [1.0, 2.0],
            [3.0, 4.0],
            [5.0, 6.0],
        ]);
        let mut v = Vector::new(2);
        matrix_times_vector(&mut v, 1.0, &a, &Vector::from(&[1.0, 1.0, 1.0]), true).unwrap();
        vec_approx_eq(v.as_data(), &[9.0, 12.0], 1e-15);

        #[rustfmt::skip]
        let b = Matrix::from(&[
            [1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
        ]);
        let mut w = Vector::from(&[1.0, 1.0]);
        matrix_times_vector(&mut w, 2.0, &b, &Vector::from(&[1.0, 0.0, -1.0]), false).unwrap();
        vec_approx_eq(w.as_data(), &[-3.0, -3.0], 1e-15);

        // empty operands leave v unchanged
        let mut z = Vector::from(&[7.0]);
        matrix_times_vector(&mut z, 1.0, &Matrix::new(1, 0), &Vector::new(0), false).unwrap();
        assert_eq!(z.as_data(), &[7.0]);
    }

    #[test]
    fn matrix_times_vector_captures_errors() {
        let a = Matrix::new(3, 2);
        let mut v = Vector::new(2);
        assert_eq!(
            matrix_times_vector(&mut v, 1.0, &a, &Vector::new(2), true).err(),
            Some("matrix and vectors have incompatible dimensions")
        );
        assert_eq!(
            matrix_times_vector(&mut v, 1.0, &a, &Vector::new(2), false).err(),
            Some("matrix and vectors have incompatible dimensions")
        );
        let mut w = Vector::new(3);
        assert_eq!(
            matrix_times_vector(&mut w, 1.0, &a, &Vector::new(3), false).err(),
            Some("matrix and vectors have incompatible dimensions")
        );
    }
}
