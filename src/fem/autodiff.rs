use num_dual::Dual64;
use russell_lab::{Matrix, Vector};

/// Computes the values and the Jacobians of a vector function using forward-mode automatic differentiation
///
/// The inputs are split into blocks (e.g., u, c, control). The function `f` receives the
/// blocks as dual numbers and returns the outputs. One evaluation is performed per input
/// component with the corresponding dual part seeded to one.
///
/// Returns `(values, jacobians)` where `jacobians[b]` has dims `(n_out, blocks[b].dim())`.
pub fn forward_jacobians<F>(blocks: &[&Vector], f: F) -> (Vec<f64>, Vec<Matrix>)
where
    F: Fn(&[Vec<Dual64>]) -> Vec<Dual64>,
{
    let mut duals: Vec<Vec<Dual64>> = blocks
        .iter()
        .map(|b| b.as_data().iter().map(|v| Dual64::from(*v)).collect())
        .collect();
    let values: Vec<f64> = f(&duals).iter().map(|r| r.re).collect();
    let n_out = values.len();
    let mut jacobians = Vec::with_capacity(blocks.len());
    for b in 0..blocks.len() {
        let n = blocks[b].dim();
        let mut jac = Matrix::new(n_out, n);
        for j in 0..n {
            let x = blocks[b][j];
            duals[b][j] = Dual64::from(x).derivative();
            let res = f(&duals);
            for i in 0..n_out {
                jac.set(i, j, res[i].eps);
            }
            duals[b][j] = Dual64::from(x);
        }
        jacobians.push(jac);
    }
    (values, jacobians)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::forward_jacobians;
    use russell_lab::{mat_approx_eq, vec_approx_eq, Matrix, Vector};

    #[test]
    fn forward_jacobians_works() {
        // f(x, y, z) = [x², x y, y z + x]
        let x = Vector::from(&[2.0, 3.0]);
        let z = Vector::from(&[4.0]);
        let (values, jacobians) = forward_jacobians(&[&x, &z], |v| {
            let (x0, y0, z0) = (v[0][0], v[0][1], v[1][0]);
            vec![x0 * x0, x0 * y0, y0 * z0 + x0]
        });
        vec_approx_eq(&values, &[4.0, 6.0, 14.0], 1e-15);
        #[rustfmt::skip]
        let dfdx = Matrix::from(&[
            [4.0, 0.0],
            [3.0, 2.0],
            [1.0, 4.0],
        ]);
        let dfdz = Matrix::from(&[[0.0], [0.0], [3.0]]);
        mat_approx_eq(&jacobians[0], &dfdx, 1e-15);
        mat_approx_eq(&jacobians[1], &dfdz, 1e-15);
    }

    #[test]
    fn forward_jacobians_handles_empty_blocks() {
        let x = Vector::from(&[1.5]);
        let empty = Vector::new(0);
        let (values, jacobians) = forward_jacobians(&[&empty, &x], |v| vec![v[1][0] * v[1][0] * v[1][0]]);
        assert_eq!(values.len(), 1);
        assert_eq!(jacobians[0].dims(), (1, 0));
        assert_eq!(jacobians[1].get(0, 0), 3.0 * 1.5 * 1.5);
    }
}
