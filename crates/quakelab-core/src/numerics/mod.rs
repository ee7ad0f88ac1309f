//! Shared numeric kernels: polynomial least squares on dense faer storage,
//! clamped 1D linear interpolation, power-of-two sizing for FFT buffers.

use faer::Mat;

pub type DenseMatrix = Mat<f64>;

const CHOLESKY_PIVOT_EPSILON: f64 = 1.0e-300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeastSquaresError {
    #[error("polynomial fit of degree {degree} needs at least {needed} samples, got {actual}")]
    InsufficientSamples {
        degree: usize,
        needed: usize,
        actual: usize,
    },
    #[error("normal equations are not positive definite at pivot {pivot_index}")]
    DegenerateSystem { pivot_index: usize },
}

/// Least-squares polynomial fit of the given degree.
///
/// Returns coefficients in ascending power order. The fit is over the whole
/// series; the normal equations are assembled from the Vandermonde matrix
/// and solved by an unpivoted Cholesky factorization.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, LeastSquaresError> {
    let n = x.len().min(y.len());
    let terms = degree + 1;
    if n < terms {
        return Err(LeastSquaresError::InsufficientSamples {
            degree,
            needed: terms,
            actual: n,
        });
    }

    let mut gram = DenseMatrix::zeros(terms, terms);
    let mut rhs = vec![0.0; terms];

    for sample in 0..n {
        let mut powers = vec![1.0; terms];
        for term in 1..terms {
            powers[term] = powers[term - 1] * x[sample];
        }
        for row in 0..terms {
            rhs[row] += powers[row] * y[sample];
            for col in row..terms {
                gram[(row, col)] += powers[row] * powers[col];
            }
        }
    }
    for row in 1..terms {
        for col in 0..row {
            gram[(row, col)] = gram[(col, row)];
        }
    }

    cholesky_solve_in_place(&mut gram, &mut rhs)?;
    Ok(rhs)
}

/// Evaluate a polynomial with ascending-power coefficients at `x`.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * x + c)
}

fn cholesky_solve_in_place(
    matrix: &mut DenseMatrix,
    rhs: &mut [f64],
) -> Result<(), LeastSquaresError> {
    let dimension = matrix.nrows();

    for pivot in 0..dimension {
        let mut diagonal = matrix[(pivot, pivot)];
        for col in 0..pivot {
            diagonal -= matrix[(pivot, col)] * matrix[(pivot, col)];
        }
        if !(diagonal > CHOLESKY_PIVOT_EPSILON) {
            return Err(LeastSquaresError::DegenerateSystem { pivot_index: pivot });
        }
        let diagonal = diagonal.sqrt();
        matrix[(pivot, pivot)] = diagonal;

        for row in (pivot + 1)..dimension {
            let mut value = matrix[(row, pivot)];
            for col in 0..pivot {
                value -= matrix[(row, col)] * matrix[(pivot, col)];
            }
            matrix[(row, pivot)] = value / diagonal;
        }
    }

    for row in 0..dimension {
        let mut value = rhs[row];
        for col in 0..row {
            value -= matrix[(row, col)] * rhs[col];
        }
        rhs[row] = value / matrix[(row, row)];
    }
    for row in (0..dimension).rev() {
        let mut value = rhs[row];
        for col in (row + 1)..dimension {
            value -= matrix[(col, row)] * rhs[col];
        }
        rhs[row] = value / matrix[(row, row)];
    }

    Ok(())
}

/// Piecewise-linear interpolation over sorted breakpoints, clamped to the
/// first/last table entry outside the breakpoint range. NaN queries pass
/// through as NaN.
pub fn linear_interp_clamped(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(!xs.is_empty());

    if x.is_nan() {
        return f64::NAN;
    }
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    let upper = xs.partition_point(|&breakpoint| breakpoint < x);
    let (x0, x1) = (xs[upper - 1], xs[upper]);
    let (y0, y1) = (ys[upper - 1], ys[upper]);
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Smallest power of two not smaller than `target`.
pub fn next_power_of_two_at_least(target: f64) -> usize {
    let mut n: usize = 1;
    while (n as f64) < target {
        n = n
            .checked_mul(2)
            .expect("FFT padding size overflows usize");
    }
    n
}
