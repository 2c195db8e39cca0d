//! Small dense linear solver for plane and ray decompositions
//!
//! Solves `x = a·u + b·v + c·s` (and the four-term variant in 4D) for the
//! coefficients. Used to express a point in a plane's span basis and to
//! intersect rays with planes.

use super::error::SolverError;
use crate::foundation::math::{Mat3, Vec3, Vec4};
use nalgebra::Matrix4;

/// Squared length below which a basis vector counts as zero
const ZERO_LENGTH_SQ: f32 = 1e-12;

/// Relative determinant below which a basis counts as linearly dependent
pub const DEFAULT_DEPENDENCE_EPSILON: f32 = 1e-6;

/// Solve `x = a·u + b·v + c·s`, returning `(u, v, s)`
pub fn solve_linear_equation(a: &Vec3, b: &Vec3, c: &Vec3, x: &Vec3) -> Result<Vec3, SolverError> {
    solve_linear_equation_with(a, b, c, x, DEFAULT_DEPENDENCE_EPSILON)
}

/// [`solve_linear_equation`] with an explicit dependence tolerance
pub fn solve_linear_equation_with(
    a: &Vec3,
    b: &Vec3,
    c: &Vec3,
    x: &Vec3,
    epsilon: f32,
) -> Result<Vec3, SolverError> {
    let basis = [*a, *b, *c];
    let scale = check_lengths(basis.iter().map(|v| v.magnitude_squared()))?;

    let matrix = Mat3::from_columns(&basis);
    if matrix.determinant().abs() <= epsilon * scale {
        return Err(SolverError::LinearlyDependent);
    }
    matrix
        .try_inverse()
        .map(|inverse| inverse * x)
        .ok_or(SolverError::LinearlyDependent)
}

/// Solve `x = a·u + b·v + c·s + d·t` in 4D, returning `(u, v, s, t)`
pub fn solve_linear_equation4(
    a: &Vec4,
    b: &Vec4,
    c: &Vec4,
    d: &Vec4,
    x: &Vec4,
) -> Result<Vec4, SolverError> {
    let basis = [*a, *b, *c, *d];
    let scale = check_lengths(basis.iter().map(|v| v.magnitude_squared()))?;

    let matrix = Matrix4::from_columns(&basis);
    if matrix.determinant().abs() <= DEFAULT_DEPENDENCE_EPSILON * scale {
        return Err(SolverError::LinearlyDependent);
    }
    matrix
        .try_inverse()
        .map(|inverse| inverse * x)
        .ok_or(SolverError::LinearlyDependent)
}

/// Reject zero-length vectors and return the product of their lengths
fn check_lengths(lengths_sq: impl Iterator<Item = f32>) -> Result<f32, SolverError> {
    let mut product = 1.0_f32;
    for (index, length_sq) in lengths_sq.enumerate() {
        if length_sq <= ZERO_LENGTH_SQ {
            return Err(SolverError::ZeroLengthBasis { index });
        }
        product *= length_sq.sqrt();
    }
    Ok(product)
}
