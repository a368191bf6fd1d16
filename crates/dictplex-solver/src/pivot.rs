use thiserror::Error;

use crate::dictionary::{Dictionary, Expression, Row, Variable};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("Leaving variable x{0} is not basic")]
    NotBasic(Variable),
    #[error("x{entering} has no usable coefficient in the row of x{leaving}")]
    ZeroPivot { entering: Variable, leaving: Variable },
}

/// Exchange `entering` (non-basic) and `leaving` (basic) by Gauss-Jordan elimination.
///
/// The row of `leaving` is solved for `entering`; that row is then substituted
/// into every other row and into the objective.
pub fn pivot(
    dictionary: &mut Dictionary,
    entering: Variable,
    leaving: Variable,
    tolerance: f64,
) -> Result<(), PivotError> {
    let index = dictionary.row_of(leaving).ok_or(PivotError::NotBasic(leaving))?;
    let entering_row = solve_for(&dictionary.rows()[index], entering, tolerance)?;

    for (i, row) in dictionary.rows_mut().iter_mut().enumerate() {
        if i != index {
            row.expression_mut().substitute(entering, &entering_row);
        }
    }
    dictionary.objective_mut().substitute(entering, &entering_row);
    dictionary.rows_mut()[index] = entering_row;

    Ok(())
}

/// Rearrange `leaving = s + a_e x_e + sum(c_v x_v)` into
/// `x_e = s/k + sum(c_v/k x_v) - 1/k leaving` with `k = -a_e`.
fn solve_for(row: &Row, entering: Variable, tolerance: f64) -> Result<Row, PivotError> {
    let leaving = row.basic();
    let k = -row.coefficient(entering);
    if k.abs() <= tolerance || !k.is_finite() {
        return Err(PivotError::ZeroPivot { entering, leaving });
    }

    let mut expression = Expression::new(row.scalar() / k);
    for (v, c) in row.expression().terms() {
        if v != entering {
            expression.set(v, c / k);
        }
    }
    expression.set(leaving, -1.0 / k);

    Ok(Row::new(entering, expression))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;

    const TOL: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn small() -> Dictionary {
        // maximize 3x + 2y
        //   x + y <= 4
        //   x     <= 3
        //       y <= 3
        let problem = Problem::from_dense(
            &[1.0, 1.0, 1.0, 0.0, 0.0, 1.0],
            &[4.0, 3.0, 3.0],
            &[3.0, 2.0],
        )
        .unwrap();
        Dictionary::new(&problem).unwrap()
    }

    #[test]
    fn test_pivot_row_is_solved_for_entering() {
        let mut d = small();
        pivot(&mut d, 0, 3, TOL).unwrap();

        // x0 = 3 - x3
        let row = &d.rows()[1];
        assert_eq!(row.basic(), 0);
        assert!(close(row.scalar(), 3.0));
        assert!(close(row.coefficient(3), -1.0));
        assert!(close(row.coefficient(1), 0.0));
        assert!(!row.expression().contains(0));
    }

    #[test]
    fn test_other_rows_and_objective_eliminated() {
        let mut d = small();
        pivot(&mut d, 0, 3, TOL).unwrap();

        // x2 = 4 - (3 - x3) - x1 = 1 - x1 + x3
        let row = &d.rows()[0];
        assert_eq!(row.basic(), 2);
        assert!(close(row.scalar(), 1.0));
        assert!(close(row.coefficient(1), -1.0));
        assert!(close(row.coefficient(3), 1.0));
        assert!(!row.expression().contains(0));

        // untouched by x0, but still gains the x3 column
        let row = &d.rows()[2];
        assert!(close(row.scalar(), 3.0));
        assert!(row.expression().contains(3));

        // z = 9 + 2 x1 - 3 x3
        assert!(close(d.objective_value(), 9.0));
        assert!(close(d.objective().coefficient(1), 2.0));
        assert!(close(d.objective().coefficient(3), -3.0));
        assert!(!d.objective().contains(0));

        assert!(d.check_invariants(TOL).is_ok());
    }

    #[test]
    fn test_two_pivots_reach_optimum() {
        let mut d = small();
        pivot(&mut d, 0, 3, TOL).unwrap();
        pivot(&mut d, 1, 2, TOL).unwrap();

        assert!(close(d.objective_value(), 11.0));
        assert!(close(d.value(0), 3.0));
        assert!(close(d.value(1), 1.0));
        assert!(close(d.value(4), 2.0));
        assert!(d.check_invariants(TOL).is_ok());
    }

    #[test]
    fn test_pivot_on_nonbasic_leaving_fails() {
        let mut d = small();
        assert_eq!(pivot(&mut d, 0, 1, TOL), Err(PivotError::NotBasic(1)));
    }

    #[test]
    fn test_pivot_on_zero_coefficient_fails() {
        let mut d = small();
        let before = d.clone();
        assert_eq!(
            pivot(&mut d, 1, 3, TOL),
            Err(PivotError::ZeroPivot { entering: 1, leaving: 3 })
        );
        assert_eq!(d, before);
    }
}
