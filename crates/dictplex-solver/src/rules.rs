use crate::dictionary::{Dictionary, Variable};

/// How the entering variable is chosen.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnteringRule {
    /// Largest positive objective coefficient, smallest index on ties.
    #[default]
    Dantzig,
    /// Smallest index with a positive objective coefficient. Never cycles.
    Bland,
}

/// The leaving side of a pivot, as found by the minimum-ratio test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaving {
    /// Position of the row in the dictionary
    pub row: usize,
    /// Basic variable of that row
    pub variable: Variable,
    /// How far the entering variable can grow
    pub ratio: f64,
}

/// True when no objective coefficient exceeds `tolerance`.
pub fn is_optimal(dictionary: &Dictionary, tolerance: f64) -> bool {
    dictionary.objective().terms().all(|(_, c)| c <= tolerance)
}

/// Pick the entering variable, or `None` if the dictionary is optimal.
pub fn entering_variable(dictionary: &Dictionary, rule: EnteringRule, tolerance: f64) -> Option<Variable> {
    let candidates = dictionary.objective().terms().filter(|&(_, c)| c > tolerance);

    match rule {
        EnteringRule::Bland => candidates.map(|(v, _)| v).min(),
        EnteringRule::Dantzig => {
            let mut best: Option<(Variable, f64)> = None;
            for (v, c) in candidates {
                best = match best {
                    None => Some((v, c)),
                    Some((_, bc)) if c > bc + tolerance => Some((v, c)),
                    Some((bv, bc)) if (c - bc).abs() <= tolerance && v < bv => Some((v, c)),
                    keep => keep,
                };
            }
            best.map(|(v, _)| v)
        }
    }
}

/// Minimum-ratio test for `entering`.
///
/// Only rows whose coefficient for `entering` is below `-tolerance` bound its
/// growth. Equal ratios (within `tolerance`) go to the smallest basic variable.
/// `None` means the entering variable can grow without limit.
pub fn leaving_variable(dictionary: &Dictionary, entering: Variable, tolerance: f64) -> Option<Leaving> {
    let mut best: Option<Leaving> = None;

    for (row, r) in dictionary.rows().iter().enumerate() {
        let a = r.coefficient(entering);
        if a >= -tolerance {
            continue;
        }
        // Drift can leave a scalar a hair below zero; it still bounds at zero.
        let ratio = r.scalar().max(0.0) / -a;
        let candidate = Leaving {
            row,
            variable: r.basic(),
            ratio,
        };

        best = match best {
            None => Some(candidate),
            Some(b) if ratio < b.ratio - tolerance => Some(candidate),
            Some(b) if (ratio - b.ratio).abs() <= tolerance && candidate.variable < b.variable => Some(candidate),
            keep => keep,
        };
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;

    const TOL: f64 = 1e-9;

    fn dictionary(a: &[f64], b: &[f64], c: &[f64]) -> Dictionary {
        Dictionary::new(&Problem::from_dense(a, b, c).unwrap()).unwrap()
    }

    #[test]
    fn test_optimal_when_no_positive_coefficient() {
        assert!(is_optimal(&dictionary(&[1.0, 1.0], &[1.0], &[-1.0, 0.0]), TOL));
        assert!(is_optimal(&dictionary(&[1.0], &[1.0], &[1e-12]), TOL));
        assert!(!is_optimal(&dictionary(&[1.0], &[1.0], &[1e-3]), TOL));
    }

    #[test]
    fn test_dantzig_picks_largest_coefficient() {
        let d = dictionary(&[1.0, 1.0, 1.0], &[1.0], &[2.0, 5.0, 3.0]);
        assert_eq!(entering_variable(&d, EnteringRule::Dantzig, TOL), Some(1));
    }

    #[test]
    fn test_dantzig_ties_go_to_smallest_index() {
        let d = dictionary(&[1.0, 1.0, 1.0], &[1.0], &[1.0, 4.0, 4.0 + 1e-12]);
        assert_eq!(entering_variable(&d, EnteringRule::Dantzig, TOL), Some(1));
    }

    #[test]
    fn test_bland_picks_smallest_positive_index() {
        let d = dictionary(&[1.0, 1.0, 1.0], &[1.0], &[-1.0, 0.5, 9.0]);
        assert_eq!(entering_variable(&d, EnteringRule::Bland, TOL), Some(1));
    }

    #[test]
    fn test_zero_coefficient_never_enters() {
        let d = dictionary(&[1.0, 1.0], &[1.0], &[0.0, -3.0]);
        assert_eq!(entering_variable(&d, EnteringRule::Dantzig, TOL), None);
        assert_eq!(entering_variable(&d, EnteringRule::Bland, TOL), None);
    }

    #[test]
    fn test_minimum_ratio() {
        // x1 = 6 - 2 x0, x2 = 4 - x0, x3 = 10 + x0
        let d = dictionary(&[2.0, 1.0, -1.0], &[6.0, 4.0, 10.0], &[1.0]);
        let leaving = leaving_variable(&d, 0, TOL).unwrap();
        assert_eq!(leaving.row, 0);
        assert_eq!(leaving.variable, 1);
        assert!((leaving.ratio - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_ties_go_to_smallest_basic_variable() {
        // both rows allow x0 to grow to 2
        let d = dictionary(&[1.0, 2.0], &[2.0, 4.0], &[1.0]);
        let leaving = leaving_variable(&d, 0, TOL).unwrap();
        assert_eq!(leaving.variable, 1);
    }

    #[test]
    fn test_zero_ratio_is_a_valid_candidate() {
        let d = dictionary(&[1.0, 1.0], &[5.0, 0.0], &[1.0]);
        let leaving = leaving_variable(&d, 0, TOL).unwrap();
        assert_eq!(leaving.variable, 2);
        assert_eq!(leaving.ratio, 0.0);
    }

    #[test]
    fn test_unbounded_when_no_row_limits() {
        let d = dictionary(&[-1.0, 0.0], &[1.0, 1.0], &[1.0]);
        assert_eq!(leaving_variable(&d, 0, TOL), None);
    }
}
