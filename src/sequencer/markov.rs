//! First-order Markov chain over clip indices

use rand::Rng;

use crate::error::RemixError;

/// Row-stochastic transition matrix
///
/// `row(i)[j]` is the probability of moving from clip `i` to clip `j`.
/// Every row sums to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    rows: Vec<Vec<f64>>,
}

impl TransitionMatrix {
    /// Random matrix for `n` clips
    ///
    /// Every transition, self-transitions included, gets an independent
    /// uniform weight; rows are then normalised.
    ///
    /// # Errors
    ///
    /// `ValidationError` if `n == 0`
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self, RemixError> {
        let rows = (0..n)
            .map(|_| (0..n).map(|_| rng.gen::<f64>()).collect())
            .collect();
        Self::from_weights(rows)
    }

    /// Matrix from non-negative weights, normalised per row
    ///
    /// A row whose weights sum to zero becomes uniform.
    ///
    /// # Errors
    ///
    /// `ValidationError` if the matrix is empty or not square, or a weight is
    /// negative or not finite
    pub fn from_weights(mut rows: Vec<Vec<f64>>) -> Result<Self, RemixError> {
        let n = rows.len();
        if n == 0 {
            return Err(RemixError::ValidationError(
                "Transition matrix needs at least one clip".to_string(),
            ));
        }

        for (i, row) in rows.iter_mut().enumerate() {
            if row.len() != n {
                return Err(RemixError::ValidationError(format!(
                    "Transition row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(RemixError::ValidationError(format!(
                    "Transition row {} has an invalid weight",
                    i
                )));
            }

            let sum: f64 = row.iter().sum();
            if sum > 0.0 {
                row.iter_mut().for_each(|w| *w /= sum);
            } else {
                row.iter_mut().for_each(|w| *w = 1.0 / n as f64);
            }
        }

        log::debug!("Built {}x{} transition matrix", n, n);
        Ok(Self { rows })
    }

    /// Number of states
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; a matrix has at least one state
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Outgoing probabilities of a state
    pub fn row(&self, state: usize) -> Option<&[f64]> {
        self.rows.get(state).map(Vec::as_slice)
    }

    /// Next state for a uniform draw in [0, 1)
    ///
    /// Walks the row's cumulative distribution and returns the first index
    /// whose running sum exceeds `draw`. Rounding can leave the total just
    /// below the draw, in which case the last index is returned.
    pub fn next_state(&self, current: usize, draw: f64) -> usize {
        let last = self.rows.len() - 1;
        let Some(row) = self.rows.get(current) else {
            return last;
        };

        let mut cumulative = 0.0;
        for (next, &p) in row.iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                return next;
            }
        }
        last
    }

    /// Walk the chain for `length` steps
    ///
    /// Starts from a uniformly random state; the start is the first element.
    pub fn sample_sequence<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> Vec<usize> {
        let mut order = Vec::with_capacity(length);
        if length == 0 {
            return order;
        }

        let mut current = rng.gen_range(0..self.rows.len());
        for _ in 0..length {
            order.push(current);
            current = self.next_state(current, rng.gen::<f64>());
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rows_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 1..=10 {
            let matrix = TransitionMatrix::random(n, &mut rng).unwrap();
            assert_eq!(matrix.len(), n);
            for i in 0..n {
                let sum: f64 = matrix.row(i).unwrap().iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "row {} of {} sums to {}", i, n, sum);
            }
        }
    }

    #[test]
    fn test_sequence_indices_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..=6 {
            let matrix = TransitionMatrix::random(n, &mut rng).unwrap();
            for length in [0, 1, 5, 200] {
                let order = matrix.sample_sequence(length, &mut rng);
                assert_eq!(order.len(), length);
                assert!(order.iter().all(|&i| i < n));
            }
        }
    }

    #[test]
    fn test_next_state_cumulative_walk() {
        let matrix = TransitionMatrix::from_weights(vec![vec![1.0, 1.0, 2.0]; 3]).unwrap();
        assert_eq!(matrix.next_state(0, 0.0), 0);
        assert_eq!(matrix.next_state(0, 0.3), 1);
        assert_eq!(matrix.next_state(0, 0.6), 2);
        // A draw the rounded total never exceeds falls to the last index
        assert_eq!(matrix.next_state(0, 1.0), 2);
    }

    #[test]
    fn test_deterministic_chain() {
        let matrix = TransitionMatrix::from_weights(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let order = matrix.sample_sequence(6, &mut rng);
        for pair in order.windows(2) {
            assert_ne!(pair[0], pair[1], "chain should alternate: {:?}", order);
        }
    }

    #[test]
    fn test_zero_row_becomes_uniform() {
        let matrix = TransitionMatrix::from_weights(vec![vec![0.0, 0.0], vec![3.0, 1.0]]).unwrap();
        assert_eq!(matrix.row(0).unwrap(), &[0.5, 0.5]);
        assert_eq!(matrix.row(1).unwrap(), &[0.75, 0.25]);
    }

    #[test]
    fn test_invalid_weights() {
        assert!(TransitionMatrix::from_weights(vec![]).is_err());
        assert!(TransitionMatrix::from_weights(vec![vec![1.0], vec![1.0]]).is_err());
        assert!(TransitionMatrix::from_weights(vec![vec![-1.0]]).is_err());
        assert!(TransitionMatrix::random(0, &mut StdRng::seed_from_u64(0)).is_err());
    }
}
