use anyhow::{ensure, Result};

/// Exact nearest-neighbour index over squared Euclidean distance.
///
/// Vectors are stored row-major in one buffer. Append-only: there is no
/// removal or update, and a rejected `add` leaves the index untouched.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn dim(&self) -> usize { self.dim }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Append all vectors or none of them.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        ensure!(self.dim > 0, "index dimension must be positive");
        for (i, v) in vectors.iter().enumerate() {
            ensure!(
                v.len() == self.dim,
                "vector {} has dimension {}, index expects {}",
                i,
                v.len(),
                self.dim
            );
            ensure!(v.iter().all(|x| x.is_finite()), "vector {} contains non-finite values", i);
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// The `k` nearest rows as `(position, squared distance)`, nearest first.
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        ensure!(
            query.len() == self.dim,
            "query has dimension {}, index expects {}",
            query.len(),
            self.dim
        );
        ensure!(query.iter().all(|x| x.is_finite()), "query contains non-finite values");
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| squared_l2(row, query))
            .enumerate()
            .collect();
        let by_distance =
            |a: &(usize, f32), b: &(usize, f32)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0));
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance);
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(rows: &[[f32; 2]]) -> FlatL2Index {
        let mut index = FlatL2Index::new(2);
        index.add(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap();
        index
    }

    #[test]
    fn nearest_first_with_squared_distances() {
        let index = index_with(&[[0.0, 0.0], [3.0, 4.0], [1.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits, vec![(0, 0.0), (2, 1.0), (1, 25.0)]);
    }

    #[test]
    fn truncates_to_k() {
        let index = index_with(&[[5.0, 5.0], [1.0, 1.0], [2.0, 2.0], [0.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = index_with(&[[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn bad_batch_is_rejected_whole() {
        let mut index = index_with(&[[1.0, 1.0]]);
        let err = index.add(&[vec![2.0, 2.0], vec![3.0]]);
        assert!(err.is_err());
        assert_eq!(index.len(), 1);

        assert!(index.add(&[vec![f32::NAN, 0.0]]).is_err());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_index_and_wrong_query_dim() {
        let index = FlatL2Index::new(3);
        assert!(index.search(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(index.search(&[0.0], 5).is_err());
    }
}
