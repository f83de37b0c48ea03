//! Dense cost-matrix graph over the tour stops.
//!
//! Vertex 0 is always the departure stop. A cost of -1 encodes "no edge";
//! `is_arc` must be checked before using `cost`.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const MIN_COST: i32 = 10;
const MAX_COST: i32 = 40;

/// A complete directed graph given by its cost matrix.
#[derive(Debug, Clone)]
pub struct CompleteGraph {
    nb_vertices: usize,
    cost: Vec<Vec<f64>>,
}

impl CompleteGraph {
    /// Build a graph from a dense duration matrix. The planner maps
    /// "no computed path" to -1.0 before calling this.
    pub fn new(cost: Vec<Vec<f64>>) -> Self {
        CompleteGraph {
            nb_vertices: cost.len(),
            cost,
        }
    }

    /// Synthetic instance with edge weights in [MIN_COST, MAX_COST], from a
    /// fixed-seed linear-congruential generator. Test and benchmark fixture
    /// only; real instances come from path durations.
    pub fn random(nb_vertices: usize) -> Self {
        let mut iseed: i64 = 1;
        let mut cost = vec![vec![0.0; nb_vertices]; nb_vertices];
        for i in 0..nb_vertices {
            for j in 0..nb_vertices {
                if i == j {
                    cost[i][j] = -1.0;
                } else {
                    let it = 16807 * (iseed % 127773) - 2836 * (iseed / 127773);
                    iseed = if it > 0 { it } else { 2147483647 + it };
                    cost[i][j] = (MIN_COST + (iseed % (MAX_COST - MIN_COST + 1) as i64) as i32) as f64;
                }
            }
        }
        CompleteGraph {
            nb_vertices,
            cost,
        }
    }

    /// Random instance from a caller-supplied seed, for benchmark variety.
    pub fn seeded(nb_vertices: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut cost = vec![vec![-1.0; nb_vertices]; nb_vertices];
        for i in 0..nb_vertices {
            for j in 0..nb_vertices {
                if i != j {
                    cost[i][j] = rng.gen_range(MIN_COST..=MAX_COST) as f64;
                }
            }
        }
        CompleteGraph {
            nb_vertices,
            cost,
        }
    }

    pub fn nb_vertices(&self) -> usize {
        self.nb_vertices
    }

    /// Cost of the arc (i, j); -1.0 when out of range or no edge exists.
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        if i >= self.nb_vertices || j >= self.nb_vertices {
            return -1.0;
        }
        self.cost[i][j]
    }

    /// True iff i != j, both in range, and an edge exists.
    pub fn is_arc(&self, i: usize, j: usize) -> bool {
        if i >= self.nb_vertices || j >= self.nb_vertices || self.cost[i][j] <= -1.0 {
            return false;
        }
        i != j
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_graph_is_deterministic() {
        let a = CompleteGraph::random(6);
        let b = CompleteGraph::random(6);
        for i in 0..6 {
            for j in 0..6 {
                assert_eq!(a.cost(i, j), b.cost(i, j));
            }
        }
    }

    #[test]
    fn test_random_graph_costs_in_range() {
        let g = CompleteGraph::random(8);
        for i in 0..8 {
            for j in 0..8 {
                if i == j {
                    assert_eq!(g.cost(i, j), -1.0);
                    assert!(!g.is_arc(i, j));
                } else {
                    assert!(g.cost(i, j) >= MIN_COST as f64);
                    assert!(g.cost(i, j) <= MAX_COST as f64);
                    assert!(g.is_arc(i, j));
                }
            }
        }
    }

    #[test]
    fn test_missing_edge_is_not_an_arc() {
        let g = CompleteGraph::new(vec![
            vec![-1.0, 2.0],
            vec![-1.0, -1.0], // no way back
        ]);
        assert!(g.is_arc(0, 1));
        assert!(!g.is_arc(1, 0));
        assert!(!g.is_arc(0, 2)); // out of range
        assert_eq!(g.cost(0, 2), -1.0);
    }
}
