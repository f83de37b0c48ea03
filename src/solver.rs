//! Time-bounded, resumable branch-and-bound for the Hamiltonian-path
//! problem over a `CompleteGraph`.
//!
//! The search is a depth-first enumeration of permutations of {1..n-1}
//! appended to a path fixed at vertex 0, with a mandatory return arc to 0.
//! A wall-clock budget is polled at every recursive entry; on exhaustion a
//! single checkpoint (current vertex, cost, unvisited set, visited
//! sequence) is captured and the recursion unwinds immediately. Resuming
//! continues that one DFS path: sibling branches above the checkpoint are
//! abandoned, so a `Done` obtained after a timeout proves optimality of the
//! continued subtree only. The best solution found is optimal whenever the
//! initial search finishes with `Done` inside its budget.

use crate::graph::CompleteGraph;
use ordered_float::OrderedFloat;
use std::time::{Duration, Instant};

/// Outcome of a search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Search space exhausted within the budget; the recorded solution is
    /// the best of everything explored.
    Done,
    /// Budget exhausted; a checkpoint was captured and the best solution so
    /// far (possibly none) is kept.
    TimedOut,
}

/// Lower bound on the cost of completing a tour from `current`, visiting
/// every vertex of `unvisited` exactly once and returning to vertex 0.
pub trait BoundStrategy {
    fn bound(&self, graph: &CompleteGraph, current: usize, unvisited: &[usize]) -> f64;
    fn name(&self) -> &str;
}

/// Always-valid trivial bound.
pub struct TrivialBound;

impl BoundStrategy for TrivialBound {
    fn bound(&self, _graph: &CompleteGraph, _current: usize, _unvisited: &[usize]) -> f64 {
        0.0
    }

    fn name(&self) -> &str {
        "trivial"
    }
}

/// Sum of the cheapest usable outgoing arc of the current vertex and of
/// every unvisited vertex. Each vertex still has to be left once, so the
/// sum is a valid lower bound; a vertex with no usable arc makes the
/// subtree infeasible and the bound infinite.
pub struct MinOutgoingBound;

impl MinOutgoingBound {
    fn cheapest_exit(
        graph: &CompleteGraph,
        from: usize,
        unvisited: &[usize],
        allow_depot: bool,
    ) -> f64 {
        let mut best = f64::INFINITY;
        for &v in unvisited {
            if v != from && graph.is_arc(from, v) {
                best = best.min(graph.cost(from, v));
            }
        }
        if allow_depot && graph.is_arc(from, 0) {
            best = best.min(graph.cost(from, 0));
        }
        best
    }
}

impl BoundStrategy for MinOutgoingBound {
    fn bound(&self, graph: &CompleteGraph, current: usize, unvisited: &[usize]) -> f64 {
        let mut total = Self::cheapest_exit(graph, current, unvisited, false);
        for &v in unvisited {
            total += Self::cheapest_exit(graph, v, unvisited, true);
        }
        total
    }

    fn name(&self) -> &str {
        "min-outgoing"
    }
}

/// Order in which the unvisited successors of a vertex are expanded.
/// Implementations must only yield vertices reachable from `current`.
pub trait SuccessorStrategy {
    fn successors(&self, graph: &CompleteGraph, current: usize, unvisited: &[usize]) -> Vec<usize>;
    fn name(&self) -> &str;
}

/// Plain unvisited-set order.
pub struct NaturalOrder;

impl SuccessorStrategy for NaturalOrder {
    fn successors(&self, graph: &CompleteGraph, current: usize, unvisited: &[usize]) -> Vec<usize> {
        unvisited
            .iter()
            .copied()
            .filter(|&v| graph.is_arc(current, v))
            .collect()
    }

    fn name(&self) -> &str {
        "natural"
    }
}

/// Cheapest arc first.
pub struct NearestFirst;

impl SuccessorStrategy for NearestFirst {
    fn successors(&self, graph: &CompleteGraph, current: usize, unvisited: &[usize]) -> Vec<usize> {
        let mut successors: Vec<usize> = unvisited
            .iter()
            .copied()
            .filter(|&v| graph.is_arc(current, v))
            .collect();
        successors.sort_by_key(|&v| OrderedFloat(graph.cost(current, v)));
        successors
    }

    fn name(&self) -> &str {
        "nearest-first"
    }
}

/// Snapshot of the innermost active frame at budget exhaustion.
#[derive(Debug, Clone)]
struct Checkpoint {
    vertex: usize,
    cost: f64,
    unvisited: Vec<usize>,
    visited: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SolverState {
    /// No search started yet.
    Fresh,
    /// A search ran out of budget; a checkpoint exists.
    Suspended,
    /// The search space was exhausted.
    Finished,
}

/// Best tour recorded so far.
#[derive(Debug, Clone)]
struct BestSolution {
    order: Vec<usize>,
    cost: f64,
}

/// Branch-and-bound TSP solver with pluggable bound and successor order.
///
/// At most one search may be in flight or suspended per instance; calling
/// `search_solution` while suspended is rejected, resume with
/// `continue_search` instead.
pub struct BranchAndBound {
    bound: Box<dyn BoundStrategy>,
    order: Box<dyn SuccessorStrategy>,
    state: SolverState,
    checkpoint: Option<Checkpoint>,
    best: Option<BestSolution>,
    deadline: Instant,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self::new(Box::new(MinOutgoingBound), Box::new(NearestFirst))
    }
}

impl BranchAndBound {
    pub fn new(bound: Box<dyn BoundStrategy>, order: Box<dyn SuccessorStrategy>) -> Self {
        BranchAndBound {
            bound,
            order,
            state: SolverState::Fresh,
            checkpoint: None,
            best: None,
            deadline: Instant::now(),
        }
    }

    /// Start a branch-and-bound search over `graph` within `time_limit_ms`
    /// milliseconds. The tour starts at vertex 0 and must return to it.
    pub fn search_solution(
        &mut self,
        time_limit_ms: u64,
        graph: &CompleteGraph,
    ) -> Result<SearchStatus, String> {
        if time_limit_ms == 0 {
            return Err("time limit must be positive".to_string());
        }
        match self.state {
            SolverState::Fresh => {}
            SolverState::Suspended => {
                return Err(
                    "a suspended search exists; resume it with continue_search or use a fresh solver"
                        .to_string(),
                );
            }
            SolverState::Finished => {
                return Err("search already completed; use a fresh solver".to_string());
            }
        }

        let n = graph.nb_vertices();
        let mut unvisited: Vec<usize> = (1..n).collect();
        let mut visited = Vec::with_capacity(n);
        visited.push(0); // the first visited vertex is 0
        self.deadline = Instant::now() + Duration::from_millis(time_limit_ms);
        let status = self.branch_and_bound(graph, 0, &mut unvisited, &mut visited, 0.0);
        self.record_status(status);
        Ok(status)
    }

    /// Resume a suspended search with a fresh time budget.
    pub fn continue_search(
        &mut self,
        time_limit_ms: u64,
        graph: &CompleteGraph,
    ) -> Result<SearchStatus, String> {
        if time_limit_ms == 0 {
            return Err("time limit must be positive".to_string());
        }
        match self.state {
            SolverState::Fresh => Err("no search in progress; call search_solution first".to_string()),
            SolverState::Finished => Ok(SearchStatus::Done),
            SolverState::Suspended => {
                let checkpoint = self
                    .checkpoint
                    .take()
                    .ok_or_else(|| "suspended search has no checkpoint".to_string())?;
                let mut unvisited = checkpoint.unvisited;
                let mut visited = checkpoint.visited;
                self.deadline = Instant::now() + Duration::from_millis(time_limit_ms);
                let status = self.branch_and_bound(
                    graph,
                    checkpoint.vertex,
                    &mut unvisited,
                    &mut visited,
                    checkpoint.cost,
                );
                self.record_status(status);
                Ok(status)
            }
        }
    }

    /// i-th vertex of the best tour found so far.
    pub fn solution(&self, i: usize) -> Option<usize> {
        self.best.as_ref().and_then(|best| best.order.get(i)).copied()
    }

    /// Cost of the best tour found so far, including the return arc to 0.
    pub fn solution_cost(&self) -> Option<f64> {
        self.best.as_ref().map(|best| best.cost)
    }

    fn record_status(&mut self, status: SearchStatus) {
        self.state = match status {
            SearchStatus::Done => SolverState::Finished,
            SearchStatus::TimedOut => SolverState::Suspended,
        };
        if status == SearchStatus::Done {
            self.checkpoint = None;
            log::debug!(
                "branch-and-bound done, best cost {:?} (bound: {}, order: {})",
                self.solution_cost(),
                self.bound.name(),
                self.order.name()
            );
        }
    }

    fn best_cost(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |b| b.cost)
    }

    fn branch_and_bound(
        &mut self,
        graph: &CompleteGraph,
        current: usize,
        unvisited: &mut Vec<usize>,
        visited: &mut Vec<usize>,
        current_cost: f64,
    ) -> SearchStatus {
        if Instant::now() >= self.deadline {
            self.checkpoint = Some(Checkpoint {
                vertex: current,
                cost: current_cost,
                unvisited: unvisited.clone(),
                visited: visited.clone(),
            });
            return SearchStatus::TimedOut;
        }

        if unvisited.is_empty() {
            if graph.is_arc(current, 0) {
                let total = current_cost + graph.cost(current, 0);
                if total < self.best_cost() {
                    self.best = Some(BestSolution {
                        order: visited.clone(),
                        cost: total,
                    });
                }
            }
        } else if current_cost + self.bound.bound(graph, current, unvisited) < self.best_cost() {
            for next in self.order.successors(graph, current, unvisited) {
                let position = match unvisited.iter().position(|&v| v == next) {
                    Some(p) => p,
                    None => continue,
                };
                visited.push(next);
                unvisited.remove(position);
                let status = self.branch_and_bound(
                    graph,
                    next,
                    unvisited,
                    visited,
                    current_cost + graph.cost(current, next),
                );
                if status == SearchStatus::TimedOut {
                    // the checkpoint owns clones of the working sets;
                    // unwind without restoring them
                    return SearchStatus::TimedOut;
                }
                visited.pop();
                unvisited.push(next);
            }
        }

        SearchStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_graph(n: usize) -> CompleteGraph {
        let mut cost = vec![vec![1.0; n]; n];
        for (i, row) in cost.iter_mut().enumerate() {
            row[i] = -1.0;
        }
        CompleteGraph::new(cost)
    }

    #[test]
    fn test_uniform_costs_optimum_equals_vertex_count() {
        let graph = uniform_graph(5);
        let mut solver = BranchAndBound::default();
        let status = solver.search_solution(10_000, &graph).unwrap();
        assert_eq!(status, SearchStatus::Done);
        assert_eq!(solver.solution_cost(), Some(5.0));
        assert_eq!(solver.solution(0), Some(0));
    }

    #[test]
    fn test_three_vertex_scenario() {
        let cost = vec![
            vec![-1.0, 2.0, 5.0],
            vec![2.0, -1.0, 1.0],
            vec![5.0, 1.0, -1.0],
        ];
        let graph = CompleteGraph::new(cost);
        let mut solver = BranchAndBound::default();
        let status = solver.search_solution(10_000, &graph).unwrap();
        assert_eq!(status, SearchStatus::Done);
        assert_eq!(solver.solution_cost(), Some(8.0));
        assert_eq!(solver.solution(0), Some(0));
        assert_eq!(solver.solution(1), Some(1));
        assert_eq!(solver.solution(2), Some(2));
        assert_eq!(solver.solution(3), None);
    }

    #[test]
    fn test_zero_time_limit_is_an_input_error() {
        let graph = uniform_graph(4);
        let mut solver = BranchAndBound::default();
        assert!(solver.search_solution(0, &graph).is_err());
        // no side effects
        assert_eq!(solver.solution_cost(), None);
        assert_eq!(solver.solution(0), None);
    }

    #[test]
    fn test_continue_before_search_rejected() {
        let graph = uniform_graph(4);
        let mut solver = BranchAndBound::default();
        assert!(solver.continue_search(100, &graph).is_err());
    }

    #[test]
    fn test_missing_return_arc_yields_no_solution() {
        // 0 -> 1 exists but 1 -> 0 does not: no closed tour
        let cost = vec![vec![-1.0, 3.0], vec![-1.0, -1.0]];
        let graph = CompleteGraph::new(cost);
        let mut solver = BranchAndBound::default();
        let status = solver.search_solution(10_000, &graph).unwrap();
        assert_eq!(status, SearchStatus::Done);
        assert_eq!(solver.solution_cost(), None);
    }

    #[test]
    fn test_timeout_then_continue() {
        // Large enough that a 1 ms budget cannot exhaust the tree with the
        // trivial bound; the point is to exercise the checkpoint machinery.
        let graph = CompleteGraph::seeded(12, 7);
        let mut solver = BranchAndBound::new(Box::new(TrivialBound), Box::new(NaturalOrder));
        let status = solver.search_solution(1, &graph).unwrap();
        assert_eq!(status, SearchStatus::TimedOut);

        let cost_at_timeout = solver.solution_cost().unwrap_or(f64::INFINITY);

        // a second fresh search on the suspended instance is rejected
        assert!(solver.search_solution(1000, &graph).is_err());

        // resuming completes the interrupted DFS path with a generous budget
        let status = solver.continue_search(60_000, &graph).unwrap();
        assert_eq!(status, SearchStatus::Done);
        let final_cost = solver.solution_cost().unwrap_or(f64::INFINITY);
        assert!(final_cost <= cost_at_timeout);

        // continuing a finished search is idempotent
        assert_eq!(solver.continue_search(100, &graph).unwrap(), SearchStatus::Done);
    }

    #[test]
    fn test_bound_strategies_agree_on_optimum() {
        let graph = CompleteGraph::random(7);
        let mut trivial = BranchAndBound::new(Box::new(TrivialBound), Box::new(NaturalOrder));
        let mut bounded = BranchAndBound::new(Box::new(MinOutgoingBound), Box::new(NearestFirst));
        assert_eq!(
            trivial.search_solution(60_000, &graph).unwrap(),
            SearchStatus::Done
        );
        assert_eq!(
            bounded.search_solution(60_000, &graph).unwrap(),
            SearchStatus::Done
        );
        assert_eq!(trivial.solution_cost(), bounded.solution_cost());
    }

    #[test]
    fn test_min_outgoing_bound_is_a_lower_bound() {
        let graph = CompleteGraph::random(6);
        let unvisited: Vec<usize> = (1..6).collect();
        let lb = MinOutgoingBound.bound(&graph, 0, &unvisited);

        let mut solver = BranchAndBound::default();
        solver.search_solution(60_000, &graph).unwrap();
        assert!(lb <= solver.solution_cost().unwrap());
    }
}
