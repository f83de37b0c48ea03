//! Tour assembly and incremental mutation.
//!
//! `TourPlanner` orchestrates the shortest-path engine, the complete-graph
//! reduction and the branch-and-bound solver to produce an ordered travel,
//! and patches an already-computed travel when a request is added or
//! removed. Mutations validate their inputs and compute every bridging path
//! before touching the tour, so a failed operation leaves it untouched.

use crate::graph::CompleteGraph;
use crate::network::RoadNetwork;
use crate::routing::{Path, ShortestPathEngine};
use crate::solver::{BranchAndBound, SearchStatus};
use crate::tour::{Request, Stop, StopRole, Tour};

/// External solver budget used by `compute_tour` callers by default.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 20_000;

/// In-flight tour computation: the stop list, the path matrix, the reduced
/// graph and the (possibly suspended) solver. Kept so a timed-out search
/// can be continued and its best solution materialized at any point.
pub struct TourComputation {
    stops: Vec<Stop>,
    paths: Vec<Vec<Option<Path>>>,
    graph: CompleteGraph,
    solver: BranchAndBound,
}

impl TourComputation {
    /// Cost of the best permutation found so far.
    pub fn solution_cost(&self) -> Option<f64> {
        self.solver.solution_cost()
    }
}

/// Plans and maintains the tour of a single vehicle over a road network.
pub struct TourPlanner<'a> {
    network: &'a RoadNetwork,
}

impl<'a> TourPlanner<'a> {
    pub fn new(network: &'a RoadNetwork) -> Self {
        TourPlanner { network }
    }

    /// Compute an optimized visiting order for the tour's requests.
    ///
    /// Builds the stop list `[departure, pickup1, delivery1, ...]`, runs the
    /// pruned all-pairs-of-interest shortest paths, reduces them to a
    /// `CompleteGraph` and searches it within `time_limit_ms`. On `Done` the
    /// caller materializes the result with `save_solution`; on `TimedOut` it
    /// decides between `continue_tour` and accepting the best found so far.
    ///
    /// A tour without requests is valid and degenerate: the travel is just
    /// the departure stop and no solver runs (the returned computation is
    /// `None`).
    pub fn compute_tour(
        &self,
        tour: &mut Tour,
        time_limit_ms: u64,
    ) -> Result<(SearchStatus, Option<TourComputation>), String> {
        if tour.requests.is_empty() {
            tour.ordered_travel = vec![tour.departure.clone()];
            tour.compute_arrival_times();
            return Ok((SearchStatus::Done, None));
        }

        let mut stops = vec![tour.departure.clone()];
        for request in &tour.requests {
            stops.push(request.pickup.clone());
            stops.push(request.delivery.clone());
        }

        let paths = self.compute_stop_paths(tour, &stops)?;
        let graph = Self::generate_complete_graph(&paths);
        let mut solver = BranchAndBound::default();
        let status = solver.search_solution(time_limit_ms, &graph)?;
        log::info!(
            "tour computation over {} stops: {:?}, best cost {:?}",
            stops.len(),
            status,
            solver.solution_cost()
        );

        Ok((
            status,
            Some(TourComputation {
                stops,
                paths,
                graph,
                solver,
            }),
        ))
    }

    /// Resume a timed-out search with a fresh budget.
    pub fn continue_tour(
        &self,
        computation: &mut TourComputation,
        time_limit_ms: u64,
    ) -> Result<SearchStatus, String> {
        let status = computation
            .solver
            .continue_search(time_limit_ms, &computation.graph)?;
        log::info!(
            "continued tour computation: {:?}, best cost {:?}",
            status,
            computation.solver.solution_cost()
        );
        Ok(status)
    }

    /// Materialize the solver's best permutation into the tour: set each
    /// stop's leg, rebuild the ordered travel (closed by the departure) and
    /// propagate arrival times.
    pub fn save_solution(
        &self,
        tour: &mut Tour,
        computation: &TourComputation,
    ) -> Result<(), String> {
        let n = computation.stops.len();
        let mut order = Vec::with_capacity(n);
        for i in 0..n {
            order.push(
                computation
                    .solver
                    .solution(i)
                    .ok_or_else(|| "solver recorded no solution to save".to_string())?,
            );
        }

        let mut travel = Vec::with_capacity(n + 1);
        for i in 0..n {
            let from = order[i];
            let to = if i + 1 < n { order[i + 1] } else { 0 };
            let leg = computation.paths[from][to]
                .clone()
                .ok_or_else(|| format!("no route between solution stops {} and {}", from, to))?;
            let mut stop = computation.stops[from].clone();
            stop.next_leg = Some(leg);
            travel.push(stop);
        }
        travel.push(tour.departure.clone());

        tour.ordered_travel = travel;
        tour.compute_arrival_times();
        Ok(())
    }

    /// Insert a request into a computed tour, splicing the delivery after
    /// `delivery_pred` first and then the pickup after `pickup_pred`. Each
    /// splice replaces one leg with two freshly routed legs.
    pub fn add_request(
        &self,
        tour: &mut Tour,
        pickup: Stop,
        delivery: Stop,
        pickup_pred: &Stop,
        delivery_pred: &Stop,
    ) -> Result<(), String> {
        if tour.ordered_travel.is_empty() {
            return Err("the tour has not been computed yet".to_string());
        }
        if pickup.role != StopRole::Pickup || delivery.role != StopRole::Delivery {
            return Err("stops to insert must be a pickup and a delivery".to_string());
        }
        if pickup.id == tour.departure.id || delivery.id == tour.departure.id {
            return Err("the tour departure cannot be a pickup or delivery point".to_string());
        }
        if pickup_pred.same_visit(&tour.departure) || delivery_pred.same_visit(&tour.departure) {
            return Err("the tour departure cannot be a predecessor".to_string());
        }

        let pickup_pred_index = tour
            .position_of(pickup_pred)
            .ok_or_else(|| "the pickup predecessor does not belong to the tour".to_string())?;
        let delivery_pred_index = tour
            .position_of(delivery_pred)
            .ok_or_else(|| "the delivery predecessor does not belong to the tour".to_string())?;
        if pickup_pred_index > delivery_pred_index {
            return Err("the pickup must be placed before the delivery".to_string());
        }

        // Route every new leg before mutating anything.
        let pred_to_delivery =
            self.single_path(&tour.ordered_travel[delivery_pred_index], &delivery)?;
        let delivery_to_succ = self.single_path(
            &delivery,
            &tour.ordered_travel[delivery_pred_index + 1],
        )?;
        let pred_to_pickup = self.single_path(&tour.ordered_travel[pickup_pred_index], &pickup)?;
        let pickup_successor = if pickup_pred_index == delivery_pred_index {
            &delivery
        } else {
            &tour.ordered_travel[pickup_pred_index + 1]
        };
        let pickup_to_succ = self.single_path(&pickup, pickup_successor)?;

        // Delivery splice first so the pickup indices stay valid.
        tour.ordered_travel[delivery_pred_index].next_leg = Some(pred_to_delivery);
        let mut delivery_stop = delivery.clone();
        delivery_stop.next_leg = Some(delivery_to_succ);
        tour.ordered_travel
            .insert(delivery_pred_index + 1, delivery_stop);

        tour.ordered_travel[pickup_pred_index].next_leg = Some(pred_to_pickup);
        let mut pickup_stop = pickup.clone();
        pickup_stop.next_leg = Some(pickup_to_succ);
        tour.ordered_travel.insert(pickup_pred_index + 1, pickup_stop);

        tour.requests.push(Request::new(pickup, delivery));
        tour.compute_arrival_times();
        log::info!(
            "request inserted, tour now visits {} stops",
            tour.ordered_travel.len()
        );
        Ok(())
    }

    /// Remove a request from a computed tour, bridging each removed stop's
    /// predecessor directly to its successor.
    pub fn delete_request(&self, tour: &mut Tour, request: &Request) -> Result<(), String> {
        let request_index = tour
            .requests
            .iter()
            .position(|r| r == request)
            .ok_or_else(|| "the stop you chose does not belong to a request".to_string())?;
        let pickup_index = tour
            .position_of(&request.pickup)
            .ok_or_else(|| "the request pickup is not in the computed tour".to_string())?;
        let delivery_index = tour
            .position_of(&request.delivery)
            .ok_or_else(|| "the request delivery is not in the computed tour".to_string())?;

        let travel = &tour.ordered_travel;
        if pickup_index == 0 || delivery_index + 1 >= travel.len() {
            return Err("the request stops are misplaced in the tour".to_string());
        }

        // Route both bridges before mutating anything.
        let delivery_bridge = self.single_path(
            &travel[delivery_index - 1],
            &travel[delivery_index + 1],
        )?;
        let pickup_successor = if pickup_index + 1 == delivery_index {
            &travel[delivery_index + 1]
        } else {
            &travel[pickup_index + 1]
        };
        let pickup_bridge = self.single_path(&travel[pickup_index - 1], pickup_successor)?;

        tour.ordered_travel[delivery_index - 1].next_leg = Some(delivery_bridge);
        tour.ordered_travel.remove(delivery_index);
        tour.ordered_travel[pickup_index - 1].next_leg = Some(pickup_bridge);
        tour.ordered_travel.remove(pickup_index);

        tour.requests.remove(request_index);
        tour.compute_arrival_times();
        log::info!(
            "request removed, tour now visits {} stops",
            tour.ordered_travel.len()
        );
        Ok(())
    }

    /// One shortest path between two stops; unreachable is an error here
    /// because mutations need every bridging leg to exist.
    fn single_path(&self, from: &Stop, to: &Stop) -> Result<Path, String> {
        let engine = ShortestPathEngine::new(self.network);
        let mut paths = engine.shortest_paths(from, std::slice::from_ref(to))?;
        paths
            .pop()
            .flatten()
            .ok_or_else(|| format!("no route from {} to {}", from.id, to.id))
    }

    /// Shortest paths between all stop pairs that can legally be adjacent:
    /// the departure only ever precedes pickups; a pickup may precede any
    /// stop but the departure; a delivery may precede anything except its
    /// own pickup, including the departure.
    fn compute_stop_paths(
        &self,
        tour: &Tour,
        stops: &[Stop],
    ) -> Result<Vec<Vec<Option<Path>>>, String> {
        let n = stops.len();
        let engine = ShortestPathEngine::new(self.network);
        let mut paths: Vec<Vec<Option<Path>>> = vec![vec![None; n]; n];

        let index_of = |stop: &Stop| -> Result<usize, String> {
            stops
                .iter()
                .position(|s| s.same_visit(stop))
                .ok_or_else(|| format!("stop {} missing from the stop list", stop.id))
        };

        // Departure reaches pickups only.
        let pickups: Vec<Stop> = tour.requests.iter().map(|r| r.pickup.clone()).collect();
        let departure_paths = engine.shortest_paths(&tour.departure, &pickups)?;
        for (target, path) in pickups.iter().zip(departure_paths) {
            paths[0][index_of(target)?] = path;
        }

        for request in &tour.requests {
            // Pickup: every stop except itself and the departure.
            let pickup_targets: Vec<Stop> = stops
                .iter()
                .filter(|s| !s.same_visit(&request.pickup) && s.role != StopRole::Departure)
                .cloned()
                .collect();
            let pickup_index = index_of(&request.pickup)?;
            let pickup_paths = engine.shortest_paths(&request.pickup, &pickup_targets)?;
            for (target, path) in pickup_targets.iter().zip(pickup_paths) {
                paths[pickup_index][index_of(target)?] = path;
            }

            // Delivery: every remaining stop plus the departure, never its
            // own pickup.
            let delivery_targets: Vec<Stop> = stops
                .iter()
                .filter(|s| !s.same_visit(&request.delivery) && !s.same_visit(&request.pickup))
                .cloned()
                .collect();
            let delivery_index = index_of(&request.delivery)?;
            let delivery_paths = engine.shortest_paths(&request.delivery, &delivery_targets)?;
            for (target, path) in delivery_targets.iter().zip(delivery_paths) {
                paths[delivery_index][index_of(target)?] = path;
            }
        }

        Ok(paths)
    }

    /// Reduce the path matrix to a dense cost matrix; -1 encodes "no
    /// computed path".
    fn generate_complete_graph(paths: &[Vec<Option<Path>>]) -> CompleteGraph {
        let n = paths.len();
        let mut cost = vec![vec![-1.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if let Some(path) = &paths[i][j] {
                    cost[i][j] = path.duration;
                }
            }
        }
        CompleteGraph::new(cost)
    }
}
