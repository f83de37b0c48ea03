//! Multi-target shortest paths over the road network.
//!
//! The engine runs a single-source Dijkstra that stops as soon as every
//! requested target is settled, then rebuilds one concrete `Path` per
//! target. All search state (distances, predecessors, visit colors) is
//! allocated per call, so the engine never mutates the network and can be
//! shared freely.

use crate::network::{RoadNetwork, Segment};
use crate::tour::Stop;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Average vehicle speed used to convert distances into travel times.
pub const SPEED_METERS_PER_HOUR: f64 = 15_000.0;

/// Seconds needed to travel a distance in meters at the fixed speed.
#[inline]
pub fn travel_seconds(distance_meters: f64) -> f64 {
    distance_meters * (3600.0 / SPEED_METERS_PER_HOUR)
}

/// A concrete route between two stops: consecutive segments plus the travel
/// time derived from their cumulative length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Intersection id the path starts from
    pub departure: u64,
    /// Intersection id the path leads to
    pub arrival: u64,
    /// Consecutive segments: segments[i].destination == segments[i+1].origin
    pub segments: Vec<Segment>,
    /// Travel time in seconds
    pub duration: f64,
}

impl Path {
    /// Total length in meters.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }
}

/// Visit state of an intersection during one Dijkstra run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Frontier,
    Settled,
}

/// Single-source, multi-target Dijkstra over a road network.
pub struct ShortestPathEngine<'a> {
    network: &'a RoadNetwork,
}

impl<'a> ShortestPathEngine<'a> {
    pub fn new(network: &'a RoadNetwork) -> Self {
        ShortestPathEngine { network }
    }

    /// Compute the shortest path from `source` to each stop of `targets`.
    ///
    /// Returns one entry per target, in target order: `Some(path)` when a
    /// route exists (empty path with duration 0 when the target shares the
    /// source's intersection), `None` when the target is unreachable.
    /// A source or target located on an unknown intersection is a
    /// precondition violation and rejects the whole call.
    pub fn shortest_paths(
        &self,
        source: &Stop,
        targets: &[Stop],
    ) -> Result<Vec<Option<Path>>, String> {
        let n = self.network.len();
        let src = self
            .network
            .index_of(source.id)
            .ok_or_else(|| format!("source intersection {} is not in the network", source.id))?;

        let mut is_target = vec![false; n];
        let mut target_indices = Vec::with_capacity(targets.len());
        for target in targets {
            let idx = self.network.index_of(target.id).ok_or_else(|| {
                format!("target intersection {} is not in the network", target.id)
            })?;
            if !is_target[idx] {
                is_target[idx] = true;
            }
            target_indices.push(idx);
        }
        let mut unsettled_targets = is_target.iter().filter(|&&t| t).count();

        // Per-call search state; nothing is stored on the intersections.
        let mut dist = vec![f64::INFINITY; n];
        let mut state = vec![VisitState::Unvisited; n];
        // pred[v] = (vertex we came from, index of the segment taken)
        let mut pred: Vec<Option<(usize, usize)>> = vec![None; n];

        dist[src] = 0.0;
        state[src] = VisitState::Frontier;

        // Min-heap on (distance, vertex index); the index makes ties
        // deterministic. Stale entries are skipped on pop.
        let mut frontier: BinaryHeap<Reverse<(OrderedFloat<f64>, usize)>> = BinaryHeap::new();
        frontier.push(Reverse((OrderedFloat(0.0), src)));

        while let Some(Reverse((d, u))) = frontier.pop() {
            if state[u] == VisitState::Settled {
                continue;
            }
            state[u] = VisitState::Settled;
            if is_target[u] {
                unsettled_targets -= 1;
                if unsettled_targets == 0 {
                    break;
                }
            }

            for (seg_idx, segment) in self.network.at(u).outgoing.iter().enumerate() {
                let v = self.network.index_of(segment.destination).ok_or_else(|| {
                    format!(
                        "segment destination {} is not in the network",
                        segment.destination
                    )
                })?;
                if state[v] == VisitState::Settled {
                    continue;
                }
                let relaxed = d.0 + segment.length;
                if relaxed < dist[v] {
                    dist[v] = relaxed;
                    pred[v] = Some((u, seg_idx));
                    state[v] = VisitState::Frontier;
                    frontier.push(Reverse((OrderedFloat(relaxed), v)));
                }
            }
        }

        let paths = target_indices
            .iter()
            .zip(targets)
            .map(|(&idx, target)| self.reconstruct(source.id, target.id, idx, src, &dist, &pred))
            .collect();
        Ok(paths)
    }

    /// Walk predecessors back from a settled target, prepending segments.
    fn reconstruct(
        &self,
        source_id: u64,
        target_id: u64,
        target: usize,
        src: usize,
        dist: &[f64],
        pred: &[Option<(usize, usize)>],
    ) -> Option<Path> {
        if target != src && dist[target].is_infinite() {
            return None;
        }
        let mut segments = Vec::new();
        let mut current = target;
        while current != src {
            let (previous, seg_idx) = pred[current]?;
            segments.push(self.network.at(previous).outgoing[seg_idx].clone());
            current = previous;
        }
        segments.reverse();
        Some(Path {
            departure: source_id,
            arrival: target_id,
            segments,
            duration: travel_seconds(dist[target]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Intersection, RoadNetwork, Segment};
    use crate::tour::{Stop, StopRole};

    fn stop(id: u64, role: StopRole) -> Stop {
        Stop::new(id, 0.0, 0.0, role, 0.0)
    }

    /// 1 -> 2 -> 3 plus a direct long edge 1 -> 3, and an isolated vertex 4.
    fn create_test_network() -> RoadNetwork {
        let mut network = RoadNetwork::new();
        for id in 1..=4 {
            network
                .add_intersection(Intersection::new(id, id as f64, 0.0))
                .unwrap();
        }
        network.add_segment(Segment::new(1, 2, 1000.0, "a")).unwrap();
        network.add_segment(Segment::new(2, 3, 1000.0, "b")).unwrap();
        network.add_segment(Segment::new(1, 3, 5000.0, "c")).unwrap();
        network
    }

    #[test]
    fn test_shortest_path_prefers_cheaper_detour() {
        let network = create_test_network();
        let engine = ShortestPathEngine::new(&network);
        let paths = engine
            .shortest_paths(&stop(1, StopRole::Departure), &[stop(3, StopRole::Delivery)])
            .unwrap();

        let path = paths[0].as_ref().unwrap();
        // 2000 m via vertex 2 beats the 5000 m direct edge
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.length(), 2000.0);
        assert_eq!(path.duration, travel_seconds(2000.0));
        assert_eq!(path.departure, 1);
        assert_eq!(path.arrival, 3);
        // segments form a contiguous chain
        for w in path.segments.windows(2) {
            assert_eq!(w[0].destination, w[1].origin);
        }
    }

    #[test]
    fn test_duration_uses_fixed_speed() {
        // 15 000 m at 15 000 m/h is exactly one hour
        assert_eq!(travel_seconds(15_000.0), 3600.0);
        assert_eq!(travel_seconds(1000.0), 240.0);
    }

    #[test]
    fn test_paths_returned_in_target_order() {
        let network = create_test_network();
        let engine = ShortestPathEngine::new(&network);
        let paths = engine
            .shortest_paths(
                &stop(1, StopRole::Departure),
                &[stop(3, StopRole::Delivery), stop(2, StopRole::Pickup)],
            )
            .unwrap();
        assert_eq!(paths[0].as_ref().unwrap().arrival, 3);
        assert_eq!(paths[1].as_ref().unwrap().arrival, 2);
    }

    #[test]
    fn test_unreachable_target_is_none() {
        let network = create_test_network();
        let engine = ShortestPathEngine::new(&network);
        let paths = engine
            .shortest_paths(&stop(1, StopRole::Departure), &[stop(4, StopRole::Delivery)])
            .unwrap();
        assert!(paths[0].is_none());
    }

    #[test]
    fn test_target_equal_to_source_is_empty_path() {
        let network = create_test_network();
        let engine = ShortestPathEngine::new(&network);
        let paths = engine
            .shortest_paths(&stop(1, StopRole::Departure), &[stop(1, StopRole::Departure)])
            .unwrap();
        let path = paths[0].as_ref().unwrap();
        assert!(path.segments.is_empty());
        assert_eq!(path.duration, 0.0);
    }

    #[test]
    fn test_unknown_stop_rejected() {
        let network = create_test_network();
        let engine = ShortestPathEngine::new(&network);
        assert!(engine
            .shortest_paths(&stop(99, StopRole::Departure), &[stop(2, StopRole::Pickup)])
            .is_err());
        assert!(engine
            .shortest_paths(&stop(1, StopRole::Departure), &[stop(99, StopRole::Pickup)])
            .is_err());
    }
}
