//! Road network model: intersections and directed road segments.
//!
//! The network is loaded once (from a map file) and stays immutable for the
//! rest of the process: intersections and segments are never removed.
//! Shortest-path bookkeeping lives in the routing module, not on the nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point of the road network where segments meet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intersection {
    /// Intersection identifier, unique within the network
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    /// Segments originating from this intersection (filled at load time)
    pub outgoing: Vec<Segment>,
}

impl Intersection {
    pub fn new(id: u64, latitude: f64, longitude: f64) -> Self {
        Intersection {
            id,
            latitude,
            longitude,
            outgoing: Vec::new(),
        }
    }
}

/// A directed road segment between two intersections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// Id of the intersection the segment starts from
    pub origin: u64,
    /// Id of the intersection the segment leads to
    pub destination: u64,
    /// Length in meters, non-negative
    pub length: f64,
    /// Street name
    pub name: String,
}

impl Segment {
    pub fn new(origin: u64, destination: u64, length: f64, name: &str) -> Self {
        Segment {
            origin,
            destination,
            length,
            name: name.to_string(),
        }
    }
}

/// Geographic bounding box of a network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// The static weighted directed graph of a city map.
///
/// Intersections are stored in insertion order; a side index maps external
/// ids to dense vertex indices so routing can work on plain arrays.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    intersections: Vec<Intersection>,
    index: HashMap<u64, usize>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        RoadNetwork {
            intersections: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add an intersection. Re-adding an existing id is rejected.
    pub fn add_intersection(&mut self, intersection: Intersection) -> Result<(), String> {
        if self.index.contains_key(&intersection.id) {
            return Err(format!("duplicate intersection id {}", intersection.id));
        }
        self.index.insert(intersection.id, self.intersections.len());
        self.intersections.push(intersection);
        Ok(())
    }

    /// Add a directed segment; both endpoints must already exist.
    pub fn add_segment(&mut self, segment: Segment) -> Result<(), String> {
        if segment.length < 0.0 {
            return Err(format!(
                "segment {} -> {} has negative length",
                segment.origin, segment.destination
            ));
        }
        if !self.index.contains_key(&segment.destination) {
            return Err(format!(
                "segment destination {} is not in the network",
                segment.destination
            ));
        }
        let origin = self
            .index
            .get(&segment.origin)
            .copied()
            .ok_or_else(|| format!("segment origin {} is not in the network", segment.origin))?;
        self.intersections[origin].outgoing.push(segment);
        Ok(())
    }

    /// Number of intersections.
    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    /// Dense vertex index of an intersection id, if present.
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Intersection at a dense vertex index.
    pub fn at(&self, vertex: usize) -> &Intersection {
        &self.intersections[vertex]
    }

    pub fn get(&self, id: u64) -> Option<&Intersection> {
        self.index_of(id).map(|i| &self.intersections[i])
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Bounding box over all intersections; None for an empty network.
    pub fn boundaries(&self) -> Option<Bounds> {
        let first = self.intersections.first()?;
        let mut bounds = Bounds {
            min_latitude: first.latitude,
            max_latitude: first.latitude,
            min_longitude: first.longitude,
            max_longitude: first.longitude,
        };
        for i in &self.intersections {
            bounds.min_latitude = bounds.min_latitude.min(i.latitude);
            bounds.max_latitude = bounds.max_latitude.max(i.latitude);
            bounds.min_longitude = bounds.min_longitude.min(i.longitude);
            bounds.max_longitude = bounds.max_longitude.max(i.longitude);
        }
        Some(bounds)
    }

    /// Get statistics about the network
    pub fn statistics(&self) -> NetworkStatistics {
        let num_segments: usize = self.intersections.iter().map(|i| i.outgoing.len()).sum();
        let total_length: f64 = self
            .intersections
            .iter()
            .flat_map(|i| i.outgoing.iter())
            .map(|s| s.length)
            .sum();
        let max_length = self
            .intersections
            .iter()
            .flat_map(|i| i.outgoing.iter())
            .map(|s| s.length)
            .fold(0.0, f64::max);
        let avg_length = if num_segments > 0 {
            total_length / num_segments as f64
        } else {
            0.0
        };

        NetworkStatistics {
            num_intersections: self.intersections.len(),
            num_segments,
            total_length,
            avg_segment_length: avg_length,
            max_segment_length: max_length,
            bounds: self.boundaries(),
        }
    }
}

/// Statistics about a road network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatistics {
    pub num_intersections: usize,
    pub num_segments: usize,
    pub total_length: f64,
    pub avg_segment_length: f64,
    pub max_segment_length: f64,
    pub bounds: Option<Bounds>,
}

impl std::fmt::Display for NetworkStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Network:")?;
        writeln!(f, "  Intersections: {}", self.num_intersections)?;
        writeln!(f, "  Segments: {}", self.num_segments)?;
        writeln!(f, "  Total length: {:.1} m", self.total_length)?;
        writeln!(f, "  Avg segment length: {:.1} m", self.avg_segment_length)?;
        writeln!(f, "  Max segment length: {:.1} m", self.max_segment_length)?;
        match self.bounds {
            Some(b) => writeln!(
                f,
                "  Bounds: lat [{:.6}, {:.6}], long [{:.6}, {:.6}]",
                b.min_latitude, b.max_latitude, b.min_longitude, b.max_longitude
            ),
            None => writeln!(f, "  Bounds: (empty network)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_intersection_and_segment() {
        let mut network = RoadNetwork::new();
        network
            .add_intersection(Intersection::new(1, 45.75, 4.85))
            .unwrap();
        network
            .add_intersection(Intersection::new(2, 45.76, 4.86))
            .unwrap();
        network
            .add_segment(Segment::new(1, 2, 120.0, "Rue de la Paix"))
            .unwrap();

        assert_eq!(network.len(), 2);
        assert_eq!(network.get(1).unwrap().outgoing.len(), 1);
        assert_eq!(network.get(2).unwrap().outgoing.len(), 0);
        assert_eq!(network.index_of(2), Some(1));
    }

    #[test]
    fn test_duplicate_intersection_rejected() {
        let mut network = RoadNetwork::new();
        network
            .add_intersection(Intersection::new(1, 0.0, 0.0))
            .unwrap();
        assert!(network
            .add_intersection(Intersection::new(1, 1.0, 1.0))
            .is_err());
    }

    #[test]
    fn test_segment_with_unknown_endpoint_rejected() {
        let mut network = RoadNetwork::new();
        network
            .add_intersection(Intersection::new(1, 0.0, 0.0))
            .unwrap();
        assert!(network.add_segment(Segment::new(1, 99, 50.0, "x")).is_err());
        assert!(network.add_segment(Segment::new(99, 1, 50.0, "x")).is_err());
    }

    #[test]
    fn test_boundaries() {
        let mut network = RoadNetwork::new();
        network
            .add_intersection(Intersection::new(1, 45.0, 4.0))
            .unwrap();
        network
            .add_intersection(Intersection::new(2, 46.0, 3.5))
            .unwrap();
        let bounds = network.boundaries().unwrap();
        assert_eq!(bounds.min_latitude, 45.0);
        assert_eq!(bounds.max_latitude, 46.0);
        assert_eq!(bounds.min_longitude, 3.5);
        assert_eq!(bounds.max_longitude, 4.0);
    }
}
