//! Loading networks and requests from JSON files, and exporting tours.
//!
//! The planner core has no file format of its own; these are the thin
//! collaborators that turn already-structured JSON into validated model
//! objects (ids resolved against the network, roles assigned) and write a
//! computed tour back out.

use crate::network::{Intersection, RoadNetwork, Segment};
use crate::tour::{Request, Stop, StopRole, Tour};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct NetworkFile {
    intersections: Vec<IntersectionRecord>,
    segments: Vec<SegmentRecord>,
}

#[derive(Debug, Deserialize)]
struct IntersectionRecord {
    id: u64,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct SegmentRecord {
    origin: u64,
    destination: u64,
    length: f64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RequestsFile {
    departure: DepartureRecord,
    requests: Vec<RequestRecord>,
}

#[derive(Debug, Deserialize)]
struct DepartureRecord {
    id: u64,
    /// Departure time, "HH:MM:SS"
    time: String,
}

#[derive(Debug, Deserialize)]
struct RequestRecord {
    pickup: StopRecord,
    delivery: StopRecord,
}

#[derive(Debug, Deserialize)]
struct StopRecord {
    id: u64,
    #[serde(default)]
    service_duration: f64,
}

/// Parse a road network from a JSON file.
pub fn load_network<P: AsRef<Path>>(path: P) -> Result<RoadNetwork, String> {
    let file = File::open(&path).map_err(|e| format!("Cannot open file: {}", e))?;
    let parsed: NetworkFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| format!("Invalid network file: {}", e))?;
    network_from_records(parsed)
}

/// Parse a road network from a JSON string.
pub fn parse_network(json: &str) -> Result<RoadNetwork, String> {
    let parsed: NetworkFile =
        serde_json::from_str(json).map_err(|e| format!("Invalid network file: {}", e))?;
    network_from_records(parsed)
}

fn network_from_records(parsed: NetworkFile) -> Result<RoadNetwork, String> {
    let mut network = RoadNetwork::new();
    for record in parsed.intersections {
        network.add_intersection(Intersection::new(
            record.id,
            record.latitude,
            record.longitude,
        ))?;
    }
    for record in parsed.segments {
        network.add_segment(Segment::new(
            record.origin,
            record.destination,
            record.length,
            &record.name,
        ))?;
    }
    Ok(network)
}

/// Parse a requests file into a tour skeleton, resolving every stop against
/// the network.
pub fn load_requests<P: AsRef<Path>>(path: P, network: &RoadNetwork) -> Result<Tour, String> {
    let file = File::open(&path).map_err(|e| format!("Cannot open file: {}", e))?;
    let parsed: RequestsFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Invalid requests file: {}", e))?;
    tour_from_records(parsed, network)
}

/// Parse a requests JSON string into a tour skeleton.
pub fn parse_requests(json: &str, network: &RoadNetwork) -> Result<Tour, String> {
    let parsed: RequestsFile =
        serde_json::from_str(json).map_err(|e| format!("Invalid requests file: {}", e))?;
    tour_from_records(parsed, network)
}

fn tour_from_records(parsed: RequestsFile, network: &RoadNetwork) -> Result<Tour, String> {
    let departure_time = NaiveTime::parse_from_str(&parsed.departure.time, "%H:%M:%S")
        .map_err(|e| format!("Invalid departure time {:?}: {}", parsed.departure.time, e))?;
    let departure = resolve_stop(
        network,
        parsed.departure.id,
        StopRole::Departure,
        0.0,
    )?;

    let mut requests = Vec::with_capacity(parsed.requests.len());
    for record in parsed.requests {
        if record.pickup.service_duration < 0.0 || record.delivery.service_duration < 0.0 {
            return Err("service durations must be non-negative".to_string());
        }
        let pickup = resolve_stop(
            network,
            record.pickup.id,
            StopRole::Pickup,
            record.pickup.service_duration,
        )?;
        let delivery = resolve_stop(
            network,
            record.delivery.id,
            StopRole::Delivery,
            record.delivery.service_duration,
        )?;
        requests.push(Request::new(pickup, delivery));
    }

    Ok(Tour::new(departure, departure_time, requests))
}

fn resolve_stop(
    network: &RoadNetwork,
    id: u64,
    role: StopRole,
    service_duration: f64,
) -> Result<Stop, String> {
    let intersection = network
        .get(id)
        .ok_or_else(|| format!("stop intersection {} is not in the network", id))?;
    Ok(Stop::new(
        id,
        intersection.latitude,
        intersection.longitude,
        role,
        service_duration,
    ))
}

/// Serialized view of a computed tour.
#[derive(Debug, Serialize)]
struct TourExport<'a> {
    departure_time: NaiveTime,
    arrival_time: Option<NaiveTime>,
    ordered_travel: &'a [Stop],
}

/// Write a computed tour (ordered stops with legs and arrival times) as
/// pretty-printed JSON.
pub fn export_tour<P: AsRef<Path>>(path: P, tour: &Tour) -> Result<(), String> {
    let file = File::create(&path).map_err(|e| format!("Cannot create file: {}", e))?;
    let export = TourExport {
        departure_time: tour.departure_time,
        arrival_time: tour.arrival_time,
        ordered_travel: &tour.ordered_travel,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &export)
        .map_err(|e| format!("Cannot write tour: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETWORK_JSON: &str = r#"{
        "intersections": [
            {"id": 1, "latitude": 45.75, "longitude": 4.85},
            {"id": 2, "latitude": 45.76, "longitude": 4.86},
            {"id": 3, "latitude": 45.77, "longitude": 4.87}
        ],
        "segments": [
            {"origin": 1, "destination": 2, "length": 500.0, "name": "a"},
            {"origin": 2, "destination": 3, "length": 700.0}
        ]
    }"#;

    #[test]
    fn test_parse_network() {
        let network = parse_network(NETWORK_JSON).unwrap();
        assert_eq!(network.len(), 3);
        assert_eq!(network.get(1).unwrap().outgoing.len(), 1);
        // segment name is optional
        assert_eq!(network.get(2).unwrap().outgoing[0].name, "");
    }

    #[test]
    fn test_parse_requests() {
        let network = parse_network(NETWORK_JSON).unwrap();
        let tour = parse_requests(
            r#"{
                "departure": {"id": 1, "time": "08:30:00"},
                "requests": [
                    {"pickup": {"id": 2, "service_duration": 120},
                     "delivery": {"id": 3, "service_duration": 60}}
                ]
            }"#,
            &network,
        )
        .unwrap();

        assert_eq!(tour.departure.id, 1);
        assert_eq!(tour.departure.role, StopRole::Departure);
        assert_eq!(
            tour.departure_time,
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
        assert_eq!(tour.requests.len(), 1);
        assert_eq!(tour.requests[0].pickup.service_duration, 120.0);
        assert_eq!(tour.requests[0].delivery.role, StopRole::Delivery);
        // coordinates resolved from the network
        assert_eq!(tour.requests[0].pickup.latitude, 45.76);
    }

    #[test]
    fn test_unknown_stop_id_rejected() {
        let network = parse_network(NETWORK_JSON).unwrap();
        let result = parse_requests(
            r#"{
                "departure": {"id": 99, "time": "08:30:00"},
                "requests": []
            }"#,
            &network,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_departure_time_rejected() {
        let network = parse_network(NETWORK_JSON).unwrap();
        let result = parse_requests(
            r#"{
                "departure": {"id": 1, "time": "25:99"},
                "requests": []
            }"#,
            &network,
        );
        assert!(result.is_err());
    }
}
