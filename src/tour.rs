//! Tour model: stops, pickup/delivery requests and the ordered travel.
//!
//! A `Stop` is a view over an intersection for a specific role (departure,
//! pickup or delivery). The tour's `ordered_travel` holds the stops in
//! visiting order, each carrying the leg to reach its successor and the
//! arrival time once the schedule has been computed.

use crate::routing::Path;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// The role a stop plays in the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopRole {
    Departure,
    Pickup,
    Delivery,
}

/// A location visited by the vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    /// Id of the intersection the stop is located on
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub role: StopRole,
    /// Time in seconds spent servicing this stop
    pub service_duration: f64,
    /// Set by the schedule computation, None until then
    pub arrival_time: Option<NaiveTime>,
    /// Leg to travel to reach the next stop of the tour
    pub next_leg: Option<Path>,
}

impl Stop {
    pub fn new(id: u64, latitude: f64, longitude: f64, role: StopRole, service_duration: f64) -> Self {
        Stop {
            id,
            latitude,
            longitude,
            role,
            service_duration,
            arrival_time: None,
            next_leg: None,
        }
    }

    /// Two stops denote the same visit when they share location and role.
    pub fn same_visit(&self, other: &Stop) -> bool {
        self.id == other.id && self.role == other.role
    }
}

/// A transport request: pick goods up at one stop, deliver them at another.
///
/// In any valid tour the pickup is visited strictly before the delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub pickup: Stop,
    pub delivery: Stop,
}

impl Request {
    pub fn new(pickup: Stop, delivery: Stop) -> Self {
        Request { pickup, delivery }
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.pickup.id == other.pickup.id && self.delivery.id == other.delivery.id
    }
}

/// A single-vehicle delivery tour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    /// Fixed start and end location of the tour
    pub departure: Stop,
    pub departure_time: NaiveTime,
    /// Set once arrival times have been propagated
    pub arrival_time: Option<NaiveTime>,
    pub requests: Vec<Request>,
    /// Stops in visiting order; the departure opens the travel and is
    /// repeated at the end to close the loop
    pub ordered_travel: Vec<Stop>,
}

impl Tour {
    pub fn new(departure: Stop, departure_time: NaiveTime, requests: Vec<Request>) -> Self {
        Tour {
            departure,
            departure_time,
            arrival_time: None,
            requests,
            ordered_travel: Vec::new(),
        }
    }

    /// Position of a stop (same intersection and role) in the ordered travel.
    pub fn position_of(&self, stop: &Stop) -> Option<usize> {
        self.ordered_travel.iter().position(|s| s.same_visit(stop))
    }

    /// Propagate arrival times along the ordered travel.
    ///
    /// Starting from the departure time, each leg advances the clock by its
    /// travel duration plus the service duration at the stop just left
    /// (durations truncated to whole seconds). Must be re-run after every
    /// structural change to the ordered travel.
    pub fn compute_arrival_times(&mut self) {
        let mut clock = self.departure_time;
        for i in 1..self.ordered_travel.len() {
            let previous = &self.ordered_travel[i - 1];
            let travel = previous
                .next_leg
                .as_ref()
                .map(|leg| leg.duration as i64)
                .unwrap_or(0);
            let service = previous.service_duration as i64;
            clock += Duration::seconds(travel + service);
            self.ordered_travel[i].arrival_time = Some(clock);
        }
        self.arrival_time = Some(clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Path;

    fn stop(id: u64, role: StopRole, service: f64) -> Stop {
        Stop::new(id, 0.0, 0.0, role, service)
    }

    fn leg(from: u64, to: u64, duration: f64) -> Path {
        Path {
            departure: from,
            arrival: to,
            segments: Vec::new(),
            duration,
        }
    }

    #[test]
    fn test_arrival_time_propagation() {
        let departure_time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let mut departure = stop(1, StopRole::Departure, 0.0);
        departure.next_leg = Some(leg(1, 2, 240.0));
        let mut pickup = stop(2, StopRole::Pickup, 120.0);
        pickup.next_leg = Some(leg(2, 3, 300.0));
        let mut delivery = stop(3, StopRole::Delivery, 60.0);
        delivery.next_leg = Some(leg(3, 1, 480.0));
        let closing = stop(1, StopRole::Departure, 0.0);

        let mut tour = Tour::new(departure.clone(), departure_time, Vec::new());
        tour.ordered_travel = vec![departure, pickup, delivery, closing];
        tour.compute_arrival_times();

        assert_eq!(
            tour.ordered_travel[1].arrival_time,
            Some(NaiveTime::from_hms_opt(8, 4, 0).unwrap())
        );
        // 240 + 0 + 300 + 120 = 660 seconds after departure
        assert_eq!(
            tour.ordered_travel[2].arrival_time,
            Some(NaiveTime::from_hms_opt(8, 11, 0).unwrap())
        );
        // plus 480 + 60 = 1200 seconds after departure
        assert_eq!(
            tour.ordered_travel[3].arrival_time,
            Some(NaiveTime::from_hms_opt(8, 20, 0).unwrap())
        );
        assert_eq!(tour.arrival_time, tour.ordered_travel[3].arrival_time);
    }

    #[test]
    fn test_durations_truncated_to_whole_seconds() {
        let departure_time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let mut departure = stop(1, StopRole::Departure, 0.0);
        departure.next_leg = Some(leg(1, 2, 59.9));
        let arrival = stop(2, StopRole::Pickup, 0.0);

        let mut tour = Tour::new(departure.clone(), departure_time, Vec::new());
        tour.ordered_travel = vec![departure, arrival];
        tour.compute_arrival_times();

        assert_eq!(
            tour.ordered_travel[1].arrival_time,
            Some(NaiveTime::from_hms_opt(8, 0, 59).unwrap())
        );
    }

    #[test]
    fn test_position_of_matches_role() {
        let departure_time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let departure = stop(1, StopRole::Departure, 0.0);
        let mut tour = Tour::new(departure.clone(), departure_time, Vec::new());
        // pickup and delivery sharing an intersection are distinct visits
        tour.ordered_travel = vec![
            departure,
            stop(2, StopRole::Pickup, 0.0),
            stop(2, StopRole::Delivery, 0.0),
        ];
        assert_eq!(tour.position_of(&stop(2, StopRole::Delivery, 0.0)), Some(2));
        assert_eq!(tour.position_of(&stop(2, StopRole::Pickup, 0.0)), Some(1));
        assert_eq!(tour.position_of(&stop(9, StopRole::Pickup, 0.0)), None);
    }
}
