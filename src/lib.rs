//! Tour Planner Library
//!
//! Plans a single-vehicle pickup-and-delivery tour over a city road network.
//!
//! # Features
//!
//! - Road network model with directed segments and per-id lookup
//! - Multi-target Dijkstra shortest paths between tour stops
//! - Reduction of a stop set to a complete graph of travel durations
//! - Resumable branch-and-bound search with pluggable bound and
//!   ordering strategies
//! - Incremental tour edits (add / delete a request) without re-solving
//! - Undoable edit commands with a redo log
//! - Benchmarking of strategy pairs on synthetic graphs
//!
//! # Example
//!
//! ```no_run
//! use tour_planner::loader;
//! use tour_planner::planner::TourPlanner;
//!
//! let network = loader::load_network("network.json").unwrap();
//! let mut tour = loader::load_requests("requests.json", &network).unwrap();
//!
//! let planner = TourPlanner::new(&network);
//! let (status, computation) = planner.compute_tour(&mut tour, 20_000).unwrap();
//! println!("status: {:?}, stops: {}", status, tour.ordered_travel.len());
//! # let _ = computation;
//! ```

pub mod benchmark;
pub mod command;
pub mod graph;
pub mod loader;
pub mod network;
pub mod planner;
pub mod routing;
pub mod solver;
pub mod tour;

pub use graph::CompleteGraph;
pub use network::RoadNetwork;
pub use planner::TourPlanner;
pub use solver::{BranchAndBound, SearchStatus};
pub use tour::{Request, Stop, StopRole, Tour};
