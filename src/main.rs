//! Tour Planner - Command Line Interface
//!
//! Computes an optimized pickup-and-delivery tour over a city road network.

use clap::{Parser, Subcommand, ValueEnum};
use tour_planner::benchmark::{Benchmark, BenchmarkConfig};
use tour_planner::loader;
use tour_planner::planner::{TourPlanner, DEFAULT_TIME_LIMIT_MS};
use tour_planner::solver::SearchStatus;

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "tour-planner")]
#[command(version = "1.0")]
#[command(about = "Single-vehicle pickup-and-delivery tour planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a tour for a requests file over a network
    Solve {
        /// Path to the network JSON file
        #[arg(short, long)]
        network: PathBuf,

        /// Path to the requests JSON file
        #[arg(short, long)]
        requests: PathBuf,

        /// Search budget in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_TIME_LIMIT_MS)]
        time_limit: u64,

        /// What to do when the budget runs out before the search finishes
        #[arg(long, value_enum, default_value = "accept")]
        on_timeout: TimeoutPolicy,

        /// Write the computed tour as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print statistics about a network file
    Analyze {
        /// Path to the network JSON file
        #[arg(short, long)]
        network: PathBuf,
    },

    /// Benchmark solver strategies on synthetic graphs
    Bench {
        /// Graph sizes, comma separated
        #[arg(short, long, value_delimiter = ',', default_values_t = vec![8, 10, 12, 14])]
        sizes: Vec<usize>,

        /// Seeds, one graph per (size, seed) pair
        #[arg(long, value_delimiter = ',', default_values_t = vec![1, 2, 3])]
        seeds: Vec<u64>,

        /// Per-run budget in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_TIME_LIMIT_MS)]
        time_limit: u64,

        /// Output CSV file for raw run records
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum TimeoutPolicy {
    /// Keep the best tour found within the budget
    Accept,
    /// Keep granting the same budget until the search finishes
    Continue,
    /// Exit with an error
    Abort,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            network,
            requests,
            time_limit,
            on_timeout,
            output,
            verbose,
        } => {
            solve(&network, &requests, time_limit, on_timeout, output, verbose);
        }

        Commands::Analyze { network } => {
            analyze(&network);
        }

        Commands::Bench {
            sizes,
            seeds,
            time_limit,
            output,
        } => {
            bench(sizes, seeds, time_limit, output);
        }
    }
}

fn solve(
    network_path: &PathBuf,
    requests_path: &PathBuf,
    time_limit: u64,
    on_timeout: TimeoutPolicy,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading network from {:?}...", network_path);
    let network = match loader::load_network(network_path) {
        Ok(network) => network,
        Err(e) => {
            eprintln!("Error loading network: {}", e);
            std::process::exit(1);
        }
    };

    let mut tour = match loader::load_requests(requests_path, &network) {
        Ok(tour) => tour,
        Err(e) => {
            eprintln!("Error loading requests: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        println!("{}", network.statistics());
        println!("Requests: {}", tour.requests.len());
    }

    let planner = TourPlanner::new(&network);
    let start = Instant::now();

    let result = planner.compute_tour(&mut tour, time_limit).and_then(
        |(mut status, computation)| match computation {
            None => Ok(()),
            Some(mut computation) => {
                if status == SearchStatus::TimedOut {
                    match on_timeout {
                        TimeoutPolicy::Abort => {
                            return Err(format!(
                                "search did not finish within {} ms",
                                time_limit
                            ));
                        }
                        TimeoutPolicy::Accept => {
                            println!("Budget exhausted, keeping the best tour found so far");
                        }
                        TimeoutPolicy::Continue => {
                            while status == SearchStatus::TimedOut {
                                println!("Budget exhausted, continuing the search...");
                                status = planner.continue_tour(&mut computation, time_limit)?;
                            }
                        }
                    }
                }
                planner.save_solution(&mut tour, &computation)
            }
        },
    );

    if let Err(e) = result {
        eprintln!("Error computing tour: {}", e);
        std::process::exit(1);
    }

    println!("Computed in {:.3}s", start.elapsed().as_secs_f64());
    println!("Tour ({} stops):", tour.ordered_travel.len());
    for stop in &tour.ordered_travel {
        let leg = stop
            .next_leg
            .as_ref()
            .map(|p| format!("{:.0}s over {:.0}m", p.duration, p.length()))
            .unwrap_or_else(|| "end".to_string());
        match stop.arrival_time {
            Some(t) => println!("  {:>10} {:?} at {}  next leg: {}", stop.id, stop.role, t, leg),
            None => println!("  {:>10} {:?}  next leg: {}", stop.id, stop.role, leg),
        }
    }
    if let Some(arrival) = tour.arrival_time {
        println!("Back at departure: {}", arrival);
    }

    if let Some(path) = output {
        if let Err(e) = loader::export_tour(&path, &tour) {
            eprintln!("Error writing tour: {}", e);
            std::process::exit(1);
        }
        println!("Tour written to {:?}", path);
    }
}

fn analyze(network_path: &PathBuf) {
    let network = match loader::load_network(network_path) {
        Ok(network) => network,
        Err(e) => {
            eprintln!("Error loading network: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", network.statistics());
}

fn bench(sizes: Vec<usize>, seeds: Vec<u64>, time_limit: u64, output: Option<PathBuf>) {
    let mut benchmark = Benchmark::new(BenchmarkConfig {
        sizes,
        seeds,
        time_limit_ms: time_limit,
    });

    if let Err(e) = benchmark.run_campaign() {
        eprintln!("Error running benchmark: {}", e);
        std::process::exit(1);
    }

    println!("{}", benchmark.generate_report());

    if let Some(path) = output {
        if let Err(e) = benchmark.export_to_csv(&path) {
            eprintln!("Error writing results: {}", e);
            std::process::exit(1);
        }
        println!("Results written to {:?}", path);
    }
}
