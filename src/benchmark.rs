//! Benchmarking module for the tour solver.
//!
//! Runs the branch-and-bound solver over synthetic complete graphs with
//! every bound/ordering strategy combination, collects per-run records,
//! and exports results and aggregate statistics as CSV.

use crate::graph::CompleteGraph;
use crate::solver::{
    BoundStrategy, BranchAndBound, MinOutgoingBound, NaturalOrder, NearestFirst, SearchStatus,
    SuccessorStrategy, TrivialBound,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Result of one solver run on one graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverRunRecord {
    /// Strategy pair, "bound/ordering"
    pub strategy: String,
    /// Number of vertices in the graph
    pub nb_vertices: usize,
    /// Seed used to generate the graph
    pub seed: u64,
    /// Cost of the best tour found, if any
    pub cost: Option<f64>,
    /// Whether the search exhausted the tree within the budget
    pub completed: bool,
    /// Wall-clock time in seconds
    pub time: f64,
}

/// Aggregate statistics for one strategy pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyStatistics {
    pub strategy: String,
    pub num_runs: usize,
    pub num_completed: usize,
    pub avg_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Configuration for a benchmark campaign
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Graph sizes to generate
    pub sizes: Vec<usize>,
    /// Seeds, one graph per (size, seed) pair
    pub seeds: Vec<u64>,
    /// Per-run time budget in milliseconds
    pub time_limit_ms: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            sizes: vec![8, 10, 12, 14],
            seeds: vec![1, 2, 3],
            time_limit_ms: 20_000,
        }
    }
}

/// Benchmark runner
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<SolverRunRecord>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    fn strategy_pairs() -> Vec<(Box<dyn BoundStrategy>, Box<dyn SuccessorStrategy>)> {
        vec![
            (Box::new(TrivialBound), Box::new(NaturalOrder)),
            (Box::new(TrivialBound), Box::new(NearestFirst)),
            (Box::new(MinOutgoingBound), Box::new(NaturalOrder)),
            (Box::new(MinOutgoingBound), Box::new(NearestFirst)),
        ]
    }

    /// Run every strategy pair on one graph
    pub fn run_on_graph(&mut self, graph: &CompleteGraph, seed: u64) -> Result<(), String> {
        for (bound, order) in Self::strategy_pairs() {
            let strategy = format!("{}/{}", bound.name(), order.name());
            log::info!(
                "running {} on graph n={} seed={}",
                strategy,
                graph.nb_vertices(),
                seed
            );

            let mut solver = BranchAndBound::new(bound, order);
            let start = Instant::now();
            let status = solver.search_solution(self.config.time_limit_ms, graph)?;
            let elapsed = start.elapsed().as_secs_f64();

            self.results.push(SolverRunRecord {
                strategy,
                nb_vertices: graph.nb_vertices(),
                seed,
                cost: solver.solution_cost(),
                completed: status == SearchStatus::Done,
                time: elapsed,
            });
        }
        Ok(())
    }

    /// Run the full campaign: one seeded graph per (size, seed) pair
    pub fn run_campaign(&mut self) -> Result<(), String> {
        for &size in &self.config.sizes.clone() {
            for &seed in &self.config.seeds.clone() {
                let graph = CompleteGraph::seeded(size, seed);
                self.run_on_graph(&graph, seed)?;
            }
        }
        Ok(())
    }

    /// Compute per-strategy statistics over runs that found a tour
    pub fn compute_statistics(&self) -> Vec<StrategyStatistics> {
        let mut by_strategy: HashMap<String, Vec<&SolverRunRecord>> = HashMap::new();
        for record in &self.results {
            by_strategy
                .entry(record.strategy.clone())
                .or_insert_with(Vec::new)
                .push(record);
        }

        let mut statistics = Vec::new();
        for (strategy, records) in by_strategy {
            let solved: Vec<_> = records.iter().filter(|r| r.cost.is_some()).collect();
            if solved.is_empty() {
                continue;
            }

            let costs: Vec<f64> = solved.iter().filter_map(|r| r.cost).collect();
            let times: Vec<f64> = solved.iter().map(|r| r.time).collect();

            let avg_cost = costs.iter().sum::<f64>() / costs.len() as f64;
            let best_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            let worst_cost = costs.iter().cloned().fold(0.0, f64::max);
            let avg_time = times.iter().sum::<f64>() / times.len() as f64;
            let total_time = times.iter().sum::<f64>();

            statistics.push(StrategyStatistics {
                strategy,
                num_runs: records.len(),
                num_completed: records.iter().filter(|r| r.completed).count(),
                avg_cost,
                best_cost,
                worst_cost,
                avg_time,
                total_time,
            });
        }

        statistics.sort_by(|a, b| a.avg_time.partial_cmp(&b.avg_time).unwrap());
        statistics
    }

    /// Export raw run records to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export aggregate statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate a plain-text summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       Solver Benchmark Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!("Total runs: {}\n\n", self.results.len()));

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<28} runs: {:>3}  completed: {:>3}  avg cost: {:>8.1}  avg time: {:>7.3}s\n",
                stat.strategy, stat.num_runs, stat.num_completed, stat.avg_cost, stat.avg_time
            ));
        }

        report
    }

    pub fn results(&self) -> &[SolverRunRecord] {
        &self.results
    }
}
