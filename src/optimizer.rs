//! Multi-objective factor weight search (NSGA-II).
//!
//! Objectives, all minimized: negative CAGR, negative Sharpe (CAGR over
//! volatility, both in percent) and volatility. Weights live in [0, 1] and are
//! normalized to sum to one before a backtest is run.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::{BacktestError, Result};
use crate::factors::Factor;
use crate::market::MarketData;
use crate::normalize::sample_std;
use crate::rebalance::{normalize_weights, rebalance_portfolio_weighted, RebalanceOptions};

pub type Objectives = [f64; 3];

/// Fitness assigned to weights that cannot be evaluated
pub const PENALTY: Objectives = [1e6, 1e6, 1e6];

const BLX_ALPHA: f64 = 0.5;
const CROSSOVER_PROB: f64 = 0.9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            generations: 50,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
struct Individual {
    genes: Vec<f64>,
    objectives: Objectives,
    rank: usize,
    crowding: f64,
}

/// True when `a` is no worse in every objective and better in at least one
pub fn dominates(a: &Objectives, b: &Objectives) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y) && a.iter().zip(b).any(|(x, y)| x < y)
}

/// Indices grouped into successive non-dominated fronts
pub fn non_dominated_sort(objectives: &[Objectives]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];

    for p in 0..n {
        for q in 0..n {
            if p == q {
                continue;
            }
            if dominates(&objectives[p], &objectives[q]) {
                dominated_by[p].push(q);
            } else if dominates(&objectives[q], &objectives[p]) {
                domination_count[p] += 1;
            }
        }
        if domination_count[p] == 0 {
            fronts[0].push(p);
        }
    }

    let mut i = 0;
    while i < fronts.len() && !fronts[i].is_empty() {
        let mut next = Vec::new();
        for &p in &fronts[i] {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        i += 1;
        if !next.is_empty() {
            fronts.push(next);
        }
    }
    fronts.retain(|f| !f.is_empty());
    fronts
}

/// Crowding distance of each member of one front, in front order
pub fn crowding_distance(objectives: &[Objectives], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    let mut distance = vec![0.0; n];
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    for m in 0..3 {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| objectives[front[a]][m].total_cmp(&objectives[front[b]][m]));
        let min = objectives[front[order[0]]][m];
        let max = objectives[front[order[n - 1]]][m];
        distance[order[0]] = f64::INFINITY;
        distance[order[n - 1]] = f64::INFINITY;
        if max > min {
            for k in 1..n - 1 {
                let prev = objectives[front[order[k - 1]]][m];
                let next = objectives[front[order[k + 1]]][m];
                distance[order[k]] += (next - prev) / (max - min);
            }
        }
    }
    distance
}

fn assign_rank_and_crowding(pop: &mut [Individual]) {
    let objectives: Vec<Objectives> = pop.iter().map(|i| i.objectives).collect();
    for (rank, front) in non_dominated_sort(&objectives).iter().enumerate() {
        let crowd = crowding_distance(&objectives, front);
        for (&idx, d) in front.iter().zip(crowd) {
            pop[idx].rank = rank;
            pop[idx].crowding = d;
        }
    }
}

fn crowded_cmp(a: &Individual, b: &Individual) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| b.crowding.total_cmp(&a.crowding))
}

fn tournament<'a>(pop: &'a [Individual], rng: &mut StdRng) -> &'a Individual {
    let a = &pop[rng.random_range(0..pop.len())];
    let b = &pop[rng.random_range(0..pop.len())];
    if crowded_cmp(a, b) == Ordering::Greater {
        b
    } else {
        a
    }
}

/// Blend crossover followed by uniform reset mutation, bounded to [0, 1]
fn make_child(p1: &[f64], p2: &[f64], rng: &mut StdRng) -> Vec<f64> {
    let n = p1.len();
    let mutation_prob = 1.0 / n.max(1) as f64;
    let cross = rng.random_bool(CROSSOVER_PROB);
    p1.iter()
        .zip(p2)
        .map(|(&a, &b)| {
            let mut gene = if cross {
                let lo = a.min(b);
                let hi = a.max(b);
                let span = hi - lo;
                let low = lo - BLX_ALPHA * span;
                let high = hi + BLX_ALPHA * span;
                low + rng.random::<f64>() * (high - low)
            } else {
                a
            };
            if rng.random_bool(mutation_prob) {
                gene = rng.random::<f64>();
            }
            gene.clamp(0.0, 1.0)
        })
        .collect()
}

/// Run NSGA-II over `n_vars` genes in [0, 1] and return the first front
/// as (genes, objectives) pairs
pub fn nsga2<F>(n_vars: usize, config: &OptimizerConfig, evaluate: F) -> Vec<(Vec<f64>, Objectives)>
where
    F: Fn(&[f64]) -> Objectives + Sync,
{
    let size = config.population_size.max(2);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let genes: Vec<Vec<f64>> = (0..size)
        .map(|_| (0..n_vars).map(|_| rng.random::<f64>()).collect())
        .collect();
    let mut pop: Vec<Individual> = genes
        .into_par_iter()
        .map(|g| {
            let objectives = evaluate(&g);
            Individual {
                genes: g,
                objectives,
                rank: 0,
                crowding: 0.0,
            }
        })
        .collect();
    assign_rank_and_crowding(&mut pop);

    for generation in 0..config.generations {
        let children: Vec<Vec<f64>> = (0..size)
            .map(|_| {
                let p1 = tournament(&pop, &mut rng).genes.clone();
                let p2 = tournament(&pop, &mut rng).genes.clone();
                make_child(&p1, &p2, &mut rng)
            })
            .collect();
        let offspring: Vec<Individual> = children
            .into_par_iter()
            .map(|g| {
                let objectives = evaluate(&g);
                Individual {
                    genes: g,
                    objectives,
                    rank: 0,
                    crowding: 0.0,
                }
            })
            .collect();

        let mut combined = pop;
        combined.extend(offspring);
        assign_rank_and_crowding(&mut combined);
        combined.sort_by(crowded_cmp);
        combined.truncate(size);
        pop = combined;
        // ranks of survivors must be recomputed against each other
        assign_rank_and_crowding(&mut pop);

        debug!(
            "Generation {}: front size {}",
            generation + 1,
            pop.iter().filter(|i| i.rank == 0).count()
        );
    }

    pop.into_iter()
        .filter(|i| i.rank == 0)
        .map(|i| (i.genes, i.objectives))
        .collect()
}

// ============================================================================
// FACTOR WEIGHTS
// ============================================================================

/// Backtest `weights` and score it. Returns [`PENALTY`] for all-zero weights
/// or a failed run.
pub fn evaluate_factor_weights(
    weights: &[f64],
    data: &MarketData,
    factors: &[Factor],
    start_year: i32,
    end_year: i32,
    initial_aum: f64,
    options: &RebalanceOptions,
) -> Objectives {
    let total: f64 = weights.iter().map(|w| w.abs()).sum();
    if total == 0.0 || !total.is_finite() {
        return PENALTY;
    }
    let weights = normalize_weights(weights);

    let result = match rebalance_portfolio_weighted(
        data,
        factors,
        &weights,
        start_year,
        end_year,
        initial_aum,
        options,
    ) {
        Ok(r) => r,
        Err(e) => {
            debug!("Weight evaluation failed: {}", e);
            return PENALTY;
        }
    };

    let years = result.yearly_returns.len();
    let first = result.portfolio_values.first().copied().unwrap_or(0.0);
    let cagr = if years > 0 && first > 0.0 {
        ((result.final_value / first).powf(1.0 / years as f64) - 1.0) * 100.0
    } else {
        0.0
    };
    let volatility = sample_std(&result.yearly_returns)
        .map(|s| s * 100.0)
        .unwrap_or(0.0);
    let sharpe = if volatility > 0.0 { cagr / volatility } else { 0.0 };

    [-cagr, -sharpe, volatility]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParetoSolution {
    pub weights: Vec<f64>,
    pub weight_map: Vec<(Factor, f64)>,
    pub cagr: f64,
    pub sharpe: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub pareto_front: Vec<ParetoSolution>,
    pub best_weights: Vec<f64>,
}

/// Search for Pareto-optimal factor weights; the best solution is the one
/// with the highest Sharpe ratio
pub fn optimize_factor_weights(
    data: &MarketData,
    factors: &[Factor],
    start_year: i32,
    end_year: i32,
    initial_aum: f64,
    config: &OptimizerConfig,
    options: &RebalanceOptions,
) -> Result<OptimizationResult> {
    if factors.is_empty() {
        return Err(BacktestError::Config("At least one factor is required".to_string()));
    }
    info!(
        "Optimizing {} factors over {} generations (population {})",
        factors.len(),
        config.generations,
        config.population_size
    );

    let front = nsga2(factors.len(), config, |w| {
        evaluate_factor_weights(w, data, factors, start_year, end_year, initial_aum, options)
    });

    let pareto_front: Vec<ParetoSolution> = front
        .into_iter()
        .filter(|(_, obj)| *obj != PENALTY)
        .map(|(genes, obj)| {
            let weights = normalize_weights(&genes);
            ParetoSolution {
                weight_map: factors.iter().copied().zip(weights.iter().copied()).collect(),
                weights,
                cagr: -obj[0],
                sharpe: -obj[1],
                volatility: obj[2],
            }
        })
        .collect();
    info!("Optimization complete. Pareto front size: {}", pareto_front.len());

    let best_weights = pareto_front
        .iter()
        .max_by(|a, b| a.sharpe.total_cmp(&b.sharpe))
        .map(|s| s.weights.clone())
        .unwrap_or_else(|| vec![1.0 / factors.len() as f64; factors.len()]);

    Ok(OptimizationResult {
        pareto_front,
        best_weights,
    })
}
