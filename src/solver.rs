//! Mixed-integer bin packing: minimize the number of ULDs needed for a
//! homogeneous batch of cargo.
//!
//! The model is the classic assignment formulation: binary `x[i][j]` puts
//! item `i` into bin `j`, binary `y[j]` opens bin `j`, weight and volume
//! capacity rows couple the two, and the objective minimizes the open
//! bins. The bin count is bounded by `ceil(1.2 * total_volume / cap) + 2`.
//!
//! Backed by the pure-Rust branch-and-bound solver behind the `good_lp`
//! facade; any backend satisfying the same contract (binary variables,
//! linear constraints, minimization) would do. A solver failure is
//! reported, never swallowed — the caller falls back to first-fit for the
//! residue.

use good_lp::{
    Expression, Solution, SolverModel, Variable, constraint, default_solver, variable, variables,
};

/// Weight and volume of one item to pack.
#[derive(Clone, Copy, Debug)]
pub struct BinItem {
    pub weight: f64,
    pub volume: f64,
}

/// Packs the items into the fewest bins honoring both capacities.
///
/// Returns one `Vec` of item indices per used bin, deterministically
/// ordered. `Err` carries the solver outcome (infeasible, unbounded, ...)
/// so the caller can fall back to a heuristic.
pub fn pack_min_bins(
    items: &[BinItem],
    cap_weight: f64,
    cap_volume: f64,
) -> Result<Vec<Vec<usize>>, String> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    if cap_weight <= 0.0 || cap_volume <= 0.0 {
        return Err("non-positive bin capacity".to_string());
    }
    // An item exceeding a single bin makes the assignment row infeasible;
    // report it up front with a better message than the solver would give.
    if let Some(i) = items
        .iter()
        .position(|it| it.weight > cap_weight || it.volume > cap_volume)
    {
        return Err(format!("item {} exceeds single-bin capacity", i));
    }

    let total_volume: f64 = items.iter().map(|it| it.volume).sum();
    let max_bins = ((1.2 * total_volume / cap_volume).ceil() as usize) + 2;

    let mut vars = variables!();
    let open: Vec<Variable> = (0..max_bins).map(|_| vars.add(variable().binary())).collect();
    let assign: Vec<Vec<Variable>> = (0..items.len())
        .map(|_| (0..max_bins).map(|_| vars.add(variable().binary())).collect())
        .collect();

    let objective: Expression = open.iter().map(|&y| Expression::from(y)).sum();
    let mut problem = vars.minimise(objective).using(default_solver);

    // each item lands in exactly one bin
    for row in &assign {
        let placed: Expression = row.iter().map(|&x| Expression::from(x)).sum();
        problem = problem.with(constraint!(placed == 1.0));
    }

    // capacity rows, active only for open bins
    for j in 0..max_bins {
        let weight_sum: Expression = items
            .iter()
            .enumerate()
            .map(|(i, it)| it.weight * assign[i][j])
            .sum();
        let volume_sum: Expression = items
            .iter()
            .enumerate()
            .map(|(i, it)| it.volume * assign[i][j])
            .sum();
        problem = problem.with(constraint!(weight_sum <= cap_weight * open[j]));
        problem = problem.with(constraint!(volume_sum <= cap_volume * open[j]));
    }

    let solution = problem.solve().map_err(|err| err.to_string())?;

    let mut bins: Vec<Vec<usize>> = Vec::new();
    for j in 0..max_bins {
        if solution.value(open[j]) < 0.5 {
            continue;
        }
        let members: Vec<usize> = (0..items.len())
            .filter(|&i| solution.value(assign[i][j]) > 0.5)
            .collect();
        if !members.is_empty() {
            bins.push(members);
        }
    }
    // solver-equivalent optima may permute bins; normalize the order
    bins.sort_by_key(|members| members[0]);
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize, weight: f64, volume: f64) -> Vec<BinItem> {
        (0..n).map(|_| BinItem { weight, volume }).collect()
    }

    #[test]
    fn empty_input_needs_no_bins() {
        assert!(pack_min_bins(&[], 100.0, 10.0).unwrap().is_empty());
    }

    #[test]
    fn volume_bound_forces_two_bins() {
        // 10 x 2 m³ against 16.15 m³ effective volume: ceil(20/16.15) = 2
        let bins = pack_min_bins(&uniform(10, 600.0, 2.0), 6684.0, 16.15).unwrap();
        assert_eq!(bins.len(), 2);
        let placed: usize = bins.iter().map(|b| b.len()).sum();
        assert_eq!(placed, 10);
        for members in &bins {
            let vol: f64 = members.iter().map(|_| 2.0).sum();
            assert!(vol <= 16.15 + 1e-6);
        }
    }

    #[test]
    fn weight_bound_forces_extra_bins() {
        // 4 x 2000 kg against 3000 kg: no bin carries two items
        let bins = pack_min_bins(&uniform(4, 2000.0, 30.0), 3000.0, 100.0).unwrap();
        assert_eq!(bins.len(), 4);
    }

    #[test]
    fn single_bin_when_everything_fits() {
        let bins = pack_min_bins(&uniform(5, 100.0, 1.0), 6684.0, 16.15).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0], vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn oversize_item_reports_instead_of_solving() {
        let items = [BinItem { weight: 9000.0, volume: 1.0 }];
        let err = pack_min_bins(&items, 6684.0, 16.15).unwrap_err();
        assert!(err.contains("exceeds single-bin capacity"));
    }

    #[test]
    fn every_item_is_assigned_exactly_once() {
        let items = [
            BinItem { weight: 3000.0, volume: 8.0 },
            BinItem { weight: 3000.0, volume: 8.0 },
            BinItem { weight: 3000.0, volume: 8.0 },
            BinItem { weight: 500.0, volume: 0.5 },
        ];
        let bins = pack_min_bins(&items, 6684.0, 16.15).unwrap();
        let mut seen: Vec<usize> = bins.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        // 3 x 8 m³ cannot pair up, so at least two bins
        assert!(bins.len() >= 2);
    }
}
