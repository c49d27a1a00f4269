use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pbsolver_rs::{CostVectorMap, Solver};

fn cell(row: usize, col: usize) -> String {
    format!("{row},{col}")
}

/// N-queens with one queen per row and column, at most one per diagonal
fn queens(n: usize) -> Solver {
    let mut solver = Solver::new();
    for i in 0..n {
        let row: Vec<String> = (0..n).map(|j| cell(i, j)).collect();
        let col: Vec<String> = (0..n).map(|j| cell(j, i)).collect();
        solver.exactly_one(&row).unwrap();
        solver.exactly_one(&col).unwrap();
    }
    for k in 0..2 * n - 1 {
        let rising: Vec<String> = (0..n)
            .filter_map(|r| k.checked_sub(r).filter(|&c| c < n).map(|c| cell(r, c)))
            .collect();
        let falling: Vec<String> = (0..n)
            .filter_map(|r| (r + n - 1).checked_sub(k).filter(|&c| c < n).map(|c| cell(r, c)))
            .collect();
        solver.at_most_one(&rising).unwrap();
        solver.at_most_one(&falling).unwrap();
    }
    solver
}

fn queens_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("queens");

    for n in [8usize, 16, 32] {
        group.bench_with_input(BenchmarkId::new("solve", n), &n, |b, &n| {
            b.iter(|| queens(n).solve().unwrap());
        });
    }

    // Push queens toward the top-left corner.
    for n in [8usize, 12] {
        let costs: CostVectorMap = (0..n)
            .flat_map(|r| (0..n).map(move |c| (cell(r, c), vec![(r * n + c) as i64])))
            .collect();
        group.bench_with_input(BenchmarkId::new("optimize", n), &costs, |b, costs| {
            b.iter(|| queens(n).optimize(costs).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, queens_benchmarks);
criterion_main!(benches);
