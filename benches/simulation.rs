use cascader::{
    optimal_joint_score, run_simulation, Algorithm, CandidateSet, ClickModel, EliminationRule,
    JointSpace, SimConfig, Tracker,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_simulation");
    for &n_arms in &[4usize, 16usize, 64usize] {
        // A deterministic, slightly-non-uniform probability pattern.
        let p: Vec<f64> = (0..n_arms)
            .map(|i| (((i as u64) * 37 + 11) % 97) as f64 / 100.0)
            .collect();

        for algorithm in [
            Algorithm::Ucb,
            Algorithm::SharedElimination,
            Algorithm::PhasedElimination,
            Algorithm::LambdaSchedule,
        ] {
            let cfg = SimConfig::default().with_algorithm(algorithm).with_seed(123);
            group.bench_with_input(
                BenchmarkId::new(format!("{algorithm:?}"), n_arms),
                &n_arms,
                |b, &n| {
                    b.iter(|| {
                        let tr = run_simulation(1000, n, 2, 1, black_box(&p), &cfg).unwrap();
                        black_box(tr);
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_elimination(c: &mut Criterion) {
    let mut group = c.benchmark_group("eliminate");
    for &n in &[32usize, 256usize, 2048usize] {
        let mut tr = Tracker::new(n, 1.5);
        for i in 0..n {
            for j in 0..50 {
                tr.observe(i, if (i * 7 + j) % 10 < i % 10 { 1.0 } else { 0.0 });
            }
        }
        for rule in [EliminationRule::BestLcb, EliminationRule::KDominated] {
            group.bench_with_input(BenchmarkId::new(format!("{rule:?}"), n), &n, |b, &n| {
                b.iter(|| {
                    let mut set = CandidateSet::new(n, 4).unwrap();
                    let e = set.eliminate(black_box(&tr), 5000, rule);
                    black_box(e);
                })
            });
        }
    }
    group.finish();
}

fn bench_joint_oracle(c: &mut Criterion) {
    let model = ClickModel::new(vec![0.8, 0.6, 0.4, 0.3, 0.2, 0.1, 0.05, 0.01]).unwrap();
    let mut group = c.benchmark_group("optimal_joint_score");
    for &players in &[2usize, 3usize, 4usize] {
        let space = JointSpace::new(model.num_arms(), players).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(players), &players, |b, _| {
            b.iter(|| black_box(optimal_joint_score(&model, black_box(&space), 3)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulation, bench_elimination, bench_joint_oracle);
criterion_main!(benches);
