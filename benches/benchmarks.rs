criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        solving_nash_cyclic,
        solving_nash_random,
        solving_nash_prefixes_warm,
        solving_nash_prefixes_cold,
        playing_rps_tournament,
}

fn random(n: usize, seed: u64) -> WinrateMatrix {
    let ref mut rng = SmallRng::seed_from_u64(seed);
    let mut matrix = WinrateMatrix::new(n);
    for i in 0..n {
        for j in i + 1..n {
            matrix.set(i, j, rng.random::<f64>());
        }
    }
    matrix
}

fn solving_nash_cyclic(c: &mut criterion::Criterion) {
    let matrix = WinrateMatrix::try_from(vec![
        vec![0.5, 0.9, 0.2],
        vec![0.1, 0.5, 0.7],
        vec![0.8, 0.3, 0.5],
    ])
    .expect("valid matrix");
    c.bench_function("solve a cyclic 3x3 maximum-entropy Nash", |b| {
        b.iter(|| NashSolver::default().solve(&matrix))
    });
}

fn solving_nash_random(c: &mut criterion::Criterion) {
    let matrix = random(32, 0);
    c.bench_function("solve a random 32x32 maximum-entropy Nash", |b| {
        b.iter(|| NashSolver::default().solve(&matrix))
    });
}

fn solving_nash_prefixes_warm(c: &mut criterion::Criterion) {
    let matrix = random(24, 1);
    c.bench_function("solve 24 prefixes warm-started in sequence", |b| {
        b.iter(|| Evolution::default().sequential(&matrix))
    });
}

fn solving_nash_prefixes_cold(c: &mut criterion::Criterion) {
    let matrix = random(24, 1);
    c.bench_function("solve 24 prefixes cold in parallel", |b| {
        b.iter(|| Evolution::prefixes(&NashSolver::default(), &matrix))
    });
}

fn playing_rps_tournament(c: &mut criterion::Criterion) {
    let population = (0..16)
        .map(|i| RpsAgent::from([i as f64, (i * 7 % 5) as f64, (i * 3 % 4) as f64]).freeze())
        .collect::<Vec<_>>();
    let population = population.iter().collect::<Vec<_>>();
    let tournament = Tournament::new(100, 0, num_cpus::get()).expect("valid tournament");
    c.bench_function("play a 16-snapshot RPS round robin", |b| {
        b.iter(|| tournament.evaluate(&Rps, &population))
    });
}

use nashpop::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
