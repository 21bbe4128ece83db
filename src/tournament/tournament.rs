use super::matrix::WinrateMatrix;
use crate::Environment;
use crate::Error;
use crate::Frozen;
use crate::Policy;
use crate::Probability;
use crate::Result;
use crate::Trajectory;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;

/// All-pairs match play between frozen snapshots.
///
/// Matchups run on a dedicated pool, so no more than `concurrency`
/// environment instances are ever live. Each matchup seeds its own RNG from
/// `(seed, i, j)` alone: replaying a pair reproduces it exactly no matter
/// how many other pairs run around it, or when.
pub struct Tournament {
    episodes: usize,
    seed: u64,
    pool: rayon::ThreadPool,
}

impl Tournament {
    pub fn new(episodes: usize, seed: u64, concurrency: usize) -> Result<Self> {
        if episodes == 0 {
            return Err(Error::InvalidConfig("episodes per matchup must be positive".to_string()));
        }
        if concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be positive".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("tournament-{}", i))
            .build()?;
        Ok(Self {
            episodes,
            seed,
            pool,
        })
    }
    pub fn episodes(&self) -> usize {
        self.episodes
    }
    pub fn seed(&self) -> u64 {
        self.seed
    }
    pub fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Full round robin over `population`.
    pub fn evaluate<E, S>(&self, env: &E, population: &[&S]) -> Result<WinrateMatrix>
    where
        E: Environment,
        S: Frozen<E>,
    {
        let mut matrix = WinrateMatrix::new(0);
        self.extend(env, &mut matrix, population)?;
        Ok(matrix)
    }

    /// Grow `matrix` to cover `population`, playing only the pairs that
    /// involve a slot the matrix does not cover yet. The existing block must
    /// describe the leading snapshots of `population`.
    pub fn extend<E, S>(&self, env: &E, matrix: &mut WinrateMatrix, population: &[&S]) -> Result<()>
    where
        E: Environment,
        S: Frozen<E>,
    {
        let known = matrix.size();
        if known > population.len() {
            return Err(Error::InvalidMatrix(format!(
                "matrix covers {} slots but population has {}",
                known,
                population.len()
            )));
        }
        let pairs = (known..population.len())
            .flat_map(|j| (0..j).map(move |i| (i, j)))
            .collect::<Vec<_>>();
        let results = self.pool.install(|| {
            pairs
                .par_iter()
                .map(|&(i, j)| {
                    self.matchup(env, population[i], population[j], i, j)
                        .map(|p| (i, j, p))
                })
                .collect::<Result<Vec<_>>>()
        })?;
        while matrix.size() < population.len() {
            matrix.grow();
        }
        for (i, j, p) in results {
            matrix.set(i, j, p);
        }
        log::debug!(
            "played {} matchups x {} episodes, population {}",
            pairs.len(),
            self.episodes,
            population.len()
        );
        Ok(())
    }

    /// Mean score of `a` (slot `i`) against `b` (slot `j`). Seats alternate
    /// every episode, `a` opening in seat 0.
    pub fn matchup<E, S>(&self, env: &E, a: &S, b: &S, i: usize, j: usize) -> Result<Probability>
    where
        E: Environment,
        S: Frozen<E>,
    {
        let ref mut rng = SmallRng::seed_from_u64(self.mix(i, j));
        let ref mut env = env.clone();
        let mut score = 0.0;
        for episode in 0..self.episodes {
            let seat = episode % 2;
            let seats: [&dyn Policy<E>; 2] = match seat {
                0 => [a, b],
                _ => [b, a],
            };
            let trajectory = Trajectory::play(env, seats, seat, rng)
                .map_err(|source| Error::Evaluation { i, j, source })?;
            score += trajectory.outcome().score();
        }
        Ok(score / self.episodes as Probability)
    }

    fn mix(&self, i: usize, j: usize) -> u64 {
        [i as u64, j as u64]
            .into_iter()
            .fold(splitmix(self.seed), |h, x| splitmix(h ^ x))
    }
}

/// SplitMix64 finalizer.
fn splitmix(x: u64) -> u64 {
    let x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parameter;
    use crate::Rps;
    use crate::RpsAction;
    use crate::RpsSnapshot;
    use rand::distr::Distribution;
    use rand::distr::weighted::WeightedIndex;

    /// Randomized thrower, so that seeds matter.
    struct Mixed([f64; 3]);

    impl Policy<Rps> for Mixed {
        fn act(&self, _: &(), rng: &mut SmallRng) -> RpsAction {
            let index = WeightedIndex::new(self.0).unwrap();
            RpsAction::ALL[index.sample(rng)]
        }
    }

    impl Frozen<Rps> for Mixed {
        fn parameters(&self) -> Vec<Parameter> {
            self.0.to_vec()
        }
        fn restore(parameters: &[Parameter]) -> anyhow::Result<Self> {
            Ok(Self(<[f64; 3]>::try_from(parameters)?))
        }
    }

    fn mixed() -> Vec<Mixed> {
        vec![
            Mixed([1.0, 1.0, 1.0]),
            Mixed([3.0, 1.0, 1.0]),
            Mixed([1.0, 3.0, 1.0]),
            Mixed([1.0, 1.0, 3.0]),
            Mixed([1.0, 0.0, 0.0]),
        ]
    }

    #[test]
    fn deterministic_cycle() {
        // counts of the opponent: always rock, then paper, then scissors
        let rock = RpsSnapshot::restore(&[0.0, 0.0, 0.0]).unwrap();
        let paper = RpsSnapshot::restore(&[1.0, 0.0, 0.0]).unwrap();
        let scissors = RpsSnapshot::restore(&[0.0, 1.0, 0.0]).unwrap();
        let tournament = Tournament::new(10, 0, 2).unwrap();
        let matrix = tournament.evaluate(&Rps, &[&rock, &paper, &scissors]).unwrap();
        assert_eq!(
            matrix.rows(),
            vec![
                vec![0.5, 0.0, 1.0],
                vec![1.0, 0.5, 0.0],
                vec![0.0, 1.0, 0.5],
            ]
        );
    }

    #[test]
    fn antisymmetric_with_fixed_diagonal() {
        let population = mixed();
        let population = population.iter().collect::<Vec<_>>();
        let matrix = Tournament::new(50, 3, 4).unwrap().evaluate(&Rps, &population).unwrap();
        assert_eq!(matrix.size(), 5);
        assert!(matrix.is_antisymmetric(1e-12));
        for i in 0..5 {
            assert_eq!(matrix.get(i, i), 0.5);
        }
    }

    #[test]
    fn reproducible_across_concurrency() {
        let population = mixed();
        let population = population.iter().collect::<Vec<_>>();
        let serial = Tournament::new(40, 11, 1).unwrap();
        let parallel = Tournament::new(40, 11, 4).unwrap();
        assert_eq!(parallel.concurrency(), 4);
        assert_eq!(
            serial.evaluate(&Rps, &population).unwrap(),
            parallel.evaluate(&Rps, &population).unwrap()
        );
    }

    #[test]
    fn prefix_monotonicity() {
        let population = mixed();
        let population = population.iter().collect::<Vec<_>>();
        let tournament = Tournament::new(30, 5, 3).unwrap();
        let full = tournament.evaluate(&Rps, &population).unwrap();
        let mut incremental = WinrateMatrix::new(0);
        for k in 1..=population.len() {
            tournament.extend(&Rps, &mut incremental, &population[..k]).unwrap();
            assert_eq!(incremental, full.prefix(k));
            assert_eq!(tournament.evaluate(&Rps, &population[..k]).unwrap(), full.prefix(k));
        }
    }

    #[test]
    fn rejects_degenerate_settings() {
        assert!(Tournament::new(0, 0, 1).is_err());
        assert!(Tournament::new(1, 0, 0).is_err());
        let tournament = Tournament::new(1, 0, 1).unwrap();
        let rock = RpsSnapshot::restore(&[0.0, 0.0, 0.0]).unwrap();
        let mut matrix = WinrateMatrix::new(2);
        assert!(tournament.extend(&Rps, &mut matrix, &[&rock]).is_err());
    }
}
