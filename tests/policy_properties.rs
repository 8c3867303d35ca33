//! Randomized checks of policy and discretizer properties.

use qracer::{
    Discretizer, RaceDiscretizer, SensorVector, StateSpace, ValueTable,
    policy::{ActionSelector, Boltzmann, EpsilonGreedy},
    sensors::SENSOR_COUNT,
    state_space::{DiscreteState, state_count},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn random_table(rng: &mut StdRng, scale: f64) -> (ValueTable, DiscreteState) {
    let mut table = ValueTable::new(StateSpace::new(vec![1]).unwrap(), 5, 0.0).unwrap();
    let state = DiscreteState::from([0]);
    for action in 0..5 {
        table
            .set(&state, action, rng.random_range(-scale..scale))
            .unwrap();
    }
    (table, state)
}

#[test]
fn test_full_epsilon_always_picks_the_best_action() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let (table, state) = random_table(&mut rng, 10.0);
        let (best, _) = table.best_action(&state).unwrap();
        let mut policy = EpsilonGreedy::new(1.0, 0.5, 1.0).unwrap();
        for episode in 0..5 {
            assert_eq!(
                policy
                    .select_action(&table, &state, episode, &mut rng)
                    .unwrap(),
                best
            );
        }
    }
}

#[test]
fn test_zero_epsilon_explores_every_action() {
    let mut rng = StdRng::seed_from_u64(2);
    let (table, state) = random_table(&mut rng, 1.0);
    let mut policy = EpsilonGreedy::new(0.0, 0.5, 1.0).unwrap();

    let mut seen = [false; 5];
    for _ in 0..500 {
        seen[policy.select_action(&table, &state, 0, &mut rng).unwrap()] = true;
    }
    assert!(seen.iter().all(|&s| s));
    // One episode index only, so ε never moved.
    assert_eq!(policy.epsilon(), 0.0);
}

#[test]
fn test_boltzmann_distribution_sums_to_one() {
    let mut rng = StdRng::seed_from_u64(3);
    let state = DiscreteState::from([0]);
    for _ in 0..500 {
        let temperature = rng.random_range(2.0..200.0);
        let policy = Boltzmann::new(temperature, 0.99, 2.0).unwrap();
        let values: Vec<f64> = (0..5).map(|_| rng.random_range(-1e3..1e3)).collect();

        let probabilities = policy.distribution(&state, &values).unwrap();
        let total: f64 = probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "total {total}");
        assert!(probabilities.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}

#[test]
fn test_boltzmann_distribution_is_shift_invariant() {
    let mut rng = StdRng::seed_from_u64(4);
    let state = DiscreteState::from([0]);
    let policy = Boltzmann::new(10.0, 0.99, 2.0).unwrap();
    for _ in 0..200 {
        let values: Vec<f64> = (0..5).map(|_| rng.random_range(-50.0..50.0)).collect();
        let shift = rng.random_range(-1e4..1e4);
        let shifted: Vec<f64> = values.iter().map(|v| v + shift).collect();

        let plain = policy.distribution(&state, &values).unwrap();
        let moved = policy.distribution(&state, &shifted).unwrap();
        for (a, b) in plain.iter().zip(&moved) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }
}

#[test]
fn test_boltzmann_handles_values_that_would_overflow_exp() {
    let state = DiscreteState::from([0]);
    let policy = Boltzmann::new(2.0, 0.99, 2.0).unwrap();
    let probabilities = policy
        .distribution(&state, &[5000.0, 4990.0, -5000.0, 0.0, 5000.0])
        .unwrap();

    assert!(probabilities.iter().all(|p| p.is_finite()));
    assert!((probabilities[0] - 0.5).abs() < 1e-2);
    assert!((probabilities[4] - 0.5).abs() < 1e-2);
    assert_eq!(probabilities[2], 0.0);
}

#[test]
fn test_parameters_move_once_per_new_episode() {
    let mut rng = StdRng::seed_from_u64(5);
    let (table, state) = random_table(&mut rng, 1.0);
    let mut epsilon = EpsilonGreedy::new(0.1, 0.5, 0.98).unwrap();
    let mut boltzmann = Boltzmann::new(100.0, 0.5, 2.0).unwrap();

    let schedule = [0, 0, 0, 1, 1, 2, 2, 2, 2, 3];
    for &episode in &schedule {
        epsilon
            .select_action(&table, &state, episode, &mut rng)
            .unwrap();
        boltzmann
            .select_action(&table, &state, episode, &mut rng)
            .unwrap();
    }

    assert!((epsilon.epsilon() - 0.8).abs() < 1e-12);
    assert!((boltzmann.temperature() - 12.5).abs() < 1e-12);

    // Bounds hold once reached.
    for episode in 4..20 {
        epsilon
            .select_action(&table, &state, episode, &mut rng)
            .unwrap();
        boltzmann
            .select_action(&table, &state, episode, &mut rng)
            .unwrap();
    }
    assert_eq!(epsilon.epsilon(), 0.98);
    assert_eq!(boltzmann.temperature(), 2.0);
}

#[test]
fn test_random_sensors_always_discretize_inside_the_space() {
    let discretizer = RaceDiscretizer::default();
    let space = discretizer.state_space().unwrap();
    let mut rng = StdRng::seed_from_u64(6);

    let mut previous: Option<SensorVector> = None;
    for _ in 0..5000 {
        let mut readings = [0.0; SENSOR_COUNT];
        for reading in &mut readings {
            *reading = rng.random_range(-500.0..500.0);
        }
        let sensors = SensorVector::new(readings);
        let state = discretizer.current_state(&sensors, previous.as_ref());
        assert!(space.contains(&state), "state {state} out of range");
        previous = Some(sensors);
    }
}

#[test]
fn test_state_count_matches_enumeration() {
    let levels = RaceDiscretizer::default().discretization_levels();
    let space = StateSpace::new(levels.clone()).unwrap();

    let states: Vec<DiscreteState> = space.enumerate().collect();
    assert_eq!(Some(states.len()), state_count(&levels));
    assert_eq!(states.len(), 900);

    let unique: std::collections::HashSet<_> = states.iter().cloned().collect();
    assert_eq!(unique.len(), states.len());
    for (index, state) in states.iter().enumerate() {
        assert_eq!(space.index_of(state).unwrap(), index);
    }
}
