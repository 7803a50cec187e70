use logistic_sim::{Engine, EngineError, HistoryPoint, ParameterUpdate, SimulationParameters};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_params(rng: &mut ChaCha8Rng) -> SimulationParameters {
    SimulationParameters {
        starting_population: rng.gen_range(0..2_000),
        replication_chance: rng.gen_range(0.0..=0.5),
        death_chance: rng.gen_range(0.0..=0.5),
        crowding_coefficient: rng.gen_range(0.0..=0.01),
    }
}

fn assert_invariants(engine: &Engine) {
    let state = engine.state();
    assert!(!state.history.is_empty());
    assert!(state.population >= 0.0);
    assert_eq!(state.history[0].delta, 0.0);
    assert_eq!(state.history.len() as u64, state.tick + 1);
    for (index, point) in state.history.iter().enumerate() {
        assert_eq!(point.tick, index as u64);
    }
}

#[test]
fn random_driver_sessions_keep_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..50 {
        let mut engine = Engine::new(random_params(&mut rng));
        engine.set_active(true);
        for _ in 0..300 {
            match rng.gen_range(0..10) {
                0 => engine.set_active(rng.gen_bool(0.7)),
                1 => {
                    let update = ParameterUpdate::default()
                        .replication_chance(rng.gen_range(0.0..=0.5))
                        .crowding_coefficient(rng.gen_range(0.0..=0.01));
                    engine.configure(update).expect("rate updates always apply");
                }
                2 => {
                    let was_active = engine.is_active();
                    let before = engine.state().clone();
                    match engine.reset() {
                        Ok(()) => assert!(!was_active),
                        Err(err) => {
                            assert!(was_active);
                            assert_eq!(err, EngineError::ResetWhileRunningRejected);
                            assert_eq!(engine.state(), &before);
                        }
                    }
                }
                _ => {
                    if let Some(point) = engine.advance_tick() {
                        assert!(point.delta.is_finite());
                        if point.population == 0 {
                            assert!(!engine.is_active(), "extinction must pause the engine");
                        }
                    }
                }
            }
            assert_invariants(&engine);
        }
    }
}

#[test]
fn carrying_capacity_is_zero_whenever_deaths_dominate() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..200 {
        let death_chance = rng.gen_range(0.0..=0.5);
        let params = SimulationParameters {
            replication_chance: rng.gen_range(0.0..=death_chance),
            death_chance,
            crowding_coefficient: rng.gen_range(0.0..=0.01),
            ..SimulationParameters::default()
        };
        assert_eq!(Engine::new(params).carrying_capacity(), 0.0);
    }
}

#[test]
fn extinction_is_terminal_until_restarted() {
    let mut engine = Engine::new(SimulationParameters {
        starting_population: 50,
        replication_chance: 0.0,
        death_chance: 0.5,
        crowding_coefficient: 0.001,
    });
    engine.set_active(true);
    for _ in 0..20 {
        engine.advance_tick();
    }
    assert_eq!(engine.state().population, 0.0);
    assert!(!engine.is_active());
    let ticks = engine.state().tick;
    assert!(ticks < 20);

    engine.advance_tick();
    assert_eq!(engine.state().tick, ticks);

    // zero stays zero even if the driver restarts it
    engine.set_active(true);
    let point = engine.advance_tick().expect("restarted engine ticks");
    assert_eq!(point.population, 0);
    assert_eq!(point.delta, 0.0);
    assert!(!engine.is_active());
}

#[test]
fn reset_twice_is_idempotent() {
    let mut engine = Engine::default();
    engine.set_active(true);
    for _ in 0..10 {
        engine.advance_tick();
    }
    engine.set_active(false);
    engine.reset().expect("paused reset succeeds");
    let once = engine.state().clone();
    engine.reset().expect("paused reset succeeds");
    assert_eq!(engine.state(), &once);
    assert_eq!(
        once.history,
        vec![HistoryPoint {
            tick: 0,
            population: 100,
            delta: 0.0
        }]
    );
}

#[test]
fn permissive_inputs_flow_into_the_recurrence() {
    let mut engine = Engine::new(SimulationParameters {
        starting_population: 10,
        replication_chance: -0.2,
        death_chance: 0.0,
        crowding_coefficient: -0.01,
    });
    engine.set_active(true);
    // -0.2 + 0.1 = -0.1, so 10 loses 1
    let point = engine.advance_tick().expect("engine is active");
    assert_eq!(point.population, 9);
    assert_eq!(engine.carrying_capacity(), 0.0);
}
