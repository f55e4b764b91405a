//! Integration test to ensure a generated game starts up and plays through a battle.

use tactica::{
    AutoCommander, DeltaTime, EngineConfig, GameEvent, GameMode, GameState, GenerationConfig,
    TacticaResult, PLAYER_TEAM,
};

const FRAME: f64 = 1.0 / 60.0;

fn quick_config(seed: u64) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.generation = GenerationConfig::new(seed);
    config.overworld.time_between_moves = 0.0;
    config.combat.time_between_moves = 0.0;
    config.combat.attack_duration = 0.0;
    config
}

#[test]
fn test_basic_startup() -> TacticaResult<()> {
    let state = GameState::generate(EngineConfig::default())?;

    assert_eq!(state.mode(), GameMode::Overworld);
    assert_eq!(state.elapsed(), 0.0);
    assert!(!state.combat().is_battle());
    assert_eq!(
        state
            .overworld()
            .parties()
            .filter(|party| party.team == PLAYER_TEAM)
            .count(),
        1
    );
    assert!(state.current_actor().is_none());
    Ok(())
}

#[test]
fn test_generated_game_plays_a_battle() -> TacticaResult<()> {
    let mut state = GameState::generate(quick_config(17))?;
    let mut commander = AutoCommander::new(17).with_decision_delay(0.0);
    let parties_before = state.overworld().parties().count();

    let mut started = false;
    let mut ended = None;
    for _ in 0..100_000 {
        commander.tick(DeltaTime::from_secs(FRAME), &mut state);
        for event in state.tick(DeltaTime::from_secs(FRAME)) {
            match event {
                GameEvent::CombatStarted { .. } => started = true,
                GameEvent::CombatEnded {
                    defeated_party,
                    survivors,
                    ..
                } => ended = Some((defeated_party, survivors)),
                _ => {}
            }
        }
        if ended.is_some() {
            break;
        }
    }

    assert!(started);
    let (defeated, survivors) = ended.expect("the battle never ended");
    assert!(survivors >= 1);
    assert_eq!(state.mode(), GameMode::Overworld);
    assert_eq!(state.statistics().battles_fought, 1);
    assert!(state.statistics().strikes >= 1);

    // The defeated party leaves the map at the next drain.
    state.tick(DeltaTime::from_secs(FRAME));
    assert!(state.overworld().party(defeated).is_none());
    assert_eq!(state.overworld().parties().count(), parties_before - 1);
    Ok(())
}

#[test]
fn test_same_seed_same_world() -> TacticaResult<()> {
    let first = GameState::generate(quick_config(99))?;
    let second = GameState::generate(quick_config(99))?;

    let mut a: Vec<_> = first.overworld().parties().map(|party| party.position).collect();
    let mut b: Vec<_> = second.overworld().parties().map(|party| party.position).collect();
    a.sort_by_key(|cell| (cell.x, cell.y));
    b.sort_by_key(|cell| (cell.x, cell.y));
    assert_eq!(a, b);
    assert_eq!(first.overworld().terrain(), second.overworld().terrain());
    Ok(())
}
