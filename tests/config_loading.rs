//! Loading engine configuration from JSON files.

use std::io::Write;
use tactica::{
    AdjacentSearch, EngineConfig, GameState, HeuristicKind, TacticaError, TacticaResult,
};

#[test]
fn test_partial_config_file() -> TacticaResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "combat": {{
                "time_between_moves": 0.1,
                "search": {{ "heuristic": "closest", "adjacent": "surrounding" }}
            }},
            "generation": {{ "seed": 7, "army_size": 5 }}
        }}"#
    )?;

    let config = EngineConfig::from_path(file.path())?;
    assert_eq!(config.combat.time_between_moves, 0.1);
    assert_eq!(config.combat.search.heuristic, HeuristicKind::Closest);
    assert_eq!(config.combat.search.adjacent, AdjacentSearch::Surrounding);
    assert!(config.combat.search.allow_diagonal);
    assert_eq!(config.combat.arena_width, 18);
    assert_eq!(config.generation.seed, 7);
    assert_eq!(config.generation.army_size, 5);
    assert_eq!(config.generation.roster.len(), 3);

    let state = GameState::generate(config)?;
    assert!(state
        .overworld()
        .parties()
        .all(|party| party.army.len() == 5));
    Ok(())
}

#[test]
fn test_saved_config_loads_back() -> TacticaResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("engine.json");
    let mut config = EngineConfig::default();
    config.overworld.width = 40;
    config.overworld.height = 30;
    std::fs::write(&path, config.to_json()?)?;

    assert_eq!(EngineConfig::from_path(&path)?, config);
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = EngineConfig::from_path(dir.path().join("absent.json"));
    assert!(matches!(result, Err(TacticaError::Io(_))));
}

#[test]
fn test_invalid_army_size_is_rejected() {
    let result = EngineConfig::from_json(r#"{ "generation": { "army_size": 12 } }"#);
    assert!(matches!(result, Err(TacticaError::InvalidConfig(_))));
}
