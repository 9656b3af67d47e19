//! End-to-end match tests through the public API.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use debrisfall::config::load_match_file;
use debrisfall::error::StrategyInitError;
use debrisfall::game::Coord;
use debrisfall::replay::Replay;
use debrisfall::{
    Contender, Controller, ControllerError, EndReason, GameConstants, Map, MatchConfig, Side,
    Strategy, TieBreak, TowerKind, WorldState, run_match,
};

/// Straight lane of `len` cells down the middle column.
fn lane(len: usize) -> Arc<Map> {
    let rows: Vec<&str> = std::iter::repeat_n("SPS", len).collect();
    Arc::new(Map::from_ascii("lane", &rows).unwrap())
}

fn idle() -> Contender {
    Contender::builtin("idle").unwrap()
}

/// Contender whose every invocation runs `f`.
fn scripted<F>(name: &str, f: F) -> Contender
where
    F: Fn(&mut Controller) -> Result<(), ControllerError> + Clone + Send + Sync + 'static,
{
    Contender::new(name, move |_: &Map| {
        let f = f.clone();
        Ok(Box::new(move |rc: &mut Controller| f(rc)) as Box<dyn Strategy>)
    })
}

fn capped(turns: u32) -> MatchConfig {
    MatchConfig {
        max_turns: Some(turns),
        ..MatchConfig::default()
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_first_burst_costs_ten_health() {
    let result = run_match(&idle(), &idle(), lane(10), &capped(225)).unwrap();
    assert_eq!(result.reason, EndReason::TurnLimit);
    assert_eq!(result.health.blue, 2490);
    assert_eq!(result.health.red, 2490);

    let first_hit = result
        .replay
        .ticks
        .iter()
        .find(|t| t.health.blue < 2500)
        .unwrap();
    assert_eq!(first_hit.turn, 218);
    assert_eq!(first_hit.health.red, 2490);
}

#[test]
fn test_unaffordable_farm_is_rejected() {
    let mut world = WorldState::new(lane(10), GameConstants::default());
    world.start_tick();
    let mut rc = Controller::new(Side::Blue, world);

    assert!(!rc.can_build_tower(TowerKind::Farm, 0, 0));
    assert_eq!(
        rc.build_tower(TowerKind::Farm, 0, 0),
        Err(ControllerError::Precondition("build_tower"))
    );
    assert!((rc.balance(Side::Blue) - 1500.0).abs() < 1e-9);
    assert!(rc.commands().is_empty());
}

#[test]
fn test_injection_lands_on_opponent_lane_next_tick() {
    let second_attempt = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&second_attempt);
    let sender = scripted("sender", move |rc: &mut Controller| {
        if rc.turn() == 150 {
            rc.send_debris(4, 101)?;
            *seen.lock().unwrap() = Some(rc.send_debris(4, 101));
        }
        Ok(())
    });

    let result = run_match(&sender, &idle(), lane(10), &capped(152)).unwrap();
    assert_eq!(
        *second_attempt.lock().unwrap(),
        Some(Err(ControllerError::Precondition("send_debris")))
    );

    let sent = result.replay.tick(150).unwrap();
    assert!((sent.balance.blue - (1500.0 + 1500.0 - 213.0)).abs() < 1e-9);
    assert!((sent.balance.red - 3000.0).abs() < 1e-9);
    assert!(sent.debris.red.iter().all(|d| !d.sent_by_opponent));

    let landed = result.replay.tick(151).unwrap();
    let injected: Vec<_> = landed.debris.red.iter().filter(|d| d.sent_by_opponent).collect();
    assert_eq!(injected.len(), 1);
    assert_eq!(injected[0].max_health, 101);
    assert_eq!(injected[0].max_cooldown, 4);
    assert_eq!(Coord::new(injected[0].x, injected[0].y), Coord::new(1, 9));
    assert!(landed.debris.blue.iter().all(|d| !d.sent_by_opponent));
}

// =============================================================================
// Failures and tie-breaks
// =============================================================================

#[test]
fn test_uncaught_violation_fails_the_side() {
    let reckless = scripted("reckless", |rc: &mut Controller| {
        rc.build_tower(TowerKind::Farm, 0, 0).map(|_| ())
    });
    let result = run_match(&idle(), &reckless, lane(10), &MatchConfig::default()).unwrap();
    assert_eq!(result.winner, Side::Blue);
    assert_eq!(result.reason, EndReason::SideFailed);
    assert_eq!(result.turns, 1);
    assert!((result.balance.red - 1510.0).abs() < 1e-9);
}

#[test]
fn test_caught_violation_is_harmless() {
    let careful = scripted("careful", |rc: &mut Controller| {
        let _ = rc.build_tower(TowerKind::Farm, 0, 0);
        Ok(())
    });
    let result = run_match(&careful, &idle(), lane(10), &capped(3)).unwrap();
    assert_eq!(result.reason, EndReason::TurnLimit);
}

#[test]
fn test_timeout_fails_and_zeroes_budget() {
    let config = MatchConfig {
        constants: GameConstants {
            initial_budget_secs: 0.02,
            budget_increment_secs: 0.0,
            ..GameConstants::default()
        },
        ..MatchConfig::default()
    };
    let sleeper = scripted("sleeper", |_: &mut Controller| {
        thread::sleep(Duration::from_millis(300));
        Ok(())
    });

    let result = run_match(&sleeper, &idle(), lane(10), &config).unwrap();
    assert_eq!(result.winner, Side::Red);
    assert_eq!(result.reason, EndReason::SideFailed);
    let tick = result.replay.tick(1).unwrap();
    assert!(tick.time_remaining.blue.abs() < 1e-12);
    assert!(tick.time_remaining.red > 0.0);
}

#[test]
fn test_budgets_are_read_from_tick_start() {
    let slow = scripted("slow", |_: &mut Controller| {
        thread::sleep(Duration::from_millis(20));
        Ok(())
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let watcher = scripted("watcher", move |rc: &mut Controller| {
        log.lock()
            .unwrap()
            .push((rc.time_remaining(Side::Blue), rc.time_remaining(Side::Red)));
        Ok(())
    });

    let result = run_match(&slow, &watcher, lane(10), &capped(2)).unwrap();
    assert_eq!(result.reason, EndReason::TurnLimit);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    // Blue's sleep on turn 1 is visible from turn 2 on, never mid-tick.
    assert_eq!(seen[0].0, seen[0].1);
    assert!(seen[1].0 < seen[1].1);
}

#[test]
fn test_double_timeout_goes_to_tie_break() {
    let config = MatchConfig {
        constants: GameConstants {
            initial_budget_secs: 0.02,
            ..GameConstants::default()
        },
        ..MatchConfig::default()
    };
    let sleeper = scripted("sleeper", |_: &mut Controller| {
        thread::sleep(Duration::from_millis(300));
        Ok(())
    });

    let result = run_match(&sleeper, &sleeper, lane(10), &config).unwrap();
    assert_eq!(result.reason, EndReason::BothFailed);
    assert_eq!(result.tie_break, Some(TieBreak::CoinFlip));
    assert_eq!(result.turns, 1);
}

#[test]
fn test_panicking_strategy_fails_the_side() {
    let crasher = scripted("crasher", |rc: &mut Controller| {
        assert!(rc.turn() < 3, "bad turn");
        Ok(())
    });
    let result = run_match(&idle(), &crasher, lane(10), &MatchConfig::default()).unwrap();
    assert_eq!(result.winner, Side::Blue);
    assert_eq!(result.reason, EndReason::SideFailed);
    assert_eq!(result.turns, 3);
}

#[test]
fn test_construction_failure_forfeits() {
    let broken = Contender::new("broken", |map: &Map| {
        Err(StrategyInitError(format!("cannot play {}", map.name())))
    });
    let result = run_match(&broken, &idle(), lane(10), &MatchConfig::default()).unwrap();
    assert_eq!(result.winner, Side::Red);
    assert_eq!(result.reason, EndReason::ConstructionFailed);
    assert_eq!(result.turns, 0);
    assert!(result.replay.ticks.is_empty());
    let [blue_score, red_score] = result.replay.metadata.scores;
    assert!(blue_score.abs() < 1e-12 && (red_score - 1.0).abs() < 1e-12);
}

#[test]
fn test_panicking_constructor_forfeits() {
    let panicky = Contender::new("panicky", |_: &Map| panic!("constructor bug"));
    let result = run_match(&idle(), &panicky, lane(10), &MatchConfig::default()).unwrap();
    assert_eq!(result.winner, Side::Blue);
    assert_eq!(result.reason, EndReason::ConstructionFailed);
    assert_eq!(result.tie_break, None);
    assert_eq!(result.turns, 0);
    assert!(result.replay.ticks.is_empty());
}

#[test]
fn test_injection_depletes_health() {
    let config = MatchConfig {
        constants: GameConstants {
            starting_health: 5,
            ..GameConstants::default()
        },
        ..MatchConfig::default()
    };
    let rusher = scripted("rusher", |rc: &mut Controller| {
        if rc.turn() == 1 {
            rc.send_debris(1, 10)?;
        }
        Ok(())
    });

    let result = run_match(&rusher, &idle(), lane(3), &config).unwrap();
    assert_eq!(result.winner, Side::Blue);
    assert_eq!(result.reason, EndReason::HealthDepleted);
    assert_eq!(result.tie_break, None);
    assert_eq!(result.turns, 4);
    assert_eq!(result.health.red, 0);
    assert_eq!(result.health.blue, 5);
    // The ending tick is still recorded.
    assert_eq!(result.replay.ticks.last().unwrap().turn, 4);
}

#[test]
fn test_simultaneous_depletion_uses_tie_break() {
    let config = MatchConfig {
        constants: GameConstants {
            starting_health: 5,
            ..GameConstants::default()
        },
        ..MatchConfig::default()
    };
    let result = run_match(&idle(), &idle(), lane(3), &config).unwrap();
    assert_eq!(result.reason, EndReason::HealthDepleted);
    assert_eq!(result.tie_break, Some(TieBreak::CoinFlip));
    assert_eq!(result.turns, 78);
}

// =============================================================================
// Economy through the pipeline
// =============================================================================

#[test]
fn test_sold_cell_can_be_rebuilt_same_tick() {
    let flipper = scripted("flipper", |rc: &mut Controller| {
        if let Some(tower) = rc.towers(rc.ally_side()).first() {
            rc.sell_tower(tower.id)?;
        }
        if rc.turn() <= 2 {
            rc.build_tower(TowerKind::Gunship, 0, 0)?;
        }
        Ok(())
    });

    let result = run_match(&flipper, &idle(), lane(10), &capped(3)).unwrap();
    let first = result.replay.tick(1).unwrap();
    assert!((first.balance.blue - 510.0).abs() < 1e-9);

    let second = result.replay.tick(2).unwrap();
    assert_eq!(second.towers.blue.len(), 1);
    assert_eq!((second.towers.blue[0].x, second.towers.blue[0].y), (0, 0));
    assert_ne!(second.towers.blue[0].id, first.towers.blue[0].id);
    // 510 + 10 income + 800 refund - 1000 rebuild
    assert!((second.balance.blue - 320.0).abs() < 1e-9);

    let third = result.replay.tick(3).unwrap();
    assert!(third.towers.blue.is_empty());
    assert!((third.balance.blue - 1130.0).abs() < 1e-9);
}

// =============================================================================
// Built-in strategies and replays
// =============================================================================

#[test]
fn test_builtins_play_deterministically() {
    let blue = Contender::builtin("defender").unwrap();
    let red = Contender::builtin("raider").unwrap();
    let map = lane(12);

    let first = run_match(&blue, &red, Arc::clone(&map), &capped(300)).unwrap();
    let second = run_match(&blue, &red, map, &capped(300)).unwrap();

    assert_eq!(first.turns, second.turns);
    assert_eq!(first.winner, second.winner);
    assert_eq!(first.replay.ticks.len(), second.replay.ticks.len());
    for (a, b) in first.replay.ticks.iter().zip(&second.replay.ticks) {
        assert_eq!(a.turn, b.turn);
        assert_eq!(a.health, b.health);
        assert_eq!(a.towers, b.towers);
        assert_eq!(a.debris, b.debris);
        assert_eq!(a.attacks, b.attacks);
    }
    assert!(first.replay.ticks.iter().any(|t| !t.towers.red.is_empty()));
}

#[test]
fn test_replay_shape_and_round_trip() {
    let result = run_match(&idle(), &idle(), lane(10), &capped(40)).unwrap();
    let replay = &result.replay;

    let turns: Vec<u32> = replay.ticks.iter().map(|t| t.turn).collect();
    assert_eq!(turns, (1..=40).collect::<Vec<_>>());
    assert_eq!(replay.metadata.game_name, "idle-idle-lane");
    assert_eq!(replay.metadata.path.len(), 10);
    assert_eq!(replay.metadata.winner, result.winner);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay.json");
    replay.save(&path).unwrap();
    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded.ticks.len(), 40);
    assert_eq!(loaded.metadata, replay.metadata);
}

#[test]
fn test_match_file_and_map_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bend.awap24m"),
        "[['S','P','S','S'],['S','P','P','P'],['S','S','S','S']]\n",
    )
    .unwrap();
    let match_path = dir.path().join("match.json");
    std::fs::write(
        &match_path,
        r#"{"bots": ["defender", "raider"], "map": "bend.awap24m", "seed": 3, "max_turns": 20}"#,
    )
    .unwrap();

    let file = load_match_file(&match_path).unwrap();
    let map = Arc::new(Map::load(&file.map).unwrap());
    assert_eq!(map.name(), "bend");
    assert_eq!(map.path_length(), 4);
    // Row ends are scanned before column ends, so the right edge is the entry.
    assert_eq!(map.path()[0], Coord::new(3, 1));
    assert_eq!(map.path()[3], Coord::new(1, 2));

    let config = file.to_config(0);
    let blue = Contender::builtin(&file.bots[0]).unwrap();
    let red = Contender::builtin(&file.bots[1]).unwrap();
    let result = run_match(&blue, &red, map, &config).unwrap();
    assert_eq!(result.turns, 20);
    assert_eq!(result.replay.metadata.game_name, "defender-raider-bend");
}
