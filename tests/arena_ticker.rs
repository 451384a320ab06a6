/// Integration tests for the Study Arena driven by the tokio ticker in
/// simulated time.
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lifeverse::game::{
    ArenaMode, ArenaTicker, BattlePhase, GameStoreBuilder, SharedStore, DEFAULT_TICK_PERIOD,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(GameStoreBuilder::in_memory().open().unwrap()))
}

#[tokio::test(start_paused = true)]
async fn short_battle_runs_to_completion() {
    let store = shared_store();
    let token = {
        let mut guard = store.lock().unwrap();
        guard.arena_set_mode(ArenaMode::Short).unwrap();
        guard.arena_start().unwrap()
    };
    let coins_before = store.lock().unwrap().state().user.coins;

    let ticker = ArenaTicker::spawn_with_rng(
        store.clone(),
        token,
        DEFAULT_TICK_PERIOD,
        StdRng::seed_from_u64(7),
    );
    tokio::time::sleep(Duration::from_secs(ArenaMode::Short.duration_secs() as u64 + 5)).await;
    assert!(ticker.is_finished());

    let guard = store.lock().unwrap();
    assert_eq!(guard.arena().phase(), BattlePhase::Completed);
    assert_eq!(guard.arena().remaining_secs(), 0);
    let reward = guard.arena().last_reward().expect("reward");
    assert!(reward.coins >= 25);
    assert_eq!(guard.state().user.coins, coins_before + reward.coins);
}

#[tokio::test(start_paused = true)]
async fn reset_mid_battle_stops_all_mutation() {
    let store = shared_store();
    let token = store.lock().unwrap().arena_start().unwrap();
    let mut ticker = ArenaTicker::spawn(store.clone(), token, DEFAULT_TICK_PERIOD);

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    {
        let mut guard = store.lock().unwrap();
        assert_eq!(guard.arena().elapsed_secs(), 10);
        guard.arena_reset();
    }
    ticker.cancel();
    let snapshot = store.lock().unwrap().state().clone();

    tokio::time::sleep(Duration::from_secs(120)).await;
    let guard = store.lock().unwrap();
    assert_eq!(guard.arena().phase(), BattlePhase::Idle);
    assert_eq!(guard.arena().elapsed_secs(), 0);
    assert_eq!(guard.state(), &snapshot);
}

#[tokio::test(start_paused = true)]
async fn stale_ticker_exits_after_reset_without_cancel() {
    let store = shared_store();
    let token = store.lock().unwrap().arena_start().unwrap();
    let ticker = ArenaTicker::spawn(store.clone(), token, DEFAULT_TICK_PERIOD);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    store.lock().unwrap().arena_reset();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(ticker.is_finished());
    assert_eq!(store.lock().unwrap().arena().elapsed_secs(), 0);
}

#[tokio::test(start_paused = true)]
async fn pause_and_resume_continue_the_countdown() {
    let store = shared_store();
    let token = {
        let mut guard = store.lock().unwrap();
        guard.arena_set_mode(ArenaMode::Short).unwrap();
        guard.arena_start().unwrap()
    };
    let first = ArenaTicker::spawn(store.clone(), token, DEFAULT_TICK_PERIOD);
    tokio::time::sleep(Duration::from_millis(60_500)).await;
    assert!(store.lock().unwrap().arena_pause());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(first.is_finished());
    let paused_remaining = store.lock().unwrap().arena().remaining_secs();
    assert_eq!(paused_remaining, ArenaMode::Short.duration_secs() - 60);

    let token = store.lock().unwrap().arena_resume().unwrap();
    let _second = ArenaTicker::spawn(store.clone(), token, DEFAULT_TICK_PERIOD);
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(
        store.lock().unwrap().arena().remaining_secs(),
        paused_remaining - 10
    );
}

#[test]
fn mode_cannot_change_during_battle() {
    let mut store = GameStoreBuilder::in_memory().open().unwrap();
    store.arena_start().unwrap();
    assert!(store.arena_set_mode(ArenaMode::Long).is_err());
    store.arena_reset();
    assert!(store.arena_set_mode(ArenaMode::Long).is_ok());
    assert_eq!(store.arena().mode(), ArenaMode::Long);
}
