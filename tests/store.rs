use std::sync::Arc;
use std::thread;
use std::time::Duration;

use legend_cache::{CacheError, CacheStore, LegendTotals, UpsertOutcome};

const PLAYER: &str = "Pagano94";

#[test]
fn upsert_then_lookup_round_trips() {
    let store = CacheStore::open_in_memory().expect("store");
    let outcome = store
        .upsert(PLAYER, "Pathfinder", LegendTotals::new(10, 2, 500))
        .expect("upsert");
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let row = store.lookup(PLAYER, "Pathfinder").expect("row");
    assert_eq!(row.player_name, PLAYER);
    assert_eq!(row.legend_name, "Pathfinder");
    assert_eq!(row.totals(), LegendTotals::new(10, 2, 500));
}

#[test]
fn surrounding_whitespace_addresses_the_same_row() {
    let store = CacheStore::open_in_memory().expect("store");
    store
        .upsert(&format!("  {PLAYER}"), " Pathfinder ", LegendTotals::new(1, 1, 1))
        .expect("padded upsert");
    let outcome = store
        .upsert(PLAYER, "Pathfinder", LegendTotals::new(2, 2, 2))
        .expect("plain upsert");
    assert_eq!(outcome, UpsertOutcome::Updated);

    let rows = store.list_player(&format!("{PLAYER}\n")).expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].player_name, PLAYER);
    assert_eq!(rows[0].legend_name, "Pathfinder");

    store.delete(PLAYER, "\tPathfinder").expect("delete");
    let err = store.lookup(PLAYER, " Pathfinder").unwrap_err();
    assert!(
        matches!(err, CacheError::NotFound { ref legend, .. } if legend == "Pathfinder"),
        "{err}"
    );
}

#[test]
fn second_upsert_updates_in_place() {
    let store = CacheStore::open_in_memory().expect("store");
    store
        .upsert(PLAYER, "Wraith", LegendTotals::new(1, 1, 1))
        .expect("insert");
    let first = store.lookup(PLAYER, "Wraith").expect("row");

    thread::sleep(Duration::from_millis(10));
    let outcome = store
        .upsert(PLAYER, "Wraith", LegendTotals::new(9, 8, 7))
        .expect("update");
    assert_eq!(outcome, UpsertOutcome::Updated);

    let second = store.lookup(PLAYER, "Wraith").expect("row");
    assert_eq!(second.id, first.id);
    assert_eq!(second.totals(), LegendTotals::new(9, 8, 7));
    assert!(second.recorded_at > first.recorded_at);
    assert_eq!(store.list_player(PLAYER).expect("list").len(), 1);
}

#[test]
fn same_legend_for_different_players_is_two_rows() {
    let store = CacheStore::open_in_memory().expect("store");
    store
        .upsert("alpha", "Lifeline", LegendTotals::new(1, 0, 0))
        .expect("alpha");
    store
        .upsert("beta", "Lifeline", LegendTotals::new(2, 0, 0))
        .expect("beta");

    assert_eq!(store.lookup("alpha", "Lifeline").expect("alpha").kills, 1);
    assert_eq!(store.lookup("beta", "Lifeline").expect("beta").kills, 2);
}

#[test]
fn lookup_missing_is_not_found() {
    let store = CacheStore::open_in_memory().expect("store");
    let err = store.lookup(PLAYER, "Seer").unwrap_err();
    assert!(
        matches!(err, CacheError::NotFound { ref player, ref legend } if player == PLAYER && legend == "Seer")
    );
}

#[test]
fn delete_twice_reports_not_found_second_time() {
    let store = CacheStore::open_in_memory().expect("store");
    store
        .upsert(PLAYER, "Octane", LegendTotals::new(3, 0, 90))
        .expect("upsert");

    store.delete(PLAYER, "Octane").expect("first delete");
    assert!(store.delete(PLAYER, "Octane").unwrap_err().is_not_found());
    assert!(store.lookup(PLAYER, "Octane").unwrap_err().is_not_found());
}

#[test]
fn list_player_is_ordered_by_legend() {
    let store = CacheStore::open_in_memory().expect("store");
    for legend in ["Wraith", "Ash", "Mirage"] {
        store
            .upsert(PLAYER, legend, LegendTotals::default())
            .expect("upsert");
    }
    store
        .upsert("someone_else", "Bangalore", LegendTotals::default())
        .expect("upsert");

    let names = store
        .list_player(PLAYER)
        .expect("list")
        .into_iter()
        .map(|row| row.legend_name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Ash", "Mirage", "Wraith"]);
}

#[test]
fn failed_batch_rolls_back_everything() {
    let store = CacheStore::open_in_memory().expect("store");
    store
        .upsert(PLAYER, "Caustic", LegendTotals::new(1, 1, 1))
        .expect("seed");

    let result: Result<(), CacheError> = store.write_batch(|batch| {
        batch.upsert(PLAYER, "Caustic", LegendTotals::new(50, 50, 50))?;
        batch.upsert(PLAYER, "Gibraltar", LegendTotals::new(2, 2, 2))?;
        Err(CacheError::Cancelled {
            player: PLAYER.to_string(),
        })
    });
    assert!(matches!(result, Err(CacheError::Cancelled { .. })));

    assert_eq!(
        store.lookup(PLAYER, "Caustic").expect("seed row").totals(),
        LegendTotals::new(1, 1, 1)
    );
    assert!(store.lookup(PLAYER, "Gibraltar").unwrap_err().is_not_found());
}

#[test]
fn open_creates_parent_dirs_and_persists() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("cache.sqlite");
    {
        let store = CacheStore::open(&path).expect("open");
        assert_eq!(store.path(), Some(path.as_path()));
        store
            .upsert(PLAYER, "Horizon", LegendTotals::new(4, 1, 800))
            .expect("upsert");
    }

    let reopened = CacheStore::open(&path).expect("reopen");
    assert_eq!(
        reopened.lookup(PLAYER, "Horizon").expect("row").totals(),
        LegendTotals::new(4, 1, 800)
    );
}

#[test]
fn racing_writers_on_separate_handles_converge_to_one_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("race.sqlite");
    let first = Arc::new(CacheStore::open(&path).expect("first handle"));
    let second = Arc::new(CacheStore::open(&path).expect("second handle"));

    let workers = [first.clone(), second.clone()]
        .into_iter()
        .enumerate()
        .map(|(worker, store)| {
            thread::spawn(move || {
                for round in 0..25u64 {
                    store
                        .upsert(
                            PLAYER,
                            "Valkyrie",
                            LegendTotals::new(round, worker as u64, 100),
                        )
                        .expect("upsert under contention");
                }
            })
        })
        .collect::<Vec<_>>();
    for worker in workers {
        worker.join().expect("worker thread");
    }

    let rows = first.list_player(PLAYER).expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kills, 24);
    assert_eq!(second.list_player(PLAYER).expect("list").len(), 1);
}
