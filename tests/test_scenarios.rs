use approx::assert_relative_eq;
use poker_analytics::config::{Actors, WalkerConfig};
use poker_analytics::history::HandHistory;
use poker_analytics::position::{Position, SeatPosition};
use poker_analytics::scenario::*;
use poker_analytics::walker::{ResponseKind, SkipReason};
use serde_json::{json, Value};

fn act(player: &str, code: &str, sum: f64) -> Value {
    json!({"player": player, "type": code, "sum": sum})
}

/// Four-handed table, seats 1-4 in order SB, BB, CO, BTN.
fn four_handed(names: [&str; 4], preflop: Vec<Value>) -> HandHistory {
    let players: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"name": name, "seat": i + 1, "dealer": i == 3, "chips": 100}))
        .collect();
    let record = json!({
        "hand_id": "s1",
        "hero": "Hero",
        "big_blind": 1.0,
        "players": players,
        "rounds": [
            {"no": 0, "actions": [act(names[0], "1", 0.5), act(names[1], "2", 1.0)]},
            {"no": 1, "actions": preflop}
        ]
    });
    HandHistory::from_json(&record.to_string()).unwrap()
}

fn steal(size: f64) -> HandHistory {
    four_handed(
        ["SB", "BB", "CO", "Hero"],
        vec![act("CO", "0", 0.0), act("Hero", "23", size), act("SB", "0", 0.0), act("BB", "0", 0.0)],
    )
}

fn config() -> WalkerConfig {
    WalkerConfig::default()
}

#[test]
fn test_button_steal_that_takes_the_blinds() {
    let attempt = detect(&steal(2.5), find_scenario("btn-steal").unwrap(), &config())
        .unwrap()
        .unwrap();
    assert_eq!(attempt.actor, "Hero");
    assert_eq!(attempt.position, SeatPosition::Resolved(Position::BTN));
    assert_relative_eq!(attempt.size_bb, 2.5);
    assert_eq!(attempt.size_bucket, "x2_5_2_7");
    assert_eq!(attempt.responses.len(), 2);
    assert!(attempt.responses.iter().all(|r| r.kind == ResponseKind::Fold));
    assert!(attempt.success);
}

#[test]
fn test_min_raise_lands_in_other() {
    let attempt = detect(&steal(1.2), find_scenario("btn-steal").unwrap(), &config())
        .unwrap()
        .unwrap();
    assert_eq!(attempt.size_bucket, OTHER_SIZE);
    assert!(size_bucket(1.49).is_none());
    assert_eq!(size_bucket(2.0).unwrap().key, "x2_0_2_2");
    assert_eq!(size_bucket(9.0).unwrap().key, "x3_0_plus");
}

#[test]
fn test_open_from_another_seat_is_not_a_steal() {
    let hand = four_handed(
        ["SB", "BB", "CO", "Hero"],
        vec![act("CO", "23", 2.5), act("Hero", "0", 0.0), act("SB", "0", 0.0), act("BB", "0", 0.0)],
    );
    assert_eq!(detect(&hand, find_scenario("btn-steal").unwrap(), &config()).unwrap(), None);
    assert!(detect(&hand, find_scenario("co-open").unwrap(), &config()).unwrap().is_none());

    let everyone = WalkerConfig { actors: Actors::Everyone, ..config() };
    let open = detect(&hand, find_scenario("co-open").unwrap(), &everyone).unwrap().unwrap();
    assert_eq!(open.actor, "CO");
    assert!(open.success);
}

#[test]
fn test_three_bet_called_by_opener() {
    let hand = four_handed(
        ["SB", "BB", "CO", "Hero"],
        vec![
            act("CO", "23", 2.5),
            act("Hero", "23", 8.0),
            act("SB", "0", 0.0),
            act("BB", "0", 0.0),
            act("CO", "3", 5.5),
        ],
    );
    let attempt = detect(&hand, find_scenario("three-bet").unwrap(), &config()).unwrap().unwrap();
    assert_relative_eq!(attempt.size_bb, 8.0);
    assert_eq!(attempt.size_bucket, "x3_0_plus");
    let last = attempt.responses.last().unwrap();
    assert_eq!(last.responder, "CO");
    assert_eq!(last.kind, ResponseKind::Call);
    assert_eq!(last.ordinal, 3);
    assert!(!attempt.success);
}

#[test]
fn test_squeeze_counts_blind_already_posted() {
    let hand = four_handed(
        ["Hero", "BB", "CO", "BTN"],
        vec![
            act("CO", "23", 2.5),
            act("BTN", "3", 2.5),
            act("Hero", "23", 10.5),
            act("BB", "0", 0.0),
            act("CO", "0", 0.0),
            act("BTN", "0", 0.0),
        ],
    );
    let attempt = detect(&hand, find_scenario("squeeze").unwrap(), &config()).unwrap().unwrap();
    assert_eq!(attempt.position, SeatPosition::Resolved(Position::SB));
    assert_relative_eq!(attempt.size_bb, 11.0);
    assert!(attempt.success);

    // One caller between the open and the re-raise rules out a plain 3-bet.
    assert_eq!(detect(&hand, find_scenario("three-bet").unwrap(), &config()).unwrap(), None);
}

#[test]
fn test_big_blind_isolation_over_limpers() {
    let hand = four_handed(
        ["SB", "Hero", "CO", "BTN"],
        vec![
            act("CO", "3", 1.0),
            act("BTN", "3", 1.0),
            act("SB", "3", 0.5),
            act("Hero", "23", 4.0),
            act("CO", "3", 4.0),
            act("BTN", "0", 0.0),
            act("SB", "0", 0.0),
        ],
    );
    let attempt = detect(&hand, find_scenario("bb-iso").unwrap(), &config()).unwrap().unwrap();
    assert_relative_eq!(attempt.size_bb, 5.0);
    assert_eq!(attempt.responses.len(), 3);
    assert_eq!(attempt.responses[0].kind, ResponseKind::Call);
    assert!(!attempt.success);
}

#[test]
fn test_hand_without_hero_is_skipped() {
    let record = json!({
        "hand_id": 1, "big_blind": 1.0,
        "players": [{"name": "A", "seat": 1}, {"name": "B", "seat": 2}],
        "rounds": []
    });
    let hand = HandHistory::from_json(&record.to_string()).unwrap();
    assert_eq!(
        detect(&hand, find_scenario("btn-steal").unwrap(), &config()).unwrap_err(),
        SkipReason::MissingHero
    );
}

#[test]
fn test_summary_rates_and_merge() {
    let descriptor = find_scenario("btn-steal").unwrap();
    let attempts: Vec<ScenarioAttempt> = [2.5, 2.5, 1.2]
        .iter()
        .map(|size| detect(&steal(*size), descriptor, &config()).unwrap().unwrap())
        .collect();
    let mut failed = attempts[0].clone();
    failed.success = false;

    let mut left = ScenarioSummary::default();
    left.add(&attempts[0]);
    left.add(&attempts[1]);
    let mut right = ScenarioSummary::default();
    right.add(&attempts[2]);
    right.add(&failed);

    let mut whole = ScenarioSummary::default();
    for a in attempts.iter().chain(std::iter::once(&failed)) {
        whole.add(a);
    }
    let merged = left.merge(right);
    assert_eq!(merged, whole);
    assert_eq!(merged.attempts, 4);
    assert_relative_eq!(merged.success_rate(), 0.75);
    assert_relative_eq!(merged.average_size_bb(), 2.175);

    let rows = merged.size_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "2.5-2.7x");
    assert_eq!(rows[0].1, SizeTally { attempts: 3, successes: 2 });
    assert_eq!(rows[1].0, OTHER_SIZE);
}

#[test]
fn test_empty_summary() {
    let summary = ScenarioSummary::default();
    assert_eq!(summary.success_rate(), 0.0);
    assert_eq!(summary.average_size_bb(), 0.0);
    assert!(summary.size_rows().is_empty());
}

#[test]
fn test_unknown_scenario_key() {
    let err = find_scenario("donk-lead").unwrap_err();
    assert!(err.to_string().contains("donk-lead"));
    assert_eq!(builtin_scenarios().len(), 8);
}
