use approx::assert_relative_eq;
use poker_analytics::aggregate::ResponseMatrix;
use poker_analytics::config::{Actors, WalkerConfig};
use poker_analytics::hand_strength::PrimaryCategory;
use poker_analytics::history::{HandHistory, Street};
use poker_analytics::position::{Position, SeatPosition};
use poker_analytics::texture::TextureLabel;
use poker_analytics::walker::*;
use serde_json::{json, Value};

fn hand(hero: &str, big_blind: Value, players: Value, rounds: Value) -> HandHistory {
    let record = json!({
        "hand_id": "h1",
        "hero": hero,
        "big_blind": big_blind,
        "players": players,
        "rounds": rounds,
    });
    HandHistory::from_json(&record.to_string()).unwrap()
}

fn player(name: &str, seat: u32, dealer: bool) -> Value {
    json!({"name": name, "seat": seat, "dealer": dealer, "chips": 100})
}

fn act(player: &str, code: &str, sum: f64) -> Value {
    json!({"player": player, "type": code, "sum": sum})
}

/// Four-handed: A (SB), B (BB), D (CO), C (BTN). D limps, C raises to 3, both
/// blinds call and D folds, so the flop starts with A, B and C and 10 in the pot.
fn donk_hand() -> HandHistory {
    hand(
        "A",
        json!(1.0),
        json!([player("A", 1, false), player("B", 2, false), player("D", 3, false), player("C", 4, true)]),
        json!([
            {"no": 0, "actions": [act("A", "1", 0.5), act("B", "2", 1.0)]},
            {"no": 1,
             "cards": [
                {"player": "A", "cards": "HA HK"},
                {"player": "B", "cards": "S9 D9"},
                {"player": "C", "cards": "CQ DT"},
                {"player": "D", "cards": "S2 C7"}
             ],
             "actions": [act("D", "3", 1.0), act("C", "23", 3.0), act("A", "3", 2.5), act("B", "3", 2.0), act("D", "0", 0.0)]},
            {"no": 2, "board": "HQ HJ C2",
             "actions": [act("A", "5", 3.0), act("B", "0", 0.0), act("C", "3", 3.0)]}
        ]),
    )
}

#[test]
fn test_bet_into_ten_with_fold_and_call() {
    let walked = walk(&donk_hand(), &WalkerConfig::default()).unwrap();
    assert_eq!(walked.events.len(), 1);
    let event = &walked.events[0];

    assert_eq!(event.street, Street::Flop);
    assert_eq!(event.actor, "A");
    assert_relative_eq!(event.pot_before, 10.0);
    assert_relative_eq!(event.ratio, 0.30);
    assert_eq!(event.ratio_bucket_key(), Some("pct_25_40"));
    assert_eq!(event.matrix_bucket_key(), Some("pct_25_40"));
    assert!(!event.success);
    assert_eq!(event.player_count, 3);

    let responses: Vec<(&str, ResponseKind, usize)> = event
        .responses
        .iter()
        .map(|r| (r.responder.as_str(), r.kind, r.ordinal))
        .collect();
    assert_eq!(responses, vec![("B", ResponseKind::Fold, 1), ("C", ResponseKind::Call, 2)]);

    let matrix = ResponseMatrix::from_events(&walked.events);
    let total = matrix.total();
    assert_eq!(total.events, 1);
    assert_eq!(total.fold_events, 1);
    assert_eq!(total.call_events, 1);
    assert_eq!(total.raise_events, 0);
}

#[test]
fn test_bet_into_preflop_aggressor_is_donk() {
    let walked = walk(&donk_hand(), &WalkerConfig::default()).unwrap();
    let event = &walked.events[0];
    assert_eq!(event.bet_class, BetClass::Donk);
    assert_eq!(event.position, SeatPosition::Resolved(Position::SB));
    assert!(!event.in_position);
}

#[test]
fn test_event_carries_hand_and_texture() {
    let walked = walk(&donk_hand(), &WalkerConfig::default()).unwrap();
    let event = &walked.events[0];
    let class = event.hand.expect("hole cards and flop are known");
    assert_eq!(class.primary, PrimaryCategory::Air);
    assert!(class.has_flush_draw);
    assert!(event.flop_texture.contains(&TextureLabel::TwoTone));
    assert!(event.flop_texture.contains(&TextureLabel::High));
}

#[test]
fn test_pot_persists_to_the_end() {
    let walked = walk(&donk_hand(), &WalkerConfig::default()).unwrap();
    assert_relative_eq!(walked.final_pot, 16.0);
    assert_relative_eq!(walked.big_blind, 1.0);
}

/// Heads-up: Hero has the button (SB) and raises, V calls.
fn heads_up(flop: Value, turn: Option<Value>) -> HandHistory {
    let mut rounds = vec![
        json!({"no": 0, "actions": [act("Hero", "1", 0.5), act("V", "2", 1.0)]}),
        json!({"no": 1,
               "cards": [{"player": "Hero", "cards": "Ks Kd"}, {"player": "V", "cards": "7c 8c"}],
               "actions": [act("Hero", "23", 2.5), act("V", "3", 2.0)]}),
        json!({"no": 2, "board": "As 9d 4c", "actions": flop}),
    ];
    if let Some(turn) = turn {
        rounds.push(json!({"no": 3, "board": "As 9d 4c 2h", "actions": turn}));
    }
    hand(
        "Hero",
        json!(1.0),
        json!([player("Hero", 1, true), player("V", 5, false)]),
        Value::Array(rounds),
    )
}

#[test]
fn test_preflop_raiser_betting_flop_is_cbet_in_position() {
    let h = heads_up(
        json!([act("V", "4", 0.0), act("Hero", "5", 2.0), act("V", "23", 6.0), act("Hero", "3", 4.0)]),
        None,
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    assert_eq!(walked.events.len(), 1);
    let event = &walked.events[0];
    assert_eq!(event.bet_class, BetClass::Cbet);
    assert!(event.in_position);
    assert_eq!(event.position, SeatPosition::Resolved(Position::SB));
    assert_relative_eq!(event.ratio, 2.0 / 6.0);
    assert_eq!(event.responses.len(), 1);
    assert_eq!(event.responses[0].kind, ResponseKind::Raise);
    assert!(!event.success);
    assert_eq!(event.hand.map(|h| h.primary), Some(PrimaryCategory::Underpair));
}

#[test]
fn test_turn_pot_includes_flop_action() {
    let h = heads_up(
        json!([act("V", "4", 0.0), act("Hero", "5", 3.0), act("V", "3", 3.0)]),
        Some(json!([act("V", "4", 0.0), act("Hero", "5", 6.0), act("V", "0", 0.0)])),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    assert_eq!(walked.events.len(), 2);

    let turn = &walked.events[1];
    assert_eq!(turn.street, Street::Turn);
    assert_relative_eq!(turn.pot_before, 12.0);
    assert_relative_eq!(turn.ratio, 0.5);
    assert_eq!(turn.bet_class, BetClass::Cbet);
    assert!(turn.success);
    assert_eq!(turn.count(ResponseKind::Fold), 1);
}

#[test]
fn test_flop_only_config_skips_turn() {
    let h = heads_up(
        json!([act("V", "4", 0.0), act("Hero", "5", 3.0), act("V", "3", 3.0)]),
        Some(json!([act("V", "4", 0.0), act("Hero", "5", 6.0), act("V", "0", 0.0)])),
    );
    let walked = walk(&h, &WalkerConfig::flop_only(Actors::Hero)).unwrap();
    assert_eq!(walked.events.len(), 1);
    assert_eq!(walked.events[0].street, Street::Flop);
}

#[test]
fn test_bet_after_aggressor_checked_is_stab() {
    // V 3-bets preflop, then checks the flop to Hero.
    let h = hand(
        "Hero",
        json!(1.0),
        json!([player("Hero", 1, true), player("V", 2, false)]),
        json!([
            {"no": 0, "actions": [act("Hero", "1", 0.5), act("V", "2", 1.0)]},
            {"no": 1, "actions": [act("Hero", "23", 2.5), act("V", "23", 6.0), act("Hero", "3", 3.0)]},
            {"no": 2, "board": "Ts 7d 2c", "actions": [act("V", "4", 0.0), act("Hero", "5", 4.0), act("V", "0", 0.0)]}
        ]),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    let event = &walked.events[0];
    assert_eq!(event.bet_class, BetClass::Stab);
    assert!(event.success);
    assert_relative_eq!(event.pot_before, 13.0);
}

#[test]
fn test_limped_pot_bet_is_stab() {
    let h = hand(
        "Hero",
        json!(1.0),
        json!([player("Hero", 1, true), player("V", 2, false)]),
        json!([
            {"no": 0, "actions": [act("Hero", "1", 0.5), act("V", "2", 1.0)]},
            {"no": 1, "actions": [act("Hero", "3", 0.5), act("V", "4", 0.0)]},
            {"no": 2, "board": "Ts 7d 2c", "actions": [act("V", "4", 0.0), act("Hero", "5", 1.0), act("V", "3", 1.0)]}
        ]),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    let event = &walked.events[0];
    assert_eq!(event.bet_class, BetClass::Stab);
    assert!(event.is_one_bb);
    assert_eq!(event.matrix_bucket_key(), Some("one_bb"));
    assert_eq!(event.ratio_bucket_key(), Some("pct_40_60"));
}

#[test]
fn test_all_in_uses_special_bucket() {
    let h = heads_up(json!([act("V", "4", 0.0), act("Hero", "7", 97.0), act("V", "0", 0.0)]), None);
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    let event = &walked.events[0];
    assert!(event.is_all_in);
    assert_eq!(event.matrix_bucket_key(), Some("all_in"));
    assert_eq!(event.ratio_bucket_key(), Some("pct_300_plus"));
}

#[test]
fn test_only_first_response_per_opponent() {
    let h = hand(
        "A",
        json!(1.0),
        json!([player("A", 1, false), player("B", 2, false), player("C", 3, true)]),
        json!([
            {"no": 0, "actions": [act("A", "1", 0.5), act("B", "2", 1.0)]},
            {"no": 1, "actions": [act("C", "3", 1.0), act("A", "3", 0.5), act("B", "4", 0.0)]},
            {"no": 2, "board": "Ts 7d 2c", "actions": [
                act("A", "5", 2.0), act("B", "3", 2.0), act("C", "23", 8.0),
                act("A", "3", 6.0), act("B", "0", 0.0)
            ]}
        ]),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    let event = &walked.events[0];
    let kinds: Vec<(&str, ResponseKind)> = event.responses.iter().map(|r| (r.responder.as_str(), r.kind)).collect();
    assert_eq!(kinds, vec![("B", ResponseKind::Call), ("C", ResponseKind::Raise)]);
    assert_eq!(event.count(ResponseKind::Fold), 0);
}

#[test]
fn test_one_event_per_street() {
    let h = hand(
        "A",
        json!(1.0),
        json!([player("A", 1, false), player("B", 2, true)]),
        json!([
            {"no": 0, "actions": [act("B", "1", 0.5), act("A", "2", 1.0)]},
            {"no": 1, "actions": [act("B", "3", 0.5), act("A", "4", 0.0)]},
            {"no": 2, "board": "Ts 7d 2c", "actions": [
                act("A", "5", 1.0), act("B", "23", 4.0), act("A", "23", 12.0), act("B", "0", 0.0)
            ]}
        ]),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    assert_eq!(walked.events.len(), 1);
    assert_relative_eq!(walked.events[0].amount, 1.0);
}

#[test]
fn test_opponent_bet_first_blocks_event() {
    let h = heads_up(json!([act("V", "5", 3.0), act("Hero", "23", 9.0), act("V", "0", 0.0)]), None);
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    assert!(walked.events.is_empty());
}

#[test]
fn test_everyone_as_actors() {
    let h = heads_up(json!([act("V", "5", 3.0), act("Hero", "3", 3.0)]), None);
    let config = WalkerConfig { actors: Actors::Everyone, ..WalkerConfig::default() };
    let walked = walk(&h, &config).unwrap();
    assert_eq!(walked.events.len(), 1);
    assert_eq!(walked.events[0].actor, "V");
    assert_eq!(walked.events[0].bet_class, BetClass::Donk);
    assert!(!walked.events[0].in_position);
}

#[test]
fn test_named_actors() {
    let h = heads_up(json!([act("V", "5", 3.0), act("Hero", "3", 3.0)]), None);
    let config = WalkerConfig {
        actors: Actors::Named(["V".to_string()].into_iter().collect()),
        ..WalkerConfig::default()
    };
    let walked = walk(&h, &config).unwrap();
    assert_eq!(walked.events.len(), 1);
    assert_eq!(walked.events[0].responses[0].responder, "Hero");
}

#[test]
fn test_missing_big_blind_skips_hand() {
    let h = hand(
        "A",
        Value::Null,
        json!([player("A", 1, false), player("B", 2, true)]),
        json!([
            {"no": 1, "actions": [act("B", "3", 0.5), act("A", "4", 0.0)]},
            {"no": 2, "board": "Ts 7d 2c", "actions": [act("A", "5", 1.0), act("B", "0", 0.0)]}
        ]),
    );
    assert_eq!(walk(&h, &WalkerConfig::default()).unwrap_err(), SkipReason::MissingBigBlind);
}

#[test]
fn test_big_blind_from_stakes() {
    let record = json!({
        "hand_id": 3,
        "hero": "A",
        "game_type": "Holdem NL ($0.25/$0.50)",
        "players": [player("A", 1, false), player("B", 2, true)],
        "rounds": []
    });
    let h = HandHistory::from_json(&record.to_string()).unwrap();
    assert_eq!(h.big_blind, Some(0.5));
}

#[test]
fn test_hero_not_dealt_skips_hand() {
    let h = hand(
        "Ghost",
        json!(1.0),
        json!([player("A", 1, false), player("B", 2, true)]),
        json!([{"no": 1, "cards": [{"player": "A", "cards": "AsAd"}, {"player": "B", "cards": "KsKd"}]}]),
    );
    assert_eq!(walk(&h, &WalkerConfig::default()).unwrap_err(), SkipReason::MissingHero);
    let everyone = WalkerConfig { actors: Actors::Everyone, ..WalkerConfig::default() };
    assert!(walk(&h, &everyone).is_ok());
}

#[test]
fn test_bet_into_empty_pot_consumes_street() {
    let h = hand(
        "A",
        json!(1.0),
        json!([player("A", 1, false), player("B", 2, true)]),
        json!([
            {"no": 2, "board": "Ts 7d 2c", "actions": [act("A", "5", 2.0), act("B", "23", 6.0), act("A", "0", 0.0)]}
        ]),
    );
    let config = WalkerConfig { actors: Actors::Everyone, ..WalkerConfig::default() };
    let walked = walk(&h, &config).unwrap();
    assert!(walked.events.is_empty());
}

#[test]
fn test_lone_player_street_is_not_evaluated() {
    let h = hand(
        "A",
        json!(1.0),
        json!([player("A", 1, false), player("B", 2, true)]),
        json!([
            {"no": 0, "actions": [act("B", "1", 0.5), act("A", "2", 1.0)]},
            {"no": 1, "actions": [act("B", "0", 0.0)]},
            {"no": 2, "board": "Ts 7d 2c", "actions": [act("A", "5", 1.0)]}
        ]),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    assert!(walked.events.is_empty());
}

#[test]
fn test_malformed_action_is_skipped() {
    let h = hand(
        "Hero",
        json!(1.0),
        json!([player("Hero", 1, true), player("V", 5, false)]),
        json!([
            {"no": 0, "actions": [act("Hero", "1", 0.5), act("V", "2", 1.0)]},
            {"no": 1, "actions": [act("Hero", "23", 2.5), {"type": "3", "sum": 2.0}, act("V", "3", 2.0)]},
            {"no": 2, "board": "As 9d 4c", "actions": [act("V", "99", 0.0), act("V", "4", 0.0), act("Hero", "5", 3.0), act("V", "0", 0.0)]}
        ]),
    );
    let walked = walk(&h, &WalkerConfig::default()).unwrap();
    assert_eq!(walked.events.len(), 1);
    assert_relative_eq!(walked.events[0].pot_before, 6.0);
    assert!(walked.events[0].success);
}
