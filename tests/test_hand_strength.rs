use poker_analytics::cards::{parse_board, parse_hole};
use poker_analytics::error::AnalyticsError;
use poker_analytics::hand_strength::{classify, HandClassification, PrimaryCategory};

fn run(hole: &str, board: &str) -> HandClassification {
    classify(&parse_hole(hole).unwrap(), &parse_board(board).unwrap()).unwrap()
}

fn primary(hole: &str, board: &str) -> PrimaryCategory {
    run(hole, board).primary
}

#[test]
fn test_nut_flush_draw_without_pair_is_air() {
    let result = run("AhKh", "QhJh2c");
    assert!(result.has_flush_draw);
    assert_eq!(result.primary, PrimaryCategory::Air);
    assert!(!result.made_straight);
    assert!(!result.made_flush);
    assert!(result.has_draw());
}

#[test]
fn test_made_categories() {
    assert_eq!(primary("KcKd", "Ks7h7d"), PrimaryCategory::FullHouse);
    assert_eq!(primary("7c7d", "7h7s2d"), PrimaryCategory::Quads);
    assert_eq!(primary("AhKh", "Qh7h2h"), PrimaryCategory::Flush);
    assert_eq!(primary("9cTd", "JhQsKd"), PrimaryCategory::Straight);
    assert_eq!(primary("7c7d", "7hKd2s"), PrimaryCategory::TripsOrSet);
    assert_eq!(primary("Kc7d", "Kh7c2d"), PrimaryCategory::TwoPair);
}

#[test]
fn test_pair_categories() {
    assert_eq!(primary("QcQd", "Jh7c2d"), PrimaryCategory::Overpair);
    assert_eq!(primary("AsKd", "Kh7c2d"), PrimaryCategory::TopPair);
    assert_eq!(primary("7s6s", "Kh7c2d"), PrimaryCategory::MiddlePair);
    assert_eq!(primary("As2c", "Kh7c2d"), PrimaryCategory::BottomPair);
    assert_eq!(primary("5c5d", "Kh7c2d"), PrimaryCategory::Underpair);
}

#[test]
fn test_paired_board_alone_is_air() {
    assert_eq!(primary("AcQd", "KhKd2c"), PrimaryCategory::Air);
}

#[test]
fn test_full_house_outranks_quads_check() {
    let result = run("7c7d", "7h7s2d2c");
    assert!(result.made_full_house);
    assert_eq!(result.primary, PrimaryCategory::FullHouse);
}

#[test]
fn test_open_ended_straight_draw() {
    let result = run("9h8d", "7c6s2h");
    assert!(result.has_oesd);
    assert!(!result.made_straight);
    assert_eq!(result.primary, PrimaryCategory::Air);
}

#[test]
fn test_gutshot_is_not_open_ended() {
    assert!(!run("9h8d", "7c5s2h").has_oesd);
}

#[test]
fn test_made_straight_clears_oesd() {
    let result = run("9h8d", "7c6s5h");
    assert!(result.made_straight);
    assert!(!result.has_oesd);
}

#[test]
fn test_wheel_straight() {
    let result = run("Ah2d", "3c4s5h");
    assert!(result.made_straight);
    assert_eq!(result.primary, PrimaryCategory::Straight);
}

#[test]
fn test_flush_draw_needs_a_hole_card_of_the_suit() {
    assert!(!run("AcKd", "QhJh2h9h").has_flush_draw);
    assert!(!run("AhKd", "QhJh2c").has_flush_draw);
    assert!(run("AhKd", "QhJh2h").has_flush_draw);
}

#[test]
fn test_made_hand_keeps_draw_flags() {
    let result = run("AhKh", "QhJhKs");
    assert_eq!(result.primary, PrimaryCategory::TopPair);
    assert!(result.has_flush_draw);
}

#[test]
fn test_board_size_bounds() {
    let hole = parse_hole("AhKh").unwrap();
    assert!(classify(&hole, &parse_board("QhJh2c5d8s").unwrap()).is_ok());
    assert!(matches!(
        classify(&hole, &parse_board("QhJh2c5d8s9s").unwrap()),
        Err(AnalyticsError::InvalidBoardSize(6))
    ));
    assert!(classify(&hole, &[]).is_err());
}

#[test]
fn test_classification_is_pure() {
    assert_eq!(run("AsKd", "Kh7c2d"), run("AsKd", "Kh7c2d"));
}
