use std::collections::{BTreeMap, BTreeSet};

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use itertools::Itertools;

use crate::aggregate::MatrixScenario;
use crate::cards::{Card, Suit};
use crate::curves::CurveScenario;
use crate::hand_strength::HandClassification;
use crate::pipeline::BatchStats;
use crate::position::SeatPosition;
use crate::scenario::{ScenarioDescriptor, ScenarioSummary};
use crate::texture::TextureLabel;

pub fn board_display(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| {
            let text = format!("{}{}", card.rank.to_char(), card.suit.symbol());
            match card.suit {
                Suit::Spades => text.white().to_string(),
                Suit::Hearts => text.red().to_string(),
                Suit::Diamonds => text.blue().to_string(),
                Suit::Clubs => text.green().to_string(),
            }
        })
        .join(" ")
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

fn label(text: &str) -> Cell {
    Cell::new(text.bold().to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Fold percentage coloured from the bettor's point of view.
pub fn fold_pct_style(pct: f64) -> String {
    let text = format!("{:.1}%", pct);
    if pct >= 60.0 {
        text.green().to_string()
    } else if pct >= 40.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

// ---------------------------------------------------------------------------
// Response matrix
// ---------------------------------------------------------------------------

pub fn matrix_heading(scenario: &MatrixScenario) -> String {
    format!(
        "{} {} {} {} {}-way",
        scenario.street.to_uppercase(),
        scenario.hero_position,
        scenario.bet_type,
        scenario.position,
        scenario.player_count
    )
}

/// Buckets with at least one event.
pub fn matrix_table(scenario: &MatrixScenario) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Bucket"),
        right("Events"),
        right("Responses"),
        right("Fold"),
        right("Call"),
        right("Raise"),
    ]);

    for m in scenario.metrics.iter().filter(|m| m.events > 0) {
        let responses = m.fold_events + m.call_events + m.raise_events;
        let pct = |n: u64| {
            if responses == 0 {
                0.0
            } else {
                n as f64 / responses as f64 * 100.0
            }
        };
        table.add_row(vec![
            label(&m.bucket_label),
            right(m.events),
            right(responses),
            right(fold_pct_style(pct(m.fold_events))),
            right(format!("{:.1}%", pct(m.call_events))),
            right(format!("{:.1}%", pct(m.raise_events))),
        ]);
    }
    table.to_string()
}

// ---------------------------------------------------------------------------
// Response curves
// ---------------------------------------------------------------------------

pub fn curve_heading(scenario: &CurveScenario) -> String {
    format!(
        "{}  stack {}  pot {} ({:.1}bb)  vpip ahead {}  behind {}  n={}",
        scenario.hero_position.bold(),
        scenario.stack_bucket_key,
        scenario.pot_bucket_key,
        scenario.pot_size_bb,
        scenario.vpip_ahead,
        scenario.players_behind,
        scenario.sample_size
    )
}

pub fn curve_table(scenario: &CurveScenario) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Size"),
        right("Ratio"),
        right("Fold"),
        right("Call"),
        right("Raise"),
        right("EV (bb)"),
        right("Final Pot"),
        right("Players"),
    ]);

    for p in &scenario.points {
        let ev = if p.ev_bb >= 0.0 {
            format!("{:+.2}", p.ev_bb).green().to_string()
        } else {
            format!("{:+.2}", p.ev_bb).red().to_string()
        };
        table.add_row(vec![
            label(&p.bucket_label),
            right(format!("{:.3}", p.representative_ratio)),
            right(fold_pct_style(p.fold_pct)),
            right(format!("{:.1}%", p.call_pct)),
            right(format!("{:.1}%", p.raise_pct)),
            right(ev),
            right(format!("{:.1}bb", p.expected_final_pot_bb)),
            right(format!("{:.2}", p.expected_players_remaining)),
        ]);
    }
    table.to_string()
}

// ---------------------------------------------------------------------------
// Scenarios and positions
// ---------------------------------------------------------------------------

pub fn scenario_table(descriptor: &ScenarioDescriptor, summary: &ScenarioSummary) -> String {
    let mut overview = Table::new();
    overview.set_content_arrangement(ContentArrangement::Dynamic);
    overview.set_header(vec![Cell::new(""), Cell::new("")]);
    overview.add_row(vec![label("Scenario"), Cell::new(&descriptor.title)]);
    overview.add_row(vec![label("Attempts"), right(summary.attempts)]);
    overview.add_row(vec![
        label("Avg Size"),
        right(format!("{:.2}bb", summary.average_size_bb())),
    ]);
    overview.add_row(vec![
        label("Success"),
        right(fold_pct_style(summary.success_rate() * 100.0)),
    ]);

    let mut sizes = Table::new();
    sizes.set_content_arrangement(ContentArrangement::Dynamic);
    sizes.set_header(vec![Cell::new("Size"), right("Attempts"), right("Success")]);
    for (size, tally) in summary.size_rows() {
        let rate = if tally.attempts == 0 {
            0.0
        } else {
            tally.successes as f64 / tally.attempts as f64 * 100.0
        };
        sizes.add_row(vec![label(size), right(tally.attempts), right(format!("{:.1}%", rate))]);
    }

    format!("{}\n{}", overview, sizes)
}

/// Counts in position order with `UNKNOWN` last.
pub fn position_table(title: &str, counts: &BTreeMap<SeatPosition, u64>) -> String {
    let total: u64 = counts.values().sum();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Position"), right("Hands"), right("Share")]);

    for (position, n) in counts.iter().sorted_by_key(|(p, _)| p.order()) {
        let name = if position.is_unknown() {
            position.label().yellow().bold().to_string()
        } else {
            position.label().bold().to_string()
        };
        let share = if total == 0 { 0.0 } else { *n as f64 / total as f64 * 100.0 };
        table.add_row(vec![Cell::new(name), right(n), right(format!("{:.1}%", share))]);
    }
    format!("  {}\n{}", title.bold(), table)
}

// ---------------------------------------------------------------------------
// Single hand
// ---------------------------------------------------------------------------

pub fn classification_table(class: &HandClassification, labels: &BTreeSet<TextureLabel>) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new(""), Cell::new("")]);
    table.add_row(vec![label("Category"), Cell::new(class.primary.as_str())]);
    table.add_row(vec![label("Flush Draw"), Cell::new(yes_no(class.has_flush_draw))]);
    table.add_row(vec![label("OESD"), Cell::new(yes_no(class.has_oesd))]);
    table.add_row(vec![label("Made Flush"), Cell::new(yes_no(class.made_flush))]);
    table.add_row(vec![label("Made Straight"), Cell::new(yes_no(class.made_straight))]);
    table.add_row(vec![label("Full House"), Cell::new(yes_no(class.made_full_house))]);
    if !labels.is_empty() {
        table.add_row(vec![label("Flop Texture"), Cell::new(labels.iter().map(|l| l.key()).join(", "))]);
    }
    table.to_string()
}

pub fn texture_table(labels: &BTreeSet<TextureLabel>) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Label"), Cell::new("Group"), Cell::new("")]);
    for l in TextureLabel::ALL {
        let mark = if labels.contains(&l) {
            "\u{2713}".green().bold().to_string()
        } else {
            "-".dimmed().to_string()
        };
        table.add_row(vec![label(l.key()), Cell::new(l.title()), Cell::new(mark)]);
    }
    table.to_string()
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub fn stats_line(stats: &BatchStats) -> String {
    let mut line = format!(
        "{} hands read, {} used, {} records",
        stats.hands_read, stats.hands_used, stats.records
    );
    if !stats.skipped.is_empty() {
        let reasons = stats.skipped.iter().map(|(r, n)| format!("{} {}", n, r)).join(", ");
        line.push_str(&format!(" (skipped: {})", reasons));
    }
    line
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_line_lists_skips() {
        let mut stats = BatchStats { hands_read: 3, hands_used: 2, records: 4, ..Default::default() };
        stats.skip(crate::walker::SkipReason::MissingBigBlind);
        let line = stats_line(&stats);
        assert!(line.starts_with("3 hands read, 2 used, 4 records"));
        assert!(line.contains("1 missing big blind"));
    }
}
