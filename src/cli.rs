use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::cards::{parse_board, parse_hole};
use crate::config::{Actors, DataPaths, RunOptions, WalkerConfig};
use crate::display::{
    board_display, classification_table, curve_heading, curve_table, matrix_heading, matrix_table,
    position_table, print_error, print_section, print_success, scenario_table, stats_line,
    texture_table,
};
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::hand_strength::classify;
use crate::history::Street;
use crate::pipeline::{
    load_or_build_curves, load_or_build_matrix, position_distribution, read_lines,
    summarize_scenario, write_events, Provenance,
};
use crate::position::SeatPosition;
use crate::scenario::{builtin_scenarios, find_scenario};
use crate::texture::texture;

#[derive(Parser)]
#[command(
    name = "pka",
    version = "1.0.0",
    about = "Poker hand-history analytics: bet events, response matrices and preflop curves."
)]
struct Cli {
    /// Log skipped hands and actions
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Hand histories, one JSON object per line
    #[arg(short, long)]
    input: PathBuf,
    /// Stop after this many hands
    #[arg(long)]
    max_hands: Option<usize>,
}

#[derive(Args, Clone, Default)]
struct ActorArgs {
    /// Evaluate these players instead of the hero (repeatable)
    #[arg(long = "player")]
    players: Vec<String>,
    /// Evaluate every player's bets
    #[arg(long, conflicts_with = "players")]
    all_players: bool,
}

impl ActorArgs {
    fn actors(&self) -> Actors {
        if self.all_players {
            Actors::Everyone
        } else if !self.players.is_empty() {
            Actors::Named(self.players.iter().cloned().collect())
        } else {
            Actors::Hero
        }
    }
}

#[derive(Args, Clone)]
struct CacheArgs {
    /// Write the payload here instead of the cache directory
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Rebuild even when a cached payload exists
    #[arg(short, long)]
    force: bool,
    /// Cache directory (defaults to $POKER_ANALYTICS_CACHE_DIR)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the flop response matrix and show it by scenario
    Matrix {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        actors: ActorArgs,
        #[command(flatten)]
        cache: CacheArgs,
        /// Streets to evaluate (flop, turn, river; repeatable)
        #[arg(long = "street")]
        streets: Vec<String>,
        /// Only show scenarios with at least this many events
        #[arg(long, default_value = "1")]
        min_events: u64,
    },
    /// Stream every bet and response as JSON lines
    Events {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        actors: ActorArgs,
        /// Streets to evaluate (flop, turn, river; repeatable)
        #[arg(long = "street")]
        streets: Vec<String>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build preflop response curves
    Curves {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        actors: ActorArgs,
        #[command(flatten)]
        cache: CacheArgs,
        /// Only show curves for this raiser position
        #[arg(long)]
        position: Option<String>,
        /// Only show curves with at least this many samples
        #[arg(long, default_value = "1")]
        min_samples: u64,
    },
    /// Summarize a preflop scenario (btn-steal, three-bet, squeeze, ...)
    Scenario {
        /// Scenario key; omit with --list
        key: Option<String>,
        /// List the built-in scenarios
        #[arg(long)]
        list: bool,
        /// Hand histories, one JSON object per line
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Stop after this many hands
        #[arg(long)]
        max_hands: Option<usize>,
        #[command(flatten)]
        actors: ActorArgs,
    },
    /// Count resolved positions, including UNKNOWN
    Positions {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Classify hole cards against a board
    Classify {
        /// Hole cards (e.g., AhKh)
        hole: String,
        /// Board cards (e.g., QhJh2c)
        board: String,
    },
    /// Show texture labels for a flop
    Texture {
        /// Flop cards (e.g., AsKd7c)
        board: String,
    },
}

pub fn run() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = dispatch(cli.command) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

pub fn run_with_args(args: Vec<String>) -> AnalyticsResult<()> {
    let cli = Cli::parse_from(args);
    dispatch(cli.command)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    if let Err(e) = simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("logger already initialised: {}", e);
    }
}

fn dispatch(command: Commands) -> AnalyticsResult<()> {
    match command {
        Commands::Matrix { source, actors, cache, streets, min_events } => {
            cmd_matrix(source, actors, cache, streets, min_events)
        }
        Commands::Events { source, actors, streets, output } => cmd_events(source, actors, streets, output),
        Commands::Curves { source, actors, cache, position, min_samples } => {
            cmd_curves(source, actors, cache, position, min_samples)
        }
        Commands::Scenario { key, list, input, max_hands, actors } => {
            let source = input.map(|input| SourceArgs { input, max_hands });
            cmd_scenario(key, list, source, actors)
        }
        Commands::Positions { source } => cmd_positions(source),
        Commands::Classify { hole, board } => cmd_classify(&hole, &board),
        Commands::Texture { board } => cmd_texture(&board),
    }
}

/// Postflop streets from `--street` values; all three when none are given.
fn parse_streets(values: &[String]) -> AnalyticsResult<Vec<Street>> {
    if values.is_empty() {
        return Ok(Street::POSTFLOP.to_vec());
    }
    let mut streets = BTreeSet::new();
    for value in values {
        match Street::from_str(value) {
            Some(street) if Street::POSTFLOP.contains(&street) => {
                streets.insert(street);
            }
            _ => {
                return Err(AnalyticsError::InvalidValue(format!(
                    "Invalid street '{}'. Valid: flop, turn, river",
                    value
                )))
            }
        }
    }
    Ok(streets.into_iter().collect())
}

fn data_paths(cache: &CacheArgs) -> DataPaths {
    match &cache.cache_dir {
        Some(dir) => DataPaths::with_cache_dir(dir),
        None => DataPaths::from_env(),
    }
}

fn run_options(source: &SourceArgs, cache: &CacheArgs) -> RunOptions {
    RunOptions {
        max_hands: source.max_hands,
        output: cache.output.clone(),
        force: cache.force,
    }
}

fn print_provenance(provenance: &Provenance, start: Instant) {
    match provenance {
        Provenance::Cache => println!("  {}", "Loaded from cache (use --force to rebuild)".dimmed()),
        Provenance::Built(stats) => println!(
            "  {} {} in {:.1}s",
            "Built:".bold(),
            stats_line(stats),
            start.elapsed().as_secs_f64()
        ),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_matrix(
    source: SourceArgs,
    actors: ActorArgs,
    cache: CacheArgs,
    streets: Vec<String>,
    min_events: u64,
) -> AnalyticsResult<()> {
    let config = WalkerConfig { actors: actors.actors(), streets: parse_streets(&streets)? };
    let paths = data_paths(&cache);
    let options = run_options(&source, &cache);

    let start = Instant::now();
    let (payload, provenance) = load_or_build_matrix(&source.input, &paths, &options, &config)?;
    println!();
    print_provenance(&provenance, start);

    let mut shown = 0;
    for scenario in &payload.scenarios {
        let events: u64 = scenario.metrics.iter().map(|m| m.events).sum();
        if events < min_events {
            continue;
        }
        print_section(&matrix_heading(scenario), &matrix_table(scenario));
        shown += 1;
    }
    println!();
    if shown == 0 {
        println!("  {}", "No scenarios matched.".yellow());
    } else {
        print_success(&format!("{} scenarios", shown));
    }
    Ok(())
}

fn cmd_events(
    source: SourceArgs,
    actors: ActorArgs,
    streets: Vec<String>,
    output: Option<PathBuf>,
) -> AnalyticsResult<()> {
    let config = WalkerConfig { actors: actors.actors(), streets: parse_streets(&streets)? };
    let lines = read_lines(&source.input, source.max_hands)?;

    let stats = match &output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_events(lines, &config, &mut writer)?
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            let stats = write_events(lines, &config, &mut writer)?;
            writer.flush()?;
            stats
        }
    };
    log::info!("{}", stats_line(&stats));
    Ok(())
}

fn cmd_curves(
    source: SourceArgs,
    actors: ActorArgs,
    cache: CacheArgs,
    position: Option<String>,
    min_samples: u64,
) -> AnalyticsResult<()> {
    let config = WalkerConfig { actors: actors.actors(), streets: Vec::new() };
    let wanted = position.as_deref().map(SeatPosition::from_label);
    let paths = data_paths(&cache);
    let options = run_options(&source, &cache);

    let start = Instant::now();
    let (curves, provenance) = load_or_build_curves(&source.input, &paths, &options, &config)?;
    println!();
    print_provenance(&provenance, start);

    let mut shown = 0;
    for scenario in &curves {
        if scenario.sample_size < min_samples {
            continue;
        }
        if let Some(want) = wanted {
            if SeatPosition::from_label(&scenario.hero_position) != want {
                continue;
            }
        }
        print_section(&curve_heading(scenario), &curve_table(scenario));
        shown += 1;
    }
    println!();
    if shown == 0 {
        println!("  {}", "No curves matched.".yellow());
    } else {
        print_success(&format!("{} curves", shown));
    }
    Ok(())
}

fn cmd_scenario(
    key: Option<String>,
    list: bool,
    source: Option<SourceArgs>,
    actors: ActorArgs,
) -> AnalyticsResult<()> {
    let key = match key {
        Some(key) if !list => key,
        _ => {
            println!();
            for d in builtin_scenarios() {
                println!("  {:<12} {}", d.key.bold(), d.title);
            }
            println!();
            return Ok(());
        }
    };
    let descriptor = find_scenario(&key)?;
    let source = source.ok_or_else(|| AnalyticsError::InvalidValue("--input is required".to_string()))?;
    let config = WalkerConfig { actors: actors.actors(), streets: Vec::new() };

    let start = Instant::now();
    let (summary, stats) = summarize_scenario(read_lines(&source.input, source.max_hands)?, descriptor, &config);
    println!();
    println!("  {} {} in {:.1}s", "Scanned:".bold(), stats_line(&stats), start.elapsed().as_secs_f64());
    print_section(&descriptor.title, &scenario_table(descriptor, &summary));
    println!();
    Ok(())
}

fn cmd_positions(source: SourceArgs) -> AnalyticsResult<()> {
    let start = Instant::now();
    let (counts, stats) = position_distribution(read_lines(&source.input, source.max_hands)?);
    println!();
    println!("  {} {} in {:.1}s", "Scanned:".bold(), stats_line(&stats), start.elapsed().as_secs_f64());
    println!();
    println!("{}", position_table("Hero", &counts.hero));
    println!();
    println!("{}", position_table("All dealt players", &counts.all));
    println!();
    Ok(())
}

fn cmd_classify(hole: &str, board: &str) -> AnalyticsResult<()> {
    let hole_cards = parse_hole(hole)?;
    let board_cards = parse_board(board)?;
    let class = classify(&hole_cards, &board_cards)?;
    let labels = texture(&board_cards[..3.min(board_cards.len())]);

    println!();
    println!("  Hand:  {}", board_display(&hole_cards));
    println!("  Board: {}", board_display(&board_cards));
    println!();
    println!("{}", classification_table(&class, &labels));
    println!();
    Ok(())
}

fn cmd_texture(board: &str) -> AnalyticsResult<()> {
    let cards = parse_board(board)?;
    if cards.len() != 3 {
        return Err(AnalyticsError::InvalidBoardNotation(format!(
            "{} (a flop has exactly 3 cards)",
            board
        )));
    }
    println!();
    println!("  Flop: {}", board_display(&cards));
    println!();
    println!("{}", texture_table(&texture(&cards)));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_streets_defaults_to_postflop() {
        assert_eq!(parse_streets(&[]).unwrap(), Street::POSTFLOP.to_vec());
        assert_eq!(
            parse_streets(&["river".to_string(), "flop".to_string()]).unwrap(),
            vec![Street::Flop, Street::River]
        );
        assert!(parse_streets(&["preflop".to_string()]).is_err());
    }

    #[test]
    fn test_actor_flags() {
        let args = ActorArgs { players: vec!["villain".into()], all_players: false };
        assert_eq!(args.actors(), Actors::Named(["villain".to_string()].into_iter().collect()));
        assert_eq!(ActorArgs::default().actors(), Actors::Hero);
    }
}
