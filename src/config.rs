use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::history::{HandHistory, Street};

pub const CACHE_DIR_ENV: &str = "POKER_ANALYTICS_CACHE_DIR";

/// Cache file stems; the walker configuration is appended by
/// [`WalkerConfig::matrix_cache_file`] and [`WalkerConfig::curves_cache_file`].
pub const FLOP_MATRIX_CACHE: &str = "flop_response_matrix";
pub const RESPONSE_CURVES_CACHE: &str = "preflop_response_curves";

/// Filesystem locations for derived artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub cache_dir: PathBuf,
}

impl DataPaths {
    /// `POKER_ANALYTICS_CACHE_DIR` when set, else `$HOME/.poker-analytics/cache`.
    pub fn from_env() -> DataPaths {
        let cache_dir = match std::env::var(CACHE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs_cache_dir(),
        };
        DataPaths { cache_dir }
    }

    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> DataPaths {
        DataPaths { cache_dir: cache_dir.into() }
    }

    pub fn ensure_cache_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.cache_dir)
    }

    pub fn cache_file(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Explicit output location wins over the cache directory.
    pub fn output_for(&self, options: &RunOptions, default_name: &str) -> PathBuf {
        options
            .output
            .clone()
            .unwrap_or_else(|| self.cache_file(default_name))
    }
}

fn dirs_cache_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".poker-analytics").join("cache")
}

/// Knobs of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop after this many input records.
    pub max_hands: Option<usize>,
    pub output: Option<PathBuf>,
    /// Ignore an existing cache and rebuild it from the source.
    pub force: bool,
}

/// Whose bets are evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actors {
    /// The point-of-view player recorded with each hand.
    #[default]
    Hero,
    Named(BTreeSet<String>),
    Everyone,
}

impl Actors {
    pub fn includes(&self, hand: &HandHistory, player: &str) -> bool {
        match self {
            Actors::Hero => hand.hero.as_deref() == Some(player),
            Actors::Named(names) => names.contains(player),
            Actors::Everyone => true,
        }
    }

    pub fn needs_hero(&self) -> bool {
        matches!(self, Actors::Hero)
    }

    /// Filesystem-safe label used in cache file names.
    pub fn tag(&self) -> String {
        match self {
            Actors::Hero => "hero".to_string(),
            Actors::Everyone => "all".to_string(),
            Actors::Named(names) => format!("players-{}", names.iter().map(|n| file_safe(n)).join("+")),
        }
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerConfig {
    pub actors: Actors,
    /// Streets on which bet events are evaluated.
    pub streets: Vec<Street>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        WalkerConfig {
            actors: Actors::Hero,
            streets: Street::POSTFLOP.to_vec(),
        }
    }
}

impl WalkerConfig {
    pub fn flop_only(actors: Actors) -> WalkerConfig {
        WalkerConfig { actors, streets: vec![Street::Flop] }
    }

    pub fn evaluates(&self, street: Street) -> bool {
        self.streets.contains(&street)
    }

    /// Matrix cache name keyed by actors and evaluated streets.
    pub fn matrix_cache_file(&self) -> String {
        let streets = self.streets.iter().sorted().dedup().map(|s| s.as_str()).join("-");
        format!("{}.{}.{}.json", FLOP_MATRIX_CACHE, self.actors.tag(), streets)
    }

    /// Curves only read preflop, so streets do not enter the name.
    pub fn curves_cache_file(&self) -> String {
        format!("{}.{}.json", RESPONSE_CURVES_CACHE, self.actors.tag())
    }
}
