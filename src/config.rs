//! Gambit - Engine Configuration
//!
//! In-memory settings for the engine controller. The UCI front end maps
//! `setoption` onto these fields.

use std::time::Duration;

use crate::move_generator::PromotionMode;
use crate::parallel_search::ParallelSearch;
use crate::search::{SearchStrategy, SerialSearch, MAX_SEARCH_DEPTH};
use crate::transposition::DEFAULT_ENTRIES;

/// Worker count ceiling for the default configuration
const DEFAULT_MAX_THREADS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Serial,
    Parallel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Budget for `start_thinking` without an explicit duration
    pub think_time: Duration,
    /// Book moves are played up to and including this ply
    pub max_book_ply: u32,
    pub search_mode: SearchMode,
    /// Worker threads in parallel mode
    pub threads: usize,
    pub tt_entries: usize,
    pub search_promotions: PromotionMode,
    pub max_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            think_time: Duration::from_secs(5),
            max_book_ply: 16,
            search_mode: SearchMode::Serial,
            threads: num_cpus::get().clamp(1, DEFAULT_MAX_THREADS),
            tt_entries: DEFAULT_ENTRIES,
            search_promotions: PromotionMode::QueenAndKnight,
            max_depth: MAX_SEARCH_DEPTH,
        }
    }
}

impl EngineConfig {
    /// The search strategy this configuration selects
    pub fn strategy(&self) -> Box<dyn SearchStrategy> {
        match self.search_mode {
            SearchMode::Serial => {
                Box::new(SerialSearch::new(self.max_depth, self.search_promotions))
            }
            SearchMode::Parallel => Box::new(ParallelSearch::new(
                self.threads.min(self.max_depth.max(1) as usize),
                self.search_promotions,
            )),
        }
    }
}
