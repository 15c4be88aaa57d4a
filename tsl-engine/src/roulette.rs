//! Level roulette: a seeded random run through the list where each level must be
//! beaten to a higher percentage than the last.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::list::{ListError, LoadedList};

/// Ranks drawn from when [`RouletteOptions::top`] is set.
pub const TOP_POOL: std::ops::RangeInclusive<usize> = 1..=75;
/// Ranks drawn from when [`RouletteOptions::extended`] is set.
pub const EXTENDED_POOL: std::ops::RangeInclusive<usize> = 76..=150;
/// Longest run a draw produces.
pub const MAX_RUN_LEVELS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouletteError {
    #[error(transparent)]
    List(#[from] ListError),
    #[error("list is currently broken ({failures} levels failed to load)")]
    ListBroken { failures: usize },
    #[error("no level pool selected")]
    NoPools,
    #[error("give up before starting a new roulette")]
    RunActive,
    #[error("invalid percentage {percent}: must be above {current} and at most 100")]
    InvalidPercentage { percent: u8, current: u8 },
    #[error("roulette is not in progress")]
    NotActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteOptions {
    pub top: bool,
    pub extended: bool,
}

impl Default for RouletteOptions {
    fn default() -> Self {
        Self {
            top: true,
            extended: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteLevel {
    pub rank: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub video: String,
}

/// Draw a shuffled run from a fully loaded list.
///
/// # Errors
///
/// Returns an error if any level failed to load or no pool is selected.
pub fn draw(
    list: &LoadedList,
    options: RouletteOptions,
    seed: u64,
) -> Result<Vec<RouletteLevel>, RouletteError> {
    let failures = list.failures().count();
    if failures > 0 {
        return Err(RouletteError::ListBroken { failures });
    }
    if !options.top && !options.extended {
        return Err(RouletteError::NoPools);
    }

    let mut pool: Vec<RouletteLevel> = list
        .levels()
        .filter(|(rank, _)| {
            (options.top && TOP_POOL.contains(rank))
                || (options.extended && EXTENDED_POOL.contains(rank))
        })
        .map(|(rank, level)| RouletteLevel {
            rank,
            id: level.id,
            name: level.name.clone(),
            video: level.verification.clone(),
        })
        .collect();

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    pool.shuffle(&mut rng);
    pool.truncate(MAX_RUN_LEVELS);
    Ok(pool)
}

/// Progress through a drawn run. Persistence is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteRun {
    pub levels: Vec<RouletteLevel>,
    pub progression: Vec<u8>,
    #[serde(default)]
    pub given_up: bool,
}

impl RouletteRun {
    /// # Errors
    ///
    /// Returns an error if the draw is refused.
    pub fn start(
        list: &LoadedList,
        options: RouletteOptions,
        seed: u64,
    ) -> Result<Self, RouletteError> {
        Ok(Self {
            levels: draw(list, options, seed)?,
            progression: Vec::new(),
            given_up: false,
        })
    }

    /// Replace this run with a fresh draw.
    ///
    /// # Errors
    ///
    /// Returns an error if a run is still in progress or the draw is refused.
    pub fn restart(
        &mut self,
        list: &LoadedList,
        options: RouletteOptions,
        seed: u64,
    ) -> Result<(), RouletteError> {
        if self.is_active() {
            return Err(RouletteError::RunActive);
        }
        *self = Self::start(list, options, seed)?;
        Ok(())
    }

    #[must_use]
    pub fn current_level(&self) -> Option<&RouletteLevel> {
        self.levels.get(self.progression.len())
    }

    #[must_use]
    pub fn current_percentage(&self) -> u8 {
        self.progression.last().copied().unwrap_or(0)
    }

    /// Lowest percentage the next submission may carry.
    #[must_use]
    pub fn next_target(&self) -> u8 {
        self.current_percentage().saturating_add(1)
    }

    #[must_use]
    pub fn has_completed(&self) -> bool {
        self.current_percentage() >= 100 || self.progression.len() == self.levels.len()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.progression.is_empty() && !self.given_up && !self.has_completed()
    }

    /// Record the percentage reached on the current level.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is over or `percent` does not beat the last one.
    pub fn submit(&mut self, percent: u8) -> Result<(), RouletteError> {
        if self.given_up || self.has_completed() {
            return Err(RouletteError::NotActive);
        }
        let current = self.current_percentage();
        if percent <= current || percent > 100 {
            return Err(RouletteError::InvalidPercentage { percent, current });
        }
        self.progression.push(percent);
        Ok(())
    }

    pub fn give_up(&mut self) {
        self.given_up = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Level, LevelId};
    use crate::loader::LevelFailure;
    use serde_json::Map;

    fn level(rank: usize) -> Level {
        Level {
            id: Some(rank as u64 * 10),
            name: format!("Level {rank}"),
            author: String::new(),
            creators: Vec::new(),
            verifier: "V".to_string(),
            verification: format!("https://video/{rank}"),
            percent_to_qualify: 50,
            records: Vec::new(),
            path: LevelId::new(format!("l{rank}")),
            source: "test".to_string(),
            fallback: false,
            extra: Map::new(),
        }
    }

    fn list_of(len: usize) -> LoadedList {
        LoadedList::from_slots("_list", (1..=len).map(|rank| Ok(level(rank))).collect())
    }

    #[test]
    fn draw_is_seeded_and_bounded() {
        let list = list_of(160);
        let a = draw(&list, RouletteOptions::default(), 7).unwrap();
        let b = draw(&list, RouletteOptions::default(), 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), MAX_RUN_LEVELS);
        assert!(a.iter().all(|level| level.rank <= 150));
        assert_eq!(a[0].video, format!("https://video/{}", a[0].rank));
    }

    #[test]
    fn pools_select_rank_ranges() {
        let list = list_of(160);
        let top = draw(&list, RouletteOptions { top: true, extended: false }, 1).unwrap();
        assert_eq!(top.len(), 75);
        assert!(top.iter().all(|level| TOP_POOL.contains(&level.rank)));

        let extended = draw(&list, RouletteOptions { top: false, extended: true }, 1).unwrap();
        assert_eq!(extended.len(), 75);
        assert!(extended.iter().all(|level| EXTENDED_POOL.contains(&level.rank)));

        assert_eq!(
            draw(&list, RouletteOptions { top: false, extended: false }, 1),
            Err(RouletteError::NoPools)
        );
    }

    #[test]
    fn broken_list_is_refused() {
        let mut list = list_of(3);
        list.slots[1] = Err(LevelFailure {
            id: LevelId::new("l2"),
            attempts: Vec::new(),
        });
        assert_eq!(
            draw(&list, RouletteOptions::default(), 1),
            Err(RouletteError::ListBroken { failures: 1 })
        );
    }

    #[test]
    fn progression_rules() {
        let mut run = RouletteRun::start(&list_of(3), RouletteOptions::default(), 3).unwrap();
        assert!(!run.is_active());
        assert_eq!(run.next_target(), 1);
        let first = run.current_level().unwrap().clone();

        run.submit(12).unwrap();
        assert!(run.is_active());
        assert_ne!(run.current_level(), Some(&first));
        assert_eq!(
            run.submit(12),
            Err(RouletteError::InvalidPercentage {
                percent: 12,
                current: 12
            })
        );
        assert!(run.submit(101).is_err());

        run.submit(40).unwrap();
        run.submit(55).unwrap();
        assert!(run.has_completed());
        assert!(!run.is_active());
        assert_eq!(run.submit(60), Err(RouletteError::NotActive));
    }

    #[test]
    fn hundred_percent_ends_the_run_and_restart_rules() {
        let list = list_of(10);
        let mut run = RouletteRun::start(&list, RouletteOptions::default(), 9).unwrap();
        run.submit(30).unwrap();
        assert_eq!(
            run.restart(&list, RouletteOptions::default(), 10),
            Err(RouletteError::RunActive)
        );

        run.submit(100).unwrap();
        assert!(run.has_completed());
        run.restart(&list, RouletteOptions::default(), 10).unwrap();
        assert!(run.progression.is_empty());

        run.submit(5).unwrap();
        run.give_up();
        assert!(!run.is_active());
        assert_eq!(run.submit(10), Err(RouletteError::NotActive));
    }
}
