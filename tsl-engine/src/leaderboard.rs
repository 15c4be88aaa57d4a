//! Cross-level player leaderboard.
//!
//! Every loaded level credits its verifier with a full completion and each record
//! holder with either a completion or a progress entry, all scored by the level's
//! rank. Usernames fold case-insensitively into the first casing seen, so
//! `"Foo"` verifying one level and `"foo"` beating another is a single player.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::level::{Level, LevelId};
use crate::list::LoadedList;
use crate::score::{ScoringPolicy, score_with_policy};

/// One scored verification, completion or progress event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub rank: usize,
    pub level: String,
    /// Full precision; only player totals are rounded.
    pub score: f64,
    pub link: String,
    /// Achieved percent, present on progress entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
}

/// Everything one player earned across the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    /// First-seen casing of the username.
    pub user: String,
    pub total: f64,
    pub verified: Vec<ScoreEntry>,
    pub completed: Vec<ScoreEntry>,
    pub progressed: Vec<ScoreEntry>,
}

impl PlayerAggregate {
    fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            total: 0.0,
            verified: Vec::new(),
            completed: Vec::new(),
            progressed: Vec::new(),
        }
    }

    /// All entries in verified, completed, progressed order.
    pub fn entries(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.verified
            .iter()
            .chain(&self.completed)
            .chain(&self.progressed)
    }
}

/// Sorted players plus the identifiers that failed to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub players: Vec<PlayerAggregate>,
    pub errors: Vec<LevelId>,
}

impl Leaderboard {
    /// Case-insensitive lookup of a player.
    #[must_use]
    pub fn player(&self, user: &str) -> Option<&PlayerAggregate> {
        let key = fold(user);
        self.players.iter().find(|player| fold(&player.user) == key)
    }

    /// 1-based standing of a player, ties sharing their first position.
    #[must_use]
    pub fn standing(&self, user: &str) -> Option<usize> {
        let player = self.player(user)?;
        let position = self
            .players
            .iter()
            .position(|other| other.total <= player.total)?;
        Some(position + 1)
    }
}

fn fold(user: &str) -> String {
    user.to_lowercase()
}

/// Folding registry: lower-cased username to an index into first-seen order.
#[derive(Default)]
struct Registry {
    index: HashMap<String, usize>,
    players: Vec<PlayerAggregate>,
}

impl Registry {
    fn resolve(&mut self, user: &str) -> &mut PlayerAggregate {
        let slot = *self.index.entry(fold(user)).or_insert_with(|| {
            self.players.push(PlayerAggregate::new(user));
            self.players.len() - 1
        });
        &mut self.players[slot]
    }

    fn credit_level(&mut self, rank: usize, level: &Level, policy: &ScoringPolicy) {
        let required = level.percent_to_qualify;
        let full = score_with_policy(rank, 100, required, policy);

        self.resolve(&level.verifier).verified.push(ScoreEntry {
            rank,
            level: level.name.clone(),
            score: full,
            link: level.verification.clone(),
            percent: None,
        });

        for record in &level.records {
            let player = self.resolve(&record.user);
            if record.is_completion() {
                player.completed.push(ScoreEntry {
                    rank,
                    level: level.name.clone(),
                    score: full,
                    link: record.link.clone(),
                    percent: None,
                });
            } else {
                player.progressed.push(ScoreEntry {
                    rank,
                    level: level.name.clone(),
                    score: score_with_policy(rank, record.percent, required, policy),
                    link: record.link.clone(),
                    percent: Some(record.percent),
                });
            }
        }
    }
}

/// Aggregate a loaded list with the default scoring policy.
#[must_use]
pub fn aggregate(list: &LoadedList) -> Leaderboard {
    aggregate_with_policy(list, &ScoringPolicy::default())
}

/// Aggregate a loaded list.
///
/// Failed positions contribute nothing and are listed in `errors` in list order.
/// Players are sorted by total, descending; equal totals keep first-seen order.
#[must_use]
pub fn aggregate_with_policy(list: &LoadedList, policy: &ScoringPolicy) -> Leaderboard {
    let mut registry = Registry::default();
    let mut errors = Vec::new();

    for (index, slot) in list.slots.iter().enumerate() {
        match slot {
            Ok(level) => registry.credit_level(index + 1, level, policy),
            Err(failure) => errors.push(failure.id.clone()),
        }
    }

    let mut players = registry.players;
    for player in &mut players {
        let sum: f64 = player.entries().map(|entry| entry.score).sum();
        player.total = policy.round(sum);
    }
    players.sort_by(|a, b| b.total.total_cmp(&a.total));

    Leaderboard { players, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Record;
    use crate::loader::LevelFailure;
    use crate::score::{round, score};
    use serde_json::Map;

    fn record(user: &str, percent: u8) -> Record {
        Record {
            user: user.to_string(),
            percent,
            link: format!("https://example.com/{user}"),
            mobile: false,
            hz: None,
        }
    }

    fn level(name: &str, verifier: &str, required: u8, records: Vec<Record>) -> Level {
        Level {
            id: None,
            name: name.to_string(),
            author: String::new(),
            creators: Vec::new(),
            verifier: verifier.to_string(),
            verification: format!("https://example.com/{name}"),
            percent_to_qualify: required,
            records,
            path: LevelId::new(name.to_lowercase()),
            source: "test".to_string(),
            fallback: false,
            extra: Map::new(),
        }
    }

    fn failed(id: &str) -> Result<Level, LevelFailure> {
        Err(LevelFailure {
            id: LevelId::new(id),
            attempts: Vec::new(),
        })
    }

    #[test]
    fn verifier_and_records_are_credited() {
        let list = LoadedList::from_slots(
            "_list",
            vec![Ok(level(
                "Alpha",
                "Vera",
                50,
                vec![record("Bo", 100), record("Cy", 70)],
            ))],
        );
        let board = aggregate(&list);

        let vera = board.player("vera").unwrap();
        assert_eq!(vera.verified.len(), 1);
        assert_eq!(vera.verified[0].link, "https://example.com/Alpha");
        assert!(vera.verified[0].percent.is_none());

        let bo = board.player("Bo").unwrap();
        assert_eq!(bo.completed.len(), 1);
        assert!((bo.total - vera.total).abs() < f64::EPSILON);

        let cy = board.player("Cy").unwrap();
        assert_eq!(cy.progressed[0].percent, Some(70));
        assert!((cy.progressed[0].score - score(1, 70, 50)).abs() < 1e-12);
        assert_eq!(board.players.len(), 3);
        assert!(board.errors.is_empty());
    }

    #[test]
    fn identity_folds_across_verifier_and_records() {
        let list = LoadedList::from_slots(
            "_list",
            vec![
                Ok(level("One", "Foo", 50, vec![])),
                Ok(level("Two", "Other", 50, vec![record("FOO", 100)])),
                Ok(level("Three", "Other", 50, vec![record("foo", 80)])),
            ],
        );
        let board = aggregate(&list);

        let foos: Vec<&PlayerAggregate> = board
            .players
            .iter()
            .filter(|player| player.user.eq_ignore_ascii_case("foo"))
            .collect();
        assert_eq!(foos.len(), 1);
        assert_eq!(foos[0].user, "Foo");
        assert_eq!(foos[0].entries().count(), 3);
        let expected = round(score(1, 100, 50) + score(2, 100, 50) + score(3, 80, 50));
        assert!((foos[0].total - expected).abs() < 1e-9);
    }

    #[test]
    fn failed_slots_are_skipped_and_reported() {
        let list = LoadedList::from_slots(
            "_list",
            vec![
                Ok(level("A", "Ann", 50, vec![])),
                failed("broken-b"),
                Ok(level("C", "Ann", 50, vec![])),
            ],
        );
        let board = aggregate(&list);
        assert_eq!(board.errors, vec![LevelId::new("broken-b")]);

        let ann = board.player("Ann").unwrap();
        let ranks: Vec<usize> = ann.verified.iter().map(|entry| entry.rank).collect();
        assert_eq!(ranks, [1, 3]);
    }

    #[test]
    fn total_is_rounded_after_summing() {
        let list = LoadedList::from_slots(
            "_list",
            vec![
                Ok(level("A", "X", 57, vec![record("P", 61)])),
                Ok(level("B", "X", 33, vec![record("P", 47)])),
                Ok(level("C", "X", 90, vec![record("P", 93)])),
            ],
        );
        let board = aggregate(&list);
        let player = board.player("P").unwrap();
        let raw: f64 = player.entries().map(|entry| entry.score).sum();
        assert!((player.total - round(raw)).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_totals_keep_first_seen_order() {
        let list = LoadedList::from_slots(
            "_list",
            vec![Ok(level(
                "A",
                "Zed",
                50,
                vec![record("Amy", 100), record("Max", 100)],
            ))],
        );
        let first = aggregate(&list);
        let users: Vec<&str> = first.players.iter().map(|p| p.user.as_str()).collect();
        assert_eq!(users, ["Zed", "Amy", "Max"]);
        assert_eq!(first.standing("max"), Some(1));
        assert_eq!(aggregate(&list), first);
    }

    #[test]
    fn empty_list_is_neutral() {
        let board = aggregate(&LoadedList::from_slots("_list", Vec::new()));
        assert_eq!(board, Leaderboard::default());
        assert!(board.player("anyone").is_none());
    }
}
