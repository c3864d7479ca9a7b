//! # Votes
//!
//! Each user holds at most one vote per resource. Casting the vote a user
//! already holds takes it back; casting the opposite vote switches it.
//!
//! ```text
//! previous  action  ->  next
//! none      up          up
//! up        up          none
//! down      up          up
//! any       clear       none
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Up => "up",
            Vote::Down => "down",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("invalid vote: {0}")]
pub struct InvalidVote(pub String);

impl FromStr for Vote {
    type Err = InvalidVote;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Vote::Up),
            "down" => Ok(Vote::Down),
            other => Err(InvalidVote(other.to_string())),
        }
    }
}

/// What a user asked to do with their vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Up,
    Down,
    Clear,
}

impl VoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteAction::Up => "up",
            VoteAction::Down => "down",
            VoteAction::Clear => "clear",
        }
    }
}

impl fmt::Display for VoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteAction {
    type Err = InvalidVote;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteAction::Up),
            "down" => Ok(VoteAction::Down),
            "clear" => Ok(VoteAction::Clear),
            other => Err(InvalidVote(other.to_string())),
        }
    }
}

/// Resolve a user's vote after applying `action` to `previous`.
pub fn next_vote(previous: Option<Vote>, action: VoteAction) -> Option<Vote> {
    let requested = match action {
        VoteAction::Up => Vote::Up,
        VoteAction::Down => Vote::Down,
        VoteAction::Clear => return None,
    };
    if previous == Some(requested) {
        None
    } else {
        Some(requested)
    }
}

/// Counts for a resource plus one user's vote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: u64,
    pub down: u64,
    pub score: i64,
    pub user_vote: Option<Vote>,
}

impl VoteTally {
    pub fn new(up: u64, down: u64, user_vote: Option<Vote>) -> Self {
        Self {
            up,
            down,
            score: up as i64 - down as i64,
            user_vote,
        }
    }
}

/// The up and down voter sets of one resource.
///
/// A user id is never in both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSets {
    upvoters: BTreeSet<String>,
    downvoters: BTreeSet<String>,
}

impl VoteSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(user_id, vote)` rows. A later row for the same user wins.
    pub fn from_votes<I, S>(votes: I) -> Self
    where
        I: IntoIterator<Item = (S, Vote)>,
        S: Into<String>,
    {
        let mut sets = Self::default();
        for (user, vote) in votes {
            let user = user.into();
            sets.remove(&user);
            match vote {
                Vote::Up => sets.upvoters.insert(user),
                Vote::Down => sets.downvoters.insert(user),
            };
        }
        sets
    }

    pub fn vote_of(&self, user_id: &str) -> Option<Vote> {
        if self.upvoters.contains(user_id) {
            Some(Vote::Up)
        } else if self.downvoters.contains(user_id) {
            Some(Vote::Down)
        } else {
            None
        }
    }

    pub fn up(&self) -> u64 {
        self.upvoters.len() as u64
    }

    pub fn down(&self) -> u64 {
        self.downvoters.len() as u64
    }

    pub fn score(&self) -> i64 {
        self.up() as i64 - self.down() as i64
    }

    fn remove(&mut self, user_id: &str) {
        self.upvoters.remove(user_id);
        self.downvoters.remove(user_id);
    }

    /// Apply a vote action for `user_id` and report the new tally.
    pub fn apply(&mut self, user_id: &str, action: VoteAction) -> VoteTally {
        let previous = self.vote_of(user_id);
        self.remove(user_id);
        match next_vote(previous, action) {
            Some(Vote::Up) => {
                self.upvoters.insert(user_id.to_string());
            }
            Some(Vote::Down) => {
                self.downvoters.insert(user_id.to_string());
            }
            None => {}
        }
        self.tally_for(user_id)
    }

    pub fn tally_for(&self, user_id: &str) -> VoteTally {
        VoteTally::new(self.up(), self.down(), self.vote_of(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_sequence() {
        let mut sets = VoteSets::new();

        assert_eq!(
            sets.apply("x", VoteAction::Up),
            VoteTally::new(1, 0, Some(Vote::Up))
        );
        assert_eq!(
            sets.apply("x", VoteAction::Down),
            VoteTally::new(0, 1, Some(Vote::Down))
        );
        assert_eq!(sets.apply("x", VoteAction::Down), VoteTally::new(0, 0, None));
    }

    #[test]
    fn test_double_up_then_up_again() {
        let mut sets = VoteSets::new();
        sets.apply("x", VoteAction::Up);
        assert_eq!(sets.apply("x", VoteAction::Up).user_vote, None);
        assert_eq!(sets.apply("x", VoteAction::Up).user_vote, Some(Vote::Up));
    }

    #[test]
    fn test_clear() {
        let mut sets = VoteSets::from_votes([("x", Vote::Down), ("y", Vote::Up)]);
        let tally = sets.apply("x", VoteAction::Clear);
        assert_eq!(tally, VoteTally::new(1, 0, None));
        // clearing without a vote is a no-op
        assert_eq!(sets.apply("z", VoteAction::Clear), VoteTally::new(1, 0, None));
    }

    #[test]
    fn test_sets_stay_disjoint() {
        let mut sets = VoteSets::new();
        let actions = [
            VoteAction::Up,
            VoteAction::Down,
            VoteAction::Up,
            VoteAction::Up,
            VoteAction::Down,
            VoteAction::Clear,
            VoteAction::Down,
        ];
        for (i, action) in actions.iter().enumerate() {
            let user = if i % 2 == 0 { "a" } else { "b" };
            sets.apply(user, *action);
            for user in ["a", "b"] {
                assert!(!(sets.upvoters.contains(user) && sets.downvoters.contains(user)));
            }
        }
    }

    #[test]
    fn test_score_and_independent_users() {
        let mut sets = VoteSets::new();
        sets.apply("a", VoteAction::Up);
        sets.apply("b", VoteAction::Up);
        let tally = sets.apply("c", VoteAction::Down);
        assert_eq!(tally.up, 2);
        assert_eq!(tally.down, 1);
        assert_eq!(tally.score, 1);
        assert_eq!(sets.tally_for("a").user_vote, Some(Vote::Up));
    }

    #[test]
    fn test_from_votes_last_row_wins() {
        let sets = VoteSets::from_votes([("a", Vote::Up), ("a", Vote::Down)]);
        assert_eq!(sets.vote_of("a"), Some(Vote::Down));
        assert_eq!(sets.up(), 0);
    }

    #[test]
    fn test_action_display_matches_wire_form() {
        for action in [VoteAction::Up, VoteAction::Down, VoteAction::Clear] {
            assert_eq!(action.to_string().parse::<VoteAction>().unwrap(), action);
        }
        assert_eq!(VoteAction::Clear.to_string(), "clear");
    }
}
