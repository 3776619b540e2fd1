use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    fn delta(self) -> i64 {
        match self {
            VoteKind::Upvote => 1,
            VoteKind::Downvote => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    #[serde(default)]
    pub user_vote: Option<VoteKind>,
    #[serde(default)]
    pub score: i64,
}

impl VoteTally {
    pub fn cast(self, kind: VoteKind) -> Self {
        Self {
            user_vote: Some(kind),
            score: self.score + kind.delta(),
        }
    }
}

/// A vote tally with at most one unconfirmed local change layered on top of
/// the last server-confirmed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimisticVote {
    confirmed: VoteTally,
    pending: Option<VoteTally>,
}

impl OptimisticVote {
    pub fn new(confirmed: VoteTally) -> Self {
        Self {
            confirmed,
            pending: None,
        }
    }

    /// What the presentation should show right now.
    pub fn current(&self) -> VoteTally {
        self.pending.unwrap_or(self.confirmed)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self, kind: VoteKind) -> VoteTally {
        let next = self.current().cast(kind);
        self.pending = Some(next);
        next
    }

    pub fn confirm(&mut self) -> VoteTally {
        if let Some(pending) = self.pending.take() {
            self.confirmed = pending;
        }
        self.confirmed
    }

    pub fn rollback(&mut self) -> VoteTally {
        self.pending = None;
        self.confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upvote_is_applied_locally_then_confirmed() {
        let mut vote = OptimisticVote::new(VoteTally {
            user_vote: None,
            score: 4,
        });
        let shown = vote.begin(VoteKind::Upvote);
        assert_eq!(shown.score, 5);
        assert_eq!(shown.user_vote, Some(VoteKind::Upvote));
        assert!(vote.is_pending());

        let confirmed = vote.confirm();
        assert_eq!(confirmed, shown);
        assert!(!vote.is_pending());
    }

    #[test]
    fn failed_downvote_restores_confirmed_tally() {
        let confirmed = VoteTally {
            user_vote: Some(VoteKind::Upvote),
            score: 2,
        };
        let mut vote = OptimisticVote::new(confirmed);
        assert_eq!(vote.begin(VoteKind::Downvote).score, 1);
        assert_eq!(vote.rollback(), confirmed);
        assert_eq!(vote.current(), confirmed);
    }

    #[test]
    fn vote_kind_uses_backend_spelling() {
        assert_eq!(
            serde_json::to_string(&VoteKind::Downvote).expect("encode"),
            "\"DOWNVOTE\""
        );
    }
}
