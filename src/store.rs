use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::VoteRefusal;
use crate::storage::Storage;
use crate::voting::{ContentType, CreatePollRequest, Id, Poll, PollResults, Vote};

pub const DEFAULT_POLLS_KEY: &str = "polls";
pub const DEFAULT_VOTES_KEY: &str = "votes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub polls: String,
    pub votes: String,
}

impl Default for StorageKeys {
    fn default() -> StorageKeys {
        StorageKeys {
            polls: String::from(DEFAULT_POLLS_KEY),
            votes: String::from(DEFAULT_VOTES_KEY),
        }
    }
}

/// Both representations of who voted for what: the counters on each option
/// and the vote collection. They are only ever changed together, here.
struct Ledger {
    polls: Vec<Poll>,
    votes: Vec<Vote>,
}

impl Ledger {
    fn cast(&mut self, poll_id: &str, option_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<(), VoteRefusal> {
        let poll = self.polls.iter_mut()
            .find(|p| p.id == poll_id)
            .ok_or(VoteRefusal::PollNotFound)?;
        accepts_votes(poll, now)?;

        let mut existing = self.votes.iter().filter(|v| v.is_by(poll_id, user_id)).peekable();
        if !poll.allow_multiple_votes && existing.peek().is_some() {
            return Err(VoteRefusal::AlreadyVoted);
        }
        if existing.any(|v| v.option_id == option_id) {
            return Err(VoteRefusal::AlreadyVotedForOption);
        }

        let option = poll.option_mut(option_id).ok_or(VoteRefusal::OptionNotFound)?;
        option.add_voter(user_id);
        let option_id = option.id.clone();
        let mut vote = Vote::new(&poll.id, &option_id, user_id);
        vote.timestamp = now;
        self.votes.push(vote);
        Ok(())
    }

    fn retract(&mut self, poll_id: &str, option_id: &str, user_id: &str) -> Result<(), VoteRefusal> {
        let poll = self.polls.iter_mut()
            .find(|p| p.id == poll_id)
            .ok_or(VoteRefusal::PollNotFound)?;
        let index = self.votes.iter()
            .position(|v| v.matches(poll_id, option_id, user_id))
            .ok_or(VoteRefusal::VoteNotFound)?;

        self.votes.remove(index);
        if let Some(option) = poll.option_mut(option_id) {
            option.remove_voter(user_id);
        }
        Ok(())
    }

    /// Toggling only flips a vote while the poll still accepts votes, so an
    /// expired or closed poll never loses one through it.
    fn toggle(&mut self, poll_id: &str, option_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<bool, VoteRefusal> {
        let poll = self.polls.iter()
            .find(|p| p.id == poll_id)
            .ok_or(VoteRefusal::PollNotFound)?;
        accepts_votes(poll, now)?;

        if self.votes.iter().any(|v| v.matches(poll_id, option_id, user_id)) {
            self.retract(poll_id, option_id, user_id)?;
            Ok(false)
        }
        else {
            self.cast(poll_id, option_id, user_id, now)?;
            Ok(true)
        }
    }
}

fn accepts_votes(poll: &Poll, now: DateTime<Utc>) -> Result<(), VoteRefusal> {
    if !poll.is_active {
        return Err(VoteRefusal::PollInactive);
    }
    if poll.is_expired(now) {
        return Err(VoteRefusal::PollExpired);
    }
    Ok(())
}

pub struct PollStore<S> {
    storage: S,
    keys: StorageKeys,
}

impl<S: Storage> PollStore<S> {
    pub fn new(storage: S) -> PollStore<S> {
        PollStore::with_keys(storage, StorageKeys::default())
    }

    pub fn with_keys(storage: S, keys: StorageKeys) -> PollStore<S> {
        PollStore { storage, keys }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn create_poll(&self, request: CreatePollRequest, creator_id: &str) -> Poll {
        let poll = Poll::new(request, creator_id);

        let mut polls = self.load_polls();
        polls.push(poll.clone());
        self.save(&self.keys.polls, &polls);

        debug!("Created poll {} with {} options for {} {}",
            poll.id, poll.options.len(), poll.content_type, poll.content_id);
        poll
    }

    /// Active polls attached to the given article or comment, oldest first.
    pub fn polls_for_content(&self, content_type: ContentType, content_id: &str) -> Vec<Poll> {
        self.load_polls()
            .into_iter()
            .filter(|p| p.is_active && p.is_attached_to(content_type, content_id))
            .collect()
    }

    pub fn poll_by_id(&self, poll_id: &str) -> Option<Poll> {
        self.load_polls().into_iter().find(|p| p.id == poll_id)
    }

    pub fn vote(&self, poll_id: &str, option_id: &str, user_id: &str) -> bool {
        self.try_vote(poll_id, option_id, user_id).is_ok()
    }

    pub fn try_vote(&self, poll_id: &str, option_id: &str, user_id: &str) -> Result<(), VoteRefusal> {
        let mut ledger = self.load_ledger();
        match ledger.cast(poll_id, option_id, user_id, Utc::now()) {
            Ok(()) => {
                self.save_ledger(&ledger);
                debug!("Recorded vote by {user_id} for {poll_id}/{option_id}");
                Ok(())
            },
            Err(refusal) => {
                info!("Refused vote by {user_id} for {poll_id}/{option_id}: {refusal}");
                Err(refusal)
            },
        }
    }

    pub fn unvote(&self, poll_id: &str, option_id: &str, user_id: &str) -> bool {
        self.try_unvote(poll_id, option_id, user_id).is_ok()
    }

    pub fn try_unvote(&self, poll_id: &str, option_id: &str, user_id: &str) -> Result<(), VoteRefusal> {
        let mut ledger = self.load_ledger();
        match ledger.retract(poll_id, option_id, user_id) {
            Ok(()) => {
                self.save_ledger(&ledger);
                debug!("Removed vote by {user_id} for {poll_id}/{option_id}");
                Ok(())
            },
            Err(refusal) => {
                info!("Refused unvote by {user_id} for {poll_id}/{option_id}: {refusal}");
                Err(refusal)
            },
        }
    }

    /// Removes the user's vote for the option if they have one, casts it otherwise.
    pub fn toggle_vote(&self, poll_id: &str, option_id: &str, user_id: &str) -> bool {
        self.try_toggle_vote(poll_id, option_id, user_id).is_ok()
    }

    pub fn try_toggle_vote(&self, poll_id: &str, option_id: &str, user_id: &str) -> Result<(), VoteRefusal> {
        let mut ledger = self.load_ledger();
        match ledger.toggle(poll_id, option_id, user_id, Utc::now()) {
            Ok(cast) => {
                self.save_ledger(&ledger);
                let action = if cast { "Recorded" } else { "Removed" };
                debug!("{action} vote by {user_id} for {poll_id}/{option_id}");
                Ok(())
            },
            Err(refusal) => {
                info!("Refused toggle by {user_id} for {poll_id}/{option_id}: {refusal}");
                Err(refusal)
            },
        }
    }

    pub fn results(&self, poll_id: &str) -> Option<PollResults> {
        self.poll_by_id(poll_id).map(|poll| PollResults::evaluate(&poll))
    }

    pub fn has_voted(&self, poll_id: &str, user_id: &str) -> bool {
        self.load_votes().iter().any(|v| v.is_by(poll_id, user_id))
    }

    /// Option ids the user voted for in the poll, in the order the votes were cast.
    pub fn user_votes(&self, poll_id: &str, user_id: &str) -> Vec<Id> {
        self.load_votes()
            .into_iter()
            .filter(|v| v.is_by(poll_id, user_id))
            .map(|v| v.option_id)
            .collect()
    }

    /// Soft-deletes the poll. Only its creator may do so; votes are kept.
    pub fn delete_poll(&self, poll_id: &str, user_id: &str) -> bool {
        let mut polls = self.load_polls();
        let poll = match polls.iter_mut().find(|p| p.id == poll_id) {
            Some(p) => p,
            None => {
                info!("Refused delete of unknown poll {poll_id} by {user_id}");
                return false;
            },
        };
        if poll.created_by != user_id {
            info!("Refused delete of poll {poll_id} by {user_id}, created by {}", poll.created_by);
            return false;
        }

        poll.is_active = false;
        self.save(&self.keys.polls, &polls);
        debug!("Deactivated poll {poll_id}");
        true
    }

    /// Erases every poll and vote. No authorization is applied.
    pub fn clear_all(&self) {
        for key in [&self.keys.polls, &self.keys.votes] {
            if let Err(err) = self.storage.remove(key) {
                error!("Failed to clear {key}: {err}");
            }
        }
        warn!("Cleared all poll data");
    }

    fn load_polls(&self) -> Vec<Poll> {
        self.load(&self.keys.polls)
    }

    fn load_votes(&self) -> Vec<Vote> {
        self.load(&self.keys.votes)
    }

    fn load_ledger(&self) -> Ledger {
        Ledger {
            polls: self.load_polls(),
            votes: self.load_votes(),
        }
    }

    // polls first, then votes; a failure between the two leaves the counters
    // ahead of the vote collection
    fn save_ledger(&self, ledger: &Ledger) {
        self.save(&self.keys.polls, &ledger.polls);
        self.save(&self.keys.votes, &ledger.votes);
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![],
            Err(err) => {
                error!("Error reading {key} from storage: {err}");
                return vec![];
            },
        };

        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(err) => {
                warn!("Discarding undecodable {key} document: {err}");
                vec![]
            },
        }
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) {
        let encoded = match serde_json::to_string(items) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!("Error encoding {key}: {err}");
                return;
            },
        };

        if let Err(err) = self.storage.set(key, &encoded) {
            error!("Error saving {key} to storage: {err}");
        }
    }
}
