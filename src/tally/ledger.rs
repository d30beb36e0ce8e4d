use crate::tally::*;

use poll_results::diff::Ballot;
use poll_results::view::{CountFeed, LoadedPoll, PollSource, VoteSink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A vote as stored in the ledger file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "pollId")]
    pub poll_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "optionIds")]
    pub option_ids: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    votes: Vec<LedgerEntry>,
    /// Polls opened or closed after their creation.
    #[serde(rename = "pollStatus", default)]
    poll_status: BTreeMap<String, bool>,
}

/// Older ledgers are a plain list of votes.
#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerContents {
    Votes(Vec<LedgerEntry>),
    Full(LedgerFile),
}

/// The votes recorded so far, one per user and poll, and the polls that were
/// opened or closed, kept in a JSON file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: String,
    entries: Vec<LedgerEntry>,
    status: BTreeMap<String, bool>,
}

impl Ledger {
    /// Reads the ledger. A missing file is an empty ledger.
    pub fn open(path: &str) -> AppResult<Ledger> {
        if !Path::new(path).exists() {
            info!("Ledger {:?} does not exist yet, starting empty", path);
            return Ok(Ledger {
                path: path.to_string(),
                entries: vec![],
                status: BTreeMap::new(),
            });
        }
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        let parsed: LedgerContents = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
        let (entries, status) = match parsed {
            LedgerContents::Votes(v) => (v, BTreeMap::new()),
            LedgerContents::Full(f) => (f.votes, f.poll_status),
        };
        info!("Ledger {:?}: {} votes", path, entries.len());
        Ok(Ledger {
            path: path.to_string(),
            entries,
            status,
        })
    }

    pub fn save(&self) -> AppResult<()> {
        let file = LedgerFile {
            votes: self.entries.clone(),
            poll_status: self.status.clone(),
        };
        let js = serde_json::to_string_pretty(&file).context(ParsingJsonSnafu {})?;
        fs::write(&self.path, js).context(WritingFileSnafu {
            path: self.path.clone(),
        })
    }

    pub fn vote_for(&self, poll_id: &PollId, user_id: &UserId) -> AppResult<Option<VoteRecord>> {
        match self
            .entries
            .iter()
            .find(|e| e.poll_id == poll_id.as_str() && e.user_id == user_id.as_str())
        {
            Some(e) => VoteRecord::new(poll_id.clone(), e.option_ids.iter().map(|s| s.as_str()))
                .map(Some)
                .context(PollSnafu {}),
            None => Ok(None),
        }
    }

    /// Records a ballot, replacing the previous vote of the user on the same poll.
    pub fn record(&mut self, user_id: &UserId, ballot: &Ballot) {
        let entry = LedgerEntry {
            poll_id: ballot.poll_id.to_string(),
            user_id: user_id.to_string(),
            option_ids: ballot.option_ids.iter().map(|x| x.to_string()).collect(),
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.poll_id == entry.poll_id && e.user_id == entry.user_id)
        {
            Some(e) => {
                debug!("record: replacing {:?}", e);
                *e = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// The number of votes received by each option of the poll. Options without
    /// votes do not appear.
    pub fn counts(&self, poll_id: &PollId) -> Vec<VoteCount> {
        let mut tally: BTreeMap<&str, u64> = BTreeMap::new();
        for e in self.entries.iter().filter(|e| e.poll_id == poll_id.as_str()) {
            for oid in e.option_ids.iter() {
                let c = tally.entry(oid.as_str()).or_insert(0);
                *c = c.saturating_add(1);
            }
        }
        tally
            .into_iter()
            .map(|(oid, count)| VoteCount::new(oid, count))
            .collect()
    }

    /// Drops all the votes of a poll. Returns the number of votes removed.
    pub fn reset_votes(&mut self, poll_id: &PollId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.poll_id != poll_id.as_str());
        before - self.entries.len()
    }

    /// The polls the user has voted on, in the order the votes were first recorded.
    pub fn voted_polls(&self, user_id: &UserId) -> Vec<PollId> {
        self.entries
            .iter()
            .filter(|e| e.user_id == user_id.as_str())
            .map(|e| PollId::from(e.poll_id.as_str()))
            .collect()
    }

    /// Whether the poll was opened (`true`) or closed (`false`). `None` if its
    /// status never changed.
    pub fn status(&self, poll_id: &PollId) -> Option<bool> {
        self.status.get(poll_id.as_str()).copied()
    }

    pub fn set_status(&mut self, poll_id: &PollId, active: bool) {
        self.status.insert(poll_id.to_string(), active);
    }
}

/// The local stand-in for the poll store: the poll comes from the configuration,
/// the votes from the ledger. The previous vote of the configuration is used
/// when the ledger has none for the user.
pub struct LocalStore {
    poll: Poll,
    previous: Option<VoteRecord>,
    ledger: Option<Ledger>,
}

impl LocalStore {
    pub fn new(poll: Poll, previous: Option<VoteRecord>, ledger: Option<Ledger>) -> LocalStore {
        LocalStore {
            poll,
            previous,
            ledger,
        }
    }

    /// The poll with the status recorded in the ledger.
    fn current_poll(&self) -> Poll {
        let mut poll = self.poll.clone();
        if let Some(active) = self.ledger.as_ref().and_then(|l| l.status(&poll.id)) {
            poll.is_active = active;
        }
        poll
    }

    /// The poll, as seen by someone who is not logged in.
    pub fn loaded_without_user(&self) -> LoadedPoll {
        LoadedPoll {
            poll: self.current_poll(),
            previous: None,
        }
    }

    /// Applies a change to the ledger and saves it. The ledger is left as it was
    /// if the file cannot be written.
    fn update<T, F>(&mut self, action: &str, f: F) -> Result<T, PollErrors>
    where
        F: FnOnce(&mut Ledger) -> T,
    {
        let ledger = match self.ledger.as_mut() {
            Some(l) => l,
            None => {
                return Err(PollErrors::Transport(format!(
                    "Failed to {}: no ledger configured",
                    action
                )));
            }
        };
        let before = ledger.clone();
        let res = f(ledger);
        if let Err(e) = ledger.save() {
            *ledger = before;
            return Err(to_poll_error(&e));
        }
        Ok(res)
    }

    /// Closes an open poll, or reopens a closed one. Returns the new status.
    pub fn toggle_poll_status(&mut self) -> Result<bool, PollErrors> {
        let poll_id = self.poll.id.clone();
        let active = !self.current_poll().is_active;
        self.update("change the poll status", |l| l.set_status(&poll_id, active))?;
        info!(
            "Poll {} is now {}",
            poll_id,
            if active { "open" } else { "closed" }
        );
        Ok(active)
    }

    /// Removes all the votes cast on the poll. Returns the number of votes removed.
    pub fn reset_votes(&mut self) -> Result<usize, PollErrors> {
        let poll_id = self.poll.id.clone();
        let removed = self.update("reset the votes", |l| l.reset_votes(&poll_id))?;
        info!("Poll {}: {} votes removed", poll_id, removed);
        Ok(removed)
    }

    pub fn voted_polls(&self, user_id: &UserId) -> Vec<PollId> {
        self.ledger
            .as_ref()
            .map(|l| l.voted_polls(user_id))
            .unwrap_or_default()
    }
}

impl PollSource for LocalStore {
    fn fetch_poll(&self, poll_id: &PollId, user_id: &UserId) -> Result<Option<LoadedPoll>, PollErrors> {
        if *poll_id != self.poll.id {
            return Ok(None);
        }
        let previous = match self.ledger.as_ref() {
            Some(l) => l
                .vote_for(poll_id, user_id)
                .map_err(|e| to_poll_error(&e))?
                .or_else(|| self.previous.clone()),
            None => self.previous.clone(),
        };
        Ok(Some(LoadedPoll {
            poll: self.current_poll(),
            previous,
        }))
    }
}

impl VoteSink for LocalStore {
    fn submit_vote(&mut self, user_id: &UserId, ballot: &Ballot) -> Result<(), PollErrors> {
        self.update("submit vote", |l| l.record(user_id, ballot))?;
        info!("Vote of {} on poll {} saved", user_id, ballot.poll_id);
        Ok(())
    }
}

impl CountFeed for LocalStore {
    fn fetch_counts(&self, poll_id: &PollId) -> Result<Vec<VoteCount>, PollErrors> {
        match self.ledger.as_ref() {
            Some(l) => Ok(l.counts(poll_id)),
            None => {
                warn!("No count source and no ledger: showing empty results");
                Ok(vec![])
            }
        }
    }
}
