use crate::config::*;
use log::debug;
use std::collections::BTreeSet;

/// How a selection relates to the vote already recorded for the user.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VoteChange {
    /// The user has not voted on this poll yet.
    NoPriorVote,
    /// The selection is exactly the recorded vote. Submitting it is a no-op.
    Unchanged,
    /// The selection differs from the recorded vote.
    Changed,
}

impl VoteChange {
    pub fn is_submittable(&self) -> bool {
        !matches!(self, VoteChange::Unchanged)
    }
}

/// A vote that passed the local checks and can be sent to the store.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub poll_id: PollId,
    pub option_ids: Vec<OptionId>,
}

impl Ballot {
    /// The record the store holds once this ballot has been accepted.
    pub fn to_record(&self) -> Result<VoteRecord, PollErrors> {
        VoteRecord::new(self.poll_id.clone(), self.option_ids.iter().cloned())
    }
}

fn sorted_ids<'a, I: IntoIterator<Item = &'a OptionId>>(ids: I) -> Vec<&'a OptionId> {
    let mut v: Vec<&OptionId> = ids.into_iter().collect();
    v.sort();
    v.dedup();
    v
}

/// Compares the selection with the previous vote.
///
/// Both sides are compared as sorted sequences, so the order in which the ids
/// were collected does not matter.
pub fn classify<'a, I>(chosen: I, previous: Option<&VoteRecord>) -> VoteChange
where
    I: IntoIterator<Item = &'a OptionId>,
{
    let vr = match previous {
        None => return VoteChange::NoPriorVote,
        Some(vr) => vr,
    };
    let current = sorted_ids(chosen);
    let recorded = sorted_ids(vr.option_ids());
    let res = if current == recorded {
        VoteChange::Unchanged
    } else {
        VoteChange::Changed
    };
    debug!("classify: {:?} vs {:?}: {:?}", current, recorded, res);
    res
}

/// Checks that a selection may be sent to the store, and packages it as a ballot.
///
/// This must be called before any network call: an empty selection is always refused.
pub fn validate_submission(poll: &Poll, chosen: &BTreeSet<OptionId>) -> Result<Ballot, PollErrors> {
    if chosen.is_empty() {
        return Err(PollErrors::EmptySelection);
    }
    if !poll.is_active {
        return Err(PollErrors::InactivePoll);
    }
    if let Some(oid) = chosen.iter().find(|oid| !poll.contains(oid)) {
        return Err(PollErrors::UnknownOption(oid.clone()));
    }
    if !poll.allows_multiple_choice && chosen.len() > 1 {
        debug!(
            "validate_submission: poll {} accepts a single option, got {}",
            poll.id,
            chosen.len()
        );
        return Err(PollErrors::TooManyOptions(chosen.len()));
    }
    Ok(Ballot {
        poll_id: poll.id.clone(),
        option_ids: chosen.iter().cloned().collect(),
    })
}
