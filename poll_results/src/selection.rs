use crate::config::*;
use log::{debug, warn};
use std::collections::BTreeSet;

/// The options a user currently has checked for one poll.
///
/// A selection lives as long as the poll view that created it. It is created
/// from the previous vote (if any) and is only changed through `toggle`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SelectionState {
    pub poll_id: PollId,
    chosen: BTreeSet<OptionId>,
}

impl SelectionState {
    /// Starts a selection for the poll, checking the options of the previous vote.
    ///
    /// Options of the previous vote that the poll does not offer anymore are left
    /// unchecked. A single-choice poll with a previous vote for several options
    /// starts with nothing checked.
    pub fn initialize(poll: &Poll, previous: Option<&VoteRecord>) -> Result<SelectionState, PollErrors> {
        let chosen = match previous {
            Some(vr) if vr.poll_id != poll.id => {
                return Err(PollErrors::DataShape(format!(
                    "vote record for poll {} used with poll {}",
                    vr.poll_id, poll.id
                )));
            }
            Some(vr) => {
                let mut known: BTreeSet<OptionId> = BTreeSet::new();
                for oid in vr.option_ids() {
                    if poll.contains(oid) {
                        known.insert(oid.clone());
                    } else {
                        warn!(
                            "SelectionState::initialize: poll {}: dropping unknown option {} of the previous vote",
                            poll.id, oid
                        );
                    }
                }
                if !poll.allows_multiple_choice && known.len() > 1 {
                    warn!(
                        "SelectionState::initialize: poll {}: previous vote has {} options for a single-choice poll",
                        poll.id,
                        known.len()
                    );
                    known.clear();
                }
                known
            }
            None => BTreeSet::new(),
        };
        debug!(
            "SelectionState::initialize: poll {}: {:?}",
            poll.id, chosen
        );
        Ok(SelectionState {
            poll_id: poll.id.clone(),
            chosen,
        })
    }

    pub fn chosen(&self) -> &BTreeSet<OptionId> {
        &self.chosen
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    /// Checks or unchecks an option.
    ///
    /// For a single-choice poll, the option always replaces the current one (it is
    /// never unchecked). For a multiple-choice poll, the option is flipped, and the
    /// selection may become empty.
    pub fn toggle(&mut self, poll: &Poll, option_id: &OptionId) -> Result<&BTreeSet<OptionId>, PollErrors> {
        if poll.id != self.poll_id {
            return Err(PollErrors::DataShape(format!(
                "selection for poll {} used with poll {}",
                self.poll_id, poll.id
            )));
        }
        if !poll.is_active {
            return Err(PollErrors::InactivePoll);
        }
        if !poll.contains(option_id) {
            return Err(PollErrors::UnknownOption(option_id.clone()));
        }
        if poll.allows_multiple_choice {
            if !self.chosen.remove(option_id) {
                self.chosen.insert(option_id.clone());
            }
        } else {
            self.chosen.clear();
            self.chosen.insert(option_id.clone());
        }
        debug!("toggle: {} -> {:?}", option_id, self.chosen);
        Ok(&self.chosen)
    }

    /// Drops the current selection.
    pub fn clear(&mut self) {
        self.chosen.clear();
    }
}
