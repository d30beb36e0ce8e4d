//! The poll view: wires the data loaded by the external collaborators into the
//! selection, the vote comparison and the results.

use crate::aggregate::aggregate;
use crate::config::*;
use crate::diff::{classify, validate_submission, Ballot, VoteChange};
use crate::selection::SelectionState;
use log::{debug, info, warn};
use std::collections::BTreeSet;

// ********* Collaborators ***********

/// A poll with the vote of the current user, if there is one.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LoadedPoll {
    pub poll: Poll,
    pub previous: Option<VoteRecord>,
}

/// Fetches polls. `Ok(None)` means that the poll does not exist.
pub trait PollSource {
    fn fetch_poll(&self, poll_id: &PollId, user_id: &UserId) -> Result<Option<LoadedPoll>, PollErrors>;
}

/// Sends accepted ballots to the store.
pub trait VoteSink {
    fn submit_vote(&mut self, user_id: &UserId, ballot: &Ballot) -> Result<(), PollErrors>;
}

/// Provides the sparse vote counts of a poll.
pub trait CountFeed {
    fn fetch_counts(&self, poll_id: &PollId) -> Result<Vec<VoteCount>, PollErrors>;
}

// ********* View state ***********

/// Identifies one activation of a poll view. Responses carrying an older ticket
/// are discarded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ViewTicket {
    pub poll_id: PollId,
    epoch: u64,
}

#[derive(Debug, Clone)]
pub struct PollView {
    ticket: ViewTicket,
    poll: Poll,
    previous: Option<VoteRecord>,
    selection: SelectionState,
}

impl PollView {
    pub fn poll(&self) -> &Poll {
        &self.poll
    }

    pub fn previous(&self) -> Option<&VoteRecord> {
        self.previous.as_ref()
    }

    pub fn chosen(&self) -> &BTreeSet<OptionId> {
        self.selection.chosen()
    }

    pub fn ticket(&self) -> &ViewTicket {
        &self.ticket
    }

    pub fn classify(&self) -> VoteChange {
        classify(self.selection.chosen(), self.previous.as_ref())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum LoadOutcome {
    Opened,
    /// The response belonged to a view that was closed or replaced in the meantime.
    Stale,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SubmitOutcome {
    /// First vote of the user on this poll.
    Submitted,
    /// The previous vote was replaced.
    Updated,
    /// The selection was the recorded vote: nothing was sent.
    Unchanged,
}

/// Holds the identity of the user and the poll view currently open.
///
/// There is at most one open view. Opening another poll or closing the view
/// invalidates all the tickets handed out before.
#[derive(Debug, Default)]
pub struct PollSession {
    user: Option<UserId>,
    epoch: u64,
    pending: Option<ViewTicket>,
    view: Option<PollView>,
}

impl PollSession {
    pub fn new(user: Option<UserId>) -> PollSession {
        PollSession {
            user,
            ..PollSession::default()
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn view(&self) -> Option<&PollView> {
        self.view.as_ref()
    }

    fn view_mut(&mut self) -> Result<&mut PollView, PollErrors> {
        self.view.as_mut().ok_or(PollErrors::NoActiveView)
    }

    /// Starts loading a poll. The current view, if any, is closed.
    pub fn begin_load(&mut self, poll_id: &PollId) -> ViewTicket {
        self.epoch += 1;
        self.view = None;
        let ticket = ViewTicket {
            poll_id: poll_id.clone(),
            epoch: self.epoch,
        };
        debug!("begin_load: {:?}", ticket);
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Installs the data loaded for a ticket, unless the ticket is outdated.
    pub fn finish_load(
        &mut self,
        ticket: &ViewTicket,
        loaded: Option<LoadedPoll>,
    ) -> Result<LoadOutcome, PollErrors> {
        if self.pending.as_ref() != Some(ticket) {
            warn!("finish_load: discarding stale response for {:?}", ticket);
            return Ok(LoadOutcome::Stale);
        }
        self.pending = None;
        let loaded = loaded.ok_or_else(|| PollErrors::NotFound(format!("poll {}", ticket.poll_id)))?;
        if loaded.poll.id != ticket.poll_id {
            return Err(PollErrors::DataShape(format!(
                "requested poll {}, received poll {}",
                ticket.poll_id, loaded.poll.id
            )));
        }
        let selection = SelectionState::initialize(&loaded.poll, loaded.previous.as_ref())?;
        info!(
            "Opened poll {} ({} options, previous vote: {})",
            loaded.poll.id,
            loaded.poll.options().len(),
            loaded.previous.is_some()
        );
        self.view = Some(PollView {
            ticket: ticket.clone(),
            poll: loaded.poll,
            previous: loaded.previous,
            selection,
        });
        Ok(LoadOutcome::Opened)
    }

    /// Loads a poll and the vote of the current user, and opens the view.
    pub fn open<S: PollSource>(&mut self, source: &S, poll_id: &PollId) -> Result<&PollView, PollErrors> {
        let user = self.user.clone().ok_or(PollErrors::MissingIdentity)?;
        let ticket = self.begin_load(poll_id);
        let loaded = match source.fetch_poll(poll_id, &user) {
            Ok(x) => x,
            Err(e) => {
                self.pending = None;
                return Err(e);
            }
        };
        self.finish_load(&ticket, loaded)?;
        self.view.as_ref().ok_or(PollErrors::NoActiveView)
    }

    /// Closes the view. Responses still in flight for it will be discarded.
    pub fn close(&mut self) {
        self.epoch += 1;
        self.pending = None;
        if let Some(v) = self.view.take() {
            debug!("close: poll {}", v.poll.id);
        }
    }

    pub fn toggle(&mut self, option_id: &OptionId) -> Result<&BTreeSet<OptionId>, PollErrors> {
        let view = self.view_mut()?;
        view.selection.toggle(&view.poll, option_id)
    }

    pub fn classify(&self) -> Result<VoteChange, PollErrors> {
        self.view
            .as_ref()
            .map(|v| v.classify())
            .ok_or(PollErrors::NoActiveView)
    }

    /// Sends the current selection to the store.
    ///
    /// All the local checks run before the sink is called. If the sink fails,
    /// the selection and the previous vote are left as they were.
    pub fn submit<K: VoteSink>(&mut self, sink: &mut K) -> Result<SubmitOutcome, PollErrors> {
        let user = self.user.clone().ok_or(PollErrors::MissingIdentity)?;
        let view = self.view_mut()?;
        let ballot = validate_submission(&view.poll, view.selection.chosen())?;
        let change = view.classify();
        if !change.is_submittable() {
            info!("submit: poll {}: vote unchanged, nothing to send", view.poll.id);
            return Ok(SubmitOutcome::Unchanged);
        }
        if let Err(e) = sink.submit_vote(&user, &ballot) {
            warn!("submit: poll {}: submission failed: {}", view.poll.id, e);
            return Err(e);
        }
        view.previous = Some(ballot.to_record()?);
        let outcome = match change {
            VoteChange::NoPriorVote => SubmitOutcome::Submitted,
            _ => SubmitOutcome::Updated,
        };
        info!("submit: poll {}: {:?} {:?}", view.poll.id, outcome, ballot.option_ids);
        Ok(outcome)
    }

    /// Aggregates a count feed for the view the ticket was issued for.
    /// Returns `None` if that view is not open anymore.
    pub fn apply_counts(&self, ticket: &ViewTicket, counts: &[VoteCount]) -> Option<ResultSeries> {
        match self.view.as_ref() {
            Some(v) if v.ticket == *ticket => Some(aggregate(v.poll.options(), counts)),
            _ => {
                debug!("apply_counts: discarding stale counts for {:?}", ticket);
                None
            }
        }
    }

    /// Fetches the counts of the open poll and aggregates them.
    ///
    /// A feed that cannot be understood gives the all-zero series.
    pub fn refresh<F: CountFeed>(&self, feed: &F) -> Result<ResultSeries, PollErrors> {
        let view = self.view.as_ref().ok_or(PollErrors::NoActiveView)?;
        match feed.fetch_counts(&view.poll.id) {
            Ok(counts) => Ok(aggregate(view.poll.options(), &counts)),
            Err(PollErrors::DataShape(msg)) => {
                warn!("refresh: poll {}: unexpected data format: {}", view.poll.id, msg);
                Ok(ResultSeries::empty(view.poll.options()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn colors(multiple: bool) -> Poll {
        Poll::new(
            "p1",
            "Favourite color?",
            vec![PollOption::new("o1", "Red"), PollOption::new("o2", "Blue")],
            multiple,
            true,
        )
        .unwrap()
    }

    fn ids(xs: &[&str]) -> BTreeSet<OptionId> {
        xs.iter().map(|s| OptionId::from(*s)).collect()
    }

    struct Store {
        loaded: Option<LoadedPoll>,
    }

    impl PollSource for Store {
        fn fetch_poll(&self, _poll_id: &PollId, _user_id: &UserId) -> Result<Option<LoadedPoll>, PollErrors> {
            Ok(self.loaded.clone())
        }
    }

    #[derive(Default)]
    struct Sink {
        calls: Vec<Ballot>,
        fail: bool,
    }

    impl VoteSink for Sink {
        fn submit_vote(&mut self, _user_id: &UserId, ballot: &Ballot) -> Result<(), PollErrors> {
            self.calls.push(ballot.clone());
            if self.fail {
                Err(PollErrors::Transport("Failed to submit vote.".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Feed {
        counts: Result<Vec<VoteCount>, PollErrors>,
        calls: Cell<u32>,
    }

    impl CountFeed for Feed {
        fn fetch_counts(&self, _poll_id: &PollId) -> Result<Vec<VoteCount>, PollErrors> {
            self.calls.set(self.calls.get() + 1);
            self.counts.clone()
        }
    }

    fn session_with(poll: Poll, previous: Option<&[&str]>) -> PollSession {
        let _ = env_logger::builder().is_test(true).try_init();
        let previous = previous.map(|xs| VoteRecord::new("p1", xs.iter().cloned()).unwrap());
        let store = Store {
            loaded: Some(LoadedPoll { poll, previous }),
        };
        let mut session = PollSession::new(Some("u1".into()));
        session.open(&store, &"p1".into()).unwrap();
        session
    }

    #[test]
    fn single_choice_back_to_previous_vote() {
        let mut s = session_with(colors(false), Some(&["o1"][..]));
        s.toggle(&"o2".into()).unwrap();
        assert_eq!(s.classify(), Ok(VoteChange::Changed));
        s.toggle(&"o1".into()).unwrap();
        assert_eq!(s.view().unwrap().chosen(), &ids(&["o1"]));
        assert_eq!(s.classify(), Ok(VoteChange::Unchanged));

        let mut sink = Sink::default();
        assert_eq!(s.submit(&mut sink), Ok(SubmitOutcome::Unchanged));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn multiple_choice_change_and_empty_submission() {
        let mut s = session_with(colors(true), Some(&["o1", "o2"][..]));
        s.toggle(&"o2".into()).unwrap();
        assert_eq!(s.view().unwrap().chosen(), &ids(&["o1"]));
        assert_eq!(s.classify(), Ok(VoteChange::Changed));

        s.toggle(&"o1".into()).unwrap();
        let mut sink = Sink::default();
        assert_eq!(s.submit(&mut sink), Err(PollErrors::EmptySelection));
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn single_choice_with_oversized_previous_vote() {
        let mut s = session_with(colors(false), Some(&["o1", "o2"][..]));
        assert!(s.view().unwrap().chosen().len() <= 1);
        assert_eq!(s.classify(), Ok(VoteChange::Changed));
        let mut sink = Sink::default();
        let res = s.submit(&mut sink);
        assert_eq!(res, Err(PollErrors::EmptySelection));
        assert!(res.unwrap_err().is_validation());

        s.toggle(&"o1".into()).unwrap();
        assert_eq!(s.submit(&mut sink), Ok(SubmitOutcome::Updated));
        assert_eq!(sink.calls.len(), 1);
        assert_eq!(sink.calls[0].option_ids, vec![OptionId::from("o1")]);
    }

    #[test]
    fn previous_vote_with_removed_option() {
        let mut s = session_with(colors(true), Some(&["o1", "gone"][..]));
        assert_eq!(s.view().unwrap().chosen(), &ids(&["o1"]));
        assert_eq!(s.classify(), Ok(VoteChange::Changed));
        s.toggle(&"o2".into()).unwrap();
        let mut sink = Sink::default();
        assert_eq!(s.submit(&mut sink), Ok(SubmitOutcome::Updated));
        assert_eq!(sink.calls[0].option_ids, vec![OptionId::from("o1"), OptionId::from("o2")]);
        assert_eq!(s.classify(), Ok(VoteChange::Unchanged));
    }

    #[test]
    fn first_vote_then_update() {
        let mut s = session_with(colors(true), None);
        assert_eq!(s.classify(), Ok(VoteChange::NoPriorVote));
        s.toggle(&"o2".into()).unwrap();
        let mut sink = Sink::default();
        assert_eq!(s.submit(&mut sink), Ok(SubmitOutcome::Submitted));
        assert_eq!(s.view().unwrap().previous().unwrap().option_ids(), &ids(&["o2"]));
        assert_eq!(s.classify(), Ok(VoteChange::Unchanged));

        s.toggle(&"o1".into()).unwrap();
        assert_eq!(s.submit(&mut sink), Ok(SubmitOutcome::Updated));
        assert_eq!(sink.calls.len(), 2);
        assert_eq!(sink.calls[1].option_ids, vec![OptionId::from("o1"), OptionId::from("o2")]);
    }

    #[test]
    fn failed_submission_keeps_state() {
        let mut s = session_with(colors(false), Some(&["o1"][..]));
        s.toggle(&"o2".into()).unwrap();
        let mut sink = Sink {
            fail: true,
            ..Sink::default()
        };
        let res = s.submit(&mut sink);
        assert!(matches!(res, Err(PollErrors::Transport(_))));
        let v = s.view().unwrap();
        assert_eq!(v.chosen(), &ids(&["o2"]));
        assert_eq!(v.previous().unwrap().option_ids(), &ids(&["o1"]));
    }

    #[test]
    fn no_identity_no_submission() {
        let mut s = PollSession::new(None);
        let ticket = s.begin_load(&"p1".into());
        let loaded = LoadedPoll {
            poll: colors(false),
            previous: None,
        };
        assert_eq!(s.finish_load(&ticket, Some(loaded)), Ok(LoadOutcome::Opened));
        s.toggle(&"o1".into()).unwrap();
        let mut sink = Sink::default();
        assert_eq!(s.submit(&mut sink), Err(PollErrors::MissingIdentity));
        assert!(sink.calls.is_empty());

        let store = Store { loaded: None };
        assert!(matches!(
            s.open(&store, &"p1".into()),
            Err(PollErrors::MissingIdentity)
        ));
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut s = PollSession::new(Some("u1".into()));
        let first = s.begin_load(&"p1".into());
        let second = s.begin_load(&"p1".into());
        let loaded = LoadedPoll {
            poll: colors(false),
            previous: None,
        };
        assert_eq!(s.finish_load(&first, Some(loaded.clone())), Ok(LoadOutcome::Stale));
        assert!(s.view().is_none());
        assert_eq!(s.finish_load(&second, Some(loaded)), Ok(LoadOutcome::Opened));
    }

    #[test]
    fn load_after_close_is_discarded() {
        let mut s = PollSession::new(Some("u1".into()));
        let ticket = s.begin_load(&"p1".into());
        s.close();
        let loaded = LoadedPoll {
            poll: colors(false),
            previous: None,
        };
        assert_eq!(s.finish_load(&ticket, Some(loaded)), Ok(LoadOutcome::Stale));
        assert!(s.view().is_none());
        assert_eq!(s.toggle(&"o1".into()), Err(PollErrors::NoActiveView));
    }

    #[test]
    fn missing_poll() {
        let mut s = PollSession::new(Some("u1".into()));
        let store = Store { loaded: None };
        assert!(matches!(
            s.open(&store, &"p1".into()),
            Err(PollErrors::NotFound(_))
        ));
    }

    #[test]
    fn counts_for_closed_view_are_ignored() {
        let mut s = session_with(colors(false), None);
        let ticket = s.view().unwrap().ticket().clone();
        let counts = vec![VoteCount::new("o1", 3)];
        let series = s.apply_counts(&ticket, &counts).unwrap();
        assert_eq!(series.values, vec![3, 0]);
        assert_eq!(series.percentages, vec![100.0, 0.0]);

        s.close();
        assert_eq!(s.apply_counts(&ticket, &counts), None);
    }

    #[test]
    fn refresh_many_times() {
        let s = session_with(colors(false), None);
        let feed = Feed {
            counts: Ok(vec![VoteCount::new("o2", 1), VoteCount::new("o1", 3)]),
            calls: Cell::new(0),
        };
        let a = s.refresh(&feed).unwrap();
        let b = s.refresh(&feed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.values, vec![3, 1]);
        assert_eq!(a.percentages, vec![75.0, 25.0]);
        assert_eq!(feed.calls.get(), 2);
    }

    #[test]
    fn refresh_with_malformed_feed() {
        let s = session_with(colors(false), None);
        let feed = Feed {
            counts: Err(PollErrors::DataShape("not a list".to_string())),
            calls: Cell::new(0),
        };
        let series = s.refresh(&feed).unwrap();
        assert_eq!(series.values, vec![0, 0]);
        assert_eq!(series.total, 0);

        let offline = Feed {
            counts: Err(PollErrors::Transport("offline".to_string())),
            calls: Cell::new(0),
        };
        assert!(s.refresh(&offline).is_err());
    }
}
