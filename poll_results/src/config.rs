use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::Display;

// ********* Identifiers ***********

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> $name {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> $name {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> $name {
                $name(s)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(
    /// The identifier of an option, as issued by the store. It is never parsed.
    OptionId
);
opaque_id!(
    /// The identifier of a poll.
    PollId
);
opaque_id!(
    /// The identifier of the current user, as supplied by the session provider.
    UserId
);

// ********* Input data structures ***********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollOption {
    pub id: OptionId,
    pub label: String,
}

impl PollOption {
    pub fn new(id: impl Into<OptionId>, label: impl Into<String>) -> PollOption {
        PollOption {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A poll, as fetched for one view.
///
/// The order of the options is significant: it defines the display order
/// and the order of every aggregated series.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    options: Vec<PollOption>,
    pub allows_multiple_choice: bool,
    pub is_active: bool,
}

impl Poll {
    /// Creates a poll after checking that it has a question and at least one option,
    /// and that no two options share an id.
    pub fn new(
        id: impl Into<PollId>,
        question: impl Into<String>,
        options: Vec<PollOption>,
        allows_multiple_choice: bool,
        is_active: bool,
    ) -> Result<Poll, PollErrors> {
        let question: String = question.into();
        if question.trim().is_empty() {
            return Err(PollErrors::EmptyQuestion);
        }
        if options.is_empty() {
            return Err(PollErrors::EmptyPoll);
        }
        let mut seen: HashSet<&OptionId> = HashSet::new();
        for o in options.iter() {
            if !seen.insert(&o.id) {
                return Err(PollErrors::DuplicateOption(o.id.clone()));
            }
        }
        Ok(Poll {
            id: id.into(),
            question,
            options,
            allows_multiple_choice,
            is_active,
        })
    }

    pub fn options(&self) -> &[PollOption] {
        &self.options
    }

    pub fn option(&self, id: &OptionId) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == *id)
    }

    pub fn contains(&self, id: &OptionId) -> bool {
        self.option(id).is_some()
    }
}

/// The last vote accepted by the store for the current user and poll.
///
/// The option ids are kept sorted, so that two records built from the same ids
/// in a different order are equal.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub poll_id: PollId,
    option_ids: BTreeSet<OptionId>,
}

impl VoteRecord {
    pub fn new<I>(poll_id: impl Into<PollId>, option_ids: I) -> Result<VoteRecord, PollErrors>
    where
        I: IntoIterator,
        I::Item: Into<OptionId>,
    {
        let option_ids: BTreeSet<OptionId> = option_ids.into_iter().map(|x| x.into()).collect();
        if option_ids.is_empty() {
            return Err(PollErrors::EmptySelection);
        }
        Ok(VoteRecord {
            poll_id: poll_id.into(),
            option_ids,
        })
    }

    pub fn option_ids(&self) -> &BTreeSet<OptionId> {
        &self.option_ids
    }
}

/// One entry of the vote-count feed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteCount {
    pub option_id: OptionId,
    pub count: u64,
}

impl VoteCount {
    pub fn new(option_id: impl Into<OptionId>, count: u64) -> VoteCount {
        VoteCount {
            option_id: option_id.into(),
            count,
        }
    }
}

// ******** Output data structures *********

/// The aggregated results of a poll, aligned with the options of the poll.
///
/// Invariants: all the sequences have the same length as the options,
/// `values` sums to `total`, and all the percentages are zero when `total` is zero.
#[derive(PartialEq, Debug, Clone)]
pub struct ResultSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub total: u64,
    pub percentages: Vec<f64>,
}

/// Errors reported by the poll components.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PollErrors {
    /// A vote must contain at least one option.
    EmptySelection,
    /// No user identity is available.
    MissingIdentity,
    /// The poll does not accept votes anymore.
    InactivePoll,
    /// The option is not part of the poll.
    UnknownOption(OptionId),
    /// A single-choice poll received this many options.
    TooManyOptions(usize),
    EmptyPoll,
    EmptyQuestion,
    DuplicateOption(OptionId),
    /// Some input data does not have the expected shape.
    DataShape(String),
    NotFound(String),
    /// Failure reported by a network or storage collaborator.
    Transport(String),
    /// No poll view is currently open.
    NoActiveView,
}

impl PollErrors {
    /// Validation errors are raised locally, before any collaborator is called.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PollErrors::EmptySelection
                | PollErrors::MissingIdentity
                | PollErrors::InactivePoll
                | PollErrors::UnknownOption(_)
                | PollErrors::TooManyOptions(_)
        )
    }
}

impl Error for PollErrors {}

impl Display for PollErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollErrors::EmptySelection => write!(f, "select at least one option"),
            PollErrors::MissingIdentity => write!(f, "please log in to vote"),
            PollErrors::InactivePoll => write!(f, "this poll is closed"),
            PollErrors::UnknownOption(id) => write!(f, "unknown option {}", id),
            PollErrors::TooManyOptions(n) => {
                write!(f, "this poll accepts a single option, got {}", n)
            }
            PollErrors::EmptyPoll => write!(f, "a poll needs at least one option"),
            PollErrors::EmptyQuestion => write!(f, "a poll needs a question"),
            PollErrors::DuplicateOption(id) => write!(f, "duplicate option {}", id),
            PollErrors::DataShape(msg) => write!(f, "unexpected data format: {}", msg),
            PollErrors::NotFound(what) => write!(f, "not found: {}", what),
            PollErrors::Transport(msg) => write!(f, "{}", msg),
            PollErrors::NoActiveView => write!(f, "no poll is currently open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Vec<PollOption> {
        vec![PollOption::new("o1", "Red"), PollOption::new("o2", "Blue")]
    }

    #[test]
    fn poll_requires_options() {
        let res = Poll::new("p1", "Favourite color?", vec![], false, true);
        assert_eq!(res, Err(PollErrors::EmptyPoll));
    }

    #[test]
    fn poll_rejects_duplicate_ids() {
        let mut options = colors();
        options.push(PollOption::new("o1", "Green"));
        let res = Poll::new("p1", "Favourite color?", options, false, true);
        assert_eq!(res, Err(PollErrors::DuplicateOption("o1".into())));
    }

    #[test]
    fn poll_rejects_blank_question() {
        let res = Poll::new("p1", "  ", colors(), false, true);
        assert_eq!(res, Err(PollErrors::EmptyQuestion));
    }

    #[test]
    fn poll_lookup() {
        let poll = Poll::new("p1", "Favourite color?", colors(), false, true).unwrap();
        assert_eq!(poll.option(&"o2".into()).map(|o| o.label.as_str()), Some("Blue"));
        assert!(!poll.contains(&"o3".into()));
    }

    #[test]
    fn vote_record_is_canonical() {
        let a = VoteRecord::new("p1", ["o2", "o1", "o2"]).unwrap();
        let b = VoteRecord::new("p1", ["o1", "o2"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.option_ids().len(), 2);
    }

    #[test]
    fn vote_record_needs_an_option() {
        let empty: Vec<OptionId> = vec![];
        assert_eq!(VoteRecord::new("p1", empty), Err(PollErrors::EmptySelection));
    }

    #[test]
    fn validation_errors() {
        assert!(PollErrors::EmptySelection.is_validation());
        assert!(PollErrors::TooManyOptions(2).is_validation());
        assert!(!PollErrors::Transport("offline".to_string()).is_validation());
    }
}
