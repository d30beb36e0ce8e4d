pub use crate::config::*;

use log::debug;

/// A builder for creating polls.
///
/// ```
/// use poll_results::builder::PollBuilder;
/// # use poll_results::PollErrors;
///
/// let poll = PollBuilder::new("p1", "Favourite color?")
///     .option_text("Red")?
///     .option_text("Blue")?
///     .multiple_choice(true)
///     .build()?;
///
/// assert_eq!(poll.options()[1].id.as_str(), "p1-o2");
///
/// # Ok::<(), PollErrors>(())
/// ```
pub struct PollBuilder {
    _id: PollId,
    _question: String,
    _options: Vec<PollOption>,
    _multiple_choice: bool,
    _active: bool,
}

impl PollBuilder {
    pub fn new(id: impl Into<PollId>, question: impl Into<String>) -> PollBuilder {
        PollBuilder {
            _id: id.into(),
            _question: question.into(),
            _options: Vec::new(),
            _multiple_choice: false,
            _active: true,
        }
    }

    /// Adds an option with an id chosen by the caller.
    pub fn option(
        mut self,
        id: impl Into<OptionId>,
        label: impl Into<String>,
    ) -> Result<PollBuilder, PollErrors> {
        let label: String = label.into();
        if label.trim().is_empty() {
            return Err(PollErrors::DataShape("option labels may not be blank".to_string()));
        }
        self._options.push(PollOption::new(id, label));
        Ok(self)
    }

    /// Adds an option from its text only. The id is derived from the poll id and
    /// the position of the option, starting at 1.
    pub fn option_text(self, label: impl Into<String>) -> Result<PollBuilder, PollErrors> {
        let id = format!("{}-o{}", self._id, self._options.len() + 1);
        self.option(id, label)
    }

    pub fn options(mut self, labels: &[String]) -> Result<PollBuilder, PollErrors> {
        for label in labels {
            self = self.option_text(label.clone())?;
        }
        Ok(self)
    }

    pub fn multiple_choice(mut self, allowed: bool) -> PollBuilder {
        self._multiple_choice = allowed;
        self
    }

    pub fn active(mut self, active: bool) -> PollBuilder {
        self._active = active;
        self
    }

    pub fn build(self) -> Result<Poll, PollErrors> {
        debug!(
            "PollBuilder::build: poll {} with {} options",
            self._id,
            self._options.len()
        );
        Poll::new(
            self._id,
            self._question,
            self._options,
            self._multiple_choice,
            self._active,
        )
    }
}
