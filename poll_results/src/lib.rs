/*!
Selection tracking, vote change detection and result aggregation for polls.

A poll view goes through three steps:
- the options checked by the user are tracked in a [`selection::SelectionState`],
  following the single- or multiple-choice rule of the poll;
- before submitting, [`diff::classify`] tells whether the selection is a first vote,
  the vote already recorded, or a change of vote;
- the sparse vote counts sent by the store are turned by [`aggregate::aggregate`]
  into a [`ResultSeries`] aligned with the options of the poll, ready for a
  pie or a bar chart.

[`view::PollSession`] ties these steps to the external collaborators (poll store,
vote submission, count feed) and discards responses for views that were closed.

```
use poll_results::builder::PollBuilder;
use poll_results::{aggregate::aggregate, VoteCount};
# use poll_results::PollErrors;

let poll = PollBuilder::new("p1", "Favourite color?")
    .option("o1", "Red")?
    .option("o2", "Blue")?
    .build()?;
let series = aggregate(poll.options(), &[VoteCount::new("o1", 3)]);
assert_eq!(series.values, vec![3, 0]);
assert_eq!(series.percentages, vec![100.0, 0.0]);
# Ok::<(), PollErrors>(())
```
*/

mod config;

pub mod aggregate;
pub mod builder;
pub mod chart;
pub mod diff;
pub mod manual;
pub mod selection;
pub mod view;

pub use crate::config::*;
