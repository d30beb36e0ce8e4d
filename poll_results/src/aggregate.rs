use crate::config::*;
use log::debug;
use std::collections::HashMap;

impl ResultSeries {
    /// The series of a poll that has not received any vote.
    pub fn empty(options: &[PollOption]) -> ResultSeries {
        aggregate(options, &[])
    }

    /// The rows of the statistics view: label, number of votes and percentage.
    pub fn rows(&self) -> impl Iterator<Item = (&str, u64, f64)> + '_ {
        self.labels
            .iter()
            .zip(self.values.iter())
            .zip(self.percentages.iter())
            .map(|((l, v), p)| (l.as_str(), *v, *p))
    }
}

/// Percentage of `value` in `total`, rounded half-up to two decimals.
///
/// The rounding is done on integer hundredths of a percent, so that values
/// such as 1/8 land exactly on 12.5.
pub fn percentage(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let num = (value as u128) * 10_000 * 2 + (total as u128);
    let hundredths = num / (2 * total as u128);
    hundredths as f64 / 100.0
}

/// Aligns a sparse vote-count feed with the options of a poll.
///
/// Options without an entry in the feed get zero votes. Entries that do not
/// match an option are dropped. If the feed has several entries for the same
/// option, they are added together. No state is kept between calls.
///
/// Sums saturate at `u64::MAX`.
pub fn aggregate(options: &[PollOption], counts: &[VoteCount]) -> ResultSeries {
    let mut by_id: HashMap<&OptionId, u64> =
        options.iter().map(|o| (&o.id, 0)).collect();
    for vc in counts.iter() {
        match by_id.get_mut(&vc.option_id) {
            Some(c) => {
                *c = c.saturating_add(vc.count);
            }
            None => {
                debug!(
                    "aggregate: dropping count {} for unknown option {}",
                    vc.count, vc.option_id
                );
            }
        }
    }

    let values: Vec<u64> = options
        .iter()
        .map(|o| by_id.get(&o.id).cloned().unwrap_or(0))
        .collect();
    let total: u64 = values.iter().fold(0u64, |acc, v| acc.saturating_add(*v));
    let percentages: Vec<f64> = values.iter().map(|v| percentage(*v, total)).collect();
    debug!("aggregate: values: {:?} total: {}", values, total);

    ResultSeries {
        labels: options.iter().map(|o| o.label.clone()).collect(),
        values,
        total,
        percentages,
    }
}
