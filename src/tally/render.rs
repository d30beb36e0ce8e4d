// Draws the results in the terminal.

use std::io::Write;

use poll_results::aggregate::percentage;
use poll_results::chart::{ChartData, ChartMode, ChartRenderer};
use poll_results::PollErrors;

const BAR_WIDTH: u64 = 40;

pub struct TextChart<W: Write> {
    out: W,
}

impl<W: Write> TextChart<W> {
    pub fn new(out: W) -> TextChart<W> {
        TextChart { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_all(&mut self, data: &ChartData) -> std::io::Result<()> {
        let total: u64 = data.values.iter().fold(0u64, |acc, v| acc.saturating_add(*v));
        let max: u64 = data.values.iter().copied().max().unwrap_or(0);
        let label_width = data.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for (label, &value) in data.labels.iter().zip(data.values.iter()) {
            // Pie charts are scaled on the total, bar charts on the largest value.
            let scale = match data.mode {
                ChartMode::Proportional => total,
                ChartMode::Categorical => max,
            };
            let width = if scale == 0 {
                0
            } else {
                let scale = scale as u128;
                ((value as u128 * BAR_WIDTH as u128 * 2 + scale) / (2 * scale)).min(BAR_WIDTH as u128)
                    as usize
            };
            let bar = "#".repeat(width);
            match data.mode {
                ChartMode::Proportional => writeln!(
                    self.out,
                    "{:<lw$} |{:<bw$}| {}%",
                    label,
                    bar,
                    percentage(value, total),
                    lw = label_width,
                    bw = BAR_WIDTH as usize
                )?,
                ChartMode::Categorical => writeln!(
                    self.out,
                    "{:<lw$} |{:<bw$}| {}",
                    label,
                    bar,
                    value,
                    lw = label_width,
                    bw = BAR_WIDTH as usize
                )?,
            }
        }
        writeln!(self.out, "{} votes", total)?;
        self.out.flush()
    }
}

impl<W: Write> ChartRenderer for TextChart<W> {
    fn render(&mut self, data: &ChartData) -> Result<(), PollErrors> {
        self.write_all(data)
            .map_err(|e| PollErrors::Transport(format!("Cannot draw the chart: {}", e)))
    }
}
