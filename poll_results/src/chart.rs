use crate::config::*;
use std::str::FromStr;

/// The two families of charts the results can be drawn with.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum ChartMode {
    /// Shares of a whole (pie chart).
    #[default]
    Proportional,
    /// One bar per option (bar chart).
    Categorical,
}

impl FromStr for ChartMode {
    type Err = PollErrors;

    fn from_str(s: &str) -> Result<ChartMode, PollErrors> {
        match s {
            "pie" | "proportional" => Ok(ChartMode::Proportional),
            "bar" | "categorical" => Ok(ChartMode::Categorical),
            x => Err(PollErrors::DataShape(format!("unknown chart type {:?}", x))),
        }
    }
}

/// The pair of labels and values handed to a chart renderer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartData {
    pub mode: ChartMode,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl ChartData {
    pub fn from_series(series: &ResultSeries, mode: ChartMode) -> ChartData {
        ChartData {
            mode,
            labels: series.labels.clone(),
            values: series.values.clone(),
        }
    }
}

/// Something that can draw the results of a poll.
pub trait ChartRenderer {
    fn render(&mut self, data: &ChartData) -> Result<(), PollErrors>;
}
