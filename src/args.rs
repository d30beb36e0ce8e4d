use clap::Parser;

/// This is a poll tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file describing the poll, the user and the count sources (JSON).
    /// For more information about the file format, read the documentation of the poll_results crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference file containing the expected summary in JSON format. If provided, polltally will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the poll will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the vote counts are read from this file instead of the count sources
    /// listed in the configuration.
    #[clap(long, value_parser)]
    pub counts: Option<String>,

    /// (default json) The type of the file given with --counts: json, csv or xlsx.
    #[clap(long, value_parser)]
    pub counts_type: Option<String>,

    /// (pie or bar) The chart used to display the results. Overrides the value of the configuration.
    #[clap(long, value_parser)]
    pub chart: Option<String>,

    /// (file path or empty) A JSON file holding the recorded votes. It is created if it does not exist.
    /// Required to submit votes.
    #[clap(long, value_parser)]
    pub ledger: Option<String>,

    /// If passed as an argument, closes the poll if it is open, or reopens it if it is closed. Requires --ledger.
    #[clap(long, takes_value = false)]
    pub toggle_status: bool,

    /// If passed as an argument, removes all the votes recorded for the poll before anything else. Requires --ledger.
    #[clap(long, takes_value = false)]
    pub reset_votes: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
