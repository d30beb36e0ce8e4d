pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;
pub mod ledger;
mod render;

use log::{debug, info, warn};

use poll_results::chart::{ChartData, ChartMode, ChartRenderer};
use poll_results::diff::VoteChange;
use poll_results::view::{CountFeed, PollSession, SubmitOutcome};
use poll_results::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::ledger::{Ledger, LocalStore};
use crate::tally::render::TextChart;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Unexpected data format: {message}"))]
    DataShape { message: String },
    #[snafu(display("{source}"))]
    Poll { source: PollErrors },
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// How an error of the file layer is seen by the poll components.
///
/// Data that cannot be understood is a data shape error, everything else is a
/// failure of the collaborator.
pub fn to_poll_error(e: &AppError) -> PollErrors {
    match e {
        AppError::Poll { source } => source.clone(),
        AppError::ParsingJson { .. }
        | AppError::DataShape { .. }
        | AppError::CsvLineParse { .. }
        | AppError::EmptyExcel { .. }
        | AppError::MissingWorksheet { .. } => PollErrors::DataShape(e.to_string()),
        _ => PollErrors::Transport(e.to_string()),
    }
}

/// The count feed made of the files listed in the configuration.
///
/// CSV and Excel files carry no poll id: a file tagged with the `pollId` of
/// another poll is skipped, and untagged files are trusted to be for the poll.
pub struct FileFeed {
    root: PathBuf,
    sources: Vec<CountSource>,
}

impl FileFeed {
    pub fn new(root: PathBuf, sources: Vec<CountSource>) -> FileFeed {
        FileFeed { root, sources }
    }

    fn read_source(&self, cfs: &CountSource, poll_id: &PollId) -> AppResult<Vec<VoteCount>> {
        let p: PathBuf = self.root.join(&cfs.file_path);
        let path = p.as_path().display().to_string();
        if !cfs.is_for_poll(poll_id)? {
            warn!("Skipping count file {:?}: it is not for poll {}", path, poll_id);
            return Ok(vec![]);
        }
        info!("Attempting to read count file {:?}", path);
        match cfs.provider.as_str() {
            "json" => io_json::read_json_counts(&path, poll_id),
            "csv" => io_csv::read_csv_counts(&path, cfs),
            "xlsx" => io_xlsx::read_xlsx_counts(&path, cfs),
            x => whatever!("Provider not implemented {:?}", x),
        }
    }
}

impl CountFeed for FileFeed {
    fn fetch_counts(&self, poll_id: &PollId) -> Result<Vec<VoteCount>, PollErrors> {
        let mut data: Vec<VoteCount> = Vec::new();
        for cfs in self.sources.iter() {
            let mut counts = self.read_source(cfs, poll_id).map_err(|e| to_poll_error(&e))?;
            debug!(
                "fetch_counts: poll {}: {} entries from {}",
                poll_id,
                counts.len(),
                cfs.file_path
            );
            data.append(&mut counts);
        }
        Ok(data)
    }
}

fn change_label(change: VoteChange) -> &'static str {
    match change {
        VoteChange::NoPriorVote => "noPriorVote",
        VoteChange::Unchanged => "unchanged",
        VoteChange::Changed => "changed",
    }
}

fn submission_label(outcome: SubmitOutcome) -> &'static str {
    match outcome {
        SubmitOutcome::Submitted => "submitted",
        SubmitOutcome::Updated => "updated",
        SubmitOutcome::Unchanged => "unchanged",
    }
}

fn ids_to_json<'a, I: IntoIterator<Item = &'a OptionId>>(ids: I) -> JSValue {
    json!(ids.into_iter().map(|x| x.to_string()).collect::<Vec<String>>())
}

fn build_summary_js(
    session: &PollSession,
    change: VoteChange,
    submission: Option<SubmitOutcome>,
    series: &ResultSeries,
    mode: ChartMode,
    voted_polls: Option<Vec<PollId>>,
) -> AppResult<JSValue> {
    let view = session
        .view()
        .ok_or(PollErrors::NoActiveView)
        .context(PollSnafu {})?;
    let poll = view.poll();
    Ok(json!({
        "poll": {
            "id": poll.id.to_string(),
            "question": poll.question,
            "allowsMultipleChoice": poll.allows_multiple_choice,
            "isActive": poll.is_active,
        },
        "selection": {
            "userId": session.user().map(|u| u.to_string()),
            "previousVote": view.previous().map(|vr| ids_to_json(vr.option_ids())),
            "chosen": ids_to_json(view.chosen()),
            "change": change_label(change),
            "submission": submission.map(submission_label),
            "votedPolls": voted_polls.map(|ps| ps.iter().map(|p| p.to_string()).collect::<Vec<String>>()),
        },
        "results": {
            "chart": match mode {
                ChartMode::Proportional => "pie",
                ChartMode::Categorical => "bar",
            },
            "labels": series.labels,
            "values": series.values,
            "total": series.total,
            "percentages": series.percentages,
        }
    }))
}

fn write_summary(out: &str, pretty_js: &str) -> AppResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
    } else {
        fs::write(out, pretty_js).context(WritingFileSnafu {
            path: out.to_string(),
        })?;
        info!("Summary written to {:?}", out);
    }
    Ok(())
}

fn open_view(session: &mut PollSession, store: &LocalStore, poll_id: &PollId) -> AppResult<()> {
    if session.user().is_some() {
        session.open(store, poll_id).context(PollSnafu {})?;
    } else {
        // Results can still be shown without an identity.
        warn!("No user id provided: votes cannot be submitted");
        let ticket = session.begin_load(poll_id);
        session
            .finish_load(&ticket, Some(store.loaded_without_user()))
            .context(PollSnafu {})?;
    }
    Ok(())
}

fn replay_toggles(session: &mut PollSession, toggles: &[String]) -> AppResult<()> {
    for t in toggles.iter() {
        match session.toggle(&OptionId::from(t.as_str())) {
            Ok(chosen) => {
                debug!("replay_toggles: {} -> {:?}", t, chosen);
            }
            Err(e) if e.is_validation() => {
                warn!("replay_toggles: ignoring {}: {}", t, e);
            }
            Err(e) => {
                return Err(e).context(PollSnafu {});
            }
        }
    }
    Ok(())
}

pub fn run_poll(args: &Args) -> AppResult<JSValue> {
    let config_path = args.config.clone();
    let config_p = Path::new(config_path.as_str());
    let config = read_config(&config_path)?;
    debug!("config: {:?}", config);

    let poll = config.to_poll()?;
    info!(
        "Poll {}: {:?} ({} options)",
        poll.id,
        poll.question,
        poll.options().len()
    );
    let previous = config.previous_record(&poll.id)?;

    let ledger = match args.ledger.as_ref() {
        Some(p) => Some(Ledger::open(p)?),
        None => None,
    };
    let mut store = LocalStore::new(poll.clone(), previous, ledger);
    if args.reset_votes {
        store.reset_votes().context(PollSnafu {})?;
    }
    if args.toggle_status {
        store.toggle_poll_status().context(PollSnafu {})?;
    }
    let mut session = PollSession::new(config.user_id.clone().map(UserId::from));
    open_view(&mut session, &store, &poll.id)?;

    replay_toggles(&mut session, config.toggles.as_deref().unwrap_or(&[]))?;
    let change = session.classify().context(PollSnafu {})?;
    info!("Selection: {:?}", change);

    let submission = if config.submit.unwrap_or(false) {
        Some(session.submit(&mut store).context(PollSnafu {})?)
    } else {
        None
    };

    let series = match (&args.counts, config.count_sources.as_ref()) {
        (Some(counts_path), _) => {
            let provider = args.counts_type.clone().unwrap_or_else(|| "json".to_string());
            let feed = FileFeed::new(PathBuf::new(), vec![CountSource::new(&provider, counts_path)]);
            session.refresh(&feed)
        }
        (None, Some(sources)) if !sources.is_empty() => {
            let root = config_p.parent().context(MissingParentDirSnafu {})?;
            let feed = FileFeed::new(root.to_path_buf(), sources.clone());
            session.refresh(&feed)
        }
        _ => session.refresh(&store),
    }
    .context(PollSnafu {})?;
    info!("Results: {:?}", series);

    let mode: ChartMode = args
        .chart
        .as_ref()
        .or(config.chart.as_ref())
        .map(|s| s.parse::<ChartMode>())
        .transpose()
        .context(PollSnafu {})?
        .unwrap_or_default();
    let mut chart = TextChart::new(std::io::stdout());
    chart
        .render(&ChartData::from_series(&series, mode))
        .context(PollSnafu {})?;

    let voted_polls = session.user().map(|u| store.voted_polls(u));
    let result_js = build_summary_js(&session, change, submission, &series, mode, voted_polls)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    if let Some(out) = args.out.as_ref() {
        write_summary(out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.as_ref() {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(result_js)
}
