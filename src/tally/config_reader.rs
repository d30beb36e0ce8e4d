use crate::tally::io_common::read_id;
use crate::tally::*;

use poll_results::builder::PollBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

/// An option of the poll, either with an explicit id or with its text only.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionSpec {
    Full {
        id: JSValue,
        #[serde(alias = "option_text")]
        label: String,
    },
    Text(String),
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollSpec {
    #[serde(alias = "_id")]
    pub id: JSValue,
    pub question: String,
    pub options: Vec<OptionSpec>,
    #[serde(
        rename = "allowsMultipleChoice",
        alias = "is_multiple_choice",
        default
    )]
    pub allows_multiple_choice: bool,
    #[serde(rename = "isActive", alias = "isactive", default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CountSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "hasHeader")]
    pub has_header: Option<bool>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// The poll the file holds counts for. Files for other polls are skipped.
    #[serde(rename = "pollId")]
    pub poll_id: Option<JSValue>,
}

impl CountSource {
    pub fn new(provider: &str, file_path: &str) -> CountSource {
        CountSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            has_header: None,
            id_column_index: None,
            count_column_index: None,
            excel_worksheet_name: None,
            poll_id: None,
        }
    }

    /// Whether the file may hold counts for the given poll.
    pub fn is_for_poll(&self, poll_id: &PollId) -> AppResult<bool> {
        match &self.poll_id {
            Some(js) => Ok(read_id(js)? == poll_id.as_str()),
            None => Ok(true),
        }
    }

    /// The column of the option ids (0-based). The configuration counts from 1, default 1.
    pub fn id_column_index(&self) -> AppResult<usize> {
        match &self.id_column_index {
            Some(_) => Ok(read_js_int(&self.id_column_index)? - 1),
            None => Ok(0),
        }
    }

    /// The column of the counts (0-based). The configuration counts from 1, default 2.
    pub fn count_column_index(&self) -> AppResult<usize> {
        match &self.count_column_index {
            Some(_) => Ok(read_js_int(&self.count_column_index)? - 1),
            None => Ok(1),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub poll: PollSpec,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "previousVote")]
    pub previous_vote: Option<Vec<JSValue>>,
    pub toggles: Option<Vec<String>>,
    pub submit: Option<bool>,
    pub chart: Option<String>,
    #[serde(rename = "countSources")]
    pub count_sources: Option<Vec<CountSource>>,
}

impl PollConfig {
    pub fn to_poll(&self) -> AppResult<Poll> {
        let poll_id = read_id(&self.poll.id)?;
        let mut builder = PollBuilder::new(poll_id, self.poll.question.clone())
            .multiple_choice(self.poll.allows_multiple_choice)
            .active(self.poll.is_active);
        for o in self.poll.options.iter() {
            builder = match o {
                OptionSpec::Full { id, label } => builder.option(read_id(id)?, label.clone()),
                OptionSpec::Text(label) => builder.option_text(label.clone()),
            }
            .context(PollSnafu {})?;
        }
        builder.build().context(PollSnafu {})
    }

    /// The vote recorded for the user, as written in the configuration.
    pub fn previous_record(&self, poll_id: &PollId) -> AppResult<Option<VoteRecord>> {
        match &self.previous_vote {
            None => Ok(None),
            Some(ids) => {
                let mut option_ids: Vec<String> = Vec::new();
                for js in ids.iter() {
                    option_ids.push(read_id(js)?);
                }
                if option_ids.is_empty() {
                    return DataShapeSnafu {
                        message: "previousVote may not be an empty list".to_string(),
                    }
                    .fail();
                }
                VoteRecord::new(poll_id.clone(), option_ids)
                    .map(Some)
                    .context(PollSnafu {})
            }
        }
    }
}

pub fn read_config(path: &str) -> AppResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PollConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> AppResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Reads a 1-based column index, written either as a number or as an Excel-style column name.
fn read_js_int(x: &Option<JSValue>) -> AppResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Parsing the Excel-style columns: A is 1, Z is 26, AA is 27
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(s.to_ascii_lowercase().chars().fold(0, |acc, c| {
                acc * 26 + (c as usize) - ('a' as usize) + 1
            }))
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(i) if i >= 1 => Ok(i),
        _ => DataShapeSnafu {
            message: format!("invalid column index {:?}", x),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(js: JSValue) -> PollConfig {
        serde_json::from_value(js).unwrap()
    }

    #[test]
    fn poll_with_explicit_ids() {
        let config = parse(json!({
            "poll": {
                "id": "p1",
                "question": "Favourite color?",
                "options": [{"id": "o1", "label": "Red"}, {"id": {"$oid": "o2"}, "option_text": "Blue"}],
                "allowsMultipleChoice": true
            }
        }));
        let poll = config.to_poll().unwrap();
        assert_eq!(poll.id, PollId::from("p1"));
        assert!(poll.allows_multiple_choice);
        assert!(poll.is_active);
        let ids: Vec<&str> = poll.options().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o2"]);
    }

    #[test]
    fn poll_with_text_options() {
        let config = parse(json!({
            "poll": {
                "_id": {"$oid": "64f0"},
                "question": "Lunch?",
                "options": ["Pizza", "Salad"],
                "isactive": false
            }
        }));
        let poll = config.to_poll().unwrap();
        assert!(!poll.is_active);
        assert_eq!(poll.options()[1].id, OptionId::from("64f0-o2"));
        assert_eq!(poll.options()[1].label, "Salad");
    }

    #[test]
    fn poll_without_options() {
        let config = parse(json!({
            "poll": {"id": "p1", "question": "Nothing?", "options": []}
        }));
        assert!(matches!(
            config.to_poll(),
            Err(AppError::Poll {
                source: PollErrors::EmptyPoll
            })
        ));
    }

    #[test]
    fn previous_vote() {
        let config = parse(json!({
            "poll": {"id": "p1", "question": "Q", "options": ["A"]},
            "previousVote": [{"$oid": "b"}, "a"]
        }));
        let vr = config.previous_record(&"p1".into()).unwrap().unwrap();
        let ids: Vec<&str> = vr.option_ids().iter().map(|x| x.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let config = parse(json!({
            "poll": {"id": "p1", "question": "Q", "options": ["A"]},
            "previousVote": []
        }));
        assert!(config.previous_record(&"p1".into()).is_err());
    }

    #[test]
    fn column_indexes() {
        assert_eq!(read_js_int(&Some(json!(2))).unwrap(), 2);
        assert_eq!(read_js_int(&Some(json!("3"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("B"))).unwrap(), 2);
        assert_eq!(read_js_int(&Some(json!("aa"))).unwrap(), 27);
        assert!(read_js_int(&Some(json!(0))).is_err());
        assert!(read_js_int(&None).is_err());

        let mut cfs = CountSource::new("csv", "counts.csv");
        assert_eq!(cfs.id_column_index().unwrap(), 0);
        assert_eq!(cfs.count_column_index().unwrap(), 1);
        cfs.count_column_index = Some(json!("C"));
        assert_eq!(cfs.count_column_index().unwrap(), 2);
    }

    #[test]
    fn source_for_poll() {
        let mut cfs = CountSource::new("csv", "counts.csv");
        assert!(cfs.is_for_poll(&"p1".into()).unwrap());
        cfs.poll_id = Some(json!({"$oid": "p2"}));
        assert!(!cfs.is_for_poll(&"p1".into()).unwrap());
        assert!(cfs.is_for_poll(&"p2".into()).unwrap());
    }
}
