// Primitives for reading vote counts in JSON.

use crate::tally::{
    io_common::{read_count, read_id},
    *,
};
use serde::Deserialize;

/// One entry of the count feed, as sent by the store.
/// The store groups the votes by option and names the group key `_id`.
#[derive(PartialEq, Debug, Clone, Deserialize)]
struct CountEntry {
    #[serde(rename = "optionId", alias = "_id")]
    option_id: JSValue,
    count: JSValue,
    #[serde(rename = "pollId", default)]
    poll_id: Option<JSValue>,
}

pub fn read_json_counts(path: &str, poll_id: &PollId) -> AppResult<Vec<VoteCount>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_json_counts(&contents, poll_id)
}

/// Parses a count feed. The feed must be a list; entries that cannot be read
/// are skipped, as are entries tagged with the `pollId` of another poll.
pub fn parse_json_counts(contents: &str, poll_id: &PollId) -> AppResult<Vec<VoteCount>> {
    let js: JSValue = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let entries = match js {
        JSValue::Array(l) => l,
        x => {
            return DataShapeSnafu {
                message: format!("expected a list of counts, got {}", x),
            }
            .fail();
        }
    };

    let mut res: Vec<VoteCount> = Vec::new();
    for (idx, entry_js) in entries.into_iter().enumerate() {
        let entry: CountEntry = match serde_json::from_value(entry_js.clone()) {
            Ok(x) => x,
            Err(e) => {
                warn!("parse_json_counts: entry {}: skipping {}: {}", idx, entry_js, e);
                continue;
            }
        };
        if let Some(pid) = entry.poll_id.as_ref() {
            match read_id(pid) {
                Ok(x) if x == poll_id.as_str() => {}
                Ok(x) => {
                    debug!("parse_json_counts: entry {}: skipping count for poll {}", idx, x);
                    continue;
                }
                Err(e) => {
                    warn!("parse_json_counts: entry {}: skipping: {}", idx, e);
                    continue;
                }
            }
        }
        let option_id = match read_id(&entry.option_id) {
            Ok(x) => x,
            Err(e) => {
                warn!("parse_json_counts: entry {}: skipping: {}", idx, e);
                continue;
            }
        };
        match read_count(&entry.count) {
            Some(count) => res.push(VoteCount::new(option_id, count)),
            None => {
                warn!(
                    "parse_json_counts: entry {}: skipping invalid count {} for {}",
                    idx, entry.count, option_id
                );
            }
        }
    }
    debug!("parse_json_counts: {} entries", res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_shapes() {
        let res = parse_json_counts(
            r#"[{"optionId": "o1", "count": 3}, {"_id": {"$oid": "o2"}, "count": 1}]"#,
            &"p1".into(),
        )
        .unwrap();
        assert_eq!(res, vec![VoteCount::new("o1", 3), VoteCount::new("o2", 1)]);
    }

    #[test]
    fn empty_list() {
        assert_eq!(parse_json_counts("[]", &"p1".into()).unwrap(), vec![]);
    }

    #[test]
    fn not_a_list() {
        let res = parse_json_counts(r#"{"message": "poll not found"}"#, &"p1".into());
        assert!(matches!(res, Err(AppError::DataShape { .. })));
        let res = parse_json_counts("not json", &"p1".into());
        assert!(matches!(res, Err(AppError::ParsingJson { .. })));
    }

    #[test]
    fn entries_of_other_polls() {
        let res = parse_json_counts(
            r#"[{"pollId": "p2", "optionId": "o1", "count": 4}, {"pollId": "p1", "optionId": "o1", "count": 1}, {"optionId": "o2", "count": 2}]"#,
            &"p1".into(),
        )
        .unwrap();
        assert_eq!(res, vec![VoteCount::new("o1", 1), VoteCount::new("o2", 2)]);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let res = parse_json_counts(
            r#"[{"optionId": "o1", "count": -2}, {"count": 4}, 12, {"optionId": "o2", "count": "5"}]"#,
            &"p1".into(),
        )
        .unwrap();
        assert_eq!(res, vec![VoteCount::new("o2", 5)]);
    }
}
