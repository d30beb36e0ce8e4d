/*!

This is the long-form manual for `poll_results` and `polltally`.

## Configuration

`polltally` reads the description of a poll view from a JSON file passed with `--config`:

```json
{
  "poll": {
    "id": "p1",
    "question": "Favourite color?",
    "options": [
      { "id": "o1", "label": "Red" },
      { "id": "o2", "label": "Blue" }
    ],
    "allowsMultipleChoice": false,
    "isActive": true
  },
  "userId": "u1",
  "previousVote": ["o1"],
  "toggles": ["o2"],
  "submit": false,
  "chart": "pie",
  "countSources": [
    { "provider": "json", "filePath": "counts.json" }
  ]
}
```

- `options` may also be given as plain strings, in which case the ids are derived from the poll id
  (`p1-o1`, `p1-o2`, ...).
- `previousVote` is the vote recorded for the user. When a ledger is used (`--ledger`), the
  recorded vote is read from the ledger instead.
- `toggles` are replayed in order, as if the user clicked on the options.
- `submit` sends the resulting selection to the ledger. Empty selections are always refused.
- `countSources` are read in order and merged. The paths are relative to the configuration file.
  A source may name the poll it holds counts for with `pollId`; sources for other polls are skipped.

## Ledger

The file given with `--ledger` holds the recorded votes and the polls that were closed or reopened:

```json
{
  "votes": [ { "pollId": "p1", "userId": "u1", "optionIds": ["o1"] } ],
  "pollStatus": { "p1": false }
}
```

A plain list of votes is also accepted. `--toggle-status` closes an open poll or reopens a closed
one, `--reset-votes` removes all the votes of the poll. The summary lists the polls the user voted on
under `selection.votedPolls`.

## Count feeds

### `json`

A list of entries. Both of these shapes are accepted:

```json
[ { "optionId": "o1", "count": 3 } ]
```

```json
[ { "_id": { "$oid": "o1" }, "count": 3 } ]
```

Entries may carry a `pollId`, in which case the entries of other polls are skipped.
Options without votes may be left out. Entries that do not refer to an option of the poll are
ignored. A file that does not contain a list yields a result with zero votes everywhere.

### `csv`

Two columns: the option id and the count. The first row is skipped when `hasHeader` is `true`
(the default).

### `xlsx`

The first worksheet (or the one named with `excelWorksheetName`), with the option id in the first
column and the count in the second. The first row is a header.

## Results

The results are aligned with the options of the poll. Percentages are rounded half-up to two
decimals, and are not adjusted to sum to exactly 100.

*/
