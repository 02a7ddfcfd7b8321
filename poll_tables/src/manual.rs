/*!

This is the long-form manual for `poll_tables` and `pollscope`.

## Table format

A dataset is a single spreadsheet with one row per (year, polling station).
The first row is the header. Six columns are reserved and must be present,
with exact, case- and space-sensitive names:

| Column | Content |
|---|---|
| `YEAR` | The election year. Repeats once per station. |
| `PS CODE` | The station identifier, unique within a year. |
| `PS NAME` | A human-readable station label. Not stable across years. |
| `TOTAL VOTES` | Total ballots cast at that station in that year. |
| `REG VOTERS` | Registered voters at that station in that year. |
| `REJECTED` | Rejected ballots. Never counted as a party column. |

Every other column is a party column holding vote counts. The party set is
discovered from the header when the table is built, so the two datasets do
not need to agree on their parties.

Cells that do not hold a clean non-negative number (text remarks, blanks,
negative values) count as zero. Source spreadsheets are maintained by
hand and a stray annotation should not take the whole dataset down.

Party counts do not need to reconcile with `TOTAL VOTES`: rejected ballots
and write-ins are excluded from the party columns.

## Ranking methods

The station rankings support three measures for a party `P` over a set of
selected years:

* `Number`: the summed vote count for `P` at the station.
* `Local Fraction`: votes for `P` divided by the station's own
  `TOTAL VOTES`. How dominant `P` is inside one station. A station with
  no recorded votes scores zero.
* `Global Fraction`: votes for `P` divided by the summed `TOTAL VOTES` of
  every station in the filter. How much of the overall pool one station
  contributes.

Stations appearing in several selected years are combined by summation,
keyed on `PS CODE`. Ties keep the order in which the stations appear in
the source file.

## Ranking by change across years

Ranking stations by the change of a metric between two years is declared
but not implemented: station names change across years, station codes
have not been verified to be continuous, and without a stable join key any
pairing of rows would be a silent wrong answer. The operation validates
its inputs and then reports the missing capability explicitly.

*/
