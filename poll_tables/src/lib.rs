//! In-memory election result tables and the aggregations behind the
//! `pollscope` dashboard.
//!
//! A table holds one row per (year, polling station) and answers the
//! dashboard queries: party vote totals for a single year, side-by-side
//! totals across a set of years, and top-N station rankings for one
//! party. Tables are immutable after construction; every operation
//! borrows them read-only and allocates its own output.
//!
//! See the [manual] for the expected spreadsheet format and the
//! definition of the ranking methods.

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

/// One (year, polling station) row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct StationRow {
    pub(crate) year: u16,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) total_votes: u64,
    pub(crate) reg_voters: u64,
    pub(crate) rejected: u64,
    // Parallel to ElectionTable::parties.
    pub(crate) party_votes: Vec<u64>,
}

/// A loaded election dataset.
///
/// Construction goes through [builder::TableBuilder], which discovers the
/// party columns and enforces the (year, station code) uniqueness
/// invariant.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionTable {
    pub(crate) parties: Vec<String>,
    pub(crate) rows: Vec<StationRow>,
}

// Aggregated counts for one station code over the selected years.
struct StationAgg {
    name: String,
    total_votes: u64,
    party_votes: u64,
}

/// The division used by the fraction ranking methods: a zero denominator
/// scores zero instead of raising.
fn fraction(num: u64, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

impl ElectionTable {
    /// The party columns, in source header order.
    pub fn parties(&self) -> &[String] {
        &self.parties
    }

    /// The distinct election years, ascending.
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self.rows.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// The number of distinct station codes, the upper bound for the N of
    /// the ranking queries.
    pub fn station_count(&self) -> usize {
        let codes: HashSet<&str> = self.rows.iter().map(|r| r.code.as_str()).collect();
        codes.len()
    }

    /// The number of (year, station) rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sums every party column over the rows of one year.
    ///
    /// The totals come back in party-column order. A year with no rows
    /// yields an empty vector; the renderer is expected to draw an empty
    /// chart, not to fail.
    pub fn party_totals(&self, year: u16) -> Vec<(String, u64)> {
        let mut sums = vec![0u64; self.parties.len()];
        let mut matched = false;
        for row in self.rows.iter().filter(|r| r.year == year) {
            matched = true;
            for (acc, votes) in sums.iter_mut().zip(row.party_votes.iter()) {
                *acc += votes;
            }
        }
        if !matched {
            debug!("party_totals: no rows for year {}", year);
            return Vec::new();
        }
        self.parties.iter().cloned().zip(sums).collect()
    }

    /// Registered voters recorded for one year, summed over its stations.
    pub fn registered_voters(&self, year: u16) -> u64 {
        self.rows
            .iter()
            .filter(|r| r.year == year)
            .map(|r| r.reg_voters)
            .sum()
    }

    /// Rejected ballots recorded for one year, summed over its stations.
    /// Rejected ballots are never part of the party columns.
    pub fn rejected_ballots(&self, year: u16) -> u64 {
        self.rows
            .iter()
            .filter(|r| r.year == year)
            .map(|r| r.rejected)
            .sum()
    }

    /// Sums every party column within each of the selected years.
    ///
    /// The output is ordered by ascending year, one entry per distinct
    /// selected year. An empty selection is rejected: callers prompt the
    /// user for at least one year, and an empty set is never interpreted
    /// as "all years".
    pub fn party_totals_by_year(&self, years: &[u16]) -> Result<Vec<YearTotals>, TableError> {
        if years.is_empty() {
            return Err(TableError::EmptyYears);
        }
        let mut selected = years.to_vec();
        selected.sort_unstable();
        selected.dedup();
        info!(
            "party_totals_by_year: {} rows, years {:?}",
            self.rows.len(),
            selected
        );
        let res = selected
            .iter()
            .map(|&year| YearTotals {
                year,
                totals: self.party_totals(year),
            })
            .collect();
        Ok(res)
    }

    /// Ranks stations by their aggregated score for one party over the
    /// selected years.
    ///
    /// Stations are keyed by station code and combined by summation when
    /// they appear in several of the selected years; the name is a display
    /// label only. The sort is stable, so tied stations keep their
    /// first-seen row order. At most `n` entries come back.
    pub fn top_stations(
        &self,
        party: &str,
        years: &[u16],
        n: usize,
        method: RankMethod,
    ) -> Result<Vec<RankedStation>, TableError> {
        let party_pos = self
            .parties
            .iter()
            .position(|p| p == party)
            .ok_or_else(|| TableError::UnknownParty(party.to_string()))?;
        if years.is_empty() {
            return Err(TableError::EmptyYears);
        }
        if n == 0 {
            return Err(TableError::InvalidTopN);
        }

        // Aggregate per station code, keeping the first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut agg: HashMap<String, StationAgg> = HashMap::new();
        for row in self.rows.iter().filter(|r| years.contains(&r.year)) {
            let entry = agg.entry(row.code.clone()).or_insert_with(|| {
                order.push(row.code.clone());
                StationAgg {
                    name: row.name.clone(),
                    total_votes: 0,
                    party_votes: 0,
                }
            });
            entry.total_votes += row.total_votes;
            entry.party_votes += row.party_votes[party_pos];
        }
        if order.is_empty() {
            return Err(TableError::NoRows);
        }

        let grand_total: u64 = agg.values().map(|a| a.total_votes).sum();
        debug!(
            "top_stations: {} stations for {:?} in {:?}, pooled total votes {}",
            order.len(),
            party,
            years,
            grand_total
        );

        let mut ranked: Vec<RankedStation> = order
            .into_iter()
            .map(|code| {
                let a = &agg[&code];
                let value = match method {
                    RankMethod::Number => a.party_votes as f64,
                    RankMethod::LocalFraction => fraction(a.party_votes, a.total_votes),
                    RankMethod::GlobalFraction => fraction(a.party_votes, grand_total),
                };
                RankedStation {
                    code,
                    name: a.name.clone(),
                    value,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Declared contract for ranking stations by the change of a metric
    /// between two years.
    ///
    /// Always unsupported after the input validations: station names are
    /// not stable across years and no alternative join key has been
    /// established, so any result computed today would be a silent wrong
    /// answer. The validations still run so that callers can distinguish
    /// a bad selection from the missing capability.
    pub fn voter_change(
        &self,
        from_year: u16,
        to_year: u16,
        metric: &str,
        _n: usize,
    ) -> Result<Vec<RankedStation>, TableError> {
        if from_year == to_year {
            return Err(TableError::SameYears);
        }
        if metric != REG_VOTERS && !self.parties.iter().any(|p| p == metric) {
            return Err(TableError::UnknownMetric(metric.to_string()));
        }
        Err(TableError::NotSupported)
    }
}
