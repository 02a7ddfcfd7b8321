pub mod charts;
pub mod io_xlsx;

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value as JSValue};
use snafu::{whatever, ResultExt, Snafu};
use text_diff::print_diff;

use poll_tables::{ElectionTable, RankMethod, TableError, YearTotals};

use crate::args::{Args, DatasetKind, Panel};

#[derive(Debug, Snafu)]
pub enum ScopeError {
    #[snafu(display("Error opening Excel file {}: {}", path, source))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {} has no worksheet", path))]
    EmptyExcel { path: String },
    #[snafu(display("Malformed table in {}: {}", path, source))]
    BadTable { source: TableError, path: String },
    #[snafu(display("Error rendering chart {}: {}", path, message))]
    Chart { path: String, message: String },
    #[snafu(display("Could not create chart directory {}: {}", path, source))]
    CreatingChartDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not write summary to {}: {}", path, source))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not open JSON file {}: {}", path, source))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not parse JSON: {}", source))]
    ParsingJson { source: serde_json::Error },
    #[snafu(whatever, display("{}", message))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ScopeResult<T> = Result<T, ScopeError>;

/// The two spreadsheets, loaded once at startup.
pub struct Datasets {
    pub presidential: ElectionTable,
    pub parliamentary: ElectionTable,
}

impl Datasets {
    pub fn load(data_dir: &str) -> ScopeResult<Datasets> {
        let pres = io_xlsx::read_election_table(&Path::new(data_dir).join("combined_pres.xlsx"))?;
        let parl = io_xlsx::read_election_table(&Path::new(data_dir).join("combined_parl.xlsx"))?;
        log_table("presidential", &pres);
        log_table("parliamentary", &parl);
        Ok(Datasets {
            presidential: pres,
            parliamentary: parl,
        })
    }

    pub fn select(&self, kind: DatasetKind) -> &ElectionTable {
        match kind {
            DatasetKind::Presidential => &self.presidential,
            DatasetKind::Parliamentary => &self.parliamentary,
        }
    }
}

fn log_table(label: &str, table: &ElectionTable) {
    let years = table.years();
    info!(
        "dataset {}: {} rows over {} stations, years {:?}, parties {:?}",
        label,
        table.len(),
        table.station_count(),
        years,
        table.parties()
    );
    if let Some(&latest) = years.last() {
        info!(
            "dataset {}: {} registered voters, {} rejected ballots in {}",
            label,
            table.registered_voters(latest),
            table.rejected_ballots(latest),
            latest
        );
    }
}

/// The selections behind one panel run, echoed back in the JSON summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct PanelConfig {
    pub dataset: String,
    pub panel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<Vec<u16>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

/// What a panel produced: either a chart on disk or a message telling the
/// user how to correct the selection.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PanelOutcome {
    Rendered { chart: PathBuf },
    Message(String),
}

pub fn run_panel(datasets: &Datasets, args: &Args) -> ScopeResult<()> {
    let table = datasets.select(args.dataset);
    let config = panel_config(args);
    let (results, outcome) = match &args.panel {
        Panel::Distribution { year } => distribution(table, *year, &args.chart_dir)?,
        Panel::Compare { years } => compare(table, years, &args.chart_dir)?,
        Panel::TopStations {
            party,
            years,
            n,
            method,
        } => top_stations(table, party, years, *n, (*method).into(), &args.chart_dir)?,
        Panel::VoterChange {
            n,
            from_year,
            to_year,
            metric,
        } => voter_change(table, *n, *from_year, *to_year, metric)?,
    };
    match &outcome {
        PanelOutcome::Rendered { chart } => {
            info!("panel {}: chart written to {:?}", config.panel, chart)
        }
        PanelOutcome::Message(msg) => println!("{}", msg),
    }

    let summary = json!({ "config": config, "results": results });
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu)?;
    match args.out.as_deref() {
        None | Some("") => {}
        Some("stdout") => println!("{}", pretty),
        Some(path) => {
            fs::write(path, &pretty).context(WritingSummarySnafu { path })?;
            info!("summary written to {}", path);
        }
    }
    if let Some(ref_path) = args.reference.as_deref() {
        check_reference(&pretty, ref_path)?;
        info!("summary matches reference {}", ref_path);
    }
    Ok(())
}

fn panel_config(args: &Args) -> PanelConfig {
    let mut config = PanelConfig {
        dataset: format!("{:?}", args.dataset),
        panel: args.panel.name().to_string(),
        years: None,
        party: None,
        n: None,
        method: None,
        metric: None,
    };
    match &args.panel {
        Panel::Distribution { year } => config.years = Some(vec![*year]),
        Panel::Compare { years } => config.years = Some(years.clone()),
        Panel::TopStations {
            party,
            years,
            n,
            method,
        } => {
            config.years = Some(years.clone());
            config.party = Some(party.clone());
            config.n = Some(*n);
            config.method = Some(format!("{:?}", method));
        }
        Panel::VoterChange {
            n,
            from_year,
            to_year,
            metric,
        } => {
            config.years = Some(vec![*from_year, *to_year]);
            config.n = Some(*n);
            config.metric = Some(metric.clone());
        }
    }
    config
}

fn distribution(
    table: &ElectionTable,
    year: u16,
    chart_dir: &str,
) -> ScopeResult<(JSValue, PanelOutcome)> {
    let totals = table.party_totals(year);
    if totals.is_empty() {
        warn!("no rows for year {}, rendering an empty chart", year);
    }
    let path = chart_path(chart_dir, &format!("distribution_{}.svg", year))?;
    let title = format!("Party Distribution for Year {}", year);
    charts::pie_chart(&path, &title, &totals)?;
    let results: JSValue = totals
        .iter()
        .map(|(party, count)| (party.clone(), json!(count)))
        .collect::<serde_json::Map<String, JSValue>>()
        .into();
    Ok((
        json!({ "totals": results }),
        PanelOutcome::Rendered { chart: path },
    ))
}

fn compare(
    table: &ElectionTable,
    years: &[u16],
    chart_dir: &str,
) -> ScopeResult<(JSValue, PanelOutcome)> {
    if years.is_empty() {
        return Ok((
            json!({ "by_year": [] }),
            PanelOutcome::Message("Please select at least one year.".to_string()),
        ));
    }
    let by_year = match table.party_totals_by_year(years) {
        Ok(by_year) => by_year,
        Err(e) => whatever!("unexpected comparison failure: {}", e),
    };
    let joined = join_years(years);
    let path = chart_path(chart_dir, &format!("compare_{}.svg", joined.replace(", ", "-")))?;
    let title = format!("Party Distribution for Years {}", joined);
    charts::grouped_bar_chart(&path, &title, table.parties(), &by_year)?;
    let results: Vec<JSValue> = by_year.iter().map(year_totals_json).collect();
    Ok((
        json!({ "by_year": results }),
        PanelOutcome::Rendered { chart: path },
    ))
}

fn year_totals_json(yt: &YearTotals) -> JSValue {
    let totals: serde_json::Map<String, JSValue> = yt
        .totals
        .iter()
        .map(|(party, count)| (party.clone(), json!(count)))
        .collect();
    json!({ "year": yt.year, "totals": totals })
}

fn top_stations(
    table: &ElectionTable,
    party: &str,
    years: &[u16],
    n: usize,
    method: RankMethod,
    chart_dir: &str,
) -> ScopeResult<(JSValue, PanelOutcome)> {
    let empty = json!({ "stations": [] });
    if years.is_empty() {
        return Ok((
            empty,
            PanelOutcome::Message("Please select at least one year.".to_string()),
        ));
    }
    let mut n = n;
    if n > table.station_count() {
        warn!(
            "requested top {} but the dataset only has {} stations",
            n,
            table.station_count()
        );
        n = table.station_count();
    }
    let stations = match table.top_stations(party, years, n, method) {
        Ok(stations) => stations,
        Err(TableError::NoRows) => {
            return Ok((
                empty,
                PanelOutcome::Message(format!(
                    "No data available for {} in the selected years.",
                    party
                )),
            ));
        }
        Err(e @ (TableError::UnknownParty(_) | TableError::InvalidTopN)) => {
            return Ok((empty, PanelOutcome::Message(e.to_string())));
        }
        Err(e) => whatever!("unexpected ranking failure: {}", e),
    };
    let joined = join_years(years);
    let path = chart_path(
        chart_dir,
        &format!("top_{}_{}.svg", slug(party), joined.replace(", ", "-")),
    )?;
    let title = format!(
        "Top {} Stations for {} in {} ({})",
        stations.len(),
        party,
        joined,
        method_label(method)
    );
    charts::bar_chart(&path, &title, &stations)?;
    let results: Vec<JSValue> = stations
        .iter()
        .map(|s| json!({ "code": s.code, "name": s.name, "value": s.value }))
        .collect();
    Ok((
        json!({ "stations": results }),
        PanelOutcome::Rendered { chart: path },
    ))
}

fn voter_change(
    table: &ElectionTable,
    n: usize,
    from_year: u16,
    to_year: u16,
    metric: &str,
) -> ScopeResult<(JSValue, PanelOutcome)> {
    let results = json!({ "supported": false });
    if from_year == to_year {
        return Ok((
            results,
            PanelOutcome::Message("Please select two different years.".to_string()),
        ));
    }
    match table.voter_change(from_year, to_year, metric, n) {
        Err(e @ (TableError::NotSupported | TableError::UnknownMetric(_))) => {
            Ok((results, PanelOutcome::Message(e.to_string())))
        }
        Err(e) => whatever!("unexpected voter change failure: {}", e),
        Ok(_) => whatever!("voter change reported success but is not supported"),
    }
}

fn method_label(method: RankMethod) -> &'static str {
    match method {
        RankMethod::Number => "Number",
        RankMethod::LocalFraction => "Local Fraction",
        RankMethod::GlobalFraction => "Global Fraction",
    }
}

fn join_years(years: &[u16]) -> String {
    let mut sorted: Vec<u16> = years.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .iter()
        .map(u16::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}

fn slug(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn chart_path(chart_dir: &str, file_name: &str) -> ScopeResult<PathBuf> {
    fs::create_dir_all(chart_dir).context(CreatingChartDirSnafu { path: chart_dir })?;
    Ok(Path::new(chart_dir).join(file_name))
}

fn check_reference(computed: &str, ref_path: &str) -> ScopeResult<()> {
    let ref_content = fs::read_to_string(ref_path).context(OpeningJsonSnafu { path: ref_path })?;
    let ref_js: JSValue = serde_json::from_str(&ref_content).context(ParsingJsonSnafu)?;
    let ref_pretty = serde_json::to_string_pretty(&ref_js).context(ParsingJsonSnafu)?;
    if computed != ref_pretty {
        warn!("Found differences with the reference summary");
        print_diff(&ref_pretty, computed, "\n");
        whatever!("the computed summary does not match the reference {}", ref_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poll_tables::{builder::TableBuilder, CellValue};

    fn cells(year: u16, code: &str, name: &str, reg: i64, total: i64, x: i64, y: i64) -> Vec<CellValue> {
        vec![
            CellValue::Int(year as i64),
            CellValue::Text(code.to_string()),
            CellValue::Text(name.to_string()),
            CellValue::Int(total),
            CellValue::Int(reg),
            CellValue::Int(0),
            CellValue::Int(x),
            CellValue::Int(y),
        ]
    }

    fn sample_table() -> ElectionTable {
        let header: Vec<String> = [
            "YEAR", "PS CODE", "PS NAME", "TOTAL VOTES", "REG VOTERS", "REJECTED", "PartyX",
            "PartyY",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mut builder = TableBuilder::new(&header).unwrap();
        builder.push_row(&cells(2020, "1", "A", 150, 100, 60, 40)).unwrap();
        builder.push_row(&cells(2020, "2", "B", 80, 50, 10, 40)).unwrap();
        builder.push_row(&cells(2016, "1", "A old", 120, 80, 30, 50)).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_distribution_renders_chart_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let chart_dir = dir.path().join("charts");
        let table = sample_table();
        let (results, outcome) =
            distribution(&table, 2020, chart_dir.to_str().unwrap()).unwrap();
        assert_eq!(results, json!({ "totals": { "PartyX": 70, "PartyY": 80 } }));
        match outcome {
            PanelOutcome::Rendered { chart } => assert!(chart.is_file()),
            other => panic!("expected a chart, got {:?}", other),
        }
    }

    #[test]
    fn test_distribution_empty_year_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (results, outcome) =
            distribution(&table, 1999, dir.path().to_str().unwrap()).unwrap();
        assert_eq!(results, json!({ "totals": {} }));
        assert!(matches!(outcome, PanelOutcome::Rendered { .. }));
    }

    #[test]
    fn test_compare_without_years_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (results, outcome) = compare(&table, &[], dir.path().to_str().unwrap()).unwrap();
        assert_eq!(results, json!({ "by_year": [] }));
        assert_eq!(
            outcome,
            PanelOutcome::Message("Please select at least one year.".to_string())
        );
    }

    #[test]
    fn test_compare_two_years() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (results, outcome) =
            compare(&table, &[2020, 2016], dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            results,
            json!({ "by_year": [
                { "year": 2016, "totals": { "PartyX": 30, "PartyY": 50 } },
                { "year": 2020, "totals": { "PartyX": 70, "PartyY": 80 } },
            ] })
        );
        assert!(matches!(outcome, PanelOutcome::Rendered { .. }));
    }

    #[test]
    fn test_top_stations_local_fraction() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (results, outcome) = top_stations(
            &table,
            "PartyX",
            &[2020],
            1,
            RankMethod::LocalFraction,
            dir.path().to_str().unwrap(),
        )
        .unwrap();
        assert_eq!(
            results,
            json!({ "stations": [ { "code": "1", "name": "A", "value": 0.6 } ] })
        );
        assert!(matches!(outcome, PanelOutcome::Rendered { .. }));
    }

    #[test]
    fn test_top_stations_clamps_n() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (results, _) = top_stations(
            &table,
            "PartyY",
            &[2020],
            50,
            RankMethod::Number,
            dir.path().to_str().unwrap(),
        )
        .unwrap();
        let stations = results["stations"].as_array().unwrap();
        assert_eq!(stations.len(), 2);
    }

    #[test]
    fn test_top_stations_unknown_party_is_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (results, outcome) = top_stations(
            &table,
            "PartyZ",
            &[2020],
            5,
            RankMethod::Number,
            dir.path().to_str().unwrap(),
        )
        .unwrap();
        assert_eq!(results, json!({ "stations": [] }));
        assert!(matches!(outcome, PanelOutcome::Message(_)));
    }

    #[test]
    fn test_top_stations_no_rows_is_a_message() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let (_, outcome) = top_stations(
            &table,
            "PartyX",
            &[1999],
            5,
            RankMethod::Number,
            dir.path().to_str().unwrap(),
        )
        .unwrap();
        assert_eq!(
            outcome,
            PanelOutcome::Message("No data available for PartyX in the selected years.".to_string())
        );
    }

    #[test]
    fn test_voter_change_same_years_prompts() {
        let table = sample_table();
        let (_, outcome) = voter_change(&table, 5, 2020, 2020, "REG VOTERS").unwrap();
        assert_eq!(
            outcome,
            PanelOutcome::Message("Please select two different years.".to_string())
        );
    }

    #[test]
    fn test_voter_change_reports_not_supported() {
        let table = sample_table();
        let (results, outcome) = voter_change(&table, 5, 2016, 2020, "REG VOTERS").unwrap();
        assert_eq!(results, json!({ "supported": false }));
        match outcome {
            PanelOutcome::Message(msg) => assert!(msg.contains("not implemented")),
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[test]
    fn test_check_reference_accepts_equivalent_json() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = dir.path().join("ref.json");
        std::fs::write(&ref_path, "{\"a\": 1}").unwrap();
        let computed = serde_json::to_string_pretty(&json!({ "a": 1 })).unwrap();
        check_reference(&computed, ref_path.to_str().unwrap()).unwrap();
    }

    #[test]
    fn test_check_reference_rejects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = dir.path().join("ref.json");
        std::fs::write(&ref_path, "{\"a\": 2}").unwrap();
        let computed = serde_json::to_string_pretty(&json!({ "a": 1 })).unwrap();
        assert!(check_reference(&computed, ref_path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_join_years_sorts_and_dedups() {
        assert_eq!(join_years(&[2024, 2016, 2024]), "2016, 2024");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("New Force Party"), "new_force_party");
    }
}
