use clap::{Parser, Subcommand, ValueEnum};

use poll_tables::RankMethod;

/// This is a charting explorer for per-station election results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (directory path) The directory holding the two dataset spreadsheets,
    /// combined_pres.xlsx and combined_parl.xlsx. Both are loaded at startup.
    #[clap(long, value_parser, default_value = "data")]
    pub data_dir: String,

    /// Which of the two loaded datasets the panel reads.
    #[clap(long, value_enum, default_value = "presidential")]
    pub dataset: DatasetKind,

    /// (directory path) Where the rendered charts are written. Created if missing.
    #[clap(long, value_parser, default_value = "charts")]
    pub chart_dir: String,

    /// (file path, 'stdout' or empty) If specified, a JSON summary of the panel
    /// selections and results will be written to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, pollscope will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub panel: Panel,
}

#[derive(ValueEnum, Eq, PartialEq, Debug, Clone, Copy)]
pub enum DatasetKind {
    Presidential,
    Parliamentary,
}

/// The ranking measure, as selected on the command line.
#[derive(ValueEnum, Eq, PartialEq, Debug, Clone, Copy)]
pub enum MethodArg {
    /// Raw summed vote count for the party.
    Number,
    /// Share of the station's own turnout.
    LocalFraction,
    /// Share of the pooled turnout of the filtered stations.
    GlobalFraction,
}

impl From<MethodArg> for RankMethod {
    fn from(m: MethodArg) -> RankMethod {
        match m {
            MethodArg::Number => RankMethod::Number,
            MethodArg::LocalFraction => RankMethod::LocalFraction,
            MethodArg::GlobalFraction => RankMethod::GlobalFraction,
        }
    }
}

/// The dashboard panels. Each one gathers its own selections, runs one
/// aggregation pass and renders one chart.
#[derive(Subcommand, Debug, Clone)]
pub enum Panel {
    /// Party vote distribution for a single year (pie chart).
    Distribution {
        /// The election year to aggregate.
        #[clap(long, value_parser)]
        year: u16,
    },
    /// Side-by-side party totals for several years (grouped bar chart).
    Compare {
        /// The years to compare. Repeat the flag for each year; at least one
        /// is required.
        #[clap(long, value_parser)]
        years: Vec<u16>,
    },
    /// The N stations with the highest score for one party (bar chart).
    TopStations {
        /// The party column to rank by.
        #[clap(long, value_parser)]
        party: String,
        /// The years to pool. Repeat the flag for each year.
        #[clap(long, value_parser)]
        years: Vec<u16>,
        /// How many stations to keep. Clamped to the number of stations.
        #[clap(short, long, value_parser, default_value_t = 5)]
        n: usize,
        #[clap(long, value_enum, default_value = "number")]
        method: MethodArg,
    },
    /// The N stations with the largest change of a metric between two years.
    /// Declared but not supported: station names change across years.
    VoterChange {
        #[clap(short, long, value_parser, default_value_t = 5)]
        n: usize,
        #[clap(long, value_parser)]
        from_year: u16,
        #[clap(long, value_parser)]
        to_year: u16,
        /// REG VOTERS or one of the party columns.
        #[clap(long, value_parser, default_value = "REG VOTERS")]
        metric: String,
    },
}

impl Panel {
    /// The panel identifier used in summaries and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Distribution { .. } => "distribution",
            Panel::Compare { .. } => "compare",
            Panel::TopStations { .. } => "top-stations",
            Panel::VoterChange { .. } => "voter-change",
        }
    }
}
