mod args;
mod dash;

use clap::Parser;
use log::info;
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();
    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    info!("loading datasets from {}", args.data_dir);
    let res = dash::Datasets::load(&args.data_dir).and_then(|ds| dash::run_panel(&ds, &args));
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
