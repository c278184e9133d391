use definitions::SweepConfig;
use shatter::OutputFormat;
use std::path::Path;
#[macro_use]
extern crate log;

fn main() {
    let matches = shatter_cli::shatter_commands::shatter_parser().get_matches();
    let outcome = match matches.subcommand() {
        Some(("pipeline", sub_m)) => pipeline(sub_m),
        Some(("sweep", sub_m)) => sweep(sub_m),
        _ => unreachable!(),
    };
    if let Err(why) = outcome {
        // A profile can fail to load before the logger is set.
        shatter_cli::pipeline::init_logger(0);
        error!("{}", why);
        match why.is_invariant_violation() {
            true => std::process::exit(2),
            false => std::process::exit(1),
        }
    }
}

fn pipeline(matches: &clap::ArgMatches) -> shatter::Result<()> {
    let path: &String = matches.get_one("profile").unwrap();
    let config = shatter_cli::pipeline::load_profile(path)?;
    shatter_cli::pipeline::run_pipeline(&config)
}

fn sweep(matches: &clap::ArgMatches) -> shatter::Result<()> {
    shatter_cli::pipeline::init_logger(matches.get_count("verbose") as usize);
    debug!("START\tSweep");
    let min: u32 = *matches.get_one("min").unwrap();
    let max: u32 = matches.get_one("max").copied().unwrap_or(min);
    let iterations: u32 = *matches.get_one("iterations").unwrap();
    let seed: u64 = *matches.get_one("seed").unwrap();
    let group = matches.get_flag("group");
    let format: OutputFormat = matches
        .get_one::<String>("format")
        .map_or(Ok(OutputFormat::default()), |x| x.parse())
        .map_err(shatter::Error::Profile)?;
    let output: Option<&String> = matches.get_one("output");
    let output = output.map(Path::new);
    let config = SweepConfig::new(iterations, min, max, group)?.with_seed(seed);
    shatter_cli::pipeline::run_sweep(&config, output, format)
}
