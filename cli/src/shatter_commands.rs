use clap::{value_parser, Arg, ArgAction, Command};

fn verbose() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Debug mode")
}

fn subcommand_sweep() -> Command {
    Command::new("sweep")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Rejoin shattered fragments at random and report the statistics of each run.")
        .arg(verbose())
        .arg(
            Arg::new("min")
                .short('m')
                .long("min")
                .value_name("FRAGMENTS")
                .value_parser(value_parser!(u32))
                .default_value("1")
                .help("Smallest number of fragments."),
        )
        .arg(
            Arg::new("max")
                .short('M')
                .long("max")
                .value_name("FRAGMENTS")
                .value_parser(value_parser!(u32))
                .help("Largest number of fragments. Same as --min if omitted."),
        )
        .arg(
            Arg::new("iterations")
                .short('n')
                .long("iterations")
                .value_parser(value_parser!(u32))
                .default_value("1000")
                .help("Number of runs for each number of fragments."),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed value for the random number generator")
                .value_parser(value_parser!(u64))
                .default_value("42"),
        )
        .arg(
            Arg::new("group")
                .short('g')
                .long("group")
                .action(ArgAction::SetTrue)
                .help("Write the frequency of each distinct result instead of every run."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Output file. Standard output if omitted."),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["csv", "tsv", "json"])
                .default_value("csv")
                .help("Format of the output."),
        )
}

fn subcommand_pipeline() -> Command {
    Command::new("pipeline")
        .version("0.1")
        .author("BanshoMasutani")
        .about("Run a sweep based on the given TOML file.")
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .required(true)
                .help("TOML configuration file. See profiles/example.toml for an example."),
        )
}

pub fn shatter_parser() -> Command {
    Command::new("shatter")
        .version("0.1")
        .author("Bansho Masutani <ban-m@g.ecc.u-tokyo.ac.jp>")
        .about("Null distributions of random rejoining of shattered chromosomes")
        .arg_required_else_help(true)
        .subcommand(subcommand_sweep())
        .subcommand(subcommand_pipeline())
}
