use clap::Parser;

/// This is a pairwise tabulation program for ranked coaster polls.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the poll. See the manual of the
    /// pairwise_poll library for the format. Relative paths in this file are resolved
    /// from its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the summary of a poll in JSON format. If provided,
    /// coasterpoll will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the poll will be written in JSON
    /// format to the given location. Setting this option overrides the path that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, default blankballot.txt) The master list of the candidates.
    #[clap(short, long, value_parser)]
    pub master_list: Option<String>,

    /// (directory, default ballots) The directory containing the ballots. Files ending with
    /// .txt, .csv and .xlsx are read, in the order of their names.
    #[clap(short, long, value_parser)]
    pub ballots: Option<String>,

    /// (default 1) The minimum number of riders for a candidate to be ranked.
    #[clap(long, value_parser)]
    pub min_riders: Option<u32>,

    /// If passed as an argument, the identity of the voters is included in the summary.
    #[clap(long, takes_value = false)]
    pub include_voter_info: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
