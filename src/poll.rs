use log::{debug, info, warn};

use pairwise_poll::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::poll::config_reader::*;
use crate::poll::io_common::{ballot_format, simplify_file_name, skip_header, BallotFormat};

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_text;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum PollError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Invalid number in the configuration: {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(display("Error opening the master list {path}"))]
    OpeningMasterList {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid master list {path}"))]
    InvalidMasterList { source: PollErrors, path: String },

    #[snafu(display("Error reading the ballot directory {path}"))]
    OpeningBallotDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No ballot file (.txt, .csv or .xlsx) found in {path}"))]
    EmptyBallotDirectory { path: String },
    #[snafu(display("Error opening the ballot {path}"))]
    OpeningBallot {
        source: std::io::Error,
        path: String,
    },

    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },

    #[snafu(display("Error opening the Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },

    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PResult<T> = Result<T, PollError>;

fn percentage_js(p: f64) -> JSValue {
    json!(format!("{:.3}", p))
}

fn record_js(m: &mut JSMap<String, JSValue>, prefix: &str, r: &Record) {
    let name = |s: &str| {
        if prefix.is_empty() {
            s.to_string()
        } else {
            format!("{}{}{}", prefix, &s[..1].to_uppercase(), &s[1..])
        }
    };
    m.insert(name("wins"), json!(r.wins.to_string()));
    m.insert(name("losses"), json!(r.losses.to_string()));
    m.insert(name("ties"), json!(r.ties.to_string()));
}

fn candidate_js(
    key: &str,
    abbreviation: &str,
    metadata: &CandidateMetadata,
) -> JSMap<String, JSValue> {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    m.insert("key".to_string(), json!(key));
    m.insert("abbreviation".to_string(), json!(abbreviation));
    if let Some(parts) = KeyParts::split(key) {
        m.insert("name".to_string(), json!(parts.name));
        m.insert("park".to_string(), json!(parts.park));
        m.insert("location".to_string(), json!(parts.location));
    }
    if let Some(d) = &metadata.designer {
        m.insert("designer".to_string(), json!(d));
    }
    if let Some(y) = &metadata.year {
        m.insert("year".to_string(), json!(y));
    }
    if let Some(l) = &metadata.link {
        m.insert("link".to_string(), json!(l));
    }
    m
}

fn overall_js(rows: &[OverallRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|r| {
            let mut m = candidate_js(&r.key, &r.abbreviation, &r.metadata);
            m.insert("rank".to_string(), json!(r.rank.to_string()));
            m.insert(
                "totalWinPercentage".to_string(),
                percentage_js(r.total_win_percentage),
            );
            m.insert(
                "pairwiseWinPercentage".to_string(),
                percentage_js(r.pairwise_win_percentage),
            );
            record_js(&mut m, "", &r.total);
            record_js(&mut m, "pairwise", &r.pairwise);
            m.insert("riders".to_string(), json!(r.riders.to_string()));
            if !r.tied_with.is_empty() {
                m.insert("tiedWith".to_string(), json!(r.tied_with));
            }
            JSValue::Object(m)
        })
        .collect()
}

fn pairs_js(rows: &[PairRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|r| {
            let mut m: JSMap<String, JSValue> = JSMap::new();
            m.insert("rank".to_string(), json!(r.rank.to_string()));
            m.insert("candidate".to_string(), json!(r.candidate));
            m.insert("opponent".to_string(), json!(r.opponent));
            m.insert("winPercentage".to_string(), percentage_js(r.win_percentage));
            record_js(&mut m, "", &r.record);
            JSValue::Object(m)
        })
        .collect()
}

fn head_to_head_js(h2h: &HeadToHead) -> JSValue {
    let rows: Vec<Vec<String>> = h2h
        .cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| c.map(|c| c.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    json!({"candidates": h2h.candidates, "rows": rows})
}

fn excluded_js(standings: &[CandidateStanding]) -> Vec<JSValue> {
    standings
        .iter()
        .map(|s| json!({"key": s.key, "riders": s.riders.to_string()}))
        .collect()
}

fn riders_js(riders: &[RiderCount]) -> Vec<JSValue> {
    riders
        .iter()
        .map(|r| {
            json!({
                "rank": r.rank.to_string(),
                "key": r.key,
                "abbreviation": r.abbreviation,
                "riders": r.riders.to_string()
            })
        })
        .collect()
}

fn rejected_js(diagnostics: &[BallotDiagnostic]) -> Vec<JSValue> {
    diagnostics
        .iter()
        .map(|d| {
            json!({
                "ballot": d.ballot_id,
                "line": d.error.line.to_string(),
                "reason": d.error.to_string()
            })
        })
        .collect()
}

fn voters_js(voters: &[VoterRow]) -> Vec<JSValue> {
    voters
        .iter()
        .map(|v| {
            json!({
                "ballot": v.ballot_id,
                "name": v.voter_info.name,
                "email": v.voter_info.email,
                "city": v.voter_info.city,
                "region": v.voter_info.region,
                "country": v.voter_info.country,
                "credits": v.credits.to_string()
            })
        })
        .collect()
}

fn build_summary_js(setup: &PollSetup, res: &PollResult) -> JSValue {
    let c = OutputConfig {
        poll: setup.poll_name.clone(),
        year: setup.poll_year.clone(),
        min_riders: setup.rules.min_riders.to_string(),
    };
    let stats = &res.stats;
    let mut summary = json!({
        "config": c,
        "statistics": {
            "validBallots": stats.valid_ballots.to_string(),
            "rejectedBallots": stats.rejected_ballots.to_string(),
            "candidates": stats.candidates.to_string(),
            "totalCredits": stats.total_credits.to_string(),
            "averageCredits": format!("{:.3}", stats.average_credits),
        },
        "ranking": overall_js(&res.tables.overall),
        "insufficientRiders": excluded_js(&res.aggregates.insufficient_riders),
        "noRiders": excluded_js(&res.aggregates.no_riders),
        "pairs": pairs_js(&res.tables.pairs),
        "headToHead": head_to_head_js(&res.tables.head_to_head),
        "riders": riders_js(&res.aggregates.riders),
        "rejectedBallots": rejected_js(&res.diagnostics),
    });
    if let (Some(voters), Some(m)) = (&res.tables.voters, summary.as_object_mut()) {
        m.insert("voters".to_string(), JSValue::Array(voters_js(voters)));
    }
    summary
}

fn read_master_list_file(path: &Path) -> PResult<Vec<String>> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningMasterListSnafu { path: p })?;
    Ok(contents.lines().map(|l| l.to_string()).collect())
}

/// The ballot files of a directory, in the order of their names.
fn list_ballot_files(dir: &Path) -> PResult<Vec<(PathBuf, BallotFormat)>> {
    let p = dir.display().to_string();
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).context(OpeningBallotDirectorySnafu { path: p.clone() })? {
        let entry = entry.context(OpeningBallotDirectorySnafu { path: p.clone() })?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by_key(|path| path.file_name().map(|s| s.to_os_string()));

    let mut res: Vec<(PathBuf, BallotFormat)> = Vec::new();
    for path in paths {
        match ballot_format(&path) {
            Some(format) => res.push((path, format)),
            None => warn!("list_ballot_files: skipping {:?}", path),
        }
    }
    ensure!(!res.is_empty(), EmptyBallotDirectorySnafu { path: p });
    Ok(res)
}

/// The content errors that only spoil the ballot being read. Filesystem
/// errors are not in this list and stop the poll.
fn unreadable_ballot(e: &PollError) -> Option<BallotError> {
    let (line, what) = match e {
        PollError::CsvLineParse { source, lineno, .. } => match source.kind() {
            csv::ErrorKind::Io(_) => return None,
            csv::ErrorKind::Utf8 { .. } => (*lineno, "invalid UTF-8"),
            _ => (*lineno, "invalid CSV record"),
        },
        PollError::OpeningExcel {
            source: calamine::XlsxError::Io(_),
            ..
        } => return None,
        PollError::OpeningExcel { .. } => (1, "invalid Excel workbook"),
        PollError::EmptyExcel { .. } => (1, "no worksheet"),
        _ => return None,
    };
    Some(BallotError {
        line,
        reason: BallotErrorReason::Unreadable(what.to_string()),
    })
}

fn add_ballot_file(builder: &mut Builder, path: &Path, format: BallotFormat) -> PResult<()> {
    let ballot_id = simplify_file_name(path);
    debug!("add_ballot_file: {:?} as {:?}", path, format);
    let res = match format {
        BallotFormat::Text => {
            let lines = io_text::read_text_ballot(path)?;
            builder.add_ballot_lines(&ballot_id, &lines)
        }
        BallotFormat::Csv | BallotFormat::Xlsx => {
            let rows_r = if format == BallotFormat::Csv {
                io_csv::read_csv_ballot(path)
            } else {
                io_xlsx::read_xlsx_ballot(path)
            };
            match rows_r {
                Ok(rows) => {
                    let rows = skip_header(rows, builder.get_registry());
                    builder.add_ballot_rows(&ballot_id, &rows)
                }
                Err(e) => match unreadable_ballot(&e) {
                    Some(be) => {
                        warn!("add_ballot_file: {}", e);
                        builder.reject_ballot(&ballot_id, be.clone());
                        Err(be)
                    }
                    None => return Err(e),
                },
            }
        }
    };
    if let Err(e) = res {
        warn!("Rejected ballot {}: {}", ballot_id, e);
    }
    Ok(())
}

/// Runs a complete poll: reads the inputs, tabulates and writes the summary.
pub fn run_poll_files(setup: &PollSetup) -> PResult<JSValue> {
    info!("run_poll_files: {:?}", setup);
    let master_list = read_master_list_file(&setup.master_list)?;
    let ml_path = setup.master_list.display().to_string();
    let mut builder = Builder::new(&setup.rules)
        .and_then(|b| b.master_list(&master_list))
        .context(InvalidMasterListSnafu { path: ml_path })?;
    info!(
        "Master list: {} candidates",
        builder.get_registry().size()
    );

    let files = list_ballot_files(&setup.ballot_directory)?;
    info!("Reading {} ballot files", files.len());
    for (path, format) in files.iter() {
        add_ballot_file(&mut builder, path, *format)?;
    }

    let result = match builder.finish() {
        Result::Ok(x) => x,
        Result::Err(x) => {
            whatever!("Poll error: {}", x)
        }
    };
    info!(
        "{} valid ballots, {} rejected, {} credits",
        result.stats.valid_ballots, result.stats.rejected_ballots, result.stats.total_credits
    );
    Ok(build_summary_js(setup, &result))
}

fn write_summary(pretty_js: &str, out: &Option<String>) -> PResult<()> {
    match out.as_deref() {
        None | Some("") | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            info!("Writing summary to {}", path);
            fs::write(path, pretty_js).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

pub fn run_tabulation(args: &Args) -> PResult<()> {
    let setup = PollSetup::from_args(args)?;
    let summary_js = run_poll_files(&setup)?;
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(WritingJsonSnafu {})?;
    write_summary(&pretty_js_stats, &setup.output_path)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        debug!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!("The summary matches the reference {}", summary_p);
    }

    Ok(())
}

#[cfg(test)]
fn run_poll_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    use snafu::ErrorCompat;

    let test_dir =
        option_env!("POLL_TEST_DIR").unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests"));
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        out: Some("stdout".to_string()),
        ..Args::default()
    };
    let res = run_tabulation(&args);
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    run_poll_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
