use crate::poll::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const DEFAULT_MASTER_LIST: &str = "blankballot.txt";
pub const DEFAULT_BALLOT_DIRECTORY: &str = "ballots";
const DEFAULT_POLL_NAME: &str = "poll";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "pollName")]
    pub poll_name: String,
    #[serde(rename = "pollYear")]
    pub poll_year: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

/// The description of the poll written in the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub poll: String,
    pub year: Option<String>,
    #[serde(rename = "minRiders")]
    pub min_riders: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "masterListPath")]
    pub master_list_path: Option<String>,
    #[serde(rename = "ballotDirectory")]
    pub ballot_directory: Option<String>,
    // A number or a string
    #[serde(rename = "minRiders")]
    _min_riders: Option<JSValue>,
    #[serde(rename = "includeVoterInfo")]
    pub include_voter_info: Option<bool>,
}

impl PollConfig {
    pub fn min_riders(&self) -> PResult<Option<u32>> {
        match &self._min_riders {
            None => Ok(None),
            x => read_js_int(x).map(Some),
        }
    }
}

/// Everything needed to run a poll, once the configuration file and the
/// command line have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollSetup {
    pub poll_name: String,
    pub poll_year: Option<String>,
    pub master_list: PathBuf,
    pub ballot_directory: PathBuf,
    pub output_path: Option<String>,
    pub rules: PollRules,
}

impl PollSetup {
    /// The command line takes precedence over the configuration file.
    pub fn from_args(args: &Args) -> PResult<PollSetup> {
        let (config, root): (Option<PollConfig>, PathBuf) = match &args.config {
            Some(config_path) => {
                let config = read_config(config_path)?;
                let root = Path::new(config_path)
                    .parent()
                    .context(MissingParentDirSnafu {})?
                    .to_path_buf();
                (Some(config), root)
            }
            None => (None, PathBuf::from(".")),
        };
        debug!("PollSetup::from_args: config: {:?} root: {:?}", config, root);

        // Paths given on the command line are used as is.
        let master_list: PathBuf = match &args.master_list {
            Some(p) => PathBuf::from(p),
            None => root.join(
                config
                    .as_ref()
                    .and_then(|c| c.master_list_path.clone())
                    .unwrap_or_else(|| DEFAULT_MASTER_LIST.to_string()),
            ),
        };
        let ballot_directory: PathBuf = match &args.ballots {
            Some(p) => PathBuf::from(p),
            None => root.join(
                config
                    .as_ref()
                    .and_then(|c| c.ballot_directory.clone())
                    .unwrap_or_else(|| DEFAULT_BALLOT_DIRECTORY.to_string()),
            ),
        };

        let config_min_riders = match &config {
            Some(c) => c.min_riders()?,
            None => None,
        };
        let min_riders = args
            .min_riders
            .or(config_min_riders)
            .unwrap_or(PollRules::DEFAULT_MIN_RIDERS);
        let include_voter_info = args.include_voter_info
            || config
                .as_ref()
                .and_then(|c| c.include_voter_info)
                .unwrap_or(false);

        let output_path = match &args.out {
            Some(o) => Some(o.clone()),
            None => config
                .as_ref()
                .and_then(|c| c.output_settings.output_path.clone())
                .map(|p| root.join(p).display().to_string()),
        };

        Ok(PollSetup {
            poll_name: config
                .as_ref()
                .map(|c| c.output_settings.poll_name.clone())
                .unwrap_or_else(|| DEFAULT_POLL_NAME.to_string()),
            poll_year: config.as_ref().and_then(|c| c.output_settings.poll_year.clone()),
            master_list,
            ballot_directory,
            output_path,
            rules: PollRules {
                min_riders,
                include_voter_info,
            },
        })
    }
}

pub fn read_config(path: &str) -> PResult<PollConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: PollConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> PResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> PResult<u32> {
    let content = format!("{:?}", x);
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .context(ParsingJsonNumberSnafu { content }),
        Some(JSValue::String(s)) => s
            .parse::<u32>()
            .ok()
            .context(ParsingJsonNumberSnafu { content }),
        _ => None.context(ParsingJsonNumberSnafu { content }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(s: &str) -> PollConfig {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn min_riders_as_number_or_string() {
        let c = config(r#"{"outputSettings": {"pollName": "p"}, "minRiders": 10}"#);
        assert_eq!(c.min_riders().unwrap(), Some(10));
        let c = config(r#"{"outputSettings": {"pollName": "p"}, "minRiders": "3"}"#);
        assert_eq!(c.min_riders().unwrap(), Some(3));
        let c = config(r#"{"outputSettings": {"pollName": "p"}}"#);
        assert_eq!(c.min_riders().unwrap(), None);
        let c = config(r#"{"outputSettings": {"pollName": "p"}, "minRiders": -2}"#);
        assert!(c.min_riders().is_err());
    }

    #[test]
    fn defaults_without_config() {
        let setup = PollSetup::from_args(&Args::default()).unwrap();
        assert_eq!(setup.master_list, Path::new(".").join(DEFAULT_MASTER_LIST));
        assert_eq!(setup.ballot_directory, Path::new(".").join(DEFAULT_BALLOT_DIRECTORY));
        assert_eq!(setup.rules, PollRules::DEFAULT_RULES);
        assert_eq!(setup.output_path, None);
    }

    #[test]
    fn command_line_overrides() {
        let args = Args {
            config: Some(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/small_poll/small_poll_config.json").to_string()),
            ballots: Some("elsewhere".to_string()),
            min_riders: Some(4),
            include_voter_info: true,
            ..Args::default()
        };
        let setup = PollSetup::from_args(&args).unwrap();
        assert_eq!(setup.ballot_directory, PathBuf::from("elsewhere"));
        assert!(setup.master_list.ends_with("small_poll/blankballot.txt"));
        assert_eq!(setup.rules.min_riders, 4);
        assert!(setup.rules.include_voter_info);
        assert_eq!(setup.poll_name, "Small steel poll");
    }
}
