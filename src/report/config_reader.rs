use crate::report::*;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(rename = "approvalRatio")]
    pub approval_ratio: Option<f64>,
    #[serde(rename = "minimumCharacters")]
    pub minimum_characters: Option<usize>,
    #[serde(rename = "caExclusionRatio")]
    pub ca_exclusion_ratio: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "dataDirectory")]
    pub data_directory: Option<String>,
    /// fund -> workbook
    #[serde(rename = "votingResults", default)]
    pub voting_results: BTreeMap<String, String>,
    /// fund -> workbook
    #[serde(default)]
    pub assessments: BTreeMap<String, String>,
    pub policy: Option<PolicyConfig>,
}

/// Everything the pipelines need besides the workbooks themselves.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub files: FundFiles,
    pub policy: Policy,
}

impl PolicyConfig {
    fn policy(&self) -> Policy {
        let default = Policy::DEFAULT;
        Policy {
            approval_ratio: self.approval_ratio.unwrap_or(default.approval_ratio),
            minimum_characters: self
                .minimum_characters
                .unwrap_or(default.minimum_characters),
            ca_exclusion_ratio: self
                .ca_exclusion_ratio
                .unwrap_or(default.ca_exclusion_ratio),
        }
    }
}

pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: ReportConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// Combines the configuration file (if any) with the command line.
///
/// The data directory is, in order: `data_dir`, the `dataDirectory` of the configuration
/// (relative to the configuration file), the current directory. The workbooks of the
/// configuration are added to the default layout of this directory.
pub fn build_settings(
    config: Option<(&Path, ReportConfig)>,
    data_dir: Option<&str>,
) -> Settings {
    let (config_dir, config) = match config {
        Some((p, c)) => (
            p.parent().map(|d| d.to_path_buf()).unwrap_or_default(),
            Some(c),
        ),
        None => (PathBuf::new(), None),
    };
    let root: PathBuf = match (data_dir, config.as_ref().and_then(|c| c.data_directory.as_ref())) {
        (Some(d), _) => PathBuf::from(d),
        (None, Some(d)) => io_common::resolve(&config_dir, d),
        (None, None) => PathBuf::from("."),
    };
    debug!("build_settings: data directory: {:?}", root);

    let mut files = FundFiles::default_layout(&root);
    let mut policy = Policy::DEFAULT;
    if let Some(c) = config {
        for (fund, file) in c.voting_results.iter() {
            files.insert(Dataset::VotingResults, fund, io_common::resolve(&root, file));
        }
        for (fund, file) in c.assessments.iter() {
            files.insert(Dataset::Assessments, fund, io_common::resolve(&root, file));
        }
        if let Some(p) = c.policy {
            policy = p.policy();
        }
    }
    Settings { files, policy }
}

pub fn load_settings(config_path: Option<&str>, data_dir: Option<&str>) -> ReportResult<Settings> {
    let config = match config_path {
        Some(p) => Some((Path::new(p), read_config(p)?)),
        None => None,
    };
    Ok(build_settings(config, data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "dataDirectory": "catalyst",
        "votingResults": { "f9": "Fund9 Voting results.xlsx" },
        "assessments": { "f6": "/archive/f6.xlsx" },
        "policy": { "minimumCharacters": 200 }
    }"#;

    #[test]
    fn configuration_file() {
        let config: ReportConfig = serde_json::from_str(CONFIG).unwrap();
        let settings = build_settings(Some((Path::new("/etc/report/funds.json"), config)), None);
        assert_eq!(
            settings.files.path(Dataset::VotingResults, "f9").unwrap(),
            Path::new("/etc/report/catalyst/Fund9 Voting results.xlsx")
        );
        assert_eq!(
            settings.files.path(Dataset::VotingResults, "f6").unwrap(),
            Path::new("/etc/report/catalyst/datafiles_votingresults/Fund6 Voting results.xlsx")
        );
        assert_eq!(
            settings.files.path(Dataset::Assessments, "f6").unwrap(),
            Path::new("/archive/f6.xlsx")
        );
        assert_eq!(settings.policy.minimum_characters, 200);
        assert_eq!(settings.policy.approval_ratio, 1.15);
    }

    #[test]
    fn data_dir_overrides_the_configuration() {
        let config: ReportConfig = serde_json::from_str(CONFIG).unwrap();
        let settings = build_settings(Some((Path::new("funds.json"), config)), Some("/data"));
        assert_eq!(
            settings.files.path(Dataset::VotingResults, "f9").unwrap(),
            Path::new("/data/Fund9 Voting results.xlsx")
        );
    }

    #[test]
    fn empty_configuration() {
        let config: ReportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.policy, None);
        let settings = build_settings(Some((Path::new("funds.json"), config)), None);
        assert_eq!(settings, build_settings(None, None));
        assert_eq!(settings.policy, Policy::DEFAULT);
    }
}
