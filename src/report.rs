use log::{debug, info, warn};

use catalyst_funds::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::report::config_reader::*;

mod config_reader;
mod io_common;
mod io_xlsx;
mod output;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReportError {
    #[snafu(display("Error while processing the {dataset} of fund {fund}: {source}"))]
    Fund {
        source: FundError,
        fund: String,
        dataset: Dataset,
    },
    #[snafu(display("Inconsistent fund registry: {source}"))]
    Registry { source: FundError },
    #[snafu(display("Unknown dataset {dataset:?}. Expected one of: voting, assessments, all"))]
    UnknownDataset { dataset: String },
    #[snafu(display("No reader for {path}. Supported formats: {supported:?}"))]
    UnsupportedFormat {
        path: String,
        supported: Vec<String>,
    },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Sheet {sheet:?} is listed but cannot be found in {path}"))]
    EmptyExcel { path: String, sheet: String },
    #[snafu(display("Error reading {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error in the JSON of {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}: {source}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the exported tables and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type ReportResult<T> = Result<T, ReportError>;

fn parse_datasets(dataset: &str) -> ReportResult<Vec<Dataset>> {
    match dataset {
        "voting" => Ok(vec![Dataset::VotingResults]),
        "assessments" => Ok(vec![Dataset::Assessments]),
        "all" => Ok(vec![Dataset::VotingResults, Dataset::Assessments]),
        x => UnknownDatasetSnafu { dataset: x }.fail(),
    }
}

/// Runs the pipelines of one fund and exports the canonical tables.
pub fn export_fund(fund: &str, datasets: &[Dataset], settings: &Settings) -> ReportResult<JSValue> {
    let registry = AdapterRegistry::builtin();
    settings.files.validate(&registry).context(RegistrySnafu {})?;

    let mut exported: JSMap<String, JSValue> = JSMap::new();
    for dataset in datasets.iter().copied() {
        let path = settings
            .files
            .path(dataset, fund)
            .context(FundSnafu { fund, dataset })?;
        info!(
            "export_fund: {}: reading {} from {:?}",
            fund,
            dataset,
            io_common::simplify_file_name(path)
        );
        let workbook = io_xlsx::read_workbook(path)?;
        let js = match dataset {
            Dataset::VotingResults => {
                let res = run_voting_results(fund, workbook, &registry, &settings.policy)
                    .context(FundSnafu { fund, dataset })?;
                output::voting_results_js(&res)
            }
            Dataset::Assessments => {
                let res = run_assessments(fund, &workbook, &registry, &settings.policy)
                    .context(FundSnafu { fund, dataset })?;
                output::assessments_js(&res).context(FundSnafu { fund, dataset })?
            }
        };
        exported.insert(output::dataset_key(dataset).to_string(), js);
    }
    Ok(json!({ "fund": fund, "datasets": exported }))
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> ReportResult<()> {
    let summary_ref = read_reference(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {
            path: reference_path,
        })?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("check_reference: identical to {:?}", reference_path);
    Ok(())
}

pub fn run(args: &Args) -> ReportResult<()> {
    let datasets = parse_datasets(&args.dataset)?;
    let settings = load_settings(args.config.as_deref(), args.data_dir.as_deref())?;
    debug!("run: settings: {:?}", settings);

    let result_js = export_fund(&args.fund, &datasets, &settings)?;
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu { path: "<export>" })?;
    output::write_output(args.out.as_deref(), &pretty_js_stats)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }
    Ok(())
}

fn read_reference(path: &str) -> ReportResult<JSValue> {
    let contents = fs::read_to_string(Path::new(path)).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn datasets() {
        assert_eq!(parse_datasets("voting").unwrap(), vec![Dataset::VotingResults]);
        assert_eq!(parse_datasets("all").unwrap().len(), 2);
        assert!(matches!(
            parse_datasets("ballots"),
            Err(ReportError::UnknownDataset { .. })
        ));
    }

    #[test]
    fn unknown_fund_names_the_dataset() {
        init();
        let settings = Settings {
            files: FundFiles::default_layout(Path::new("data")),
            policy: Policy::DEFAULT,
        };
        let err = export_fund("f42", &[Dataset::Assessments], &settings).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Fund {
                dataset: Dataset::Assessments,
                source: FundError::UnknownFund { .. },
                ..
            }
        ));
        assert!(err.to_string().contains("f42"));
    }

    #[test]
    fn files_without_adapters_are_rejected() {
        let mut files = FundFiles::default_layout(Path::new("data"));
        files.insert(Dataset::VotingResults, "f42", PathBuf::from("f42.xlsx"));
        let settings = Settings {
            files,
            policy: Policy::DEFAULT,
        };
        let err = export_fund("f6", &[Dataset::VotingResults], &settings).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Registry {
                source: FundError::AdapterNotFound { .. }
            }
        ));
    }

    fn run_fund_test(fund: &str) {
        init();
        let data_dir = option_env!("CATALYST_DATA_DIR").unwrap_or("data");
        info!("Running test {} on {}", fund, data_dir);
        let settings = load_settings(None, Some(data_dir)).unwrap();
        let first = export_fund(fund, &[Dataset::VotingResults, Dataset::Assessments], &settings);
        let first = match first {
            Ok(js) => js,
            Err(e) => panic!("An error occured {}", e),
        };
        let second =
            export_fund(fund, &[Dataset::VotingResults, Dataset::Assessments], &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    #[ignore = "requires the fund workbooks in CATALYST_DATA_DIR"]
    fn fund6_workbooks() {
        run_fund_test("f6");
    }

    #[test]
    #[ignore = "requires the fund workbooks in CATALYST_DATA_DIR"]
    fn fund7_workbooks() {
        run_fund_test("f7");
    }

    #[test]
    #[ignore = "requires the fund workbooks in CATALYST_DATA_DIR"]
    fn fund8_workbooks() {
        run_fund_test("f8");
    }
}
