use clap::Parser;

/// This program normalizes the spreadsheets of the Catalyst funds into canonical tables.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (fund id, for example f6) The fund to process. It must have a workbook registered, either in the
    /// default layout of the data directory or in the configuration file.
    #[clap(short, long, value_parser)]
    pub fund: String,

    /// (voting, assessments or all, default all) The workbooks of the fund to process.
    #[clap(short, long, value_parser, default_value = "all")]
    pub dataset: String,

    /// (file path, optional) A JSON configuration file with the location of the workbooks and the
    /// thresholds of the pipelines. See the manual of the catalyst_funds crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default current directory) The directory containing the workbooks. Setting this option
    /// overrides the directory that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub data_dir: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the canonical tables will be written in JSON format to the given
    /// location. They are written to the standard output otherwise.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a previous export in JSON format. If provided, catalyst_report will
    /// check that the exported tables match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
