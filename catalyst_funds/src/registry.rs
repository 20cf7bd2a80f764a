//! The registry of fund-specific adapters, and of the files of each fund.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use log::debug;
use snafu::prelude::*;

use crate::config::Policy;
use crate::errors::*;
use crate::table::Table;
use crate::workbook::WorkbookTables;

/// Reshapes the raw validation sheet of a fund into two columns: challenge name and budget.
pub type ValidationAdapter = fn(Table) -> FundResult<Table>;
/// The budget resolution rules of a fund.
pub type BudgetAdapter = fn() -> BudgetPolicy;
/// The column renames of a fund's challenge sheets.
pub type ChallengeSchemaAdapter = fn() -> ChallengeSchema;
/// Builds the canonical assessments table of a fund.
pub type AssessmentsAdapter =
    fn(&WorkbookTables, &Policy, &mut Vec<PipelineWarning>) -> FundResult<Table>;
/// Builds the community advisor summary from the canonical assessments.
pub type CasAdapter = fn(&Table, &WorkbookTables, &Policy) -> FundResult<Table>;
/// Builds the veteran community advisor table.
pub type VcasAdapter = fn(&WorkbookTables) -> FundResult<Table>;

/// How the challenge sheets of a fund find their budget.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct BudgetPolicy {
    /// (sheet name, name in the validation table), for the sheets whose name was
    /// truncated or spelled differently.
    pub name_aliases: &'static [(&'static str, &'static str)],
    /// (sheet name, budget), for the challenges that are missing from the validation table.
    pub explicit_budgets: &'static [(&'static str, i64)],
}

impl BudgetPolicy {
    pub const EMPTY: BudgetPolicy = BudgetPolicy {
        name_aliases: &[],
        explicit_budgets: &[],
    };

    /// The name to look up in the validation table.
    pub fn validation_name<'a>(&self, challenge: &'a str) -> &'a str {
        self.name_aliases
            .iter()
            .find(|(sheet, _)| *sheet == challenge)
            .map(|(_, name)| *name)
            .unwrap_or(challenge)
    }

    pub fn explicit_budget(&self, challenge: &str) -> Option<i64> {
        self.explicit_budgets
            .iter()
            .find(|(sheet, _)| *sheet == challenge)
            .map(|(_, b)| *b)
    }
}

/// How the raw columns of the challenge sheets map to the canonical results columns.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ChallengeSchema {
    /// (raw name, canonical name)
    pub column_renames: &'static [(&'static str, &'static str)],
}

impl ChallengeSchema {
    pub const IDENTITY: ChallengeSchema = ChallengeSchema {
        column_renames: &[],
    };
}

/// The adapters needed to normalize the voting results of a fund.
#[derive(Debug, Clone, Copy, Default)]
pub struct VotingAdapters {
    pub validation_setup: Option<ValidationAdapter>,
    pub budget: Option<BudgetAdapter>,
    pub process: Option<ChallengeSchemaAdapter>,
}

/// The adapters needed to normalize the assessments of a fund.
/// The veteran adapter is optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentAdapters {
    pub assessments: Option<AssessmentsAdapter>,
    pub cas: Option<CasAdapter>,
    pub vcas: Option<VcasAdapter>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FundAdapters {
    pub voting: VotingAdapters,
    pub assessments: AssessmentAdapters,
}

/// The operations that require a fund-specific adapter.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Operation {
    ValidationSetup,
    BudgetSetup,
    ChallengeProcessing,
    Assessments,
    CommunityAdvisors,
    VeteranCommunityAdvisors,
}

impl Operation {
    /// The naming convention of the adapter: `<prefix>_<fund id>`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Operation::ValidationSetup => "validation_setup",
            Operation::BudgetSetup => "get_budget",
            Operation::ChallengeProcessing => "get_process",
            Operation::Assessments => "get_assessments",
            Operation::CommunityAdvisors => "get_cas",
            Operation::VeteranCommunityAdvisors => "get_vcas",
        }
    }

    pub fn function_name(&self, fund: &str) -> String {
        format!("{}_{}", self.prefix(), fund)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operation::ValidationSetup => "validation setup",
            Operation::BudgetSetup => "budget setup",
            Operation::ChallengeProcessing => "challenge data processing",
            Operation::Assessments => "assessments",
            Operation::CommunityAdvisors => "community advisors",
            Operation::VeteranCommunityAdvisors => "veteran community advisors",
        };
        write!(f, "{}", s)
    }
}

/// Fund id -> adapters.
///
/// It is built once (usually with [AdapterRegistry::builtin]) and passed by reference
/// to the pipelines. A fund may only have the adapters of one dataset.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    funds: BTreeMap<String, FundAdapters>,
}

impl AdapterRegistry {
    pub fn new() -> AdapterRegistry {
        AdapterRegistry::default()
    }

    /// The adapters of all the historical funds (f3 to f8).
    pub fn builtin() -> AdapterRegistry {
        let mut reg = AdapterRegistry::new();
        for (fund, adapters) in crate::funds::builtin_adapters() {
            reg.register(fund, adapters);
        }
        reg
    }

    pub fn register(&mut self, fund: &str, adapters: FundAdapters) {
        debug!("register: {}", fund);
        self.funds.insert(fund.to_string(), adapters);
    }

    pub fn funds(&self) -> Vec<String> {
        self.funds.keys().cloned().collect()
    }

    fn lookup<T, F>(&self, fund: &str, operation: Operation, pick: F) -> FundResult<T>
    where
        F: Fn(&FundAdapters) -> Option<T>,
    {
        self.funds
            .get(fund)
            .and_then(pick)
            .context(AdapterNotFoundSnafu {
                fund,
                operation,
                function: operation.function_name(fund),
            })
    }

    pub fn validation_setup(&self, fund: &str) -> FundResult<ValidationAdapter> {
        self.lookup(fund, Operation::ValidationSetup, |a| a.voting.validation_setup)
    }

    pub fn budget(&self, fund: &str) -> FundResult<BudgetAdapter> {
        self.lookup(fund, Operation::BudgetSetup, |a| a.voting.budget)
    }

    pub fn process(&self, fund: &str) -> FundResult<ChallengeSchemaAdapter> {
        self.lookup(fund, Operation::ChallengeProcessing, |a| a.voting.process)
    }

    pub fn assessments(&self, fund: &str) -> FundResult<AssessmentsAdapter> {
        self.lookup(fund, Operation::Assessments, |a| a.assessments.assessments)
    }

    pub fn cas(&self, fund: &str) -> FundResult<CasAdapter> {
        self.lookup(fund, Operation::CommunityAdvisors, |a| a.assessments.cas)
    }

    pub fn vcas(&self, fund: &str) -> FundResult<VcasAdapter> {
        self.lookup(fund, Operation::VeteranCommunityAdvisors, |a| {
            a.assessments.vcas
        })
    }
}

// ********* Files **********

/// The kinds of workbooks shipped for each fund.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Dataset {
    VotingResults,
    Assessments,
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::VotingResults => write!(f, "voting results"),
            Dataset::Assessments => write!(f, "assessments"),
        }
    }
}

const VOTING_RESULTS_DIR: &str = "datafiles_votingresults";
const ASSESSMENTS_DIR: &str = "datafiles_assessments";

const VOTING_RESULTS_FILES: [(&str, &str); 6] = [
    ("f3", "Fund3 Voting results.xlsx"),
    ("f4", "Fund4 Voting results.xlsx"),
    ("f5", "Fund5 Voting results.xlsx"),
    ("f6", "Fund6 Voting results.xlsx"),
    ("f7", "Fund7 Voting results.xlsx"),
    ("f8", "Fund8 Voting results.xlsx"),
];

const ASSESSMENTS_FILES: [(&str, &str); 6] = [
    ("f3", "Community Aggregated - Review of Reviewers v3.xlsx"),
    ("f4", "Final_vCA Aggregated - fund4.xlsx"),
    ("f5", "vCA Aggregated - Fund 5.xlsx"),
    ("f6", "vCA Aggregated - Fund 6.xlsx"),
    ("f7", "vCA Aggregated - Fund 7.xlsx"),
    ("f8", "vCA Aggregated - Fund 8 (Final MVP candidate).xlsx"),
];

/// Fund id -> workbook path, for each dataset.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct FundFiles {
    files: BTreeMap<Dataset, BTreeMap<String, PathBuf>>,
}

impl FundFiles {
    pub fn new() -> FundFiles {
        FundFiles::default()
    }

    /// The historical layout: one directory per dataset under `data_dir`.
    pub fn default_layout(data_dir: &Path) -> FundFiles {
        let mut res = FundFiles::new();
        for (fund, file) in VOTING_RESULTS_FILES {
            res.insert(
                Dataset::VotingResults,
                fund,
                data_dir.join(VOTING_RESULTS_DIR).join(file),
            );
        }
        for (fund, file) in ASSESSMENTS_FILES {
            res.insert(
                Dataset::Assessments,
                fund,
                data_dir.join(ASSESSMENTS_DIR).join(file),
            );
        }
        res
    }

    pub fn insert(&mut self, dataset: Dataset, fund: &str, path: PathBuf) {
        self.files
            .entry(dataset)
            .or_default()
            .insert(fund.to_string(), path);
    }

    pub fn funds(&self, dataset: Dataset) -> Vec<String> {
        self.files
            .get(&dataset)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn path(&self, dataset: Dataset, fund: &str) -> FundResult<&Path> {
        self.files
            .get(&dataset)
            .and_then(|m| m.get(fund))
            .map(|p| p.as_path())
            .context(UnknownFundSnafu {
                fund,
                available: self.funds(dataset),
            })
    }

    /// Checks that every registered file has the adapters of its dataset.
    pub fn validate(&self, registry: &AdapterRegistry) -> FundResult<()> {
        for fund in self.funds(Dataset::VotingResults) {
            registry.validation_setup(&fund)?;
            registry.budget(&fund)?;
            registry.process(&fund)?;
        }
        for fund in self.funds(Dataset::Assessments) {
            registry.assessments(&fund)?;
            registry.cas(&fund)?;
        }
        Ok(())
    }
}
