/*!

This is the long-form manual for `catalyst_funds` and `catalyst_report`.

## Workbooks

Each fund ships two workbooks:
* the voting results: one sheet per challenge, plus optional `Validation`,
  `Withdrawals` and `Template` sheets (matched in any case)
* the assessments: the sheets are fund specific

The default layout of the data directory is:

```text
<data dir>/datafiles_votingresults/Fund6 Voting results.xlsx
<data dir>/datafiles_assessments/vCA Aggregated - Fund 6.xlsx
```

Use a configuration file (see [below](#configuration)) for any other layout.

## Voting results

The pipeline runs the following stages:

1. **Validation setup.** The validation adapter of the fund cleans up the raw
   `Validation` sheet (footer rows, short names in parentheses). Its output must have
   exactly two columns, which become `challenge` and `budget`. Rows without a challenge
   are dropped and every budget must be an integer.
2. **Budget setup.** Each challenge sheet receives a `challenge` column (the sheet name)
   and a `Budget` column. The budget is the explicit budget of the fund for this
   challenge if there is one, otherwise the validation entry whose name matches the
   sheet name after the fund's aliases are applied. Sheet names are truncated to 31
   characters by Excel, hence the aliases. An unresolved budget is empty and is
   reported as a warning.
3. **Challenge processing.** Columns are renamed, vote counts are read as integers
   (currency signs and thousands separators are accepted), and `REQUESTED %` is
   recomputed from `REQUESTED $` and `Budget`. A proposal is marked `NOT APPROVED` when
   its `Meets approval threshold` column is `NO` or, without that column, when
   `YES < 1.15 × NO`.
4. **Concatenation** of all the challenges into the results table.

## Assessments

The fund adapter builds one row per assessment with the columns
`CA, PROPOSAL_TITLE, CA_RATING, QA_STATUS, REASON, QA_CLASS`. With the aggregated
layout (funds 6 to 8):

* `CA_RATING` is the mean of the three sub-criterion ratings
* `QA_CLASS` is read from the `Result Filtered Out`, `Result Good` and
  `Result Excellent` markers. When several of them are set, the first one in this
  order wins and a warning is recorded.
* filtered out assessments are `Excluded` with the reason `Filtered Out`
* from fund 7 on, a valid assessment whose justifications total less than 150
  characters is `Excluded` with the reason `<150 char`
* blank assessments are `Excluded` with the reason `Blank`

The community advisor summary counts the assessments of each CA. The exclusion of a CA
depends on the fund:

| fund  | criterion                                                     |
|-------|---------------------------------------------------------------|
| f3    | none, every CA is included                                    |
| f4    | the `Excluded assessors` sheet                                |
| f5    | the `excluded` flag of the `Community Advisors` sheet         |
| f6-f8 | more than 20% of the assessments of the CA are excluded       |

## Adding a fund

A fund is an entry in the [`AdapterRegistry`](crate::AdapterRegistry) and one file
entry per dataset in [`FundFiles`](crate::FundFiles). The adapters are plain functions:

| operation            | naming convention     | required           |
|----------------------|-----------------------|--------------------|
| validation setup     | `validation_setup_fN` | with a `Validation` sheet |
| budget setup         | `get_budget_fN`       | yes                |
| challenge processing | `get_process_fN`      | yes                |
| assessments          | `get_assessments_fN`  | yes                |
| community advisors   | `get_cas_fN`          | yes                |
| veteran advisors     | `get_vcas_fN`         | no                 |

The names only appear in the error messages, when the registry lacks an adapter.

```
use catalyst_funds::*;

fn validation_setup(t: Table) -> FundResult<Table> {
    Ok(t)
}

fn budget() -> BudgetPolicy {
    BudgetPolicy {
        name_aliases: &[("Sponsored by leftovers", "Leftovers")],
        explicit_budgets: &[],
    }
}

fn process() -> ChallengeSchema {
    ChallengeSchema { column_renames: &[("Overall score", "SCORE")] }
}

let mut registry = AdapterRegistry::builtin();
registry.register(
    "f9",
    FundAdapters {
        voting: VotingAdapters {
            validation_setup: Some(validation_setup),
            budget: Some(budget),
            process: Some(process),
        },
        ..Default::default()
    },
);
assert!(registry.budget("f9").is_ok());
assert!(registry.assessments("f9").is_err());
```

## Configuration

`catalyst_report` reads an optional JSON configuration file:

```json
{
  "dataDirectory": "/data/catalyst",
  "votingResults": { "f9": "Fund9 Voting results.xlsx" },
  "assessments": { "f9": "vCA Aggregated - Fund 9.xlsx" },
  "policy": { "approvalRatio": 1.15, "minimumCharacters": 150, "caExclusionRatio": 0.2 }
}
```

Relative paths are resolved against `dataDirectory`, itself relative to the
configuration file. The entries are added to the default layout. All the fields are
optional.

 */
