//! Column names of the canonical tables.
//!
//! Every fund adapter renames its raw columns to these names. The `COLUMNS` arrays
//! give the order in which the columns appear in the canonical tables.

/// The validation table: the authoritative budget of each challenge.
pub mod validation {
    pub const CHALLENGE: &str = "challenge";
    pub const BUDGET: &str = "budget";

    pub const COLUMNS: [&str; 2] = [CHALLENGE, BUDGET];
}

/// The voting results, one row per proposal.
pub mod results {
    pub const CHALLENGE: &str = "challenge";
    pub const BUDGET: &str = "Budget";
    pub const PROPOSAL: &str = "Proposal";
    pub const SCORE: &str = "SCORE";
    pub const YES: &str = "YES";
    pub const NO: &str = "NO";
    pub const UNIQUE_YES: &str = "Unique Yes";
    pub const UNIQUE_NO: &str = "Unique No";
    pub const RESULT: &str = "Result";
    pub const STATUS: &str = "STATUS";
    pub const REQUESTED: &str = "REQUESTED $";
    pub const REQUESTED_PCT: &str = "REQUESTED %";

    /// Not a canonical column: when present, it decides the NOT APPROVED status.
    pub const MEETS_APPROVAL_THRESHOLD: &str = "Meets approval threshold";

    pub const COLUMNS: [&str; 12] = [
        CHALLENGE,
        BUDGET,
        PROPOSAL,
        SCORE,
        YES,
        NO,
        UNIQUE_YES,
        UNIQUE_NO,
        RESULT,
        STATUS,
        REQUESTED,
        REQUESTED_PCT,
    ];

    pub const INTEGER_COLUMNS: [&str; 6] = [YES, NO, UNIQUE_YES, UNIQUE_NO, RESULT, REQUESTED];

    /// The numeric columns summarized by the statistics helpers.
    pub const STATS_COLUMNS: [&str; 8] = [
        SCORE,
        YES,
        NO,
        UNIQUE_YES,
        UNIQUE_NO,
        RESULT,
        REQUESTED,
        REQUESTED_PCT,
    ];
}

/// The assessments, one row per (community advisor, proposal) pair.
pub mod assessments {
    pub const CA: &str = "CA";
    pub const PROPOSAL_TITLE: &str = "PROPOSAL_TITLE";
    pub const CA_RATING: &str = "CA_RATING";
    pub const QA_STATUS: &str = "QA_STATUS";
    pub const REASON: &str = "REASON";
    pub const QA_CLASS: &str = "QA_CLASS";

    pub const COLUMNS: [&str; 6] = [CA, PROPOSAL_TITLE, CA_RATING, QA_STATUS, REASON, QA_CLASS];

    pub const REASON_VALID: &str = "Valid";
    pub const REASON_FILTERED_OUT: &str = "Filtered Out";
    pub const REASON_BLANK: &str = "Blank";

    /// The free-text justifications of an assessment.
    pub const JUSTIFICATION_COLUMNS: [&str; 3] =
        ["Impact / Alignment Note", "Feasibility Note", "Auditability Note"];
    /// The sub-criterion ratings averaged into CA_RATING.
    pub const RATING_COLUMNS: [&str; 3] = [
        "Impact / Alignment Rating",
        "Feasibility Rating",
        "Auditability Rating",
    ];
}

/// The community advisor summary, one row per CA.
pub mod advisors {
    pub const CA: &str = "CA";
    pub const NUMBER_ASSESSMENTS: &str = "NUMBER_ASSESSMENTS";
    pub const STATUS: &str = "STATUS";
    pub const REASON: &str = "REASON";

    pub const COLUMNS: [&str; 4] = [CA, NUMBER_ASSESSMENTS, STATUS, REASON];
}

/// The veteran community advisors.
pub mod veterans {
    pub const NAME: &str = "NAME";
    pub const NUMBER_REVIEWS: &str = "NUMBER_REVIEWS";
    pub const URL: &str = "URL";

    pub const COLUMNS: [&str; 3] = [NAME, NUMBER_REVIEWS, URL];
}
