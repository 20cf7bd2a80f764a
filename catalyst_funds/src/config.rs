// ********* Statuses ***********

use std::fmt::Display;

/// The outcome of a proposal.
///
/// FUNDED and NOT FUNDED come from the funding decisions shipped with the results.
/// NOT APPROVED is derived from the votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ProposalStatus {
    Funded,
    NotFunded,
    NotApproved,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Funded => "FUNDED",
            ProposalStatus::NotFunded => "NOT FUNDED",
            ProposalStatus::NotApproved => "NOT APPROVED",
        }
    }

    pub fn parse(s: &str) -> Option<ProposalStatus> {
        match s.trim() {
            "FUNDED" => Some(ProposalStatus::Funded),
            "NOT FUNDED" => Some(ProposalStatus::NotFunded),
            "NOT APPROVED" => Some(ProposalStatus::NotApproved),
            _ => None,
        }
    }
}

/// The outcome of the quality assurance of one assessment.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum QaStatus {
    Valid,
    Excluded,
}

impl QaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QaStatus::Valid => "Valid",
            QaStatus::Excluded => "Excluded",
        }
    }
}

/// Whether the assessments of a community advisor are kept.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CaStatus {
    Included,
    Excluded,
}

impl CaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaStatus::Included => "Included",
            CaStatus::Excluded => "Excluded",
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        })*
    };
}

display_as_str!(ProposalStatus, QaStatus, CaStatus);

// ********* Policy **********

/// The thresholds applied when deriving statuses.
///
/// They were chosen empirically on the historical funds and can be overridden
/// through the configuration file.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Policy {
    /// A proposal is NOT APPROVED when `YES < approval_ratio * NO`.
    pub approval_ratio: f64,
    /// Assessments whose justifications are shorter than this (in characters) are excluded.
    pub minimum_characters: usize,
    /// A CA is excluded when more than this fraction of their assessments are excluded.
    pub ca_exclusion_ratio: f64,
}

impl Policy {
    pub const DEFAULT: Policy = Policy {
        approval_ratio: 1.15,
        minimum_characters: 150,
        ca_exclusion_ratio: 0.2,
    };

    /// The REASON of assessments excluded for being too short.
    pub fn minimum_characters_reason(&self) -> String {
        format!("<{} char", self.minimum_characters)
    }

    /// The REASON of CAs excluded by the exclusion ratio.
    pub fn ca_exclusion_reason(&self) -> String {
        format!(
            "(Excluded) > {}% (Valid+Excluded)",
            (self.ca_exclusion_ratio * 100.0).round() as i64
        )
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reasons() {
        assert_eq!(Policy::DEFAULT.minimum_characters_reason(), "<150 char");
        assert_eq!(
            Policy::DEFAULT.ca_exclusion_reason(),
            "(Excluded) > 20% (Valid+Excluded)"
        );
    }

    #[test]
    fn status_round_trip() {
        for s in [
            ProposalStatus::Funded,
            ProposalStatus::NotFunded,
            ProposalStatus::NotApproved,
        ] {
            assert_eq!(ProposalStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ProposalStatus::parse("MAYBE"), None);
    }
}
