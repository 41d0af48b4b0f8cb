// 📊 Demographic Summary - who is in the population
// Household-level counts: a household counts once per attribute,
// however many of its members qualify.

use crate::model::{total_population, Household, VulnerabilityAttribute};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicSummary {
    pub total_households: usize,
    pub total_population: u64,
    pub with_infant: usize,
    pub with_senior: usize,
    pub with_injured: usize,
    pub with_pwd: usize,
}

/// Summarize a household set. Pure; independent of any allocation run.
pub fn summarize(households: &[Household]) -> DemographicSummary {
    let count = |attribute: VulnerabilityAttribute| {
        households
            .iter()
            .filter(|h| h.has_attribute(attribute))
            .count()
    };

    DemographicSummary {
        total_households: households.len(),
        total_population: total_population(households),
        with_infant: count(VulnerabilityAttribute::HasInfant),
        with_senior: count(VulnerabilityAttribute::HasSenior),
        with_injured: count(VulnerabilityAttribute::Injured),
        with_pwd: count(VulnerabilityAttribute::Pwd),
    }
}

impl DemographicSummary {
    /// Label/count pairs in display order. PWD is only listed when present.
    pub fn vulnerability_lines(&self) -> Vec<(&'static str, usize)> {
        let mut lines = vec![
            ("With Infants", self.with_infant),
            ("With Seniors", self.with_senior),
            ("With Injured", self.with_injured),
        ];
        if self.with_pwd > 0 {
            lines.push(("With PWDs", self.with_pwd));
        }
        lines
    }
}

impl fmt::Display for DemographicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Demographic Analysis Summary:")?;
        writeln!(f, "----------------------------------")?;
        writeln!(f, "Total Population:   {} citizens", self.total_population)?;
        writeln!(f, "Total Families:     {}", self.total_households)?;
        writeln!(f)?;
        writeln!(f, "Number of Vulnerable Households:")?;
        for (label, count) in self.vulnerability_lines() {
            writeln!(f, "   • {:<14}{}", format!("{}:", label), count)?;
        }
        Ok(())
    }
}
