use std::fmt;

use serde::{Deserialize, Serialize};

/// Time granularity a metric is reported at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PeriodOption {
    /// Monthly ids, `YYYYMM`.
    PeriodId,
    /// Quarterly ids, `YYYYQ`.
    QuarterId,
    /// Yearly ids, `YYYY`.
    Year,
}

impl PeriodOption {
    /// Column name the query engine groups by.
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodOption::PeriodId => "period_id",
            PeriodOption::QuarterId => "quarter_id",
            PeriodOption::Year => "year",
        }
    }
}

impl fmt::Display for PeriodOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar used to decide where a year ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Calendar {
    #[default]
    Gregorian,
    /// Fiscal year running from month 11 to month 10.
    Ethiopian,
}

/// Absolute period range, tagged with its granularity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeriodBounds {
    pub period_option: PeriodOption,
    pub min: u32,
    pub max: u32,
}

/// Time window as authored by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "filter_type", rename_all = "snake_case")]
pub enum PeriodFilter {
    Custom {
        period_option: PeriodOption,
        min: u32,
        max: u32,
    },
    LastNMonths {
        n_months: u32,
    },
    /// From a starting month (`YYYYMM`) up to the latest available period.
    FromMonth {
        min: u32,
    },
    LastCalendarYear,
}
