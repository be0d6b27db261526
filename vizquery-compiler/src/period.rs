//! Period id arithmetic and resolution of relative period filters.

use chrono::{Datelike, Months, NaiveDate};
use vizquery_core::{AuthoringError, Calendar, PeriodBounds, PeriodFilter, PeriodOption};

/// Last month of the Ethiopian fiscal year; the next year opens at month 11.
const FISCAL_YEAR_LAST_MONTH: u32 = 10;

/// A parsed period id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Period {
    /// First day of the month.
    Month(NaiveDate),
    Quarter { year: i32, quarter: u32 },
    Year(i32),
}

impl Period {
    pub fn parse(period_option: PeriodOption, id: u32) -> Result<Self, AuthoringError> {
        let malformed = || AuthoringError::MalformedPeriod { period_option, id };
        match period_option {
            PeriodOption::PeriodId => {
                let year = (id / 100) as i32;
                month_start(year, id % 100).ok_or_else(malformed)
            }
            PeriodOption::QuarterId => {
                let year = (id / 10) as i32;
                let quarter = id % 10;
                if year >= 1 && (1..=4).contains(&quarter) {
                    Ok(Period::Quarter { year, quarter })
                } else {
                    Err(malformed())
                }
            }
            PeriodOption::Year if id >= 1 => Ok(Period::Year(id as i32)),
            PeriodOption::Year => Err(malformed()),
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Period::Month(date) => date.year() as u32 * 100 + date.month(),
            Period::Quarter { year, quarter } => year as u32 * 10 + quarter,
            Period::Year(year) => year as u32,
        }
    }

    pub fn period_option(self) -> PeriodOption {
        match self {
            Period::Month(_) => PeriodOption::PeriodId,
            Period::Quarter { .. } => PeriodOption::QuarterId,
            Period::Year(_) => PeriodOption::Year,
        }
    }

    /// Step back `count` periods of the same granularity.
    pub fn back(self, count: u32) -> Result<Self, AuthoringError> {
        let stepped = match self {
            Period::Month(date) => date
                .checked_sub_months(Months::new(count))
                .filter(|date| date.year() >= 1)
                .map(Period::Month),
            Period::Quarter { year, quarter } => {
                let index = i64::from(year) * 4 + i64::from(quarter - 1) - i64::from(count);
                let year = index.div_euclid(4);
                (year >= 1).then(|| Period::Quarter {
                    year: year as i32,
                    quarter: index.rem_euclid(4) as u32 + 1,
                })
            }
            Period::Year(year) => {
                let year = i64::from(year) - i64::from(count);
                (year >= 1).then_some(Period::Year(year as i32))
            }
        };
        stepped.ok_or_else(|| {
            AuthoringError::UnsupportedPeriodFilter(format!(
                "window of {count} periods before {} starts before year 1",
                self.id()
            ))
        })
    }

    /// Express this period at a coarser (or equal) granularity.
    pub fn coarsen(self, target: PeriodOption) -> Result<Self, AuthoringError> {
        match (self, target) {
            (period, target) if period.period_option() == target => Ok(period),
            (Period::Month(date), PeriodOption::QuarterId) => Ok(Period::Quarter {
                year: date.year(),
                quarter: (date.month() - 1) / 3 + 1,
            }),
            (Period::Month(date), PeriodOption::Year) => Ok(Period::Year(date.year())),
            (Period::Quarter { year, .. }, PeriodOption::Year) => Ok(Period::Year(year)),
            (period, target) => Err(AuthoringError::UnsupportedPeriodFilter(format!(
                "{} cannot be expressed as a {target}",
                period.id()
            ))),
        }
    }
}

/// Resolve `filter` into absolute bounds.
///
/// Custom ranges pass through untouched. Relative filters need the metric's
/// `bounds`; without them the result is `Ok(None)`, as it is for an unset
/// filter.
pub fn resolve_period_filter(
    filter: Option<&PeriodFilter>,
    bounds: Option<&PeriodBounds>,
    calendar: Calendar,
) -> Result<Option<PeriodBounds>, AuthoringError> {
    let Some(filter) = filter else {
        return Ok(None);
    };

    match *filter {
        PeriodFilter::Custom {
            period_option,
            min,
            max,
        } => Ok(Some(PeriodBounds {
            period_option,
            min,
            max,
        })),
        PeriodFilter::LastNMonths { n_months } => resolve_against(bounds, |latest| {
            Ok((last_n_periods(latest, n_months)?, latest))
        }),
        PeriodFilter::FromMonth { min } => resolve_against(bounds, |latest| {
            let start = Period::parse(PeriodOption::PeriodId, min)?;
            Ok((start.coarsen(latest.period_option())?, latest))
        }),
        PeriodFilter::LastCalendarYear => {
            resolve_against(bounds, |latest| last_full_year(latest, calendar))
        }
    }
}

fn resolve_against<F>(
    bounds: Option<&PeriodBounds>,
    window: F,
) -> Result<Option<PeriodBounds>, AuthoringError>
where
    F: FnOnce(Period) -> Result<(Period, Period), AuthoringError>,
{
    let Some(bounds) = bounds else {
        return Ok(None);
    };
    let latest = Period::parse(bounds.period_option, bounds.max)?;
    let (first, last) = window(latest)?;
    Ok(Some(PeriodBounds {
        period_option: bounds.period_option,
        min: first.id(),
        max: last.id(),
    }))
}

/// Yearly data collapses to the latest year whatever `n` is.
fn last_n_periods(latest: Period, n: u32) -> Result<Period, AuthoringError> {
    match latest {
        Period::Year(_) => Ok(latest),
        _ => latest.back(n.max(1) - 1),
    }
}

fn last_full_year(latest: Period, calendar: Calendar) -> Result<(Period, Period), AuthoringError> {
    match (latest, calendar) {
        (Period::Year(_), _) => Ok((latest, latest)),
        (Period::Month(date), Calendar::Gregorian) => {
            let year = if date.month() == 12 {
                date.year()
            } else {
                date.year() - 1
            };
            Ok((month(year, 1)?, month(year, 12)?))
        }
        (Period::Month(date), Calendar::Ethiopian) => {
            let closing_year = if date.month() >= FISCAL_YEAR_LAST_MONTH {
                date.year()
            } else {
                date.year() - 1
            };
            Ok((
                month(closing_year - 1, FISCAL_YEAR_LAST_MONTH + 1)?,
                month(closing_year, FISCAL_YEAR_LAST_MONTH)?,
            ))
        }
        (Period::Quarter { year, quarter }, Calendar::Gregorian) => {
            let year = if quarter == 4 { year } else { year - 1 };
            if year < 1 {
                return Err(before_year_one());
            }
            Ok((
                Period::Quarter { year, quarter: 1 },
                Period::Quarter { year, quarter: 4 },
            ))
        }
        (Period::Quarter { .. }, Calendar::Ethiopian) => {
            Err(AuthoringError::UnsupportedPeriodFilter(
                "quarters do not line up with the Ethiopian fiscal year".to_string(),
            ))
        }
    }
}

fn month(year: i32, month: u32) -> Result<Period, AuthoringError> {
    month_start(year, month).ok_or_else(before_year_one)
}

fn month_start(year: i32, month: u32) -> Option<Period> {
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1).map(Period::Month)
}

fn before_year_one() -> AuthoringError {
    AuthoringError::UnsupportedPeriodFilter("last full year starts before year 1".to_string())
}
