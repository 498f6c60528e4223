use chrono::{NaiveDate, TimeDelta};

use crate::{ClientError, ClientResult};

/// Detector threshold policy identifier.
///
/// Emitted with every analysis result so a threshold change shows up as a
/// version bump rather than silently different findings.
pub const DETECTOR_POLICY_VERSION: &str = "leaks/v1";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecurringPolicy {
    pub min_occurrences: usize,
    pub min_gap_days: i64,
    pub max_gap_days: i64,
    pub min_monthly_ratio: f64,
}

impl RecurringPolicy {
    pub fn is_monthly_gap(self, gap_days: i64) -> bool {
        gap_days >= self.min_gap_days && gap_days <= self.max_gap_days
    }

    pub fn passes(self, monthly_ratio: f64) -> bool {
        monthly_ratio >= self.min_monthly_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreepPolicy {
    pub min_occurrences: usize,
    /// `new` must be strictly greater than `old * min_increase_factor`.
    pub min_increase_factor: f64,
}

impl CreepPolicy {
    pub fn is_creep(self, old_median: f64, new_median: f64) -> bool {
        new_median > old_median * self.min_increase_factor
    }
}

/// Whether one paid charge may satisfy several trial charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialMatching {
    /// Every trial independently takes the earliest paid charge in its window.
    #[default]
    Permissive,
    /// Trials are matched in date order and each paid charge is consumed once.
    Exclusive,
}

impl TrialMatching {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::Exclusive => "exclusive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialPolicy {
    pub trial_max: f64,
    pub paid_min: f64,
    pub lookahead_days_min: i64,
    pub lookahead_days_max: i64,
    pub matching: TrialMatching,
}

impl TrialPolicy {
    pub fn is_trial(self, spend: f64) -> bool {
        spend <= self.trial_max
    }

    pub fn is_paid(self, spend: f64) -> bool {
        spend >= self.paid_min
    }

    /// Inclusive `[start, end]` window after a trial date, or `None` when it
    /// falls outside the calendar.
    pub fn window(self, trial_date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = trial_date.checked_add_signed(TimeDelta::try_days(self.lookahead_days_min)?)?;
        let end = trial_date.checked_add_signed(TimeDelta::try_days(self.lookahead_days_max)?)?;
        Some((start, end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorPolicy {
    pub recurring: RecurringPolicy,
    pub creep: CreepPolicy,
    pub trial: TrialPolicy,
}

impl DetectorPolicy {
    pub fn validate(&self, command: &str) -> ClientResult<()> {
        if self.recurring.min_occurrences == 0 || self.creep.min_occurrences == 0 {
            return Err(ClientError::invalid_argument_for_command(
                "`min-occurrences` must be at least 1.",
                Some(command),
            ));
        }
        if !self.trial.trial_max.is_finite() || self.trial.trial_max < 0.0 {
            return Err(ClientError::invalid_argument_for_command(
                "`trial-max` must be a non-negative number.",
                Some(command),
            ));
        }
        if !self.trial.paid_min.is_finite() || self.trial.paid_min <= 0.0 {
            return Err(ClientError::invalid_argument_for_command(
                "`paid-min` must be a positive number.",
                Some(command),
            ));
        }
        // Overlapping bands would let one charge pair with itself at day 0.
        if self.trial.trial_max >= self.trial.paid_min {
            return Err(ClientError::invalid_argument_for_command(
                "`trial-max` must be below `paid-min`.",
                Some(command),
            ));
        }
        if self.trial.lookahead_days_min < 0 {
            return Err(ClientError::invalid_argument_for_command(
                "`lookahead-min` must not be negative.",
                Some(command),
            ));
        }
        if self.trial.lookahead_days_min > self.trial.lookahead_days_max {
            return Err(ClientError::invalid_argument_for_command(
                "`lookahead-min` must be on or before `lookahead-max`.",
                Some(command),
            ));
        }
        if self.trial.lookahead_days_max > MAX_LOOKAHEAD_DAYS {
            return Err(ClientError::invalid_argument_for_command(
                &format!("`lookahead-max` must be at most {MAX_LOOKAHEAD_DAYS} days."),
                Some(command),
            ));
        }
        Ok(())
    }
}

const MAX_LOOKAHEAD_DAYS: i64 = 3660;

pub const DETECTOR_POLICY_V1: DetectorPolicy = DetectorPolicy {
    recurring: RecurringPolicy {
        min_occurrences: 3,
        min_gap_days: 26,
        max_gap_days: 33,
        min_monthly_ratio: 0.6,
    },
    creep: CreepPolicy {
        min_occurrences: 3,
        min_increase_factor: 1.10,
    },
    trial: TrialPolicy {
        trial_max: 2.00,
        paid_min: 8.00,
        lookahead_days_min: 3,
        lookahead_days_max: 30,
        matching: TrialMatching::Permissive,
    },
};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{DETECTOR_POLICY_V1, TrialMatching};

    #[test]
    fn monthly_band_is_inclusive() {
        let policy = DETECTOR_POLICY_V1.recurring;
        assert!(!policy.is_monthly_gap(25));
        assert!(policy.is_monthly_gap(26));
        assert!(policy.is_monthly_gap(33));
        assert!(!policy.is_monthly_gap(34));
        assert!(policy.passes(0.6));
        assert!(!policy.passes(0.5999));
    }

    #[test]
    fn creep_requires_strictly_more_than_ten_percent() {
        let policy = DETECTOR_POLICY_V1.creep;
        assert!(!policy.is_creep(10.0, 11.0));
        assert!(policy.is_creep(10.0, 11.01));
    }

    #[test]
    fn trial_window_spans_inclusive_lookahead() {
        let policy = DETECTOR_POLICY_V1.trial;
        let start = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(start.is_some());
        if let Some(date) = start {
            let window = policy.window(date);
            assert_eq!(
                window,
                Some((
                    NaiveDate::from_ymd_opt(2026, 1, 4).unwrap_or(NaiveDate::MIN),
                    NaiveDate::from_ymd_opt(2026, 1, 31).unwrap_or(NaiveDate::MIN),
                ))
            );
        }
        assert_eq!(policy.window(NaiveDate::MAX), None);
    }

    #[test]
    fn default_policy_validates_and_is_permissive() {
        assert!(DETECTOR_POLICY_V1.validate("analyze").is_ok());
        assert_eq!(DETECTOR_POLICY_V1.trial.matching, TrialMatching::Permissive);
    }

    #[test]
    fn inverted_lookahead_is_rejected() {
        let mut policy = DETECTOR_POLICY_V1;
        policy.trial.lookahead_days_min = 10;
        policy.trial.lookahead_days_max = 5;
        let result = policy.validate("trials");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }

    #[test]
    fn overlapping_trial_and_paid_bands_are_rejected() {
        let mut policy = DETECTOR_POLICY_V1;
        policy.trial.trial_max = 10.0;
        policy.trial.paid_min = 10.0;
        policy.trial.lookahead_days_min = 0;
        let result = policy.validate("trials");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
            assert!(error.message.contains("trial-max"));
        }

        policy.trial.trial_max = 9.99;
        assert!(policy.validate("trials").is_ok());
    }

    #[test]
    fn zero_min_occurrences_is_rejected() {
        let mut policy = DETECTOR_POLICY_V1;
        policy.recurring.min_occurrences = 0;
        assert!(policy.validate("recurring").is_err());
    }
}
