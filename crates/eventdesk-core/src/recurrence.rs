//! Building repeat rules from editor choices.
//!
//! The editor shows the "until" date as the last day the event may occur on.
//! The stored boundary is exclusive, so it is one day after the shown date.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::event::{EndType, RepeatPeriod, RepeatRule};
use crate::time::{DateTimeNormalizer, encode_all_day_boundary};
use crate::validation::ValidationError;

/// End condition of a repeat draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatEnd {
    Never,
    /// Number of occurrences as entered; values below 1 mean "never".
    Count(i64),
    /// Last local day the event may occur on.
    Until(NaiveDate),
}

impl RepeatEnd {
    pub fn end_type(&self) -> EndType {
        match self {
            Self::Never => EndType::Never,
            Self::Count(_) => EndType::Count,
            Self::Until(_) => EndType::UntilDate,
        }
    }
}

/// Editable repeat settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatDraft {
    pub frequency: RepeatPeriod,
    pub interval: u32,
    pub end: RepeatEnd,
}

/// Mutable repeat settings of a draft, absent when the event does not repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRuleBuilder {
    normalizer: DateTimeNormalizer,
    draft: Option<RepeatDraft>,
    until_seed_period: RepeatPeriod,
}

impl RecurrenceRuleBuilder {
    /// Creates a builder for a non-repeating event.
    pub fn new(normalizer: DateTimeNormalizer) -> Self {
        Self {
            normalizer,
            draft: None,
            until_seed_period: RepeatPeriod::Monthly,
        }
    }

    /// Loads the settings of a stored rule.
    ///
    /// `all_day` must be the all-day state of the event the rule belongs to,
    /// since it decides how the until boundary was encoded.
    pub fn from_rule(normalizer: DateTimeNormalizer, rule: &RepeatRule, all_day: bool) -> Self {
        let end = match rule.end_type {
            EndType::Never => RepeatEnd::Never,
            EndType::Count => RepeatEnd::Count(rule.end_value.unwrap_or(1)),
            EndType::UntilDate => match rule.until() {
                Some(boundary) => {
                    let boundary_date = if all_day {
                        boundary.date_naive()
                    } else {
                        normalizer.local_date(boundary)
                    };
                    RepeatEnd::Until(boundary_date.pred_opt().unwrap_or(boundary_date))
                }
                None => RepeatEnd::Never,
            },
        };

        Self {
            normalizer,
            draft: Some(RepeatDraft {
                frequency: rule.frequency,
                interval: rule.interval.max(1),
                end,
            }),
            until_seed_period: RepeatPeriod::Monthly,
        }
    }

    /// Sets the period used to seed a fresh until date.
    #[must_use]
    pub fn with_until_seed_period(mut self, period: RepeatPeriod) -> Self {
        self.until_seed_period = period;
        self
    }

    /// Current settings, `None` if the event does not repeat.
    pub fn draft(&self) -> Option<&RepeatDraft> {
        self.draft.as_ref()
    }

    pub fn is_repeating(&self) -> bool {
        self.draft.is_some()
    }

    /// Sets or clears the frequency.
    ///
    /// A fresh rule starts at interval 1 and never ends. Clearing removes the
    /// whole rule.
    pub fn set_frequency(&mut self, frequency: Option<RepeatPeriod>) {
        match (frequency, self.draft.as_mut()) {
            (None, _) => self.draft = None,
            (Some(frequency), Some(draft)) => draft.frequency = frequency,
            (Some(frequency), None) => {
                self.draft = Some(RepeatDraft {
                    frequency,
                    interval: 1,
                    end: RepeatEnd::Never,
                })
            }
        }
    }

    /// Sets the interval; ignored when the event does not repeat.
    pub fn set_interval(&mut self, interval: u32) {
        if let Some(draft) = self.draft.as_mut() {
            draft.interval = interval.max(1);
        }
    }

    /// Switches the end condition, resetting its value.
    ///
    /// A count starts at one occurrence; an until date starts one seed
    /// period after `today`.
    pub fn set_end_type(&mut self, end_type: EndType, today: NaiveDate) {
        let seed = self
            .normalizer
            .shift_by_recurrence_period(today, self.until_seed_period, 1);
        let Some(draft) = self.draft.as_mut() else {
            debug!(?end_type, "ignoring end type for non-repeating event");
            return;
        };
        draft.end = match end_type {
            EndType::Never => RepeatEnd::Never,
            EndType::Count => RepeatEnd::Count(1),
            EndType::UntilDate => RepeatEnd::Until(seed),
        };
    }

    /// Sets the occurrence count when the rule ends after a count.
    pub fn set_end_count(&mut self, count: i64) {
        if let Some(RepeatDraft {
            end: end @ RepeatEnd::Count(_),
            ..
        }) = self.draft.as_mut()
        {
            *end = RepeatEnd::Count(count);
        }
    }

    /// Sets the last day when the rule ends at a date.
    pub fn set_end_date(&mut self, date: NaiveDate) {
        if let Some(RepeatDraft {
            end: end @ RepeatEnd::Until(_),
            ..
        }) = self.draft.as_mut()
        {
            *end = RepeatEnd::Until(date);
        }
    }

    /// Builds the rule to store on the event.
    ///
    /// `event_start` is the stored start instant of the event, so for all-day
    /// events it is already a UTC midnight. A count below one becomes a rule
    /// that never ends.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StartNotBeforeEnd`] if the until boundary
    /// lies before the event start.
    pub fn finalize(
        &self,
        all_day: bool,
        event_start: DateTime<Utc>,
    ) -> Result<Option<RepeatRule>, ValidationError> {
        let Some(draft) = self.draft else {
            return Ok(None);
        };

        let mut rule = RepeatRule::new(draft.frequency, draft.interval, self.normalizer.zone().name());

        match draft.end {
            RepeatEnd::Never => {}
            RepeatEnd::Count(count) if count < 1 => {
                debug!(count, "non-positive repeat count, rule never ends");
            }
            RepeatEnd::Count(count) => {
                rule.end_type = EndType::Count;
                rule.end_value = Some(count);
            }
            RepeatEnd::Until(last_day) => {
                let boundary = if all_day {
                    encode_all_day_boundary(last_day) + Duration::days(1)
                } else {
                    self.normalizer.start_of_next_day(last_day)
                };
                if boundary < event_start {
                    return Err(ValidationError::StartNotBeforeEnd);
                }
                rule = rule.with_until(boundary);
            }
        }

        Ok(Some(rule))
    }
}
