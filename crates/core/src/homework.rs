//! Homework entries. At most one outstanding entry exists per class;
//! adding a new one replaces the previous entry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::is_blank;

/// Date format used by the due-date field (`<input type="date">`).
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkEntry {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

impl HomeworkEntry {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date: due_date.into(),
        }
    }

    /// Every field must be filled in.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("description", &self.description),
            ("due date", &self.due_date),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Homework {} is required",
                missing.join(", ")
            )))
        }
    }

    /// The due date, if it is a well-formed `YYYY-MM-DD` value.
    pub fn due_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.due_date.trim(), DUE_DATE_FORMAT).ok()
    }
}
