//! Attendance keys.
//!
//! An attendance record is a single boolean per `(class, student)` pair.
//! A pair that was never marked reads as absent (`false`).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{is_blank, ClassId, Phone};

pub const CLASS_REQUIRED: &str = "Class is required";
pub const STUDENT_PHONE_REQUIRED: &str = "Student phone is required";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceKey {
    pub class_id: ClassId,
    pub student_phone: Phone,
}

impl AttendanceKey {
    pub fn new(class_id: impl Into<ClassId>, student_phone: impl Into<Phone>) -> Self {
        Self {
            class_id: class_id.into(),
            student_phone: student_phone.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if is_blank(&self.class_id) {
            return Err(CoreError::Validation(CLASS_REQUIRED.to_string()));
        }
        if is_blank(&self.student_phone) {
            return Err(CoreError::Validation(STUDENT_PHONE_REQUIRED.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_parts_are_required() {
        assert!(AttendanceKey::new("class-1", "555").validate().is_ok());
        assert!(AttendanceKey::new("", "555").validate().is_err());
        assert!(AttendanceKey::new("class-1", " ").validate().is_err());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(AttendanceKey::new("class-1", "555")).unwrap();
        assert_eq!(json["classId"], "class-1");
        assert_eq!(json["studentPhone"], "555");
    }
}
