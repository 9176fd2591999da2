//! Typed writes.
//!
//! Each successful write invalidates the cache family of the record it
//! touched. Writes that the service can revert return an [`UndoOffer`].
//! Presence checks run before anything is sent.

use iems_core::attendance::{AttendanceKey, CLASS_REQUIRED};
use iems_core::fee::Fee;
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_core::profile::{Profile, PHONE_REQUIRED};
use iems_core::roles::UserRole;
use iems_core::types::is_blank;

use crate::client::QueryClient;
use crate::error::SyncError;
use crate::key::Entity;
use crate::undo::{UndoOffer, UndoTarget};

const TEACHER_REQUIRED: &str = "Teacher phone is required";

fn require(value: &str, message: &str) -> Result<(), SyncError> {
    if is_blank(value) {
        return Err(SyncError::Validation(message.to_string()));
    }
    Ok(())
}

impl QueryClient {
    // ---- profiles ----

    /// First-time profile creation for the signed-in caller. Not undoable.
    pub async fn save_caller_user_profile(&self, profile: Profile) -> Result<(), SyncError> {
        require(&profile.phone, PHONE_REQUIRED)?;
        self.mutate("saveCallerUserProfile", Entity::Profile, |port| async move {
            port.save_caller_user_profile(&profile).await
        })
        .await
    }

    pub async fn update_profile(&self, profile: Profile) -> Result<UndoOffer, SyncError> {
        require(&profile.phone, PHONE_REQUIRED)?;
        let target = UndoTarget::Profile {
            phone: profile.phone.clone(),
        };
        self.mutate_undoable("updateProfile", target, |port| async move {
            port.update_profile(&profile).await
        })
        .await
    }

    pub async fn undo_profile(&self, phone: &str) -> Result<(), SyncError> {
        require(phone, PHONE_REQUIRED)?;
        self.undo_target(
            "undoProfile",
            UndoTarget::Profile {
                phone: phone.to_string(),
            },
        )
        .await
    }

    // ---- attendance ----

    pub async fn mark_attendance(
        &self,
        key: AttendanceKey,
        present: bool,
    ) -> Result<UndoOffer, SyncError> {
        key.validate()?;
        let target = UndoTarget::Attendance(key.clone());
        self.mutate_undoable("markAttendance", target, |port| async move {
            port.mark_attendance(&key.class_id, &key.student_phone, present)
                .await
        })
        .await
    }

    pub async fn undo_attendance(&self, key: AttendanceKey) -> Result<(), SyncError> {
        key.validate()?;
        self.undo_target("undoAttendance", UndoTarget::Attendance(key))
            .await
    }

    // ---- homework ----

    /// Post homework for a class, replacing any existing entry.
    pub async fn add_homework(
        &self,
        class_id: &str,
        entry: HomeworkEntry,
    ) -> Result<UndoOffer, SyncError> {
        require(class_id, CLASS_REQUIRED)?;
        entry.validate()?;
        let class_id = class_id.to_string();
        let target = UndoTarget::Homework {
            class_id: class_id.clone(),
        };
        self.mutate_undoable("addHomework", target, |port| async move {
            port.add_homework(&class_id, &entry).await
        })
        .await
    }

    pub async fn delete_homework(&self, class_id: &str) -> Result<UndoOffer, SyncError> {
        require(class_id, CLASS_REQUIRED)?;
        let class_id = class_id.to_string();
        let target = UndoTarget::Homework {
            class_id: class_id.clone(),
        };
        self.mutate_undoable("deleteHomework", target, |port| async move {
            port.delete_homework(&class_id).await
        })
        .await
    }

    pub async fn undo_homework(&self, class_id: &str) -> Result<(), SyncError> {
        require(class_id, CLASS_REQUIRED)?;
        self.undo_target(
            "undoHomework",
            UndoTarget::Homework {
                class_id: class_id.to_string(),
            },
        )
        .await
    }

    // ---- fees ----

    pub async fn update_fee(&self, phone: &str, fee: Fee) -> Result<UndoOffer, SyncError> {
        require(phone, PHONE_REQUIRED)?;
        let phone = phone.to_string();
        let target = UndoTarget::Fee {
            phone: phone.clone(),
        };
        self.mutate_undoable("updateFee", target, |port| async move {
            port.update_fee(&phone, &fee).await
        })
        .await
    }

    pub async fn undo_fee(&self, phone: &str) -> Result<(), SyncError> {
        require(phone, PHONE_REQUIRED)?;
        self.undo_target(
            "undoFee",
            UndoTarget::Fee {
                phone: phone.to_string(),
            },
        )
        .await
    }

    // ---- messages ----

    /// Append a message. Messages have no undo.
    pub async fn send_message(&self, message: Message) -> Result<(), SyncError> {
        message.validate()?;
        self.mutate("sendMessage", Entity::Message, |port| async move {
            port.send_message(&message).await
        })
        .await
    }

    // ---- access control and class assignment ----
    //
    // These touch no cached family.

    pub async fn assign_caller_user_role(
        &self,
        user: &str,
        role: UserRole,
    ) -> Result<(), SyncError> {
        let port = self.require_port().await?;
        port.assign_caller_user_role(user, role).await?;
        tracing::info!(user, "Assigned user role");
        Ok(())
    }

    pub async fn assign_form_teacher(
        &self,
        class_id: &str,
        teacher_phone: &str,
    ) -> Result<(), SyncError> {
        require(class_id, CLASS_REQUIRED)?;
        require(teacher_phone, TEACHER_REQUIRED)?;
        let port = self.require_port().await?;
        port.assign_form_teacher(class_id, teacher_phone).await?;
        tracing::info!(class_id, teacher_phone, "Assigned form teacher");
        Ok(())
    }

    pub async fn assign_teacher_to_class(
        &self,
        teacher_phone: &str,
        class_id: &str,
    ) -> Result<(), SyncError> {
        require(class_id, CLASS_REQUIRED)?;
        require(teacher_phone, TEACHER_REQUIRED)?;
        let port = self.require_port().await?;
        port.assign_teacher_to_class(teacher_phone, class_id)
            .await?;
        tracing::info!(class_id, teacher_phone, "Assigned teacher to class");
        Ok(())
    }
}
