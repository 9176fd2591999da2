//! The remote data port.

use async_trait::async_trait;
use iems_core::fee::Fee;
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_core::profile::Profile;
use iems_core::roles::UserRole;

use crate::error::RemoteResult;

/// Contract with the remote data service.
///
/// Every call may fail with a [`RemoteError`](crate::RemoteError) whose
/// message is shown to the user as-is. Only the `get_*` family and the
/// `undo_*` family may be repeated safely. What an undo does when there is
/// no recorded change is up to the service.
#[async_trait]
pub trait RemoteDataPort: Send + Sync {
    // --- profiles ---

    /// The caller's own profile, or `None` before profile completion.
    async fn get_caller_user_profile(&self) -> RemoteResult<Option<Profile>>;
    /// First-time profile creation for the caller.
    async fn save_caller_user_profile(&self, profile: &Profile) -> RemoteResult<()>;
    async fn update_profile(&self, profile: &Profile) -> RemoteResult<()>;
    async fn undo_profile(&self, phone: &str) -> RemoteResult<()>;
    async fn get_profile(&self, phone: &str) -> RemoteResult<Option<Profile>>;
    async fn get_user_profile(&self, phone: &str) -> RemoteResult<Option<Profile>>;
    /// Every profile. Chairperson view.
    async fn get_all_profiles(&self) -> RemoteResult<Vec<Profile>>;

    // --- attendance ---

    async fn get_attendance(&self, class_id: &str, student_phone: &str) -> RemoteResult<bool>;
    async fn mark_attendance(
        &self,
        class_id: &str,
        student_phone: &str,
        present: bool,
    ) -> RemoteResult<()>;
    async fn undo_attendance(&self, class_id: &str, student_phone: &str) -> RemoteResult<()>;

    // --- homework ---

    async fn get_homework(&self, class_id: &str) -> RemoteResult<Option<HomeworkEntry>>;
    /// Replaces any existing entry for the class.
    async fn add_homework(&self, class_id: &str, entry: &HomeworkEntry) -> RemoteResult<()>;
    async fn delete_homework(&self, class_id: &str) -> RemoteResult<()>;
    async fn undo_homework(&self, class_id: &str) -> RemoteResult<()>;

    // --- fees ---

    async fn get_fees(&self, phone: &str) -> RemoteResult<Option<Fee>>;
    async fn update_fee(&self, phone: &str, fee: &Fee) -> RemoteResult<()>;
    async fn undo_fee(&self, phone: &str) -> RemoteResult<()>;

    // --- messages ---

    async fn get_messages(&self) -> RemoteResult<Vec<Message>>;
    /// Appends to the message list.
    async fn send_message(&self, message: &Message) -> RemoteResult<()>;

    // --- access control and class assignment ---

    async fn get_caller_user_role(&self) -> RemoteResult<UserRole>;
    async fn is_caller_admin(&self) -> RemoteResult<bool>;
    /// `user` is the service-side principal text of the target user.
    async fn assign_caller_user_role(&self, user: &str, role: UserRole) -> RemoteResult<()>;
    async fn assign_form_teacher(&self, class_id: &str, teacher_phone: &str) -> RemoteResult<()>;
    async fn assign_teacher_to_class(&self, teacher_phone: &str, class_id: &str)
        -> RemoteResult<()>;
}
