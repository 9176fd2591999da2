//! Profile completion and profile editing.

use iems_core::profile::{Profile, ProfileDraft};
use iems_core::routes::Route;

use crate::cache::QueryState;
use crate::error::SyncError;
use crate::session::Session;
use crate::undo::UndoOffer;

impl Session {
    /// Create the caller's profile from the completion form.
    ///
    /// Role and phone come from the login intent. Without an intent there
    /// is nothing to complete, and the user is sent back to role
    /// selection. On success returns the dashboard for the chosen role.
    pub async fn complete_profile(&self, draft: ProfileDraft) -> Result<Route, SyncError> {
        self.require_identity().await?;
        let Some(intent) = self.login_intent().await else {
            tracing::info!("No login intent, returning to role selection");
            return Ok(Route::RoleSelection);
        };

        let profile = draft.into_new_profile(intent.role.clone(), &intent.phone)?;
        self.client().save_caller_user_profile(profile).await?;
        tracing::info!(role = %intent.role, "Profile completed");
        Ok(Route::dashboard_for(&intent.role))
    }

    /// The caller's profile, which must exist.
    pub async fn current_profile(&self) -> Result<Profile, SyncError> {
        self.require_identity().await?;
        match self.client().caller_profile().await {
            QueryState::Ready(Some(profile)) => Ok(profile),
            QueryState::Ready(None) => Err(SyncError::ProfileMissing),
            QueryState::Failed(message) => Err(SyncError::RemoteOperationFailed(message)),
            QueryState::Disabled | QueryState::Loading => Err(SyncError::TransportUnavailable),
        }
    }

    /// Apply edited name and address to the caller's profile. Role and
    /// phone are kept.
    pub async fn edit_profile(&self, draft: ProfileDraft) -> Result<UndoOffer, SyncError> {
        let current = self.current_profile().await?;
        let updated = draft.apply_to(&current)?;
        self.client().update_profile(updated).await
    }
}
