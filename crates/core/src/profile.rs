//! User profiles and the profile form.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{is_blank, Phone};

pub const NAME_REQUIRED: &str = "Name is required";
pub const ADDRESS_REQUIRED: &str = "Address is required";
pub const PHONE_REQUIRED: &str = "Phone number is required";

/// A user profile as stored by the remote service. Keyed by `phone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub role: Role,
    pub address: String,
    pub phone: Phone,
}

/// Editable fields collected by the profile completion and profile views.
///
/// Role and phone are never edited here: on completion they come from the
/// login intent, on update they are carried over from the loaded profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDraft {
    pub name: String,
    pub address: String,
}

impl ProfileDraft {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Presence checks, reported one at a time in form order.
    pub fn validate(&self) -> Result<(), CoreError> {
        if is_blank(&self.name) {
            return Err(CoreError::Validation(NAME_REQUIRED.to_string()));
        }
        if is_blank(&self.address) {
            return Err(CoreError::Validation(ADDRESS_REQUIRED.to_string()));
        }
        Ok(())
    }

    /// Build a first-time profile for the given role and phone.
    pub fn into_new_profile(self, role: Role, phone: &str) -> Result<Profile, CoreError> {
        if is_blank(phone) {
            return Err(CoreError::Validation(PHONE_REQUIRED.to_string()));
        }
        self.validate()?;
        Ok(Profile {
            name: self.name.trim().to_string(),
            role,
            address: self.address.trim().to_string(),
            phone: phone.trim().to_string(),
        })
    }

    /// Apply the edited fields on top of `current`.
    pub fn apply_to(self, current: &Profile) -> Result<Profile, CoreError> {
        self.validate()?;
        Ok(Profile {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            ..current.clone()
        })
    }
}

impl From<&Profile> for ProfileDraft {
    fn from(profile: &Profile) -> Self {
        Self::new(profile.name.clone(), profile.address.clone())
    }
}
