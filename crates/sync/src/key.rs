//! Cache keys and entity families.

use std::fmt;

use iems_core::types::is_blank;

/// Entity family a cached read belongs to. A successful write invalidates
/// every key of its family and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Profile,
    Attendance,
    Homework,
    Fee,
    Message,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Attendance => "attendance",
            Self::Homework => "homework",
            Self::Fee => "fee",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const KEY_CALLER_PROFILE: &str = "currentUserProfile";
pub const KEY_ALL_PROFILES: &str = "allProfiles";
pub const KEY_ATTENDANCE: &str = "attendance";
pub const KEY_HOMEWORK: &str = "homework";
pub const KEY_FEES: &str = "fees";
pub const KEY_MESSAGES: &str = "messages";

/// Identifies one cached read: a named query plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    entity: Entity,
    name: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new(entity: Entity, name: &'static str, params: Vec<String>) -> Self {
        Self {
            entity,
            name,
            params,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// A query with a blank parameter is disabled and never issues a call.
    pub fn is_complete(&self) -> bool {
        !self.params.iter().any(|p| is_blank(p))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_params() {
        let key = QueryKey::new(
            Entity::Attendance,
            KEY_ATTENDANCE,
            vec!["c1".into(), "555".into()],
        );
        assert_eq!(key.to_string(), "attendance:c1:555");
        assert_eq!(key.entity(), Entity::Attendance);
    }

    #[test]
    fn blank_param_makes_key_incomplete() {
        let key = QueryKey::new(Entity::Fee, KEY_FEES, vec!["  ".into()]);
        assert!(!key.is_complete());
        assert!(QueryKey::new(Entity::Message, KEY_MESSAGES, vec![]).is_complete());
    }
}
