//! Names of the remote operations.

use std::fmt;

/// Every operation exposed by the remote data service.
///
/// [`Operation::as_str`] is the wire name used in RPC paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetCallerUserProfile,
    SaveCallerUserProfile,
    UpdateProfile,
    UndoProfile,
    GetProfile,
    GetUserProfile,
    GetAllProfiles,
    GetAttendance,
    MarkAttendance,
    UndoAttendance,
    GetHomework,
    AddHomework,
    DeleteHomework,
    UndoHomework,
    GetFees,
    UpdateFee,
    UndoFee,
    GetMessages,
    SendMessage,
    GetCallerUserRole,
    IsCallerAdmin,
    AssignCallerUserRole,
    AssignFormTeacher,
    AssignTeacherToClass,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetCallerUserProfile => "getCallerUserProfile",
            Self::SaveCallerUserProfile => "saveCallerUserProfile",
            Self::UpdateProfile => "updateProfile",
            Self::UndoProfile => "undoProfile",
            Self::GetProfile => "getProfile",
            Self::GetUserProfile => "getUserProfile",
            Self::GetAllProfiles => "getAllProfiles",
            Self::GetAttendance => "getAttendance",
            Self::MarkAttendance => "markAttendance",
            Self::UndoAttendance => "undoAttendance",
            Self::GetHomework => "getHomework",
            Self::AddHomework => "addHomework",
            Self::DeleteHomework => "deleteHomework",
            Self::UndoHomework => "undoHomework",
            Self::GetFees => "getFees",
            Self::UpdateFee => "updateFee",
            Self::UndoFee => "undoFee",
            Self::GetMessages => "getMessages",
            Self::SendMessage => "sendMessage",
            Self::GetCallerUserRole => "getCallerUserRole",
            Self::IsCallerAdmin => "isCallerAdmin",
            Self::AssignCallerUserRole => "assignCallerUserRole",
            Self::AssignFormTeacher => "assignFormTeacher",
            Self::AssignTeacherToClass => "assignTeacherToClass",
        }
    }

    /// Reads are safe to repeat.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::GetCallerUserProfile
                | Self::GetProfile
                | Self::GetUserProfile
                | Self::GetAllProfiles
                | Self::GetAttendance
                | Self::GetHomework
                | Self::GetFees
                | Self::GetMessages
                | Self::GetCallerUserRole
                | Self::IsCallerAdmin
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
