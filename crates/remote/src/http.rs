//! JSON-over-HTTP adapter for the remote data service.
//!
//! Every operation is a `POST {base_url}/rpc/{operationName}` whose body is
//! a JSON object of named arguments. A 2xx reply carries the JSON value
//! (`null` for unit and absent results). Any other status carries
//! `{"error": "<message>"}`, and that message is surfaced verbatim.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use iems_core::fee::Fee;
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_core::profile::Profile;
use iems_core::roles::UserRole;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::{RemoteError, RemoteResult};
use crate::operation::Operation;
use crate::port::RemoteDataPort;

/// Header carrying a per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Error body returned by the service on non-2xx replies.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for one remote data service.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    /// Bearer token of the signed-in identity, if any.
    identity: Option<String>,
}

impl HttpRemote {
    /// Create a client with its own connection pool and request timeout.
    ///
    /// * `base_url` - e.g. `http://localhost:4943`. A trailing `/` is ignored.
    pub fn new(
        base_url: impl Into<String>,
        identity: Option<String>,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, identity))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        identity: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            identity,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        op: Operation,
        args: serde_json::Value,
    ) -> RemoteResult<T> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();

        let mut request = self
            .client
            .post(format!("{}/rpc/{}", self.base_url, op.as_str()))
            .header(REQUEST_ID_HEADER, &request_id)
            .json(&args);
        if let Some(token) = &self.identity {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(operation = %op, %request_id, error = %e, "Remote call failed to send");
            RemoteError::from(e)
        })?;

        let status = response.status();
        tracing::debug!(
            operation = %op,
            %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Remote call completed",
        );

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RemoteError::Transport(format!("Malformed {op} reply: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Operation(error_message(op, status, &body)))
    }
}

/// Pull the user-facing message out of a failed reply.
fn error_message(op: Operation, status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("{op} failed with status {}", status.as_u16()),
    }
}

#[async_trait]
impl RemoteDataPort for HttpRemote {
    async fn get_caller_user_profile(&self) -> RemoteResult<Option<Profile>> {
        self.call(Operation::GetCallerUserProfile, json!({})).await
    }

    async fn save_caller_user_profile(&self, profile: &Profile) -> RemoteResult<()> {
        self.call(Operation::SaveCallerUserProfile, json!({ "profile": profile }))
            .await
    }

    async fn update_profile(&self, profile: &Profile) -> RemoteResult<()> {
        self.call(Operation::UpdateProfile, json!({ "profile": profile }))
            .await
    }

    async fn undo_profile(&self, phone: &str) -> RemoteResult<()> {
        self.call(Operation::UndoProfile, json!({ "phone": phone }))
            .await
    }

    async fn get_profile(&self, phone: &str) -> RemoteResult<Option<Profile>> {
        self.call(Operation::GetProfile, json!({ "phone": phone }))
            .await
    }

    async fn get_user_profile(&self, phone: &str) -> RemoteResult<Option<Profile>> {
        self.call(Operation::GetUserProfile, json!({ "phone": phone }))
            .await
    }

    async fn get_all_profiles(&self) -> RemoteResult<Vec<Profile>> {
        self.call(Operation::GetAllProfiles, json!({})).await
    }

    async fn get_attendance(&self, class_id: &str, student_phone: &str) -> RemoteResult<bool> {
        self.call(
            Operation::GetAttendance,
            json!({ "classId": class_id, "studentPhone": student_phone }),
        )
        .await
    }

    async fn mark_attendance(
        &self,
        class_id: &str,
        student_phone: &str,
        present: bool,
    ) -> RemoteResult<()> {
        self.call(
            Operation::MarkAttendance,
            json!({ "classId": class_id, "studentPhone": student_phone, "present": present }),
        )
        .await
    }

    async fn undo_attendance(&self, class_id: &str, student_phone: &str) -> RemoteResult<()> {
        self.call(
            Operation::UndoAttendance,
            json!({ "classId": class_id, "studentPhone": student_phone }),
        )
        .await
    }

    async fn get_homework(&self, class_id: &str) -> RemoteResult<Option<HomeworkEntry>> {
        self.call(Operation::GetHomework, json!({ "classId": class_id }))
            .await
    }

    async fn add_homework(&self, class_id: &str, entry: &HomeworkEntry) -> RemoteResult<()> {
        self.call(
            Operation::AddHomework,
            json!({ "classId": class_id, "entry": entry }),
        )
        .await
    }

    async fn delete_homework(&self, class_id: &str) -> RemoteResult<()> {
        self.call(Operation::DeleteHomework, json!({ "classId": class_id }))
            .await
    }

    async fn undo_homework(&self, class_id: &str) -> RemoteResult<()> {
        self.call(Operation::UndoHomework, json!({ "classId": class_id }))
            .await
    }

    async fn get_fees(&self, phone: &str) -> RemoteResult<Option<Fee>> {
        self.call(Operation::GetFees, json!({ "phone": phone })).await
    }

    async fn update_fee(&self, phone: &str, fee: &Fee) -> RemoteResult<()> {
        self.call(Operation::UpdateFee, json!({ "phone": phone, "fee": fee }))
            .await
    }

    async fn undo_fee(&self, phone: &str) -> RemoteResult<()> {
        self.call(Operation::UndoFee, json!({ "phone": phone })).await
    }

    async fn get_messages(&self) -> RemoteResult<Vec<Message>> {
        self.call(Operation::GetMessages, json!({})).await
    }

    async fn send_message(&self, message: &Message) -> RemoteResult<()> {
        self.call(Operation::SendMessage, json!({ "message": message }))
            .await
    }

    async fn get_caller_user_role(&self) -> RemoteResult<UserRole> {
        self.call(Operation::GetCallerUserRole, json!({})).await
    }

    async fn is_caller_admin(&self) -> RemoteResult<bool> {
        self.call(Operation::IsCallerAdmin, json!({})).await
    }

    async fn assign_caller_user_role(&self, user: &str, role: UserRole) -> RemoteResult<()> {
        self.call(
            Operation::AssignCallerUserRole,
            json!({ "user": user, "role": role }),
        )
        .await
    }

    async fn assign_form_teacher(&self, class_id: &str, teacher_phone: &str) -> RemoteResult<()> {
        self.call(
            Operation::AssignFormTeacher,
            json!({ "classId": class_id, "teacherPhone": teacher_phone }),
        )
        .await
    }

    async fn assign_teacher_to_class(
        &self,
        teacher_phone: &str,
        class_id: &str,
    ) -> RemoteResult<()> {
        self.call(
            Operation::AssignTeacherToClass,
            json!({ "teacherPhone": teacher_phone, "classId": class_id }),
        )
        .await
    }
}
