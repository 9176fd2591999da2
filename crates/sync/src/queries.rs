//! Typed reads.
//!
//! | Query               | Family     | Polls every             | Retries | Failure   |
//! |---------------------|------------|-------------------------|---------|-----------|
//! | caller profile      | profile    | never                   | none    | kept      |
//! | all profiles        | profile    | never                   | config  | refetched |
//! | attendance          | attendance | never                   | config  | refetched |
//! | homework            | homework   | `homework_poll` (10 s)  | config  | refetched |
//! | fees                | fee        | `fee_poll` (15 s)       | config  | refetched |
//! | messages            | message    | `message_poll` (10 s)   | config  | refetched |
//!
//! A kept failure is served from the cache by [`QueryClient::fetch`]; a
//! refetched one makes the next `fetch` call the service again.

use iems_core::fee::Fee;
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_core::profile::Profile;
use iems_core::roles::UserRole;

use crate::cache::QueryState;
use crate::client::QueryClient;
use crate::error::SyncError;
use crate::key::{
    Entity, QueryKey, KEY_ALL_PROFILES, KEY_ATTENDANCE, KEY_CALLER_PROFILE, KEY_FEES,
    KEY_HOMEWORK, KEY_MESSAGES,
};
use crate::query::{Query, QueryPolicy};

impl QueryClient {
    fn read_policy(&self) -> QueryPolicy {
        QueryPolicy::once().with_retries(self.config().read_retries)
    }

    // ---- descriptors ----

    /// The signed-in caller's own profile. Drives the auth gate, so a
    /// failure is reported at once and kept until the next login or an
    /// explicit refetch.
    pub fn caller_profile_query(&self) -> Query<Option<Profile>> {
        Query::new(
            QueryKey::new(Entity::Profile, KEY_CALLER_PROFILE, Vec::new()),
            QueryPolicy::once().keeping_failure(),
            |port| async move { port.get_caller_user_profile().await },
        )
    }

    pub fn all_profiles_query(&self) -> Query<Vec<Profile>> {
        Query::new(
            QueryKey::new(Entity::Profile, KEY_ALL_PROFILES, Vec::new()),
            self.read_policy(),
            |port| async move { port.get_all_profiles().await },
        )
    }

    pub fn attendance_query(&self, class_id: &str, student_phone: &str) -> Query<bool> {
        let key = QueryKey::new(
            Entity::Attendance,
            KEY_ATTENDANCE,
            vec![class_id.to_string(), student_phone.to_string()],
        );
        let (class_id, student_phone) = (class_id.to_string(), student_phone.to_string());
        Query::new(key, self.read_policy(), move |port| {
            let (class_id, student_phone) = (class_id.clone(), student_phone.clone());
            async move { port.get_attendance(&class_id, &student_phone).await }
        })
    }

    pub fn homework_query(&self, class_id: &str) -> Query<Option<HomeworkEntry>> {
        let key = QueryKey::new(Entity::Homework, KEY_HOMEWORK, vec![class_id.to_string()]);
        let class_id = class_id.to_string();
        Query::new(
            key,
            self.read_policy().polling(self.config().homework_poll),
            move |port| {
                let class_id = class_id.clone();
                async move { port.get_homework(&class_id).await }
            },
        )
    }

    pub fn fees_query(&self, phone: &str) -> Query<Option<Fee>> {
        let key = QueryKey::new(Entity::Fee, KEY_FEES, vec![phone.to_string()]);
        let phone = phone.to_string();
        Query::new(
            key,
            self.read_policy().polling(self.config().fee_poll),
            move |port| {
                let phone = phone.clone();
                async move { port.get_fees(&phone).await }
            },
        )
    }

    pub fn messages_query(&self) -> Query<Vec<Message>> {
        Query::new(
            QueryKey::new(Entity::Message, KEY_MESSAGES, Vec::new()),
            self.read_policy().polling(self.config().message_poll),
            |port| async move { port.get_messages().await },
        )
    }

    // ---- one-shot reads ----

    pub async fn caller_profile(&self) -> QueryState<Option<Profile>> {
        self.fetch(&self.caller_profile_query()).await
    }

    pub async fn all_profiles(&self) -> QueryState<Vec<Profile>> {
        self.fetch(&self.all_profiles_query()).await
    }

    pub async fn attendance(&self, class_id: &str, student_phone: &str) -> QueryState<bool> {
        self.fetch(&self.attendance_query(class_id, student_phone))
            .await
    }

    pub async fn homework(&self, class_id: &str) -> QueryState<Option<HomeworkEntry>> {
        self.fetch(&self.homework_query(class_id)).await
    }

    pub async fn fees(&self, phone: &str) -> QueryState<Option<Fee>> {
        self.fetch(&self.fees_query(phone)).await
    }

    pub async fn messages(&self) -> QueryState<Vec<Message>> {
        self.fetch(&self.messages_query()).await
    }

    // ---- uncached ----

    /// Access-control role of the caller. Not cached.
    pub async fn caller_role(&self) -> Result<UserRole, SyncError> {
        let port = self.require_port().await?;
        Ok(port.get_caller_user_role().await?)
    }

    pub async fn is_caller_admin(&self) -> Result<bool, SyncError> {
        let port = self.require_port().await?;
        Ok(port.is_caller_admin().await?)
    }

    /// Look up any user's profile by phone. Not cached.
    pub async fn profile_by_phone(&self, phone: &str) -> Result<Option<Profile>, SyncError> {
        let port = self.require_port().await?;
        Ok(port.get_user_profile(phone).await?)
    }
}
