//! In-process remote data service.
//!
//! [`InMemoryRemote`] honors the same contract as the real service:
//! caller-keyed profiles, single-step undo per key, add-replaces homework,
//! and an append-only message list. It also counts calls and can be told
//! to fail or stall upcoming calls, which the sync layer's tests rely on.
//!
//! Clones share state. Use [`InMemoryRemote::as_caller`] to get a handle
//! that acts on behalf of a particular principal.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use iems_core::attendance::AttendanceKey;
use iems_core::fee::Fee;
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_core::profile::Profile;
use iems_core::roles::UserRole;
use iems_core::types::{ClassId, Phone};

use crate::error::{RemoteError, RemoteResult};
use crate::operation::Operation;
use crate::port::RemoteDataPort;

pub const ERR_UNAUTHORIZED: &str = "Unauthorized: caller is anonymous";
pub const ERR_NOTHING_TO_UNDO: &str = "Nothing to undo";
pub const ERR_PROFILE_NOT_FOUND: &str = "Profile not found";
pub const ERR_PROFILE_EXISTS: &str = "Profile already exists";

// ---------------------------------------------------------------------------
// Versioned
// ---------------------------------------------------------------------------

/// A keyed map that remembers the value each key held before its most
/// recent change. Undo restores that value once; a second undo without an
/// intervening change is rejected.
struct Versioned<K, V> {
    current: HashMap<K, V>,
    previous: HashMap<K, Option<V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Versioned<K, V> {
    fn new() -> Self {
        Self {
            current: HashMap::new(),
            previous: HashMap::new(),
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.current.get(key)
    }

    fn set(&mut self, key: K, value: V) {
        let before = self.current.insert(key.clone(), value);
        self.previous.insert(key, before);
    }

    fn remove(&mut self, key: &K) {
        let before = self.current.remove(key);
        self.previous.insert(key.clone(), before);
    }

    fn undo(&mut self, key: &K) -> RemoteResult<()> {
        let before = self
            .previous
            .remove(key)
            .ok_or_else(|| RemoteError::Operation(ERR_NOTHING_TO_UNDO.to_string()))?;
        match before {
            Some(value) => {
                self.current.insert(key.clone(), value);
            }
            None => {
                self.current.remove(key);
            }
        }
        Ok(())
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.current.values()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct State {
    profiles: Versioned<Phone, Profile>,
    /// Which profile each principal owns.
    caller_phones: HashMap<String, Phone>,
    attendance: Versioned<AttendanceKey, bool>,
    homework: Versioned<ClassId, HomeworkEntry>,
    fees: Versioned<Phone, Fee>,
    messages: Vec<Message>,
    user_roles: HashMap<String, UserRole>,
    form_teachers: HashMap<ClassId, Phone>,
    class_teachers: HashMap<Phone, Vec<ClassId>>,
    calls: HashMap<Operation, usize>,
    failures: HashMap<Operation, VecDeque<String>>,
    delays: HashMap<Operation, VecDeque<Duration>>,
}

impl State {
    fn new() -> Self {
        Self {
            profiles: Versioned::new(),
            caller_phones: HashMap::new(),
            attendance: Versioned::new(),
            homework: Versioned::new(),
            fees: Versioned::new(),
            messages: Vec::new(),
            user_roles: HashMap::new(),
            form_teachers: HashMap::new(),
            class_teachers: HashMap::new(),
            calls: HashMap::new(),
            failures: HashMap::new(),
            delays: HashMap::new(),
        }
    }
}

/// Injected behavior for one call, taken when the call starts.
struct Pending {
    delay: Option<Duration>,
    failure: Option<String>,
}

impl Pending {
    /// Wait out any injected delay, then report any injected failure.
    async fn settle(self) -> RemoteResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure {
            Some(message) => Err(RemoteError::Operation(message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// InMemoryRemote
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct InMemoryRemote {
    state: Arc<Mutex<State>>,
    caller: Option<String>,
}

impl InMemoryRemote {
    /// A fresh, empty service with an anonymous caller.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new())),
            caller: None,
        }
    }

    /// A handle on the same service acting as `principal`.
    pub fn as_caller(&self, principal: impl Into<String>) -> Self {
        Self {
            state: Arc::clone(&self.state),
            caller: Some(principal.into()),
        }
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// How many times `op` has been invoked, including failed calls.
    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Make the next call of `op` fail with `message`.
    /// Repeated calls queue up further failures.
    pub fn fail_next(&self, op: Operation, message: impl Into<String>) {
        self.lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(message.into());
    }

    /// Make the next call of `op` take `delay` before replying. Reads
    /// capture their value before the delay, so a stalled read returns
    /// data as it was when the call started.
    pub fn delay_next(&self, op: Operation, delay: Duration) {
        self.lock().delays.entry(op).or_default().push_back(delay);
    }

    /// Seed a profile directly, owned by `principal`.
    pub fn seed_profile(&self, principal: impl Into<String>, profile: Profile) {
        let mut state = self.lock();
        state
            .caller_phones
            .insert(principal.into(), profile.phone.clone());
        state.profiles.current.insert(profile.phone.clone(), profile);
    }

    pub fn set_user_role(&self, principal: impl Into<String>, role: UserRole) {
        self.lock().user_roles.insert(principal.into(), role);
    }

    pub fn form_teacher(&self, class_id: &str) -> Option<Phone> {
        self.lock().form_teachers.get(class_id).cloned()
    }

    pub fn classes_of(&self, teacher_phone: &str) -> Vec<ClassId> {
        self.lock()
            .class_teachers
            .get(teacher_phone)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and take any injected behavior for it.
    fn begin(&self, op: Operation) -> Pending {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        let delay = state.delays.get_mut(&op).and_then(VecDeque::pop_front);
        let failure = state.failures.get_mut(&op).and_then(VecDeque::pop_front);
        Pending { delay, failure }
    }

    fn require_caller(&self) -> RemoteResult<&str> {
        self.caller
            .as_deref()
            .ok_or_else(|| RemoteError::Operation(ERR_UNAUTHORIZED.to_string()))
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteDataPort for InMemoryRemote {
    async fn get_caller_user_profile(&self) -> RemoteResult<Option<Profile>> {
        let pending = self.begin(Operation::GetCallerUserProfile);
        let value = match self.require_caller() {
            Ok(caller) => {
                let state = self.lock();
                Ok(state
                    .caller_phones
                    .get(caller)
                    .and_then(|phone| state.profiles.get(phone))
                    .cloned())
            }
            Err(e) => Err(e),
        };
        pending.settle().await?;
        value
    }

    async fn save_caller_user_profile(&self, profile: &Profile) -> RemoteResult<()> {
        self.begin(Operation::SaveCallerUserProfile).settle().await?;
        let caller = self.require_caller()?.to_string();
        let mut state = self.lock();
        if let Some(owner_phone) = state.caller_phones.get(&caller) {
            if owner_phone != &profile.phone {
                return Err(RemoteError::Operation(ERR_PROFILE_EXISTS.to_string()));
            }
        }
        state.caller_phones.insert(caller, profile.phone.clone());
        state.profiles.set(profile.phone.clone(), profile.clone());
        Ok(())
    }

    async fn update_profile(&self, profile: &Profile) -> RemoteResult<()> {
        self.begin(Operation::UpdateProfile).settle().await?;
        self.require_caller()?;
        let mut state = self.lock();
        if state.profiles.get(&profile.phone).is_none() {
            return Err(RemoteError::Operation(ERR_PROFILE_NOT_FOUND.to_string()));
        }
        state.profiles.set(profile.phone.clone(), profile.clone());
        Ok(())
    }

    async fn undo_profile(&self, phone: &str) -> RemoteResult<()> {
        self.begin(Operation::UndoProfile).settle().await?;
        self.lock().profiles.undo(&phone.to_string())
    }

    async fn get_profile(&self, phone: &str) -> RemoteResult<Option<Profile>> {
        let pending = self.begin(Operation::GetProfile);
        let value = self.lock().profiles.get(&phone.to_string()).cloned();
        pending.settle().await?;
        Ok(value)
    }

    async fn get_user_profile(&self, phone: &str) -> RemoteResult<Option<Profile>> {
        let pending = self.begin(Operation::GetUserProfile);
        let value = self.lock().profiles.get(&phone.to_string()).cloned();
        pending.settle().await?;
        Ok(value)
    }

    async fn get_all_profiles(&self) -> RemoteResult<Vec<Profile>> {
        let pending = self.begin(Operation::GetAllProfiles);
        let mut value: Vec<Profile> = self.lock().profiles.values().cloned().collect();
        value.sort_by(|a, b| a.phone.cmp(&b.phone));
        pending.settle().await?;
        Ok(value)
    }

    async fn get_attendance(&self, class_id: &str, student_phone: &str) -> RemoteResult<bool> {
        let pending = self.begin(Operation::GetAttendance);
        let key = AttendanceKey::new(class_id, student_phone);
        let value = self.lock().attendance.get(&key).copied().unwrap_or(false);
        pending.settle().await?;
        Ok(value)
    }

    async fn mark_attendance(
        &self,
        class_id: &str,
        student_phone: &str,
        present: bool,
    ) -> RemoteResult<()> {
        self.begin(Operation::MarkAttendance).settle().await?;
        let key = AttendanceKey::new(class_id, student_phone);
        self.lock().attendance.set(key, present);
        Ok(())
    }

    async fn undo_attendance(&self, class_id: &str, student_phone: &str) -> RemoteResult<()> {
        self.begin(Operation::UndoAttendance).settle().await?;
        let key = AttendanceKey::new(class_id, student_phone);
        self.lock().attendance.undo(&key)
    }

    async fn get_homework(&self, class_id: &str) -> RemoteResult<Option<HomeworkEntry>> {
        let pending = self.begin(Operation::GetHomework);
        let value = self.lock().homework.get(&class_id.to_string()).cloned();
        pending.settle().await?;
        Ok(value)
    }

    async fn add_homework(&self, class_id: &str, entry: &HomeworkEntry) -> RemoteResult<()> {
        self.begin(Operation::AddHomework).settle().await?;
        self.lock()
            .homework
            .set(class_id.to_string(), entry.clone());
        Ok(())
    }

    async fn delete_homework(&self, class_id: &str) -> RemoteResult<()> {
        self.begin(Operation::DeleteHomework).settle().await?;
        self.lock().homework.remove(&class_id.to_string());
        Ok(())
    }

    async fn undo_homework(&self, class_id: &str) -> RemoteResult<()> {
        self.begin(Operation::UndoHomework).settle().await?;
        self.lock().homework.undo(&class_id.to_string())
    }

    async fn get_fees(&self, phone: &str) -> RemoteResult<Option<Fee>> {
        let pending = self.begin(Operation::GetFees);
        let value = self.lock().fees.get(&phone.to_string()).cloned();
        pending.settle().await?;
        Ok(value)
    }

    async fn update_fee(&self, phone: &str, fee: &Fee) -> RemoteResult<()> {
        self.begin(Operation::UpdateFee).settle().await?;
        self.lock().fees.set(phone.to_string(), fee.clone());
        Ok(())
    }

    async fn undo_fee(&self, phone: &str) -> RemoteResult<()> {
        self.begin(Operation::UndoFee).settle().await?;
        self.lock().fees.undo(&phone.to_string())
    }

    async fn get_messages(&self) -> RemoteResult<Vec<Message>> {
        let pending = self.begin(Operation::GetMessages);
        let value = self.lock().messages.clone();
        pending.settle().await?;
        Ok(value)
    }

    async fn send_message(&self, message: &Message) -> RemoteResult<()> {
        self.begin(Operation::SendMessage).settle().await?;
        self.lock().messages.push(message.clone());
        Ok(())
    }

    async fn get_caller_user_role(&self) -> RemoteResult<UserRole> {
        let pending = self.begin(Operation::GetCallerUserRole);
        let value = match &self.caller {
            Some(caller) => self
                .lock()
                .user_roles
                .get(caller)
                .copied()
                .unwrap_or(UserRole::User),
            None => UserRole::Guest,
        };
        pending.settle().await?;
        Ok(value)
    }

    async fn is_caller_admin(&self) -> RemoteResult<bool> {
        let pending = self.begin(Operation::IsCallerAdmin);
        let value = match &self.caller {
            Some(caller) => self.lock().user_roles.get(caller) == Some(&UserRole::Admin),
            None => false,
        };
        pending.settle().await?;
        Ok(value)
    }

    async fn assign_caller_user_role(&self, user: &str, role: UserRole) -> RemoteResult<()> {
        self.begin(Operation::AssignCallerUserRole).settle().await?;
        let caller = self.require_caller()?.to_string();
        let mut state = self.lock();
        if state.user_roles.get(&caller) != Some(&UserRole::Admin) {
            return Err(RemoteError::Operation(
                "Unauthorized: only admins can assign roles".to_string(),
            ));
        }
        state.user_roles.insert(user.to_string(), role);
        Ok(())
    }

    async fn assign_form_teacher(&self, class_id: &str, teacher_phone: &str) -> RemoteResult<()> {
        self.begin(Operation::AssignFormTeacher).settle().await?;
        self.lock()
            .form_teachers
            .insert(class_id.to_string(), teacher_phone.to_string());
        Ok(())
    }

    async fn assign_teacher_to_class(
        &self,
        teacher_phone: &str,
        class_id: &str,
    ) -> RemoteResult<()> {
        self.begin(Operation::AssignTeacherToClass).settle().await?;
        let mut state = self.lock();
        let classes = state
            .class_teachers
            .entry(teacher_phone.to_string())
            .or_default();
        if !classes.iter().any(|c| c == class_id) {
            classes.push(class_id.to_string());
        }
        Ok(())
    }
}
