//! List and detail controllers that sit between the client and a renderer.
//!
//! # Design
//! Controllers never perform I/O. A load is started with `begin_load`, which
//! hands out a `LoadTicket`; whoever runs the request later returns the result
//! with that ticket. Every new load and every confirmed write bumps a
//! generation counter, so a result
//! carrying an older ticket is discarded instead of overwriting newer state.
//! Writes reach the store only after the server confirmed them.

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::store::{EntityStore, StoreError};
use crate::types::{User, UserId};

pub const LIST_LOAD_FAILED: &str = "Failed to load users. Please try again later.";
pub const DETAIL_LOAD_FAILED: &str = "Failed to load user details. Please try again later.";
pub const DETAIL_NOT_FOUND: &str = "User not found";

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Proof that a load was started, keyed by what triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket<K> {
    generation: u64,
    key: K,
}

impl<K: Copy> LoadTicket<K> {
    pub fn key(&self) -> K {
        self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load or a dispose superseded the ticket; the result was dropped.
    Stale,
}

/// Monotonic counter behind `LoadTicket`.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn issue<K>(&mut self, key: K) -> LoadTicket<K> {
        self.current += 1;
        LoadTicket {
            generation: self.current,
            key,
        }
    }

    /// Invalidate every ticket issued so far.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }

    pub fn is_current<K>(&self, ticket: &LoadTicket<K>) -> bool {
        ticket.generation == self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message for the user (the toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn success(description: String) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".to_string(),
            description,
        }
    }

    fn error(description: String) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            description,
        }
    }
}

/// The user table: a store snapshot plus loading and error state.
#[derive(Debug, Default)]
pub struct ListView {
    store: EntityStore<User>,
    loading: bool,
    error: Option<String>,
    notices: Vec<Notice>,
    generation: Generation,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[User] {
        self.store.all()
    }

    pub fn store(&self) -> &EntityStore<User> {
        &self.store
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Take the notices raised since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn begin_load(&mut self) -> LoadTicket<()> {
        self.loading = true;
        self.generation.issue(())
    }

    /// Apply a list result. A failure keeps the previous snapshot.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket<()>,
        result: Result<Vec<User>, ApiError>,
    ) -> Result<LoadOutcome, ViewError> {
        if !self.generation.is_current(&ticket) {
            debug!("dropping superseded list result");
            return Ok(LoadOutcome::Stale);
        }
        self.loading = false;

        let outcome = result
            .map_err(ViewError::from)
            .and_then(|users| self.store.replace_all(users).map_err(ViewError::from));
        match outcome {
            Ok(()) => {
                self.error = None;
                Ok(LoadOutcome::Applied)
            }
            Err(err) => {
                warn!(error = %err, "loading users failed");
                self.error = Some(LIST_LOAD_FAILED.to_string());
                self.notices.push(Notice::error("Failed to load users".to_string()));
                Err(err)
            }
        }
    }

    /// Append a user the server just created. If a list load already
    /// brought the row in, the server's copy replaces it.
    pub fn apply_created(&mut self, result: Result<User, ApiError>) -> Result<User, ViewError> {
        let user = result.inspect_err(|err| self.write_failed("create", err))?;
        if self.store.contains(user.id) {
            self.store.replace(user.clone())?;
        } else {
            self.store.insert(user.clone())?;
        }
        self.supersede_loads();
        self.notices
            .push(Notice::success(format!("User {} has been created", user.name)));
        Ok(user)
    }

    /// Replace a user in place with the server's updated copy.
    pub fn apply_updated(&mut self, result: Result<User, ApiError>) -> Result<User, ViewError> {
        let user = result.inspect_err(|err| self.write_failed("update", err))?;
        self.store.replace(user.clone())?;
        self.supersede_loads();
        self.notices
            .push(Notice::success(format!("User {} has been updated", user.name)));
        Ok(user)
    }

    /// Drop a user once the server confirmed the delete.
    pub fn apply_deleted(&mut self, id: UserId, result: Result<(), ApiError>) -> Result<(), ViewError> {
        if let Err(err) = result {
            warn!(id, error = %err, "delete failed");
            self.notices.push(Notice::error("Failed to delete user".to_string()));
            return Err(err.into());
        }
        let description = match self.store.remove(id) {
            Some(user) => format!("User {} has been deleted", user.name),
            None => format!("User {id} has been deleted"),
        };
        self.supersede_loads();
        self.notices.push(Notice::success(description));
        Ok(())
    }

    /// A list fetched before a confirmed write must not overwrite it.
    fn supersede_loads(&mut self) {
        self.generation.invalidate();
        self.loading = false;
    }

    fn write_failed(&mut self, action: &str, err: &ApiError) {
        warn!(action, error = %err, "write rejected");
        let description = match err {
            ApiError::Validation { .. } => err.to_string(),
            _ => format!("Failed to {action} user"),
        };
        self.notices.push(Notice::error(description));
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    #[default]
    Idle,
    Loading {
        id: UserId,
    },
    Loaded(User),
    Failed {
        id: UserId,
        message: String,
    },
}

/// A single user's page. Navigating to another id supersedes the pending load.
#[derive(Debug, Default)]
pub struct DetailView {
    state: DetailState,
    generation: Generation,
    disposed: bool,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            DetailState::Loaded(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn begin_load(&mut self, id: UserId) -> LoadTicket<UserId> {
        let ticket = self.generation.issue(id);
        if !self.disposed {
            self.state = DetailState::Loading { id };
        }
        ticket
    }

    pub fn finish_load(&mut self, ticket: LoadTicket<UserId>, result: Result<User, ApiError>) -> LoadOutcome {
        if self.disposed || !self.generation.is_current(&ticket) {
            debug!(id = ticket.key, "dropping stale detail result");
            return LoadOutcome::Stale;
        }
        self.state = match result {
            Ok(user) => DetailState::Loaded(user),
            Err(ApiError::NotFound) => DetailState::Failed {
                id: ticket.key,
                message: DETAIL_NOT_FOUND.to_string(),
            },
            Err(err) => {
                warn!(id = ticket.key, error = %err, "loading user failed");
                DetailState::Failed {
                    id: ticket.key,
                    message: DETAIL_LOAD_FAILED.to_string(),
                }
            }
        };
        LoadOutcome::Applied
    }

    /// Tear the view down; any result still in flight will be discarded.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.generation.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            username: name.to_lowercase(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            website: None,
            address: None,
            company: None,
        }
    }

    fn loaded_list(users: Vec<User>) -> ListView {
        let mut view = ListView::new();
        let ticket = view.begin_load();
        view.finish_load(ticket, Ok(users)).unwrap();
        view.drain_notices();
        view
    }

    #[test]
    fn list_load_installs_snapshot() {
        let mut view = ListView::new();
        let ticket = view.begin_load();
        assert!(view.is_loading());

        let outcome = view.finish_load(ticket, Ok(vec![user(1, "Ann")])).unwrap();
        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(!view.is_loading());
        assert!(view.error().is_none());
        assert_eq!(view.users(), &[user(1, "Ann")]);
    }

    #[test]
    fn failed_reload_keeps_previous_users() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let ticket = view.begin_load();
        let err = view
            .finish_load(ticket, Err(ApiError::Transport("connection refused".into())))
            .unwrap_err();

        assert!(matches!(err, ViewError::Api(ApiError::Transport(_))));
        assert_eq!(view.error(), Some(LIST_LOAD_FAILED));
        assert_eq!(view.users(), &[user(1, "Ann")]);
        assert_eq!(view.drain_notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn superseded_list_result_is_dropped() {
        let mut view = ListView::new();
        let first = view.begin_load();
        let second = view.begin_load();

        view.finish_load(second, Ok(vec![user(2, "Bo")])).unwrap();
        let outcome = view.finish_load(first, Ok(vec![user(1, "Ann")])).unwrap();

        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(view.users(), &[user(2, "Bo")]);
    }

    #[test]
    fn remove_after_list_leaves_empty_table() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        view.apply_deleted(1, Ok(())).unwrap();
        assert!(view.users().is_empty());
        assert_eq!(view.drain_notices()[0].description, "User Ann has been deleted");
    }

    #[test]
    fn repeated_delete_confirmation_is_harmless() {
        let mut view = loaded_list(vec![user(1, "Ann"), user(2, "Bo")]);
        view.apply_deleted(1, Ok(())).unwrap();
        view.apply_deleted(1, Ok(())).unwrap();
        assert_eq!(view.users(), &[user(2, "Bo")]);
    }

    #[test]
    fn failed_delete_keeps_user() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let result = view.apply_deleted(
            1,
            Err(ApiError::HttpError {
                status: 500,
                body: String::new(),
            }),
        );
        assert!(result.is_err());
        assert_eq!(view.users(), &[user(1, "Ann")]);
        assert_eq!(view.drain_notices()[0].description, "Failed to delete user");
    }

    #[test]
    fn created_user_is_appended_with_server_id() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let created = view.apply_created(Ok(user(7, "Bo"))).unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(view.users().last().map(|u| u.id), Some(7));
        assert_eq!(view.drain_notices()[0].description, "User Bo has been created");
    }

    #[test]
    fn rejected_create_leaves_store_untouched() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let err = view
            .apply_created(Err(ApiError::Validation {
                status: 422,
                messages: vec!["email invalid".to_string()],
            }))
            .unwrap_err();

        assert_eq!(err.to_string(), "email invalid");
        assert_eq!(view.users(), &[user(1, "Ann")]);
        let notices = view.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].description, "email invalid");
    }

    #[test]
    fn updated_user_keeps_row_position() {
        let mut view = loaded_list(vec![user(1, "Ann"), user(2, "Bo"), user(3, "Cy")]);
        view.apply_updated(Ok(user(2, "Bob"))).unwrap();
        let names: Vec<&str> = view.users().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Ann", "Bob", "Cy"]);
    }

    #[test]
    fn update_of_unknown_user_is_a_store_error() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let err = view.apply_updated(Ok(user(9, "Zed"))).unwrap_err();
        assert!(matches!(err, ViewError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn inflight_reload_does_not_undo_confirmed_create() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let reload = view.begin_load();
        view.apply_created(Ok(user(7, "Bo"))).unwrap();

        let outcome = view.finish_load(reload, Ok(vec![user(1, "Ann")])).unwrap();
        assert_eq!(outcome, LoadOutcome::Stale);
        assert!(!view.is_loading());
        let ids: Vec<UserId> = view.users().iter().map(|u| u.id).collect();
        assert_eq!(ids, [1, 7]);
    }

    #[test]
    fn inflight_reload_does_not_resurrect_confirmed_delete() {
        let mut view = loaded_list(vec![user(1, "Ann"), user(2, "Bo")]);
        let reload = view.begin_load();
        view.apply_deleted(1, Ok(())).unwrap();

        let outcome = view.finish_load(reload, Ok(vec![user(1, "Ann"), user(2, "Bo")])).unwrap();
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(view.users(), &[user(2, "Bo")]);
    }

    #[test]
    fn inflight_reload_does_not_revert_confirmed_update() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let reload = view.begin_load();
        view.apply_updated(Ok(user(1, "Annie"))).unwrap();

        let outcome = view.finish_load(reload, Ok(vec![user(1, "Ann")])).unwrap();
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(view.users(), &[user(1, "Annie")]);
    }

    #[test]
    fn failed_write_keeps_inflight_reload_current() {
        let mut view = loaded_list(vec![user(1, "Ann")]);
        let reload = view.begin_load();
        let _ = view.apply_created(Err(ApiError::Transport("reset".into())));

        let outcome = view.finish_load(reload, Ok(vec![user(1, "Ann"), user(2, "Bo")])).unwrap();
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(view.users().len(), 2);
    }

    #[test]
    fn create_confirmed_after_reload_saw_the_row() {
        let mut view = ListView::new();
        let reload = view.begin_load();
        view.finish_load(reload, Ok(vec![user(1, "Ann"), user(7, "Bo")])).unwrap();
        view.drain_notices();

        let created = view.apply_created(Ok(user(7, "Bo"))).unwrap();
        assert_eq!(created.id, 7);
        let ids: Vec<UserId> = view.users().iter().map(|u| u.id).collect();
        assert_eq!(ids, [1, 7]);
        assert_eq!(view.drain_notices()[0].description, "User Bo has been created");
    }

    #[test]
    fn detail_load_success() {
        let mut view = DetailView::new();
        let ticket = view.begin_load(1);
        assert_eq!(view.state(), &DetailState::Loading { id: 1 });

        assert_eq!(view.finish_load(ticket, Ok(user(1, "Ann"))), LoadOutcome::Applied);
        assert_eq!(view.user(), Some(&user(1, "Ann")));
    }

    #[test]
    fn detail_not_found_message() {
        let mut view = DetailView::new();
        let ticket = view.begin_load(99);
        view.finish_load(ticket, Err(ApiError::NotFound));
        assert_eq!(
            view.state(),
            &DetailState::Failed {
                id: 99,
                message: DETAIL_NOT_FOUND.to_string(),
            }
        );
    }

    #[test]
    fn detail_generic_failure_message() {
        let mut view = DetailView::new();
        let ticket = view.begin_load(4);
        view.finish_load(ticket, Err(ApiError::Transport("timed out".into())));
        assert!(matches!(
            view.state(),
            DetailState::Failed { id: 4, message } if message == DETAIL_LOAD_FAILED
        ));
    }

    #[test]
    fn rapid_navigation_keeps_latest_user() {
        let mut view = DetailView::new();
        let first = view.begin_load(1);
        let second = view.begin_load(2);

        assert_eq!(view.finish_load(second, Ok(user(2, "Bo"))), LoadOutcome::Applied);
        assert_eq!(view.finish_load(first, Ok(user(1, "Ann"))), LoadOutcome::Stale);
        assert_eq!(view.user().map(|u| u.id), Some(2));
    }

    #[test]
    fn reloading_same_id_still_supersedes() {
        let mut view = DetailView::new();
        let first = view.begin_load(1);
        let second = view.begin_load(1);

        assert_eq!(view.finish_load(first, Err(ApiError::NotFound)), LoadOutcome::Stale);
        assert_eq!(view.finish_load(second, Ok(user(1, "Ann"))), LoadOutcome::Applied);
    }

    #[test]
    fn disposed_view_discards_inflight_result() {
        let mut view = DetailView::new();
        let ticket = view.begin_load(1);
        view.dispose();

        assert_eq!(view.finish_load(ticket, Ok(user(1, "Ann"))), LoadOutcome::Stale);
        assert_eq!(view.state(), &DetailState::Loading { id: 1 });
        assert!(view.is_disposed());
    }
}
