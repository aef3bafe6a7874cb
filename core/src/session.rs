//! Drives the list and detail controllers through a `Transport`.
//!
//! # Design
//! `UserSession` owns the list view, and with it the entity store; nothing
//! else mutates them. Each operation is one build → execute → parse → apply
//! pass with no retry, so a create reaches the server at most once per call.

use tracing::info;

use crate::client::UserClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::store::StoreError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{NewUser, User, UserId, UserPatch};
use crate::view::{DetailView, ListView, LoadOutcome, ViewError};

pub struct UserSession<T: Transport> {
    client: UserClient,
    transport: T,
    list: ListView,
}

impl UserSession<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        info!(base_url = %config.base_url, "starting user session");
        Self::new(UserClient::new(&config.base_url), UreqTransport::new(config.timeout))
    }
}

impl<T: Transport> UserSession<T> {
    pub fn new(client: UserClient, transport: T) -> Self {
        Self {
            client,
            transport,
            list: ListView::new(),
        }
    }

    pub fn client(&self) -> &UserClient {
        &self.client
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListView {
        &mut self.list
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request)
    }

    /// Reload the whole table.
    pub fn refresh(&mut self) -> Result<(), ViewError> {
        let ticket = self.list.begin_load();
        let result = self
            .send(self.client.build_list_users())
            .and_then(|response| self.client.parse_list_users(response));
        self.list.finish_load(ticket, result).map(|_| ())
    }

    pub fn create(&mut self, input: &NewUser) -> Result<User, ViewError> {
        let result = self
            .client
            .build_create_user(input)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_create_user(response));
        self.list.apply_created(result)
    }

    pub fn update(&mut self, id: UserId, patch: &UserPatch) -> Result<User, ViewError> {
        let result = self
            .client
            .build_update_user(id, patch)
            .and_then(|request| self.send(request))
            .and_then(|response| self.client.parse_update_user(response));
        self.list.apply_updated(result)
    }

    /// Submit an edit form for a listed user, sending only what changed.
    pub fn save_edit(&mut self, id: UserId, edited: &NewUser) -> Result<User, ViewError> {
        let original = self
            .list
            .store()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let patch = UserPatch::between(&original, edited);
        if patch.is_empty() {
            return Ok(original);
        }
        self.update(id, &patch)
    }

    pub fn delete(&mut self, id: UserId) -> Result<(), ViewError> {
        let result = self
            .send(self.client.build_delete_user(id))
            .and_then(|response| self.client.parse_delete_user(response));
        self.list.apply_deleted(id, result)
    }

    /// Load one user into `view`. The session's store is not touched.
    pub fn load_detail(&self, view: &mut DetailView, id: UserId) -> LoadOutcome {
        if view.is_disposed() {
            return LoadOutcome::Stale;
        }
        let ticket = view.begin_load(id);
        let result = self
            .send(self.client.build_get_user(id))
            .and_then(|response| self.client.parse_get_user(response));
        view.finish_load(ticket, result)
    }
}
