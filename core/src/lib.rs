//! Client-side entity cache for the user API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), keeps the last fetched users
//! in an ordered `EntityStore`, and drives list/detail controllers whose
//! state only changes once the server has confirmed a write.
//!
//! # Design
//! - `UserClient` is stateless; it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` and `parse_*`, so the I/O
//!   boundary is explicit. `Transport` is the one place that performs I/O.
//! - Loads hand out generation tickets; a superseded or disposed load's
//!   result is dropped.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;
pub mod view;

pub use client::UserClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::UserSession;
pub use store::{Entity, EntityStore, StoreError};
pub use transport::{Transport, UreqTransport};
pub use types::{Address, Company, Geo, NewUser, User, UserId, UserPatch};
pub use view::{DetailState, DetailView, ListView, LoadOutcome, LoadTicket, Notice, NoticeLevel, ViewError};
