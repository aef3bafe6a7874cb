use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Value>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<Value>,
    pub company: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<Value>,
    pub company: Option<Value>,
}

#[derive(Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Serialize, Deserialize)]
pub struct Messages {
    pub messages: Vec<String>,
}

#[derive(Default)]
pub struct Users {
    next_id: u64,
    rows: BTreeMap<u64, User>,
}

pub type Db = Arc<RwLock<Users>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Users::default()));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(db)
}

/// Serve the same routes below `prefix`, e.g. `/api`.
pub fn app_with_prefix(prefix: &str) -> Router {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        app()
    } else {
        Router::new().nest(&format!("/{prefix}"), app())
    }
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_prefix(listener: TcpListener, prefix: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_prefix(prefix)).await
}

fn rejected(messages: Vec<String>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(Messages { messages })).into_response()
}

fn required_field_messages(fields: [(&str, &str); 3]) -> Vec<String> {
    fields
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| format!("{field} is required"))
        .collect()
}

/// Blank emails are reported as missing, not invalid.
fn email_is_plausible(email: &str) -> bool {
    email.trim().is_empty() || email.contains('@')
}

async fn list_users(State(db): State<Db>) -> Json<Data<Vec<User>>> {
    let users = db.read().await;
    Json(Data {
        data: users.rows.values().cloned().collect(),
    })
}

async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> Response {
    let mut messages = required_field_messages([
        ("name", input.name.as_str()),
        ("username", input.username.as_str()),
        ("email", input.email.as_str()),
    ]);
    if !email_is_plausible(&input.email) {
        messages.push("email invalid".to_string());
    }
    if !messages.is_empty() {
        return rejected(messages);
    }

    let mut users = db.write().await;
    users.next_id += 1;
    let user = User {
        id: users.next_id,
        name: input.name,
        username: input.username,
        email: input.email,
        phone: input.phone,
        website: input.website,
        address: input.address,
        company: input.company,
    };
    users.rows.insert(user.id, user.clone());
    info!(id = user.id, "created user");
    (StatusCode::CREATED, Json(Data { data: user })).into_response()
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Data<User>>, StatusCode> {
    let users = db.read().await;
    users
        .rows
        .get(&id)
        .cloned()
        .map(|user| Json(Data { data: user }))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(State(db): State<Db>, Path(id): Path<u64>, Json(input): Json<UpdateUser>) -> Response {
    let mut users = db.write().await;
    let Some(user) = users.rows.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut messages = required_field_messages([
        ("name", input.name.as_deref().unwrap_or("-")),
        ("username", input.username.as_deref().unwrap_or("-")),
        ("email", input.email.as_deref().unwrap_or("-")),
    ]);
    if let Some(email) = input.email.as_deref() {
        if !email_is_plausible(email) {
            messages.push("email invalid".to_string());
        }
    }
    if !messages.is_empty() {
        return rejected(messages);
    }

    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(username) = input.username {
        user.username = username;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    if let Some(phone) = input.phone {
        user.phone = Some(phone);
    }
    if let Some(website) = input.website {
        user.website = Some(website);
    }
    if let Some(address) = input.address {
        user.address = Some(address);
    }
    if let Some(company) = input.company {
        user.company = Some(company);
    }
    Json(Data { data: user.clone() }).into_response()
}

async fn delete_user(State(db): State<Db>, Path(id): Path<u64>) -> StatusCode {
    let mut users = db.write().await;
    match users.rows.remove(&id) {
        Some(_) => {
            info!(id, "deleted user");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_inside_data_envelope() {
        let user = User {
            id: 1,
            name: "Ann".to_string(),
            username: "ann".to_string(),
            email: "ann@example.com".to_string(),
            phone: None,
            website: None,
            address: None,
            company: None,
        };
        let json = serde_json::to_value(Data { data: user }).unwrap();
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["data"]["name"], "Ann");
        assert!(json["data"].get("phone").is_none());
    }

    #[test]
    fn create_user_tolerates_missing_fields() {
        let input: CreateUser = serde_json::from_str(r#"{"name":"Bo"}"#).unwrap();
        assert_eq!(input.name, "Bo");
        assert!(input.email.is_empty());
    }

    #[test]
    fn required_fields_are_reported_in_order() {
        let messages = required_field_messages([("name", ""), ("username", "bo"), ("email", " ")]);
        assert_eq!(messages, vec!["name is required", "email is required"]);
    }

    #[test]
    fn update_user_all_fields_optional() {
        let input: UpdateUser = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.email.is_none());
    }
}
