//! Shared fixtures for the protocol tests: an in-memory user store and
//! request helpers driving the router with `oneshot`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use acton_jsonapi::prelude::*;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
};
use serde_json::{Map, Value};
use tower::ServiceExt;

pub const HOST: &str = "example.com";
pub const BASE: &str = "https://example.com";

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub etag: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Entity for User {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn etag(&self) -> String {
        self.etag.clone()
    }
}

/// In-memory store; ids are assigned sequentially from "1"
#[derive(Default)]
pub struct UserStore {
    users: Mutex<Vec<User>>,
    next_id: Mutex<u64>,
}

impl UserStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn new_etag() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

fn apply(user: &mut User, attributes: &Map<String, Value>) {
    if let Some(name) = attributes.get("name").and_then(Value::as_str) {
        user.name = name.to_string();
    }
    if let Some(age) = attributes.get("age") {
        user.age = age.as_i64();
    }
    if let Some(username) = attributes.get("username").and_then(Value::as_str) {
        user.username = Some(username.to_string());
    }
    if let Some(password) = attributes.get("password").and_then(Value::as_str) {
        user.password = Some(password.to_string());
    }
}

#[async_trait]
impl Fetcher<User> for UserStore {
    async fn get_entity(&self, entity_id: &str, _ctx: &RequestContext) -> ApiResult<Option<User>> {
        Ok(self.get(entity_id))
    }

    async fn get_many_entities(
        &self,
        pagination: Option<PaginationArgs>,
        _ctx: &RequestContext,
    ) -> ApiResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(match pagination {
            Some(args) => users
                .iter()
                .skip(args.offset() as usize)
                .take(args.limit() as usize)
                .cloned()
                .collect(),
            None => users.clone(),
        })
    }

    async fn get_total_entities(&self, _ctx: &RequestContext) -> ApiResult<u64> {
        Ok(self.len() as u64)
    }
}

#[async_trait]
impl OrmIntegration<User> for UserStore {
    async fn create_entity(
        &self,
        attributes: Map<String, Value>,
        _ctx: &RequestContext,
    ) -> ApiResult<User> {
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            next_id.to_string()
        };
        let mut user = User {
            id,
            etag: Self::new_etag(),
            name: String::new(),
            age: None,
            username: None,
            password: None,
        };
        apply(&mut user, &attributes);
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_entity(
        &self,
        existing: User,
        attributes: Map<String, Value>,
        _ctx: &RequestContext,
    ) -> ApiResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == existing.id)
            .ok_or_else(|| ApiError::not_found("user", existing.id.clone()))?;
        apply(user, &attributes);
        user.etag = Self::new_etag();
        Ok(user.clone())
    }

    async fn delete_entity(&self, entity: User, _ctx: &RequestContext) -> ApiResult<()> {
        self.users.lock().unwrap().retain(|u| u.id != entity.id);
        Ok(())
    }
}

pub fn user_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::string("name").required())
        .field(FieldSpec::integer("age"))
        .field(FieldSpec::string("username").immutable())
        .field(FieldSpec::string("password").load_only())
}

pub fn user_resource(store: &Arc<UserStore>) -> Resource<User> {
    Resource::new("user", "/user", user_schema(), store.clone(), store.clone())
}

pub fn app_with(config: Config, resource: Resource<User>) -> Router {
    ResourceRouter::new(config)
        .register(resource)
        .expect("resource should register")
        .into_router()
}

pub fn app(store: &Arc<UserStore>) -> Router {
    app_with(Config::default(), user_resource(store))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn etag(&self) -> &str {
        self.header(header::ETAG).expect("response should carry an ETag")
    }

    pub fn ids(&self) -> Vec<String> {
        self.body["data"]
            .as_array()
            .expect("data should be a list")
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn request(method: Method, uri: &str, if_match: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST);
    if let Some(if_match) = if_match {
        builder = builder.header(header::IF_MATCH, if_match);
    }
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, MIMETYPE);
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri, None, None)
}

pub fn post(uri: &str, body: &Value) -> Request<Body> {
    request(Method::POST, uri, None, Some(body))
}

pub fn patch(uri: &str, if_match: Option<&str>, body: &Value) -> Request<Body> {
    request(Method::PATCH, uri, if_match, Some(body))
}

pub fn delete(uri: &str, if_match: Option<&str>) -> Request<Body> {
    request(Method::DELETE, uri, if_match, None)
}

pub fn new_user(name: &str, age: i64) -> Value {
    serde_json::json!({
        "data": {"type": "user", "attributes": {"name": name, "age": age}}
    })
}

/// Create a user through the API and return its id and etag
pub async fn create_user(app: &Router, name: &str, age: i64) -> (String, String) {
    let response = send(app, post("/user", &new_user(name, age))).await;
    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.body["data"]["id"].as_str().unwrap().to_string();
    (id, response.etag().to_string())
}

/// Strip the scheme and host from an absolute link
pub fn path_of(link: &Value) -> String {
    link.as_str()
        .expect("link should be a string")
        .strip_prefix(BASE)
        .expect("link should be absolute")
        .to_string()
}
