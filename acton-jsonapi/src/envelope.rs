//! JSON:API envelope codec
//!
//! Converts between the wire envelope
//!
//! ```json
//! {"data": {"id": "1", "type": "user", "attributes": {...}, "meta": {"etag": "..."}},
//!  "links": {"self": "https://example.com/user/1"}}
//! ```
//!
//! and [`EntityData`]. Decoding validates the body against the resource
//! [`Schema`] and enforces the identity rules (`type` must match the
//! resource, no client-chosen ids on create, `id` required on update).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    handlers::{ApiError, ApiResult, ValidationErrors},
    repository::Entity,
    schema::{LoadMode, Schema, MISSING_FIELD},
};

const INVALID_INPUT: &str = "Invalid input type.";
const NOT_A_STRING: &str = "Not a valid string.";

/// One resource object in wire form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EntityMeta>,
}

/// Per-entity metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub etag: String,
}

/// Top-level `links` member
///
/// Single-entity documents and unpaginated collections carry only `self`.
/// Paginated collections always carry all four navigation keys, with
/// `null` for the ones that do not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(flatten)]
    pub navigation: Option<NavigationLinks>,
}

impl Links {
    /// Links with only `self`
    pub fn self_only(url: impl Into<String>) -> Self {
        Self {
            self_link: url.into(),
            navigation: None,
        }
    }
}

/// Pagination links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationLinks {
    pub first: Option<String>,
    pub last: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Top-level `meta` member of a collection document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionMeta {
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// A complete response document
///
/// `D` is [`EntityData`] for single-entity documents and `Vec<EntityData>`
/// for collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<D> {
    pub data: D,
    pub links: Links,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<CollectionMeta>,
}

impl ResponseEnvelope<EntityData> {
    pub fn single(data: EntityData, self_link: impl Into<String>) -> Self {
        Self {
            data,
            links: Links::self_only(self_link),
            meta: None,
        }
    }
}

impl ResponseEnvelope<Vec<EntityData>> {
    pub fn many(data: Vec<EntityData>, links: Links, meta: CollectionMeta) -> Self {
        Self {
            data,
            links,
            meta: Some(meta),
        }
    }
}

/// What a request body is being decoded for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode<'a> {
    /// POST: the server assigns the id
    Create,
    /// PATCH of the entity identified by `entity_id` in the URL
    Update { entity_id: &'a str },
}

impl DecodeMode<'_> {
    fn load_mode(self) -> LoadMode {
        match self {
            Self::Create => LoadMode::Create,
            Self::Update { .. } => LoadMode::Update,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Create => "creation",
            Self::Update { .. } => "update",
        }
    }
}

/// Envelope codec bound to one resource
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeCodec<'a> {
    resource_type: &'a str,
    schema: &'a Schema,
}

impl<'a> EnvelopeCodec<'a> {
    pub fn new(resource_type: &'a str, schema: &'a Schema) -> Self {
        Self {
            resource_type,
            schema,
        }
    }

    /// Decode a POST or PATCH body
    ///
    /// Field errors are collected into one `UnprocessableEntity` error. A
    /// structurally valid body is then checked for identity: a foreign `type`
    /// is a `Conflict`, an `id` on create is `Forbidden`, and an update whose
    /// `id` differs from the URL is a `Conflict`.
    pub fn decode(&self, body: &Value, mode: DecodeMode<'_>) -> ApiResult<EntityData> {
        let mut errors = ValidationErrors::new();

        let data = match body {
            Value::Object(document) => match document.get("data") {
                Some(Value::Object(data)) => data,
                None | Some(Value::Null) => {
                    errors.add(&["data"], MISSING_FIELD);
                    return Err(ApiError::unprocessable(errors));
                }
                Some(_) => {
                    errors.add(&["data", "_schema"], INVALID_INPUT);
                    return Err(ApiError::unprocessable(errors));
                }
            },
            _ => {
                errors.add(&["_schema"], INVALID_INPUT);
                return Err(ApiError::unprocessable(errors));
            }
        };

        let resource_type = match data.get("type") {
            Some(Value::String(t)) => Some(t.clone()),
            None | Some(Value::Null) => {
                errors.add(&["data", "type"], MISSING_FIELD);
                None
            }
            Some(_) => {
                errors.add(&["data", "type"], NOT_A_STRING);
                None
            }
        };

        let id = match data.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            None | Some(Value::Null) => {
                if matches!(mode, DecodeMode::Update { .. }) {
                    errors.add(&["data", "id"], MISSING_FIELD);
                }
                None
            }
            Some(_) => {
                errors.add(&["data", "id"], NOT_A_STRING);
                None
            }
        };

        let attributes = match data.get("attributes") {
            Some(Value::Object(attributes)) => self.schema.load(
                attributes,
                mode.load_mode(),
                &mut errors,
                &["data", "attributes"],
            ),
            None | Some(Value::Null) => {
                errors.add(&["data", "attributes"], MISSING_FIELD);
                Map::new()
            }
            Some(_) => {
                errors.add(&["data", "attributes", "_schema"], INVALID_INPUT);
                Map::new()
            }
        };

        if !errors.is_empty() {
            return Err(ApiError::unprocessable(errors));
        }
        let Some(resource_type) = resource_type else {
            return Err(ApiError::unprocessable(errors));
        };

        if resource_type != self.resource_type {
            return Err(ApiError::conflict(format!(
                "Url specified the {} of \"{}\" but type specified \"{}\".",
                mode.verb(),
                self.resource_type,
                resource_type
            )));
        }

        match (mode, id.as_deref()) {
            (DecodeMode::Create, Some(_)) => {
                return Err(ApiError::forbidden(
                    "You must not specify an id when creating an entity",
                ));
            }
            (DecodeMode::Update { entity_id }, Some(body_id)) if body_id != entity_id => {
                return Err(ApiError::conflict(format!(
                    "Url specified the update of entity \"{}\" but id specified \"{}\".",
                    entity_id, body_id
                )));
            }
            _ => {}
        }

        Ok(EntityData {
            id,
            resource_type,
            attributes,
            meta: None,
        })
    }

    /// Encode an entity, restricting attributes to `only` when given
    ///
    /// `meta.etag` is always present.
    pub fn encode<E: Entity>(&self, entity: &E, only: Option<&[String]>) -> ApiResult<EntityData> {
        let object = match serde_json::to_value(entity) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                return Err(ApiError::internal(format!(
                    "{} entity serialized to a non-object value: {}",
                    self.resource_type, other
                )));
            }
            Err(e) => {
                return Err(ApiError::internal(format!(
                    "{} entity failed to serialize: {}",
                    self.resource_type, e
                )));
            }
        };

        Ok(EntityData {
            id: Some(entity.id()),
            resource_type: self.resource_type.to_string(),
            attributes: self.schema.dump(&object, only),
            meta: Some(EntityMeta {
                etag: entity.etag(),
            }),
        })
    }
}
