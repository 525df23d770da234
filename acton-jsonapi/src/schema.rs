//! Field-descriptor schemas
//!
//! A [`Schema`] is an ordered table of [`FieldSpec`]s describing the
//! attributes of a resource. The envelope codec drives it in two directions:
//!
//! - [`Schema::load`] validates incoming attributes, collecting every field
//!   error instead of stopping at the first one.
//! - [`Schema::dump`] selects the attributes to serialize, honouring
//!   write-only fields and sparse fieldsets.
//!
//! ```rust
//! use acton_jsonapi::schema::{FieldKind, FieldSpec, Schema};
//!
//! let schema = Schema::new()
//!     .field(FieldSpec::string("name").required())
//!     .field(FieldSpec::integer("age"))
//!     .field(FieldSpec::string("username").required().immutable())
//!     .field(FieldSpec::string("password").load_only());
//!
//! assert_eq!(schema.len(), 4);
//! assert_eq!(schema.get("age").map(|f| f.kind), Some(FieldKind::Integer));
//! ```

use std::{fmt, sync::Arc};

use serde_json::{Map, Value};

use crate::handlers::ValidationErrors;

/// Message for a required field absent from a create request
pub const MISSING_FIELD: &str = "Missing data for required field.";

/// Message for an immutable field present in an update request
pub const IMMUTABLE_FIELD: &str = "Can't update immutable fields.";

/// Message for `null` on a non-nullable field
pub const NULL_FIELD: &str = "Field may not be null.";

/// Custom field validator; the error string becomes a field message
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// JSON type expected for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string
    String,
    /// Whole number
    Integer,
    /// Any JSON number
    Number,
    /// `true` or `false`
    Boolean,
    /// String containing a plausible email address
    Email,
    /// JSON object
    Object,
    /// JSON array
    List,
    /// No type check
    Any,
}

impl FieldKind {
    fn check(self, value: &Value) -> Result<(), &'static str> {
        let valid = match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Email => value.as_str().is_some_and(looks_like_email),
            Self::Object => value.is_object(),
            Self::List => value.is_array(),
            Self::Any => true,
        };
        if valid {
            return Ok(());
        }

        Err(match self {
            Self::String => "Not a valid string.",
            Self::Integer => "Not a valid integer.",
            Self::Number => "Not a valid number.",
            Self::Boolean => "Not a valid boolean.",
            Self::Email => "Not a valid email address.",
            Self::Object => "Not a valid mapping type.",
            Self::List => "Not a valid list.",
            Self::Any => "Invalid value.",
        })
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Whether attributes are being loaded for a create or an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Every required field must be present
    Create,
    /// Partial: only the fields present are validated, immutable fields are rejected
    Update,
}

/// Description of a single attribute
#[derive(Clone)]
pub struct FieldSpec {
    /// Attribute name on the wire and in the serialized entity
    pub name: String,
    /// Expected JSON type
    pub kind: FieldKind,
    /// Must be present on create
    pub required: bool,
    /// Accepts `null`
    pub nullable: bool,
    /// Rejected on update
    pub immutable: bool,
    /// Accepted on input, never emitted
    pub load_only: bool,
    /// Emitted, ignored on input
    pub dump_only: bool,
    validators: Vec<Validator>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("nullable", &self.nullable)
            .field("immutable", &self.immutable)
            .field("load_only", &self.load_only)
            .field("dump_only", &self.dump_only)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            nullable: false,
            immutable: false,
            load_only: false,
            dump_only: false,
            validators: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    /// Must be present on create
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Accepts an explicit `null`
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Rejected when present in an update request
    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    /// Accepted on input, never serialized (e.g. passwords)
    #[must_use]
    pub fn load_only(mut self) -> Self {
        self.load_only = true;
        self
    }

    /// Serialized, but ignored on input (e.g. server-computed values)
    #[must_use]
    pub fn dump_only(mut self) -> Self {
        self.dump_only = true;
        self
    }

    /// Attach a custom validator
    ///
    /// ```rust
    /// use acton_jsonapi::schema::FieldSpec;
    ///
    /// let age = FieldSpec::integer("age").validate(|value| match value.as_i64() {
    ///     Some(age) if age >= 0 => Ok(()),
    ///     _ => Err("Must be at least 0.".to_string()),
    /// });
    /// ```
    #[must_use]
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    fn load_value(&self, value: &Value, mode: LoadMode, messages: &mut Vec<String>) {
        if mode == LoadMode::Update && self.immutable {
            messages.push(IMMUTABLE_FIELD.to_string());
            return;
        }

        if value.is_null() {
            if !self.nullable {
                messages.push(NULL_FIELD.to_string());
            }
            return;
        }

        if let Err(message) = self.kind.check(value) {
            messages.push(message.to_string());
            return;
        }

        for validator in &self.validators {
            if let Err(message) = validator(value) {
                messages.push(message);
            }
        }
    }
}

/// Ordered field table for one resource
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate `attributes`, recording failures under `path` in `errors`
    ///
    /// Returns the accepted attributes: declared, non-`dump_only` fields that
    /// passed validation. Unknown keys are dropped. Callers must check
    /// `errors` before using the result.
    pub fn load(
        &self,
        attributes: &Map<String, Value>,
        mode: LoadMode,
        errors: &mut ValidationErrors,
        path: &[&str],
    ) -> Map<String, Value> {
        let mut loaded = Map::new();

        for field in self.fields.iter().filter(|field| !field.dump_only) {
            let mut messages = Vec::new();

            match attributes.get(&field.name) {
                None => {
                    if mode == LoadMode::Create && field.required {
                        messages.push(MISSING_FIELD.to_string());
                    }
                }
                Some(value) => {
                    field.load_value(value, mode, &mut messages);
                    if messages.is_empty() {
                        loaded.insert(field.name.clone(), value.clone());
                    }
                }
            }

            if !messages.is_empty() {
                let mut field_path = path.to_vec();
                field_path.push(field.name.as_str());
                for message in messages {
                    errors.add(&field_path, message);
                }
            }
        }

        loaded
    }

    /// Select the attributes of a serialized entity to send to the client
    ///
    /// `only` restricts output to the named fields; `None` means all
    /// serializable fields. `load_only` fields are never emitted.
    pub fn dump(&self, object: &Map<String, Value>, only: Option<&[String]>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|field| !field.load_only)
            .filter(|field| only.map_or(true, |only| only.iter().any(|name| *name == field.name)))
            .filter_map(|field| {
                object
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect()
    }
}
