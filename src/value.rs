//! Dynamically typed values that flow through factory and action invocations.
//!
//! Resource types are ordinary Rust structs. Once handed to the registry they
//! travel as an [`Object`]: a [`TypeName`] plus a type-erased, shareable
//! [`Instance`]. Scalars and documents travel as JSON.

use crate::server::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Identifier of a type known to the registry (or of a built-in scalar).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Signed integer scalar
    pub const INT: &'static str = "int";
    /// Floating point scalar
    pub const FLOAT: &'static str = "float";
    /// Boolean scalar
    pub const BOOL: &'static str = "bool";
    /// String scalar
    pub const STRING: &'static str = "string";
    /// Arbitrary JSON document
    pub const JSON: &'static str = "json";
    /// The current [`Request`]
    pub const REQUEST: &'static str = "Request";
    /// Marker returned for bare function values that return "self"
    pub const INVOCABLE: &'static str = "callable";

    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of `int`, `float`, `bool` or `string`.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(
            self.as_str(),
            Self::INT | Self::FLOAT | Self::BOOL | Self::STRING
        )
    }

    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.as_str() == name
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// A resource or service value held behind an [`Object`].
///
/// Implemented for every `Serialize + Debug + Send + Sync + 'static` type, so
/// resource structs only need the usual derives.
pub trait Instance: Any + Send + Sync + fmt::Debug {
    /// Render the instance as a response payload.
    fn to_payload(&self) -> anyhow::Result<serde_json::Value>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> Instance for T
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn to_payload(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased instance tagged with the registry type it belongs to.
#[derive(Clone, Debug)]
pub struct Object {
    type_name: TypeName,
    inner: Arc<dyn Instance>,
}

impl Object {
    #[must_use]
    pub fn new<T: Instance>(type_name: impl Into<TypeName>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            inner: Arc::new(value),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Render the wrapped instance as JSON.
    pub fn to_payload(&self) -> anyhow::Result<serde_json::Value> {
        self.inner.to_payload()
    }
}

/// A value produced by a resolver, a factory or an action.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value (nullable parameters, actions without a result)
    #[default]
    Null,
    /// Scalars and documents
    Json(serde_json::Value),
    /// A registered resource or service instance
    Object(Object),
    /// The request being dispatched
    Request(Arc<Request>),
    /// A fully formed response (keeps its own status and headers)
    Response(Response),
}

impl Value {
    /// Serialize any value into a JSON value.
    pub fn json<T: Serialize>(value: T) -> anyhow::Result<Self> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Json(serde_json::Value::Null))
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Json(v) => v.as_str(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_request(&self) -> Option<&Arc<Request>> {
        match self {
            Value::Request(req) => Some(req),
            _ => None,
        }
    }

    /// Downcast an [`Value::Object`] to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_object().and_then(Object::downcast_ref)
    }

    /// Name of the runtime type, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Json(_) => TypeName::JSON,
            Value::Object(obj) => obj.type_name().as_str(),
            Value::Request(_) => TypeName::REQUEST,
            Value::Response(_) => "Response",
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Response> for Value {
    fn from(value: Response) -> Self {
        Value::Response(value)
    }
}

macro_rules! json_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Json(serde_json::Value::from(value))
            }
        })*
    };
}

json_from!(i32, i64, u32, u64, f64, bool, String, &str);

/// Positional arguments handed to a constructor, method or function body.
///
/// Arguments arrive in parameter declaration order.
#[derive(Debug, Default)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the argument at `index`.
    pub fn get(&self, index: usize) -> anyhow::Result<&Value> {
        self.values
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("missing argument at position {index}"))
    }

    /// Deserialize a JSON argument into `T`.
    pub fn json<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<T> {
        match self.get(index)? {
            Value::Json(v) => Ok(serde_json::from_value(v.clone())?),
            Value::Null => Ok(serde_json::from_value(serde_json::Value::Null)?),
            other => anyhow::bail!(
                "argument at position {index} is a {}, not JSON",
                other.kind()
            ),
        }
    }

    /// Like [`Arguments::json`] but maps an absent value to `None`.
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> anyhow::Result<Option<T>> {
        if self.get(index)?.is_null() {
            return Ok(None);
        }
        self.json(index).map(Some)
    }

    /// Borrow an object argument as its concrete type.
    pub fn object<T: 'static>(&self, index: usize) -> anyhow::Result<&T> {
        let value = self.get(index)?;
        value.downcast_ref::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "argument at position {index} is a {}, not {}",
                value.kind(),
                std::any::type_name::<T>()
            )
        })
    }

    /// Borrow the request argument.
    pub fn request(&self, index: usize) -> anyhow::Result<&Arc<Request>> {
        let value = self.get(index)?;
        value.as_request().ok_or_else(|| {
            anyhow::anyhow!("argument at position {index} is a {}, not a request", value.kind())
        })
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
