use crate::error::{Error, Result};
use crate::reflect::{
    Callable, ParameterSpec, ReturnType, Signature, TypeRegistry, CONSTRUCTOR,
};
use crate::value::{Arguments, Object, TypeName, Value};
use std::fmt;

/// Surface form of a factory, before normalization.
#[derive(Clone, Debug)]
pub enum FactorySpec {
    /// `"function"`, `"Type::method"` or `"Type::method()"`
    Path(String),
    /// Type + method pair
    Method(TypeName, String),
    /// Instance + method pair
    Bound(Object, String),
    /// A function value passed directly
    Closure(Callable),
}

impl FactorySpec {
    #[must_use]
    pub fn path(path: &str) -> Self {
        FactorySpec::Path(path.to_string())
    }

    #[must_use]
    pub fn method(type_name: &str, method: &str) -> Self {
        FactorySpec::Method(TypeName::new(type_name), method.to_string())
    }

    #[must_use]
    pub fn bound(instance: Object, method: &str) -> Self {
        FactorySpec::Bound(instance, method.to_string())
    }

    /// The constructor of `type_name`.
    #[must_use]
    pub fn constructor(type_name: TypeName) -> Self {
        FactorySpec::Method(type_name, CONSTRUCTOR.to_string())
    }

    pub fn closure<F>(parameters: Vec<ParameterSpec>, return_type: ReturnType, body: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        FactorySpec::Closure(Callable::new(parameters, return_type, body))
    }
}

impl From<&str> for FactorySpec {
    fn from(path: &str) -> Self {
        FactorySpec::path(path)
    }
}

/// Canonical form of something that can be called to produce a value.
#[derive(Clone, Debug)]
pub enum InvocableDescriptor {
    /// A registered free function
    FreeFunction(String),
    /// A static method
    StaticMethod { type_name: TypeName, method: String },
    /// An instance method on an already constructed instance
    BoundMethod { instance: Object, method: String },
    /// An instance method whose owner must be constructed first
    UnboundMethod { type_name: TypeName, method: String },
    /// A type's constructor
    Constructor(TypeName),
    /// A bare function value
    Closure(Callable),
}

impl InvocableDescriptor {
    /// Normalize a pseudo-callable into a descriptor.
    ///
    /// Registered free functions take precedence over the `Type::method`
    /// reading, so function identifiers may themselves contain `::`. The
    /// method part of a reference is split at the last `::`.
    ///
    /// # Errors
    ///
    /// `InvalidFactorySpec` when the string has neither form or when the
    /// referenced function, type, method or constructor is not registered.
    pub fn normalize(spec: FactorySpec, registry: &TypeRegistry) -> Result<Self> {
        match spec {
            FactorySpec::Path(path) => {
                let path = path.trim();
                if registry.function(path).is_some() {
                    return Ok(InvocableDescriptor::FreeFunction(path.to_string()));
                }
                let (type_name, method) = parse_method_path(path)?;
                Self::from_pair(type_name, method, registry)
            }
            FactorySpec::Method(type_name, method) => Self::from_pair(type_name, &method, registry),
            FactorySpec::Bound(instance, method) => {
                let info = registry
                    .method(instance.type_name().as_str(), &method)
                    .ok_or_else(|| {
                        Error::InvalidFactorySpec(format!(
                            "type `{}` has no method `{method}`",
                            instance.type_name()
                        ))
                    })?;
                if info.is_static() {
                    Ok(InvocableDescriptor::StaticMethod {
                        type_name: instance.type_name().clone(),
                        method,
                    })
                } else {
                    Ok(InvocableDescriptor::BoundMethod { instance, method })
                }
            }
            FactorySpec::Closure(callable) => Ok(InvocableDescriptor::Closure(callable)),
        }
    }

    fn from_pair(type_name: TypeName, method: &str, registry: &TypeRegistry) -> Result<Self> {
        let info = registry.type_info(type_name.as_str()).ok_or_else(|| {
            Error::InvalidFactorySpec(format!("unknown type `{type_name}`"))
        })?;

        if method == CONSTRUCTOR {
            if info.constructor().is_none() {
                return Err(Error::InvalidFactorySpec(format!(
                    "type `{type_name}` has no constructor"
                )));
            }
            return Ok(InvocableDescriptor::Constructor(type_name));
        }

        let method_info = info.method(method).ok_or_else(|| {
            Error::InvalidFactorySpec(format!("type `{type_name}` has no method `{method}`"))
        })?;
        let method = method.to_string();
        if method_info.is_static() {
            Ok(InvocableDescriptor::StaticMethod { type_name, method })
        } else {
            Ok(InvocableDescriptor::UnboundMethod { type_name, method })
        }
    }

    /// The type that declares this callable, if any.
    #[must_use]
    pub fn declaring_type(&self) -> Option<&TypeName> {
        match self {
            InvocableDescriptor::StaticMethod { type_name, .. }
            | InvocableDescriptor::UnboundMethod { type_name, .. }
            | InvocableDescriptor::Constructor(type_name) => Some(type_name),
            InvocableDescriptor::BoundMethod { instance, .. } => Some(instance.type_name()),
            InvocableDescriptor::FreeFunction(_) | InvocableDescriptor::Closure(_) => None,
        }
    }

    /// Formal parameters and declared return type of the target.
    ///
    /// # Errors
    ///
    /// `InvalidFactorySpec` when the target is no longer registered.
    pub fn signature<'a>(&'a self, registry: &'a TypeRegistry) -> Result<&'a Signature> {
        let signature = match self {
            InvocableDescriptor::FreeFunction(name) => {
                registry.function(name).map(Callable::signature)
            }
            InvocableDescriptor::StaticMethod { type_name, method }
            | InvocableDescriptor::UnboundMethod { type_name, method } => registry
                .method(type_name.as_str(), method)
                .map(|m| m.signature()),
            InvocableDescriptor::BoundMethod { instance, method } => registry
                .method(instance.type_name().as_str(), method)
                .map(|m| m.signature()),
            InvocableDescriptor::Constructor(type_name) => registry
                .constructor(type_name.as_str())
                .map(|c| c.signature()),
            InvocableDescriptor::Closure(callable) => Some(callable.signature()),
        };
        signature.ok_or_else(|| Error::InvalidFactorySpec(format!("`{self}` is not registered")))
    }

    /// Resolve the type this callable returns; `None` means unknown.
    ///
    /// A "self" return type resolves to the declaring type for methods and
    /// constructors, to the [`TypeName::INVOCABLE`] marker for a bare function
    /// value, and to unknown for a free function. A constructor always
    /// returns its declaring type.
    ///
    /// # Errors
    ///
    /// `InvalidFactorySpec` when the target is not registered.
    pub fn return_type(&self, registry: &TypeRegistry) -> Result<Option<TypeName>> {
        let declared = self.signature(registry)?.return_type();
        let resolved = match (self, declared) {
            (InvocableDescriptor::Constructor(type_name), _) => Some(type_name.clone()),
            (_, ReturnType::Unknown) => None,
            (_, ReturnType::Named(name)) => Some(name.clone()),
            (InvocableDescriptor::Closure(_), ReturnType::SelfType) => {
                Some(TypeName::new(TypeName::INVOCABLE))
            }
            (_, ReturnType::SelfType) => self.declaring_type().cloned(),
        };
        Ok(resolved)
    }
}

impl fmt::Display for InvocableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocableDescriptor::FreeFunction(name) => write!(f, "{name}"),
            InvocableDescriptor::StaticMethod { type_name, method }
            | InvocableDescriptor::UnboundMethod { type_name, method } => {
                write!(f, "{type_name}::{method}")
            }
            InvocableDescriptor::BoundMethod { instance, method } => {
                write!(f, "{}::{method} (bound)", instance.type_name())
            }
            InvocableDescriptor::Constructor(type_name) => write!(f, "{type_name}::{CONSTRUCTOR}"),
            InvocableDescriptor::Closure(_) => write!(f, "{{closure}}"),
        }
    }
}

/// Split `Type::method` (optionally `Type::method()`) into its halves.
fn parse_method_path(path: &str) -> Result<(TypeName, &str)> {
    let Some((type_name, method)) = path.rsplit_once("::") else {
        return Err(Error::InvalidFactorySpec(format!(
            "`{path}` is neither a registered function nor a `Type::method` reference"
        )));
    };
    let method = method.strip_suffix("()").unwrap_or(method);
    if type_name.is_empty() || method.is_empty() {
        return Err(Error::InvalidFactorySpec(format!(
            "`{path}` is not a valid `Type::method` reference"
        )));
    }
    Ok((TypeName::new(type_name), method))
}
