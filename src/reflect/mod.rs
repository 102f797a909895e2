//! # Reflect Module
//!
//! The bounded type-introspection capability the factory and resolver layers
//! rely on. Rust has no runtime reflection, so every type, method and free
//! function that may be constructed or invoked describes itself once, at
//! startup, into a [`TypeRegistry`]:
//!
//! - **parameters**: name, declared type, nullability, default, position
//! - **return type**: unknown, "self", or a named type
//! - **body**: the closure that actually performs the call
//! - **capabilities**: [`Routable`], [`Manufacturable`] and body decoding,
//!   recorded as type predicates when the type registers
//!
//! ## Example
//!
//! ```rust
//! use resapi::reflect::{ParameterSpec, Resource, ReturnType, TypeBuilder, TypeRegistry};
//! use resapi::value::Value;
//! use serde::Serialize;
//!
//! #[derive(Debug, Serialize)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! impl Resource for Greeter {
//!     const NAME: &'static str = "Greeter";
//!
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.constructor(vec![], |_| Ok(Greeter { greeting: "hello".into() }))
//!             .method(
//!                 "greet",
//!                 vec![ParameterSpec::typed("name", "string")],
//!                 ReturnType::named("string"),
//!                 |this, args| Ok(Value::from(format!("{} {}", this.greeting, args.json::<String>(0)?))),
//!             );
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register::<Greeter>();
//! assert!(registry.method("Greeter", "greet").is_some());
//! ```

mod core;

pub use self::core::{
    BodyDecoder, Callable, ConstructorBody, ConstructorInfo, FunctionBody, Manufacturable,
    MethodBody, MethodInfo, MethodKind, ParameterSpec, Resource, ReturnType, Routable, Signature,
    TypeBuilder, TypeInfo, TypeRegistry, CONSTRUCTOR,
};
