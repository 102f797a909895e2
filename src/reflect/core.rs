use crate::factory::FactorySpec;
use crate::router::RouteDeclaration;
use crate::value::{Arguments, Instance, Object, TypeName, Value};
use serde::de::DeserializeOwned;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Method name that denotes a type's constructor in `Type::method` strings.
pub const CONSTRUCTOR: &str = "new";

/// Body of a free function, static method or bare function value.
pub type FunctionBody = Arc<dyn Fn(Arguments) -> anyhow::Result<Value> + Send + Sync>;
/// Body of an instance method; receives the owning instance.
pub type MethodBody = Arc<dyn Fn(&Object, Arguments) -> anyhow::Result<Value> + Send + Sync>;
/// Body of a constructor.
pub type ConstructorBody = Arc<dyn Fn(Arguments) -> anyhow::Result<Object> + Send + Sync>;
/// Decodes a raw request body into an instance of a registered type.
pub type BodyDecoder = Arc<dyn Fn(&[u8]) -> anyhow::Result<Object> + Send + Sync>;

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

/// Declared return type of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReturnType {
    /// No statically declared return type
    #[default]
    Unknown,
    /// "An instance of whatever type declares me"
    SelfType,
    /// A concrete named type
    Named(TypeName),
}

impl ReturnType {
    #[must_use]
    pub fn named(name: &str) -> Self {
        ReturnType::Named(TypeName::new(name))
    }
}

/// One formal parameter of a callable.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    declared_type: Option<TypeName>,
    nullable: bool,
    default: Option<Value>,
    position: usize,
}

impl ParameterSpec {
    /// An untyped parameter.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            declared_type: None,
            nullable: false,
            default: None,
            position: 0,
        }
    }

    /// A parameter with a declared type.
    #[must_use]
    pub fn typed(name: &str, declared_type: &str) -> Self {
        Self {
            declared_type: Some(TypeName::new(declared_type)),
            ..Self::new(name)
        }
    }

    /// Accept an absent value.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declared_type(&self) -> Option<&TypeName> {
        self.declared_type.as_ref()
    }

    /// Whether the declared type is exactly `name`.
    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        self.declared_type.as_ref().is_some_and(|t| t.is(name))
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Zero-based declaration position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Parameter list plus declared return type.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    parameters: Vec<ParameterSpec>,
    return_type: ReturnType,
}

impl Signature {
    /// Build a signature; positions follow the order of `parameters`.
    #[must_use]
    pub fn new(parameters: Vec<ParameterSpec>, return_type: ReturnType) -> Self {
        let parameters = parameters
            .into_iter()
            .enumerate()
            .map(|(position, mut p)| {
                p.position = position;
                p
            })
            .collect();
        Self {
            parameters,
            return_type,
        }
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    #[must_use]
    pub fn return_type(&self) -> &ReturnType {
        &self.return_type
    }
}

/// A function value: either a registered free function or a bare closure
/// passed directly as a factory.
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    body: FunctionBody,
}

impl Callable {
    pub fn new<F>(parameters: Vec<ParameterSpec>, return_type: ReturnType, body: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(parameters, return_type),
            body: Arc::new(body),
        }
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call(&self, args: Arguments) -> anyhow::Result<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Static vs instance method body.
#[derive(Clone)]
pub enum MethodKind {
    Static(FunctionBody),
    Instance(MethodBody),
}

/// A method declared by a registered type.
#[derive(Clone)]
pub struct MethodInfo {
    name: String,
    declaring_type: TypeName,
    signature: Signature,
    kind: MethodKind,
}

impl MethodInfo {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declaring_type(&self) -> &TypeName {
        &self.declaring_type
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.kind, MethodKind::Static(_))
    }

    #[must_use]
    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("static", &self.is_static())
            .field("signature", &self.signature)
            .finish()
    }
}

/// The constructor of a registered type.
#[derive(Clone)]
pub struct ConstructorInfo {
    declaring_type: TypeName,
    signature: Signature,
    body: ConstructorBody,
}

impl ConstructorInfo {
    #[must_use]
    pub fn declaring_type(&self) -> &TypeName {
        &self.declaring_type
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn construct(&self, args: Arguments) -> anyhow::Result<Object> {
        (self.body)(args)
    }
}

/// Everything the registry knows about one type.
pub struct TypeInfo {
    name: TypeName,
    constructor: Option<ConstructorInfo>,
    methods: HashMap<String, MethodInfo>,
    factory: Option<fn() -> FactorySpec>,
    routes: Option<fn() -> Vec<RouteDeclaration>>,
    decoder: Option<BodyDecoder>,
}

impl TypeInfo {
    fn new(name: TypeName) -> Self {
        Self {
            name,
            constructor: None,
            methods: HashMap::new(),
            factory: None,
            routes: None,
            decoder: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    #[must_use]
    pub fn constructor(&self) -> Option<&ConstructorInfo> {
        self.constructor.as_ref()
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }

    /// The type's self-factory, if it is [`Manufacturable`].
    #[must_use]
    pub fn factory(&self) -> Option<FactorySpec> {
        self.factory.map(|f| f())
    }

    /// The type's route declarations, if it is [`Routable`].
    #[must_use]
    pub fn routes(&self) -> Option<Vec<RouteDeclaration>> {
        self.routes.map(|f| f())
    }

    #[must_use]
    pub fn is_manufacturable(&self) -> bool {
        self.factory.is_some()
    }

    #[must_use]
    pub fn is_routable(&self) -> bool {
        self.routes.is_some()
    }

    #[must_use]
    pub fn decoder(&self) -> Option<&BodyDecoder> {
        self.decoder.as_ref()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .field("methods", &methods)
            .field("manufacturable", &self.is_manufacturable())
            .field("routable", &self.is_routable())
            .field("decodable", &self.decoder.is_some())
            .finish()
    }
}

/// A Rust type that can be registered, constructed and invoked by name.
pub trait Resource: Instance + Sized {
    /// Registry name of the type.
    const NAME: &'static str;

    /// Declare constructor, methods and capabilities.
    fn describe(ty: &mut TypeBuilder<Self>);
}

/// A type that knows its own routes.
pub trait Routable {
    fn routes() -> Vec<RouteDeclaration>;
}

/// A type that declares its own construction strategy instead of relying on
/// its constructor.
pub trait Manufacturable {
    fn factory() -> FactorySpec;
}

impl Object {
    /// Wrap a registered resource value.
    #[must_use]
    pub fn of<T: Resource>(value: T) -> Self {
        Object::new(T::NAME, value)
    }
}

fn downcast<'a, T: 'static>(obj: &'a Object, method: &str) -> anyhow::Result<&'a T> {
    obj.downcast_ref::<T>().ok_or_else(|| {
        anyhow::anyhow!(
            "method `{method}` invoked on a {} instance",
            obj.type_name()
        )
    })
}

/// Collects the description of one [`Resource`] type.
pub struct TypeBuilder<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> TypeBuilder<T> {
    fn new() -> Self {
        Self {
            info: TypeInfo::new(TypeName::new(T::NAME)),
            _marker: PhantomData,
        }
    }

    /// Register the constructor.
    pub fn constructor<F>(&mut self, parameters: Vec<ParameterSpec>, body: F) -> &mut Self
    where
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.info.constructor = Some(ConstructorInfo {
            declaring_type: self.info.name.clone(),
            signature: Signature::new(parameters, ReturnType::SelfType),
            body: Arc::new(move |args| body(args).map(Object::of)),
        });
        self
    }

    /// Register a parameterless constructor backed by [`Default`].
    pub fn default_constructor(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }

    /// Register an instance method.
    pub fn method<F>(
        &mut self,
        name: &str,
        parameters: Vec<ParameterSpec>,
        return_type: ReturnType,
        body: F,
    ) -> &mut Self
    where
        F: Fn(&T, Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let method_name = name.to_string();
        let kind = MethodKind::Instance(Arc::new(move |obj: &Object, args: Arguments| {
            body(downcast::<T>(obj, &method_name)?, args)
        }));
        self.insert_method(name, parameters, return_type, kind)
    }

    /// Register a static method.
    pub fn static_method<F>(
        &mut self,
        name: &str,
        parameters: Vec<ParameterSpec>,
        return_type: ReturnType,
        body: F,
    ) -> &mut Self
    where
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.insert_method(name, parameters, return_type, MethodKind::Static(Arc::new(body)))
    }

    /// Register a static method returning a new instance of the type itself.
    pub fn static_factory<F>(
        &mut self,
        name: &str,
        parameters: Vec<ParameterSpec>,
        body: F,
    ) -> &mut Self
    where
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.static_method(name, parameters, ReturnType::SelfType, move |args| {
            body(args).map(|v| Value::Object(Object::of(v)))
        })
    }

    /// Record the [`Routable`] capability.
    pub fn routable(&mut self) -> &mut Self
    where
        T: Routable,
    {
        self.info.routes = Some(T::routes as fn() -> Vec<RouteDeclaration>);
        self
    }

    /// Record the [`Manufacturable`] capability.
    pub fn manufacturable(&mut self) -> &mut Self
    where
        T: Manufacturable,
    {
        self.info.factory = Some(T::factory as fn() -> FactorySpec);
        self
    }

    /// Allow request bodies to be decoded (as JSON) into this type.
    pub fn decodable(&mut self) -> &mut Self
    where
        T: DeserializeOwned,
    {
        self.info.decoder = Some(Arc::new(|body: &[u8]| {
            let value: T = serde_json::from_slice(body)?;
            Ok(Object::of(value))
        }));
        self
    }

    fn insert_method(
        &mut self,
        name: &str,
        parameters: Vec<ParameterSpec>,
        return_type: ReturnType,
        kind: MethodKind,
    ) -> &mut Self {
        if name == CONSTRUCTOR {
            warn!(
                type_name = %self.info.name,
                "Method named `{CONSTRUCTOR}` is shadowed by the constructor"
            );
        }
        let method = MethodInfo {
            name: name.to_string(),
            declaring_type: self.info.name.clone(),
            signature: Signature::new(parameters, return_type),
            kind,
        };
        self.info.methods.insert(name.to_string(), method);
        self
    }
}

/// Registry of every type and free function the dispatch core may construct
/// or invoke.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<TypeName, TypeInfo>,
    functions: HashMap<String, Callable>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type.
    ///
    /// Registering the same name twice replaces the earlier description.
    pub fn register<T: Resource>(&mut self) -> &mut Self {
        let mut builder = TypeBuilder::<T>::new();
        T::describe(&mut builder);
        let info = builder.info;

        debug!(
            type_name = %info.name,
            methods = info.methods.len(),
            routable = info.is_routable(),
            manufacturable = info.is_manufacturable(),
            "Type registered"
        );

        if let Some(old) = self.types.insert(info.name.clone(), info) {
            warn!(type_name = %old.name, "Replaced existing type registration");
        }
        self
    }

    /// Register a free function.
    pub fn register_function<F>(
        &mut self,
        name: &str,
        parameters: Vec<ParameterSpec>,
        return_type: ReturnType,
        body: F,
    ) -> &mut Self
    where
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let callable = Callable::new(parameters, return_type, body);
        if self.functions.insert(name.to_string(), callable).is_some() {
            warn!(function = %name, "Replaced existing function registration");
        }
        self
    }

    #[must_use]
    pub fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    #[must_use]
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    #[must_use]
    pub fn method(&self, type_name: &str, method: &str) -> Option<&MethodInfo> {
        self.type_info(type_name).and_then(|t| t.method(method))
    }

    #[must_use]
    pub fn constructor(&self, type_name: &str) -> Option<&ConstructorInfo> {
        self.type_info(type_name).and_then(TypeInfo::constructor)
    }

    /// Decoder for request bodies targeting `type_name`.
    #[must_use]
    pub fn decoder(&self, type_name: &str) -> Option<&BodyDecoder> {
        self.type_info(type_name).and_then(TypeInfo::decoder)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        functions.sort_unstable();
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("functions", &functions)
            .finish()
    }
}
