#![allow(dead_code)]

pub mod fixtures {
    use http::Method;
    use resapi::config::ApiConfig;
    use resapi::reflect::{
        Manufacturable, ParameterSpec, Resource, ReturnType, Routable, TypeBuilder, TypeRegistry,
    };
    use resapi::resolver::Container;
    use resapi::router::{Route, RouteDeclaration};
    use resapi::server::{Request, Response};
    use resapi::value::Value;
    use resapi::{Api, Error, FactorySpec, HttpError};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;

    /// Shared service handed to constructors through the container.
    #[derive(Debug, Clone, Serialize)]
    pub struct Catalog {
        pub name: String,
    }

    impl Resource for Catalog {
        const NAME: &'static str = "Catalog";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| {
                Ok(Catalog {
                    name: "default".to_string(),
                })
            });
        }
    }

    /// Request body for `POST /items`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct NewItem {
        pub name: String,
        #[serde(default)]
        pub price: f64,
    }

    impl Resource for NewItem {
        const NAME: &'static str = "NewItem";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.decodable();
        }
    }

    #[derive(Debug, Serialize)]
    pub struct Item {
        pub catalog: String,
    }

    impl Routable for Item {
        fn routes() -> Vec<RouteDeclaration> {
            vec![
                Route::new(Method::GET, "/items/{id}").action("show").into(),
                Route::new(Method::POST, "/items").action("create").status(201).into(),
                Route::new(Method::GET, "/items/{id}/price").action("price").into(),
                Route::new(Method::DELETE, "/items/{id}").action("remove").into(),
                Route::new(Method::GET, "/items/{id}/echo").action("echo").into(),
                Route::new(Method::GET, "/items/{id}/fail").action("fail").into(),
                Route::new(Method::GET, "/items/{id}/accepted").action("accept").into(),
                json!({"method": ["PUT", "PATCH"], "path": "/items/{id}", "action": "rename"}).into(),
            ]
        }
    }

    impl Resource for Item {
        const NAME: &'static str = "Item";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![ParameterSpec::typed("catalog", "Catalog").nullable()], |args| {
                let catalog = args
                    .get(0)?
                    .downcast_ref::<Catalog>()
                    .map_or_else(|| "none".to_string(), |c| c.name.clone());
                Ok(Item { catalog })
            })
            .method(
                "show",
                vec![ParameterSpec::typed("id", "int")],
                ReturnType::named("json"),
                |this, args| {
                    let id: i64 = args.json(0)?;
                    Value::json(json!({ "id": id, "name": format!("item-{id}"), "catalog": this.catalog }))
                },
            )
            .method(
                "create",
                vec![ParameterSpec::typed("payload", "NewItem")],
                ReturnType::named("json"),
                |_, args| {
                    let new_item = args.object::<NewItem>(0)?;
                    Value::json(json!({ "name": new_item.name, "price": new_item.price }))
                },
            )
            .method(
                "price",
                vec![
                    ParameterSpec::typed("id", "int"),
                    ParameterSpec::typed("currency", "string").with_default("EUR"),
                ],
                ReturnType::named("json"),
                |_, args| {
                    let id: i64 = args.json(0)?;
                    let currency: String = args.json(1)?;
                    Value::json(json!({ "id": id, "amount": id * 100, "currency": currency }))
                },
            )
            .method(
                "remove",
                vec![ParameterSpec::typed("id", "int")],
                ReturnType::Unknown,
                |_, args| {
                    let id: i64 = args.json(0)?;
                    if id == 1 {
                        return Err(HttpError::new(409, "item 1 is locked")
                            .with_header("retry-after", "30")
                            .into());
                    }
                    Ok(Value::Null)
                },
            )
            .method(
                "echo",
                vec![ParameterSpec::typed("request", "Request")],
                ReturnType::named("json"),
                |_, args| {
                    let request = args.request(0)?;
                    Value::json(json!({
                        "path": request.path(),
                        "id": request.path_param("id"),
                        "route": request.route().map(|r| r.path().to_string()),
                    }))
                },
            )
            .method("fail", vec![], ReturnType::Unknown, |_, _| {
                Err(anyhow::anyhow!("connection string postgres://secret@db leaked"))
            })
            .method("accept", vec![], ReturnType::Unknown, |_, _| {
                Ok(Value::Response(
                    Response::json(202, json!({ "queued": true })).with_header("location", "/jobs/7"),
                ))
            })
            .method(
                "rename",
                vec![
                    ParameterSpec::typed("id", "int"),
                    ParameterSpec::typed("payload", "json"),
                ],
                ReturnType::named("json"),
                |_, args| {
                    let id: i64 = args.json(0)?;
                    let payload: serde_json::Value = args.json(1)?;
                    let name = payload
                        .get("name")
                        .and_then(serde_json::Value::as_str)
                        .filter(|n| !n.is_empty())
                        .ok_or_else(|| Error::InvalidArgument("name must be a non-empty string".into()))?;
                    Value::json(json!({ "id": id, "name": name }))
                },
            )
            .routable();
        }
    }

    /// Built through its self-factory; the resource itself is the payload.
    #[derive(Debug, Serialize)]
    pub struct Counter {
        pub value: i64,
        pub source: &'static str,
    }

    impl Manufacturable for Counter {
        fn factory() -> FactorySpec {
            FactorySpec::path("Counter::starting_at()")
        }
    }

    impl Routable for Counter {
        fn routes() -> Vec<RouteDeclaration> {
            vec![
                Route::new(Method::GET, "/counter").into(),
                Route::new(Method::POST, "/counter/increment").action("increment").into(),
            ]
        }
    }

    impl Resource for Counter {
        const NAME: &'static str = "Counter";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| {
                Ok(Counter {
                    value: 0,
                    source: "constructor",
                })
            })
            .static_factory(
                "starting_at",
                vec![ParameterSpec::typed("start", "int").with_default(10)],
                |args| {
                    Ok(Counter {
                        value: args.json(0)?,
                        source: "factory",
                    })
                },
            )
            .method(
                "increment",
                vec![ParameterSpec::typed("by", "int").with_default(1)],
                ReturnType::named("json"),
                |this, args| {
                    let by: i64 = args.json(0)?;
                    Value::json(json!({ "value": this.value + by, "source": this.source }))
                },
            )
            .manufacturable()
            .routable();
        }
    }

    /// Its factory names a type nobody registered.
    #[derive(Debug, Serialize)]
    pub struct Ghost;

    impl Manufacturable for Ghost {
        fn factory() -> FactorySpec {
            FactorySpec::path("Phantom::summon")
        }
    }

    impl Routable for Ghost {
        fn routes() -> Vec<RouteDeclaration> {
            vec![Route::new(Method::GET, "/ghosts").into()]
        }
    }

    impl Resource for Ghost {
        const NAME: &'static str = "Ghost";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| Ok(Ghost))
                .manufacturable()
                .routable();
        }
    }

    /// Its constructor needs a value nothing can supply.
    #[derive(Debug, Serialize)]
    pub struct Vault;

    impl Routable for Vault {
        fn routes() -> Vec<RouteDeclaration> {
            vec![Route::new(Method::GET, "/vault").into()]
        }
    }

    impl Resource for Vault {
        const NAME: &'static str = "Vault";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![ParameterSpec::typed("combination", "string")], |_| Ok(Vault))
                .routable();
        }
    }

    /// Declares a path that overlaps `GET /items/{id}`.
    #[derive(Debug, Default, Serialize)]
    pub struct Special {
        pub special: bool,
    }

    impl Routable for Special {
        fn routes() -> Vec<RouteDeclaration> {
            vec![RouteDeclaration::Yaml("method: GET\npath: /items/special\n".to_string())]
        }
    }

    impl Resource for Special {
        const NAME: &'static str = "Special";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.constructor(vec![], |_| Ok(Special { special: true }))
                .routable();
        }
    }

    pub const ALL_RESOURCES: [&str; 5] = ["Item", "Counter", "Ghost", "Vault", "Special"];

    pub fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register::<Catalog>()
            .register::<NewItem>()
            .register::<Item>()
            .register::<Counter>()
            .register::<Ghost>()
            .register::<Vault>()
            .register::<Special>();
        registry
    }

    pub fn container() -> Container {
        let mut container = Container::new();
        container.insert_resource(Catalog {
            name: "spring".to_string(),
        });
        container
    }

    pub fn api_with(resources: &[&str], config: ApiConfig) -> Api {
        Api::new(
            Arc::new(registry()),
            resources.iter().copied(),
            Arc::new(container()),
            config,
        )
        .expect("fixture api builds")
    }

    pub fn api() -> Api {
        api_with(&ALL_RESOURCES, ApiConfig::default())
    }

    pub fn get(path: &str) -> Request {
        Request::new(Method::GET, path)
    }
}
