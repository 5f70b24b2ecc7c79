//! Integration tests for function descriptor extraction.

use serde_json::{json, Value};
use openapi_functions::{ConvertError, OpenApiConverter, ResolveError, ValidationError};

fn convert(spec: Value) -> Vec<openapi_functions::FunctionDescriptor> {
    OpenApiConverter::new(spec).unwrap().convert().unwrap()
}

fn info() -> Value {
    json!({"title": "Test API", "version": "1.0.0"})
}

// === Validation Tests ===

mod validation {
    use super::*;

    #[test]
    fn missing_paths_is_rejected() {
        let spec = json!({"openapi": "3.0.0", "info": info()});
        assert!(matches!(
            OpenApiConverter::new(spec),
            Err(ValidationError::MissingField { field }) if field == "paths"
        ));
    }

    #[test]
    fn swagger_2_is_rejected() {
        let spec = json!({"openapi": "2.0", "info": info(), "paths": {}});
        assert!(matches!(
            OpenApiConverter::new(spec),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn yaml_text_is_accepted() {
        let yaml = "\
openapi: 3.0.0
info:
  title: Test API
  version: 1.0.0
paths:
  /test:
    get:
      summary: Test endpoint
";
        let functions = OpenApiConverter::from_str(yaml).unwrap().convert().unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "GET_TEST");
        assert_eq!(functions[0].description, "Test endpoint");
    }

    #[test]
    fn unparseable_text_is_rejected() {
        let result = OpenApiConverter::from_str("{ not: [valid");
        assert!(matches!(result, Err(ValidationError::Parse { .. })));
    }

    #[test]
    fn scalar_document_is_rejected() {
        let result = OpenApiConverter::from_str("just some words");
        assert!(matches!(result, Err(ValidationError::NotAMapping { .. })));
    }

    #[test]
    fn spec_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("openapi.json");
        std::fs::write(
            &path,
            r#"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"}, "paths": {"/ping": {"get": {}}}}"#,
        )
        .unwrap();

        let functions = OpenApiConverter::from_path(&path).unwrap().convert().unwrap();
        assert_eq!(functions[0].name, "GET_PING");
    }
}

// === Descriptor Shape Tests ===

mod descriptors {
    use super::*;

    fn weather_spec() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/weather/{city}": {
                    "get": {
                        "description": "Get weather information",
                        "parameters": [
                            {
                                "name": "city",
                                "in": "path",
                                "required": true,
                                "description": "The city to get weather for",
                                "schema": {"type": "string"}
                            },
                            {
                                "name": "units",
                                "in": "query",
                                "required": false,
                                "description": "The unit system to use",
                                "schema": {"type": "string", "enum": ["metric", "imperial"]}
                            }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn weather_operation() {
        let functions = convert(weather_spec());
        assert_eq!(functions.len(), 1);

        let function = &functions[0];
        assert_eq!(function.name, "GET_WEATHER_CITY");
        assert_eq!(function.method, "GET");
        assert_eq!(function.url, "/weather/{city}");
        assert_eq!(function.description, "Get weather information");
        assert!(!function.strict);

        let path_schema = function.path_schema.as_ref().unwrap();
        assert_eq!(path_schema.properties["city"]["isRequired"], true);
        assert_eq!(
            path_schema.properties["city"]["description"],
            "The city to get weather for"
        );
        assert_eq!(path_schema.required, vec!["city".to_string()]);

        let query_schema = function.query_schema.as_ref().unwrap();
        assert!(query_schema.required.is_empty());
        assert_eq!(
            query_schema.properties["units"]["enum"],
            json!(["metric", "imperial"])
        );
        assert_eq!(query_schema.properties["units"]["isRequired"], false);

        assert!(function.body_schema.is_none());
        assert!(function.auth_schema.is_none());
    }

    #[test]
    fn descriptor_json_shape() {
        let functions = convert(weather_spec());
        let value = serde_json::to_value(&functions[0]).unwrap();

        assert_eq!(value["path_schema"]["type"], "object");
        assert_eq!(value["path_schema"]["additionalProperties"], false);
        assert_eq!(value["path_schema"]["isRequired"], true);
        assert_eq!(value["body_schema"], Value::Null);
        assert_eq!(value["strict"], false);
    }

    #[test]
    fn empty_operation_has_no_schemas() {
        let spec = json!({
            "openapi": "3.1.0",
            "info": info(),
            "paths": {"/health": {"get": {}}}
        });
        let function = &convert(spec)[0];
        assert!(function.query_schema.is_none());
        assert!(function.path_schema.is_none());
        assert!(function.body_schema.is_none());
        assert!(function.auth_schema.is_none());
        assert_eq!(function.description, "");
    }

    #[test]
    fn server_url_prefixes_path() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "servers": [{"url": "https://api.example.com/v1"}, {"url": "https://other"}],
            "paths": {"/test": {"get": {"description": "Test endpoint"}}}
        });
        let function = &convert(spec)[0];
        assert_eq!(function.name, "GET_TEST");
        assert_eq!(function.url, "https://api.example.com/v1/test");
    }

    #[test]
    fn summary_fallback() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/test1": {"get": {"description": "Test endpoint with description"}},
                "/test2": {"get": {"summary": "Test endpoint with summary only"}},
                "/test3": {
                    "get": {
                        "description": "Test endpoint with both",
                        "summary": "This summary should not be used"
                    }
                },
                "/test4": {"get": {}}
            }
        });
        let functions = convert(spec);
        assert_eq!(functions.len(), 4);

        let by_name = |name: &str| functions.iter().find(|f| f.name == name).unwrap();
        assert_eq!(by_name("GET_TEST1").description, "Test endpoint with description");
        assert_eq!(by_name("GET_TEST2").description, "Test endpoint with summary only");
        assert_eq!(by_name("GET_TEST3").description, "Test endpoint with both");
        assert_eq!(by_name("GET_TEST4").description, "");
    }

    #[test]
    fn operations_keep_document_order() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/users": {"post": {}, "get": {}},
                "/users/{id}": {"delete": {}, "patch": {}, "put": {}, "head": {}}
            }
        });
        let names: Vec<String> = convert(spec).into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "POST_USERS",
                "GET_USERS",
                "DELETE_USERS_ID",
                "PATCH_USERS_ID",
                "PUT_USERS_ID"
            ]
        );
    }

    #[test]
    fn colliding_names_are_not_rejected() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/a-b": {"get": {}},
                "/a/b": {"get": {}}
            }
        });
        let functions = convert(spec);
        assert_eq!(functions[0].name, "GET_A_B");
        assert_eq!(functions[1].name, "GET_A_B");
    }
}

// === Request Body Tests ===

mod request_body {
    use super::*;

    #[test]
    fn inline_body_schema() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/user": {
                    "post": {
                        "description": "Create user",
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "required": ["name"],
                                        "properties": {
                                            "name": {"type": "string", "description": "The user's name"},
                                            "age": {"type": "integer", "description": "The user's age"}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let function = &convert(spec)[0];
        assert_eq!(function.name, "POST_USER");
        assert_eq!(function.method, "POST");

        let body = function.body_schema.as_ref().unwrap();
        assert_eq!(body.schema_type, "object");
        assert!(body.is_required);
        assert_eq!(body.properties["name"]["type"], "string");
        assert_eq!(body.properties["name"]["description"], "The user's name");
        assert_eq!(body.required, vec!["name".to_string()]);
    }

    #[test]
    fn nullable_properties() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/user": {
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "name": {"type": "string"},
                                            "age": {"type": "integer", "nullable": true},
                                            "email": {
                                                "anyOf": [
                                                    {"type": "string", "format": "email"},
                                                    {"type": "null"}
                                                ]
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let body = convert(spec)[0].body_schema.clone().unwrap();

        assert_eq!(body.properties["age"]["type"], "integer");
        assert_eq!(body.properties["age"]["nullable"], true);

        assert_eq!(
            body.properties["email"],
            json!({"type": "string", "format": "email", "nullable": true})
        );
    }

    #[test]
    fn schema_references() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/users": {
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/User"}
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "role": {"$ref": "#/components/schemas/Role"}
                        },
                        "required": ["name", "role"]
                    },
                    "Role": {"type": "string", "enum": ["admin", "user"]}
                }
            }
        });
        let function = &convert(spec)[0];
        assert_eq!(function.name, "POST_USERS");

        let body = function.body_schema.as_ref().unwrap();
        assert_eq!(body.properties["name"]["type"], "string");
        assert_eq!(body.properties["role"]["type"], "string");
        assert_eq!(body.properties["role"]["enum"], json!(["admin", "user"]));
        assert_eq!(body.required, vec!["name".to_string(), "role".to_string()]);
    }

    #[test]
    fn invalid_body_reference_fails() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/test": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/NonExistent"}
                                }
                            }
                        }
                    }
                }
            }
        });
        let err = OpenApiConverter::new(spec).unwrap().convert().unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Resolve(ResolveError::PointerNotFound { .. })
        ));
        assert!(err.to_string().contains("could not resolve reference"));
    }

    #[test]
    fn invalid_nested_reference_is_absorbed() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/test": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "owner": {"$ref": "#/components/schemas/Missing"}
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
        let body = convert(spec)[0].body_schema.clone().unwrap();
        assert_eq!(body.properties["owner"]["type"], "object");
        assert_eq!(
            body.properties["owner"]["description"],
            "Failed to resolve reference: #/components/schemas/Missing"
        );
    }

    #[test]
    fn circular_references() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/recursive": {
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Node"}
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Node": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "children": {
                                "type": "array",
                                "items": {"$ref": "#/components/schemas/Node"}
                            }
                        }
                    }
                }
            }
        });
        let function = &convert(spec)[0];
        assert_eq!(function.name, "POST_RECURSIVE");

        let body = function.body_schema.as_ref().unwrap();
        assert_eq!(body.properties["id"]["type"], "string");

        // The body's own reference is followed directly, so Node is expanded
        // once more inside `children` before the cycle is cut.
        let children = &body.properties["children"];
        assert_eq!(children["type"], "array");
        assert_eq!(children["items"]["type"], "object");

        let nested = &children["items"]["properties"]["children"]["items"];
        assert_eq!(nested["type"], "object");
        assert_eq!(
            nested["description"],
            "Circular reference to #/components/schemas/Node"
        );
        assert_eq!(nested["title"], "#/components/schemas/Node");
    }

    #[test]
    fn nested_references() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {
                "/order": {
                    "post": {
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/Order"}
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Order": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "customer": {"$ref": "#/components/schemas/Customer"},
                            "items": {
                                "type": "array",
                                "items": {"$ref": "#/components/schemas/OrderItem"}
                            }
                        }
                    },
                    "Customer": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "address": {"$ref": "#/components/schemas/Address"}
                        }
                    },
                    "Address": {
                        "type": "object",
                        "properties": {
                            "street": {"type": "string"},
                            "city": {"type": "string"}
                        }
                    },
                    "OrderItem": {
                        "type": "object",
                        "properties": {
                            "product": {"$ref": "#/components/schemas/Product"},
                            "quantity": {"type": "integer"}
                        }
                    },
                    "Product": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "category": {"$ref": "#/components/schemas/Category"}
                        }
                    },
                    "Category": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "parent": {"$ref": "#/components/schemas/Category"}
                        }
                    }
                }
            }
        });
        let body = convert(spec)[0].body_schema.clone().unwrap();

        let customer = &body.properties["customer"];
        assert_eq!(customer["type"], "object");
        assert_eq!(customer["properties"]["address"]["properties"]["street"]["type"], "string");

        let items = &body.properties["items"];
        assert_eq!(items["type"], "array");
        assert_eq!(items["items"]["type"], "object");

        let category = &items["items"]["properties"]["product"]["properties"]["category"];
        assert_eq!(category["properties"]["name"]["type"], "string");
        let parent = &category["properties"]["parent"];
        assert_eq!(
            parent["description"],
            "Circular reference to #/components/schemas/Category"
        );
    }

    #[test]
    fn output_contains_no_refs() {
        let spec = json!({
            "openapi": "3.1.0",
            "info": info(),
            "paths": {
                "/pets": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "pet": {
                                                "oneOf": [
                                                    {"$ref": "#/components/schemas/Cat"},
                                                    {"$ref": "#/components/schemas/Dog"}
                                                ]
                                            },
                                            "owner": {
                                                "anyOf": [
                                                    {"$ref": "#/components/schemas/Person"},
                                                    {"type": "null"}
                                                ]
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Cat": {"type": "object", "properties": {"lives": {"type": "integer"}}},
                    "Dog": {"type": "object", "properties": {"friend": {"$ref": "#/components/schemas/Dog"}}},
                    "Person": {"type": "object", "properties": {"pets": {"type": "array", "items": {"$ref": "#/components/schemas/Dog"}}}}
                }
            }
        });
        let functions = convert(spec);
        let rendered = serde_json::to_string(&functions).unwrap();
        assert!(!rendered.contains("$ref"));
    }
}

// === Auth Tests ===

mod security {
    use super::*;

    fn schemes() -> Value {
        json!({
            "securitySchemes": {
                "api_key": {
                    "type": "apiKey",
                    "name": "X-API-Key",
                    "in": "header",
                    "description": "API key for authentication"
                },
                "custom_header": {
                    "type": "apiKey",
                    "name": "Custom-Auth",
                    "in": "header",
                    "description": "Custom authentication header"
                }
            }
        })
    }

    #[test]
    fn operation_security() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "components": schemes(),
            "paths": {
                "/secure": {
                    "get": {"description": "Secure endpoint", "security": [{"api_key": []}]}
                },
                "/multi-auth": {
                    "post": {
                        "description": "Multi-auth endpoint",
                        "security": [{"api_key": [], "custom_header": []}]
                    }
                }
            }
        });
        let functions = convert(spec);
        assert_eq!(functions.len(), 2);

        let secure = functions.iter().find(|f| f.name == "GET_SECURE").unwrap();
        let auth = secure.auth_schema.as_ref().unwrap();
        assert_eq!(auth.properties["X-API-Key"]["type"], "string");
        assert_eq!(
            auth.properties["X-API-Key"]["description"],
            "API key for authentication"
        );
        assert!(auth.required.contains(&"X-API-Key".to_string()));
        assert!(auth.is_required);

        let multi = functions
            .iter()
            .find(|f| f.name == "POST_MULTI_AUTH")
            .unwrap();
        let auth = multi.auth_schema.as_ref().unwrap();
        assert!(auth.properties.contains_key("X-API-Key"));
        assert!(auth.properties.contains_key("Custom-Auth"));
        assert_eq!(
            auth.required,
            vec!["X-API-Key".to_string(), "Custom-Auth".to_string()]
        );
    }

    #[test]
    fn global_security_fallback() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "components": schemes(),
            "security": [{"custom_header": []}],
            "paths": {"/test": {"get": {}}}
        });
        let auth = convert(spec)[0].auth_schema.clone().unwrap();
        assert!(auth.properties.contains_key("Custom-Auth"));
    }

    #[test]
    fn undefined_scheme_is_ignored() {
        let spec = json!({
            "openapi": "3.0.0",
            "info": info(),
            "paths": {"/test": {"get": {"security": [{"ghost": []}]}}}
        });
        assert!(convert(spec)[0].auth_schema.is_none());
    }
}
