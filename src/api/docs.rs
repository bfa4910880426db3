//! API documentation: OpenAPI document at `/swagger.json`, Swagger UI at `/docs`.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, OnceLock};

use crate::state::AppState;

static OPENAPI_DOCUMENT: OnceLock<Value> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>FSRI Invoicing API - Docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@4.18.3/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@4.18.3/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({
        url: '/swagger.json',
        dom_id: '#swagger-ui',
        persistAuthorization: true,
      });
    };
  </script>
</body>
</html>
"#;

pub fn docs_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/swagger.json", get(swagger_json))
        .route("/docs", get(swagger_ui))
}

async fn swagger_json() -> impl IntoResponse {
    Json(openapi_document().clone())
}

async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

/// (path segment, tag, schema name)
const RESOURCES: &[(&str, &str, &str)] = &[
    ("identification-type", "Identification types", "IdentificationType"),
    ("issuing-company", "Issuing companies", "IssuingCompany"),
    ("client", "Clients", "Client"),
    ("product", "Products", "Product"),
    ("invoice", "Invoices", "Invoice"),
    ("invoice-detail", "Invoice details", "InvoiceDetail"),
];

pub fn openapi_document() -> &'static Value {
    OPENAPI_DOCUMENT.get_or_init(build_openapi_document)
}

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", name) })
}

fn json_body(schema: Value) -> Value {
    json!({ "required": true, "content": { "application/json": { "schema": schema } } })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({ "description": description, "content": { "application/json": { "schema": schema } } })
}

fn error_response(description: &str) -> Value {
    json_response(description, schema_ref("Error"))
}

fn id_parameter(name: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn pagination_parameters() -> Vec<Value> {
    vec![
        json!({ "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 1, "maximum": 100, "default": 50 } }),
        json!({ "name": "offset", "in": "query", "schema": { "type": "integer", "minimum": 0, "default": 0 } }),
    ]
}

fn resource_paths(segment: &str, tag: &str, schema: &str) -> (Value, Value) {
    let secured = json!([{ "bearerAuth": [] }]);
    let mut list_parameters = pagination_parameters();
    if segment == "invoice-detail" {
        list_parameters.push(json!({ "name": "invoice_id", "in": "query", "schema": { "type": "string", "format": "uuid" } }));
    }
    if segment == "invoice" {
        for filter in ["client_id", "issuing_company_id"] {
            list_parameters.push(json!({ "name": filter, "in": "query", "schema": { "type": "string", "format": "uuid" } }));
        }
        list_parameters.push(json!({ "name": "status", "in": "query", "schema": { "type": "string", "enum": ["draft", "issued", "cancelled"] } }));
    }

    let collection = json!({
        "get": {
            "tags": [tag],
            "summary": format!("List {}", tag.to_lowercase()),
            "security": secured,
            "parameters": list_parameters,
            "responses": {
                "200": json_response("Page of records", json!({
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "data": { "type": "array", "items": schema_ref(schema) },
                        "total": { "type": "integer" },
                        "limit": { "type": "integer" },
                        "offset": { "type": "integer" }
                    }
                })),
                "401": error_response("Missing or invalid token")
            }
        },
        "post": {
            "tags": [tag],
            "summary": format!("Create {}", schema),
            "security": secured,
            "requestBody": json_body(schema_ref(&format!("{}Input", schema))),
            "responses": {
                "201": json_response("Created", schema_ref(schema)),
                "400": error_response("Invalid payload or unknown reference"),
                "401": error_response("Missing or invalid token"),
                "409": error_response("Duplicate value or invoice not in draft")
            }
        }
    });

    let item = json!({
        "parameters": [id_parameter("id")],
        "get": {
            "tags": [tag],
            "summary": format!("Get {}", schema),
            "security": secured,
            "responses": {
                "200": json_response("Record", schema_ref(schema)),
                "401": error_response("Missing or invalid token"),
                "404": error_response("Not found")
            }
        },
        "put": {
            "tags": [tag],
            "summary": format!("Update {}", schema),
            "security": secured,
            "requestBody": json_body(schema_ref(&format!("{}Input", schema))),
            "responses": {
                "200": json_response("Updated record", schema_ref(schema)),
                "400": error_response("Invalid payload"),
                "401": error_response("Missing or invalid token"),
                "404": error_response("Not found"),
                "409": error_response("Conflict")
            }
        },
        "delete": {
            "tags": [tag],
            "summary": format!("Delete {}", schema),
            "security": secured,
            "responses": {
                "204": { "description": "Deleted" },
                "401": error_response("Missing or invalid token"),
                "404": error_response("Not found"),
                "409": error_response("Invoice not in draft")
            }
        }
    });

    (collection, item)
}

fn string_props(names: &[&str]) -> Map<String, Value> {
    names
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "string" })))
        .collect()
}

fn schemas() -> Value {
    let uuid = json!({ "type": "string", "format": "uuid" });
    let money = json!({ "type": "string", "example": "12.50" });
    let timestamp = json!({ "type": "string", "format": "date-time" });

    json!({
        "Error": {
            "type": "object",
            "properties": {
                "error": { "type": "string" },
                "message": { "type": "string" }
            }
        },
        "IdentificationTypeInput": {
            "type": "object",
            "required": ["code", "name"],
            "properties": string_props(&["code", "name", "description"])
        },
        "IdentificationType": {
            "allOf": [schema_ref("IdentificationTypeInput"), { "type": "object", "properties": {
                "id": uuid, "created_at": timestamp, "updated_at": timestamp
            }}]
        },
        "IssuingCompanyInput": {
            "type": "object",
            "required": ["ruc", "business_name", "main_address", "establishment_code", "emission_point"],
            "properties": {
                "ruc": { "type": "string", "pattern": "^[0-9]{13}$" },
                "business_name": { "type": "string" },
                "trade_name": { "type": "string" },
                "main_address": { "type": "string" },
                "establishment_code": { "type": "string", "pattern": "^[0-9]{3}$" },
                "emission_point": { "type": "string", "pattern": "^[0-9]{3}$" },
                "requires_accounting": { "type": "boolean" },
                "email": { "type": "string", "format": "email" },
                "phone": { "type": "string" }
            }
        },
        "IssuingCompany": {
            "allOf": [schema_ref("IssuingCompanyInput"), { "type": "object", "properties": {
                "id": uuid, "next_sequential": { "type": "integer" },
                "created_at": timestamp, "updated_at": timestamp
            }}]
        },
        "ClientInput": {
            "type": "object",
            "required": ["identification_type_id", "identification", "name"],
            "properties": {
                "identification_type_id": uuid,
                "identification": { "type": "string" },
                "name": { "type": "string" },
                "email": { "type": "string", "format": "email" },
                "phone": { "type": "string" },
                "address": { "type": "string" }
            }
        },
        "Client": {
            "allOf": [schema_ref("ClientInput"), { "type": "object", "properties": {
                "id": uuid, "created_at": timestamp, "updated_at": timestamp
            }}]
        },
        "ProductInput": {
            "type": "object",
            "required": ["code", "name", "unit_price", "tax_rate"],
            "properties": {
                "code": { "type": "string" },
                "name": { "type": "string" },
                "description": { "type": "string" },
                "unit_price": money,
                "tax_rate": { "type": "string", "example": "15" }
            }
        },
        "Product": {
            "allOf": [schema_ref("ProductInput"), { "type": "object", "properties": {
                "id": uuid, "created_at": timestamp, "updated_at": timestamp
            }}]
        },
        "InvoiceInput": {
            "type": "object",
            "required": ["issuing_company_id", "client_id"],
            "properties": {
                "issuing_company_id": uuid,
                "client_id": uuid,
                "issue_date": { "type": "string", "format": "date" },
                "notes": { "type": "string" },
                "status": { "type": "string", "enum": ["draft", "issued", "cancelled"] }
            }
        },
        "Invoice": {
            "allOf": [schema_ref("InvoiceInput"), { "type": "object", "properties": {
                "id": uuid,
                "sequential": { "type": "integer" },
                "invoice_number": { "type": "string", "example": "001-001-000000042" },
                "subtotal": money, "tax_total": money, "total": money,
                "details": { "type": "array", "items": schema_ref("InvoiceDetail") },
                "created_at": timestamp, "updated_at": timestamp
            }}]
        },
        "InvoiceDetailInput": {
            "type": "object",
            "required": ["invoice_id", "product_id", "quantity"],
            "properties": {
                "invoice_id": uuid,
                "product_id": uuid,
                "quantity": { "type": "string", "example": "2" },
                "unit_price": money,
                "discount": money,
                "description": { "type": "string" }
            }
        },
        "InvoiceDetail": {
            "allOf": [schema_ref("InvoiceDetailInput"), { "type": "object", "properties": {
                "id": uuid, "subtotal": money, "tax_rate": money, "tax_amount": money, "total": money,
                "created_at": timestamp, "updated_at": timestamp
            }}]
        },
        "RegisterInput": {
            "type": "object",
            "required": ["email", "password", "name"],
            "properties": {
                "email": { "type": "string", "format": "email" },
                "password": { "type": "string", "minLength": 8 },
                "name": { "type": "string" }
            }
        },
        "LoginInput": {
            "type": "object",
            "required": ["email", "password"],
            "properties": {
                "email": { "type": "string", "format": "email" },
                "password": { "type": "string" }
            }
        },
        "Token": {
            "type": "object",
            "properties": {
                "access_token": { "type": "string" },
                "token_type": { "type": "string", "example": "bearer" },
                "expires_in": { "type": "integer" },
                "user": { "type": "object", "properties": {
                    "id": uuid, "email": { "type": "string" }, "name": { "type": "string" }
                }}
            }
        }
    })
}

fn build_openapi_document() -> Value {
    let mut paths = Map::new();

    paths.insert("/health".into(), json!({
        "get": {
            "tags": ["System"],
            "summary": "Liveness report",
            "responses": { "200": json_response("Service is up", json!({
                "type": "object",
                "properties": {
                    "status": { "type": "string", "example": "OK" },
                    "timestamp": { "type": "string", "format": "date-time" },
                    "cors": { "type": "string", "example": "enabled" },
                    "environment": { "type": "string" }
                }
            })) }
        }
    }));
    paths.insert("/cors-test".into(), json!({
        "get": {
            "tags": ["System"],
            "summary": "Reports the CORS decision for the calling origin",
            "parameters": [{ "name": "strict", "in": "query", "schema": { "type": "boolean" } }],
            "responses": {
                "200": { "description": "Decision report" },
                "403": { "description": "Origin not allowed (strict mode)" }
            }
        }
    }));
    paths.insert("/api/v1/auth/register".into(), json!({
        "post": {
            "tags": ["Auth"],
            "summary": "Register a user",
            "requestBody": json_body(schema_ref("RegisterInput")),
            "responses": {
                "201": { "description": "User created" },
                "400": error_response("Invalid payload"),
                "409": error_response("Email already registered")
            }
        }
    }));
    paths.insert("/api/v1/auth/login".into(), json!({
        "post": {
            "tags": ["Auth"],
            "summary": "Obtain an access token",
            "requestBody": json_body(schema_ref("LoginInput")),
            "responses": {
                "200": json_response("Token issued", schema_ref("Token")),
                "401": error_response("Invalid credentials")
            }
        }
    }));

    for (segment, tag, schema) in RESOURCES {
        let (collection, item) = resource_paths(segment, tag, schema);
        paths.insert(format!("/api/v1/{}", segment), collection);
        paths.insert(format!("/api/v1/{}/{{id}}", segment), item);
    }

    paths.insert("/api/v1/invoice-pdf/{invoice_id}".into(), json!({
        "get": {
            "tags": ["Invoices"],
            "summary": "Printable invoice document",
            "security": [{ "bearerAuth": [] }],
            "parameters": [id_parameter("invoice_id")],
            "responses": {
                "200": { "description": "Company, client, header, lines and totals" },
                "401": error_response("Missing or invalid token"),
                "404": error_response("Not found")
            }
        }
    }));

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "FSRI Invoicing API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Electronic invoicing backend: issuers, clients, products, invoices and their lines."
        },
        "servers": [{ "url": "/" }],
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            },
            "schemas": schemas()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_resource() {
        let doc = openapi_document();
        let paths = doc["paths"].as_object().unwrap();
        for (segment, _, _) in RESOURCES {
            assert!(paths.contains_key(&format!("/api/v1/{}", segment)), "{}", segment);
            assert!(paths.contains_key(&format!("/api/v1/{}/{{id}}", segment)), "{}", segment);
        }
        assert!(paths.contains_key("/api/v1/invoice-pdf/{invoice_id}"));
        assert!(paths.contains_key("/api/v1/auth/login"));
    }

    #[test]
    fn test_protected_routes_declare_bearer_auth() {
        let doc = openapi_document();
        assert_eq!(doc["components"]["securitySchemes"]["bearerAuth"]["scheme"], "bearer");
        assert!(doc["paths"]["/api/v1/client"]["get"]["security"].is_array());
        assert!(doc["paths"]["/health"]["get"].get("security").is_none());
    }

    #[test]
    fn test_schema_references_resolve() {
        let doc = openapi_document();
        let schemas = doc["components"]["schemas"].as_object().unwrap();
        for (_, _, schema) in RESOURCES {
            assert!(schemas.contains_key(*schema));
            assert!(schemas.contains_key(&format!("{}Input", schema)));
        }
    }
}
