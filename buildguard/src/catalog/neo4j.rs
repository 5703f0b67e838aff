//! Neo4j Catalog
//!
//! Gateway for the product graph, spoken over the Neo4j HTTP transactional
//! endpoint. Products are nodes linked to characteristic nodes; every lookup
//! is a single auto-commit Cypher statement.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{CatalogError, CatalogGateway, CatalogId, Category, Resolution, ResolvedPart};

const DEFAULT_URI: &str = "http://localhost:7474";
const DEFAULT_DATABASE: &str = "neo4j";
const DEFAULT_USER: &str = "neo4j";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Labels and property names of the product graph.
///
/// Defaults describe the existing store:
/// `(:Producto {nombre, categoria})-[:TIENE_CARACTERISTICA]->(:Caracteristica {tipo, valor})`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSchema {
    pub product_label: String,
    pub name_property: String,
    pub category_property: String,
    pub relationship: String,
    pub characteristic_label: String,
    pub type_property: String,
    pub value_property: String,
    /// Product property holding the precomputed lookup key. When unset,
    /// products match on the lower-cased name.
    pub key_property: Option<String>,
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self {
            product_label: "Producto".to_string(),
            name_property: "nombre".to_string(),
            category_property: "categoria".to_string(),
            relationship: "TIENE_CARACTERISTICA".to_string(),
            characteristic_label: "Caracteristica".to_string(),
            type_property: "tipo".to_string(),
            value_property: "valor".to_string(),
            key_property: None,
        }
    }
}

impl GraphSchema {
    /// Cypher predicate comparing product `p` with the `$name` parameter.
    fn product_match(&self) -> String {
        match &self.key_property {
            Some(key) => format!("p.{} = $name", ident(key)),
            None => format!("toLower(p.{}) = $name", ident(&self.name_property)),
        }
    }

    fn resolve_statement(&self) -> String {
        format!(
            "MATCH (p:{label}) WHERE {matches} \
             RETURN p.{name} AS name, p.{category} AS category, elementId(p) AS id",
            label = ident(&self.product_label),
            matches = self.product_match(),
            name = ident(&self.name_property),
            category = ident(&self.category_property),
        )
    }

    fn attributes_statement(&self) -> String {
        format!(
            "MATCH (p:{label})-[:{rel}]->(c:{clabel}) \
             WHERE {matches} AND c.{kind} = $kind \
             RETURN c.{value} AS value",
            label = ident(&self.product_label),
            rel = ident(&self.relationship),
            clabel = ident(&self.characteristic_label),
            matches = self.product_match(),
            kind = ident(&self.type_property),
            value = ident(&self.value_property),
        )
    }
}

/// Backtick-quote a Cypher identifier.
fn ident(raw: &str) -> String {
    format!("`{}`", raw.replace('`', "``"))
}

/// Connection settings for the graph store.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    /// HTTP base URI, e.g. `http://localhost:7474`
    pub uri: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
    pub schema: GraphSchema,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            schema: GraphSchema::default(),
        }
    }
}

impl std::fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .field("schema", &self.schema)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: [Statement<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[allow(dead_code)]
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

/// Gateway to a Neo4j product graph.
pub struct Neo4jCatalog {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
    resolve_statement: String,
    attributes_statement: String,
}

impl Neo4jCatalog {
    pub fn new(config: &Neo4jConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            user: config.user.clone(),
            password: config.password.clone(),
            resolve_statement: config.schema.resolve_statement(),
            attributes_statement: config.schema.attributes_statement(),
        })
    }

    /// Run one statement and return the rows of its result.
    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>, CatalogError> {
        let request = CommitRequest {
            statements: [Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json;charset=UTF-8")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Transport(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                self.endpoint,
                body
            )));
        }

        let body: CommitResponse = response.json().await?;
        rows_from_response(body)
    }
}

fn rows_from_response(body: CommitResponse) -> Result<Vec<Vec<Value>>, CatalogError> {
    if let Some(error) = body.errors.into_iter().next() {
        return Err(CatalogError::Query {
            code: error.code,
            message: error.message,
        });
    }
    let result = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| CatalogError::InvalidResponse("no statement result".to_string()))?;
    Ok(result.data.into_iter().map(|r| r.row).collect())
}

fn cell_string(row: &[Value], index: usize) -> Option<String> {
    match row.get(index)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn part_from_row(row: &[Value], normalized_key: &str) -> Result<ResolvedPart, CatalogError> {
    let display_name = cell_string(row, 0)
        .ok_or_else(|| CatalogError::InvalidResponse("product row without name".to_string()))?;
    let category = cell_string(row, 1).unwrap_or_default();
    let catalog_id = cell_string(row, 2)
        .ok_or_else(|| CatalogError::InvalidResponse("product row without id".to_string()))?;
    Ok(ResolvedPart {
        display_name,
        normalized_key: normalized_key.to_string(),
        category: Category::from(category.as_str()),
        catalog_id: CatalogId(catalog_id),
    })
}

#[async_trait]
impl CatalogGateway for Neo4jCatalog {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn resolve_by_name(&self, normalized_key: &str) -> Result<Resolution, CatalogError> {
        tracing::trace!(key = normalized_key, "resolving product");
        let rows = self
            .run(&self.resolve_statement, json!({ "name": normalized_key }))
            .await?;
        let matches = rows
            .iter()
            .map(|row| part_from_row(row, normalized_key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Resolution::from_matches(matches))
    }

    async fn fetch_attributes(
        &self,
        normalized_key: &str,
        attribute_type: &str,
    ) -> Result<Vec<String>, CatalogError> {
        tracing::trace!(key = normalized_key, attribute_type, "fetching characteristic");
        let rows = self
            .run(
                &self.attributes_statement,
                json!({ "name": normalized_key, "kind": attribute_type }),
            )
            .await?;
        Ok(rows.iter().filter_map(|row| cell_string(row, 0)).collect())
    }
}
