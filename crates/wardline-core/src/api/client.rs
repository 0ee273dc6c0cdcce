//! API client for the hosted hierarchy backend.
//!
//! `ApiClient` implements [`Backend`] over HTTP. Each trait method is exactly
//! one request: no batching, no transactions, no automatic retry.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::backend::Backend;
use crate::models::{Agent, AgentDraft, Role, RoleCounts, Unit, UnitDraft};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix for table endpoints
const REST_PATH: &str = "rest/v1";

/// Table holding panchayaths
const UNITS_TABLE: &str = "panchayaths";

/// Select clause for the unit list: base columns plus one embedded count per
/// counted role, aggregated server-side.
const UNIT_SELECT: &str =
    "id,name,number_of_wards,coordinators(count),supervisors(count),group_leaders(count),pros(count)";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API client for the hierarchy backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(&self.api_key).context("API key is not a valid header value")?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Send a write (POST/PATCH/DELETE) that returns no representation.
    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<()> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .headers(self.auth_headers()?)
            .header("Prefer", "return=minimal")
            .query(query);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::check_response(response).await?;
        Ok(())
    }

    fn id_filter(id: &str) -> (&'static str, String) {
        ("id", format!("eq.{}", id))
    }

    /// Row body for an agent write; the parent column depends on the role.
    fn agent_body(role: Role, draft: &AgentDraft) -> Value {
        let mut body = json!({
            "name": draft.name,
            "mobile_number": draft.mobile_number,
            "ward": draft.ward,
            "panchayath_id": draft.unit_id,
        });
        if let (Some(column), Some(map)) = (role.parent_column(), body.as_object_mut()) {
            map.insert(column.to_string(), json!(draft.parent_id));
        }
        body
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn list_units(&self) -> Result<Vec<Unit>> {
        let url = self.table_url(UNITS_TABLE);
        let rows: Vec<UnitRow> = self
            .get(&url, &[("select", UNIT_SELECT.to_string())])
            .await?;
        debug!(count = rows.len(), "Units fetched");
        Ok(rows.into_iter().map(UnitRow::into_unit).collect())
    }

    async fn list_agents(&self, role: Role, unit_id: Option<&str>) -> Result<Vec<Agent>> {
        let url = self.table_url(role.table());
        let mut query = vec![("select", "*".to_string()), ("order", "name.asc".to_string())];
        if let Some(unit_id) = unit_id {
            query.push(("panchayath_id", format!("eq.{}", unit_id)));
        }
        let rows: Vec<AgentRow> = self.get(&url, &query).await?;
        debug!(role = %role, count = rows.len(), "Agents fetched");
        Ok(rows.into_iter().map(|row| row.into_agent(role)).collect())
    }

    async fn create_unit(&self, draft: &UnitDraft) -> Result<()> {
        let url = self.table_url(UNITS_TABLE);
        self.write(Method::POST, &url, &[], Some(draft)).await
    }

    async fn update_unit(&self, id: &str, draft: &UnitDraft) -> Result<()> {
        let url = self.table_url(UNITS_TABLE);
        self.write(Method::PATCH, &url, &[Self::id_filter(id)], Some(draft)).await
    }

    async fn delete_unit(&self, id: &str) -> Result<()> {
        let url = self.table_url(UNITS_TABLE);
        self.write::<Value>(Method::DELETE, &url, &[Self::id_filter(id)], None).await
    }

    async fn create_agent(&self, role: Role, draft: &AgentDraft) -> Result<()> {
        let url = self.table_url(role.table());
        let body = Self::agent_body(role, draft);
        self.write(Method::POST, &url, &[], Some(&body)).await
    }

    async fn update_agent(&self, role: Role, id: &str, draft: &AgentDraft) -> Result<()> {
        let url = self.table_url(role.table());
        let body = Self::agent_body(role, draft);
        self.write(Method::PATCH, &url, &[Self::id_filter(id)], Some(&body)).await
    }

    async fn delete_agent(&self, role: Role, id: &str) -> Result<()> {
        let url = self.table_url(role.table());
        self.write::<Value>(Method::DELETE, &url, &[Self::id_filter(id)], None).await
    }
}

// ============================================================================
// API response types - internal only
// ============================================================================

#[derive(Debug, Deserialize)]
struct CountRow {
    #[serde(default)]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct UnitRow {
    id: String,
    name: String,
    #[serde(default)]
    number_of_wards: Option<u32>,
    #[serde(default)]
    coordinators: Vec<CountRow>,
    #[serde(default)]
    supervisors: Vec<CountRow>,
    #[serde(default)]
    group_leaders: Vec<CountRow>,
    #[serde(default)]
    pros: Vec<CountRow>,
}

impl UnitRow {
    fn first_count(rows: &[CountRow]) -> u32 {
        rows.first().map(|r| r.count).unwrap_or(0)
    }

    fn into_unit(self) -> Unit {
        Unit {
            counts: RoleCounts {
                coordinators: Self::first_count(&self.coordinators),
                supervisors: Self::first_count(&self.supervisors),
                group_leaders: Self::first_count(&self.group_leaders),
                pros: Self::first_count(&self.pros),
            },
            id: self.id,
            name: self.name,
            ward_count: self.number_of_wards.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentRow {
    id: String,
    name: String,
    #[serde(default)]
    mobile_number: Option<String>,
    #[serde(default)]
    ward: Option<u32>,
    #[serde(default)]
    panchayath_id: Option<String>,
    #[serde(default)]
    coordinator_id: Option<String>,
    #[serde(default)]
    supervisor_id: Option<String>,
    #[serde(default)]
    group_leader_id: Option<String>,
    #[serde(default)]
    pro_id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl AgentRow {
    fn into_agent(self, role: Role) -> Agent {
        let parent_id = match role {
            Role::Coordinator => None,
            Role::Supervisor => self.coordinator_id,
            Role::GroupLeader => self.supervisor_id,
            Role::Pro => self.group_leader_id,
            Role::Customer => self.pro_id,
        };
        Agent {
            id: self.id,
            name: self.name,
            mobile_number: self.mobile_number.unwrap_or_default(),
            ward: self.ward,
            unit_id: self.panchayath_id.unwrap_or_default(),
            parent_id,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_unit_rows() {
        let json = r#"[
            {"id":"u1","name":"Kumarakom","number_of_wards":18,
             "coordinators":[{"count":2}],"supervisors":[{"count":5}],
             "group_leaders":[{"count":11}],"pros":[]},
            {"id":"u2","name":"Aymanam","number_of_wards":null}
        ]"#;
        let rows: Vec<UnitRow> = serde_json::from_str(json).expect("Failed to parse unit rows");
        let units: Vec<Unit> = rows.into_iter().map(UnitRow::into_unit).collect();

        assert_eq!(units[0].counts.supervisors, 5);
        assert_eq!(units[0].counts.pros, 0);
        assert_eq!(units[0].total_agents(), 18);
        assert_eq!(units[1].ward_count, 0);
        assert_eq!(units[1].total_agents(), 0);
    }

    #[test]
    fn test_agent_row_picks_parent_by_role() {
        let json = r#"{"id":"g1","name":"Bindu","mobile_number":"9847012345","ward":4,
            "panchayath_id":"u1","supervisor_id":"s9","created_at":"2024-06-01T10:00:00Z"}"#;
        let row: AgentRow = serde_json::from_str(json).expect("Failed to parse agent row");
        let agent = row.into_agent(Role::GroupLeader);
        assert_eq!(agent.parent_id.as_deref(), Some("s9"));
        assert_eq!(agent.unit_id, "u1");
        assert!(agent.created_at.is_some());
    }

    #[test]
    fn test_agent_body_uses_parent_column() {
        let draft = AgentDraft {
            name: "Sreeja".into(),
            mobile_number: "9847012345".into(),
            ward: None,
            unit_id: "u1".into(),
            parent_id: Some("g2".into()),
        };
        let body = ApiClient::agent_body(Role::Pro, &draft);
        assert_eq!(body["group_leader_id"], "g2");
        assert_eq!(body["panchayath_id"], "u1");
        assert!(body["ward"].is_null());

        let body = ApiClient::agent_body(Role::Coordinator, &draft);
        assert!(body.get("coordinator_id").is_none());
        assert!(body.get("group_leader_id").is_none());
    }

    #[tokio::test]
    async fn test_list_units_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/panchayaths"))
            .and(query_param("select", UNIT_SELECT))
            .and(header("apikey", "test-key"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "u1", "name": "Vaikom", "number_of_wards": 12,
                 "coordinators": [{"count": 1}], "supervisors": [{"count": 2}],
                 "group_leaders": [{"count": 3}], "pros": [{"count": 4}]}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), "test-key").expect("client");
        let units = client.list_units().await.expect("list_units");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "Vaikom");
        assert_eq!(units[0].total_agents(), 10);
    }

    #[tokio::test]
    async fn test_list_agents_filters_and_orders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/supervisors"))
            .and(query_param("panchayath_id", "eq.u1"))
            .and(query_param("order", "name.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "s1", "name": "Asha", "mobile_number": "9847000001", "panchayath_id": "u1",
                 "coordinator_id": "c1"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), "k").expect("client");
        let agents = client
            .list_agents(Role::Supervisor, Some("u1"))
            .await
            .expect("list_agents");
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].parent_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_delete_agent_targets_role_table() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/group_leaders"))
            .and(query_param("id", "eq.g7"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), "k").expect("client");
        client
            .delete_agent(Role::GroupLeader, "g7")
            .await
            .expect("delete_agent");
    }

    #[tokio::test]
    async fn test_update_unit_sends_patch_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/panchayaths"))
            .and(query_param("id", "eq.u3"))
            .and(body_json(json!({"name": "Maravanthuruthu", "number_of_wards": 15})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), "k").expect("client");
        let draft = UnitDraft {
            name: "Maravanthuruthu".into(),
            ward_count: 15,
        };
        client.update_unit("u3", &draft).await.expect("update_unit");
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/coordinators"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), "k").expect("client");
        let draft = AgentDraft {
            name: "Rajan".into(),
            mobile_number: "9847012345".into(),
            ward: Some(1),
            unit_id: "u1".into(),
            parent_id: None,
        };
        let err = client
            .create_agent(Role::Coordinator, &draft)
            .await
            .expect_err("conflict should fail");
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Conflict(body)) => assert_eq!(body, "duplicate key"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/panchayaths"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), "k").expect("client");
        let err = client.list_units().await.expect_err("429 should fail");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::RateLimited)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = ApiClient::with_timeout("http://127.0.0.1:1", "k", Duration::from_secs(2)).expect("client");
        let err = client.list_units().await.expect_err("nothing listens on port 1");
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NetworkError(_))));
    }
}
