//! [`Transport`] over the REST Composite Batch resource.

use std::time::Duration;

use busbar_sf_operations::{RemoteFailure, Transport, TransportError, WireRequest, WireResponse};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::composite::{
    ApiError, CompositeBatchRequest, CompositeBatchSubrequest, CompositeBatchSubresponse,
    MAX_BATCH_SUBREQUESTS,
};
use crate::config::RestConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::security::{soql, url};

const DATA_PATH: &str = "/services/data/";

/// Sends grouped record requests as one `composite/batch` call.
///
/// Each [`WireRequest`] becomes one subrequest. Requests whose object name,
/// id or field list would be unsafe in a URL are rejected locally and never
/// sent; their entry fails with a [`RemoteFailure`] while the rest of the
/// group proceeds.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_operations::Executor;
/// use busbar_sf_rest::CompositeBatchTransport;
///
/// let transport = CompositeBatchTransport::from_env()?;
/// let executor = Executor::new(transport);
/// ```
#[derive(Clone)]
pub struct CompositeBatchTransport {
    http: reqwest::Client,
    instance_url: String,
    access_token: String,
    config: RestConfig,
}

impl std::fmt::Debug for CompositeBatchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeBatchTransport")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.config.api_version)
            .finish_non_exhaustive()
    }
}

impl CompositeBatchTransport {
    /// Create a transport with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, RestConfig::default())
    }

    /// Create a transport with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: RestConfig,
    ) -> Result<Self> {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        let parsed = ::url::Url::parse(&instance_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::new(ErrorKind::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            ))));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            http,
            instance_url,
            access_token: access_token.into(),
            config,
        })
    }

    /// Create a transport from environment variables.
    ///
    /// Required:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN` or `SALESFORCE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "62.0")
    pub fn from_env() -> Result<Self> {
        let instance_url = env_var("SF_INSTANCE_URL", "SALESFORCE_INSTANCE_URL")
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;
        let access_token = env_var("SF_ACCESS_TOKEN", "SALESFORCE_ACCESS_TOKEN")
            .ok_or_else(|| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;
        let api_version = env_var("SF_API_VERSION", "SALESFORCE_API_VERSION")
            .unwrap_or_else(|| crate::DEFAULT_API_VERSION.to_string());

        let config = RestConfig::builder().with_api_version(api_version).build();
        Self::with_config(instance_url, access_token, config)
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.config.api_version
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Full URL of the Composite Batch resource.
    pub fn batch_url(&self) -> String {
        format!(
            "{}{}v{}/composite/batch",
            self.instance_url, DATA_PATH, self.config.api_version
        )
    }

    /// Map one request onto a subrequest, or reject it locally.
    pub fn subrequest(
        &self,
        request: &WireRequest,
    ) -> std::result::Result<CompositeBatchSubrequest, RemoteFailure> {
        let version = &self.config.api_version;
        let subrequest = match request {
            WireRequest::Create { object, body } => CompositeBatchSubrequest::new(
                "POST",
                format!("v{}/sobjects/{}", version, checked_object(object)?),
            )
            .with_body(body.clone()),
            WireRequest::Get { object, id, fields } => {
                let mut path = self.record_path(object, id)?;
                if !fields.is_empty() {
                    let list = soql::field_list(fields).ok_or_else(|| {
                        RemoteFailure::new(400, "INVALID_FIELD", "unsafe field name in field list")
                            .with_fields(
                                fields
                                    .iter()
                                    .filter(|f| !soql::is_safe_field_name(f))
                                    .cloned()
                                    .collect(),
                            )
                    })?;
                    path.push_str("?fields=");
                    path.push_str(&list);
                }
                CompositeBatchSubrequest::new("GET", path)
            }
            // Both are PATCH on the wire; they differ only in the body.
            WireRequest::Update { object, id, body } | WireRequest::Patch { object, id, body } => {
                CompositeBatchSubrequest::new("PATCH", self.record_path(object, id)?)
                    .with_body(body.clone())
            }
            WireRequest::Delete { object, id } => {
                CompositeBatchSubrequest::new("DELETE", self.record_path(object, id)?)
            }
            WireRequest::Query { soql } => CompositeBatchSubrequest::new(
                "GET",
                format!("v{}/query?q={}", version, url::encode_param(soql)),
            ),
            WireRequest::QueryMore { next_records_url } => {
                CompositeBatchSubrequest::new("GET", self.next_page_path(next_records_url)?)
            }
        };
        Ok(subrequest)
    }

    /// Send `requests` as one Composite Batch call.
    ///
    /// Responses correspond to `requests` by position.
    #[instrument(skip(self, requests), fields(requests = requests.len()))]
    pub async fn send_batch(&self, requests: &[WireRequest]) -> Result<Vec<WireResponse>> {
        if requests.len() > MAX_BATCH_SUBREQUESTS {
            return Err(Error::new(ErrorKind::Other(format!(
                "{} requests exceed the composite batch limit of {}",
                requests.len(),
                MAX_BATCH_SUBREQUESTS
            ))));
        }

        let mut rejected = Vec::with_capacity(requests.len());
        let mut subrequests = Vec::with_capacity(requests.len());
        for request in requests {
            match self.subrequest(request) {
                Ok(subrequest) => {
                    subrequests.push(subrequest);
                    rejected.push(None);
                }
                Err(failure) => {
                    warn!(error = %failure, object = ?request.object(), "Rejected request before sending");
                    rejected.push(Some(failure));
                }
            }
        }

        let sent = subrequests.len();
        let results = if sent == 0 {
            Vec::new()
        } else {
            self.post(subrequests).await?
        };
        if results.len() != sent {
            return Err(Error::new(ErrorKind::Other(format!(
                "composite batch returned {} results for {} subrequests",
                results.len(),
                sent
            ))));
        }

        let mut results = results.into_iter();
        let mut responses = Vec::with_capacity(rejected.len());
        for failure in rejected {
            let response = match failure {
                Some(failure) => Err(failure),
                None => match results.next() {
                    Some(result) => decode_subresponse(result),
                    None => break,
                },
            };
            responses.push(response);
        }
        Ok(responses)
    }

    async fn post(
        &self,
        batch_requests: Vec<CompositeBatchSubrequest>,
    ) -> Result<Vec<CompositeBatchSubresponse>> {
        let body = CompositeBatchRequest {
            batch_requests,
            halt_on_error: self.config.halt_on_error,
        };
        let url = self.batch_url();

        if self.config.enable_tracing {
            debug!(url = %url, subrequests = body.batch_requests.len(), "Sending composite batch");
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            if self.config.enable_tracing {
                info!(status, "Non-success response");
            }
            return Err(error_from_response(response).await);
        }

        let text = response.text().await?;
        let batch: crate::composite::CompositeBatchResponse = serde_json::from_str(&text)?;

        if self.config.enable_tracing {
            debug!(status, has_errors = batch.has_errors, "Composite batch response received");
        }
        Ok(batch.results)
    }

    fn record_path(&self, object: &str, id: &str) -> std::result::Result<String, RemoteFailure> {
        let object = checked_object(object)?;
        if !url::is_valid_salesforce_id(id) {
            return Err(RemoteFailure::new(
                400,
                "MALFORMED_ID",
                format!("malformed id: {}", id),
            ));
        }
        Ok(format!(
            "v{}/sobjects/{}/{}",
            self.config.api_version, object, id
        ))
    }

    /// `nextRecordsUrl` is absolute from the instance root; subrequest
    /// URLs are relative to `/services/data/`.
    fn next_page_path(&self, next_records_url: &str) -> std::result::Result<String, RemoteFailure> {
        let path = next_records_url
            .strip_prefix(self.instance_url.as_str())
            .unwrap_or(next_records_url);
        path.strip_prefix(DATA_PATH)
            .filter(|rest| !rest.is_empty() && !rest.contains(".."))
            .map(str::to_string)
            .ok_or_else(|| {
                RemoteFailure::new(
                    400,
                    "INVALID_QUERY_LOCATOR",
                    format!("unexpected nextRecordsUrl: {}", next_records_url),
                )
            })
    }
}

impl Transport for CompositeBatchTransport {
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SUBREQUESTS
    }

    async fn send(
        &self,
        requests: Vec<WireRequest>,
    ) -> std::result::Result<Vec<WireResponse>, TransportError> {
        self.send_batch(&requests).await.map_err(|err| {
            warn!(error = %err, "Composite batch failed");
            TransportError::from(err)
        })
    }
}

fn checked_object(object: &str) -> std::result::Result<&str, RemoteFailure> {
    if soql::is_safe_sobject_name(object) {
        Ok(object)
    } else {
        Err(RemoteFailure::new(
            400,
            "INVALID_TYPE",
            format!("invalid sobject name: {}", object),
        ))
    }
}

fn env_var(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var(fallback))
        .ok()
}

fn decode_subresponse(subresponse: CompositeBatchSubresponse) -> WireResponse {
    if subresponse.is_success() {
        Ok(subresponse.result)
    } else {
        Err(remote_failure(subresponse.status_code, subresponse.result))
    }
}

/// Collapse a Salesforce error array into one failure.
fn remote_failure(status: u16, result: Value) -> RemoteFailure {
    let fallback = match &result {
        Value::Null => format!("HTTP {}", status),
        other => other.to_string(),
    };
    let errors: Vec<ApiError> = serde_json::from_value(result).unwrap_or_default();
    let Some(first) = errors.first() else {
        return RemoteFailure::new(status, "UNKNOWN_ERROR", fallback);
    };

    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let fields = errors.iter().flat_map(|e| e.fields.iter().cloned()).collect();
    RemoteFailure::new(status, first.error_code.clone(), message).with_fields(fields)
}

async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<Vec<ApiError>>(&body)
        .ok()
        .and_then(|errors| errors.into_iter().next());

    let kind = match (status, api_error) {
        (429, _) => ErrorKind::RateLimited { retry_after },
        (401, error) => ErrorKind::Authentication(error.map(|e| e.message).unwrap_or(body)),
        (403, error) => ErrorKind::Authorization(error.map(|e| e.message).unwrap_or(body)),
        (_, Some(error)) => ErrorKind::SalesforceApi {
            status,
            error_code: error.error_code,
            message: error.message,
            fields: error.fields,
        },
        (_, None) => ErrorKind::Http {
            status,
            message: body,
        },
    };
    Error::new(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BATCH_PATH: &str = "/services/data/v62.0/composite/batch";
    const ACCOUNT_ID: &str = "001000000000001AAA";

    fn transport(uri: &str) -> CompositeBatchTransport {
        CompositeBatchTransport::new(uri, "test-token").unwrap()
    }

    #[test]
    fn test_subrequest_urls() {
        let transport = transport("https://na1.my.salesforce.com/");
        assert_eq!(
            transport.batch_url(),
            "https://na1.my.salesforce.com/services/data/v62.0/composite/batch"
        );

        let get = transport
            .subrequest(&WireRequest::Get {
                object: "Account".into(),
                id: ACCOUNT_ID.into(),
                fields: vec!["Id".into(), "Name".into()],
            })
            .unwrap();
        assert_eq!(get.method, "GET");
        assert_eq!(get.url, format!("v62.0/sobjects/Account/{}?fields=Id,Name", ACCOUNT_ID));

        let patch = transport
            .subrequest(&WireRequest::Update {
                object: "Account".into(),
                id: ACCOUNT_ID.into(),
                body: json!({"Name": null}),
            })
            .unwrap();
        assert_eq!(patch.method, "PATCH");
        assert_eq!(patch.rich_input, Some(json!({"Name": null})));

        let query = transport
            .subrequest(&WireRequest::Query {
                soql: "SELECT Id FROM Account WHERE Name = 'A&B'".into(),
            })
            .unwrap();
        assert_eq!(
            query.url,
            "v62.0/query?q=SELECT%20Id%20FROM%20Account%20WHERE%20Name%20%3D%20%27A%26B%27"
        );

        let more = transport
            .subrequest(&WireRequest::QueryMore {
                next_records_url: "/services/data/v62.0/query/01gD0000002HU6KIAW-2000".into(),
            })
            .unwrap();
        assert_eq!(more.url, "v62.0/query/01gD0000002HU6KIAW-2000");
    }

    #[test]
    fn test_unsafe_requests_rejected() {
        let transport = transport("https://na1.my.salesforce.com");

        let err = transport
            .subrequest(&WireRequest::Delete {
                object: "Account".into(),
                id: "001/../../x".into(),
            })
            .unwrap_err();
        assert_eq!(err.error_code, "MALFORMED_ID");

        let err = transport
            .subrequest(&WireRequest::Create {
                object: "Account; DROP".into(),
                body: json!({}),
            })
            .unwrap_err();
        assert_eq!(err.error_code, "INVALID_TYPE");

        let err = transport
            .subrequest(&WireRequest::Get {
                object: "Account".into(),
                id: ACCOUNT_ID.into(),
                fields: vec!["Id".into(), "Owner.Name".into()],
            })
            .unwrap_err();
        assert_eq!(err.error_code, "INVALID_FIELD");
        assert_eq!(err.fields, vec!["Owner.Name"]);

        let err = transport
            .subrequest(&WireRequest::QueryMore {
                next_records_url: "https://evil.example.com/next".into(),
            })
            .unwrap_err();
        assert_eq!(err.error_code, "INVALID_QUERY_LOCATOR");
    }

    #[test]
    fn test_invalid_instance_url() {
        let err = CompositeBatchTransport::new("not a url", "token").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidUrl(_)));

        let err = CompositeBatchTransport::new("ftp://example.com", "token").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidUrl(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let transport = transport("https://na1.my.salesforce.com");
        let debug = format!("{:?}", transport);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_remote_failure_from_error_array() {
        let failure = remote_failure(
            400,
            json!([
                {"errorCode": "REQUIRED_FIELD_MISSING", "message": "Required fields are missing: [Name]", "fields": ["Name"]},
                {"errorCode": "FIELD_INTEGRITY_EXCEPTION", "message": "bad value", "fields": ["Type"]}
            ]),
        );
        assert_eq!(failure.status, 400);
        assert_eq!(failure.error_code, "REQUIRED_FIELD_MISSING");
        assert_eq!(failure.message, "Required fields are missing: [Name]; bad value");
        assert_eq!(failure.fields, vec!["Name", "Type"]);

        let failure = remote_failure(500, Value::Null);
        assert_eq!(failure.error_code, "UNKNOWN_ERROR");
        assert_eq!(failure.message, "HTTP 500");
    }

    #[tokio::test]
    async fn test_send_batch_wire_format() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(json!({
                "batchRequests": [
                    {"method": "POST", "url": "v62.0/sobjects/Account", "richInput": {"attributes": {"type": "Account"}, "Name": "Acme"}},
                    {"method": "DELETE", "url": format!("v62.0/sobjects/Account/{}", ACCOUNT_ID)},
                    {"method": "GET", "url": "v62.0/query?q=SELECT%20Id%20FROM%20Account"}
                ],
                "haltOnError": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hasErrors": true,
                "results": [
                    {"statusCode": 201, "result": {"id": ACCOUNT_ID, "success": true, "errors": []}},
                    {"statusCode": 404, "result": [{"errorCode": "NOT_FOUND", "message": "The requested resource does not exist"}]},
                    {"statusCode": 200, "result": {"totalSize": 0, "done": true, "records": []}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = transport(&mock_server.uri());
        let responses = transport
            .send(vec![
                WireRequest::Create {
                    object: "Account".into(),
                    body: json!({"attributes": {"type": "Account"}, "Name": "Acme"}),
                },
                WireRequest::Delete {
                    object: "Account".into(),
                    id: ACCOUNT_ID.into(),
                },
                WireRequest::Query {
                    soql: "SELECT Id FROM Account".into(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].as_ref().unwrap()["id"], ACCOUNT_ID);
        let failure = responses[1].as_ref().unwrap_err();
        assert_eq!(failure.status, 404);
        assert_eq!(failure.error_code, "NOT_FOUND");
        assert_eq!(responses[2].as_ref().unwrap()["done"], true);
    }

    #[tokio::test]
    async fn test_locally_rejected_requests_keep_positions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .and(body_json(json!({
                "batchRequests": [
                    {"method": "DELETE", "url": format!("v62.0/sobjects/Account/{}", ACCOUNT_ID)}
                ],
                "haltOnError": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hasErrors": false,
                "results": [{"statusCode": 204, "result": null}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = RestConfig::builder().with_halt_on_error(true).build();
        let transport =
            CompositeBatchTransport::with_config(mock_server.uri(), "test-token", config).unwrap();
        let responses = transport
            .send_batch(&[
                WireRequest::Delete {
                    object: "Account".into(),
                    id: "bogus".into(),
                },
                WireRequest::Delete {
                    object: "Account".into(),
                    id: ACCOUNT_ID.into(),
                },
            ])
            .await
            .unwrap();

        assert_eq!(responses[0].as_ref().unwrap_err().error_code, "MALFORMED_ID");
        assert_eq!(responses[1].as_ref().unwrap(), &Value::Null);
    }

    #[tokio::test]
    async fn test_all_rejected_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let responses = transport(&mock_server.uri())
            .send_batch(&[WireRequest::Get {
                object: "Bad Name".into(),
                id: ACCOUNT_ID.into(),
                fields: vec![],
            }])
            .await
            .unwrap();
        assert_eq!(responses[0].as_ref().unwrap_err().error_code, "INVALID_TYPE");
    }

    #[tokio::test]
    async fn test_http_failure_becomes_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!([{
                "errorCode": "INVALID_SESSION_ID",
                "message": "Session expired or invalid"
            }])))
            .mount(&mock_server)
            .await;

        let transport = transport(&mock_server.uri());
        let requests = vec![WireRequest::Query {
            soql: "SELECT Id FROM Account".into(),
        }];

        let err = transport.send_batch(&requests).await.unwrap_err();
        assert!(err.is_auth_error());
        assert_eq!(err.to_string(), "Authentication error: Session expired or invalid");

        let err = transport.send(requests).await.unwrap_err();
        assert_eq!(err.status, Some(401));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let err = transport(&mock_server.uri())
            .send_batch(&[WireRequest::Query {
                soql: "SELECT Id FROM Account".into(),
            }])
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));
    }

    #[tokio::test]
    async fn test_result_count_mismatch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hasErrors": false,
                "results": []
            })))
            .mount(&mock_server)
            .await;

        let err = transport(&mock_server.uri())
            .send_batch(&[WireRequest::Query {
                soql: "SELECT Id FROM Account".into(),
            }])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("returned 0 results for 1 subrequests"));
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let transport = transport("https://na1.my.salesforce.com");
        let requests: Vec<_> = (0..26)
            .map(|_| WireRequest::Query {
                soql: "SELECT Id FROM Account".into(),
            })
            .collect();
        let err = transport.send_batch(&requests).await.unwrap_err();
        assert!(err.to_string().contains("exceed the composite batch limit of 25"));
    }
}
