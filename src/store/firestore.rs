//! Firestore REST backend
//!
//! Issues one blocking `runQuery` call per stream request. Credentials are an
//! opaque bearer token handed in through settings; no token exchange happens
//! here.

use super::wire::{self, Document};
use super::{Direction, Operator, QueryError, RecordStore, SessionError, StreamRequest};
use crate::config::StoreSettings;
use crate::document::RawDocument;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Upper bound of collection ids fetched by `list_collections` (single page)
const COLLECTION_PAGE_SIZE: u32 = 300;

pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    access_token: Option<String>,
}

impl FirestoreStore {
    /// Build the client from settings; does not touch the network
    pub fn connect(settings: &StoreSettings) -> Result<Self, SessionError> {
        let project = settings
            .project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(SessionError::MissingSetting("project_id"))?;

        let access_token = match (&settings.access_token, &settings.token_file) {
            (Some(token), _) => Some(token.trim().to_string()),
            (None, Some(path)) => {
                if !path.exists() {
                    return Err(SessionError::CredentialsNotFound(path.clone()));
                }
                Some(std::fs::read_to_string(path)?.trim().to_string())
            }
            (None, None) => None,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(SessionError::Client)?;

        Ok(Self {
            client,
            documents_url: documents_url(&settings.endpoint, project, &settings.database),
            access_token,
        })
    }

    fn post<B: Serialize>(&self, action: &str, body: &B) -> RequestBuilder {
        let request = self
            .client
            .post(format!("{}:{}", self.documents_url, action))
            .json(body);
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send<T: DeserializeOwned>(
        &self,
        collection: &str,
        request: RequestBuilder,
    ) -> Result<T, QueryError> {
        let http_error = |source| QueryError::Http {
            collection: collection.to_string(),
            source,
        };
        let response = request.send().map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Rejected {
                collection: collection.to_string(),
                status: status.as_u16(),
                message: error_message(response),
            });
        }
        let body = response.text().map_err(http_error)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl RecordStore for FirestoreStore {
    fn stream(&self, request: &StreamRequest) -> Result<Vec<RawDocument>, QueryError> {
        let body = RunQueryRequest::from_request(request);
        debug!(
            collection = %request.collection,
            predicates = request.predicates.len(),
            limit = ?request.limit,
            "running structured query"
        );

        let results: Vec<RunQueryResult> =
            self.send(&request.collection, self.post("runQuery", &body))?;
        let docs: Vec<RawDocument> = results
            .into_iter()
            .filter_map(|r| r.document)
            .map(Document::into_raw)
            .collect();

        debug!(collection = %request.collection, documents = docs.len(), "query complete");
        Ok(docs)
    }

    fn list_collections(&self) -> Result<Vec<String>, QueryError> {
        let body = ListCollectionIdsRequest {
            page_size: COLLECTION_PAGE_SIZE,
        };
        let response: ListCollectionIdsResponse =
            self.send("(root)", self.post("listCollectionIds", &body))?;
        Ok(response.collection_ids)
    }
}

fn documents_url(endpoint: &str, project: &str, database: &str) -> String {
    format!(
        "{}/v1/projects/{}/databases/{}/documents",
        endpoint.trim_end_matches('/'),
        project,
        database
    )
}

/// Best-effort extraction of the error message from a failed response
fn error_message(response: Response) -> String {
    let text = response.text().unwrap_or_default();
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
        return body.error.message;
    }
    if let Ok(mut bodies) = serde_json::from_str::<Vec<ErrorBody>>(&text) {
        if let Some(body) = bodies.pop() {
            return body.error.message;
        }
    }
    text
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery<'a> {
    from: Vec<CollectionSelector<'a>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<Filter<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<Order<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference<'a> {
    field_path: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Filter<'a> {
    FieldFilter(FieldFilter<'a>),
    CompositeFilter(CompositeFilter<'a>),
}

#[derive(Debug, Serialize)]
struct FieldFilter<'a> {
    field: FieldReference<'a>,
    op: &'static str,
    value: wire::Value,
}

#[derive(Debug, Serialize)]
struct CompositeFilter<'a> {
    op: &'static str,
    filters: Vec<Filter<'a>>,
}

#[derive(Debug, Serialize)]
struct Order<'a> {
    field: FieldReference<'a>,
    direction: &'static str,
}

impl<'a> RunQueryRequest<'a> {
    fn from_request(request: &'a StreamRequest) -> Self {
        let mut filters: Vec<Filter<'a>> = request
            .predicates
            .iter()
            .map(|p| {
                Filter::FieldFilter(FieldFilter {
                    field: FieldReference {
                        field_path: &p.field,
                    },
                    op: match p.op {
                        Operator::Equal => "EQUAL",
                        Operator::GreaterOrEqual => "GREATER_THAN_OR_EQUAL",
                        Operator::LessOrEqual => "LESS_THAN_OR_EQUAL",
                    },
                    value: wire::encode_value(&p.value),
                })
            })
            .collect();

        let filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::CompositeFilter(CompositeFilter {
                op: "AND",
                filters,
            })),
        };

        let order_by = request
            .order_by
            .iter()
            .map(|o| Order {
                field: FieldReference {
                    field_path: &o.field,
                },
                direction: match o.direction {
                    Direction::Ascending => "ASCENDING",
                    Direction::Descending => "DESCENDING",
                },
            })
            .collect();

        Self {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: &request.collection,
                }],
                filter,
                order_by,
                limit: request.limit,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryResult {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListCollectionIdsRequest {
    page_size: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCollectionIdsResponse {
    #[serde(default)]
    collection_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}
