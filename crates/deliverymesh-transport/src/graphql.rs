//! The GraphQL adapter: encodes a query/variables pair as a JSON POST and delegates the actual
//! HTTP work to [`RestAdapter`].

use crate::adapter::TransportAdapter;
use crate::cancel::CancelToken;
use crate::message::{TransportRequest, TransportResponse};
use crate::rest::RestAdapter;
use async_trait::async_trait;
use deliverymesh_core::MeshError;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct GraphQlAdapter {
    rest: RestAdapter,
}

impl GraphQlAdapter {
    pub fn new(rest: RestAdapter) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl TransportAdapter for GraphQlAdapter {
    fn kind(&self) -> &str {
        "graphql"
    }

    async fn do_request(
        &self,
        cancel: &CancelToken,
        mut req: TransportRequest,
    ) -> Result<TransportResponse, MeshError> {
        let query = match req.metadata.get("query") {
            Some(q) if !q.trim().is_empty() => q.clone(),
            _ => {
                if req.body.is_empty() {
                    return Err(MeshError::bad_input(
                        "graphql request requires a query in metadata[\"query\"] or the request body",
                    ));
                }
                String::from_utf8(req.body.clone())
                    .map_err(|_| MeshError::bad_input("graphql request body is not valid UTF-8"))?
            }
        };

        let mut payload = json!({ "query": query });
        if let Some(operation_name) = req.metadata.get("operation_name") {
            payload["operationName"] = Value::String(operation_name.clone());
        }
        if let Some(variables) = req.metadata.get("variables") {
            let parsed: Value = serde_json::from_str(variables)
                .map_err(|e| MeshError::bad_input(format!("invalid graphql variables: {e}")))?;
            if !parsed.is_object() {
                return Err(MeshError::bad_input(
                    "graphql variables must be a string-keyed map",
                ));
            }
            payload["variables"] = parsed;
        }

        req.method = "POST".to_string();
        req.body = serde_json::to_vec(&payload)
            .map_err(|e| MeshError::internal(format!("failed to encode graphql payload: {e}")))?;
        req.headers.set("content-type", "application/json");

        let mut response = self.rest.do_request(cancel, req).await?;
        response.metadata.insert("kind".to_string(), "graphql".to_string());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_query_is_bad_input() {
        let adapter = GraphQlAdapter::new(RestAdapter::new());
        let req = TransportRequest::new("https://example.com/graphql");
        let cancel = CancelToken::new();
        let err = adapter.do_request(&cancel, req).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::BadInput);
    }

    #[tokio::test]
    async fn non_object_variables_is_bad_input() {
        let adapter = GraphQlAdapter::new(RestAdapter::new());
        let mut req = TransportRequest::new("https://example.com/graphql");
        req.metadata.insert("query".to_string(), "query { widgets }".to_string());
        req.metadata.insert("variables".to_string(), "[1, 2, 3]".to_string());
        let cancel = CancelToken::new();
        let err = adapter.do_request(&cancel, req).await.unwrap_err();
        assert_eq!(err.category(), deliverymesh_core::ErrorCategory::BadInput);
    }
}
