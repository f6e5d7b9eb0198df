use crate::models::*;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Request to service desk API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Service desk API answered {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Optional filters forwarded to the remote API. Only the ones that are set
/// end up in the query string.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct IssueQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub datapoints: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub priority: Option<Priority>,
    #[serde(default, rename = "type", deserialize_with = "empty_as_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<Status>,
}

// `?priority=` means no filter, the same as leaving the parameter out.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

impl IssueQuery {
    pub fn with_datapoints(datapoints: u32) -> Self {
        Self {
            datapoints: Some(datapoints),
            ..Self::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(datapoints) = self.datapoints {
            params.push(("datapoints", datapoints.to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.to_string()));
        }
        if let Some(issue_type) = self.issue_type {
            params.push(("type", issue_type.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        params
    }
}

pub struct ServiceDeskClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceDeskClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<IssueRecord>, DataSourceError> {
        let params = query.params();
        debug!(url = %self.base_url, ?params, "fetching issues");

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Status {
                status,
                url: response.url().to_string(),
            });
        }

        let issues = response.json::<IssueListResponse>().await?.results;
        info!(count = issues.len(), "fetched issues from service desk");
        Ok(issues)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn omits_parameters_that_are_not_set() {
        assert!(IssueQuery::default().params().is_empty());

        let query = IssueQuery {
            datapoints: Some(50),
            priority: None,
            issue_type: Some(IssueType::Incident),
            status: Some(Status::Hold),
        };
        assert_eq!(
            query.params(),
            vec![
                ("datapoints", "50".to_string()),
                ("type", "incident".to_string()),
                ("status", "hold".to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_values_count_as_absent() {
        let query: IssueQuery = serde_json::from_value(serde_json::json!({
            "datapoints": "",
            "priority": "",
            "type": "Incident",
            "status": " ",
        }))
        .unwrap();
        assert_eq!(
            query,
            IssueQuery {
                issue_type: Some(IssueType::Incident),
                ..IssueQuery::default()
            }
        );

        let invalid = serde_json::from_value::<IssueQuery>(serde_json::json!({ "priority": "urgent" }));
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn sends_only_supplied_parameters() {
        let api = stub::spawn(
            StatusCode::OK,
            stub::results(serde_json::json!([stub::record(1, "high", "task", "open")])),
        )
        .await;
        let client = ServiceDeskClient::new(api.base_url.clone());

        let query = IssueQuery {
            datapoints: Some(500),
            priority: Some(Priority::High),
            ..IssueQuery::default()
        };
        let issues = client.fetch_issues(&query).await.unwrap();
        client.fetch_issues(&IssueQuery::default()).await.unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].priority, "high");
        assert_eq!(
            *api.queries.lock().unwrap(),
            vec!["datapoints=500&priority=high".to_string(), String::new()]
        );
    }

    #[tokio::test]
    async fn non_success_status_is_a_data_source_error() {
        let api = stub::spawn(StatusCode::BAD_GATEWAY, serde_json::json!({})).await;
        let client = ServiceDeskClient::new(api.base_url.clone());

        let err = client.fetch_issues(&IssueQuery::default()).await.unwrap_err();
        assert!(matches!(
            err,
            DataSourceError::Status { status, .. } if status == StatusCode::BAD_GATEWAY
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_data_source_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ServiceDeskClient::new(format!("http://{}/service-desk", addr));
        let err = client.fetch_issues(&IssueQuery::default()).await.unwrap_err();
        assert!(matches!(err, DataSourceError::Transport(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_a_data_source_error() {
        let api = stub::spawn(StatusCode::OK, serde_json::json!({ "results": "nope" })).await;
        let client = ServiceDeskClient::new(api.base_url.clone());

        let err = client.fetch_issues(&IssueQuery::default()).await.unwrap_err();
        assert!(matches!(err, DataSourceError::Transport(_)));
    }
}
