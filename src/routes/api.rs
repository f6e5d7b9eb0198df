use axum::Json;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Field, IssueRecord};
use crate::service_desk_client::IssueQuery;
use crate::stats::{self, FieldPercentage};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageResolution {
    pub average_resolution_time: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatisfactionScore {
    pub satisfaction_score: Option<f64>,
}

fn breakdown(records: &[IssueRecord], field: Field) -> Vec<FieldPercentage> {
    let counts = stats::group_counts(records, field);
    stats::to_percentages(&counts, records.len()).unwrap_or_default()
}

pub async fn data(
    axum::extract::State(state): axum::extract::State<AppState>,
    axum::extract::Query(query): axum::extract::Query<IssueQuery>,
) -> Result<Json<Vec<IssueRecord>>, AppError> {
    let issues = state
        .client
        .fetch_issues(&query)
        .await
        .map_err(AppError::FetchData)?;
    Ok(Json(issues))
}

pub async fn priority(axum::extract::State(state): axum::extract::State<AppState>) -> Result<Json<Vec<FieldPercentage>>, AppError> {
    let issues = state.client.fetch_issues(&IssueQuery::default()).await?;
    Ok(Json(breakdown(&issues, Field::Priority)))
}

pub async fn issue_type(axum::extract::State(state): axum::extract::State<AppState>) -> Result<Json<Vec<FieldPercentage>>, AppError> {
    let query = IssueQuery::with_datapoints(state.config.issue_type_datapoints);
    let issues = state.client.fetch_issues(&query).await?;
    Ok(Json(breakdown(&issues, Field::Type)))
}

pub async fn average_high_issue_time(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<AverageResolution>, AppError> {
    let issues = state.client.fetch_issues(&IssueQuery::default()).await?;
    Ok(Json(AverageResolution {
        average_resolution_time: stats::average_close_time(&issues)?,
    }))
}

pub async fn max_score(axum::extract::State(state): axum::extract::State<AppState>) -> Result<Json<SatisfactionScore>, AppError> {
    let issues = state.client.fetch_issues(&IssueQuery::default()).await?;
    Ok(Json(SatisfactionScore {
        satisfaction_score: stats::latest_solved_high_score(&issues)?,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{get, spawn_app};
    use crate::service_desk_client::stub;
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn solved_high(id: i64, created: &str, updated: &str, score: Option<f64>) -> serde_json::Value {
        let mut record = stub::record(id, "HIGH", "incident", "Solved");
        record["created"] = json!(created);
        record["updated"] = json!(updated);
        if let Some(score) = score {
            record["satisfaction_rating"] = json!({ "score": score });
        }
        record
    }

    #[tokio::test]
    async fn data_forwards_filters_and_returns_records() {
        let (app, api) = spawn_app(
            StatusCode::OK,
            json!([stub::record(1, "high", "task", "open"), stub::record(2, "low", "question", "new")]),
        )
        .await;

        let (status, body) = get(app, "/api/data?datapoints=10&type=Task&status=open").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["type"], "task");
        assert_eq!(
            *api.queries.lock().unwrap(),
            vec!["datapoints=10&type=task&status=open".to_string()]
        );
    }

    #[tokio::test]
    async fn data_treats_empty_parameters_as_absent() {
        let (app, api) = spawn_app(StatusCode::OK, json!([stub::record(1, "high", "task", "open")])).await;

        let (status, body) = get(app, "/api/data?datapoints=&priority=&type=&status=solved").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(*api.queries.lock().unwrap(), vec!["status=solved".to_string()]);
    }

    #[tokio::test]
    async fn data_reports_upstream_failure_as_500() {
        let (app, _api) = spawn_app(StatusCode::SERVICE_UNAVAILABLE, json!([])).await;

        let (status, body) = get(app, "/api/data").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch data" }));
    }

    #[tokio::test]
    async fn priority_breakdown_ignores_case() {
        let (app, api) = spawn_app(
            StatusCode::OK,
            json!([
                stub::record(1, "HIGH", "task", "open"),
                stub::record(2, "high", "task", "open"),
                stub::record(3, "low", "task", "open"),
                stub::record(4, "Low", "task", "open"),
            ]),
        )
        .await;

        let (status, body) = get(app, "/api/priority").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "field": "high", "percentage": "50.00" },
                { "field": "low", "percentage": "50.00" },
            ])
        );
        assert_eq!(*api.queries.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn issue_type_breakdown_requests_configured_datapoints() {
        let (app, api) = spawn_app(
            StatusCode::OK,
            json!([
                stub::record(1, "low", "task", "open"),
                stub::record(2, "low", "task", "open"),
                stub::record(3, "low", "question", "open"),
            ]),
        )
        .await;

        let (_, body) = get(app, "/api/issue-type").await;

        assert_eq!(
            body,
            json!([
                { "field": "task", "percentage": "66.67" },
                { "field": "question", "percentage": "33.33" },
            ])
        );
        assert_eq!(*api.queries.lock().unwrap(), vec!["datapoints=500".to_string()]);
    }

    #[tokio::test]
    async fn breakdown_of_no_records_is_empty() {
        let (app, _api) = spawn_app(StatusCode::OK, json!([])).await;

        let (status, body) = get(app, "/api/priority").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn average_high_issue_time_in_milliseconds() {
        let (app, _api) = spawn_app(
            StatusCode::OK,
            json!([
                solved_high(1, "2024-01-01T00:00:00Z", "2024-01-01T01:00:00Z", None),
                stub::record(2, "low", "task", "solved"),
            ]),
        )
        .await;

        let (status, body) = get(app, "/api/average-high-issue-time").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "averageResolutionTime": 3600000.0 }));
    }

    #[tokio::test]
    async fn average_high_issue_time_without_candidates_is_null() {
        let (app, _api) = spawn_app(StatusCode::OK, json!([])).await;

        let (_, body) = get(app, "/api/average-high-issue-time").await;

        assert_eq!(body, json!({ "averageResolutionTime": null }));
    }

    #[tokio::test]
    async fn malformed_timestamp_is_a_500() {
        let (app, _api) = spawn_app(
            StatusCode::OK,
            json!([solved_high(1, "sometime", "2024-01-01T01:00:00Z", None)]),
        )
        .await;

        let (status, body) = get(app, "/api/average-high-issue-time").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }

    #[tokio::test]
    async fn max_score_of_latest_solved_high_issue() {
        let (app, _api) = spawn_app(
            StatusCode::OK,
            json!([
                solved_high(1, "2024-01-01T00:00:00Z", "2024-01-04T00:00:00Z", Some(3.0)),
                solved_high(2, "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z", Some(5.0)),
            ]),
        )
        .await;

        let (_, body) = get(app, "/api/max-score").await;

        assert_eq!(body, json!({ "satisfactionScore": 3.0 }));
    }

    #[tokio::test]
    async fn max_score_without_rating_is_null() {
        let (app, _api) = spawn_app(
            StatusCode::OK,
            json!([solved_high(1, "2024-01-01T00:00:00Z", "2024-01-04T00:00:00Z", None)]),
        )
        .await;

        let (_, body) = get(app, "/api/max-score").await;

        assert_eq!(body, json!({ "satisfactionScore": null }));
    }
}
