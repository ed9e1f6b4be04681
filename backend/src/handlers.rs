use crate::analytics::{
    self, area_metrics, export_tables, group_fields, parse_dimensions, weak_areas, AnalyticsReport,
    AnalyticsRequest, ExportTables, GroupDimension, SortDirection, SortSpec,
};
use crate::error::{AppError, ErrorDetail};
use crate::models::{validate_paper, validate_response, Paper, Response, Student};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use validator::Validate;

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// Comma separated grouping dimensions, outermost first.
    pub group_by: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub threshold: Option<f64>,
}

impl AnalyticsQuery {
    fn validated(&self, req_id: &str) -> Result<(), AppError> {
        self.validate().map_err(|errs| {
            let details = errs
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |e| ErrorDetail {
                        field: field.to_string(),
                        issue: e.code.to_string(),
                    })
                })
                .collect();
            AppError::validation("invalid query parameters", req_id).with_details(details)
        })
    }

    fn dimensions(&self, limit: usize) -> Vec<GroupDimension> {
        self.group_by
            .as_deref()
            .map(|csv| parse_dimensions(csv, limit))
            .unwrap_or_default()
    }

    fn sort(&self, req_id: &str) -> Result<Option<SortSpec>, AppError> {
        let Some(raw) = self.sort_by.as_deref().filter(|v| !v.trim().is_empty()) else {
            return Ok(None);
        };
        let metric = analytics::sort::parse_metric(raw)
            .ok_or_else(|| AppError::validation("sortBy must be correct, incorrect or unattempted", req_id))?;
        let direction = match self.order.as_deref().filter(|v| !v.trim().is_empty()) {
            None => SortDirection::Desc,
            Some(order) => SortDirection::parse(order)
                .ok_or_else(|| AppError::validation("order must be asc or desc", req_id))?,
        };
        Ok(Some(SortSpec { metric, direction }))
    }

    fn request(&self, state: &AppState, student: bool, req_id: &str) -> Result<AnalyticsRequest, AppError> {
        self.validated(req_id)?;
        let dimensions = self.dimensions(state.config.max_group_dimensions);
        let request = if student {
            AnalyticsRequest::student(dimensions)
        } else {
            AnalyticsRequest::class(dimensions)
        };
        Ok(request.sorted(self.sort(req_id)?))
    }
}

pub async fn create_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(paper): Json<Paper>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let req_id = request_id_from_headers(&headers);
    if let Err(issues) = validate_paper(&paper) {
        return Err(AppError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            "paper validation failed",
            req_id,
        )
        .with_details(issues.into_iter().map(ErrorDetail::from).collect()));
    }
    let id = state.create_paper(paper).await;
    info!(paper_id = id, "paper created");
    Ok((StatusCode::CREATED, Json(json!({ "paperId": id }))))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSummary {
    pub id: i64,
    pub title: String,
    pub sections: usize,
    pub questions: usize,
}

#[derive(Debug, Serialize)]
pub struct PaperListResponse {
    pub items: Vec<PaperSummary>,
    pub total: usize,
}

pub async fn list_papers(State(state): State<AppState>) -> Json<PaperListResponse> {
    let papers = state.db.papers.read().await;
    let mut items: Vec<PaperSummary> = papers
        .values()
        .map(|p| PaperSummary {
            id: p.id,
            title: p.title.clone(),
            sections: p.sections.len(),
            questions: p.questions().count(),
        })
        .collect();
    items.sort_by_key(|p| p.id);
    Json(PaperListResponse { total: items.len(), items })
}

pub async fn get_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Paper>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let paper = state.paper(id).await.map_err(|e| AppError::from_store(e, req_id))?;
    Ok(Json(paper))
}

pub async fn submit_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<i64>,
    Json(response): Json<Response>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let req_id = request_id_from_headers(&headers);
    if let Err(issues) = validate_response(&response) {
        return Err(AppError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            "response validation failed",
            req_id,
        )
        .with_details(issues.into_iter().map(ErrorDetail::from).collect()));
    }
    let roll_number = response.student.roll_number.clone();
    let id = state
        .submit_response(paper_id, response)
        .await
        .map_err(|e| AppError::from_store(e, req_id))?;
    info!(paper_id, response_id = id, roll_number = %roll_number, "response submitted");
    Ok((StatusCode::CREATED, Json(json!({ "responseId": id }))))
}

pub async fn list_responses(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    state.paper(paper_id).await.map_err(|e| AppError::from_store(e, req_id))?;
    let items = state.responses_for_paper(paper_id).await;
    Ok(Json(json!({ "total": items.len(), "items": items })))
}

pub async fn paper_group_fields(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let paper = state.paper(paper_id).await.map_err(|e| AppError::from_store(e, req_id))?;
    Ok(Json(json!({
        "items": group_fields(paper.questions()),
        "maxDimensions": state.config.max_group_dimensions
    })))
}

/// Paper plus its responses, or the upstream not-found error.
async fn class_inputs(state: &AppState, paper_id: i64, req_id: &str) -> Result<(Paper, Vec<Response>), AppError> {
    let paper = state.paper(paper_id).await.map_err(|e| AppError::from_store(e, req_id))?;
    let responses = state.responses_for_paper(paper_id).await;
    Ok((paper, responses))
}

pub async fn class_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let request = query.request(&state, false, &req_id)?;
    let (paper, responses) = class_inputs(&state, paper_id, &req_id).await?;
    debug!(paper_id, responses = responses.len(), dimensions = request.dimensions.len(), "class analytics");
    let tree = analytics::analyze(&paper, responses, &request);
    Ok(Json(AnalyticsReport::new(&request, tree)))
}

pub async fn class_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ExportTables>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let request = query.request(&state, false, &req_id)?;
    let (paper, responses) = class_inputs(&state, paper_id, &req_id).await?;
    let tree = analytics::analyze(&paper, responses, &request);
    Ok(Json(export_tables(&tree, &request.dimensions, request.sort, None)))
}

pub async fn class_areas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let request = query.request(&state, false, &req_id)?;
    let threshold = query.threshold.unwrap_or(state.config.weak_area_threshold);
    let (paper, responses) = class_inputs(&state, paper_id, &req_id).await?;
    let tree = analytics::analyze(&paper, responses, &request);
    let students = area_metrics(&tree, &request.dimensions, request.sort, None);
    let weak = weak_areas(&students, threshold);
    Ok(Json(json!({
        "threshold": threshold,
        "students": students,
        "weakAreas": weak
    })))
}

async fn student_inputs(state: &AppState, response_id: i64, req_id: &str) -> Result<(Paper, Response), AppError> {
    let response = state.response(response_id).await.map_err(|e| AppError::from_store(e, req_id))?;
    let paper = state
        .paper(response.paper_id)
        .await
        .map_err(|e| AppError::from_store(e, req_id))?;
    Ok((paper, response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub paper_id: i64,
    pub response_id: i64,
    pub student: Student,
    pub report: AnalyticsReport,
}

pub async fn student_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(response_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<StudentReport>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let request = query.request(&state, true, &req_id)?;
    let (paper, response) = student_inputs(&state, response_id, &req_id).await?;
    let student = response.student.clone();
    let tree = analytics::analyze(&paper, vec![response], &request);
    Ok(Json(StudentReport {
        paper_id: paper.id,
        response_id,
        student,
        report: AnalyticsReport::new(&request, tree),
    }))
}

pub async fn student_areas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(response_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req_id = request_id_from_headers(&headers);
    let request = query.request(&state, true, &req_id)?;
    let threshold = query.threshold.unwrap_or(state.config.weak_area_threshold);
    let (paper, response) = student_inputs(&state, response_id, &req_id).await?;
    let student = response.student.clone();
    let tree = analytics::analyze(&paper, vec![response], &request);
    let areas = area_metrics(&tree, &request.dimensions, request.sort, Some(&student));
    let weak = weak_areas(&areas, threshold);
    Ok(Json(json!({
        "threshold": threshold,
        "student": student,
        "areas": areas.into_iter().next().map(|m| m.areas).unwrap_or_default(),
        "weakAreas": weak.into_iter().next().map(|m| m.areas).unwrap_or_default()
    })))
}
