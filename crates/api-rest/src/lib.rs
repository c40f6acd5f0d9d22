//! # API REST
//!
//! REST API implementation for the triage service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for wire types, authentication and health checks. All case logic lives in
//! `triage-core`; handlers translate requests, call the [`WorkflowEngine`] on the blocking pool
//! and map [`TriageError`] kinds onto HTTP status codes.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::{
    actor_from_headers, validate_api_key, AuthError, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER,
    API_KEY_HEADER,
};
use api_shared::dto::{
    ActionRes, AppointmentRes, BodyAreaRes, BookAppointmentReq, CatalogueRes, ClassifyReq,
    ClassifyRes, CreateSubmissionReq, CreateSubmissionRes, ErrorRes, GuidanceRes, HealthRes,
    RecordActionReq, SubmissionRes, SummaryRes, UpdateAppointmentReq, UpdateStatusReq,
};
use api_shared::HealthService;
use triage_core::{
    classifier, Actor, ActorId, AppointmentFilter, AppointmentId, CoreConfig, ErrorKind, PatientId,
    RawConfig, SubmissionId, SubmissionQuery, TriageError, TriageResult, WorkflowEngine,
};

/// Resolves the store configuration from the `TRIAGE_*` environment variables.
///
/// Call once at startup; handlers never read the environment.
pub fn config_from_env() -> TriageResult<CoreConfig> {
    RawConfig {
        database_path: std::env::var("TRIAGE_DATABASE_PATH").ok(),
        store_max_attempts: std::env::var("TRIAGE_STORE_MAX_ATTEMPTS").ok(),
        store_backoff_ms: std::env::var("TRIAGE_STORE_BACKOFF_MS").ok(),
        store_busy_timeout_ms: std::env::var("TRIAGE_STORE_BUSY_TIMEOUT_MS").ok(),
    }
    .resolve()
}

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<WorkflowEngine>,
    api_key: Option<Arc<str>>,
}

impl AppState {
    /// `api_key = None` disables the API-key check.
    pub fn new(engine: WorkflowEngine, api_key: Option<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    /// Runs a workflow call on the blocking pool; store adapters may block on I/O or backoff.
    async fn run<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&WorkflowEngine) -> TriageResult<T> + Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || call(&engine))
            .await
            .map_err(|e| {
                tracing::error!("workflow task failed: {:?}", e);
                ApiError::internal()
            })?
            .map_err(ApiError::from)
    }
}

/// Error response: a status code plus a JSON `{ "error": ... }` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal error".into(),
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            ErrorKind::NotFound => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
            },
            ErrorKind::StoreUnavailable => {
                tracing::error!("case store unavailable: {:?}", err);
                Self {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "Service temporarily unavailable".into(),
                }
            }
            ErrorKind::InvalidInput | ErrorKind::Config => {
                tracing::error!("unexpected workflow error: {:?}", err);
                Self::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AuthError::InvalidActor(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorRes {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_submissions,
        create_submission,
        submission_summary,
        get_submission,
        update_submission_status,
        list_actions,
        record_action,
        list_appointments,
        book_appointment,
        update_appointment,
        classify,
        catalogue,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        CreateSubmissionReq,
        CreateSubmissionRes,
        SubmissionRes,
        GuidanceRes,
        UpdateStatusReq,
        SummaryRes,
        RecordActionReq,
        ActionRes,
        BookAppointmentReq,
        UpdateAppointmentReq,
        AppointmentRes,
        ClassifyReq,
        ClassifyRes,
        CatalogueRes,
        BodyAreaRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `state`.
///
/// `/health` and the Swagger UI are open; every other route requires the API key when one is
/// configured.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/submissions", get(list_submissions).post(create_submission))
        .route("/submissions/summary", get(submission_summary))
        .route(
            "/submissions/:id",
            get(get_submission).patch(update_submission_status),
        )
        .route("/submissions/:id/actions", get(list_actions))
        .route("/gp-actions", post(record_action))
        .route(
            "/appointments",
            get(list_appointments).post(book_appointment),
        )
        .route("/appointments/:id", patch(update_appointment))
        .route("/triage/classify", post(classify))
        .route("/catalogue", get(catalogue))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    validate_api_key(
        state.api_key.as_deref(),
        header(request.headers(), API_KEY_HEADER),
    )?;
    Ok(next.run(request).await)
}

/// Caller identity asserted by the identity headers, if any.
fn caller(headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
    Ok(actor_from_headers(
        header(headers, ACTOR_ID_HEADER),
        header(headers, ACTOR_ROLE_HEADER),
    )?)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Patients only ever see their own cases.
fn patient_scope(caller: Option<&Actor>) -> Result<Option<PatientId>, ApiError> {
    match caller {
        Some(actor) if !actor.is_clinician() => Ok(Some(actor.as_patient()?)),
        _ => Ok(None),
    }
}

/// Parses an id or enum field; bad input is a `Validation` error.
fn parse_field<T>(value: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = TriageError>,
{
    value.parse::<T>().map_err(ApiError::from)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionListParams {
    /// Restrict to one patient's submissions.
    pub patient_id: Option<String>,
    /// Case-insensitive match over first name, last name and id.
    pub search: Option<String>,
    /// `green`, `amber` or `red`.
    pub triage: Option<String>,
    /// `pending-review` or `reviewed`.
    pub status: Option<String>,
}

impl SubmissionListParams {
    fn into_query(self) -> TriageResult<SubmissionQuery> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(SubmissionQuery {
            patient_id: non_blank(self.patient_id)
                .map(PatientId::parse)
                .transpose()?,
            search: non_blank(self.search),
            triage: non_blank(self.triage).map(|t| t.parse()).transpose()?,
            status: non_blank(self.status).map(|s| s.parse()).transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentListParams {
    /// Takes precedence over `submission_id`.
    pub patient_id: Option<String>,
    pub submission_id: Option<String>,
}

impl AppointmentListParams {
    fn into_filter(self) -> TriageResult<AppointmentFilter> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(patient) = non_blank(self.patient_id) {
            return Ok(AppointmentFilter::Patient(PatientId::parse(patient)?));
        }
        if let Some(submission) = non_blank(self.submission_id) {
            return Ok(AppointmentFilter::Submission(SubmissionId::parse(submission)?));
        }
        Ok(AppointmentFilter::All)
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/submissions",
    params(SubmissionListParams),
    responses(
        (status = 200, description = "Submissions, newest first", body = [SubmissionRes]),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 503, description = "Case store unavailable", body = ErrorRes)
    )
)]
/// List submissions, optionally filtered.
///
/// A patient caller only sees their own submissions, whatever `patient_id` says.
#[axum::debug_handler]
async fn list_submissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SubmissionListParams>,
) -> Result<Json<Vec<SubmissionRes>>, ApiError> {
    let caller = caller(&headers)?;
    let mut query = params.into_query()?;
    if let Some(own) = patient_scope(caller.as_ref())? {
        query.patient_id = Some(own);
    }
    let submissions = state
        .run(move |engine| engine.query_submissions(&query))
        .await?;
    Ok(Json(submissions.iter().map(SubmissionRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/submissions",
    request_body = CreateSubmissionReq,
    responses(
        (status = 201, description = "Submission created", body = CreateSubmissionRes),
        (status = 400, description = "Invalid symptom report", body = ErrorRes),
        (status = 503, description = "Case store unavailable", body = ErrorRes)
    )
)]
/// Submit a symptom report for triage.
#[axum::debug_handler]
async fn create_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSubmissionReq>,
) -> Result<(StatusCode, Json<CreateSubmissionRes>), ApiError> {
    let caller = caller(&headers)?;
    let (requested_patient, report) = req.into_parts()?;
    let patient_id = patient_scope(caller.as_ref())?.or(requested_patient);

    let submission = state
        .run(move |engine| engine.create_submission(patient_id, &report))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSubmissionRes {
            guidance: GuidanceRes::for_level(submission.triage_level),
            submission: SubmissionRes::from(&submission),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/submissions/summary",
    responses(
        (status = 200, description = "Caseload counts", body = SummaryRes),
        (status = 503, description = "Case store unavailable", body = ErrorRes)
    )
)]
/// Dashboard counts over the caller's visible caseload.
#[axum::debug_handler]
async fn submission_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SummaryRes>, ApiError> {
    let scope = patient_scope(caller(&headers)?.as_ref())?;
    let summary = state
        .run(move |engine| engine.summary(scope.as_ref()))
        .await?;
    Ok(Json(summary.into()))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    params(("id" = String, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission", body = SubmissionRes),
        (status = 404, description = "Submission not found", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_submission(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SubmissionRes>, ApiError> {
    let id: SubmissionId = parse_field(&id)?;
    let submission = state.run(move |engine| engine.get_submission(&id)).await?;
    Ok(Json(SubmissionRes::from(&submission)))
}

#[utoipa::path(
    patch,
    path = "/submissions/{id}",
    params(("id" = String, Path, description = "Submission id")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status overwritten", body = SubmissionRes),
        (status = 400, description = "Unrecognised status", body = ErrorRes),
        (status = 404, description = "Submission not found", body = ErrorRes)
    )
)]
/// Manually overwrite a submission's status.
#[axum::debug_handler]
async fn update_submission_status(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<SubmissionRes>, ApiError> {
    let id: SubmissionId = parse_field(&id)?;
    let status = parse_field(req.status.trim())?;
    let submission = state
        .run(move |engine| engine.update_status(&id, status))
        .await?;
    Ok(Json(SubmissionRes::from(&submission)))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}/actions",
    params(("id" = String, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Actions, newest first", body = [ActionRes])
    )
)]
#[axum::debug_handler]
async fn list_actions(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<Vec<ActionRes>>, ApiError> {
    let id: SubmissionId = parse_field(&id)?;
    let actions = state.run(move |engine| engine.list_actions(&id)).await?;
    Ok(Json(actions.iter().map(ActionRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/gp-actions",
    request_body = RecordActionReq,
    responses(
        (status = 201, description = "Action recorded", body = ActionRes),
        (status = 400, description = "Bad request", body = ErrorRes)
    )
)]
/// Record a GP action. A `review` marks a pending submission reviewed.
#[axum::debug_handler]
async fn record_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RecordActionReq>,
) -> Result<(StatusCode, Json<ActionRes>), ApiError> {
    let caller = caller(&headers)?;
    let submission_id: SubmissionId = parse_field(&req.submission_id)?;
    let action_type = parse_field(req.action_type.trim())?;
    let actor_id = match caller {
        Some(actor) => Some(actor.id),
        None => req
            .actor_id
            .filter(|a| !a.trim().is_empty())
            .map(|a| parse_field::<ActorId>(&a))
            .transpose()?,
    };

    let action = state
        .run(move |engine| engine.record_action(submission_id, actor_id, action_type, req.notes))
        .await?;
    Ok((StatusCode::CREATED, Json(ActionRes::from(&action))))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(AppointmentListParams),
    responses(
        (status = 200, description = "Appointments", body = [AppointmentRes])
    )
)]
/// List appointments by patient, by submission, or all.
///
/// Patient and unfiltered listings are soonest first; submission listings are most recently
/// booked first.
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AppointmentListParams>,
) -> Result<Json<Vec<AppointmentRes>>, ApiError> {
    let filter = match patient_scope(caller(&headers)?.as_ref())? {
        Some(own) => AppointmentFilter::Patient(own),
        None => params.into_filter()?,
    };
    let appointments = state
        .run(move |engine| engine.list_appointments(&filter))
        .await?;
    Ok(Json(appointments.iter().map(AppointmentRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentRes),
        (status = 400, description = "Hospital, date and time are required", body = ErrorRes)
    )
)]
/// Book a hospital appointment. Linked bookings are logged as a referral.
#[axum::debug_handler]
async fn book_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BookAppointmentReq>,
) -> Result<(StatusCode, Json<AppointmentRes>), ApiError> {
    let caller = caller(&headers)?;
    let mut booking = req.into_booking()?;
    if let Some(actor) = caller {
        booking.actor_id = Some(actor.id);
    }
    let appointment = state
        .run(move |engine| engine.book_appointment(booking))
        .await?;
    Ok((StatusCode::CREATED, Json(AppointmentRes::from(&appointment))))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = UpdateAppointmentReq,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Appointment not found", body = ErrorRes)
    )
)]
/// Cancel, confirm or reschedule an appointment.
///
/// A date and time reschedule and reconfirm the booking, taking precedence over `status`.
#[axum::debug_handler]
async fn update_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateAppointmentReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let id: AppointmentId = parse_field(&id)?;
    let patch = req.into_patch()?;
    let appointment = state
        .run(move |engine| engine.update_appointment(&id, patch))
        .await?;
    Ok(Json(AppointmentRes::from(&appointment)))
}

#[utoipa::path(
    post,
    path = "/triage/classify",
    request_body = ClassifyReq,
    responses(
        (status = 200, description = "Triage level and guidance", body = ClassifyRes),
        (status = 400, description = "Severity or duration out of range", body = ErrorRes)
    )
)]
/// Classify a severity/duration pair without recording anything.
#[axum::debug_handler]
async fn classify(
    State(_state): State<AppState>,
    Json(req): Json<ClassifyReq>,
) -> Result<Json<ClassifyRes>, ApiError> {
    let level = classifier::classify_raw(req.severity, &req.duration).map_err(|e| match e {
        TriageError::InvalidInput(msg) => TriageError::Validation(msg),
        other => other,
    })?;
    Ok(Json(ClassifyRes {
        triage_level: level.to_string(),
        guidance: GuidanceRes::for_level(level),
    }))
}

#[utoipa::path(
    get,
    path = "/catalogue",
    responses(
        (status = 200, description = "Symptom form options", body = CatalogueRes)
    )
)]
#[axum::debug_handler]
async fn catalogue(State(_state): State<AppState>) -> Json<CatalogueRes> {
    Json(CatalogueRes::current())
}
