//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::StaffUser;
use crate::domain::{NewPayment, OperationContext, PlanId, Student, StudentInput};
use crate::error::AppError;
use crate::handlers::{
    AddPaymentCommand, AddPaymentHandler, AddPaymentResult, CreateStudentCommand,
    CreateStudentHandler, DeleteStudentCommand, DeleteStudentHandler, LedgerSummary,
    LoginCommand, LoginHandler, LoginResult, LogoutHandler, RegisterStaffCommand,
    RegisterStaffHandler, StudentLookup, StudentQueries, UpdateStudentCommand,
    UpdateStudentHandler,
};

use super::middleware::BearerToken;
use super::state::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
    pub count: usize,
}

impl From<Vec<Student>> for StudentListResponse {
    fn from(students: Vec<Student>) -> Self {
        Self {
            count: students.len(),
            students,
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Routes that require a bearer token
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/students", post(create_student).get(list_students))
        .route(
            "/students/by-mobile/:mobile_number",
            get(get_by_mobile).delete(delete_by_mobile),
        )
        .route(
            "/students/by-application/:application_number",
            get(get_by_application),
        )
        .route(
            "/students/by-national-id/:national_id_number",
            get(get_by_national_id),
        )
        .route("/students/by-plan/:plan", get(list_by_plan))
        .route(
            "/students/:application_number",
            put(update_student).delete(delete_by_application),
        )
        .route("/students/:application_number/payments", post(add_payment))
        .route("/students/:application_number/ledger", get(get_ledger))
        .route("/auth/staff", post(register_staff))
        .route("/auth/logout", post(logout))
}

/// Routes open to anonymous callers
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn queries(state: &AppState) -> StudentQueries {
    StudentQueries::new(
        state.students.clone(),
        state.assembler.clone(),
        state.retry,
        state.list_limit,
    )
}

// =========================================================================
// POST /students
// =========================================================================

async fn create_student(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(input): Json<StudentInput>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let handler =
        CreateStudentHandler::new(state.students.clone(), state.assembler.clone(), state.retry);

    let student = handler
        .execute(CreateStudentCommand::new(input), &context)
        .await?;

    Ok((StatusCode::CREATED, Json(student)))
}

// =========================================================================
// GET /students
// =========================================================================

async fn list_students(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<StudentListResponse>, AppError> {
    let students = queries(&state).list(query.limit, &context).await?;
    Ok(Json(students.into()))
}

// =========================================================================
// GET /students/by-*
// =========================================================================

async fn get_by_mobile(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(mobile_number): Path<String>,
) -> Result<Json<Student>, AppError> {
    let lookup = StudentLookup::MobileNumber(mobile_number);
    Ok(Json(queries(&state).get(&lookup, &context).await?))
}

async fn get_by_application(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(application_number): Path<String>,
) -> Result<Json<Student>, AppError> {
    let lookup = StudentLookup::ApplicationNumber(application_number);
    Ok(Json(queries(&state).get(&lookup, &context).await?))
}

async fn get_by_national_id(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(national_id_number): Path<String>,
) -> Result<Json<Student>, AppError> {
    let lookup = StudentLookup::NationalId(national_id_number);
    Ok(Json(queries(&state).get(&lookup, &context).await?))
}

async fn list_by_plan(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(plan): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<StudentListResponse>, AppError> {
    let students = queries(&state)
        .list_by_plan(&PlanId::new(plan), query.limit, &context)
        .await?;
    Ok(Json(students.into()))
}

// =========================================================================
// PUT /students/:application_number
// =========================================================================

async fn update_student(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(application_number): Path<String>,
    Json(input): Json<StudentInput>,
) -> Result<Json<Student>, AppError> {
    let handler =
        UpdateStudentHandler::new(state.students.clone(), state.assembler.clone(), state.retry);

    let student = handler
        .execute(UpdateStudentCommand::new(application_number, input), &context)
        .await?;

    Ok(Json(student))
}

// =========================================================================
// DELETE /students/...
// =========================================================================

async fn delete_by_mobile(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(mobile_number): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_student(&state, StudentLookup::MobileNumber(mobile_number), &context).await
}

async fn delete_by_application(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(application_number): Path<String>,
) -> Result<StatusCode, AppError> {
    delete_student(
        &state,
        StudentLookup::ApplicationNumber(application_number),
        &context,
    )
    .await
}

async fn delete_student(
    state: &AppState,
    lookup: StudentLookup,
    context: &OperationContext,
) -> Result<StatusCode, AppError> {
    DeleteStudentHandler::new(state.students.clone(), state.retry)
        .execute(DeleteStudentCommand::new(lookup), context)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// POST /students/:application_number/payments
// =========================================================================

async fn add_payment(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(application_number): Path<String>,
    Json(payment): Json<NewPayment>,
) -> Result<(StatusCode, Json<AddPaymentResult>), AppError> {
    let handler =
        AddPaymentHandler::new(state.students.clone(), state.assembler.clone(), state.retry);

    let result = handler
        .execute(AddPaymentCommand::new(application_number, payment), &context)
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

// =========================================================================
// GET /students/:application_number/ledger
// =========================================================================

async fn get_ledger(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(application_number): Path<String>,
) -> Result<Json<LedgerSummary>, AppError> {
    let summary = queries(&state)
        .ledger(&application_number, &context)
        .await?;
    Ok(Json(summary))
}

// =========================================================================
// /auth
// =========================================================================

async fn register(
    State(state): State<AppState>,
    Json(command): Json<RegisterStaffCommand>,
) -> Result<(StatusCode, Json<StaffUser>), AppError> {
    let user = RegisterStaffHandler::new(state.users.clone())
        .execute(command, &OperationContext::new())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn register_staff(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(command): Json<RegisterStaffCommand>,
) -> Result<(StatusCode, Json<StaffUser>), AppError> {
    let user = RegisterStaffHandler::new(state.users.clone())
        .execute(command, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    Json(command): Json<LoginCommand>,
) -> Result<Json<LoginResult>, AppError> {
    let result = LoginHandler::new(state.users.clone(), state.gate.clone())
        .execute(command)
        .await?;
    Ok(Json(result))
}

async fn logout(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<StatusCode, AppError> {
    LogoutHandler::new(state.gate.clone())
        .execute(&token, &context)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
