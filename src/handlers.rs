use crate::errors::AppError;
use crate::models::{
    Base64Upload, Form, FormPayload, FormStats, MessageResponse, Response, ResponsePayload,
    UploadResponse,
};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::ui::render_index;
use crate::uploads::{IncomingFile, UploadError};
use crate::{forms, responses};
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, Method, StatusCode, Uri},
    response::{Html, IntoResponse},
    Json,
};
use std::collections::HashMap;

const FORM_NOT_FOUND: &str = "Form not found";

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let forms = forms::list_forms(state.forms.as_ref()).await?;
    let all_responses = state.responses.list().await?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for response in &all_responses {
        *counts.entry(response.form_id.as_str()).or_default() += 1;
    }

    Ok(Html(render_index(&forms, &counts)))
}

pub async fn list_forms(State(state): State<AppState>) -> Result<Json<Vec<Form>>, AppError> {
    Ok(Json(forms::list_forms(state.forms.as_ref()).await?))
}

pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Form>, AppError> {
    forms::get_form(state.forms.as_ref(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(FORM_NOT_FOUND))
}

pub async fn create_form(
    State(state): State<AppState>,
    payload: Result<Json<FormPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Form>), AppError> {
    let Json(payload) = payload?;
    let form = forms::create_form(state.forms.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(form)))
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FormPayload>, JsonRejection>,
) -> Result<Json<Form>, AppError> {
    let Json(payload) = payload?;
    forms::update_form(state.forms.as_ref(), &id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(FORM_NOT_FOUND))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !forms::delete_form(state.forms.as_ref(), &id).await? {
        return Err(AppError::not_found(FORM_NOT_FOUND));
    }
    Ok(Json(MessageResponse {
        message: "Form deleted successfully".to_string(),
    }))
}

pub async fn submit_response(
    State(state): State<AppState>,
    payload: Result<Json<ResponsePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Response>), AppError> {
    let Json(payload) = payload?;
    let response = responses::submit_response(state.responses.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_responses(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<Vec<Response>>, AppError> {
    Ok(Json(
        responses::list_responses(state.responses.as_ref(), &form_id).await?,
    ))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> Result<Json<FormStats>, AppError> {
    let form_responses = responses::list_responses(state.responses.as_ref(), &form_id).await?;
    Ok(Json(build_stats(&form_responses)))
}

/// Takes a multipart `file` part, or JSON carrying a base64 `file` and its
/// `filename`.
pub async fn upload(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let incoming = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        read_multipart_file(multipart).await?
    } else {
        let Json(body) = Json::<Base64Upload>::from_request(request, &state).await?;
        IncomingFile::try_from(body)?
    };

    let url = state.uploads.store(&incoming.bytes, &incoming.filename).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            filename: incoming.filename,
        }),
    ))
}

async fn read_multipart_file(mut multipart: Multipart) -> Result<IncomingFile, UploadError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::Multipart(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or(UploadError::MissingFile)?;
        let bytes = field
            .bytes()
            .await
            .map_err(|err| UploadError::Multipart(err.to_string()))?;
        return Ok(IncomingFile {
            bytes: bytes.to_vec(),
            filename,
        });
    }
    Err(UploadError::MissingFile)
}

/// Known path, unhandled method. Preflight requests still succeed.
pub async fn method_fallback(method: Method) -> axum::response::Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    AppError::method_not_allowed().into_response()
}

/// Unrouted path. Anything under `/api` is an API resource used the wrong way
/// and gets 405; other paths are 404.
pub async fn not_found(method: Method, uri: Uri) -> axum::response::Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if is_api_path(uri.path()) {
        return AppError::method_not_allowed().into_response();
    }
    AppError::not_found("Not found").into_response()
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}
