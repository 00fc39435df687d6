//! Route handlers

use super::AppState;
use crate::error::{Error, Result};
use crate::namespace::{sanitize_upload_path, validate_namespace, UploadKind};
use axum::{
    body::Bytes,
    extract::{multipart::Multipart, rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

const MODEL_NAME_FIELD: &str = "modelName";
const RAG_FILES_FIELD: &str = "ragFiles";
const FINETUNE_FILES_FIELD: &str = "fineTuneFiles";

/// A file part buffered from the multipart body
struct UploadedFile {
    kind: UploadKind,
    name: String,
    data: Bytes,
}

impl UploadedFile {
    fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Read every part before validating, so field order does not matter
async fn read_upload_form(
    multipart: &mut Multipart,
) -> Result<(Option<String>, Vec<UploadedFile>, bool)> {
    let mut model_name = None;
    let mut files = Vec::new();
    let mut saw_file_part = false;

    let malformed = |e: axum::extract::multipart::MultipartError| {
        Error::InvalidRequest(format!("Malformed multipart body: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let field_name = field.name().map(str::to_string);
        let kind = match field_name.as_deref() {
            Some(MODEL_NAME_FIELD) => {
                model_name = Some(field.text().await.map_err(malformed)?);
                continue;
            }
            Some(RAG_FILES_FIELD) => UploadKind::Rag,
            Some(FINETUNE_FILES_FIELD) => UploadKind::FineTune,
            other => {
                debug!("Ignoring multipart field {:?}", other);
                continue;
            }
        };

        saw_file_part = true;
        let name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(malformed)?;
        files.push(UploadedFile { kind, name, data });
    }

    Ok((model_name, files, saw_file_part))
}

/// POST /upload - store documents for a model and build its pipeline
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let (model_name, files, saw_file_part) = read_upload_form(&mut multipart).await?;

    let model_name = model_name
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::InvalidRequest("Model name is required".to_string()))?;

    state.namespaces.create(&model_name).await?;

    if !saw_file_part {
        return Err(Error::InvalidRequest(
            "No files part in the request".to_string(),
        ));
    }

    let files: Vec<UploadedFile> = files.into_iter().filter(|f| !f.is_empty()).collect();
    if files.is_empty() {
        return Err(Error::InvalidRequest("No files uploaded".to_string()));
    }

    // Reject the whole upload before anything touches disk
    for file in &files {
        sanitize_upload_path(&file.name)?;
    }

    let mut rag_files = Vec::new();
    let mut finetune_files = Vec::new();
    for file in &files {
        let saved = state
            .namespaces
            .save_upload(&model_name, file.kind, &file.name, &file.data)
            .await?;
        match file.kind {
            UploadKind::Rag => rag_files.push(saved),
            UploadKind::FineTune => finetune_files.push(saved),
        }
    }

    info!(
        "Saved {} RAG and {} fine-tune files for '{}'",
        rag_files.len(),
        finetune_files.len(),
        model_name
    );

    let ready = match state.pipeline.build(&model_name).await {
        Ok(_) => true,
        Err(Error::NoDocuments(_)) => false,
        Err(e) => return Err(e),
    };

    Ok(Json(json!({
        "uploaded_files": {
            "ragFiles": rag_files,
            "fineTuneFiles": finetune_files,
        },
        "RAG Pipeline ready": ready,
    })))
}

/// GET /models - list model names
pub async fn list_models(State(state): State<AppState>) -> Result<Json<Value>> {
    let models = state.namespaces.list().await?;
    Ok(Json(json!({ "models": models })))
}

#[derive(Debug, Deserialize)]
pub struct RagRequest {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// POST /rag - answer a question from a model's documents
pub async fn rag(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RagRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let required = || Error::InvalidRequest("Model name and query are required".to_string());

    let Json(request) = payload.map_err(|e| {
        debug!("Rejected /rag body: {}", e);
        required()
    })?;

    let model_name = request
        .model_name
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(required)?;
    let query = request
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(required)?;

    let answer = state.pipeline.query(model_name.trim(), &query).await?;
    Ok(Json(json!({ "results": answer.answer })))
}

/// POST /finetune/{model_name} - acknowledge a fine-tune request
pub async fn finetune(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
) -> Result<Response> {
    validate_namespace(&model_name)?;

    let dir = state.namespaces.finetune_dir(&model_name);
    if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Fine-tune folder not found" })),
        )
            .into_response());
    }

    info!("Fine-tune requested for '{}'", model_name);
    Ok(Json(json!({ "message": "Fine-tune algorithm executed" })).into_response())
}

/// GET /health - liveness probe
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
