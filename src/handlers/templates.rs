//! Template preview for editor tooling.

use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::template::{
    extract_spintext_options, extract_variables, render, validate, RenderContext,
    ValidationResult,
};

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub content: String,
    #[serde(default)]
    pub variables: RenderContext,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// One random rendering of the template
    pub rendered: String,
    pub variables: Vec<String>,
    pub spintext_options: Vec<Vec<String>>,
    pub validation: ValidationResult,
}

impl PreviewResponse {
    pub fn build(content: &str, context: &RenderContext) -> Self {
        Self {
            rendered: render(content, context),
            variables: extract_variables(content),
            spintext_options: extract_spintext_options(content),
            validation: validate(content),
        }
    }
}

/// `POST /templates/preview`
pub async fn preview_template(Json(request): Json<PreviewRequest>) -> Json<PreviewResponse> {
    Json(PreviewResponse::build(&request.content, &request.variables))
}
