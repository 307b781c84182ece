//! Product administration.
//!
//! Browsers cannot submit `PUT` from an HTML form, so the edit form posts to
//! the product URL with a hidden `_method=PUT` field.

use std::collections::HashMap;

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};

use crate::error::{AppError, Result};
use crate::prompts::{Command, METHOD_OVERRIDE_FIELD, RequestParams, View};
use crate::services::pages;
use crate::state::AppState;

use super::cart::run;

type Params = HashMap<String, String>;

/// Product table with edit and delete links.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<Params>,
) -> Result<Html<String>> {
    let params = RequestParams::from(query);
    Ok(Html(pages::render(&state, View::AdminProducts, &params).await?))
}

/// Form for a new product.
pub async fn new_form(
    State(state): State<AppState>,
    Query(query): Query<Params>,
) -> Result<Html<String>> {
    let params = RequestParams::from(query);
    Ok(Html(
        pages::render(&state, View::AdminProductsNew, &params).await?,
    ))
}

/// Form for editing an existing product.
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<Params>,
) -> Result<Html<String>> {
    let params = RequestParams::from(query).with("id", id);
    Ok(Html(
        pages::render(&state, View::AdminProductsEdit, &params).await?,
    ))
}

/// Create a product from the submitted form.
pub async fn create(
    State(state): State<AppState>,
    Query(query): Query<Params>,
    Form(form): Form<Params>,
) -> Result<Redirect> {
    let params = RequestParams::from(query).merge(form);
    run(&state, Command::CreateProduct { params }).await
}

/// Update a product from the submitted form.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<Params>,
    Form(form): Form<Params>,
) -> Result<Redirect> {
    let params = RequestParams::from(query).merge(form).with("id", id.clone());
    run(&state, Command::UpdateProduct { id, params }).await
}

/// `POST` to a product URL: only valid as a tunnelled `PUT`.
pub async fn update_via_form(
    state: State<AppState>,
    path: Path<String>,
    query: Query<Params>,
    Form(form): Form<Params>,
) -> Result<Redirect> {
    let method = form
        .get(METHOD_OVERRIDE_FIELD)
        .map(|m| m.trim().to_ascii_uppercase());
    if method.as_deref() != Some("PUT") {
        return Err(AppError::BadRequest(format!(
            "POST to a product requires {METHOD_OVERRIDE_FIELD}=PUT"
        )));
    }
    update(state, path, query, Form(form)).await
}

/// Delete a product.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect> {
    run(&state, Command::DeleteProduct { id }).await
}
