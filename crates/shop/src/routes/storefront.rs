//! Customer-facing pages.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Html,
};

use crate::error::Result;
use crate::prompts::{RequestParams, View};
use crate::services::pages;
use crate::state::AppState;

/// Product grid with the cart in the sidebar.
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Html<String>> {
    let params = RequestParams::from(query);
    Ok(Html(pages::render(&state, View::Products, &params).await?))
}

/// Single product detail.
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Html<String>> {
    let params = RequestParams::from(query).with("id", id);
    Ok(Html(pages::render(&state, View::Product, &params).await?))
}

/// Cart detail with remove and checkout buttons.
pub async fn cart(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Html<String>> {
    let params = RequestParams::from(query);
    Ok(Html(pages::render(&state, View::Cart, &params).await?))
}
