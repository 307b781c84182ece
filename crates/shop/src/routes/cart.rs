//! Cart mutations.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::Result;
use crate::prompts::Command;
use crate::services::mutations;
use crate::state::AppState;

/// Add one unit of a product to the cart.
pub async fn add(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect> {
    run(&state, Command::AddToCart { id }).await
}

/// Remove a product's line item from the cart.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect> {
    run(&state, Command::RemoveFromCart { id }).await
}

pub(super) async fn run(state: &AppState, command: Command) -> Result<Redirect> {
    mutations::apply(state, &command).await?;
    Ok(Redirect::to(command.redirect_to()))
}
