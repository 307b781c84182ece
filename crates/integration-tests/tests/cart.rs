//! Cart mutations through the router.

use axum::http::StatusCode;
use prompt_shop::gateway::CallKind;
use prompt_shop_integration_tests::{EMPTY_STATE, TestShop};

const ONE_IN_CART: &str = r#"{"products": [], "cart": [{"product": "P1", "count": 1}]}"#;

#[tokio::test]
async fn test_add_to_cart_persists_model_output_verbatim() {
    let shop = TestShop::start(EMPTY_STATE).await;
    shop.gateway.push_reply(ONE_IN_CART);

    let resp = shop.get("/cart/add/P1").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location.as_deref(), Some("/"));
    assert_eq!(shop.read_state_file().await, ONE_IN_CART);

    let expected: serde_json::Value = serde_json::from_str(ONE_IN_CART).expect("parse");
    assert_eq!(shop.state.store().snapshot().await, expected);
}

#[tokio::test]
async fn test_mutation_prompt_is_schema_constrained() {
    let shop = TestShop::start(EMPTY_STATE).await;
    shop.gateway.push_reply(ONE_IN_CART);

    shop.get("/cart/add/P1").await;

    let calls = shop.gateway.calls();
    assert_eq!(calls.len(), 1);
    let call = calls.first().expect("mutation call");
    assert_eq!(call.kind, CallKind::Json);
    assert_eq!(call.schema.as_deref(), Some("shop"));
    assert!(call.prompt.contains(r#"{"cart":[],"products":[]}"#));
    assert!(call.prompt.contains("Instruction: \"Add the product with the id P1 to the cart."));
}

#[tokio::test]
async fn test_remove_from_cart_redirects_to_cart() {
    let shop = TestShop::start(ONE_IN_CART).await;
    shop.gateway.push_reply(EMPTY_STATE);

    let resp = shop.get("/cart/remove/P1").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location.as_deref(), Some("/cart"));
    assert_eq!(shop.read_state_file().await, EMPTY_STATE);
}

#[tokio::test]
async fn test_invalid_json_leaves_state_unchanged() {
    let shop = TestShop::start(EMPTY_STATE).await;
    shop.gateway.push_reply("Sure! I added the product to your cart.");

    let resp = shop.get("/cart/add/P1").await;
    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(resp.body, "External service error");
    assert_eq!(shop.read_state_file().await, EMPTY_STATE);

    let expected: serde_json::Value = serde_json::from_str(EMPTY_STATE).expect("parse");
    assert_eq!(shop.state.store().snapshot().await, expected);
}

#[tokio::test]
async fn test_gateway_error_leaves_state_unchanged() {
    let shop = TestShop::start(EMPTY_STATE).await;
    shop.gateway.push_failure(429, "slow down");

    let resp = shop.get("/cart/add/P1").await;
    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(shop.read_state_file().await, EMPTY_STATE);
}

#[tokio::test]
async fn test_validation_rejects_off_model_state() {
    let shop = TestShop::start_with(EMPTY_STATE, true).await;
    shop.gateway.push_reply(ONE_IN_CART);

    let resp = shop.get("/cart/add/P1").await;
    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(shop.read_state_file().await, EMPTY_STATE);
}

#[tokio::test]
async fn test_state_changes_reach_the_next_prompt() {
    let shop = TestShop::start(EMPTY_STATE).await;
    shop.gateway.push_reply(ONE_IN_CART);
    shop.gateway.push_reply("<p>{{cart}}</p>");
    shop.gateway.push_reply("<p>P1 x1</p>");

    shop.get("/cart/add/P1").await;
    let resp = shop.get("/cart").await;
    assert_eq!(resp.body, "<p>P1 x1</p>");

    let calls = shop.gateway.calls();
    let render = calls.last().expect("render call");
    assert!(render.prompt.contains(r#"{"cart":[{"count":1,"product":"P1"}],"products":[]}"#));
}

#[tokio::test]
async fn test_huge_counts_persist_and_reload() {
    let huge = r#"{"products":[],"cart":[{"product":"A","count":18446744073709551615},{"product":"B","count":1}]}"#;
    let shop = TestShop::start(EMPTY_STATE).await;
    shop.gateway.push_reply(huge);

    let resp = shop.get("/cart/add/B").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(shop.read_state_file().await, huge);

    let gateway: std::sync::Arc<dyn prompt_shop::gateway::ModelGateway> = shop.gateway.clone();
    let restarted = prompt_shop::state::AppState::initialize(&shop.storage(), gateway)
        .await
        .expect("restart");
    assert_eq!(restarted.store().snapshot().await["cart"][1]["product"], "B");
}
