//! Integration tests for the REST thunks against a mock backend.

use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockdeck::api::{self, ApiClient};
use stockdeck::config::ClientConfig;
use stockdeck::errors::ApiError;
use stockdeck::store::Stores;
use stockdeck::types::{NewOrder, NewPortfolio, OrderStatus, OrderType};

async fn setup() -> (MockServer, ApiClient, Arc<Stores>) {
    let server = MockServer::start().await;
    let config = ClientConfig::default()
        .with_base_url(&server.uri())
        .expect("mock server uri");
    let api = ApiClient::new(&config).expect("client");
    (server, api, Stores::new())
}

fn portfolio_json(id: i64, name: &str, balance: f64) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": 1,
        "name": name,
        "portfolio_balance": balance,
        "portfolio_value": balance,
        "gains_loss": 0.0,
    })
}

#[tokio::test]
async fn loading_portfolios_replaces_the_cache() {
    let (server, api, stores) = setup().await;

    // Pre-populate with a record the server no longer knows about.
    stores.apply(stockdeck::store::Snapshot::Portfolio(
        serde_json::from_value(portfolio_json(99, "Ghost", 1.0)).unwrap(),
    ));

    Mock::given(method("GET"))
        .and(path("/api/users/portfolios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "portfolios": [
                portfolio_json(1, "Growth", 5000.0),
                portfolio_json(2, "Income", 2500.0),
            ]
        })))
        .mount(&server)
        .await;

    api::portfolios::load_portfolios(&api, &stores).await;

    assert_eq!(stores.portfolios.len(), 2);
    assert!(stores.portfolios.get(99).is_none());
    assert_eq!(stores.portfolios.get(1).unwrap().name, "Growth");
    assert_eq!(
        stores.portfolios.get(2).unwrap().portfolio_balance,
        dec!(2500)
    );
}

#[tokio::test]
async fn order_list_endpoint_returns_a_bare_array() {
    let (server, api, stores) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 10,
                "portfolio_id": 1,
                "stock_id": 3,
                "order_type": "buy",
                "status": "pending",
                "quantity": 5.0,
                "target_price": 150.0,
            }
        ])))
        .mount(&server)
        .await;

    api::orders::load_orders(&api, &stores).await;

    let order = stores.orders.get(10).unwrap();
    assert_eq!(order.order_type, OrderType::Buy);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.quantity, dec!(5));
}

#[tokio::test]
async fn read_failure_keeps_the_stale_cache() {
    let (server, api, stores) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users/portfolios"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "portfolios": [portfolio_json(1, "Growth", 5000.0)]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/portfolios"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    api::portfolios::load_portfolios(&api, &stores).await;
    assert_eq!(stores.portfolios.len(), 1);

    // Second refresh hits the failing mock; the cache must survive.
    api::portfolios::load_portfolios(&api, &stores).await;
    assert_eq!(stores.portfolios.len(), 1);
    assert_eq!(stores.portfolios.get(1).unwrap().name, "Growth");
}

#[tokio::test]
async fn validation_errors_surface_per_field() {
    let (server, api, stores) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/portfolios"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": { "name": "Name is required" }
        })))
        .mount(&server)
        .await;

    let result = api::portfolios::create_portfolio(
        &api,
        &stores,
        &NewPortfolio {
            name: String::new(),
            portfolio_balance: dec!(1000),
        },
    )
    .await;

    match result {
        Err(ApiError::Validation(fields)) => {
            assert_eq!(fields.get("name").map(String::as_str), Some("Name is required"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(stores.portfolios.is_empty());
}

#[tokio::test]
async fn mutating_requests_carry_the_csrf_token() {
    let (server, api, stores) = setup().await;
    api.set_csrf_token("tok-123");

    Mock::given(method("POST"))
        .and(path("/api/portfolios"))
        .and(header("XSRF-Token", "tok-123"))
        .and(body_partial_json(json!({"name": "Retirement"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "portfolio": portfolio_json(7, "Retirement", 1000.0)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = api::portfolios::create_portfolio(
        &api,
        &stores,
        &NewPortfolio {
            name: "Retirement".into(),
            portfolio_balance: dec!(1000),
        },
    )
    .await
    .unwrap();

    assert_eq!(created.id, 7);
    assert_eq!(stores.portfolios.get(7).unwrap().name, "Retirement");
}

#[tokio::test]
async fn cancelled_orders_stay_cached_with_cancelled_status() {
    let (server, api, stores) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/portfolios"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "portfolio": portfolio_json(1, "Retirement", 1000.0)
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "order": {
                "id": 42,
                "portfolio_id": 1,
                "stock_id": 3,
                "order_type": "buy",
                "status": "pending",
                "quantity": 5.0,
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/orders/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "order": {
                "id": 42,
                "portfolio_id": 1,
                "stock_id": 3,
                "order_type": "buy",
                "status": "cancelled",
                "quantity": 5.0,
            },
            "message": "Order cancelled"
        })))
        .mount(&server)
        .await;

    api::portfolios::create_portfolio(
        &api,
        &stores,
        &NewPortfolio {
            name: "Retirement".into(),
            portfolio_balance: dec!(1000),
        },
    )
    .await
    .unwrap();

    let order = api::orders::create_order(
        &api,
        &stores,
        &NewOrder {
            portfolio_id: 1,
            stock_id: 3,
            order_type: OrderType::Buy,
            quantity: dec!(5),
            target_price: None,
            scheduled_time: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(stores.orders.get(order.id).unwrap().status, OrderStatus::Pending);

    let cancelled = api::orders::cancel_order(&api, &stores, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Cancellation is a status change, never a removal.
    let cached = stores.orders.get(order.id).unwrap();
    assert_eq!(cached.status, OrderStatus::Cancelled);
    assert_eq!(stores.orders.len(), 1);
}

#[tokio::test]
async fn adding_a_stock_patches_the_cached_watchlist() {
    let (server, api, stores) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users/watchlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "watchlists": [{
                "id": 1,
                "user_id": 1,
                "name": "Tech",
                "stocks": [3],
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/watchlists/1/stocks"))
        .and(body_partial_json(json!({"stock_id": 5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Stock added to watchlist"
        })))
        .expect(1)
        .mount(&server)
        .await;

    api::watchlists::load_watchlists(&api, &stores).await;
    api::watchlists::add_stock_to_watchlist(&api, &stores, 1, 5)
        .await
        .unwrap();

    assert_eq!(stores.watchlists.get(1).unwrap().stocks, vec![3, 5]);
}

#[tokio::test]
async fn duplicate_add_leaves_membership_unchanged() {
    let (server, api, stores) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users/watchlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "watchlists": [{
                "id": 1,
                "user_id": 1,
                "name": "Tech",
                "stocks": [3, 5],
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/watchlists/1/stocks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Stock added to watchlist"
        })))
        .mount(&server)
        .await;

    api::watchlists::load_watchlists(&api, &stores).await;
    api::watchlists::add_stock_to_watchlist(&api, &stores, 1, 5)
        .await
        .unwrap();

    // Already a member: no duplicate entry appears.
    assert_eq!(stores.watchlists.get(1).unwrap().stocks, vec![3, 5]);
}

#[tokio::test]
async fn removing_a_stock_patches_the_cached_watchlist() {
    let (server, api, stores) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users/watchlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "watchlists": [{
                "id": 1,
                "user_id": 1,
                "name": "Tech",
                "stocks": [3, 5],
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/watchlists/1/stocks/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Stock removed from watchlist"
        })))
        .expect(1)
        .mount(&server)
        .await;

    api::watchlists::load_watchlists(&api, &stores).await;
    api::watchlists::remove_stock_from_watchlist(&api, &stores, 1, 3)
        .await
        .unwrap();

    assert_eq!(stores.watchlists.get(1).unwrap().stocks, vec![5]);
}

#[tokio::test]
async fn stock_search_sends_query_parameters() {
    let (server, api, stores) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/stocks"))
        .and(wiremock::matchers::query_param("ticker", "AA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stocks": [{
                "id": 3,
                "ticker_symbol": "AAPL",
                "company_name": "Apple Inc.",
                "sector": "Technology",
                "market_price": 187.5,
            }]
        })))
        .mount(&server)
        .await;

    api::stocks::load_stocks(
        &api,
        &stores,
        Some(&stockdeck::types::StockQuery {
            ticker: Some("AA".into()),
            company: None,
        }),
    )
    .await;

    assert_eq!(stores.stocks.get(3).unwrap().ticker_symbol, "AAPL");
}
