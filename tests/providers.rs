//! HTTP clients against wiremock servers standing in for FRED and Yahoo.

use std::time::Duration;

use cb_alpha::config::{Config, EntityConfig};
use cb_alpha::fetch::{fetch_and_score, FetchError};
use cb_alpha::provider::{FredClient, PriceProvider, ProviderError, SeriesProvider, YahooClient};
use cb_alpha::scoring::ScoringConfig;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn install_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// FRED observations payload: one value per month starting January 2020.
fn observations(values: &[&str]) -> Value {
    let rows: Vec<Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let date = format!("{}-{:02}-01", 2020 + i / 12, i % 12 + 1);
            json!({ "realtime_start": "2025-01-01", "realtime_end": "2025-01-01", "date": date, "value": v })
        })
        .collect();
    json!({ "count": rows.len(), "observations": rows })
}

fn monthly(start: f64, step: f64) -> Vec<String> {
    (0..36).map(|i| format!("{:.2}", start + step * i as f64)).collect()
}

async fn mount_series(server: &MockServer, id: &str, values: &[String]) {
    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("series_id", id))
        .respond_with(ResponseTemplate::new(200).set_body_json(observations(&refs)))
        .mount(server)
        .await;
}

fn fred(server: &MockServer) -> FredClient {
    install_crypto();
    FredClient::new("test-key").unwrap().with_base_url(server.uri())
}

#[tokio::test]
async fn fred_parses_observations_and_gaps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("series_id", "FEDFUNDS"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("file_type", "json"))
        .and(query_param("observation_start", "2020-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observations(&["1.55", ".", "0.65"])))
        .expect(1)
        .mount(&server)
        .await;

    let obs = fred(&server).fetch_series("FEDFUNDS", start()).await.unwrap();

    assert_eq!(obs.len(), 3);
    assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    assert_eq!(obs[0].value, Some(1.55));
    assert_eq!(obs[1].value, None);
    assert_eq!(obs[2].value, Some(0.65));
}

#[tokio::test]
async fn fred_sends_frequency_aggregation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("frequency", "m"))
        .and(query_param("aggregation_method", "eop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observations(&["4000000"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = fred(&server).with_frequency(Some("m".to_string()));
    let obs = client.fetch_series("WALCL", start()).await.unwrap();
    assert_eq!(obs[0].value, Some(4_000_000.0));
}

#[tokio::test]
async fn fred_default_config_requests_monthly_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .and(query_param("series_id", "WALCL"))
        .and(query_param("frequency", "m"))
        .and(query_param("aggregation_method", "eop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observations(&["8900000", "8850000"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = fred(&server).with_frequency(Config::default().fred.frequency);
    let obs = client.fetch_series("WALCL", start()).await.unwrap();
    assert_eq!(obs.len(), 2);
}

#[tokio::test]
async fn fred_bad_api_key_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_code": 400,
            "error_message": "Bad Request.  The value for variable api_key is not registered."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = fred(&server).fetch_series("FEDFUNDS", start()).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidCredential(_)));
}

#[tokio::test]
async fn fred_unknown_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fred/series/observations"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_code": 400,
            "error_message": "Bad Request.  The series does not exist."
        })))
        .mount(&server)
        .await;

    let err = fred(&server).fetch_series("NOPE", start()).await.unwrap_err();
    assert_eq!(err, ProviderError::SeriesNotFound("NOPE".to_string()));
}

#[tokio::test]
async fn fred_outage_without_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = fred(&server)
        .with_retry_attempts(0)
        .fetch_series("FEDFUNDS", start())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(_)));
}

#[tokio::test]
async fn fred_retries_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observations(&["5.33"])))
        .mount(&server)
        .await;

    let obs = fred(&server).fetch_series("FEDFUNDS", start()).await.unwrap();
    assert_eq!(obs[0].value, Some(5.33));
}

#[tokio::test]
async fn refresh_over_http_ranks_and_skips() {
    let server = MockServer::start().await;
    // USD tightening, EUR easing, CHF series unknown to the server
    mount_series(&server, "FEDFUNDS", &monthly(1.0, 0.1)).await;
    mount_series(&server, "CPIAUCSL", &monthly(250.0, 0.5)).await;
    mount_series(&server, "WALCL", &monthly(9000.0, -20.0)).await;
    mount_series(&server, "ECBDFR", &monthly(4.0, -0.1)).await;
    mount_series(&server, "CP0000EZ19M086NEST", &monthly(110.0, -0.1)).await;
    mount_series(&server, "ECBASSETSW", &monthly(6000.0, 15.0)).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_code": 400,
            "error_message": "Bad Request.  The series does not exist."
        })))
        .mount(&server)
        .await;

    let entity = |symbol: &str, rate: &str, inflation: &str, liquidity: &str| EntityConfig {
        label: symbol.to_string(),
        symbol: symbol.to_string(),
        rate: rate.to_string(),
        inflation: inflation.to_string(),
        liquidity: liquidity.to_string(),
        price_ticker: None,
        invert_price: false,
    };
    let entities = vec![
        entity("EUR", "ECBDFR", "CP0000EZ19M086NEST", "ECBASSETSW"),
        entity("CHF", "SNB_RATE", "SNB_CPI", "SNB_LIQ"),
        entity("USD", "FEDFUNDS", "CPIAUCSL", "WALCL"),
    ];
    let now: DateTime<Utc> = "2025-06-01T00:00:00Z".parse().unwrap();

    let table = fetch_and_score(
        &fred(&server),
        &entities,
        &ScoringConfig::default(),
        Duration::from_secs(5 * 365 * 86400),
        now,
    )
    .await
    .unwrap();

    let symbols: Vec<&str> = table.rows.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["USD", "EUR"]);
    assert!(table.rows.iter().all(|r| r.is_complete()));
    assert_eq!(table.skipped.len(), 1);
    assert_eq!(table.skipped[0].symbol, "CHF");
}

#[tokio::test]
async fn refresh_with_rejected_key_is_provider_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = fetch_and_score(
        &fred(&server),
        &cb_alpha::config::default_entities(),
        &ScoringConfig::default(),
        Duration::from_secs(365 * 86400),
        Utc::now(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::ProviderUnavailable(_)));
    // Aborted on the first rejection
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

fn yahoo(server: &MockServer) -> YahooClient {
    install_crypto();
    YahooClient::new("2y").unwrap().with_base_url(server.uri())
}

#[tokio::test]
async fn yahoo_parses_closes_with_gaps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/JPY=X"))
        .and(query_param("range", "2y"))
        .and(query_param("interval", "1d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": [{
                    "meta": { "currency": "JPY", "symbol": "JPY=X" },
                    // 2024-01-03, 2024-01-01, 2024-01-02 (out of order on purpose)
                    "timestamp": [1704240000, 1704067200, 1704153600],
                    "indicators": { "quote": [{ "close": [142.5, 141.0, null] }] }
                }],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let obs = yahoo(&server).fetch_closes("JPY=X").await.unwrap();

    assert_eq!(obs.len(), 3);
    assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(obs[0].value, Some(141.0));
    assert_eq!(obs[1].value, None);
    assert_eq!(obs[2].value, Some(142.5));
}

#[tokio::test]
async fn yahoo_unknown_ticker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = yahoo(&server).fetch_closes("XXX=X").await.unwrap_err();
    assert_eq!(err, ProviderError::SeriesNotFound("XXX=X".to_string()));
}

#[tokio::test]
async fn yahoo_outage_without_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = yahoo(&server)
        .with_retry_attempts(0)
        .fetch_closes("EURUSD=X")
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn yahoo_retries_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/EURUSD=X"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": [{
                    "timestamp": [1704067200],
                    "indicators": { "quote": [{ "close": [1.105] }] }
                }],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let obs = yahoo(&server).fetch_closes("EURUSD=X").await.unwrap();
    assert_eq!(obs.len(), 1);
    assert_eq!(obs[0].value, Some(1.105));
}
