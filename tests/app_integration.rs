use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use twrate::providers::BotRateProvider;
use twrate::server::{AppState, router};

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const LISTING: &str = r#"
        <html><body>
        <table title="牌告匯率" class="table table-striped table-bordered table-condensed table-hover">
          <thead><tr><th>幣別</th><th>現金匯率</th><th>即期匯率</th></tr></thead>
          <tbody>
            <tr>
              <td class="currency phone-small-font">
                <div class="hidden-phone print_show">美金 (USD)</div>
                <div class="visible-phone print_hide">USD 美金</div>
              </td>
              <td>30.1</td><td>30.77</td><td>30.45</td><td>30.55</td>
            </tr>
            <tr>
              <td class="currency phone-small-font">
                <div class="visible-phone print_hide">EUR 歐元</div>
              </td>
              <td>27.5</td><td>27.0</td><td>27.95</td><td>27.45</td>
            </tr>
            <tr>
              <td class="currency phone-small-font">
                <div class="visible-phone print_hide">CNY 人民幣</div>
              </td>
              <td>-</td><td>-</td><td>-</td><td>-</td>
            </tr>
          </tbody>
        </table>
        </body></html>"#;

    pub async fn create_bot_mock_server(
        date: &str,
        template: ResponseTemplate,
    ) -> wiremock::MockServer {
        let mock_server = MockServer::start().await;
        let url_path = format!("/xrt/all/{date}");

        Mock::given(method("GET"))
            .and(path(&url_path))
            .respond_with(template)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_listing_server(date: &str) -> wiremock::MockServer {
        create_bot_mock_server(date, ResponseTemplate::new(200).set_body_string(LISTING)).await
    }
}

/// Serves the rate API on an ephemeral port against `upstream` and returns its base URL.
async fn spawn_api(upstream: &str, timeout: Duration) -> String {
    let provider = BotRateProvider::new(upstream, timeout).expect("Failed to build provider");
    let app = router(AppState::new(Arc::new(provider)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().expect("Listener has no local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("API server failed");
    });

    format!("http://{addr}")
}

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.expect("API request failed");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("API returned non-JSON");
    (status, body)
}

const DATE: &str = "2025-08-27";

#[test_log::test(tokio::test)]
async fn test_get_rate_returns_spot_sell() {
    let upstream = test_utils::create_listing_server(DATE).await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_rate?date={DATE}&currency=EUR")).await;
    info!(?body, "get_rate response");

    assert_eq!(status, 200);
    assert_eq!(body["rate"], "27.45");
}

#[test_log::test(tokio::test)]
async fn test_get_rate_matches_composite_label() {
    let upstream = test_utils::create_listing_server(DATE).await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_rate?date={DATE}&currency=USD")).await;

    assert_eq!(status, 200);
    assert_eq!(body["rate"], "30.55");
}

#[test_log::test(tokio::test)]
async fn test_get_rate_local_currency() {
    // Nothing is mounted: the local currency must not reach the upstream.
    let upstream = wiremock::MockServer::start().await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_rate?date={DATE}&currency=TWD")).await;

    assert_eq!(status, 200);
    assert_eq!(body["rate"], "1");
    let received = upstream.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_get_rate_unquoted_is_not_found() {
    let upstream = test_utils::create_listing_server(DATE).await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_rate?date={DATE}&currency=CNY")).await;

    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("CNY"));
}

#[test_log::test(tokio::test)]
async fn test_get_rate_missing_parameters() {
    let upstream = wiremock::MockServer::start().await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    for query in [
        "",
        "?date=2025-08-27",
        "?currency=USD",
        "?date=&currency=USD",
    ] {
        let (status, body) = get_json(&format!("{api}/get_rate{query}")).await;
        assert_eq!(status, 400, "query {query:?}");
        assert!(body["error"].is_string());
    }
}

#[test_log::test(tokio::test)]
async fn test_repeated_query_key_is_json_bad_request() {
    let upstream = wiremock::MockServer::start().await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    for url in [
        format!("{api}/get_rate?date=2025-08-27&date=2025-08-28&currency=USD"),
        format!("{api}/get_all_rates?date=a&date=b"),
    ] {
        let response = reqwest::get(&url).await.expect("API request failed");
        assert_eq!(response.status().as_u16(), 400, "{url}");
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"), "{content_type}");

        let body = response.json::<Value>().await.expect("API returned non-JSON");
        assert!(body["error"].is_string());
    }

    let received = upstream.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_get_rate_upstream_error_is_not_found() {
    let upstream = test_utils::create_bot_mock_server(
        DATE,
        wiremock::ResponseTemplate::new(500).set_body_string("Server Error"),
    )
    .await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_rate?date={DATE}&currency=USD")).await;

    assert_eq!(status, 404);
    assert!(body["error"].is_string());
}

#[test_log::test(tokio::test)]
async fn test_get_rate_upstream_timeout_is_not_found() {
    let upstream = test_utils::create_bot_mock_server(
        DATE,
        wiremock::ResponseTemplate::new(200)
            .set_body_string(test_utils::LISTING)
            .set_delay(Duration::from_millis(800)),
    )
    .await;
    let api = spawn_api(&upstream.uri(), Duration::from_millis(100)).await;

    let (status, _) = get_json(&format!("{api}/get_rate?date={DATE}&currency=USD")).await;

    assert_eq!(status, 404);
}

#[test_log::test(tokio::test)]
async fn test_get_all_rates() {
    let upstream = test_utils::create_listing_server(DATE).await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_all_rates?date={DATE}")).await;

    assert_eq!(status, 200);
    let rows = body.as_array().expect("expected an array of rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["幣別"], "USD 美金");
    assert_eq!(rows[1]["幣別"], "EUR 歐元");
    assert_eq!(rows[1]["現金匯率_本行買入"], "27.5");
    assert_eq!(rows[1]["現金匯率_本行賣出"], "27.0");
    assert_eq!(rows[1]["即期匯率_本行買入"], "27.95");
    assert_eq!(rows[1]["即期匯率_本行賣出"], "27.45");
    assert_eq!(rows[2]["即期匯率_本行賣出"], "-");
}

#[test_log::test(tokio::test)]
async fn test_get_all_rates_garbled_page_is_not_found() {
    let upstream = test_utils::create_bot_mock_server(
        DATE,
        wiremock::ResponseTemplate::new(200).set_body_string("<html><p>維護中</p>"),
    )
    .await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/get_all_rates?date={DATE}")).await;

    assert_eq!(status, 404);
    assert!(body["error"].is_string());
}

#[test_log::test(tokio::test)]
async fn test_get_all_rates_missing_date() {
    let upstream = wiremock::MockServer::start().await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, _) = get_json(&format!("{api}/get_all_rates")).await;

    assert_eq!(status, 400);
}

#[test_log::test(tokio::test)]
async fn test_cors_allows_any_origin() {
    let upstream = test_utils::create_listing_server(DATE).await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let response = reqwest::Client::new()
        .get(format!("{api}/get_rate?date={DATE}&currency=EUR"))
        .header("Origin", "https://example.org")
        .send()
        .await
        .expect("API request failed");

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[test_log::test(tokio::test)]
async fn test_concurrent_queries_are_independent() {
    let upstream = test_utils::create_listing_server(DATE).await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let urls: Vec<_> = ["USD", "EUR", "CNY", "TWD", "GBP"]
        .iter()
        .map(|code| format!("{api}/get_rate?date={DATE}&currency={code}"))
        .collect();
    let results = futures::future::join_all(urls.iter().map(|url| get_json(url))).await;

    let statuses: Vec<u16> = results.iter().map(|(status, _)| *status).collect();
    assert_eq!(statuses, vec![200, 200, 404, 200, 404]);
    assert_eq!(results[0].1["rate"], "30.55");
    assert_eq!(results[1].1["rate"], "27.45");
    assert_eq!(results[3].1["rate"], "1");
}

#[test_log::test(tokio::test)]
async fn test_health() {
    let upstream = wiremock::MockServer::start().await;
    let api = spawn_api(&upstream.uri(), Duration::from_secs(5)).await;

    let (status, body) = get_json(&format!("{api}/health")).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[test_log::test(tokio::test)]
async fn test_rates_command_with_config_file() {
    let upstream = test_utils::create_listing_server(DATE).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    let config_content = format!(
        r#"
        providers:
          bot:
            base_url: {}
            timeout_secs: 5
    "#,
        upstream.uri()
    );
    fs::write(config_path, &config_content).expect("Failed to write config file");

    let result = twrate::run_command(
        twrate::AppCommand::Rates {
            date: DATE.to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Rates command failed with: {:?}", result.err());

    let result = twrate::run_command(
        twrate::AppCommand::Rate {
            date: DATE.to_string(),
            currency: "EUR".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Rate command failed with: {:?}", result.err());

    let result = twrate::run_command(
        twrate::AppCommand::Rate {
            date: DATE.to_string(),
            currency: "CNY".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_err());
}
