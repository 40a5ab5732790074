use std::fs;
use std::sync::Arc;
use tripwon::ledger::LedgerStore;
use tripwon::store::BlobStore;
use tripwon::store::disk::DiskStore;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const FRANKFURTER_PATH: &str = "/latest";
    pub const ER_API_PATH: &str = "/v6/latest/USD";
    pub const CURRENCY_API_PATH: &str = "/v1/currencies/usd.json";

    /// Mounts one endpoint on an existing server; all three providers share
    /// a single mock server since their paths never collide.
    pub async fn mount(
        server: &MockServer,
        endpoint: &str,
        status: u16,
        body: &str,
        expected_calls: Option<u64>,
    ) {
        let mock = Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(body));
        let mock = match expected_calls {
            Some(n) => mock.expect(n),
            None => mock,
        };
        mock.mount(server).await;
    }

    /// Config pointing every provider at the mock server, with ledger data
    /// under the given directory.
    pub fn config_yaml(base_url: &str, data_dir: &std::path::Path) -> String {
        format!(
            r#"
home_currency: "KRW"
providers:
  frankfurter:
    base_url: "{base_url}"
  er_api:
    base_url: "{base_url}"
  currency_api:
    base_url: "{base_url}"
data_path: "{}"
"#,
            data_dir.display()
        )
    }
}

const FRANKFURTER_BODY: &str =
    r#"{"base":"USD","date":"2026-08-25","rates":{"EUR":0.9,"KRW":1350.0,"JPY":147.0}}"#;
const ER_API_BODY: &str =
    r#"{"result":"success","base_code":"USD","rates":{"EUR":0.9,"KRW":1350.0,"JPY":147.0}}"#;

async fn run(config_path: &std::path::Path, command: tripwon::AppCommand) -> anyhow::Result<()> {
    tripwon::run_command(command, Some(config_path.to_str().unwrap())).await
}

#[test_log::test(tokio::test)]
async fn test_full_flow_with_primary_provider() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount(
        &server,
        test_utils::FRANKFURTER_PATH,
        200,
        FRANKFURTER_BODY,
        None,
    )
    .await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        test_utils::config_yaml(&server.uri(), data_dir.path()),
    )
    .expect("Failed to write config file");

    run(
        config_file.path(),
        tripwon::AppCommand::Start {
            budget: 1_000_000.0,
            country: Some("FR".to_string()),
            currency: None,
            domestic: false,
        },
    )
    .await
    .expect("start failed");

    run(
        config_file.path(),
        tripwon::AppCommand::Add {
            amount: 10.0,
            note: "dinner".to_string(),
        },
    )
    .await
    .expect("add failed");

    let store = Arc::new(DiskStore::open(data_dir.path()).unwrap());
    let ledger = LedgerStore::new(store);
    let trip = ledger.current_trip().expect("trip missing");

    assert_eq!(trip.currency, "EUR");
    assert_eq!(trip.expenses.len(), 1);
    // 1350 / 0.9 = 1500 KRW per EUR
    assert_eq!(trip.expenses[0].home_amount, 15000.0);
    assert_eq!(trip.expenses[0].fx_rate, Some(1500.0));
    assert_eq!(trip.expenses[0].fx_provider, "frankfurter");
    assert_eq!(trip.remaining_home, 985_000.0);
}

#[test_log::test(tokio::test)]
async fn test_fallback_provider_and_cache_reuse() {
    let server = wiremock::MockServer::start().await;
    // Primary provider is down; secondary must carry both conversions but
    // be fetched only once thanks to the cache.
    test_utils::mount(&server, test_utils::FRANKFURTER_PATH, 500, "", Some(1)).await;
    test_utils::mount(&server, test_utils::ER_API_PATH, 200, ER_API_BODY, Some(1)).await;
    test_utils::mount(&server, test_utils::CURRENCY_API_PATH, 200, "{}", Some(0)).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        test_utils::config_yaml(&server.uri(), data_dir.path()),
    )
    .expect("Failed to write config file");

    run(
        config_file.path(),
        tripwon::AppCommand::Start {
            budget: 500_000.0,
            country: Some("JP".to_string()),
            currency: None,
            domestic: false,
        },
    )
    .await
    .expect("start failed");

    for note in ["ramen", "train"] {
        run(
            config_file.path(),
            tripwon::AppCommand::Add {
                amount: 1000.0,
                note: note.to_string(),
            },
        )
        .await
        .expect("add failed");
    }

    let store = Arc::new(DiskStore::open(data_dir.path()).unwrap());
    let ledger = LedgerStore::new(Arc::clone(&store) as Arc<dyn BlobStore>);
    let trip = ledger.current_trip().expect("trip missing");

    assert_eq!(trip.expenses.len(), 2);
    // Cache was written with the fallback provider's identity
    assert_eq!(trip.expenses[0].fx_provider, "er-api");
    assert_eq!(trip.expenses[1].fx_provider, "er-api (cached)");
    assert_eq!(trip.expenses[0].home_amount, trip.expenses[1].home_amount);
}

#[test_log::test(tokio::test)]
async fn test_all_providers_down_fails_cleanly() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount(&server, test_utils::FRANKFURTER_PATH, 500, "", None).await;
    test_utils::mount(&server, test_utils::ER_API_PATH, 500, "", None).await;
    test_utils::mount(&server, test_utils::CURRENCY_API_PATH, 500, "", None).await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        test_utils::config_yaml(&server.uri(), data_dir.path()),
    )
    .expect("Failed to write config file");

    run(
        config_file.path(),
        tripwon::AppCommand::Start {
            budget: 100_000.0,
            country: Some("TW".to_string()),
            currency: None,
            domestic: false,
        },
    )
    .await
    .expect("start failed");

    let result = run(
        config_file.path(),
        tripwon::AppCommand::Add {
            amount: 100.0,
            note: "snack".to_string(),
        },
    )
    .await;
    assert!(result.is_err(), "conversion should fail with no providers");

    let store = Arc::new(DiskStore::open(data_dir.path()).unwrap());
    // No partial cache write on total failure
    assert!(store.get("fx_rates").unwrap().is_none());
    let ledger = LedgerStore::new(store);
    let trip = ledger.current_trip().expect("trip missing");
    assert!(trip.expenses.is_empty());
    assert_eq!(trip.remaining_home, 100_000.0);
}

#[test_log::test(tokio::test)]
async fn test_domestic_flow_never_touches_network() {
    // No mock server at all: any network call would hit a dead URL and fail.
    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        test_utils::config_yaml("http://127.0.0.1:9", data_dir.path()),
    )
    .expect("Failed to write config file");

    run(
        config_file.path(),
        tripwon::AppCommand::Start {
            budget: 50_000.0,
            country: None,
            currency: None,
            domestic: true,
        },
    )
    .await
    .expect("start failed");

    run(
        config_file.path(),
        tripwon::AppCommand::Add {
            amount: 12_345.678,
            note: "bus".to_string(),
        },
    )
    .await
    .expect("add failed");

    let store = Arc::new(DiskStore::open(data_dir.path()).unwrap());
    let ledger = LedgerStore::new(store);
    let trip = ledger.current_trip().expect("trip missing");

    assert_eq!(trip.currency, "KRW");
    assert_eq!(trip.expenses[0].home_amount, 12_345.68);
    assert!(trip.expenses[0].fx_rate.is_none());
    assert_eq!(trip.expenses[0].fx_provider, "none");
}

#[test_log::test(tokio::test)]
async fn test_export_csv_round_trip() {
    let server = wiremock::MockServer::start().await;
    test_utils::mount(
        &server,
        test_utils::FRANKFURTER_PATH,
        200,
        FRANKFURTER_BODY,
        None,
    )
    .await;

    let data_dir = tempfile::tempdir().expect("Failed to create data dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(
        config_file.path(),
        test_utils::config_yaml(&server.uri(), data_dir.path()),
    )
    .expect("Failed to write config file");

    run(
        config_file.path(),
        tripwon::AppCommand::Start {
            budget: 1_000_000.0,
            country: Some("JP".to_string()),
            currency: None,
            domestic: false,
        },
    )
    .await
    .expect("start failed");
    run(
        config_file.path(),
        tripwon::AppCommand::Add {
            amount: 1470.0,
            note: "museum, with \"audio guide\"".to_string(),
        },
    )
    .await
    .expect("add failed");

    let out = data_dir.path().join("export.csv");
    run(
        config_file.path(),
        tripwon::AppCommand::Export {
            format: tripwon::export::ExportFormat::Csv,
            scope: tripwon::cli::ExportScope::All,
            output: Some(out.clone()),
        },
    )
    .await
    .expect("export failed");

    let csv = fs::read_to_string(&out).expect("export file missing");
    assert!(csv.starts_with('\u{feff}'));
    assert_eq!(csv.lines().count(), 2);
    // 1350 / 147 KRW per JPY, applied to 1470 JPY
    assert!(csv.contains("13500.00"));
    assert!(csv.contains("\"museum, with \"\"audio guide\"\"\""));
}
