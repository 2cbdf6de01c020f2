//! End-to-end passes of the `triage` binary against a mocked spreadsheet,
//! model and webhook.

mod common;

use common::{
    base_config, mock_lm_command, sheet_body, TriageFixture, SHEETS_TOKEN, SPREADSHEET_ID,
    WEBHOOK_PATH,
};
use mockito::{Matcher, Server};
use serde_json::json;

fn values_path() -> Matcher {
    Matcher::Regex(format!("^/spreadsheets/{SPREADSHEET_ID}/values/"))
}

fn batch_update_path() -> String {
    format!("/spreadsheets/{SPREADSHEET_ID}/values:batchUpdate")
}

#[test]
fn command_backend_pass_marks_rows_and_records_ledger() {
    let mut server = Server::new();
    let rows = [
        json!(["1/2/2025", "Acme", "a@acme.pk", "acme.pk", "Clinic SaaS", "Processed", "done", 4]),
        json!(["1/3/2025", "Tijarat", "ceo@tijarat.pk", "tijarat.pk", "B2B SaaS company in Pakistan"]),
        json!(["1/4/2025", "Blank Co", "x@blank.co", "", ""]),
    ];
    let read = server
        .mock("GET", values_path())
        .match_header("authorization", format!("Bearer {SHEETS_TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sheet_body(&rows))
        .create();
    let processed = server
        .mock("POST", batch_update_path().as_str())
        .match_body(Matcher::PartialJson(json!({
            "data": [
                {"range": "'Form Responses 1'!F3", "values": [["Processed"]]},
                {"range": "'Form Responses 1'!G3"},
                {"range": "'Form Responses 1'!H3", "values": [[5]]}
            ]
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();
    let failed = server
        .mock("POST", batch_update_path().as_str())
        .match_body(Matcher::PartialJson(json!({
            "data": [{"range": "'Form Responses 1'!F4", "values": [["Failed"]]}]
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();
    let alert = server
        .mock("POST", WEBHOOK_PATH)
        .match_body(Matcher::PartialJson(json!({
            "text": "High-Priority Opportunity: *Tijarat* (Score: 5/5)"
        })))
        .with_status(200)
        .with_body("ok")
        .expect(1)
        .create();

    let mut config = base_config(&server.url());
    config["inference"] = json!({
        "backend": "command",
        "command": mock_lm_command("strong_fit.json"),
    });
    let fixture = TriageFixture::new(&config).expect("fixture");

    let report = fixture.triage_json(&["run", "--json"]).expect("run");
    read.assert();
    processed.assert();
    failed.assert();
    alert.assert();
    assert_eq!(report["fetched"], 2);
    assert_eq!(report["processed"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["notified"], 1);
    assert_eq!(report["rows"][1]["failure"], "no opportunity description");

    let entries = fixture
        .triage_json(&["ledger", "--json"])
        .expect("ledger");
    let entries = entries.as_array().expect("ledger entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["source_row"], 3);
    assert_eq!(entries[0]["company_name"], "Tijarat");
    assert_eq!(entries[0]["alignment_score"], 5.0);
    assert_eq!(entries[0]["alert_due"], true);
    assert!(fixture.root().join("opportunities.db").is_file());
}

#[test]
fn gemini_pass_alerts_on_low_threshold() {
    let mut server = Server::new();
    let rows = [json!([
        "1/3/2025",
        "Tijarat",
        "ceo@tijarat.pk",
        "",
        "B2B SaaS company in Pakistan"
    ])];
    server
        .mock("GET", values_path())
        .with_status(200)
        .with_body(sheet_body(&rows))
        .create();
    let answer = json!({
        "summary": "B2B SaaS serving Pakistani SMEs.",
        "alignment_score": 4,
        "suggested_next_step": "Request pitch deck"
    });
    let model = server
        .mock("POST", "/models/gemini-2.5-pro:generateContent")
        .match_header("x-goog-api-key", "gemini-test-key")
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{
                    "content": {"parts": [{"text": answer.to_string()}], "role": "model"},
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create();
    server
        .mock("POST", batch_update_path().as_str())
        .with_status(200)
        .with_body("{}")
        .create();
    let alert = server
        .mock("POST", WEBHOOK_PATH)
        .with_status(200)
        .with_body("ok")
        .expect(1)
        .create();

    let fixture = TriageFixture::new(&base_config(&server.url())).expect("fixture");
    let report = fixture
        .triage_json(&["run", "--json", "--threshold", "0.8"])
        .expect("run");

    model.assert();
    alert.assert();
    assert_eq!(report["processed"], 1);
    assert_eq!(report["rows"][0]["score"], 4.0);
    assert_eq!(report["rows"][0]["notified"], true);
}

#[test]
fn below_threshold_is_recorded_without_alert() {
    let mut server = Server::new();
    let rows = [json!(["1/5/2025", "Spielwerk", "hi@spielwerk.de", "", "Mobile games studio"])];
    server
        .mock("GET", values_path())
        .with_status(200)
        .with_body(sheet_body(&rows))
        .create();
    server
        .mock("POST", batch_update_path().as_str())
        .with_status(200)
        .with_body("{}")
        .create();
    let alert = server.mock("POST", WEBHOOK_PATH).expect(0).create();

    let mut config = base_config(&server.url());
    config["inference"] = json!({
        "backend": "command",
        "command": mock_lm_command("weak_fit.json"),
    });
    let fixture = TriageFixture::new(&config).expect("fixture");
    let report = fixture.triage_json(&["run", "--json"]).expect("run");

    alert.assert();
    assert_eq!(report["notified"], 0);
    let entries = fixture.triage_json(&["ledger", "--json"]).expect("ledger");
    assert_eq!(entries[0]["alert_due"], false);
}

#[test]
fn unreadable_sheet_fails_the_run() {
    let mut server = Server::new();
    server
        .mock("GET", values_path())
        .with_status(403)
        .with_body(r#"{"error": {"code": 403, "status": "PERMISSION_DENIED"}}"#)
        .create();
    let update = server.mock("POST", Matcher::Any).expect(0).create();

    let fixture = TriageFixture::new(&base_config(&server.url())).expect("fixture");
    let output = fixture.triage(&["run"]).expect("spawn");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("403"), "{stderr}");
    update.assert();
}

#[test]
fn check_redacts_secrets() {
    let server = Server::new();
    let fixture = TriageFixture::new(&base_config(&server.url())).expect("fixture");
    let output = fixture.triage(&["check"]).expect("spawn");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("<redacted>"), "{stdout}");
    assert!(!stdout.contains(SHEETS_TOKEN), "{stdout}");
    assert!(!stdout.contains("gemini-test-key"), "{stdout}");
}

#[test]
fn check_reads_settings_from_dotenv_file() {
    let server = Server::new();
    let mut config = base_config(&server.url());
    config["sheets"]
        .as_object_mut()
        .expect("sheets object")
        .remove("spreadsheet_id");
    let fixture = TriageFixture::new(&config).expect("fixture");
    std::fs::write(fixture.root().join(".env"), "SPREADSHEET_ID=from-dotenv\n")
        .expect("write .env");

    let output = fixture.triage(&["check"]).expect("spawn");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("from-dotenv"), "{stdout}");
}

#[test]
fn check_reports_missing_settings() {
    let fixture = TriageFixture::new(&json!({"schema_version": 1})).expect("fixture");
    let output = fixture.triage(&["check"]).expect("spawn");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("spreadsheet_id"), "{stderr}");
}

#[test]
fn init_creates_config_and_empty_ledger() {
    let fixture = TriageFixture::bare().expect("fixture");
    let output = fixture.triage(&["init"]).expect("spawn init");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(fixture.config_path.is_file());
    assert!(fixture.root().join("opportunities.db").is_file());

    let again = fixture.triage(&["init"]).expect("spawn init");
    assert!(!again.status.success());

    let output = fixture.triage(&["ledger"]).expect("spawn ledger");
    assert!(String::from_utf8_lossy(&output.stdout).contains("ledger is empty"));
}
