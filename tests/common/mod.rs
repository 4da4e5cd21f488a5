#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RUN_PAGESPEED: &str = "/pagespeedonline/v5/runPagespeed";
pub const SHEET_ID: &str = "sheet-123";

pub fn audit_body(score: f64) -> Value {
    json!({
        "id": "https://example.com/",
        "lighthouseResult": {
            "categories": { "performance": { "id": "performance", "score": score } },
            "audits": {
                "speed-index": { "displayValue": "3.4 s", "numericValue": 3400.2 },
                "first-contentful-paint": { "displayValue": "1.8 s" },
                "largest-contentful-paint": { "displayValue": "2.9 s" },
                "interactive": { "displayValue": "5.1 s" },
                "cumulative-layout-shift": { "displayValue": "0.012" },
                "max-potential-fid": { "displayValue": "160 ms" }
            }
        }
    })
}

pub fn pagespeed_endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), RUN_PAGESPEED)
}

/// Answers every audit of `url` with a complete response.
pub async fn mount_audit(server: &MockServer, url: &str, score: f64) {
    Mock::given(method("GET"))
        .and(path(RUN_PAGESPEED))
        .and(query_param("url", url))
        .respond_with(ResponseTemplate::new(200).set_body_json(audit_body(score)))
        .mount(server)
        .await;
}

pub fn append_path(range: &str) -> String {
    format!("/v4/spreadsheets/{}/values/{}:append", SHEET_ID, range)
}

pub fn append_response(cells: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "spreadsheetId": SHEET_ID,
        "updates": { "updatedCells": cells, "updatedRows": 1 }
    }))
}
