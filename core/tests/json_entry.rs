use runmap_core::analyze_sessions_json;
use serde_json::{json, Value};

fn reference(id: u64, date: &str, pace: f64) -> Value {
    json!({ "id": id, "date": date, "pace": pace })
}

#[test]
fn good_day_streaks_from_json() {
    // Gode dager 01, 02, 04; dag 03 er ikke god
    let sessions = json!([
        reference(1, "2024-01-01", 6.2),
        reference(2, "2024-01-02", 5.7),
        reference(3, "2024-01-03", 7.0),
        reference(4, "2024-01-04", 6.0),
        reference(5, "2024-01-05", 7.1),
    ]);

    let out = analyze_sessions_json(&sessions.to_string(), None, None).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();

    let stats = &v["good_day_stats"];
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["best_streak"], 2);
    assert_eq!(stats["last_date"], "2024-01-04");
    let pb = stats["personal_best"].as_f64().unwrap();
    assert!((pb - 0.8).abs() < 1e-9, "personal best {pb}");
    assert!(v["error"].is_null());
}

#[test]
fn reference_session_has_exact_baseline() {
    let sessions = json!([
        reference(1, "2024-01-01", 6.5),
        reference(2, "2024-01-02", 6.0),
        reference(3, "2024-01-03", 7.0),
    ]);
    let out = analyze_sessions_json(&sessions.to_string(), None, None).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();

    for s in v["sessions"].as_array().unwrap() {
        assert_eq!(s["expected_pace"], 6.5);
        assert_eq!(s["factors"], json!([]));
    }
}

#[test]
fn metadata_and_config_are_applied() {
    let sessions = json!([
        reference(1, "2024-01-01", 6.2),
        reference(2, "2024-01-02", 5.9),
        reference(3, "2024-01-03", 7.0),
        reference(4, "2024-01-04", 6.8),
    ]);
    let metadata = json!({ "2": { "tags": ["race"], "isFalsePositive": true, "feltHarder": true } });
    let config = json!({ "method": "umap", "k": 2 });

    let out = analyze_sessions_json(
        &sessions.to_string(),
        Some(&metadata.to_string()),
        Some(&config.to_string()),
    )
    .unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();

    let s2 = v["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == 2)
        .unwrap();
    assert_eq!(s2["tags"], json!(["race"]));
    assert_eq!(s2["is_false_positive"], true);
    assert_eq!(s2["felt_harder"], true);
    assert_eq!(v["centroids"].as_array().unwrap().len(), 2);
}

#[test]
fn bad_input_reports_context() {
    let err = analyze_sessions_json(r#"[{"id": 1}]"#, None, None).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("sessions"), "{msg}");
    assert!(msg.contains("date"), "{msg}");

    let one = json!([reference(1, "2024-01-01", 6.5)]).to_string();
    let err = analyze_sessions_json(&one, None, None).unwrap_err();
    assert!(format!("{err:#}").contains("degenerate input"), "{err:#}");
}
