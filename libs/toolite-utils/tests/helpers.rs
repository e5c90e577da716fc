//! Helper scenarios across modules
//!
//! - Shift schedules checked against time slots
//! - Grouped readings exported one sheet per group
//! - Event bus driving a formatter

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use toolite_utils::{
    date_by_offset, date_diff, date_format, export_many, group_by_field, hex_to_rgba,
    is_time_range, is_time_within_intervals, truncate_decimal, DateInput, Emitter, ExportOptions,
    IntervalEdge, Sheet, TimeUnit,
};

#[test]
fn test_adjacent_slots_share_boundaries() {
    let slots = [("08:00:00", "12:00:00"), ("13:00:00", "17:30:00")];

    // A new slot may start where an existing one ends
    assert!(!is_time_within_intervals("12:00:00", &slots, IntervalEdge::Start).unwrap());
    // ...and may end where an existing one starts
    assert!(!is_time_within_intervals("13:00:00", &slots, IntervalEdge::End).unwrap());

    assert!(is_time_within_intervals("12:00:00", &slots, IntervalEdge::End).unwrap());
    assert!(is_time_within_intervals("13:00:00", &slots, IntervalEdge::Start).unwrap());
    assert!(!is_time_within_intervals("12:30:00", &slots, IntervalEdge::Start).unwrap());
}

#[test]
fn test_report_window_arithmetic() {
    let end = "2024-03-31 23:59:59";
    let start = date_by_offset(Some(end.into()), -1, TimeUnit::Months, Some("YYYY-MM-DD")).unwrap();
    assert_eq!(start, "2024-02-29");

    assert_eq!(date_diff(start.as_str(), end, TimeUnit::Days).unwrap(), 31);
    assert!(is_time_range("2024-03-15 10:00:00", &start, end).unwrap());
    assert!(!is_time_range("2024-04-01 00:00:00", &start, end).unwrap());

    assert_eq!(
        date_format(DateInput::from("2024-03-15T10:00:00Z"), Some("MM/DD HH:mm"), Some(8)),
        "03/15 18:00"
    );
}

#[test]
fn test_grouped_readings_export_per_sheet() {
    let readings: Vec<Value> = vec![
        json!({"station": "north", "at": "2024-01-01 00:00:00", "kw": 12.3456}),
        json!({"station": "south", "at": "2024-01-01 00:00:00", "kw": 7.0}),
        json!({"station": "north", "at": "2024-01-01 01:00:00", "kw": 13.9999}),
    ];

    let sheets: Vec<Sheet> = group_by_field(&readings, "station", true)
        .into_iter()
        .map(|group| {
            let name = group[0]["station"].as_str().unwrap().to_string();
            let mut rows = vec![vec![json!("time"), json!("kW")]];
            rows.extend(group.iter().map(|r| {
                let kw = truncate_decimal(r["kw"].as_f64().unwrap(), 2, false);
                vec![r["at"].clone(), json!(kw)]
            }));
            Sheet::new(rows).named(name)
        })
        .collect();

    let dir = TempDir::new().unwrap();
    let options = ExportOptions::new(dir.path())
        .file_name("readings")
        .with_timestamp(false);
    let paths = export_many(&sheets, &options).unwrap();

    assert_eq!(paths.len(), 2);
    let north = std::fs::read_to_string(dir.path().join("readings_north.csv")).unwrap();
    assert_eq!(
        north,
        "time,kW\n2024-01-01 00:00:00,12.34\n2024-01-01 01:00:00,13.99\n"
    );
}

#[test]
fn test_emitter_drives_theme_updates() {
    let emitter: Emitter = Emitter::new();
    let applied = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&applied);
    let id = emitter.on("theme", move |payload: &Value| {
        let color = payload["color"].as_str().unwrap_or_default();
        let alpha = payload["alpha"].as_f64().unwrap_or(1.0);
        sink.lock().push(hex_to_rgba(color, alpha));
    });

    emitter.emit("theme", &json!({"color": "#336699", "alpha": 0.8}));
    emitter.emit("theme", &json!({"color": "not-a-color"}));
    emitter.off(id);
    emitter.emit("theme", &json!({"color": "#000000"}));

    assert_eq!(
        *applied.lock(),
        vec!["rgba(51, 102, 153, 0.8)".to_string(), String::new()]
    );
}
