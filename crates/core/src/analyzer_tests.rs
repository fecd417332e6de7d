// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    day = { RateUnit::Day, 86_400 },
    month = { RateUnit::Month, 2_592_000 },
)]
fn rate_unit_seconds(unit: RateUnit, expected: u64) {
    assert_eq!(unit.seconds(), expected);
}

#[test]
fn definition_deserializes_with_defaults() {
    let def: AnalyzerDefinition = serde_json::from_value(serde_json::json!({
        "id": "maxmind_1_0",
        "cmd": "/opt/analyzers/maxmind/run",
        "baseDirectory": "/opt/analyzers/maxmind"
    }))
    .unwrap();
    assert!(def.configuration_items.is_empty());
    assert!(def.configuration.is_empty());
}

#[test]
fn config_item_builder() {
    let item = ConfigItem::new("api_key", ConfigItemKind::String).required();
    assert!(item.required);
    assert!(!item.multi);
    assert!(item.default_value.is_none());

    let item = ConfigItem::new("ports", ConfigItemKind::Number)
        .multi()
        .with_default(serde_json::json!([80, 443]));
    assert!(item.multi);
    assert_eq!(item.default_value, Some(serde_json::json!([80, 443])));
}

#[test]
fn config_item_kind_serializes_lowercase() {
    let item = ConfigItem::new("verbose", ConfigItemKind::Boolean);
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["type"], "boolean");
}
