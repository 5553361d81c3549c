//! Tests for the formula field registry

use gridform::prelude::*;
use gridform::{ParseError, ERROR_INDICATOR};
use std::collections::BTreeMap;

fn sales_record() -> Record {
    let mut record = Record::new();
    record.set("Price", 100.0);
    record.set("Quantity", 5.0);
    record.set("Name", "Widget");
    record
}

#[test]
fn test_circular_dependency_is_rejected() {
    let mut registry = FormulaFieldRegistry::new();
    registry.register_formula("A", "{B} + 1").unwrap();

    let err = registry.register_formula("B", "{A} * 2").unwrap_err();
    match err {
        Error::CircularDependency { field, cycle } => {
            assert_eq!(field, "B");
            assert_eq!(cycle, vec!["B", "A", "B"]);
        }
        other => panic!("expected a circular dependency, got {other:?}"),
    }
    assert!(!registry.contains("B"));
    assert_eq!(registry.dependents_of("A"), Vec::<String>::new());

    // The graph is still usable
    registry.register_formula("B", "{C} * 2").unwrap();
    registry.register_formula("C", "10").unwrap();

    let mut record = Record::new();
    let report = registry.calculate_all(&mut record);
    assert!(report.is_success());
    assert_eq!(record.scalar("A"), Some(&Value::Number(21.0)));
}

#[test]
fn test_self_reference_is_rejected() {
    let mut registry = FormulaFieldRegistry::new();
    assert!(matches!(
        registry.register_formula("Loop", "{Loop} + 1"),
        Err(Error::CircularDependency { .. })
    ));
}

#[test]
fn test_calculation_order_ignores_registration_order() {
    for reversed in [false, true] {
        let mut registry = FormulaFieldRegistry::new();
        let mut fields = vec![("Total", "{Price} * {Quantity}"), ("WithTax", "{Total} * 1.1")];
        if reversed {
            fields.reverse();
        }
        for (name, formula) in fields {
            registry.register_formula(name, formula).unwrap();
        }

        assert_eq!(registry.calculation_order(), vec!["Total", "WithTax"]);

        let mut record = sales_record();
        let report = registry.calculate_all(&mut record);
        assert_eq!(report.fields_calculated, 2);
        assert_eq!(record.scalar("Total"), Some(&Value::Number(500.0)));
        assert_eq!(report.get("WithTax").unwrap().formatted_value, "550.00");
    }
}

#[test]
fn test_failing_field_does_not_block_independent_fields() {
    let mut registry = FormulaFieldRegistry::new();
    registry.register_formula("Broken", "{Price} / 0").unwrap();
    registry.register_formula("UsesBroken", "ISBLANK({Broken})").unwrap();
    registry
        .register(
            "Label",
            FormulaFieldSpec::new("UPPER({Name})").with_format(DisplayFormat::Text),
        )
        .unwrap();

    let mut record = sales_record();
    let report = registry.calculate_all(&mut record);

    assert_eq!(report.errors, 1);
    let broken = report.get("Broken").unwrap();
    assert!(!broken.success);
    assert_eq!(broken.formatted_value, ERROR_INDICATOR);
    assert_eq!(broken.error.as_deref(), Some("Division by zero"));

    // Dependents see the unresolved (absent) input
    assert_eq!(record.scalar("UsesBroken"), Some(&Value::Boolean(true)));
    assert_eq!(report.get("Label").unwrap().formatted_value, "WIDGET");
}

#[test]
fn test_recalculation_drops_stale_value_of_failed_field() {
    let mut registry = FormulaFieldRegistry::new();
    registry.register_formula("UnitPrice", "{Price} / {Quantity}").unwrap();
    registry.register_formula("Margin", "{UnitPrice} * 0.25").unwrap();

    let mut record = sales_record();
    assert!(registry.calculate_all(&mut record).is_success());
    assert_eq!(record.scalar("UnitPrice"), Some(&Value::Number(20.0)));
    assert_eq!(record.scalar("Margin"), Some(&Value::Number(5.0)));

    // The record still holds the previous results when it is recalculated
    record.set("Quantity", 0.0);
    let report = registry.calculate_all(&mut record);

    assert_eq!(report.errors, 1);
    assert_eq!(report.get("UnitPrice").unwrap().formatted_value, ERROR_INDICATOR);
    assert!(!record.contains("UnitPrice"));
    assert_eq!(record.scalar("Margin"), Some(&Value::Number(0.0)));
    assert_eq!(report.get("Margin").unwrap().formatted_value, "0.00");
}

#[test]
fn test_huge_decimals_do_not_abort_calculation() {
    let json = r#"{"Total": {"formula": "{Price} * {Quantity}", "decimals": 70000}}"#;
    let registry = FormulaFieldRegistry::from_json(json).unwrap();

    let result = registry.calculate("Total", &sales_record()).unwrap();
    assert!(result.success);
    assert!(result.formatted_value.starts_with("500.00"));
    assert_eq!(
        result.formatted_value.len(),
        "500.".len() + gridform::MAX_DECIMALS as usize
    );
}

#[test]
fn test_deeply_nested_formula_is_rejected() {
    let formula = format!("{}{{Price}}{}", "(".repeat(10_000), ")".repeat(10_000));
    let mut registry = FormulaFieldRegistry::new();

    let err = registry.register_formula("Deep", &formula).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidFormula {
            source: ParseError::TooDeeplyNested { .. },
            ..
        }
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_reregistering_replaces_config() {
    let mut registry = FormulaFieldRegistry::new();
    registry.register_formula("Total", "{Price} * {Quantity}").unwrap();
    registry
        .register(
            "Total",
            FormulaFieldSpec::new("{Price} + {Shipping}").with_format(DisplayFormat::Currency),
        )
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.dependents_of("Quantity").is_empty());
    assert_eq!(registry.dependents_of("Shipping"), vec!["Total"]);

    let mut record = sales_record();
    record.set("Shipping", 1234.5);
    let result = registry.calculate("Total", &record).unwrap();
    assert_eq!(result.formatted_value, "$1,334.50");
}

#[test]
fn test_export_import_round_trip() {
    let mut registry = FormulaFieldRegistry::new();
    registry.register_formula("Total", "{Price} * {Quantity}").unwrap();
    registry
        .register(
            "Discounted",
            FormulaFieldSpec::new("ROUND({Total} * 0.85, 1)")
                .with_format(DisplayFormat::Currency)
                .with_decimals(0),
        )
        .unwrap();
    registry
        .register(
            "Share",
            FormulaFieldSpec::new("{Quantity} / 20").with_format(DisplayFormat::Percentage),
        )
        .unwrap();

    let json = registry.to_json().unwrap();
    let restored = FormulaFieldRegistry::from_json(&json).unwrap();
    assert_eq!(restored.export(), registry.export());

    let options = CalculationOptions::default();
    let mut original_record = sales_record();
    let mut restored_record = sales_record();
    let original = registry.calculate_all_with_options(&mut original_record, &options);
    let again = restored.calculate_all_with_options(&mut restored_record, &options);

    assert_eq!(original.results, again.results);
    assert_eq!(original_record, restored_record);
    assert_eq!(again.get("Share").unwrap().formatted_value, "25.00%");
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fields.json");

    let mut registry = FormulaFieldRegistry::new();
    registry
        .register(
            "Due",
            FormulaFieldSpec::new("DATEADD({Start}, 30)").with_format(DisplayFormat::Date),
        )
        .unwrap();
    registry.save(&path).unwrap();

    let loaded = FormulaFieldRegistry::load(&path).unwrap();
    assert_eq!(loaded.export(), registry.export());

    let mut record = Record::new();
    record.set("Start", "2024-01-15");
    let result = loaded.calculate("Due", &record).unwrap();
    assert_eq!(result.formatted_value, "2024-02-14");
}

#[test]
fn test_load_rejects_invalid_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fields.json");
    std::fs::write(&path, r#"{"Bad": {"formula": "{A} +"}}"#).unwrap();

    assert!(matches!(
        FormulaFieldRegistry::load(&path),
        Err(Error::InvalidFormula { .. })
    ));
    assert!(matches!(
        FormulaFieldRegistry::load(dir.path().join("missing.json")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_import_from_map() {
    let mut specs = BTreeMap::new();
    specs.insert("Total".to_string(), FormulaFieldSpec::new("{Price} * {Quantity}"));

    let mut registry = FormulaFieldRegistry::new();
    registry.import(specs).unwrap();
    assert_eq!(registry.field_names().collect::<Vec<_>>(), vec!["Total"]);
}

#[test]
fn test_provenance_on_results() {
    let mut registry = FormulaFieldRegistry::new();
    registry.register_formula("Total", "{Price}   *   {Quantity}").unwrap();

    let result = registry.calculate("Total", &sales_record()).unwrap();
    assert_eq!(result.context.method, "derived");
    assert_eq!(result.context.definition, "{Price} * {Quantity}");
    assert_eq!(result.context.source.dependencies, vec!["Price", "Quantity"]);
    assert_eq!(result.dependencies, vec!["Price", "Quantity"]);
}
