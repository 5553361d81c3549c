//! Formula field registry
//!
//! Holds the named formula fields of one table, keeps their dependency graph acyclic, and
//! evaluates them against records one at a time or as a batch in dependency order.
//!
//! # Example
//!
//! ```rust
//! use gridform::{FormulaFieldRegistry, FormulaFieldSpec, DisplayFormat, Record};
//!
//! let mut registry = FormulaFieldRegistry::new();
//! registry.register_formula("Total", "{Price} * {Quantity}").unwrap();
//! registry
//!     .register(
//!         "WithTax",
//!         FormulaFieldSpec::new("{Total} * 1.1").with_format(DisplayFormat::Currency),
//!     )
//!     .unwrap();
//!
//! let mut record: Record = [("Price", 100.0), ("Quantity", 5.0)].into_iter().collect();
//! let report = registry.calculate_all(&mut record);
//! assert_eq!(report.errors, 0);
//! assert_eq!(report.get("WithTax").unwrap().formatted_value, "$550.00");
//! ```

use crate::error::{Error, Result};
use crate::provenance::{describe, ProvenanceDescriptor};
use chrono::{DateTime, Utc};
use gridform_core::{format_value, DisplayFormat, Record, Value, ValueResolver, ViewContext};
use gridform_formula::{evaluate, parse, DependencyGraph, EvaluationContext, FormulaExpr};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Display text of a field whose formula failed to evaluate
pub const ERROR_INDICATOR: &str = "#ERROR!";

fn default_decimals() -> u32 {
    2
}

/// Serializable definition of a formula field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaFieldSpec {
    /// Formula source, e.g. `{Price} * {Quantity}`
    pub formula: String,
    /// How results are rendered (default: number)
    #[serde(default)]
    pub display_format: DisplayFormat,
    /// Decimal places for numeric formats (default: 2)
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl FormulaFieldSpec {
    /// Spec with the default display settings
    pub fn new<S: Into<String>>(formula: S) -> Self {
        Self {
            formula: formula.into(),
            display_format: DisplayFormat::default(),
            decimals: default_decimals(),
        }
    }

    /// Set the display format
    pub fn with_format(mut self, format: DisplayFormat) -> Self {
        self.display_format = format;
        self
    }

    /// Set the number of decimals
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }
}

/// A registered formula field
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaFieldConfig {
    pub name: String,
    pub formula: String,
    pub display_format: DisplayFormat,
    pub decimals: u32,
    /// Every field the formula references
    pub dependencies: BTreeSet<String>,
    pub ast: FormulaExpr,
}

impl FormulaFieldConfig {
    /// The serializable part of this field
    pub fn spec(&self) -> FormulaFieldSpec {
        FormulaFieldSpec {
            formula: self.formula.clone(),
            display_format: self.display_format,
            decimals: self.decimals,
        }
    }
}

/// Outcome of calculating one formula field
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Computed value; empty on failure
    pub value: Value,
    /// Value rendered with the field's display format, or [`ERROR_INDICATOR`]
    pub formatted_value: String,
    pub context: ProvenanceDescriptor,
    /// Fields the formula reads, sorted
    pub dependencies: Vec<String>,
    pub success: bool,
    /// Evaluation error message
    pub error: Option<String>,
}

/// Options for calculating formula fields
#[derive(Clone, Default)]
pub struct CalculationOptions<'a> {
    /// Resolver for superposed cells (default: most recent observation)
    pub resolver: Option<&'a dyn ValueResolver>,
    /// View handed to the resolver
    pub view: ViewContext,
    /// Instant seen by TODAY()/NOW() (default: the time the calculation starts)
    pub now: Option<DateTime<Utc>>,
}

/// Results from a batch calculation
#[derive(Debug, Clone, Default)]
pub struct CalculationReport {
    /// Results in calculation order
    pub results: Vec<(String, EvalResult)>,
    /// Number of fields calculated
    pub fields_calculated: usize,
    /// Number of fields that failed
    pub errors: usize,
}

impl CalculationReport {
    /// Result for `field`
    pub fn get(&self, field: &str) -> Option<&EvalResult> {
        self.results
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, result)| result)
    }

    /// Check if every field calculated without error
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// Registry of formula fields
#[derive(Debug, Clone, Default)]
pub struct FormulaFieldRegistry {
    fields: BTreeMap<String, FormulaFieldConfig>,
    graph: DependencyGraph,
}

impl FormulaFieldRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from exported specs
    pub fn from_specs(specs: BTreeMap<String, FormulaFieldSpec>) -> Result<Self> {
        let mut registry = Self::new();
        for (name, spec) in specs {
            registry.register(name, spec)?;
        }
        Ok(registry)
    }

    /// Register (or replace) a formula field.
    ///
    /// Fails without changing the registry if the formula does not parse or would make the
    /// field depend on itself.
    pub fn register<S: Into<String>>(&mut self, name: S, spec: FormulaFieldSpec) -> Result<()> {
        let name = name.into();
        let (ast, dependencies) = parse(&spec.formula)
            .into_result()
            .map_err(|source| Error::InvalidFormula {
                field: name.clone(),
                source,
            })?;

        if let Some(cycle) = self.graph.would_create_cycle(&name, &dependencies) {
            return Err(Error::CircularDependency { field: name, cycle });
        }

        debug!(field = %name, dependencies = ?dependencies, "registered formula field");

        self.graph.set_dependencies(&name, dependencies.clone());
        self.fields.insert(
            name.clone(),
            FormulaFieldConfig {
                name,
                formula: spec.formula,
                display_format: spec.display_format,
                decimals: spec.decimals,
                dependencies,
                ast,
            },
        );
        Ok(())
    }

    /// Register a formula field with the default display settings
    pub fn register_formula<S: Into<String>>(&mut self, name: S, formula: &str) -> Result<()> {
        self.register(name, FormulaFieldSpec::new(formula))
    }

    /// Remove a formula field; returns false if it was not registered
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.fields.remove(name).is_none() {
            return false;
        }
        self.graph.remove_field(name);
        debug!(field = %name, "unregistered formula field");
        true
    }

    /// Get a registered field
    pub fn get(&self, name: &str) -> Option<&FormulaFieldConfig> {
        self.fields.get(name)
    }

    /// Check if a field is registered
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Registered field names, sorted
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Registered fields, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &FormulaFieldConfig> {
        self.fields.values()
    }

    /// Formula fields that read `name`, sorted
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        let mut dependents: Vec<String> = self.graph.dependents(name).map(str::to_string).collect();
        dependents.sort_unstable();
        dependents
    }

    /// Order in which [`calculate_all`](Self::calculate_all) evaluates the fields
    pub fn calculation_order(&self) -> Vec<String> {
        self.graph.calculation_order()
    }

    /// Calculate one field against `record` with default options
    pub fn calculate(&self, name: &str, record: &Record) -> Result<EvalResult> {
        self.calculate_with_options(name, record, &CalculationOptions::default())
    }

    /// Calculate one field against `record`.
    ///
    /// Evaluation errors are reported in the [`EvalResult`]; only an unregistered `name` is
    /// an error here.
    pub fn calculate_with_options(
        &self,
        name: &str,
        record: &Record,
        options: &CalculationOptions,
    ) -> Result<EvalResult> {
        let config = self
            .fields
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))?;
        let now = options.now.unwrap_or_else(Utc::now);
        Ok(evaluate_field(config, record, options, now))
    }

    /// Calculate every field in dependency order with default options
    pub fn calculate_all(&self, record: &mut Record) -> CalculationReport {
        self.calculate_all_with_options(record, &CalculationOptions::default())
    }

    /// Calculate every field in dependency order, writing each successful value back into
    /// `record` so that later fields read it.
    ///
    /// A failing field is removed from `record`, so fields that read it see an absent input
    /// rather than a value left over from an earlier calculation. It does not stop the batch.
    pub fn calculate_all_with_options(
        &self,
        record: &mut Record,
        options: &CalculationOptions,
    ) -> CalculationReport {
        let order = self.graph.calculation_order();
        trace!(order = ?order, "calculation order");

        // One instant for the whole batch
        let now = options.now.unwrap_or_else(Utc::now);
        let mut report = CalculationReport {
            results: Vec::with_capacity(order.len()),
            ..Default::default()
        };

        for name in order {
            let Some(config) = self.fields.get(&name) else {
                continue;
            };

            let result = evaluate_field(config, record, options, now);
            report.fields_calculated += 1;

            if result.success {
                record.set(name.as_str(), result.value.clone());
            } else {
                record.remove(&name);
                report.errors += 1;
                warn!(
                    field = %name,
                    error = result.error.as_deref().unwrap_or_default(),
                    "formula field failed"
                );
            }
            report.results.push((name, result));
        }

        report
    }

    /// Serializable configuration of every field, sorted by name
    pub fn export(&self) -> BTreeMap<String, FormulaFieldSpec> {
        self.fields
            .iter()
            .map(|(name, config)| (name.clone(), config.spec()))
            .collect()
    }

    /// Replace the registry contents with `specs`.
    ///
    /// Every formula is re-parsed. If any field fails to register, the registry is left as
    /// it was.
    pub fn import(&mut self, specs: BTreeMap<String, FormulaFieldSpec>) -> Result<()> {
        let count = specs.len();
        *self = Self::from_specs(specs)?;
        debug!(fields = count, "imported formula fields");
        Ok(())
    }

    /// Export as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Build a registry from JSON produced by [`to_json`](Self::to_json)
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_specs(serde_json::from_str(json)?)
    }

    /// Save the configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a configuration saved with [`save`](Self::save)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn evaluate_field(
    config: &FormulaFieldConfig,
    record: &Record,
    options: &CalculationOptions,
    now: DateTime<Utc>,
) -> EvalResult {
    let mut ctx = EvaluationContext::new(record)
        .with_view(&options.view)
        .with_now(now);
    if let Some(resolver) = options.resolver {
        ctx = ctx.with_resolver(resolver);
    }

    let context = describe(&config.formula, &config.dependencies);
    let dependencies = config.dependencies.iter().cloned().collect();

    match evaluate(&config.ast, &ctx) {
        Ok(value) => EvalResult {
            formatted_value: format_value(&value, config.display_format, config.decimals),
            value,
            context,
            dependencies,
            success: true,
            error: None,
        },
        Err(err) => EvalResult {
            value: Value::Empty,
            formatted_value: ERROR_INDICATOR.to_string(),
            context,
            dependencies,
            success: false,
            error: Some(err.to_string()),
        },
    }
}
