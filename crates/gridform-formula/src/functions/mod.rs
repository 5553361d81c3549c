//! Built-in formula functions
//!
//! A static, init-once table from upper-case function name to implementation. The parser
//! upper-cases call names, so lookups here are exact.

pub mod date;
pub mod info;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use ahash::AHashMap;
use gridform_core::Value;
use once_cell::sync::Lazy;

/// Function implementation signature.
///
/// Arguments arrive evaluated and already checked against the definition's arity.
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> FormulaResult<Value>;

/// Function category, for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    Math,
    Logical,
    Text,
    Date,
    Info,
}

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Category
    pub category: FunctionCategory,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

fn def(
    name: &'static str,
    category: FunctionCategory,
    min_args: usize,
    max_args: Option<usize>,
    implementation: FunctionImpl,
) -> FunctionDef {
    FunctionDef {
        name,
        category,
        min_args,
        max_args,
        implementation,
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// The shared registry of built-in functions
pub fn builtin_functions() -> &'static FunctionRegistry {
    &BUILTINS
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        use FunctionCategory::*;

        let table = [
            // Math
            def("SUM", Math, 0, None, math::fn_sum),
            def("AVG", Math, 0, None, math::fn_avg),
            def("MIN", Math, 1, None, math::fn_min),
            def("MAX", Math, 1, None, math::fn_max),
            def("ROUND", Math, 1, Some(2), math::fn_round),
            def("ABS", Math, 1, Some(1), math::fn_abs),
            def("SQRT", Math, 1, Some(1), math::fn_sqrt),
            def("POWER", Math, 2, Some(2), math::fn_power),
            def("MOD", Math, 2, Some(2), math::fn_mod),
            // Logical
            def("IF", Logical, 2, Some(3), logical::fn_if),
            def("AND", Logical, 0, None, logical::fn_and),
            def("OR", Logical, 0, None, logical::fn_or),
            def("NOT", Logical, 1, Some(1), logical::fn_not),
            // Text
            def("CONCAT", Text, 0, None, text::fn_concat),
            def("UPPER", Text, 1, Some(1), text::fn_upper),
            def("LOWER", Text, 1, Some(1), text::fn_lower),
            def("TRIM", Text, 1, Some(1), text::fn_trim),
            def("LEN", Text, 1, Some(1), text::fn_len),
            def("LEFT", Text, 1, Some(2), text::fn_left),
            def("RIGHT", Text, 1, Some(2), text::fn_right),
            def("MID", Text, 2, Some(3), text::fn_mid),
            def("FIND", Text, 2, Some(3), text::fn_find),
            def("REPLACE", Text, 3, Some(3), text::fn_replace),
            // Date
            def("TODAY", Date, 0, Some(0), date::fn_today),
            def("NOW", Date, 0, Some(0), date::fn_now),
            def("YEAR", Date, 1, Some(1), date::fn_year),
            def("MONTH", Date, 1, Some(1), date::fn_month),
            def("DAY", Date, 1, Some(1), date::fn_day),
            def("HOUR", Date, 1, Some(1), date::fn_hour),
            def("MINUTE", Date, 1, Some(1), date::fn_minute),
            def("SECOND", Date, 1, Some(1), date::fn_second),
            def("DATEDIFF", Date, 2, Some(3), date::fn_datediff),
            def("DATEADD", Date, 2, Some(3), date::fn_dateadd),
            // Info / utility
            def("COUNT", Info, 0, None, info::fn_count),
            def("COUNTA", Info, 0, None, info::fn_counta),
            def("COUNTBLANK", Info, 0, None, info::fn_countblank),
            def("ISBLANK", Info, 1, Some(1), info::fn_isblank),
            def("ISNUMBER", Info, 1, Some(1), info::fn_isnumber),
            def("ISTEXT", Info, 1, Some(1), info::fn_istext),
            def("ISERROR", Info, 1, Some(1), info::fn_iserror),
            def("VALUE", Info, 1, Some(1), info::fn_value),
            def("TEXT", Info, 1, Some(2), info::fn_text),
            def("BLANK", Info, 0, Some(0), info::fn_blank),
        ];

        let mut registry = Self {
            functions: AHashMap::with_capacity(table.len()),
        };
        for def in table {
            registry.register(def);
        }
        registry
    }

    /// Look up a function by its upper-case name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// All function names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a numeric argument to a character count or offset, clamping negatives to 0
pub(crate) fn to_count(v: &Value) -> usize {
    let n = v.to_number();
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc() as usize
    }
}
