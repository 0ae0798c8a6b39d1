//! Aggregate functions available to formulas

pub mod aggregate;

use crate::error::FormulaResult;
use ahash::AHashMap;
use std::sync::OnceLock;

/// Function implementation signature
///
/// Receives the flattened argument values: scalar arguments contribute one
/// value each, range arguments contribute the numeric cells they cover.
pub type FunctionImpl = fn(&[f64]) -> FormulaResult<f64>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

/// Default registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

impl FunctionRegistry {
    /// Create a new registry with the built-in aggregates
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_aggregate_functions();
        registry
    }

    /// Create a registry with no functions at all
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// The shared registry holding the built-in functions
    pub fn global() -> &'static FunctionRegistry {
        FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
    }

    /// Look up a function by name, case-insensitively
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check whether a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any existing one with the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Registered function names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|def| def.name).collect();
        names.sort_unstable();
        names
    }

    fn register_aggregate_functions(&mut self) {
        self.register(FunctionDef {
            name: "SUM",
            min_args: 0,
            max_args: None,
            implementation: aggregate::fn_sum,
        });

        self.register(FunctionDef {
            name: "AVERAGE",
            min_args: 0,
            max_args: None,
            implementation: aggregate::fn_average,
        });

        self.register(FunctionDef {
            name: "MIN",
            min_args: 0,
            max_args: None,
            implementation: aggregate::fn_min,
        });

        self.register(FunctionDef {
            name: "MAX",
            min_args: 0,
            max_args: None,
            implementation: aggregate::fn_max,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
