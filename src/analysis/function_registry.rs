use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use crate::config;
use crate::expr::aggregate::{Average, Count, Max, Min, Sum};
use crate::expr::functions::{
    Abs, Coalesce, Concat, DateFormat, If, Length, Lower, Substring, Upper,
};
use crate::expr::Expr;
use crate::{AnalysisError, Result};

pub type FunctionBuilder = dyn Fn(Vec<Expr>) -> Result<Expr> + Send + Sync;

/// Everything the analyzer needs to know about a function: its canonical
/// name and how to build the expression from resolved arguments.
pub struct FunctionInfo {
    pub name: &'static str,
    builder: Box<FunctionBuilder>,
}

impl FunctionInfo {
    pub fn new(name: &'static str, builder: Box<FunctionBuilder>) -> Self {
        Self { name, builder }
    }

    pub fn build(&self, args: Vec<Expr>) -> Result<Expr> {
        (self.builder)(args)
    }
}

struct FunctionRegistry {
    functions: HashMap<String, FunctionInfo>,
}

impl FunctionRegistry {
    fn lookup_function(&self, name: &str, args: Vec<Expr>) -> Result<Expr> {
        match self.functions.get(&config::fold_name(name)) {
            Some(info) => info.build(args),
            None => Err(AnalysisError::FunctionNotFound(name.to_string())),
        }
    }

    fn register_function(&mut self, name: &'static str, builder: Box<FunctionBuilder>) {
        self.functions.insert(config::fold_name(name), FunctionInfo::new(name, builder));
    }
}

static FUNCTION_REGISTRY: LazyLock<Mutex<FunctionRegistry>> =
    LazyLock::new(|| Mutex::new(builtin_function_registry()));

pub fn lookup_function(name: &str, args: Vec<Expr>) -> Result<Expr> {
    let registry = FUNCTION_REGISTRY.lock().unwrap();
    registry.lookup_function(name, args)
}

pub fn register_function(name: &'static str, builder: Box<FunctionBuilder>) {
    let mut registry = FUNCTION_REGISTRY.lock().unwrap();
    registry.register_function(name, builder);
}

macro_rules! init_functions {
    ($($($names:literal)|+ => $ty:ident),* $(,)?) => {
        {
            let mut functions: HashMap<String, FunctionInfo> = HashMap::new();
            $(
                $(
                    functions.insert(
                        config::fold_name($names),
                        FunctionInfo::new($names, Box::new(|args| $ty::from_args(args))),
                    );
                )+
            )*
            functions
        }
    };
}

fn builtin_function_registry() -> FunctionRegistry {
    let functions = init_functions!(
        // aggregates
        "count" => Count,
        "sum" => Sum,
        "min" => Min,
        "max" => Max,
        "avg" | "average" => Average,
        // str
        "length" => Length,
        "substring" | "substr" => Substring,
        "concat" => Concat,
        "upper" | "ucase" => Upper,
        "lower" | "lcase" => Lower,
        // misc
        "abs" => Abs,
        "coalesce" | "nvl" => Coalesce,
        "if" => If,
        "date_format" => DateFormat,
    );
    FunctionRegistry { functions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_builtin() {
        let expr = lookup_function("count", vec![Expr::int_lit(1)]).unwrap();
        assert!(matches!(expr, Expr::AggregateFunction(_)));
        let expr = lookup_function("length", vec![Expr::string_lit("a")]).unwrap();
        assert!(matches!(expr, Expr::ScalarFunction(_)));
    }

    #[test]
    fn test_lookup_missing() {
        assert_eq!(
            lookup_function("nope", vec![]),
            Err(AnalysisError::FunctionNotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_register_function() {
        register_function("always_one", Box::new(|_args| Ok(Expr::int_lit(1))));
        assert_eq!(lookup_function("always_one", vec![]), Ok(Expr::int_lit(1)));
    }
}
