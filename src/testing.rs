//! Random schema, expression, and plan generation for analyzer tests,
//! governed by the `test.*` settings.

use std::sync::Arc;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::Catalog;
use crate::config::{Settings, TestSettings};
use crate::expr::*;
use crate::logical_plan::*;
use crate::types::{DataType, Field, Fields, Schema};
use crate::{Operator, config};

const SCALAR_TYPES: [DataType; 8] = [
    DataType::Boolean,
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Float32,
    DataType::Float64,
    DataType::String,
];

const NUMERIC_TYPES: [DataType; 6] = [
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Float32,
    DataType::Float64,
];

pub struct PlanGenerator {
    rng: StdRng,
    settings: TestSettings,
    catalog: Arc<Catalog>,
    tables: Vec<(String, Schema)>,
}

impl PlanGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_settings(seed, config::settings().clone())
    }

    pub fn with_settings(seed: u64, settings: Settings) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut catalog = Catalog::new();
        let mut tables = Vec::new();
        for i in 0..3 {
            let name = format!("t{}", i);
            // per-table column prefixes keep joined outputs unambiguous
            let schema = random_schema(&mut rng, &settings.test, &format!("{}_c", name));
            catalog.register_table(&name, &schema);
            tables.push((name, schema));
        }
        Self { rng, settings: settings.test, catalog: Arc::new(catalog), tables }
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    /// One random unresolved query plan over the generated tables.
    pub fn random_plan(&mut self) -> LogicalPlan {
        let depth = if self.chance(self.settings.plans.chances.subquery) { 2 } else { 1 };
        self.random_query(depth).0
    }

    fn random_query(&mut self, depth: usize) -> (LogicalPlan, Vec<String>) {
        let (plan, columns) = if depth > 1 {
            let (inner, columns) = self.random_query(depth - 1);
            let aliased =
                LogicalPlan::SubqueryAlias(SubqueryAlias::new("q", Arc::new(inner)));
            (aliased, columns)
        } else if self.chance(self.settings.plans.chances.from_clause) {
            let max_joins = self.settings.plans.max_join_num.min(self.tables.len() - 1);
            let join_num = self.rng.random_range(0..=max_joins);
            let start = self.rng.random_range(0..self.tables.len());
            let mut columns: Vec<String> = Vec::new();
            let mut plan: Option<LogicalPlan> = None;
            for k in 0..=join_num {
                let (name, schema) = &self.tables[(start + k) % self.tables.len()];
                columns.extend(schema.fields.iter().map(|f| f.name.clone()));
                let relation = LogicalPlan::UnresolvedRelation(name.clone());
                plan = Some(match plan {
                    None => relation,
                    Some(left) => LogicalPlan::Join(Join::new(
                        Arc::new(left),
                        Arc::new(relation),
                        JoinType::Inner,
                        None,
                    )),
                });
            }
            (plan.expect("at least one relation"), columns)
        } else {
            (LogicalPlan::OneRowRelation, Vec::new())
        };

        let mut plan = plan;
        if !columns.is_empty() && self.chance(self.settings.plans.chances.where_clause) {
            let size = self.settings.plans.max_where_predicate_size;
            let condition = self.random_predicate(&columns, size);
            plan = LogicalPlan::Filter(Filter::new(condition, Arc::new(plan)));
        }

        let mut out_columns = Vec::new();
        let project_list: Vec<Expr> =
            if columns.is_empty() || !self.chance(self.settings.plans.chances.select_clause) {
                out_columns = columns;
                vec![Expr::UnresolvedStar(None)]
            } else {
                let width = self.rng.random_range(1..=self.settings.plans.max_project_width);
                (0..width)
                    .map(|i| {
                        if self.rng.random_bool(0.7) {
                            let name = self.pick(&columns);
                            out_columns.push(name.clone());
                            Expr::UnresolvedAttribute(UnresolvedAttribute::new(name))
                        } else {
                            let size = self.settings.plans.max_select_expression_size;
                            let expr = self.random_expression(&columns, size);
                            let name = format!("c{}", i);
                            out_columns.push(name.clone());
                            Expr::Alias(Alias::new(expr, name))
                        }
                    })
                    .collect()
            };
        plan = LogicalPlan::Project(Project::new(project_list, Arc::new(plan)));

        if self.chance(self.settings.plans.chances.limit_clause) {
            let limit = self.rng.random_range(1..=self.settings.plans.max_limit);
            plan = LogicalPlan::Limit(Limit::new(limit, Arc::new(plan)));
        }
        (plan, out_columns)
    }

    /// A random boolean-valued expression, shaped by
    /// `only-logical-operators-in-predicate`.
    pub fn random_predicate(&mut self, columns: &[String], size: usize) -> Expr {
        if size <= 1 || self.rng.random_bool(0.3) {
            let left = self.random_expression(columns, 1);
            let right = self.random_expression(columns, 1);
            let op = self.pick(&[
                Operator::Eq,
                Operator::NotEq,
                Operator::Lt,
                Operator::LtEq,
                Operator::Gt,
                Operator::GtEq,
            ]);
            return binary_expr(left, op, right);
        }
        if self.settings.expressions.only_logical_operators_in_predicate
            || self.rng.random_bool(0.8)
        {
            let left = self.random_predicate(columns, size / 2);
            let right = self.random_predicate(columns, size / 2);
            let op = self.pick(&[Operator::And, Operator::Or]);
            binary_expr(left, op, right)
        } else {
            self.random_predicate(columns, 1).not()
        }
    }

    /// A random value expression over the named columns.
    pub fn random_expression(&mut self, columns: &[String], size: usize) -> Expr {
        if size <= 1 {
            return if !columns.is_empty() && self.rng.random_bool(0.5) {
                let name = self.pick(columns);
                Expr::UnresolvedAttribute(UnresolvedAttribute::new(name))
            } else {
                self.random_literal()
            };
        }
        let left = self.random_expression(columns, size / 2);
        let right = self.random_expression(columns, size / 2);
        let op = self.pick(&[Operator::Plus, Operator::Minus, Operator::Multiply]);
        binary_expr(left, op, right)
    }

    pub fn random_literal(&mut self) -> Expr {
        if self.rng.random_bool(self.settings.expressions.chances.null) {
            return Expr::null_lit();
        }
        match self.rng.random_range(0..4) {
            0 => Expr::int_lit(self.rng.random_range(-100..100)),
            1 => Expr::long_lit(self.rng.random_range(-100_000..100_000)),
            2 => Expr::boolean_lit(self.rng.random_bool(0.5)),
            _ => Expr::string_lit(format!("s{}", self.rng.random_range(0..100))),
        }
    }

    fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    fn pick<T: Clone>(&mut self, options: &[T]) -> T {
        options[self.rng.random_range(0..options.len())].clone()
    }
}

pub fn random_schema(rng: &mut StdRng, settings: &TestSettings, column_prefix: &str) -> Schema {
    let width = rng.random_range(2..=settings.types.max_struct_type_width.max(2));
    let fields = (0..width)
        .map(|i| {
            let data_type = if i == 0 {
                // keep at least one numeric column so arithmetic has a target
                NUMERIC_TYPES[rng.random_range(0..NUMERIC_TYPES.len())].clone()
            } else {
                random_data_type(rng, settings, 1)
            };
            Field::new(format!("{}{}", column_prefix, i), data_type)
                .with_nullable(settings.types.allow_nullable_struct_field && rng.random_bool(0.5))
        })
        .collect();
    Schema::new(fields)
}

pub fn random_data_type(rng: &mut StdRng, settings: &TestSettings, depth: usize) -> DataType {
    if settings.types.allow_null_type && rng.random_bool(0.05) {
        return DataType::Null;
    }
    if depth > 0 && rng.random_bool(0.15) {
        return random_complex_type(rng, settings, depth);
    }
    SCALAR_TYPES[rng.random_range(0..SCALAR_TYPES.len())].clone()
}

fn random_complex_type(rng: &mut StdRng, settings: &TestSettings, depth: usize) -> DataType {
    match rng.random_range(0..3) {
        0 => {
            let element = random_data_type(rng, settings, depth - 1);
            let nullable =
                settings.types.allow_nullable_array_type && rng.random_bool(0.5);
            DataType::Array(Box::new(element), nullable)
        }
        1 => {
            let key = SCALAR_TYPES[rng.random_range(0..SCALAR_TYPES.len())].clone();
            let value = random_data_type(rng, settings, depth - 1);
            let nullable = settings.types.allow_nullable_map_type && rng.random_bool(0.5);
            DataType::Map(Box::new(key), Box::new(value), nullable)
        }
        _ => {
            let width = if settings.types.allow_empty_struct_type && rng.random_bool(0.1) {
                0
            } else {
                rng.random_range(1..=settings.types.max_struct_type_width.max(1))
            };
            let nested = settings.types.allow_nested_struct_type;
            let fields = (0..width)
                .map(|i| {
                    let data_type = if nested {
                        random_data_type(rng, settings, depth - 1)
                    } else {
                        SCALAR_TYPES[rng.random_range(0..SCALAR_TYPES.len())].clone()
                    };
                    Field::new(format!("f{}", i), data_type).with_nullable(
                        settings.types.allow_nullable_struct_field && rng.random_bool(0.5),
                    )
                })
                .collect();
            DataType::Struct(Fields(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::tree_node::TreeNode;

    fn fully_resolved(plan: &LogicalPlan) -> bool {
        plan.resolved()
            && !plan.exists(|p| {
                p.expressions().iter().any(|e| {
                    e.exists(|x| {
                        matches!(
                            x,
                            Expr::UnresolvedAttribute(_)
                                | Expr::UnresolvedFunction(_)
                                | Expr::UnresolvedStar(_)
                                | Expr::UnresolvedAlias(_)
                                | Expr::DistinctAggregateFunction(_)
                        )
                    })
                })
            })
    }

    #[test]
    fn test_generated_plans_resolve_and_are_idempotent() {
        let mut generator = PlanGenerator::new(42);
        let analyzer = Analyzer::new(generator.catalog());
        let repetitions = config::settings().test.expressions.max_repetition;
        let mut analyzed_count = 0;
        for _ in 0..repetitions {
            let plan = generator.random_plan();
            // some generated plans are legitimately ill-typed; only the
            // successful ones carry the closure and idempotence obligations
            if let Ok(analyzed) = analyzer.analyze(plan) {
                assert!(fully_resolved(&analyzed), "not fully resolved: {:?}", analyzed);
                let again = analyzer.analyze(analyzed.clone()).expect("idempotent reanalysis");
                assert_eq!(again, analyzed, "analysis is not idempotent");
                analyzed_count += 1;
            }
        }
        assert!(analyzed_count > 0, "no generated plan analyzed successfully");
    }

    #[test]
    fn test_generator_is_deterministic() {
        // alias ids are globally minted, so compare id-free expressions
        let mut a = PlanGenerator::new(7);
        let mut b = PlanGenerator::new(7);
        let columns = vec!["x".to_string(), "y".to_string()];
        for _ in 0..20 {
            assert_eq!(
                a.random_predicate(&columns, 8),
                b.random_predicate(&columns, 8)
            );
        }
    }
}
