pub mod aggregates;
pub mod checks;
pub mod function_registry;
pub mod rule;
pub mod type_check;

pub use aggregates::*;
pub use checks::*;
pub use function_registry::*;
pub use rule::*;
pub use type_check::*;

use std::fmt::Debug;
use std::sync::Arc;

use log::{debug, warn};

use crate::Result;
use crate::catalog::Catalog;
use crate::logical_plan::LogicalPlan;
use crate::tree_node::Transformed;

pub trait AnalyzerRule: Debug {
    /// Rewrite `plan`
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>>;

    /// A human readable name for this analyzer rule
    fn name(&self) -> &str;
}

/// How often a batch's rules run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Each rule runs exactly once, in order.
    Once,
    /// Rules run in passes until a full pass changes nothing, or the pass
    /// limit is hit. Hitting the limit is not an error: the post-analysis
    /// checks catch whatever stayed unresolved.
    FixedPoint(usize),
}

impl Strategy {
    /// "Unlimited" fixed point; the executor still caps passes at
    /// [`MAX_FIXED_POINT_PASSES`] and warns instead of silently diverging.
    pub fn fixed_point() -> Strategy {
        Strategy::FixedPoint(usize::MAX)
    }
}

pub const MAX_FIXED_POINT_PASSES: usize = 100;

pub struct RuleBatch {
    pub name: &'static str,
    pub strategy: Strategy,
    pub rules: Vec<Box<dyn AnalyzerRule>>,
}

impl RuleBatch {
    pub fn new(name: &'static str, strategy: Strategy, rules: Vec<Box<dyn AnalyzerRule>>) -> Self {
        Self { name, strategy, rules }
    }
}

/// The semantic analyzer: turns an unresolved logical plan into a resolved,
/// strictly typed one by running rule batches to their fixed points.
///
/// Analyzers are pure transformers over immutable trees; independent inputs
/// may be analyzed concurrently from separate instances without locking.
pub struct Analyzer {
    batches: Vec<RuleBatch>,
}

impl Analyzer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        // ordering inside Resolution is load bearing: e.g. having/sort
        // merging must precede aggregate resolution, star expansion must
        // precede reference resolution
        let batches = vec![
            RuleBatch::new(
                "Resolution",
                Strategy::fixed_point(),
                vec![
                    Box::new(InlineCteRelations),
                    Box::new(ResolveRelations::new(catalog)),
                    Box::new(ResolveFunctions),
                    Box::new(ExpandStars),
                    Box::new(ResolveReferences),
                    Box::new(ResolveAliases),
                    Box::new(DeduplicateReferences),
                    Box::new(RewriteDistinctAggregates),
                    Box::new(ResolveSortReferences),
                    Box::new(RewriteDistinctsAsAggregates),
                    Box::new(GlobalAggregates),
                    Box::new(MergeHavingConditions),
                    Box::new(MergeSortsOverAggregates),
                    Box::new(ResolveAggregates),
                ],
            ),
            RuleBatch::new("Type check", Strategy::Once, vec![Box::new(TypeCheck)]),
            RuleBatch::new("Checks", Strategy::Once, vec![Box::new(CheckAnalysis)]),
        ];
        Self { batches }
    }

    pub fn analyze(&self, plan: LogicalPlan) -> Result<LogicalPlan> {
        let mut plan = plan;
        for batch in &self.batches {
            plan = Self::execute_batch(batch, plan)?;
        }
        Ok(plan)
    }

    fn execute_batch(batch: &RuleBatch, mut plan: LogicalPlan) -> Result<LogicalPlan> {
        match batch.strategy {
            Strategy::Once => {
                for rule in &batch.rules {
                    let result = rule.analyze(plan)?;
                    if result.transformed {
                        debug!("batch {}: rule {} transformed the plan", batch.name, rule.name());
                    }
                    plan = result.data;
                }
            }
            Strategy::FixedPoint(limit) => {
                let max_passes = limit.min(MAX_FIXED_POINT_PASSES);
                let mut pass = 0;
                loop {
                    pass += 1;
                    let mut changed = false;
                    for rule in &batch.rules {
                        let result = rule.analyze(plan)?;
                        if result.transformed {
                            debug!(
                                "batch {} pass {}: rule {} transformed the plan",
                                batch.name,
                                pass,
                                rule.name()
                            );
                            changed = true;
                        }
                        plan = result.data;
                    }
                    if !changed {
                        break;
                    }
                    if pass >= max_passes {
                        warn!(
                            "batch {} did not reach a fixed point within {} passes",
                            batch.name, max_passes
                        );
                        break;
                    }
                }
            }
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalysisError;
    use crate::expr::*;
    use crate::logical_plan::*;
    use crate::parser::parse_query;
    use crate::tree_node::TreeNode;
    use crate::types::{DataType, Field, Schema};

    fn test_catalog() -> Arc<Catalog> {
        let mut catalog = Catalog::new();
        catalog.register_table(
            "t",
            &Schema::new(vec![Field::new("a", DataType::Int32), Field::new("b", DataType::Int32)]),
        );
        catalog.register_table(
            "s",
            &Schema::new(vec![
                Field::new("a", DataType::Int32),
                Field::new("c", DataType::String),
            ]),
        );
        catalog
            .register_table("u", &Schema::new(vec![Field::new("a", DataType::Int32)]));
        Arc::new(catalog)
    }

    fn analyze(sql: &str) -> crate::Result<LogicalPlan> {
        let catalog = test_catalog();
        Analyzer::new(catalog).analyze(parse_query(sql)?)
    }

    fn analyze_with(catalog: Arc<Catalog>, sql: &str) -> crate::Result<LogicalPlan> {
        Analyzer::new(catalog).analyze(parse_query(sql)?)
    }

    #[test]
    fn test_star_expansion_keeps_relation_ids() {
        let catalog = test_catalog();
        let expected = catalog.lookup_relation("t").unwrap().output();
        let plan = analyze_with(catalog, "select * from t").unwrap();
        let output = plan.output();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].name, "a");
        assert_eq!(output[1].name, "b");
        assert_eq!(output[0].expr_id, expected[0].expr_id);
        assert_eq!(output[1].expr_id, expected[1].expr_id);
    }

    #[test]
    fn test_mixed_type_arithmetic_casts_the_string_side() {
        let plan = analyze("select '1' + 2 from t").unwrap();
        let mut found_cast = false;
        plan.apply(|p| {
            for e in p.expressions() {
                if e.exists(|x| {
                    matches!(x, Expr::Cast(c)
                        if c.data_type == DataType::Int32
                            && matches!(c.child.as_ref(), Expr::Literal(_)))
                }) {
                    found_cast = true;
                }
            }
            Ok(crate::tree_node::TreeNodeRecursion::Continue)
        })
        .unwrap();
        assert!(found_cast, "expected '1' to be cast to int: {:?}", plan);
    }

    #[test]
    fn test_pure_string_arithmetic_is_rejected() {
        assert!(matches!(
            analyze("select '1' + '2' from t"),
            Err(AnalysisError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_global_aggregate_via_having() {
        let plan = analyze("select count(*) from t having count(*) > 3").unwrap();
        // Project(Filter(Aggregate))
        let project = match &plan {
            LogicalPlan::Project(p) => p,
            p => panic!("expected outer projection, got {:?}", p),
        };
        assert_eq!(project.project_list.len(), 1);
        let filter = match project.child.as_ref() {
            LogicalPlan::Filter(f) => f,
            p => panic!("expected having filter, got {:?}", p),
        };
        let aggregate = match filter.child.as_ref() {
            LogicalPlan::Aggregate(a) => a,
            p => panic!("expected aggregate, got {:?}", p),
        };
        assert!(aggregate.grouping_aliases.is_empty());
        assert_eq!(aggregate.aggregation_aliases.len(), 1);
        let agg_attr = aggregate.aggregation_aliases[0].to_attribute().unwrap();
        // both the projection and the having condition go through the
        // aggregation attribute
        assert!(matches!(&project.project_list[0], Expr::Alias(a)
            if matches!(a.child.as_ref(), Expr::AttributeReference(r) if r.expr_id == agg_attr.expr_id)));
        assert!(filter.condition.exists(|e| {
            matches!(e, Expr::AttributeReference(r) if r.expr_id == agg_attr.expr_id)
        }));
    }

    #[test]
    fn test_self_join_gets_deduplicated() {
        let plan = analyze("select * from t join t").unwrap();
        let output = plan.output();
        assert_eq!(output.len(), 4);
        assert_ne!(output[0].expr_id, output[2].expr_id);
        assert_ne!(output[1].expr_id, output[3].expr_id);
        assert!(plan.deduplicated());
    }

    #[test]
    fn test_ungrouped_attribute_is_illegal() {
        match analyze("select a, count(b) from t") {
            Err(AnalysisError::IllegalAggregation(msg)) => {
                assert!(msg.contains("SELECT field"), "unexpected message: {}", msg);
                assert!(msg.contains("'a'"), "unexpected message: {}", msg);
            }
            other => panic!("expected IllegalAggregation, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_aggregate_is_illegal() {
        assert!(matches!(
            analyze("select max(count(a)) from t group by b"),
            Err(AnalysisError::IllegalAggregation(_))
        ));
    }

    #[test]
    fn test_group_by_resolves_into_aggregate_shape() {
        let plan = analyze("select a, count(b) as cnt from t group by a").unwrap();
        let project = match &plan {
            LogicalPlan::Project(p) => p,
            p => panic!("expected outer projection, got {:?}", p),
        };
        let aggregate = match project.child.as_ref() {
            LogicalPlan::Aggregate(a) => a,
            p => panic!("expected aggregate, got {:?}", p),
        };
        assert_eq!(aggregate.grouping_aliases.len(), 1);
        assert_eq!(aggregate.aggregation_aliases.len(), 1);
        let output = plan.output();
        assert_eq!(output[0].name, "a");
        assert_eq!(output[1].name, "cnt");
        // no raw child attribute sneaks past the aggregate boundary
        for e in &project.project_list {
            let generated: Vec<u32> = aggregate
                .grouping_aliases
                .iter()
                .chain(aggregate.aggregation_aliases.iter())
                .filter_map(|g| g.expr_id())
                .collect();
            let ok = !e.exists(|x| {
                matches!(x, Expr::AttributeReference(a) if !generated.contains(&a.expr_id))
            });
            assert!(ok, "raw attribute in outer projection: {:?}", e);
        }
    }

    #[test]
    fn test_order_by_over_aggregate_is_merged() {
        let plan =
            analyze("select a, sum(b) as total from t group by a order by a").unwrap();
        match &plan {
            LogicalPlan::Project(p) => match p.child.as_ref() {
                LogicalPlan::Sort(s) => {
                    assert!(matches!(s.child.as_ref(), LogicalPlan::Aggregate(_)));
                    assert!(matches!(&s.order[0], Expr::SortOrder(_)));
                }
                p => panic!("expected sort under projection, got {:?}", p),
            },
            p => panic!("expected outer projection, got {:?}", p),
        }
    }

    #[test]
    fn test_distinct_becomes_group_by_all_columns() {
        let plan = analyze("select distinct a from t").unwrap();
        let project = match &plan {
            LogicalPlan::Project(p) => p,
            p => panic!("expected outer projection, got {:?}", p),
        };
        match project.child.as_ref() {
            LogicalPlan::Aggregate(a) => {
                assert_eq!(a.grouping_aliases.len(), 1);
                assert!(a.aggregation_aliases.is_empty());
            }
            p => panic!("expected aggregate, got {:?}", p),
        }
        assert_eq!(plan.output()[0].name, "a");
    }

    #[test]
    fn test_distinct_aggregate_function_is_unsupported() {
        assert!(matches!(
            analyze("select count(distinct a) from t"),
            Err(AnalysisError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_count_distinct_star_is_rejected() {
        assert!(matches!(
            analyze("select count(distinct *) from t"),
            Err(AnalysisError::AnalysisException(_))
        ));
        assert!(matches!(
            analyze("select sum(*) from t"),
            Err(AnalysisError::AnalysisException(_))
        ));
    }

    #[test]
    fn test_cte_inlining() {
        let plan = analyze("with c as (select a from t) select * from c").unwrap();
        assert!(plan.resolved());
        let output = plan.output();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].name, "a");
    }

    #[test]
    fn test_cte_shadowing_prefers_inner_definition() {
        // the inner c shadows the outer one inside the subquery
        let plan = analyze(
            "with c as (select a, b from t) select * from (with c as (select a from u) select * from c) q",
        )
        .unwrap();
        assert_eq!(plan.output().len(), 1);
    }

    #[test]
    fn test_sort_on_pruned_column_is_pushed_through() {
        let plan = analyze("select a from t order by b").unwrap();
        // re-projected down to the original single column
        let project = match &plan {
            LogicalPlan::Project(p) => p,
            p => panic!("expected outer projection, got {:?}", p),
        };
        assert_eq!(plan.output().len(), 1);
        assert_eq!(plan.output()[0].name, "a");
        match project.child.as_ref() {
            LogicalPlan::Sort(s) => match s.child.as_ref() {
                LogicalPlan::Project(inner) => assert_eq!(inner.project_list.len(), 2),
                p => panic!("expected widened projection, got {:?}", p),
            },
            p => panic!("expected sort, got {:?}", p),
        }
        assert!(plan.resolved());
    }

    #[test]
    fn test_ambiguous_reference_is_rejected() {
        assert!(matches!(
            analyze("select a from t join s"),
            Err(AnalysisError::ResolutionFailure(_))
        ));
    }

    #[test]
    fn test_missing_table_and_function() {
        assert_eq!(
            analyze("select * from missing"),
            Err(AnalysisError::TableNotFound("missing".to_string()))
        );
        assert!(matches!(
            analyze("select frobnicate(a) from t"),
            Err(AnalysisError::FunctionNotFound(_))
        ));
    }

    #[test]
    fn test_unresolvable_column_is_reported_by_checks() {
        match analyze("select missing from t") {
            Err(AnalysisError::ResolutionFailure(msg)) => {
                assert!(msg.contains("missing"), "unexpected message: {}", msg);
            }
            other => panic!("expected ResolutionFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_union_is_deduplicated() {
        let plan = analyze("select a from t union select a from t").unwrap();
        assert!(plan.deduplicated());
        assert!(plan.resolved());
    }

    #[test]
    fn test_qualified_references_and_star() {
        let plan = analyze("select t.a, s.c from t join s on t.a = s.a").unwrap();
        assert!(plan.resolved());
        assert_eq!(plan.output().len(), 2);
        let plan = analyze("select s.* from t join s").unwrap();
        assert_eq!(plan.output().len(), 2);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let catalog = test_catalog();
        let analyzer = Analyzer::new(catalog);
        let queries = [
            "select * from t",
            "select a + 1 as next from t where b > 0",
            "select a, count(b) as cnt from t group by a having count(b) > 1 order by a desc",
            "select distinct a, b from t limit 10",
            "with c as (select a from t) select * from c union select a from u",
            "select upper(c) from s where length(c) < 10",
        ];
        for sql in queries {
            let analyzed = analyzer.analyze(parse_query(sql).unwrap()).unwrap();
            let again = analyzer.analyze(analyzed.clone()).unwrap();
            assert_eq!(again, analyzed, "not idempotent for {}", sql);
        }
    }

    #[test]
    fn test_scalar_function_coercion() {
        // substring positions are integral; the string literal position is
        // accepted via implicit cast, a boolean is not
        let plan = analyze("select substr(c, '1', 2) from s").unwrap();
        assert!(plan.resolved());
        let mut saw_cast = false;
        plan.apply(|p| {
            for e in p.expressions() {
                saw_cast |= e.exists(|x| matches!(x, Expr::Cast(_)));
            }
            Ok(crate::tree_node::TreeNodeRecursion::Continue)
        })
        .unwrap();
        assert!(saw_cast);
        assert!(matches!(
            analyze("select substr(c, true, 2) from s"),
            Err(AnalysisError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_having_over_grouped_aggregate() {
        let plan =
            analyze("select a from t group by a having sum(b) > 10").unwrap();
        let project = match &plan {
            LogicalPlan::Project(p) => p,
            p => panic!("expected outer projection, got {:?}", p),
        };
        let filter = match project.child.as_ref() {
            LogicalPlan::Filter(f) => f,
            p => panic!("expected having filter, got {:?}", p),
        };
        let aggregate = match filter.child.as_ref() {
            LogicalPlan::Aggregate(a) => a,
            p => panic!("expected aggregate, got {:?}", p),
        };
        // sum(b) appears only in having, still collected as an aggregation
        assert_eq!(aggregate.aggregation_aliases.len(), 1);
        assert_eq!(plan.output().len(), 1);
    }
}
