use itertools::Itertools;

use crate::analysis::AnalyzerRule;
use crate::expr::Expr;
use crate::logical_plan::LogicalPlan;
use crate::tree_node::{Transformed, TreeNode, TreeNodeRecursion};
use crate::{AnalysisError, Result};

/// The post-analysis gate: anything the resolution batch left behind is an
/// error here. Reports the minimum unresolved node — the deepest one whose
/// own children did resolve — so the message names the actual culprit.
#[derive(Debug)]
pub struct CheckAnalysis;

impl CheckAnalysis {
    fn check_node(plan: &LogicalPlan) -> Result<()> {
        for e in plan.expressions() {
            if let Some(sql) = e.collect_first(|x| match x {
                Expr::DistinctAggregateFunction(_) => Some(x.sql()),
                _ => None,
            }) {
                return Err(AnalysisError::UnsupportedOperation(format!(
                    "distinct aggregate function {}",
                    sql
                )));
            }
        }
        if !matches!(plan, LogicalPlan::Aggregate(_)) {
            for e in plan.expressions() {
                if let Some(sql) = e.collect_first(|x| match x {
                    Expr::GroupingAlias(_) | Expr::AggregationAlias(_) => Some(x.sql()),
                    _ => None,
                }) {
                    return Err(AnalysisError::resolution(format!(
                        "generated attribute {} escaped aggregate resolution",
                        sql
                    )));
                }
            }
        }
        if plan.children_resolved() && !plan.resolved() {
            for e in plan.expressions() {
                if let Some(unresolved) = e.collect_first(|x| match x {
                    Expr::UnresolvedAttribute(u) => Some(Expr::UnresolvedAttribute(u.clone())),
                    Expr::UnresolvedFunction(f) => Some(Expr::UnresolvedFunction(f.clone())),
                    Expr::UnresolvedStar(q) => Some(Expr::UnresolvedStar(q.clone())),
                    Expr::UnresolvedAlias(a) => Some(Expr::UnresolvedAlias(a.clone())),
                    _ => None,
                }) {
                    let columns =
                        plan.child_attributes().iter().map(|a| a.name.clone()).join(", ");
                    return Err(AnalysisError::resolution(format!(
                        "cannot resolve '{}' given input columns [{}]",
                        unresolved.sql(),
                        columns
                    )));
                }
            }
            return Err(AnalysisError::resolution(format!(
                "unresolved operator {} survived analysis",
                plan.name()
            )));
        }
        Ok(())
    }
}

impl AnalyzerRule for CheckAnalysis {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        // generated attributes may exist only inside an aggregate; the root
        // in particular must not expose them in its output
        if matches!(plan, LogicalPlan::Aggregate(_)) {
            return Err(AnalysisError::resolution(
                "grouping and aggregation attributes must not appear in the plan's top-level output"
                    .to_string(),
            ));
        }
        plan.apply(|p| {
            Self::check_node(p)?;
            Ok(TreeNodeRecursion::Continue)
        })?;
        Ok(Transformed::no(plan))
    }

    fn name(&self) -> &str {
        "CheckAnalysis"
    }
}
