use crate::analysis::AnalyzerRule;
use crate::expr::Expr;
use crate::logical_plan::LogicalPlan;
use crate::tree_node::Transformed;
use crate::types::can_cast;
use crate::{AnalysisError, Result};

/// Single pass after resolution: every expression of every resolved plan
/// node runs its type constraint bottom-up and its children are replaced by
/// the coerced list. A failing constraint aborts the analysis.
#[derive(Debug)]
pub struct TypeCheck;

impl TypeCheck {
    fn check_expr(expr: Expr) -> Result<Transformed<Expr>> {
        if !expr.resolved() {
            return Ok(Transformed::no(expr));
        }
        if let Expr::Cast(c) = &expr {
            if !can_cast(c.child.data_type(), &c.data_type) {
                return Err(AnalysisError::TypeMismatch {
                    expr: expr.sql(),
                    actual: c.child.data_type().to_string(),
                    expected: format!("a type castable to {}", c.data_type),
                });
            }
        }
        let coerced = expr.type_constraint().evaluate()?;
        let children: Vec<Expr> = expr.children().into_iter().cloned().collect();
        if coerced == children {
            Ok(Transformed::no(expr))
        } else {
            Ok(Transformed::yes(expr.with_new_children(coerced)))
        }
    }
}

impl AnalyzerRule for TypeCheck {
    fn analyze(&self, plan: LogicalPlan) -> Result<Transformed<LogicalPlan>> {
        plan.transform_up_expressions(|expr| Self::check_expr(expr))
    }

    fn name(&self) -> &str {
        "TypeCheck"
    }
}
