use std::sync::Arc;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::data::Value;
use crate::expr::*;
use crate::logical_plan::*;
use crate::types::DataType;
use crate::{AnalysisError, Operator, Result};

#[derive(Parser)]
#[grammar = "parser/parser.pest"]
pub struct SqlParser;

/// Parses a query into a fully unresolved plan; all binding and typing is
/// the analyzer's job.
pub fn parse_query(sql: &str) -> Result<LogicalPlan> {
    let mut pairs = SqlParser::parse(Rule::singleQuery, sql)
        .map_err(|e| AnalysisError::ParseError(e.to_string()))?;
    let single = pairs.next().expect("grammar yields one singleQuery");
    let query = single
        .into_inner()
        .find(|p| p.as_rule() == Rule::query)
        .expect("singleQuery contains a query");
    build_query(query)
}

pub fn parse_expression(sql: &str) -> Result<Expr> {
    let mut pairs = SqlParser::parse(Rule::singleExpression, sql)
        .map_err(|e| AnalysisError::ParseError(e.to_string()))?;
    let single = pairs.next().expect("grammar yields one singleExpression");
    let expr = single
        .into_inner()
        .find(|p| p.as_rule() == Rule::expression)
        .expect("singleExpression contains an expression");
    build_expression(expr)
}

fn identifier_text(pair: Pair<Rule>) -> String {
    let text = pair.as_str();
    text.trim_matches('`').to_string()
}

fn build_query(pair: Pair<Rule>) -> Result<LogicalPlan> {
    let mut ctes: Vec<(String, LogicalPlan)> = Vec::new();
    let mut body: Option<LogicalPlan> = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::withClause => {
                for named in p.into_inner() {
                    if named.as_rule() == Rule::namedQuery {
                        let mut inner = named.into_inner();
                        let name = identifier_text(inner.next().expect("cte name"));
                        let query = inner
                            .find(|x| x.as_rule() == Rule::query)
                            .expect("cte body");
                        ctes.push((name, build_query(query)?));
                    }
                }
            }
            Rule::setQuery => body = Some(build_set_query(p)?),
            _ => {}
        }
    }
    let mut plan = body.expect("query body");
    // the first named query gets the outermost scope so later ones see it
    for (name, cte) in ctes.into_iter().rev() {
        plan = LogicalPlan::With(With::new(Arc::new(plan), name, Arc::new(cte)));
    }
    Ok(plan)
}

fn build_set_query(pair: Pair<Rule>) -> Result<LogicalPlan> {
    let mut result: Option<LogicalPlan> = None;
    let mut pending_op: Option<Rule> = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::setOperator => {
                pending_op = Some(p.into_inner().next().expect("set operator keyword").as_rule());
            }
            Rule::queryPrimary => {
                let right = build_query_primary(p)?;
                result = Some(match (result, pending_op.take()) {
                    (None, _) => right,
                    (Some(left), Some(op)) => {
                        let set_op = SetOp::new(Arc::new(left), Arc::new(right));
                        match op {
                            Rule::kwUnion => LogicalPlan::Union(set_op),
                            Rule::kwIntersect => LogicalPlan::Intersect(set_op),
                            Rule::kwExcept => LogicalPlan::Except(set_op),
                            _ => unreachable!(),
                        }
                    }
                    (Some(_), None) => unreachable!("operand without set operator"),
                });
            }
            _ => {}
        }
    }
    Ok(result.expect("set query operand"))
}

fn build_query_primary(pair: Pair<Rule>) -> Result<LogicalPlan> {
    let inner = pair.into_inner().next().expect("query primary body");
    match inner.as_rule() {
        Rule::querySpec => build_query_spec(inner),
        Rule::query => build_query(inner),
        _ => unreachable!(),
    }
}

fn build_query_spec(pair: Pair<Rule>) -> Result<LogicalPlan> {
    let mut distinct = false;
    let mut project_list: Vec<Expr> = Vec::new();
    let mut from: Option<LogicalPlan> = None;
    let mut filter: Option<Expr> = None;
    let mut groupings: Vec<Expr> = Vec::new();
    let mut having: Option<Expr> = None;
    let mut order: Vec<Expr> = Vec::new();
    let mut limit: Option<usize> = None;

    for clause in pair.into_inner() {
        match clause.as_rule() {
            Rule::selectClause => {
                for item in clause.into_inner() {
                    match item.as_rule() {
                        Rule::setQuantifier => {
                            distinct = item
                                .into_inner()
                                .next()
                                .is_some_and(|q| q.as_rule() == Rule::kwDistinct);
                        }
                        Rule::namedExpression => project_list.push(build_named_expression(item)?),
                        _ => {}
                    }
                }
            }
            Rule::fromClause => from = Some(build_from_clause(clause)?),
            Rule::whereClause => {
                let expr = clause
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::expression)
                    .expect("where expression");
                filter = Some(build_expression(expr)?);
            }
            Rule::groupByClause => {
                for p in clause.into_inner() {
                    if p.as_rule() == Rule::expression {
                        groupings.push(build_expression(p)?);
                    }
                }
            }
            Rule::havingClause => {
                let expr = clause
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::expression)
                    .expect("having expression");
                having = Some(build_expression(expr)?);
            }
            Rule::orderByClause => {
                for p in clause.into_inner() {
                    if p.as_rule() == Rule::sortItem {
                        order.push(build_sort_item(p)?);
                    }
                }
            }
            Rule::limitClause => {
                let n = clause
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::integerLiteral)
                    .expect("limit count");
                limit = Some(
                    n.as_str()
                        .parse::<usize>()
                        .map_err(|e| AnalysisError::ParseError(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let mut plan = from.unwrap_or(LogicalPlan::OneRowRelation);
    if let Some(condition) = filter {
        plan = LogicalPlan::Filter(Filter::new(condition, Arc::new(plan)));
    }
    if groupings.is_empty() {
        plan = LogicalPlan::Project(Project::new(project_list, Arc::new(plan)));
    } else {
        plan = LogicalPlan::UnresolvedAggregate(UnresolvedAggregate::new(
            Arc::new(plan),
            groupings,
            project_list,
        ));
    }
    if distinct {
        plan = LogicalPlan::Distinct(Distinct::new(Arc::new(plan)));
    }
    if let Some(condition) = having {
        plan = LogicalPlan::Filter(Filter::new(condition, Arc::new(plan)));
    }
    if !order.is_empty() {
        plan = LogicalPlan::Sort(Sort::new(order, Arc::new(plan)));
    }
    if let Some(limit) = limit {
        plan = LogicalPlan::Limit(Limit::new(limit, Arc::new(plan)));
    }
    Ok(plan)
}

fn build_named_expression(pair: Pair<Rule>) -> Result<Expr> {
    let mut inner = pair.into_inner();
    let expr = build_expression(inner.next().expect("select item expression"))?;
    let alias = inner.find(|p| p.as_rule() == Rule::identifier).map(identifier_text);
    Ok(match alias {
        Some(name) => Expr::Alias(Alias::new(expr, name)),
        None => match expr {
            e @ (Expr::UnresolvedStar(_)
            | Expr::UnresolvedAttribute(_)
            | Expr::AttributeReference(_)) => e,
            e => Expr::UnresolvedAlias(Box::new(e)),
        },
    })
}

fn build_from_clause(pair: Pair<Rule>) -> Result<LogicalPlan> {
    let mut plan: Option<LogicalPlan> = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::relation => plan = Some(build_relation(p)?),
            Rule::joinRelation => {
                let left = plan.take().expect("join without left side");
                plan = Some(build_join(left, p)?);
            }
            _ => {}
        }
    }
    Ok(plan.expect("from relation"))
}

fn build_relation(pair: Pair<Rule>) -> Result<LogicalPlan> {
    let mut primary: Option<LogicalPlan> = None;
    let mut alias: Option<String> = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::relationPrimary => {
                let inner = p.into_inner().next().expect("relation body");
                primary = Some(match inner.as_rule() {
                    Rule::identifier => LogicalPlan::UnresolvedRelation(identifier_text(inner)),
                    Rule::query => build_query(inner)?,
                    _ => unreachable!(),
                });
            }
            Rule::identifier => alias = Some(identifier_text(p)),
            _ => {}
        }
    }
    let plan = primary.expect("relation body");
    Ok(match alias {
        Some(name) => LogicalPlan::SubqueryAlias(SubqueryAlias::new(name, Arc::new(plan))),
        None => plan,
    })
}

fn build_join(left: LogicalPlan, pair: Pair<Rule>) -> Result<LogicalPlan> {
    let mut join_type = JoinType::Inner;
    let mut right: Option<LogicalPlan> = None;
    let mut condition: Option<Expr> = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::joinType => {
                join_type = match p.into_inner().next().expect("join type keyword").as_rule() {
                    Rule::kwInner => JoinType::Inner,
                    Rule::kwCross => JoinType::Cross,
                    Rule::kwLeft => JoinType::LeftOuter,
                    Rule::kwRight => JoinType::RightOuter,
                    Rule::kwFull => JoinType::FullOuter,
                    _ => unreachable!(),
                };
            }
            Rule::relation => right = Some(build_relation(p)?),
            Rule::joinCondition => {
                let expr = p
                    .into_inner()
                    .find(|x| x.as_rule() == Rule::expression)
                    .expect("join condition expression");
                condition = Some(build_expression(expr)?);
            }
            _ => {}
        }
    }
    Ok(LogicalPlan::Join(Join::new(
        Arc::new(left),
        Arc::new(right.expect("join right side")),
        join_type,
        condition,
    )))
}

fn build_sort_item(pair: Pair<Rule>) -> Result<Expr> {
    let mut inner = pair.into_inner();
    let expr = build_expression(inner.next().expect("sort expression"))?;
    let direction = match inner.next() {
        Some(d) if d.as_rule() == Rule::sortDirection => {
            match d.into_inner().next().expect("sort direction keyword").as_rule() {
                Rule::kwDesc => SortDirection::Descending,
                _ => SortDirection::Ascending,
            }
        }
        _ => SortDirection::Ascending,
    };
    Ok(Expr::SortOrder(SortOrder::new(expr, direction)))
}

fn build_expression(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::expression => {
            build_expression(pair.into_inner().next().expect("expression body"))
        }
        Rule::orExpression => build_logical(pair, Rule::kwOr, Operator::Or),
        Rule::andExpression => build_logical(pair, Rule::kwAnd, Operator::And),
        Rule::notExpression => {
            let mut inner = pair.into_inner();
            let first = inner.next().expect("not expression body");
            if first.as_rule() == Rule::kwNot {
                Ok(build_expression(inner.next().expect("negated expression"))?.not())
            } else {
                build_expression(first)
            }
        }
        Rule::predicateExpression => {
            let mut inner = pair.into_inner();
            let base = build_expression(inner.next().expect("predicate base"))?;
            match inner.next() {
                Some(suffix) => build_predicate_suffix(base, suffix),
                None => Ok(base),
            }
        }
        Rule::comparisonExpression => {
            let mut inner = pair.into_inner();
            let left = build_expression(inner.next().expect("comparison left"))?;
            match (inner.next(), inner.next()) {
                (Some(op), Some(right)) => {
                    let op = match op.as_str() {
                        "=" => Operator::Eq,
                        "!=" | "<>" => Operator::NotEq,
                        "<" => Operator::Lt,
                        "<=" => Operator::LtEq,
                        ">" => Operator::Gt,
                        ">=" => Operator::GtEq,
                        other => unreachable!("comparison operator {}", other),
                    };
                    Ok(binary_expr(left, op, build_expression(right)?))
                }
                _ => Ok(left),
            }
        }
        Rule::additiveExpression => build_arithmetic(pair),
        Rule::multiplicativeExpression => build_arithmetic(pair),
        Rule::unaryExpression => {
            let inner = pair.into_inner().next().expect("unary body");
            match inner.as_rule() {
                Rule::unaryExpression => Ok(negate(build_expression(inner)?)),
                _ => build_expression(inner),
            }
        }
        Rule::primaryExpression => {
            build_primary(pair.into_inner().next().expect("primary body"))
        }
        other => unreachable!("unexpected expression rule {:?}", other),
    }
}

fn build_logical(pair: Pair<Rule>, separator_rule: Rule, op: Operator) -> Result<Expr> {
    let mut result: Option<Expr> = None;
    for p in pair.into_inner() {
        if p.as_rule() == separator_rule {
            continue;
        }
        let operand = build_expression(p)?;
        result = Some(match result {
            Some(left) => binary_expr(left, op, operand),
            None => operand,
        });
    }
    Ok(result.expect("logical operand"))
}

fn build_arithmetic(pair: Pair<Rule>) -> Result<Expr> {
    let mut inner = pair.into_inner();
    let mut result = build_expression(inner.next().expect("arithmetic operand"))?;
    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            "%" => Operator::Modulo,
            other => unreachable!("arithmetic operator {}", other),
        };
        let right = build_expression(inner.next().expect("arithmetic operand"))?;
        result = binary_expr(result, op, right);
    }
    Ok(result)
}

fn build_predicate_suffix(base: Expr, suffix: Pair<Rule>) -> Result<Expr> {
    let mut negated = false;
    let mut is_null = false;
    let mut like_pattern: Option<Expr> = None;
    let mut in_list: Option<Vec<Expr>> = None;
    for p in suffix.into_inner() {
        match p.as_rule() {
            Rule::kwNot => negated = true,
            Rule::kwNull => is_null = true,
            Rule::kwLike => like_pattern = Some(Expr::null_lit()),
            Rule::kwIn => in_list = Some(Vec::new()),
            Rule::comparisonExpression => like_pattern = Some(build_expression(p)?),
            Rule::expression => {
                in_list.as_mut().expect("in list").push(build_expression(p)?);
            }
            _ => {}
        }
    }
    if is_null {
        return Ok(if negated { base.is_not_null() } else { base.is_null() });
    }
    if let Some(list) = in_list {
        let expr = Expr::In(In::new(Box::new(base), list));
        return Ok(if negated { expr.not() } else { expr });
    }
    let pattern = like_pattern.expect("like pattern");
    let expr = Expr::Like(Like::new(Box::new(base), Box::new(pattern)));
    Ok(if negated { expr.not() } else { expr })
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::literal => build_literal(pair),
        Rule::castExpression => {
            let mut inner = pair.into_inner();
            let expr = inner
                .find(|p| p.as_rule() == Rule::expression)
                .expect("cast expression");
            let expr = build_expression(expr)?;
            let data_type = inner
                .find(|p| p.as_rule() == Rule::dataType)
                .expect("cast target type");
            Ok(expr.cast(build_data_type(data_type)))
        }
        Rule::functionCall => {
            let mut inner = pair.into_inner();
            // function names are case-folded at the grammar boundary
            let name = identifier_text(inner.next().expect("function name")).to_lowercase();
            let mut distinct = false;
            let mut args: Vec<Expr> = Vec::new();
            if let Some(function_args) = inner.next() {
                for p in function_args.into_inner() {
                    match p.as_rule() {
                        Rule::kwDistinct => distinct = true,
                        Rule::star => args.push(Expr::UnresolvedStar(None)),
                        Rule::expression => args.push(build_expression(p)?),
                        _ => {}
                    }
                }
            }
            Ok(Expr::UnresolvedFunction(UnresolvedFunction::new(name, args, distinct)))
        }
        Rule::qualifiedStar => {
            let qualifier =
                identifier_text(pair.into_inner().next().expect("star qualifier"));
            Ok(Expr::UnresolvedStar(Some(qualifier)))
        }
        Rule::star => Ok(Expr::UnresolvedStar(None)),
        Rule::qualifiedName => {
            let parts: Vec<String> = pair
                .into_inner()
                .filter(|p| p.as_rule() == Rule::identifier)
                .map(identifier_text)
                .collect();
            Ok(match parts.len() {
                1 => Expr::UnresolvedAttribute(UnresolvedAttribute::new(parts[0].clone())),
                2 => Expr::UnresolvedAttribute(UnresolvedAttribute::new_qualified(
                    parts[0].clone(),
                    parts[1].clone(),
                )),
                _ => unreachable!("qualified name with {} parts", parts.len()),
            })
        }
        Rule::expression => build_expression(pair),
        other => unreachable!("unexpected primary rule {:?}", other),
    }
}

fn build_literal(pair: Pair<Rule>) -> Result<Expr> {
    let inner = pair.into_inner().next().expect("literal body");
    match inner.as_rule() {
        Rule::kwNull => Ok(Expr::null_lit()),
        Rule::kwTrue => Ok(Expr::boolean_lit(true)),
        Rule::kwFalse => Ok(Expr::boolean_lit(false)),
        Rule::numberLiteral => {
            let text = inner.as_str();
            if text.contains('.') {
                let v: f64 =
                    text.parse().map_err(|e: std::num::ParseFloatError| {
                        AnalysisError::ParseError(e.to_string())
                    })?;
                Ok(Expr::lit(Value::Float64(v), DataType::Float64))
            } else {
                let v: i64 = text.parse().map_err(|e: std::num::ParseIntError| {
                    AnalysisError::ParseError(e.to_string())
                })?;
                match i32::try_from(v) {
                    Ok(v) => Ok(Expr::int_lit(v)),
                    Err(_) => Ok(Expr::long_lit(v)),
                }
            }
        }
        Rule::stringLiteral => {
            let text = inner.as_str();
            Ok(Expr::string_lit(&text[1..text.len() - 1]))
        }
        other => unreachable!("unexpected literal rule {:?}", other),
    }
}

fn build_data_type(pair: Pair<Rule>) -> DataType {
    match pair.as_str().to_lowercase().as_str() {
        "tinyint" => DataType::Int8,
        "smallint" => DataType::Int16,
        "int" | "integer" => DataType::Int32,
        "bigint" | "long" => DataType::Int64,
        "float" => DataType::Float32,
        "double" => DataType::Float64,
        "string" | "varchar" => DataType::String,
        "boolean" => DataType::Boolean,
        "date" => DataType::Date,
        "timestamp" => DataType::Timestamp,
        other => unreachable!("unexpected data type {}", other),
    }
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Literal(Literal { value: Value::Int32(v), .. }) => Expr::int_lit(-v),
        Expr::Literal(Literal { value: Value::Int64(v), .. }) => Expr::long_lit(-v),
        Expr::Literal(Literal { value: Value::Float64(v), .. }) => {
            Expr::lit(Value::Float64(-v), DataType::Float64)
        }
        e => binary_expr(Expr::int_lit(0), Operator::Minus, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_select() {
        let plan = parse_query("SELECT a, b FROM t").unwrap();
        match plan {
            LogicalPlan::Project(Project { project_list, child }) => {
                assert_eq!(project_list.len(), 2);
                assert!(matches!(child.as_ref(), LogicalPlan::UnresolvedRelation(n) if n == "t"));
            }
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_star_and_qualified_star() {
        let plan = parse_query("select *, t.* from t").unwrap();
        match plan {
            LogicalPlan::Project(Project { project_list, .. }) => {
                assert_eq!(project_list[0], Expr::UnresolvedStar(None));
                assert_eq!(project_list[1], Expr::UnresolvedStar(Some("t".to_string())));
            }
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_group_by_produces_unresolved_aggregate() {
        let plan = parse_query("select a, count(b) from t group by a").unwrap();
        match plan {
            LogicalPlan::UnresolvedAggregate(agg) => {
                assert_eq!(agg.groupings.len(), 1);
                assert_eq!(agg.project_list.len(), 2);
                assert!(agg.having.is_empty());
                assert!(agg.order.is_empty());
            }
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_having_and_order_stay_outside() {
        let plan =
            parse_query("select a from t group by a having count(*) > 1 order by a desc").unwrap();
        match plan {
            LogicalPlan::Sort(Sort { order, child }) => {
                assert_eq!(order.len(), 1);
                assert!(matches!(
                    &order[0],
                    Expr::SortOrder(SortOrder { direction: SortDirection::Descending, .. })
                ));
                assert!(matches!(child.as_ref(), LogicalPlan::Filter(f)
                    if matches!(f.child.as_ref(), LogicalPlan::UnresolvedAggregate(_))));
            }
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_cte() {
        let plan = parse_query("with c as (select a from t) select * from c").unwrap();
        match plan {
            LogicalPlan::With(With { name, .. }) => assert_eq!(name, "c"),
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_join_with_condition() {
        let plan =
            parse_query("select * from t join s on t.a = s.a").unwrap();
        match plan {
            LogicalPlan::Project(Project { child, .. }) => match child.as_ref() {
                LogicalPlan::Join(join) => {
                    assert_eq!(join.join_type, JoinType::Inner);
                    assert!(join.condition.is_some());
                }
                p => panic!("unexpected from clause {:?}", p),
            },
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_distinct_function_argument() {
        let plan = parse_query("select count(distinct a) from t").unwrap();
        match plan {
            LogicalPlan::Project(Project { project_list, .. }) => match &project_list[0] {
                Expr::UnresolvedAlias(inner) => match inner.as_ref() {
                    Expr::UnresolvedFunction(f) => {
                        assert!(f.distinct);
                        assert_eq!(f.name, "count");
                    }
                    e => panic!("unexpected select item {:?}", e),
                },
                e => panic!("unexpected select item {:?}", e),
            },
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_expression_precedence() {
        let expr = parse_expression("1 + 2 * 3 < 10 and not false").unwrap();
        // ((1 + (2 * 3)) < 10) and (not false)
        match expr {
            Expr::BinaryOperator(BinaryOperator { op: Operator::And, left, .. }) => {
                assert!(matches!(
                    left.as_ref(),
                    Expr::BinaryOperator(BinaryOperator { op: Operator::Lt, .. })
                ));
            }
            e => panic!("unexpected expression {:?}", e),
        }
    }

    #[test]
    fn test_parse_union_and_limit() {
        let plan = parse_query("select a from t union select a from s limit 3").unwrap();
        // limit binds to the right operand's query spec
        match plan {
            LogicalPlan::Union(SetOp { right, .. }) => {
                assert!(matches!(right.as_ref(), LogicalPlan::Limit(_)));
            }
            p => panic!("unexpected plan {:?}", p),
        }
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_expression("null").unwrap(), Expr::null_lit());
        assert_eq!(parse_expression("42").unwrap(), Expr::int_lit(42));
        assert_eq!(
            parse_expression("4294967296").unwrap(),
            Expr::long_lit(4294967296)
        );
        assert_eq!(
            parse_expression("1.5").unwrap(),
            Expr::lit(Value::Float64(1.5), DataType::Float64)
        );
        assert_eq!(parse_expression("'x'").unwrap(), Expr::string_lit("x"));
        assert_eq!(parse_expression("-7").unwrap(), Expr::int_lit(-7));
    }

    #[test]
    fn test_parse_cast() {
        assert_eq!(
            parse_expression("cast('1' as int)").unwrap(),
            Expr::string_lit("1").cast(DataType::Int32)
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_query("select from"), Err(AnalysisError::ParseError(_))));
    }
}
