//! Folding of partial query results under the rule-body operators.

use crate::clause::{ConditionOperator, QueryResult, Solution};

/// Fold `next` into `accumulated` under `operator`.
///
/// `accumulated` is `None` before the first condition of a rule body, in
/// which case `next` seeds the fold and is returned unchanged.
///
/// For `And`, solution-carrying operands dominate: if both sides carry
/// bindings the left side is intersected against the right by the
/// order-sensitive stringified form of each solution; if exactly one side
/// carries bindings that list is kept as-is (the plain boolean operand's
/// truth value is dropped here); only when neither side carries bindings
/// does the fold degrade to boolean AND.
///
/// For `Or` (and the structural `Not` marker, which never combines) the fold
/// picks the first operand whose result is true, else a false result over
/// the later operand's query. Solution sets are not merged in this branch,
/// so disjunction degrades to boolean-only behavior in solution mode.
#[must_use]
pub fn apply_logical_operator(
    accumulated: Option<QueryResult>,
    operator: ConditionOperator,
    next: QueryResult,
) -> QueryResult {
    let Some(first) = accumulated else {
        return next;
    };

    if operator == ConditionOperator::And {
        return match (&first.solutions, &next.solutions) {
            (Some(left), Some(right)) => {
                let keys: Vec<String> = right.iter().map(stringify).collect();
                let merged: Vec<Solution> = left
                    .iter()
                    .filter(|solution| keys.contains(&stringify(solution)))
                    .cloned()
                    .collect();
                QueryResult::with_solutions(next.query, merged)
            }
            (Some(left), None) => QueryResult::with_solutions(next.query, left.clone()),
            (None, Some(right)) => QueryResult::with_solutions(next.query, right.clone()),
            (None, None) => QueryResult::boolean(first.result && next.result, next.query),
        };
    }

    if first.result {
        first
    } else if next.result {
        next
    } else {
        QueryResult::boolean(false, next.query)
    }
}

fn stringify(solution: &Solution) -> String {
    solution
        .iter()
        .map(|(key, value)| format!("{key}={value};"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{ClauseArgument, Query};

    fn query(name: &str) -> Query {
        Query::new(
            name.to_string(),
            vec![ClauseArgument::Constant("c".to_string())],
        )
    }

    fn solution(pairs: &[(&str, &str)]) -> Solution {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn test_seed_returns_next_unchanged() {
        let next = QueryResult::boolean(true, query("A"));
        let folded = apply_logical_operator(None, ConditionOperator::And, next.clone());
        assert_eq!(folded, next);
    }

    #[test]
    fn test_and_booleans() {
        let left = QueryResult::boolean(true, query("A"));
        let right = QueryResult::boolean(false, query("B"));
        let folded =
            apply_logical_operator(Some(left.clone()), ConditionOperator::And, right.clone());
        assert!(!folded.result);
        assert_eq!(folded.query, query("B"));
        assert_eq!(folded.solutions, None);

        let folded = apply_logical_operator(
            Some(left),
            ConditionOperator::And,
            QueryResult::boolean(true, query("B")),
        );
        assert!(folded.result);
    }

    #[test]
    fn test_and_intersects_solution_sets() {
        let left = QueryResult::with_solutions(
            query("A"),
            vec![solution(&[("X", "Max")]), solution(&[("X", "Bob")])],
        );
        let right = QueryResult::with_solutions(query("B"), vec![solution(&[("X", "Max")])]);

        let folded = apply_logical_operator(Some(left), ConditionOperator::And, right);
        assert!(folded.result);
        assert_eq!(folded.solutions, Some(vec![solution(&[("X", "Max")])]));
    }

    #[test]
    fn test_and_intersection_is_order_sensitive() {
        // The stringified form keeps insertion order, so the same bindings in
        // a different key order do not intersect.
        let left = QueryResult::with_solutions(
            query("A"),
            vec![solution(&[("X", "Max"), ("Y", "Jane")])],
        );
        let right = QueryResult::with_solutions(
            query("B"),
            vec![solution(&[("Y", "Jane"), ("X", "Max")])],
        );

        let folded = apply_logical_operator(Some(left), ConditionOperator::And, right);
        assert!(!folded.result);
        assert_eq!(folded.solutions, Some(Vec::new()));
    }

    #[test]
    fn test_and_keeps_the_solution_carrying_side() {
        let bindings = vec![solution(&[("X", "Max")])];
        let left = QueryResult::with_solutions(query("A"), bindings.clone());
        let right = QueryResult::boolean(false, query("B"));

        // The boolean operand's truth value is dropped when the other side
        // carries bindings.
        let folded = apply_logical_operator(Some(left), ConditionOperator::And, right);
        assert!(folded.result);
        assert_eq!(folded.solutions, Some(bindings.clone()));

        let left = QueryResult::boolean(false, query("A"));
        let right = QueryResult::with_solutions(query("B"), bindings.clone());
        let folded = apply_logical_operator(Some(left), ConditionOperator::And, right);
        assert!(folded.result);
        assert_eq!(folded.solutions, Some(bindings));
    }

    #[test]
    fn test_or_short_circuits_to_first_true() {
        let left = QueryResult::boolean(true, query("A"));
        let right = QueryResult::boolean(true, query("B"));
        let folded = apply_logical_operator(Some(left), ConditionOperator::Or, right);
        // The first true operand is returned as-is, query included.
        assert_eq!(folded.query, query("A"));

        let left = QueryResult::boolean(false, query("A"));
        let right = QueryResult::boolean(true, query("B"));
        let folded = apply_logical_operator(Some(left), ConditionOperator::Or, right);
        assert_eq!(folded.query, query("B"));

        let left = QueryResult::boolean(false, query("A"));
        let right = QueryResult::boolean(false, query("B"));
        let folded = apply_logical_operator(Some(left), ConditionOperator::Or, right);
        assert!(!folded.result);
        assert_eq!(folded.query, query("B"));
    }

    #[test]
    fn test_or_does_not_merge_solution_sets() {
        // Known limitation: disjunction in solution mode degrades to the
        // boolean choice and never unions the two binding lists.
        let left = QueryResult::with_solutions(query("A"), vec![solution(&[("X", "Max")])]);
        let right = QueryResult::with_solutions(query("B"), vec![solution(&[("X", "Bob")])]);

        let folded = apply_logical_operator(Some(left.clone()), ConditionOperator::Or, right);
        assert_eq!(folded, left);
    }
}
