//! Line grammar for the program surface: facts, queries, rules and comments.
//!
//! One statement per line. Classification tries the productions in the
//! loader's order (fact, query, rule, comment); a line matching none of them
//! is a syntax error carrying the rule parser's failure column.

use crate::clause::{ClauseArgument, Condition, ConditionOperator, Fact, Query, Rule};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char as nomchar, multispace0, multispace1, satisfy},
    combinator::{all_consuming, map, opt, recognize, rest, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A load-time error: either a line matching no production, or a fact
/// carrying an atom argument. Line and column are 1-based; a standalone
/// query evaluated outside a program reports line 0.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// 1-based source line.
    pub line: usize,
    /// 1-based column of the failure.
    pub column: usize,
}

impl ParseError {
    /// Build an error at the given position.
    #[must_use]
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// One classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A ground assertion (`Likes(Max, Jane);`).
    Fact(Fact),
    /// A question (`Likes(Max, Y)?`).
    Query(Query),
    /// A derivation (`Friends(X, Y) : Likes(X, Y) AND Knows(X, Y);`).
    Rule(Rule),
    /// A `//` comment.
    Comment,
}

/// Classify a trimmed, non-empty source line.
///
/// # Errors
///
/// Returns a [`ParseError`] at `line_number` when the line matches none of
/// the four productions.
pub fn parse_line(input: &str, line_number: usize) -> Result<Line, ParseError> {
    if let Ok((_, fact)) = all_consuming(fact)(input) {
        return Ok(Line::Fact(fact));
    }
    if let Ok((_, query)) = all_consuming(query)(input) {
        return Ok(Line::Query(query));
    }
    match all_consuming(rule)(input) {
        Ok((_, rule)) => Ok(Line::Rule(rule)),
        Err(rule_error) => {
            if all_consuming(comment)(input).is_ok() {
                return Ok(Line::Comment);
            }
            Err(ParseError::new(
                "statement is not a valid fact, query, rule or comment",
                line_number,
                error_column(input, &rule_error),
            ))
        }
    }
}

/// Parse a standalone query (the `evaluate_query` entry point).
///
/// # Errors
///
/// Returns a [`ParseError`] at line 0 when the input is not a single query.
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    match all_consuming(query)(input) {
        Ok((_, query)) => Ok(query),
        Err(error) => Err(ParseError::new(
            "input is not a valid query",
            0,
            error_column(input, &error),
        )),
    }
}

fn error_column(input: &str, error: &nom::Err<nom::error::Error<&str>>) -> usize {
    match error {
        nom::Err::Error(inner) | nom::Err::Failure(inner) => input.len() - inner.input.len() + 1,
        nom::Err::Incomplete(_) => input.len() + 1,
    }
}

/// A token is an atom iff its first character is an uppercase ASCII letter
/// and the remaining characters, if any, are all digits (`X`, `Y2`); every
/// other identifier is a constant (`Max`, `jane`).
fn classify(token: &str) -> ClauseArgument {
    let mut characters = token.chars();
    let leading_upper = characters.next().is_some_and(|c| c.is_ascii_uppercase());
    if leading_upper && characters.all(|c| c.is_ascii_digit()) {
        ClauseArgument::Atom(token.to_string())
    } else {
        ClauseArgument::Constant(token.to_string())
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn argument(input: &str) -> IResult<&str, ClauseArgument> {
    map(identifier, classify)(input)
}

fn argument_list(input: &str) -> IResult<&str, Vec<ClauseArgument>> {
    delimited(
        pair(nomchar('('), multispace0),
        separated_list1(tuple((multispace0, nomchar(','), multispace0)), argument),
        pair(multispace0, nomchar(')')),
    )(input)
}

fn clause(input: &str) -> IResult<&str, (String, Vec<ClauseArgument>)> {
    let (input, name) = identifier(input)?;
    let (input, arguments) = preceded(multispace0, argument_list)(input)?;
    Ok((input, (name.to_string(), arguments)))
}

fn fact(input: &str) -> IResult<&str, Fact> {
    map(
        terminated(clause, pair(multispace0, nomchar(';'))),
        |(name, arguments)| Fact { name, arguments },
    )(input)
}

fn query(input: &str) -> IResult<&str, Query> {
    map(
        terminated(clause, pair(multispace0, nomchar('?'))),
        |(name, arguments)| Query::new(name, arguments),
    )(input)
}

fn operator(input: &str) -> IResult<&str, ConditionOperator> {
    alt((
        value(ConditionOperator::And, tag("AND")),
        value(ConditionOperator::Or, tag("OR")),
    ))(input)
}

fn condition_clause(input: &str) -> IResult<&str, (bool, Query)> {
    map(
        pair(opt(terminated(tag("NOT"), multispace1)), clause),
        |(negation, (name, arguments))| (negation.is_some(), Query::new(name, arguments)),
    )(input)
}

fn rule(input: &str) -> IResult<&str, Rule> {
    let (input, (name, arguments)) = clause(input)?;
    let (input, _) = tuple((multispace0, nomchar(':'), multispace0))(input)?;
    let (input, (first_negated, first_clause)) = condition_clause(input)?;
    let (input, tail) = many0(pair(
        delimited(multispace1, operator, multispace1),
        condition_clause,
    ))(input)?;
    let (input, _) = pair(multispace0, nomchar(';'))(input)?;

    // The stored operator links a condition to the one before it; the first
    // condition's And is ignored by the fold seed.
    let mut conditions = vec![Condition {
        clause: first_clause,
        negated: first_negated,
        operator: ConditionOperator::And,
    }];
    for (operator, (negated, clause)) in tail {
        conditions.push(Condition {
            clause,
            negated,
            operator,
        });
    }

    Ok((input, Rule {
        name,
        arguments,
        conditions,
    }))
}

fn comment(input: &str) -> IResult<&str, ()> {
    map(pair(tag("//"), rest), |_| ())(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(name: &str) -> ClauseArgument {
        ClauseArgument::Constant(name.to_string())
    }

    fn atom(name: &str) -> ClauseArgument {
        ClauseArgument::Atom(name.to_string())
    }

    #[test]
    fn test_classify_tokens() {
        assert_eq!(classify("X"), atom("X"));
        assert_eq!(classify("Y2"), atom("Y2"));
        assert_eq!(classify("Max"), constant("Max"));
        assert_eq!(classify("jane"), constant("jane"));
        assert_eq!(classify("x"), constant("x"));
    }

    #[test]
    fn test_parse_fact() {
        let line = parse_line("Likes(Max, Jane);", 1).unwrap();
        assert_eq!(
            line,
            Line::Fact(Fact {
                name: "Likes".to_string(),
                arguments: vec![constant("Max"), constant("Jane")],
            })
        );
    }

    #[test]
    fn test_parse_fact_tolerates_whitespace() {
        let line = parse_line("Likes ( Max ,  Jane ) ;", 1).unwrap();
        assert!(matches!(line, Line::Fact(fact) if fact.arguments.len() == 2));
    }

    #[test]
    fn test_parse_query() {
        let line = parse_line("Likes(Max, Y)?", 1).unwrap();
        let Line::Query(query) = line else {
            panic!("expected a query");
        };
        assert_eq!(query.name, "Likes");
        assert_eq!(query.arguments, vec![constant("Max"), atom("Y")]);
        assert!(query.has_atoms());
    }

    #[test]
    fn test_parse_rule_operators_and_negation() {
        let line = parse_line("Single(X) : Person(X) AND NOT Married(X) OR Widowed(X);", 1).unwrap();
        let Line::Rule(rule) = line else {
            panic!("expected a rule");
        };
        assert_eq!(rule.name, "Single");
        assert_eq!(rule.arguments, vec![atom("X")]);
        assert_eq!(rule.conditions.len(), 3);

        assert_eq!(rule.conditions[0].clause.name, "Person");
        assert!(!rule.conditions[0].negated);
        assert_eq!(rule.conditions[0].operator, ConditionOperator::And);

        assert_eq!(rule.conditions[1].clause.name, "Married");
        assert!(rule.conditions[1].negated);
        assert_eq!(rule.conditions[1].operator, ConditionOperator::And);

        assert_eq!(rule.conditions[2].clause.name, "Widowed");
        assert!(!rule.conditions[2].negated);
        assert_eq!(rule.conditions[2].operator, ConditionOperator::Or);
    }

    #[test]
    fn test_parse_comment() {
        assert_eq!(parse_line("// anything at all", 3).unwrap(), Line::Comment);
    }

    #[test]
    fn test_parse_error_position() {
        let error = parse_line("???", 7).unwrap_err();
        assert_eq!(error.line, 7);
        assert_eq!(error.column, 1);

        let error = parse_line("Likes(Max", 2).unwrap_err();
        assert_eq!(error.line, 2);
        assert!(error.column > 1);
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(parse_line("Likes(Max, Jane); extra", 1).is_err());
    }

    #[test]
    fn test_parse_standalone_query() {
        let query = parse_query("Likes(Max, Y)?").unwrap();
        assert_eq!(query.name, "Likes");

        let error = parse_query("Likes(Max, Y);").unwrap_err();
        assert_eq!(error.line, 0);
        assert!(error.column > 0);
    }

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::new("facts may not contain atoms", 4, 12);
        assert_eq!(
            error.to_string(),
            "facts may not contain atoms (line 4, column 12)"
        );
    }
}
