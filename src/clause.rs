use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One positional argument of a fact, rule head, condition or query.
///
/// An argument is either a *constant* (a fixed, case-sensitive name such as
/// `Max`) or an *atom* (a free variable placeholder such as `X`, bound to a
/// concrete value during resolution). Arguments are immutable once built.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClauseArgument {
    /// A concrete, fixed name (e.g. `Max`, `jane`).
    Constant(String),
    /// A free variable placeholder (e.g. `X`, `Y2`).
    Atom(String),
}

impl ClauseArgument {
    /// The argument's name, regardless of kind.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Constant(name) | Self::Atom(name) => name,
        }
    }

    /// Whether this argument is a free variable.
    #[must_use]
    pub fn is_atom(&self) -> bool {
        matches!(self, Self::Atom(_))
    }
}

impl fmt::Display for ClauseArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A ground assertion about a relation (e.g. `Likes(Max, Jane);`).
///
/// Every argument of a fact must be a constant; the loader rejects facts
/// containing atoms before they reach the resolver.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fact {
    /// The relation name.
    pub name: String,
    /// The ordered, fully ground argument list.
    pub arguments: Vec<ClauseArgument>,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clause(f, &self.name, &self.arguments)?;
        f.write_str(";")
    }
}

/// The keyword linking a rule condition to the condition before it.
///
/// `Not` exists for grammar completeness; negation is carried structurally on
/// [`Condition::negated`] rather than as a combining operator, so the
/// combinator treats `Not` like the default boolean branch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConditionOperator {
    /// Conjunction with the previous condition.
    And,
    /// Disjunction with the previous condition.
    Or,
    /// Structural negation marker (see [`Condition::negated`]).
    Not,
}

/// One entry of a rule body: a query-shaped clause, its negation flag, and
/// the operator combining it with the previous condition.
///
/// The first condition of a body carries `And`, which the left-to-right fold
/// ignores when seeding.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Condition {
    /// The clause to resolve (its arguments may contain atoms).
    pub clause: Query,
    /// Whether the clause's truth value is inverted (`NOT` prefix).
    pub negated: bool,
    /// The operator linking this condition to the one before it.
    pub operator: ConditionOperator,
}

/// A named, parameterized derivation: a head plus a body of conditions
/// evaluated left to right (left-associative, no precedence).
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rule {
    /// The relation name of the rule head.
    pub name: String,
    /// The head's formal parameters, typically atoms.
    pub arguments: Vec<ClauseArgument>,
    /// The body, in source order.
    pub conditions: Vec<Condition>,
}

/// A request to evaluate a relation instance.
///
/// A query without atoms resolves in boolean mode; a query containing at
/// least one atom resolves in solution-enumeration mode.
///
/// Equality and hashing are structural over the relation name plus the
/// ordered argument *names*, ignoring the atom/constant distinction. This is
/// the identity used for memoization cache keys.
#[derive(Debug, Clone, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Query {
    /// The relation name.
    pub name: String,
    /// The ordered argument list.
    pub arguments: Vec<ClauseArgument>,
}

impl Query {
    /// Create a query over `name` with the given arguments.
    #[must_use]
    pub fn new(name: String, arguments: Vec<ClauseArgument>) -> Self {
        Self { name, arguments }
    }

    /// True iff any argument is an atom (switches resolution to
    /// solution-enumeration mode).
    #[must_use]
    pub fn has_atoms(&self) -> bool {
        self.arguments.iter().any(ClauseArgument::is_atom)
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.arguments.len() == other.arguments.len()
            && self
                .arguments
                .iter()
                .zip(&other.arguments)
                .all(|(a, b)| a.name() == b.name())
    }
}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for argument in &self.arguments {
            argument.name().hash(state);
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_clause(f, &self.name, &self.arguments)
    }
}

fn write_clause(f: &mut fmt::Formatter<'_>, name: &str, arguments: &[ClauseArgument]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (position, argument) in arguments.iter().enumerate() {
        if position > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{argument}")?;
    }
    f.write_str(")")
}

/// One satisfying assignment of atoms to constants, in atom position order.
pub type Solution = IndexMap<String, String>;

/// The outcome of resolving one query.
#[derive(Debug, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryResult {
    /// Whether the query holds.
    pub result: bool,
    /// The originating query.
    pub query: Query,
    /// `None` in boolean mode; `Some` (possibly empty) in solution mode.
    pub solutions: Option<Vec<Solution>>,
}

impl QueryResult {
    /// A boolean-mode result with no bindings tracked.
    #[must_use]
    pub fn boolean(result: bool, query: Query) -> Self {
        Self {
            result,
            query,
            solutions: None,
        }
    }

    /// A solution-mode result; true iff the solution list is non-empty.
    #[must_use]
    pub fn with_solutions(query: Query, solutions: Vec<Solution>) -> Self {
        Self {
            result: !solutions.is_empty(),
            query,
            solutions: Some(solutions),
        }
    }

    /// Flip the boolean sense, preserving any solution list.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.result = !self.result;
        self
    }
}
