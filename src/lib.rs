//! # Resolog
//!
//! A small logic-programming engine in Rust.
//!
//! Programs are plain text, one statement per line: facts assert ground
//! relations, rules derive them, and queries ask about them. A ground query
//! resolves to a boolean; a query containing atoms (free variables such as
//! `X` or `Y`) enumerates every satisfying binding. Resolution is recursive
//! and memoized, with cycle protection so mutually recursive rules without a
//! base case terminate as non-provable.
//!
//! ## Example
//!
//! ```rust
//! use resolog::{Engine, ProcessResult};
//!
//! let mut engine = Engine::new();
//! let outcome = engine.run("likes(max, jane);\nlikes(max, Y)?");
//! match outcome {
//!     ProcessResult::Results(results) => {
//!         assert!(results[0].result);
//!         assert_eq!(results[0].solutions.as_ref().map(Vec::len), Some(1));
//!     }
//!     ProcessResult::Errors(errors) => panic!("load failed: {errors:?}"),
//! }
//! ```

/// Clause data model: arguments, facts, rules, conditions, queries, results.
pub mod clause;
/// Program container and the recursive resolution engine.
pub mod engine;
/// Logical combination of partial query results.
pub mod logic;
/// Line grammar for facts, rules, queries and comments.
pub mod parse;
/// Atom substitution and pattern comparison.
pub mod subst;

pub use clause::{
    ClauseArgument, Condition, ConditionOperator, Fact, Query, QueryResult, Rule, Solution,
};
pub use engine::{Engine, ProcessResult, Resolver};
pub use parse::{Line, ParseError};
