use crate::clause::{ClauseArgument, ConditionOperator, Fact, Query, QueryResult, Rule, Solution};
use crate::logic::apply_logical_operator;
use crate::parse::{parse_line, parse_query, Line, ParseError};
use crate::subst::{compare_arguments_ignoring_atoms, replace_atoms_with_names};
use indexmap::IndexMap;
use log::{debug, trace};

/// Outcome of loading and running a program: either the accumulated load
/// errors (which suppress resolution for the whole batch), or one result per
/// query in source order.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ProcessResult {
    /// Load-time errors; no queries were resolved.
    Errors(Vec<ParseError>),
    /// One result per query, in source order.
    Results(Vec<QueryResult>),
}

impl ProcessResult {
    /// The query results, empty in error mode.
    #[must_use]
    pub fn results(&self) -> &[QueryResult] {
        match self {
            Self::Results(results) => results,
            Self::Errors(_) => &[],
        }
    }

    /// The load errors, empty in result mode.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        match self {
            Self::Errors(errors) => errors,
            Self::Results(_) => &[],
        }
    }

    /// Whether the program loaded cleanly.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Results(_))
    }
}

/// A loaded program: the knowledge base (facts and rules) plus the queries
/// accumulated from the last [`Engine::run`] call.
#[derive(Debug, Default)]
pub struct Engine {
    facts: Vec<Fact>,
    rules: Vec<Rule>,
    queries: Vec<Query>,
}

impl Engine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `code` and resolve its queries.
    ///
    /// Replaces any previously loaded program. Each line is parsed
    /// independently as a fact, query, rule or comment; blank lines are
    /// skipped. A fact containing an atom is rejected at load time. If any
    /// error was collected the call returns the errors and resolves nothing;
    /// otherwise every query is resolved in source order against one fresh
    /// memoization cache.
    pub fn run(&mut self, code: &str) -> ProcessResult {
        self.facts.clear();
        self.rules.clear();
        self.queries.clear();

        let mut errors: Vec<ParseError> = Vec::new();
        for (index, raw) in code.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line, line_number) {
                Ok(Line::Fact(fact)) => {
                    if let Some(atom) = fact.arguments.iter().find(|argument| argument.is_atom()) {
                        let column = line.find(atom.name()).map_or(1, |offset| offset + 1);
                        errors.push(ParseError::new(
                            "facts may not contain atoms",
                            line_number,
                            column,
                        ));
                    } else {
                        self.facts.push(fact);
                    }
                }
                Ok(Line::Query(query)) => self.queries.push(query),
                Ok(Line::Rule(rule)) => self.rules.push(rule),
                Ok(Line::Comment) => {}
                Err(error) => errors.push(error),
            }
        }

        if !errors.is_empty() {
            return ProcessResult::Errors(errors);
        }

        let mut resolver = Resolver::new(&self.facts, &self.rules);
        let results = self
            .queries
            .iter()
            .map(|query| resolver.resolve(query.clone()))
            .collect();
        ProcessResult::Results(results)
    }

    /// Resolve a single query against the currently loaded program.
    ///
    /// Returns a one-element result list, or a one-element error list (at
    /// line 0) when the trimmed input is not a query.
    pub fn evaluate_query(&self, code: &str) -> ProcessResult {
        match parse_query(code.trim()) {
            Ok(query) => {
                let mut resolver = Resolver::new(&self.facts, &self.rules);
                ProcessResult::Results(vec![resolver.resolve(query)])
            }
            Err(error) => ProcessResult::Errors(vec![error]),
        }
    }

    /// The loaded facts, in source order.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// The loaded rules, in source order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The queries accumulated by the last [`Engine::run`] call.
    #[must_use]
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }
}

/// Cache state for one query: resolution underway, or finished with a
/// concrete result.
#[derive(Debug, Clone)]
enum CacheEntry {
    InProgress,
    Done(QueryResult),
}

/// The recursive query solver.
///
/// Borrows a program's facts and rules and owns a memoization cache scoped
/// to a single resolution pass. Resolution is synchronous and depth-first;
/// the cache doubles as the cycle guard, so one resolver must not be shared
/// across passes or threads.
#[derive(Debug)]
pub struct Resolver<'a> {
    facts: &'a [Fact],
    rules: &'a [Rule],
    cache: IndexMap<Query, CacheEntry>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the given knowledge base with an empty cache.
    #[must_use]
    pub fn new(facts: &'a [Fact], rules: &'a [Rule]) -> Self {
        Self {
            facts,
            rules,
            cache: IndexMap::new(),
        }
    }

    /// Resolve a query, memoized by structural query identity.
    ///
    /// A query re-entered while its own resolution is underway (a cyclic
    /// dependency) settles immediately as non-provable: `false` in boolean
    /// mode, an empty solution set in solution mode.
    pub fn resolve(&mut self, query: Query) -> QueryResult {
        match self.cache.get(&query).cloned() {
            Some(CacheEntry::Done(result)) => {
                trace!("cache hit for {query}");
                return result;
            }
            Some(CacheEntry::InProgress) => {
                trace!("cycle on {query}, settling as non-provable");
                let settled = if query.has_atoms() {
                    QueryResult::with_solutions(query, Vec::new())
                } else {
                    QueryResult::boolean(false, query)
                };
                return self.settle(settled);
            }
            None => {}
        }

        self.cache.insert(query.clone(), CacheEntry::InProgress);
        debug!("resolving {query}");

        if query.has_atoms() {
            self.enumerate(query)
        } else {
            self.prove(query)
        }
    }

    /// Boolean mode: direct fact match, then deduction, then induction.
    fn prove(&mut self, query: Query) -> QueryResult {
        let facts = self.facts;
        let rules = self.rules;

        if facts
            .iter()
            .any(|fact| fact.name == query.name && fact.arguments == query.arguments)
        {
            debug!("{query} holds as a fact");
            return self.settle(QueryResult::boolean(true, query));
        }

        // Deduction: specialize each matching rule's body to the query's
        // arguments and fold the conditions left to right. The first rule
        // whose folded body holds wins.
        for rule in rules
            .iter()
            .filter(|rule| rule.name == query.name && rule.arguments.len() == query.arguments.len())
        {
            let mut folded: Option<QueryResult> = None;
            for condition in &rule.conditions {
                let arguments = replace_atoms_with_names(
                    &rule.arguments,
                    &query.arguments,
                    &condition.clause.arguments,
                );
                let condition_query = Query::new(condition.clause.name.clone(), arguments);

                let condition_in_progress = matches!(
                    self.cache.get(&condition_query),
                    Some(CacheEntry::InProgress)
                );
                let resolved = if condition_in_progress {
                    // Re-entrancy guard: fall back to whatever is cached for
                    // the query under resolution, not the condition's own
                    // entry. Changing this alters which cyclic rules
                    // terminate to true vs false.
                    match self.cache.get(&query).cloned() {
                        Some(CacheEntry::Done(prior)) => prior,
                        _ => return self.settle(QueryResult::boolean(false, query.clone())),
                    }
                } else {
                    self.resolve(condition_query)
                };

                let resolved = if condition.negated {
                    resolved.negated()
                } else {
                    resolved
                };
                folded = Some(apply_logical_operator(folded, condition.operator, resolved));
            }

            if folded.as_ref().is_some_and(|result| result.result) {
                debug!("{query} deduced from rule {}", rule.name);
                return self.settle(QueryResult::boolean(true, query.clone()));
            }
        }

        // Induction: search rules that mention the query's relation as a
        // condition and check the rule's own head. Rules with any OR-linked
        // condition are excluded from this backward search.
        for rule in rules.iter().filter(|rule| {
            rule.conditions.iter().any(|condition| {
                condition.clause.name == query.name
                    && condition.clause.arguments.len() == query.arguments.len()
            }) && rule
                .conditions
                .iter()
                .all(|condition| condition.operator != ConditionOperator::Or)
        }) {
            for condition in &rule.conditions {
                if condition.clause.name != query.name
                    || condition.clause.arguments.len() != query.arguments.len()
                {
                    continue;
                }
                if !compare_arguments_ignoring_atoms(&condition.clause.arguments, &query.arguments)
                {
                    continue;
                }

                let next_query = Query::new(
                    rule.name.clone(),
                    replace_atoms_with_names(
                        &condition.clause.arguments,
                        &query.arguments,
                        &rule.arguments,
                    ),
                );

                let outcome = match self.cache.get(&next_query).cloned() {
                    Some(CacheEntry::InProgress) => {
                        return self.settle(QueryResult::boolean(false, query.clone()));
                    }
                    Some(CacheEntry::Done(done)) => done,
                    None => self.resolve(next_query),
                };

                if outcome.result != condition.negated {
                    debug!("{query} induced via rule {}", rule.name);
                    return self.settle(QueryResult::boolean(true, query.clone()));
                }
            }
        }

        self.settle(QueryResult::boolean(false, query))
    }

    /// Solution mode: enumerate matching facts, then rule heads, unioning
    /// bindings in declaration order. No short-circuit between the two.
    fn enumerate(&mut self, query: Query) -> QueryResult {
        let facts = self.facts;
        let rules = self.rules;
        let mut solutions: Vec<Solution> = Vec::new();

        for fact in facts.iter().filter(|fact| {
            fact.name == query.name
                && fact.arguments.len() == query.arguments.len()
                && compare_arguments_ignoring_atoms(&query.arguments, &fact.arguments)
        }) {
            solutions.push(bind_atoms(&query.arguments, &fact.arguments));
        }

        for rule in rules
            .iter()
            .filter(|rule| rule.name == query.name && rule.arguments.len() == query.arguments.len())
        {
            // Resolve the rule's body in its own variable space by querying
            // the head with the query's arguments substituted in. With an
            // all-atom head this query is structurally identical to the
            // original and lands on the in-progress cache entry, so it
            // contributes bindings only when the head carries constants.
            let head_query = Query::new(
                rule.name.clone(),
                replace_atoms_with_names(&rule.arguments, &query.arguments, &rule.arguments),
            );
            let resolved = self.resolve(head_query.clone());
            if resolved.result {
                solutions.push(bind_atoms(&query.arguments, &head_query.arguments));
            }
        }

        self.settle(QueryResult::with_solutions(query, solutions))
    }

    fn settle(&mut self, result: QueryResult) -> QueryResult {
        self.cache
            .insert(result.query.clone(), CacheEntry::Done(result.clone()));
        result
    }
}

/// One solution: each atom position of `pattern` bound to the value at that
/// position in `values`.
fn bind_atoms(pattern: &[ClauseArgument], values: &[ClauseArgument]) -> Solution {
    pattern
        .iter()
        .zip(values)
        .filter(|(argument, _)| argument.is_atom())
        .map(|(argument, value)| (argument.name().to_string(), value.name().to_string()))
        .collect()
}
