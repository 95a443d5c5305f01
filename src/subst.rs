//! Substitution of rule-local atoms with caller-supplied arguments, and the
//! one-way argument comparison used to match patterns against ground terms.

use crate::clause::ClauseArgument;
use indexmap::IndexMap;

/// Rewrite `target` by replacing every occurrence of an atom from `atoms`
/// with the same-position entry of `names`.
///
/// `atoms` and `names` are positionally aligned and equal-length: they are a
/// rule's declared head arguments and the caller's concrete arguments. Only
/// the atom entries of `atoms` contribute to the mapping; constants in the
/// head keep their own name. `target` may be any length (a condition's own
/// argument list, or the head again) and non-mapped arguments pass through
/// unchanged.
#[must_use]
pub fn replace_atoms_with_names(
    atoms: &[ClauseArgument],
    names: &[ClauseArgument],
    target: &[ClauseArgument],
) -> Vec<ClauseArgument> {
    debug_assert_eq!(atoms.len(), names.len());

    let mut mapping: IndexMap<&str, &ClauseArgument> = IndexMap::new();
    for (formal, actual) in atoms.iter().zip(names) {
        if formal.is_atom() {
            mapping.insert(formal.name(), actual);
        }
    }

    target
        .iter()
        .map(|argument| {
            if argument.is_atom() {
                if let Some(replacement) = mapping.get(argument.name()) {
                    return (*replacement).clone();
                }
            }
            argument.clone()
        })
        .collect()
}

/// Positional comparison where the atoms of `reference` act as wildcards.
///
/// Every position where `reference` holds a constant must equal `candidate`
/// at that position by name; atom positions always match. This is not
/// two-way unification: only the reference side's atoms are free. Lists of
/// unequal length never match.
#[must_use]
pub fn compare_arguments_ignoring_atoms(
    reference: &[ClauseArgument],
    candidate: &[ClauseArgument],
) -> bool {
    reference.len() == candidate.len()
        && reference
            .iter()
            .zip(candidate)
            .all(|(reference, candidate)| {
                reference.is_atom() || reference.name() == candidate.name()
            })
}
