//! Pattern matching and generic unification over [`Type`]
//!
//! Signatures of operators and functions are written as type patterns that may
//! mention [`Type::Generic`] variables. Matching a pattern against an actual
//! type produces [`TypeBindings`]: the concrete type each variable stands for.
//! Within one resolution attempt a variable is bound at most once; every later
//! occurrence must be consistent with that binding.
//!
//! Matching rules for a concrete pattern against an actual type:
//! - a single element is accepted where a collection of that element is expected
//! - a collection is never accepted where a single element is expected
//! - `Null` (the empty value) is accepted anywhere
//! - an actual `Choice` matches when any alternative matches
//! - an `Integer` is accepted where a `Decimal` is expected

use rustc_hash::FxHashMap;

use super::types::{Type, normalize_choice};

/// Generic variable name to concrete type
pub type TypeBindings = FxHashMap<String, Type>;

/// Match `pattern` against `actual` starting from empty bindings
pub fn match_type_pattern(pattern: &Type, actual: &Type) -> Option<TypeBindings> {
    match_type_pattern_with(pattern, actual, &TypeBindings::default())
}

/// Match `pattern` against `actual`, extending `existing` bindings.
///
/// Returns `None` when the types do not match or when a variable that is
/// already bound cannot unify with its new occurrence.
pub fn match_type_pattern_with(
    pattern: &Type,
    actual: &Type,
    existing: &TypeBindings,
) -> Option<TypeBindings> {
    let mut bindings = existing.clone();
    if unify(pattern, actual, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

fn unify(pattern: &Type, actual: &Type, bindings: &mut TypeBindings) -> bool {
    if actual.is_invalid() || pattern.is_invalid() {
        return false;
    }

    match pattern {
        Type::Generic(name) => match bindings.get(name).cloned() {
            // The empty value carries no information, so a later occurrence refines it
            Some(Type::Null) => {
                bindings.insert(name.clone(), actual.clone());
                true
            }
            Some(bound) => unify(&bound, actual, bindings),
            None => {
                bindings.insert(name.clone(), actual.clone());
                true
            }
        },
        Type::Choice(alternatives) => alternatives
            .iter()
            .any(|alt| unify_alternative(alt, actual, bindings)),
        _ if matches!(actual, Type::Choice(_)) => {
            let Type::Choice(alternatives) = actual else {
                return false;
            };
            alternatives
                .iter()
                .any(|alt| unify_alternative(pattern, alt, bindings))
        }
        Type::Single(inner) => match actual {
            Type::Single(actual_inner) => unify(inner, actual_inner, bindings),
            Type::Null => unify(inner, actual, bindings),
            _ => false,
        },
        Type::TypeType(inner) => match actual {
            Type::TypeType(actual_inner) => unify(inner, actual_inner, bindings),
            _ => false,
        },
        _ => match actual {
            Type::Single(actual_inner) => unify(pattern, actual_inner, bindings),
            Type::Null => {
                bind_unbound(pattern, bindings);
                true
            }
            _ => element_matches(pattern, actual),
        },
    }
}

/// Try one alternative without leaking partial bindings from a failed attempt
fn unify_alternative(pattern: &Type, actual: &Type, bindings: &mut TypeBindings) -> bool {
    let mut attempt = bindings.clone();
    if unify(pattern, actual, &mut attempt) {
        *bindings = attempt;
        true
    } else {
        false
    }
}

fn bind_unbound(pattern: &Type, bindings: &mut TypeBindings) {
    match pattern {
        Type::Generic(name) => {
            bindings.entry(name.clone()).or_insert(Type::Null);
        }
        Type::Single(inner) | Type::TypeType(inner) => bind_unbound(inner, bindings),
        Type::Choice(alternatives) => {
            for alternative in alternatives {
                bind_unbound(alternative, bindings);
            }
        }
        _ => {}
    }
}

fn element_matches(pattern: &Type, actual: &Type) -> bool {
    pattern == actual || matches!((pattern, actual), (Type::Decimal, Type::Integer))
}

/// Replace bound generic variables with their concrete types.
///
/// Unbound variables are left untouched. `Single` and `Choice` are rebuilt
/// through their normalizing constructors.
pub fn substitute_bindings(pattern: &Type, bindings: &TypeBindings) -> Type {
    match pattern {
        Type::Generic(name) => bindings
            .get(name)
            .cloned()
            .unwrap_or_else(|| pattern.clone()),
        Type::Single(inner) => Type::single(substitute_bindings(inner, bindings)),
        Type::TypeType(inner) => Type::type_of(substitute_bindings(inner, bindings)),
        Type::Choice(alternatives) => normalize_choice(
            alternatives
                .iter()
                .map(|alternative| substitute_bindings(alternative, bindings))
                .collect(),
        ),
        other => other.clone(),
    }
}
