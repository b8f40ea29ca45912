//! Alias reconciliation: diff an incoming alias list against the
//! directory's current contents and produce the minimal write set.
//!
//! The planner is pure so the set semantics stay testable without a
//! database. Backends load the current set, call [`plan`], apply the
//! writes, and re-read.

use std::collections::HashSet;

use crate::alias::Alias;

/// The writes that transition the current directory state to the
/// reconciled one.
#[derive(Debug)]
pub struct ReconcilePlan {
  /// Incoming records whose email is not yet present. Ids come from
  /// the incoming records themselves: freshly minted for `sync`,
  /// caller-supplied for `add_all`.
  pub to_add:    Vec<Alias>,
  /// Current records whose email is absent from the incoming list.
  /// Empty unless purging.
  pub to_remove: Vec<Alias>,
}

/// Diff `incoming` against `current` by email value.
///
/// Duplicate emails within `incoming` collapse to the first
/// occurrence. Emails are assumed normalized, see
/// [`crate::alias::normalize`].
pub fn plan(
  current: &[Alias],
  incoming: Vec<Alias>,
  purge_missing: bool,
) -> ReconcilePlan {
  let existing: HashSet<&str> =
    current.iter().map(|a| a.email.as_str()).collect();

  let mut seen: HashSet<String> = HashSet::new();
  let mut to_add = Vec::new();
  for alias in incoming {
    if !seen.insert(alias.email.clone()) {
      continue;
    }
    if !existing.contains(alias.email.as_str()) {
      to_add.push(alias);
    }
  }

  let to_remove = if purge_missing {
    current
      .iter()
      .filter(|a| !seen.contains(&a.email))
      .cloned()
      .collect()
  } else {
    Vec::new()
  };

  ReconcilePlan { to_add, to_remove }
}
