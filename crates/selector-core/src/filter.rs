//! The uncertainty-tracking result of a [`crate::rule::Rule::filter`] call.

use crate::subject::Subject;
use std::collections::BTreeSet;

/// Indices into the subject slice a rule was filtered over, split into the
/// subjects it could positively confirm and the ones it couldn't rule on
/// (a required attribute was simply missing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub certain: BTreeSet<usize>,
    pub uncertain: BTreeSet<usize>,
}

impl FilterOutcome {
    pub fn union(&self) -> BTreeSet<usize> {
        self.certain.union(&self.uncertain).copied().collect()
    }
}

/// Borrowing view over a [`FilterOutcome`] plus the slice it was computed
/// against, for callers that want actual `&Subject`s back out.
pub struct FilterReport<'a> {
    pub(crate) subjects: &'a [Subject],
    pub(crate) outcome: FilterOutcome,
}

impl<'a> FilterReport<'a> {
    pub fn new(subjects: &'a [Subject], outcome: FilterOutcome) -> Self {
        FilterReport { subjects, outcome }
    }

    /// Subjects the rule positively matched.
    pub fn matched(&self) -> impl Iterator<Item = &'a Subject> + '_ {
        self.outcome.certain.iter().map(move |&i| &self.subjects[i])
    }

    /// Subjects the rule could not rule on (missing data).
    pub fn uncertain(&self) -> impl Iterator<Item = &'a Subject> + '_ {
        self.outcome.uncertain.iter().map(move |&i| &self.subjects[i])
    }

    /// Every subject a controller should still contact: matched ∪
    /// uncertain, since the latter can't be safely excluded either.
    pub fn candidates(&self) -> impl Iterator<Item = &'a Subject> + '_ {
        self.outcome.union().into_iter().map(move |i| &self.subjects[i])
    }
}
