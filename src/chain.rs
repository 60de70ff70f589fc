//! Walking an error and its causes.

use core::iter::FusedIterator;

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{record::ErrorRecord, throwable::Throwable};

/// An error and all of its recorded causes, outermost first.
///
/// Records refer to their cause by position, so a chain owns every record and
/// never forms a reference cycle, even when the walked objects did.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    records: Vec<ErrorRecord>,
    cycle_target: Option<usize>,
}

impl Chain {
    /// The records in chain order. Never empty.
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Number of records in the chain.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the chain holds no records, which never happens for
    /// chains built by [`collect_chain`].
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The error that was actually raised.
    pub fn outermost(&self) -> &ErrorRecord {
        &self.records[0]
    }

    /// The record for the error that caused `record`.
    pub fn cause_of(&self, record: &ErrorRecord) -> Option<&ErrorRecord> {
        record.cause.and_then(|position| self.records.get(position))
    }

    /// Position of the record a truncated cycle pointed back to.
    ///
    /// `Some` only when walking the causes revisited an object that was
    /// already part of the chain.
    pub fn cycle_target(&self) -> Option<usize> {
        self.cycle_target
    }

    /// Follows the cause links from the outermost record.
    pub fn iter(&self) -> CauseIter<'_> {
        CauseIter {
            chain: self,
            next: self.records.first(),
        }
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a ErrorRecord;
    type IntoIter = CauseIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the records of a [`Chain`] along their cause links.
#[must_use]
#[derive(Clone)]
#[allow(missing_copy_implementations)]
pub struct CauseIter<'a> {
    chain: &'a Chain,
    next: Option<&'a ErrorRecord>,
}

impl<'a> Iterator for CauseIter<'a> {
    type Item = &'a ErrorRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.chain.cause_of(current);
        Some(current)
    }
}

impl FusedIterator for CauseIter<'_> {}

/// Collects `error` and every error it was caused by, outermost first.
///
/// Traversal remembers the identity of every object it visited, meaning its
/// address together with its concrete type. If a cause turns out to be an
/// object that is already in the chain, the walk stops there and
/// [`Chain::cycle_target`] reports where the cycle led back to. Cycles that
/// an owned snapshot already cut off are reported through
/// [`Throwable::repeated_cause`].
///
/// ```
/// use debugpage::{CapturedError, collect_chain};
///
/// let error = CapturedError::new("Outer", "request failed")
///     .caused_by(CapturedError::new("Inner", "connection refused"));
/// let chain = collect_chain(&error);
///
/// let messages: Vec<_> = chain.iter().map(|record| record.message.as_str()).collect();
/// assert_eq!(messages, ["request failed", "connection refused"]);
/// ```
pub fn collect_chain(error: &dyn Throwable) -> Chain {
    let mut visited = Visited::default();
    let mut records: Vec<ErrorRecord> = Vec::new();
    let mut cycle_target = None;
    let mut last = error;
    let mut current = Some(error);

    while let Some(throwable) = current {
        if let Some(position) = visited.get(throwable) {
            cycle_target = Some(position);
            break;
        }

        let position = records.len();
        visited.insert(throwable, position);
        if let Some(previous) = records.last_mut() {
            previous.cause = Some(position);
        }
        records.push(ErrorRecord::from_throwable(throwable, position));
        last = throwable;
        current = throwable.previous();
    }

    if cycle_target.is_none()
        && let Some(distance) = last.repeated_cause()
    {
        cycle_target = (records.len() - 1).checked_sub(distance);
    }
    if let Some(position) = cycle_target {
        tracing::warn!(
            chain_length = records.len(),
            cycle_target = position,
            "error cause chain refers back to itself, truncating"
        );
    }

    Chain {
        records,
        cycle_target,
    }
}

/// Objects seen during a walk, keyed by address.
///
/// A cause stored inline at the start of its error shares that error's
/// address, so entries at one address are told apart by their full wide
/// pointer, vtable included.
pub(crate) struct Visited<'a, T: ?Sized> {
    by_address: HashMap<usize, Vec<(&'a T, usize)>, FxBuildHasher>,
}

impl<T: ?Sized> Default for Visited<'_, T> {
    fn default() -> Self {
        Self {
            by_address: HashMap::default(),
        }
    }
}

impl<'a, T: ?Sized> Visited<'a, T> {
    /// The position `object` was inserted at, if it was seen before.
    pub(crate) fn get(&self, object: &T) -> Option<usize> {
        self.by_address
            .get(&address_of(object))?
            .iter()
            .find(|(seen, _)| core::ptr::eq(*seen, object))
            .map(|&(_, position)| position)
    }

    pub(crate) fn insert(&mut self, object: &'a T, position: usize) {
        self.by_address
            .entry(address_of(object))
            .or_default()
            .push((object, position));
    }
}

fn address_of<T: ?Sized>(object: &T) -> usize {
    core::ptr::from_ref(object).cast::<()>() as usize
}
