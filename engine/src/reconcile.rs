//! Reconciliation of a remote batch with the local quote list.
//!
//! The baseline rule is "server wins": a remote record replaces any local
//! record with the same `text`.
//!
//! # Algorithm
//!
//! 1. Drop remote records whose `text` repeats an earlier remote record
//! 2. Ask the resolver about id conflicts (same `id`, different `text`), if it
//!    wants to be asked
//! 3. Emit every kept remote record, in remote order
//! 4. Append every kept local record whose `text` no kept remote record has,
//!    in local order
//! 5. Compare the result with the local list as a multiset of records
//!
//! Running the same batch twice is a no-op the second time.

use crate::QuoteRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How an id conflict was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// Keep the local record and ignore the remote one
    KeepLocal,
    /// Keep the remote record and drop the local one
    KeepServer,
}

/// A local and a remote record sharing an `id` but not a `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// The local version
    pub local: QuoteRecord,
    /// The remote version
    pub remote: QuoteRecord,
    /// What the resolver decided
    pub resolution: Resolution,
}

/// Decides id conflicts during reconciliation.
///
/// The text rule always applies. A resolver only widens it: when
/// [`detects_id_conflicts`](ConflictResolver::detects_id_conflicts) is true
/// it is consulted for every remote record whose `id` matches a local record
/// with a different `text`.
pub trait ConflictResolver {
    /// Whether id conflicts should be surfaced to [`resolve`](Self::resolve).
    fn detects_id_conflicts(&self) -> bool {
        true
    }

    /// Settle one conflict.
    fn resolve(&mut self, local: &QuoteRecord, remote: &QuoteRecord) -> Resolution;
}

/// The baseline rule: remote records win on `text`, ids are not compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerWins;

impl ConflictResolver for ServerWins {
    fn detects_id_conflicts(&self) -> bool {
        false
    }

    fn resolve(&mut self, _local: &QuoteRecord, _remote: &QuoteRecord) -> Resolution {
        Resolution::KeepServer
    }
}

/// Settles every id conflict the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedResolution(pub Resolution);

impl ConflictResolver for FixedResolution {
    fn resolve(&mut self, _local: &QuoteRecord, _remote: &QuoteRecord) -> Resolution {
        self.0
    }
}

/// Hands each id conflict to a callback, typically a prompt to the user.
pub struct ManualResolver<F> {
    decide: F,
}

impl<F> ManualResolver<F>
where
    F: FnMut(&QuoteRecord, &QuoteRecord) -> Resolution,
{
    /// Wrap a `(local, remote) -> Resolution` callback.
    pub fn new(decide: F) -> Self {
        Self { decide }
    }
}

impl<F> ConflictResolver for ManualResolver<F>
where
    F: FnMut(&QuoteRecord, &QuoteRecord) -> Resolution,
{
    fn resolve(&mut self, local: &QuoteRecord, remote: &QuoteRecord) -> Resolution {
        (self.decide)(local, remote)
    }
}

impl<R: ConflictResolver + ?Sized> ConflictResolver for &mut R {
    fn detects_id_conflicts(&self) -> bool {
        (**self).detects_id_conflicts()
    }

    fn resolve(&mut self, local: &QuoteRecord, remote: &QuoteRecord) -> Resolution {
        (**self).resolve(local, remote)
    }
}

/// Result of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    /// The merged list: kept remote records, then surviving local ones
    pub merged: Vec<QuoteRecord>,
    /// Whether `merged` differs in content from the local list
    pub changed: bool,
    /// Remote records that made it into `merged`
    pub applied_remote: usize,
    /// Local records overwritten by a remote record with the same text
    pub replaced_local: Vec<QuoteRecord>,
    /// Id conflicts the resolver was asked about
    pub conflicts: Vec<Conflict>,
}

/// Merges remote batches into local lists.
pub struct Reconciler<R = ServerWins> {
    resolver: R,
}

impl Default for Reconciler<ServerWins> {
    fn default() -> Self {
        Self::new(ServerWins)
    }
}

impl<R: ConflictResolver> Reconciler<R> {
    /// Create a reconciler using `resolver` for id conflicts.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Consume the reconciler and return its resolver.
    pub fn into_resolver(self) -> R {
        self.resolver
    }

    /// Merge `remote` into `local`.
    pub fn reconcile(&mut self, local: &[QuoteRecord], remote: &[QuoteRecord]) -> ReconcileResult {
        let remote = dedup_by_text(remote);

        let mut dropped_local = vec![false; local.len()];
        let mut dropped_remote = vec![false; remote.len()];
        let mut conflicts = Vec::new();

        if self.resolver.detects_id_conflicts() {
            let remote_texts: HashSet<&str> = remote.iter().map(|r| r.text.as_str()).collect();

            for (ri, remote_record) in remote.iter().enumerate() {
                let Some(id) = remote_record.id else {
                    continue;
                };

                for (li, local_record) in local.iter().enumerate() {
                    // A local record whose text the batch carries is replaced anyway
                    if dropped_local[li]
                        || local_record.id != Some(id)
                        || local_record.text == remote_record.text
                        || remote_texts.contains(local_record.text.as_str())
                    {
                        continue;
                    }

                    let resolution = self.resolver.resolve(local_record, remote_record);
                    match resolution {
                        Resolution::KeepLocal => dropped_remote[ri] = true,
                        Resolution::KeepServer => dropped_local[li] = true,
                    }
                    conflicts.push(Conflict {
                        local: local_record.clone(),
                        remote: (*remote_record).clone(),
                        resolution,
                    });

                    if dropped_remote[ri] {
                        break;
                    }
                }
            }
        }

        let kept_remote: Vec<&QuoteRecord> = remote
            .iter()
            .zip(&dropped_remote)
            .filter(|(_, dropped)| !**dropped)
            .map(|(record, _)| *record)
            .collect();
        let kept_texts: HashSet<&str> = kept_remote.iter().map(|r| r.text.as_str()).collect();

        let mut merged: Vec<QuoteRecord> = kept_remote.iter().map(|r| (*r).clone()).collect();
        let mut replaced_local = Vec::new();

        for (record, dropped) in local.iter().zip(&dropped_local) {
            if *dropped {
                continue;
            }
            if kept_texts.contains(record.text.as_str()) {
                if !kept_remote.iter().any(|r| *r == record) {
                    replaced_local.push(record.clone());
                }
                continue;
            }
            merged.push(record.clone());
        }

        let changed = !same_content(local, &merged);

        ReconcileResult {
            applied_remote: kept_remote.len(),
            merged,
            changed,
            replaced_local,
            conflicts,
        }
    }
}

/// Reconcile with the baseline server-wins rule.
pub fn reconcile(local: &[QuoteRecord], remote: &[QuoteRecord]) -> ReconcileResult {
    Reconciler::default().reconcile(local, remote)
}

/// Keep the first record for every `text`.
fn dedup_by_text(records: &[QuoteRecord]) -> Vec<&QuoteRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.text.as_str()) {
            kept.push(record);
        }
    }
    kept
}

/// Whether two lists hold the same records, ignoring order.
pub fn same_content(a: &[QuoteRecord], b: &[QuoteRecord]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&QuoteRecord> = a.iter().collect();
    let mut b: Vec<&QuoteRecord> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}
