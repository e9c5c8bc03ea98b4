//! # acsync core engine
//!
//! Identity aggregation, deduplication, and card reconciliation for
//! physical-access-control provisioning.
//!
//! The engine merges candidate identities from an internal directory group
//! and a sequence of staff-directory filter queries into one deduplicated,
//! precedence-ordered roster, pushes it with a policy to a remote
//! access-control service, and back-propagates card identifiers the remote
//! service assigned into the two source-of-record systems.
//!
//! Every external system sits behind an injected trait ([`DirectoryClient`],
//! [`StaffClient`], [`RemoteSyncClient`], [`Notifier`]); the engine itself
//! performs no I/O and holds no state between runs.
//!
//! ## Crate organization
//!
//! - [`identity`] - identity model, namespaces, source-record normalization
//! - [`roster`] - ordered source queries and first-seen deduplication
//! - [`policy`] - synchronization policy encoder
//! - [`backprop`] - card back-propagation resolver
//! - [`run`] - run orchestration
//! - [`report`] - structured run outcome
//! - [`traits`] - collaborator interfaces
//! - [`error`] - error taxonomy

pub mod backprop;
pub mod error;
pub mod identity;
pub mod policy;
pub mod report;
pub mod roster;
pub mod run;
pub mod traits;

#[cfg(test)]
pub(crate) mod fakes;

pub use backprop::{BackPropagation, CardResolver, CardWrite, WriteTarget};
pub use error::{CoreError, CoreResult, SourceError};
pub use identity::{Identity, Namespace};
pub use policy::{EvaluationMode, RawPolicy, SyncPolicy};
pub use report::{PushResult, RunReport};
pub use roster::{Roster, RosterAggregator, SourcePlan};
pub use run::{RunSettings, SyncRun};
pub use traits::{
    DirectoryClient, DirectoryMember, Notifier, NotifyError, RemoteCardRecord, RemoteSyncClient,
    StaffClient, StaffEmployee, StaffFilter, SyncFailure, SyncOutcome,
};

// Re-export for trait implementors.
pub use async_trait::async_trait;
