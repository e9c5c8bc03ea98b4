//! Run orchestration: roster → back-propagation → push → report.
//!
//! One invocation is a single synchronous pass; steps run strictly in
//! sequence. The run is stateless and safe to abandon at any external-call
//! boundary — the next run recomputes everything from source data.

use tracing::{error, info, warn};

use crate::backprop::{BackPropagation, CardResolver};
use crate::error::CoreResult;
use crate::policy::SyncPolicy;
use crate::report::{PushResult, RunReport};
use crate::roster::{RosterAggregator, SourcePlan};
use crate::traits::{DirectoryClient, RemoteSyncClient, StaffClient};

/// Everything a run needs beyond the injected clients.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Ordered source queries.
    pub plan: SourcePlan,
    /// Normalized policy to transmit with the roster.
    pub policy: SyncPolicy,
    /// Back-propagation toggles.
    pub backprop: BackPropagation,
    /// Remote host, echoed in the report.
    pub host: String,
    /// Remote account name, echoed in the report.
    pub username: String,
}

/// One synchronization run over the injected collaborators.
pub struct SyncRun<'a> {
    directory: &'a dyn DirectoryClient,
    staff: &'a dyn StaffClient,
    remote: &'a dyn RemoteSyncClient,
}

impl<'a> SyncRun<'a> {
    /// Create a run over the three clients.
    #[must_use]
    pub fn new(
        directory: &'a dyn DirectoryClient,
        staff: &'a dyn StaffClient,
        remote: &'a dyn RemoteSyncClient,
    ) -> Self {
        Self {
            directory,
            staff,
            remote,
        }
    }

    /// Execute the run.
    ///
    /// Fatal errors (missing group, empty roster under fail-on-empty, card
    /// write failure) abort and propagate. A remote transport failure on
    /// either call does not: it is captured in the report and the run
    /// completes.
    pub async fn execute(&self, settings: &RunSettings) -> CoreResult<RunReport> {
        let roster = RosterAggregator::new(self.directory, self.staff)
            .build(&settings.plan)
            .await?;
        info!(
            count = roster.len(),
            mode = %settings.policy.mode,
            "assembled synchronization roster"
        );

        let mut card_writes = Vec::new();
        let mut card_query_failure = None;
        if settings.backprop.enabled() {
            match self.remote.query_cards().await {
                Ok(records) => {
                    card_writes = CardResolver::new(self.directory, self.staff)
                        .reconcile(&records, &settings.backprop)
                        .await?;
                    info!(
                        remote_records = records.len(),
                        writes = card_writes.len(),
                        "card back-propagation finished"
                    );
                }
                Err(failure) => {
                    warn!(
                        status = ?failure.status,
                        description = %failure.description,
                        "card query failed; skipping back-propagation"
                    );
                    card_query_failure = Some(failure);
                }
            }
        }

        let push = match self.remote.push(&roster, &settings.policy).await {
            Ok(outcome) => {
                for identity in outcome.added.iter().flatten() {
                    info!(pid = %identity.pid, name = %identity.display_name, "added");
                }
                for identity in outcome.updated.iter().flatten() {
                    info!(pid = %identity.pid, name = %identity.display_name, "updated");
                }
                for identity in outcome.deleted.iter().flatten() {
                    info!(pid = %identity.pid, name = %identity.display_name, "deleted");
                }
                for identity in outcome.ignored.iter().flatten() {
                    info!(pid = %identity.pid, name = %identity.display_name, "ignored");
                }
                if outcome.is_no_change() {
                    info!("remote service reported no change");
                }
                PushResult::Success(outcome)
            }
            Err(failure) => {
                error!(
                    status = ?failure.status,
                    description = %failure.description,
                    "synchronization push failed"
                );
                PushResult::Failure(failure)
            }
        };

        Ok(RunReport {
            policy: settings.policy.clone(),
            group: settings.plan.group.clone(),
            fail_on_empty: settings.plan.fail_on_empty,
            host: settings.host.clone(),
            username: settings.username.clone(),
            roster_size: roster.len(),
            push,
            card_query_failure,
            card_writes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backprop::WriteTarget;
    use crate::error::CoreError;
    use crate::fakes::{FakeDirectory, FakeRemote, FakeStaff};
    use crate::policy::{RawPolicy, SyncPolicy};
    use crate::traits::{DirectoryMember, RemoteCardRecord, StaffFilter, SyncFailure, SyncOutcome};

    fn member(account: &str) -> DirectoryMember {
        DirectoryMember {
            account: account.to_string(),
            display_name: format!("{account} display"),
            phone: None,
            enabled: true,
            staff_number: None,
            card: None,
        }
    }

    fn settings(fail_on_empty: bool, backprop: BackPropagation) -> RunSettings {
        RunSettings {
            plan: SourcePlan {
                group: "Care".to_string(),
                include_disabled: false,
                filters: Vec::<StaffFilter>::new(),
                fail_on_empty,
            },
            policy: SyncPolicy::from_raw(&RawPolicy {
                mode: "add".to_string(),
                ..Default::default()
            }),
            backprop,
            host: "https://acct.example".to_string(),
            username: "svc".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_run_builds_report() {
        let directory = FakeDirectory::with_group("Care", vec![member("alice")]);
        let staff = FakeStaff::new();
        let remote = FakeRemote::succeeding(SyncOutcome {
            added: Some(vec![crate::identity::Identity {
                pid: "AD-alice".to_string(),
                display_name: "alice display".to_string(),
                phone: None,
                card: None,
            }]),
            ..Default::default()
        });

        let report = SyncRun::new(&directory, &staff, &remote)
            .execute(&settings(true, BackPropagation::default()))
            .await
            .unwrap();

        assert_eq!(report.roster_size, 1);
        assert!(matches!(report.push, PushResult::Success(_)));
        assert_eq!(remote.pushed_pids(), vec![vec!["AD-alice".to_string()]]);
    }

    #[tokio::test]
    async fn empty_roster_aborts_before_any_remote_call() {
        let directory = FakeDirectory::with_group("Care", vec![]);
        let staff = FakeStaff::new();
        let remote = FakeRemote::succeeding(SyncOutcome::default());

        let err = SyncRun::new(&directory, &staff, &remote)
            .execute(&settings(
                true,
                BackPropagation {
                    write_directory: true,
                    ..Default::default()
                },
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NoCandidates));
        assert_eq!(remote.card_queries(), 0, "no remote call before the abort");
        assert!(remote.pushed_pids().is_empty());
    }

    #[tokio::test]
    async fn push_failure_is_reported_and_run_completes() {
        let directory = FakeDirectory::with_group("Care", vec![member("alice")]);
        let staff = FakeStaff::new();
        let remote = FakeRemote::failing(SyncFailure {
            status: Some(500),
            description: "Internal Server Error".to_string(),
            body: "boom".to_string(),
            headers: vec![("x-request-id".to_string(), "42".to_string())],
        });

        let report = SyncRun::new(&directory, &staff, &remote)
            .execute(&settings(true, BackPropagation::default()))
            .await
            .unwrap();

        let PushResult::Failure(failure) = &report.push else {
            panic!("expected push failure");
        };
        assert_eq!(failure.status, Some(500));
        assert_eq!(failure.body, "boom");
    }

    #[tokio::test]
    async fn backprop_runs_before_push() {
        let directory = FakeDirectory::with_group("Care", vec![member("alice")]);
        let staff = FakeStaff::new();
        let remote = FakeRemote::succeeding(SyncOutcome::default()).with_cards(vec![
            RemoteCardRecord {
                pid: "AD-alice".to_string(),
                card: "X1".to_string(),
            },
        ]);

        let report = SyncRun::new(&directory, &staff, &remote)
            .execute(&settings(
                true,
                BackPropagation {
                    write_directory: true,
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        assert_eq!(report.card_writes.len(), 1);
        assert_eq!(report.card_writes[0].target, WriteTarget::Directory);
        assert_eq!(directory.card_of("alice").as_deref(), Some("X1"));
    }

    #[tokio::test]
    async fn card_query_failure_skips_backprop_but_still_pushes() {
        let directory = FakeDirectory::with_group("Care", vec![member("alice")]);
        let staff = FakeStaff::new();
        let remote = FakeRemote::succeeding(SyncOutcome::default()).with_card_failure(
            SyncFailure {
                status: Some(503),
                description: "Service Unavailable".to_string(),
                body: String::new(),
                headers: vec![],
            },
        );

        let report = SyncRun::new(&directory, &staff, &remote)
            .execute(&settings(
                true,
                BackPropagation {
                    write_staff: true,
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        assert!(report.card_writes.is_empty());
        assert_eq!(
            report.card_query_failure.as_ref().and_then(|f| f.status),
            Some(503)
        );
        assert!(matches!(report.push, PushResult::Success(_)));
    }

    #[tokio::test]
    async fn backprop_disabled_never_queries_cards() {
        let directory = FakeDirectory::with_group("Care", vec![member("alice")]);
        let staff = FakeStaff::new();
        let remote = FakeRemote::succeeding(SyncOutcome::default());

        SyncRun::new(&directory, &staff, &remote)
            .execute(&settings(true, BackPropagation::default()))
            .await
            .unwrap();

        assert_eq!(remote.card_queries(), 0);
    }
}
