//! In-memory collaborator fakes shared by the engine's tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::policy::SyncPolicy;
use crate::roster::Roster;
use crate::traits::{
    DirectoryClient, DirectoryMember, RemoteCardRecord, RemoteSyncClient, StaffClient,
    StaffEmployee, StaffFilter, SyncFailure, SyncOutcome,
};

/// Directory fake: one known group plus lookup and card writes over the
/// same member list.
pub struct FakeDirectory {
    group: Option<String>,
    members: Mutex<Vec<DirectoryMember>>,
}

impl FakeDirectory {
    /// Members reachable both through the named group and by lookup.
    pub fn with_group(group: &str, members: Vec<DirectoryMember>) -> Self {
        Self {
            group: Some(group.to_string()),
            members: Mutex::new(members),
        }
    }

    /// Members reachable by lookup only; every group query fails.
    pub fn with_members(members: Vec<DirectoryMember>) -> Self {
        Self {
            group: None,
            members: Mutex::new(members),
        }
    }

    /// Current card value of an account.
    pub fn card_of(&self, account: &str) -> Option<String> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.account == account)
            .and_then(|m| m.card.clone())
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn group_members(&self, group: &str) -> Result<Vec<DirectoryMember>, SourceError> {
        if self.group.as_deref() == Some(group) {
            Ok(self.members.lock().unwrap().clone())
        } else {
            Err(SourceError::GroupNotFound {
                group: group.to_string(),
            })
        }
    }

    async fn find_member(&self, account: &str) -> Result<Option<DirectoryMember>, SourceError> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.account == account)
            .cloned())
    }

    async fn write_card(&self, account: &str, card: &str) -> Result<(), SourceError> {
        let mut members = self.members.lock().unwrap();
        let member = members
            .iter_mut()
            .find(|m| m.account == account)
            .ok_or_else(|| SourceError::backend(format!("no such account: {account}")))?;
        member.card = Some(card.to_string());
        Ok(())
    }
}

/// Staff fake: per-filter result sets, configurable per-filter failures,
/// lookup and card writes over a flat employee list.
pub struct FakeStaff {
    by_filter: Vec<(StaffFilter, Vec<StaffEmployee>)>,
    failing: Vec<StaffFilter>,
    employees: Mutex<Vec<StaffEmployee>>,
}

impl FakeStaff {
    pub fn new() -> Self {
        Self {
            by_filter: Vec::new(),
            failing: Vec::new(),
            employees: Mutex::new(Vec::new()),
        }
    }

    /// Register the result set of one filter; the employees also become
    /// reachable by lookup.
    pub fn with_results(mut self, filter: StaffFilter, employees: Vec<StaffEmployee>) -> Self {
        self.employees.lock().unwrap().extend(employees.clone());
        self.by_filter.push((filter, employees));
        self
    }

    /// Make one filter fail with a recoverable query error.
    pub fn with_failure(mut self, filter: StaffFilter) -> Self {
        self.failing.push(filter);
        self
    }

    /// Add employees reachable by lookup only.
    pub fn with_employees(self, employees: Vec<StaffEmployee>) -> Self {
        self.employees.lock().unwrap().extend(employees);
        self
    }

    /// Current card value of a record.
    pub fn card_of(&self, staff_number: &str) -> Option<String> {
        self.employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.staff_number == staff_number)
            .and_then(|e| e.card.clone())
    }
}

#[async_trait]
impl StaffClient for FakeStaff {
    async fn query(&self, filter: &StaffFilter) -> Result<Vec<StaffEmployee>, SourceError> {
        if self.failing.contains(filter) {
            return Err(SourceError::query(format!("configured failure for {filter}")));
        }
        Ok(self
            .by_filter
            .iter()
            .find(|(f, _)| f == filter)
            .map(|(_, employees)| employees.clone())
            .unwrap_or_default())
    }

    async fn find_by_number(
        &self,
        staff_number: &str,
    ) -> Result<Option<StaffEmployee>, SourceError> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.staff_number == staff_number)
            .cloned())
    }

    async fn write_card(&self, staff_number: &str, card: &str) -> Result<(), SourceError> {
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .iter_mut()
            .find(|e| e.staff_number == staff_number)
            .ok_or_else(|| SourceError::backend(format!("no such record: {staff_number}")))?;
        employee.card = Some(card.to_string());
        Ok(())
    }
}

/// Remote fake: canned push result and card list, with call recording.
pub struct FakeRemote {
    push_result: Result<SyncOutcome, SyncFailure>,
    cards: Result<Vec<RemoteCardRecord>, SyncFailure>,
    pushed: Mutex<Vec<Vec<String>>>,
    card_queries: Mutex<usize>,
}

impl FakeRemote {
    pub fn succeeding(outcome: SyncOutcome) -> Self {
        Self {
            push_result: Ok(outcome),
            cards: Ok(Vec::new()),
            pushed: Mutex::new(Vec::new()),
            card_queries: Mutex::new(0),
        }
    }

    pub fn failing(failure: SyncFailure) -> Self {
        Self {
            push_result: Err(failure),
            cards: Ok(Vec::new()),
            pushed: Mutex::new(Vec::new()),
            card_queries: Mutex::new(0),
        }
    }

    pub fn with_cards(mut self, cards: Vec<RemoteCardRecord>) -> Self {
        self.cards = Ok(cards);
        self
    }

    pub fn with_card_failure(mut self, failure: SyncFailure) -> Self {
        self.cards = Err(failure);
        self
    }

    /// Pids of every pushed roster, in push order.
    pub fn pushed_pids(&self) -> Vec<Vec<String>> {
        self.pushed.lock().unwrap().clone()
    }

    /// How many times the card list was queried.
    pub fn card_queries(&self) -> usize {
        *self.card_queries.lock().unwrap()
    }
}

#[async_trait]
impl RemoteSyncClient for FakeRemote {
    async fn push(
        &self,
        roster: &Roster,
        _policy: &SyncPolicy,
    ) -> Result<SyncOutcome, SyncFailure> {
        self.pushed.lock().unwrap().push(
            roster
                .identities()
                .iter()
                .map(|i| i.pid.clone())
                .collect(),
        );
        self.push_result.clone()
    }

    async fn query_cards(&self) -> Result<Vec<RemoteCardRecord>, SyncFailure> {
        *self.card_queries.lock().unwrap() += 1;
        self.cards.clone()
    }
}
