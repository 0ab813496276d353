//! Tool invocation correlation.
//!
//! Maps an invocation id to its [`ToolInvocationRecord`] for the active
//! session. Registration assigns a monotonically increasing, session-scoped
//! order; display order is always registration order, independent of when
//! (or in which batch) results arrive.
//!
//! The table is pure — it reports duplicate registrations and correlation
//! misses through [`RegisterOutcome`] / [`AttachOutcome`] instead of logging,
//! so the application layer owns the logging policy.

use std::collections::HashMap;

/// A single registered tool invocation.
///
/// Created when an assistant-turn event introduces the invocation request;
/// mutated at most once, when its matching result arrives.
#[derive(Debug, Clone)]
pub struct ToolInvocationRecord {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    /// Registration order, monotonic across the whole session.
    pub order: u64,
    pub result: Option<String>,
    pub is_error: bool,
}

impl ToolInvocationRecord {
    /// True once the matching result has been attached.
    pub fn is_resolved(&self) -> bool {
        self.result.is_some()
    }
}

/// Result of [`CorrelationTable::register`].
#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Fresh registration at the given order.
    Registered(u64),
    /// The id was already registered. The record was replaced but keeps
    /// its original order.
    Overwrote(u64),
}

impl RegisterOutcome {
    pub fn order(&self) -> u64 {
        match self {
            RegisterOutcome::Registered(order) | RegisterOutcome::Overwrote(order) => *order,
        }
    }
}

/// Result of [`CorrelationTable::attach_result`].
#[derive(Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Result attached to the record at the given order.
    Attached(u64),
    /// The record already carried a result; the record was left unchanged.
    AlreadyResolved(u64),
    /// No registration for this id — a correlation miss, dropped by policy.
    UnknownId,
}

/// Ephemeral id → invocation-record mapping with registration ordering.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    records: HashMap<String, ToolInvocationRecord>,
    next_sequence: u64,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invocation request and assign the next sequence number.
    ///
    /// A duplicate id replaces the old record but keeps its original order
    /// and does not consume a sequence number.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> RegisterOutcome {
        let id = id.into();
        if let Some(existing) = self.records.get(&id) {
            let order = existing.order;
            self.records.insert(
                id.clone(),
                ToolInvocationRecord {
                    id,
                    name: name.into(),
                    input,
                    order,
                    result: None,
                    is_error: false,
                },
            );
            return RegisterOutcome::Overwrote(order);
        }

        let order = self.next_sequence;
        self.next_sequence += 1;
        self.records.insert(
            id.clone(),
            ToolInvocationRecord {
                id,
                name: name.into(),
                input,
                order,
                result: None,
                is_error: false,
            },
        );
        RegisterOutcome::Registered(order)
    }

    /// Attach a result to its record, at most once.
    pub fn attach_result(
        &mut self,
        id: &str,
        content: impl Into<String>,
        is_error: bool,
    ) -> AttachOutcome {
        match self.records.get_mut(id) {
            None => AttachOutcome::UnknownId,
            Some(record) if record.is_resolved() => AttachOutcome::AlreadyResolved(record.order),
            Some(record) => {
                record.result = Some(content.into());
                record.is_error = is_error;
                AttachOutcome::Attached(record.order)
            }
        }
    }

    /// Look up a record by invocation id.
    pub fn record(&self, id: &str) -> Option<&ToolInvocationRecord> {
        self.records.get(id)
    }

    /// The order the next fresh registration will receive.
    pub fn next_order(&self) -> u64 {
        self.next_sequence
    }

    /// Drop resolved records at turn end, keeping in-flight invocations.
    ///
    /// Returns the number of records pruned. Bounds table growth over long
    /// sessions without evicting anything a late batch could still reference.
    pub fn end_of_turn_prune(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_resolved());
        before - self.records.len()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> serde_json::Value {
        serde_json::json!({})
    }

    #[test]
    fn registration_order_is_monotonic() {
        let mut table = CorrelationTable::new();
        assert_eq!(table.register("t1", "read", input()), RegisterOutcome::Registered(0));
        assert_eq!(table.register("t2", "write", input()), RegisterOutcome::Registered(1));
        assert_eq!(table.register("t3", "grep", input()), RegisterOutcome::Registered(2));
    }

    #[test]
    fn duplicate_registration_overwrites_but_keeps_order() {
        let mut table = CorrelationTable::new();
        table.register("t1", "read", input());
        table.register("t2", "write", input());
        let outcome = table.register("t1", "read_v2", input());
        assert_eq!(outcome, RegisterOutcome::Overwrote(0));
        let record = table.record("t1").unwrap();
        assert_eq!(record.name, "read_v2");
        assert_eq!(record.order, 0);
        // Sequence is not consumed by the overwrite
        assert_eq!(table.register("t3", "grep", input()), RegisterOutcome::Registered(2));
        assert_eq!(table.next_order(), 3);
    }

    #[test]
    fn attach_to_unknown_id_is_a_miss() {
        let mut table = CorrelationTable::new();
        assert_eq!(table.attach_result("t99", "out", false), AttachOutcome::UnknownId);
        assert!(table.is_empty());
    }

    #[test]
    fn attach_happens_at_most_once() {
        let mut table = CorrelationTable::new();
        table.register("t1", "read", input());
        assert_eq!(table.attach_result("t1", "first", false), AttachOutcome::Attached(0));
        assert_eq!(
            table.attach_result("t1", "second", true),
            AttachOutcome::AlreadyResolved(0)
        );
        let record = table.record("t1").unwrap();
        assert_eq!(record.result.as_deref(), Some("first"));
        assert!(!record.is_error);
    }

    #[test]
    fn prune_drops_resolved_and_keeps_open_records() {
        let mut table = CorrelationTable::new();
        table.register("t1", "read", input());
        table.register("t2", "write", input());
        table.attach_result("t1", "done", false);

        assert_eq!(table.end_of_turn_prune(), 1);
        assert!(table.record("t1").is_none());
        assert!(table.record("t2").is_some());

        // Orders continue after the prune, session-scoped
        assert_eq!(table.register("t3", "grep", input()), RegisterOutcome::Registered(2));
    }
}
