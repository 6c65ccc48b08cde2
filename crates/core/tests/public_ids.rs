//! Identifiers as seen from a dependent crate.

use std::collections::HashSet;

use cumulus_core::{LogEntry, LogLevel, ProcessId, RuntimeId, ValueId};
use pretty_assertions::assert_eq;

#[test]
fn ids_are_exported_and_generate_fresh_values() {
    let process = ProcessId::v4();
    let runtime = RuntimeId::v4();
    let values: HashSet<ValueId> = (0..16).map(|_| ValueId::v4()).collect();

    assert!(!process.is_nil());
    assert!(!runtime.is_nil());
    assert_eq!(values.len(), 16);
}

#[test]
fn log_entry_carries_exported_process_id() {
    let process = ProcessId::v4();
    let entry = LogEntry::new(process, LogLevel::Info, "ready");
    assert_eq!(entry.process_id, process);
    assert_eq!(
        ProcessId::parse(&process.to_string()).unwrap(),
        entry.process_id
    );
}
