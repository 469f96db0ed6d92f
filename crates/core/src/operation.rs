//! Operations
//!
//! An operation is an atomic, immutable description of one mutation to a
//! record: the record it targets, the path inside the record's value tree,
//! and the command to apply there. Operations are the unit that transactions
//! batch, the cache applies optimistically, and the delivery queue ships to
//! the remote authority, so every kind must round-trip losslessly through
//! the JSON wire format.

use crate::path::RecordPath;
use crate::record::{Pointer, Role, Table};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a list insertion lands relative to existing elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPosition {
    /// Prepend to the list
    Start,
    /// Append to the list
    End,
    /// Insert immediately before the first element equal to the anchor
    Before {
        /// Anchor element to insert before
        anchor: Value,
    },
    /// Insert immediately after the first element equal to the anchor
    After {
        /// Anchor element to insert after
        anchor: Value,
    },
}

/// The mutation a single operation performs at its path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Set the value at the path, replacing whatever is there
    Set {
        /// Value to install
        value: Value,
    },
    /// Shallow-merge a map into the map at the path
    Update {
        /// Entries to merge; existing keys are overwritten
        value: BTreeMap<String, Value>,
    },
    /// Insert into the list at the path
    ListInsert {
        /// Element to insert
        value: Value,
        /// Insertion position
        position: ListPosition,
    },
    /// Remove the first element equal to `value` from the list at the path
    ListRemove {
        /// Element to remove
        value: Value,
    },
    /// Delete the key or element at the path
    Delete,
    /// Replace the record's access role
    SetRole {
        /// New role
        role: Role,
    },
}

impl Command {
    /// Short wire-style name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "set",
            Command::Update { .. } => "update",
            Command::ListInsert { .. } => "list_insert",
            Command::ListRemove { .. } => "list_remove",
            Command::Delete => "delete",
            Command::SetRole { .. } => "set_role",
        }
    }
}

/// An atomic, serializable mutation descriptor
///
/// Immutable once created. The `(table, id)` pair names the record; `path`
/// names the location inside it; `command` says what happens there. The path
/// must resolve to a location compatible with the command (list commands
/// require a list, `Update` requires a map); the reducer checks this when
/// the operation is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Logical table of the target record
    pub table: Table,
    /// Target record id
    pub id: String,
    /// Path inside the record's value tree
    pub path: RecordPath,
    /// Mutation to apply at the path
    #[serde(flatten)]
    pub command: Command,
}

impl Operation {
    /// Create an operation
    pub fn new(table: Table, id: impl Into<String>, path: RecordPath, command: Command) -> Self {
        Operation {
            table,
            id: id.into(),
            path,
            command,
        }
    }

    /// Create an operation addressed by pointer
    pub fn at(pointer: Pointer, path: RecordPath, command: Command) -> Self {
        Operation {
            table: pointer.table,
            id: pointer.id,
            path,
            command,
        }
    }

    /// The pointer of the record this operation targets
    pub fn pointer(&self) -> Pointer {
        Pointer::new(self.table.clone(), self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_title() -> Operation {
        Operation::new(
            Table::Page,
            "p-1",
            RecordPath::root().key("title"),
            Command::Set {
                value: Value::from("Hello"),
            },
        )
    }

    #[test]
    fn test_pointer_derivation() {
        let op = set_title();
        assert_eq!(op.pointer(), Pointer::new(Table::Page, "p-1"));
    }

    #[test]
    fn test_wire_roundtrip() {
        let ops = vec![
            set_title(),
            Operation::new(
                Table::Block,
                "b-1",
                RecordPath::root().key("content"),
                Command::ListInsert {
                    value: Value::from("b-2"),
                    position: ListPosition::After {
                        anchor: Value::from("b-1"),
                    },
                },
            ),
            Operation::new(
                Table::Block,
                "b-1",
                RecordPath::root().key("archived"),
                Command::Delete,
            ),
            Operation::new(
                Table::Page,
                "p-1",
                RecordPath::root(),
                Command::SetRole { role: Role::Reader },
            ),
        ];
        for op in ops {
            let encoded = serde_json::to_string(&op).unwrap();
            let decoded: Operation = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, op);
        }
    }

    #[test]
    fn test_wire_shape() {
        let encoded = serde_json::to_value(set_title()).unwrap();
        assert_eq!(encoded["table"], "page");
        assert_eq!(encoded["command"], "set");
        assert_eq!(encoded["value"], "Hello");
    }

    #[test]
    fn test_command_names() {
        assert_eq!(set_title().command.name(), "set");
        assert_eq!(Command::Delete.name(), "delete");
    }
}
