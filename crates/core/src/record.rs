//! Records, pointers, and roles
//!
//! A record is one versioned snapshot of a document/table-row: its value tree
//! plus the access role the current user holds on it. Records are addressed
//! by a composite pointer `(table, id)`.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical table a record belongs to
///
/// The closed set covers the block-document model; `Custom` carries anything
/// a newer peer might send without breaking deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Top-level page documents
    Page,
    /// Content blocks within a page
    Block,
    /// Block collections (databases/boards)
    Collection,
    /// Workspaces
    Space,
    /// Forward-compatible escape hatch
    #[serde(untagged)]
    Custom(String),
}

impl Table {
    /// Wire name of this table
    pub fn as_str(&self) -> &str {
        match self {
            Table::Page => "page",
            Table::Block => "block",
            Table::Collection => "collection",
            Table::Space => "space",
            Table::Custom(name) => name,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite record address: logical table plus record id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    /// Logical table
    pub table: Table,
    /// Record id within the table
    pub id: String,
}

impl Pointer {
    /// Create a pointer
    pub fn new(table: Table, id: impl Into<String>) -> Self {
        Pointer {
            table,
            id: id.into(),
        }
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.id)
    }
}

/// Access role a user holds on a record
///
/// Roles gate mutation: only `Editor` may apply operations. `None` means the
/// record is invisible to the user (reads resolve, but carry no capability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full read/write access
    Editor,
    /// Read-only access
    Reader,
    /// No access
    None,
}

impl Role {
    /// Whether this role permits mutation
    pub fn can_edit(self) -> bool {
        matches!(self, Role::Editor)
    }
}

/// One versioned snapshot of a record: value tree plus access role
///
/// The default record is an empty map owned by an `Editor`: the shape a
/// record takes when it is first materialized by a cache miss before any
/// operation has touched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The record's value tree
    pub value: Value,
    /// Access role attached to this snapshot
    pub role: Role,
}

impl Record {
    /// Create a record from parts
    pub fn new(value: Value, role: Role) -> Self {
        Record { value, role }
    }

    /// Whether the attached role permits mutation
    pub fn can_edit(&self) -> bool {
        self.role.can_edit()
    }
}

impl Default for Record {
    fn default() -> Self {
        Record {
            value: Value::map(),
            role: Role::Editor,
        }
    }
}
