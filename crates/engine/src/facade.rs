//! The command facade: a pure reducer over records
//!
//! `CommandFacade::execute` takes an operation and the current record
//! snapshot and produces the next snapshot. It consults nothing else and
//! mutates nothing: the same inputs always give the same output, so an
//! optimistic local apply and a later authoritative replay land on identical
//! state.
//!
//! Authorization happens here, exactly once per operation, before any shape
//! checks: a role that cannot edit yields [`Applied::Rejected`], a value the
//! batch layer decides on rather than an error. Malformed operations (paths that do
//! not resolve, list commands against non-lists) are errors and are fatal to
//! the transaction being built.

use folio_core::{
    Command, Error, ListPosition, Operation, PathSegment, Record, RecordPath, RejectReason,
    Result, Role, Value,
};

/// Outcome of applying one operation to a record snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The operation applied; here is the next snapshot
    Applied(Record),
    /// Authorization refused the operation; the record is unchanged
    Rejected(RejectReason),
}

/// Pure reducer applying operations to record snapshots
pub struct CommandFacade;

impl CommandFacade {
    /// Apply `operation` to `record`, producing the next record snapshot
    ///
    /// The input record is never modified. The returned record preserves the
    /// role untouched unless the operation is `SetRole`.
    pub fn execute(operation: &Operation, record: &Record) -> Result<Applied> {
        // Single authorization gate for the whole reducer.
        match record.role {
            Role::Editor => {}
            Role::None => return Ok(Applied::Rejected(RejectReason::NoAccess)),
            role => {
                return Ok(Applied::Rejected(RejectReason::ReadOnlyRecord { role }));
            }
        }

        let mut next = record.clone();
        match &operation.command {
            Command::Set { value } => {
                set_at_path(&mut next.value, &operation.path, value.clone())?;
            }
            Command::Update { value } => {
                let target = resolve_mut(&mut next.value, &operation.path)?;
                let entries = match target {
                    Value::Map(entries) => entries,
                    other => {
                        return Err(Error::TypeMismatch {
                            path: operation.path.clone(),
                            expected: "map",
                            found: other.type_name(),
                        })
                    }
                };
                for (key, item) in value {
                    entries.insert(key.clone(), item.clone());
                }
            }
            Command::ListInsert { value, position } => {
                let items = resolve_list_mut(&mut next.value, &operation.path)?;
                let index = match position {
                    ListPosition::Start => 0,
                    ListPosition::End => items.len(),
                    ListPosition::Before { anchor } => {
                        position_of(items, anchor, &operation.path)?
                    }
                    ListPosition::After { anchor } => {
                        position_of(items, anchor, &operation.path)? + 1
                    }
                };
                items.insert(index, value.clone());
            }
            Command::ListRemove { value } => {
                let items = resolve_list_mut(&mut next.value, &operation.path)?;
                let index = position_of(items, value, &operation.path)?;
                items.remove(index);
            }
            Command::Delete => {
                delete_at_path(&mut next.value, &operation.path)?;
            }
            Command::SetRole { role } => {
                next.role = *role;
            }
        }
        Ok(Applied::Applied(next))
    }
}

fn position_of(items: &[Value], anchor: &Value, path: &RecordPath) -> Result<usize> {
    items
        .iter()
        .position(|item| item == anchor)
        .ok_or_else(|| Error::AnchorNotFound { path: path.clone() })
}

/// Resolve a path to a mutable value, failing where it does not resolve
fn resolve_mut<'a>(value: &'a mut Value, path: &RecordPath) -> Result<&'a mut Value> {
    let mut current = value;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Map(entries)) => {
                entries.get_mut(key).ok_or_else(|| Error::PathNotFound {
                    path: prefix(path, depth + 1),
                })?
            }
            (PathSegment::Index(idx), Value::List(items)) => {
                let len = items.len();
                items.get_mut(*idx).ok_or(Error::IndexOutOfBounds { index: *idx, len })?
            }
            (PathSegment::Key(_), other) => {
                return Err(Error::TypeMismatch {
                    path: prefix(path, depth),
                    expected: "map",
                    found: other.type_name(),
                })
            }
            (PathSegment::Index(_), other) => {
                return Err(Error::TypeMismatch {
                    path: prefix(path, depth),
                    expected: "list",
                    found: other.type_name(),
                })
            }
        };
    }
    Ok(current)
}

fn resolve_list_mut<'a>(value: &'a mut Value, path: &RecordPath) -> Result<&'a mut Vec<Value>> {
    match resolve_mut(value, path)? {
        Value::List(items) => Ok(items),
        other => Err(Error::TypeMismatch {
            path: path.clone(),
            expected: "list",
            found: other.type_name(),
        }),
    }
}

fn prefix(path: &RecordPath, len: usize) -> RecordPath {
    RecordPath::from_segments(path.segments().iter().take(len).cloned())
}

/// Set `value` at `path`, creating intermediate containers as needed
///
/// The type of each created intermediate (map vs list) is determined by the
/// next segment in the path. A list index may point one past the end, which
/// appends.
fn set_at_path(root: &mut Value, path: &RecordPath, value: Value) -> Result<()> {
    if path.is_root() {
        *root = value;
        return Ok(());
    }

    let segments = path.segments();
    let (parent_segments, last_segment) = segments.split_at(segments.len() - 1);
    let last_segment = &last_segment[0];

    let mut current = root;
    for (depth, segment) in parent_segments.iter().enumerate() {
        let next_segment = &segments[depth + 1];
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Map(entries)) => {
                entries.entry(key.clone()).or_insert_with(|| match next_segment {
                    PathSegment::Key(_) => Value::map(),
                    PathSegment::Index(_) => Value::list(),
                })
            }
            (PathSegment::Index(idx), Value::List(items)) => {
                let len = items.len();
                items.get_mut(*idx).ok_or(Error::IndexOutOfBounds { index: *idx, len })?
            }
            (PathSegment::Key(_), other) => {
                return Err(Error::TypeMismatch {
                    path: prefix(path, depth),
                    expected: "map",
                    found: other.type_name(),
                })
            }
            (PathSegment::Index(_), other) => {
                return Err(Error::TypeMismatch {
                    path: prefix(path, depth),
                    expected: "list",
                    found: other.type_name(),
                })
            }
        };
    }

    match (last_segment, current) {
        (PathSegment::Key(key), Value::Map(entries)) => {
            entries.insert(key.clone(), value);
            Ok(())
        }
        (PathSegment::Index(idx), Value::List(items)) => {
            if *idx < items.len() {
                items[*idx] = value;
                Ok(())
            } else if *idx == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(Error::IndexOutOfBounds {
                    index: *idx,
                    len: items.len(),
                })
            }
        }
        (PathSegment::Key(_), other) => Err(Error::TypeMismatch {
            path: path.parent().unwrap_or_default(),
            expected: "map",
            found: other.type_name(),
        }),
        (PathSegment::Index(_), other) => Err(Error::TypeMismatch {
            path: path.parent().unwrap_or_default(),
            expected: "list",
            found: other.type_name(),
        }),
    }
}

/// Delete the key or element at `path`; deleting the root clears it to null
fn delete_at_path(root: &mut Value, path: &RecordPath) -> Result<()> {
    if path.is_root() {
        *root = Value::Null;
        return Ok(());
    }

    let parent_path = path.parent().unwrap_or_default();
    let parent = resolve_mut(root, &parent_path)?;
    let last_segment = path.last_segment().expect("non-root path has a last segment");

    match (last_segment, parent) {
        (PathSegment::Key(key), Value::Map(entries)) => {
            entries.remove(key).ok_or_else(|| Error::PathNotFound {
                path: path.clone(),
            })?;
            Ok(())
        }
        (PathSegment::Index(idx), Value::List(items)) => {
            if *idx < items.len() {
                items.remove(*idx);
                Ok(())
            } else {
                Err(Error::IndexOutOfBounds {
                    index: *idx,
                    len: items.len(),
                })
            }
        }
        (PathSegment::Key(_), other) => Err(Error::TypeMismatch {
            path: parent_path,
            expected: "map",
            found: other.type_name(),
        }),
        (PathSegment::Index(_), other) => Err(Error::TypeMismatch {
            path: parent_path,
            expected: "list",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Table;
    use std::collections::BTreeMap;

    fn editor_record() -> Record {
        let mut root = BTreeMap::new();
        root.insert("title".to_string(), Value::from("Hello"));
        root.insert(
            "content".to_string(),
            Value::List(vec![Value::from("b-1"), Value::from("b-2")]),
        );
        Record::new(Value::Map(root), Role::Editor)
    }

    fn op(path: &str, command: Command) -> Operation {
        Operation::new(Table::Page, "p-1", path.parse().unwrap(), command)
    }

    fn apply(operation: &Operation, record: &Record) -> Record {
        match CommandFacade::execute(operation, record).unwrap() {
            Applied::Applied(next) => next,
            Applied::Rejected(reason) => panic!("unexpected rejection: {reason}"),
        }
    }

    #[test]
    fn test_set_replaces_value() {
        let record = editor_record();
        let next = apply(
            &op("title", Command::Set { value: Value::from("World") }),
            &record,
        );
        assert_eq!(next.value.as_map().unwrap()["title"], Value::from("World"));
        // Input snapshot untouched.
        assert_eq!(record.value.as_map().unwrap()["title"], Value::from("Hello"));
    }

    #[test]
    fn test_set_creates_intermediates() {
        let next = apply(
            &op(
                "properties.format.color",
                Command::Set { value: Value::from("red") },
            ),
            &editor_record(),
        );
        let color = next.value.as_map().unwrap()["properties"].as_map().unwrap()["format"]
            .as_map()
            .unwrap()["color"]
            .clone();
        assert_eq!(color, Value::from("red"));
    }

    #[test]
    fn test_update_merges_map() {
        let mut merge = BTreeMap::new();
        merge.insert("title".to_string(), Value::from("Merged"));
        merge.insert("icon".to_string(), Value::from("📄"));
        let next = apply(&op("", Command::Update { value: merge }), &editor_record());

        let entries = next.value.as_map().unwrap();
        assert_eq!(entries["title"], Value::from("Merged"));
        assert_eq!(entries["icon"], Value::from("📄"));
        // Untouched keys survive.
        assert!(entries.contains_key("content"));
    }

    #[test]
    fn test_update_requires_map() {
        let err = CommandFacade::execute(
            &op("title", Command::Update { value: BTreeMap::new() }),
            &editor_record(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: "map", .. }));
    }

    #[test]
    fn test_list_insert_positions() {
        let record = editor_record();

        let next = apply(
            &op(
                "content",
                Command::ListInsert {
                    value: Value::from("b-0"),
                    position: ListPosition::Start,
                },
            ),
            &record,
        );
        assert_eq!(
            next.value.as_map().unwrap()["content"].as_list().unwrap()[0],
            Value::from("b-0")
        );

        let next = apply(
            &op(
                "content",
                Command::ListInsert {
                    value: Value::from("b-1.5"),
                    position: ListPosition::After { anchor: Value::from("b-1") },
                },
            ),
            &record,
        );
        let items = next.value.as_map().unwrap()["content"].as_list().unwrap();
        assert_eq!(items[1], Value::from("b-1.5"));

        let next = apply(
            &op(
                "content",
                Command::ListInsert {
                    value: Value::from("b-0.5"),
                    position: ListPosition::Before { anchor: Value::from("b-1") },
                },
            ),
            &record,
        );
        let items = next.value.as_map().unwrap()["content"].as_list().unwrap();
        assert_eq!(items[0], Value::from("b-0.5"));
    }

    #[test]
    fn test_list_insert_requires_list() {
        let err = CommandFacade::execute(
            &op(
                "title",
                Command::ListInsert {
                    value: Value::from("x"),
                    position: ListPosition::End,
                },
            ),
            &editor_record(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: "list", .. }));
    }

    #[test]
    fn test_list_insert_missing_anchor() {
        let err = CommandFacade::execute(
            &op(
                "content",
                Command::ListInsert {
                    value: Value::from("x"),
                    position: ListPosition::After { anchor: Value::from("nope") },
                },
            ),
            &editor_record(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AnchorNotFound { .. }));
    }

    #[test]
    fn test_list_remove() {
        let next = apply(
            &op("content", Command::ListRemove { value: Value::from("b-1") }),
            &editor_record(),
        );
        let items = next.value.as_map().unwrap()["content"].as_list().unwrap();
        assert_eq!(items, &[Value::from("b-2")]);
    }

    #[test]
    fn test_delete_key() {
        let next = apply(&op("title", Command::Delete), &editor_record());
        assert!(!next.value.as_map().unwrap().contains_key("title"));
    }

    #[test]
    fn test_delete_missing_key() {
        let err = CommandFacade::execute(&op("missing", Command::Delete), &editor_record())
            .unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_role_preserved_unless_set_role() {
        let record = editor_record();
        let next = apply(
            &op("title", Command::Set { value: Value::from("x") }),
            &record,
        );
        assert_eq!(next.role, Role::Editor);

        let next = apply(&op("", Command::SetRole { role: Role::Reader }), &record);
        assert_eq!(next.role, Role::Reader);
        // Value untouched by a role change.
        assert_eq!(next.value, record.value);
    }

    #[test]
    fn test_rejection_is_a_value() {
        let record = Record::new(Value::map(), Role::Reader);
        let outcome = CommandFacade::execute(
            &op("title", Command::Set { value: Value::from("x") }),
            &record,
        )
        .unwrap();
        assert_eq!(
            outcome,
            Applied::Rejected(RejectReason::ReadOnlyRecord { role: Role::Reader })
        );

        let record = Record::new(Value::map(), Role::None);
        let outcome = CommandFacade::execute(
            &op("title", Command::Set { value: Value::from("x") }),
            &record,
        )
        .unwrap();
        assert_eq!(outcome, Applied::Rejected(RejectReason::NoAccess));
    }

    #[test]
    fn test_execute_is_deterministic() {
        let record = editor_record();
        let operation = op(
            "content",
            Command::ListInsert {
                value: Value::from("b-3"),
                position: ListPosition::End,
            },
        );
        let first = CommandFacade::execute(&operation, &record).unwrap();
        let second = CommandFacade::execute(&operation, &record).unwrap();
        assert_eq!(first, second);
    }
}
