//! Utilities to compare custom types
//!
//! These can be used to sort results, e.g. by using `sort_by` on a `Vec`

use std::cmp::Ordering;

use crate::provider::todo_view::TodoView;

/// Compare to-do items by due date.
///
/// Items without a due date come after every item that has one. Due dates are compared as ISO strings,
/// and items that have no due date are equal to each other (so that a stable sort keeps their order).
pub fn compare_todos_by_due(left: &TodoView, right: &TodoView) -> Ordering {
    match (&left.due, &right.due) {
        (Some(l), Some(r)) => l.cmp(r),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
