//! Entry ordering protocol
//!
//! Maintains a dense, zero-based position sequence over the entries of a
//! cheatsheet. Appends take max + 1 so nothing else has to shift; a
//! drag-and-drop move renumbers the whole list 0..n-1 and submits the full
//! assignment set as one batch.
//!
//! The sequence is cheatsheet-wide: display formats partition entries for
//! rendering only and share this single numeric space.

use crate::database::models::{EntryPosition, SyntaxEntry};
use crate::error::{AppError, Result};

/// Position for an entry appended to the given list: max + 1, or 0 when empty
pub fn next_position(entries: &[SyntaxEntry]) -> i64 {
    entries
        .iter()
        .map(|e| e.position)
        .max()
        .map_or(0, |max| max + 1)
}

/// Plan a move of the entry at index `from` to index `to` within the
/// displayed order, returning a dense 0..n-1 assignment for every entry.
pub fn plan_move(entries: &[SyntaxEntry], from: usize, to: usize) -> Result<Vec<EntryPosition>> {
    if from >= entries.len() || to >= entries.len() {
        return Err(AppError::Validation(format!(
            "move {} -> {} out of bounds for {} entries",
            from,
            to,
            entries.len()
        )));
    }

    let mut ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    let moved = ids.remove(from);
    ids.insert(to, moved);

    Ok(ids
        .into_iter()
        .enumerate()
        .map(|(position, id)| EntryPosition {
            id: id.to_string(),
            position: position as i64,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DisplayFormat;
    use chrono::Utc;

    fn entry(id: &str, position: i64) -> SyntaxEntry {
        let now = Utc::now();
        SyntaxEntry {
            id: id.to_string(),
            cheatsheet_id: "sheet".to_string(),
            syntax: id.to_string(),
            category: "General".to_string(),
            description: None,
            example: None,
            notes: None,
            language: "javascript".to_string(),
            display_format: DisplayFormat::Card,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_next_position_empty() {
        assert_eq!(next_position(&[]), 0);
    }

    #[test]
    fn test_next_position_appends_after_max() {
        let entries = vec![entry("a", 0), entry("b", 1), entry("c", 2)];
        assert_eq!(next_position(&entries), 3);
    }

    #[test]
    fn test_next_position_with_gaps() {
        // Positions need not be contiguous after arbitrary edits
        let entries = vec![entry("a", 0), entry("b", 7)];
        assert_eq!(next_position(&entries), 8);
    }

    #[test]
    fn test_plan_move_renumbers_densely() {
        let entries = vec![entry("a", 0), entry("b", 3), entry("c", 9)];

        let plan = plan_move(&entries, 2, 0).unwrap();

        let ids: Vec<&str> = plan.iter().map(|p| p.id.as_str()).collect();
        let positions: Vec<i64> = plan.iter().map(|p| p.position).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_plan_move_forward() {
        let entries = vec![entry("a", 0), entry("b", 1), entry("c", 2)];

        let plan = plan_move(&entries, 0, 2).unwrap();

        let ids: Vec<&str> = plan.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_plan_move_same_index_is_identity_order() {
        let entries = vec![entry("a", 4), entry("b", 5)];

        let plan = plan_move(&entries, 1, 1).unwrap();

        let ids: Vec<&str> = plan.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        // Still renumbered densely even when nothing moved
        assert_eq!(plan[0].position, 0);
        assert_eq!(plan[1].position, 1);
    }

    #[test]
    fn test_plan_move_out_of_bounds() {
        let entries = vec![entry("a", 0)];

        assert!(matches!(
            plan_move(&entries, 0, 1),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            plan_move(&entries, 3, 0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_plan_covers_every_entry() {
        let entries = vec![entry("a", 0), entry("b", 1), entry("c", 2), entry("d", 3)];

        let plan = plan_move(&entries, 1, 2).unwrap();
        assert_eq!(plan.len(), entries.len());
    }
}
