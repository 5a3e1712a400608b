use std::collections::HashMap;

use crate::deps::types::{FlattenedEntry, NodeId};

/// Collapse path-wise traversal records to one entry per object and put
/// them in application order.
///
/// The surviving occurrence for an object is the one with the greatest
/// tier magnitude; on a tie the earliest traversal occurrence wins. The
/// result is ordered by ascending signed tier, ties broken by the
/// surviving occurrence's traversal position. Applying creation scripts
/// in this order never references an object before it has been emitted.
pub fn order(entries: Vec<FlattenedEntry>) -> Vec<FlattenedEntry> {
    let mut kept: Vec<FlattenedEntry> = Vec::new();
    let mut index: HashMap<NodeId, usize> = HashMap::new();

    for entry in entries {
        match index.get(&entry.node) {
            Some(&slot) => {
                if entry.tier.unsigned_abs() > kept[slot].tier.unsigned_abs() {
                    kept[slot] = entry;
                }
            }
            None => {
                index.insert(entry.node, kept.len());
                kept.push(entry);
            }
        }
    }

    kept.sort_by_key(|entry| (entry.tier, entry.sequence));
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(node: NodeId, tier: i32, parent: Option<NodeId>, sequence: usize) -> FlattenedEntry {
        FlattenedEntry {
            node,
            tier,
            parent,
            sequence,
        }
    }

    #[test]
    fn diamond_keeps_one_copy_in_dependency_order() {
        // flatten of A -> (B, C) -> D
        let flat = vec![
            entry(0, 0, None, 0),
            entry(1, 1, Some(0), 1),
            entry(3, 2, Some(1), 2),
            entry(2, 1, Some(0), 3),
            entry(3, 2, Some(2), 4),
        ];
        let ordered = order(flat);
        let nodes: Vec<_> = ordered.iter().map(|e| e.node).collect();
        assert_eq!(nodes, vec![0, 1, 2, 3]);
        assert_eq!(ordered[3].tier, 2);
    }

    #[test]
    fn greatest_tier_magnitude_survives() {
        let flat = vec![
            entry(0, 0, None, 0),
            entry(5, 1, Some(0), 1),
            entry(7, 2, Some(5), 2),
            entry(5, 3, Some(7), 3),
        ];
        let ordered = order(flat);
        let five = ordered.iter().find(|e| e.node == 5).unwrap();
        assert_eq!(five.tier, 3);
        assert_eq!(five.parent, Some(7));
        let count = ordered.iter().filter(|e| e.node == 5).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn tie_keeps_first_occurrence() {
        let flat = vec![
            entry(0, 0, None, 0),
            entry(1, 1, Some(0), 1),
            entry(2, 2, Some(1), 2),
            entry(3, 1, Some(0), 3),
            entry(2, 2, Some(3), 4),
        ];
        let ordered = order(flat);
        let two = ordered.iter().find(|e| e.node == 2).unwrap();
        assert_eq!(two.sequence, 2);
        assert_eq!(two.parent, Some(1));
    }

    #[test]
    fn parents_mode_emits_deepest_prerequisite_first() {
        // flatten of A depending on B depending on C, tiers negated
        let flat = vec![
            entry(0, 0, None, 0),
            entry(1, -1, Some(0), 1),
            entry(2, -2, Some(1), 2),
        ];
        let ordered = order(flat);
        let nodes: Vec<_> = ordered.iter().map(|e| e.node).collect();
        assert_eq!(nodes, vec![2, 1, 0]);
        assert_eq!(ordered[0].tier, -2);
        assert_eq!(ordered[2].tier, 0);
    }

    #[test]
    fn same_tier_preserves_traversal_order() {
        let flat = vec![
            entry(0, 0, None, 0),
            entry(4, 1, Some(0), 1),
            entry(2, 1, Some(0), 2),
            entry(9, 1, Some(0), 3),
        ];
        let ordered = order(flat);
        let nodes: Vec<_> = ordered.iter().map(|e| e.node).collect();
        assert_eq!(nodes, vec![0, 4, 2, 9]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(order(Vec::new()).is_empty());
    }
}
