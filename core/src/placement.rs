use std::collections::BTreeSet;

use rkyv::{Archive, Deserialize, Serialize};

use crate::catalog::{Answer, PuzzleConfig};

/// Container every item starts in.
pub const HEAP: &str = "heap";

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub label: String,
    pub source: String,
    pub container: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Placement {
    pub item: u32,
    pub container: String,
}

pub fn place(items: &[Item], item_id: u32, container: &str) -> Vec<Item> {
    items
        .iter()
        .map(|item| {
            if item.id == item_id {
                Item {
                    container: container.to_string(),
                    ..item.clone()
                }
            } else {
                item.clone()
            }
        })
        .collect()
}

/// An empty board is never solved.
pub fn sorting_solved(items: &[Item], mapping: &[(u32, &str)]) -> bool {
    !items.is_empty()
        && items.iter().all(|item| {
            mapping
                .iter()
                .find(|(id, _)| *id == item.id)
                .is_some_and(|(_, expected)| *expected == item.container)
        })
}

pub fn pick_solved(selected: Option<&str>, expected: &str) -> bool {
    selected == Some(expected)
}

pub fn is_solved(answer: &Answer, items: &[Item], selected: Option<&str>) -> bool {
    match answer {
        Answer::Sorting(mapping) => sorting_solved(items, mapping),
        Answer::Pick(expected) => pick_solved(selected, expected),
    }
}

/// Resets to the config's default layout when the current items were built
/// from a different asset set. Items that already match are returned as-is.
pub fn reconcile(items: &[Item], config: &PuzzleConfig) -> Vec<Item> {
    let current: BTreeSet<&str> = items.iter().map(|item| item.source.as_str()).collect();
    let expected: BTreeSet<&str> = config.sources().into_iter().collect();
    if current == expected && items.len() == expected.len() {
        items.to_vec()
    } else {
        config.default_items()
    }
}

pub fn layout_of(items: &[Item]) -> Vec<Placement> {
    items
        .iter()
        .map(|item| Placement {
            item: item.id,
            container: item.container.clone(),
        })
        .collect()
}

/// Items not named by `layout` keep their container.
pub fn apply_layout(items: &[Item], layout: &[Placement]) -> Vec<Item> {
    layout
        .iter()
        .fold(items.to_vec(), |acc, slot| place(&acc, slot.item, &slot.container))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, container: &str) -> Item {
        Item {
            id,
            label: id.to_string(),
            source: format!("img/{id}.svg"),
            container: container.to_string(),
        }
    }

    #[test]
    fn place_unknown_item_is_noop() {
        let items = vec![item(1, HEAP), item(2, HEAP)];
        assert_eq!(place(&items, 9, "1"), items);
    }

    #[test]
    fn place_leaves_input_untouched() {
        let items = vec![item(1, HEAP)];
        let next = place(&items, 1, "2");
        assert_eq!(items[0].container, HEAP);
        assert_eq!(next[0].container, "2");
    }

    #[test]
    fn sorting_item_without_answer_is_unsolved() {
        let items = vec![item(1, "A"), item(4, "A")];
        assert!(!sorting_solved(&items, &[(1, "A")]));
    }

    #[test]
    fn layout_restores_placements() {
        let items = vec![item(1, HEAP), item(2, HEAP)];
        let moved = place(&items, 2, "3");
        assert_eq!(apply_layout(&items, &layout_of(&moved)), moved);
    }
}
