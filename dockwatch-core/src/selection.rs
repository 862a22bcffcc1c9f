use crate::model::{Direction, Entity, EntityId};

/// Table selection kept coherent across list refreshes.
///
/// Selection is positional: a refresh keeps the numeric index when it is
/// still in range and falls back to the first row otherwise. If the runtime
/// reorders its listing the highlighted row can land on another entity.
#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    entities: Vec<Entity>,
    selected: usize,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_refresh(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
        if self.selected >= self.entities.len() {
            self.selected = 0;
        }
    }

    pub fn on_move(&mut self, direction: Direction) {
        let last = self.entities.len().saturating_sub(1);
        self.selected = match direction {
            Direction::Up => self.selected.saturating_sub(1),
            Direction::Down => (self.selected + 1).min(last),
        };
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        self.entities.get(self.selected)
    }

    /// Id of the highlighted row; `None` for an empty list or the
    /// "runtime unavailable" row
    pub fn selected_entity_id(&self) -> Option<&EntityId> {
        self.selected_entity()
            .filter(|e| !e.is_placeholder())
            .map(|e| &e.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> Vec<Entity> {
        ids.iter().map(|id| Entity::new(*id, "img", "Up", "")).collect()
    }

    #[test]
    fn test_move_clamps_both_ends() {
        let mut sel = SelectionController::new();
        sel.on_refresh(list(&["a", "b", "c"]));
        sel.on_move(Direction::Up);
        assert_eq!(sel.selected_index(), 0);
        for _ in 0..5 {
            sel.on_move(Direction::Down);
        }
        assert_eq!(sel.selected_index(), 2);
        assert_eq!(sel.selected_entity_id().map(String::as_str), Some("c"));
        sel.on_move(Direction::Up);
        assert_eq!(sel.selected_entity_id().map(String::as_str), Some("b"));
    }

    #[test]
    fn test_refresh_keeps_index_in_range() {
        let mut sel = SelectionController::new();
        sel.on_refresh(list(&["a", "b", "c"]));
        sel.on_move(Direction::Down);
        sel.on_refresh(list(&["x", "y", "z", "w"]));
        assert_eq!(sel.selected_index(), 1);
        // positional: index survives even though the entity changed
        assert_eq!(sel.selected_entity_id().map(String::as_str), Some("y"));
    }

    #[test]
    fn test_refresh_shrink_resets_to_zero() {
        let mut sel = SelectionController::new();
        sel.on_refresh(list(&["a", "b", "c", "d"]));
        for _ in 0..3 {
            sel.on_move(Direction::Down);
        }
        assert_eq!(sel.selected_index(), 3);
        sel.on_refresh(list(&["a", "b"]));
        assert_eq!(sel.selected_index(), 0);
    }

    #[test]
    fn test_empty_list() {
        let mut sel = SelectionController::new();
        sel.on_refresh(Vec::new());
        sel.on_move(Direction::Down);
        sel.on_move(Direction::Up);
        assert_eq!(sel.selected_index(), 0);
        assert!(sel.selected_entity_id().is_none());
    }

    #[test]
    fn test_placeholder_has_no_id() {
        let mut sel = SelectionController::new();
        sel.on_refresh(vec![Entity::unavailable()]);
        assert!(sel.selected_entity().is_some());
        assert!(sel.selected_entity_id().is_none());
    }
}
