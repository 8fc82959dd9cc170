use crate::catalog::{resolve, Answer, PuzzleKind};
use crate::placement::{is_solved, Item};
use crate::state::GameState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSlot {
    pub id: String,
    pub asset: &'static str,
}

/// Read-only projection handed to the rendering layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleView {
    pub kind: PuzzleKind,
    pub view: u32,
    pub display_items: Vec<Item>,
    pub containers: Vec<ContainerSlot>,
    pub solved: bool,
    pub direction: &'static str,
    pub selected: Option<String>,
    pub celebration: Option<String>,
}

pub fn project(kind: PuzzleKind, state: &GameState, items: &[Item]) -> PuzzleView {
    let config = resolve(kind, state.view);
    let solved = is_solved(&config.answer, items, state.selected());
    let celebration = if solved {
        match config.answer {
            Answer::Sorting(_) => config.celebration.map(str::to_string),
            Answer::Pick(_) => state.selected().map(str::to_string),
        }
    } else {
        None
    };
    PuzzleView {
        kind,
        view: state.view,
        display_items: items.to_vec(),
        containers: config
            .containers()
            .into_iter()
            .map(|(id, asset)| ContainerSlot { id, asset })
            .collect(),
        solved,
        direction: config.direction,
        selected: state.selected().map(str::to_string),
        celebration,
    }
}

impl PuzzleView {
    pub fn items_in(&self, container: &str) -> impl Iterator<Item = &Item> + '_ {
        let container = container.to_string();
        self.display_items
            .iter()
            .filter(move |item| item.container == container)
    }
}
