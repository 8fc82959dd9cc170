use std::collections::HashSet;
use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

use crate::catalog::{resolve, PuzzleKind};
use crate::placement::Placement;

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct DropRecord {
    pub item: u32,
    pub container: String,
    pub layout: Vec<Placement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum Extra {
    #[default]
    Empty,
    Dropped(DropRecord),
    Selected(String),
}

/// The replicated unit. Always sent and applied whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct GameState {
    pub view: u32,
    pub extra: Extra,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.extra {
            Extra::Selected(asset) => Some(asset.as_str()),
            _ => None,
        }
    }

    pub fn layout(&self) -> Option<&[Placement]> {
        match &self.extra {
            Extra::Dropped(record) => Some(record.layout.as_slice()),
            _ => None,
        }
    }

    /// Checks the payload against the config its view resolves to.
    pub fn validate_for(&self, kind: PuzzleKind) -> Result<(), StateError> {
        let config = resolve(kind, self.view);
        match (&self.extra, kind) {
            (Extra::Empty, _) => Ok(()),
            (Extra::Selected(_), PuzzleKind::Sorting) => Err(StateError::ExtraMismatch {
                kind,
                extra: "selected",
            }),
            (Extra::Selected(asset), _) => {
                if config.assets.contains(&asset.as_str()) {
                    Ok(())
                } else {
                    Err(StateError::UnknownAsset {
                        asset: asset.clone(),
                    })
                }
            }
            (Extra::Dropped(_), PuzzleKind::SinglePick | PuzzleKind::OddOneOut) => {
                Err(StateError::ExtraMismatch { kind, extra: "drop" })
            }
            (Extra::Dropped(record), PuzzleKind::Sorting) => {
                let known_item = |id: u32| config.items.iter().any(|seed| seed.id == id);
                let check = |item: u32, container: &String| {
                    if !known_item(item) {
                        Err(StateError::UnknownItem { item })
                    } else if !config.accepts_container(container) {
                        Err(StateError::UnknownContainer {
                            container: container.clone(),
                        })
                    } else {
                        Ok(())
                    }
                };
                check(record.item, &record.container)?;
                let mut seen = HashSet::new();
                for slot in &record.layout {
                    check(slot.item, &slot.container)?;
                    if !seen.insert(slot.item) {
                        return Err(StateError::DuplicateItem { item: slot.item });
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    Undecodable { len: usize },
    ExtraMismatch { kind: PuzzleKind, extra: &'static str },
    DuplicateItem { item: u32 },
    UnknownAsset { asset: String },
    UnknownItem { item: u32 },
    UnknownContainer { container: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Undecodable { len } => {
                write!(f, "payload of {len} bytes is not a game state")
            }
            StateError::ExtraMismatch { kind, extra } => {
                write!(f, "{extra} payload does not belong to {kind}")
            }
            StateError::DuplicateItem { item } => {
                write!(f, "item {item} placed twice in one layout")
            }
            StateError::UnknownAsset { asset } => {
                write!(f, "{asset} is not part of this puzzle")
            }
            StateError::UnknownItem { item } => write!(f, "no item {item} in this puzzle"),
            StateError::UnknownContainer { container } => {
                write!(f, "no container {container:?} in this puzzle")
            }
        }
    }
}

impl std::error::Error for StateError {}
