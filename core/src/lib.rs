pub mod action;
pub mod catalog;
pub mod codec;
pub mod placement;
pub mod protocol;
pub mod state;
pub mod view;

pub use action::CoreAction;
pub use catalog::{catalog_for, resolve, Answer, Catalog, PuzzleConfig, PuzzleKind};
pub use codec::{decode, decode_state, encode, encode_state};
pub use placement::{is_solved, place, reconcile, Item, Placement, HEAP};
pub use protocol::{ClientMsg, ServerMsg};
pub use state::{DropRecord, Extra, GameState, StateError};
pub use view::{project, ContainerSlot, PuzzleView};
