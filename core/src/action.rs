/// Local input translated by the rendering side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreAction {
    Place { item_id: u32, container: String },
    Select { asset: String },
    SwitchView { view: u32 },
    /// Closes the win popup.
    Dismiss,
}
