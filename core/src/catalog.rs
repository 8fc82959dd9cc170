use crate::placement::{Item, HEAP};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PuzzleKind {
    Sorting,
    SinglePick,
    OddOneOut,
}

impl PuzzleKind {
    pub const ALL: [PuzzleKind; 3] = [
        PuzzleKind::Sorting,
        PuzzleKind::SinglePick,
        PuzzleKind::OddOneOut,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            PuzzleKind::Sorting => "choose-a-box",
            PuzzleKind::SinglePick => "choose-a-pencil",
            PuzzleKind::OddOneOut => "spot-the-odd",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let trimmed = slug.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(trimmed))
    }

    pub fn is_pick(self) -> bool {
        !matches!(self, PuzzleKind::Sorting)
    }
}

impl std::fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.slug().fmt(f)
    }
}

/// The answer key a win predicate checks against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Item id to the container it belongs in.
    Sorting(&'static [(u32, &'static str)]),
    /// The single asset that wins when selected.
    Pick(&'static str),
}

impl Answer {
    pub fn expected_container(&self, item_id: u32) -> Option<&'static str> {
        match self {
            Answer::Sorting(mapping) => mapping
                .iter()
                .find(|(id, _)| *id == item_id)
                .map(|(_, container)| *container),
            Answer::Pick(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemSeed {
    pub id: u32,
    pub label: &'static str,
    pub src: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PuzzleConfig {
    pub assets: &'static [&'static str],
    pub answer: Answer,
    pub items: &'static [ItemSeed],
    pub direction: &'static str,
    pub celebration: Option<&'static str>,
}

impl PuzzleConfig {
    /// Starting layout: every item on the heap. Pick puzzles expose their
    /// assets as items so the rendering side sees one shape for both.
    pub fn default_items(&self) -> Vec<Item> {
        if !self.items.is_empty() {
            return self
                .items
                .iter()
                .map(|seed| Item {
                    id: seed.id,
                    label: seed.label.to_string(),
                    source: seed.src.to_string(),
                    container: HEAP.to_string(),
                })
                .collect();
        }
        self.assets
            .iter()
            .enumerate()
            .map(|(idx, asset)| Item {
                id: idx as u32 + 1,
                label: asset.to_string(),
                source: asset.to_string(),
                container: HEAP.to_string(),
            })
            .collect()
    }

    pub fn sources(&self) -> Vec<&'static str> {
        if self.items.is_empty() {
            self.assets.to_vec()
        } else {
            self.items.iter().map(|seed| seed.src).collect()
        }
    }

    /// Drop targets for the sorting variant, numbered from 1 in asset order.
    pub fn containers(&self) -> Vec<(String, &'static str)> {
        match self.answer {
            Answer::Sorting(_) => self
                .assets
                .iter()
                .enumerate()
                .map(|(idx, asset)| ((idx + 1).to_string(), *asset))
                .collect(),
            Answer::Pick(_) => Vec::new(),
        }
    }

    pub fn accepts_container(&self, container: &str) -> bool {
        container == HEAP || self.containers().iter().any(|(id, _)| id == container)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CatalogEntry {
    pub view: u32,
    pub config: PuzzleConfig,
}

#[derive(Clone, Copy, Debug)]
pub struct Catalog {
    pub entries: &'static [CatalogEntry],
    pub default_view: u32,
}

impl Catalog {
    pub fn entry(&self, view: u32) -> Option<&'static CatalogEntry> {
        self.entries.iter().find(|entry| entry.view == view)
    }

    pub fn default_config(&self) -> &'static PuzzleConfig {
        match self.entry(self.default_view) {
            Some(entry) => &entry.config,
            None => &self.entries[0].config,
        }
    }

    pub fn resolve(&self, view: u32) -> &'static PuzzleConfig {
        match self.entry(view) {
            Some(entry) => &entry.config,
            None => self.default_config(),
        }
    }

    /// The view after `view`, wrapping back to the first entry.
    pub fn next_view(&self, view: u32) -> u32 {
        let first = self.entries.iter().map(|entry| entry.view).min().unwrap_or(0);
        self.entries
            .iter()
            .map(|entry| entry.view)
            .filter(|candidate| *candidate > view)
            .min()
            .unwrap_or(first)
    }
}

const SORT_DIRECTION_BOXES: &str = "Соедини предмет и его коробку";
const SORT_DIRECTION_HOUSES: &str = "Перетащи животное в его домик";
const SORTING_ANSWER: &[(u32, &str)] = &[(1, "1"), (2, "3"), (3, "2")];

pub const SORTING_CATALOG: Catalog = Catalog {
    default_view: 0,
    entries: &[
        CatalogEntry {
            view: 0,
            config: PuzzleConfig {
                assets: &["img/green-box.svg", "img/yellow-box.svg", "img/red-box.svg"],
                answer: Answer::Sorting(SORTING_ANSWER),
                items: &[
                    ItemSeed { id: 1, label: "1", src: "img/doll.svg" },
                    ItemSeed { id: 2, label: "2", src: "img/shehnai.svg" },
                    ItemSeed { id: 3, label: "3", src: "img/whirligig.svg" },
                ],
                direction: SORT_DIRECTION_BOXES,
                celebration: Some("img/d1.svg"),
            },
        },
        CatalogEntry {
            view: 1,
            config: PuzzleConfig {
                assets: &["img/green-house.svg", "img/yellow-house.svg", "img/house-red.svg"],
                answer: Answer::Sorting(SORTING_ANSWER),
                items: &[
                    ItemSeed { id: 1, label: "1", src: "img/giraffe.svg" },
                    ItemSeed { id: 2, label: "2", src: "img/crocodile.svg" },
                    ItemSeed { id: 3, label: "3", src: "img/hippopotamus.svg" },
                ],
                direction: SORT_DIRECTION_HOUSES,
                celebration: Some("img/d1.svg"),
            },
        },
    ],
};

pub const PICK_CATALOG: Catalog = Catalog {
    default_view: 0,
    entries: &[
        CatalogEntry {
            view: 0,
            config: PuzzleConfig {
                assets: &["img/a1.png", "img/a2.png", "img/a3.png", "img/a4.png"],
                answer: Answer::Pick("img/a2.png"),
                items: &[],
                direction: "Выбери карандаш",
                celebration: None,
            },
        },
        CatalogEntry {
            view: 1,
            config: PuzzleConfig {
                assets: &["img/e1.png", "img/e2.png", "img/e3.png", "img/e4.png"],
                answer: Answer::Pick("img/e3.png"),
                items: &[],
                direction: "Укажи коробку",
                celebration: None,
            },
        },
        CatalogEntry {
            view: 2,
            config: PuzzleConfig {
                assets: &["img/f1.png", "img/f4.png", "img/f3.png", "img/f2.png"],
                answer: Answer::Pick("img/f3.png"),
                items: &[],
                direction: "Выбери карандаш",
                celebration: None,
            },
        },
    ],
};

const ODD_DIRECTION: &str = "Укажи лишнее";

pub const ODD_ONE_OUT_CATALOG: Catalog = Catalog {
    default_view: 3,
    entries: &[
        CatalogEntry {
            view: 0,
            config: PuzzleConfig {
                assets: &["img/c1.svg", "img/c2.svg", "img/c3.svg", "img/c4.svg"],
                answer: Answer::Pick("img/c4.svg"),
                items: &[],
                direction: ODD_DIRECTION,
                celebration: None,
            },
        },
        CatalogEntry {
            view: 1,
            config: PuzzleConfig {
                assets: &["img/a1.svg", "img/a2.svg", "img/a3.svg", "img/a4.svg"],
                answer: Answer::Pick("img/a3.svg"),
                items: &[],
                direction: ODD_DIRECTION,
                celebration: None,
            },
        },
        CatalogEntry {
            view: 2,
            config: PuzzleConfig {
                assets: &["img/b1.svg", "img/b2.svg", "img/b3.svg", "img/b4.svg"],
                answer: Answer::Pick("img/b4.svg"),
                items: &[],
                direction: ODD_DIRECTION,
                celebration: None,
            },
        },
        CatalogEntry {
            view: 3,
            config: PuzzleConfig {
                assets: &["img/d1.svg", "img/d2.svg", "img/d3.svg", "img/d4.svg"],
                answer: Answer::Pick("img/d1.svg"),
                items: &[],
                direction: ODD_DIRECTION,
                celebration: None,
            },
        },
    ],
};

pub fn catalog_for(kind: PuzzleKind) -> &'static Catalog {
    match kind {
        PuzzleKind::Sorting => &SORTING_CATALOG,
        PuzzleKind::SinglePick => &PICK_CATALOG,
        PuzzleKind::OddOneOut => &ODD_ONE_OUT_CATALOG,
    }
}

pub fn resolve(kind: PuzzleKind, view: u32) -> &'static PuzzleConfig {
    catalog_for(kind).resolve(view)
}
