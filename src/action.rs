use serde::{Deserialize, Serialize};

use crate::sprite::SpriteData;
use crate::state::{FlavorText, GenerationInfo, Pokemon, SpeciesRef};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,

    // Generation list
    GenerationsDidLoad(Vec<GenerationInfo>),
    GenerationsDidError(String),
    GenerationNext,
    GenerationPrev,
    GenerationSelect(usize),

    // Roster and incremental batches. Completions carry the epoch they
    // were issued under so stale results can be discarded.
    RosterDidLoad { epoch: u64, roster: Vec<SpeciesRef> },
    RosterDidError { epoch: u64, error: String },
    LoadMore,
    BatchDidLoad {
        epoch: u64,
        requested: usize,
        resolved: Vec<Pokemon>,
    },
    BatchDidError { epoch: u64, error: String },

    // List navigation
    SelectionMove(i16),
    SelectionPage(i16),
    SelectionJumpTop,
    SelectionJumpBottom,
    DexSelect(usize),

    // Search
    SearchStart,
    SearchCancel,
    SearchSubmit,
    SearchInput(char),
    SearchBackspace,

    // Detail view
    FlavorDidLoad { name: String, entries: Vec<FlavorText> },
    FlavorDidError { name: String, error: String },
    SpriteDidLoad { key: String, sprite: SpriteData },
    SpriteDidError { key: String, error: String },
    SpriteFlip,
    SpriteShinyToggle,
    PlayCry,
    CryDidFinish,
    CryDidError(String),

    // Shell
    FocusNext,
    FocusPrev,
    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
