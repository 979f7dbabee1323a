use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::sprite::SpriteData;

/// How many Pokemon are resolved per batch request.
pub const BATCH_SIZE: usize = 20;

/// Default cap on the generation selector.
pub const DEFAULT_GENERATION_LIMIT: usize = 9;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub active: bool,
    pub query: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationInfo {
    pub name: String,
    pub url: String,
}

impl GenerationInfo {
    /// Display label, e.g. "generation-i" -> "GENERATION I".
    pub fn label(&self) -> String {
        self.name.replace('-', " ").to_ascii_uppercase()
    }
}

/// One entry of a generation's species roster. The id comes from the
/// trailing segment of the species URL and is unique within the roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRef {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PokemonSprites {
    pub front_default: Option<String>,
    pub back_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_shiny: Option<String>,
}

impl PokemonSprites {
    /// Pick the sprite URL for the requested face/variant, if present.
    pub fn select(&self, back: bool, shiny: bool) -> Option<&str> {
        let url = match (back, shiny) {
            (false, false) => &self.front_default,
            (false, true) => &self.front_shiny,
            (true, false) => &self.back_default,
            (true, true) => &self.back_shiny,
        };
        url.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub name: String,
    pub value: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonTypeSlot {
    pub slot: u8,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    pub sprites: PokemonSprites,
    pub stats: Vec<PokemonStat>,
    pub types: Vec<PokemonTypeSlot>,
    pub cry_latest: Option<String>,
    pub cry_legacy: Option<String>,
}

/// One Pokedex entry: normalized flavor text plus the game version it
/// appeared in. Deduplicated by (text, version) at the API layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlavorText {
    pub text: String,
    pub version: String,
}

/// Loader state machine for the selected generation.
///
/// `FetchingRoster` and `FetchingBatch` double as the busy flag: while
/// either is active no further load may start. `Ready` means unresolved
/// roster entries remain; `Exhausted` means the whole roster is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    FetchingRoster,
    FetchingBatch,
    Ready,
    Exhausted,
    Failed,
}

impl LoadPhase {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadPhase::FetchingRoster | LoadPhase::FetchingBatch)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FocusArea {
    Header,
    DexList,
    Detail,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub focus: FocusArea,

    pub generation_limit: usize,
    pub generations: Vec<GenerationInfo>,
    pub generation_index: usize,
    pub generations_loading: bool,

    // Loader state: reset in full on every generation change.
    pub roster: Vec<SpeciesRef>,
    pub pokemon: Vec<Pokemon>,
    pub offset: usize,
    pub phase: LoadPhase,
    /// Bumped on every generation change; batch/roster results carrying an
    /// older epoch are stale and discarded.
    pub load_epoch: u64,

    pub filtered_indices: Vec<usize>,
    pub selected_index: usize,
    pub search: SearchState,

    pub detail_name: Option<String>,
    pub flavor_texts: HashMap<String, Vec<FlavorText>>,
    pub flavor_loading: bool,

    pub sprite_cache: HashMap<String, SpriteData>,
    pub sprite_loading: bool,
    pub sprite_frame_index: usize,
    pub sprite_frame_tick: u64,
    pub show_back: bool,
    pub show_shiny: bool,
    pub cry_playing: bool,

    pub message: Option<String>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATION_LIMIT)
    }
}

impl AppState {
    pub fn new(generation_limit: usize) -> Self {
        Self {
            terminal_size: (80, 24),
            focus: FocusArea::DexList,
            generation_limit,
            generations: Vec::new(),
            generation_index: 0,
            generations_loading: false,
            roster: Vec::new(),
            pokemon: Vec::new(),
            offset: 0,
            phase: LoadPhase::Idle,
            load_epoch: 0,
            filtered_indices: Vec::new(),
            selected_index: 0,
            search: SearchState::default(),
            detail_name: None,
            flavor_texts: HashMap::new(),
            flavor_loading: false,
            sprite_cache: HashMap::new(),
            sprite_loading: false,
            sprite_frame_index: 0,
            sprite_frame_tick: 0,
            show_back: false,
            show_shiny: false,
            cry_playing: false,
            message: None,
            tick: 0,
        }
    }

    pub fn current_generation(&self) -> Option<&GenerationInfo> {
        self.generations.get(self.generation_index)
    }

    /// Unresolved roster entries remain (and the loader has not failed).
    pub fn has_more(&self) -> bool {
        self.offset < self.roster.len() && self.phase != LoadPhase::Failed
    }

    pub fn selected_pokemon(&self) -> Option<&Pokemon> {
        self.filtered_indices
            .get(self.selected_index)
            .and_then(|idx| self.pokemon.get(*idx))
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        if self.filtered_indices.is_empty() {
            self.selected_index = 0;
            return false;
        }
        let bounded = index.min(self.filtered_indices.len() - 1);
        if bounded != self.selected_index {
            self.selected_index = bounded;
            return true;
        }
        false
    }

    /// A non-empty trimmed query narrows the view and suspends pagination.
    pub fn search_filter_active(&self) -> bool {
        !self.search.query.trim().is_empty()
    }

    /// The selection sits on the last materialized row: the TUI analog of
    /// the trailing sentinel element becoming visible.
    pub fn at_sentinel(&self) -> bool {
        !self.filtered_indices.is_empty()
            && self.selected_index == self.filtered_indices.len() - 1
    }

    /// Recompute the filtered view: case-insensitive substring match on
    /// name, or substring match on the decimal id.
    pub fn rebuild_filtered(&mut self) {
        let query = self.search.query.trim().to_lowercase();
        self.filtered_indices = self
            .pokemon
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                query.is_empty()
                    || entry.name.to_lowercase().contains(&query)
                    || entry.id.to_string().contains(&query)
            })
            .map(|(idx, _)| idx)
            .collect();

        if self.selected_index >= self.filtered_indices.len() {
            self.selected_index = 0;
        }
    }

    /// Cache key for the currently toggled sprite face/variant of `name`.
    pub fn sprite_key(&self, name: &str) -> String {
        let face = if self.show_back { "back" } else { "front" };
        let variant = if self.show_shiny { "shiny" } else { "default" };
        format!("{name}:{face}-{variant}")
    }

    pub fn reset_sprite_animation(&mut self) {
        self.sprite_frame_index = 0;
        self.sprite_frame_tick = 0;
    }

    pub fn reset_detail_view(&mut self) {
        self.show_back = false;
        self.show_shiny = false;
        self.reset_sprite_animation();
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            FocusArea::Header => FocusArea::DexList,
            FocusArea::DexList => FocusArea::Detail,
            FocusArea::Detail => FocusArea::Header,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            FocusArea::Header => FocusArea::Detail,
            FocusArea::DexList => FocusArea::Header,
            FocusArea::Detail => FocusArea::DexList,
        };
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Loader")
                .entry("generation", ron_string(&self.current_generation().map(|g| g.name.clone())))
                .entry("phase", ron_string(&self.phase))
                .entry("epoch", ron_string(&self.load_epoch))
                .entry("roster", ron_string(&self.roster.len()))
                .entry("resolved", ron_string(&self.pokemon.len()))
                .entry("offset", ron_string(&self.offset))
                .entry("has_more", ron_string(&self.has_more())),
            DebugSection::new("View")
                .entry("filtered", ron_string(&self.filtered_indices.len()))
                .entry("selected", ron_string(&self.selected_index))
                .entry("detail", ron_string(&self.detail_name))
                .entry("search", ron_string(&self.search.query))
                .entry("search_active", ron_string(&self.search.active))
                .entry("focus", ron_string(&self.focus)),
            DebugSection::new("Status")
                .entry("generations_loading", ron_string(&self.generations_loading))
                .entry("flavor_loading", ron_string(&self.flavor_loading))
                .entry("sprite_loading", ron_string(&self.sprite_loading))
                .entry("cry_playing", ron_string(&self.cry_playing))
                .entry("message", ron_string(&self.message)),
        ]
    }
}
