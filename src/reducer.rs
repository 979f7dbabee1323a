use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::state::{AppState, LoadPhase, SearchState, BATCH_SIZE};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.generations_loading = true;
            state.message = None;
            DispatchResult::changed_with(Effect::LoadGenerations {
                limit: state.generation_limit,
            })
        }

        Action::GenerationsDidLoad(generations) => {
            state.generations_loading = false;
            state.generations = generations;
            state.generation_index = 0;
            if state.generations.is_empty() {
                state.message = Some("No generations available.".to_string());
                return DispatchResult::changed();
            }
            start_generation(state)
        }

        Action::GenerationsDidError(error) => {
            state.generations_loading = false;
            state.message = Some(format!("Generation list error: {error}"));
            DispatchResult::changed()
        }

        Action::GenerationNext => cycle_generation(state, 1),
        Action::GenerationPrev => cycle_generation(state, -1),

        Action::GenerationSelect(index) => {
            if index >= state.generations.len() || index == state.generation_index {
                return DispatchResult::unchanged();
            }
            state.generation_index = index;
            start_generation(state)
        }

        Action::RosterDidLoad { epoch, roster } => {
            if epoch != state.load_epoch || state.phase != LoadPhase::FetchingRoster {
                return DispatchResult::unchanged();
            }
            state.roster = roster;
            if state.roster.is_empty() {
                state.phase = LoadPhase::Exhausted;
                return DispatchResult::changed();
            }
            DispatchResult::changed_with_many(next_batch_effects(state))
        }

        Action::RosterDidError { epoch, error } => {
            if epoch != state.load_epoch || state.phase != LoadPhase::FetchingRoster {
                return DispatchResult::unchanged();
            }
            state.phase = LoadPhase::Failed;
            state.message = Some(format!("Roster error: {error}"));
            DispatchResult::changed()
        }

        Action::LoadMore => {
            if state.phase != LoadPhase::Ready || state.search_filter_active() {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with_many(next_batch_effects(state))
        }

        Action::BatchDidLoad {
            epoch,
            requested,
            resolved,
        } => {
            if epoch != state.load_epoch || state.phase != LoadPhase::FetchingBatch {
                return DispatchResult::unchanged();
            }
            let was_empty = state.pokemon.is_empty();
            state.pokemon.extend(resolved);
            state.offset = (state.offset + requested).min(state.roster.len());
            state.phase = if state.offset < state.roster.len() {
                LoadPhase::Ready
            } else {
                LoadPhase::Exhausted
            };
            state.rebuild_filtered();
            if was_empty {
                state.selected_index = 0;
            }
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::BatchDidError { epoch, error } => {
            if epoch != state.load_epoch || state.phase != LoadPhase::FetchingBatch {
                return DispatchResult::unchanged();
            }
            state.phase = LoadPhase::Failed;
            state.message = Some(format!("Load error: {error}"));
            DispatchResult::changed()
        }

        Action::SelectionMove(delta) => {
            let mut index = state.selected_index as i16 + delta;
            if index < 0 {
                index = 0;
            }
            if !state.set_selected_index(index as usize) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SelectionPage(delta) => {
            let page = list_page_size(state) as i16;
            let mut index = state.selected_index as i16 + delta * page;
            if index < 0 {
                index = 0;
            }
            if !state.set_selected_index(index as usize) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SelectionJumpTop => {
            if !state.set_selected_index(0) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SelectionJumpBottom => {
            let last = state.filtered_indices.len().saturating_sub(1);
            if !state.set_selected_index(last) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::DexSelect(index) => {
            if !state.set_selected_index(index) {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SearchStart => {
            state.search.active = true;
            state.search.query.clear();
            state.rebuild_filtered();
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SearchCancel => {
            if !state.search.active && state.search.query.is_empty() {
                return DispatchResult::unchanged();
            }
            state.search.active = false;
            state.search.query.clear();
            state.rebuild_filtered();
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SearchSubmit => {
            state.search.active = false;
            state.rebuild_filtered();
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SearchInput(ch) => {
            state.search.query.push(ch);
            state.rebuild_filtered();
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::SearchBackspace => {
            state.search.query.pop();
            state.rebuild_filtered();
            DispatchResult::changed_with_many(selection_effects(state))
        }

        Action::FlavorDidLoad { name, entries } => {
            state.flavor_texts.insert(name, entries);
            state.flavor_loading = false;
            DispatchResult::changed()
        }

        Action::FlavorDidError { name, error } => {
            state.flavor_loading = false;
            state.message = Some(format!("{name} entries error: {error}"));
            DispatchResult::changed()
        }

        Action::SpriteDidLoad { key, sprite } => {
            state.sprite_cache.insert(key, sprite);
            state.sprite_loading = false;
            state.reset_sprite_animation();
            DispatchResult::changed()
        }

        Action::SpriteDidError { key, error } => {
            state.sprite_loading = false;
            state.message = Some(format!("Sprite error for {key}: {error}"));
            DispatchResult::changed()
        }

        Action::SpriteFlip => {
            if state.selected_pokemon().is_none() {
                return DispatchResult::unchanged();
            }
            state.show_back = !state.show_back;
            state.reset_sprite_animation();
            DispatchResult::changed_with_many(sprite_effects(state))
        }

        Action::SpriteShinyToggle => {
            if state.selected_pokemon().is_none() {
                return DispatchResult::unchanged();
            }
            state.show_shiny = !state.show_shiny;
            state.reset_sprite_animation();
            DispatchResult::changed_with_many(sprite_effects(state))
        }

        Action::PlayCry => {
            // One cry at a time: playback runs to completion off-thread and
            // cannot be cancelled, so overlapping requests are dropped.
            if state.cry_playing {
                return DispatchResult::unchanged();
            }
            let Some(selected) = state.selected_pokemon() else {
                return DispatchResult::unchanged();
            };
            let name = selected.name.clone();
            let Some(url) = selected.cry_latest.clone().or(selected.cry_legacy.clone()) else {
                state.message = Some("No cry available.".to_string());
                return DispatchResult::changed();
            };
            state.cry_playing = true;
            DispatchResult::changed_with(Effect::PlayCry { name, url })
        }

        Action::CryDidFinish => {
            state.cry_playing = false;
            DispatchResult::changed()
        }

        Action::CryDidError(error) => {
            state.cry_playing = false;
            state.message = Some(format!("Cry error: {error}"));
            DispatchResult::changed()
        }

        Action::FocusNext => {
            if state.search.active {
                return DispatchResult::unchanged();
            }
            state.focus_next();
            DispatchResult::changed()
        }

        Action::FocusPrev => {
            if state.search.active {
                return DispatchResult::unchanged();
            }
            state.focus_prev();
            DispatchResult::changed()
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Tick => tick_animation(state),

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Reset the loader for the currently selected generation and kick off
/// its roster fetch. Bumps the epoch so in-flight results go stale.
fn start_generation(state: &mut AppState) -> DispatchResult<Effect> {
    state.load_epoch += 1;
    state.roster.clear();
    state.pokemon.clear();
    state.filtered_indices.clear();
    state.offset = 0;
    state.selected_index = 0;
    state.search = SearchState::default();
    state.detail_name = None;
    state.reset_detail_view();
    state.message = None;
    let Some(generation) = state.current_generation() else {
        state.phase = LoadPhase::Idle;
        return DispatchResult::changed();
    };
    let name = generation.name.clone();
    state.phase = LoadPhase::FetchingRoster;
    DispatchResult::changed_with(Effect::LoadRoster {
        generation: name,
        epoch: state.load_epoch,
    })
}

fn cycle_generation(state: &mut AppState, step: i16) -> DispatchResult<Effect> {
    if state.generations.is_empty() {
        return DispatchResult::unchanged();
    }
    let len = state.generations.len() as i16;
    let mut next = state.generation_index as i16 + step;
    if next < 0 {
        next = len - 1;
    } else if next >= len {
        next = 0;
    }
    let next_index = next as usize;
    if next_index == state.generation_index {
        return DispatchResult::unchanged();
    }
    state.generation_index = next_index;
    start_generation(state)
}

/// Request the next roster slice. At most one batch is ever in flight:
/// this is the only place the phase moves to `FetchingBatch`, and every
/// caller checks the phase first.
fn next_batch_effects(state: &mut AppState) -> Vec<Effect> {
    let end = (state.offset + BATCH_SIZE).min(state.roster.len());
    let refs = state.roster[state.offset..end].to_vec();
    if refs.is_empty() {
        state.phase = LoadPhase::Exhausted;
        return Vec::new();
    }
    state.phase = LoadPhase::FetchingBatch;
    vec![Effect::LoadBatch {
        refs,
        epoch: state.load_epoch,
    }]
}

fn selection_effects(state: &mut AppState) -> Vec<Effect> {
    let mut effects = select_follow_up(state);
    effects.extend(sentinel_effects(state));
    effects
}

fn select_follow_up(state: &mut AppState) -> Vec<Effect> {
    let Some(selected) = state.selected_pokemon() else {
        state.detail_name = None;
        return Vec::new();
    };
    let name = selected.name.clone();
    if state.detail_name.as_deref() == Some(&name) {
        return Vec::new();
    }
    state.detail_name = Some(name.clone());
    state.reset_detail_view();
    let mut effects = Vec::new();
    if !state.flavor_texts.contains_key(&name) {
        state.flavor_loading = true;
        effects.push(Effect::LoadFlavorTexts { name });
    }
    effects.extend(sprite_effects(state));
    effects
}

fn sprite_effects(state: &mut AppState) -> Vec<Effect> {
    let Some(selected) = state.selected_pokemon() else {
        return Vec::new();
    };
    let key = state.sprite_key(&selected.name);
    if state.sprite_cache.contains_key(&key) {
        return Vec::new();
    }
    let Some(url) = selected.sprites.select(state.show_back, state.show_shiny) else {
        return Vec::new();
    };
    let url = url.to_string();
    state.sprite_loading = true;
    vec![Effect::LoadSprite { key, url }]
}

/// Selection resting on the last materialized row continues the load,
/// unless a search filter suspends pagination.
fn sentinel_effects(state: &mut AppState) -> Vec<Effect> {
    if state.phase != LoadPhase::Ready || state.search_filter_active() || !state.at_sentinel() {
        return Vec::new();
    }
    next_batch_effects(state)
}

fn tick_animation(state: &mut AppState) -> DispatchResult<Effect> {
    state.tick = state.tick.wrapping_add(1);
    let Some(name) = state.detail_name.as_ref() else {
        return DispatchResult::unchanged();
    };
    let key = state.sprite_key(name);
    let Some(sprite) = state.sprite_cache.get(&key) else {
        return DispatchResult::unchanged();
    };
    let frames = sprite.frames.len();
    if frames <= 1 {
        return DispatchResult::unchanged();
    }
    state.sprite_frame_tick = state.sprite_frame_tick.wrapping_add(1);
    state.sprite_frame_index = (state.sprite_frame_index + 1) % frames;
    DispatchResult::changed()
}

fn list_page_size(state: &AppState) -> usize {
    state.terminal_size.1.saturating_sub(8) as usize
}
