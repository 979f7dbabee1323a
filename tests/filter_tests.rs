//! Search filter tests: matching rules and pagination suspension.

use tui_dispatch::EffectStore;
use gendex::{
    action::Action,
    effect::Effect,
    reducer::reducer,
    state::{AppState, GenerationInfo, LoadPhase, Pokemon, PokemonSprites, SpeciesRef, BATCH_SIZE},
};

fn species(id: u32) -> SpeciesRef {
    SpeciesRef {
        id,
        name: format!("species-{id}"),
    }
}

fn named_mon(id: u32, name: &str) -> Pokemon {
    Pokemon {
        id,
        name: name.to_string(),
        sprites: PokemonSprites {
            front_default: Some(format!("https://sprites/{id}.png")),
            ..Default::default()
        },
        stats: Vec::new(),
        types: Vec::new(),
        cry_latest: None,
        cry_legacy: None,
    }
}

fn store_with_pokemon(pokemon: Vec<Pokemon>) -> EffectStore<AppState, Action, Effect> {
    let mut store = EffectStore::new(AppState::default(), reducer);
    store.dispatch(Action::GenerationsDidLoad(vec![GenerationInfo {
        name: "generation-i".into(),
        url: "https://pokeapi.co/api/v2/generation/1/".into(),
    }]));
    let epoch = store.state().load_epoch;
    let roster: Vec<SpeciesRef> = pokemon
        .iter()
        .map(|p| SpeciesRef {
            id: p.id,
            name: p.name.clone(),
        })
        .collect();
    let requested = roster.len();
    store.dispatch(Action::RosterDidLoad { epoch, roster });
    store.dispatch(Action::BatchDidLoad {
        epoch,
        requested,
        resolved: pokemon,
    });
    store
}

fn filtered_ids(store: &EffectStore<AppState, Action, Effect>) -> Vec<u32> {
    store
        .state()
        .filtered_indices
        .iter()
        .map(|idx| store.state().pokemon[*idx].id)
        .collect()
}

#[test]
fn numeric_query_matches_id_substrings() {
    let mut store = store_with_pokemon(
        [25, 26, 125, 250, 251]
            .iter()
            .map(|id| named_mon(*id, &format!("species-{id}")))
            .collect(),
    );
    store.dispatch(Action::SearchStart);
    store.dispatch(Action::SearchInput('2'));
    store.dispatch(Action::SearchInput('5'));
    assert_eq!(filtered_ids(&store), vec![25, 125, 250, 251]);
}

#[test]
fn name_query_matches_case_insensitively() {
    let mut store = store_with_pokemon(vec![
        named_mon(25, "pikachu"),
        named_mon(26, "raichu"),
        named_mon(1, "bulbasaur"),
    ]);
    store.dispatch(Action::SearchStart);
    for ch in "PIKA".chars() {
        store.dispatch(Action::SearchInput(ch));
    }
    let names: Vec<String> = store
        .state()
        .filtered_indices
        .iter()
        .map(|idx| store.state().pokemon[*idx].name.clone())
        .collect();
    assert_eq!(names, vec!["pikachu".to_string()]);
}

#[test]
fn whitespace_only_query_leaves_the_view_unfiltered() {
    let mut store = store_with_pokemon(vec![
        named_mon(25, "pikachu"),
        named_mon(26, "raichu"),
    ]);
    store.dispatch(Action::SearchStart);
    store.dispatch(Action::SearchInput(' '));
    store.dispatch(Action::SearchInput(' '));
    assert_eq!(filtered_ids(&store), vec![25, 26]);
    assert!(!store.state().search_filter_active());
}

#[test]
fn active_filter_suspends_pagination() {
    // 25 species, first 20 loaded, 5 still pending.
    let pokemon: Vec<Pokemon> = (1..=20)
        .map(|id| named_mon(id, &format!("species-{id}")))
        .collect();
    let mut store = EffectStore::new(AppState::default(), reducer);
    store.dispatch(Action::GenerationsDidLoad(vec![GenerationInfo {
        name: "generation-i".into(),
        url: "https://pokeapi.co/api/v2/generation/1/".into(),
    }]));
    let epoch = store.state().load_epoch;
    store.dispatch(Action::RosterDidLoad {
        epoch,
        roster: (1..=25).map(species).collect(),
    });
    store.dispatch(Action::BatchDidLoad {
        epoch,
        requested: BATCH_SIZE,
        resolved: pokemon,
    });
    assert_eq!(store.state().phase, LoadPhase::Ready);

    store.dispatch(Action::SearchStart);
    store.dispatch(Action::SearchInput('1'));
    let result = store.dispatch(Action::SelectionJumpBottom);
    assert_eq!(store.state().phase, LoadPhase::Ready);
    assert!(!result
        .effects
        .iter()
        .any(|e| matches!(e, Effect::LoadBatch { .. })));

    let result = store.dispatch(Action::LoadMore);
    assert!(!result.changed);

    // Clearing the filter re-enables the sentinel.
    store.dispatch(Action::SearchCancel);
    assert_eq!(store.state().phase, LoadPhase::Ready);
    let result = store.dispatch(Action::SelectionJumpBottom);
    assert_eq!(store.state().phase, LoadPhase::FetchingBatch);
    assert!(result
        .effects
        .iter()
        .any(|e| matches!(e, Effect::LoadBatch { refs, .. } if refs.len() == 5)));
}

#[test]
fn selecting_a_row_requests_its_detail_data() {
    let mut store = store_with_pokemon(vec![
        named_mon(1, "bulbasaur"),
        named_mon(2, "ivysaur"),
    ]);
    let result = store.dispatch(Action::SelectionMove(1));
    assert!(result
        .effects
        .iter()
        .any(|e| matches!(e, Effect::LoadFlavorTexts { name } if name == "ivysaur")));
    assert!(result.effects.iter().any(
        |e| matches!(e, Effect::LoadSprite { key, url } if key == "ivysaur:front-default"
            && url == "https://sprites/2.png")
    ));
    assert!(store.state().flavor_loading);
    assert!(store.state().sprite_loading);
}

#[test]
fn toggling_the_sprite_face_requests_the_other_url() {
    let mut pokemon = named_mon(25, "pikachu");
    pokemon.sprites.back_default = Some("https://sprites/25-back.png".into());
    let mut store = store_with_pokemon(vec![pokemon]);

    let result = store.dispatch(Action::SpriteFlip);
    assert!(store.state().show_back);
    assert!(result.effects.iter().any(
        |e| matches!(e, Effect::LoadSprite { key, url } if key == "pikachu:back-default"
            && url == "https://sprites/25-back.png")
    ));
}
