//! Loader state machine tests: batching, reentrancy, staleness.

use tui_dispatch::testing::*;
use tui_dispatch::EffectStore;
use gendex::{
    action::Action,
    effect::Effect,
    reducer::reducer,
    state::{AppState, GenerationInfo, LoadPhase, Pokemon, SpeciesRef, BATCH_SIZE},
};

fn species(id: u32) -> SpeciesRef {
    SpeciesRef {
        id,
        name: format!("species-{id}"),
    }
}

fn mon(id: u32) -> Pokemon {
    Pokemon {
        id,
        name: format!("species-{id}"),
        sprites: Default::default(),
        stats: Vec::new(),
        types: Vec::new(),
        cry_latest: None,
        cry_legacy: None,
    }
}

fn generations() -> Vec<GenerationInfo> {
    vec![
        GenerationInfo {
            name: "generation-i".into(),
            url: "https://pokeapi.co/api/v2/generation/1/".into(),
        },
        GenerationInfo {
            name: "generation-ii".into(),
            url: "https://pokeapi.co/api/v2/generation/2/".into(),
        },
    ]
}

/// Drive the store up to the first LoadBatch effect for a roster of
/// `count` species. Returns the refs requested by that first batch.
fn start_with_roster(
    store: &mut EffectStore<AppState, Action, Effect>,
    count: u32,
) -> Vec<SpeciesRef> {
    store.dispatch(Action::GenerationsDidLoad(generations()));
    let epoch = store.state().load_epoch;
    let result = store.dispatch(Action::RosterDidLoad {
        epoch,
        roster: (1..=count).map(species).collect(),
    });
    match &result.effects[0] {
        Effect::LoadBatch { refs, .. } => refs.clone(),
        other => panic!("expected LoadBatch, got {other:?}"),
    }
}

fn complete_batch(store: &mut EffectStore<AppState, Action, Effect>, refs: &[SpeciesRef]) -> Vec<Effect> {
    let epoch = store.state().load_epoch;
    let result = store.dispatch(Action::BatchDidLoad {
        epoch,
        requested: refs.len(),
        resolved: refs.iter().map(|r| mon(r.id)).collect(),
    });
    result.effects
}

#[test]
fn a_45_species_roster_loads_in_three_batches() {
    let mut store = EffectStore::new(AppState::default(), reducer);

    let first = start_with_roster(&mut store, 45);
    assert_eq!(first.len(), BATCH_SIZE);
    complete_batch(&mut store, &first);
    assert_eq!(store.state().phase, LoadPhase::Ready);
    assert!(store.state().has_more());

    let result = store.dispatch(Action::LoadMore);
    let second = match &result.effects[0] {
        Effect::LoadBatch { refs, .. } => refs.clone(),
        other => panic!("expected LoadBatch, got {other:?}"),
    };
    assert_eq!(second.len(), BATCH_SIZE);
    complete_batch(&mut store, &second);
    assert!(store.state().has_more());

    let result = store.dispatch(Action::LoadMore);
    let third = match &result.effects[0] {
        Effect::LoadBatch { refs, .. } => refs.clone(),
        other => panic!("expected LoadBatch, got {other:?}"),
    };
    assert_eq!(third.len(), 5);
    complete_batch(&mut store, &third);

    assert_eq!(store.state().phase, LoadPhase::Exhausted);
    assert!(!store.state().has_more());
    let ids: Vec<u32> = store.state().pokemon.iter().map(|p| p.id).collect();
    assert_eq!(ids, (1..=45).collect::<Vec<u32>>());
}

#[test]
fn load_more_during_an_inflight_batch_does_nothing() {
    let mut store = EffectStore::new(AppState::default(), reducer);
    start_with_roster(&mut store, 45);
    assert_eq!(store.state().phase, LoadPhase::FetchingBatch);

    let result = store.dispatch(Action::LoadMore);
    assert!(!result.changed);
    assert!(result.effects.is_empty());
}

#[test]
fn a_batch_for_a_previous_generation_is_discarded() {
    let mut store = EffectStore::new(AppState::default(), reducer);
    let refs = start_with_roster(&mut store, 45);
    let stale_epoch = store.state().load_epoch;

    store.dispatch(Action::GenerationNext);
    let result = store.dispatch(Action::BatchDidLoad {
        epoch: stale_epoch,
        requested: refs.len(),
        resolved: refs.iter().map(|r| mon(r.id)).collect(),
    });
    assert!(!result.changed);
    assert!(store.state().pokemon.is_empty());
    assert_eq!(store.state().phase, LoadPhase::FetchingRoster);
}

#[test]
fn a_failed_batch_stops_the_loader() {
    let mut store = EffectStore::new(AppState::default(), reducer);
    start_with_roster(&mut store, 45);

    let epoch = store.state().load_epoch;
    store.dispatch(Action::BatchDidError {
        epoch,
        error: "request failed: timeout".into(),
    });
    assert_eq!(store.state().phase, LoadPhase::Failed);
    assert!(!store.state().has_more());
    assert!(store.state().message.is_some());

    let result = store.dispatch(Action::LoadMore);
    assert!(!result.changed);
}

#[test]
fn an_empty_roster_is_immediately_exhausted() {
    let mut store = EffectStore::new(AppState::default(), reducer);
    store.dispatch(Action::GenerationsDidLoad(generations()));
    let epoch = store.state().load_epoch;
    let result = store.dispatch(Action::RosterDidLoad {
        epoch,
        roster: Vec::new(),
    });
    assert!(result.changed);
    assert!(result.effects.is_empty());
    assert_eq!(store.state().phase, LoadPhase::Exhausted);
    assert!(!store.state().has_more());
}

#[test]
fn switching_generation_resets_everything() {
    let mut store = EffectStore::new(AppState::default(), reducer);
    let refs = start_with_roster(&mut store, 45);
    complete_batch(&mut store, &refs);
    assert!(!store.state().pokemon.is_empty());

    let result = store.dispatch(Action::GenerationNext);
    assert!(store.state().pokemon.is_empty());
    assert!(store.state().roster.is_empty());
    assert_eq!(store.state().offset, 0);
    assert_eq!(store.state().selected_index, 0);
    assert_eq!(store.state().phase, LoadPhase::FetchingRoster);
    assert!(result
        .effects
        .iter()
        .any(|e| matches!(e, Effect::LoadRoster { generation, .. } if generation == "generation-ii")));
}

#[test]
fn init_flow_with_harness() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);

    harness.dispatch_collect(Action::Init);
    harness.assert_state(|s| s.generations_loading);
    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| matches!(e, Effect::LoadGenerations { .. }));

    harness.complete_action(Action::GenerationsDidLoad(generations()));
    let (changed, total) = harness.process_emitted();
    assert_eq!(total, 1);
    assert_eq!(changed, 1);
    harness.assert_state(|s| s.phase == LoadPhase::FetchingRoster);
    harness.assert_state(|s| s.load_epoch == 1);
}
