use crate::state::SpeciesRef;

/// Side effects requested by the reducer and executed by the runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadGenerations { limit: usize },
    LoadRoster { generation: String, epoch: u64 },
    LoadBatch { refs: Vec<SpeciesRef>, epoch: u64 },
    LoadFlavorTexts { name: String },
    LoadSprite { key: String, url: String },
    PlayCry { name: String, url: String },
}
