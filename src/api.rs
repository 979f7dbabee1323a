//! PokeAPI client: fresh HTTP request per call, no caching, no retries.

use std::sync::{Arc, OnceLock};

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::state::{
    FlavorText, GenerationInfo, Pokemon, PokemonSprites, PokemonStat, PokemonTypeSlot, SpeciesRef,
};

const API_BASE: &str = "https://pokeapi.co/api/v2";
const BATCH_CONCURRENCY: usize = 12;

#[derive(Debug)]
pub enum ApiError {
    /// Network-level fault (connect, timeout, body read).
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Status { url: String, status: StatusCode },
    /// The body was not the JSON shape we expect.
    Parse {
        url: String,
        source: serde_json::Error,
    },
    /// A batch worker task was lost before it could report.
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(err) => write!(f, "request failed: {err}"),
            ApiError::Status { url, status } => write!(f, "{url} returned {status}"),
            ApiError::Parse { url, source } => write!(f, "unexpected response from {url}: {source}"),
            ApiError::Task(err) => write!(f, "batch task failed: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct GenerationListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct GenerationDetailResponse {
    pokemon_species: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    types: Vec<TypeSlotResponse>,
    stats: Vec<StatSlotResponse>,
    sprites: serde_json::Value,
    cries: Option<CriesResponse>,
}

#[derive(Clone, Debug, Deserialize)]
struct TypeSlotResponse {
    slot: u8,
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct StatSlotResponse {
    base_stat: u16,
    stat: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct CriesResponse {
    latest: Option<String>,
    legacy: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct SpeciesResponse {
    flavor_text_entries: Vec<FlavorEntryResponse>,
}

#[derive(Clone, Debug, Deserialize)]
struct FlavorEntryResponse {
    flavor_text: String,
    language: NamedResource,
    version: NamedResource,
}

/// List generations in server order, capped at `limit`.
pub async fn fetch_generations(limit: usize) -> Result<Vec<GenerationInfo>, ApiError> {
    let url = format!("{API_BASE}/generation");
    let response: GenerationListResponse = get_json(&url).await?;
    Ok(response
        .results
        .into_iter()
        .take(limit)
        .map(|entry| GenerationInfo {
            name: entry.name,
            url: entry.url,
        })
        .collect())
}

/// Fetch one generation's species roster, sorted strictly ascending by id.
/// Species whose URL does not end in a numeric id are dropped.
pub async fn fetch_generation_roster(name: &str) -> Result<Vec<SpeciesRef>, ApiError> {
    let url = format!("{API_BASE}/generation/{name}");
    let response: GenerationDetailResponse = get_json(&url).await?;
    Ok(roster_from_species(response.pokemon_species))
}

/// Fetch one Pokemon. A 404 is an absence, not an error.
pub async fn fetch_pokemon(id: u32) -> Result<Option<Pokemon>, ApiError> {
    let url = format!("{API_BASE}/pokemon/{id}");
    let response = http_client()
        .get(&url)
        .send()
        .await
        .map_err(ApiError::Transport)?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status { url, status });
    }
    let bytes = response.bytes().await.map_err(ApiError::Transport)?;
    let parsed: PokemonResponse =
        serde_json::from_slice(&bytes).map_err(|source| ApiError::Parse { url, source })?;
    Ok(Some(pokemon_from_response(parsed)))
}

/// Resolve a batch of species concurrently, preserving input order.
///
/// Any transport/status/parse failure fails the whole batch; a 404 unit
/// keeps its slot as `None` so failures never silently vanish mid-list.
pub async fn fetch_pokemon_batch(refs: &[SpeciesRef]) -> Result<Vec<Option<Pokemon>>, ApiError> {
    if refs.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(BATCH_CONCURRENCY));
    let mut join_set = JoinSet::new();
    for (index, species) in refs.iter().enumerate() {
        let id = species.id;
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            // The semaphore is never closed while workers hold the Arc.
            let _permit = semaphore.acquire_owned().await.ok();
            (index, fetch_pokemon(id).await)
        });
    }

    let mut slots: Vec<Option<Pokemon>> = vec![None; refs.len()];
    while let Some(joined) = join_set.join_next().await {
        let (index, result) = joined.map_err(ApiError::Task)?;
        slots[index] = result?;
    }
    Ok(slots)
}

/// Fetch a species' English Pokedex entries, whitespace-normalized and
/// deduplicated by (text, version).
pub async fn fetch_flavor_texts(name: &str) -> Result<Vec<FlavorText>, ApiError> {
    let url = format!("{API_BASE}/pokemon-species/{name}");
    let response: SpeciesResponse = get_json(&url).await?;
    Ok(flavor_from_entries(response.flavor_text_entries))
}

/// Raw bytes for sprites and cries.
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, ApiError> {
    let response = http_client()
        .get(url)
        .send()
        .await
        .map_err(ApiError::Transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(response
        .bytes()
        .await
        .map_err(ApiError::Transport)?
        .to_vec())
}

async fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, ApiError> {
    let response = http_client()
        .get(url)
        .send()
        .await
        .map_err(ApiError::Transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status,
        });
    }
    let bytes = response.bytes().await.map_err(ApiError::Transport)?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Parse {
        url: url.to_string(),
        source,
    })
}

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

fn roster_from_species(entries: Vec<NamedResource>) -> Vec<SpeciesRef> {
    let mut roster: Vec<SpeciesRef> = entries
        .into_iter()
        .filter_map(|entry| {
            let id = species_id_from_url(&entry.url)?;
            Some(SpeciesRef {
                id,
                name: entry.name,
            })
        })
        .collect();
    roster.sort_by_key(|species| species.id);
    roster.dedup_by_key(|species| species.id);
    roster
}

fn species_id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

fn pokemon_from_response(response: PokemonResponse) -> Pokemon {
    let types = response
        .types
        .into_iter()
        .map(|slot| PokemonTypeSlot {
            slot: slot.slot,
            name: slot.type_info.name,
        })
        .collect();
    let stats = response
        .stats
        .into_iter()
        .map(|slot| PokemonStat {
            name: slot.stat.name,
            value: slot.base_stat,
        })
        .collect();
    let sprites = PokemonSprites {
        front_default: pointer_string(&response.sprites, "/front_default"),
        back_default: pointer_string(&response.sprites, "/back_default"),
        front_shiny: pointer_string(&response.sprites, "/front_shiny"),
        back_shiny: pointer_string(&response.sprites, "/back_shiny"),
    };
    Pokemon {
        id: response.id,
        name: response.name,
        sprites,
        stats,
        types,
        cry_latest: response.cries.as_ref().and_then(|cries| cries.latest.clone()),
        cry_legacy: response.cries.as_ref().and_then(|cries| cries.legacy.clone()),
    }
}

fn flavor_from_entries(entries: Vec<FlavorEntryResponse>) -> Vec<FlavorText> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|entry| entry.language.name == "en")
        .map(|entry| FlavorText {
            text: sanitize_flavor_text(&entry.flavor_text),
            version: entry.version.name,
        })
        .filter(|entry| seen.insert((entry.text.clone(), entry.version.clone())))
        .collect()
}

/// Collapse runs of whitespace and strip the control characters PokeAPI
/// embeds in flavor text (newlines, form feeds).
fn sanitize_flavor_text(text: &str) -> String {
    text.split(|ch: char| ch.is_whitespace() || ch.is_control())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}
