use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use gendex::action::Action;
use gendex::effect::Effect;
use gendex::reducer::reducer;
use gendex::state::{AppState, DEFAULT_GENERATION_LIMIT};
use gendex::ui::{GendexComponentId, GendexContext, GendexUi};
use gendex::{api, audio, sprite};

#[derive(Parser, Debug)]
#[command(name = "gendex")]
#[command(about = "Browse Pokemon generation by generation")]
struct Args {
    /// How many generations to offer in the selector
    #[arg(long, default_value_t = DEFAULT_GENERATION_LIMIT)]
    generations: usize,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let debug = DebugSession::new(args.debug);

    let generation_limit = args.generations;
    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(generation_limit))
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(GendexUi::new()));
    let mut bus: EventBus<AppState, Action, GendexComponentId, GendexContext> = EventBus::new();
    let keybindings: Keybindings<GendexContext> = Keybindings::new();

    let ui_header = Rc::clone(&ui);
    bus.register(GendexComponentId::Header, move |event, state| {
        ui_header
            .borrow_mut()
            .handle_header_event(&event.kind, state)
    });

    let ui_list = Rc::clone(&ui);
    bus.register(GendexComponentId::DexList, move |event, state| {
        ui_list.borrow_mut().handle_list_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(GendexComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(GendexComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char('q') => HandlerResponse::action(Action::Quit),
            crossterm::event::KeyCode::Tab => HandlerResponse::action(Action::FocusNext),
            crossterm::event::KeyCode::BackTab => HandlerResponse::action(Action::FocusPrev),
            crossterm::event::KeyCode::Char('/') if !state.search.active => {
                HandlerResponse::action(Action::SearchStart)
            }
            crossterm::event::KeyCode::Char('g') if !state.search.active => {
                HandlerResponse::action(Action::GenerationNext)
            }
            crossterm::event::KeyCode::Char('m') if !state.search.active => {
                HandlerResponse::action(Action::LoadMore)
            }
            crossterm::event::KeyCode::Char('p') if !state.search.active => {
                HandlerResponse::action(Action::PlayCry)
            }
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(120), || Action::Tick);
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            handle_effect,
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>) {
    match effect {
        Effect::LoadGenerations { limit } => {
            ctx.tasks().spawn(TaskKey::new("generations"), async move {
                match api::fetch_generations(limit).await {
                    Ok(generations) => Action::GenerationsDidLoad(generations),
                    Err(error) => Action::GenerationsDidError(error.to_string()),
                }
            });
        }
        Effect::LoadRoster { generation, epoch } => {
            // Fixed key: switching generations replaces the in-flight fetch.
            ctx.tasks().spawn(TaskKey::new("roster"), async move {
                match api::fetch_generation_roster(&generation).await {
                    Ok(roster) => Action::RosterDidLoad { epoch, roster },
                    Err(error) => Action::RosterDidError {
                        epoch,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::LoadBatch { refs, epoch } => {
            let requested = refs.len();
            ctx.tasks().spawn(TaskKey::new("batch"), async move {
                match api::fetch_pokemon_batch(&refs).await {
                    Ok(slots) => Action::BatchDidLoad {
                        epoch,
                        requested,
                        resolved: slots.into_iter().flatten().collect(),
                    },
                    Err(error) => Action::BatchDidError {
                        epoch,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::LoadFlavorTexts { name } => {
            let key = format!("flavor_{name}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match api::fetch_flavor_texts(&name).await {
                    Ok(entries) => Action::FlavorDidLoad { name, entries },
                    Err(error) => Action::FlavorDidError {
                        name,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::LoadSprite { key, url } => {
            let task_key = format!("sprite_{key}");
            ctx.tasks().spawn(TaskKey::new(task_key), async move {
                match api::fetch_bytes(&url).await {
                    Ok(bytes) => match sprite::decode_sprite(&bytes, &url) {
                        Ok(sprite) => Action::SpriteDidLoad { key, sprite },
                        Err(error) => Action::SpriteDidError { key, error },
                    },
                    Err(error) => Action::SpriteDidError {
                        key,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::PlayCry { name, url } => {
            ctx.tasks().spawn(TaskKey::new("cry"), async move {
                match api::fetch_bytes(&url).await {
                    Ok(bytes) => {
                        match tokio::task::spawn_blocking(move || audio::play_cry(bytes)).await {
                            Ok(Ok(())) => Action::CryDidFinish,
                            Ok(Err(error)) => Action::CryDidError(error),
                            Err(error) => Action::CryDidError(error.to_string()),
                        }
                    }
                    Err(error) => Action::CryDidError(format!("{name}: {error}")),
                }
            });
        }
    }
}
