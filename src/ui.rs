use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{
    Component, EventContext, EventKind, EventRoutingState, HandlerResponse, RenderContext,
};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps, SelectListStyle,
    SelectionStyle, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle,
};

use crate::action::Action;
use crate::sprite;
use crate::state::{AppState, FocusArea, LoadPhase, PokemonStat};

const BG_BASE: Color = Color::Rgb(14, 16, 26);
const BG_PANEL: Color = Color::Rgb(22, 28, 44);
const BG_HIGHLIGHT: Color = Color::Rgb(52, 78, 120);
const TEXT_MAIN: Color = Color::Rgb(236, 240, 246);
const TEXT_DIM: Color = Color::Rgb(158, 170, 192);
const ACCENT_RED: Color = Color::Rgb(226, 92, 84);
const ACCENT_YELLOW: Color = Color::Rgb(238, 200, 92);

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GendexComponentId {
    Header,
    DexList,
    Detail,
    Search,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GendexContext {
    Header,
    DexList,
    Detail,
    Search,
}

impl EventRoutingState<GendexComponentId, GendexContext> for AppState {
    fn focused(&self) -> Option<GendexComponentId> {
        if self.search.active {
            return Some(GendexComponentId::Search);
        }
        match self.focus {
            FocusArea::Header => Some(GendexComponentId::Header),
            FocusArea::DexList => Some(GendexComponentId::DexList),
            FocusArea::Detail => Some(GendexComponentId::Detail),
        }
    }

    fn modal(&self) -> Option<GendexComponentId> {
        if self.search.active {
            Some(GendexComponentId::Search)
        } else {
            None
        }
    }

    fn binding_context(&self, id: GendexComponentId) -> GendexContext {
        match id {
            GendexComponentId::Header => GendexContext::Header,
            GendexComponentId::DexList => GendexContext::DexList,
            GendexComponentId::Detail => GendexContext::Detail,
            GendexComponentId::Search => GendexContext::Search,
        }
    }

    fn default_context(&self) -> GendexContext {
        GendexContext::DexList
    }
}

pub struct GendexUi {
    dex_list: SelectList,
    status_bar: StatusBar,
}

impl GendexUi {
    pub fn new() -> Self {
        Self {
            dex_list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<GendexComponentId>,
    ) {
        render_app(
            frame,
            area,
            state,
            render_ctx,
            event_ctx,
            &mut self.dex_list,
            &mut self.status_bar,
        );
    }

    pub fn handle_header_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_header_event(event, state)
    }

    pub fn handle_list_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_list_event(event, state, &mut self.dex_list)
    }

    pub fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_detail_event(event, state)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_search_event(event, state)
    }
}

impl Default for GendexUi {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_app(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    _render_ctx: RenderContext,
    event_ctx: &mut EventContext<GendexComponentId>,
    dex_list: &mut SelectList,
    status_bar: &mut StatusBar,
) {
    let base = Block::default().style(Style::default().bg(BG_BASE));
    frame.render_widget(base, area);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(frame, layout[0], state, event_ctx);
    render_body(frame, layout[1], state, event_ctx, dex_list);
    render_footer(frame, layout[2], state, status_bar);
}

pub fn handle_header_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Left | crossterm::event::KeyCode::Char('h') => {
                vec![Action::GenerationPrev]
            }
            crossterm::event::KeyCode::Right | crossterm::event::KeyCode::Char('l') => {
                vec![Action::GenerationNext]
            }
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_list_event(
    event: &EventKind,
    state: &AppState,
    dex_list: &mut SelectList,
) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::PageDown => vec![Action::SelectionPage(1)],
            crossterm::event::KeyCode::PageUp => vec![Action::SelectionPage(-1)],
            crossterm::event::KeyCode::Home => vec![Action::SelectionJumpTop],
            crossterm::event::KeyCode::End | crossterm::event::KeyCode::Char('G') => {
                vec![Action::SelectionJumpBottom]
            }
            _ => {
                let items = dex_items(state);
                let props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.selected_index.min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: dex_list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: Action::DexSelect,
                    render_item: &|item| item.clone(),
                };
                let actions: Vec<_> = dex_list.handle_event(event, props).into_iter().collect();
                return handler_response(actions);
            }
        },
        EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 3) as i16)],
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_detail_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char('b') => vec![Action::SpriteFlip],
            crossterm::event::KeyCode::Char('s') => vec![Action::SpriteShinyToggle],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_search_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Esc => vec![Action::SearchCancel],
            crossterm::event::KeyCode::Enter => vec![Action::SearchSubmit],
            crossterm::event::KeyCode::Backspace => vec![Action::SearchBackspace],
            crossterm::event::KeyCode::Char(ch) => vec![Action::SearchInput(ch)],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<GendexComponentId>,
) {
    event_ctx.set_component_area(GendexComponentId::Header, area);
    if state.search.active {
        event_ctx.set_component_area(GendexComponentId::Search, area);
    }
    let generation = state
        .current_generation()
        .map(|generation| generation.label())
        .unwrap_or_else(|| {
            if state.generations_loading {
                "LOADING...".to_string()
            } else {
                "NO GENERATION".to_string()
            }
        });
    let search = if state.search.active {
        format!("/{}_", state.search.query)
    } else if state.search.query.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", state.search.query)
    };
    let progress = format!("{}/{}", state.pokemon.len(), state.roster.len());
    let header_text = Line::from(vec![
        Span::styled(
            format!("< {generation} >"),
            Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  Loaded: "),
        Span::styled(progress, Style::default().fg(ACCENT_YELLOW)),
        Span::raw("  "),
        Span::styled(phase_label(state), Style::default().fg(TEXT_DIM)),
        Span::raw("  |  Search: "),
        Span::styled(search, Style::default().fg(ACCENT_YELLOW)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(focus_border(state, FocusArea::Header))
        .title("GENDEX");
    let paragraph = Paragraph::new(header_text)
        .block(block)
        .style(Style::default().fg(TEXT_MAIN));
    frame.render_widget(paragraph, area);
}

fn phase_label(state: &AppState) -> &'static str {
    match state.phase {
        LoadPhase::Idle => "",
        LoadPhase::FetchingRoster => "(fetching roster)",
        LoadPhase::FetchingBatch => "(loading)",
        LoadPhase::Ready => "(more below)",
        LoadPhase::Exhausted => "(complete)",
        LoadPhase::Failed => "(failed)",
    }
}

fn render_body(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<GendexComponentId>,
    dex_list: &mut SelectList,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(36), Constraint::Percentage(64)])
        .split(area);

    render_list(frame, layout[0], state, event_ctx, dex_list);
    render_detail(frame, layout[1], state, event_ctx);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<GendexComponentId>,
    dex_list: &mut SelectList,
) {
    event_ctx.set_component_area(GendexComponentId::DexList, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("DEX")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(focus_border(state, FocusArea::DexList));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items = dex_items(state);
    if items.is_empty() {
        let message = match state.phase {
            LoadPhase::FetchingRoster => "Fetching roster...",
            LoadPhase::FetchingBatch => "Loading...",
            LoadPhase::Failed => "Load failed.",
            _ if state.search_filter_active() => "No matches.",
            _ => "Nothing here.",
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(TEXT_DIM))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: state.selected_index.min(items.len().saturating_sub(1)),
        is_focused: state.focus == FocusArea::DexList,
        style: dex_list_style(),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::DexSelect,
        render_item: &|item| item.clone(),
    };
    dex_list.render(frame, inner, props);
}

fn render_detail(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<GendexComponentId>,
) {
    event_ctx.set_component_area(GendexComponentId::Detail, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("DATA")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(focus_border(state, FocusArea::Detail));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(selected) = state.selected_pokemon() else {
        frame.render_widget(
            Paragraph::new("Select a Pokemon.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM)),
            inner,
        );
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(14), Constraint::Min(4)])
        .split(inner);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[0]);

    render_sprite(frame, top[0], state);
    render_profile(frame, top[1], state);
    render_entries(frame, layout[1], state, &selected.name);
}

fn render_sprite(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(name) = state.detail_name.as_ref() {
        let key = state.sprite_key(name);
        if let Some(sprite) = state.sprite_cache.get(&key) {
            if let Some(sprite_frame) = sprite.frame(state.sprite_frame_index) {
                sprite::blit(sprite_frame, frame.buffer_mut(), area);
                return;
            }
        }
    }

    let content = if state.sprite_loading {
        "[loading sprite]"
    } else {
        "[no sprite]"
    };
    frame.render_widget(
        Paragraph::new(content)
            .alignment(Alignment::Center)
            .style(Style::default().fg(TEXT_DIM)),
        area,
    );
}

fn render_profile(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("STATS")
        .style(Style::default().fg(TEXT_MAIN));
    frame.render_widget(
        Paragraph::new(profile_text(state))
            .block(block)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn profile_text(state: &AppState) -> Text<'static> {
    let Some(selected) = state.selected_pokemon() else {
        return Text::from("No data.");
    };
    let types = selected
        .types
        .iter()
        .map(|slot| format_name(&slot.name))
        .collect::<Vec<_>>()
        .join(" / ");
    let face = if state.show_back { "back" } else { "front" };
    let variant = if state.show_shiny { "shiny" } else { "default" };
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}  #{:03}", selected.name.to_ascii_uppercase(), selected.id),
            Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Type: {types}")),
        Line::from(Span::styled(
            format!("[{face}/{variant}]"),
            Style::default().fg(TEXT_DIM),
        )),
        Line::from(" "),
    ];
    lines.extend(
        selected
            .stats
            .iter()
            .map(|stat| Line::from(render_stat(stat))),
    );
    Text::from(lines)
}

fn render_entries(frame: &mut Frame, area: Rect, state: &AppState, name: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("ENTRIES")
        .style(Style::default().fg(TEXT_MAIN));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(entries) = state.flavor_texts.get(name) else {
        let message = if state.flavor_loading {
            "Loading entries..."
        } else {
            "No entries."
        };
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(TEXT_DIM)),
            inner,
        );
        return;
    };
    if entries.is_empty() {
        frame.render_widget(
            Paragraph::new("No entries.").style(Style::default().fg(TEXT_DIM)),
            inner,
        );
        return;
    }

    let mut lines = Vec::new();
    for entry in entries {
        lines.push(Line::from(Span::styled(
            format_name(&entry.version),
            Style::default()
                .fg(ACCENT_YELLOW)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(entry.text.clone()));
        lines.push(Line::from(" "));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(TEXT_MAIN))
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state.message.clone().unwrap_or_else(|| {
        if state.generations_loading {
            "Loading generations...".to_string()
        } else if state.phase.is_loading() {
            "Loading...".to_string()
        } else if state.flavor_loading {
            "Loading entries...".to_string()
        } else if state.sprite_loading {
            "Loading sprite...".to_string()
        } else {
            "".to_string()
        }
    });
    let (left_hints, center_hints) = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_YELLOW));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_RED)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_RED)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    if state.search.active {
        let left = vec![
            StatusBarHint::new("Enter", "Apply"),
            StatusBarHint::new("Esc", "Cancel"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
        let center = vec![StatusBarHint::new("q", "Quit")];
        return (left, center);
    }

    let mut left = Vec::new();
    match state.focus {
        FocusArea::Header => {
            left.push(StatusBarHint::new("h/l", "Generation"));
        }
        FocusArea::DexList => {
            left.extend([
                StatusBarHint::new("j/k", "Move"),
                StatusBarHint::new("PgUp/PgDn", "Page"),
                StatusBarHint::new("End", "Bottom"),
                StatusBarHint::new("m", "More"),
            ]);
        }
        FocusArea::Detail => {
            left.extend([
                StatusBarHint::new("b", "Back"),
                StatusBarHint::new("s", "Shiny"),
            ]);
        }
    }

    let center = vec![
        StatusBarHint::new("Tab", "Focus"),
        StatusBarHint::new("/", "Search"),
        StatusBarHint::new("g", "Generation"),
        StatusBarHint::new("p", "Cry"),
        StatusBarHint::new("q", "Quit"),
    ];
    (left, center)
}

fn dex_items(state: &AppState) -> Vec<Line<'static>> {
    state
        .filtered_indices
        .iter()
        .filter_map(|idx| state.pokemon.get(*idx))
        .map(|entry| Line::from(format!("#{:03} {}", entry.id, format_name(&entry.name))))
        .collect()
}

fn dex_list_style() -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: None,
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

fn format_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => "".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_stat(stat: &PokemonStat) -> String {
    let label = shorten_stat(&stat.name);
    let bar_len = (stat.value as usize / 10).clamp(1, 20);
    let bar = "#".repeat(bar_len);
    format!("{label:>4} {value:>3} {bar}", value = stat.value)
}

fn shorten_stat(name: &str) -> String {
    match name {
        "hp" => " HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SAT".to_string(),
        "special-defense" => "SDF".to_string(),
        "speed" => "SPD".to_string(),
        _ => name.to_ascii_uppercase(),
    }
}

fn focus_border(state: &AppState, area: FocusArea) -> Style {
    if state.focus == area {
        Style::default()
            .fg(ACCENT_RED)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(TEXT_DIM)
    }
}
