use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use serde_json::Value;
use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};

use crate::history::ChangeAction;
use crate::profile::{ModelOverrides, Profile, ProfileUpdate, local_time, mask_token};
use crate::providers::{PROVIDERS, Provider};
use crate::registry::ProfileRegistry;

/// Changes shown in the history popup.
const HISTORY_POPUP_LIMIT: usize = 20;

/// Application state for the TUI
pub struct App<'a> {
    registry: &'a ProfileRegistry,
    pub profiles: Vec<Profile>,
    pub current_model: Option<String>,
    pub selected: usize,
    pub should_quit: bool,
    pub popup: Option<Popup>,
    pub input_buffer: String,
    pub message: Option<(String, Instant)>,
    /// Set when the user asked to launch; claude starts after the TUI closes.
    pub launch_request: Option<Profile>,
}

/// Types of popups that can be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    ConfirmDelete(String),
    ConfirmSwitch(String),
    Rename(String),
    History,
    /// Provider preset picker; holds the highlighted index into `PROVIDERS`.
    Providers(usize),
    Form(ProfileForm),
}

/// Base URL offered by the manual add form.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const NAME: usize = 0;
const TOKEN: usize = 1;
const BASE_URL: usize = 2;
const DESCRIPTION: usize = 3;
const OPUS: usize = 4;
const SONNET: usize = 5;
const HAIKU: usize = 6;

const FORM_LABELS: [&str; 7] = [
    "Name",
    "Token",
    "Base URL",
    "Description",
    "Opus model",
    "Sonnet model",
    "Haiku model",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Add,
    /// Edits the profile with this name.
    Update(String),
}

/// What a key press did to a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormEvent {
    Editing,
    Submit,
    Cancel,
}

/// Editable fields of a profile, in `FORM_LABELS` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub kind: FormKind,
    pub values: [String; 7],
    pub focused: usize,
}

impl ProfileForm {
    /// Empty add form.
    pub fn blank() -> Self {
        let mut values: [String; 7] = Default::default();
        values[BASE_URL] = DEFAULT_BASE_URL.to_string();
        Self {
            kind: FormKind::Add,
            values,
            focused: NAME,
        }
    }

    /// Add form filled in from a preset; `custom` leaves everything but the name to the user.
    pub fn from_provider(provider: &Provider) -> Self {
        let mut values: [String; 7] = Default::default();
        if !provider.needs_base_url() {
            values[BASE_URL] = provider.base_url.to_string();
            values[DESCRIPTION] = format!("{} configuration", provider.name);
        }
        values[OPUS] = provider.opus_model.unwrap_or_default().to_string();
        values[SONNET] = provider.sonnet_model.unwrap_or_default().to_string();
        values[HAIKU] = provider.haiku_model.unwrap_or_default().to_string();
        Self {
            kind: FormKind::Add,
            values,
            focused: NAME,
        }
    }

    /// Update form for `profile`. The token starts blank; blank keeps the stored one.
    pub fn for_update(profile: &Profile) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            kind: FormKind::Update(profile.name.clone()),
            values: [
                profile.name.clone(),
                String::new(),
                profile.base_url.clone(),
                text(&profile.description),
                text(&profile.opus_model),
                text(&profile.sonnet_model),
                text(&profile.haiku_model),
            ],
            focused: NAME,
        }
    }

    fn value(&self, field: usize) -> &str {
        self.values[field].trim()
    }

    fn optional(&self, field: usize) -> Option<String> {
        Some(self.value(field).to_string()).filter(|v| !v.is_empty())
    }

    pub fn overrides(&self) -> ModelOverrides {
        ModelOverrides {
            opus: self.optional(OPUS),
            sonnet: self.optional(SONNET),
            haiku: self.optional(HAIKU),
        }
    }

    /// Patch with the fields that differ from `current`. Blank name, token
    /// or base URL keep the stored value; blank description or model clears it.
    pub fn to_update(&self, current: &Profile) -> ProfileUpdate {
        let kept = |field: usize, stored: &str| {
            let value = self.value(field);
            (!value.is_empty() && value != stored).then(|| value.to_string())
        };
        let cleared = |field: usize, stored: &Option<String>| {
            let value = self.value(field);
            (value != stored.as_deref().unwrap_or("")).then(|| value.to_string())
        };
        let model = |field: usize, stored: &Option<String>| {
            cleared(field, stored).map(|value| Some(value).filter(|v| !v.is_empty()))
        };

        ProfileUpdate {
            name: kept(NAME, &current.name),
            token: kept(TOKEN, &current.token),
            base_url: kept(BASE_URL, &current.base_url),
            description: cleared(DESCRIPTION, &current.description),
            opus_model: model(OPUS, &current.opus_model),
            sonnet_model: model(SONNET, &current.sonnet_model),
            haiku_model: model(HAIKU, &current.haiku_model),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Add => " Add Model ",
            FormKind::Update(_) => " Update Model ",
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> FormEvent {
        match key.code {
            KeyCode::Enter => return FormEvent::Submit,
            KeyCode::Esc => return FormEvent::Cancel,
            KeyCode::Tab | KeyCode::Down => self.focused = (self.focused + 1) % FORM_LABELS.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focused = (self.focused + FORM_LABELS.len() - 1) % FORM_LABELS.len();
            }
            KeyCode::Char(c) => self.values[self.focused].push(c),
            KeyCode::Backspace => {
                self.values[self.focused].pop();
            }
            _ => {}
        }
        FormEvent::Editing
    }
}

impl<'a> App<'a> {
    pub fn new(registry: &'a ProfileRegistry) -> Result<Self> {
        let mut app = Self {
            registry,
            profiles: Vec::new(),
            current_model: None,
            selected: 0,
            should_quit: false,
            popup: None,
            input_buffer: String::new(),
            message: None,
            launch_request: None,
        };
        app.refresh()?;
        Ok(app)
    }

    pub fn refresh(&mut self) -> Result<()> {
        let data = self.registry.store().read_store()?;
        self.profiles = data.models;
        self.current_model = data.current_model;

        if !self.profiles.is_empty() && self.selected >= self.profiles.len() {
            self.selected = self.profiles.len() - 1;
        }
        Ok(())
    }

    pub fn select_next(&mut self) {
        if !self.profiles.is_empty() {
            self.selected = (self.selected + 1) % self.profiles.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.profiles.is_empty() {
            self.selected = if self.selected == 0 {
                self.profiles.len() - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn selected_profile(&self) -> Option<&Profile> {
        self.profiles.get(self.selected)
    }

    fn selected_name(&self) -> Option<String> {
        self.selected_profile().map(|p| p.name.clone())
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current_model.as_deref() == Some(name)
    }

    pub fn show_message(&mut self, msg: impl Into<String>) {
        self.message = Some((msg.into(), Instant::now()));
    }

    pub fn expire_message(&mut self) {
        if let Some((_, shown_at)) = &self.message
            && shown_at.elapsed() >= Duration::from_millis(1500)
        {
            self.message = None;
        }
    }

    pub fn switch_to(&mut self, name: &str) -> Result<()> {
        match self.registry.switch_model(name) {
            Ok(_) => self.show_message(format!("Switched to model '{name}'")),
            Err(e) => self.show_message(format!("Failed to switch model: {e}")),
        }
        self.refresh()
    }

    /// Switch to the selected model and leave the TUI so it can be launched.
    pub fn launch_selected(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };
        match self.registry.switch_model(&name) {
            Ok(profile) => {
                self.launch_request = Some(profile);
                self.should_quit = true;
            }
            Err(e) => self.show_message(format!("Failed to switch model: {e}")),
        }
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        match self.registry.remove_model(name) {
            Ok(_) => self.show_message(format!("Model '{name}' removed")),
            Err(e) => self.show_message(format!("Failed to remove model: {e}")),
        }
        self.refresh()
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        let update = ProfileUpdate {
            name: Some(new_name.to_string()),
            ..Default::default()
        };
        match self.registry.update_model(name, update) {
            Ok(_) => self.show_message(format!("Model renamed to '{new_name}'")),
            Err(e) => self.show_message(format!("Failed to rename model: {e}")),
        }
        self.refresh()
    }

    fn select_named(&mut self, name: &str) {
        if let Some(index) = self.profiles.iter().position(|p| p.name == name) {
            self.selected = index;
        }
    }

    /// Save a submitted form. On failure the form stays open with its input.
    fn submit_form(&mut self, form: ProfileForm) -> Result<()> {
        match form.kind.clone() {
            FormKind::Add => {
                let added = self.registry.add_model(
                    form.value(NAME),
                    form.value(TOKEN),
                    form.value(BASE_URL),
                    Some(form.value(DESCRIPTION)),
                    form.overrides(),
                );
                match added {
                    Ok(profile) => {
                        self.show_message(format!("Model '{}' added", profile.name));
                        self.refresh()?;
                        self.select_named(&profile.name);
                    }
                    Err(e) => {
                        self.show_message(format!("Failed to add model: {e}"));
                        self.popup = Some(Popup::Form(form));
                    }
                }
            }
            FormKind::Update(name) => {
                let Some(current) = self.profiles.iter().find(|p| p.name == name).cloned() else {
                    self.show_message(format!("Model '{name}' no longer exists"));
                    return self.refresh();
                };
                let update = form.to_update(&current);
                if update.is_empty() {
                    self.show_message("No changes made");
                    return Ok(());
                }
                match self.registry.update_model(&name, update) {
                    Ok(profile) => {
                        self.show_message(format!("Model '{}' updated", profile.name));
                        self.refresh()?;
                        self.select_named(&profile.name);
                    }
                    Err(e) => {
                        self.show_message(format!("Failed to update model: {e}"));
                        self.popup = Some(Popup::Form(form));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup.take() {
            Some(popup) => self.handle_popup_key(key, popup),
            None => self.handle_main_key(key),
        }
    }

    /// Handle a key for the open popup, which has already been taken out of
    /// `self.popup`; arms that keep it open put it back.
    fn handle_popup_key(&mut self, key: KeyEvent, popup: Popup) -> Result<()> {
        match popup {
            Popup::ConfirmDelete(name) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.delete(&name)?,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
                _ => self.popup = Some(Popup::ConfirmDelete(name)),
            },
            Popup::ConfirmSwitch(name) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.switch_to(&name)?,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
                _ => self.popup = Some(Popup::ConfirmSwitch(name)),
            },
            Popup::Rename(name) => match key.code {
                KeyCode::Enter => {
                    let new_name = self.input_buffer.trim().to_string();
                    if new_name.is_empty() {
                        self.popup = Some(Popup::Rename(name));
                    } else {
                        self.input_buffer.clear();
                        self.rename(&name, &new_name)?;
                    }
                }
                KeyCode::Esc => self.input_buffer.clear(),
                code => {
                    match code {
                        KeyCode::Char(c) => self.input_buffer.push(c),
                        KeyCode::Backspace => {
                            self.input_buffer.pop();
                        }
                        _ => {}
                    }
                    self.popup = Some(Popup::Rename(name));
                }
            },
            Popup::History => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('h')) {
                    self.popup = Some(Popup::History);
                }
            }
            Popup::Providers(selected) => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    let previous = selected.checked_sub(1).unwrap_or(PROVIDERS.len() - 1);
                    self.popup = Some(Popup::Providers(previous));
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.popup = Some(Popup::Providers((selected + 1) % PROVIDERS.len()));
                }
                KeyCode::Enter => {
                    if let Some(provider) = PROVIDERS.get(selected) {
                        self.popup = Some(Popup::Form(ProfileForm::from_provider(provider)));
                    }
                }
                KeyCode::Esc | KeyCode::Char('q') => {}
                _ => self.popup = Some(Popup::Providers(selected)),
            },
            Popup::Form(mut form) => match form.handle_key(key) {
                FormEvent::Editing => self.popup = Some(Popup::Form(form)),
                FormEvent::Cancel => {}
                FormEvent::Submit => self.submit_form(form)?,
            },
        }
        Ok(())
    }

    fn handle_main_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Enter => {
                if let Some(name) = self.selected_name() {
                    if self.is_current(&name) {
                        self.show_message(format!("Already using model '{name}'"));
                    } else {
                        self.popup = Some(Popup::ConfirmSwitch(name));
                    }
                }
            }
            KeyCode::Char('l') => self.launch_selected(),
            KeyCode::Char('d') => {
                if let Some(name) = self.selected_name() {
                    self.popup = Some(Popup::ConfirmDelete(name));
                }
            }
            KeyCode::Char('r') => {
                if let Some(name) = self.selected_name() {
                    self.input_buffer.clear();
                    self.popup = Some(Popup::Rename(name));
                }
            }
            KeyCode::Char('a') => self.popup = Some(Popup::Providers(0)),
            KeyCode::Char('n') => self.popup = Some(Popup::Form(ProfileForm::blank())),
            KeyCode::Char('u') => {
                if let Some(profile) = self.selected_profile() {
                    self.popup = Some(Popup::Form(ProfileForm::for_update(profile)));
                }
            }
            KeyCode::Char('h') => self.popup = Some(Popup::History),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
        Ok(())
    }
}

/// Draw the whole screen for `app`.
pub fn render(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(4), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_model_list(app, f, main[0]);
    render_model_details(app, f, main[1]);

    render_footer(f, chunks[2]);

    if let Some(popup) = &app.popup {
        render_popup(app, f, popup);
    }
    if let Some((message, _)) = &app.message {
        render_message(f, message);
    }
}

fn rounded(title: impl Into<Line<'static>>, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .border_style(Style::default().fg(color))
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Claude Model Manager",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            "Interactive",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(rounded(" cm ", Color::Blue))
    .alignment(Alignment::Center);

    f.render_widget(header, area);
}

fn render_model_list(app: &App, f: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .profiles
        .iter()
        .map(|profile| {
            let is_current = app.is_current(&profile.name);
            let style = if is_current {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            let prefix = if is_current { "▶ " } else { "  " };
            ListItem::new(format!("{prefix}{}", profile.name)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(rounded(" Models ", Color::Blue))
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(50, 50, 100))
                .add_modifier(Modifier::BOLD)
                .fg(Color::White),
        );

    let mut state = ListState::default();
    if !app.profiles.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_model_details(app: &App, f: &mut Frame, area: Rect) {
    let Some(profile) = app.selected_profile() else {
        let paragraph = Paragraph::new("No models configured. Use \"cm add\" to add one.")
            .block(rounded(" Details ", Color::Blue))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };

    let mut lines = profile_json_lines(profile);
    if let Some(last_used) = profile.last_used {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Last used: {}", local_time(last_used)),
            Style::default().fg(Color::Blue),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(rounded(format!(" Details: {} ", profile.name), Color::Blue))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

/// The profile as pretty JSON with the token masked, syntax highlighted.
pub fn profile_json_lines(profile: &Profile) -> Vec<Line<'static>> {
    let mut value = match serde_json::to_value(profile) {
        Ok(value) => value,
        Err(_) => return vec![Line::from("Failed to render model details")],
    };
    if let Some(obj) = value.as_object_mut() {
        obj.insert("token".to_string(), Value::String(mask_token(&profile.token)));
    }
    match serde_json::to_string_pretty(&value) {
        Ok(pretty) => highlight_json(&pretty),
        Err(_) => vec![Line::from("Failed to render model details")],
    }
}

fn highlight_json(json: &str) -> Vec<Line<'static>> {
    json.lines().map(highlight_json_line).collect()
}

fn highlight_json_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(ch) = rest.chars().next() {
        if ch == '"' {
            // Strings in serde_json output never contain an unescaped quote.
            let end = string_end(rest);
            let (literal, tail) = rest.split_at(end);
            let is_key = tail.trim_start().starts_with(':');
            let style = if is_key {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if literal.contains("...") || literal.starts_with("\"*") {
                Style::default().fg(Color::Red).add_modifier(Modifier::DIM)
            } else if literal.contains("http") {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Magenta)
            };
            spans.push(Span::styled(literal.to_string(), style));
            rest = tail;
        } else if ch.is_ascii_alphanumeric() {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.'))
                .unwrap_or(rest.len());
            let (word, tail) = rest.split_at(end);
            let style = match word {
                "null" => Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
                _ => Style::default().fg(Color::Blue),
            };
            spans.push(Span::styled(word.to_string(), style));
            rest = tail;
        } else {
            let style = match ch {
                '{' | '}' | '[' | ']' => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::White),
            };
            spans.push(Span::styled(ch.to_string(), style));
            rest = &rest[ch.len_utf8()..];
        }
    }

    Line::from(spans)
}

/// Byte offset just past the closing quote of the string starting `s`.
fn string_end(s: &str) -> usize {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return i + 1,
            _ => escaped = false,
        }
    }
    s.len()
}

fn render_footer(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };
    let label = |l: &'static str| Span::styled(l, Style::default().fg(Color::Gray));

    let help = vec![
        Line::from(vec![
            key("↑/↓"),
            label(": Navigate  "),
            key("Enter"),
            label(": Switch  "),
            key("l"),
            label(": Switch + launch  "),
            key("d"),
            label(": Delete"),
        ]),
        Line::from(vec![
            key("a"),
            label(": Add from provider  "),
            key("n"),
            label(": Add  "),
            key("u"),
            label(": Update  "),
            key("r"),
            label(": Rename  "),
            key("h"),
            label(": History  "),
            Span::styled(
                "q",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            label(": Quit"),
        ]),
    ];

    let footer = Paragraph::new(help)
        .block(rounded("", Color::Blue))
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn render_popup(app: &App, f: &mut Frame, popup: &Popup) {
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);

    let (title, color, content) = match popup {
        Popup::ConfirmDelete(name) => (
            " Confirm Delete ",
            Color::Red,
            vec![
                Line::from(format!("Remove model '{name}'?")),
                Line::from(""),
                Line::from("y: Yes  n: No  Esc: Cancel"),
            ],
        ),
        Popup::ConfirmSwitch(name) => (
            " Confirm Switch ",
            Color::Yellow,
            vec![
                Line::from(format!("Switch to model '{name}'?")),
                Line::from(""),
                Line::from("y/Enter: Yes  n/Esc: No"),
            ],
        ),
        Popup::Rename(name) => (
            " Rename Model ",
            Color::Cyan,
            vec![
                Line::from(format!("From: {name}")),
                Line::from(format!("To: {}", app.input_buffer)),
                Line::from(""),
                Line::from("Enter: Confirm  Esc: Cancel"),
            ],
        ),
        Popup::History => (" Change History ", Color::Green, history_lines(app)),
        Popup::Providers(selected) => (" Add From Provider ", Color::Green, provider_lines(*selected)),
        Popup::Form(form) => (form.title(), Color::Cyan, form_lines(form)),
    };

    let left_aligned = matches!(popup, Popup::History | Popup::Providers(_) | Popup::Form(_));
    let alignment = if left_aligned {
        Alignment::Left
    } else {
        Alignment::Center
    };
    let paragraph = Paragraph::new(content)
        .block(rounded(title, color))
        .style(Style::default().fg(Color::White))
        .alignment(alignment)
        .wrap(Wrap { trim: !left_aligned });
    f.render_widget(paragraph, area);
}

fn marker(selected: bool) -> (&'static str, Style) {
    if selected {
        (
            "▶ ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(Color::White))
    }
}

fn provider_lines(selected: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = PROVIDERS
        .iter()
        .enumerate()
        .map(|(i, provider)| {
            let (prefix, style) = marker(i == selected);
            Line::from(vec![
                Span::styled(format!("{prefix}{:<11}", provider.key), style),
                Span::styled(
                    format!("{} - {}", provider.name, provider.description),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from("↑/↓: Select  Enter: Continue  Esc: Cancel"));
    lines
}

fn form_lines(form: &ProfileForm) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = FORM_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let focused = i == form.focused;
            let (prefix, style) = marker(focused);
            let value = if i == TOKEN {
                "*".repeat(form.values[i].chars().count())
            } else {
                form.values[i].clone()
            };
            let mut spans = vec![
                Span::styled(format!("{prefix}{label:<14}"), style),
                Span::raw(value),
            ];
            if focused {
                spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
            }
            Line::from(spans)
        })
        .collect();

    lines.push(Line::from(""));
    if matches!(form.kind, FormKind::Update(_)) {
        lines.push(Line::from(Span::styled(
            "Leave the token blank to keep it. A blank model clears it.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from("Tab/↑↓: Field  Enter: Save  Esc: Cancel"));
    lines
}

fn history_lines(app: &App) -> Vec<Line<'static>> {
    let log = match app.registry.history().get_history() {
        Ok(log) => log,
        Err(e) => return vec![Line::from(format!("Failed to read history: {e}"))],
    };
    if log.is_empty() {
        return vec![Line::from("No change history available.")];
    }

    log.recent(HISTORY_POPUP_LIMIT)
        .iter()
        .map(|change| {
            let color = match change.action.known() {
                Some(ChangeAction::Add) => Color::Green,
                Some(ChangeAction::Remove) => Color::Red,
                _ => Color::Yellow,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", local_time(change.timestamp)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<7}", change.action.as_str().to_uppercase()),
                    Style::default().fg(color),
                ),
                Span::raw(format!(" {}", change.model_name)),
            ])
        })
        .collect()
}

fn render_message(f: &mut Frame, message: &str) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let paragraph = Paragraph::new(message)
        .block(rounded("", Color::Green))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Terminal owner; restores the screen when dropped.
struct TuiApp<'a> {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: App<'a>,
}

impl<'a> TuiApp<'a> {
    fn new(registry: &'a ProfileRegistry) -> Result<Self> {
        let app = App::new(registry)?;
        enable_raw_mode()?;
        let terminal = undo_on_error(enter_screen, restore_screen)?;
        Ok(Self { terminal, app })
    }

    fn run(&mut self) -> Result<()> {
        while !self.app.should_quit {
            let app = &self.app;
            self.terminal.draw(|f| render(app, f))?;

            if event::poll(Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.app.handle_key(key)?;
            }
            self.app.expire_message();
        }
        Ok(())
    }
}

fn enter_screen() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Leave raw mode and the alternate screen when setup fails before `TuiApp` exists.
fn restore_screen() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Run `setup`, calling `undo` if it fails.
fn undo_on_error<T, E>(setup: impl FnOnce() -> Result<T, E>, undo: impl FnOnce()) -> Result<T, E> {
    setup().inspect_err(|_| undo())
}

impl Drop for TuiApp<'_> {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the interactive UI. Returns the model to launch, if the user chose one.
pub fn launch_tui(registry: &ProfileRegistry) -> Result<Option<Profile>> {
    if !io::stdout().is_terminal() {
        anyhow::bail!("Interactive mode requires a terminal.");
    }

    if let Ok((width, height)) = crossterm::terminal::size()
        && (width < 80 || height < 24)
    {
        eprintln!("Warning: Terminal size ({width}x{height}) is smaller than recommended (80x24)");
    }

    let _ = color_eyre::install();

    let mut tui = TuiApp::new(registry)
        .map_err(|e| anyhow::anyhow!("Failed to initialize interactive mode: {e}"))?;
    tui.run()?;
    let launch = tui.app.launch_request.take();
    drop(tui);
    Ok(launch)
}
