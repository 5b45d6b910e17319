use std::cell::Cell;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::{debug, error};

use crate::data::EventTable;
use crate::filter::{self, cycle, Domain, FilteredView, Selections};
use crate::map::{MapRenderer, Viewport};
use crate::present::{self, GeoView, Render};

/// Sidebar controls in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Group,
    Country,
    YearFrom,
    YearTo,
    AttackTypes,
    MinFatalities,
    Keyword,
}

impl Control {
    pub const ALL: [Control; 7] = [
        Control::Group,
        Control::Country,
        Control::YearFrom,
        Control::YearTo,
        Control::AttackTypes,
        Control::MinFatalities,
        Control::Keyword,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Tabs of the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Table,
    Chart,
    Map,
}

impl View {
    pub const ALL: [View; 3] = [View::Table, View::Chart, View::Map];

    pub fn title(self) -> &'static str {
        match self {
            View::Table => "Data Table",
            View::Chart => "Yearly Chart",
            View::Map => "Event Map",
        }
    }
}

/// Application state for one session over a loaded table.
pub struct App<'t> {
    table: &'t EventTable,
    pub groups: Vec<String>,
    pub domain: Domain,
    pub selections: Selections,
    pub filtered: FilteredView<'t>,
    pub render: Render,
    pub focus: Control,
    pub view: View,
    /// Highlighted entry of the attack-type list
    pub attack_cursor: usize,
    pub table_scroll: usize,
    pub map_renderer: MapRenderer,
    /// `None` keeps the map fitted to the current points.
    viewport: Option<Viewport>,
    /// Map canvas size in dots from the last draw.
    pub map_size: Cell<(usize, usize)>,
    /// Last drag position, in terminal cells
    last_mouse: Option<(u16, u16)>,
    pub status: Option<String>,
    export_dir: PathBuf,
    pub should_quit: bool,
}

impl<'t> App<'t> {
    pub fn new(table: &'t EventTable, map_renderer: MapRenderer, export_dir: PathBuf) -> Self {
        let groups = filter::groups(table);
        let group = groups.first().cloned().unwrap_or_default();
        let domain = filter::domain(table, &group);
        let selections = Selections::defaults(&group, &domain);
        let filtered = filter::apply(table, &selections);
        let render = present::render(&filtered, &selections, &domain);

        Self {
            table,
            groups,
            domain,
            selections,
            filtered,
            render,
            focus: Control::Group,
            view: View::Table,
            attack_cursor: 0,
            table_scroll: 0,
            map_renderer,
            viewport: None,
            map_size: Cell::new((160, 80)),
            last_mouse: None,
            status: None,
            export_dir,
            should_quit: false,
        }
    }

    /// Re-run the filter and the presenter after any selection change.
    fn refresh(&mut self) {
        self.filtered = filter::apply(self.table, &self.selections);
        self.render = present::render(&self.filtered, &self.selections, &self.domain);
        self.table_scroll = 0;
        self.viewport = None;
        debug!(
            group = %self.selections.group,
            country = ?self.selections.country,
            years = ?self.selections.years,
            attack_types = self.selections.attack_types.len(),
            min_fatalities = self.selections.min_fatalities,
            keyword = %self.selections.keyword,
            rows = self.filtered.len(),
            "filters applied"
        );
    }

    /// Switch group: every dependent control resets to the new domain.
    fn select_group(&mut self, group: String) {
        self.domain = filter::domain(self.table, &group);
        self.selections = Selections::defaults(&group, &self.domain);
        self.attack_cursor = 0;
        self.refresh();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // Shift steps numbers by ten
        let step = if key.modifiers.contains(KeyModifiers::SHIFT) { 10 } else { 1 };

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::F(n @ 1..=3) => self.view = View::ALL[n as usize - 1],
            KeyCode::PageDown => self.scroll_table(10),
            KeyCode::PageUp => self.scroll_table(-10),
            KeyCode::Esc => {
                if self.focus == Control::Keyword && !self.selections.keyword.is_empty() {
                    self.selections.keyword.clear();
                    self.refresh();
                } else {
                    self.should_quit = true;
                }
            }
            _ if self.focus == Control::Keyword => self.edit_keyword(key.code),
            KeyCode::Left | KeyCode::Char('h') => self.adjust(-step),
            KeyCode::Right | KeyCode::Char('l') => self.adjust(step),
            KeyCode::Char(' ') if self.focus == Control::AttackTypes => self.toggle_attack_type(),
            KeyCode::Char('*') => {
                self.selections.select_all_attack_types(&self.domain);
                self.refresh();
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c @ '1'..='3') => self.view = View::ALL[c as usize - '1' as usize],
            KeyCode::Char('e') => self.export(),
            _ if self.view == View::Map => self.map_key(key.code),
            _ => {}
        }
    }

    fn edit_keyword(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => self.selections.keyword.push(c),
            KeyCode::Backspace => {
                if self.selections.keyword.pop().is_none() {
                    return;
                }
            }
            _ => return,
        }
        self.refresh();
    }

    /// Step the focused control by `delta`.
    fn adjust(&mut self, delta: i32) {
        match self.focus {
            Control::Group => {
                if let Some(group) = cycle(&self.groups, Some(&self.selections.group), delta > 0) {
                    self.select_group(group);
                }
                return;
            }
            Control::Country => self.selections.cycle_country(&self.domain, delta > 0),
            Control::YearFrom => self.selections.step_year_from(&self.domain, delta),
            Control::YearTo => self.selections.step_year_to(&self.domain, delta),
            Control::MinFatalities => {
                self.selections.step_min_fatalities(&self.domain, delta as i64)
            }
            Control::AttackTypes => {
                let len = self.domain.attack_types.len();
                if len > 0 {
                    self.attack_cursor = (self.attack_cursor as i64 + delta.signum() as i64)
                        .rem_euclid(len as i64) as usize;
                }
                return;
            }
            Control::Keyword => return,
        }
        self.refresh();
    }

    fn toggle_attack_type(&mut self) {
        if let Some(attack_type) = self.domain.attack_types.get(self.attack_cursor).cloned() {
            self.selections.toggle_attack_type(&attack_type);
            self.refresh();
        }
    }

    fn scroll_table(&mut self, delta: i64) {
        let max = self.filtered.len().saturating_sub(1) as i64;
        self.table_scroll = (self.table_scroll as i64 + delta).clamp(0, max) as usize;
    }

    fn map_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport_mut().zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => self.viewport_mut().zoom_out(),
            KeyCode::Char('H') => self.viewport_mut().pan(-10, 0),
            KeyCode::Char('L') => self.viewport_mut().pan(10, 0),
            KeyCode::Char('K') => self.viewport_mut().pan(0, -6),
            KeyCode::Char('J') => self.viewport_mut().pan(0, 6),
            KeyCode::Char('r') => self.viewport = None,
            KeyCode::Char('b') => self.map_renderer.toggle_borders(),
            KeyCode::Char('n') => self.map_renderer.toggle_labels(),
            _ => {}
        }
    }

    /// Wheel zooms and left-drag pans while the map is shown.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.view != View::Map {
            return;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => self.viewport_mut().zoom_in(),
            MouseEventKind::ScrollDown => self.viewport_mut().zoom_out(),
            MouseEventKind::Down(MouseButton::Left) => {
                self.last_mouse = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((x, y)) = self.last_mouse {
                    // Braille gives 2x4 dots per cell
                    let dx = (x as i32 - mouse.column as i32) * 2;
                    let dy = (y as i32 - mouse.row as i32) * 4;
                    self.viewport_mut().pan(dx, dy);
                }
                self.last_mouse = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Up(MouseButton::Left) => self.last_mouse = None,
            _ => {}
        }
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        let (width, height) = self.map_size.get();
        let fitted = self.fitted_viewport(width, height);
        self.viewport.get_or_insert(fitted)
    }

    fn fitted_viewport(&self, width: usize, height: usize) -> Viewport {
        match &self.render {
            Render::Ready(dash) => match &dash.geo {
                GeoView::Points(points) => {
                    Viewport::fit(points.iter().map(|p| (p.lon, p.lat)), width, height)
                }
                _ => Viewport::world(width, height),
            },
            Render::Empty(_) => Viewport::world(width, height),
        }
    }

    /// Viewport for a map canvas of `width` x `height` dots.
    pub fn map_viewport(&self, width: usize, height: usize) -> Viewport {
        self.map_size.set((width, height));
        match &self.viewport {
            Some(vp) => Viewport {
                width,
                height,
                ..vp.clone()
            },
            None => self.fitted_viewport(width, height),
        }
    }

    fn export(&mut self) {
        if self.filtered.is_empty() {
            self.status = Some("Nothing to export".to_owned());
            return;
        }
        self.status = Some(match present::write_export(&self.filtered, &self.export_dir) {
            Ok(path) => format!("Exported {} rows to {}", self.filtered.len(), path.display()),
            Err(e) => {
                error!(error = %e, "export failed");
                format!("Export failed: {e}")
            }
        });
    }
}
