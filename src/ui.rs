use std::fmt::Display;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Row, Table, Tabs, Widget, Wrap},
    Frame,
};

use crate::app::{App, Control, View};
use crate::braille::BrailleCanvas;
use crate::filter::Bound;
use crate::map::MapLayers;
use crate::present::{Dashboard, GeoPoint, GeoView, Render, YearBucket, TABLE_COLUMNS};

const SIDEBAR_WIDTH: u16 = 36;

/// Marker colours, indexed by attack-type position.
const PALETTE: [Color; 10] = [
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightBlue,
    Color::LightRed,
    Color::LightGreen,
    Color::LightMagenta,
    Color::White,
    Color::Blue,
];

fn palette(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(dim())
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into body and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(chunks[0]);

    render_sidebar(frame, app, body[0]);
    render_main(frame, app, body[1]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    let s = &app.selections;
    let d = &app.domain;

    for control in Control::ALL {
        let focused = app.focus == control;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if focused { "▶ " } else { "  " };

        let label = match control {
            Control::Group => "Group",
            Control::Country => "Country",
            Control::YearFrom => "Year from",
            Control::YearTo => "Year to",
            Control::AttackTypes => "Attack types",
            Control::MinFatalities => "Min fatalities",
            Control::Keyword => "Keyword",
        };

        let locked = match control {
            Control::YearFrom | Control::YearTo => fixed_value(&d.years),
            Control::MinFatalities => fixed_value(&d.fatalities),
            _ => None,
        };
        if let Some(value) = locked {
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(
                    format!("🔒 {label}: only one value available ({value})"),
                    dim(),
                ),
            ]));
            lines.push(Line::raw(""));
            continue;
        }

        let heading = match control {
            Control::AttackTypes => format!("{label} ({}/{})", s.attack_types.len(), d.attack_types.len()),
            Control::YearFrom | Control::YearTo => format!("{label} ({}-{})", d.years.min(), d.years.max()),
            Control::MinFatalities => format!("{label} ({}-{})", d.fatalities.min(), d.fatalities.max()),
            _ => label.to_owned(),
        };
        lines.push(Line::from(vec![Span::raw(marker), Span::styled(heading, label_style)]));

        match control {
            Control::Group => lines.push(choice_line(&s.group, app.groups.is_empty())),
            Control::Country => {
                lines.push(choice_line(s.country.as_deref().unwrap_or(""), s.country.is_none()))
            }
            Control::YearFrom => lines.push(choice_line(&s.years.min().to_string(), false)),
            Control::YearTo => lines.push(choice_line(&s.years.max().to_string(), false)),
            Control::MinFatalities => lines.push(choice_line(&s.min_fatalities.to_string(), false)),
            Control::AttackTypes => {
                for (i, attack_type) in d.attack_types.iter().enumerate() {
                    let checked = if s.attack_types.contains(attack_type) { "[x]" } else { "[ ]" };
                    let mut style = Style::default().fg(palette(i));
                    if focused && i == app.attack_cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    lines.push(Line::from(vec![
                        Span::raw("   "),
                        Span::styled(format!("{checked} {attack_type}"), style),
                    ]));
                }
            }
            Control::Keyword => {
                let cursor = if focused { "_" } else { "" };
                lines.push(Line::from(vec![
                    Span::raw("   "),
                    Span::styled(
                        format!("[{}{cursor}]", s.keyword),
                        Style::default().fg(Color::White),
                    ),
                ]));
            }
        }
        lines.push(Line::raw(""));
    }

    let paragraph = Paragraph::new(lines).block(titled_block("Filters"));
    frame.render_widget(paragraph, area);
}

fn fixed_value<T: Copy + Ord + Display>(bound: &Bound<T>) -> Option<String> {
    match bound {
        Bound::Fixed(v) => Some(v.to_string()),
        Bound::Range { .. } => None,
    }
}

fn choice_line(value: &str, missing: bool) -> Line<'static> {
    if missing {
        return Line::from(Span::styled("   (none)", dim()));
    }
    Line::from(vec![
        Span::styled("   ‹ ", dim()),
        Span::styled(value.to_owned(), Style::default().fg(Color::White)),
        Span::styled(" ›", dim()),
    ])
}

fn render_main(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Metrics
            Constraint::Length(1), // Tabs
            Constraint::Min(3),    // Active view
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            " Terrorist Group Activity: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            app.selections.group.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let dash = match &app.render {
        Render::Ready(dash) => dash,
        Render::Empty(warning) => {
            let rest = Rect {
                height: area.height.saturating_sub(1),
                y: area.y + 1,
                ..area
            };
            let text = Paragraph::new(Line::from(Span::styled(
                format!("⚠ {warning}"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(dim()));
            frame.render_widget(text, rest);
            return;
        }
    };

    render_metrics(frame, dash, chunks[1]);

    let tabs = Tabs::new(
        View::ALL
            .iter()
            .enumerate()
            .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
            .collect::<Vec<_>>(),
    )
    .select(View::ALL.iter().position(|v| *v == app.view).unwrap_or(0))
    .style(dim())
    .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    .divider("|");
    frame.render_widget(tabs, chunks[2]);

    match app.view {
        View::Table => render_table(frame, app, dash, chunks[3]),
        View::Chart => render_chart(frame, &dash.histogram, chunks[3]),
        View::Map => render_map(frame, app, dash, chunks[3]),
    }
}

fn render_metrics(frame: &mut Frame, dash: &Dashboard, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    let metrics = [
        ("Total Events", dash.summary.count.to_string()),
        ("Total Fatalities", dash.summary.total_fatalities.to_string()),
        ("Countries Affected", dash.summary.distinct_countries.to_string()),
    ];
    for ((label, value), cell) in metrics.into_iter().zip(cells.iter()) {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(titled_block(label));
        frame.render_widget(paragraph, *cell);
    }
}

fn render_table(frame: &mut Frame, app: &App, dash: &Dashboard, area: Rect) {
    let header = Row::new(TABLE_COLUMNS.iter().map(|c| {
        Span::styled(*c, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    }));
    let visible = area.height.saturating_sub(3) as usize;
    let rows = dash
        .rows
        .iter()
        .skip(app.table_scroll)
        .take(visible)
        .map(|cells| Row::new(cells.iter().map(String::as_str)));

    let widths = [
        Constraint::Length(6),
        Constraint::Length(16),
        Constraint::Length(24),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Min(10),
    ];
    let title = format!(
        "Rows {}-{} of {}",
        (app.table_scroll + 1).min(dash.rows.len()),
        (app.table_scroll + visible).min(dash.rows.len()),
        dash.rows.len()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(titled_block(&title))
        .column_spacing(1);
    frame.render_widget(table, area);
}

fn render_chart(frame: &mut Frame, histogram: &[YearBucket], area: Rect) {
    let block = titled_block("Attacks Per Year");
    let inner = block.inner(area);

    let n = histogram.len().max(1);
    let bar_width = ((inner.width as usize + 1) / n).saturating_sub(1).max(1) as u16;
    let bar_gap = if bar_width > 1 { 1 } else { 0 };

    let bars: Vec<Bar> = histogram
        .iter()
        .map(|b| {
            let label = if bar_width >= 4 {
                b.year.to_string()
            } else {
                format!("{:02}", b.year.rem_euclid(100))
            };
            Bar::default()
                .value(b.count)
                .label(Line::from(label))
                .style(Style::default().fg(Color::Red))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(bar_gap)
        .value_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .label_style(dim())
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_map(frame: &mut Frame, app: &App, dash: &Dashboard, area: Rect) {
    let block = titled_block("Event Map");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let points: &[GeoPoint] = match &dash.geo {
        GeoView::Points(points) => points,
        placeholder => {
            let text = placeholder.placeholder().unwrap_or_default();
            let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(Color::Yellow)))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, inner);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    let canvas_area = chunks[0];

    // Braille gives 2x4 resolution per character
    let viewport = app.map_viewport(canvas_area.width as usize * 2, canvas_area.height as usize * 4);
    let layers = app.map_renderer.render(
        canvas_area.width as usize,
        canvas_area.height as usize,
        &viewport,
        points,
        app.domain.attack_types.len(),
    );
    frame.render_widget(MapWidget { layers }, canvas_area);

    let mut legend = vec![Span::styled(" ", dim())];
    for (i, attack_type) in app.domain.attack_types.iter().enumerate() {
        legend.push(Span::styled("● ", Style::default().fg(palette(i))));
        legend.push(Span::styled(format!("{attack_type}  "), Style::default().fg(Color::Gray)));
    }
    frame.render_widget(Paragraph::new(Line::from(legend)), chunks[1]);
}

/// Braille layers with city labels overlaid.
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.glyphs() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let x = area.x + col as u16;
            let y = area.y + row as u16;
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.coastlines, Color::Cyan, area, buf);
        Self::render_layer(&self.layers.borders, Color::DarkGray, area, buf);
        for (i, markers) in self.layers.markers.iter().enumerate() {
            Self::render_layer(markers, palette(i), area, buf);
        }

        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = area.width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + lx + i as u16, area.y + ly)].set_char(ch).set_style(label_style);
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} rows ", app.filtered.len()),
        Style::default().fg(Color::Yellow),
    )];

    if app.view == View::Map {
        let (width, height) = app.map_size.get();
        let viewport = app.map_viewport(width, height);
        let settings = &app.map_renderer.settings;
        spans.push(Span::styled(
            format!("| Zoom: {:.1}x {} ", viewport.zoom, viewport.center_label()),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            if settings.show_borders { "[B]order " } else { "[b]order " },
            Style::default().fg(if settings.show_borders { Color::Green } else { Color::DarkGray }),
        ));
        spans.push(Span::styled(
            if settings.show_labels { "[N]ames " } else { "[n]ames " },
            Style::default().fg(if settings.show_labels { Color::Green } else { Color::DarkGray }),
        ));
    }

    match &app.status {
        Some(message) => spans.push(Span::styled(format!("| {message}"), Style::default().fg(Color::Green))),
        None => {
            let hints = match app.view {
                View::Map => "| HJKL:pan +/-:zoom r:fit e:export q:quit",
                _ => "| Tab:focus ←/→:change space:toggle 1-3:view e:export q:quit",
            };
            spans.push(Span::styled(hints, dim()));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
