//! Drawing
//!
//! Pure function of [`KdsApp`]: nothing here mutates state.

use ratatui::{prelude::*, widgets::*};
use shared::KitchenStage;
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

use super::KdsApp;
use crate::kitchen::{CardView, ConnectionState};

/// Minimum card width in columns
pub const CARD_WIDTH: u16 = 34;

/// Height of the log pane when shown
const LOG_PANE_HEIGHT: u16 = 10;

/// How many cards fit side by side
pub fn grid_columns(width: u16) -> usize {
    usize::from((width / CARD_WIDTH).max(1))
}

/// Header, cards, optional log pane, footer
fn screen_layout(area: Rect, show_logs: bool) -> std::rc::Rc<[Rect]> {
    let mut constraints = vec![
        Constraint::Length(3), // Header
        Constraint::Min(1),    // Cards
    ];
    if show_logs {
        constraints.push(Constraint::Length(LOG_PANE_HEIGHT));
    }
    constraints.push(Constraint::Length(1)); // Footer

    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
}

/// Area left for the card grid on a screen of `area`
pub fn board_area(area: Rect, show_logs: bool) -> Rect {
    screen_layout(area, show_logs)[1]
}

pub fn draw(f: &mut Frame, app: &KdsApp) {
    if !app.is_unlocked() {
        draw_welcome(f, app, f.area());
        return;
    }

    let chunks = screen_layout(f.area(), app.show_logs());

    draw_header(f, app, chunks[0]);
    draw_board(f, app, chunks[1]);
    if app.show_logs() {
        draw_logs(f, app, chunks[2]);
    }
    draw_footer(f, app, chunks[chunks.len() - 1]);
}

fn draw_welcome(f: &mut Frame, app: &KdsApp, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            app.station_name().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press any key to start service"),
        Line::from(Span::styled(
            "(enables the new order sound)",
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "q to quit",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let height = text.len() as u16 + 2;
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);

    let welcome = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(welcome, middle);
}

fn draw_header(f: &mut Frame, app: &KdsApp, area: Rect) {
    let (status, status_style) = match app.connection() {
        ConnectionState::Connected => ("● Connected", Style::default().fg(Color::Green)),
        ConnectionState::Disconnected => ("● Offline", Style::default().fg(Color::Red)),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::raw(" KDS "),
        Span::raw("| "),
        Span::styled(
            app.station_name().to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.clock_label(), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled(status, status_style),
        Span::raw(" | "),
        Span::raw(format!("{} open", app.orders().len())),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(title, area);
}

fn draw_board(f: &mut Frame, app: &KdsApp, area: Rect) {
    let cards = app.cards();
    if cards.is_empty() {
        let [_, middle, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);
        let empty = Paragraph::new("All caught up, chef")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(empty, middle);
        return;
    }

    let columns = grid_columns(area.width);
    let card_width = area.width / columns as u16;
    let selected = app.selected_index();
    let view = board_viewport(&cards, columns, selected, area.height);

    let bottom = if view.is_clipped() {
        area.bottom() - 1
    } else {
        area.bottom()
    };

    let mut y = area.y;
    for (row, chunk) in cards[view.start..view.end].chunks(columns).enumerate() {
        if y >= bottom {
            break;
        }
        let wanted = chunk.iter().map(card_height).max().unwrap_or(3);
        let height = wanted.min(bottom - y);

        for (col, card) in chunk.iter().enumerate() {
            let slot = row * columns + col;
            let rect = Rect {
                x: area.x + col as u16 * card_width,
                y,
                width: card_width,
                height,
            };
            draw_card(f, card, slot, selected == Some(view.start + slot), rect);
        }
        y = y.saturating_add(height);
    }

    if view.is_clipped() {
        let marker = Rect {
            x: area.x,
            y: area.bottom() - 1,
            width: area.width,
            height: 1,
        };
        let more = Paragraph::new(view.more_label())
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(more, marker);
    }
}

/// Window of cards that fits on the board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardViewport {
    /// First visible card
    pub start: usize,
    /// One past the last visible card
    pub end: usize,
    pub hidden_before: usize,
    pub hidden_after: usize,
}

impl BoardViewport {
    pub fn is_clipped(&self) -> bool {
        self.hidden_before + self.hidden_after > 0
    }

    /// Card index behind hotkey slot `slot` (0 for key '1')
    pub fn card_at(&self, slot: usize) -> Option<usize> {
        let index = self.start + slot;
        (index < self.end).then_some(index)
    }

    fn more_label(&self) -> String {
        let mut parts = Vec::new();
        if self.hidden_before > 0 {
            parts.push(format!("+{} more above", self.hidden_before));
        }
        if self.hidden_after > 0 {
            parts.push(format!("+{} more below", self.hidden_after));
        }
        parts.join("   ")
    }
}

/// 计算可见的卡片行
///
/// Rows scroll so the selected card stays on screen. When anything is
/// hidden, one line at the bottom is kept for the "+N more" marker. At
/// least one row is always shown, clipped if it is taller than the board.
pub fn board_viewport(
    cards: &[CardView],
    columns: usize,
    selected: Option<usize>,
    height: u16,
) -> BoardViewport {
    let columns = columns.max(1);
    let rows: Vec<u32> = cards
        .chunks(columns)
        .map(|chunk| u32::from(chunk.iter().map(card_height).max().unwrap_or(3)))
        .collect();

    if rows.iter().sum::<u32>() <= u32::from(height) {
        return BoardViewport {
            start: 0,
            end: cards.len(),
            ..Default::default()
        };
    }

    let available = u32::from(height.saturating_sub(1));
    let rows_from = |first: usize| {
        let mut used = 0;
        let mut count = 0;
        for &h in &rows[first..] {
            if count > 0 && used + h > available {
                break;
            }
            used += h;
            count += 1;
        }
        count
    };

    let selected_row = selected.map_or(0, |i| i / columns).min(rows.len() - 1);
    let mut first = 0;
    while first < selected_row && first + rows_from(first) <= selected_row {
        first += 1;
    }

    let start = first * columns;
    let end = ((first + rows_from(first)) * columns).min(cards.len());
    BoardViewport {
        start,
        end,
        hidden_before: start,
        hidden_after: cards.len() - end,
    }
}

fn stage_color(stage: KitchenStage) -> Color {
    match stage {
        KitchenStage::Queued => Color::Yellow,
        KitchenStage::Preparing => Color::Blue,
        KitchenStage::Ready => Color::Green,
        KitchenStage::Delivered => Color::DarkGray,
    }
}

fn card_lines(card: &CardView) -> Vec<Line<'_>> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let mut lines = vec![Line::from(vec![
        Span::styled(
            card.customer_name.clone().unwrap_or_else(|| "-".to_string()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(card.order_mode.clone(), dim),
    ])];

    for item in &card.items {
        lines.push(Line::from(item.title.clone()));
        for extra in &item.extras {
            lines.push(Line::from(Span::styled(format!("  {}", extra), dim)));
        }
    }

    if let Some(action) = card.action {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {} ", action.label),
            Style::default()
                .fg(Color::Black)
                .bg(stage_color(card.stage))
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines
}

fn card_height(card: &CardView) -> u16 {
    let extras: usize = card.items.iter().map(|i| i.extras.len()).sum();
    let action = if card.action.is_some() { 2 } else { 0 };
    (1 + card.items.len() + extras + action) as u16 + 2
}

fn draw_card(f: &mut Frame, card: &CardView, slot: usize, is_selected: bool, area: Rect) {
    let color = if card.is_late {
        Color::Red
    } else {
        stage_color(card.stage)
    };
    let mut border_style = Style::default().fg(color);
    if is_selected {
        border_style = border_style.add_modifier(Modifier::BOLD);
    }

    // 1-9 快捷键提示
    let hotkey = if slot < 9 {
        format!("[{}] ", slot + 1)
    } else {
        String::new()
    };
    let mut elapsed = card.elapsed_label();
    if card.is_late {
        elapsed = format!("LATE {}", elapsed);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if is_selected {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(border_style)
        .title(Line::from(vec![
            Span::raw(" "),
            Span::raw(hotkey),
            Span::styled(
                card.number.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ]))
        .title(Line::from(format!(" {} ", elapsed)).right_aligned());

    let paragraph = Paragraph::new(card_lines(card))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_logs(f: &mut Frame, app: &KdsApp, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(
            Block::default()
                .title(" Logs ")
                .border_style(
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::DIM),
                )
                .borders(Borders::ALL),
        )
        .output_separator('|')
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style(Style::default().fg(Color::White))
        .state(app.logger_state());
    f.render_widget(logs, area);
}

fn draw_footer(f: &mut Frame, app: &KdsApp, area: Rect) {
    let line = if let Some(notice) = app.notice() {
        Line::from(Span::styled(
            format!(" {} ", notice.text),
            Style::default().fg(Color::White).bg(Color::Red),
        ))
    } else if let (ConnectionState::Disconnected, Some(error)) =
        (app.connection(), app.last_feed_error())
    {
        Line::from(Span::styled(
            format!(" Offline: {} ", error),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from(Span::styled(
            " ←↑↓→ select | Enter advance | 1-9 quick advance | L logs | Esc lock | q quit",
            Style::default().add_modifier(Modifier::DIM),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}
