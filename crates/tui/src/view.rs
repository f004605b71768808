use std::time::Instant;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use taleweaver_core::{
    assets::FaceOrigin,
    widget::{FaceStatus, WidgetState},
    CardFace,
};

use crate::logo;

const WORDMARK: &str = "TaleWeaver";
const CARD_ASPECT: f32 = 1.62;
const SHUFFLE_LABEL: &str = " ⟳  Reshuffle ";
const ABOUT_LABEL: &str = " About ";
const ABOUT_MAX_WIDTH: u16 = 56;
const MOTIF_GLYPHS: [&str; 10] = ["✦", "☾", "✿", "◆", "❋", "☼", "♠", "❀", "✧", "◉"];

const ABOUT_TEXT: [&str; 4] = [
    "This app showcases images from the Dixit game to prompt new ideas \
     for discussion during a coaching session.",
    "Images: libellud.com/ressources/dixit",
    "Made with love by Zéphir :)",
    "Source: github.com/zephirl/TaleWeaver",
];

#[derive(Debug, Clone)]
pub(crate) struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub card_back: Color,
    pub card_trim: Color,
    pub danger: Color,
    pub popup_bg: Color,
    pub popup_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(45, 45, 45),
            foreground: Color::White,
            muted: Color::DarkGray,
            accent: Color::Rgb(236, 190, 84),
            card_back: Color::Rgb(38, 70, 120),
            card_trim: Color::Rgb(210, 170, 90),
            danger: Color::Red,
            popup_bg: Color::Rgb(235, 235, 235),
            popup_fg: Color::Rgb(51, 51, 51),
        }
    }
}

/// Clickable regions from the most recent frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HitMap {
    pub cards: Vec<Rect>,
    pub reshuffle: Option<Rect>,
    pub about: Option<Rect>,
    pub close: Option<Rect>,
}

/// What a click at a cell landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Card(usize),
    Reshuffle,
    About,
    Close,
}

impl HitMap {
    /// The control under `(column, row)`; an open overlay shadows everything but its close box.
    pub fn target(&self, column: u16, row: u16) -> Option<Target> {
        if let Some(close) = self.close {
            return contains(close, column, row).then_some(Target::Close);
        }
        if let Some(index) = self
            .cards
            .iter()
            .position(|rect| contains(*rect, column, row))
        {
            return Some(Target::Card(index));
        }
        if self.reshuffle.is_some_and(|rect| contains(rect, column, row)) {
            return Some(Target::Reshuffle);
        }
        if self.about.is_some_and(|rect| contains(rect, column, row)) {
            return Some(Target::About);
        }
        None
    }
}

/// Per-frame inputs besides the widget itself.
pub(crate) struct ViewContext<'a> {
    pub theme: &'a Theme,
    pub now: Instant,
    pub focus: usize,
}

pub(crate) fn draw(frame: &mut Frame, widget: &WidgetState, ctx: &ViewContext) -> HitMap {
    let area = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(ctx.theme.background)),
        area,
    );

    if widget.is_loading() {
        draw_loading(frame, area, ctx.theme);
        return HitMap::default();
    }

    let mut hits = HitMap::default();
    let layout = row_layout(area, widget.hand().len());

    for (index, slot) in layout.slots.iter().enumerate() {
        let Some(card) = widget.hand().get(index) else {
            continue;
        };
        let shift = widget.slide_offset(index, ctx.now) * f32::from(slot.width);
        let moved = shift_rect(*slot, shift, area);
        let turn = widget.turn(index, ctx.now);
        let squeezed = squeeze_rect(moved, turn.width_scale());
        let focused = index == ctx.focus && !widget.about_visible();

        frame.render_widget(Clear, squeezed);
        if turn.shows_face() {
            draw_face(frame, squeezed, &card.face, focused, ctx.theme);
        } else {
            draw_back(frame, squeezed, focused, ctx.theme);
        }
        hits.cards.push(moved);
    }

    let button = centered_rect(
        SHUFFLE_LABEL.chars().count() as u16 + 2,
        3,
        layout.controls,
    );
    let button_style = if widget.is_shuffling() {
        Style::default().fg(ctx.theme.muted)
    } else {
        Style::default()
            .fg(ctx.theme.accent)
            .add_modifier(Modifier::BOLD)
    };
    frame.render_widget(
        Paragraph::new(SHUFFLE_LABEL)
            .style(button_style)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(button_style),
            ),
        button,
    );
    hits.reshuffle = Some(button);

    let about = Rect::new(
        area.x + area.width.saturating_sub(ABOUT_LABEL.len() as u16) / 2,
        area.bottom().saturating_sub(2),
        (ABOUT_LABEL.len() as u16).min(area.width),
        1.min(area.height),
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            ABOUT_LABEL,
            Style::default()
                .fg(ctx.theme.foreground)
                .add_modifier(Modifier::UNDERLINED),
        )),
        about,
    );
    hits.about = Some(about);

    if let Some(err) = widget.last_error().filter(|_| area.height > 0) {
        let status_area = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        frame.render_widget(
            Paragraph::new(format!("Could not deal: {err}"))
                .style(Style::default().fg(ctx.theme.muted)),
            status_area,
        );
    }

    if widget.about_visible() {
        hits.close = Some(draw_about(frame, area, ctx.theme));
    }

    hits
}

fn draw_loading(frame: &mut Frame, area: Rect, theme: &Theme) {
    let rows = logo::render(WORDMARK);
    let mut lines: Vec<Line> = rows
        .into_iter()
        .map(|row| {
            Line::from(Span::styled(
                row,
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "shuffling the deck…",
        Style::default().fg(theme.muted),
    )));

    let height = lines.len() as u16;
    let width = logo::width(WORDMARK) as u16;
    let target = centered_rect(width, height, area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), target);
}

fn draw_back(frame: &mut Frame, area: Rect, focused: bool, theme: &Theme) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = (0..inner_height)
        .map(|row| {
            let pattern: String = (0..inner_width)
                .map(|col| if (row + col) % 2 == 0 { '▚' } else { '▞' })
                .collect();
            Line::from(Span::styled(
                pattern,
                Style::default().fg(theme.card_trim).bg(theme.card_back),
            ))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(card_block(focused, theme.card_trim, theme)),
        area,
    );
}

fn draw_face(frame: &mut Frame, area: Rect, face: &FaceStatus, focused: bool, theme: &Theme) {
    match face {
        FaceStatus::Ready(face) => {
            let mut lines = motif_lines(face, area.width.saturating_sub(2), area.height);
            lines.push(Line::from(Span::styled(
                face.id.label(),
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            )));
            if face.origin == FaceOrigin::File {
                lines.push(Line::from(Span::styled(
                    format!("{} KiB", face.byte_len.div_ceil(1024)),
                    Style::default().fg(theme.muted),
                )));
            }
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .block(card_block(focused, theme.accent, theme)),
                area,
            );
        }
        FaceStatus::Pending => {
            frame.render_widget(
                Paragraph::new("…")
                    .alignment(Alignment::Center)
                    .block(card_block(focused, theme.muted, theme)),
                area,
            );
        }
        FaceStatus::Broken(err) => {
            let lines = vec![
                Line::from(Span::styled(
                    "✗ image unavailable",
                    Style::default()
                        .fg(theme.danger)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(Span::styled(
                    err.to_string(),
                    Style::default().fg(theme.muted),
                )),
            ];
            frame.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(card_block(focused, theme.danger, theme)),
                area,
            );
        }
    }
}

fn draw_about(frame: &mut Frame, area: Rect, theme: &Theme) -> Rect {
    let width = about_width(area);
    let height = 12.min(area.height);
    let popup = centered_rect(width, height, area);

    let mut lines = Vec::new();
    for paragraph in ABOUT_TEXT {
        lines.push(Line::from(paragraph));
        lines.push(Line::default());
    }
    lines.pop();

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(theme.popup_fg).bg(theme.popup_bg))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" About "),
            ),
        popup,
    );

    let close = Rect::new(
        popup.right().saturating_sub(4),
        popup.y,
        3.min(popup.width),
        1.min(popup.height),
    );
    frame.render_widget(
        Paragraph::new("[×]").style(
            Style::default()
                .fg(theme.popup_fg)
                .bg(theme.popup_bg)
                .add_modifier(Modifier::BOLD),
        ),
        close,
    );
    close
}

fn card_block<'a>(focused: bool, trim: Color, theme: &Theme) -> Block<'a> {
    let border = if focused {
        Style::default()
            .fg(theme.foreground)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(trim)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Rounded
        })
        .border_style(border)
}

/// Decorative rows derived from the face fingerprint, leaving room for the caption.
fn motif_lines(face: &CardFace, width: u16, height: u16) -> Vec<Line<'static>> {
    let rows = height.saturating_sub(5) as usize;
    let cols = (width as usize / 2).max(1);
    let mut state = face.fingerprint | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut lines = vec![Line::default()];
    for _ in 0..rows {
        let spans: Vec<Span> = (0..cols)
            .map(|_| {
                let roll = next();
                let glyph = MOTIF_GLYPHS[(roll % MOTIF_GLYPHS.len() as u64) as usize];
                let color = Color::Rgb(
                    (roll >> 8) as u8 | 0x40,
                    (roll >> 16) as u8 | 0x40,
                    (roll >> 24) as u8 | 0x40,
                );
                Span::styled(format!("{glyph} "), Style::default().fg(color))
            })
            .collect();
        lines.push(Line::from(spans));
    }
    lines.push(Line::default());
    lines
}

struct RowLayout {
    slots: Vec<Rect>,
    controls: Rect,
}

/// Card slots of one fifth of the width each, evenly spaced, above the controls.
fn row_layout(area: Rect, cards: usize) -> RowLayout {
    let controls_height = 3u16;
    let reserved = controls_height + 4;
    let max_height = area.height.saturating_sub(reserved).max(3);

    let mut width = (area.width / 5).max(7);
    // Cells are roughly twice as tall as wide.
    let mut height = ((f32::from(width) * CARD_ASPECT) / 2.0).round() as u16;
    if height > max_height {
        height = max_height;
        width = ((f32::from(height) * 2.0) / CARD_ASPECT).round() as u16;
    }
    let height = height.max(3);

    let count = cards.max(1) as u16;
    let gap = area.width.saturating_sub(width * count) / (count + 1);
    let top = area.y + area.height.saturating_sub(height + reserved) / 2;

    let slots = (0..cards as u16)
        .map(|index| {
            Rect::new(
                area.x + gap + index * (width + gap),
                top,
                width.min(area.width),
                height.min(area.height),
            )
        })
        .collect();

    let controls = Rect::new(
        area.x,
        (top + height + 1).min(area.bottom().saturating_sub(controls_height)),
        area.width,
        controls_height.min(area.height),
    );

    RowLayout { slots, controls }
}

fn shift_rect(rect: Rect, shift: f32, bounds: Rect) -> Rect {
    let min_x = i32::from(bounds.x);
    let max_x = i32::from(bounds.right().saturating_sub(rect.width)).max(min_x);
    let x = (i32::from(rect.x) + shift.round() as i32).clamp(min_x, max_x);
    Rect { x: x as u16, ..rect }
}

fn squeeze_rect(rect: Rect, scale: f32) -> Rect {
    let width = ((f32::from(rect.width) * scale).round() as u16).clamp(2, rect.width.max(2));
    let width = width.min(rect.width);
    Rect {
        x: rect.x + (rect.width - width) / 2,
        width,
        ..rect
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Four fifths of the screen, capped; computed without overflowing on huge terminals.
fn about_width(area: Rect) -> u16 {
    (area.width / 5 * 4).min(ABOUT_MAX_WIDTH).max(12)
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use taleweaver_core::{widget::Msg, ImageId, SelectionError, Timings};

    fn ready_widget() -> WidgetState {
        let now = Instant::now();
        let mut widget = WidgetState::new(Timings::default());
        widget.update(Msg::Mounted, now);
        let ids = ["Dixit_1.png", "Dixit_2.png", "Dixit_3.png"].map(ImageId::new);
        widget.update(Msg::Dealt(Ok(ids.to_vec())), now);
        widget.update(Msg::LoadingElapsed, now);
        widget
    }

    fn render_with_text(widget: &WidgetState) -> (HitMap, String) {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).expect("test terminal");
        let theme = Theme::default();
        let ctx = ViewContext {
            theme: &theme,
            now: Instant::now(),
            focus: 0,
        };
        let mut hits = HitMap::default();
        terminal
            .draw(|frame| hits = draw(frame, widget, &ctx))
            .expect("draw");
        let text = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        (hits, text)
    }

    fn render(widget: &WidgetState) -> HitMap {
        render_with_text(widget).0
    }

    #[test]
    fn layout_spaces_cards_evenly() {
        let layout = row_layout(Rect::new(0, 0, 100, 40), 3);
        assert_eq!(layout.slots.len(), 3);
        assert!(layout.slots.iter().all(|slot| slot.width == 20));
        assert!(layout.slots[0].right() < layout.slots[1].x);
        assert!(layout.slots[1].right() < layout.slots[2].x);
        assert!(layout.controls.y > layout.slots[0].bottom());
    }

    #[test]
    fn clicks_resolve_to_controls() {
        let widget = ready_widget();
        let hits = render(&widget);
        assert_eq!(hits.cards.len(), 3);

        let card = hits.cards[2];
        assert_eq!(hits.target(card.x + 1, card.y + 1), Some(Target::Card(2)));
        let button = hits.reshuffle.expect("reshuffle button");
        assert_eq!(hits.target(button.x, button.y), Some(Target::Reshuffle));
        let about = hits.about.expect("about button");
        assert_eq!(hits.target(about.x, about.y), Some(Target::About));
        assert_eq!(hits.target(0, 0), None);
    }

    #[test]
    fn overlay_only_accepts_close() {
        let mut widget = ready_widget();
        widget.update(Msg::ToggleAbout, Instant::now());
        let hits = render(&widget);
        let close = hits.close.expect("close control");
        assert_eq!(hits.target(close.x, close.y), Some(Target::Close));
        let card = hits.cards[0];
        assert_eq!(hits.target(card.x + 1, card.y + 1), None);
    }

    #[test]
    fn loading_screen_has_no_targets() {
        let widget = WidgetState::new(Timings::default());
        assert_eq!(render(&widget), HitMap::default());
    }

    #[test]
    fn failed_deal_shows_in_status_line() {
        let mut widget = ready_widget();
        let (_, text) = render_with_text(&widget);
        assert!(!text.contains("Could not deal"));

        let err = SelectionError::InsufficientPool {
            requested: 3,
            available: 2,
        };
        widget.update(Msg::Dealt(Err(err)), Instant::now());
        let (_, text) = render_with_text(&widget);
        assert!(text.contains("Could not deal"));
    }

    #[test]
    fn about_width_handles_any_terminal_size() {
        assert_eq!(about_width(Rect::new(0, 0, u16::MAX, 1)), ABOUT_MAX_WIDTH);
        assert_eq!(about_width(Rect::new(0, 0, 50, 20)), 40);
        assert_eq!(about_width(Rect::new(0, 0, 10, 5)), 12);
    }

    #[test]
    fn shifted_rects_stay_on_screen() {
        let bounds = Rect::new(0, 0, 50, 20);
        let rect = Rect::new(40, 2, 10, 5);
        assert_eq!(shift_rect(rect, 30.0, bounds).x, 40);
        assert_eq!(shift_rect(rect, -100.0, bounds).x, 0);
        let squeezed = squeeze_rect(rect, 0.5);
        assert_eq!(squeezed.width, 5);
        assert_eq!(squeezed.x, 42);
    }
}
