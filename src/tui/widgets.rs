//! TUI widget rendering: shelf list, TOC browser, page viewer, metadata editor.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::notice::Notice;
use crate::shelf::{BookRecord, ChapterSummary, SectionSummary};
use crate::viewer::{SessionMode, ViewerSession};

use super::EditField;

/// Render the header row and split the frame into body + status areas.
fn chrome(frame: &mut Frame, title: &str) -> (Rect, Rect) {
    let [header_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " pageturn ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" :: {title} ")),
    ]));
    frame.render_widget(header, header_area);

    (body_area, status_area)
}

fn notice_span(notice: Option<&Notice>) -> Span<'static> {
    match notice {
        Some(n) if n.is_failure() => Span::styled(
            format!(" {n} "),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Some(n) => Span::styled(format!(" {n} "), Style::default().fg(Color::Green)),
        None => Span::raw(""),
    }
}

fn render_status(frame: &mut Frame, area: Rect, keys: &str, notice: Option<&Notice>) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {keys} "), Style::default().fg(Color::DarkGray)),
        notice_span(notice),
    ]));
    frame.render_widget(status, area);
}

fn selectable_list(frame: &mut Frame, area: Rect, title: &str, items: Vec<ListItem>, selected: usize) {
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Shelf screen: all books with their extraction/alignment status.
pub fn shelf(frame: &mut Frame, books: &[BookRecord], selected: usize, notice: Option<&Notice>) {
    let (body, status_area) = chrome(frame, "shelf");

    let items: Vec<ListItem> = books
        .iter()
        .map(|book| {
            let mut spans = vec![Span::styled(
                book.display_title().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if let Some(author) = &book.author {
                spans.push(Span::styled(
                    format!(" — {author}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(pages) = book.total_pages {
                spans.push(Span::styled(
                    format!("  {pages}p"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::styled(
                if book.toc_exists { "  [toc]" } else { "  [no toc]" },
                Style::default().fg(if book.toc_exists {
                    Color::Green
                } else {
                    Color::Yellow
                }),
            ));
            if let Some(offset) = book.alignment_offset {
                spans.push(Span::styled(
                    format!("  offset {offset:+}"),
                    Style::default().fg(Color::Magenta),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    if items.is_empty() {
        let empty = Paragraph::new("Shelf is empty. Upload a PDF with `pageturn upload <file>`.")
            .block(Block::default().borders(Borders::ALL).title(" books "))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, body);
    } else {
        selectable_list(frame, body, " books ", items, selected);
    }

    render_status(
        frame,
        status_area,
        "↑/↓ select | Enter toc | v view | a align | e edit | r refresh | q quit",
        notice,
    );
}

/// TOC browser: chapter list, with an optional section pane drilled into.
pub fn toc(
    frame: &mut Frame,
    book: &BookRecord,
    chapters: &[ChapterSummary],
    chapter_selected: usize,
    sections: Option<(&str, &[SectionSummary], usize)>,
    notice: Option<&Notice>,
) {
    let (body, status_area) = chrome(frame, &format!("contents :: {}", book.display_title()));

    let chapter_items: Vec<ListItem> = chapters
        .iter()
        .map(|ch| {
            let label = match &ch.index {
                Some(index) => format!("{index}  {}", ch.title),
                None => ch.title.clone(),
            };
            ListItem::new(Line::from(vec![
                Span::raw(label),
                Span::styled(
                    format!("  p.{}", ch.start_page_number),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    match sections {
        None => {
            selectable_list(frame, body, " chapters ", chapter_items, chapter_selected);
            render_status(
                frame,
                status_area,
                "↑/↓ select | Enter sections | v view from here | Esc back",
                notice,
            );
        }
        Some((chapter_title, section_list, section_selected)) => {
            let [left, right] =
                Layout::horizontal([Constraint::Percentage(40), Constraint::Fill(1)]).areas(body);
            selectable_list(frame, left, " chapters ", chapter_items, chapter_selected);

            let section_items: Vec<ListItem> = section_list
                .iter()
                .map(|sec| {
                    let label = match &sec.index {
                        Some(index) => format!("{index}  {}", sec.title),
                        None => sec.title.clone(),
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(label),
                        Span::styled(
                            format!("  p.{}", sec.start_page_number),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();
            selectable_list(
                frame,
                right,
                &format!(" {chapter_title} "),
                section_items,
                section_selected,
            );
            render_status(
                frame,
                status_area,
                "↑/↓ select | v view from here | Esc back to chapters",
                notice,
            );
        }
    }
}

/// Page viewer, with the alignment banner when confirming chapter starts.
pub fn viewer(
    frame: &mut Frame,
    book: &BookRecord,
    session: &ViewerSession,
    page_text: Option<&str>,
    notice: Option<&Notice>,
) {
    let (body, status_area) = chrome(frame, &format!("viewer :: {}", book.display_title()));

    let aligning = session.mode() == SessionMode::VisualAlignment && session.awaiting_confirmation();
    let (banner_area, text_area) = if aligning {
        let [banner, text] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(body);
        (Some(banner), text)
    } else {
        (None, body)
    };

    if let Some(area) = banner_area {
        let banner = Paragraph::new(Span::styled(
            " ALIGN: navigate to the page where chapter 1 begins, then press Enter ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(banner, area);
    }

    let title = format!(
        " page {} (raw {}) ",
        session.current_page(),
        session.raw_page()
    );
    let text = Paragraph::new(page_text.unwrap_or("(page unavailable)"))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(text, text_area);

    let bounds = session.bounds();
    let arrow = |open: bool, glyph: &'static str| {
        Span::styled(
            format!(" {glyph} "),
            Style::default().fg(if open { Color::Green } else { Color::DarkGray }),
        )
    };
    let status = Paragraph::new(Line::from(vec![
        arrow(bounds.can_go_previous, "◀"),
        arrow(bounds.can_go_next, "▶"),
        Span::styled(
            if bounds.is_checking {
                " checking bounds… "
            } else {
                " "
            },
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            if aligning {
                "←/→ step | PgUp/PgDn ±5 | Enter confirm | Esc cancel"
            } else {
                "←/→ step | PgUp/PgDn ±5 | Esc close"
            },
            Style::default().fg(Color::DarkGray),
        ),
        notice_span(notice),
    ]));
    frame.render_widget(status, status_area);
}

/// Metadata editor for one book.
pub fn edit(
    frame: &mut Frame,
    book: &BookRecord,
    title: &str,
    author: &str,
    keywords: &str,
    active: EditField,
    notice: Option<&Notice>,
) {
    let (body, status_area) = chrome(frame, &format!("edit :: {}", book.display_title()));

    let [title_area, author_area, keywords_area, _rest] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(body);

    let field = |label: &str, value: &str, is_active: bool| {
        let style = if is_active {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Paragraph::new(value.to_string())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {label} "))
                    .border_style(style),
            )
            .style(style)
    };

    frame.render_widget(
        field("title", title, active == EditField::Title),
        title_area,
    );
    frame.render_widget(
        field("author", author, active == EditField::Author),
        author_area,
    );
    frame.render_widget(
        field("keywords", keywords, active == EditField::Keywords),
        keywords_area,
    );

    render_status(frame, status_area, "Tab next field | Enter save | Esc cancel", notice);
}
