//! Interactive shelf browser and page viewer.
//!
//! One crossterm event loop drives everything. Each tick drains completed
//! probes into the open session, refreshes the displayed page text if the
//! position has settled somewhere new, renders, and handles at most one key
//! event. Screens form a small stack: shelf → TOC browser → viewer, plus a
//! metadata editor.
//!
//! Navigation keys go straight to the session's state machine, which is
//! what enforces the rules: arrows are dropped while bounds are being
//! probed, jumps are not, and Escape always closes.

pub mod probe;
pub mod widgets;

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use miette::IntoDiagnostic;

use crate::client::ReaderClient;
use crate::notice::Notice;
use crate::shelf::{BookId, BookPatch, BookRecord, ChapterSummary, SectionSummary};
use crate::viewer::{
    DocumentBackend, SessionMode, ViewerError, ViewerSession, JUMP_STRIDE,
};

use probe::ProbeWorker;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which metadata field the editor cursor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Author,
    Keywords,
}

impl EditField {
    fn next(self) -> Self {
        match self {
            Self::Title => Self::Author,
            Self::Author => Self::Keywords,
            Self::Keywords => Self::Title,
        }
    }
}

struct SectionPane {
    /// Index into the chapter list this pane was drilled from.
    chapter: usize,
    sections: Vec<SectionSummary>,
    selected: usize,
}

struct TocView {
    book: BookRecord,
    chapters: Vec<ChapterSummary>,
    selected: usize,
    sections: Option<SectionPane>,
}

struct ViewerView {
    book: BookRecord,
    session: ViewerSession,
    page_text: Option<String>,
    /// Logical page the cached text belongs to.
    text_page: Option<i64>,
}

struct EditView {
    book: BookRecord,
    field: EditField,
    title: String,
    author: String,
    keywords: String,
}

impl EditView {
    fn active_mut(&mut self) -> &mut String {
        match self.field {
            EditField::Title => &mut self.title,
            EditField::Author => &mut self.author,
            EditField::Keywords => &mut self.keywords,
        }
    }
}

enum Screen {
    Shelf,
    Toc(TocView),
    Viewer(ViewerView),
    Edit(EditView),
}

/// TUI application state.
pub struct ReaderTui {
    client: Arc<ReaderClient>,
    worker: ProbeWorker,
    books: Vec<BookRecord>,
    shelf_selected: usize,
    screen: Screen,
    notice: Option<Notice>,
    should_quit: bool,
}

impl ReaderTui {
    pub fn new(client: Arc<ReaderClient>) -> miette::Result<Self> {
        let backend: Arc<dyn DocumentBackend> = client.clone();
        let worker = ProbeWorker::spawn(backend).into_diagnostic()?;
        let books = client.list_books().into_diagnostic()?;
        Ok(Self {
            client,
            worker,
            books,
            shelf_selected: 0,
            screen: Screen::Shelf,
            notice: None,
            should_quit: false,
        })
    }

    /// Jump straight into visual alignment for one book (`pageturn align`).
    pub fn open_alignment(&mut self, book: BookId) -> miette::Result<()> {
        let record = self
            .books
            .iter()
            .find(|b| b.id == book)
            .cloned()
            .ok_or_else(|| miette::miette!("book {book} is not on the shelf"))?;
        self.open_alignment_viewer(record);
        Ok(())
    }

    /// Run the event loop until quit.
    pub fn run(&mut self) -> miette::Result<()> {
        let mut terminal = ratatui::init();

        loop {
            self.drain_probe_results();
            self.refresh_page_text();

            terminal
                .draw(|frame| match &self.screen {
                    Screen::Shelf => widgets::shelf(
                        frame,
                        &self.books,
                        self.shelf_selected,
                        self.notice.as_ref(),
                    ),
                    Screen::Toc(view) => {
                        let sections = view.sections.as_ref().map(|pane| {
                            let title = view
                                .chapters
                                .get(pane.chapter)
                                .map(|c| c.title.as_str())
                                .unwrap_or("sections");
                            (title, pane.sections.as_slice(), pane.selected)
                        });
                        widgets::toc(
                            frame,
                            &view.book,
                            &view.chapters,
                            view.selected,
                            sections,
                            self.notice.as_ref(),
                        );
                    }
                    Screen::Viewer(view) => widgets::viewer(
                        frame,
                        &view.book,
                        &view.session,
                        view.page_text.as_deref(),
                        self.notice.as_ref(),
                    ),
                    Screen::Edit(view) => widgets::edit(
                        frame,
                        &view.book,
                        &view.title,
                        &view.author,
                        &view.keywords,
                        view.field,
                        self.notice.as_ref(),
                    ),
                })
                .into_diagnostic()?;

            if self.should_quit {
                break;
            }

            if event::poll(POLL_INTERVAL).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    self.handle_key(key.code, key.modifiers);
                }
            }
        }

        ratatui::restore();
        Ok(())
    }

    /// Deliver completed probes to the open session. Results for another
    /// book, or arriving with no session open, are dropped.
    fn drain_probe_results(&mut self) {
        while let Some((book, outcome)) = self.worker.try_recv() {
            if let Screen::Viewer(view) = &mut self.screen {
                if view.book.id == book {
                    view.session.complete_probe(outcome);
                }
            }
        }
    }

    /// Fetch page text when the session has moved to a page we have no text
    /// for. Fetched at most once per position; a nonexistent page simply
    /// renders as unavailable until the user navigates away.
    fn refresh_page_text(&mut self) {
        let Screen::Viewer(view) = &mut self.screen else {
            return;
        };
        let current = view.session.current_page();
        if view.text_page == Some(current) {
            return;
        }
        view.page_text = match self.client.page_text(view.book.id, view.session.raw_page()) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(book = %view.book.id, page = current, error = %e, "page text unavailable");
                None
            }
        };
        view.text_page = Some(current);
    }

    // -- key dispatch --

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Shelf => self.handle_shelf_key(code),
            Screen::Toc(_) => self.handle_toc_key(code),
            Screen::Viewer(_) => self.handle_viewer_key(code),
            Screen::Edit(_) => self.handle_edit_key(code),
        }
    }

    fn handle_shelf_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.shelf_selected = self.shelf_selected.saturating_sub(1),
            KeyCode::Down => {
                if self.shelf_selected + 1 < self.books.len() {
                    self.shelf_selected += 1;
                }
            }
            KeyCode::Enter => self.open_toc(),
            KeyCode::Char('v') => {
                if let Some(book) = self.selected_book() {
                    self.open_viewer(book, 0);
                }
            }
            KeyCode::Char('a') => {
                if let Some(book) = self.selected_book() {
                    self.open_alignment_viewer(book);
                }
            }
            KeyCode::Char('e') => {
                if let Some(book) = self.selected_book() {
                    self.screen = Screen::Edit(EditView {
                        field: EditField::Title,
                        title: book.title.clone().unwrap_or_default(),
                        author: book.author.clone().unwrap_or_default(),
                        keywords: book.keywords.clone().unwrap_or_default(),
                        book,
                    });
                    self.notice = None;
                }
            }
            KeyCode::Char('r') => {
                if self.reload_books() {
                    self.notice = Some(Notice::info(format!(
                        "{} books on the shelf",
                        self.books.len()
                    )));
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_toc_key(&mut self, code: KeyCode) {
        enum After {
            Stay,
            Back,
            OpenViewer(BookRecord, i64),
        }

        let Screen::Toc(view) = &mut self.screen else {
            return;
        };
        let mut after = After::Stay;

        match code {
            KeyCode::Up => match &mut view.sections {
                Some(pane) => pane.selected = pane.selected.saturating_sub(1),
                None => view.selected = view.selected.saturating_sub(1),
            },
            KeyCode::Down => match &mut view.sections {
                Some(pane) => {
                    if pane.selected + 1 < pane.sections.len() {
                        pane.selected += 1;
                    }
                }
                None => {
                    if view.selected + 1 < view.chapters.len() {
                        view.selected += 1;
                    }
                }
            },
            KeyCode::Enter => {
                if view.sections.is_none() {
                    if let Some(chapter) = view.chapters.get(view.selected) {
                        match self.client.sections(view.book.id, chapter.chapter_id) {
                            Ok(sections) if sections.is_empty() => {
                                self.notice =
                                    Some(Notice::info("no sections extracted for this chapter"));
                            }
                            Ok(sections) => {
                                view.sections = Some(SectionPane {
                                    chapter: view.selected,
                                    sections,
                                    selected: 0,
                                });
                                self.notice = None;
                            }
                            Err(e) => {
                                self.notice = Some(Notice::error("client", e.to_string()));
                            }
                        }
                    }
                }
            }
            KeyCode::Esc | KeyCode::Backspace => {
                if view.sections.is_some() {
                    view.sections = None;
                } else {
                    after = After::Back;
                }
            }
            KeyCode::Char('v') => {
                let start = match &view.sections {
                    Some(pane) => pane
                        .sections
                        .get(pane.selected)
                        .map(|s| s.start_page_number),
                    None => view.chapters.get(view.selected).map(|c| c.start_page_number),
                };
                if let Some(raw_start) = start {
                    // Chapter starts are raw indexes; the viewer works in
                    // logical pages.
                    after = After::OpenViewer(view.book.clone(), raw_start + view.book.offset());
                }
            }
            _ => {}
        }

        match after {
            After::Stay => {}
            After::Back => self.screen = Screen::Shelf,
            After::OpenViewer(book, page) => self.open_viewer(book, page),
        }
    }

    fn handle_viewer_key(&mut self, code: KeyCode) {
        let Screen::Viewer(view) = &mut self.screen else {
            return;
        };
        let mut close = false;

        match code {
            KeyCode::Left => {
                if let Some(req) = view.session.previous_page() {
                    self.worker.submit(view.book.id, req);
                }
            }
            KeyCode::Right => {
                if let Some(req) = view.session.next_page() {
                    self.worker.submit(view.book.id, req);
                }
            }
            KeyCode::PageUp => {
                if let Some(req) = view.session.jump_back(JUMP_STRIDE) {
                    self.worker.submit(view.book.id, req);
                }
            }
            KeyCode::PageDown => {
                if let Some(req) = view.session.jump_forward(JUMP_STRIDE) {
                    self.worker.submit(view.book.id, req);
                }
            }
            KeyCode::Enter if view.session.mode() == SessionMode::VisualAlignment => {
                match view.session.confirm() {
                    Ok(offset) => {
                        self.notice = Some(Notice::AlignmentSaved {
                            book: view.book.id,
                            offset,
                        });
                        if let Some(record) =
                            self.books.iter_mut().find(|b| b.id == view.book.id)
                        {
                            record.alignment_offset = Some(offset);
                        }
                        close = true;
                    }
                    Err(ViewerError::ChapterLookupFailed { source }) => {
                        self.notice = Some(Notice::ChapterLookupFailed {
                            book: view.book.id,
                            detail: source.to_string(),
                        });
                    }
                    Err(ViewerError::PersistFailed { source, .. }) => {
                        self.notice = Some(Notice::PersistFailed {
                            book: view.book.id,
                            detail: source.to_string(),
                        });
                    }
                    Err(err) => {
                        self.notice = Some(Notice::error("viewer", err.to_string()));
                    }
                }
            }
            KeyCode::Esc => {
                view.session.close();
                close = true;
            }
            _ => {}
        }

        if close {
            self.screen = Screen::Shelf;
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Screen::Edit(view) = &mut self.screen else {
            return;
        };
        let mut leave = false;

        match code {
            KeyCode::Tab => view.field = view.field.next(),
            KeyCode::Char(c) => view.active_mut().push(c),
            KeyCode::Backspace => {
                view.active_mut().pop();
            }
            KeyCode::Esc => leave = true,
            KeyCode::Enter => {
                let patch = BookPatch {
                    title: Some(view.title.clone()),
                    author: Some(view.author.clone()),
                    keywords: Some(view.keywords.clone()),
                    alignment_offset: None,
                };
                match self.client.update_book(view.book.id, &patch) {
                    Ok(()) => {
                        self.notice = Some(Notice::info(format!(
                            "saved metadata for book {}",
                            view.book.id
                        )));
                        leave = true;
                    }
                    Err(e) => self.notice = Some(Notice::error("client", e.to_string())),
                }
            }
            _ => {}
        }

        if leave {
            self.screen = Screen::Shelf;
            self.reload_books();
        }
    }

    // -- transitions --

    fn selected_book(&self) -> Option<BookRecord> {
        self.books.get(self.shelf_selected).cloned()
    }

    /// Refresh the cached shelf listing. Failures become a notice; the
    /// stale listing stays usable.
    fn reload_books(&mut self) -> bool {
        match self.client.list_books() {
            Ok(books) => {
                self.books = books;
                if self.shelf_selected >= self.books.len() {
                    self.shelf_selected = self.books.len().saturating_sub(1);
                }
                true
            }
            Err(e) => {
                self.notice = Some(Notice::error("client", e.to_string()));
                false
            }
        }
    }

    fn open_toc(&mut self) {
        let Some(book) = self.selected_book() else {
            return;
        };
        match self.client.chapters(book.id) {
            Ok(chapters) if chapters.is_empty() => {
                self.notice = Some(Notice::info(
                    "no table of contents yet — run `pageturn toc refresh`",
                ));
            }
            Ok(chapters) => {
                self.notice = None;
                self.screen = Screen::Toc(TocView {
                    book,
                    chapters,
                    selected: 0,
                    sections: None,
                });
            }
            Err(e) => self.notice = Some(Notice::error("client", e.to_string())),
        }
    }

    fn open_viewer(&mut self, book: BookRecord, start_page: i64) {
        let backend: Arc<dyn DocumentBackend> = self.client.clone();
        let (session, probe) = ViewerSession::open(backend, book.id, start_page);
        self.worker.submit(book.id, probe);
        self.notice = None;
        self.screen = Screen::Viewer(ViewerView {
            book,
            session,
            page_text: None,
            text_page: None,
        });
    }

    fn open_alignment_viewer(&mut self, book: BookRecord) {
        let backend: Arc<dyn DocumentBackend> = self.client.clone();
        let (session, probe) = ViewerSession::open_for_visual_alignment(backend, &book);
        self.worker.submit(book.id, probe);
        self.notice = None;
        self.screen = Screen::Viewer(ViewerView {
            book,
            session,
            page_text: None,
            text_page: None,
        });
    }
}

/// Launch the interactive shelf browser.
pub fn launch(client: Arc<ReaderClient>) -> miette::Result<()> {
    let mut tui = ReaderTui::new(client)?;
    tui.run()
}

/// Launch directly into visual alignment for one book.
pub fn launch_alignment(client: Arc<ReaderClient>, book: BookId) -> miette::Result<()> {
    let mut tui = ReaderTui::new(client)?;
    tui.open_alignment(book)?;
    tui.run()
}
