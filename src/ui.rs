use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use equieat::{AppConfig, ReliefSession, SupplyCategory, VulnerabilityAttribute};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Inventory,
    Distribution,
    Reserve,
    Summary,
}

impl Page {
    const ALL: [Page; 4] = [Page::Inventory, Page::Distribution, Page::Reserve, Page::Summary];

    pub fn next(&self) -> Self {
        match self {
            Page::Inventory => Page::Distribution,
            Page::Distribution => Page::Reserve,
            Page::Reserve => Page::Summary,
            Page::Summary => Page::Inventory,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Inventory => Page::Summary,
            Page::Distribution => Page::Inventory,
            Page::Reserve => Page::Distribution,
            Page::Summary => Page::Reserve,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Inventory => "Inventory",
            Page::Distribution => "Distribution Results",
            Page::Reserve => "Reserve & Excess Stock",
            Page::Summary => "Demographics",
        }
    }
}

// ============================================================================
// ADD-SUPPLY FORM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Category,
    Name,
    Quantity,
    Target,
}

impl FormField {
    fn next(&self) -> Self {
        match self {
            FormField::Category => FormField::Name,
            FormField::Name => FormField::Quantity,
            FormField::Quantity => FormField::Target,
            FormField::Target => FormField::Category,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupplyForm {
    pub category: usize,
    pub name: String,
    pub quantity: String,
    /// 0 = everyone, otherwise VulnerabilityAttribute::ALL[target - 1]
    pub target: usize,
    pub focus: FormField,
}

impl SupplyForm {
    fn new() -> Self {
        SupplyForm {
            category: 0,
            name: String::new(),
            quantity: String::new(),
            target: 0,
            focus: FormField::Category,
        }
    }

    fn selected_category(&self) -> SupplyCategory {
        SupplyCategory::ALL[self.category % SupplyCategory::ALL.len()]
    }

    fn selected_target(&self) -> Option<VulnerabilityAttribute> {
        match self.target {
            0 => None,
            i => VulnerabilityAttribute::ALL.get(i - 1).copied(),
        }
    }

    fn target_label(&self) -> &'static str {
        self.selected_target()
            .map(|t| t.as_str())
            .unwrap_or("EVERYONE (General)")
    }

    fn cycle(&mut self, forward: bool) {
        let (value, len) = match self.focus {
            FormField::Category => (&mut self.category, SupplyCategory::ALL.len()),
            FormField::Target => (&mut self.target, VulnerabilityAttribute::ALL.len() + 1),
            _ => return,
        };
        *value = if forward { (*value + 1) % len } else { (*value + len - 1) % len };
    }

    fn push(&mut self, c: char) {
        match self.focus {
            FormField::Name => self.name.push(c),
            FormField::Quantity => self.quantity.push(c),
            _ => {}
        }
    }

    fn pop(&mut self) {
        match self.focus {
            FormField::Name => {
                self.name.pop();
            }
            FormField::Quantity => {
                self.quantity.pop();
            }
            _ => {}
        }
    }
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub session: ReliefSession,
    pub config: AppConfig,
    pub current_page: Page,
    pub inventory_state: TableState,
    pub results_state: TableState,
    pub reserve_state: TableState,
    pub form: Option<SupplyForm>,
    pub status: String,
}

impl App {
    pub fn new(session: ReliefSession, config: AppConfig) -> Self {
        let status = if session.households().is_empty() {
            "Status: Waiting for data (start with a households file)".to_string()
        } else {
            format!("Status: Ready ({} Families Loaded)", session.households().len())
        };

        let mut app = Self {
            session,
            config,
            current_page: Page::Inventory,
            inventory_state: TableState::default(),
            results_state: TableState::default(),
            reserve_state: TableState::default(),
            form: None,
            status,
        };
        app.reset_selection();
        app
    }

    fn row_count(&self, page: Page) -> usize {
        match page {
            Page::Inventory => self.session.supplies().len(),
            Page::Distribution => self.session.households().len(),
            Page::Reserve => self.session.reserve_lines().len(),
            Page::Summary => 0,
        }
    }

    fn table_state(&mut self, page: Page) -> Option<&mut TableState> {
        match page {
            Page::Inventory => Some(&mut self.inventory_state),
            Page::Distribution => Some(&mut self.results_state),
            Page::Reserve => Some(&mut self.reserve_state),
            Page::Summary => None,
        }
    }

    fn reset_selection(&mut self) {
        for page in Page::ALL {
            let len = self.row_count(page);
            if let Some(state) = self.table_state(page) {
                state.select(if len == 0 { None } else { Some(0) });
            }
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Move the selection on the current page by `delta` rows, clamped
    pub fn move_selection(&mut self, delta: isize) {
        let page = self.current_page;
        let len = self.row_count(page);
        let Some(state) = self.table_state(page) else {
            return;
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        state.select(Some(next as usize));
    }

    pub fn select_edge(&mut self, end: bool) {
        let page = self.current_page;
        let len = self.row_count(page);
        if let Some(state) = self.table_state(page) {
            state.select(match (len, end) {
                (0, _) => None,
                (_, false) => Some(0),
                (n, true) => Some(n - 1),
            });
        }
    }

    pub fn run_distribution(&mut self) {
        match self.session.run_distribution() {
            Ok(run) => {
                self.status = format!(
                    "Distributed {} units to {} families, {} units in reserve",
                    run.allocation.total_distributed(),
                    run.summary.total_households,
                    run.allocation.total_leftover()
                );
                self.current_page = Page::Distribution;
            }
            Err(e) => self.status = format!("Missing Data: {}", e),
        }
        self.reset_selection();
    }

    pub fn export(&mut self) {
        self.status = match self.session.export(&self.config) {
            Ok(paths) => format!(
                "Files Generated: {}, {}, {}",
                paths.packing_list.display(),
                paths.reserve_report.display(),
                paths.claim_stubs.display()
            ),
            Err(e) => format!("Error exporting: {:#}", e),
        };
    }

    pub fn remove_selected_supply(&mut self) {
        let Some(name) = self
            .inventory_state
            .selected()
            .and_then(|i| self.session.supplies().get(i))
            .map(|s| s.name.clone())
        else {
            return;
        };

        self.status = match self.session.remove_supply(&name) {
            Ok(removed) => format!("Removed {} line(s) of {}", removed, name),
            Err(e) => format!("Error: {}", e),
        };
        self.reset_selection();
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        let category = form.selected_category();
        let target = form.selected_target();
        let name = form.name.clone();
        let quantity = form.quantity.clone();

        match self
            .session
            .add_supply_from_input(category, &name, &quantity, target)
        {
            Ok(()) => {
                self.status = format!("Added {}x {}", quantity.trim(), name.trim());
                self.form = None;
                self.reset_selection();
            }
            Err(e) => self.status = format!("Invalid Input: {}", e),
        }
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if app.form.is_some() {
            handle_form_key(app, key);
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Tab => app.next_page(),
            KeyCode::BackTab => app.previous_page(),
            KeyCode::Char('a') => {
                app.current_page = Page::Inventory;
                app.form = Some(SupplyForm::new());
            }
            KeyCode::Char('d') if app.current_page == Page::Inventory => {
                app.remove_selected_supply()
            }
            KeyCode::Char('r') => app.run_distribution(),
            KeyCode::Char('e') => app.export(),
            KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
            KeyCode::PageDown => app.move_selection(20),
            KeyCode::PageUp => app.move_selection(-20),
            KeyCode::Home => app.select_edge(false),
            KeyCode::End => app.select_edge(true),
            _ => {}
        }
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) {
    let Some(form) = app.form.as_mut() else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.form = None,
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => form.focus = form.focus.next(),
        KeyCode::Left => form.cycle(false),
        KeyCode::Right | KeyCode::Char(' ')
            if matches!(form.focus, FormField::Category | FormField::Target) =>
        {
            form.cycle(true)
        }
        KeyCode::Backspace => form.pop(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.push(c),
        _ => {}
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Inventory => render_inventory(f, chunks[1], app),
        Page::Distribution => render_results(f, chunks[1], app),
        Page::Reserve => render_reserve(f, chunks[1], app),
        Page::Summary => render_summary(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(form) = &app.form {
        render_form(f, form);
    }
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn highlight_style() -> Style {
    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|h| Cell::from(*h).style(header_style())))
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Families: {}", app.session.households().len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Supplies: {}", app.session.supplies().len()),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" EquiEat "),
    );

    f.render_widget(header, area);
}

fn render_inventory(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.session.supplies().iter().map(|s| {
        let color = if s.category.is_reserved() {
            Color::Magenta
        } else if s.is_targeted() {
            Color::Yellow
        } else {
            Color::White
        };

        Row::new(vec![
            Cell::from(s.category.as_str()).style(Style::default().fg(color)),
            Cell::from(truncate(&s.name, 30)),
            Cell::from(s.total_quantity.to_string()),
            Cell::from(s.target_label()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(20),
        ],
    )
    .header(header_row(&["Category", "Item", "Qty", "Target"]))
    .block(bordered(" Inventory "))
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.inventory_state);
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.session.households().iter().map(|h| {
        let pack = h.received().packing_list();
        let color = if pack.is_empty() { Color::DarkGray } else { Color::Green };

        Row::new(vec![
            Cell::from(truncate(&h.id, 10)),
            Cell::from(truncate(&h.head_name, 22)),
            Cell::from(h.member_count().to_string()),
            Cell::from(truncate(&h.attribute_labels(), 24)).style(Style::default().fg(Color::Red)),
            Cell::from(pack).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(24),
            Constraint::Length(6),
            Constraint::Length(26),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["ID", "Head", "Size", "Priorities", "Allocated Pack"]))
    .block(bordered(" Distribution Results "))
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.results_state);
}

fn render_reserve(f: &mut Frame, area: Rect, app: &mut App) {
    let lines = app.session.reserve_lines();
    let rows = lines.iter().map(|line| {
        Row::new(vec![
            Cell::from(line.category.as_str()),
            Cell::from(truncate(&line.name, 30)),
            Cell::from(line.quantity.to_string()).style(Style::default().fg(Color::Yellow)),
            Cell::from(line.status.as_str()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(32),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header_row(&["Category", "Item Name", "RESERVE QUANTITY", "Status Note"]))
    .block(bordered(" Reserve & Excess Stock (whole units; includes specialized medicine) "))
    .highlight_style(highlight_style())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.reserve_state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.session.summary();

    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Demographic Analysis Summary",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  Total Population:   {} citizens", summary.total_population)),
        Line::from(format!("  Total Families:     {}", summary.total_households)),
        Line::from(""),
        Line::from("  Number of Vulnerable Households:"),
    ];
    for (label, count) in summary.vulnerability_lines() {
        content.push(Line::from(vec![
            Span::raw(format!("     • {:<14}", format!("{}:", label))),
            Span::styled(count.to_string(), Style::default().fg(Color::Yellow)),
        ]));
    }

    if let Some(run) = app.session.last_run() {
        content.push(Line::from(""));
        content.push(Line::from(format!(
            "  Last run: {} ({} units distributed, {} in reserve)",
            run.completed_at.format("%Y-%m-%d %H:%M:%S"),
            run.allocation.total_distributed(),
            run.allocation.total_leftover()
        )));
    }

    f.render_widget(Paragraph::new(content).block(bordered(" Demographics ")), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let status_spans = vec![
        Span::styled(format!(" {} ", app.status), Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        key("a"),
        Span::raw(" Add | "),
        key("d"),
        Span::raw(" Delete | "),
        key("r"),
        Span::raw(" Run | "),
        key("e"),
        Span::raw(" Export | "),
        key("Tab"),
        Span::raw(" Page | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, form: &SupplyForm) {
    let area = centered_rect(60, 12, f.size());

    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![
            Span::raw(format!("  {:<18}", label)),
            Span::styled(value, style),
        ])
    };

    let content = vec![
        Line::from(""),
        field(
            "Category:",
            format!("◀ {} ▶", form.selected_category()),
            form.focus == FormField::Category,
        ),
        field("Item Name:", format!("{}_", form.name), form.focus == FormField::Name),
        field(
            "Quantity (Total):",
            format!("{}_", form.quantity),
            form.focus == FormField::Quantity,
        ),
        field(
            "Priority Target:",
            format!("◀ {} ▶", form.target_label()),
            form.focus == FormField::Target,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "  Tab next field · ←/→ change · Enter add · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Add Inventory Item "),
        ),
        area,
    );
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
