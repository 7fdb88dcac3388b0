use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use komekaigi_site::config::SiteConfig;
use komekaigi_site::fetch::{FileSource, Fetcher, HttpSource, ThreadSleeper};
use komekaigi_site::modal::{CANCEL_KEY, ClickTarget, HostRequest, ModalController, UiEvent};
use komekaigi_site::page::Page;
use komekaigi_site::render::{RELOAD_BUTTON_ID, logo_wrapper_id, social_url};
use komekaigi_site::site::{SectionOutcome, SponsorSection, build_site};
use komekaigi_site::sponsors::{SponsorCategory, SponsorRecord};

#[derive(Parser)]
#[command(
    name = "komekaigi_site",
    about = "Render the conference site's sponsor sections and preview the sponsor wall",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch data and write the rendered page.
    Build {
        /// Page template; defaults to `<site root>/index.html`.
        #[arg(long)]
        template: Option<PathBuf>,

        /// Output file.
        #[arg(long, default_value = "dist/index.html")]
        out: PathBuf,

        /// Directory holding `data/` and `assets/` (overrides SITE_ROOT).
        #[arg(long)]
        site_root: Option<PathBuf>,
    },

    /// Browse the sponsor wall in the terminal.
    Preview,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = SiteConfig::from_env();
    match cli.command {
        Commands::Build {
            template,
            out,
            site_root,
        } => {
            if let Some(root) = site_root {
                config.site_root = root;
            }
            run_build(&config, template, &out)
        }
        Commands::Preview => run_preview(config),
    }
}

fn run_build(config: &SiteConfig, template: Option<PathBuf>, out: &Path) -> Result<()> {
    let template_path = template.unwrap_or_else(|| config.site_root.join("index.html"));
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("failed to read template {}", template_path.display()))?;

    let report = build_site(
        config,
        &template,
        HttpSource,
        FileSource::new(&config.site_root),
        &ThreadSleeper,
    );

    if let Some(dir) = out.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(out, report.page.to_html())
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Site build complete");
    println!("Template: {}", template_path.display());
    println!("Output: {}", out.display());
    println!("Sponsors: {}", report.sponsors.label());
    println!("Individual sponsors: {}", report.individual_sponsors.label());
    if !report.modal_ready {
        println!("Sponsor modal: elements missing, details disabled");
    }
    Ok(())
}

const PREVIEW_TEMPLATE: &str = r#"<body>
<section id="sponsors"><div id="sponsors-content"></div></section>
<div id="sponsorModal" class="modal">
  <div id="sponsorModalContent" class="modal-content">
    <button id="modalCloseButton" type="button">×</button>
    <div id="modalLogo"></div>
    <div id="modalInfo"></div>
  </div>
</div>
</body>"#;

struct App {
    config: SiteConfig,
    page: Page,
    section: SponsorSection,
    modal: ModalController,
    records: Vec<SponsorRecord>,
    outcome: SectionOutcome,
    selected: usize,
    last_area: Rect,
    should_quit: bool,
}

impl App {
    fn new(config: SiteConfig) -> Self {
        let section = SponsorSection::from_config(&config);
        let modal = ModalController::new(section.directory().clone())
            .min_pr_length(config.min_pr_length);
        let mut app = Self {
            config,
            page: Page::parse(PREVIEW_TEMPLATE),
            section,
            modal,
            records: Vec::new(),
            outcome: SectionOutcome::Empty,
            selected: 0,
            last_area: Rect::default(),
            should_quit: false,
        };
        app.reload();
        app
    }

    fn reload(&mut self) {
        self.modal.close(&mut self.page);
        self.page = Page::parse(PREVIEW_TEMPLATE);
        let fetcher = Fetcher::new(HttpSource, self.config.retry);
        self.outcome = self.section.load(&mut self.page, &fetcher);
        self.modal.replace_directory(self.section.directory().clone());

        let mut records = self.section.directory().records().to_vec();
        records.sort_by_key(|r| {
            SponsorCategory::DISPLAY_ORDER
                .iter()
                .position(|c| *c == r.category)
                .unwrap_or(usize::MAX)
        });
        self.records = records;
        self.selected = self.selected.min(self.records.len().saturating_sub(1));
    }

    fn dispatch(&mut self, event: UiEvent) {
        if let Some(HostRequest::ReloadSponsors) = self.modal.handle_event(&mut self.page, &event) {
            self.reload();
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.dispatch(UiEvent::KeyDown(CANCEL_KEY.to_string())),
            KeyCode::Char('x') => {
                let close = self.modal.elements().close_button.clone();
                self.dispatch(UiEvent::Click(ClickTarget::element(&close)));
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.page.contains(RELOAD_BUTTON_ID) {
                    let target = ClickTarget::resolve(&self.page, RELOAD_BUTTON_ID);
                    self.dispatch(UiEvent::Click(target));
                } else {
                    self.reload();
                }
            }
            KeyCode::Char('j') | KeyCode::Down if !self.modal.is_open() => {
                if self.selected + 1 < self.records.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up if !self.modal.is_open() => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Enter => {
                let Some(record) = self.records.get(self.selected) else {
                    return;
                };
                let target = ClickTarget::resolve(&self.page, &logo_wrapper_id(&record.id));
                self.dispatch(UiEvent::Click(target));
            }
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) || !self.modal.is_open() {
            return;
        }
        let inside = in_rect(popup_rect(self.last_area), mouse.column, mouse.row);
        let target = if inside {
            "sponsorModalContent".to_string()
        } else {
            self.modal.elements().overlay.clone()
        };
        self.dispatch(UiEvent::Click(ClickTarget::element(&target)));
    }
}

fn run_preview(config: SiteConfig) -> Result<()> {
    eprintln!("Loading sponsors from {} ...", config.sponsors_api_url);
    let mut app = App::new(config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("preview failed")
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| {
            app.last_area = f.size();
            ui(f, app);
        })?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(format!("KOMEKAIGI SPONSORS | {}", app.outcome.label()))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_wall(frame, chunks[1], app);

    let footer = Paragraph::new(
        "j/k/↑/↓ Move | Enter Details | Esc/x/click outside Close | r Reload | q Quit",
    )
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if let Some(record) = app.modal.current() {
        render_modal(frame, frame.size(), record, app.config.min_pr_length);
    }
}

fn render_wall(frame: &mut Frame, area: Rect, app: &App) {
    if app.records.is_empty() {
        let empty = Paragraph::new("No sponsors to show")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let visible = area.height as usize;
    let start = app
        .selected
        .saturating_sub(visible.saturating_sub(1))
        .min(app.records.len().saturating_sub(visible));
    let lines: Vec<Line> = app
        .records
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(idx, record)| {
            let style = if idx == app.selected {
                Style::default().bg(Color::Yellow).fg(Color::Black)
            } else {
                Style::default()
            };
            Line::styled(
                format!("{:<7} {}", record.category.label(), record.name),
                style,
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_modal(frame: &mut Frame, area: Rect, record: &SponsorRecord, min_pr_length: usize) {
    let popup_area = popup_rect(area);
    frame.render_widget(Clear, popup_area);

    let mut text = vec![
        record.name.clone(),
        record.category.label_jp().to_string(),
        String::new(),
        format!("Logo: {}", record.logo_url),
    ];
    if let Some(pr) = record
        .promotional_text
        .as_deref()
        .filter(|pr| pr.chars().count() >= min_pr_length)
    {
        text.push(String::new());
        text.push(pr.to_string());
    }
    if record.external_url.is_some() || record.social_handle.is_some() {
        text.push(String::new());
    }
    if let Some(url) = record.external_url.as_deref() {
        text.push(format!("Web: {url}"));
    }
    if let Some(handle) = record.social_handle.as_deref() {
        text.push(format!("X:   {}", social_url(handle)));
    }

    let modal = Paragraph::new(text.join("\n"))
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Sponsor").borders(Borders::ALL));
    frame.render_widget(modal, popup_area);
}

const POPUP_WIDTH_PCT: u16 = 70;
const POPUP_HEIGHT_PCT: u16 = 60;

/// Area of the sponsor popup inside `area`; clicks outside it hit the overlay.
fn popup_rect(area: Rect) -> Rect {
    let scale = |len: u16, pct: u16| (u32::from(len) * u32::from(pct) / 100) as u16;
    let width = scale(area.width, POPUP_WIDTH_PCT);
    let height = scale(area.height, POPUP_HEIGHT_PCT);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn in_rect(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered_inside_the_frame() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = popup_rect(area);
        assert_eq!(popup, Rect::new(15, 10, 70, 30));
        assert!(in_rect(popup, 50, 25));
        assert!(!in_rect(popup, 5, 25));
        assert!(!in_rect(popup, 50, 40));
    }

    #[test]
    fn popup_scales_wide_terminals_without_overflow() {
        let popup = popup_rect(Rect::new(0, 0, 1_000, 300));
        assert_eq!(popup.width, 700);
        assert_eq!(popup.height, 180);
        assert_eq!(popup.x, 150);
    }
}
