use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::Rect;

use term_dock::host::DropZone;
use term_dock::render::DockView;
use term_dock::serialization::ItemSpec;
use term_dock::{
    DockError, DockItem, DockLayout, DockManager, DockOptions, DragEngine, FloatRect, ItemId,
    MirrorHost, tracing_sub,
};

#[derive(Parser, Debug)]
#[command(
    name = "term-dock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dockable tabbed panes in the terminal. Drag tabs to float, split or regroup them."
)]
struct Cli {
    /// Layout file restored at start and written on quit.
    #[arg(short = 'l', long = "layout", value_name = "PATH")]
    layout: Option<PathBuf>,

    /// JSON file with dock options.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append debug logs to this file.
    #[arg(long = "log", value_name = "PATH")]
    log: Option<PathBuf>,
}

fn to_io(err: DockError) -> io::Error {
    io::Error::other(err.to_string())
}

struct App {
    manager: DockManager,
    host: MirrorHost,
    drag: DragEngine,
    layout_path: Option<PathBuf>,
    next_item: usize,
}

impl App {
    fn new(cli: &Cli, viewport: Rect) -> io::Result<Self> {
        let options = match &cli.config {
            Some(path) => DockOptions::load(path).map_err(to_io)?,
            None => DockOptions::default(),
        };
        let drag = DragEngine::from_options(&options);
        let mut app = Self {
            manager: DockManager::new(options),
            host: MirrorHost::new(viewport),
            drag,
            layout_path: cli.layout.clone(),
            next_item: 1,
        };
        app.seed().map_err(to_io)?;
        if app.layout_path.as_ref().is_some_and(|path| path.exists()) {
            app.restore().map_err(to_io)?;
        }
        app.fit_main(viewport);
        Ok(app)
    }

    fn seed(&mut self) -> Result<(), DockError> {
        let welcome = self
            .manager
            .open_item(DockItem::new("welcome", "Welcome"))?;
        self.manager.open_item(DockItem::new("notes", "Notes"))?;
        let output = self.manager.open_item(DockItem::new("output", "Output"))?;
        self.manager.dock_item(output, welcome, DropZone::Bottom)?;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), DockError> {
        let Some(path) = &self.layout_path else {
            return Ok(());
        };
        let layout = DockLayout::load(path)?;
        // every recorded item is recreated; content is only a title here
        let mut lookup = |_: &ItemId| Some(ItemSpec::default());
        let report = layout.restore_into(&mut self.manager, &mut lookup)?;
        if !report.is_clean() {
            tracing::warn!(?report, "layout restored with losses");
        }
        if let Some(highest) = self
            .manager
            .tree()
            .item_nodes()
            .iter()
            .filter_map(|node| self.manager.tree().item(*node))
            .filter_map(|item| item.item_id.as_str().strip_prefix("item-")?.parse::<usize>().ok())
            .max()
        {
            self.next_item = highest + 1;
        }
        Ok(())
    }

    fn save(&self) -> Result<(), DockError> {
        match &self.layout_path {
            Some(path) => DockLayout::capture(&self.manager).save(path),
            None => Ok(()),
        }
    }

    fn fit_main(&mut self, viewport: Rect) {
        self.host.set_viewport(viewport);
        let main = self.manager.main_window();
        if let Err(err) = self
            .manager
            .set_window_rect(main, FloatRect::from_rect(viewport))
        {
            tracing::warn!(error = %err, "could not resize main window");
        }
        self.manager.flush_to(&mut self.host);
    }

    fn add_item(&mut self) {
        let id = format!("item-{}", self.next_item);
        self.next_item += 1;
        let title = format!("Item {}", self.next_item - 1);
        if let Err(err) = self.manager.open_item(DockItem::new(id, title)) {
            tracing::warn!(error = %err, "could not open item");
        }
        self.manager.flush_to(&mut self.host);
    }

    fn close_top_floating(&mut self) {
        let top = self
            .manager
            .z_order()
            .iter()
            .rev()
            .copied()
            .find(|window| self.manager.window(*window).is_some_and(|w| w.is_floating()));
        if let Some(window) = top
            && let Err(err) = self.manager.close(window)
        {
            tracing::warn!(window = ?window, error = %err, "close failed");
        }
        self.manager.flush_to(&mut self.host);
    }

    /// Returns `true` when the app should quit.
    fn handle_event(&mut self, event: &Event) -> bool {
        if let Event::Resize(width, height) = event {
            self.fit_main(Rect::new(0, 0, *width, *height));
            return false;
        }
        if let Event::Key(key) = event
            && key.kind == KeyEventKind::Press
            && !self.drag.is_active()
        {
            match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
                KeyCode::Char('n') => self.add_item(),
                KeyCode::Char('w') => self.close_top_floating(),
                KeyCode::Char('r') => {
                    if let Err(err) = self.restore() {
                        tracing::warn!(error = %err, "restore failed");
                    }
                    let viewport = self.host.viewport();
                    self.fit_main(viewport);
                }
                _ => {}
            }
            return false;
        }
        let outcome = self
            .drag
            .handle_event(&mut self.manager, &mut self.host, event);
        tracing::trace!(?outcome, "pointer event");
        false
    }
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal
            .draw(|frame| {
                let area = frame.area();
                let content = |item: &DockItem| {
                    format!(
                        "{}\n\nDrag a tab to float it, drop it on a pane edge to split.\nn: new item  w: close floating  r: restore  q: quit",
                        item.title
                    )
                };
                frame.render_widget(
                    DockView::new(app.manager.tree(), &app.host).content(&content),
                    area,
                );
            })?;
        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let event = event::read()?;
        if app.handle_event(&event) {
            return Ok(());
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log {
        tracing_sub::init_with_file(path)?;
    }

    let (width, height) = terminal::size()?;
    let mut app = App::new(&cli, Rect::new(0, 0, width, height))?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    app.save().map_err(to_io)?;
    result
}
