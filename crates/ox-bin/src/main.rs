//! Oxidized entrypoint: parses CLI args, loads a file into a `Document`,
//! enters the terminal, and runs the cooperative single-threaded
//! read-dispatch-paint loop, no async runtime, no
//! background tasks; one blocking `crossterm::event::read` per iteration.

use anyhow::{Context as _, Result};
use clap::Parser;
use core_actions::{dispatch, insert_byte, isearch_feed, ActionId, Context as ActionContext, Outcome};
use core_config::Config;
use core_keymap::{default_keymap, Dispatch, Instruction, Keymap, Mode};
use core_render::Formatter;
use core_state::Editor;
use core_terminal::{CrosstermBackend, CrosstermScreen, Highlight, Screen, TerminalBackend};
use core_text::{Document, Location};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Once;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "oxidized", version, about = "Oxidized editor")]
struct Args {
    /// File to open. A new, empty document is used if omitted.
    path: Option<PathBuf>,
    /// Overrides discovery of `oxidized.toml`.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("oxidized.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, "oxidized.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!(target: "runtime.panic", %info, "panic");
            default_panic(info);
        }));
    });
}

fn load_document(path: Option<&Path>) -> Result<Document> {
    match path {
        Some(p) => {
            let data =
                std::fs::read(p).with_context(|| format!("reading {}", p.display()))?;
            info!(target: "io", file = %p.display(), bytes = data.len(), "file_read_ok");
            let name = p
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string();
            Ok(Document::from_bytes(name, data))
        }
        None => Ok(Document::from_bytes("untitled", Vec::new())),
    }
}

/// Write-then-rename so a crash mid-write never leaves a half-written file
/// in the save path.
fn save_document(doc: &Document, path: &Path) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(&doc.to_bytes())?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("renaming into {}", path.display()))?;
    info!(target: "io", file = %path.display(), "file_saved");
    Ok(())
}

/// Largest multiple of `tab` that is `<= width`, so the Formatter's
/// `tab`-divides-`cols` invariant holds against whatever the terminal
/// reports.
fn fit_cols(width: usize, tab: usize) -> usize {
    ((width / tab).max(1)) * tab
}

struct App {
    doc: Document,
    editor: Editor,
    fmt: Formatter,
    keymap: Keymap,
    mode: Mode,
    screen: CrosstermScreen,
    path: Option<PathBuf>,
    status: String,
    max_rows: usize,
    guard_rows: usize,
    /// Change regions queued by `doc`'s watcher since the last rescue pass.
    /// `Document::watch` only accepts a `'static` `FnMut`, so the watcher
    /// closure can't borrow `fmt` directly (it outlives this struct's
    /// borrow-checker scope), so it stashes `(change_start, change_end)`
    /// pairs here instead, and `rescue_ladder` drains them into
    /// `Formatter::change_handler` right before painting (the Formatter
    /// rescues what it can of its BoL ladder from that region alone).
    pending_changes: Rc<RefCell<Vec<(Location, Location)>>>,
}

impl App {
    fn run(&mut self) -> Result<()> {
        loop {
            self.render()?;
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key)? == Outcome::Quit {
                        return Ok(());
                    }
                }
                Event::Resize(w, h) => {
                    debug!(target: "runtime", width = w, height = h, "resize");
                }
                _ => {}
            }
        }
    }

    fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Result<Outcome> {
        match self.keymap.dispatch(self.mode, key) {
            Dispatch::Mapped(instrs) => Ok(self.run_instructions(&instrs)),
            Dispatch::IsearchFallback(instrs) => {
                self.mode = Mode::Normal;
                Ok(self.run_instructions(&instrs))
            }
            Dispatch::Unmapped => {
                self.fallback_self_insert(key);
                Ok(Outcome::Continue)
            }
        }
    }

    fn run_instructions(&mut self, instrs: &[Instruction]) -> Outcome {
        let mut outcome = Outcome::Continue;
        for instr in instrs {
            match *instr {
                Instruction::SetMode(mode) => self.mode = mode,
                Instruction::InsertByte(b) => insert_byte(&mut self.editor, &mut self.doc, b),
                Instruction::CallAction(action) => {
                    if action == ActionId::Save {
                        self.save();
                    }
                    let mut ctx = ActionContext {
                        editor: &mut self.editor,
                        doc: &mut self.doc,
                        fmt: &mut self.fmt,
                    };
                    if dispatch(action, &mut ctx) == Outcome::Quit {
                        outcome = Outcome::Quit;
                    }
                }
            }
        }
        outcome
    }

    /// Unmapped keys fall back to plain self-insert in NORMAL/META, or to
    /// feeding the incremental search pattern in ISEARCH. The keymap only
    /// binds motions/commands, not every printable byte.
    fn fallback_self_insert(&mut self, key: crossterm::event::KeyEvent) {
        let KeyCode::Char(c) = key.code else { return };
        if !c.is_ascii() {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT)
        {
            return;
        }
        match self.mode {
            Mode::Isearch => isearch_feed(&mut self.editor, &mut self.doc, c as u8),
            Mode::Normal | Mode::Meta => {
                insert_byte(&mut self.editor, &mut self.doc, c as u8);
                self.mode = Mode::Normal;
            }
        }
    }

    fn save(&mut self) {
        let Some(path) = self.path.clone() else {
            self.status = "no file name".to_string();
            return;
        };
        match save_document(&self.doc, &path) {
            Ok(()) => self.status = format!("wrote {}", path.display()),
            Err(e) => {
                warn!(target: "io", error = %e, "save_failed");
                self.status = format!("save failed: {e}");
            }
        }
    }

    /// Drains change notifications queued by `doc`'s watcher and rescues the
    /// Formatter's BoL ladder for each, in the order they were applied.
    fn rescue_ladder(&mut self) {
        let changes = std::mem::take(&mut *self.pending_changes.borrow_mut());
        for (start, end) in changes {
            self.fmt.change_handler(&self.doc, start, end);
        }
    }

    fn render(&mut self) -> Result<()> {
        self.rescue_ladder();
        let rows = ((self.screen.height() as usize).saturating_sub(1)).min(self.max_rows);
        let painted = self
            .editor
            .frame(&mut self.doc, &mut self.fmt, rows, self.guard_rows);

        self.screen.clear()?;
        let saved_point = self.doc.point();
        for (row, loc) in painted.iter().enumerate() {
            self.doc.set_point(*loc);
            let (bytes, _col_map) = self.fmt.format_line(&mut self.doc);
            self.screen.move_to(row as u16, 0)?;
            self.paint_row(&bytes)?;
        }
        self.doc.set_point(saved_point);

        self.paint_status(rows as u16)?;
        self.screen.refresh()?;
        Ok(())
    }

    /// Decodes the Formatter's escaped row bytes back into their two/three
    /// byte on-screen renderings (`^X` / `\HH` escape forms).
    fn paint_row(&mut self, bytes: &[u8]) -> Result<()> {
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                0x00 => {
                    self.screen.put(b' ', Highlight::None)?;
                    i += 1;
                }
                0x01 if i + 1 < bytes.len() => {
                    self.screen.put(b'^', Highlight::None)?;
                    self.screen.put(bytes[i + 1], Highlight::None)?;
                    i += 2;
                }
                0x02 if i + 2 < bytes.len() => {
                    self.screen.put(b'\\', Highlight::None)?;
                    self.screen.put(bytes[i + 1], Highlight::None)?;
                    self.screen.put(bytes[i + 2], Highlight::None)?;
                    i += 3;
                }
                b => {
                    self.screen.put(b, Highlight::None)?;
                    i += 1;
                }
            }
        }
        Ok(())
    }

    fn paint_status(&mut self, row: u16) -> Result<()> {
        let name = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| self.doc.name.clone());
        let dirty = if self.doc.is_dirty() { "[+]" } else { "" };
        let mode = match self.mode {
            Mode::Normal => "NORMAL",
            Mode::Meta => "META",
            Mode::Isearch => "ISEARCH",
        };
        let line = if self.mode == Mode::Isearch {
            format!("{name}{dirty} -- {mode}: {}", self.editor.isearch.pattern)
        } else if self.status.is_empty() {
            format!("{name}{dirty} -- {mode}")
        } else {
            format!("{name}{dirty} -- {mode} -- {}", self.status)
        };
        self.screen.move_to(row, 0)?;
        self.screen.puts(&line, Highlight::Status)?;
        Ok(())
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = core_config::load_from(args.config.clone())?;
    let mut doc = load_document(args.path.as_deref())?;

    let pending_changes: Rc<RefCell<Vec<(Location, Location)>>> = Rc::new(RefCell::new(Vec::new()));
    let queue = Rc::clone(&pending_changes);
    doc.watch(move |start, end| queue.borrow_mut().push((start, end)));

    let mut backend = CrosstermBackend::new();
    backend.set_title("oxidized")?;
    let _guard = backend.enter_guard()?;
    let screen = CrosstermScreen::new()?;

    let cols = fit_cols(screen.width() as usize, config.formatter.tab as usize);
    let fmt = Formatter::new(cols, config.formatter.tab as usize, config.formatter.rungs as usize);
    let editor = Editor::new(&doc);

    let guard_rows = config.display.guard_rows as usize;
    let max_rows = config.display.rows as usize;
    let mut app = App {
        doc,
        editor,
        fmt,
        keymap: default_keymap(),
        mode: Mode::Normal,
        screen,
        path: args.path,
        status: String::new(),
        max_rows,
        guard_rows,
        pending_changes,
    };
    app.run()
}

fn main() -> ExitCode {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    match run() {
        Ok(()) => {
            info!(target: "runtime", "shutdown");
            ExitCode::from(0)
        }
        Err(e) => {
            error!(target: "runtime", error = %e, "fatal");
            ExitCode::from(1)
        }
    }
}
