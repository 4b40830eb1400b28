//! Application shell
//!
//! [`TerminalApp`] owns a stack of components; the topmost one receives
//! keys and is the one painted. Components never touch the shell directly.
//! They queue [`AppCommand`]s on the [`AppContext`] handed to
//! [`Component::handle_key`] and [`Component::init`], and the shell applies
//! them once the component call returns.
//!
//! Lifecycle: idle → running (raw mode, alternate screen, first paint) →
//! idle again after [`TerminalApp::cleanup`]. Keys are read from stdin on a
//! detached thread and decoded with [`decode`]; resize is detected by
//! polling the terminal size; finished background loads wake the loop
//! through the shared [`LoadWaker`].

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clusage_core::error::{ClusageError, Result};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::component::Component;
use crate::input::{KeyEvent, decode, is_exit_key, split_sequences};
use crate::raw_mode::RawMode;
use crate::screen::{Screen, Size};
use crate::task::LoadWaker;

const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(200);
const STDIN_CHUNK: usize = 64;

/// A request a component makes of the shell
pub enum AppCommand {
    Push(Box<dyn Component>),
    Pop,
    Exit,
    SetFooter(String),
}

impl std::fmt::Debug for AppCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push(_) => f.write_str("Push(..)"),
            Self::Pop => f.write_str("Pop"),
            Self::Exit => f.write_str("Exit"),
            Self::SetFooter(text) => f.debug_tuple("SetFooter").field(text).finish(),
        }
    }
}

/// Command queue and terminal facts passed to component callbacks
#[derive(Debug)]
pub struct AppContext {
    commands: Vec<AppCommand>,
    size: Size,
}

impl AppContext {
    pub fn new(size: Size) -> Self {
        Self {
            commands: Vec::new(),
            size,
        }
    }

    /// Open `component` on top of the current screen
    pub fn push(&mut self, component: Box<dyn Component>) {
        self.commands.push(AppCommand::Push(component));
    }

    /// Close the current screen; closing the last one ends the run
    pub fn pop(&mut self) {
        self.commands.push(AppCommand::Pop);
    }

    /// End the run regardless of the stack depth
    pub fn exit(&mut self) {
        self.commands.push(AppCommand::Exit);
    }

    pub fn set_footer(&mut self, text: impl Into<String>) {
        self.commands.push(AppCommand::SetFooter(text.into()));
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Drain the queued commands in the order they were issued
    pub fn take_commands(&mut self) -> Vec<AppCommand> {
        std::mem::take(&mut self.commands)
    }
}

/// How the shell sets up the terminal
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    /// Draw on the alternate screen; otherwise the screen is cleared
    pub use_alt_screen: bool,
    /// Put stdin into raw mode; disabled only for headless use
    pub raw_input: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            use_alt_screen: true,
            raw_input: true,
        }
    }
}

/// The component stack and the event loop that drives it
pub struct TerminalApp<W: Write> {
    screen: Screen<W>,
    stack: Vec<Box<dyn Component>>,
    options: AppOptions,
    waker: LoadWaker,
    raw_mode: RawMode,
    running: bool,
    exit_requested: bool,
}

impl TerminalApp<io::Stdout> {
    /// A shell drawing to stdout at the current terminal size
    pub fn stdout(options: AppOptions, waker: LoadWaker) -> Self {
        Self::new(io::stdout(), Size::detect(), options, waker)
    }
}

impl<W: Write> TerminalApp<W> {
    pub fn new(out: W, size: Size, options: AppOptions, waker: LoadWaker) -> Self {
        Self {
            screen: Screen::new(out, size),
            stack: Vec::new(),
            options,
            waker,
            raw_mode: RawMode::new(),
            running: false,
            exit_requested: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running && !self.exit_requested
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn top(&self) -> Option<&dyn Component> {
        self.stack.last().map(|c| c.as_ref())
    }

    pub fn screen(&self) -> &Screen<W> {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen<W> {
        &mut self.screen
    }

    /// Blur the current top, initialise and focus `component`, then paint
    pub fn push(&mut self, mut component: Box<dyn Component>) -> Result<()> {
        if let Some(top) = self.stack.last_mut() {
            top.set_focus(false);
        }
        let mut ctx = self.context();
        component.init(&mut ctx);
        component.set_focus(true);
        let footer = component.footer();
        self.stack.push(component);
        debug!("Pushed component (stack depth {})", self.stack.len());

        if let Some(text) = footer {
            self.set_footer(&text)?;
        }
        self.apply(ctx)?;
        self.render()
    }

    /// Destroy the top component and refocus the one below
    ///
    /// On a stack of one or fewer this ends the run instead; the last
    /// component is left for [`TerminalApp::cleanup`] to destroy.
    pub fn pop(&mut self) -> Result<()> {
        if self.stack.len() <= 1 {
            self.exit();
            return Ok(());
        }
        if let Some(mut top) = self.stack.pop() {
            top.set_focus(false);
            top.destroy();
        }
        debug!("Popped component (stack depth {})", self.stack.len());

        let footer = match self.stack.last_mut() {
            Some(top) => {
                top.set_focus(true);
                top.footer()
            }
            None => None,
        };
        if let Some(text) = footer {
            self.set_footer(&text)?;
        }
        self.render()
    }

    /// Ask the event loop to stop after the current event
    pub fn exit(&mut self) {
        debug!("Exit requested");
        self.exit_requested = true;
    }

    /// Replace the footer row
    pub fn set_footer(&mut self, text: &str) -> Result<()> {
        if self.running {
            self.screen.paint_footer(text)?;
        } else {
            // Kept for the first full paint
            self.screen.set_footer(text);
        }
        Ok(())
    }

    /// Paint the top component and mark it clean
    pub fn render(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        if let Some(top) = self.stack.last() {
            let lines = top.render();
            self.screen.paint(&lines)?;
            top.mark_clean();
        }
        Ok(())
    }

    /// Dispatch one key to the top component
    ///
    /// Exit keys are offered to the component first; if it does not claim
    /// them the shell pops the screen.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Result<()> {
        let mut ctx = self.context();
        let Some(top) = self.stack.last_mut() else {
            return Ok(());
        };
        let handled = top.handle_key(key, &mut ctx);
        let dirty = top.is_dirty();
        self.apply(ctx)?;

        if !handled && is_exit_key(key) {
            return self.pop();
        }
        if handled && dirty && !self.exit_requested {
            self.render()?;
        }
        Ok(())
    }

    /// Decode a chunk read from stdin and dispatch every key in it
    pub fn handle_input(&mut self, bytes: &[u8]) -> Result<()> {
        for sequence in split_sequences(bytes) {
            if self.exit_requested {
                break;
            }
            let key = decode(sequence, None);
            self.handle_key(&key)?;
        }
        Ok(())
    }

    /// Adopt a new terminal size and repaint everything
    pub fn handle_resize(&mut self, size: Size) -> Result<()> {
        self.screen.resize(size);
        for component in &self.stack {
            component.mark_dirty();
        }
        self.full_repaint()
    }

    /// Collect finished background work from every stacked component
    pub fn poll_updates(&mut self) -> Result<()> {
        let last = self.stack.len().saturating_sub(1);
        let mut top_changed = false;
        for (index, component) in self.stack.iter_mut().enumerate() {
            if component.poll_updates() && index == last {
                top_changed = true;
            }
        }
        if top_changed {
            self.render()?;
        }
        Ok(())
    }

    fn full_repaint(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        if let Some(top) = self.stack.last() {
            self.screen.set_frame(&top.render());
            top.mark_clean();
        }
        self.screen.force_flush()?;
        Ok(())
    }

    fn context(&self) -> AppContext {
        AppContext::new(self.screen.size())
    }

    fn apply(&mut self, mut ctx: AppContext) -> Result<()> {
        for command in ctx.take_commands() {
            match command {
                AppCommand::Push(component) => self.push(component)?,
                AppCommand::Pop => self.pop()?,
                AppCommand::Exit => self.exit(),
                AppCommand::SetFooter(text) => self.set_footer(&text)?,
            }
        }
        Ok(())
    }

    /// Set up the terminal and paint the first frame
    ///
    /// Raw mode is enabled before anything is written, so a non-interactive
    /// stdin fails without disturbing the screen.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(ClusageError::Config("terminal app is already running".into()));
        }
        if self.options.raw_input {
            self.raw_mode.enable()?;
        }
        if self.options.use_alt_screen {
            self.screen.enter_alternate_screen()?;
        }
        self.running = true;
        self.exit_requested = false;
        debug!("Terminal app started");
        self.full_repaint()
    }

    /// Run until a component or an exit key ends the session
    ///
    /// [`TerminalApp::cleanup`] runs on every path out, including errors.
    pub async fn run(&mut self) -> Result<()> {
        let result = match self.start() {
            Ok(()) => {
                let stop = Arc::new(AtomicBool::new(false));
                let rx = spawn_stdin_reader(stop.clone());
                let result = self.run_loop(rx).await;
                stop.store(true, Ordering::Release);
                result
            }
            Err(e) => Err(e),
        };
        self.cleanup();
        result
    }

    /// Service input, resize and load wake-ups until exit is requested
    pub async fn run_loop(&mut self, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Result<()> {
        let mut resize_tick = interval(RESIZE_POLL_INTERVAL);
        resize_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let waker = self.waker.clone();

        while !self.exit_requested {
            tokio::select! {
                chunk = rx.recv() => match chunk {
                    Some(bytes) => self.handle_input(&bytes)?,
                    None => {
                        debug!("Input closed");
                        self.exit();
                    }
                },
                _ = resize_tick.tick() => {
                    let size = Size::detect();
                    if size != self.screen.size() {
                        self.handle_resize(size)?;
                    }
                }
                _ = waker.notified() => self.poll_updates()?,
            }
        }
        Ok(())
    }

    /// Restore the terminal and destroy every component
    ///
    /// Each step runs even when an earlier one fails; failures are logged.
    pub fn cleanup(&mut self) {
        if let Err(e) = self.raw_mode.disable() {
            warn!("Failed to leave raw mode: {}", e);
        }
        while let Some(mut component) = self.stack.pop() {
            component.destroy();
        }
        let screen_result = if self.options.use_alt_screen {
            self.screen.leave_alternate_screen()
        } else {
            self.screen.show_cursor()
        };
        if let Err(e) = screen_result {
            warn!("Failed to restore the screen: {}", e);
        }
        self.running = false;
        debug!("Terminal app cleaned up");
    }
}

impl<W: Write> Drop for TerminalApp<W> {
    /// Restore the terminal when the shell is dropped while running,
    /// including while unwinding from a panic in a component
    fn drop(&mut self) {
        if self.running {
            self.cleanup();
        }
    }
}

/// Forward stdin chunks until `stop` is set or the receiver is gone
///
/// The thread is detached: a blocking read cannot be interrupted, so it
/// notices `stop` after the next key press or when the process exits.
fn spawn_stdin_reader(stop: Arc<AtomicBool>) -> mpsc::UnboundedReceiver<Vec<u8>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; STDIN_CHUNK];
        while !stop.load(Ordering::Acquire) {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Stdin read failed: {}", e);
                    break;
                }
            }
        }
    });
    rx
}
