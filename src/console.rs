//! The console driver: a non-blocking state machine polled from a
//! super-loop or timer tick.
//!
//! Each call to [`Console::poll`] advances exactly one state step, so the
//! driver never blocks: waiting is expressed by re-entering the same state
//! until the transmit flag clears or a byte arrives. Byte reception and
//! transmit completion come in asynchronously through the shared
//! [`Link`](crate::transport::Link); everything else happens in poll
//! context.

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;
use log::{debug, warn};

use crate::buffer::InputBuffer;
use crate::transport::{ConsoleError, Link, Transport};
use crate::tree::{CommandFn, Nav, Pfs};

/// Capacity of the path, input, and output buffers.
pub const BUFFER_SIZE: usize = 256;

/// Line terminator byte (carriage return).
pub const CR: u8 = 13;

/// Erase byte; terminals commonly send 127 for backspace.
pub const DEL: u8 = 127;

/// Configuration for the console.
#[derive(Clone, Copy)]
pub struct ConsoleConfig {
    /// Echo received bytes back to the terminal.
    pub echo: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { echo: true }
    }
}

/// Driver states. `Output` carries its own sub-step so re-entering the
/// state always starts a fresh transmission sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// One-shot initialization; seeds the prompt and buffers.
    Init,
    /// Transmit the output buffer or the prompt.
    Output(OutputStep),
    /// Arm byte reception.
    Input,
    /// Wait for received bytes; holds until a line completes.
    Idle,
    /// Resolve a completed line against the three scopes.
    Parser,
    /// Advance the active command by one step.
    Command,
    /// Terminal fault state; only [`Console::reset`] leaves it.
    Error,
}

/// Sub-steps of the Output state, one per poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStep {
    /// Wait for any previous transmission to complete.
    WaitReady,
    /// Begin transmitting the output buffer (command active) or the
    /// prompt path.
    Start,
    /// Wait for this transmission to complete.
    WaitDone,
    /// Resume the active command, or move on to Input.
    Finish,
}

/// Per-command working state, zeroed when a command launches.
///
/// Re-entrant commands keep their progress here between polls instead of
/// in function-local statics.
#[derive(Debug, Default)]
pub struct CommandScratch {
    pub step: u8,
    pub index: usize,
}

impl CommandScratch {
    pub(crate) const fn new() -> Self {
        Self { step: 0, index: 0 }
    }

    /// Zero the scratch, making the command reusable.
    pub fn reset(&mut self) {
        self.step = 0;
        self.index = 0;
    }
}

/// What a command step asks of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Call again next poll (typically waiting on `busy`).
    Yield,
    /// The output buffer is filled; transmit it, then resume the command.
    Print,
    /// Collect a fresh input line, then resume the command.
    ReadLine,
    /// The command is complete; return to the prompt.
    Done,
}

/// The view of the console a command sees while it runs.
pub struct CommandCtx<'c, 't> {
    /// The completed input line that launched (or resumed) the command,
    /// including any trailing arguments.
    pub line: &'c str,
    /// Transmit staging buffer; fill it and return
    /// [`CommandAction::Print`].
    pub output: &'c mut String<BUFFER_SIZE>,
    /// The prompt path. Navigation commands edit it in place.
    pub path: &'c mut String<BUFFER_SIZE>,
    /// Snapshot of the transmit-in-flight flag.
    pub busy: bool,
    /// This command's working state.
    pub scratch: &'c mut CommandScratch,
    /// The tree cursor.
    pub nav: &'c mut Nav<'t>,
}

/// The console: one instance per transport, polled cooperatively.
pub struct Console<'a, M: RawMutex> {
    pub(crate) state: DriverState,
    config: ConsoleConfig,
    link: &'a Link<M>,
    pub(crate) nav: Nav<'a>,
    pub(crate) path: String<BUFFER_SIZE>,
    pub(crate) output: String<BUFFER_SIZE>,
    pub(crate) input: InputBuffer<BUFFER_SIZE>,
    pub(crate) active: Option<CommandFn>,
    pub(crate) scratch: CommandScratch,
}

impl<'a, M: RawMutex> Console<'a, M> {
    /// Create a console over the given link and tree. The first poll runs
    /// initialization.
    pub fn new(link: &'a Link<M>, pfs: Pfs<'a>, config: ConsoleConfig) -> Self {
        Self {
            state: DriverState::Init,
            config,
            link,
            nav: Nav::new(pfs),
            path: String::new(),
            output: String::new(),
            input: InputBuffer::new(),
            active: None,
            scratch: CommandScratch::new(),
        }
    }

    /// Current driver state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The prompt path as currently displayed.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The tree cursor.
    pub fn nav(&self) -> &Nav<'a> {
        &self.nav
    }

    /// Whether a command is currently running to completion.
    pub fn command_active(&self) -> bool {
        self.active.is_some()
    }

    /// Re-run initialization on the next poll, abandoning any in-progress
    /// line or command. This is the only way out of the Error state.
    pub fn reset(&mut self) {
        self.state = DriverState::Init;
    }

    /// Advance the driver by one state step.
    pub fn poll<T: Transport>(&mut self, transport: &mut T) {
        match self.state {
            DriverState::Init => self.state_init(transport),
            DriverState::Output(step) => self.state_output(step, transport),
            DriverState::Input => self.state_input(transport),
            DriverState::Idle => self.state_idle(transport),
            DriverState::Parser => self.parse(transport),
            DriverState::Command => self.run_command(),
            DriverState::Error => {}
        }
    }

    fn state_init<T: Transport>(&mut self, transport: &mut T) {
        self.input.clear();
        self.output.clear();
        self.link.reset();
        self.active = None;
        self.scratch.reset();
        self.nav.reset();

        let Some(root) = self.nav.block(self.nav.root) else {
            self.fail(ConsoleError::InvalidRoot, transport);
            return;
        };
        self.path.clear();
        let _ = write!(self.path, "\r\n/{}>", root.title);
        debug!("console ready at /{}", root.title);

        self.state = DriverState::Output(OutputStep::WaitReady);
    }

    fn state_output<T: Transport>(&mut self, step: OutputStep, transport: &mut T) {
        match step {
            OutputStep::WaitReady => {
                if !self.link.is_busy() {
                    self.state = DriverState::Output(OutputStep::Start);
                }
            }
            OutputStep::Start => {
                // A running command transmits its output buffer; the
                // prompt is the path itself.
                if self.active.is_some() {
                    Self::send(self.link, transport, self.output.as_bytes());
                } else {
                    Self::send(self.link, transport, self.path.as_bytes());
                }
                self.state = DriverState::Output(OutputStep::WaitDone);
            }
            OutputStep::WaitDone => {
                if !self.link.is_busy() {
                    self.state = DriverState::Output(OutputStep::Finish);
                }
            }
            OutputStep::Finish => {
                self.state = if self.active.is_some() {
                    DriverState::Command
                } else {
                    DriverState::Input
                };
            }
        }
    }

    fn state_input<T: Transport>(&mut self, transport: &mut T) {
        // Bytes received outside the input states never reach the line.
        self.link.clear_rx();
        transport.request_byte();
        self.state = DriverState::Idle;
    }

    fn state_idle<T: Transport>(&mut self, transport: &mut T) {
        // Keep reception armed; on request-per-byte transports the line
        // stalls after the first byte otherwise.
        transport.request_byte();
        if self.link.is_busy() {
            return;
        }
        if let Some(byte) = self.link.take_rx() {
            self.handle_byte(byte, transport);
        }
    }

    fn handle_byte<T: Transport>(&mut self, byte: u8, transport: &mut T) {
        if byte == CR {
            self.input.complete_line();
            self.state = if self.active.is_some() {
                DriverState::Command
            } else {
                DriverState::Parser
            };
            return;
        }

        transport.request_byte();
        if self.config.echo {
            Self::send(self.link, transport, &[byte]);
        }

        if byte == DEL {
            self.input.backspace();
        } else {
            self.input.push(byte);
        }
    }

    fn run_command(&mut self) {
        let Some(command) = self.active else {
            self.state = DriverState::Output(OutputStep::WaitReady);
            return;
        };

        let busy = self.link.is_busy();
        let mut ctx = CommandCtx {
            line: self.input.line(),
            output: &mut self.output,
            path: &mut self.path,
            busy,
            scratch: &mut self.scratch,
            nav: &mut self.nav,
        };

        match command(&mut ctx) {
            CommandAction::Yield => {}
            CommandAction::Print => {
                self.state = DriverState::Output(OutputStep::WaitReady);
            }
            CommandAction::ReadLine => {
                self.state = DriverState::Input;
            }
            CommandAction::Done => {
                self.active = None;
                self.scratch.reset();
                self.state = DriverState::Output(OutputStep::WaitReady);
            }
        }
    }

    pub(crate) fn send<T: Transport>(link: &Link<M>, transport: &mut T, bytes: &[u8]) {
        if !bytes.is_empty() {
            link.set_busy();
            transport.transmit(bytes);
        }
    }

    pub(crate) fn fail<T: Transport>(&mut self, error: ConsoleError, transport: &mut T) {
        warn!("console fault: {}", error);
        self.state = DriverState::Error;
        transport.on_error(error);
    }
}
