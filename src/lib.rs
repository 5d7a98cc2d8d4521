#![no_std]
#![doc = include_str!("../README.md")]

//! A hierarchical command console for `no_std` embedded systems.
//!
//! This crate provides a navigable pseudo file system of command blocks
//! driven by a non-blocking, polled state machine over a plain byte
//! transport.

pub mod buffer;
pub mod commands;
pub mod console;
pub mod io;
pub mod parser;
pub mod transport;
pub mod tree;

pub use buffer::InputBuffer;
pub use commands::{EMPTY_BLOCK, NATIVE_BLOCK};
pub use console::{
    CommandAction, CommandCtx, CommandScratch, Console, ConsoleConfig, DriverState, OutputStep,
    BUFFER_SIZE, CR, DEL,
};
pub use io::{run_io, AsyncTransport, TxStage};
pub use transport::{ConsoleError, Link, Transport};
pub use tree::{
    check, Block, BlockId, CommandFn, Entry, EntryKind, Nav, Pfs, TreeError, MAX_DEPTH,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{EMPTY_BLOCK, NATIVE_BLOCK};
    pub use crate::console::{
        CommandAction, CommandCtx, Console, ConsoleConfig, DriverState,
    };
    pub use crate::transport::{ConsoleError, Link, Transport};
    pub use crate::tree::{Block, BlockId, CommandFn, Entry, EntryKind, Pfs};
}
