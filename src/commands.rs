//! The console's native command block: navigation commands every console
//! carries regardless of the application tree.

use core::fmt::Write;

use crate::console::{CommandAction, CommandCtx};
use crate::tree::{Block, Entry, EntryKind};

/// Entries of the native block.
pub static NATIVE_ENTRIES: [Entry<'static>; 2] = [
    Entry {
        label: "cd..",
        kind: EntryKind::Command(cmd_up),
    },
    Entry {
        label: "ls",
        kind: EntryKind::Command(cmd_list),
    },
];

/// The console's own command block, consulted after the current and
/// system scopes.
pub static NATIVE_BLOCK: Block<'static> = Block {
    title: "console",
    entries: &NATIVE_ENTRIES,
};

/// Zero-length placeholder system block for applications that declare no
/// global commands; matching skips it.
pub static EMPTY_BLOCK: Block<'static> = Block {
    title: "system",
    entries: &[],
};

/// `cd..`: move the cursor to the parent block. A no-op at the root.
pub fn cmd_up(ctx: &mut CommandCtx<'_, '_>) -> CommandAction {
    if ctx.nav.ascend() {
        // Truncate the prompt at the last '/' and close it with '>'.
        if let Some(slash) = ctx.path.rfind('/') {
            ctx.path.truncate(slash);
            let _ = ctx.path.push('>');
        }
    }
    CommandAction::Done
}

/// `ls`: list the current block: its title line, then one tagged line
/// per entry, paced one transmission per poll.
pub fn cmd_list(ctx: &mut CommandCtx<'_, '_>) -> CommandAction {
    match ctx.scratch.step {
        0 => {
            if !ctx.busy {
                ctx.scratch.step = 1;
            }
            CommandAction::Yield
        }
        1 => {
            let block = ctx.nav.current_block();
            ctx.output.clear();
            let _ = write!(ctx.output, "\r\n == {} ==", block.title);
            ctx.scratch.index = 0;
            ctx.scratch.step = if block.is_empty() { 4 } else { 2 };
            CommandAction::Print
        }
        2 => {
            if !ctx.busy {
                ctx.scratch.step = 3;
            }
            CommandAction::Yield
        }
        3 => {
            let block = ctx.nav.current_block();
            match block.entries.get(ctx.scratch.index) {
                Some(entry) => {
                    let tag = match entry.kind {
                        EntryKind::Command(_) => 'C',
                        EntryKind::SubBlock(_) => '>',
                    };
                    ctx.output.clear();
                    let _ = write!(ctx.output, "\r\n {} {}", tag, entry.label);
                    ctx.scratch.index += 1;
                    ctx.scratch.step = if ctx.scratch.index >= block.len() { 4 } else { 2 };
                    CommandAction::Print
                }
                None => {
                    ctx.scratch.step = 4;
                    CommandAction::Yield
                }
            }
        }
        _ => {
            ctx.scratch.reset();
            CommandAction::Done
        }
    }
}
