//! Scope resolution and dispatch for completed input lines.
//!
//! A line is matched against three scopes in a fixed order: the current
//! block, the system block, then the console's native block. The first
//! scope with a textual match wins, and within a scope the first matching
//! entry wins. Matching compares only the label's first word against the
//! same number of leading bytes of the line; whatever follows stays in the
//! line for the launched command to interpret.

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{debug, trace};

use crate::console::{Console, DriverState, OutputStep};
use crate::transport::{ConsoleError, Transport};
use crate::tree::{Block, BlockId, CommandFn, Entry, EntryKind};

/// Length of a label's match token: everything before the first space, or
/// the whole label.
pub fn token_len(label: &str) -> usize {
    label
        .as_bytes()
        .iter()
        .position(|b| *b == b' ')
        .unwrap_or(label.len())
}

/// First entry of `block` whose token matches the leading bytes of
/// `line`.
///
/// An empty block yields no match, and an entry with an empty label can
/// never match.
pub fn find_match<'t>(block: &Block<'t>, line: &str) -> Option<&'t Entry<'t>> {
    block.entries.iter().find(|entry| {
        let token = token_len(entry.label);
        token > 0 && line.as_bytes().get(..token) == Some(&entry.label.as_bytes()[..token])
    })
}

impl<'a, M: RawMutex> Console<'a, M> {
    /// Resolve the completed line and either launch a command, move the
    /// cursor, or fall back to the prompt. Runs to completion in one
    /// poll.
    pub(crate) fn parse<T: Transport>(&mut self, transport: &mut T) {
        self.active = None;

        let current = self.nav.current_block();
        if let Some(entry) = find_match(current, self.input.line()) {
            match entry.kind {
                EntryKind::Command(command) => self.launch(entry.label, command),
                EntryKind::SubBlock(id) => self.descend(id, transport),
            }
            return;
        }

        if let Some(entry) = find_match(self.nav.system, self.input.line()) {
            match entry.kind {
                EntryKind::Command(command) => self.launch(entry.label, command),
                // The system scope holds commands only; a sub-block here
                // is a tree defect.
                EntryKind::SubBlock(_) => self.fail(ConsoleError::SystemSubBlock, transport),
            }
            return;
        }

        if let Some(entry) = find_match(self.nav.native, self.input.line()) {
            if let EntryKind::Command(command) = entry.kind {
                self.launch(entry.label, command);
            }
            return;
        }

        // Unknown token: straight back to the prompt, no feedback.
        self.state = DriverState::Output(OutputStep::WaitReady);
    }

    fn launch(&mut self, label: &str, command: CommandFn) {
        trace!("dispatch: {}", label);
        self.scratch.reset();
        self.active = Some(command);
        self.state = DriverState::Command;
    }

    fn descend<T: Transport>(&mut self, id: BlockId, transport: &mut T) {
        let Some(child) = self.nav.block(id) else {
            self.fail(ConsoleError::InvalidChild, transport);
            return;
        };
        if self.nav.stack.push(self.nav.current).is_err() {
            self.fail(ConsoleError::DepthExceeded, transport);
            return;
        }

        // Rewrite the trailing '>' of the prompt as "/<child-title>>".
        let _ = self.path.pop();
        let grew = self.path.push('/').is_ok()
            && self.path.push_str(child.title).is_ok()
            && self.path.push('>').is_ok();
        if !grew {
            self.fail(ConsoleError::PathOverflow, transport);
            return;
        }

        self.nav.current = id;
        debug!("enter /{}", child.title);
        self.state = DriverState::Output(OutputStep::WaitReady);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{CommandAction, CommandCtx};

    fn cmd_nop(_ctx: &mut CommandCtx<'_, '_>) -> CommandAction {
        CommandAction::Done
    }

    #[test]
    fn test_token_len_stops_at_first_space() {
        assert_eq!(token_len("ls"), 2);
        assert_eq!(token_len("ip addr"), 2);
        assert_eq!(token_len("set <param> <value>"), 3);
        assert_eq!(token_len(""), 0);
    }

    #[test]
    fn test_match_ignores_trailing_arguments() {
        let block = Block {
            title: "b",
            entries: &[Entry {
                label: "ls",
                kind: EntryKind::Command(cmd_nop),
            }],
        };
        assert!(find_match(&block, "ls extra args").is_some());
        assert!(find_match(&block, "ls").is_some());
        assert!(find_match(&block, "l").is_none());
    }

    #[test]
    fn test_match_is_prefix_based() {
        // Only the token's length is compared, so a longer typed word
        // still matches an entry whose token is its prefix.
        let block = Block {
            title: "b",
            entries: &[Entry {
                label: "ls",
                kind: EntryKind::Command(cmd_nop),
            }],
        };
        assert!(find_match(&block, "lsx").is_some());
    }

    #[test]
    fn test_first_entry_wins() {
        let block = Block {
            title: "b",
            entries: &[
                Entry {
                    label: "stat",
                    kind: EntryKind::Command(cmd_nop),
                },
                Entry {
                    label: "status",
                    kind: EntryKind::SubBlock(BlockId(1)),
                },
            ],
        };
        let hit = find_match(&block, "status").unwrap();
        assert_eq!(hit.label, "stat");
    }

    #[test]
    fn test_labels_with_parameter_hints_match_on_first_word() {
        let block = Block {
            title: "b",
            entries: &[Entry {
                label: "set <param> <value>",
                kind: EntryKind::Command(cmd_nop),
            }],
        };
        assert!(find_match(&block, "set speed 9600").is_some());
        assert!(find_match(&block, "sets").is_some());
        assert!(find_match(&block, "se").is_none());
    }

    #[test]
    fn test_empty_block_never_matches() {
        let block = Block {
            title: "b",
            entries: &[],
        };
        assert!(find_match(&block, "anything").is_none());
        assert!(find_match(&block, "").is_none());
    }

    #[test]
    fn test_empty_label_never_matches() {
        let block = Block {
            title: "b",
            entries: &[Entry {
                label: "",
                kind: EntryKind::Command(cmd_nop),
            }],
        };
        assert!(find_match(&block, "").is_none());
        assert!(find_match(&block, "x").is_none());
    }

    #[test]
    fn test_empty_line_matches_nothing() {
        let block = Block {
            title: "b",
            entries: &[Entry {
                label: "ls",
                kind: EntryKind::Command(cmd_nop),
            }],
        };
        assert!(find_match(&block, "").is_none());
    }
}
