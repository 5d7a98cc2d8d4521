//! The pseudo file system: a static tree of command blocks.
//!
//! The application declares its tree as a slice of [`Block`]s (the arena)
//! and refers to sub-blocks by index ([`BlockId`]). Blocks never change at
//! runtime; the console only moves a cursor through them.

use heapless::Vec;

use crate::console::{CommandAction, CommandCtx};

/// Maximum nesting depth of the block tree.
pub const MAX_DEPTH: usize = 8;

/// A command body, advanced once per driver poll until it reports
/// [`CommandAction::Done`].
pub type CommandFn = fn(&mut CommandCtx<'_, '_>) -> CommandAction;

/// Index of a block within the application's block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId(pub usize);

/// What a block entry resolves to: either a runnable command or a
/// sub-block to descend into.
#[derive(Clone, Copy)]
pub enum EntryKind {
    /// A runnable command.
    Command(CommandFn),
    /// A nested block, addressed by its arena index.
    SubBlock(BlockId),
}

/// One entry of a block.
///
/// The label's first word (up to the first space, or the whole label) is
/// the token matched against typed input; anything after the space is
/// free-form description or parameter hints.
#[derive(Clone, Copy)]
pub struct Entry<'t> {
    pub label: &'t str,
    pub kind: EntryKind,
}

/// One namespace level of the tree: a display title and its entries.
///
/// An empty `entries` slice is legal; matching skips the block and `ls`
/// lists only its title.
#[derive(Clone, Copy)]
pub struct Block<'t> {
    pub title: &'t str,
    pub entries: &'t [Entry<'t>],
}

impl<'t> Block<'t> {
    /// Number of entries in this block.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this block has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The application's tree declaration: the block arena, the root block,
/// and the system block (commands reachable from anywhere in the tree).
///
/// The system block holds commands only, never sub-blocks, so it lives
/// outside the arena. Applications without global commands keep the
/// default zero-length placeholder.
#[derive(Clone, Copy)]
pub struct Pfs<'t> {
    pub blocks: &'t [Block<'t>],
    pub root: BlockId,
    pub system: &'t Block<'t>,
}

impl<'t> Pfs<'t> {
    /// Declare a tree with no system block.
    pub fn new(blocks: &'t [Block<'t>], root: BlockId) -> Self {
        Self {
            blocks,
            root,
            system: &crate::commands::EMPTY_BLOCK,
        }
    }

    /// Attach a system block of application-wide commands.
    pub fn with_system(mut self, system: &'t Block<'t>) -> Self {
        self.system = system;
        self
    }
}

/// The navigation cursor: where in the tree the console currently is.
///
/// Ancestry is kept on an explicit stack rather than back-patched into the
/// blocks, so the tree itself stays immutable and `Sync`. The stack top is
/// the parent of the current block; an empty stack means the cursor is at
/// the root.
pub struct Nav<'t> {
    pub(crate) blocks: &'t [Block<'t>],
    pub(crate) root: BlockId,
    pub(crate) current: BlockId,
    pub(crate) stack: Vec<BlockId, MAX_DEPTH>,
    pub(crate) system: &'t Block<'t>,
    pub(crate) native: &'t Block<'t>,
}

impl<'t> Nav<'t> {
    pub(crate) fn new(pfs: Pfs<'t>) -> Self {
        Self {
            blocks: pfs.blocks,
            root: pfs.root,
            current: pfs.root,
            stack: Vec::new(),
            system: pfs.system,
            native: &crate::commands::NATIVE_BLOCK,
        }
    }

    /// Move the cursor back to the root and forget all ancestry.
    pub(crate) fn reset(&mut self) {
        self.current = self.root;
        self.stack.clear();
    }

    /// Look up a block by id.
    pub fn block(&self, id: BlockId) -> Option<&'t Block<'t>> {
        self.blocks.get(id.0)
    }

    /// The block the cursor points at.
    ///
    /// The cursor only ever moves through ids validated at descent time,
    /// so the lookup cannot fail outside the Error state.
    pub fn current_block(&self) -> &'t Block<'t> {
        &self.blocks[self.current.0]
    }

    /// Whether the cursor is at the root block.
    pub fn at_root(&self) -> bool {
        self.stack.is_empty()
    }

    /// Pop one level of ancestry into the cursor. Returns `false` at the
    /// root.
    pub fn ascend(&mut self) -> bool {
        match self.stack.pop() {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }
}

/// A defect found in a tree declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The root id is outside the arena.
    BadRoot,
    /// A `SubBlock` entry points outside the arena.
    BadChild { block: usize, entry: usize },
    /// An entry has an empty label and can never match.
    EmptyLabel { block: usize, entry: usize },
}

/// Validate a tree declaration before handing it to the console.
///
/// The dispatcher re-checks child ids at runtime and routes violations to
/// the Error state; this function lets an application fail fast at
/// start-up instead.
pub fn check(blocks: &[Block<'_>], root: BlockId) -> Result<(), TreeError> {
    if blocks.get(root.0).is_none() {
        return Err(TreeError::BadRoot);
    }
    for (b, block) in blocks.iter().enumerate() {
        for (e, entry) in block.entries.iter().enumerate() {
            if entry.label.is_empty() {
                return Err(TreeError::EmptyLabel { block: b, entry: e });
            }
            if let EntryKind::SubBlock(id) = entry.kind {
                if blocks.get(id.0).is_none() {
                    return Err(TreeError::BadChild { block: b, entry: e });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{CommandAction, CommandCtx};

    fn cmd_nop(_ctx: &mut CommandCtx<'_, '_>) -> CommandAction {
        CommandAction::Done
    }

    static LEAF: Block<'static> = Block {
        title: "leaf",
        entries: &[],
    };

    #[test]
    fn test_check_accepts_valid_tree() {
        let blocks = [
            Block {
                title: "root",
                entries: &[
                    Entry {
                        label: "go",
                        kind: EntryKind::SubBlock(BlockId(1)),
                    },
                    Entry {
                        label: "run now",
                        kind: EntryKind::Command(cmd_nop),
                    },
                ],
            },
            LEAF,
        ];
        assert_eq!(check(&blocks, BlockId(0)), Ok(()));
    }

    #[test]
    fn test_check_rejects_bad_root() {
        let blocks = [LEAF];
        assert_eq!(check(&blocks, BlockId(3)), Err(TreeError::BadRoot));
    }

    #[test]
    fn test_check_rejects_dangling_child() {
        let blocks = [Block {
            title: "root",
            entries: &[Entry {
                label: "go",
                kind: EntryKind::SubBlock(BlockId(9)),
            }],
        }];
        assert_eq!(
            check(&blocks, BlockId(0)),
            Err(TreeError::BadChild { block: 0, entry: 0 })
        );
    }

    #[test]
    fn test_check_rejects_empty_label() {
        let blocks = [Block {
            title: "root",
            entries: &[Entry {
                label: "",
                kind: EntryKind::Command(cmd_nop),
            }],
        }];
        assert_eq!(
            check(&blocks, BlockId(0)),
            Err(TreeError::EmptyLabel { block: 0, entry: 0 })
        );
    }

    #[test]
    fn test_nav_round_trip() {
        let blocks = [
            Block {
                title: "root",
                entries: &[Entry {
                    label: "sub",
                    kind: EntryKind::SubBlock(BlockId(1)),
                }],
            },
            LEAF,
        ];
        let mut nav = Nav::new(Pfs::new(&blocks, BlockId(0)));
        assert!(nav.at_root());
        assert!(!nav.ascend());

        nav.stack.push(nav.current).unwrap();
        nav.current = BlockId(1);
        assert!(!nav.at_root());
        assert_eq!(nav.current_block().title, "leaf");

        assert!(nav.ascend());
        assert!(nav.at_root());
        assert_eq!(nav.current_block().title, "root");
    }
}
