//! The portability layer between the console core and the platform.
//!
//! The platform implements [`Transport`] (how bytes leave and how
//! reception is armed) and drives the two [`Link`] callbacks from its
//! interrupt handlers (how bytes and completions come back in). `Link` is
//! the only state shared with interrupt context; everything else belongs
//! to the polled core.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Unrecoverable console faults.
///
/// Each of these indicates a defect in the collaborator-supplied tree or
/// an exhausted capacity, not a runtime condition; the console transitions
/// to its terminal Error state and reports through
/// [`Transport::on_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// The root block id points outside the block arena.
    InvalidRoot,
    /// A matched entry's sub-block id points outside the block arena.
    InvalidChild,
    /// The system block contains a sub-block entry; it may hold commands
    /// only.
    SystemSubBlock,
    /// The path buffer cannot hold the descended prompt.
    PathOverflow,
    /// The navigation stack cannot hold another level.
    DepthExceeded,
}

impl ConsoleError {
    /// Short description of the fault.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidRoot => "root block out of range",
            Self::InvalidChild => "child block out of range",
            Self::SystemSubBlock => "sub-block in system scope",
            Self::PathOverflow => "path buffer full",
            Self::DepthExceeded => "tree nested too deep",
        }
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Byte transport primitives, implemented by the platform.
pub trait Transport {
    /// Begin transmitting `bytes`. Fire-and-forget: the call must not
    /// wait for completion. The platform signals completion by calling
    /// [`Link::tx_done`], typically from its DMA or TX-empty interrupt.
    fn transmit(&mut self, bytes: &[u8]);

    /// Arm reception of the next byte. The platform delivers it through
    /// [`Link::rx_byte`]. Adapters whose receiver is always armed (an
    /// async read loop, a free-running RX interrupt) may make this a
    /// no-op.
    fn request_byte(&mut self);

    /// Invoked on the transition to the Error state. The default does
    /// nothing; the platform decides whether to reset, halt, or log.
    fn on_error(&mut self, error: ConsoleError) {
        let _ = error;
    }
}

/// The interrupt-shared half of the console state: the in-flight transmit
/// flag and the one-byte receive mailbox.
///
/// Both callbacks may be invoked from interrupt context concurrently with
/// the polled driver; all accesses go through a blocking mutex over the
/// chosen [`RawMutex`]. On single-core targets
/// `CriticalSectionRawMutex` is the usual choice; tests use
/// `NoopRawMutex`.
pub struct Link<M: RawMutex> {
    busy: Mutex<M, Cell<bool>>,
    rx: Mutex<M, Cell<Option<u8>>>,
}

impl<M: RawMutex> Link<M> {
    /// Create an idle link. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            busy: Mutex::new(Cell::new(false)),
            rx: Mutex::new(Cell::new(None)),
        }
    }

    /// Reception callback: deliver one received byte to the console.
    ///
    /// Call from the UART receive ISR or the async read task. A byte
    /// already waiting is overwritten, mirroring a receiver overrun; the
    /// driver consumes the mailbox every poll while idle, so this only
    /// drops input arriving faster than the poll rate or outside the
    /// input states.
    pub fn rx_byte(&self, byte: u8) {
        self.rx.lock(|cell| cell.set(Some(byte)));
    }

    /// Transmit-complete callback: clear the busy flag.
    ///
    /// Call from the DMA/TX-complete ISR or after an async write
    /// finishes.
    pub fn tx_done(&self) {
        self.busy.lock(|cell| cell.set(false));
    }

    /// Whether a transmission is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.lock(|cell| cell.get())
    }

    pub(crate) fn set_busy(&self) {
        self.busy.lock(|cell| cell.set(true));
    }

    pub(crate) fn take_rx(&self) -> Option<u8> {
        self.rx.lock(|cell| cell.take())
    }

    pub(crate) fn clear_rx(&self) {
        self.rx.lock(|cell| cell.set(None));
    }

    pub(crate) fn reset(&self) {
        self.busy.lock(|cell| cell.set(false));
        self.rx.lock(|cell| cell.set(None));
    }
}

impl<M: RawMutex> Default for Link<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_link_starts_idle() {
        let link: Link<NoopRawMutex> = Link::new();
        assert!(!link.is_busy());
        assert_eq!(link.take_rx(), None);
    }

    #[test]
    fn test_busy_set_and_cleared() {
        let link: Link<NoopRawMutex> = Link::new();
        link.set_busy();
        assert!(link.is_busy());
        link.tx_done();
        assert!(!link.is_busy());
    }

    #[test]
    fn test_mailbox_take_consumes() {
        let link: Link<NoopRawMutex> = Link::new();
        link.rx_byte(b'x');
        assert_eq!(link.take_rx(), Some(b'x'));
        assert_eq!(link.take_rx(), None);
    }

    #[test]
    fn test_mailbox_overrun_keeps_newest() {
        let link: Link<NoopRawMutex> = Link::new();
        link.rx_byte(b'a');
        link.rx_byte(b'b');
        assert_eq!(link.take_rx(), Some(b'b'));
    }
}
