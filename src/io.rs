//! Bridges the polled console core to async byte streams.
//!
//! The core's [`Transport`] is fire-and-forget: `transmit` must return
//! immediately and completion arrives later through
//! [`Link::tx_done`](crate::transport::Link::tx_done). On platforms whose
//! HAL exposes `embedded-io-async` streams instead of DMA callbacks, run
//! [`run_io`] as a task next to whatever loop polls the console:
//! [`AsyncTransport`] stages outgoing bytes and wakes the task, which
//! multiplexes reads and staged writes over one `select`.

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::console::BUFFER_SIZE;
use crate::transport::{Link, Transport};

/// Staged transmit buffer shared between the polled core and the async
/// I/O task.
pub struct TxStage<M: RawMutex> {
    buf: Mutex<M, RefCell<Vec<u8, BUFFER_SIZE>>>,
    ready: Signal<M, ()>,
}

impl<M: RawMutex> TxStage<M> {
    /// Create an empty stage. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            buf: Mutex::new(RefCell::new(Vec::new())),
            ready: Signal::new(),
        }
    }

    fn stage(&self, bytes: &[u8]) {
        self.buf.lock(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            let take = bytes.len().min(buf.capacity());
            let _ = buf.extend_from_slice(&bytes[..take]);
        });
        self.ready.signal(());
    }

    fn drain(&self, into: &mut Vec<u8, BUFFER_SIZE>) {
        self.buf.lock(|buf| {
            let mut buf = buf.borrow_mut();
            into.clear();
            let _ = into.extend_from_slice(&buf);
            buf.clear();
        });
    }
}

impl<M: RawMutex> Default for TxStage<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Transport`] over a [`TxStage`]: transmission stages the bytes and
/// wakes the I/O task; reception needs no arming because the task's read
/// loop is always listening.
pub struct AsyncTransport<'a, M: RawMutex> {
    stage: &'a TxStage<M>,
}

impl<'a, M: RawMutex> AsyncTransport<'a, M> {
    pub fn new(stage: &'a TxStage<M>) -> Self {
        Self { stage }
    }
}

impl<'a, M: RawMutex> Transport for AsyncTransport<'a, M> {
    fn transmit(&mut self, bytes: &[u8]) {
        self.stage.stage(bytes);
    }

    fn request_byte(&mut self) {}
}

/// Drive the byte transport: received bytes go into the link's mailbox,
/// staged transmissions go out the writer, and the busy flag clears when
/// a write completes.
pub async fn run_io<M, R, W>(
    link: &Link<M>,
    stage: &TxStage<M>,
    reader: &mut R,
    writer: &mut W,
) -> !
where
    M: RawMutex,
    R: Read,
    W: Write,
{
    let mut byte = [0u8; 1];
    let mut pending: Vec<u8, BUFFER_SIZE> = Vec::new();

    loop {
        match select(reader.read(&mut byte), stage.ready.wait()).await {
            Either::First(Ok(n)) if n > 0 => {
                link.rx_byte(byte[0]);
            }
            Either::First(_) => {}
            Either::Second(()) => {
                stage.drain(&mut pending);
                if writer.write_all(&pending).await.is_ok() {
                    let _ = writer.flush().await;
                }
                link.tx_done();
            }
        }
    }
}
