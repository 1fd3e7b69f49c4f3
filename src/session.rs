//! Connection session lifecycle
//!
//! Each connection runs a reader task and a writer task. Both meet at a
//! two-party barrier before doing anything the client can observe, so the
//! greeting and name prompt are always the first bytes on the wire.
//!
//! The reader registers the session, feeds lines to the `LineHandler` and,
//! on any exit path, sets `finished`, wakes the writer and unregisters. The
//! writer is the only task that writes to the client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Barrier;
use tokio::task::JoinHandle;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::handler::LineHandler;
use crate::mailbox::{mailbox, Envelope, Mailbox, MailboxReceiver};
use crate::message::{greeting, NAME_PROMPT};
use crate::registry::SessionRegistry;
use crate::types::{ConnectionId, SessionKey};

/// What the registry and routing code know about a session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Registry identity
    pub key: SessionKey,
    /// `"<address>:<port>"` of the client
    pub id: ConnectionId,
    /// Producer side of the session's mailbox
    pub mailbox: Mailbox,
}

impl SessionHandle {
    pub fn new(id: ConnectionId, mailbox: Mailbox) -> Self {
        Self {
            key: SessionKey::new(),
            id,
            mailbox,
        }
    }
}

/// A running client connection
///
/// Dropping this value detaches the tasks; they keep running until the
/// client stream ends.
#[derive(Debug)]
pub struct ConnectionSession {
    key: SessionKey,
    id: ConnectionId,
    finished: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl ConnectionSession {
    /// Spawn the reader and writer tasks for one connection
    pub fn start<R, W>(
        reader: R,
        writer: W,
        id: ConnectionId,
        registry: Arc<SessionRegistry>,
        config: &Config,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mailbox(id.clone(), config.mailbox_capacity);
        let handle = SessionHandle::new(id.clone(), tx);
        let key = handle.key;
        let barrier = Arc::new(Barrier::new(2));
        let finished = Arc::new(AtomicBool::new(false));

        let writer_task = tokio::spawn(run_writer(
            writer,
            id.clone(),
            rx,
            barrier.clone(),
            finished.clone(),
        ));

        let reader_task = tokio::spawn(run_reader(
            reader,
            handle,
            registry,
            barrier,
            finished.clone(),
            config.max_line_length,
        ));

        Self {
            key,
            id,
            finished,
            reader_task,
            writer_task,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Whether the reader has seen the end of the client stream
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Wait for both tasks to end
    pub async fn join(self) {
        if let Err(e) = self.reader_task.await {
            warn!("Reader task for {} failed: {}", self.id, e);
        }
        if let Err(e) = self.writer_task.await {
            warn!("Writer task for {} failed: {}", self.id, e);
        }
    }
}

/// Registry membership of a running reader
///
/// Dropping it (normal return, error or panic) marks the session finished,
/// wakes the writer and removes the session from the registry.
struct Registration {
    handle: SessionHandle,
    registry: Arc<SessionRegistry>,
    finished: Arc<AtomicBool>,
}

impl Registration {
    fn new(
        handle: SessionHandle,
        registry: Arc<SessionRegistry>,
        finished: Arc<AtomicBool>,
    ) -> Self {
        if !registry.register(&handle) {
            warn!("Client {} was already registered", handle.id);
        }
        Self {
            handle,
            registry,
            finished,
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::Release);
        // Full is fine: the writer wakes on a queued line and sees `finished`
        let _ = self.handle.mailbox.shutdown();
        self.registry.unregister(&self.handle);
    }
}

async fn run_reader<R>(
    reader: R,
    handle: SessionHandle,
    registry: Arc<SessionRegistry>,
    barrier: Arc<Barrier>,
    finished: Arc<AtomicBool>,
    max_line_length: usize,
) where
    R: AsyncRead + Unpin,
{
    debug!("Reader starting for {}", handle.id);
    barrier.wait().await;
    debug!("Reader running for {}", handle.id);

    let id = handle.id.clone();
    let _registration = Registration::new(handle.clone(), registry.clone(), finished);
    let mut handler = LineHandler::new(handle, registry);
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"".to_vec(), max_line_length);
    let mut lines = FramedRead::new(reader, codec);

    match read_lines(&mut lines, &mut handler).await {
        Ok(()) => info!("Client {} closed the connection", id),
        Err(e) => warn!("Read error for {}: {}", id, e),
    }
    debug!("Reader for {} has finished", id);
}

async fn read_lines<R>(
    lines: &mut FramedRead<R, AnyDelimiterCodec>,
    handler: &mut LineHandler,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    while let Some(frame) = lines.next().await {
        let frame = frame?;
        // Invalid UTF-8 is replaced with U+FFFD rather than ending the session
        let line = String::from_utf8_lossy(&frame);
        let line: &str = &line;
        handler.handle_line(line.strip_suffix('\r').unwrap_or(line));
    }
    Ok(())
}

async fn run_writer<W>(
    mut writer: W,
    id: ConnectionId,
    mut mailbox: MailboxReceiver,
    barrier: Arc<Barrier>,
    finished: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    debug!("Writer starting for {}", id);
    barrier.wait().await;
    debug!("Writer running for {}", id);

    if let Err(e) = write_lines(&mut writer, &id, &mut mailbox, &finished).await {
        debug!("Write error for {}: {}", id, e);
    }

    let _ = writer.shutdown().await;
    debug!("Writer for {} has finished", id);
}

async fn write_lines<W>(
    writer: &mut W,
    id: &ConnectionId,
    mailbox: &mut MailboxReceiver,
    finished: &AtomicBool,
) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(greeting(id).as_bytes()).await?;
    writer.flush().await?;
    writer.write_all(NAME_PROMPT.as_bytes()).await?;
    writer.flush().await?;

    while !finished.load(Ordering::Acquire) {
        match mailbox.recv().await {
            Some(Envelope::Line(line)) => {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\r\n").await?;
                writer.flush().await?;
                debug!("Message sent to {}: {}", id, line);
            }
            Some(Envelope::Shutdown) | None => break,
        }
    }
    Ok(())
}
