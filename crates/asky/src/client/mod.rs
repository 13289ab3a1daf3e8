//! Relay client: the client half of the transport channel plus the
//! cooperative event loop tying session state, command dispatch, and the
//! completion call together.

mod dispatcher;
mod session;

use anyhow::{Context, Result};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::completion::CompletionBackend;
use crate::ws::Frame;

pub use dispatcher::{
    BOT_IDENTITY, BotProfile, COMMAND_PREFIX, CommandDispatcher, DispatcherState, FALLBACK_REPLY,
    SubmitAction,
};
pub use session::{ANONYMOUS_IDENTITY, SessionLog, display_message, resolve_identity};

type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client side of the transport channel.
///
/// Publish is fire-and-forget; inbound frames arrive as a stream. The
/// client assumes a pre-established channel and does not react to
/// connect/disconnect beyond ending the session.
pub struct RelayConnection {
    socket: WsConnection,
}

impl RelayConnection {
    /// Connect to a relay server, e.g. `ws://localhost:3000/api/ws`.
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _response) = tokio_tungstenite::connect_async(url)
            .await
            .with_context(|| format!("connecting to relay at {url}"))?;
        info!("connected to relay at {}", url);
        Ok(Self { socket })
    }

    /// Split into the publishing half and the receiving half so both can be
    /// driven from one select loop.
    pub fn split(self) -> (FramePublisher, FrameStream) {
        let (sink, stream) = self.socket.split();
        (FramePublisher { sink }, FrameStream { stream })
    }
}

/// Publishing half of a relay connection.
pub struct FramePublisher {
    sink: SplitSink<WsConnection, Message>,
}

impl FramePublisher {
    /// Publish a frame. Fire-and-forget: no acknowledgment exists, and a
    /// frame sent while the server is unreachable is simply lost.
    pub async fn publish(&mut self, frame: Frame) -> Result<()> {
        let json = serde_json::to_string(&frame).context("serializing frame")?;
        self.sink
            .send(Message::Text(json.into()))
            .await
            .context("sending frame")
    }
}

/// Receiving half of a relay connection.
pub struct FrameStream {
    stream: SplitStream<WsConnection>,
}

impl FrameStream {
    /// Next chat frame, or `None` once the connection is gone.
    ///
    /// Protocol-level keepalives and unparseable frames are skipped.
    pub async fn next(&mut self) -> Option<Frame> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<Frame>(&text) {
                    Ok(frame) => return Some(frame),
                    Err(e) => warn!("unparseable frame from relay: {}", e),
                },
                Ok(Message::Close(_)) => {
                    info!("relay closed the connection");
                    return None;
                }
                Ok(_) => debug!("ignoring non-text message from relay"),
                Err(e) => {
                    warn!("websocket error: {}", e);
                    return None;
                }
            }
        }
    }
}

/// Options for an interactive chat session.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Relay WebSocket URL.
    pub url: String,
    /// Display identity for this session.
    pub identity: String,
    /// Bot parameters.
    pub bot: BotProfile,
}

/// Run an interactive chat session until stdin or the connection closes.
///
/// One cooperative loop interleaves draft submissions (stdin lines),
/// inbound frames, and the at-most-one outstanding completion call. While a
/// completion is pending the loop keeps receiving frames but rejects new
/// submissions; the completion call is the only operation that suspends the
/// session's control flow, and it cannot be cancelled.
pub async fn run_chat<C>(options: ChatOptions, completions: &C) -> Result<()>
where
    C: CompletionBackend,
{
    let connection = RelayConnection::connect(&options.url).await?;
    let (mut publisher, mut frames) = connection.split();

    let mut dispatcher = CommandDispatcher::with_profile(options.identity.clone(), options.bot);
    let mut log = SessionLog::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("connected as {} - type a message, ctrl-d to quit", options.identity);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match dispatcher.submit(&line) {
                    SubmitAction::Ignore => {}
                    SubmitAction::Reject => {
                        info!("a command reply is still pending, input ignored");
                    }
                    SubmitAction::Publish { payload, command } => {
                        publisher.publish(Frame::ChatMessage { payload }).await?;
                        if let Some(prompt) = command {
                            let payload = await_reply(
                                &mut dispatcher,
                                completions,
                                &prompt,
                                &mut frames,
                                &mut lines,
                                &mut log,
                            )
                            .await;
                            publisher.publish(Frame::ChatMessage { payload }).await?;
                        }
                    }
                }
            }

            frame = frames.next() => {
                let Some(Frame::ChatMessage { payload }) = frame else {
                    break;
                };
                receive(&mut log, payload);
            }
        }
    }

    info!("chat session ended after {} message(s)", log.len());
    Ok(())
}

/// Drive the completion call to settlement while still receiving frames.
///
/// Returns the bot reply payload to publish. Drafts submitted in the
/// meantime are rejected by the dispatcher and dropped, keeping the
/// user-message/bot-reply pair strictly sequential on the wire.
async fn await_reply<C>(
    dispatcher: &mut CommandDispatcher,
    completions: &C,
    prompt: &str,
    frames: &mut FrameStream,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    log: &mut SessionLog,
) -> String
where
    C: CompletionBackend,
{
    let call = completions.complete(prompt);
    tokio::pin!(call);
    let mut stdin_open = true;
    let mut stream_open = true;

    loop {
        tokio::select! {
            outcome = &mut call => {
                return dispatcher.settle(outcome);
            }

            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if dispatcher.submit(&line) == SubmitAction::Reject {
                            println!("(waiting for the bot, message not sent)");
                        }
                    }
                    Ok(None) | Err(_) => stdin_open = false,
                }
            }

            frame = frames.next(), if stream_open => {
                match frame {
                    Some(Frame::ChatMessage { payload }) => receive(log, payload),
                    // Connection gone; keep waiting for the call to settle.
                    // The publish attempt afterwards reports the failure.
                    None => stream_open = false,
                }
            }
        }
    }
}

fn receive(log: &mut SessionLog, payload: String) {
    println!("{}", payload);
    log.append(payload);
}
