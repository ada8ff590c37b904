use crate::view::ScoreboardView;
use log::*;
use scoreboard_common::relay::{FrameError, Relayed, Subscribe, decode_line, encode_line};
use std::future::Future;
use thiserror::Error;
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    select,
    time::{Duration, sleep},
};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

/// Applies every relayed line to `view` until the stream ends. Lines that can't be
/// decoded are skipped.
pub async fn follow<R: AsyncBufRead + Unpin>(reader: R, view: &mut ScoreboardView) -> Result<()> {
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        match decode_line::<Relayed>(&line) {
            Ok(relayed) => {
                if view.apply(&relayed) {
                    info!("{view}");
                }
            }
            Err(FrameError::Empty) => {}
            Err(e) => warn!("Discarding corrupted message: {e}"),
        }
    }
    Ok(())
}

/// One connection to the relay: subscribe, then follow until it closes
pub async fn session(host: &str, port: u16, view: &mut ScoreboardView) -> Result<()> {
    let mut stream = TcpStream::connect((host, port)).await?;
    info!("Connected to relay at {host}:{port}");

    let subscribe = encode_line(&Subscribe {
        subscribe: view.instance(),
    })?;
    stream.write_all(&subscribe).await?;
    info!("Subscribed to scoreboard {}", view.instance());

    follow(BufReader::new(stream), view).await
}

/// Keeps a session open, reconnecting after `retry_delay` whenever it ends, until
/// `shutdown` resolves
pub async fn run_loop(
    host: String,
    port: u16,
    retry_delay: Duration,
    view: &mut ScoreboardView,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    loop {
        select! {
            result = session(&host, port, view) => match result {
                Ok(()) => error!("Connection to relay lost! Attempting to reconnect"),
                Err(e) => warn!("Relay connection failed: {e}. Trying again in {retry_delay:?}"),
            },
            _ = &mut shutdown => break,
        }
        select! {
            _ = sleep(retry_delay) => {}
            _ = &mut shutdown => break,
        }
    }
    info!("Display stopped");
}
