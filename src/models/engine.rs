//! Engine session - owns one UCI engine and asks it for moves.
//!
//! Architecture:
//! - A reader task turns engine stdout into `EngineEvent`s on one channel
//! - A writer task drains a second channel of command lines into engine stdin
//! - Requests wait on the event channel with an explicit timeout
//!
//! Dropping a `best_move` future cancels the request. The engine may still be
//! searching at that point, so the next request stops that search and throws
//! its answer away before sending a new position.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Difficulty, EngineConfig};
use crate::domain::{Board, UciCommand, UciMove, UciOutput, UciOutputKind};
use crate::error::{EngineError, EngineResult};

/// How long `shutdown` waits for the engine to honour `quit`
const QUIT_GRACE: Duration = Duration::from_secs(2);

/// Messages sent from the engine reader task to the session
#[derive(Debug)]
pub enum EngineEvent {
    /// A line of output from the engine
    Output(String),
    /// Engine output closed
    Exited,
    /// Reading from the engine failed
    Error(std::io::Error),
}

/// An owned connection to one engine
pub struct EngineSession {
    /// Lines for the writer task; `None` once shut down
    command_sender: Option<UnboundedSender<String>>,
    /// Events from the reader task
    event_receiver: UnboundedReceiver<EngineEvent>,
    /// Handle to the engine process, when we spawned one
    process: Option<Child>,
    /// A `go` was sent and its `bestmove` has not been read yet
    searching: bool,
    reader_task: JoinHandle<()>,
    writer_task: Option<JoinHandle<()>>,
}

impl EngineSession {
    /// Spawn the configured engine and run the setup handshake
    pub async fn start(config: &EngineConfig) -> EngineResult<Self> {
        let mut session = Self::spawn(&config.path)?;
        session.initialize(config).await?;
        Ok(session)
    }

    /// Spawn an engine process without talking to it yet
    pub fn spawn(path: &Path) -> EngineResult<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;

        let mut session = Self::from_io(stdout, stdin);
        session.process = Some(child);
        info!(path = %path.display(), "engine started");
        Ok(session)
    }

    /// Build a session over any byte streams speaking UCI.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<EngineEvent>();
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<String>();

        let reader_task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        debug!(%line, "engine output");
                        if event_tx.send(EngineEvent::Output(line)).is_err() {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = event_tx.send(EngineEvent::Error(e));
                        return;
                    }
                }
            }
            let _ = event_tx.send(EngineEvent::Exited);
        });

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(cmd) = cmd_rx.recv().await {
                debug!(%cmd, "engine input");
                let line = format!("{cmd}\n");
                if writer.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if writer.flush().await.is_err() {
                    break;
                }
            }
            let _ = writer.shutdown().await;
        });

        Self {
            command_sender: Some(cmd_tx),
            event_receiver: event_rx,
            process: None,
            searching: false,
            reader_task,
            writer_task: Some(writer_task),
        }
    }

    /// Setup sequence: `uci`, network files if configured, then `isready`,
    /// waiting for `readyok`
    pub async fn initialize(&mut self, config: &EngineConfig) -> EngineResult<()> {
        self.send(UciCommand::Uci)?;
        if let Some(path) = &config.eval_file {
            self.send(UciCommand::set_option("EvalFile", path.display()))?;
        }
        if let Some(path) = &config.eval_file_small {
            self.send(UciCommand::set_option("EvalFileSmall", path.display()))?;
        }
        self.send(UciCommand::IsReady)?;

        self.wait_for("isready", config.ready_timeout(), |kind| {
            matches!(kind, UciOutputKind::ReadyOk).then_some(())
        })
        .await?;
        info!("engine ready");
        Ok(())
    }

    /// Send a UCI command to the engine
    pub fn send(&self, command: UciCommand) -> EngineResult<()> {
        let sender = self.command_sender.as_ref().ok_or(EngineError::Closed)?;
        sender
            .send(command.to_uci_string())
            .map_err(|_| EngineError::Closed)
    }

    /// Ask for the best move in `board`.
    ///
    /// Sends `position fen`, the skill level and `go depth`, then waits up to
    /// `timeout` for `bestmove`. On timeout the search is told to stop and
    /// its late answer is discarded by the next request.
    pub async fn best_move(
        &mut self,
        board: &Board,
        difficulty: Difficulty,
        timeout: Duration,
    ) -> EngineResult<UciMove> {
        self.settle(timeout).await?;
        self.discard_pending_output()?;

        self.send(UciCommand::Position { fen: board.to_fen() })?;
        self.send(UciCommand::set_option("Skill Level", difficulty.skill()))?;
        self.send(UciCommand::GoDepth(difficulty.depth()))?;
        self.searching = true;

        let answer = match self.wait_for("go", timeout, best_move_line).await {
            Ok(answer) => answer,
            Err(err @ EngineError::Timeout { .. }) => {
                warn!(?timeout, "engine search timed out, stopping it");
                // a dead channel will surface on the next request
                let _ = self.send(UciCommand::Stop);
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        self.searching = false;

        let best = parse_best_move(&answer)?;
        info!(%best, "engine move");
        Ok(best)
    }

    /// Whether a search is still outstanding
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    /// Send `quit`, let the writer flush, and reap the process
    pub async fn shutdown(mut self) -> EngineResult<()> {
        let _ = self.send(UciCommand::Quit);
        self.command_sender = None;

        if let Some(writer) = self.writer_task.take() {
            let _ = tokio::time::timeout(QUIT_GRACE, writer).await;
        }

        if let Some(mut child) = self.process.take() {
            match tokio::time::timeout(QUIT_GRACE, child.wait()).await {
                Ok(status) => info!(status = %status?, "engine exited"),
                Err(_) => {
                    warn!("engine ignored quit, killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }

    /// Finish a search left over from a cancelled or timed-out request
    async fn settle(&mut self, timeout: Duration) -> EngineResult<()> {
        if !self.searching {
            return Ok(());
        }
        warn!("stopping superseded search");
        self.send(UciCommand::Stop)?;
        let stale = self.wait_for("stop", timeout, best_move_line).await?;
        debug!(%stale, "discarded superseded bestmove");
        self.searching = false;
        Ok(())
    }

    /// Throw away output that arrived between requests. An exit or read
    /// failure seen here is reported instead of being dropped.
    fn discard_pending_output(&mut self) -> EngineResult<()> {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                EngineEvent::Output(line) => debug!(%line, "ignored engine output"),
                EngineEvent::Exited => {
                    warn!("engine exited between requests");
                    return Err(EngineError::Closed);
                }
                EngineEvent::Error(e) => {
                    warn!(error = %e, "engine read failed between requests");
                    return Err(EngineError::Io(e));
                }
            }
        }
        Ok(())
    }

    /// Read events until `matcher` accepts a line, the engine goes away, or
    /// `timeout` runs out
    async fn wait_for<T>(
        &mut self,
        waiting_for: &str,
        timeout: Duration,
        mut matcher: impl FnMut(&UciOutputKind) -> Option<T>,
    ) -> EngineResult<T> {
        let receiver = &mut self.event_receiver;
        let wait = async {
            while let Some(event) = receiver.recv().await {
                match event {
                    EngineEvent::Output(line) => {
                        let output = UciOutput::new(line);
                        if let Some(found) = matcher(&output.kind) {
                            return Ok(found);
                        }
                    }
                    EngineEvent::Exited => return Err(EngineError::Closed),
                    EngineEvent::Error(e) => return Err(EngineError::Io(e)),
                }
            }
            Err(EngineError::Closed)
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                waiting_for: waiting_for.to_string(),
                timeout,
            }),
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.reader_task.abort();
        if let Some(writer) = self.writer_task.take() {
            writer.abort();
        }
    }
}

fn best_move_line(kind: &UciOutputKind) -> Option<String> {
    match kind {
        UciOutputKind::BestMove(rest) => Some(rest.clone()),
        _ => None,
    }
}

/// Read the move out of the text following `bestmove`
fn parse_best_move(rest: &str) -> EngineResult<UciMove> {
    let token = rest.split_whitespace().next().unwrap_or_default();
    if token == "(none)" || token == "0000" {
        return Err(EngineError::NoMove);
    }
    UciMove::from_uci(token).ok_or_else(|| EngineError::Protocol {
        line: format!("bestmove {rest}"),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;
    use crate::domain::{PieceType, Position};

    const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connect a session to an in-memory engine. `script` maps each received
    /// line to the lines sent back. The handle yields every line received.
    fn fake_engine<F>(mut script: F) -> (EngineSession, JoinHandle<Vec<String>>)
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        let (ours, theirs) = tokio::io::duplex(4096);
        let (our_read, our_write) = tokio::io::split(ours);
        let session = EngineSession::from_io(our_read, our_write);

        let engine = tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(theirs);
            let mut lines = BufReader::new(read).lines();
            let mut received = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                for reply in script(&line) {
                    write.write_all(format!("{reply}\n").as_bytes()).await.unwrap();
                }
                let quit = line == "quit";
                received.push(line);
                if quit {
                    break;
                }
            }
            received
        });

        (session, engine)
    }

    fn replies(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn after_e4() -> Board {
        Board::initial().move_piece(Position::new(6, 4), Position::new(4, 4), None)
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let (mut session, engine) = fake_engine(|line| match line {
            "uci" => replies(&["id name Fake", "uciok"]),
            "isready" => replies(&["readyok"]),
            _ => Vec::new(),
        });
        let config = EngineConfig {
            eval_file: Some(PathBuf::from("/nn/big.nnue")),
            eval_file_small: Some(PathBuf::from("/nn/small.nnue")),
            ..EngineConfig::default()
        };

        session.initialize(&config).await.unwrap();
        session.shutdown().await.unwrap();

        assert_eq!(
            engine.await.unwrap(),
            [
                "uci",
                "setoption name EvalFile value /nn/big.nnue",
                "setoption name EvalFileSmall value /nn/small.nnue",
                "isready",
                "quit",
            ]
        );
    }

    #[tokio::test]
    async fn test_best_move_request() {
        let (mut session, engine) = fake_engine(|line| {
            if line.starts_with("go ") {
                replies(&["info depth 1 score cp 20 pv e7e5", "bestmove e7e5 ponder g1f3"])
            } else {
                Vec::new()
            }
        });
        let board = after_e4();

        let best = session
            .best_move(&board, Difficulty::Intermediate, REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(best, UciMove::from_uci("e7e5").unwrap());
        assert!(!session.is_searching());
        session.shutdown().await.unwrap();

        assert_eq!(
            engine.await.unwrap(),
            [
                format!("position fen {}", board.to_fen()),
                "setoption name Skill Level value 5".to_string(),
                "go depth 8".to_string(),
                "quit".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_best_move_promotion() {
        let (mut session, _engine) = fake_engine(|line| {
            if line.starts_with("go ") {
                replies(&["bestmove a2a1n"])
            } else {
                Vec::new()
            }
        });
        let best = session
            .best_move(&Board::initial(), Difficulty::Beginner, REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(best.promotion, Some(PieceType::Knight));
    }

    #[tokio::test]
    async fn test_best_move_times_out_and_stops_search() {
        let (mut session, engine) = fake_engine(|_| Vec::new());

        let err = session
            .best_move(&Board::initial(), Difficulty::Beginner, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { ref waiting_for, .. } if waiting_for == "go"));
        assert!(session.is_searching());

        session.shutdown().await.unwrap();
        let received = engine.await.unwrap();
        assert_eq!(received[received.len() - 2], "stop");
    }

    #[tokio::test]
    async fn test_late_answer_is_discarded() {
        let mut searching = false;
        let mut searches = 0;
        let (mut session, _engine) = fake_engine(move |line| {
            if line.starts_with("go ") {
                searches += 1;
                if searches == 1 {
                    searching = true;
                    return Vec::new();
                }
                return replies(&["bestmove e7e5"]);
            }
            if line == "stop" && searching {
                searching = false;
                return replies(&["bestmove h7h6"]);
            }
            Vec::new()
        });
        let board = after_e4();

        let first = session
            .best_move(&board, Difficulty::Beginner, Duration::from_millis(50))
            .await;
        assert!(first.is_err());

        let second = session
            .best_move(&board, Difficulty::Beginner, REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(second, UciMove::from_uci("e7e5").unwrap());
    }

    #[tokio::test]
    async fn test_no_move_reported() {
        let (mut session, _engine) = fake_engine(|line| {
            if line.starts_with("go ") {
                replies(&["bestmove (none)"])
            } else {
                Vec::new()
            }
        });
        let err = session
            .best_move(&Board::initial(), Difficulty::Beginner, REPLY_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoMove));
    }

    #[tokio::test]
    async fn test_malformed_best_move() {
        let (mut session, _engine) = fake_engine(|line| {
            if line.starts_with("go ") {
                replies(&["bestmove zz99"])
            } else {
                Vec::new()
            }
        });
        let err = session
            .best_move(&Board::initial(), Difficulty::Beginner, REPLY_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Protocol { ref line } if line == "bestmove zz99"));
    }

    #[tokio::test]
    async fn test_engine_gone() {
        let (ours, theirs) = tokio::io::duplex(64);
        drop(theirs);
        let (read, write) = tokio::io::split(ours);
        let mut session = EngineSession::from_io(read, write);

        let err = session
            .best_move(&Board::initial(), Difficulty::Beginner, REPLY_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Closed));
    }

    #[tokio::test]
    async fn test_read_error_between_requests_is_reported() {
        let (ours, mut theirs) = tokio::io::duplex(64);
        let (read, write) = tokio::io::split(ours);
        let mut session = EngineSession::from_io(read, write);

        // unsolicited line that is not valid UTF-8
        theirs.write_all(b"\xff\xfe\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = session
            .best_move(&Board::initial(), Difficulty::Beginner, REPLY_TIMEOUT)
            .await
            .unwrap_err();
        match err {
            EngineError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_missing_executable() {
        let err = EngineSession::spawn(Path::new("/nonexistent/stockfish"))
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }

    #[test]
    fn test_parse_best_move() {
        assert_eq!(
            parse_best_move("e2e4 ponder e7e5").unwrap(),
            UciMove::from_uci("e2e4").unwrap()
        );
        assert!(matches!(parse_best_move("0000"), Err(EngineError::NoMove)));
        assert!(matches!(parse_best_move(""), Err(EngineError::Protocol { .. })));
    }
}
