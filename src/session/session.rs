use super::state::SessionState;
use super::stats::SessionStats;
use crate::config::RecordingConfig;
use crate::error::RecorderError;
use crate::recorder::{self, Recorder, RecorderCommand};
use crate::stream::{AudioStream, StreamItem};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex as SyncMutex, RwLock};
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long `stop` waits for the recorder to exit after a SIGTERM before
/// escalating to a kill.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Read size for the stdout pump.
const READ_CHUNK: usize = 4096;

/// Stderr lines retained for diagnostics on abnormal exit.
const STDERR_TAIL_LINES: usize = 8;

/// A recording session that owns one external recorder process and exposes
/// lifecycle control plus a stream view over the captured bytes.
///
/// The session is the sole owner and sole terminator of the child process.
/// Lifecycle operations return promptly; their effects (data flow changes,
/// process exit, launch failures) are observed through the stream view.
#[derive(Debug)]
pub struct RecordingSession {
    /// Session identifier used in logs and stats
    id: String,

    /// Fully-defaulted configuration, immutable for the session's lifetime
    config: RecordingConfig,

    /// Invocation the resolver produced from the configuration
    command: RecorderCommand,

    /// Lifecycle state; every transition is guarded under this lock
    state: Arc<RwLock<SessionState>>,

    /// Producer-side gate: while set, captured bytes are dropped
    paused: Arc<AtomicBool>,

    /// Set by `stop` so the reader does not report the exit as abnormal
    stopping: Arc<AtomicBool>,

    /// Wakes a reader blocked on a full stream so `stop` cannot deadlock
    /// behind an absent consumer
    stop_signal: Arc<Notify>,

    started_at: Arc<SyncMutex<Option<DateTime<Utc>>>>,

    bytes_streamed: Arc<AtomicU64>,
    bytes_dropped: Arc<AtomicU64>,

    /// Producer half of the stream; `start` hands it to the reader task
    sender: SyncMutex<Option<mpsc::Sender<StreamItem>>>,

    /// The one stream view every `stream()` call returns a handle onto
    stream: AudioStream,

    /// Child process handle; `stop` takes it, making it the sole terminator
    child: Arc<Mutex<Option<Child>>>,

    /// Handle for the stdout reader task
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl RecordingSession {
    /// Create a session for the backend named in `config.recorder`.
    ///
    /// Validates the configuration and resolves the backend synchronously;
    /// an unknown recorder or invalid option fails here, before anything is
    /// spawned. The session starts out idle.
    pub fn new(config: RecordingConfig) -> Result<Self, RecorderError> {
        config.validate()?;
        let backend = recorder::resolve(&config.recorder)?;
        Ok(Self::assemble(config, backend.as_ref()))
    }

    /// Create a session driven by a caller-supplied backend strategy.
    pub fn with_recorder(
        config: RecordingConfig,
        backend: &dyn Recorder,
    ) -> Result<Self, RecorderError> {
        config.validate()?;
        Ok(Self::assemble(config, backend))
    }

    fn assemble(config: RecordingConfig, backend: &dyn Recorder) -> Self {
        let command = backend.command(&config);
        let id = format!("rec-{}", uuid::Uuid::new_v4());
        let (sender, stream) = AudioStream::channel();

        info!("created session {} ({} backend)", id, backend.name());

        Self {
            id,
            config,
            command,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            paused: Arc::new(AtomicBool::new(false)),
            stopping: Arc::new(AtomicBool::new(false)),
            stop_signal: Arc::new(Notify::new()),
            started_at: Arc::new(SyncMutex::new(None)),
            bytes_streamed: Arc::new(AtomicU64::new(0)),
            bytes_dropped: Arc::new(AtomicU64::new(0)),
            sender: SyncMutex::new(Some(sender)),
            stream,
            child: Arc::new(Mutex::new(None)),
            reader_task: Mutex::new(None),
        }
    }

    /// Start the recorder process and begin streaming its output.
    ///
    /// Valid only from idle; a second call fails with an invalid-state
    /// error and has no side effects. The spawn itself can still fail after
    /// the state transition: launch errors are delivered through the stream
    /// view (the handle a consumer is watching) and the session moves
    /// straight to stopped.
    pub async fn start(&self) -> Result<&Self, RecorderError> {
        {
            let mut state = self.state.write();
            if *state != SessionState::Idle {
                return Err(RecorderError::InvalidState {
                    operation: "start",
                    state: *state,
                });
            }
            *state = SessionState::Running;
        }
        *self.started_at.lock() = Some(Utc::now());

        let sender = self.sender.lock().take();
        let Some(sender) = sender else {
            // only reachable if a concurrent stop already tore the session
            // down between the guard above and here
            return Err(RecorderError::InvalidState {
                operation: "start",
                state: SessionState::Stopped,
            });
        };

        info!(
            "session {}: starting `{} {}`",
            self.id,
            self.command.program,
            self.command.args.join(" ")
        );

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .envs(self.command.env.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(
                    "session {}: failed to spawn {}: {}",
                    self.id, self.command.program, source
                );
                *self.state.write() = SessionState::Stopped;
                let _ = sender
                    .send(Err(RecorderError::Spawn {
                        program: self.command.program.clone(),
                        source,
                    }))
                    .await;
                return Ok(self);
            }
        };

        if let Some(pid) = child.id() {
            debug!("session {}: recorder running (pid {})", self.id, pid);
        }

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                // stdout was configured as piped above, so this cannot
                // happen for a freshly spawned child
                let _ = child.kill().await;
                *self.state.write() = SessionState::Stopped;
                let _ = sender
                    .send(Err(RecorderError::Spawn {
                        program: self.command.program.clone(),
                        source: std::io::Error::other("recorder stdout was not captured"),
                    }))
                    .await;
                return Ok(self);
            }
        };

        // Drain stderr for diagnostics; the tail is attached to abnormal
        // exit errors.
        let stderr_tail = Arc::new(SyncMutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
        let stderr_task = child.stderr.take().map(|stderr| {
            let tail = Arc::clone(&stderr_tail);
            let id = self.id.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("session {}: recorder stderr: {}", id, line);
                    let mut tail = tail.lock();
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            })
        });

        {
            let mut slot = self.child.lock().await;
            *slot = Some(child);
        }

        // A stop may have raced the spawn; never leave the process behind.
        if self.stopping.load(Ordering::Acquire) {
            if let Some(mut child) = self.child.lock().await.take() {
                terminate(&mut child, &self.id).await;
            }
            return Ok(self);
        }

        // Spawn the stdout pump: the sole producer for the stream view.
        let id = self.id.clone();
        let paused = Arc::clone(&self.paused);
        let stopping = Arc::clone(&self.stopping);
        let stop_signal = Arc::clone(&self.stop_signal);
        let state = Arc::clone(&self.state);
        let child_slot = Arc::clone(&self.child);
        let bytes_streamed = Arc::clone(&self.bytes_streamed);
        let bytes_dropped = Arc::clone(&self.bytes_dropped);

        let reader_task = tokio::spawn(async move {
            let mut stdout = stdout;
            let mut buf = vec![0u8; READ_CHUNK];

            loop {
                if stopping.load(Ordering::Acquire) {
                    break;
                }
                let read = tokio::select! {
                    read = stdout.read(&mut buf) => read,
                    _ = stop_signal.notified() => break,
                };
                match read {
                    Ok(0) => break, // recorder closed its stdout
                    Ok(n) => {
                        if paused.load(Ordering::Acquire) {
                            // drop while paused, never buffer for later
                            bytes_dropped.fetch_add(n as u64, Ordering::Relaxed);
                            continue;
                        }
                        let chunk = buf[..n].to_vec();
                        tokio::select! {
                            sent = sender.send(Ok(chunk)) => {
                                if sent.is_ok() {
                                    bytes_streamed.fetch_add(n as u64, Ordering::Relaxed);
                                }
                                // a dropped consumer is not an error: keep
                                // draining so the recorder never blocks on
                                // a full pipe
                            }
                            _ = stop_signal.notified() => break,
                        }
                    }
                    Err(e) => {
                        warn!("session {}: error reading recorder output: {}", id, e);
                        break;
                    }
                }
            }

            // Collect the exit status. stop() may already have taken the
            // handle, in which case it also owns the wait. A recorder that
            // closed its stdout but stays alive gets the same grace-then-
            // kill treatment as an explicit stop.
            let status = {
                let mut slot = child_slot.lock().await;
                match slot.as_mut() {
                    Some(child) => match tokio::time::timeout(STOP_GRACE, child.wait()).await {
                        Ok(status) => status.ok(),
                        Err(_) => {
                            warn!("session {}: recorder outlived its stream, killing", id);
                            let _ = child.kill().await;
                            child.try_wait().ok().flatten()
                        }
                    },
                    None => None,
                }
            };

            // Let the stderr drain finish so the tail is complete.
            if let Some(task) = stderr_task {
                let _ = task.await;
            }

            let intentional = stopping.load(Ordering::Acquire);
            *state.write() = SessionState::Stopped;

            match status {
                Some(status) if !intentional && !status.success() => {
                    warn!("session {}: recorder exited abnormally ({})", id, status);
                    let stderr = stderr_tail
                        .lock()
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join("\n");
                    let _ = sender
                        .send(Err(RecorderError::ProcessExit { status, stderr }))
                        .await;
                }
                Some(status) if !intentional => {
                    info!("session {}: recorder finished ({})", id, status);
                }
                _ => {}
            }
            // sender drops here: end-of-data for every stream handle
        });

        *self.reader_task.lock().await = Some(reader_task);

        info!("session {}: recording started", self.id);
        Ok(self)
    }

    /// Stop the session and terminate the recorder process.
    ///
    /// Safe to call from any state and any number of times. The child gets
    /// a SIGTERM first so it can finalize its container, then a kill if it
    /// has not exited within the grace period. When this returns, the
    /// stream has ended.
    pub async fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        *self.state.write() = SessionState::Stopped;
        self.paused.store(false, Ordering::Release);
        self.stop_signal.notify_one();

        // A session stopped before start still holds the producer half;
        // drop it so the stream ends.
        drop(self.sender.lock().take());

        let child = { self.child.lock().await.take() };
        if let Some(mut child) = child {
            terminate(&mut child, &self.id).await;
        }

        let task = { self.reader_task.lock().await.take() };
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("session {}: reader task panicked: {}", self.id, e);
            }
        }

        info!("session {}: stopped", self.id);
    }

    /// Pause the session: captured bytes stop flowing to the stream.
    ///
    /// Bytes produced while paused are dropped, never buffered for later.
    /// On unix the recorder is also SIGSTOPped so it stops producing at the
    /// source. Valid only while running.
    pub async fn pause(&self) -> Result<(), RecorderError> {
        {
            let mut state = self.state.write();
            if *state != SessionState::Running {
                return Err(RecorderError::InvalidState {
                    operation: "pause",
                    state: *state,
                });
            }
            *state = SessionState::Paused;
        }
        // close the gate before stopping the process, so anything still in
        // flight is dropped rather than delivered
        self.paused.store(true, Ordering::Release);
        #[cfg(unix)]
        self.signal_child(libc::SIGSTOP).await;

        info!("session {}: paused", self.id);
        Ok(())
    }

    /// Resume a paused session; forwarding picks back up.
    pub async fn resume(&self) -> Result<(), RecorderError> {
        {
            let mut state = self.state.write();
            if *state != SessionState::Paused {
                return Err(RecorderError::InvalidState {
                    operation: "resume",
                    state: *state,
                });
            }
            *state = SessionState::Running;
        }
        // reopen the gate before waking the process so nothing it produces
        // from here on is dropped
        self.paused.store(false, Ordering::Release);
        #[cfg(unix)]
        self.signal_child(libc::SIGCONT).await;

        info!("session {}: resumed", self.id);
        Ok(())
    }

    /// Whether the session is currently paused.
    pub fn is_paused(&self) -> bool {
        *self.state.read() == SessionState::Paused
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// The stream view over captured audio.
    ///
    /// Every call returns a handle onto the same underlying flow, never a
    /// new independent stream; reading from any handle consumes from the
    /// single channel the reader task feeds.
    pub fn stream(&self) -> AudioStream {
        self.stream.clone()
    }

    /// The fully-defaulted configuration this session records with.
    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// The invocation the resolver produced for this session.
    pub fn command(&self) -> &RecorderCommand {
        &self.command
    }

    /// Session identifier used in logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        let started_at = *self.started_at.lock();
        let duration_secs = started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            session_id: self.id.clone(),
            state: self.state(),
            started_at,
            duration_secs,
            bytes_streamed: self.bytes_streamed.load(Ordering::Relaxed),
            bytes_dropped: self.bytes_dropped.load(Ordering::Relaxed),
        }
    }

    #[cfg(unix)]
    async fn signal_child(&self, signal: libc::c_int) {
        let slot = self.child.lock().await;
        if let Some(child) = slot.as_ref() {
            if let Some(pid) = child.id() {
                // the session exclusively owns the handle, so the pid
                // cannot have been reaped and reused underneath us
                unsafe {
                    libc::kill(pid as libc::pid_t, signal);
                }
            }
        }
    }
}

impl Drop for RecordingSession {
    /// Best-effort teardown for sessions dropped without `stop`: wake the
    /// reader and kill the child outright so it is never left orphaned.
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        self.stop_signal.notify_one();
        if let Ok(mut slot) = self.child.try_lock() {
            if let Some(child) = slot.as_mut() {
                let _ = child.start_kill();
            }
        }
    }
}

/// SIGTERM first so the recorder can flush and finalize, escalating to a
/// kill if it is still alive after the grace period.
async fn terminate(child: &mut Child, id: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        let pid = pid as libc::pid_t;
        unsafe {
            // a paused child cannot see the TERM until it is continued
            libc::kill(pid, libc::SIGCONT);
            libc::kill(pid, libc::SIGTERM);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }

    match tokio::time::timeout(STOP_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!("session {}: recorder exited ({})", id, status),
        Ok(Err(e)) => warn!("session {}: failed to wait for recorder: {}", id, e),
        Err(_) => {
            warn!(
                "session {}: recorder still alive after {:?}, killing",
                id, STOP_GRACE
            );
            if let Err(e) = child.kill().await {
                warn!("session {}: failed to kill recorder: {}", id, e);
            }
        }
    }
}
