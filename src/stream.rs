use crate::error::RecorderError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// One item on the wire: a chunk of captured bytes, or an error surfaced
/// from the recorder process.
pub(crate) type StreamItem = Result<Vec<u8>, RecorderError>;

/// Chunks buffered between the reader task and consumers before the
/// producer starts applying backpressure to the recorder's pipe.
const STREAM_CAPACITY: usize = 64;

/// Readable view over the bytes a recording session captures.
///
/// Every handle returned by `RecordingSession::stream` observes the same
/// underlying flow: chunks arrive in the order the recorder emitted them,
/// each chunk is delivered to exactly one reader, and end-of-data is
/// reported once the session has stopped and the channel has drained.
#[derive(Clone)]
pub struct AudioStream {
    receiver: Arc<Mutex<mpsc::Receiver<StreamItem>>>,
}

impl AudioStream {
    /// Create the producer half and the shared consumer view.
    pub(crate) fn channel() -> (mpsc::Sender<StreamItem>, AudioStream) {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        (
            tx,
            AudioStream {
                receiver: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Receive the next chunk of captured audio.
    ///
    /// Returns `None` once the session has stopped and the stream has
    /// drained. An `Err` item reports a spawn failure or an unexpected
    /// process exit; it is the last item before end-of-data.
    pub async fn next_chunk(&self) -> Option<Result<Vec<u8>, RecorderError>> {
        self.receiver.lock().await.recv().await
    }

    /// Collect every remaining chunk until end-of-data.
    ///
    /// Stops at the first error item and returns it.
    pub async fn read_to_end(&self) -> Result<Vec<u8>, RecorderError> {
        let mut data = Vec::new();
        while let Some(item) = self.next_chunk().await {
            data.extend(item?);
        }
        Ok(data)
    }
}

impl fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStream").finish_non_exhaustive()
    }
}
