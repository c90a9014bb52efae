//! Blocking terminal reads bounded by a timeout.
//!
//! The terminal is a single-consumer resource. A [`TerminalReader`] owns one
//! dedicated OS thread that performs every blocking `read_line`, fed through a
//! FIFO job queue, and a fair async mutex that admits one request at a time.
//! Async callers wait for the worker's answer with a deadline; a read that misses
//! its deadline is abandoned rather than interrupted, and whatever it eventually
//! returns is dropped.

use crate::input::TerminalInput;
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

pub const INPUT_PROMPT: &str = "\n>>> Please enter your input and press Enter: ";
pub const TIMEOUT_NOTICE: &str = "\n[Input timed out]\n";

const WORKER_THREAD_NAME: &str = "input";

/// Source of operator lines. Implementations may block.
pub trait LineSource: Send + 'static {
    /// Read one line. `Ok(None)` means the stream is closed.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// The process's standard input.
#[derive(Debug, Default)]
pub struct StdinLineSource;

impl LineSource for StdinLineSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

type Console = Arc<Mutex<Box<dyn Write + Send>>>;
type ReadReply = io::Result<Option<String>>;

struct ReadJob {
    reply: oneshot::Sender<ReadReply>,
}

pub struct TerminalReader {
    jobs: mpsc::Sender<ReadJob>,
    console: Console,
    turn: tokio::sync::Mutex<()>,
}

impl TerminalReader {
    /// Reader over stdin that prompts on stderr, so prompts stay visible when
    /// stdout is redirected.
    pub fn stdio() -> io::Result<Self> {
        Self::spawn(StdinLineSource, Box::new(io::stderr()))
    }

    /// Start the worker thread over an arbitrary line source and console.
    pub fn spawn(source: impl LineSource, console: Box<dyn Write + Send>) -> io::Result<Self> {
        let (jobs, queue) = mpsc::channel::<ReadJob>();
        let console: Console = Arc::new(Mutex::new(console));
        let worker_console = console.clone();

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(source, queue, worker_console))?;

        Ok(Self {
            jobs,
            console,
            turn: tokio::sync::Mutex::new(()),
        })
    }

    /// Prompt the operator and wait up to `timeout` for a non-empty line.
    ///
    /// Returns `(text, true)` for a usable answer and `("", false)` on timeout,
    /// end of input, blank input or any failure.
    pub async fn read_with_timeout(&self, timeout: Duration) -> (String, bool) {
        let _turn = self.turn.lock().await;

        let (reply, answer) = oneshot::channel();
        if self.jobs.send(ReadJob { reply }).is_err() {
            log::error!("Failed to read terminal input: input worker is not running");
            return (String::new(), false);
        }

        match tokio::time::timeout(timeout, answer).await {
            Ok(Ok(Ok(Some(line)))) => match clean_line(&line) {
                Some(text) => (text, true),
                None => {
                    log::info!("Operator submitted an empty line");
                    (String::new(), false)
                }
            },
            Ok(Ok(Ok(None))) => {
                log::info!("Terminal input closed");
                (String::new(), false)
            }
            Ok(Ok(Err(e))) => {
                log::error!("Failed to read terminal input: {}", e);
                (String::new(), false)
            }
            Ok(Err(_)) => {
                log::error!("Failed to read terminal input: input worker dropped the request");
                (String::new(), false)
            }
            Err(_) => {
                log::info!("Input timed out after {} seconds", timeout.as_secs());
                write_console(&self.console, TIMEOUT_NOTICE);
                (String::new(), false)
            }
        }
    }
}

#[async_trait]
impl TerminalInput for TerminalReader {
    async fn read_with_timeout(&self, timeout: Duration) -> (String, bool) {
        TerminalReader::read_with_timeout(self, timeout).await
    }
}

fn run_worker(mut source: impl LineSource, queue: mpsc::Receiver<ReadJob>, console: Console) {
    while let Ok(job) = queue.recv() {
        // The requester gave up while this job was still queued.
        if job.reply.is_closed() {
            log::debug!("Skipping abandoned terminal read");
            continue;
        }

        write_console(&console, INPUT_PROMPT);
        let result = source.read_line();
        if job.reply.send(result).is_err() {
            log::debug!("Discarding terminal input that arrived after the timeout");
        }
    }
    log::debug!("Terminal input worker stopped");
}

fn write_console(console: &Console, text: &str) {
    let mut console = match console.lock() {
        Ok(console) => console,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Err(e) = console.write_all(text.as_bytes()).and_then(|_| console.flush()) {
        log::warn!("Failed to write to terminal: {}", e);
    }
}

/// Trim whitespace and control characters; blank lines carry no answer.
fn clean_line(line: &str) -> Option<String> {
    let trimmed = line.trim_matches(|c: char| c.is_whitespace() || c.is_control());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    /// Line source driven by the test through a channel. Dropping the sender
    /// closes the stream.
    struct ScriptedSource {
        lines: mpsc::Receiver<io::Result<Option<String>>>,
    }

    impl LineSource for ScriptedSource {
        fn read_line(&mut self) -> io::Result<Option<String>> {
            self.lines.recv().unwrap_or(Ok(None))
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }

        fn prompts(&self) -> usize {
            self.contents().matches(INPUT_PROMPT).count()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn scripted_reader() -> (
        Arc<TerminalReader>,
        mpsc::Sender<io::Result<Option<String>>>,
        SharedBuffer,
    ) {
        let (feed, lines) = mpsc::channel();
        let console = SharedBuffer::default();
        let reader = TerminalReader::spawn(ScriptedSource { lines }, Box::new(console.clone()))
            .expect("spawn input worker");
        (Arc::new(reader), feed, console)
    }

    fn line(text: &str) -> io::Result<Option<String>> {
        Ok(Some(text.to_string()))
    }

    async fn wait_for_prompts(console: &SharedBuffer, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while console.prompts() < expected {
            assert!(Instant::now() < deadline, "prompt #{expected} never appeared");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    const LONG: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_reads_trimmed_line() {
        let (reader, feed, console) = scripted_reader();
        feed.send(line("  deploy it \n")).unwrap();

        let result = reader.read_with_timeout(LONG).await;
        assert_eq!(result, ("deploy it".to_string(), true));
        assert!(console.contents().contains(INPUT_PROMPT));
    }

    #[tokio::test]
    async fn test_blank_and_control_lines_are_no_response() {
        let (reader, feed, _console) = scripted_reader();

        feed.send(line("   \t\n")).unwrap();
        assert_eq!(reader.read_with_timeout(LONG).await, (String::new(), false));

        feed.send(line("\u{1b}\u{7}\r\n")).unwrap();
        assert_eq!(reader.read_with_timeout(LONG).await, (String::new(), false));
    }

    #[tokio::test]
    async fn test_end_of_input_is_no_response() {
        let (reader, feed, _console) = scripted_reader();
        feed.send(Ok(None)).unwrap();
        assert_eq!(reader.read_with_timeout(LONG).await, (String::new(), false));
    }

    #[tokio::test]
    async fn test_read_error_is_no_response() {
        let (reader, feed, _console) = scripted_reader();
        feed.send(Err(io::Error::new(io::ErrorKind::Other, "tty vanished")))
            .unwrap();
        assert_eq!(reader.read_with_timeout(LONG).await, (String::new(), false));
    }

    #[tokio::test]
    async fn test_timeout_prints_notice_and_discards_late_input() {
        let (reader, feed, console) = scripted_reader();

        let started = Instant::now();
        let result = reader.read_with_timeout(Duration::from_millis(100)).await;
        assert_eq!(result, (String::new(), false));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(console.contents().contains(TIMEOUT_NOTICE));

        // Consumed by the abandoned read and dropped.
        feed.send(line("too late")).unwrap();
        feed.send(line("fresh answer")).unwrap();

        let result = reader.read_with_timeout(LONG).await;
        assert_eq!(result, ("fresh answer".to_string(), true));
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_interleave_prompts() {
        let (reader, feed, console) = scripted_reader();

        let first = tokio::spawn({
            let reader = reader.clone();
            async move { reader.read_with_timeout(LONG).await }
        });
        wait_for_prompts(&console, 1).await;

        let second = tokio::spawn({
            let reader = reader.clone();
            async move { reader.read_with_timeout(LONG).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(console.prompts(), 1, "second prompt shown before first read resolved");

        feed.send(line("first")).unwrap();
        assert_eq!(first.await.unwrap(), ("first".to_string(), true));

        wait_for_prompts(&console, 2).await;
        feed.send(line("second")).unwrap();
        assert_eq!(second.await.unwrap(), ("second".to_string(), true));
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("  hello  \n"), Some("hello".to_string()));
        assert_eq!(clean_line("\u{0}\u{1}"), None);
        assert_eq!(clean_line(""), None);
    }
}
