use base64::Engine as _;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What the operator handed back after the browser-assisted export.
#[derive(Debug)]
pub enum PasteOutcome {
    /// Answered "no"; the export is left to the browser page.
    Declined,
    /// End of input, or interrupted while the prompt was waiting.
    Cancelled,
    /// Agreed to paste but entered nothing.
    Empty,
    Decoded(Vec<u8>),
    Invalid(base64::DecodeError),
}

pub trait PasteSource {
    fn request_paste(&mut self) -> PasteOutcome;
}

/// Shared between a console prompt and whatever delivers Ctrl-C.
///
/// While a prompt is armed, [`PromptInterrupt::interrupt`] cancels it instead of ending the run.
#[derive(Debug, Clone, Default)]
pub struct PromptInterrupt {
    armed: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl PromptInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the pending prompt. Returns `false` if no prompt is waiting.
    pub fn interrupt(&self) -> bool {
        if !self.armed.load(Ordering::SeqCst) {
            return false;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        true
    }

    fn arm(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    fn take_cancelled(&self) -> bool {
        self.cancelled.swap(false, Ordering::SeqCst)
    }
}

type Lines = Receiver<io::Result<String>>;

/// Asks for base64 SVG data on the console.
///
/// Input is read on a helper thread so a pending question can be abandoned on interrupt; the
/// thread starts with the first question and lives as long as its input does.
pub struct ConsolePrompt<R> {
    input: Option<R>,
    lines: Option<Lines>,
    interrupt: PromptInterrupt,
}

impl ConsolePrompt<io::BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(io::BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send + 'static> ConsolePrompt<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Some(input),
            lines: None,
            interrupt: PromptInterrupt::default(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: PromptInterrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn start_reader(&mut self) {
        if self.lines.is_some() {
            return;
        }
        let Some(input) = self.input.take() else {
            return;
        };
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_lines(input, tx));
        self.lines = Some(rx);
    }

    /// Next line, or `None` on end of input, read failure or interrupt.
    fn read_line(&mut self) -> Option<String> {
        self.start_reader();
        let lines = self.lines.as_ref()?;
        loop {
            if self.interrupt.take_cancelled() {
                tracing::debug!("prompt interrupted");
                return None;
            }
            match lines.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(line)) => return Some(line),
                Ok(Err(err)) => {
                    tracing::warn!(%err, "failed to read operator input");
                    return None;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn converse(&mut self) -> PasteOutcome {
        ask("\nAfter viewing the diagram, would you like to paste base64 data? (y/n): ");
        let Some(answer) = self.read_line() else {
            return PasteOutcome::Cancelled;
        };
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            return PasteOutcome::Declined;
        }

        println!("\nPaste the base64 data and press Enter:");
        let Some(data) = self.read_line() else {
            return PasteOutcome::Cancelled;
        };
        decode_paste(&data)
    }
}

fn forward_lines<R: BufRead>(mut input: R, tx: Sender<io::Result<String>>) {
    loop {
        let mut line = String::new();
        let read = match input.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => Ok(line),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => Err(err),
        };
        let failed = read.is_err();
        if tx.send(read).is_err() || failed {
            return;
        }
    }
}

fn ask(question: &str) {
    print!("{question}");
    let _ = io::stdout().flush();
}

impl<R: BufRead + Send + 'static> PasteSource for ConsolePrompt<R> {
    fn request_paste(&mut self) -> PasteOutcome {
        self.interrupt.arm();
        let outcome = self.converse();
        self.interrupt.disarm();
        outcome
    }
}

/// Decodes standard-alphabet base64, ignoring any whitespace the terminal inserted.
pub fn decode_paste(data: &str) -> PasteOutcome {
    let compact: String = data.split_whitespace().collect();
    if compact.is_empty() {
        return PasteOutcome::Empty;
    }
    match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => PasteOutcome::Decoded(bytes),
        Err(err) => PasteOutcome::Invalid(err),
    }
}

/// Cheap sniff for SVG markup at the start of a pasted payload.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SVG: &str = r#"<?xml version="1.0" standalone="no"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;

    fn encoded() -> String {
        base64::engine::general_purpose::STANDARD.encode(SVG)
    }

    #[test]
    fn yes_then_data_decodes() {
        let input = format!("Yes\n{}\n", encoded());
        let mut prompt = ConsolePrompt::new(Cursor::new(input));
        match prompt.request_paste() {
            PasteOutcome::Decoded(bytes) => assert_eq!(bytes, SVG.as_bytes()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn anything_but_yes_declines() {
        let mut prompt = ConsolePrompt::new(Cursor::new("n\n"));
        assert!(matches!(prompt.request_paste(), PasteOutcome::Declined));

        let mut prompt = ConsolePrompt::new(Cursor::new("\n"));
        assert!(matches!(prompt.request_paste(), PasteOutcome::Declined));
    }

    #[test]
    fn end_of_input_cancels() {
        let mut prompt = ConsolePrompt::new(Cursor::new(""));
        assert!(matches!(prompt.request_paste(), PasteOutcome::Cancelled));

        let mut prompt = ConsolePrompt::new(Cursor::new("y\n"));
        assert!(matches!(prompt.request_paste(), PasteOutcome::Cancelled));
    }

    struct Held(mpsc::Receiver<Vec<u8>>);

    impl io::Read for Held {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let Ok(chunk) = self.0.recv() else {
                return Ok(0);
            };
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }
    }

    #[test]
    fn interrupt_cancels_a_waiting_prompt() {
        let interrupt = PromptInterrupt::new();
        assert!(!interrupt.interrupt(), "nothing is waiting yet");

        let (_keep_open, rx) = mpsc::channel();
        let mut prompt =
            ConsolePrompt::new(io::BufReader::new(Held(rx))).with_interrupt(interrupt.clone());
        let signaller = {
            let interrupt = interrupt.clone();
            thread::spawn(move || {
                while !interrupt.interrupt() {
                    thread::sleep(Duration::from_millis(10));
                }
            })
        };

        assert!(matches!(prompt.request_paste(), PasteOutcome::Cancelled));
        signaller.join().expect("signaller");
        assert!(!interrupt.interrupt(), "prompt is disarmed afterwards");
    }

    #[test]
    fn input_after_an_interrupt_reaches_the_next_prompt() {
        let interrupt = PromptInterrupt::new();
        let (tx, rx) = mpsc::channel();
        let mut prompt =
            ConsolePrompt::new(io::BufReader::new(Held(rx))).with_interrupt(interrupt.clone());
        let signaller = {
            let interrupt = interrupt.clone();
            thread::spawn(move || {
                while !interrupt.interrupt() {
                    thread::sleep(Duration::from_millis(10));
                }
            })
        };
        assert!(matches!(prompt.request_paste(), PasteOutcome::Cancelled));
        signaller.join().expect("signaller");

        tx.send(b"n\n".to_vec()).expect("send");
        assert!(matches!(prompt.request_paste(), PasteOutcome::Declined));
    }

    #[test]
    fn blank_paste_is_empty() {
        let mut prompt = ConsolePrompt::new(Cursor::new("y\n   \n"));
        assert!(matches!(prompt.request_paste(), PasteOutcome::Empty));
    }

    #[test]
    fn wrapped_paste_is_joined() {
        let data = encoded();
        let (a, b) = data.split_at(data.len() / 2);
        match decode_paste(&format!("  {a}\t{b} ")) {
            PasteOutcome::Decoded(bytes) => assert_eq!(bytes, SVG.as_bytes()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(decode_paste("not*base64!"), PasteOutcome::Invalid(_)));
    }

    #[test]
    fn svg_sniffing() {
        assert!(looks_like_svg(SVG.as_bytes()));
        assert!(looks_like_svg(b"\n  <svg></svg>"));
        assert!(!looks_like_svg(b"\x89PNG\r\n\x1a\n"));
        assert!(!looks_like_svg(b"hello"));
    }
}
