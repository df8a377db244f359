use std::{
    fmt,
    io::{self, IsTerminal, Write},
    sync::Arc,
};

use parking_lot::Mutex;


#[derive(Debug)]
enum ConsoleTarget {
    Stderr,
    Stdout,
    Buffer(Vec<u8>),
}


/// Shared handle to the stream console records are written to.
///
/// Clones refer to the same stream. Output is colored only when the stream is a terminal.
#[derive(Clone)]
pub struct Console {
    target: Arc<Mutex<ConsoleTarget>>,
    colored: bool,
}

impl Console {
    pub fn stderr() -> Self {
        Self {
            target: Arc::new(Mutex::new(ConsoleTarget::Stderr)),
            colored: io::stderr().is_terminal(),
        }
    }

    pub fn stdout() -> Self {
        Self {
            target: Arc::new(Mutex::new(ConsoleTarget::Stdout)),
            colored: io::stdout().is_terminal(),
        }
    }

    /// An in-memory console, mostly useful for inspecting output in tests.
    pub fn buffer() -> Self {
        Self {
            target: Arc::new(Mutex::new(ConsoleTarget::Buffer(Vec::new()))),
            colored: false,
        }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// Everything written so far, for buffered consoles.
    pub fn contents(&self) -> Option<String> {
        match &*self.target.lock() {
            ConsoleTarget::Buffer(buffer) => Some(String::from_utf8_lossy(buffer).to_string()),
            _ => None,
        }
    }

    /// Whether `other` writes to the same stream.
    pub fn same_as(&self, other: &Console) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }

    pub(crate) fn write_line(&self, line: &str) -> io::Result<()> {
        let mut target = self.target.lock();

        match &mut *target {
            ConsoleTarget::Stderr => {
                let mut stderr = io::stderr().lock();
                writeln!(stderr, "{line}")
            }
            ConsoleTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{line}")?;
                stdout.flush()
            }
            ConsoleTarget::Buffer(buffer) => writeln!(buffer, "{line}"),
        }
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &*self.target.lock() {
            ConsoleTarget::Stderr => "stderr",
            ConsoleTarget::Stdout => "stdout",
            ConsoleTarget::Buffer(_) => "buffer",
        };

        f.debug_struct("Console")
            .field("target", &target)
            .field("colored", &self.colored)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_console_collects_lines() {
        let console = Console::buffer();
        let clone = console.clone();

        clone.write_line("first").unwrap();
        console.write_line("second").unwrap();

        assert_eq!(console.contents().as_deref(), Some("first\nsecond\n"));
        assert!(console.same_as(&clone));
        assert!(!console.same_as(&Console::buffer()));
        assert!(Console::stderr().contents().is_none());
    }
}
