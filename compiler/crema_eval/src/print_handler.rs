//! Configurable destination for `print` output.
//!
//! Enum dispatch over the two destinations: stdout for normal runs,
//! an in-memory buffer for tests and embedders that capture output.
//! The interpreter is single-threaded, so the buffer is a `RefCell`.

use std::cell::RefCell;

pub enum PrintHandler {
    Stdout,
    Buffer(RefCell<String>),
}

impl PrintHandler {
    /// A handler that captures output instead of writing it.
    pub fn buffer() -> Self {
        PrintHandler::Buffer(RefCell::new(String::new()))
    }

    /// Write one line of program output.
    pub fn println(&self, msg: &str) {
        match self {
            PrintHandler::Stdout => println!("{msg}"),
            PrintHandler::Buffer(buf) => {
                let mut buf = buf.borrow_mut();
                buf.push_str(msg);
                buf.push('\n');
            }
        }
    }

    /// Captured output so far; empty for stdout.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Stdout => String::new(),
            PrintHandler::Buffer(buf) => buf.borrow().clone(),
        }
    }

    pub fn clear(&self) {
        if let PrintHandler::Buffer(buf) = self {
            buf.borrow_mut().clear();
        }
    }
}

impl Default for PrintHandler {
    fn default() -> Self {
        PrintHandler::Stdout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_captures_lines() {
        let handler = PrintHandler::buffer();
        handler.println("a");
        handler.println("b");
        assert_eq!(handler.output(), "a\nb\n");
    }

    #[test]
    fn clear_empties_the_buffer() {
        let handler = PrintHandler::buffer();
        handler.println("x");
        handler.clear();
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn stdout_reports_no_captured_output() {
        assert_eq!(PrintHandler::Stdout.output(), "");
    }
}
