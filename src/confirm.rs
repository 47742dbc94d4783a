use std::io::{BufRead, Write};
use tracing::debug;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Decline,
}

/// Asks the operator whether a bucket may be emptied and removed.
pub trait Confirm {
    fn confirm(&mut self, container: &str) -> Decision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    AskProceed,
    AskConfirm,
    Run,
    Abort,
}

/// Two-question dialogue over a line-based input and an output.
/// Both questions need a `y` (or `Y`) before a bucket is touched.
pub struct ConsoleGate<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Print the question and read one line. End of input and read errors count as a "no".
    fn ask(&mut self, question: &str) -> bool {
        if write!(self.output, "{question} (y/n): ").and_then(|_| self.output.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        // blocking read on purpose: no deletes run while the operator is asked
        match self.input.read_line(&mut answer) {
            Ok(0) => {
                // keep the next output on its own line
                let _ = writeln!(self.output);
                false
            }
            Ok(_) => is_yes(&answer),
            Err(err) => {
                debug!("reading answer failed: {err}");
                false
            }
        }
    }
}

impl<R: BufRead, W: Write> Confirm for ConsoleGate<R, W> {
    fn confirm(&mut self, container: &str) -> Decision {
        let mut state = GateState::AskProceed;
        loop {
            state = match state {
                GateState::AskProceed => match self.ask("Do you want to empty and delete this bucket?") {
                    true => GateState::AskConfirm,
                    false => GateState::Abort,
                },
                GateState::AskConfirm => {
                    let question = format!("Are you sure you want to delete bucket {container} and all its contents?");
                    match self.ask(&question) {
                        true => GateState::Run,
                        false => GateState::Abort,
                    }
                }
                GateState::Run => return Decision::Proceed,
                GateState::Abort => return Decision::Decline,
            };
        }
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    fn gate(input: &str) -> ConsoleGate<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleGate::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(gate: ConsoleGate<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        let (_, out) = gate.into_inner();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_two_yes_answers_proceed() {
        let mut g = gate("y\nY\n");
        assert_eq!(g.confirm("logs"), Decision::Proceed);

        let out = output(g);
        assert_eq!(out.matches("Do you want to empty and delete this bucket?").count(), 1);
        assert_eq!(out.matches("delete bucket logs and all its contents?").count(), 1);
    }

    #[test]
    fn test_first_no_skips_second_question() {
        let mut g = gate("n\ny\n");
        assert_eq!(g.confirm("logs"), Decision::Decline);

        let out = output(g);
        assert!(!out.contains("Are you sure"));
    }

    #[test]
    fn test_second_no_declines() {
        let mut g = gate("y\nn\n");
        assert_eq!(g.confirm("logs"), Decision::Decline);
    }

    #[test]
    fn test_only_y_is_affirmative() {
        for answer in ["", " ", "yes", "n", "x", "yy"] {
            let mut g = gate(&format!("{answer}\ny\n"));
            assert_eq!(g.confirm("b"), Decision::Decline, "answer {answer:?}");
        }
        let mut g = gate(" y \r\n\ty\n");
        assert_eq!(g.confirm("b"), Decision::Proceed);
    }

    #[test]
    fn test_end_of_input_declines() {
        let mut g = gate("y\n");
        assert_eq!(g.confirm("b"), Decision::Decline);
        let mut g = gate("");
        assert_eq!(g.confirm("b"), Decision::Decline);
    }

    #[test]
    fn test_no_memory_across_buckets() {
        let mut g = gate("n\ny\ny\n");
        assert_eq!(g.confirm("first"), Decision::Decline);
        assert_eq!(g.confirm("second"), Decision::Proceed);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "terminal gone"))
        }
    }

    #[test]
    fn test_read_error_declines() {
        let mut g = ConsoleGate::new(io::BufReader::new(FailingReader), Vec::new());
        assert_eq!(g.confirm("b"), Decision::Decline);
    }
}
