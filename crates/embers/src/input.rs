//! Handle all the raw input directly from the end user.
//!
//! The renderer puts the user's terminal into raw mode, so `Ctrl-C` arrives here as a plain
//! byte on STDIN rather than as a signal.

use std::io::Read as _;

use color_eyre::eyre::Result;

/// The bytes that end the application: `Ctrl-C`, `Esc` and `q`.
const QUIT_BYTES: [u8; 3] = [0x03, 0x1b, b'q'];

/// Handle input from the user
pub(crate) struct Input;

impl Input {
    /// Start listening on STDIN in its own thread, because reading STDIN blocks.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        std::thread::spawn(move || Self::consume_stdin(&protocol_tx))
    }

    /// Watch the application's STDIN for a quit key.
    fn consume_stdin(
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        tracing::debug!("Starting to listen on STDIN");

        let stdin = std::io::stdin();
        let mut reader = std::io::BufReader::new(stdin);

        loop {
            let mut buffer = [0u8; 128];
            let bytes_read = reader.read(&mut buffer[..])?;
            if Self::is_quit(buffer.get(..bytes_read).unwrap_or_default()) {
                tracing::debug!("Quit key pressed");
                crate::run::broadcast_protocol_end(protocol_tx);
                return Ok(());
            }
        }
    }

    /// Whether any of the received bytes is a quit key.
    fn is_quit(bytes: &[u8]) -> bool {
        bytes.iter().any(|byte| QUIT_BYTES.contains(byte))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quit_bytes_are_recognised() {
        assert!(Input::is_quit(b"q"));
        assert!(Input::is_quit(&[0x03]));
        assert!(Input::is_quit(&[0x1b]));
        assert!(Input::is_quit(b"xyq"));
        assert!(!Input::is_quit(b"xyz"));
        assert!(!Input::is_quit(&[]));
    }
}
