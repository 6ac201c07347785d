//! Fuzz target for the protocol line parser.
//!
//! Feeds arbitrary bytes through UTF-8 decoding, line parsing and, when the
//! line is a MODE, the mode decoder. None of it may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::event::EventKind;
use slirc_client::line::parse_line;
use slirc_client::mode;
use slirc_client::state::Server;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8191 {
        return;
    }

    let server = Server::new("irc.example.net", 6667, "bot", false);
    server.set_actual_nick("bot");

    if let Ok(event) = parse_line(&server, data) {
        let _ = event.to_string();
        if matches!(event.kind, EventKind::Mode | EventKind::UserMode) {
            if let Some((modes, args)) = event.args.split_first() {
                let _ = mode::decode(modes, args);
            }
        }
    }
});
