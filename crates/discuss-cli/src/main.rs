//! discuss - threaded comment engine CLI
//!
//! ## Quick Start
//!
//! ```bash
//! # Initialize in the current directory
//! discuss init
//!
//! # Start a thread and reply to it
//! discuss post --post blog-42 --creator alice "Nice write-up"
//! discuss post --post blog-42 --creator bob --parent <COMMENT_ID> "Agreed"
//!
//! # Vote and read the discussion
//! discuss vote up <COMMENT_ID> --identity carol
//! discuss tree --post blog-42
//! ```

mod commands;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
