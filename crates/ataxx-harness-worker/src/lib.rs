//! The `Worker`: owns a subprocess, its Line Pumps, and its Script, and
//! runs the script-interpreter protocol described in the harness spec.

mod dispatch;
mod interpreter;
mod worker;

pub use dispatch::{parse_command, Command, EndPattern};
pub use worker::{connect, Worker, WorkerReport};
