//! Subprocess spawning and the Line Pump tasks that connect a child
//! process's stdio to bounded channels of [`ataxx_harness_core::Item`].

pub mod pump;
pub mod spawn;

pub use pump::{spawn_reader_pump, spawn_writer_pump};
pub use spawn::{force_kill, spawn_player};
