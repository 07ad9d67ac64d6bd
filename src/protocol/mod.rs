//! Tic-tac-toe wire protocol
//!
//! Line-based text protocol: clients send cell indices, the server answers
//! with the messages in `responses`.

pub mod codec;
pub mod commands;
pub mod responses;

pub use codec::{ClientLine, MoveLineCodec};
pub use commands::parse_move;
pub use responses::{ServerMessage, greeting, move_notices};
