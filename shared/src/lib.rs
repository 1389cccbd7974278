pub mod messages;

pub use messages::{ClientMsg, LobbyInfo, Role, ServerMsg};
