pub mod http;
pub mod registry;
pub mod router;
pub mod run;
pub mod state;
pub mod ws;

// Export commonly used types and functions
pub use registry::{Registry, RegistryError, Session, SessionId};
pub use router::{handle_client_msg, handle_disconnect};
pub use run::run_server;
pub use state::AppState;
