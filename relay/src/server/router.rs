//! Message router: dispatches decoded client messages, maintains lobby
//! membership, and applies the authority-election rule.
//!
//! Locking discipline: take the registry lock, mutate membership and
//! snapshot the recipient sinks, release the lock, then send. Sends are
//! non-blocking pushes into per-session queues, so a slow socket never
//! stalls routing for the rest of a lobby. A push to a gone session is
//! skipped, never an error.

use relay_shared::{ClientMsg, LobbyInfo, Role, ServerMsg};

use crate::server::registry::{OutboundSink, Registry, SessionId};
use crate::server::state::AppState;

/// Display name used when a join payload carries none.
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";

/// Handle one decoded message from `session_id`. Transport-agnostic; the
/// ws adapter calls this for every frame that parses.
pub async fn handle_client_msg(state: &AppState, session_id: SessionId, msg: ClientMsg) {
    match msg {
        ClientMsg::Join {
            lobby_id,
            player_name,
        } => handle_join(state, session_id, lobby_id, player_name).await,
        ClientMsg::RequestPlayers { lobby_id } => {
            send_to_main(state, session_id, &lobby_id, ServerMsg::PlayerListRequest).await
        }
        ClientMsg::MapRequest { lobby_id } => {
            send_to_main(state, session_id, &lobby_id, ServerMsg::RequestMap).await
        }
        ClientMsg::PlayerListResponse {
            lobby_id,
            player_list,
        } => {
            let out = ServerMsg::PlayerListResponse {
                lobby_id: lobby_id.clone(),
                player_list,
            };
            relay_to_lobby(state, session_id, &lobby_id, out).await
        }
        ClientMsg::NextTurn {
            lobby_id,
            turn,
            global_player,
        } => {
            let out = ServerMsg::NextTurn {
                lobby_id: lobby_id.clone(),
                turn,
                global_player,
            };
            relay_to_lobby(state, session_id, &lobby_id, out).await
        }
        ClientMsg::MapData { lobby_id, map_data } => {
            let out = ServerMsg::MapData {
                lobby_id: lobby_id.clone(),
                map_data,
            };
            relay_to_lobby(state, session_id, &lobby_id, out).await
        }
        ClientMsg::Unknown => {
            tracing::debug!(session = %session_id, "ignoring message with unknown type tag");
        }
    }
}

/// Transport-reported close. Removes membership, runs election if the
/// departing session was main, and drops the session record. Safe to
/// call for sessions that never joined or were already removed.
pub async fn handle_disconnect(state: &AppState, session_id: SessionId) {
    let promoted = {
        let mut reg = state.registry.write().await;
        let mut promoted: Option<(SessionId, OutboundSink)> = None;
        if let Some(dep) = reg.remove_member(session_id) {
            if dep.was_main {
                if let Some(next) = dep.remaining.first().copied() {
                    if let Some(survivor) = reg.session_mut(next) {
                        survivor.is_main = true;
                        promoted = Some((next, survivor.sink.clone()));
                    }
                }
            }
            tracing::info!(
                session = %session_id,
                lobby = %dep.lobby_id,
                lobby_deleted = dep.lobby_deleted,
                "session left lobby"
            );
        }
        reg.disconnect(session_id);
        promoted
    };

    if let Some((next, sink)) = promoted {
        let _ = sink.send(ServerMsg::Role {
            role: Role::Main,
            number: None,
            lobby_info: None,
        });
        tracing::info!(session = %next, "promoted to main");
    }
}

async fn handle_join(
    state: &AppState,
    session_id: SessionId,
    lobby_id: String,
    player_name: Option<String>,
) {
    let reply = {
        let mut reg = state.registry.write().await;
        match reg.session(session_id) {
            None => return,
            Some(s) if s.lobby.is_some() => {
                tracing::warn!(session = %session_id, "ignoring join from already-joined session");
                return;
            }
            Some(_) => {}
        }

        let position = reg.add_member(&lobby_id, session_id);
        let is_main = position == 1;
        let name = player_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());
        if let Some(session) = reg.session_mut(session_id) {
            session.lobby = Some(lobby_id.clone());
            session.player_name = name.clone();
            session.is_main = is_main;
        }

        tracing::info!(
            session = %session_id,
            lobby = %lobby_id,
            player = %name,
            position,
            main = is_main,
            "session joined lobby"
        );

        let info = LobbyInfo {
            lobby_id: lobby_id.clone(),
            players: reg.member_names(&lobby_id),
        };
        reg.session(session_id).map(|s| {
            (
                s.sink.clone(),
                ServerMsg::Role {
                    role: if is_main { Role::Main } else { Role::Client },
                    number: Some(position),
                    lobby_info: Some(info),
                },
            )
        })
    };

    if let Some((sink, msg)) = reply {
        if sink.send(msg).is_err() {
            tracing::debug!(session = %session_id, "join reply dropped, transport gone");
        }
    }
}

/// Forward `msg` to every member of `lobby_id`. Senders that have not
/// joined any lobby yet are ignored; an unknown lobby relays to no one.
async fn relay_to_lobby(state: &AppState, sender: SessionId, lobby_id: &str, msg: ServerMsg) {
    let sinks = {
        let reg = state.registry.read().await;
        if !sender_joined(&reg, sender) {
            return;
        }
        let members = reg.members_of(lobby_id);
        reg.sinks_for(&members)
    };

    for sink in sinks {
        if sink.send(msg.clone()).is_err() {
            tracing::debug!(lobby = %lobby_id, "skipping recipient with closed transport");
        }
    }
}

/// Forward `msg` to the lobby's main only. No main (unknown or empty
/// lobby) drops the request, not an error.
async fn send_to_main(state: &AppState, sender: SessionId, lobby_id: &str, msg: ServerMsg) {
    let sink = {
        let reg = state.registry.read().await;
        if !sender_joined(&reg, sender) {
            return;
        }
        reg.main_of(lobby_id)
            .and_then(|id| reg.session(id))
            .map(|s| s.sink.clone())
    };

    match sink {
        Some(sink) => {
            if sink.send(msg).is_err() {
                tracing::debug!(lobby = %lobby_id, "main unreachable, dropping request");
            }
        }
        None => tracing::debug!(lobby = %lobby_id, "no main for lobby, dropping request"),
    }
}

/// Messages from sessions still in the pre-join state are silently
/// ignored; no lobby context exists for them yet.
fn sender_joined(reg: &Registry, sender: SessionId) -> bool {
    reg.session(sender).map(|s| s.lobby.is_some()).unwrap_or(false)
}
