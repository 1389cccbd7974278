//! Client-server messaging protocol for the lobby relay.
//!
//! Messages are JSON objects tagged by a top-level `type` field; routing
//! fields (`lobbyId`) sit beside the tag rather than under a `data`
//! envelope, so the enums are internally tagged. Game payloads
//! (`playerList`, `mapData`, `turn`, `globalPlayer`) are opaque to the
//! relay and kept as raw JSON values.

use serde::{Deserialize, Serialize};

/// Messages that clients send to the relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Enter a lobby, creating it if it does not exist yet.
    #[serde(rename = "join", rename_all = "camelCase")]
    Join {
        lobby_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_name: Option<String>,
    },
    /// Ask the lobby's main to produce the current roster.
    #[serde(rename = "request-players", rename_all = "camelCase")]
    RequestPlayers { lobby_id: String },
    /// Roster produced by the main, relayed to the whole lobby.
    #[serde(rename = "player-list-response", rename_all = "camelCase")]
    PlayerListResponse {
        lobby_id: String,
        player_list: serde_json::Value,
    },
    /// Turn advancement, relayed to the whole lobby.
    #[serde(rename = "next-turn", rename_all = "camelCase")]
    NextTurn {
        lobby_id: String,
        turn: serde_json::Value,
        global_player: serde_json::Value,
    },
    /// Authoritative map payload from the main, relayed to the whole lobby.
    #[serde(rename = "map-data", rename_all = "camelCase")]
    MapData {
        lobby_id: String,
        map_data: serde_json::Value,
    },
    /// Ask the lobby's main to produce map data.
    #[serde(rename = "map-request", rename_all = "camelCase")]
    MapRequest { lobby_id: String },
    /// Any unrecognized `type` tag. Ignored by the router.
    #[serde(other)]
    Unknown,
}

/// Role assigned to a session within its lobby.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "client")]
    Client,
}

/// Lobby snapshot included in the join reply.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LobbyInfo {
    pub lobby_id: String,
    /// Display names in join order.
    pub players: Vec<String>,
}

/// Messages the relay sends to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMsg {
    /// Role assignment: the synchronous join reply (with position and
    /// lobby snapshot) and the promotion notice (role only).
    #[serde(rename = "role", rename_all = "camelCase")]
    Role {
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lobby_info: Option<LobbyInfo>,
    },
    /// Sent to the main when a member asked for the roster.
    #[serde(rename = "player-list-request")]
    PlayerListRequest,
    /// Sent to the main when a member asked for map data.
    #[serde(rename = "request-map")]
    RequestMap,
    /// Roster relayed from the main to every member.
    #[serde(rename = "player-list-response", rename_all = "camelCase")]
    PlayerListResponse {
        lobby_id: String,
        player_list: serde_json::Value,
    },
    /// Turn advancement relayed to every member.
    #[serde(rename = "next-turn", rename_all = "camelCase")]
    NextTurn {
        lobby_id: String,
        turn: serde_json::Value,
        global_player: serde_json::Value,
    },
    /// Map payload relayed to every member.
    #[serde(rename = "map-data", rename_all = "camelCase")]
    MapData {
        lobby_id: String,
        map_data: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_decodes_with_and_without_player_name() {
        let m: ClientMsg =
            serde_json::from_str(r#"{"type":"join","lobbyId":"x","playerName":"Ann"}"#).unwrap();
        match m {
            ClientMsg::Join {
                lobby_id,
                player_name,
            } => {
                assert_eq!(lobby_id, "x");
                assert_eq!(player_name.as_deref(), Some("Ann"));
            }
            other => panic!("expected join, got {:?}", other),
        }

        let m: ClientMsg = serde_json::from_str(r#"{"type":"join","lobbyId":"x"}"#).unwrap();
        assert!(matches!(
            m,
            ClientMsg::Join {
                player_name: None,
                ..
            }
        ));
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let m: ClientMsg =
            serde_json::from_str(r#"{"type":"chat","lobbyId":"x","text":"hi"}"#).unwrap();
        assert!(matches!(m, ClientMsg::Unknown));
    }

    #[test]
    fn relay_payloads_survive_round_trip_structurally() {
        let raw = r#"{"type":"map-data","lobbyId":"x","mapData":{"tiles":[1,2,3],"w":2}}"#;
        let m: ClientMsg = serde_json::from_str(raw).unwrap();
        let (lobby_id, map_data) = match m {
            ClientMsg::MapData { lobby_id, map_data } => (lobby_id, map_data),
            other => panic!("expected map-data, got {:?}", other),
        };
        let out = serde_json::to_value(ServerMsg::MapData { lobby_id, map_data }).unwrap();
        let original: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn role_reply_serializes_with_wire_names() {
        let msg = ServerMsg::Role {
            role: Role::Main,
            number: Some(1),
            lobby_info: Some(LobbyInfo {
                lobby_id: "x".into(),
                players: vec!["Ann".into()],
            }),
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "role");
        assert_eq!(v["role"], "main");
        assert_eq!(v["number"], 1);
        assert_eq!(v["lobbyInfo"]["lobbyId"], "x");
    }

    #[test]
    fn promotion_notice_omits_optional_fields() {
        let msg = ServerMsg::Role {
            role: Role::Main,
            number: None,
            lobby_info: None,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, serde_json::json!({"type":"role","role":"main"}));
    }
}
