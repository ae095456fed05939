//! Pairing and heartbeat state machine
//!
//! A player moves through `absent → unpaired → online ⇄ offline`. The
//! transition table in [`transition`] is total over those states; the
//! service applies the chosen action with one conditional repository
//! write and re-reads the player if the write no longer matches.

use chrono::Utc;

use crate::{
    models::{
        HeartbeatRequest, HeartbeatResponse, PairPlayerRequest, Player, PlayerStatus,
    },
    repository::Repositories,
    service::resolver,
    Error, Result,
};

/// How often a heartbeat re-reads the player after losing a race
const MAX_TRANSITION_ATTEMPTS: usize = 4;

/// What a heartbeat does for the player's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction<'a> {
    /// Nothing to store; the device must (re-)enter pairing
    ReplyUnpaired,
    /// Paired already; tell the device to stop sending its code
    ReplyPairedWaiting,
    /// First contact of a pairing device
    CreateUnpaired(&'a str),
    /// Still waiting for the operator; keep the latest code
    RefreshPairing(&'a str),
    /// Normal operating heartbeat
    MarkOnline,
}

/// The heartbeat transition table.
///
/// Any existing player sending a codeless heartbeat is brought online,
/// whatever state it was in.
#[must_use]
pub fn transition<'a>(
    current: Option<&Player>,
    pairing_code: Option<&'a str>,
) -> HeartbeatAction<'a> {
    match (current.map(|p| p.status), pairing_code) {
        (None, Some(code)) => HeartbeatAction::CreateUnpaired(code),
        (None, None) => HeartbeatAction::ReplyUnpaired,
        (Some(PlayerStatus::Unpaired), Some(code)) => HeartbeatAction::RefreshPairing(code),
        (Some(PlayerStatus::Online | PlayerStatus::Offline), Some(_)) => {
            HeartbeatAction::ReplyPairedWaiting
        }
        (Some(_), None) => HeartbeatAction::MarkOnline,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Device heartbeats and operator pairing confirmation
#[derive(Clone)]
pub struct PairingService {
    repos: Repositories,
    base_url: String,
}

impl std::fmt::Debug for PairingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingService")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PairingService {
    #[must_use]
    pub const fn new(repos: Repositories, base_url: String) -> Self {
        Self { repos, base_url }
    }

    /// Handle one device heartbeat.
    ///
    /// Every branch that touches the player commits its write before the
    /// reply is built.
    pub async fn heartbeat(&self, request: &HeartbeatRequest) -> Result<HeartbeatResponse> {
        let device_id = non_empty(request.device_id.as_deref())
            .ok_or_else(|| Error::InvalidInput("deviceId is required".to_string()))?;
        let pairing_code = non_empty(request.pairing_code.as_deref());

        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let now = Utc::now();
            let current = self.repos.players.get_by_device(device_id).await?;

            match transition(current.as_ref(), pairing_code) {
                HeartbeatAction::ReplyUnpaired => return Ok(HeartbeatResponse::unpaired()),
                HeartbeatAction::ReplyPairedWaiting => {
                    return Ok(HeartbeatResponse::paired_waiting());
                }
                HeartbeatAction::CreateUnpaired(code) => {
                    let player = Player::new_unpaired(device_id, code, now);
                    if self.repos.players.create_unpaired(&player).await?.is_some() {
                        tracing::info!(
                            device_id = %device_id,
                            player_id = %player.id,
                            "Player registered for pairing"
                        );
                        return Ok(HeartbeatResponse::unpaired());
                    }
                }
                HeartbeatAction::RefreshPairing(code) => {
                    if self
                        .repos
                        .players
                        .refresh_pairing(device_id, code, now)
                        .await?
                        .is_some()
                    {
                        return Ok(HeartbeatResponse::unpaired());
                    }
                }
                HeartbeatAction::MarkOnline => {
                    if let Some(player) = self.repos.players.mark_online(device_id, now).await? {
                        let content =
                            resolver::load_assigned_content(&self.repos, &player.assigned_content)
                                .await?;
                        let manifest = resolver::resolve(content.as_ref(), &self.base_url);
                        return Ok(HeartbeatResponse::from_manifest(manifest));
                    }
                }
            }

            tracing::debug!(device_id = %device_id, "Player changed during heartbeat, re-reading");
        }

        Err(Error::Internal(format!(
            "Player state for device {device_id} kept changing during heartbeat"
        )))
    }

    /// Bind a pairing code to an operator-named player.
    ///
    /// Atomic against concurrent heartbeats and a second confirmation of the
    /// same code: exactly one caller wins, the rest get `NotFound`.
    pub async fn confirm_pairing(&self, request: &PairPlayerRequest) -> Result<Player> {
        let code = request.pairing_code.trim();
        if code.is_empty() {
            return Err(Error::InvalidInput("pairingCode is required".to_string()));
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name is required".to_string()));
        }
        let location = request
            .location
            .as_deref()
            .map(str::trim)
            .map(str::to_string);

        let player = self
            .repos
            .players
            .confirm_pairing(code, name, location, Utc::now())
            .await?
            .ok_or_else(|| {
                Error::NotFound("No unpaired player is waiting with that pairing code".to_string())
            })?;

        tracing::info!(
            player_id = %player.id,
            device_id = %player.device_id,
            name = %player.name,
            "Player paired"
        );
        Ok(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignedContent, HeartbeatStatus, MediaId};
    use crate::repository::MockPlayerRepository;
    use crate::test_helpers::image_media;
    use std::sync::Arc;

    const BASE: &str = "http://signage.local";

    fn service(repos: &Repositories) -> PairingService {
        PairingService::new(repos.clone(), BASE.to_string())
    }

    fn beat(device: &str, code: Option<&str>) -> HeartbeatRequest {
        HeartbeatRequest {
            device_id: Some(device.to_string()),
            pairing_code: code.map(str::to_string),
        }
    }

    fn pair(code: &str, name: &str) -> PairPlayerRequest {
        PairPlayerRequest {
            pairing_code: code.to_string(),
            name: name.to_string(),
            location: None,
        }
    }

    #[test]
    fn test_transition_table_is_total() {
        let now = Utc::now();
        let mut player = Player::new_unpaired("D1", "1", now);

        assert_eq!(transition(None, None), HeartbeatAction::ReplyUnpaired);
        assert_eq!(transition(None, Some("9")), HeartbeatAction::CreateUnpaired("9"));
        assert_eq!(transition(Some(&player), None), HeartbeatAction::MarkOnline);
        assert_eq!(transition(Some(&player), Some("9")), HeartbeatAction::RefreshPairing("9"));

        for status in [PlayerStatus::Online, PlayerStatus::Offline] {
            player.status = status;
            assert_eq!(transition(Some(&player), None), HeartbeatAction::MarkOnline);
            assert_eq!(transition(Some(&player), Some("9")), HeartbeatAction::ReplyPairedWaiting);
        }
    }

    #[tokio::test]
    async fn test_device_id_is_required() {
        let repos = Repositories::memory();
        let err = service(&repos).heartbeat(&beat("  ", None)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = service(&repos)
            .heartbeat(&HeartbeatRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_full_pairing_flow() {
        let repos = Repositories::memory();
        let svc = service(&repos);

        let reply = svc.heartbeat(&beat("D1", None)).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::unpaired());
        assert!(repos.players.get_by_device("D1").await.unwrap().is_none());

        let reply = svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::unpaired());
        let created = repos.players.get_by_device("D1").await.unwrap().unwrap();
        assert_eq!(created.status, PlayerStatus::Unpaired);
        assert_eq!(created.pairing_code.as_deref(), Some("123456"));

        let paired = svc.confirm_pairing(&pair("123456", "Lobby TV")).await.unwrap();
        assert_eq!(paired.status, PlayerStatus::Online);
        assert_eq!(paired.name, "Lobby TV");
        assert!(paired.pairing_code.is_none());

        let reply = svc.heartbeat(&beat("D1", None)).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::paired_waiting());

        // The device keeps sending its stale code: never re-enters pairing
        let reply = svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::paired_waiting());
        let player = repos.players.get_by_device("D1").await.unwrap().unwrap();
        assert_eq!(player.status, PlayerStatus::Online);
        assert!(player.pairing_code.is_none());

        let err = svc.confirm_pairing(&pair("123456", "Again")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_keeps_latest_code() {
        let repos = Repositories::memory();
        let svc = service(&repos);

        svc.heartbeat(&beat("D1", Some("111111"))).await.unwrap();
        svc.heartbeat(&beat("D1", Some("222222"))).await.unwrap();

        let player = repos.players.get_by_device("D1").await.unwrap().unwrap();
        assert_eq!(player.pairing_code.as_deref(), Some("222222"));
        assert!(svc.confirm_pairing(&pair("111111", "Old")).await.is_err());
        assert!(svc.confirm_pairing(&pair("222222", "New")).await.is_ok());
    }

    #[tokio::test]
    async fn test_codeless_heartbeat_brings_unpaired_player_online() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        svc.heartbeat(&beat("P1", Some("424242"))).await.unwrap();

        let reply = svc.heartbeat(&beat("P1", None)).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::paired_waiting());
        let player = repos.players.get_by_device("P1").await.unwrap().unwrap();
        assert_eq!(player.status, PlayerStatus::Online);
        assert!(player.pairing_code.is_none());

        // The code it held can no longer be confirmed
        let err = svc.confirm_pairing(&pair("424242", "Lobby")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_repeated_heartbeat_is_idempotent() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        svc.confirm_pairing(&pair("123456", "Lobby")).await.unwrap();

        svc.heartbeat(&beat("D1", None)).await.unwrap();
        let first = repos.players.get_by_device("D1").await.unwrap().unwrap();
        svc.heartbeat(&beat("D1", None)).await.unwrap();
        let second = repos.players.get_by_device("D1").await.unwrap().unwrap();

        assert_eq!(first.status, PlayerStatus::Online);
        assert_eq!(second.status, PlayerStatus::Online);
        assert!(second.last_heartbeat >= first.last_heartbeat);
        assert_eq!(Player { last_heartbeat: first.last_heartbeat, ..second }, first);
    }

    #[tokio::test]
    async fn test_offline_player_comes_back_online() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        svc.confirm_pairing(&pair("123456", "Lobby")).await.unwrap();
        repos
            .players
            .mark_offline_before(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();

        svc.heartbeat(&beat("D1", None)).await.unwrap();
        let player = repos.players.get_by_device("D1").await.unwrap().unwrap();
        assert_eq!(player.status, PlayerStatus::Online);
    }

    #[tokio::test]
    async fn test_assigned_media_is_played() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        let player = svc.confirm_pairing(&pair("123456", "Lobby")).await.unwrap();
        let media = repos.media.create(&image_media("x.png", 8.0)).await.unwrap();
        repos
            .players
            .set_assignment(&player.id, &AssignedContent::Media(media.id))
            .await
            .unwrap();

        let reply = svc.heartbeat(&beat("D1", None)).await.unwrap();
        assert_eq!(reply.status, HeartbeatStatus::Playing);
        let manifest = reply.playlist.unwrap();
        assert_eq!(manifest.items.len(), 1);
        assert_eq!(manifest.items[0].url, format!("{BASE}/uploads/x.png"));
        assert_eq!(manifest.items[0].duration, 8.0);
    }

    #[tokio::test]
    async fn test_assignment_to_deleted_media_waits() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        let player = svc.confirm_pairing(&pair("123456", "Lobby")).await.unwrap();
        repos
            .players
            .set_assignment(&player.id, &AssignedContent::Media(MediaId::from("deleted")))
            .await
            .unwrap();

        let reply = svc.heartbeat(&beat("D1", None)).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::paired_waiting());
    }

    #[tokio::test]
    async fn test_pairing_code_held_by_another_device_conflicts() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        svc.heartbeat(&beat("D1", Some("123456"))).await.unwrap();

        let err = svc.heartbeat(&beat("D2", Some("123456"))).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_confirm_requires_code_and_name() {
        let repos = Repositories::memory();
        let svc = service(&repos);
        assert!(matches!(
            svc.confirm_pairing(&pair("", "Lobby")).await.unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            svc.confirm_pairing(&pair("123456", " ")).await.unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_lost_race_is_retried() {
        let now = Utc::now();
        let mut paired = Player::new_unpaired("D1", "123456", now);
        paired.status = PlayerStatus::Online;
        paired.pairing_code = None;

        let mut players = MockPlayerRepository::new();
        // First read sees nothing, insert loses to a concurrent heartbeat,
        // second read sees the player the operator already paired
        let mut reads = vec![Some(paired), None];
        players
            .expect_get_by_device()
            .times(2)
            .returning(move |_| Ok(reads.pop().flatten()));
        players.expect_create_unpaired().times(1).returning(|_| Ok(None));

        let mut repos = Repositories::memory();
        repos.players = Arc::new(players);

        let reply = service(&repos).heartbeat(&beat("D1", Some("123456"))).await.unwrap();
        assert_eq!(reply, HeartbeatResponse::paired_waiting());
    }

    #[tokio::test]
    async fn test_backend_failure_is_surfaced() {
        let mut players = MockPlayerRepository::new();
        players
            .expect_get_by_device()
            .returning(|_| Err(Error::Internal("connection reset".to_string())));

        let mut repos = Repositories::memory();
        repos.players = Arc::new(players);

        let err = service(&repos).heartbeat(&beat("D1", None)).await.unwrap_err();
        assert!(err.is_backend());
    }
}
