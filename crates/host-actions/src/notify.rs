//! Host notifications pushed to the bot.
//!
//! The relay watches the host event stream and publishes one
//! fire-and-forget [`Notification`] per interesting event. Notifications
//! carry an `action` tag and no `type`, so routers sharing the channel
//! ignore them.

use crate::handlers::description;
use crate::{Entity, EntityKind, HostEvent, HostResult, HostStore};
use relay_protocol_types::{Notification, NotificationKind};
use relay_router::{RouterResult, Transport};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Publishes host events as notifications on the relay channel.
#[derive(Clone)]
pub struct NotificationRelay {
    host: Arc<dyn HostStore>,
    transport: Arc<dyn Transport>,
    channel: String,
    /// Bot-side channel ID stamped on every notification as `channelId`.
    notification_channel: Option<String>,
    shutdown_tx: broadcast::Sender<()>,
}

impl NotificationRelay {
    pub fn new(
        host: Arc<dyn HostStore>,
        transport: Arc<dyn Transport>,
        channel: impl Into<String>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            host,
            transport,
            channel: channel.into(),
            notification_channel: None,
            shutdown_tx,
        }
    }

    /// Stamp notifications with a bot-side channel ID. Empty IDs are ignored.
    pub fn with_notification_channel(mut self, channel_id: Option<String>) -> Self {
        self.notification_channel = channel_id.filter(|id| !id.is_empty());
        self
    }

    /// Notification for a host event, if the bot cares about it.
    pub async fn notification_for(&self, event: &HostEvent) -> HostResult<Option<Notification>> {
        let notification = match event {
            HostEvent::EntityUpdated(entity) => match entity.kind {
                EntityKind::Actor => Some(Notification::new(
                    NotificationKind::ActorUpdated,
                    json!({ "actorId": entity.id, "actorData": entity }),
                )),
                EntityKind::Combat => {
                    let combatants = self.combatants(entity).await?;
                    Some(Notification::new(
                        NotificationKind::CombatUpdated,
                        json!({ "combatId": entity.id, "combatants": combatants }),
                    ))
                }
                _ => None,
            },
            HostEvent::EmbeddedCreated(item) if item.kind == EntityKind::Item => {
                Some(Notification::new(
                    NotificationKind::ItemAdded,
                    json!({ "actorId": item.parent, "itemData": item }),
                ))
            }
            HostEvent::EmbeddedDeleted(item) if item.kind == EntityKind::Item => {
                Some(Notification::new(
                    NotificationKind::ItemRemoved,
                    json!({ "actorId": item.parent, "itemId": item.id }),
                ))
            }
            HostEvent::EmbeddedCreated(_) | HostEvent::EmbeddedDeleted(_) => None,
            HostEvent::CombatTurn { combatant, .. } => Some(Notification::new(
                NotificationKind::TurnNotification,
                json!({ "combatantName": combatant.name, "combatantId": combatant.id }),
            )),
            HostEvent::ChatMessage { content, .. } => Some(Notification::new(
                NotificationKind::ChatRelayToDiscord,
                json!({ "message": content }),
            )),
            HostEvent::ItemUsed { actor, item } => {
                let kind = if item.is_subtype("spell") {
                    Some(NotificationKind::SpellUsed)
                } else if item.is_subtype("feat") {
                    Some(NotificationKind::AbilityUsed)
                } else {
                    None
                };
                kind.map(|kind| {
                    Notification::new(
                        kind,
                        json!({
                            "casterName": actor.name,
                            "itemName": item.name,
                            "description": description(item),
                        }),
                    )
                })
            }
            HostEvent::RestCompleted { actor, long_rest } => {
                let kind = if *long_rest {
                    NotificationKind::LongRest
                } else {
                    NotificationKind::ShortRest
                };
                Some(Notification::new(
                    kind,
                    json!({ "actorId": actor.id, "actorName": actor.name }),
                ))
            }
        };
        Ok(notification)
    }

    async fn combatants(&self, combat: &Entity) -> HostResult<Vec<Value>> {
        let mut combatants = Vec::new();
        for combatant in combat.combatants() {
            let name = self
                .host
                .lookup_entity(&combatant.actor_id)
                .await?
                .map(|actor| actor.name)
                .unwrap_or_else(|| "Unknown".to_string());
            combatants.push(json!({
                "id": combatant.actor_id,
                "name": name,
                "initiative": combatant.initiative,
            }));
        }
        Ok(combatants)
    }

    /// Publish a notification on the relay channel.
    pub fn publish(&self, mut notification: Notification) -> RouterResult<()> {
        if let Some(channel_id) = &self.notification_channel {
            notification
                .fields
                .insert("channelId".to_string(), Value::String(channel_id.clone()));
        }
        let message = notification.to_value()?;
        self.transport.send(&self.channel, message)
    }

    async fn relay(&self, event: HostEvent) {
        // Every peer observes the host; only the executor speaks for it
        if !self.host.is_privileged_executor() {
            return;
        }

        match self.notification_for(&event).await {
            Ok(Some(notification)) => {
                let action = notification.action;
                match self.publish(notification) {
                    Ok(()) => debug!(?action, "Notification published"),
                    Err(e) => warn!(?action, error = %e, "Failed to publish notification"),
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to build notification"),
        }
    }

    /// Spawn the relay loop. Subscribes to host events before returning.
    pub fn start(&self) -> JoinHandle<()> {
        let mut events = self.host.subscribe_events();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let relay = self.clone();

        info!(channel = %self.channel, "Notification relay started");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => relay.relay(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Notification relay fell behind, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Host event stream closed, notification relay stopping");
                            break;
                        }
                    },
                    _ = shutdown_rx.recv() => {
                        debug!("Notification relay received shutdown signal");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the relay loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
