use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::core::launch::GameEvent;

use super::machine::PresenceStateMachine;

/// Feed game output into `machine` until the process exits, then reset it to
/// idle. Only stdout lines count; stderr is ignored.
pub async fn drive_presence(
    mut machine: PresenceStateMachine,
    mut rx: UnboundedReceiver<GameEvent>,
) -> PresenceStateMachine {
    while let Some(event) = rx.recv().await {
        match event {
            GameEvent::Data(line) => {
                machine.observe(&line);
            }
            GameEvent::Debug(_) => {}
            GameEvent::Exited(code) => {
                debug!("Game exited ({:?}), presence back to idle", code);
                break;
            }
        }
    }
    machine.reset();
    machine
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::core::presence::{ChannelPresenceProvider, Phase, PresenceConfig};

    #[tokio::test]
    async fn follows_stdout_and_resets_on_exit() {
        let (activity_tx, mut activity_rx) = mpsc::unbounded_channel();
        let machine = PresenceStateMachine::new(
            PresenceConfig::default(),
            "1.20.1",
            Box::new(ChannelPresenceProvider::new(activity_tx)),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(GameEvent::Data("Setting user: Steve".into())).unwrap();
        tx.send(GameEvent::Debug(r#"Preparing level "Ignored""#.into())).unwrap();
        tx.send(GameEvent::Data("Connecting to mc.example.net, 25565".into())).unwrap();
        tx.send(GameEvent::Exited(Some(0))).unwrap();

        let machine = drive_presence(machine, rx).await;
        assert_eq!(machine.context().phase, Phase::Idle);

        let mut phases = Vec::new();
        while let Ok(activity) = activity_rx.try_recv() {
            phases.push(activity.phase);
        }
        assert_eq!(phases, vec![Phase::MainMenu, Phase::Multiplayer, Phase::Idle]);
    }
}
