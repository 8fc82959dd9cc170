use std::time::Duration;

use tokio::time::timeout;
use zagadki::{ChannelHandle, LinkStatus, Role, SessionController, SyncChannel, SyncEvent, WsTransport};
use zagadki_core::{Extra, GameState, PuzzleKind};
use zagadki_relay::RoomHandle;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_relay(replay_last_state: bool) -> Result<String, Box<dyn std::error::Error>> {
    let listener = zagadki_relay::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let room = RoomHandle::new(replay_last_state);
    tokio::spawn(async move {
        if let Err(err) = zagadki_relay::serve(listener, room).await {
            eprintln!("relay stopped: {err}");
        }
    });
    Ok(format!("ws://{addr}/ws"))
}

async fn connect(url: &str) -> Result<SyncChannel<WsTransport>, Box<dyn std::error::Error>> {
    let mut channel = SyncChannel::new(WsTransport::new(url)?);
    channel.connect().await?;
    Ok(channel)
}

async fn wait_for_state(
    channel: &mut SyncChannel<WsTransport>,
    session: &mut SessionController<ChannelHandle>,
    expected: &GameState,
) -> TestResult {
    while session.state() != expected {
        let event = timeout(WAIT, channel.next_event())
            .await?
            .ok_or("relay closed before the state arrived")?;
        session.handle_event(&event);
    }
    Ok(())
}

async fn wait_for_event(
    channel: &mut SyncChannel<WsTransport>,
    wanted: SyncEvent,
) -> TestResult {
    loop {
        let event = timeout(WAIT, channel.next_event())
            .await?
            .ok_or("relay closed before the event arrived")?;
        if event == wanted {
            return Ok(());
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn selection_is_observed_by_second_client() -> TestResult {
    let url = spawn_relay(true).await?;
    let authority_link = connect(&url).await?;
    let mut viewer_link = connect(&url).await?;

    let mut authority =
        SessionController::new(PuzzleKind::SinglePick, Role::Authority, authority_link.handle());
    let mut viewer =
        SessionController::new(PuzzleKind::SinglePick, Role::Viewer, viewer_link.handle());

    authority.switch_view(2);
    authority.select("img/f3.png");
    let expected = GameState {
        view: 2,
        extra: Extra::Selected("img/f3.png".to_string()),
    };

    wait_for_state(&mut viewer_link, &mut viewer, &expected).await?;
    let shown = viewer.projection();
    assert_eq!(shown.view, 2);
    assert!(shown.solved);
    assert_eq!(shown.celebration.as_deref(), Some("img/f3.png"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn late_joiner_receives_current_layout() -> TestResult {
    let url = spawn_relay(true).await?;
    let authority_link = connect(&url).await?;
    let mut authority =
        SessionController::new(PuzzleKind::Sorting, Role::Authority, authority_link.handle());
    authority.place(1, "1");
    authority.place(2, "3");
    let expected = authority.state().clone();

    // Give the relay a moment to record the last update before anyone joins.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut late_link = connect(&url).await?;
    let mut late = SessionController::new(PuzzleKind::Sorting, Role::Viewer, late_link.handle());
    wait_for_state(&mut late_link, &mut late, &expected).await?;
    assert_eq!(late.items(), authority.items());
    assert!(!late.solved());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn departing_viewer_is_announced() -> TestResult {
    let url = spawn_relay(true).await?;
    let mut authority_link = connect(&url).await?;
    let mut viewer_link = connect(&url).await?;
    wait_for_event(&mut authority_link, SyncEvent::PeerConnected).await?;

    viewer_link.close();
    assert_eq!(viewer_link.status(), LinkStatus::Disconnected);
    wait_for_event(&mut authority_link, SyncEvent::PeerDisconnected).await?;
    assert_eq!(authority_link.status(), LinkStatus::Connected);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_relay_reports_error() -> TestResult {
    let listener = zagadki_relay::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let mut channel = SyncChannel::new(WsTransport::new(&format!("ws://{addr}/ws"))?);
    assert!(channel.connect().await.is_err());
    assert_eq!(channel.status(), LinkStatus::Disconnected);
    assert!(WsTransport::new("not a url").is_err());
    Ok(())
}
