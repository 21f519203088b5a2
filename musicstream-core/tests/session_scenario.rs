use musicstream_core::{
    Catalog, CoreError, MusicStreamConfig, PlaybackController, Rating, TickDriver,
};
use std::sync::Arc;
use std::time::Duration;

fn new_session() -> PlaybackController {
    let config = MusicStreamConfig::default();
    PlaybackController::new(Arc::new(Catalog::builtin()), &config.session).unwrap()
}

#[test]
fn dancing_dj_listening_session() {
    let mut controller = new_session();
    assert_eq!(controller.state().channel_id, "dancingDJ");
    assert!(controller.state().is_playing);

    for _ in 0..180 {
        controller.tick(1).unwrap();
    }
    assert_eq!(controller.state().song_index, 1);
    assert_eq!(controller.state().elapsed_secs, 0);

    let song_id = controller.current_song().unwrap().id.clone();
    controller.rate(&song_id, Rating::Dislike).unwrap();
    assert_eq!(controller.state().song_index, 2);
    assert_eq!(controller.ratings().get(&song_id), Some(Rating::Dislike));

    controller.switch_channel("lofi").unwrap();
    let state = controller.state();
    assert_eq!(state.channel_id, "lofi");
    assert_eq!(state.song_index, 0);
    assert_eq!(state.elapsed_secs, 0);
    assert!(state.is_playing);
}

#[test]
fn one_tick_short_of_duration_stays_on_song() {
    let mut controller = new_session();
    for _ in 0..179 {
        controller.tick(1).unwrap();
    }
    assert_eq!(controller.state().song_index, 0);
    assert_eq!(controller.state().elapsed_secs, 179);
}

#[test]
fn rating_at_start_of_song_still_advances() {
    let mut controller = new_session();
    assert_eq!(controller.state().elapsed_secs, 0);

    controller.rate("dj1", Rating::Like).unwrap();
    assert_eq!(controller.state().song_index, 1);
    assert_eq!(controller.ratings().get("dj1"), Some(Rating::Like));
}

#[test]
fn failed_switch_is_reported_as_not_found() {
    let mut controller = new_session();
    let err = controller.switch_channel("classical").unwrap_err();
    assert!(matches!(err, CoreError::ChannelNotFound { .. }));
    assert_eq!(err.to_string(), "Channel not found: classical");
    assert_eq!(controller.state().channel_id, "dancingDJ");
}

#[test]
fn state_and_ratings_serialize_for_rendering() {
    let mut controller = new_session();
    controller.rate_current(Rating::Like).unwrap();

    let state = serde_json::to_value(controller.state()).unwrap();
    assert_eq!(state["songIndex"], 1);

    let ratings = serde_json::to_value(controller.ratings()).unwrap();
    assert_eq!(ratings["dj1"], "like");
}

#[tokio::test(start_paused = true)]
async fn driver_and_user_actions_share_one_timeline() {
    let controller = new_session().into_shared();
    let handle = TickDriver::new(controller.clone(), Duration::from_secs(1), None).start();

    tokio::time::sleep(Duration::from_millis(90_500)).await;
    controller.lock().await.skip_next().unwrap();

    // Ticks now fall half a second off the original schedule
    tokio::time::sleep(Duration::from_millis(10_200)).await;
    {
        let c = controller.lock().await;
        assert_eq!(c.state().song_index, 1);
        assert_eq!(c.state().elapsed_secs, 10);
    }

    controller.lock().await.pause();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(controller.lock().await.state().elapsed_secs, 10);

    handle.stop().await;
}
