use std::time::Duration;

use field_link::{
    protocol::{PosInfoHeader, RobotInfo, StandardSnapshot, Vector2D, ANGLE_SCALE},
    CompactEngine, EngineOptions, EngineState, FrameEngine, FrameWriter, LinkError,
    StandardEngine, StreamSource,
};
use tokio::io::AsyncWriteExt;

const TWO_ROBOTS_ONE_BALL: [u8; 18] = [
    0x12, 0x34, // noise
    0xFF, 0xFF, //
    2, 1, //
    1, 100, 0x00, 10, 20, //
    2, 50, 0x01, 0, 255, //
    4, 6,
];

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "{actual} is not close to {expected}"
    );
}

#[tokio::test]
async fn decodes_robots_and_balls() {
    let mut engine = StandardEngine::new(StreamSource::new(&TWO_ROBOTS_ONE_BALL[..]));
    let reader = engine.subscribe();

    let header = engine.next_frame().await.unwrap();
    assert_eq!(header, PosInfoHeader::new(2, 1));
    assert_eq!(engine.state(), EngineState::Synced);

    let snapshot = reader.latest().unwrap();
    let robots = snapshot.robots();

    assert_eq!(robots.len(), 2);
    assert_eq!(robots[0].id, 1);
    assert_close(robots[0].heading, 1.236_847_5);
    assert_eq!(robots[0].pos, Vector2D::new(5.0, 10.0));
    assert_eq!(robots[1].id, 2);
    assert_close(robots[1].heading, -0.618_423_75);
    assert_eq!(robots[1].pos, Vector2D::new(0.0, 127.5));
    assert_eq!(snapshot.balls(), &[Vector2D::new(2.0, 3.0)]);
    assert_eq!(snapshot.header(), header);

    let stats = engine.stats();
    assert_eq!(stats.frames_published, 1);
    assert_eq!(stats.syncs, 1);
    assert_eq!(stats.bytes_skipped, 2);
}

#[tokio::test]
async fn end_of_stream_faults_engine() {
    let mut engine = StandardEngine::new(StreamSource::new(&TWO_ROBOTS_ONE_BALL[..]));
    engine.next_frame().await.unwrap();

    let err = engine.next_frame().await.unwrap_err();
    assert!(err.is_link_lost());
    assert_eq!(engine.state(), EngineState::Faulted);

    // Nothing more is read until restart
    assert!(matches!(
        engine.next_frame().await,
        Err(LinkError::Faulted)
    ));
}

#[tokio::test]
async fn link_lost_mid_header_publishes_nothing() {
    let mut engine = StandardEngine::new(StreamSource::new(&[0xFF, 0xFF, 2][..]));
    let reader = engine.subscribe();

    let err = engine.next_frame().await.unwrap_err();

    assert!(matches!(err, LinkError::LinkLost(_)));
    assert_eq!(engine.state(), EngineState::Faulted);
    assert!(reader.latest().is_none());
    assert!(!reader.has_changed());
    assert_eq!(engine.stats().frames_published, 0);
}

#[tokio::test]
async fn empty_frame_is_published() {
    let mut engine = StandardEngine::new(StreamSource::new(&[0xFF, 0xFF, 0, 0][..]));
    let mut reader = engine.subscribe();

    engine.next_frame().await.unwrap();

    let snapshot = reader.changed().await.unwrap();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.header(), PosInfoHeader::new(0, 0));
}

#[tokio::test]
async fn back_to_back_frames_sync_once() {
    let mut bytes = TWO_ROBOTS_ONE_BALL.to_vec();
    bytes.extend_from_slice(&[0xFF, 0xFF, 1, 0, 3, 0, 0, 8, 8]);

    let mut engine = StandardEngine::new(StreamSource::new(bytes.as_slice()));
    let mut reader = engine.subscribe();

    engine.next_frame().await.unwrap();
    assert_eq!(reader.changed().await.unwrap().robots().len(), 2);

    engine.next_frame().await.unwrap();
    let snapshot = reader.changed().await.unwrap();
    assert_eq!(snapshot.robots().len(), 1);
    assert_eq!(snapshot.robots()[0].id, 3);
    assert_eq!(snapshot.robots()[0].pos, Vector2D::new(4.0, 4.0));
    assert!(snapshot.balls().is_empty());

    assert_eq!(engine.stats().syncs, 1);
    assert_eq!(engine.stats().frames_published, 2);
    assert_eq!(engine.source().bytes_read(), bytes.len() as u64);
}

#[tokio::test]
async fn oversize_header_is_clamped() {
    let mut bytes = vec![0xFF, 0xFF, 0, 61];
    for i in 0..61u8 {
        bytes.extend_from_slice(&[i, i]);
    }

    let mut engine = CompactEngine::new(StreamSource::new(bytes.as_slice()));
    let reader = engine.subscribe();

    let header = engine.next_frame().await.unwrap();
    assert_eq!(header, PosInfoHeader::new(0, 60));
    assert_eq!(reader.latest().unwrap().balls().len(), 60);
    assert_eq!(engine.stats().clamped_headers, 1);

    // The surplus record is still in the stream
    assert_eq!(engine.source().bytes_read(), 4 + 60 * 2);
}

#[tokio::test]
async fn timeout_abandons_partial_frame() {
    let (mut host, robot) = tokio::io::duplex(64);
    let mut engine = StandardEngine::new(StreamSource::new(robot));
    let reader = engine.subscribe();

    host.write_all(&[0xFF, 0xFF, 1]).await.unwrap();
    let err = engine
        .next_frame_within(Duration::from_millis(20))
        .await
        .unwrap_err();

    assert!(matches!(err, LinkError::Timeout(_)));
    assert!(!err.is_link_lost());
    assert_eq!(engine.state(), EngineState::Unsynced);
    assert_eq!(engine.stats().abandoned_frames, 1);
    assert!(reader.latest().is_none());

    host.write_all(&[0xFF, 0xFF, 0, 1, 4, 6]).await.unwrap();
    engine
        .next_frame_within(Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(engine.stats().syncs, 2);
    assert_eq!(
        reader.latest().unwrap().balls(),
        &[Vector2D::new(2.0, 3.0)]
    );
}

#[tokio::test]
async fn dropped_frame_future_resynchronizes() {
    let (mut host, robot) = tokio::io::duplex(64);
    let mut engine = StandardEngine::new(StreamSource::new(robot));
    let reader = engine.subscribe();

    // Header promises two balls, only half of the first one arrives
    host.write_all(&[0xFF, 0xFF, 0, 2, 4]).await.unwrap();
    tokio::select! {
        result = engine.next_frame() => panic!("frame completed early: {result:?}"),
        _ = tokio::time::sleep(Duration::from_millis(20)) => {}
    }
    assert_eq!(engine.state(), EngineState::Decoding);

    // The rest of the old frame, a stray byte, then a fresh frame
    host.write_all(&[6, 8, 8, 0x11, 0xFF, 0xFF, 0, 1, 10, 12])
        .await
        .unwrap();
    engine.next_frame().await.unwrap();

    let snapshot = reader.latest().unwrap();
    assert_eq!(snapshot.balls(), &[Vector2D::new(5.0, 6.0)]);
    assert_eq!(engine.state(), EngineState::Synced);

    let stats = engine.stats();
    assert_eq!(stats.syncs, 2);
    assert_eq!(stats.abandoned_frames, 1);
    assert_eq!(stats.frames_published, 1);
}

#[tokio::test]
async fn configured_timeout_applies_to_next_frame() {
    let (_host, robot) = tokio::io::duplex(64);
    let options = EngineOptions {
        frame_timeout: Some(Duration::from_millis(10)),
        ..Default::default()
    };
    let mut engine = StandardEngine::with_options(StreamSource::new(robot), options);

    let err = engine.next_frame().await.unwrap_err();

    assert!(matches!(err, LinkError::Timeout(d) if d == Duration::from_millis(10)));
    // Timing out while still searching for a frame drops nothing
    assert_eq!(engine.stats().abandoned_frames, 0);
}

#[tokio::test]
async fn verified_sync_pair_mismatch_resynchronizes() {
    let bytes = [
        0xFF, 0xFF, 0, 0, //
        0xAA, 0xBB, 0, 0, //
        0x10, //
        0xFF, 0xFF, 0, 1, 4, 6,
    ];
    let options = EngineOptions {
        verify_sync_pair: true,
        ..Default::default()
    };
    let mut engine = StandardEngine::with_options(StreamSource::new(&bytes[..]), options);
    let reader = engine.subscribe();

    engine.next_frame().await.unwrap();

    let err = engine.next_frame().await.unwrap_err();
    assert!(matches!(err, LinkError::SyncLost([0xAA, 0xBB])));
    assert_eq!(engine.state(), EngineState::Unsynced);

    engine.next_frame().await.unwrap();
    assert_eq!(reader.latest().unwrap().balls().len(), 1);

    let stats = engine.stats();
    assert_eq!(stats.syncs, 2);
    assert_eq!(stats.abandoned_frames, 1);
    assert_eq!(stats.frames_published, 2);
}

#[tokio::test]
async fn restart_after_fault() {
    let mut engine = StandardEngine::new(StreamSource::new(&[0xFF][..]));
    engine.next_frame().await.unwrap_err();
    assert!(engine.state().is_faulted());

    let old = engine.restart(StreamSource::new(&[0x00, 0xFF, 0xFF, 0, 0][..]));
    assert_eq!(old.bytes_read(), 1);
    assert_eq!(engine.state(), EngineState::Unsynced);

    engine.next_frame().await.unwrap();
    assert_eq!(engine.state(), EngineState::Synced);
    assert_eq!(engine.stats().frames_published, 1);
}

#[tokio::test]
async fn run_returns_link_loss() {
    let mut bytes = TWO_ROBOTS_ONE_BALL.to_vec();
    bytes.extend_from_slice(&[0xFF, 0xFF, 0, 0]);

    let mut engine = StandardEngine::new(StreamSource::new(bytes.as_slice()));
    let err = engine.run().await;

    assert!(err.is_link_lost());
    assert_eq!(engine.state(), EngineState::Faulted);
    assert_eq!(engine.stats().frames_published, 2);
}

#[tokio::test]
async fn writer_output_decodes() {
    let mut snapshot = StandardSnapshot::new();
    snapshot
        .push_robot(RobotInfo::new(
            1,
            100.0 * ANGLE_SCALE,
            Vector2D::new(5.0, 10.0),
        ))
        .unwrap();
    snapshot
        .push_robot(RobotInfo::new(
            2,
            -50.0 * ANGLE_SCALE,
            Vector2D::new(0.0, 127.0),
        ))
        .unwrap();
    snapshot.push_ball(Vector2D::new(2.0, 3.0)).unwrap();

    let mut writer = FrameWriter::new(Vec::new());
    writer.send(&snapshot).await.unwrap();
    writer.send(&StandardSnapshot::new()).await.unwrap();
    assert_eq!(writer.frames_sent(), 2);

    let bytes = writer.into_inner();
    assert_eq!(&bytes[..4], &[0xFF, 0xFF, 2, 1]);

    let mut engine: FrameEngine<_> = FrameEngine::new(StreamSource::new(bytes.as_slice()));
    let mut reader = engine.subscribe();

    engine.next_frame().await.unwrap();
    assert_eq!(reader.changed().await.unwrap(), snapshot);

    engine.next_frame().await.unwrap();
    assert!(reader.changed().await.unwrap().is_empty());
}

#[tokio::test]
async fn reader_stream_sees_latest() {
    use tokio_stream::StreamExt;

    let mut engine = StandardEngine::new(StreamSource::new(&TWO_ROBOTS_ONE_BALL[..]));
    let stream = engine.subscribe().into_stream();

    engine.next_frame().await.unwrap();
    drop(engine);

    let snapshots: Vec<_> = stream.collect().await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].robots().len(), 2);
}
