use std::num::NonZeroU64;

use snafu::IntoError as _;
use surrealdb::error::Db;
use vidcast::database::{Database, MalformedQuerySnafu, Record};
use vidcast::engagement::{
    BackendSnafu, Engagement, EngagementConfig, EngagementError, EngagementStore, RecordView,
    RewardTier, StaleCountersSnafu, StoreError, ViewBatch, ViewCounts,
};
use vidcast::model::{Channel, UserId, Video, ViewEvent};

async fn ledger_len(db: &Database, video: &Record<Video>) -> u64 {
    ViewEvent::for_video(video, db).await.unwrap().len() as u64
}

async fn upload(
    db: &Database, channel: &Record<Channel>, title: &str, boosted_views: u64,
) -> Video {
    Video::new(
        channel.clone(),
        title.into(),
        "hello".into(),
        "Other".into(),
        format!("https://cdn.example/{title}.mp4"),
        None,
        boosted_views,
    )
    .create(db)
    .await
    .unwrap()
}

struct Fixture {
    db: Database,
    engagement: Engagement<Database>,
    channel: Record<Channel>,
    video: Record<Video>,
}

async fn fixture(boosted_views: u64) -> Fixture {
    fixture_with(boosted_views, EngagementConfig::default()).await
}

async fn fixture_with(boosted_views: u64, config: EngagementConfig) -> Fixture {
    let db = Database::memory().await.unwrap();

    let channel = Channel::new(UserId::new("owner-1".into()), "Kitsune".into(), None)
        .create(&db)
        .await
        .unwrap();

    let video = upload(&db, &channel.id, "first", boosted_views).await;

    let engagement = Engagement::new(db.clone(), &config);

    Fixture {
        db,
        engagement,
        channel: channel.id,
        video: video.id,
    }
}

impl Fixture {
    fn view(&self) -> RecordView {
        RecordView {
            video: self.video.clone(),
            viewer: Some(UserId::new("viewer-1".into())),
            origin: "203.0.113.7".into(),
        }
    }

    async fn subscribers(&self) -> u64 {
        Channel::get(&self.channel, &self.db)
            .await
            .unwrap()
            .unwrap()
            .subscribers
    }

    async fn counts(&self) -> ViewCounts {
        Video::get(&self.video, &self.db)
            .await
            .unwrap()
            .unwrap()
            .counts()
    }

    async fn ledger_len(&self) -> u64 {
        ledger_len(&self.db, &self.video).await
    }
}

#[tokio::test]
async fn reaching_the_first_threshold_rewards_the_channel() {
    let fixture = fixture(990).await;

    let counts = fixture.engagement.record_view(fixture.view()).await.unwrap();

    assert_eq!(
        counts,
        ViewCounts {
            real_views: 1,
            boosted_views: 1_000
        }
    );
    assert_eq!(fixture.subscribers().await, 100);
    assert_eq!(fixture.ledger_len().await, 1);
}

#[tokio::test]
async fn a_threshold_already_passed_does_not_fire_again() {
    let fixture = fixture(1_000).await;

    let counts = fixture.engagement.record_view(fixture.view()).await.unwrap();

    assert_eq!(counts.boosted_views, 1_010);
    assert_eq!(fixture.subscribers().await, 0);
}

#[tokio::test]
async fn every_view_adds_one_real_and_ten_boosted() {
    let fixture = fixture(100).await;
    let mut previous = fixture.counts().await;

    for _ in 0..100 {
        let counts = fixture.engagement.record_view(fixture.view()).await.unwrap();

        assert_eq!(counts.real_views, previous.real_views + 1);
        assert_eq!(counts.boosted_views, previous.boosted_views + 10);
        previous = counts;
    }

    assert_eq!(previous.boosted_views, 1_100);
    assert_eq!(fixture.subscribers().await, 100, "the 1000 tier fires exactly once");
    assert_eq!(fixture.ledger_len().await, 100);
}

#[tokio::test]
async fn persisted_counters_match_the_returned_ones() {
    let fixture = fixture(100).await;

    let mut last = ViewCounts::default();
    for _ in 0..3 {
        last = fixture.engagement.record_view(fixture.view()).await.unwrap();
    }

    assert_eq!(fixture.counts().await, last);
}

#[tokio::test]
async fn viewing_a_missing_video_changes_nothing() {
    let fixture = fixture(990).await;
    let missing = Record::<Video>::new("missing");

    let result = fixture
        .engagement
        .record_view(RecordView {
            video: missing.clone(),
            viewer: None,
            origin: "198.51.100.1".into(),
        })
        .await;

    assert!(matches!(result, Err(EngagementError::NotFound { video, .. }) if video == missing));
    assert_eq!(ledger_len(&fixture.db, &missing).await, 0);
    assert!(Video::get(&missing, &fixture.db).await.unwrap().is_none());
    assert_eq!(fixture.ledger_len().await, 0);
    assert_eq!(fixture.subscribers().await, 0);
    assert_eq!(
        fixture.counts().await,
        ViewCounts {
            real_views: 0,
            boosted_views: 990
        }
    );
}

#[tokio::test]
async fn concurrent_views_fire_a_threshold_once() {
    let fixture = fixture(995).await;

    let (first, second) = futures::join!(
        fixture.engagement.record_view(fixture.view()),
        fixture.engagement.record_view(fixture.view()),
    );

    let mut boosted = vec![first.unwrap().boosted_views, second.unwrap().boosted_views];
    boosted.sort_unstable();

    assert_eq!(boosted, vec![1_005, 1_015]);
    assert_eq!(fixture.subscribers().await, 100);
    assert_eq!(fixture.ledger_len().await, 2);
}

#[tokio::test]
async fn independent_services_on_one_store_never_double_fire() {
    let fixture = fixture(995).await;
    let other = Engagement::new(fixture.db.clone(), &EngagementConfig::default());

    let (first, second) = futures::join!(
        fixture.engagement.record_view(fixture.view()),
        other.record_view(fixture.view()),
    );

    let mut committed = 0;
    for result in [first, second] {
        match result {
            Ok(_) => committed += 1,
            Err(EngagementError::Conflict { .. }) => {}
            Err(error) => panic!("unexpected error: {error}"),
        }
    }

    assert!(committed >= 1);
    assert_eq!(fixture.subscribers().await, 100);
    assert_eq!(fixture.counts().await.real_views, committed);
    assert_eq!(fixture.ledger_len().await, committed);
}

#[tokio::test]
async fn videos_of_one_channel_reward_it_concurrently() {
    let fixture = fixture(995).await;
    let second = upload(&fixture.db, &fixture.channel, "second", 995).await;

    let view_of = |video: &Record<Video>| RecordView {
        video: video.clone(),
        viewer: None,
        origin: "203.0.113.9".into(),
    };

    let (first, other) = futures::join!(
        fixture.engagement.record_view(view_of(&fixture.video)),
        fixture.engagement.record_view(view_of(&second.id)),
    );

    // A conflict is a legitimate answer, a retry then has to land the reward.
    for (video, result) in [(&fixture.video, first), (&second.id, other)] {
        match result {
            Ok(counts) => assert_eq!(counts.boosted_views, 1_005),
            Err(EngagementError::Conflict { .. }) => {
                let counts = fixture.engagement.record_view(view_of(video)).await.unwrap();
                assert_eq!(counts.boosted_views, 1_005);
            }
            Err(error) => panic!("unexpected error: {error}"),
        }
    }

    assert_eq!(fixture.subscribers().await, 200);
    assert_eq!(ledger_len(&fixture.db, &fixture.video).await, 1);
    assert_eq!(ledger_len(&fixture.db, &second.id).await, 1);
}

#[tokio::test]
async fn a_stale_commit_writes_nothing() {
    let fixture = fixture(990).await;
    let video = Video::get(&fixture.video, &fixture.db).await.unwrap().unwrap();

    let stale = ViewCounts {
        real_views: 7,
        boosted_views: 990,
    };
    let batch = ViewBatch {
        event: fixture
            .engagement
            .ledger()
            .record(&video, None, "192.0.2.1".into()),
        video: video.id.clone(),
        channel: video.channel.clone(),
        before: stale,
        after: ViewCounts {
            real_views: 8,
            boosted_views: 1_000,
        },
        rewards: vec![RewardTier::new(1_000, 100)],
    };

    let result = fixture.db.commit(&batch).await;

    assert!(matches!(result, Err(StoreError::StaleCounters { .. })));
    assert_eq!(fixture.ledger_len().await, 0);
    assert_eq!(fixture.subscribers().await, 0);
    assert_eq!(fixture.counts().await, video.counts());
}

#[tokio::test]
async fn one_view_can_cross_several_tiers() {
    let config = EngagementConfig {
        boost_increment: NonZeroU64::new(5_000).unwrap(),
        ..EngagementConfig::default()
    };
    let fixture = fixture_with(900, config).await;

    let counts = fixture.engagement.record_view(fixture.view()).await.unwrap();

    assert_eq!(counts.boosted_views, 5_900);
    assert_eq!(fixture.subscribers().await, 600);

    let counts = fixture.engagement.record_view(fixture.view()).await.unwrap();

    assert_eq!(counts.boosted_views, 10_900);
    assert_eq!(fixture.subscribers().await, 1_600);
}

#[tokio::test]
async fn the_ledger_keeps_every_view_including_repeats() {
    let fixture = fixture(100).await;

    fixture.engagement.record_view(fixture.view()).await.unwrap();
    fixture.engagement.record_view(fixture.view()).await.unwrap();
    fixture
        .engagement
        .record_view(RecordView {
            video: fixture.video.clone(),
            viewer: None,
            origin: "198.51.100.20".into(),
        })
        .await
        .unwrap();

    let history = fixture
        .engagement
        .ledger()
        .history(&fixture.video, &fixture.db)
        .await
        .unwrap();

    assert_eq!(history.len(), 3);
    assert_eq!(history[0].viewer, None, "newest first");
    assert_eq!(history[0].origin, "198.51.100.20");
    assert_eq!(history[1].viewer, Some(UserId::new("viewer-1".into())));
    assert_eq!(history[2].viewer, Some(UserId::new("viewer-1".into())));
    assert!(history.iter().all(|event| event.video == fixture.video));
}

/// A store that fails the way the test asks it to.
struct FailingStore {
    video: Video,
    fail_on_read: bool,
}

impl EngagementStore for FailingStore {
    async fn video(&self, _id: &Record<Video>) -> Result<Option<Video>, StoreError> {
        if self.fail_on_read {
            return Err(BackendSnafu.into_error(MalformedQuerySnafu.into_error(Db::Ds("offline".into()).into())));
        }

        Ok(Some(self.video.clone()))
    }

    async fn commit(&self, _batch: &ViewBatch) -> Result<(), StoreError> {
        StaleCountersSnafu.fail()
    }
}

fn detached_video() -> Video {
    Video::new(
        Record::new("channel"),
        "title".into(),
        String::new(),
        "Other".into(),
        "https://cdn.example/v.mp4".into(),
        None,
        100,
    )
}

#[tokio::test]
async fn store_failures_surface_as_unavailable() {
    let store = FailingStore {
        video: detached_video(),
        fail_on_read: true,
    };
    let engagement = Engagement::new(store, &EngagementConfig::default());

    let result = engagement
        .record_view(RecordView {
            video: Record::new("any"),
            viewer: None,
            origin: String::new(),
        })
        .await;

    assert!(matches!(result, Err(EngagementError::StoreUnavailable { .. })));
}

#[tokio::test]
async fn rejected_commits_surface_as_conflicts() {
    let video = detached_video();
    let id = video.id.clone();
    let store = FailingStore {
        video,
        fail_on_read: false,
    };
    let engagement = Engagement::new(store, &EngagementConfig::default());

    let result = engagement
        .record_view(RecordView {
            video: id.clone(),
            viewer: None,
            origin: String::new(),
        })
        .await;

    assert!(matches!(result, Err(EngagementError::Conflict { video, .. }) if video == id));
}
