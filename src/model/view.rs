use super::*;

/// One recorded view. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct ViewEvent {
    #[new(default)]
    pub id: Record<ViewEvent>,
    #[new(value = "now()")]
    pub created_at: Timestamp,

    pub video: Record<Video>,
    pub viewer: Option<UserId>,
    pub origin: String,
}

define_table!("view_events": ViewEvent);

define_relation! {
    ViewEvent > for_video(video: &Record<Video>) > Vec<ViewEvent>
        where "SELECT * FROM view_events WHERE video = $video ORDER BY created_at DESC"
}
