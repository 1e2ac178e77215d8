//! The annotated video moment and the note built from it.

use clipnote_core::{EventBuilder, Kind, Tag, UnsignedEvent};
use serde::{Deserialize, Serialize};

/// Hashtags attached to every clip note, in order.
pub const NOTE_HASHTAGS: [&str; 2] = ["youtube", "clip"];

/// A moment in a video, with the user's comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipMoment {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    /// Whole seconds into the video.
    pub selected_time: u64,
    pub comment: String,
    /// Captured frame or thumbnail. `None` means the default thumbnail.
    #[serde(default)]
    pub preview_image: Option<String>,
}

impl ClipMoment {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            channel: String::new(),
            selected_time: 0,
            comment: String::new(),
            preview_image: None,
        }
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn at(mut self, seconds: u64) -> Self {
        self.selected_time = seconds;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn preview(mut self, image: impl Into<String>) -> Self {
        self.preview_image = Some(image.into());
        self
    }

    /// The preview image, or the video's default thumbnail.
    pub fn preview_or_default(&self) -> String {
        self.preview_image
            .clone()
            .unwrap_or_else(|| default_preview(&self.video_id))
    }

    /// Link that opens the video at the selected moment.
    pub fn timestamp_url(&self) -> String {
        timestamp_url(&self.video_id, self.selected_time)
    }

    /// Note body: comment, title, link, timestamp and preview, separated by
    /// blank lines. Empty comments and inline `data:` previews are left out.
    pub fn note_text(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(5);
        let comment = self.comment.trim();
        if !comment.is_empty() {
            lines.push(comment.to_string());
        }
        lines.push(self.title.clone());
        lines.push(self.timestamp_url());
        lines.push(format!("Timestamp: {}", format_timestamp(self.selected_time)));

        let preview = self.preview_or_default();
        if !preview.is_empty() && !preview.starts_with("data:") {
            lines.push(preview);
        }
        lines.join("\n\n")
    }

    /// `r` tag with the link, then the hashtags.
    pub fn event_tags(&self) -> Vec<Tag> {
        let mut tags = vec![Tag::new("r", [self.timestamp_url()])];
        tags.extend(NOTE_HASHTAGS.iter().map(|t| Tag::new("t", [*t])));
        tags
    }

    /// Draft text note for `pubkey`.
    pub fn unsigned_event(&self, pubkey: &str, created_at: u64) -> UnsignedEvent {
        EventBuilder::new(pubkey)
            .kind(Kind::TEXT_NOTE)
            .created_at(created_at)
            .tags(self.event_tags())
            .content(self.note_text())
            .build()
    }
}

/// `MM:SS`, or `HH:MM:SS` from one hour on.
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

pub fn timestamp_url(video_id: &str, seconds: u64) -> String {
    format!("https://www.youtube.com/watch?v={}&t={}s", video_id, seconds)
}

pub fn default_preview(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/maxresdefault.jpg", video_id)
}
