//! JSON-friendly view of a decoded record

use serde::{Deserialize, Serialize};
use shlink_core::{blocks::TrackerData, Header, ShellLink};

/// Flattened record used by `dump --json` and `scan --output`
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkSummary {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<usize>,
    pub link_flags: Vec<String>,
    pub file_attributes: Vec<String>,
    pub header: Header,
    pub created: String,
    pub accessed: String,
    pub written: String,
    pub name: Option<String>,
    pub relative_path: Option<String>,
    pub working_dir: Option<String>,
    pub arguments: Option<String>,
    pub icon_location: Option<String>,
    /// Hex of each ItemID body
    pub id_list: Vec<String>,
    pub link_info_len: Option<usize>,
    pub extra_data: Vec<String>,
    pub tracker: Option<TrackerSummary>,
}

/// Decoded tracker block
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub machine_id: String,
    pub droid_file: String,
    pub created: Option<String>,
    pub clock_id: u32,
    pub mac_address: String,
}

impl From<TrackerData> for TrackerSummary {
    fn from(tracker: TrackerData) -> Self {
        let id = tracker.file_identifier();
        Self {
            machine_id: tracker.machine_id,
            droid_file: tracker.droid_file.to_string(),
            created: id
                .timestamp()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            clock_id: id.clock_id(),
            mac_address: id.mac_address().to_string(),
        }
    }
}

impl LinkSummary {
    pub fn from_link(link: &ShellLink) -> Self {
        let header = link.header();
        Self {
            offset: None,
            size: None,
            link_flags: to_strings(header.link_flags().names()),
            file_attributes: to_strings(header.file_attributes.names()),
            header: header.clone(),
            created: header.creation_time.to_string(),
            accessed: header.access_time.to_string(),
            written: header.write_time.to_string(),
            name: link.name().map(str::to_string),
            relative_path: link.relative_path().map(str::to_string),
            working_dir: link.working_dir().map(str::to_string),
            arguments: link.arguments().map(str::to_string),
            icon_location: link.icon_location().map(str::to_string),
            id_list: link
                .id_list()
                .map(|list| list.items().iter().map(|i| hex::encode(i.data())).collect())
                .unwrap_or_default(),
            link_info_len: link.link_info().map(|info| info.body().len() + 4),
            extra_data: link
                .extra_data()
                .iter()
                .map(|b| b.kind().name().to_string())
                .collect(),
            tracker: link
                .extra_data()
                .iter()
                .find_map(|b| b.tracker())
                .map(TrackerSummary::from),
        }
    }

    pub fn located(link: &ShellLink, offset: usize, size: usize) -> Self {
        Self {
            offset: Some(offset),
            size: Some(size),
            ..Self::from_link(link)
        }
    }
}

fn to_strings(names: Vec<&'static str>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}
