use serde::Serialize;

use crate::labware::LabwareSnapshot;
use crate::purposes::FileLink;

/// A download offered for the current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportLink {
    pub name: String,
    pub id: String,
    pub url: String,
}

/// Links whose own state filter admits the labware's current state
pub fn csv_export_links(
    links: &[FileLink],
    labware: &LabwareSnapshot,
    export_root: &str,
) -> Vec<ExportLink> {
    links
        .iter()
        .filter(|link| link.states.allows(labware.state.as_str()))
        .map(|link| ExportLink {
            name: link.name.clone(),
            id: link.id.clone(),
            url: export_url(link, labware, export_root),
        })
        .collect()
}

fn export_url(link: &FileLink, labware: &LabwareSnapshot, export_root: &str) -> String {
    let mut url = format!(
        "{}/{}/{}/exports/{}.{}",
        export_root.trim_end_matches('/'),
        labware.asset_kind.route_segment(),
        labware.uuid,
        link.id,
        link.format
    );
    if !link.params.is_empty() {
        let query: Vec<String> = link
            .params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }
    url
}
