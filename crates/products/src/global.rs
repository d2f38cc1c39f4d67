//! Global (fuzzy) search results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One hit of a global search: record, display name and icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalHit {
    pub model: String,
    pub id: Uuid,
    pub rec_name: String,
    pub icon: Option<String>,
}

/// Give every hit without an icon the `fallback` one.
pub fn with_fallback_icon(
    hits: impl IntoIterator<Item = GlobalHit>,
    fallback: &'static str,
) -> impl Iterator<Item = GlobalHit> {
    hits.into_iter().map(move |mut hit| {
        if hit.icon.is_none() {
            hit.icon = Some(fallback.to_string());
        }
        hit
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_existing_icon() {
        let hits = vec![
            GlobalHit {
                model: "product.product".to_string(),
                id: Uuid::now_v7(),
                rec_name: "Widget".to_string(),
                icon: None,
            },
            GlobalHit {
                model: "product.product".to_string(),
                id: Uuid::now_v7(),
                rec_name: "Gadget".to_string(),
                icon: Some("star".to_string()),
            },
        ];
        let icons: Vec<_> = with_fallback_icon(hits, "box")
            .map(|h| h.icon.unwrap())
            .collect();
        assert_eq!(icons, vec!["box".to_string(), "star".to_string()]);
    }
}
