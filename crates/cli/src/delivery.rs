use libris_lending::{ContentDelivery, ContentGrant};

/// Turns a grant into a time-limited download link under `base_url`.
#[derive(Debug, Clone)]
pub struct LinkDelivery {
    base_url: String,
}

impl LinkDelivery {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl ContentDelivery for LinkDelivery {
    type Output = String;

    fn deliver(&self, grant: &ContentGrant) -> String {
        tracing::debug!(item_id = %grant.item_id, title = %grant.title, "issuing download link");
        format!(
            "{}{}?account={}&expires={}",
            self.base_url,
            grant.content_ref,
            grant.account_id,
            grant.valid_until.timestamp()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use libris_core::{AccountId, ItemId};

    #[test]
    fn link_carries_ref_and_expiry() {
        let grant = ContentGrant {
            item_id: ItemId::new(),
            account_id: AccountId::new(),
            content_ref: "/books/1984.pdf".into(),
            title: "1984".into(),
            valid_until: Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        };
        let link = LinkDelivery::new("https://cdn.example.org/").deliver(&grant);
        assert!(link.starts_with("https://cdn.example.org/books/1984.pdf?account="));
        assert!(link.ends_with("&expires=1704672000"));
    }
}
