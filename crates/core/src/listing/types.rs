use serde::{Deserialize, Serialize};

/// A scraped property listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Asking price in PLN.
    pub price: i64,
    /// Floor area in square metres.
    #[serde(default)]
    pub area: Option<i64>,
    #[serde(default)]
    pub rooms: Option<i64>,
    /// Floor number; 0 is the ground floor.
    #[serde(default)]
    pub level: Option<i64>,
    pub address: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Unique across the store.
    pub link: String,
    pub site: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl Listing {
    /// Checks field bounds before a row is offered to the store.
    pub fn validate(&self, known_sites: &[String]) -> Result<(), String> {
        check_len("id", &self.id, 1, 50)?;
        check_len("title", &self.title, 1, 500)?;
        check_len("address", &self.address, 1, 1000)?;

        if self.price < 0 {
            return Err(format!("price must be non-negative, got {}", self.price));
        }
        if matches!(self.area, Some(area) if area < 0) {
            return Err("area must be non-negative".to_string());
        }

        if !known_sites.iter().any(|s| s == self.site.trim()) {
            return Err(format!("unknown site '{}'", self.site));
        }

        let link = self.link.trim();
        if !(link.starts_with("http://") || link.starts_with("https://")) {
            return Err(format!("link is not an http(s) URL: {}", self.link));
        }
        if link.chars().count() > 1000 {
            return Err("link is longer than 1000 characters".to_string());
        }

        if let Some(ref image) = self.image {
            if image.trim().chars().count() > 1000 {
                return Err("image is longer than 1000 characters".to_string());
            }
        }
        if let Some(ref city) = self.city {
            check_len("city", city, 1, 100)?;
        }

        Ok(())
    }
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(format!(
            "{} must be between {} and {} characters, got {}",
            field, min, max, len
        ));
    }
    Ok(())
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    pub total: usize,
    pub saved: usize,
    /// Rows whose id or link was already stored.
    pub skipped: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> Vec<String> {
        vec!["olx".to_string(), "otodom".to_string()]
    }

    fn listing() -> Listing {
        Listing {
            id: "olx-1".to_string(),
            title: "Mieszkanie 2 pokoje".to_string(),
            price: 450_000,
            area: Some(48),
            rooms: Some(2),
            level: Some(3),
            address: "Katowice, Ligota".to_string(),
            image: None,
            link: "https://www.olx.pl/d/oferta/1".to_string(),
            site: "olx".to_string(),
            city: Some("katowice".to_string()),
        }
    }

    #[test]
    fn test_valid_listing() {
        assert!(listing().validate(&sites()).is_ok());
    }

    #[test]
    fn test_rejects_unknown_site() {
        let mut l = listing();
        l.site = "gumtree".to_string();
        assert!(l.validate(&sites()).unwrap_err().contains("gumtree"));
    }

    #[test]
    fn test_rejects_negative_price() {
        let mut l = listing();
        l.price = -1;
        assert!(l.validate(&sites()).is_err());
    }

    #[test]
    fn test_rejects_non_url_link() {
        let mut l = listing();
        l.link = "olx.pl/oferta".to_string();
        assert!(l.validate(&sites()).is_err());
    }

    #[test]
    fn test_rejects_blank_title() {
        let mut l = listing();
        l.title = "   ".to_string();
        assert!(l.validate(&sites()).is_err());
    }

    #[test]
    fn test_optional_fields_deserialize_missing() {
        let json = r#"{
            "id": "x", "title": "t", "price": 1, "address": "a",
            "link": "https://example.com/1", "site": "olx"
        }"#;
        let l: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(l.area, None);
        assert_eq!(l.city, None);
    }
}
