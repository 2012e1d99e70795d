//! Built-in titles shown when the API returns nothing usable.

use crate::types::CatalogItem;

const TITLES: [(&str, &str, &str); 12] = [
    ("The CEO Above Me", "A love story between a CEO and an employee", "Romance"),
    ("Love in Spring", "A beautiful springtime romance", "Romance"),
    ("The General and the Princess", "A historical epic of royal romance", "Historical"),
    ("Metropolis Love", "Love in the modern city", "Modern"),
    ("Legend of the White Dragon", "A fantasy about a dragon legend", "Fantasy"),
    ("Detective in Ancient City", "A detective mystery in an old city", "Mystery"),
    ("Love in Campus", "Young love on campus", "Romance"),
    ("Imperial Consort", "The story of a powerful imperial consort", "Historical"),
    ("Business Tycoon", "Business drama and romance", "Business"),
    ("The Last Princess", "The adventures of the last princess", "Adventure"),
    ("Modern Fairy Tale", "A modern love fairy tale", "Fantasy"),
    ("Secret Agent Love", "Love between secret agents", "Action"),
];

/// Most results a filtered fallback returns.
pub const SEARCH_LIMIT: usize = 12;

pub fn items() -> Vec<CatalogItem> {
    TITLES
        .iter()
        .enumerate()
        .map(|(i, (title, description, genre))| CatalogItem {
            book_id: format!("42000000{}", 720 + i),
            title: title.to_string(),
            cover: format!("https://picsum.photos/300/200?random={}", i + 100),
            description: description.to_string(),
            genre: genre.to_string(),
            tags: vec![genre.to_string()],
            rating: ((80 + i) as f64) / 10.0,
            play_count: "0".to_string(),
            chapter_count: 0,
            is_new: false,
            rank: None,
        })
        .collect()
}

/// Sample items matching `query` in title, description or genre, case-insensitively.
pub fn search(query: &str) -> Vec<CatalogItem> {
    let q = query.trim().to_lowercase();
    items()
        .into_iter()
        .filter(|d| {
            d.title.to_lowercase().contains(&q)
                || d.description.to_lowercase().contains(&q)
                || d.genre.to_lowercase().contains(&q)
        })
        .take(SEARCH_LIMIT)
        .collect()
}

/// `items()[from..]`, at most `len` entries.
pub fn slice(from: usize, len: usize) -> Vec<CatalogItem> {
    items().into_iter().skip(from).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_distinct_titles() {
        let all = items();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0].book_id, "42000000720");
        assert_eq!(all[11].book_id, "42000000731");
        assert_eq!(all[3].rating, 8.3);
    }

    #[test]
    fn search_matches_any_text_field() {
        assert_eq!(search("PRINCESS").len(), 2);
        assert_eq!(search("historical").len(), 2);
        assert_eq!(search("campus")[0].title, "Love in Campus");
        assert!(search("zzz").is_empty());
    }

    #[test]
    fn slices_are_clamped() {
        assert_eq!(slice(0, 12).len(), 12);
        assert_eq!(slice(6, 12).len(), 6);
        assert!(slice(20, 5).is_empty());
    }
}
