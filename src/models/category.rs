#[derive(Debug, Clone)]
pub struct Category {
    pub id: Option<i64>,
    pub title: String,
    pub created_at: String,
}

impl Category {
    pub fn new(title: String) -> Self {
        Self {
            id: None,
            title,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Find a category by exact title in a slice. The first match wins.
    pub fn find_by_title<'a>(categories: &'a [Category], title: &str) -> Option<&'a Category> {
        categories.iter().find(|c| c.title == title)
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}
