use serde::Deserialize;

/// Helix APIの共通レスポンス形式
#[derive(Debug, Clone, Deserialize)]
pub struct HelixResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub cursor: Option<String>,
}

impl<T> HelixResponse<T> {
    pub fn into_first(self) -> Option<T> {
        self.data.into_iter().next()
    }
}
