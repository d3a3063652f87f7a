/// Highlighted driver, at most one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected: Option<String>,
}

impl Selection {
    /// Select `code`, or clear when it is already selected or `None`.
    ///
    /// Clicking the highlighted leaderboard row deselects it.
    pub fn select(&mut self, code: Option<&str>) {
        self.selected = match code {
            Some(code) if self.selected.as_deref() != Some(code) => Some(code.to_string()),
            _ => None,
        };
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_same_twice_clears() {
        let mut selection = Selection::default();
        selection.select(Some("VER"));
        assert_eq!(selection.selected(), Some("VER"));
        selection.select(Some("VER"));
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn test_select_other_replaces() {
        let mut selection = Selection::default();
        selection.select(Some("VER"));
        selection.select(Some("LEC"));
        assert_eq!(selection.selected(), Some("LEC"));
    }

    #[test]
    fn test_select_none_clears() {
        let mut selection = Selection::default();
        selection.select(Some("HAM"));
        selection.select(None);
        assert_eq!(selection.selected(), None);

        selection.select(None);
        assert_eq!(selection.selected(), None);
    }
}
