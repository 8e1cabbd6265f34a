//! Skeleton placeholders shown while deferred content is produced.

/// Shape of the placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkeletonKind {
    #[default]
    Component,
    List,
    Page,
    Form,
}

impl SkeletonKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::List => "list",
            Self::Page => "page",
            Self::Form => "form",
        }
    }

    /// Number of placeholder rows.
    const fn rows(self) -> usize {
        match self {
            Self::Component => 1,
            Self::List => 5,
            Self::Page => 3,
            Self::Form => 4,
        }
    }

    pub(super) fn render(self, id: &str) -> String {
        let kind = self.as_str();
        let rows = "<div class=\"pw-skeleton-row\"></div>".repeat(self.rows());
        format!(
            r#"<div id="{id}" class="pw-skeleton pw-skeleton-{kind}" aria-busy="true">{rows}</div>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::target::{SkeletonKind, Target};

    #[test]
    fn test_skeleton_carries_target_id() {
        let target = Target::new();
        let html = target.skeleton(SkeletonKind::List);
        assert!(html.starts_with(&format!(r#"<div id="{}""#, target.id())));
        assert!(html.contains("pw-skeleton-list"));
        assert_eq!(html.matches("pw-skeleton-row").count(), 5);
    }

    #[test]
    fn test_skeleton_kinds() {
        let target = Target::with_id("panel");
        for kind in [
            SkeletonKind::Component,
            SkeletonKind::List,
            SkeletonKind::Page,
            SkeletonKind::Form,
        ] {
            let html = target.skeleton(kind);
            assert!(html.contains(r#"id="panel""#));
            assert!(html.contains(&format!("pw-skeleton-{}", kind.as_str())));
        }
    }
}
