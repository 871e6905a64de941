//! Size Detector

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::traits;
use crate::core::change::{Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct SizeDetector {
    config: DetectionConfig,
}

impl SizeDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for SizeDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Size
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        match (traits::size(old), traits::size(new)) {
            (Some(old_size), Some(new_size)) if old_size != new_size => {
                vec![builder.change(
                    "size",
                    Some(json!(old_size)),
                    Some(json!(new_size)),
                    ChangeKind::Modified,
                    Category::BasicInfo,
                    format!("Size changed from {old_size} to {new_size}"),
                )]
            }
            (None, Some(new_size)) => vec![builder.change(
                "size",
                None,
                Some(json!(new_size)),
                ChangeKind::Added,
                Category::BasicInfo,
                format!("Size set: {new_size}"),
            )],
            (Some(old_size), None) => vec![builder.change(
                "size",
                Some(json!(old_size)),
                None,
                ChangeKind::Removed,
                Category::BasicInfo,
                format!("Size removed (was {old_size})"),
            )],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SizeDetector {
        SizeDetector::new(DetectionConfig::default())
    }

    #[test]
    fn test_size_change_by_id() {
        let old = CharacterDocument::new(json!({"sizeId": 4}));
        let new = CharacterDocument::new(json!({"sizeId": 3}));
        let changes = detector().detect(&old, &new, &DetectionContext::default());
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].description,
            "Size changed from Medium to Small"
        );
    }

    #[test]
    fn test_no_op() {
        let doc = CharacterDocument::new(json!({"size": "Medium"}));
        assert!(detector()
            .detect(&doc, &doc, &DetectionContext::default())
            .is_empty());
    }
}
