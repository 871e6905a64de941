//! Alignment Detector

use serde_json::json;

use crate::config::DetectionConfig;
use crate::core::accessors::traits;
use crate::core::change::{Category, ChangeKind, FieldChange};
use crate::core::context::DetectionContext;
use crate::core::document::CharacterDocument;

use super::{ChangeBuilder, ChangeDetector, DetectorKind};

pub struct AlignmentDetector {
    config: DetectionConfig,
}

impl AlignmentDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }
}

impl ChangeDetector for AlignmentDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Alignment
    }

    fn detect(
        &self,
        old: &CharacterDocument,
        new: &CharacterDocument,
        _ctx: &DetectionContext,
    ) -> Vec<FieldChange> {
        let builder = ChangeBuilder::new(self.kind(), &self.config);
        match (traits::alignment(old), traits::alignment(new)) {
            (Some(old_alignment), Some(new_alignment)) if old_alignment != new_alignment => {
                vec![builder.change(
                    "alignment",
                    Some(json!(old_alignment)),
                    Some(json!(new_alignment)),
                    ChangeKind::Modified,
                    Category::BasicInfo,
                    format!("Alignment changed from {old_alignment} to {new_alignment}"),
                )]
            }
            (None, Some(new_alignment)) => vec![builder.change(
                "alignment",
                None,
                Some(json!(new_alignment)),
                ChangeKind::Added,
                Category::BasicInfo,
                format!("Alignment set: {new_alignment}"),
            )],
            (Some(old_alignment), None) => vec![builder.change(
                "alignment",
                Some(json!(old_alignment)),
                None,
                ChangeKind::Removed,
                Category::BasicInfo,
                format!("Alignment removed (was {old_alignment})"),
            )],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> AlignmentDetector {
        AlignmentDetector::new(DetectionConfig::default())
    }

    #[test]
    fn test_alignment_change_across_shapes() {
        // Old stores a numeric id, new stores the display string.
        let old = CharacterDocument::new(json!({"alignmentId": 1}));
        let new = CharacterDocument::new(json!({"alignment": "Chaotic Neutral"}));
        let changes = detector().detect(&old, &new, &DetectionContext::default());
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].description,
            "Alignment changed from Lawful Good to Chaotic Neutral"
        );
    }

    #[test]
    fn test_same_alignment_different_shape_is_no_op() {
        let old = CharacterDocument::new(json!({"alignmentId": 2}));
        let new = CharacterDocument::new(json!({"alignment": "Neutral Good"}));
        assert!(detector()
            .detect(&old, &new, &DetectionContext::default())
            .is_empty());
    }

    #[test]
    fn test_no_op() {
        let doc = CharacterDocument::new(json!({"alignment": "True Neutral"}));
        assert!(detector()
            .detect(&doc, &doc, &DetectionContext::default())
            .is_empty());
    }
}
