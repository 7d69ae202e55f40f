//! Business Model Canvas.

use serde::{Deserialize, Serialize};

use super::{Canvas, CanvasKind};

/// The nine building blocks, each kept as free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessModelCanvas {
    pub key_partners: String,
    pub key_activities: String,
    pub key_resources: String,
    pub value_propositions: String,
    pub customer_relationships: String,
    pub channels: String,
    pub customer_segments: String,
    pub cost_structure: String,
    pub revenue_streams: String,
}

impl BusinessModelCanvas {
    /// Block labels paired with their contents, in canvas reading order.
    pub fn blocks(&self) -> [(&'static str, &str); 9] {
        [
            ("Key Partners", self.key_partners.as_str()),
            ("Key Activities", self.key_activities.as_str()),
            ("Key Resources", self.key_resources.as_str()),
            ("Value Propositions", self.value_propositions.as_str()),
            ("Customer Relationships", self.customer_relationships.as_str()),
            ("Channels", self.channels.as_str()),
            ("Customer Segments", self.customer_segments.as_str()),
            ("Cost Structure", self.cost_structure.as_str()),
            ("Revenue Streams", self.revenue_streams.as_str()),
        ]
    }

    pub fn filled_blocks(&self) -> usize {
        self.blocks().iter().filter(|(_, text)| !text.trim().is_empty()).count()
    }
}

impl Canvas for BusinessModelCanvas {
    const KIND: CanvasKind = CanvasKind::BusinessModel;

    fn normalize(&mut self) {
        for block in [
            &mut self.key_partners,
            &mut self.key_activities,
            &mut self.key_resources,
            &mut self.value_propositions,
            &mut self.customer_relationships,
            &mut self.channels,
            &mut self.customer_segments,
            &mut self.cost_structure,
            &mut self.revenue_streams,
        ] {
            *block = block.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_blocks_ignores_whitespace() {
        let mut canvas = BusinessModelCanvas {
            channels: "Web shop".into(),
            revenue_streams: "   ".into(),
            ..BusinessModelCanvas::default()
        };
        assert_eq!(canvas.filled_blocks(), 1);
        canvas.normalize();
        assert_eq!(canvas.revenue_streams, "");
    }

    #[test]
    fn test_partial_document_decodes() {
        let canvas: BusinessModelCanvas =
            serde_json::from_value(serde_json::json!({"keyPartners": "Banks"})).unwrap();
        assert_eq!(canvas.key_partners, "Banks");
        assert!(canvas.channels.is_empty());
    }
}
