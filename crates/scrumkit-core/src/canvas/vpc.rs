//! Value Proposition Canvas.

use serde::{Deserialize, Serialize};

use super::{Canvas, CanvasKind, clean_list};

/// Customer profile on one side, value map on the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValuePropositionCanvas {
    pub customer_jobs: Vec<String>,
    pub pains: Vec<String>,
    pub gains: Vec<String>,
    pub products_and_services: Vec<String>,
    pub pain_relievers: Vec<String>,
    pub gain_creators: Vec<String>,
}

impl ValuePropositionCanvas {
    pub fn customer_profile_size(&self) -> usize {
        self.customer_jobs.len() + self.pains.len() + self.gains.len()
    }

    pub fn value_map_size(&self) -> usize {
        self.products_and_services.len() + self.pain_relievers.len() + self.gain_creators.len()
    }

    /// Pains without any reliever and gains without any creator are
    /// uncovered; a canvas with both sides answered counts as fitting.
    pub fn has_fit(&self) -> bool {
        (self.pains.is_empty() || !self.pain_relievers.is_empty())
            && (self.gains.is_empty() || !self.gain_creators.is_empty())
            && self.customer_profile_size() > 0
    }
}

impl Canvas for ValuePropositionCanvas {
    const KIND: CanvasKind = CanvasKind::ValueProposition;

    fn normalize(&mut self) {
        for list in [
            &mut self.customer_jobs,
            &mut self.pains,
            &mut self.gains,
            &mut self.products_and_services,
            &mut self.pain_relievers,
            &mut self.gain_creators,
        ] {
            clean_list(list);
        }
    }
}
