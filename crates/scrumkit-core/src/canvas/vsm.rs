//! Value Stream Map and its flow metrics.

use serde::{Deserialize, Serialize};

use super::{Canvas, CanvasKind, item_id};

/// One step of the value stream. Times share whatever unit the team picked
/// (usually minutes or hours).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub process_time: f64,
    pub wait_time: f64,
    pub value_adding: bool,
    pub owner: String,
}

impl ProcessStep {
    pub fn new(name: impl Into<String>, process_time: f64, wait_time: f64, value_adding: bool) -> Self {
        Self {
            id: item_id(),
            name: name.into(),
            process_time,
            wait_time,
            value_adding,
            ..Self::default()
        }
    }

    pub fn total_time(&self) -> f64 {
        self.process_time + self.wait_time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueStreamMap {
    pub name: String,
    pub description: String,
    pub steps: Vec<ProcessStep>,
}

/// Flow metrics derived from the steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsmMetrics {
    pub lead_time: f64,
    pub total_process_time: f64,
    pub total_wait_time: f64,
    pub value_added_time: f64,
    /// Value-added time as a percentage of lead time.
    pub process_cycle_efficiency: f64,
    /// Step with the longest wait.
    pub bottleneck: Option<ProcessStep>,
    pub step_count: usize,
}

impl ValueStreamMap {
    pub fn metrics(&self) -> VsmMetrics {
        let total_process_time: f64 = self.steps.iter().map(|s| s.process_time).sum();
        let total_wait_time: f64 = self.steps.iter().map(|s| s.wait_time).sum();
        let value_added_time: f64 = self
            .steps
            .iter()
            .filter(|s| s.value_adding)
            .map(|s| s.process_time)
            .sum();
        let lead_time = total_process_time + total_wait_time;
        let process_cycle_efficiency = if lead_time > 0.0 {
            value_added_time / lead_time * 100.0
        } else {
            0.0
        };

        // First step wins on ties.
        let bottleneck = self
            .steps
            .iter()
            .fold(None::<&ProcessStep>, |best, step| match best {
                Some(b) if b.wait_time >= step.wait_time => Some(b),
                _ => Some(step),
            })
            .cloned();

        VsmMetrics {
            lead_time,
            total_process_time,
            total_wait_time,
            value_added_time,
            process_cycle_efficiency,
            bottleneck,
            step_count: self.steps.len(),
        }
    }

    /// Append a step, returning its id.
    pub fn add_step(&mut self, mut step: ProcessStep) -> String {
        if step.id.is_empty() {
            step.id = item_id();
        }
        let id = step.id.clone();
        self.steps.push(step);
        id
    }

    pub fn remove_step(&mut self, id: &str) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != id);
        self.steps.len() != before
    }
}

impl Canvas for ValueStreamMap {
    const KIND: CanvasKind = CanvasKind::ValueStream;

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        for step in &mut self.steps {
            if step.id.trim().is_empty() {
                step.id = item_id();
            }
            step.name = step.name.trim().to_string();
            step.process_time = step.process_time.max(0.0);
            step.wait_time = step.wait_time.max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValueStreamMap {
        ValueStreamMap {
            name: "Order to cash".into(),
            description: String::new(),
            steps: vec![
                ProcessStep::new("Intake", 10.0, 30.0, true),
                ProcessStep::new("Approval", 5.0, 120.0, false),
                ProcessStep::new("Fulfil", 40.0, 15.0, true),
            ],
        }
    }

    #[test]
    fn test_metrics() {
        let m = sample().metrics();
        assert_eq!(m.lead_time, 220.0);
        assert_eq!(m.total_process_time, 55.0);
        assert_eq!(m.total_wait_time, 165.0);
        assert_eq!(m.value_added_time, 50.0);
        assert!((m.process_cycle_efficiency - 50.0 / 220.0 * 100.0).abs() < 1e-9);
        assert_eq!(m.bottleneck.unwrap().name, "Approval");
        assert_eq!(m.step_count, 3);
    }

    #[test]
    fn test_empty_map_has_no_bottleneck() {
        let m = ValueStreamMap::default().metrics();
        assert_eq!(m.lead_time, 0.0);
        assert_eq!(m.process_cycle_efficiency, 0.0);
        assert!(m.bottleneck.is_none());
        assert_eq!(m.step_count, 0);
    }

    #[test]
    fn test_normalize_assigns_missing_ids() {
        let mut map = ValueStreamMap {
            steps: vec![ProcessStep {
                name: " Review ".into(),
                wait_time: -3.0,
                ..ProcessStep::default()
            }],
            ..ValueStreamMap::default()
        };
        map.normalize();
        assert!(!map.steps[0].id.is_empty());
        assert_eq!(map.steps[0].name, "Review");
        assert_eq!(map.steps[0].wait_time, 0.0);
    }

    #[test]
    fn test_add_and_remove_step() {
        let mut map = sample();
        let id = map.add_step(ProcessStep {
            name: "Invoice".into(),
            ..ProcessStep::default()
        });
        assert_eq!(map.steps.len(), 4);
        assert!(map.remove_step(&id));
        assert!(!map.remove_step(&id));
    }
}
