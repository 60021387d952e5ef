//! Progression system - collectible pickup, gate activation and the exit check.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::{Vec2, WorldLayout};
use crate::config::ProgressionTuning;
use crate::events::SimEvent;

/// Collected set and gate flag for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    collected: BTreeSet<usize>,
    required: usize,
    gate_active: bool,
}

impl ProgressionState {
    pub fn new(required: usize) -> Self {
        Self {
            collected: BTreeSet::new(),
            required,
            gate_active: false,
        }
    }

    /// Rebuild from persisted indices. Out-of-range indices are dropped and
    /// the gate is derived from completeness.
    pub fn restore(required: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let collected: BTreeSet<usize> = indices.into_iter().filter(|&i| i < required).collect();
        let gate_active = collected.len() == required;
        Self {
            collected,
            required,
            gate_active,
        }
    }

    /// Mark an index collected. Returns false if it was already held or is out of range.
    pub fn collect(&mut self, index: usize) -> bool {
        index < self.required && self.collected.insert(index)
    }

    pub fn is_collected(&self, index: usize) -> bool {
        self.collected.contains(&index)
    }

    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }

    pub fn collected_indices(&self) -> Vec<usize> {
        self.collected.iter().copied().collect()
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn is_complete(&self) -> bool {
        self.collected.len() == self.required
    }

    pub fn gate_active(&self) -> bool {
        self.gate_active
    }

    /// Open the gate if every collectible is held. True only on the opening call.
    fn try_activate_gate(&mut self) -> bool {
        if !self.gate_active && self.is_complete() {
            self.gate_active = true;
            true
        } else {
            false
        }
    }
}

/// What the progression system produced this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressionStep {
    pub events: Vec<SimEvent>,
    /// The player stood inside the open gate
    pub reached_gate: bool,
}

/// Check pickups, open the gate when complete, and test for the exit.
pub fn update_progression(
    state: &mut ProgressionState,
    layout: &mut WorldLayout,
    player_position: Vec2,
    tuning: &ProgressionTuning,
) -> ProgressionStep {
    let mut step = ProgressionStep::default();

    let in_reach: Vec<usize> = layout
        .collectibles()
        .filter(|(index, c)| {
            !state.is_collected(*index) && player_position.distance(&c.position) < tuning.pickup_radius
        })
        .map(|(index, _)| index)
        .collect();

    for index in in_reach {
        if state.collect(index) {
            layout.set_collectible_visible(index, false);
            let count = state.collected_count();
            log::debug!("Collected #{} ({}/{})", index, count, state.required());
            step.events.push(SimEvent::Collected {
                index,
                count,
                required: state.required(),
                reveal: count.saturating_sub(1).min(state.required().saturating_sub(1)),
            });
        }
    }

    if state.try_activate_gate() {
        log::info!("All {} collectibles held, gate open", state.required());
        step.events.push(SimEvent::GateActivated);
    }

    if state.gate_active() {
        let gate = layout.gate().position;
        step.reached_gate = player_position.distance(&gate) < tuning.gate_entry_radius;
    }

    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EntityKind, PlacedEntity};

    fn layout() -> WorldLayout {
        let entities = (0..3)
            .map(|i| PlacedEntity::new(EntityKind::Collectible, Vec2::new(i as f32 * 10.0, 20.0)))
            .collect();
        WorldLayout::new(
            1,
            50.0,
            entities,
            PlacedEntity::new(EntityKind::Gate, Vec2::new(0.0, -32.0)),
        )
    }

    #[test]
    fn test_pickup_is_idempotent() {
        let tuning = ProgressionTuning::default();
        let mut layout = layout();
        let mut state = ProgressionState::new(3);

        let first = update_progression(&mut state, &mut layout, Vec2::new(10.5, 20.0), &tuning);
        assert_eq!(
            first.events,
            vec![SimEvent::Collected {
                index: 1,
                count: 1,
                required: 3,
                reveal: 0
            }]
        );
        assert_eq!(layout.visible_collectibles(), vec![0, 2]);

        let again = update_progression(&mut state, &mut layout, Vec2::new(10.5, 20.0), &tuning);
        assert!(again.events.is_empty());
        assert_eq!(state.collected_count(), 1);
    }

    #[test]
    fn test_gate_opens_once_at_completion() {
        let tuning = ProgressionTuning::default();
        let mut layout = layout();
        let mut state = ProgressionState::new(3);
        let mut gate_events = 0;

        for i in [2, 0, 1, 1, 0] {
            let at = Vec2::new(i as f32 * 10.0, 20.0);
            let step = update_progression(&mut state, &mut layout, at, &tuning);
            let opened = step.events.contains(&SimEvent::GateActivated);
            if opened {
                gate_events += 1;
                assert_eq!(state.collected_count(), 3);
            } else if gate_events == 0 {
                assert!(!state.gate_active());
            }
        }
        assert_eq!(gate_events, 1);
        assert!(state.gate_active());
    }

    #[test]
    fn test_gate_only_counts_when_open() {
        let tuning = ProgressionTuning::default();
        let mut layout = layout();
        let mut state = ProgressionState::new(3);
        let at_gate = Vec2::new(0.0, -31.0);
        assert!(!update_progression(&mut state, &mut layout, at_gate, &tuning).reached_gate);

        let mut done = ProgressionState::restore(3, [0, 1, 2]);
        assert!(done.gate_active());
        assert!(update_progression(&mut done, &mut layout, at_gate, &tuning).reached_gate);
    }

    #[test]
    fn test_restore_drops_out_of_range() {
        let state = ProgressionState::restore(5, [0, 2, 2, 9]);
        assert_eq!(state.collected_indices(), vec![0, 2]);
        assert!(!state.gate_active());
    }

    #[test]
    fn test_collect_rejects_unknown_index() {
        let mut state = ProgressionState::new(2);
        assert!(!state.collect(2));
        assert!(state.collect(1));
        assert!(!state.collect(1));
    }
}
