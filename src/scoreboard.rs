use std::cmp::Reverse;

use strum::IntoEnumIterator;

use crate::bus::{Broadcast, ResultBuses};
use crate::inst::{Tag, UnitClass};

/// A functional unit is in exactly one population at any instant, and the
/// transitions are one-directional: available -> busy -> completed ->
/// available, no skipping.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnitState {
    Available,
    Busy {
        tag: Tag,
        dest: Option<u8>,
    },
    Completed {
        tag: Tag,
        dest: Option<u8>,
        /// Cycles spent completed but unbroadcast; ages every cycle the
        /// unit loses bus arbitration so that starvation is bounded.
        cycles_stalled: u64,
    },
}

#[derive(Debug, Clone)]
pub struct FunctionUnit {
    pub class: UnitClass,
    pub state: UnitState,
}

/// Owns all functional units: class matching at issue, busy -> completed
/// transitions, and bus arbitration for completed results.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    units: Vec<FunctionUnit>,
}

impl Scoreboard {
    pub fn new(k0: usize, k1: usize, k2: usize) -> Self {
        let mut units = Vec::with_capacity(k0 + k1 + k2);
        for (class, count) in UnitClass::iter().zip([k0, k1, k2]) {
            units.extend((0..count).map(|_| FunctionUnit {
                class,
                state: UnitState::Available,
            }));
        }

        Self { units }
    }

    /// Claim the first available unit of `class` for the instruction
    /// `tag`. No fairness among equal candidates; the scheduling
    /// bottleneck is at dispatch, not unit selection.
    pub fn try_issue(&mut self, class: UnitClass, tag: Tag, dest: Option<u8>) -> bool {
        match self
            .units
            .iter_mut()
            .find(|u| u.class == class && u.state == UnitState::Available)
        {
            Some(unit) => {
                unit.state = UnitState::Busy { tag, dest };
                true
            }
            None => false,
        }
    }

    /// Execution latency is one cycle once fired: every busy unit
    /// completes unconditionally.
    pub fn complete_busy_units(&mut self) {
        for unit in &mut self.units {
            if let UnitState::Busy { tag, dest } = unit.state {
                unit.state = UnitState::Completed {
                    tag,
                    dest,
                    cycles_stalled: 0,
                };
            }
        }
    }

    /// Arbitrate completed units onto idle buses: longest-stalled first,
    /// ties to the lowest tag (oldest instruction). Each idle bus takes at
    /// most one unit; units left over age their stall counters.
    pub fn broadcast(&mut self, buses: &mut ResultBuses) -> usize {
        let mut published = 0;

        for slot in 0..buses.len() {
            if !buses.is_idle(slot) {
                continue;
            }

            let winner = self
                .units
                .iter()
                .enumerate()
                .filter_map(|(i, u)| match u.state {
                    UnitState::Completed {
                        tag,
                        dest,
                        cycles_stalled,
                    } => Some((i, tag, dest, cycles_stalled)),
                    _ => None,
                })
                .max_by_key(|&(_, tag, _, stalled)| (stalled, Reverse(tag)));

            let Some((idx, tag, dest, _)) = winner else {
                break;
            };

            buses.publish(slot, Broadcast { tag, dest });
            self.units[idx].state = UnitState::Available;
            published += 1;
        }

        for unit in &mut self.units {
            if let UnitState::Completed { cycles_stalled, .. } = &mut unit.state {
                *cycles_stalled += 1;
            }
        }

        published
    }

    pub fn units(&self) -> &[FunctionUnit] {
        &self.units
    }

    #[cfg(test)]
    fn force_completed(&mut self, idx: usize, tag: Tag, cycles_stalled: u64) {
        self.units[idx].state = UnitState::Completed {
            tag,
            dest: None,
            cycles_stalled,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn completed_tags(sb: &Scoreboard) -> Vec<Tag> {
        sb.units()
            .iter()
            .filter_map(|u| match u.state {
                UnitState::Completed { tag, .. } => Some(tag),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_issue_matches_class() {
        let mut sb = Scoreboard::new(1, 0, 2);

        assert!(sb.try_issue(UnitClass::K0, Tag(0), None));
        assert!(!sb.try_issue(UnitClass::K0, Tag(1), None));
        assert!(!sb.try_issue(UnitClass::K1, Tag(2), None));
        assert!(sb.try_issue(UnitClass::K2, Tag(3), Some(1)));
        assert!(sb.try_issue(UnitClass::K2, Tag(4), None));
        assert!(!sb.try_issue(UnitClass::K2, Tag(5), None));
    }

    #[test]
    fn test_busy_units_complete_unconditionally() {
        let mut sb = Scoreboard::new(2, 0, 0);
        assert!(sb.try_issue(UnitClass::K0, Tag(0), Some(3)));

        sb.complete_busy_units();
        assert_eq!(
            sb.units()[0].state,
            UnitState::Completed {
                tag: Tag(0),
                dest: Some(3),
                cycles_stalled: 0
            }
        );
        assert_eq!(sb.units()[1].state, UnitState::Available);
    }

    #[test]
    fn test_broadcast_prefers_longest_stalled() {
        let mut sb = Scoreboard::new(2, 0, 0);
        sb.force_completed(0, Tag(1), 1);
        sb.force_completed(1, Tag(9), 3);

        let mut buses = ResultBuses::new(1);
        assert_eq!(sb.broadcast(&mut buses), 1);

        let on_bus = buses.active().collect::<Vec<_>>();
        assert_eq!(on_bus[0].tag, Tag(9));

        // The loser ages while it waits.
        assert_eq!(completed_tags(&sb), vec![Tag(1)]);
        assert_eq!(
            sb.units()[0].state,
            UnitState::Completed {
                tag: Tag(1),
                dest: None,
                cycles_stalled: 2
            }
        );
    }

    #[test]
    fn test_broadcast_ties_go_to_oldest_tag() {
        let mut sb = Scoreboard::new(2, 0, 0);
        sb.force_completed(0, Tag(5), 2);
        sb.force_completed(1, Tag(2), 2);

        let mut buses = ResultBuses::new(1);
        assert_eq!(sb.broadcast(&mut buses), 1);
        assert_eq!(buses.active().next().map(|b| b.tag), Some(Tag(2)));
        assert_eq!(completed_tags(&sb), vec![Tag(5)]);
    }

    #[test]
    fn test_each_idle_bus_takes_one_unit() {
        let mut sb = Scoreboard::new(3, 0, 0);
        sb.force_completed(0, Tag(0), 0);
        sb.force_completed(1, Tag(1), 0);
        sb.force_completed(2, Tag(2), 0);

        let mut buses = ResultBuses::new(2);
        assert_eq!(sb.broadcast(&mut buses), 2);

        let mut tags = buses.active().map(|b| b.tag).collect::<Vec<_>>();
        tags.sort();
        assert_eq!(tags, vec![Tag(0), Tag(1)]);
        assert_eq!(completed_tags(&sb), vec![Tag(2)]);
    }
}
