//! Edge-triggered occupancy: one trigger per continuous sitting.

/// Whether someone is on the seat, as of the last debounced decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OccupancyState {
    #[default]
    Vacant,
    Occupied,
}

/// Fired on the `Vacant -> Occupied` edge only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// 1-based count of sittings seen by this machine
    pub sitting: u64,
}

#[derive(Debug, Default)]
pub struct OccupancyMachine {
    state: OccupancyState,
    sittings: u64,
}

impl OccupancyMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OccupancyState {
        self.state
    }

    /// Number of triggers emitted so far.
    pub fn sittings(&self) -> u64 {
        self.sittings
    }

    /// Feed one debounced decision. Returns a trigger only when the seat goes
    /// from vacant to occupied; staying seated or standing up emit nothing.
    #[must_use]
    pub fn observe(&mut self, occupied_now: bool) -> Option<Trigger> {
        match (self.state, occupied_now) {
            (OccupancyState::Vacant, true) => {
                self.state = OccupancyState::Occupied;
                self.sittings += 1;
                Some(Trigger {
                    sitting: self.sittings,
                })
            }
            (OccupancyState::Occupied, false) => {
                self.state = OccupancyState::Vacant;
                None
            }
            (OccupancyState::Vacant, false) | (OccupancyState::Occupied, true) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_vacant() {
        let m = OccupancyMachine::new();
        assert_eq!(m.state(), OccupancyState::Vacant);
        assert_eq!(m.sittings(), 0);
    }

    #[test]
    fn transition_table() {
        let mut m = OccupancyMachine::new();
        assert_eq!(m.observe(false), None);
        assert_eq!(m.state(), OccupancyState::Vacant);

        assert_eq!(m.observe(true), Some(Trigger { sitting: 1 }));
        assert_eq!(m.state(), OccupancyState::Occupied);

        assert_eq!(m.observe(true), None);
        assert_eq!(m.state(), OccupancyState::Occupied);

        assert_eq!(m.observe(false), None);
        assert_eq!(m.state(), OccupancyState::Vacant);
    }

    #[test]
    fn staying_seated_never_retriggers() {
        let mut m = OccupancyMachine::new();
        let fired = (0..50).filter_map(|_| m.observe(true)).count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn standing_up_rearms() {
        let mut m = OccupancyMachine::new();
        let _ = m.observe(true);
        let _ = m.observe(true);
        let _ = m.observe(false);
        assert_eq!(m.observe(true), Some(Trigger { sitting: 2 }));
        assert_eq!(m.observe(true), None);
        assert_eq!(m.sittings(), 2);
    }
}
