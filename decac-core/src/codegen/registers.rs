//! Register pool for expression evaluation
//!
//! `acquire` hands out the lowest free register. When every register is busy
//! the highest one is reused: its value is pushed and the register is flagged
//! so that the matching `release` pops it back. Only one outstanding spill is
//! tracked per register; a second exhaustion while the flag is set pushes
//! again but the flag cannot count, so the middle holder's release frees the
//! register without restoring it.

/// Receives the push/pop instructions a spill needs
pub trait SpillEmitter {
    fn emit_push(&mut self, register: u8);
    fn emit_pop(&mut self, register: u8);
}

#[derive(Debug, Clone)]
pub struct RegisterPool {
    first: u8,
    busy: Vec<bool>,
    needs_pop: Vec<bool>,
    touched: Vec<bool>,
    spills: usize,
}

impl RegisterPool {
    /// Registers `first..limit` are allocatable
    pub fn new(first: u8, limit: u8) -> Self {
        let count = usize::from(limit.saturating_sub(first)).max(1);
        RegisterPool {
            first,
            busy: vec![false; count],
            needs_pop: vec![false; count],
            touched: vec![false; count],
            spills: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.busy.len()
    }

    pub fn acquire(&mut self, emitter: &mut impl SpillEmitter) -> u8 {
        let slot = match self.busy.iter().position(|busy| !busy) {
            Some(free) => {
                self.busy[free] = true;
                free
            }
            None => {
                let last = self.busy.len() - 1;
                emitter.emit_push(self.register(last));
                self.needs_pop[last] = true;
                self.spills += 1;
                last
            }
        };
        self.touched[slot] = true;
        self.register(slot)
    }

    pub fn release(&mut self, register: u8, emitter: &mut impl SpillEmitter) {
        let Some(slot) = self.slot(register) else {
            return;
        };
        if self.needs_pop[slot] {
            emitter.emit_pop(register);
            self.needs_pop[slot] = false;
        } else {
            self.busy[slot] = false;
        }
    }

    pub fn is_busy(&self, register: u8) -> bool {
        self.slot(register).is_some_and(|slot| self.busy[slot])
    }

    /// Every register handed out so far, for callee-side saves
    pub fn used_registers(&self) -> Vec<u8> {
        (0..self.touched.len())
            .filter(|slot| self.touched[*slot])
            .map(|slot| self.register(slot))
            .collect()
    }

    /// Number of forced reuses since creation
    pub fn spill_count(&self) -> usize {
        self.spills
    }

    fn register(&self, slot: usize) -> u8 {
        self.first + slot as u8
    }

    fn slot(&self, register: u8) -> Option<usize> {
        let slot = usize::from(register.checked_sub(self.first)?);
        (slot < self.busy.len()).then_some(slot)
    }
}
