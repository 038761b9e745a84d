//! Fixed-capacity particle ring buffer.

use rayon::prelude::*;

use crate::space::Space;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle<V> {
    pub position: V,
    pub velocity: V,
    /// Simulation clock reading at spawn, in seconds.
    pub birth_time: f32,
}

impl<V: Space> Particle<V> {
    pub fn age(&self, now: f32) -> f32 {
        now - self.birth_time
    }
}

/// One particle stream. Storage is reserved up front and never grows past
/// `capacity`; once full, every spawn overwrites the slot under the cursor,
/// which is always the oldest particle.
#[derive(Clone, Debug)]
pub struct ParticlePool<V> {
    slots: Vec<Particle<V>>,
    capacity: usize,
    cursor: usize,
    spawned: u64,
}

impl<V: Space> ParticlePool<V> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "particle pool needs at least one slot");
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            spawned: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots, never more than `capacity`.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot the next spawn will write.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total spawns over the pool's lifetime.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Writes `particle` at the cursor and advances it modulo capacity.
    /// Returns the slot written.
    pub fn spawn(&mut self, particle: Particle<V>) -> usize {
        let slot = self.cursor;
        if slot < self.slots.len() {
            debug_assert!(particle.birth_time >= self.slots[slot].birth_time);
            self.slots[slot] = particle;
        } else {
            self.slots.push(particle);
        }
        self.cursor = (self.cursor + 1) % self.capacity;
        self.spawned += 1;
        slot
    }

    pub fn get(&self, slot: usize) -> Option<&Particle<V>> {
        self.slots.get(slot)
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Particle<V>> {
        self.slots.iter()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle<V>] {
        &mut self.slots
    }

    fn oldest_slot(&self) -> usize {
        if self.slots.len() < self.capacity { 0 } else { self.cursor }
    }

    /// Occupied slots from oldest to newest spawn.
    pub fn oldest_first(&self) -> impl Iterator<Item = &Particle<V>> + '_ {
        let len = self.slots.len();
        let start = self.oldest_slot();
        (0..len).map(move |k| &self.slots[(start + k) % len])
    }

    /// Parallel counterpart of [`oldest_first`](Self::oldest_first); keeps the same order
    /// when collected.
    pub fn par_oldest_first(&self) -> impl IndexedParallelIterator<Item = &Particle<V>> + '_ {
        let len = self.slots.len();
        let start = self.oldest_slot();
        (0..len).into_par_iter().map(move |k| &self.slots[(start + k) % len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector2, vec2};

    fn born(t: f32) -> Particle<Vector2<f32>> {
        Particle {
            position: vec2(t, 0.0),
            velocity: vec2(0.0, 0.0),
            birth_time: t,
        }
    }

    #[test]
    fn cursor_wraps_after_capacity_spawns() {
        let mut pool = ParticlePool::new(4);
        let slots: Vec<usize> = (0..6).map(|i| pool.spawn(born(i as f32))).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 0, 1]);
        assert_eq!(pool.cursor(), 2);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.spawned(), 6);
    }

    #[test]
    fn overwrite_replaces_oldest() {
        let mut pool = ParticlePool::new(3);
        for i in 0..5 {
            pool.spawn(born(i as f32));
        }
        let births: Vec<f32> = pool.iter().map(|p| p.birth_time).collect();
        assert_eq!(births, vec![3.0, 4.0, 2.0]);
        let ordered: Vec<f32> = pool.oldest_first().map(|p| p.birth_time).collect();
        assert_eq!(ordered, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn partial_pool_is_chronological_from_slot_zero() {
        let mut pool = ParticlePool::new(8);
        pool.spawn(born(1.0));
        pool.spawn(born(2.0));
        let ordered: Vec<f32> = pool.par_oldest_first().map(|p| p.birth_time).collect();
        assert_eq!(ordered, vec![1.0, 2.0]);
        assert!(pool.get(2).is_none());
    }


    #[test]
    #[should_panic]
    fn zero_capacity_is_rejected() {
        let _ = ParticlePool::<Vector2<f32>>::new(0);
    }
}
