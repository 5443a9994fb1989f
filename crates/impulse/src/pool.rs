//! # Object Pools
//!
//! Free lists for the short-lived values the per-step hot loop churns through
//! (contact constraints, their rows, scratch buffers). An object handed out by
//! a pool is owned by the caller until it is given back; giving it back twice
//! or never is a caller bug and is not detected.
//!
//! [`Pool`] is a single typed free list. [`ObjectPool`] is a registry of typed
//! pools addressed by a string key, for callers that manage several object
//! kinds through one handle.

use std::any::Any;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use crate::error::PhysicsError;

/// Free list of reusable `T` values
pub struct Pool<T> {
    free: Vec<T>,
    factory: fn() -> T,
    created: usize,
}

impl<T> Pool<T> {
    #[must_use]
    pub fn new(factory: fn() -> T) -> Self {
        Self {
            free: Vec::new(),
            factory,
            created: 0,
        }
    }

    /// Take an object, reusing the most recently freed one before building a
    /// new one
    pub fn get(&mut self) -> T {
        match self.free.pop() {
            Some(object) => object,
            None => {
                self.created += 1;
                (self.factory)()
            }
        }
    }

    /// Return an object for reuse
    pub fn free(&mut self, object: T) {
        self.free.push(object);
    }

    /// Take an object that goes back to the pool when the guard is dropped
    pub fn scoped(&mut self) -> Pooled<'_, T> {
        let value = self.get();
        Pooled {
            pool: self,
            value: Some(value),
        }
    }

    /// Objects currently waiting for reuse
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Objects ever built by the factory
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }
}

/// Scoped acquisition from a [`Pool`]; releases on drop, including early
/// returns
pub struct Pooled<'a, T> {
    pool: &'a mut Pool<T>,
    value: Option<T>,
}

impl<T> Pooled<'_, T> {
    /// Keep the object past the guard's scope. The caller becomes responsible
    /// for freeing it.
    #[must_use]
    pub fn into_inner(mut self) -> T {
        match self.value.take() {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop or into_inner"),
        }
    }
}

impl<T> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop or into_inner"),
        }
    }
}

impl<T> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop or into_inner"),
        }
    }
}

impl<T> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.free(value);
        }
    }
}

/// Registry of typed pools keyed by name
#[derive(Default)]
pub struct ObjectPool {
    pools: HashMap<&'static str, Box<dyn Any>>,
}

impl ObjectPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the pool for `key`
    pub fn register_type<T: 'static>(&mut self, key: &'static str, factory: fn() -> T) {
        self.pools.insert(key, Box::new(Pool::new(factory)));
    }

    #[must_use]
    pub fn is_registered(&self, key: &'static str) -> bool {
        self.pools.contains_key(key)
    }

    /// Direct access to the typed pool behind `key`
    ///
    /// # Errors
    ///
    /// Fails if nothing is registered under `key` or if it holds another type.
    pub fn pool_mut<T: 'static>(&mut self, key: &'static str) -> Result<&mut Pool<T>, PhysicsError> {
        self.pools
            .get_mut(key)
            .ok_or(PhysicsError::UnregisteredPoolKey(key))?
            .downcast_mut::<Pool<T>>()
            .ok_or(PhysicsError::PoolTypeMismatch(key))
    }

    /// # Errors
    ///
    /// Fails if nothing is registered under `key` or if it holds another type.
    pub fn get_object<T: 'static>(&mut self, key: &'static str) -> Result<T, PhysicsError> {
        Ok(self.pool_mut::<T>(key)?.get())
    }

    /// # Errors
    ///
    /// Fails if nothing is registered under `key` or if it holds another type.
    pub fn free_object<T: 'static>(&mut self, key: &'static str, object: T) -> Result<(), PhysicsError> {
        self.pool_mut::<T>(key)?.free(object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_returns_on_drop() {
        let mut pool: Pool<Vec<u32>> = Pool::new(Vec::new);
        {
            let mut scratch = pool.scoped();
            scratch.push(7);
        }
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.created(), 1);
        // Reused object keeps its contents; callers clear what they need
        assert_eq!(pool.get(), vec![7]);
    }

    #[test]
    fn test_into_inner_detaches() {
        let mut pool: Pool<u8> = Pool::new(|| 3);
        let value = pool.scoped().into_inner();
        assert_eq!(value, 3);
        assert_eq!(pool.available(), 0);
    }
}
