//! Reference counted handles to a [`SpatialReference`].
use crate::srs::SpatialReference;
use std::ops::Deref;
use std::sync::Arc;

/// A definition with several owners.
///
/// Every [`reference`](SharedSrs::reference) hands out another owner of the same
/// tree, every [`release`](SharedSrs::release) gives one back. The tree goes away
/// with its last owner. Writing through [`make_mut`](SharedSrs::make_mut) never
/// touches what the other owners see.
#[derive(Debug, Clone, Default)]
pub struct SharedSrs(Arc<SpatialReference>);

impl SharedSrs {
    pub fn new(srs: SpatialReference) -> Self {
        SharedSrs(Arc::new(srs))
    }

    /// Another owner of the same tree.
    pub fn reference(&self) -> SharedSrs {
        SharedSrs(Arc::clone(&self.0))
    }

    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Gives up this owner and returns how many are left. Zero means the tree was
    /// dropped.
    pub fn release(self) -> usize {
        let remaining = Arc::strong_count(&self.0) - 1;
        drop(self);
        remaining
    }

    /// Mutable access, cloning the tree first when other owners exist.
    pub fn make_mut(&mut self) -> &mut SpatialReference {
        Arc::make_mut(&mut self.0)
    }

    /// True when both handles own the same tree, not just equal ones.
    pub fn ptr_eq(&self, other: &SharedSrs) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The definition itself, cloned when other owners remain.
    pub fn into_inner(self) -> SpatialReference {
        Arc::try_unwrap(self.0).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl Deref for SharedSrs {
    type Target = SpatialReference;

    fn deref(&self) -> &SpatialReference {
        &self.0
    }
}

impl AsRef<SpatialReference> for SharedSrs {
    fn as_ref(&self) -> &SpatialReference {
        &self.0
    }
}

impl From<SpatialReference> for SharedSrs {
    fn from(srs: SpatialReference) -> Self {
        SharedSrs::new(srs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn counts_owners() {
        let first = SharedSrs::new(SpatialReference::from_epsg(4326).unwrap());
        assert_eq!(first.reference_count(), 1);
        let second = first.reference();
        let third = second.reference();
        assert_eq!(first.reference_count(), 3);
        assert!(first.ptr_eq(&third));
        assert_eq!(third.release(), 2);
        assert_eq!(second.release(), 1);
        assert!(first.is_geographic());
        assert_eq!(first.release(), 0);
    }

    #[test]
    fn writes_do_not_leak_to_other_owners() {
        let geog = SharedSrs::from(SpatialReference::from_epsg(4326).unwrap());
        let mut projected = geog.reference();
        projected.make_mut().set_utm(33, true).unwrap();
        assert!(!projected.ptr_eq(&geog));
        assert!(geog.is_geographic());
        assert!(projected.is_projected());
        assert_eq!(geog.reference_count(), 1);

        // a sole owner is written in place
        let before = projected.reference();
        drop(before);
        let mut sole = projected;
        sole.make_mut().set_linear_units("foot", 0.3048).unwrap();
        assert_eq!(sole.linear_units().0, "foot");
    }

    #[test]
    fn into_inner_clones_only_when_shared() {
        let shared = SharedSrs::new(SpatialReference::from_epsg(4267).unwrap());
        let other = shared.reference();
        let owned = other.into_inner();
        assert!(owned.is_same(&shared));
        assert_eq!(shared.reference_count(), 1);
        assert!(shared.into_inner().is_geographic());
    }

    #[test]
    fn crosses_threads() {
        let shared = SharedSrs::new(SpatialReference::from_epsg(32633).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let srs = shared.reference();
                thread::spawn(move || srs.utm_zone())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some((33, true)));
        }
        assert_eq!(shared.reference_count(), 1);
    }
}
