//! Memoizing provider wrapper.
//!
//! Descriptor evaluation may have side effects, so the at-most-once
//! contract per (name, axis) must hold even when axes are resolved in
//! parallel. The wrapper serializes lookups per map and hands out cached
//! clones on repeat queries.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use crate::core::axis::Axis;
use crate::core::descriptor::{ModuleDescriptor, ThirdPartyDescriptor};

use super::DescriptorProvider;

/// Wraps any provider with a per-(name, axis) cache.
///
/// Only successful descriptors are cached; a failed lookup aborts the run
/// before a second query can happen.
pub struct MemoProvider<P> {
    inner: P,
    modules: Mutex<HashMap<(String, Axis), ModuleDescriptor>>,
    third_parties: Mutex<HashMap<(String, Axis), ThirdPartyDescriptor>>,
}

impl<P: DescriptorProvider> MemoProvider<P> {
    pub fn new(inner: P) -> Self {
        MemoProvider {
            inner,
            modules: Mutex::new(HashMap::new()),
            third_parties: Mutex::new(HashMap::new()),
        }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: DescriptorProvider> DescriptorProvider for MemoProvider<P> {
    fn describe_module(&self, name: &str, axis: Axis) -> Result<ModuleDescriptor> {
        let mut cache = self.modules.lock().unwrap();
        if let Some(descriptor) = cache.get(&(name.to_string(), axis)) {
            return Ok(descriptor.clone());
        }
        let descriptor = self.inner.describe_module(name, axis)?;
        cache.insert((name.to_string(), axis), descriptor.clone());
        Ok(descriptor)
    }

    fn describe_third_party(&self, name: &str, axis: Axis) -> Result<ThirdPartyDescriptor> {
        let mut cache = self.third_parties.lock().unwrap();
        if let Some(descriptor) = cache.get(&(name.to_string(), axis)) {
            return Ok(descriptor.clone());
        }
        let descriptor = self.inner.describe_third_party(name, axis)?;
        cache.insert((name.to_string(), axis), descriptor.clone());
        Ok(descriptor)
    }
}
