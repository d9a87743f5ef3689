//! Global platform registry for looking up platform definitions.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock, RwLockReadGuard};

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

/// Global platform registry.
static REGISTRY: LazyLock<RwLock<PlatformRegistry>> = LazyLock::new(|| {
    let mut registry = PlatformRegistry::new();
    registry.register_builtin_platforms();
    RwLock::new(registry)
});

/// Registry for platform definitions.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<PlatformRegistry> {
        &REGISTRY
    }

    /// Read access to the global registry.
    pub fn read_global() -> Result<RwLockReadGuard<'static, PlatformRegistry>> {
        read_lock(Self::global())
    }

    /// Look up a platform in the global registry and clone it.
    pub fn lookup(name: &str) -> Result<PlatformDefinition> {
        let registry = Self::read_global()?;

        registry.get(name).cloned().ok_or_else(|| {
            PlatformError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn register_builtin_platforms(&mut self) {
        for platform in [
            vendors::fortinet::platform(),
            vendors::cisco_ios::platform(),
            vendors::juniper::platform(),
            vendors::linux::platform(),
        ] {
            self.platforms.insert(platform.name.clone(), platform);
        }
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// All registered platform names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.platforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn read_lock(lock: &RwLock<PlatformRegistry>) -> Result<RwLockReadGuard<'_, PlatformRegistry>> {
    Ok(lock.read().map_err(|_| PlatformError::RegistryPoisoned)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_platforms_registered() {
        let registry = PlatformRegistry::read_global().unwrap();
        assert_eq!(
            registry.names(),
            vec!["cisco_ios", "fortinet", "juniper_junos", "linux"]
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let err = PlatformRegistry::lookup("vax_vms").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Platform(PlatformError::UnknownPlatform { ref name }) if name == "vax_vms"
        ));
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut registry = PlatformRegistry::new();
        registry.register(vendors::linux::platform()).unwrap();
        assert!(registry.contains("linux"));

        let err = registry.register(vendors::linux::platform()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Platform(PlatformError::AlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_poisoned_lock_reported() {
        let lock = RwLock::new(PlatformRegistry::new());
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = lock.write().unwrap();
                    panic!("poison the registry lock");
                })
                .join()
        });

        let err = read_lock(&lock).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Platform(PlatformError::RegistryPoisoned)
        ));
    }
}
