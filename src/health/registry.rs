//! Check registry: probe category to ordered, named checks.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::check::{HealthCheck, LivenessCheck, ReadinessCheck, StartupCheck, StatusCheck};
use super::ProbeCategory;

/// Name reported for a check whose registration carries no name.
pub const UNREGISTERED_CHECK_NAME: &str = "Unregistered";

/// Name given to the built-in default checks.
pub const DEFAULT_CHECK_NAME: &str = "Default";

/// Registration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Check name is empty or whitespace.
    InvalidName,
    /// Checks cannot be bound to the unknown category.
    InvalidCategory(ProbeCategory),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidName => write!(f, "check name must not be blank"),
            RegistryError::InvalidCategory(c) => {
                write!(f, "checks cannot be registered for the {} category", c)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Metadata bound to a registered check. Never mutated after creation.
pub struct CheckRegistration {
    type_id: TypeId,
    type_name: &'static str,
    name: String,
    category: ProbeCategory,
    tags: Vec<String>,
    is_default: bool,
    check: Arc<dyn HealthCheck>,
}

impl CheckRegistration {
    fn new<C: HealthCheck>(
        category: ProbeCategory,
        name: String,
        tags: Vec<String>,
        is_default: bool,
        check: C,
    ) -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            name,
            category,
            tags,
            is_default,
            check: Arc::new(check),
        }
    }

    /// Implementation identity.
    #[inline]
    pub fn implementation_id(&self) -> TypeId {
        self.type_id
    }

    /// Implementation type name, for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name shown in reports, falling back to the unregistered sentinel.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNREGISTERED_CHECK_NAME
        } else {
            &self.name
        }
    }

    #[inline]
    pub fn category(&self) -> ProbeCategory {
        self.category
    }

    #[inline]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// True for the built-in check installed by [`CheckRegistry::with_defaults`].
    #[inline]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Shared handle to the implementation.
    #[inline]
    pub fn check(&self) -> Arc<dyn HealthCheck> {
        Arc::clone(&self.check)
    }
}

impl fmt::Debug for CheckRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistration")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("category", &self.category)
            .field("tags", &self.tags)
            .field("is_default", &self.is_default)
            .finish()
    }
}

type Bindings = HashMap<ProbeCategory, Vec<Arc<CheckRegistration>>>;

/// Explicitly owned registry of checks, shared behind an `Arc`.
///
/// Writes happen during setup; steady-state execution only takes read
/// snapshots, so a lookup never observes a half-applied registration.
#[derive(Default)]
pub struct CheckRegistry {
    bindings: RwLock<Bindings>,
}

impl CheckRegistry {
    /// Empty registry without default checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in default check for every category.
    pub fn with_defaults() -> Self {
        use ProbeCategory::*;

        let registry = Self::new();
        {
            let mut bindings = registry.write();
            let name = || DEFAULT_CHECK_NAME.to_string();
            for registration in [
                CheckRegistration::new(Status, name(), Vec::new(), true, StatusCheck),
                CheckRegistration::new(Startup, name(), Vec::new(), true, StartupCheck),
                CheckRegistration::new(Readiness, name(), Vec::new(), true, ReadinessCheck),
                CheckRegistration::new(Liveness, name(), Vec::new(), true, LivenessCheck),
            ] {
                bindings.insert(registration.category, vec![Arc::new(registration)]);
            }
        }
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, Bindings> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bindings> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bind a check to a category under `name`.
    pub fn register<C: HealthCheck>(
        &self,
        category: ProbeCategory,
        name: impl Into<String>,
        check: C,
    ) -> Result<(), RegistryError> {
        self.register_with_tags(category, name, Vec::<String>::new(), check)
    }

    /// Bind a check to a category with tags.
    ///
    /// The category's default check is removed in the same critical section.
    /// A check already registered under the same name is replaced in place.
    pub fn register_with_tags<C, I, T>(
        &self,
        category: ProbeCategory,
        name: impl Into<String>,
        tags: I,
        check: C,
    ) -> Result<(), RegistryError>
    where
        C: HealthCheck,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if category == ProbeCategory::Unknown {
            return Err(RegistryError::InvalidCategory(category));
        }

        let registration = Arc::new(CheckRegistration::new(
            category,
            name,
            tags.into_iter().map(Into::into).collect(),
            false,
            check,
        ));

        let mut bindings = self.write();
        let checks = bindings.entry(category).or_default();
        checks.retain(|r| !r.is_default);

        match checks.iter_mut().find(|r| r.name == registration.name) {
            Some(existing) => {
                debug!(category = %category, name = %registration.name, "Replacing health check");
                *existing = registration;
            }
            None => {
                debug!(category = %category, name = %registration.name, "Registered health check");
                checks.push(registration);
            }
        }

        Ok(())
    }

    /// Ordered snapshot of the checks bound to `category`.
    pub fn lookup(&self, category: ProbeCategory) -> Vec<Arc<CheckRegistration>> {
        self.read().get(&category).cloned().unwrap_or_default()
    }

    /// Registration of implementation `T` in `category`, if any.
    pub fn registration<T: HealthCheck>(
        &self,
        category: ProbeCategory,
    ) -> Option<Arc<CheckRegistration>> {
        let id = TypeId::of::<T>();
        self.read()
            .get(&category)
            .and_then(|checks| checks.iter().find(|r| r.type_id == id).cloned())
    }

    /// Remove every registration of implementation `T` from `category`.
    /// Returns whether anything was removed.
    pub fn unregister<T: HealthCheck>(&self, category: ProbeCategory) -> bool {
        let id = TypeId::of::<T>();
        self.remove_where(category, |r| r.type_id == id)
    }

    /// Remove the registration named `name` from `category`.
    pub fn unregister_name(&self, category: ProbeCategory, name: &str) -> bool {
        self.remove_where(category, |r| r.name == name)
    }

    fn remove_where(&self, category: ProbeCategory, pred: impl Fn(&CheckRegistration) -> bool) -> bool {
        let mut bindings = self.write();
        let Some(checks) = bindings.get_mut(&category) else {
            return false;
        };
        let before = checks.len();
        checks.retain(|r| !pred(r));
        before != checks.len()
    }

    /// Number of checks bound to `category`.
    pub fn len(&self, category: ProbeCategory) -> usize {
        self.read().get(&category).map_or(0, Vec::len)
    }

    /// Categories with at least one check.
    pub fn categories(&self) -> Vec<ProbeCategory> {
        let bindings = self.read();
        ProbeCategory::PROBES
            .into_iter()
            .filter(|c| bindings.get(c).is_some_and(|checks| !checks.is_empty()))
            .collect()
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("bindings", &*self.read())
            .finish()
    }
}
