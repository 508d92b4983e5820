//! The process-wide store of loaded configuration records.
//!
//! A [`Registry`] discovers record types per namespace, derives each type's
//! source path, loads it through a [`ScriptRuntime`] exactly once and keeps
//! the decoded instance keyed by type. Loading happens in one explicit phase
//! at startup; afterwards the registry is read-only and can be published with
//! [`install`].

mod catalog;

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

pub use catalog::{Catalog, Discovery, RecordType};
use catalog::Instance;

use crate::decode::decode_as;
use crate::descriptor::{LuaRecord, LuaType};
use crate::error::Error;
use crate::runtime::ScriptRuntime;
use crate::settings::LoaderSettings;

/// Loaded configuration records, one per type.
pub struct Registry {
    runtime: Box<dyn ScriptRuntime>,
    discovery: Box<dyn Discovery>,
    configs: HashMap<TypeId, Instance>,
}

impl Registry {
    pub fn new(runtime: impl ScriptRuntime + 'static, discovery: impl Discovery + 'static) -> Self {
        Self {
            runtime: Box::new(runtime),
            discovery: Box::new(discovery),
            configs: HashMap::new(),
        }
    }

    /// Record types to load for `namespace`. Nested (field-only) records are
    /// left out.
    pub fn discover(&self, namespace: &str) -> Result<Vec<RecordType>, Error> {
        let types = self
            .discovery
            .discover(namespace)
            .map_err(|e| Error::Discovery {
                namespace: namespace.to_string(),
                reason: e.to_string(),
            })?;
        Ok(types.into_iter().filter(|ty| !ty.meta().is_nested()).collect())
    }

    /// Source path of `ty`: `root` followed by the file name override when
    /// set, otherwise by `<TypeName>.lua`.
    ///
    /// `root` is a plain prefix, so a directory root needs its trailing
    /// separator (`conf/`), and a root such as `conf/game_` prefixes the file
    /// name itself.
    pub fn resolve_path(root: &Path, ty: &RecordType) -> PathBuf {
        let mut path = root.as_os_str().to_owned();
        match ty.meta().file_name_override() {
            Some(file_name) => path.push(file_name),
            None => {
                path.push(ty.name());
                path.push(".lua");
            }
        }
        PathBuf::from(path)
    }

    /// Loads every record type of every namespace, stopping at the first
    /// failure. Records loaded before the failure stay registered.
    pub fn try_load_all<S: AsRef<str>>(&mut self, root: &Path, namespaces: &[S]) -> Result<(), Error> {
        for namespace in namespaces {
            let namespace = namespace.as_ref();
            tracing::info!(root = %root.display(), namespace, "loading config namespace");

            let types = self.discover(namespace)?;
            tracing::info!(namespace, count = types.len(), "discovered config records");

            for ty in &types {
                let path = Self::resolve_path(root, ty);
                if let Loaded::Failed = self.load_record(&path, ty)? {
                    return Err(Error::LoadFailed {
                        type_name: ty.name(),
                        path,
                    });
                }
            }
        }
        Ok(())
    }

    /// Like [`try_load_all`](Self::try_load_all), reporting failure as `false`
    /// after logging it. Callers should treat `false` as fatal to startup.
    pub fn load_all<S: AsRef<str>>(&mut self, root: &Path, namespaces: &[S]) -> bool {
        match self.try_load_all(root, namespaces) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("load config {} failed: {}", root.display(), e);
                false
            }
        }
    }

    /// Runs [`load_all`](Self::load_all) with the root and namespaces from `settings`.
    pub fn load_with(&mut self, settings: &LoaderSettings) -> bool {
        self.load_all(&settings.root_path, settings.namespaces.as_slice())
    }

    /// Loads and registers a single record type.
    ///
    /// Returns `Ok(None)` when the file cannot be loaded or decoded (the cause
    /// is logged) or when the type opts out of loading. Binding a type whose
    /// instance already exists fails with [`Error::DuplicateSingleton`].
    pub fn load_one<T: LuaRecord>(&mut self, root: &Path) -> Result<Option<Arc<T>>, Error> {
        let ty = RecordType::of::<T>();
        let path = Self::resolve_path(root, &ty);
        match self.load_record(&path, &ty)? {
            Loaded::Stored(instance) => Ok(instance.downcast::<T>().ok()),
            Loaded::Skipped | Loaded::Failed => Ok(None),
        }
    }

    /// The loaded instance of `T`, if any.
    pub fn get<T: LuaRecord>(&self) -> Option<Arc<T>> {
        let instance = self.configs.get(&TypeId::of::<T>())?;
        Arc::clone(instance).downcast::<T>().ok()
    }

    pub fn contains(&self, ty: &RecordType) -> bool {
        self.configs.contains_key(&ty.id())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    fn load_record(&mut self, path: &Path, ty: &RecordType) -> Result<Loaded, Error> {
        if !ty.meta().loads() {
            tracing::debug!(record = ty.name(), "config loading disabled, skipping");
            return Ok(Loaded::Skipped);
        }
        if self.contains(ty) {
            return Err(Error::DuplicateSingleton {
                type_name: ty.name(),
            });
        }

        tracing::debug!(record = ty.name(), path = %path.display(), "loading config");
        let decoded = self
            .runtime
            .load(path)
            .map_err(Error::from)
            .and_then(|value| {
                ty.decode(&value).map_err(|source| Error::Decode {
                    path: path.to_path_buf(),
                    source,
                })
            });
        let instance = match decoded {
            Ok(instance) => instance,
            Err(e) => {
                tracing::error!("load config {} {} failed: {}", ty.name(), path.display(), e);
                return Ok(Loaded::Failed);
            }
        };

        ty.bind(&instance)?;
        self.configs.insert(ty.id(), Arc::clone(&instance));
        Ok(Loaded::Stored(instance))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("runtime", &self.runtime)
            .field("discovery", &self.discovery)
            .field("loaded", &self.configs.len())
            .finish()
    }
}

enum Loaded {
    Stored(Instance),
    Skipped,
    Failed,
}

/// Decodes one file into `T` without registering it.
pub fn load_file<T: LuaType>(runtime: &dyn ScriptRuntime, path: &Path) -> Result<T, Error> {
    let value = runtime.load(path)?;
    decode_as::<T>(&value).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Publishes a fully loaded registry for the rest of the process.
///
/// Only the first call succeeds; later calls hand the registry back.
pub fn install(registry: Registry) -> Result<(), Registry> {
    GLOBAL.set(registry)
}

/// The registry published with [`install`].
pub fn global() -> Option<&'static Registry> {
    GLOBAL.get()
}

/// Last path segment of a type name without generic arguments, e.g.
/// `GameConfig` for `app::cfg::GameConfig<app::Mode>`.
pub fn simple_name(type_name: &'static str) -> &'static str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).trim()
}
