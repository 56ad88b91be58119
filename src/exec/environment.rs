// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Process environment adapter
//!
//! Credential configuration and toolchain PATH updates are the only places
//! cloudops touches the ambient environment; both go through this trait so
//! tests can observe exports without mutating the test process.

use std::path::Path;

/// Adapter over process-environment mutation
pub trait EnvironmentAdapter: Send + Sync {
    /// Export a variable for this process and its children
    fn export(&self, key: &str, value: &str);

    /// Remove a variable
    fn remove(&self, key: &str);

    /// Prepend a directory to the search path
    fn prepend_path(&self, dir: &Path);
}

/// Adapter backed by the real process environment
pub struct ProcessEnvironment;

impl EnvironmentAdapter for ProcessEnvironment {
    fn export(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn remove(&self, key: &str) {
        std::env::remove_var(key);
    }

    fn prepend_path(&self, dir: &Path) {
        let current = std::env::var("PATH").unwrap_or_default();
        let dir = dir.display().to_string();
        if !current.split(':').any(|entry| entry == dir) {
            std::env::set_var("PATH", format!("{}:{}", dir, current));
        }
    }
}

/// Recording adapter for tests
#[cfg(test)]
pub mod recording {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingEnvironment {
        vars: Mutex<HashMap<String, String>>,
        removed: Mutex<Vec<String>>,
        paths: Mutex<Vec<PathBuf>>,
    }

    impl RecordingEnvironment {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get(&self, key: &str) -> Option<String> {
            self.vars.lock().unwrap().get(key).cloned()
        }

        pub fn removed(&self) -> Vec<String> {
            self.removed.lock().unwrap().clone()
        }

        pub fn prepended_paths(&self) -> Vec<PathBuf> {
            self.paths.lock().unwrap().clone()
        }
    }

    impl EnvironmentAdapter for RecordingEnvironment {
        fn export(&self, key: &str, value: &str) {
            self.vars
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        fn remove(&self, key: &str) {
            self.vars.lock().unwrap().remove(key);
            self.removed.lock().unwrap().push(key.to_string());
        }

        fn prepend_path(&self, dir: &Path) {
            self.paths.lock().unwrap().push(dir.to_path_buf());
        }
    }
}
