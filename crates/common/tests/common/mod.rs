//! Shared test utilities for site-admin core integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::common::prelude::*;
use tempfile::TempDir;

/// A throwaway site directory with the three content roots and the work dir.
pub struct TestSite {
    pub dir: TempDir,
    pub layout: SiteLayout,
}

impl TestSite {
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }
}

/// Set up an empty site
pub fn setup_site() -> TestSite {
    let dir = TempDir::new().unwrap();
    let layout = SiteLayout::new(dir.path());
    for root in Root::ALL {
        std::fs::create_dir_all(layout.root_dir(root)).unwrap();
    }
    std::fs::create_dir_all(layout.work_dir()).unwrap();
    TestSite { dir, layout }
}

/// Content repository over `site` with the given wmk_admin.yaml contents
pub fn repository(site: &TestSite, admin_yaml: &str) -> ContentRepository {
    let config = AdminConfig::from_yaml(admin_yaml).unwrap();
    ContentRepository::new(site.layout.clone(), Arc::new(config))
}

/// A generator that runs `script` through `sh -c` in the site directory.
///
/// Quick arguments land in `$0`, so scripts can tell quick runs apart.
pub fn shell_generator(script: &str, timeout_secs: u64) -> GeneratorConfig {
    GeneratorConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        timeout_secs,
        ..GeneratorConfig::default()
    }
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
