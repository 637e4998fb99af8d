//! Job registry mapping route-facing names to Playwright spec files

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Known jobs, keyed by the name that appears in the run route.
///
/// Iteration order is the route order, so a `BTreeMap` keeps it stable.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: BTreeMap<String, PathBuf>,
}

impl JobRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            jobs: BTreeMap::new(),
        }
    }

    /// Register a job name with its default spec file.
    pub fn register(&mut self, name: impl Into<String>, script: impl Into<PathBuf>) {
        self.jobs.insert(name.into(), script.into());
    }

    /// Default spec path for a job, if the name is known.
    pub fn resolve(&self, name: &str) -> Option<&Path> {
        self.jobs.get(name).map(PathBuf::as_path)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for JobRegistry {
    /// The LMS automation suites this server fronts.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("test-creation", "tests/instructor/createTest.spec.js");
        registry.register("course-creation", "tests/instructor/createCourse.spec.js");
        registry.register("purchase", "tests/student/purchasePremiumCourse.spec.js");
        registry.register("login", "tests/student/login.spec.js");
        registry.register("social-signup", "tests/student/socialSignup.spec.js");
        registry.register("student-full-flow", "tests/student/studentFullFlow.spec.js");
        registry.register("live-class", "tests/live/liveClass.spec.js");
        registry
    }
}
